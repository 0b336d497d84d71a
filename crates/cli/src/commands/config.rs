use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use booksum_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct FieldSpec<'a> {
    key_path: &'static str,
    value: String,
    env_keys: &'a [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = [
        FieldSpec {
            key_path: "bookings.base_url",
            value: config.bookings.base_url.clone(),
            env_keys: &["BOOKSUM_BOOKINGS_BASE_URL"],
        },
        FieldSpec {
            key_path: "bookings.api_key",
            value: redact_secret(Some(&config.bookings.api_key)),
            env_keys: &["BOOKSUM_BOOKINGS_API_KEY"],
        },
        FieldSpec {
            key_path: "bookings.timeout_secs",
            value: config.bookings.timeout_secs.to_string(),
            env_keys: &["BOOKSUM_BOOKINGS_TIMEOUT_SECS"],
        },
        FieldSpec {
            key_path: "fx.base_url",
            value: config.fx.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["BOOKSUM_FX_BASE_URL"],
        },
        FieldSpec {
            key_path: "fx.api_key",
            value: redact_secret(config.fx.api_key.as_ref()),
            env_keys: &["BOOKSUM_FX_API_KEY"],
        },
        FieldSpec {
            key_path: "fx.timeout_secs",
            value: config.fx.timeout_secs.to_string(),
            env_keys: &["BOOKSUM_FX_TIMEOUT_SECS"],
        },
        FieldSpec {
            key_path: "llm.api_key",
            value: redact_secret(config.llm.api_key.as_ref()),
            env_keys: &["BOOKSUM_LLM_API_KEY", "OPENAI_API_KEY"],
        },
        FieldSpec {
            key_path: "llm.base_url",
            value: config.llm.base_url.clone(),
            env_keys: &["BOOKSUM_LLM_BASE_URL"],
        },
        FieldSpec {
            key_path: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["BOOKSUM_LLM_MODEL", "OPENAI_MODEL"],
        },
        FieldSpec {
            key_path: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["BOOKSUM_LLM_TIMEOUT_SECS"],
        },
        FieldSpec {
            key_path: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["BOOKSUM_SERVER_BIND_ADDRESS"],
        },
        FieldSpec {
            key_path: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["BOOKSUM_SERVER_PORT"],
        },
        FieldSpec {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["BOOKSUM_LOGGING_LEVEL", "BOOKSUM_LOG_LEVEL"],
        },
        FieldSpec {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["BOOKSUM_LOGGING_FORMAT", "BOOKSUM_LOG_FORMAT"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", field.key_path, field.value));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("booksum.toml"), PathBuf::from("config/booksum.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps at most the first four characters of a key.
fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }
    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use toml::Value;

    use super::{contains_path, redact_secret};

    #[test]
    fn secrets_are_redacted() {
        let long: SecretString = "sk-live-0123456789abcdef".to_string().into();
        let short: SecretString = "abc".to_string().into();

        assert_eq!(redact_secret(Some(&long)), "sk-l***");
        assert_eq!(redact_secret(Some(&short)), "<redacted>");
        assert_eq!(redact_secret(None), "<unset>");
    }

    #[test]
    fn nested_keys_are_found_in_file_document() {
        let doc: Value = "[fx]\nbase_url = \"https://fx.example.test\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "fx.base_url"));
        assert!(!contains_path(&doc, "fx.api_key"));
        assert!(!contains_path(&doc, "llm.model"));
    }
}
