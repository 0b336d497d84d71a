use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use booksum_cli::commands::{ask, config, doctor, eval};
use serde_json::Value;

#[test]
fn ask_returns_config_failure_without_booking_key() {
    with_env(&[], || {
        let result = ask::run("Show me bookings in November 2024");
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn ask_reports_unparseable_query_class() {
    with_env(&[("BOOKSUM_BOOKINGS_API_KEY", "bk-test")], || {
        let result = ask::run("Show me all the bookings you have in USD");
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "unparseable_query");
    });
}

#[test]
fn config_output_redacts_secrets_and_reports_sources() {
    with_env(
        &[
            ("BOOKSUM_BOOKINGS_API_KEY", "bk-very-secret-value"),
            ("BOOKSUM_FX_BASE_URL", "https://fx.example.test"),
        ],
        || {
            let output = config::run();

            assert!(!output.contains("bk-very-secret-value"), "booking key must be redacted");
            assert!(output.contains("bookings.api_key = bk-v***"));
            assert!(output.contains("fx.base_url = https://fx.example.test (source: env (BOOKSUM_FX_BASE_URL))"));
            assert!(output.contains("llm.model = gpt-4o-mini (source: default)"));
        },
    );
}

#[test]
fn doctor_json_reports_mode_and_fx_warning() {
    with_env(&[("BOOKSUM_BOOKINGS_API_KEY", "bk-test")], || {
        let payload = parse_payload(&doctor::run(true));

        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks array");
        let find = |name: &str| {
            checks.iter().find(|check| check["name"] == name).cloned().expect("check present")
        };

        assert_eq!(find("config_validation")["status"], "pass");
        assert!(find("interpreter_mode")["details"]
            .as_str()
            .expect("details")
            .starts_with("rule_based_only"));
        assert_eq!(find("fx_conversion")["status"], "warn");
    });
}

#[test]
fn doctor_fails_when_config_is_invalid() {
    with_env(&[], || {
        let output = doctor::run(false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [skip] interpreter_mode"));
    });
}

#[test]
fn eval_runs_rule_based_parser_on_dataset_file() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cases.json");
        fs::write(
            &path,
            r#"[
                {"query": "bookings in June 2022 in CHF",
                 "expected": {"start_date": "2022-06-01", "end_date": "2022-06-30", "currency": "CHF"}},
                {"query": "no dates here", "expected": {"expect_error": true}}
            ]"#,
        )
        .expect("write dataset");

        let result = eval::run(Some(&path));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["parser"], "rule_based");
        assert_eq!(payload["data"]["passed"], 2);
        assert_eq!(payload["data"]["results"][1]["status"], "OK_ERROR");
    });
}

#[test]
fn eval_rejects_unreadable_dataset() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.json");

        let result = eval::run(Some(&path));
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "dataset");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|error| {
        panic!("expected JSON output, got `{output}`: {error}");
    })
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "BOOKSUM_BOOKINGS_BASE_URL",
        "BOOKSUM_BOOKINGS_API_KEY",
        "BOOKSUM_BOOKINGS_TIMEOUT_SECS",
        "BOOKSUM_FX_BASE_URL",
        "BOOKSUM_FX_API_KEY",
        "BOOKSUM_FX_TIMEOUT_SECS",
        "BOOKSUM_LLM_API_KEY",
        "BOOKSUM_LLM_BASE_URL",
        "BOOKSUM_LLM_MODEL",
        "BOOKSUM_LLM_TIMEOUT_SECS",
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "BOOKSUM_SERVER_BIND_ADDRESS",
        "BOOKSUM_SERVER_PORT",
        "BOOKSUM_LOGGING_LEVEL",
        "BOOKSUM_LOGGING_FORMAT",
        "BOOKSUM_LOG_LEVEL",
        "BOOKSUM_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
