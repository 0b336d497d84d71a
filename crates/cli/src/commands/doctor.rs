use booksum_agent::create_parser;
use booksum_core::config::{AppConfig, LoadOptions};
use booksum_core::interpret::QueryInterpreter;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_interpreter(&config));
            checks.push(check_fx(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["interpreter_mode", "fx_conversion"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_fail = checks
        .iter()
        .any(|check| matches!(check.status, CheckStatus::Fail | CheckStatus::Skipped));
    let overall_status = if any_fail { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_fail {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_interpreter(config: &AppConfig) -> DoctorCheck {
    match create_parser(&config.llm) {
        Ok(parser) => {
            let mode = QueryInterpreter::new(parser).mode();
            let details = if config.llm.is_enabled() {
                format!("{} (model `{}`, rule-based fallback)", mode.as_str(), config.llm.model)
            } else {
                format!("{} (no LLM credential configured)", mode.as_str())
            };
            DoctorCheck { name: "interpreter_mode", status: CheckStatus::Pass, details }
        }
        Err(error) => DoctorCheck {
            name: "interpreter_mode",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_fx(config: &AppConfig) -> DoctorCheck {
    if config.fx.is_configured() {
        DoctorCheck {
            name: "fx_conversion",
            status: CheckStatus::Pass,
            details: "FX provider configured".to_string(),
        }
    } else {
        DoctorCheck {
            name: "fx_conversion",
            status: CheckStatus::Warn,
            details: "FX provider not configured; cross-currency queries will fail".to_string(),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
