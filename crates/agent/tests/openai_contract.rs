use std::sync::Arc;

use booksum_agent::{LlmQueryParser, OpenAiClient};
use booksum_core::errors::ParseError;
use booksum_core::interpret::QueryParser;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn parser_for(server: &MockServer) -> LlmQueryParser {
    let client = OpenAiClient::new(&server.uri(), "sk-test".to_string().into(), "gpt-4o-mini", 5)
        .expect("client builds");
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
    LlmQueryParser::new(Arc::new(client)).with_today(today)
}

fn tool_call_response(arguments: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": "extract_booking_filters", "arguments": arguments }
                }]
            }
        }]
    })
}

#[tokio::test]
async fn forced_function_call_is_sent_and_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0,
            "tool_choice": { "type": "function", "function": { "name": "extract_booking_filters" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_response(
            r#"{"start_date":"2023-03-01","end_date":"2023-03-31","currency":"eur"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let parsed = parser_for(&server)
        .parse_booking_query("Prikaži rezervacije za ožujak 2023 u eurima")
        .await
        .expect("parsed");

    assert_eq!(parsed.start_date, "2023-03-01");
    assert_eq!(parsed.end_date, "2023-03-31");
    assert_eq!(parsed.currency.as_deref(), Some("EUR"));
}

#[tokio::test]
async fn plain_text_answer_is_unsupported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "I cannot help." } }]
        })))
        .mount(&server)
        .await;

    let error = parser_for(&server).parse_booking_query("hello").await.expect_err("fails");
    assert!(matches!(error, ParseError::Unsupported(_)));
}

#[tokio::test]
async fn http_error_is_unsupported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let error = parser_for(&server).parse_booking_query("November 2024").await.expect_err("fails");
    assert!(matches!(error, ParseError::Unsupported(ref reason) if reason.contains("429")));
}
