use booksum_core::domain::booking::CurrencyCode;
use booksum_core::errors::{BookingSourceError, FxError};
use booksum_core::summary::{BookingSource, FxRateSource};
use booksum_providers::{HttpBookingSource, HttpFxRateSource};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, day).expect("valid date")
}

fn booking_source(server: &MockServer) -> HttpBookingSource {
    HttpBookingSource::new(&server.uri(), "bk-test-key".to_string().into(), 5)
        .expect("client builds")
}

fn fx_source(server: &MockServer) -> HttpFxRateSource {
    HttpFxRateSource::new(Some(&server.uri()), Some("fx-test-key".to_string().into()), 5)
        .expect("client builds")
}

#[tokio::test]
async fn bookings_follow_next_links_and_send_filters_on_first_page() {
    let server = MockServer::start().await;
    let second_page = format!("{}/bookings/page-2", server.uri());

    Mock::given(method("GET"))
        .and(path("/bookings"))
        .and(header("x-api-key", "bk-test-key"))
        .and(query_param("startTime[gte]", "2024-11-01"))
        .and(query_param("startTime[lte]", "2024-11-30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "id": "a",
                    "localTime": "2024-11-02T10:00:00",
                    "price": { "finalRetailPrice": { "amount": 100.0, "currency": "EUR" } }
                }
            ],
            "next": second_page
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bookings/page-2"))
        .and(header("x-api-key", "bk-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "id": 2,
                    "time": "2024-11-20T08:00:00Z",
                    "price": { "finalRetailPrice": { "amount": "55.25", "currency": "usd" } }
                }
            ],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bookings =
        booking_source(&server).bookings_between(date(1), date(30)).await.expect("bookings");

    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0].id.0, "a");
    assert_eq!(bookings[1].id.0, "2");
    assert_eq!(bookings[1].currency.as_str(), "USD");
    assert_eq!(bookings[1].amount, Decimal::new(5525, 2));
}

#[tokio::test]
async fn malformed_records_are_skipped_without_aborting() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": "ok-1", "localTime": "2024-11-02T10:00:00" },
                { "id": "bad-time", "localTime": "not a date" },
                { "localTime": "2024-11-03T10:00:00" },
                { "id": "no-time" },
                {
                    "id": "bad-amount",
                    "localTime": "2024-11-04T10:00:00",
                    "price": { "finalRetailPrice": { "amount": "n/a" } }
                },
                {
                    "id": "ok-2",
                    "localTime": "2024-11-05T10:00:00",
                    "price": { "finalRetailPrice": { "amount": 10, "currency": "GBP" } }
                }
            ]
        })))
        .mount(&server)
        .await;

    let bookings =
        booking_source(&server).bookings_between(date(1), date(30)).await.expect("bookings");

    let ids: Vec<&str> = bookings.iter().map(|booking| booking.id.0.as_str()).collect();
    assert_eq!(ids, vec!["ok-1", "ok-2"]);
    assert_eq!(bookings[0].currency.as_str(), "EUR");
    assert_eq!(bookings[0].amount, Decimal::ZERO);
}

#[tokio::test]
async fn booking_http_error_is_provider_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let error = booking_source(&server)
        .bookings_between(date(1), date(30))
        .await
        .expect_err("should fail");

    assert!(matches!(error, BookingSourceError::Unavailable(ref reason) if reason.contains("503")));
}

#[tokio::test]
async fn self_referencing_next_link_is_rejected() {
    let server = MockServer::start().await;
    let same_page = format!("{}/bookings/loop", server.uri());

    Mock::given(method("GET"))
        .and(path("/bookings"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "results": [], "next": same_page })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bookings/loop"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "results": [], "next": same_page })),
        )
        .mount(&server)
        .await;

    let error = booking_source(&server)
        .bookings_between(date(1), date(30))
        .await
        .expect_err("cycle should fail");

    assert!(matches!(error, BookingSourceError::InvalidResponse(_)));
}

#[tokio::test]
async fn fx_rate_is_read_from_latest_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("base", "USD"))
        .and(query_param("currencies", "EUR"))
        .and(query_param("format", "json"))
        .and(query_param("api_key", "fx-test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "rates": { "EUR": 0.92 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rate = fx_source(&server)
        .rate(&CurrencyCode::new("usd"), &CurrencyCode::new("eur"))
        .await
        .expect("rate");

    assert_eq!(rate, Decimal::new(92, 2));
}

#[tokio::test]
async fn fx_identity_pair_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

    let rate = fx_source(&server)
        .rate(&CurrencyCode::new("chf"), &CurrencyCode::new("CHF"))
        .await
        .expect("identity rate");

    assert_eq!(rate, Decimal::ONE);
}

#[tokio::test]
async fn fx_failure_flag_and_missing_rate_are_data_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("currencies", "JPY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("currencies", "GBP"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "rates": {} })),
        )
        .mount(&server)
        .await;

    let source = fx_source(&server);
    let eur = CurrencyCode::new("EUR");

    let flagged = source.rate(&eur, &CurrencyCode::new("JPY")).await.expect_err("flag");
    assert!(matches!(flagged, FxError::RateUnavailable { .. }));

    let missing = source.rate(&eur, &CurrencyCode::new("GBP")).await.expect_err("missing");
    assert!(matches!(missing, FxError::RateUnavailable { ref to, .. } if to.as_str() == "GBP"));
}

#[tokio::test]
async fn fx_http_error_is_provider_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let error = fx_source(&server)
        .rate(&CurrencyCode::new("EUR"), &CurrencyCode::new("USD"))
        .await
        .expect_err("should fail");

    assert!(matches!(error, FxError::Unavailable(_)));
}

#[tokio::test]
async fn unconfigured_fx_fails_fast_for_non_identity_pairs() {
    let source = HttpFxRateSource::new(None, None, 5).expect("client builds");
    assert!(!source.is_configured());

    let identity = source
        .rate(&CurrencyCode::new("EUR"), &CurrencyCode::new("eur"))
        .await
        .expect("identity needs no configuration");
    assert_eq!(identity, Decimal::ONE);

    let error = source
        .rate(&CurrencyCode::new("EUR"), &CurrencyCode::new("USD"))
        .await
        .expect_err("should fail");
    assert!(matches!(
        error,
        FxError::NotConfigured { ref from, ref to } if from.as_str() == "EUR" && to.as_str() == "USD"
    ));
}
