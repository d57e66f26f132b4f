//! Provider paging against a mocked klines endpoint.
//!
//! GREEN when:
//! - the provider advances `startTime` to last open time + 1 after each page
//! - an empty page ends the download
//! - rows at or after the exclusive end are clipped
//! - a non-success status is an error, as is a download with no rows at all

use std::time::Duration;

use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use serde_json::json;
use sigbt_md::{BinanceKlinesProvider, FetchRequest, HistoricalProvider, Interval};

const H: i64 = 3_600_000;
const START_MS: i64 = 1_735_689_600_000; // 2025-01-01T00:00:00Z

fn kline(open_ms: i64, close: &str) -> serde_json::Value {
    json!([open_ms, close, close, close, close, "1.0", open_ms + H - 1, "0", 1, "0", "0", "0"])
}

fn request(hours: i64) -> FetchRequest {
    FetchRequest {
        symbol: "ltcusdt".to_string(),
        interval: Interval::H1,
        start: Utc.timestamp_millis_opt(START_MS).unwrap(),
        end: Utc.timestamp_millis_opt(START_MS + hours * H).unwrap(),
    }
}

#[tokio::test]
async fn pages_until_empty_and_clips_to_end() {
    let server = MockServer::start_async().await;
    let end_ms = START_MS + 3 * H;

    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v3/klines")
                .query_param("symbol", "LTCUSDT")
                .query_param("interval", "1h")
                .query_param("startTime", START_MS.to_string());
            then.status(200)
                .json_body(json!([kline(START_MS, "100"), kline(START_MS + H, "101")]));
        })
        .await;

    // Upstream returns a row at `end` (inclusive endTime); it must be clipped.
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v3/klines")
                .query_param("startTime", (START_MS + H + 1).to_string());
            then.status(200).json_body(json!([
                kline(START_MS + 2 * H, "102"),
                kline(end_ms, "103")
            ]));
        })
        .await;

    let third = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v3/klines")
                .query_param("startTime", (end_ms + 1).to_string());
            then.status(200).json_body(json!([]));
        })
        .await;

    let provider =
        BinanceKlinesProvider::new_with_base_url(server.base_url()).with_pacing(Duration::ZERO);
    let candles = provider.fetch_candles(&request(3)).await.expect("fetch");

    first.assert_async().await;
    second.assert_async().await;
    // cursor reached end after the second page, so no third call
    assert_eq!(third.hits_async().await, 0);

    assert_eq!(candles.len(), 3);
    assert_eq!(candles[0].close, 100.0);
    assert_eq!(candles[2].close, 102.0);
    assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[tokio::test]
async fn http_error_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v3/klines");
            then.status(429).body("rate limited");
        })
        .await;

    let provider =
        BinanceKlinesProvider::new_with_base_url(server.base_url()).with_pacing(Duration::ZERO);
    let err = provider.fetch_candles(&request(2)).await.unwrap_err();
    assert!(err.to_string().contains("status=429"), "{err}");
}

#[tokio::test]
async fn empty_download_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v3/klines");
            then.status(200).json_body(json!([]));
        })
        .await;

    let provider =
        BinanceKlinesProvider::new_with_base_url(server.base_url()).with_pacing(Duration::ZERO);
    let err = provider.fetch_candles(&request(2)).await.unwrap_err();
    assert!(err.to_string().contains("no data returned"), "{err}");
}
