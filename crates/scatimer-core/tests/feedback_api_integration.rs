//! Integration tests for the feedback HTTP contract.
//!
//! Most tests drive `FeedbackApi::handle` directly; the last one goes
//! through a real socket to check headers on the wire.

use scatimer_core::{ApiServer, FeedbackApi, FeedbackStore, Mode, Rating};
use serde_json::Value;

fn api_in(dir: &tempfile::TempDir) -> FeedbackApi {
    FeedbackApi::new(FeedbackStore::new(dir.path().join("feedback.json")))
}

fn summary(api: &FeedbackApi) -> Value {
    let res = api.handle("GET", "/api/feedback", b"");
    assert_eq!(res.status, 200);
    res.json_body().unwrap()
}

fn post(api: &FeedbackApi, rating: &str, mode: &str) -> (u16, Value) {
    let body = serde_json::json!({ "rating": rating, "mode": mode }).to_string();
    let res = api.handle("POST", "/api/feedback", body.as_bytes());
    (res.status, res.json_body().unwrap())
}

#[test]
fn test_valid_post_increments_counts() {
    let dir = tempfile::tempdir().unwrap();
    let api = api_in(&dir);

    let before = summary(&api);
    assert_eq!(before["total"], 0);

    let (status, body) = post(&api, "positive", "standard");
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Feedback recorded");

    let after = summary(&api);
    assert_eq!(after["total"], 1);
    assert_eq!(after["positive"], 1);
    assert_eq!(after["negative"], 0);
    assert_eq!(after["byMode"]["standard"], 1);
    assert_eq!(after["byMode"]["guided"], 0);
    assert_eq!(after["recent"][0]["rating"], "positive");
    assert_eq!(after["recent"][0]["mode"], "standard");
}

#[test]
fn test_invalid_payloads_are_rejected_and_not_stored() {
    let dir = tempfile::tempdir().unwrap();
    let api = api_in(&dir);

    let (status, body) = post(&api, "invalid", "standard");
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid rating");

    let (status, body) = post(&api, "negative", "expert");
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid mode");

    let res = api.handle("POST", "/api/feedback", br#"{"mode":"guided"}"#);
    assert_eq!(res.status, 400);
    assert_eq!(res.json_body().unwrap()["error"], "Invalid rating");

    assert_eq!(summary(&api)["total"], 0);
}

#[test]
fn test_recent_is_capped_at_ten_in_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let api = api_in(&dir);

    for i in 0..14 {
        let mode = if i % 2 == 0 { "guided" } else { "standard" };
        let rating = if i < 4 { "negative" } else { "positive" };
        assert_eq!(post(&api, rating, mode).0, 200);
    }

    let s = summary(&api);
    assert_eq!(s["total"], 14);
    assert_eq!(s["negative"], 4);
    assert_eq!(s["positive"], 10);
    assert_eq!(s["byMode"]["guided"], 7);
    assert_eq!(s["byMode"]["standard"], 7);

    let recent = s["recent"].as_array().unwrap();
    assert_eq!(recent.len(), 10);
    // Entries 4..14 are all positive; entry 4 is guided, entry 13 standard.
    assert!(recent.iter().all(|e| e["rating"] == "positive"));
    assert_eq!(recent[0]["mode"], "guided");
    assert_eq!(recent[9]["mode"], "standard");
}

#[test]
fn test_store_file_is_created_on_first_access() {
    let dir = tempfile::tempdir().unwrap();
    let api = api_in(&dir);
    let path = dir.path().join("feedback.json");
    assert!(!path.exists());

    summary(&api);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
}

#[test]
fn test_corrupt_store_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feedback.json");
    std::fs::write(&path, "[{\"rating\": \"positive\"").unwrap();
    let api = api_in(&dir);

    assert_eq!(summary(&api)["total"], 0);
    assert_eq!(post(&api, "negative", "guided").0, 200);
    assert_eq!(summary(&api)["total"], 1);

    let stored = FeedbackStore::new(&path).load();
    assert_eq!(stored[0].rating, Rating::Negative);
    assert_eq!(stored[0].mode, Mode::Guided);
}

#[tokio::test]
async fn test_socket_round_trip_carries_cors_headers() {
    let dir = tempfile::tempdir().unwrap();
    let server = ApiServer::bind(api_in(&dir), 0).unwrap();
    let port = server.local_addr().unwrap().port();
    let worker = std::thread::spawn(move || {
        for _ in 0..3 {
            server.serve_one().unwrap();
        }
    });

    let base = format!("http://127.0.0.1:{port}");
    let http = reqwest::Client::new();

    let res = http
        .request(reqwest::Method::OPTIONS, format!("{base}/api/feedback"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["access-control-allow-origin"].to_str().unwrap(),
        "*"
    );
    assert_eq!(
        res.headers()["access-control-allow-methods"].to_str().unwrap(),
        "GET, POST, OPTIONS"
    );
    assert!(res.bytes().await.unwrap().is_empty());

    let res = http
        .post(format!("{base}/api/feedback"))
        .json(&serde_json::json!({ "rating": "positive", "mode": "guided" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["access-control-allow-headers"].to_str().unwrap(),
        "Content-Type"
    );

    let res = http.get(format!("{base}/api/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    worker.join().unwrap();
    assert_eq!(FeedbackStore::new(dir.path().join("feedback.json")).load().len(), 1);
}

#[tokio::test]
async fn test_unblock_stops_a_running_server() {
    let dir = tempfile::tempdir().unwrap();
    let server = std::sync::Arc::new(ApiServer::bind(api_in(&dir), 0).unwrap());
    let port = server.local_addr().unwrap().port();
    let runner = std::sync::Arc::clone(&server);
    let worker = std::thread::spawn(move || runner.run());

    let res = reqwest::get(format!("http://127.0.0.1:{port}/api/feedback"))
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    server.unblock();
    worker.join().unwrap();
}
