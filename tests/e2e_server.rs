//! Server end-to-end tests
//!
//! Runs the full router on a random port and talks to it over real HTTP with
//! `reqwest` multipart uploads.

mod common;

use common::{FakeBehavior, TestHarness, FAKE_WEBP};
use reqwest::multipart::{Form, Part};

fn video_form(filename: &str) -> Form {
    Form::new().part(
        "video",
        Part::bytes(b"pretend video".to_vec()).file_name(filename.to_string()),
    )
}

#[tokio::test]
async fn convert_download_cleanup_roundtrip() {
    let (harness, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/convert"))
        .multipart(video_form("clip.mp4").text("speed", "2").text("max_duration", "5"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    let id = json["file_id"].as_str().unwrap().to_string();

    let resp = client
        .get(format!("http://{addr}/api/download/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/webp");
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("sticker.webp"));
    assert_eq!(resp.bytes().await.unwrap().as_ref(), FAKE_WEBP);

    let resp = client
        .delete(format!("http://{addr}/api/cleanup/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .delete(format!("http://{addr}/api/cleanup/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let call = &harness.transcoder.calls()[0];
    assert!(call.filter_chain.starts_with("setpts=0.5*PTS"));
    assert!(call.ffmpeg_args.windows(2).any(|w| w == ["-t", "5"]));
}

#[tokio::test]
async fn unsupported_upload_over_http() {
    let (harness, addr) = TestHarness::with_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/convert"))
        .multipart(video_form("readme.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "unsupported_format");
    assert_eq!(harness.staged_uploads(), 0);
}

#[tokio::test]
async fn failing_transcoder_over_http() {
    let (harness, addr) = TestHarness::with_behavior(FakeBehavior::Fail(
        "Error while opening encoder".to_string(),
    ))
    .serve()
    .await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/convert"))
        .multipart(video_form("clip.mov"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Conversion failed: Error while opening encoder");
    assert_eq!(harness.staged_uploads(), 0);
}

#[tokio::test]
async fn health_over_http() {
    let (_harness, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = reqwest::get(format!("http://{addr}/api/health")).await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Server is running");
}
