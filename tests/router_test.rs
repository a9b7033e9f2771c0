mod common;

use std::sync::Arc;

use anyhow::Result;
use common::test_store;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Start the API on a random local port and return its base URL.
async fn spawn_server() -> Result<(String, TempDir)> {
    let (store, temp) = test_store().await?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);
    tokio::spawn(medipay::http::serve_on(Arc::new(store), listener));
    Ok((base, temp))
}

fn is_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[tokio::test]
async fn test_doctor_routes() -> Result<()> {
    let (base, _temp) = spawn_server().await?;
    let client = Client::new();

    let response = client
        .post(format!("{}/doctors", base))
        .json(&json!({ "name": "Dr. A", "percentage": 20.0 }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let doctor: Value = response.json().await?;
    let id = doctor["id"].as_i64().unwrap();

    let response = client
        .get(format!("{}/doctors/{}", base, id))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let doctor: Value = response.json().await?;
    assert_eq!(doctor["name"], "Dr. A");

    let response = client
        .put(format!("{}/doctors/{}", base, id))
        .json(&json!({ "percentage": 50.0 }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let doctor: Value = response.json().await?;
    assert_eq!(doctor["percentage"], 50.0);

    let response = client
        .delete(format!("{}/doctors/{}", base, id))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/doctors/{}", base, id))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(is_json(&response));

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_json_bad_request() -> Result<()> {
    let (base, _temp) = spawn_server().await?;
    let client = Client::new();

    let response = client
        .post(format!("{}/doctors", base))
        .json(&json!({ "name": "Dr. A", "percentage": "abc" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(is_json(&response));
    let body: Value = response.json().await?;
    assert!(body["error"].as_str().unwrap().contains("percentage"));

    // Not JSON at all
    let response = client
        .post(format!("{}/appointments", base))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(is_json(&response));

    // Missing content type
    let response = client
        .post(format!("{}/doctors", base))
        .body(r#"{"name":"Dr. A","percentage":10}"#)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(is_json(&response));

    let doctors: Value = client
        .get(format!("{}/doctors", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(doctors.as_array().unwrap().len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_non_numeric_doctor_id_is_json_bad_request() -> Result<()> {
    let (base, _temp) = spawn_server().await?;

    let response = Client::new()
        .get(format!("{}/doctors/abc", base))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(is_json(&response));
    let body: Value = response.json().await?;
    assert!(body["error"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_appointment_and_report_routes() -> Result<()> {
    let (base, _temp) = spawn_server().await?;
    let client = Client::new();

    let doctor: Value = client
        .post(format!("{}/doctors", base))
        .json(&json!({ "name": "Dr. A", "percentage": 20.0 }))
        .send()
        .await?
        .json()
        .await?;

    let response = client
        .post(format!("{}/appointments", base))
        .json(&json!({ "doctor_id": doctor["id"], "amount": 100.0 }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let appointment: Value = response.json().await?;
    assert_eq!(appointment["payout"], 20.0);

    let report: Value = client
        .get(format!("{}/report", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(report["net"], 80.0);
    assert_eq!(report["formatted"]["total_billed"], "R$ 100,00");

    let summary: Value = client.get(&base).send().await?.json().await?;
    assert_eq!(summary["appointment_count"], 1);

    Ok(())
}
