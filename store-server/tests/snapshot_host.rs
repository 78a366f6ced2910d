use shared::models::{Editable, Laptop, LaptopCreate};
use shared::{OperationResult, StoreDocument};
use store_server::sync::LocalCache;
use store_server::{Config, ServerState};
use tempfile::TempDir;

/// Serve the full router on an ephemeral port, returns the base URL
async fn spawn_host(dir: &TempDir) -> (String, ServerState) {
    let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0);
    let cache = LocalCache::open_in_memory().unwrap();
    let state = ServerState::with_cache(&config, cache).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = store_server::api::build_router(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn sample_doc() -> StoreDocument {
    StoreDocument {
        laptops: vec![Laptop::from_create(
            1,
            LaptopCreate {
                brand: "Lenovo".to_string(),
                model: "ThinkPad X1".to_string(),
                price: 1800.0,
                cost: 1300.0,
                quantity: 3,
                ..Default::default()
            },
            0,
        )],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_host(&dir).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_snapshot_slot_defaults_to_empty_then_round_trips() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_host(&dir).await;
    let client = reqwest::Client::new();

    let empty: StoreDocument = client
        .get(format!("{base}/api/snapshot/primary"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(empty.is_empty());

    let result: OperationResult = client
        .post(format!("{base}/api/snapshot/primary"))
        .json(&sample_doc())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(result.success);

    let stored: StoreDocument = client
        .get(format!("{base}/api/snapshot/primary"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored.laptops.len(), 1);
    assert_eq!(stored.laptops[0].model, "ThinkPad X1");

    // mirror slot is independent
    let mirror: StoreDocument = client
        .get(format!("{base}/api/snapshot/mirror"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(mirror.laptops.is_empty());
}

#[tokio::test]
async fn test_unknown_slot_is_404() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_host(&dir).await;

    let resp = reqwest::get(format!("{base}/api/snapshot/tertiary"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_backup_download() {
    let dir = TempDir::new().unwrap();
    let (base, state) = spawn_host(&dir).await;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{base}/api/backup/download"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    client
        .post(format!("{base}/api/snapshot/primary"))
        .json(&sample_doc())
        .send()
        .await
        .unwrap();

    let resp = client
        .get(format!("{base}/api/backup/download"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let disposition = resp
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let expected_prefix = format!("attachment; filename=\"{}-backup-", state.config.backup_prefix);
    assert!(disposition.starts_with(&expected_prefix), "{disposition}");
    assert!(disposition.ends_with(".json\""));

    let doc: StoreDocument = resp.json().await.unwrap();
    assert_eq!(doc.laptops.len(), 1);
}

#[tokio::test]
async fn test_sync_status_endpoint() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_host(&dir).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/api/sync/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["remotes"].as_array().unwrap().is_empty());
    assert!(body["pending"].as_array().unwrap().is_empty());
    assert!(body["dead_letters"].as_array().unwrap().is_empty());
}
