use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{extract::Query, http::StatusCode, routing::get, routing::post, Json, Router};
use reqwest::Client;
use serde_json::{json, Value};

use crop_advisor::{
    routes, AppState, ClientError, Config, HttpSensorClient, RecommendationWorkflow, RunOutcome,
    RunStage, SensorSource, SharedCropState, WorkflowStatus,
};

const FIELD_SNAPSHOT: &str =
    r#"{"moisture":65,"ph":6.5,"temperature":28,"humidity":72,"N":45,"P":32,"K":58}"#;
const WHEAT: &str = r#"{"recommended_crop":"Wheat","recommended_fertilizer":"DAP + Urea split","predicted_yield_ton_per_hectare":3.8}"#;

type Seen = Arc<Mutex<Vec<Value>>>;

/// In-process stand-in for the prediction backend.
fn backend(
    latest: (StatusCode, &'static str),
    predict: (StatusCode, &'static str),
) -> (Router, Seen) {
    // ---
    let seen: Seen = Arc::default();
    let recorder = seen.clone();

    let router = Router::new()
        .route("/latest", get(move || async move { latest }))
        .route(
            "/predict",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(body);
                    predict
                }
            }),
        )
        .route(
            "/weather",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                match q.get("city").map(String::as_str) {
                    Some("Atlantis") => (StatusCode::NOT_FOUND, "city not found".to_string()),
                    city => (
                        StatusCode::OK,
                        json!({ "city": city, "temperature": 28, "condition": "sunny" }).to_string(),
                    ),
                }
            }),
        );

    (router, seen)
}

/// Serve `app` on an ephemeral local port and return its base URL.
async fn serve(app: Router) -> Result<String> {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

async fn client_for(
    latest: (StatusCode, &'static str),
    predict: (StatusCode, &'static str),
) -> Result<(HttpSensorClient, Seen)> {
    // ---
    let (router, seen) = backend(latest, predict);
    let url = serve(router).await?;
    Ok((HttpSensorClient::new(url), seen))
}

#[tokio::test]
async fn wheat_scenario_end_to_end() -> Result<()> {
    // ---
    let (client, seen) = client_for((StatusCode::OK, FIELD_SNAPSHOT), (StatusCode::OK, WHEAT)).await?;
    let workflow = RecommendationWorkflow::new(client, SharedCropState::new());

    let crop = match workflow.refresh().await {
        RunOutcome::Ready(crop) => crop,
        other => panic!("expected ready, got {:?}", other),
    };

    assert_eq!(crop.name, "Wheat");
    assert!(crop.yield_range.contains("3.8"), "yield range: {}", crop.yield_range);
    assert_eq!(crop.fertilizer_tips, "DAP + Urea split");
    assert_eq!(workflow.state().selected_crop(), Some(crop));

    // The prediction body is the fetched snapshot in canonical casing
    let bodies = seen.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["moisture"].as_f64(), Some(65.0));
    assert_eq!(bodies[0]["ph"].as_f64(), Some(6.5));
    assert_eq!(bodies[0]["N"].as_f64(), Some(45.0));
    assert_eq!(bodies[0]["K"].as_f64(), Some(58.0));
    assert!(bodies[0].get("n").is_none());

    Ok(())
}

#[tokio::test]
async fn lower_case_nutrients_are_accepted() -> Result<()> {
    // ---
    let lower = r#"{"moisture":40,"ph":7.0,"temperature":31,"humidity":60,"n":10,"p":20,"k":30}"#;
    let (client, _) = client_for((StatusCode::OK, lower), (StatusCode::OK, WHEAT)).await?;

    let snapshot = client.fetch_latest_snapshot().await?;

    assert_eq!(snapshot.nitrogen, 10.0);
    assert_eq!(snapshot.phosphorus, 20.0);
    assert_eq!(snapshot.potassium, 30.0);
    Ok(())
}

#[tokio::test]
async fn predict_server_error_fails_workflow() -> Result<()> {
    // ---
    let (client, _) = client_for(
        (StatusCode::OK, FIELD_SNAPSHOT),
        (StatusCode::INTERNAL_SERVER_ERROR, "model unavailable"),
    )
    .await?;

    let err = client
        .request_prediction(&client.fetch_latest_snapshot().await?)
        .await
        .unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "model unavailable");
        }
        other => panic!("expected server error, got {:?}", other),
    }

    let workflow = RecommendationWorkflow::new(client, SharedCropState::new());
    let outcome = workflow.refresh().await;

    assert!(matches!(outcome, RunOutcome::Failed(ref f) if f.stage == RunStage::Prediction));
    assert!(matches!(workflow.status(), WorkflowStatus::Failed(_)));
    assert!(workflow.state().selected_crop().is_none());
    Ok(())
}

#[tokio::test]
async fn malformed_or_out_of_range_snapshot_is_decode_error() -> Result<()> {
    // ---
    let (client, _) = client_for((StatusCode::OK, "<html>oops</html>"), (StatusCode::OK, WHEAT)).await?;
    let err = client.fetch_latest_snapshot().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "got {:?}", err);

    let soaked = r#"{"moisture":140,"ph":6.5,"temperature":28,"humidity":72,"N":45,"P":32,"K":58}"#;
    let (client, seen) = client_for((StatusCode::OK, soaked), (StatusCode::OK, WHEAT)).await?;
    let workflow = RecommendationWorkflow::new(client, SharedCropState::new());

    let outcome = workflow.refresh().await;

    assert!(matches!(outcome, RunOutcome::Failed(ref f) if f.stage == RunStage::Snapshot));
    assert!(workflow.state().sensor_snapshot().is_none());
    assert!(seen.lock().unwrap().is_empty(), "prediction must not be requested");
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() -> Result<()> {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let client = HttpSensorClient::new(format!("http://{}", addr));
    let err = client.fetch_latest_snapshot().await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)), "got {:?}", err);
    Ok(())
}

async fn spawn_service() -> Result<String> {
    // ---
    let (router, _) = backend((StatusCode::OK, FIELD_SNAPSHOT), (StatusCode::OK, WHEAT));
    let backend_url = serve(router).await?;

    let config = Config {
        backend_url: backend_url.clone(),
        refresh_on_start: false,
        ..Config::default()
    };
    let state = AppState::new(HttpSensorClient::new(backend_url), config);
    serve(routes::router(state)).await
}

#[tokio::test]
async fn service_api_drives_workflow() -> Result<()> {
    // ---
    let base = spawn_service().await?;
    let client = Client::new();

    let health: Value = client.get(format!("{}/health", base)).send().await?.json().await?;
    assert_eq!(health["status"], "ok");

    let before: Value = client.get(format!("{}/recommendation", base)).send().await?.json().await?;
    assert_eq!(before["status"]["state"], "idle");
    assert!(before["selected_crop"].is_null());

    let missing = client.get(format!("{}/sensors/latest", base)).send().await?;
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    // Reset before any run is a no-op
    let noop: Value = client.post(format!("{}/recommendation/reset", base)).send().await?.json().await?;
    assert_eq!(noop["status"]["state"], "idle");

    let ready: Value = client.post(format!("{}/recommendation/refresh", base)).send().await?.json().await?;
    assert_eq!(ready["status"]["state"], "ready");
    assert_eq!(ready["selected_crop"]["name"], "Wheat");
    assert_eq!(ready["selected_crop"]["yieldRange"], "3.8 t/ha");
    assert_eq!(ready["sensor_snapshot"]["N"], 45.0);

    let sensors: Value = client.get(format!("{}/sensors/latest", base)).send().await?.json().await?;
    assert_eq!(sensors["moisture_level"], "Optimal");
    assert_eq!(sensors["ph_level"], "Neutral");

    // N = 45 mg/kg is below the nitrogen optimum
    let feed: Value = client.get(format!("{}/alerts", base)).send().await?.json().await?;
    assert_eq!(feed["alerts"].as_array().map(Vec::len), Some(1));
    assert_eq!(feed["alerts"][0]["title"], "Low Nitrogen Levels");
    assert_eq!(feed["alerts"][0]["kind"], "low_nitrogen");
    assert_eq!(feed["alerts"][0]["read"], false);
    assert_eq!(feed["counts"]["low"], 1);
    assert_eq!(feed["counts"]["unread"], 1);

    let high: Value = client
        .get(format!("{}/alerts?filter=high", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(high["alerts"].as_array().map(Vec::len), Some(0));

    let inactive = client
        .post(format!("{}/alerts/heat_stress/read", base))
        .send()
        .await?;
    assert_eq!(inactive.status(), reqwest::StatusCode::NOT_FOUND);

    let marked: Value = client
        .post(format!("{}/alerts/low_nitrogen/read", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(marked["alerts"][0]["read"], true);
    assert_eq!(marked["counts"]["unread"], 0);

    let unread: Value = client
        .get(format!("{}/alerts?filter=unread", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(unread["alerts"].as_array().map(Vec::len), Some(0));
    assert_eq!(unread["counts"]["low"], 1);

    let all_read: Value = client.post(format!("{}/alerts/read-all", base)).send().await?.json().await?;
    assert_eq!(all_read["counts"]["unread"], 0);

    let chat: Value = client
        .post(format!("{}/chat", base))
        .json(&json!({ "message": "Which crop is best for my soil?" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(chat["intent"], "crop_recommendation");
    assert!(chat["reply"].as_str().unwrap_or_default().contains("Wheat"));

    let chat: Value = client
        .post(format!("{}/chat", base))
        .json(&json!({ "message": "When should I irrigate?" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(chat["intent"], "irrigation");
    assert!(chat["reply"].as_str().unwrap_or_default().contains("65%"));

    let reset: Value = client.post(format!("{}/recommendation/reset", base)).send().await?.json().await?;
    assert_eq!(reset["status"]["state"], "idle");
    assert!(reset["selected_crop"].is_null());
    assert_eq!(reset["sensor_snapshot"]["moisture"], 65.0);

    Ok(())
}

#[tokio::test]
async fn weather_proxy_is_independent_of_recommendations() -> Result<()> {
    // ---
    let base = spawn_service().await?;
    let client = Client::new();

    let weather: Value = client.get(format!("{}/weather", base)).send().await?.json().await?;
    assert_eq!(weather["city"], "Pune");
    assert_eq!(weather["condition"], "sunny");

    let failed = client.get(format!("{}/weather?city=Atlantis", base)).send().await?;
    assert_eq!(failed.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: Value = failed.json().await?;
    assert_eq!(body["kind"], "server");

    let state: Value = client.get(format!("{}/recommendation", base)).send().await?.json().await?;
    assert_eq!(state["status"]["state"], "idle");

    Ok(())
}
