use aqmonitor::client::ProviderClient;
use aqmonitor::errors::Error;
use aqmonitor::gateway::{AirVisualGateway, PollutionSource, FETCH_FAILED};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

const API_KEY: &str = "test-key";

/// Fake provider mirroring the nearest_city endpoint.
async fn nearest_city(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("key").map(String::as_str) != Some(API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": "fail", "data": {"message": "incorrect_api_key"}})),
        );
    }

    let lat: f64 = params["lat"].parse().unwrap();
    let lon: f64 = params["lon"].parse().unwrap();
    let aqius = if lat < 0.0 { 150 } else { 42 };

    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "data": {
                "city": "Somewhere",
                "location": {"type": "Point", "coordinates": [lon, lat]},
                "current": {
                    "pollution": {
                        "ts": "2021-09-29T14:00:00.000Z",
                        "aqius": aqius,
                        "mainus": "p2",
                        "aqicn": 15,
                        "maincn": "p1"
                    },
                    "weather": {"tp": 18, "hu": 60}
                }
            }
        })),
    )
}

async fn garbage() -> &'static str {
    "<html>not json</html>"
}

async fn spawn_provider() -> String {
    let app = Router::new()
        .route("/v2/nearest_city", get(nearest_city))
        .route("/v2/broken", get(garbage));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v2", addr)
}

fn gateway(base: &str, path: &str, key: &str) -> AirVisualGateway {
    let client = ProviderClient::new(&format!("{}/{}", base, path)).unwrap();
    AirVisualGateway::new(client, key)
}

#[tokio::test]
async fn test_gateway_reshapes_provider_response() {
    let base = spawn_provider().await;
    let gateway = gateway(&base, "nearest_city", API_KEY);

    let response = assert_ok!(gateway.nearest_city(48.856613, 2.352222).await);

    let pollution = response.pollution();
    assert_eq!(pollution.aqius, 42);
    assert_eq!(pollution.mainus, "p2");
    assert_eq!(pollution.aqicn, 15);
    assert_eq!(pollution.maincn, "p1");
    assert_eq!(pollution.ts, "2021-09-29T14:00:00.000Z");
}

#[tokio::test]
async fn test_gateway_sends_signed_coordinates() {
    let base = spawn_provider().await;
    let gateway = gateway(&base, "nearest_city", API_KEY);

    let response = assert_ok!(gateway.nearest_city(-33.8688, 151.2093).await);
    assert_eq!(response.pollution().aqius, 150);
}

#[tokio::test]
async fn test_gateway_hides_provider_rejection() {
    let base = spawn_provider().await;
    let gateway = gateway(&base, "nearest_city", "wrong-key");

    let err = assert_err!(gateway.nearest_city(1.0, 2.0).await);

    assert!(err.is_bad_request());
    assert_eq!(err.to_string(), FETCH_FAILED);
}

#[tokio::test]
async fn test_client_surfaces_status_and_body() {
    let base = spawn_provider().await;
    let client = ProviderClient::new(&base).unwrap();

    let err = assert_err!(
        client
            .get_json::<serde_json::Value>("nearest_city", &[("key", "nope".to_string())])
            .await
    );

    match err {
        Error::Provider {
            status,
            status_text,
            body,
        } => {
            assert_eq!(status, 401);
            assert_eq!(status_text, "Unauthorized");
            assert!(body.contains("incorrect_api_key"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_rejects_non_json_body() {
    let base = spawn_provider().await;
    let client = ProviderClient::new(&base).unwrap();

    let err = assert_err!(client.get_json::<serde_json::Value>("/broken", &[]).await);
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn test_client_transport_failure_is_propagated() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ProviderClient::new(&format!("http://{}/", addr)).unwrap();
    let err = assert_err!(client.get_json::<serde_json::Value>("", &[]).await);
    assert!(matches!(err, Error::Http(_)));
}
