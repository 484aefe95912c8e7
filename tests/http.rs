use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::Query;
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use serde_json::{Value, json};
use tower::ServiceExt;

use crop_yield::data::WeatherClient;
use crop_yield::domain::{RankOptions, WeatherConfig};
use crop_yield::io::load_from_reader;
use crop_yield::server::{AppState, router};

const CSV: &str = "\
Item,Value,median_temp,med_precip,med_soil_tmp,med_soil_moist
Corn,1,10,2,8,0.3
Corn,2,20,2,8,0.3
Corn,3,30,2,8,0.3
Oats,4,40,1,30,0.2
Oats,5,45,1,31,0.2
";

fn state_with_weather(base_url: String, timeout: Duration) -> AppState {
    let index = load_from_reader(CSV.as_bytes()).unwrap();
    let weather = WeatherClient::new(&WeatherConfig { base_url, timeout }).unwrap();
    AppState::new(index, RankOptions::default(), weather)
}

fn app() -> Router {
    // Nothing listens on port 9; tests using this app never reach the forecast API.
    router(state_with_weather("http://127.0.0.1:9".to_string(), Duration::from_secs(1)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_predict(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Serve `app` on an ephemeral local port and return its base URL.
async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn predict_with_missing_fields_is_bad_request() {
    let (status, body) = send(app(), post_predict(json!({"temp": 70, "precip": 2}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing parameters"}));
}

#[tokio::test]
async fn predict_with_non_numeric_field_is_bad_request() {
    let request = post_predict(json!({"temp": "warm", "precip": 2, "soil_tmp": 8, "soil_moist": 0.3}));
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("temp"));
}

#[tokio::test]
async fn predict_with_invalid_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn predict_ranks_crops() {
    let request = post_predict(json!({"temp": 50, "precip": 2, "soil_tmp": 8, "soil_moist": 0.3}));
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);

    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["crop"], "Corn");
    assert_eq!(results[0]["id"], 0);
    assert!((results[0]["predicted_yield"].as_f64().unwrap() - 5.0).abs() < 1e-6);
    assert_eq!(results[1]["crop"], "Oats");
    assert_eq!(results[1]["predicted_yield"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn future_weather_without_coordinates_is_bad_request() {
    let (status, body) = send(app(), get_request("/future_weather")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing latitude or longitude"}));

    let (status, _) = send(app(), get_request("/future_weather?latitude=40.1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(), get_request("/future_weather?latitude=abc&longitude=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn future_weather_averages_upstream_series() {
    let upstream = Router::new().route(
        "/v1/forecast",
        get(|Query(params): Query<std::collections::HashMap<String, String>>| async move {
            assert_eq!(params.get("temperature_unit").map(String::as_str), Some("fahrenheit"));
            axum::Json(json!({
                "latitude": params.get("latitude"),
                "longitude": params.get("longitude"),
                "hourly": {
                    "time": ["2026-10-16T00:00", "2026-10-16T01:00", "2026-10-16T02:00"],
                    "temperature_2m": [60.0, 62.0, 64.0],
                    "precipitation": [0.0, 0.3, null],
                    "soil_temperature_0cm": [55.0, 56.0, 57.0],
                    "soil_moisture_0_to_1cm": [0.2, 0.3, 0.4]
                }
            }))
        }),
    );
    let base = spawn_upstream(upstream).await;

    let app = router(state_with_weather(base, Duration::from_secs(5)));
    let (status, body) = send(app, get_request("/future_weather?latitude=40.1&longitude=-88.2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_temperature"].as_f64().unwrap(), 62.0);
    assert!((body["average_precipitation"].as_f64().unwrap() - 0.15).abs() < 1e-12);
    assert_eq!(body["average_soil_temperature"].as_f64().unwrap(), 56.0);
    assert!((body["average_soil_moisture"].as_f64().unwrap() - 0.3).abs() < 1e-12);
}

#[tokio::test]
async fn future_weather_upstream_failure_is_server_error() {
    let upstream = Router::new().route(
        "/v1/forecast",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let base = spawn_upstream(upstream).await;

    let app = router(state_with_weather(base, Duration::from_secs(5)));
    let (status, body) = send(app, get_request("/future_weather?latitude=1&longitude=2")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn future_weather_timeout_is_server_error() {
    let upstream = Router::new().route(
        "/v1/forecast",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let base = spawn_upstream(upstream).await;

    let app = router(state_with_weather(base, Duration::from_millis(200)));
    let (status, body) = send(app, get_request("/future_weather?latitude=1&longitude=2")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn future_weather_unreachable_upstream_is_server_error() {
    let (status, body) = send(app(), get_request("/future_weather?latitude=1&longitude=2")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_reports_dataset_size() {
    let (status, body) = send(app(), get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "crops": 2, "records": 5}));
}
