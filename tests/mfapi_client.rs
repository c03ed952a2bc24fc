//! HTTP client and controller tests against a local fake of the mfapi endpoints.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mfapi_nav_viewer::config::Config;
use mfapi_nav_viewer::controller::{DateRange, LoadStatus, SchemeController, SearchSettings};
use mfapi_nav_viewer::mfapi::{MfApiClient, NavData, NetworkError, Scheme};

const SCHEME_LIST: &str = r#"[
    {"schemeCode": 100, "schemeName": "HDFC Top 100"},
    {"schemeCode": 200, "schemeName": "SBI Bluechip"}
]"#;

const HDFC_DETAIL: &str = r#"{
    "meta": {
        "fund_house": "HDFC Mutual Fund",
        "scheme_type": "Open Ended Schemes",
        "scheme_category": "Equity Scheme - Large Cap Fund",
        "scheme_code": 100,
        "scheme_name": "HDFC Top 100"
    },
    "data": [
        {"date": "05-02-2023", "nav": "812.45600"},
        {"date": "15-01-2023", "nav": "798.10000"}
    ],
    "status": "SUCCESS"
}"#;

#[derive(Clone, Default)]
struct FakeApi {
    unavailable_hits: Arc<AtomicUsize>,
}

fn json(body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn list_schemes() -> Response {
    json(SCHEME_LIST)
}

async fn scheme_detail(State(api): State<FakeApi>, Path(code): Path<u32>) -> Response {
    match code {
        100 => json(HDFC_DETAIL),
        777 => json(r#"{"meta": {"fund_house": "#),
        503 => {
            api.unavailable_hits.fetch_add(1, Ordering::SeqCst);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve the fake API under an `/api` prefix and return its base URL.
async fn spawn_fake_mfapi(api: FakeApi) -> String {
    let app = Router::new()
        .route("/api/mf", get(list_schemes))
        .route("/api/mf/:code", get(scheme_detail))
        .with_state(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn client_for(base_url: &str, extra: &[(&str, &str)]) -> MfApiClient {
    let mut vars: Vec<(String, String)> = vec![("MFAPI_BASE_URL".to_string(), base_url.to_string())];
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    let cfg = Config::from_lookup(|key| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())).unwrap();
    MfApiClient::new(&cfg).unwrap()
}

#[tokio::test]
async fn list_schemes_decodes_catalog() {
    let base_url = spawn_fake_mfapi(FakeApi::default()).await;
    let client = client_for(&base_url, &[]);

    let schemes = client.list_schemes().await.unwrap();
    assert_eq!(schemes, vec![Scheme::new(100, "HDFC Top 100"), Scheme::new(200, "SBI Bluechip")]);
}

#[tokio::test]
async fn scheme_detail_keeps_nav_text_and_order() {
    let base_url = spawn_fake_mfapi(FakeApi::default()).await;
    let client = client_for(&base_url, &[]);

    let detail = client.get_scheme_detail(100).await.unwrap();
    assert_eq!(detail.meta.fund_house, "HDFC Mutual Fund");
    assert_eq!(
        detail.data,
        vec![NavData::new("05-02-2023", "812.45600"), NavData::new("15-01-2023", "798.10000")]
    );

    let again = client.get_scheme_detail(100).await.unwrap();
    assert_eq!(detail, again);
}

#[tokio::test]
async fn unknown_code_is_a_status_error() {
    let base_url = spawn_fake_mfapi(FakeApi::default()).await;
    let client = client_for(&base_url, &[]);

    let err = client.get_scheme_detail(999).await.unwrap_err();
    assert!(matches!(err, NetworkError::Status { .. }));
    assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
    assert!(err.to_string().starts_with("HTTP 404 Not Found from "));
    assert!(err.to_string().ends_with("/api/mf/999"));
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let base_url = spawn_fake_mfapi(FakeApi::default()).await;
    let client = client_for(&base_url, &[]);

    let err = client.get_scheme_detail(777).await.unwrap_err();
    assert!(matches!(err, NetworkError::Decode { .. }));
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}", addr), &[]);
    let err = client.list_schemes().await.unwrap_err();
    assert!(matches!(err, NetworkError::Transport { .. }));
}

#[tokio::test]
async fn no_retries_by_default() {
    let api = FakeApi::default();
    let base_url = spawn_fake_mfapi(api.clone()).await;
    let client = client_for(&base_url, &[]);

    let err = client.get_scheme_detail(503).await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(api.unavailable_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn configured_retries_repeat_transient_failures() {
    let api = FakeApi::default();
    let base_url = spawn_fake_mfapi(api.clone()).await;
    let client = client_for(&base_url, &[("HTTP_MAX_RETRIES", "2")]);

    let err = client.get_scheme_detail(503).await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(api.unavailable_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn controller_searches_and_selects_over_http() {
    let base_url = spawn_fake_mfapi(FakeApi::default()).await;
    let client = client_for(&base_url, &[]);
    let settings = SearchSettings {
        debounce: Duration::from_millis(20),
        ..SearchSettings::default()
    };
    let controller = SchemeController::new(Arc::new(client), settings);
    let mut rx = controller.subscribe();
    let limit = Duration::from_secs(10);

    tokio::time::timeout(limit, rx.wait_for(|s| s.scheme_list_status == LoadStatus::Loaded))
        .await
        .unwrap()
        .unwrap();

    controller.on_query_changed("hdfc");
    let state = tokio::time::timeout(limit, rx.wait_for(|s| !s.search.is_searching))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(state.search.results, vec![Scheme::new(100, "HDFC Top 100")]);

    controller.select_scheme(100);
    tokio::time::timeout(limit, rx.wait_for(|s| s.detail_status == LoadStatus::Loaded))
        .await
        .unwrap()
        .unwrap();
    assert!(controller.set_date_range(DateRange::parse("01-01-2023", "31-01-2023").unwrap()));
    assert_eq!(controller.snapshot().visible_navs(), vec![NavData::new("15-01-2023", "798.10000")]);

    controller.select_scheme(999);
    let state = tokio::time::timeout(limit, rx.wait_for(|s| s.detail_status == LoadStatus::Failed))
        .await
        .unwrap()
        .unwrap()
        .clone();
    let message = state.error_message().unwrap();
    assert!(message.starts_with("Failed to load scheme details: HTTP 404 Not Found"));
    assert_eq!(state.selected_detail.unwrap().meta.scheme_code, 100);
}
