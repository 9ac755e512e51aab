//! Shared test harness: a fully wired gateway on mocks and a manual clock.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use html2pdf_gateway::clock::{Clock, ManualClock};
use html2pdf_gateway::factory::mock::MockBrowserFactory;
use html2pdf_gateway::integrations::axum::router;
use html2pdf_gateway::store::mock::MockCounterStore;
use html2pdf_gateway::{AppState, BrowserFactory, GatewayConfigBuilder};
use tower::ServiceExt;

pub const TOKEN: &str = "test-token";
pub const ORIGIN: &str = "https://app.example.com";
pub const OTHER_ORIGIN: &str = "http://localhost:3000";

pub struct Harness {
    pub state: AppState,
    pub factory: Arc<MockBrowserFactory>,
    pub store: Arc<MockCounterStore>,
    pub clock: Arc<ManualClock>,
}

/// Gateway allowing `max_requests` per client per minute.
pub fn harness(max_requests: u32, factory: MockBrowserFactory) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(MockCounterStore::new(clock.clone()));
    let factory = Arc::new(factory);

    let config = GatewayConfigBuilder::new()
        .api_token(TOKEN)
        .allowed_origins(vec![ORIGIN.to_string(), OTHER_ORIGIN.to_string()])
        .max_requests(max_requests)
        .build()
        .unwrap();

    let state = AppState::new(
        config,
        store.clone(),
        factory.clone() as Arc<dyn BrowserFactory>,
        clock.clone() as Arc<dyn Clock>,
    )
    .unwrap();

    Harness {
        state,
        factory,
        store,
        clock,
    }
}

/// Unique client address so tests never share a rate-limit window.
pub fn unique_client() -> String {
    let id = uuid::Uuid::new_v4();
    let bytes = id.as_bytes();
    format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2])
}

/// Authenticated `POST /` from `client`.
pub fn render_request(client: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, ORIGIN)
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .unwrap_or_else(|| panic!("missing header {}", name))
            .to_str()
            .unwrap()
    }
}

pub async fn send(state: &AppState, request: Request<Body>) -> TestResponse {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body,
    }
}
