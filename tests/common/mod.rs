#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use catalog::cache::{CacheBackend, CacheConfig, ResponseCache};
use catalog::infra::http::{ApiState, build_router};
use catalog::infra::memory::InMemoryRepositories;
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryRepositories>,
    pub cache: Arc<ResponseCache>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn cache_status(&self) -> &str {
        self.headers
            .get("x-cache")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
    }

    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or("")
    }

    pub fn names(&self) -> Vec<String> {
        self.body
            .as_array()
            .expect("list body")
            .iter()
            .map(|item| item["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

pub fn app() -> TestApp {
    app_with_cache(ResponseCache::in_memory(CacheConfig::default()))
}

pub fn app_with_backend(backend: Arc<dyn CacheBackend>) -> TestApp {
    app_with_cache(ResponseCache::new(CacheConfig::default(), backend))
}

pub fn app_with_cache(cache: ResponseCache) -> TestApp {
    let store = Arc::new(InMemoryRepositories::new());
    let cache = Arc::new(cache);
    let state = ApiState::from_store(store.clone(), cache.clone());
    TestApp {
        router: build_router(state),
        store,
        cache,
    }
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn create_category(&self, name: &str) -> i64 {
        let response = self
            .post("/categories/", serde_json::json!({ "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().expect("category id")
    }

    pub async fn create_product(&self, name: &str, price: &str, category_id: i64) -> i64 {
        let response = self
            .post(
                "/products/",
                serde_json::json!({ "name": name, "price": price, "category_id": category_id }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().expect("product id")
    }
}
