#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use nextfab::config::Config;
use nextfab::store::{MemoryStore, Store};

/// A running test server backed by its own in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete(&self, path: &str) -> StatusCode {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("delete request failed")
            .status()
    }

    /// Create a client with one contact in `city`, return the client JSON.
    pub async fn create_client(&self, name: &str, city: &str) -> Value {
        let (body, status) = self
            .post(
                "/api/clients",
                &json!({
                    "name": name,
                    "address": { "street": "Główna 1", "city": city, "postalCode": "00-001" },
                    "contact_persons": [
                        { "name": format!("{name} Contact"), "email": "office@example.com", "phone": "+48 600 000 000" }
                    ]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create client failed: {body}");
        body
    }

    /// Create a project for `client_id`, return the project JSON.
    pub async fn create_project(
        &self,
        client_id: &str,
        name: &str,
        number: &str,
        status: &str,
    ) -> Value {
        let (body, status_code) = self
            .post(
                "/api/projects",
                &json!({
                    "name": name,
                    "project_number": number,
                    "status": status,
                    "client_id": client_id,
                }),
            )
            .await;
        assert_eq!(status_code, StatusCode::CREATED, "create project failed: {body}");
        body
    }
}

/// Start the app on a random port.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let config = Config {
        log_level: "warn".to_string(),
        ..Config::default()
    };

    let app = nextfab::build_app(store.clone() as Arc<dyn Store>, config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        store,
        client,
    }
}
