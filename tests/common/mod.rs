// Harness dos testes de API: router completo sobre o MemoryStore.
#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Local;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use invoicing::{
    config::AppState,
    services::{numbering::NumberSeries, AuthService},
};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "correct horse";

pub fn auth_service() -> AuthService {
    // Custo mínimo do bcrypt para os testes não ficarem lentos
    let hash = bcrypt::hash(PASSWORD, 4).unwrap();
    AuthService::new(HashMap::from([(USERNAME.to_string(), hash)]), "integration-secret".into())
}

/// Prefixo da série do mês corrente, como o servidor vai gerar.
pub fn current_series() -> String {
    NumberSeries::for_date(Local::now().date_naive()).prefix().to_string()
}

pub struct TestApp {
    router: Router,
    token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let router = invoicing::router(AppState::in_memory(auth_service()));
        let mut app = Self { router, token: String::new() };

        let (status, body) = app
            .send(Method::POST, "/api/login", Some(json!({ "username": USERNAME, "password": PASSWORD })), None)
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        app.token = body["token"].as_str().unwrap().to_string();
        app
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    // Atalhos autenticados
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, Some(&self.token)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), Some(&self.token)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body), Some(&self.token)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None, Some(&self.token)).await
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    // --- Fixtures ---

    pub async fn create_client(&self, name: &str) -> i64 {
        let (status, body) = self
            .post("/api/clients", json!({ "name": name, "email": "billing@example.com", "address": "1 Main St" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_project(&self, client_id: i64, name: &str) -> i64 {
        let (status, body) = self
            .post("/api/projects", json!({ "client_id": client_id, "name": name, "hourly_rate": 45 }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_invoice(&self, client_id: i64, project_id: i64, items: Value) -> Value {
        let (status, body) = self.post("/api/invoices", invoice_body(client_id, project_id, 8, items)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

pub fn invoice_body(client_id: i64, project_id: i64, tax_rate: impl Into<Value>, items: Value) -> Value {
    json!({
        "invoice": {
            "client_id": client_id,
            "project_id": project_id,
            "issue_date": "2025-10-01",
            "due_date": "2025-10-31",
            "tax_rate": tax_rate.into(),
            "po_number": "PO-7781"
        },
        "items": items
    })
}

pub fn money(value: &Value) -> f64 {
    value.as_f64().unwrap_or_else(|| panic!("expected a JSON number, got {value}"))
}
