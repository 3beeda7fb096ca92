// tests/api.rs

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use rental_backend::{
    config::{AppState, Config},
    db::Repositories,
    models::auth::User,
    routes::create_router,
    services::mailer::InMemoryMailer,
};

struct TestApp {
    router: Router,
    mailer: InMemoryMailer,
    token: String,
}

fn seeded_user() -> User {
    User {
        id: Uuid::new_v4(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        name: "Admin".to_string(),
        role: "admin".to_string(),
        membership_paid: true,
    }
}

async fn spawn_app(extra: &[(&str, &str)]) -> TestApp {
    let mut pairs = vec![("DATABASE_TYPE", "memory"), ("JWT_SECRET", "test-secret")];
    pairs.extend_from_slice(extra);
    let config = Config::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap();

    let mailer = InMemoryMailer::new();
    let state = AppState::new(
        Arc::new(config),
        Repositories::in_memory(vec![seeded_user()]),
        Arc::new(mailer.clone()),
    );
    let router = create_router(state);

    let mut app = TestApp {
        router,
        mailer,
        token: String::new(),
    };
    let (status, body) = app
        .call(Method::POST, "/api/login", Some(json!({ "username": "admin", "password": "secret" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    app.token = body["data"]["token"].as_str().unwrap().to_string();
    app
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, body, Some(&self.token)).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
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
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_rent(&self, code: &str, product_name: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/rents",
                Some(json!({
                    "code": code,
                    "productName": product_name,
                    "quantity": 1,
                    "totalValuePerDay": 1000,
                    "clientRut": "1-9",
                    "clientName": "Ana",
                    "warrantyValue": 0,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }
}

fn rent_body() -> Value {
    json!({
        "code": "R1",
        "productName": "Mesa",
        "quantity": 2,
        "totalValuePerDay": 1000,
        "clientRut": "1-9",
        "clientName": "Ana",
        "warrantyValue": 0,
    })
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = spawn_app(&[]).await;

    let (status, _) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, doc) = app.send(Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/rents"].is_object());
    assert!(doc["components"]["securitySchemes"]["api_jwt"].is_object());
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = spawn_app(&[]).await;

    let (status, body) = app.send(Method::GET, "/api/clients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No authorization token provided");

    let (status, body) = app.send(Method::GET, "/api/clients", None, Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn login_rejects_wrong_password_and_current_user_comes_from_token() {
    let app = spawn_app(&[]).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/login",
            Some(json!({ "username": "admin", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call(Method::GET, "/api/users?current=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "admin");
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn creating_a_rent_resolves_client_and_product() {
    let app = spawn_app(&[]).await;

    let (status, body) = app.call(Method::POST, "/api/rents", Some(rent_body())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["message"], "Rent created successfully");

    let product = &body["data"]["product"];
    assert_eq!(product["code"], "MESA");
    assert_eq!(product["brand"], "Sin marca");
    assert_eq!(product["priceNet"].as_f64(), Some(810.0));
    assert_eq!(product["priceIva"].as_f64(), Some(190.0));
    assert_eq!(product["rented"], true);

    assert_eq!(body["data"]["client"]["rut"], "1-9");
    assert_eq!(body["data"]["rent"]["productName"], "Mesa");
    assert_eq!(body["data"]["rent"]["isFinished"], false);

    // O mesmo RUT reaproveita o cliente.
    app.create_rent("R2", "Silla").await;
    let (_, clients) = app.call(Method::GET, "/api/clients", None).await;
    assert_eq!(clients["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rent_creation_reports_missing_fields() {
    let app = spawn_app(&[]).await;

    let (status, body) = app
        .call(Method::POST, "/api/rents", Some(json!({ "code": "R1", "productName": "Mesa" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required fields: quantity, totalValuePerDay, clientRut, clientName, warrantyValue"
    );

    let mut empty_warranty = rent_body();
    empty_warranty["warrantyValue"] = json!("");
    let (status, body) = app.call(Method::POST, "/api/rents", Some(empty_warranty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields: warrantyValue");
}

#[tokio::test]
async fn finishing_frees_the_product_and_cannot_repeat() {
    let app = spawn_app(&[]).await;
    let created = app.create_rent("R1", "Mesa").await;
    let id = created["rent"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/rents/finish?id={}", id);

    let (status, body) = app.call(Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Payment method is required when finishing a rent");

    let finish = json!({ "paymentMethod": "Efectivo", "deliveryDate": "2024-06-10T12:00:00Z" });
    let (status, body) = app.call(Method::PATCH, &uri, Some(finish.clone())).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["deliveryDate"], "2024-06-10T12:00:00Z");

    let (status, body) = app.call(Method::PATCH, &uri, Some(finish)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Rent is already finished");

    let (_, products) = app.call(Method::GET, "/api/products", None).await;
    assert_eq!(products["data"][0]["rented"], false);
}

#[tokio::test]
async fn finished_rents_are_paginated() {
    let app = spawn_app(&[]).await;
    for (code, name) in [("R1", "Mesa"), ("R2", "Silla"), ("R3", "Toldo")] {
        let created = app.create_rent(code, name).await;
        let uri = format!("/api/rents/finish?id={}", created["rent"]["id"].as_str().unwrap());
        let (status, _) = app
            .call(Method::PATCH, &uri, Some(json!({ "paymentMethod": "Transferencia" })))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    app.create_rent("R4", "Carpa").await;

    let (status, body) = app
        .call(Method::GET, "/api/rents?type=finished&page=2&pageSize=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "finished");
    assert_eq!(body["count"], 1);
    assert_eq!(body["pagination"]["totalCount"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["currentPage"], 2);

    let (_, active) = app.call(Method::GET, "/api/rents?type=active", None).await;
    assert_eq!(active["count"], 1);
    assert!(active.get("pagination").is_none());
}

#[tokio::test]
async fn deleting_rents() {
    let app = spawn_app(&[]).await;

    let (status, body) = app.call(Method::DELETE, "/api/rents", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Rent ID is required");

    let unknown = format!("/api/rents?id={}", Uuid::new_v4());
    let (status, body) = app.call(Method::DELETE, &unknown, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Rent not found");

    let (status, _) = app.call(Method::DELETE, "/api/rents?id=abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let created = app.create_rent("R1", "Mesa").await;
    let uri = format!("/api/rents?id={}", created["rent"]["id"].as_str().unwrap());
    let (status, body) = app.call(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);
}

#[tokio::test]
async fn oversized_pages_come_back_empty() {
    let app = spawn_app(&[]).await;
    let created = app.create_rent("R1", "Mesa").await;
    let uri = format!("/api/rents/finish?id={}", created["rent"]["id"].as_str().unwrap());
    app.call(Method::PATCH, &uri, Some(json!({ "paymentMethod": "Efectivo" })))
        .await;

    let (status, body) = app
        .call(
            Method::GET,
            "/api/rents?type=finished&page=4294967295&pageSize=4294967295",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["count"], 0);
    assert_eq!(body["pagination"]["totalCount"], 1);
    assert_eq!(body["pagination"]["pageSize"], 1000);
}

#[tokio::test]
async fn rent_search_needs_every_word() {
    let app = spawn_app(&[]).await;
    app.create_rent("R1", "Silla Plegable Roja").await;
    app.create_rent("R2", "Silla Azul").await;

    let (status, body) = app.call(Method::GET, "/api/rents?productName=silla%20roja", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["productName"], "Silla Plegable Roja");

    let (_, body) = app.call(Method::GET, "/api/rents?productName=silla", None).await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn updating_a_rent_renames_its_client() {
    let app = spawn_app(&[]).await;
    let created = app.create_rent("R1", "Mesa").await;

    let uri = format!("/api/rents?id={}", created["rent"]["id"].as_str().unwrap());
    let (status, body) = app
        .call(Method::PUT, &uri, Some(json!({ "clientName": "Ana María" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (_, rents) = app.call(Method::GET, "/api/rents", None).await;
    assert_eq!(rents["data"][0]["clientName"], "Ana María");
    let (_, clients) = app.call(Method::GET, "/api/clients?rut=1-9", None).await;
    assert_eq!(clients["data"][0]["name"], "Ana María");
}

#[tokio::test]
async fn clients_endpoints() {
    let app = spawn_app(&[]).await;
    let client = json!({ "name": "Ana", "rut": "1-9" });

    let (status, body) = app.call(Method::POST, "/api/clients", Some(client.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.call(Method::POST, "/api/clients", Some(client)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(Method::PUT, &format!("/api/clients/{}", id), Some(json!({ "name": "Ana María" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "Ana María");
    assert_eq!(body["data"]["rut"], "1-9");

    let missing = Uuid::new_v4();
    let (status, _) = app
        .call(Method::PUT, &format!("/api/clients/{}", missing), Some(json!({ "name": "X" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.call(Method::DELETE, &format!("/api/clients?id={}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Client with ID {} not found", missing));

    let (status, _) = app.call(Method::DELETE, "/api/clients?id=abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call(Method::DELETE, &format!("/api/clients?id={}", id), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn products_endpoints() {
    let app = spawn_app(&[]).await;
    app.create_rent("R1", "Mesa").await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/products",
            Some(json!({ "name": "Toldo", "code": "TOLDO", "priceTotal": 20000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let toldo = body["data"]["id"].as_str().unwrap().to_string();

    let (_, rented) = app.call(Method::GET, "/api/products?rented=true", None).await;
    assert_eq!(rented["data"].as_array().unwrap().len(), 1);
    assert_eq!(rented["data"][0]["code"], "MESA");

    let (_, priced) = app
        .call(Method::GET, "/api/products?minPrice=5000&maxPrice=25000", None)
        .await;
    assert_eq!(priced["data"].as_array().unwrap().len(), 1);
    assert_eq!(priced["data"][0]["code"], "TOLDO");

    let (status, _) = app.call(Method::GET, "/api/products?rented=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::PUT, &format!("/api/products/{}", toldo), Some(json!({ "code": "MESA" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/products?id={}", Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let (status, _) = app.call(Method::PUT, "/api/products/abc", Some(json!({ "name": "X" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_prices_beyond_range_are_rejected() {
    let app = spawn_app(&[]).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/products",
            Some(json!({
                "name": "Carpa",
                "priceNet": "79228162514264337593543950335",
                "priceIva": "79228162514264337593543950335",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Price out of range");
}

#[tokio::test]
async fn manual_backup_mails_every_recipient() {
    let app = spawn_app(&[("BACKUP_EMAIL_RECIPIENTS", "ops@example.com")]).await;
    app.create_rent("R1", "Mesa").await;

    let (status, body) = app
        .call(Method::POST, "/api/backup", Some(json!({ "emails": ["boss@example.com"] })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Manual backup completed successfully");
    assert_eq!(body["data"]["summary"]["totalRents"], 1);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|email| email.attachment.is_some()));
}

#[tokio::test]
async fn manual_backup_without_recipients_fails() {
    let app = spawn_app(&[]).await;

    let (status, body) = app.call(Method::POST, "/api/backup", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Manual backup failed");
    assert_eq!(body["error"], "No backup recipients configured");
    assert_eq!(body["backupType"], "manual");
}

#[tokio::test]
async fn files_need_object_storage() {
    let app = spawn_app(&[]).await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/files",
            Some(json!({ "fileName": "a.png", "fileType": "image/png", "action": "delete" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/files",
            Some(json!({ "fileName": "a.png", "fileType": "image/png", "action": "save" })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
