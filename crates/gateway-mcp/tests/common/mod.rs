//! Shared helpers for gateway integration tests: a small axum pet API and
//! the OpenAPI document describing it.

use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

/// OpenAPI document for the backend in [`spawn_backend`], served at `base_url`.
pub fn pet_spec(base_url: &str) -> Value {
    json!({
        "openapi": "3.1.0",
        "info": {"title": "Pet API", "version": "1.0.0"},
        "servers": [{"url": base_url}],
        "paths": {
            "/pets": {
                "get": {
                    "summary": "List pets",
                    "parameters": [
                        {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                    ],
                },
                "post": {
                    "summary": "Create a pet",
                    "requestBody": {"required": true},
                },
            },
            "/pets/{petId}": {
                "get": {"summary": "Get a pet"},
                "delete": {"summary": "Remove a pet"},
            },
        },
    })
}

async fn list_pets(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({"pets": ["rex", "whiskers"], "query": query}))
}

async fn create_pet(Json(body): Json<Value>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({"created": body})))
}

async fn get_pet(Path(pet_id): Path<String>) -> impl IntoResponse {
    if pet_id == "404" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "no such pet"})),
        );
    }
    (StatusCode::OK, Json(json!({"id": pet_id})))
}

async fn delete_pet(Path(_pet_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"echo": body}))
}

/// Start the backend on an ephemeral port and return its base URL.
pub async fn spawn_backend() -> anyhow::Result<String> {
    let app = Router::new()
        .route("/pets", get(list_pets).post(create_pet))
        .route("/pets/{pet_id}", get(get_pet).delete(delete_pet))
        .route("/echo", post(echo));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}
