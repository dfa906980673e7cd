/// Integration tests for the task endpoints, health check, and fallback

mod common;

use axum::http::StatusCode;
use axum::routing::get;
use common::TestContext;
use serde_json::json;
use taskflow_api::app::api_routes;
use taskflow_shared::storage::Storage;

fn titles(body: &serde_json::Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|t| t["titulo"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_task_defaults() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post("/api/tasks", json!({"titulo": "  Escribir tests  "}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({
            "id": 1,
            "titulo": "Escribir tests",
            "descripcion": "",
            "completada": false,
            "prioridad": "media",
            "usuario_id": null
        })
    );
}

#[tokio::test]
async fn test_create_task_validation() {
    let ctx = TestContext::new();

    let cases = [
        (json!({}), "No se enviaron datos"),
        (
            json!({"descripcion": "sin título"}),
            "El título es requerido y no puede estar vacío",
        ),
        (
            json!({"titulo": "X", "prioridad": "urgente"}),
            "La prioridad debe ser: alta, media o baja",
        ),
        (
            json!({"titulo": "X", "usuario_id": 42}),
            "El usuario asignado no existe",
        ),
    ];

    for (body, message) in cases {
        let (status, response) = ctx.post("/api/tasks", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response["error"], message, "body {}", body);
    }

    let (_, tasks) = ctx.get("/api/tasks").await;
    assert_eq!(tasks, json!([]));
}

#[tokio::test]
async fn test_create_task_objects_with_null_or_mistyped_fields() {
    let ctx = TestContext::new();
    ctx.create_user("Ana", "ana@x.com").await;

    let cases = [
        (
            json!({"titulo": null}),
            "El título es requerido y no puede estar vacío",
        ),
        (
            json!({"titulo": 5}),
            "El título es requerido y no puede estar vacío",
        ),
        (
            json!({"etiqueta": "x"}),
            "El título es requerido y no puede estar vacío",
        ),
        (
            json!({"titulo": "x", "usuario_id": "1"}),
            "El usuario asignado no existe",
        ),
        (
            json!({"titulo": "x", "usuario_id": 1.5}),
            "El usuario asignado no existe",
        ),
    ];

    for (body, message) in cases {
        let (status, response) = ctx.post("/api/tasks", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response, json!({"error": message}), "body {}", body);
    }

    let (_, tasks) = ctx.get("/api/tasks").await;
    assert_eq!(tasks, json!([]));
}

#[tokio::test]
async fn test_update_task_with_only_unknown_fields_returns_it_unchanged() {
    let ctx = TestContext::new();
    let task = ctx.create_task(json!({"titulo": "Original"})).await;
    let uri = format!("/api/tasks/{}", task);
    let (_, before) = ctx.get(&uri).await;

    let (status, body) = ctx.put(&uri, json!({"etiqueta": "x"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, before);
}

#[tokio::test]
async fn test_handler_panic_becomes_json_500() {
    async fn explode() -> &'static str {
        panic!("storage layer exploded")
    }

    let routes = api_routes().route("/boom", get(explode));
    let ctx = TestContext::with_routes(Storage::memory(), routes);

    let (status, body) = ctx.get("/boom").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Error interno del servidor", "mensaje": "Ha ocurrido un error inesperado"})
    );

    // The router keeps serving after a panic
    let (status, _) = ctx.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_get_task() {
    let ctx = TestContext::seeded();

    let (status, body) = ctx.get("/api/tasks/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["titulo"], "Crear frontend con React");
    assert_eq!(body["usuario_id"], 2);

    let (status, body) = ctx.get("/api/tasks/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Tarea no encontrada"}));
}

#[tokio::test]
async fn test_list_filters() {
    let ctx = TestContext::seeded();

    let (_, body) = ctx.get("/api/tasks").await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = ctx.get("/api/tasks?completada=TRUE").await;
    assert_eq!(titles(&body), vec!["Diseñar base de datos"]);

    let (_, body) = ctx.get("/api/tasks?completada=no").await;
    assert_eq!(
        titles(&body),
        vec!["Implementar API REST", "Crear frontend con React"]
    );

    // completada wins over prioridad
    let (_, body) = ctx.get("/api/tasks?completada=true&prioridad=media").await;
    assert_eq!(titles(&body), vec!["Diseñar base de datos"]);

    let (_, body) = ctx.get("/api/tasks?prioridad=media").await;
    assert_eq!(titles(&body), vec!["Crear frontend con React"]);

    let (status, body) = ctx.get("/api/tasks?prioridad=urgente").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = ctx.get("/api/tasks/completed").await;
    assert_eq!(titles(&body), vec!["Diseñar base de datos"]);

    let (_, body) = ctx.get("/api/tasks/pending").await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_task() {
    let ctx = TestContext::new();
    let ana = ctx.create_user("Ana", "ana@x.com").await;
    let task = ctx
        .create_task(json!({"titulo": "Original", "usuario_id": ana}))
        .await;
    let uri = format!("/api/tasks/{}", task);

    let (status, body) = ctx
        .put(
            &uri,
            json!({"titulo": "Renombrada", "prioridad": "baja", "completada": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["titulo"], "Renombrada");
    assert_eq!(body["prioridad"], "baja");
    assert_eq!(body["completada"], true);
    assert_eq!(body["usuario_id"], ana);

    let (status, body) = ctx.put(&uri, json!({"usuario_id": 99})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "El usuario asignado no existe");

    let (status, body) = ctx.put(&uri, json!({"titulo": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "El título no puede estar vacío");

    // null unassigns
    let (status, body) = ctx.put(&uri, json!({"usuario_id": null})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usuario_id"], serde_json::Value::Null);
    assert_eq!(body["titulo"], "Renombrada");

    let (status, body) = ctx.put(&uri, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No se enviaron datos");

    let (status, body) = ctx.put("/api/tasks/99", json!({"titulo": "X"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Tarea no encontrada");
}

#[tokio::test]
async fn test_complete_task_is_idempotent() {
    let ctx = TestContext::seeded();

    for _ in 0..2 {
        let (status, body) = ctx.patch("/api/tasks/2/complete").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completada"], true);
        assert_eq!(body["titulo"], "Implementar API REST");
    }
}

#[tokio::test]
async fn test_complete_missing_task() {
    let ctx = TestContext::new();

    let (status, body) = ctx.patch("/api/tasks/1/complete").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Tarea no encontrada"}));
}

#[tokio::test]
async fn test_delete_task() {
    let ctx = TestContext::seeded();

    let (status, body) = ctx.delete("/api/tasks/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Tarea eliminada exitosamente"}));

    let (status, body) = ctx.delete("/api/tasks/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Tarea no encontrada");

    // Juan no longer has tasks and can be removed
    let (status, _) = ctx.delete("/api/users/2").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_ids_are_not_reused_after_delete() {
    let ctx = TestContext::new();
    let first = ctx.create_task(json!({"titulo": "uno"})).await;
    ctx.delete(&format!("/api/tasks/{}", first)).await;

    let second = ctx.create_task(json!({"titulo": "dos"})).await;
    assert!(second > first);
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "TaskFlow API v2.0");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["database"], "connected");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let ctx = TestContext::new();

    for uri in ["/api/nope", "/", "/api/users/1/avatar"] {
        let (status, body) = ctx.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(
            body,
            json!({"error": "Endpoint no encontrado", "mensaje": "La ruta solicitada no existe"})
        );
    }
}
