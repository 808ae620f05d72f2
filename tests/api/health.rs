use serde_json::Value;

use crate::support::spawn_app;

#[tokio::test]
async fn root_and_health_answer() {
    let app = spawn_app().await;

    let body: Value = app
        .client
        .get(app.url("/api"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "TechStore API is running");

    let resp = app.client.get(app.url("/api/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn openapi_document_lists_the_order_routes() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/api-docs/openapi.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let doc: Value = resp.json().await.unwrap();
    assert_eq!(doc["info"]["title"], "TechStore OrderService API");
    assert!(doc["paths"]["/api/orders"]["post"].is_object());
    assert!(doc["paths"]["/api/orders/{id}/pay"]["put"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearerAuth"].is_object());
}
