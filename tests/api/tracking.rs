use serde_json::{Value, json};

use crate::support::spawn_app;

#[tokio::test]
async fn events_are_recorded_with_request_details() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/tracking/product-view"))
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .header("referer", "https://techstore.example/products/2")
        .json(&json!({ "product_id": 2, "visitor_id": "v-42", "view_duration": 30 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Product view tracked successfully");

    let activities = app.store.activities();
    assert_eq!(activities.len(), 1);
    let activity = &activities[0];
    assert_eq!(activity.activity_type, "product_view");
    assert_eq!(activity.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(activity.page_url, "https://techstore.example/products/2");
    assert_eq!(activity.visitor_id.as_deref(), Some("v-42"));
    assert_eq!(activity.activity_data["view_duration"], 30);
}

#[tokio::test]
async fn a_valid_token_attributes_the_event() {
    let app = spawn_app().await;
    let (user_id, token) = app.register("Asha Rao", "asha@example.com").await;

    let resp = app
        .client
        .post(app.url("/api/tracking/add-to-cart"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": 1, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    assert_eq!(app.store.activities()[0].user_id, Some(user_id));
}

#[tokio::test]
async fn removal_and_logout_answer_ok() {
    let app = spawn_app().await;

    for path in ["/api/tracking/remove-from-cart", "/api/tracking/logout"] {
        let resp = app
            .client
            .post(app.url(path))
            .json(&json!({ "product_id": 1, "visitor_id": "v-1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
    assert_eq!(app.store.activities().len(), 2);
}

#[tokio::test]
async fn product_events_without_a_product_are_rejected() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/tracking/add-to-cart"))
        .json(&json!({ "visitor_id": "v-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(app.store.activities().is_empty());
}

#[tokio::test]
async fn login_and_logout_bracket_a_session() {
    let app = spawn_app().await;
    let (user_id, token) = app.register("Asha Rao", "asha@example.com").await;

    let resp = app
        .client
        .post(app.url("/api/tracking/login"))
        .bearer_auth(&token)
        .header("user-agent", "storefront/1.0")
        .json(&json!({ "session_token": "sess-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let sessions = app.store.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].user_id, user_id);
    assert_eq!(sessions[0].user_agent.as_deref(), Some("storefront/1.0"));
    assert!(sessions[0].is_active);

    let resp = app
        .client
        .post(app.url("/api/tracking/logout"))
        .json(&json!({ "user_id": user_id, "session_token": "sess-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let sessions = app.store.sessions();
    assert!(!sessions[0].is_active);
    assert!(sessions[0].logout_time.is_some());
}
