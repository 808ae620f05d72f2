use serde_json::{Value, json};

use crate::support::spawn_app;

#[tokio::test]
async fn register_login_and_read_the_profile() {
    let app = spawn_app().await;
    let (id, token) = app.register("Asha Rao", "Asha@Example.com").await;

    let resp = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": "asha@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let login: Value = resp.json().await.unwrap();
    assert_eq!(login["id"], id);
    assert_eq!(login["email"], "asha@example.com");
    assert!(login["token"].is_string());
    assert!(login.get("passwordHash").is_none());

    let profile: Value = app
        .client
        .get(app.url("/api/users/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["name"], "Asha Rao");
    assert_eq!(profile["id"], id);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app().await;
    app.register("Asha Rao", "asha@example.com").await;

    let resp = app
        .client
        .post(app.url("/api/users/register"))
        .json(&json!({ "name": "Asha Again", "email": "asha@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User already exists with this email");
}

#[tokio::test]
async fn registration_reports_every_invalid_field() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/users/register"))
        .json(&json!({ "name": "A", "email": "nope", "password": "123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Validation failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email", "password"]);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let app = spawn_app().await;
    app.register("Asha Rao", "asha@example.com").await;

    let resp = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": "asha@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app.client.get(app.url("/api/users/profile")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}
