use serde_json::{Value, json};

use crate::support::spawn_app;

#[tokio::test]
async fn list_and_filter_by_category() {
    let app = spawn_app().await;

    let all: Vec<Value> = app
        .client
        .get(app.url("/api/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 5);

    let also_all: Vec<Value> = app
        .client
        .get(app.url("/api/products?category=all"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(also_all.len(), 5);

    let graphics: Vec<Value> = app
        .client
        .get(app.url("/api/products?category=graphics"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(graphics.len(), 1);
    assert_eq!(graphics[0]["category"], "graphics");
    assert_eq!(graphics[0]["price"], "54999.00");

    let resp = app
        .client
        .get(app.url("/api/products?category=toys"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn fetch_single_product() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/api/products/1")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let product: Value = resp.json().await.unwrap();
    assert_eq!(product["id"], 1);
    assert!(product["imageAlt"].is_string());

    let resp = app.client.get(app.url("/api/products/999")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn creating_products_needs_a_token_and_valid_fields() {
    let app = spawn_app().await;
    let product = json!({
        "name": "Noctua NH-D15",
        "price": 8999.5,
        "description": "Dual tower air cooler",
        "category": "cooling",
        "stock": 12,
        "image": "https://cdn.example.com/nh-d15.png"
    });

    let resp = app
        .client
        .post(app.url("/api/products"))
        .json(&product)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let (_, token) = app.register("Asha Rao", "asha@example.com").await;
    let resp = app
        .client
        .post(app.url("/api/products"))
        .bearer_auth(&token)
        .json(&product)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["price"], "8999.50");
    assert_eq!(created["imageAlt"], "Noctua NH-D15");

    let resp = app
        .client
        .post(app.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({ "name": "X", "price": -1, "category": "toys" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn malformed_ids_and_filters_answer_with_json_errors() {
    let app = spawn_app().await;

    for path in ["/api/products/abc", "/api/products?category=memory&category=cooling"] {
        let resp = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].is_string());
    }
}
