use serde_json::{Value, json};
use techstore_orderservice::stores::memory::Faults;

use crate::support::{TestApp, address, spawn_app};

async fn place(app: &TestApp, token: &str, body: Value) -> reqwest::Response {
    app.client
        .post(app.url("/api/orders"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

fn cart(items: Value) -> Value {
    json!({
        "orderItems": items,
        "shippingAddress": address(),
        "paymentMethod": "cod"
    })
}

#[tokio::test]
async fn place_order_then_fetch_and_pay() {
    let app = spawn_app().await;
    let (user_id, token) = app.register("Asha Rao", "asha@example.com").await;
    let cpu = app.add_product("Ryzen 5", "499.00").await;
    let gpu = app.add_product("RTX 4060", "1200.00").await;

    let resp = place(
        &app,
        &token,
        cart(json!([
            { "productId": cpu, "quantity": 2, "price": 499, "name": "Ryzen 5" },
            { "productId": gpu, "quantity": 1, "price": "1200.00" }
        ])),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["userId"], user_id);
    assert_eq!(order["totalAmount"], "2198.00");
    assert_eq!(order["isPaid"], false);
    assert_eq!(order["isDelivered"], false);
    assert_eq!(order["paymentMethod"], "cod");
    assert_eq!(order["shippingAddress"]["postalCode"], "NW1 6XE");
    let items = order["orderItems"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["productId"], cpu);
    assert_eq!(items[0]["price"], "499.00");
    assert_eq!(items[1]["product"]["name"], "RTX 4060");
    assert_eq!(order["user"]["email"], "asha@example.com");

    let id = order["id"].as_i64().unwrap();
    let fetched: Value = app
        .client
        .get(app.url(&format!("/api/orders/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, order);

    let resp = app
        .client
        .put(app.url(&format!("/api/orders/{id}/pay")))
        .bearer_auth(&token)
        .json(&json!({
            "id": "PAY-123",
            "status": "COMPLETED",
            "updateTime": "2025-10-01T10:00:00Z",
            "emailAddress": "asha@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let paid: Value = resp.json().await.unwrap();
    assert_eq!(paid["isPaid"], true);
    assert!(paid["paidAt"].is_string());
    assert_eq!(paid["paymentResult"]["id"], "PAY-123");
    assert_eq!(paid["totalAmount"], "2198.00");
}

#[tokio::test]
async fn my_orders_lists_only_the_callers_orders_newest_first() {
    let app = spawn_app().await;
    let (_, asha) = app.register("Asha Rao", "asha@example.com").await;
    let (_, ravi) = app.register("Ravi Kumar", "ravi@example.com").await;
    let cpu = app.add_product("Ryzen 5", "499.00").await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let order: Value = place(&app, &asha, cart(json!([{ "productId": cpu, "quantity": 1, "price": 499 }])))
            .await
            .json()
            .await
            .unwrap();
        ids.push(order["id"].as_i64().unwrap());
    }
    place(&app, &ravi, cart(json!([{ "productId": cpu, "quantity": 1, "price": 499 }]))).await;

    for path in ["/api/orders", "/api/orders/myorders"] {
        let orders: Vec<Value> = app
            .client
            .get(app.url(path))
            .bearer_auth(&asha)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let listed: Vec<i64> = orders.iter().map(|o| o["id"].as_i64().unwrap()).collect();
        assert_eq!(listed, vec![ids[1], ids[0]]);
    }
}

#[tokio::test]
async fn other_users_orders_are_forbidden_and_missing_ones_not_found() {
    let app = spawn_app().await;
    let (_, asha) = app.register("Asha Rao", "asha@example.com").await;
    let (_, ravi) = app.register("Ravi Kumar", "ravi@example.com").await;
    let cpu = app.add_product("Ryzen 5", "499.00").await;

    let order: Value = place(&app, &asha, cart(json!([{ "productId": cpu, "quantity": 1, "price": 499 }])))
        .await
        .json()
        .await
        .unwrap();
    let id = order["id"].as_i64().unwrap();

    let resp = app
        .client
        .get(app.url(&format!("/api/orders/{id}")))
        .bearer_auth(&ravi)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(app.url(&format!("/api/orders/{id}/pay")))
        .bearer_auth(&ravi)
        .json(&json!({ "id": "PAY-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(app.url("/api/orders/99999"))
        .bearer_auth(&asha)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Order not found");
}

#[tokio::test]
async fn invalid_carts_are_rejected_without_writing() {
    let app = spawn_app().await;
    let (_, token) = app.register("Asha Rao", "asha@example.com").await;
    let cpu = app.add_product("Ryzen 5", "499.00").await;

    let resp = place(&app, &token, cart(json!([]))).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "No order items");

    let cases = [
        cart(json!([{ "productId": cpu, "quantity": 0, "price": 499 }])),
        cart(json!([{ "productId": cpu, "quantity": 101, "price": 499 }])),
        cart(json!([{ "productId": 4242, "quantity": 1, "price": 499 }])),
        json!({
            "orderItems": [{ "productId": cpu, "quantity": 1, "price": 499 }],
            "shippingAddress": { "address": "1 Main St", "city": "", "postalCode": "1", "country": "IN" },
            "paymentMethod": "cod"
        }),
        json!({
            "orderItems": [{ "productId": cpu, "quantity": 1, "price": 499 }],
            "shippingAddress": address(),
            "paymentMethod": "bitcoin"
        }),
        json!({
            "orderItems": [{ "productId": cpu, "quantity": 1, "price": 499 }],
            "shippingAddress": address(),
            "paymentMethod": "cod",
            "totalPrice": "1.00"
        }),
    ];
    for body in cases {
        let resp = place(&app, &token, body).await;
        assert_eq!(resp.status(), 400);
    }

    let resp = app
        .client
        .post(app.url("/api/orders"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    assert_eq!(app.store.order_count(), 0);
    assert_eq!(app.store.order_item_count(), 0);
}

#[tokio::test]
async fn amounts_beyond_the_stored_precision_are_client_errors() {
    let app = spawn_app().await;
    let (_, token) = app.register("Asha Rao", "asha@example.com").await;
    let cpu = app.add_product("Ryzen 5", "499.00").await;

    let resp = place(
        &app,
        &token,
        cart(json!([{ "productId": cpu, "quantity": 100, "price": "900000000000.00" }])),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "orderItems[0].price cannot exceed 99999999.99");

    let resp = place(
        &app,
        &token,
        cart(json!([
            { "productId": cpu, "quantity": 100, "price": "99999999.99" },
            { "productId": cpu, "quantity": 100, "price": "99999999.99" }
        ])),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Order total cannot exceed 9999999999.99");

    assert_eq!(app.store.order_count(), 0);
}

#[tokio::test]
async fn non_numeric_order_ids_are_rejected_as_json() {
    let app = spawn_app().await;
    let (_, token) = app.register("Asha Rao", "asha@example.com").await;

    let resp = app
        .client
        .get(app.url("/api/orders/abc"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("abc"));
}

#[tokio::test]
async fn orders_require_a_valid_token() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/orders"))
        .json(&cart(json!([{ "productId": 1, "quantity": 1, "price": 1 }])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/api/orders/myorders"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(app.store.order_count(), 0);
}

#[tokio::test]
async fn a_failed_transaction_leaves_no_rows() {
    let app = spawn_app().await;
    let (_, token) = app.register("Asha Rao", "asha@example.com").await;
    let cpu = app.add_product("Ryzen 5", "499.00").await;
    let gpu = app.add_product("RTX 4060", "1200.00").await;
    app.store.inject(Faults {
        fail_on_line_item: Some(1),
        ..Faults::default()
    });

    let resp = place(
        &app,
        &token,
        cart(json!([
            { "productId": cpu, "quantity": 1, "price": 499 },
            { "productId": gpu, "quantity": 1, "price": 1200 }
        ])),
    )
    .await;
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Order could not be saved, no changes were made");
    assert_eq!(app.store.order_count(), 0);
    assert_eq!(app.store.order_item_count(), 0);
}

#[tokio::test]
async fn a_failed_read_back_returns_the_order_id() {
    let app = spawn_app().await;
    let (_, token) = app.register("Asha Rao", "asha@example.com").await;
    let cpu = app.add_product("Ryzen 5", "499.00").await;
    app.store.inject(Faults {
        fail_order_reads: true,
        ..Faults::default()
    });

    let resp = place(&app, &token, cart(json!([{ "productId": cpu, "quantity": 1, "price": 499 }]))).await;
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    let id = body["orderId"].as_i64().unwrap();

    app.store.clear_faults();
    let resp = app
        .client
        .get(app.url(&format!("/api/orders/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
