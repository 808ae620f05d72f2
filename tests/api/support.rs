//! Spawns the application on an ephemeral port backed by a [`MemoryStore`].

use serde_json::{Value, json};
use techstore_orderservice::{
    app_state::AppState,
    config::Config,
    domain::{Category, NewProduct},
    routes,
    stores::{CatalogStore, Stores, memory::MemoryStore},
};

pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
    pub store: MemoryStore,
}

pub async fn spawn_app() -> TestApp {
    let mut config = Config::default();
    config.auth.jwt_secret = "integration-secret".into();
    spawn_app_with(config).await
}

/// Bind to port 0 and serve the app in the background.
pub async fn spawn_app_with(config: Config) -> TestApp {
    let store = MemoryStore::with_demo_catalog();
    let app = routes::app(AppState::new(&config, Stores::single(store.clone())));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        store,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Registers a user and returns `(id, token)`.
    pub async fn register(&self, name: &str, email: &str) -> (i32, String) {
        let resp = self
            .client
            .post(self.url("/api/users/register"))
            .json(&json!({ "name": name, "email": email, "password": "secret1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        (
            body["id"].as_i64().unwrap() as i32,
            body["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn add_product(&self, name: &str, price: &str) -> i32 {
        self.store
            .create_product(NewProduct {
                name: name.into(),
                price: price.parse().unwrap(),
                description: String::new(),
                category: Category::Processors,
                image: String::new(),
                image_alt: name.into(),
                stock: 50,
            })
            .await
            .unwrap()
            .id
    }
}

pub fn address() -> Value {
    json!({
        "address": "221B Baker Street",
        "city": "London",
        "postalCode": "NW1 6XE",
        "country": "UK"
    })
}
