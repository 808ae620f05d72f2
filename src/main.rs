use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use techstore_orderservice::{
    app_state::AppState,
    bootstrap,
    config::{self, StoreBackend},
    db, routes,
    stores::{Stores, memory::MemoryStore, postgres::PgStore},
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    let stores = match config.database.backend {
        StoreBackend::Postgres => {
            tracing::info!("Running migrations...");
            let migrations_count =
                db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
            tracing::info!("Run {} new migrations successfully", migrations_count);

            let pool = db::create_pool(&config.database).await?;
            Stores::single(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on restart");
            Stores::single(MemoryStore::with_demo_catalog())
        }
    };

    let port = config.server.port;
    let app = routes::app(AppState::new(&config, stores));

    tracing::info!("Bootstrapping...");
    bootstrap::serve("TechStore OrderService", app, port).await
}
