//! Startup and shutdown sequence.
//!
//! Order: connect store, apply migrations, init modules, start modules, serve.
//! Teardown runs in reverse: stop modules, close the store.

use anyhow::Context;
use axum::Router;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Running application: settings, the open store, and initialized modules.
pub struct App {
    pub settings: Settings,
    pub db: Database,
    pub registry: ModuleRegistry,
}

impl App {
    /// Connect the store and bring every module up.
    pub async fn init(settings: Settings) -> anyhow::Result<Self> {
        let db = shelf_db::connect(&settings.database)
            .await
            .context("failed to open the book store")?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry);

        db.apply_migrations(&registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;

        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };
        registry.init_all(&ctx).await?;
        registry.start_all(&ctx).await?;

        Ok(Self {
            settings,
            db,
            registry,
        })
    }

    pub fn router(&self) -> Router {
        shelf_http::build_router(&self.registry, &self.settings)
    }

    /// Stop modules, drop them with their store handles, then close the store.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let Self { db, registry, .. } = self;

        let stopped = registry.stop_all().await;
        drop(registry);
        db.close();
        stopped
    }
}

/// Serve HTTP until Ctrl-C, then shut down cleanly.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let app = App::init(settings).await?;

    let served =
        shelf_http::start_server(&app.registry, &app.settings, shelf_http::shutdown_signal()).await;
    let stopped = app.shutdown().await;

    tracing::info!("shelf-app shutdown complete");
    served.and(stopped)
}

/// Apply migrations against the configured store and exit.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let db = shelf_db::connect(&settings.database)
        .await
        .context("failed to open the book store")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);

    let migrations = registry.collect_migrations();
    db.apply_migrations(&migrations)
        .await
        .context("failed to apply migrations")?;
    db.close();

    Ok(migrations.len())
}
