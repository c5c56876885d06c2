//! Store connection factory and migration tooling.
//!
//! The backend is picked at startup from [`DatabaseSettings::backend`]:
//! - `memory` keeps documents in process and needs no connection
//! - `surreal` connects with the SurrealDB `any` engine, so the protocol follows
//!   the endpoint scheme (`ws://`, `http://`, `mem://`)

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// SurrealDB client type alias using the `Any` engine for runtime protocol selection
pub type SurrealClient = surrealdb::Surreal<surrealdb::engine::any::Any>;

/// Storage backend selected by configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Surreal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "DatabaseSettings::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "DatabaseSettings::default_namespace")]
    pub namespace: String,
    #[serde(default = "DatabaseSettings::default_database")]
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl DatabaseSettings {
    fn default_endpoint() -> String {
        "ws://127.0.0.1:8000".to_string()
    }

    fn default_namespace() -> String {
        "shelf".to_string()
    }

    fn default_database() -> String {
        "books".to_string()
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            endpoint: Self::default_endpoint(),
            namespace: Self::default_namespace(),
            database: Self::default_database(),
            username: None,
            password: None,
        }
    }
}

/// Schema statement contributed by a module
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Open handle to the configured store.
///
/// Built once by [`connect`] and handed to modules during initialization.
#[derive(Clone)]
pub enum Database {
    Memory,
    Surreal(Arc<SurrealClient>),
}

impl Database {
    pub fn backend(&self) -> Backend {
        match self {
            Database::Memory => Backend::Memory,
            Database::Surreal(_) => Backend::Surreal,
        }
    }

    /// Apply module migrations in the given order.
    ///
    /// Statements are expected to be idempotent (`DEFINE ... IF NOT EXISTS`), so
    /// every startup replays all of them.
    pub async fn apply_migrations(&self, migrations: &[(String, Migration)]) -> anyhow::Result<()> {
        let client = match self {
            Database::Memory => {
                tracing::debug!(
                    target: "shelf-db",
                    count = migrations.len(),
                    "memory backend has no schema, skipping migrations"
                );
                return Ok(());
            }
            Database::Surreal(client) => client,
        };

        for (module, migration) in migrations {
            tracing::info!(target: "shelf-db", %module, id = migration.id, "applying migration");

            client
                .query(migration.up)
                .await
                .and_then(|response| response.check())
                .with_context(|| format!("migration '{}' of module '{}' failed", migration.id, module))?;
        }

        Ok(())
    }

    /// Release this handle. Returns `true` when it was the last one and the
    /// connection is closed; other holders keep a SurrealDB connection alive.
    pub fn close(self) -> bool {
        match self {
            Database::Memory => {
                tracing::info!(target: "shelf-db", "memory store released");
                true
            }
            Database::Surreal(client) => match Arc::try_unwrap(client) {
                Ok(client) => {
                    drop(client);
                    tracing::info!(target: "shelf-db", "SurrealDB connection closed");
                    true
                }
                Err(shared) => {
                    tracing::warn!(
                        target: "shelf-db",
                        holders = Arc::strong_count(&shared) - 1,
                        "SurrealDB handle released, connection still in use"
                    );
                    false
                }
            },
        }
    }
}

/// Open the configured store.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Database> {
    match settings.backend {
        Backend::Memory => {
            tracing::info!(target: "shelf-db", "using in-memory book store");
            Ok(Database::Memory)
        }
        Backend::Surreal => {
            let client = connect_surreal(settings).await?;
            Ok(Database::Surreal(Arc::new(client)))
        }
    }
}

async fn connect_surreal(settings: &DatabaseSettings) -> anyhow::Result<SurrealClient> {
    let url_safe = sanitize_url(&settings.endpoint);
    tracing::debug!(target: "shelf-db", "connecting to SurrealDB: {}", url_safe);

    let client = surrealdb::engine::any::connect(settings.endpoint.as_str())
        .await
        .with_context(|| format!("failed to connect to SurrealDB at '{}'", url_safe))?;

    if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
        client
            .signin(surrealdb::opt::auth::Root { username, password })
            .await
            .with_context(|| format!("failed to authenticate with SurrealDB at '{}'", url_safe))?;
    }

    client
        .use_ns(settings.namespace.as_str())
        .use_db(settings.database.as_str())
        .await
        .with_context(|| {
            format!(
                "failed to select namespace '{}' / database '{}' on SurrealDB at '{}'",
                settings.namespace, settings.database, url_safe
            )
        })?;

    tracing::info!(
        target: "shelf-db",
        url = %url_safe,
        ns = %settings.namespace,
        db = %settings.database,
        "SurrealDB connected"
    );

    Ok(client)
}

/// Strip credentials from a connection URL before it reaches the logs.
pub fn sanitize_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(scheme_end) = url.find("://") {
            let scheme = &url[..scheme_end + 3];
            let after_at = &url[at_pos..];
            return format!("{}***{}", scheme, after_at);
        }
    }
    url.to_string()
}
