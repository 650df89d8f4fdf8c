// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use anyhow::{anyhow, Context, Result};
use deadpool::Runtime;
use diesel::{Connection, PgConnection};
use diesel_async::{pooled_connection::AsyncDieselConnectionManager, AsyncPgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

pub type DbPool = deadpool::managed::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;
pub type DbConnection = deadpool::managed::Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database manager for the social core
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    url: String,
}

impl Database {
    /// Create a new database manager with connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);

        let pool = DbPool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .context("failed to build the connection pool")?;

        let db = Self {
            pool,
            url: config.url.clone(),
        };

        db.initialize().await?;

        Ok(db)
    }

    /// Test connectivity and bring the schema up to date
    async fn initialize(&self) -> Result<()> {
        let _conn = self
            .get_connection()
            .await
            .context("failed to connect to the database")?;
        info!("Successfully connected to the database");

        self.run_migrations().await
    }

    /// Run embedded migrations over a blocking connection
    async fn run_migrations(&self) -> Result<()> {
        let url = self.url.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = PgConnection::establish(&url).context("failed to open migration connection")?;
            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| anyhow!("failed to run migrations: {e}"))?;
            info!("Applied {} database migrations", applied.len());
            Ok(())
        })
        .await
        .context("migration task panicked")?
    }

    /// Get a database connection from the pool
    pub async fn get_connection(&self) -> Result<DbConnection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}
