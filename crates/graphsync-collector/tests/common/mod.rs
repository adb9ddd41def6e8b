//! Common test utilities for collector integration tests.

#![cfg(feature = "integration")]

use async_trait::async_trait;
use graphsync_collector::{AssetBackend, AssetDescriptor, AssetError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

/// Recording platform backend handing out sequential asset ids.
#[derive(Debug, Default)]
pub struct MockBackend {
    next_id: AtomicI32,
    pub upserts: Mutex<Vec<AssetDescriptor>>,
    pub data: Mutex<Vec<(i32, serde_json::Value)>>,
}

impl MockBackend {
    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }

    pub fn data_count(&self) -> usize {
        self.data.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetBackend for MockBackend {
    async fn upsert_asset(&self, descriptor: AssetDescriptor) -> Result<i32, AssetError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.upserts.lock().unwrap().push(descriptor);
        Ok(id)
    }

    async fn upsert_asset_data(
        &self,
        asset_id: i32,
        payload: serde_json::Value,
    ) -> Result<(), AssetError> {
        self.data.lock().unwrap().push((asset_id, payload));
        Ok(())
    }
}

/// Connects to the scratch database and resets the schema state.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch Postgres");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("connecting to test database");
    graphsync_db::migrations::run(&pool)
        .await
        .expect("running migrations");
    sqlx::query("TRUNCATE configuration RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("truncating tables");
    pool
}
