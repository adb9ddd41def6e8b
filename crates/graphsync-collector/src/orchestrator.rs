//! Periodic collection orchestrator.
//!
//! A process-wide driver ticks over all stored configurations. Disabled
//! configurations are flipped inactive and skipped; enabled ones get one
//! independent collection task each, throttled by a one-pass-per-
//! configuration guard: while a pass is still running (or waiting out its
//! refresh interval), further ticks for that configuration are skipped, not
//! queued. A failing pass is logged and isolated; recovery is the next tick.

use graphsync_core::GraphResource;
use graphsync_db::Configuration;
use graphsync_msgraph::{Credentials, GraphClient, GraphEnvironment};
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::assets::{self, AssetBackend};
use crate::CollectError;

/// One-pass-per-configuration guard.
///
/// The lock is held only for the map mutation, never across a remote call.
#[derive(Debug, Default)]
struct InFlight {
    keys: Mutex<HashSet<i64>>,
}

impl InFlight {
    /// Claims the key; false when a pass is already running for it.
    fn try_begin(&self, id: i64) -> bool {
        self.keys.lock().expect("in-flight lock poisoned").insert(id)
    }

    fn finish(&self, id: i64) {
        self.keys.lock().expect("in-flight lock poisoned").remove(&id);
    }
}

/// The periodic multi-tenant collection driver.
pub struct Collector {
    pool: PgPool,
    backend: Arc<dyn AssetBackend>,
    env: GraphEnvironment,
    in_flight: Arc<InFlight>,
    no_config_notice: AtomicBool,
}

impl Collector {
    pub fn new(pool: PgPool, backend: Arc<dyn AssetBackend>, env: GraphEnvironment) -> Self {
        Self {
            pool,
            backend,
            env,
            in_flight: Arc::new(InFlight::default()),
            no_config_notice: AtomicBool::new(false),
        }
    }

    /// Runs the driver until the process ends.
    pub async fn run(self: Arc<Self>, tick_interval: Duration) {
        loop {
            self.tick().await;
            tokio::time::sleep(tick_interval).await;
        }
    }

    /// One scheduling round over all configurations.
    pub async fn tick(&self) {
        let configs = match Configuration::list(&self.pool).await {
            Ok(configs) => configs,
            Err(e) => {
                error!(error = %e, "couldn't read configurations from DB");
                return;
            }
        };

        if configs.is_empty() {
            if !self.no_config_notice.swap(true, Ordering::SeqCst) {
                info!("no configurations in DB, waiting for the app to be configured");
            }
            return;
        }
        self.no_config_notice.store(false, Ordering::SeqCst);

        for config in configs {
            if !config.enable {
                if config.active {
                    if let Err(e) = Configuration::set_active(&self.pool, config.id, false).await {
                        error!(config_id = config.id, error = %e, "deactivating configuration failed");
                    }
                }
                continue;
            }

            if !config.active {
                if let Err(e) = Configuration::set_active(&self.pool, config.id, true).await {
                    error!(config_id = config.id, error = %e, "activating configuration failed");
                    continue;
                }
                info!(
                    config_id = config.id,
                    refresh_interval = config.refresh_interval,
                    request_timeout = config.request_timeout,
                    project_ids = ?config.project_ids,
                    "collection initialized for configuration"
                );
            }

            if !self.in_flight.try_begin(config.id) {
                continue;
            }

            let pool = self.pool.clone();
            let backend = Arc::clone(&self.backend);
            let env = self.env.clone();
            let in_flight = Arc::clone(&self.in_flight);
            tokio::spawn(async move {
                let config_id = config.id;
                info!(config_id, "collecting started");
                match run_pass(&pool, backend.as_ref(), &env, &config).await {
                    Ok(()) => info!(config_id, "collecting finished"),
                    Err(e) => error!(config_id, error = %e, "collecting failed"),
                }
                // Hold the key through the refresh interval so the next pass
                // starts one interval after this one ended, success or not.
                tokio::time::sleep(Duration::from_secs(config.refresh_interval.max(0) as u64))
                    .await;
                in_flight.finish(config_id);
            });
        }
    }

    /// One full collection pass for a single configuration.
    pub async fn collect_once(&self, config: &Configuration) -> Result<(), CollectError> {
        run_pass(&self.pool, self.backend.as_ref(), &self.env, config).await
    }
}

/// Discover, enrich and mirror everything one configuration covers.
#[instrument(skip(pool, backend, env, config), fields(config_id = config.id))]
async fn run_pass(
    pool: &PgPool,
    backend: &dyn AssetBackend,
    env: &GraphEnvironment,
    config: &Configuration,
) -> Result<(), CollectError> {
    let client = graph_client(env, config)?;

    let mut rooms = client.list_rooms(config.filter_rules()).await?;
    info!(config_id = config.id, count = rooms.len(), "got rooms");

    let mut equipment = client.list_equipment(config.filter_rules()).await?;
    info!(config_id = config.id, count = equipment.len(), "got equipment");

    {
        let mut union: Vec<&mut dyn GraphResource> = rooms
            .iter_mut()
            .map(|r| r as &mut dyn GraphResource)
            .chain(equipment.iter_mut().map(|e| e as &mut dyn GraphResource))
            .collect();
        client.fetch_schedules(&mut union).await?;
    }

    let resources: Vec<&dyn GraphResource> = rooms
        .iter()
        .map(|r| r as &dyn GraphResource)
        .chain(equipment.iter().map(|e| e as &dyn GraphResource))
        .collect();

    assets::ensure_assets(pool, backend, config, &resources).await?;
    assets::upsert_data(pool, backend, config, &resources).await?;
    Ok(())
}

/// Builds the service-account Graph client for a configuration.
fn graph_client(env: &GraphEnvironment, config: &Configuration) -> Result<GraphClient, CollectError> {
    let (Some(_secret), Some(username), Some(password)) = (
        config.client_secret.as_ref(),
        config.username.as_ref(),
        config.password.as_ref(),
    ) else {
        return Err(CollectError::Config(format!(
            "configuration {} is missing credential material",
            config.id
        )));
    };

    let credentials = Credentials::UsernamePassword {
        client_id: config.client_id.clone(),
        tenant_id: config.tenant_id.clone(),
        username: username.clone(),
        password: password.clone().into(),
    };
    let timeout = Duration::from_secs(config.request_timeout.max(1) as u64);
    GraphClient::new(credentials, env.clone(), timeout).map_err(CollectError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_guard_claims_once_per_key() {
        let guard = InFlight::default();
        assert!(guard.try_begin(1));
        assert!(!guard.try_begin(1));
        assert!(guard.try_begin(2));
        guard.finish(1);
        assert!(guard.try_begin(1));
    }
}
