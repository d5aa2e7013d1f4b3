pub mod cache;
pub mod clock;
pub mod config;
pub mod discord;
pub mod ergast;
pub mod errors;
pub mod health;
pub mod scheduler;
pub mod store;

use anyhow::Context;
use postgres_models::DbPool;
use redis_cache::{RedisPool, ResponseCache};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::discord::{DiscordRest, ReminderSender};
use crate::ergast::sessions::ErgastSessionSource;
use crate::ergast::transport::ReqwestTransport;
use crate::ergast::ErgastClient;
use crate::scheduler::SessionReminderScheduler;
use crate::store::{PgGuildConfigStore, PgSentNotificationStore};

/// Sent on every outbound request, to Discord and to Ergast alike.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub redis_pool: RedisPool,
    pub ergast: Arc<ErgastClient>,
    pub scheduler: Arc<SessionReminderScheduler>,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = postgres_models::create_pool(&config.database_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
        let redis_pool = redis_cache::create_pool(&config.redis_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create Redis pool: {}", e))?;

        let limits = &config.limits;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let transport = ReqwestTransport::new(limits.request_timeout)
            .context("Failed to build Ergast HTTP client")?;
        let ergast = Arc::new(ErgastClient::new(
            config.ergast_base_url.as_str(),
            Arc::new(transport),
            Arc::new(ResponseCache::new(redis_pool.clone())),
            limits,
        ));

        let discord = DiscordRest::new(
            &config.discord_api_base,
            &config.discord_token,
            limits.request_timeout,
        )
        .context("Failed to build Discord HTTP client")?;
        let sender = ReminderSender::new(Arc::new(discord), limits, Arc::clone(&clock));

        let scheduler = Arc::new(SessionReminderScheduler::new(
            Arc::new(ErgastSessionSource::new(Arc::clone(&ergast))),
            Arc::new(PgGuildConfigStore::new(db_pool.clone())),
            Arc::new(PgSentNotificationStore::new(db_pool.clone())),
            sender,
            clock,
            limits.clone(),
        ));

        Ok(Self {
            db_pool,
            redis_pool,
            ergast,
            scheduler,
        })
    }
}
