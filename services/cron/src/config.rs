use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub discord_token: String,
    pub discord_api_base: String,
    pub ergast_base_url: String,
    pub environment: String,
    pub limits: Limits,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env_or("PORT", 3000)?,
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            discord_token: std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?,
            discord_api_base: std::env::var("DISCORD_API_BASE")
                .unwrap_or_else(|_| "https://discord.com/api/v10".to_string()),
            ergast_base_url: std::env::var("ERGAST_BASE_URL")
                .unwrap_or_else(|_| "https://api.jolpi.ca/ergast/f1".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            limits: Limits::from_env()?,
        })
    }
}

/// How the scheduler protects the at-most-once guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Deliver first, then record. A failed record can lead to a duplicate.
    RecordAfterSend,
    /// Record first, then deliver. A failed delivery leads to a missed reminder.
    ClaimBeforeSend,
}

impl FromStr for DedupMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "record-after-send" => Ok(Self::RecordAfterSend),
            "claim-before-send" => Ok(Self::ClaimBeforeSend),
            other => anyhow::bail!("unknown dedup mode: {other}"),
        }
    }
}

/// Tunables shared by the Ergast client, the channel limiter and the scheduler.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Lookahead for upcoming sessions; also caps every guild's lead time.
    pub max_reminder_minutes: i64,
    pub tick_interval: Duration,
    pub run_on_start: bool,

    pub cache_ttl_secs: u64,
    pub burst_limit: usize,
    pub burst_window: Duration,
    pub sustained_limit: usize,
    pub sustained_window: Duration,
    pub throttle_step: Duration,
    pub inter_page_delay: Duration,

    pub inter_delivery_delay: Duration,
    pub channel_reset_buffer: Duration,
    pub max_delivery_attempts: u32,
    pub default_retry_after: Duration,

    pub request_timeout: Duration,
    pub dedup_mode: DedupMode,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_reminder_minutes: 60,
            tick_interval: Duration::from_secs(60),
            run_on_start: true,
            cache_ttl_secs: 3600,
            burst_limit: 4,
            burst_window: Duration::from_secs(1),
            sustained_limit: 500,
            sustained_window: Duration::from_secs(3600),
            throttle_step: Duration::from_millis(250),
            inter_page_delay: Duration::from_millis(250),
            inter_delivery_delay: Duration::from_millis(250),
            channel_reset_buffer: Duration::from_millis(100),
            max_delivery_attempts: 2,
            default_retry_after: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            dedup_mode: DedupMode::RecordAfterSend,
        }
    }
}

/// Longest lead time a guild can ask for, one day.
pub const MAX_REMINDER_MINUTES_CAP: i64 = 24 * 60;

impl Limits {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let limits = Self {
            max_reminder_minutes: env_or("MAX_REMINDER_MINUTES", defaults.max_reminder_minutes)?,
            tick_interval: Duration::from_secs(env_or("TICK_INTERVAL_SECS", 60)?),
            run_on_start: env_or("RUN_ON_START", defaults.run_on_start)?,
            cache_ttl_secs: env_or("CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            burst_limit: env_or("ERGAST_BURST_LIMIT", defaults.burst_limit)?,
            sustained_limit: env_or("ERGAST_SUSTAINED_LIMIT", defaults.sustained_limit)?,
            request_timeout: Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 10)?),
            dedup_mode: env_or("REMINDER_DEDUP_MODE", defaults.dedup_mode)?,
            ..defaults
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_REMINDER_MINUTES_CAP).contains(&self.max_reminder_minutes) {
            anyhow::bail!(
                "MAX_REMINDER_MINUTES must be between 1 and {MAX_REMINDER_MINUTES_CAP}, got {}",
                self.max_reminder_minutes
            );
        }
        Ok(())
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {name}: {e}")),
        _ => Ok(default),
    }
}
