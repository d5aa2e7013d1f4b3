//! Rate-limited, cached client for the Ergast-compatible racing-data API.

pub mod limiter;
pub mod models;
pub mod sessions;
pub mod transport;

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::cache::CacheBackend;
use crate::config::Limits;
use limiter::SlidingWindowLimiter;
use models::{
    ConstructorStanding, DriverStanding, DriversResponse, ErgastResponse, RacesResponse,
    StandingsResponse, TableBody,
};
use transport::HttpTransport;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub struct ErgastClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<dyn CacheBackend>,
    limiter: SlidingWindowLimiter,
    cache_ttl_secs: u64,
    inter_page_delay: Duration,
}

impl ErgastClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<dyn CacheBackend>,
        limits: &Limits,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            cache,
            limiter: SlidingWindowLimiter::from_limits(limits),
            cache_ttl_secs: limits.cache_ttl_secs,
            inter_page_delay: limits.inter_page_delay,
        }
    }

    pub fn cache_key(path: &str, limit: u32, offset: u32, extra_params: &str) -> String {
        format!("ergast:{}:{limit}:{offset}:{extra_params}", normalize_path(path))
    }

    /// Fetches the first page of `path` with default paging.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.fetch(path, DEFAULT_PAGE_SIZE, 0, "").await
    }

    /// Fetches one page of `path`, serving from cache when possible.
    ///
    /// Upstream and transport failures are logged and come back as `None`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        limit: u32,
        offset: u32,
        extra_params: &str,
    ) -> Option<T> {
        let key = Self::cache_key(path, limit, offset, extra_params);

        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_str(&cached) {
                Ok(value) => {
                    debug!(key = %key, "Ergast cache hit");
                    return Some(value);
                }
                Err(e) => warn!(key = %key, error = %e, "Discarding unreadable cache entry"),
            }
        }

        let url = match self.build_url(path, limit, offset, extra_params) {
            Ok(url) => url,
            Err(e) => {
                error!(path, error = %e, "Invalid Ergast request URL");
                return None;
            }
        };

        self.limiter.acquire().await;

        let response = match self.transport.get(url.as_str()).await {
            Ok(response) => response,
            Err(e) => {
                error!(url = %url, error = %e, "Ergast request failed");
                return None;
            }
        };

        if !response.is_success() {
            error!(url = %url, status = response.status, "Ergast returned an error status");
            return None;
        }

        let parsed = match serde_json::from_str(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(url = %url, error = %e, "Unexpected Ergast response shape");
                return None;
            }
        };

        if !self.cache.set(&key, &response.body, self.cache_ttl_secs).await {
            warn!(key = %key, "Failed to cache Ergast response");
        }

        Some(parsed)
    }

    /// Walks every page of `path` and merges the table items into one envelope.
    pub async fn fetch_all_paginated<T: TableBody>(
        &self,
        path: &str,
        page_size: u32,
    ) -> Option<ErgastResponse<T>> {
        let page_size = page_size.max(1);
        let key = format!("ergast:all:{}:{page_size}", normalize_path(path));

        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_str(&cached) {
                Ok(value) => return Some(value),
                Err(e) => warn!(key = %key, error = %e, "Discarding unreadable cache entry"),
            }
        }

        let mut merged: Option<ErgastResponse<T>> = None;
        let mut offset: u32 = 0;
        let mut complete = false;

        loop {
            let Some(mut page) = self
                .fetch::<ErgastResponse<T>>(path, page_size, offset, "")
                .await
            else {
                break;
            };

            let total = page.total();
            let page_len = match page.items() {
                Some(items) => items.len(),
                None => {
                    complete = true;
                    break;
                }
            };

            match merged.as_mut() {
                None => merged = Some(page),
                Some(acc) => {
                    if let (Some(dst), Some(src)) = (acc.items_mut(), page.items_mut()) {
                        dst.append(src);
                    }
                }
            }

            let collected = merged
                .as_ref()
                .and_then(|m| m.items())
                .map_or(0, |items| items.len());
            if page_len == 0 || collected >= total {
                complete = true;
                break;
            }

            offset += page_len as u32;
            tokio::time::sleep(self.inter_page_delay).await;
        }

        let mut merged = merged?;
        let collected = merged.items().map_or(0, |items| items.len());
        merged.mr_data.offset = "0".to_string();
        merged.mr_data.limit = collected.to_string();

        if !complete {
            warn!(path, collected, "Ergast pagination stopped early, not caching partial collection");
            return Some(merged);
        }

        match serde_json::to_string(&merged) {
            Ok(raw) => {
                if !self.cache.set(&key, &raw, self.cache_ttl_secs).await {
                    warn!(key = %key, "Failed to cache merged Ergast collection");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "Could not serialize merged collection"),
        }

        Some(merged)
    }

    /// Every driver, or the drivers of one season.
    pub async fn drivers(&self, season: Option<i32>) -> Option<DriversResponse> {
        let path = match season {
            Some(year) => format!("{year}/drivers"),
            None => "drivers".to_string(),
        };
        self.fetch_all_paginated(&path, DEFAULT_PAGE_SIZE).await
    }

    /// Race calendar of a season including per-session times.
    pub async fn season_schedule(&self, season: i32) -> Option<RacesResponse> {
        self.fetch_all_paginated(&format!("{season}/races"), DEFAULT_PAGE_SIZE)
            .await
    }

    /// Driver standings after `round`, or the latest round when `None`.
    pub async fn driver_standings(
        &self,
        season: i32,
        round: Option<u32>,
    ) -> Option<Vec<DriverStanding>> {
        let response: StandingsResponse = self
            .get(&standings_path(season, round, "driverstandings"))
            .await?;
        response
            .items()?
            .first()
            .and_then(|list| list.driver_standings.clone())
    }

    /// Constructor standings after `round`, or the latest round when `None`.
    pub async fn constructor_standings(
        &self,
        season: i32,
        round: Option<u32>,
    ) -> Option<Vec<ConstructorStanding>> {
        let response: StandingsResponse = self
            .get(&standings_path(season, round, "constructorstandings"))
            .await?;
        response
            .items()?
            .first()
            .and_then(|list| list.constructor_standings.clone())
    }

    fn build_url(
        &self,
        path: &str,
        limit: u32,
        offset: u32,
        extra_params: &str,
    ) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}/{}.json", self.base_url, normalize_path(path)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("limit", &limit.to_string())
                .append_pair("offset", &offset.to_string());
            let extra = extra_params.trim_start_matches(['?', '&']);
            for (name, value) in url::form_urlencoded::parse(extra.as_bytes()) {
                query.append_pair(&name, &value);
            }
        }
        Ok(url)
    }
}

fn standings_path(season: i32, round: Option<u32>, resource: &str) -> String {
    match round {
        Some(round) => format!("{season}/{round}/{resource}"),
        None => format!("{season}/{resource}"),
    }
}

/// Drops empty segments so `2024//drivers/` and `2024/drivers` share a cache key.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_covers_every_parameter() {
        let a = ErgastClient::cache_key("2024/drivers", 100, 0, "");
        let b = ErgastClient::cache_key("2024/drivers", 100, 100, "");
        let c = ErgastClient::cache_key("2024/drivers", 30, 0, "");
        let d = ErgastClient::cache_key("2024/drivers", 100, 0, "sort=asc");
        assert_eq!(a, "ergast:2024/drivers:100:0:");
        assert!(a != b && a != c && a != d);
        assert_eq!(a, ErgastClient::cache_key("/2024//drivers/", 100, 0, ""));
    }

    #[test]
    fn standings_path_omits_missing_round() {
        assert_eq!(standings_path(2024, None, "driverstandings"), "2024/driverstandings");
        assert_eq!(
            standings_path(2024, Some(5), "constructorstandings"),
            "2024/5/constructorstandings"
        );
    }
}
