#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

use gridscout_cron::clock::Clock;
use gridscout_cron::config::Limits;
use gridscout_cron::discord::{DeliveryResponse, MessageDelivery, ReminderMessage, ReminderSender};
use gridscout_cron::errors::{DeliveryError, SourceError, StoreError, TransportError};
use gridscout_cron::ergast::transport::{HttpResponse, HttpTransport};
use gridscout_cron::scheduler::session::{RaceWeekend, SessionEvent, SessionKind, SessionSource};
use gridscout_cron::scheduler::SessionReminderScheduler;
use gridscout_cron::store::{
    GuildSettings, InMemoryGuildConfigStore, InMemorySentNotificationStore, NotificationKey,
    SentNotificationStore,
};

/// Clock that only moves when a test moves it
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Racing-data upstream answering from a closure and counting requests
pub struct FakeTransport {
    handler: Box<dyn Fn(&Url) -> HttpResponse + Send + Sync>,
    urls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new(handler: impl Fn(&Url) -> HttpResponse + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            urls: Mutex::new(vec![]),
        }
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.urls.lock().unwrap().push(url.to_string());
        let parsed = Url::parse(url)?;
        Ok((self.handler)(&parsed))
    }
}

/// Delivery channel that records every post and replays scripted responses
#[derive(Default)]
pub struct RecordingDelivery {
    scripted: Mutex<VecDeque<DeliveryResponse>>,
    posts: Mutex<Vec<(String, ReminderMessage)>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues responses; once exhausted every post succeeds.
    pub fn script(&self, responses: impl IntoIterator<Item = DeliveryResponse>) {
        self.scripted.lock().unwrap().extend(responses);
    }

    pub fn calls(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn posts(&self) -> Vec<(String, ReminderMessage)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageDelivery for RecordingDelivery {
    async fn post_message(
        &self,
        channel_id: &str,
        message: &ReminderMessage,
    ) -> Result<DeliveryResponse, DeliveryError> {
        self.posts
            .lock()
            .unwrap()
            .push((channel_id.to_string(), message.clone()));
        let scripted = self.scripted.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| TestData::delivery(200, &[])))
    }
}

/// Session source returning a fixed calendar
pub struct StaticSessionSource {
    races: Vec<RaceWeekend>,
    calls: AtomicUsize,
}

impl StaticSessionSource {
    pub fn new(races: Vec<RaceWeekend>) -> Self {
        Self {
            races,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionSource for StaticSessionSource {
    async fn list_sessions_for_season(&self, _year: i32) -> Result<Vec<RaceWeekend>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.races.clone())
    }
}

/// Session source that parks the caller until released
pub struct GatedSessionSource {
    races: Vec<RaceWeekend>,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedSessionSource {
    pub fn new(races: Vec<RaceWeekend>) -> Self {
        Self {
            races,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl SessionSource for GatedSessionSource {
    async fn list_sessions_for_season(&self, _year: i32) -> Result<Vec<RaceWeekend>, SourceError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.races.clone())
    }
}

/// Sent-notification store whose reads or writes can be made to fail
#[derive(Default)]
pub struct FlakySentStore {
    pub inner: InMemorySentNotificationStore,
    fail_find: std::sync::atomic::AtomicBool,
    fail_record: std::sync::atomic::AtomicBool,
    find_calls: AtomicUsize,
    record_calls: AtomicUsize,
}

impl FlakySentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_find(&self, fail: bool) {
        self.fail_find.store(fail, Ordering::SeqCst);
    }

    pub fn fail_record(&self, fail: bool) {
        self.fail_record.store(fail, Ordering::SeqCst);
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentNotificationStore for FlakySentStore {
    async fn find_sent(
        &self,
        keys: &[NotificationKey],
    ) -> Result<HashSet<NotificationKey>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_find.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("dedup read failed".into()));
        }
        self.inner.find_sent(keys).await
    }

    async fn record_sent(&self, key: &NotificationKey) -> Result<(), StoreError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_record.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("dedup write failed".into()));
        }
        self.inner.record_sent(key).await
    }

    async fn try_claim(&self, key: &NotificationKey) -> Result<bool, StoreError> {
        self.inner.try_claim(key).await
    }
}

/// Scheduler wired to in-memory collaborators
pub struct TestScheduler {
    pub scheduler: Arc<SessionReminderScheduler>,
    pub delivery: Arc<RecordingDelivery>,
    pub sent: Arc<FlakySentStore>,
    pub guilds: Arc<InMemoryGuildConfigStore>,
    pub clock: Arc<ManualClock>,
}

impl TestScheduler {
    pub fn new(sessions: Arc<dyn SessionSource>) -> Self {
        Self::with_limits(sessions, TestData::limits())
    }

    pub fn with_limits(sessions: Arc<dyn SessionSource>, limits: Limits) -> Self {
        let clock = Arc::new(ManualClock::new(TestData::now()));
        let delivery = Arc::new(RecordingDelivery::new());
        let sent = Arc::new(FlakySentStore::new());
        let guilds = Arc::new(InMemoryGuildConfigStore::new());

        let sender = ReminderSender::new(delivery.clone(), &limits, clock.clone());
        let scheduler = Arc::new(SessionReminderScheduler::new(
            sessions,
            guilds.clone(),
            sent.clone(),
            sender,
            clock.clone(),
            limits,
        ));

        Self {
            scheduler,
            delivery,
            sent,
            guilds,
            clock,
        }
    }

    pub fn add_guild(&self, settings: GuildSettings, kinds: &[SessionKind]) {
        self.guilds.insert_guild(settings, kinds);
    }
}

/// Test data generators
pub struct TestData;

impl TestData {
    pub const RACE_ID: &'static str = "2025-01";

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 16, 3, 0, 0).unwrap()
    }

    pub fn limits() -> Limits {
        Limits {
            run_on_start: false,
            ..Limits::default()
        }
    }

    /// Australian GP weekend with sessions at the given offsets from `now()`.
    pub fn race(sessions: &[(SessionKind, i64)]) -> RaceWeekend {
        RaceWeekend {
            race_id: Self::RACE_ID.to_string(),
            official_name: "Australian Grand Prix".to_string(),
            country_code: Some("AUS".to_string()),
            sessions: sessions
                .iter()
                .map(|(kind, minutes)| SessionEvent {
                    race_id: Self::RACE_ID.to_string(),
                    kind: *kind,
                    scheduled_at: Self::now() + ChronoDuration::minutes(*minutes),
                })
                .collect(),
        }
    }

    pub fn guild(guild_id: &str, channel_id: &str, lead_minutes: i64) -> GuildSettings {
        GuildSettings {
            guild_id: guild_id.to_string(),
            channel_id: channel_id.to_string(),
            reminder_minutes: lead_minutes,
            mention: None,
        }
    }

    pub fn key(guild_id: &str, kind: SessionKind) -> NotificationKey {
        let reminder_type_id = match kind {
            SessionKind::FreePractice1 => "1",
            SessionKind::FreePractice2 => "2",
            SessionKind::FreePractice3 => "3",
            SessionKind::SprintQualifying => "4",
            SessionKind::SprintRace => "5",
            SessionKind::Qualifying => "6",
            SessionKind::GrandPrix => "7",
        };
        NotificationKey::new(
            guild_id,
            reminder_type_id,
            format!("{}-{}", Self::RACE_ID, kind.session_id()),
        )
    }

    pub fn delivery(status: u16, headers: &[(&'static str, &str)]) -> DeliveryResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        DeliveryResponse {
            status,
            headers: map,
            body: String::new(),
        }
    }

    pub fn rate_limited(retry_after_secs: &str) -> DeliveryResponse {
        Self::delivery(429, &[("retry-after", retry_after_secs)])
    }

    pub fn ok(body: Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    /// One page of a synthetic driver collection of `total` items.
    pub fn drivers_page(total: usize, limit: usize, offset: usize) -> Value {
        let drivers: Vec<Value> = (offset..total.min(offset + limit))
            .map(|i| {
                json!({
                    "driverId": format!("driver_{i:03}"),
                    "url": "",
                    "givenName": "Test",
                    "familyName": format!("Driver {i}"),
                    "nationality": "British"
                })
            })
            .collect();

        json!({
            "MRData": {
                "xmlns": "",
                "series": "f1",
                "url": "http://api.jolpi.ca/ergast/f1/drivers.json",
                "limit": limit.to_string(),
                "offset": offset.to_string(),
                "total": total.to_string(),
                "DriverTable": { "Drivers": drivers }
            }
        })
    }

    pub fn query_param(url: &Url, name: &str) -> Option<usize> {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.parse().ok())
    }
}
