//! Session reminder scheduling: candidate selection, deduplication and dispatch.

pub mod candidates;
pub mod job;
pub mod session;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Instrument;

use crate::clock::Clock;
use crate::config::{DedupMode, Limits};
use crate::discord::{MentionTarget, ReminderMessage, ReminderSender};
use crate::errors::TickError;
use crate::store::{GuildConfigStore, SentNotificationStore};
use candidates::{collect_candidates, group_by_channel, upcoming_races, Candidate};
use session::SessionSource;

/// Counts for one completed tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub candidates: usize,
    pub already_sent: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TickOutcome {
    /// A previous tick was still running.
    Skipped,
    /// No session starts within the lookahead window.
    Idle,
    /// The dedup lookup failed, so nothing was dispatched.
    Aborted,
    /// Session or guild data could not be loaded.
    Failed,
    Completed(TickSummary),
}

#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    pub at: DateTime<Utc>,
    pub outcome: TickOutcome,
}

enum Dispatch {
    Delivered,
    Failed,
    AlreadyClaimed,
}

/// Holds the running flag for the lifetime of one tick.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SessionReminderScheduler {
    sessions: Arc<dyn SessionSource>,
    guilds: Arc<dyn GuildConfigStore>,
    sent: Arc<dyn SentNotificationStore>,
    sender: ReminderSender,
    clock: Arc<dyn Clock>,
    limits: Limits,
    running: AtomicBool,
    last_tick: Mutex<Option<TickRecord>>,
}

impl SessionReminderScheduler {
    pub fn new(
        sessions: Arc<dyn SessionSource>,
        guilds: Arc<dyn GuildConfigStore>,
        sent: Arc<dyn SentNotificationStore>,
        sender: ReminderSender,
        clock: Arc<dyn Clock>,
        limits: Limits,
    ) -> Self {
        Self {
            sessions,
            guilds,
            sent,
            sender,
            clock,
            limits,
            running: AtomicBool::new(false),
            last_tick: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn last_tick(&self) -> Option<TickRecord> {
        self.last_tick.lock().ok().and_then(|last| last.clone())
    }

    /// Runs one scheduling pass unless another one is still in progress.
    pub async fn run_tick(&self) -> TickOutcome {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            tracing::info!("Session notification job is already running, skipping");
            return TickOutcome::Skipped;
        };

        let now = self.clock.now();
        let outcome = match self
            .tick(now)
            .instrument(tracing::info_span!("session_notifications"))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Session notification tick failed");
                TickOutcome::Failed
            }
        };

        if let Ok(mut last) = self.last_tick.lock() {
            *last = Some(TickRecord {
                at: now,
                outcome: outcome.clone(),
            });
        }
        outcome
    }

    async fn tick(&self, now: DateTime<Utc>) -> Result<TickOutcome, TickError> {
        let max_minutes = self.limits.max_reminder_minutes;

        let races = self.sessions.list_sessions_for_season(now.year()).await?;
        let upcoming = upcoming_races(races, now, max_minutes);
        if upcoming.is_empty() {
            tracing::debug!("No upcoming sessions within {max_minutes} minutes");
            return Ok(TickOutcome::Idle);
        }

        let guilds = self.guilds.list_configured_guilds().await?;
        let reminder_type_ids = self.guilds.reminder_type_ids().await?;
        let enabled = self.guilds.all_enabled_reminder_types().await?;

        let candidates =
            collect_candidates(&upcoming, &guilds, &reminder_type_ids, &enabled, now, max_minutes);
        let mut summary = TickSummary {
            candidates: candidates.len(),
            ..TickSummary::default()
        };
        if candidates.is_empty() {
            tracing::debug!(races = upcoming.len(), "No reminders due");
            return Ok(TickOutcome::Completed(summary));
        }

        let keys: Vec<_> = candidates.iter().map(|c| c.key.clone()).collect();
        let already_sent = match self.sent.find_sent(&keys).await {
            Ok(sent) => sent,
            Err(e) => {
                tracing::error!(error = %e, candidates = keys.len(), "Failed to check sent notifications, skipping dispatch");
                return Ok(TickOutcome::Aborted);
            }
        };

        let pending: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| !already_sent.contains(&c.key))
            .collect();
        summary.already_sent = summary.candidates - pending.len();

        for (channel_id, group) in group_by_channel(pending) {
            tracing::debug!(channel_id = %channel_id, reminders = group.len(), "Dispatching reminders");
            for candidate in group {
                match self.dispatch(&candidate).await {
                    Dispatch::Delivered => summary.delivered += 1,
                    Dispatch::Failed => summary.failed += 1,
                    Dispatch::AlreadyClaimed => {
                        summary.already_sent += 1;
                        continue;
                    }
                }
                tokio::time::sleep(self.limits.inter_delivery_delay).await;
            }
        }

        tracing::info!(
            candidates = summary.candidates,
            already_sent = summary.already_sent,
            delivered = summary.delivered,
            failed = summary.failed,
            "Session notification tick finished"
        );
        Ok(TickOutcome::Completed(summary))
    }

    async fn dispatch(&self, candidate: &Candidate) -> Dispatch {
        let key = &candidate.key;

        if self.limits.dedup_mode == DedupMode::ClaimBeforeSend {
            match self.sent.try_claim(key).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(guild_id = %key.guild_id, event_id = %key.event_id, "Reminder already claimed");
                    return Dispatch::AlreadyClaimed;
                }
                Err(e) => {
                    tracing::error!(guild_id = %key.guild_id, event_id = %key.event_id, error = %e, "Failed to claim reminder");
                    return Dispatch::Failed;
                }
            }
        }

        let message = ReminderMessage::session_reminder(
            &candidate.race_name,
            candidate.country_code.as_deref(),
            candidate.session,
            candidate.starts_at,
            candidate.mention.as_ref(),
        );

        tracing::info!(
            guild_id = %key.guild_id,
            channel_id = %candidate.channel_id,
            event_id = %key.event_id,
            "Sending {} reminder {}",
            candidate.session.display_name(),
            MentionTarget::describe(candidate.mention.as_ref())
        );

        if let Err(e) = self.sender.send(&candidate.channel_id, &message).await {
            tracing::error!(
                guild_id = %key.guild_id,
                channel_id = %candidate.channel_id,
                event_id = %key.event_id,
                error = %e,
                "Failed to send reminder"
            );
            return Dispatch::Failed;
        }

        if self.limits.dedup_mode == DedupMode::RecordAfterSend {
            if let Err(e) = self.sent.record_sent(key).await {
                tracing::error!(
                    guild_id = %key.guild_id,
                    reminder_type_id = %key.reminder_type_id,
                    event_id = %key.event_id,
                    error = %e,
                    "Failed to record sent notification"
                );
            }
        }

        Dispatch::Delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_released_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let guard = RunGuard::acquire(&flag);
            assert!(guard.is_some());
            assert!(RunGuard::acquire(&flag).is_none());
        }
        assert!(!flag.load(Ordering::Acquire));
        assert!(RunGuard::acquire(&flag).is_some());
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(TickOutcome::Completed(TickSummary {
            candidates: 2,
            delivered: 2,
            ..TickSummary::default()
        }))
        .unwrap();
        assert_eq!(json["result"], "completed");
        assert_eq!(json["delivered"], 2);
        assert_eq!(serde_json::to_value(TickOutcome::Idle).unwrap()["result"], "idle");
    }
}
