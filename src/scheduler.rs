//! Broadcast scheduling.
//!
//! Triggers [`NewsRelay::broadcast`] daily at a fixed local time or at a
//! fixed interval until the lifecycle stops.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{error, info};

use crate::config::ScheduleConfig;
use crate::lifecycle::Lifecycle;
use crate::relay::NewsRelay;
use crate::{RelayError, Result};

/// When broadcasts happen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    /// Every day at `at`, local time in `tz`.
    Daily { at: NaiveTime, tz: Tz },
    /// Every `Duration`, first run one interval after start.
    Every(Duration),
}

impl Schedule {
    /// Build the schedule from configuration. `interval_secs` wins over `daily_at`.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        if let Some(secs) = config.interval_secs {
            if secs == 0 {
                return Err(RelayError::Validation(
                    "schedule.interval_secs must be at least 1".to_string(),
                ));
            }
            return Ok(Schedule::Every(Duration::from_secs(secs)));
        }

        let at = NaiveTime::parse_from_str(config.daily_at.trim(), "%H:%M").map_err(|e| {
            RelayError::Validation(format!("invalid schedule.daily_at {:?}: {e}", config.daily_at))
        })?;
        let tz: Tz = config.timezone.parse().map_err(|_| {
            RelayError::Validation(format!("unknown timezone: {}", config.timezone))
        })?;

        Ok(Schedule::Daily { at, tz })
    }

    /// Time to wait from `now` until the next broadcast.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match *self {
            Schedule::Every(interval) => interval,
            Schedule::Daily { at, tz } => {
                let next = next_daily(now, at, tz);
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
        }
    }
}

/// The first instant strictly after `now` whose local time in `tz` is `at`.
fn next_daily(now: DateTime<Utc>, at: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();

    (0..=2u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|day| {
            let local = day.and_time(at);
            // A time skipped by a DST jump fires an hour later that day.
            tz.from_local_datetime(&local)
                .earliest()
                .or_else(|| tz.from_local_datetime(&(local + chrono::Duration::hours(1))).earliest())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .find(|dt| *dt > now)
        .unwrap_or_else(|| now + chrono::Duration::days(1))
}

/// Run broadcast cycles on `schedule` until the lifecycle stops.
///
/// A cycle in progress always finishes before the loop notices the stop.
pub async fn run_schedule(relay: Arc<NewsRelay>, schedule: Schedule, lifecycle: Lifecycle) {
    info!("Scheduler started: {:?}", schedule);

    loop {
        let delay = schedule.next_delay(Utc::now());
        info!("Next broadcast in {} seconds", delay.as_secs());

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = lifecycle.stopped() => break,
        }

        match relay.broadcast().await {
            Ok(summary) if summary.skipped => {}
            Ok(summary) => info!(
                "Scheduled broadcast: {} entries, {}, {} pruned",
                summary.entries, summary.report, summary.pruned
            ),
            Err(e) => error!("Scheduled broadcast failed: {}", e),
        }
    }

    info!("Scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn daily(at: &str, tz: &str) -> Schedule {
        Schedule::from_config(&ScheduleConfig {
            daily_at: at.to_string(),
            timezone: tz.to_string(),
            interval_secs: None,
        })
        .unwrap()
    }

    #[test]
    fn test_from_config_default_is_daily_19() {
        let schedule = Schedule::from_config(&ScheduleConfig::default()).unwrap();
        assert_eq!(
            schedule,
            Schedule::Daily {
                at: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
                tz: chrono_tz::UTC,
            }
        );
    }

    #[test]
    fn test_from_config_interval_wins() {
        let config = ScheduleConfig {
            interval_secs: Some(600),
            ..ScheduleConfig::default()
        };
        assert_eq!(
            Schedule::from_config(&config).unwrap(),
            Schedule::Every(Duration::from_secs(600))
        );
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let bad_time = ScheduleConfig {
            daily_at: "7pm".to_string(),
            ..ScheduleConfig::default()
        };
        assert!(Schedule::from_config(&bad_time).is_err());

        let zero = ScheduleConfig {
            interval_secs: Some(0),
            ..ScheduleConfig::default()
        };
        assert!(Schedule::from_config(&zero).is_err());
    }

    #[test]
    fn test_next_delay_later_today() {
        let schedule = daily("19:00", "UTC");
        let delay = schedule.next_delay(utc("2025-03-10T18:30:00Z"));
        assert_eq!(delay, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_next_delay_tomorrow_when_passed() {
        let schedule = daily("19:00", "UTC");
        assert_eq!(
            schedule.next_delay(utc("2025-03-10T19:00:00Z")),
            Duration::from_secs(24 * 3600)
        );
        assert_eq!(
            schedule.next_delay(utc("2025-03-10T20:00:00Z")),
            Duration::from_secs(23 * 3600)
        );
    }

    #[test]
    fn test_next_delay_respects_timezone() {
        // 19:00 in Rome is 18:00 UTC in winter.
        let schedule = daily("19:00", "Europe/Rome");
        assert_eq!(
            schedule.next_delay(utc("2025-01-15T17:00:00Z")),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_next_delay_skipped_by_dst() {
        // 02:30 does not exist in Rome on 2025-03-30; fires at 03:30 local (01:30 UTC).
        let schedule = daily("02:30", "Europe/Rome");
        assert_eq!(
            schedule.next_delay(utc("2025-03-30T00:00:00Z")),
            Duration::from_secs(90 * 60)
        );
    }

    #[test]
    fn test_next_delay_interval() {
        let schedule = Schedule::Every(Duration::from_secs(42));
        assert_eq!(
            schedule.next_delay(utc("2025-03-10T18:30:00Z")),
            Duration::from_secs(42)
        );
    }
}
