//! Task progress: counters, percentage, throughput, ETA.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress counters for a task.
///
/// Design:
/// - `percentage` is always derived, never set directly by callers.
/// - `processing_rate` / `estimated_time_remaining` stay `None` until the
///   task has a `started_at` and measurable elapsed time. No Infinity/NaN
///   ever leaves this module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub total: u64,
    pub processed: u64,
    pub successful: u64,
    pub failed: u64,
    pub skipped: u64,

    /// 0..=100, rounded. 0 when `total == 0`.
    pub percentage: u8,

    /// Rows per second since `started_at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_rate: Option<f64>,

    /// Seconds until done, at the current rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<u64>,
}

/// Partial progress update: only the present fields are merged.
///
/// Counters are absolute values, not increments; the executor reports its
/// own running totals (the engine does not try to sum concurrent deltas).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub total: Option<u64>,
    pub processed: Option<u64>,
    pub successful: Option<u64>,
    pub failed: Option<u64>,
    pub skipped: Option<u64>,
}

impl ProgressUpdate {
    /// Shorthand for the common case of reporting processed rows.
    pub fn processed(n: u64) -> Self {
        Self {
            processed: Some(n),
            ..Self::default()
        }
    }
}

impl TaskProgress {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            processed: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            percentage: 0,
            processing_rate: None,
            estimated_time_remaining: None,
        }
    }

    /// Merge a partial update and re-derive percentage/rate/ETA.
    ///
    /// Invariant: `processed <= total` (clamped, not rejected).
    pub fn apply(
        &self,
        update: &ProgressUpdate,
        started_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> TaskProgress {
        let mut next = self.clone();

        if let Some(total) = update.total {
            next.total = total;
        }
        if let Some(processed) = update.processed {
            next.processed = processed;
        }
        if let Some(successful) = update.successful {
            next.successful = successful;
        }
        if let Some(failed) = update.failed {
            next.failed = failed;
        }
        if let Some(skipped) = update.skipped {
            next.skipped = skipped;
        }

        next.processed = next.processed.min(next.total);

        next.percentage = if next.total > 0 {
            ((next.processed as f64 / next.total as f64) * 100.0).round() as u8
        } else {
            0
        };

        // Rate/ETA only once the task has actually started.
        next.processing_rate = None;
        next.estimated_time_remaining = None;
        if let Some(started) = started_at {
            let elapsed = (now - started).num_milliseconds() as f64 / 1000.0;
            if elapsed > 0.0 {
                let rate = next.processed as f64 / elapsed;
                next.processing_rate = Some(rate);
                if rate > 0.0 {
                    let remaining = (next.total - next.processed) as f64;
                    next.estimated_time_remaining = Some((remaining / rate).round() as u64);
                }
            }
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn percentage_is_rounded() {
        let progress = TaskProgress::new(3);
        let next = progress.apply(&ProgressUpdate::processed(1), None, t0());
        // 1/3 = 33.33% -> 33
        assert_eq!(next.percentage, 33);

        let next = next.apply(&ProgressUpdate::processed(2), None, t0());
        // 2/3 = 66.67% -> 67
        assert_eq!(next.percentage, 67);
    }

    #[test]
    fn zero_total_keeps_percentage_zero() {
        let progress = TaskProgress::new(0);
        let next = progress.apply(&ProgressUpdate::processed(10), None, t0());
        assert_eq!(next.percentage, 0);
        // processed clamps to total
        assert_eq!(next.processed, 0);
    }

    #[test]
    fn processed_clamps_to_total() {
        let progress = TaskProgress::new(50);
        let next = progress.apply(&ProgressUpdate::processed(80), None, t0());
        assert_eq!(next.processed, 50);
        assert_eq!(next.percentage, 100);
    }

    #[test]
    fn no_rate_before_start() {
        let progress = TaskProgress::new(100);
        let next = progress.apply(&ProgressUpdate::processed(40), None, t0());
        assert_eq!(next.processing_rate, None);
        assert_eq!(next.estimated_time_remaining, None);
    }

    #[test]
    fn no_rate_at_zero_elapsed() {
        // started_at == now: division guard must kick in, not produce Infinity.
        let progress = TaskProgress::new(100);
        let next = progress.apply(&ProgressUpdate::processed(40), Some(t0()), t0());
        assert_eq!(next.processing_rate, None);
        assert_eq!(next.estimated_time_remaining, None);
    }

    #[test]
    fn rate_and_eta_after_elapsed_time() {
        let progress = TaskProgress::new(100);
        let started = t0();
        let now = started + chrono::Duration::seconds(10);

        let next = progress.apply(&ProgressUpdate::processed(40), Some(started), now);
        // 40 rows / 10 s = 4 rows/s, 60 remaining -> 15 s
        assert_eq!(next.processing_rate, Some(4.0));
        assert_eq!(next.estimated_time_remaining, Some(15));
    }

    #[test]
    fn zero_processed_has_rate_but_no_eta() {
        let progress = TaskProgress::new(100);
        let started = t0();
        let now = started + chrono::Duration::seconds(5);

        let next = progress.apply(&ProgressUpdate::default(), Some(started), now);
        assert_eq!(next.processing_rate, Some(0.0));
        // rate == 0 would make the ETA infinite; left undefined instead.
        assert_eq!(next.estimated_time_remaining, None);
    }

    #[test]
    fn merge_only_touches_present_fields() {
        let progress = TaskProgress::new(100);
        let next = progress.apply(
            &ProgressUpdate {
                processed: Some(30),
                successful: Some(25),
                failed: Some(3),
                skipped: Some(2),
                total: None,
            },
            None,
            t0(),
        );
        assert_eq!(next.total, 100);
        assert_eq!(next.processed, 30);
        assert_eq!(next.successful, 25);
        assert_eq!(next.failed, 3);
        assert_eq!(next.skipped, 2);
        assert_eq!(next.percentage, 30);
    }
}
