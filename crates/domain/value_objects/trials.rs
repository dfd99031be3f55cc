use chrono::{DateTime, Duration, Utc};

pub const TRIAL_DURATION_DAYS: i64 = 30;
pub const TRIAL_REMINDER_DAYS: i64 = 7;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub fn trial_duration() -> Duration {
    Duration::days(TRIAL_DURATION_DAYS)
}

pub fn calculate_trial_end_date(trial_start_at: DateTime<Utc>) -> DateTime<Utc> {
    trial_start_at + trial_duration()
}

/// Active means flagged active, both bounds recorded, and `now` before the end.
pub fn is_trial_active(
    trial_start_at: Option<DateTime<Utc>>,
    trial_end_at: Option<DateTime<Utc>>,
    trial_active: bool,
    now: DateTime<Utc>,
) -> bool {
    match (trial_active, trial_start_at, trial_end_at) {
        (true, Some(_), Some(end)) => now < end,
        _ => false,
    }
}

/// Whole days left, rounded up. Zero once the end has passed or when no end is recorded.
pub fn get_days_remaining(trial_end_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(end) = trial_end_at else {
        return 0;
    };

    let remaining_ms = (end - now).num_milliseconds();
    if remaining_ms <= 0 {
        return 0;
    }

    (remaining_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}
