use chrono::{DateTime, Utc};

pub const DEFAULT_UPDATE_AFTER_DAYS: f64 = 7.0;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Outcome of the follow-up note gate for a reused thread.
pub struct UpdateDecision {
    pub post: bool,
    pub reason_code: &'static str,
}

impl UpdateDecision {
    fn skip(reason_code: &'static str) -> Self {
        Self {
            post: false,
            reason_code,
        }
    }
}

pub fn parse_rfc3339_to_unix_ms(raw: &str) -> Option<i64> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim()).ok()?;
    Some(parsed.timestamp_millis())
}

/// Decides whether a follow-up note should be posted on a matching thread.
///
/// A locked thread never receives a note. Otherwise the note is posted once
/// `now - updated_at` reaches `update_after_days` calendar days (inclusive).
pub fn evaluate_update_policy(
    update: &str,
    locked: bool,
    updated_at: &str,
    update_after_days: f64,
    now: DateTime<Utc>,
) -> UpdateDecision {
    if update.is_empty() {
        return UpdateDecision::skip("skip_update_empty");
    }
    if locked {
        return UpdateDecision::skip("skip_thread_locked");
    }
    let Some(updated_at_ms) = parse_rfc3339_to_unix_ms(updated_at) else {
        return UpdateDecision::skip("skip_updated_at_invalid");
    };
    let elapsed_ms = now.timestamp_millis().saturating_sub(updated_at_ms);
    if (elapsed_ms as f64) < update_after_days * MILLIS_PER_DAY {
        return UpdateDecision::skip("skip_not_stale");
    }
    UpdateDecision {
        post: true,
        reason_code: "post_update_stale",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, SecondsFormat, Utc};

    use super::{evaluate_update_policy, parse_rfc3339_to_unix_ms};

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-15T12:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    fn days_before(now: DateTime<Utc>, days: i64) -> String {
        (now - Duration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    #[test]
    fn unit_parse_rfc3339_to_unix_ms_accepts_offsets_and_rejects_garbage() {
        assert_eq!(parse_rfc3339_to_unix_ms("1970-01-01T00:00:01Z"), Some(1_000));
        assert_eq!(
            parse_rfc3339_to_unix_ms("1970-01-01T01:00:01+01:00"),
            Some(1_000)
        );
        assert_eq!(parse_rfc3339_to_unix_ms("yesterday"), None);
    }

    #[test]
    fn functional_evaluate_update_policy_threshold_is_inclusive() {
        let now = fixed_now();
        let before = evaluate_update_policy("ping", false, &days_before(now, 6), 7.0, now);
        assert!(!before.post);
        assert_eq!(before.reason_code, "skip_not_stale");

        let exact = evaluate_update_policy("ping", false, &days_before(now, 7), 7.0, now);
        assert!(exact.post);
        assert_eq!(exact.reason_code, "post_update_stale");
    }

    #[test]
    fn functional_evaluate_update_policy_lock_overrides_staleness() {
        let now = fixed_now();
        let decision = evaluate_update_policy("ping", true, &days_before(now, 365), 7.0, now);
        assert_eq!(decision.reason_code, "skip_thread_locked");
        assert!(!decision.post);
    }

    #[test]
    fn unit_evaluate_update_policy_empty_update_disables_notes() {
        let now = fixed_now();
        let decision = evaluate_update_policy("", false, &days_before(now, 30), 7.0, now);
        assert_eq!(decision.reason_code, "skip_update_empty");
    }

    #[test]
    fn unit_evaluate_update_policy_zero_days_posts_immediately() {
        let now = fixed_now();
        let decision = evaluate_update_policy(
            "ping",
            false,
            &now.to_rfc3339_opts(SecondsFormat::Secs, true),
            0.0,
            now,
        );
        assert!(decision.post);
    }

    #[test]
    fn unit_evaluate_update_policy_supports_fractional_days() {
        let now = fixed_now();
        let updated_at = (now - Duration::hours(12)).to_rfc3339_opts(SecondsFormat::Secs, true);
        assert!(evaluate_update_policy("ping", false, &updated_at, 0.5, now).post);
        assert!(!evaluate_update_policy("ping", false, &updated_at, 0.75, now).post);
    }

    #[test]
    fn regression_evaluate_update_policy_invalid_timestamp_never_posts() {
        let now = fixed_now();
        let decision = evaluate_update_policy("ping", false, "not-a-date", 0.0, now);
        assert!(!decision.post);
        assert_eq!(decision.reason_code, "skip_updated_at_invalid");
    }
}
