use std::time::Duration;

const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Reads the server-requested wait from `retry-after`, or from the primary
/// rate-limit headers when the remaining budget is exhausted.
pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    if let Some(raw) = header_str(headers, "retry-after") {
        let seconds = raw.trim().parse::<u64>().ok()?;
        return Some(Duration::from_secs(seconds));
    }
    let remaining = header_str(headers, "x-ratelimit-remaining")?
        .trim()
        .parse::<u64>()
        .ok()?;
    if remaining > 0 {
        return None;
    }
    let reset_at = header_str(headers, "x-ratelimit-reset")?
        .trim()
        .parse::<i64>()
        .ok()?;
    let wait_seconds = reset_at.saturating_sub(chrono::Utc::now().timestamp()).max(0);
    Some(Duration::from_secs(wait_seconds as u64))
}

fn header_str<'a>(headers: &'a reqwest::header::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

pub fn retry_delay(base_delay_ms: u64, attempt: usize, retry_after: Option<Duration>) -> Duration {
    if let Some(delay) = retry_after {
        return delay
            .max(Duration::from_millis(base_delay_ms))
            .min(Duration::from_millis(MAX_RETRY_DELAY_MS));
    }
    let exponent = attempt.saturating_sub(1).min(10) as u32;
    let scaled = base_delay_ms.saturating_mul(2_u64.saturating_pow(exponent));
    Duration::from_millis(scaled.min(MAX_RETRY_DELAY_MS))
}

pub fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

pub fn is_retryable_github_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Failures a request that creates state may be retried on: the request was
/// refused before GitHub processed it.
pub fn is_retryable_github_write_status(status: u16) -> bool {
    status == 429
}

pub fn is_retryable_write_transport_error(error: &reqwest::Error) -> bool {
    error.is_connect()
}

pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
