//! Rate-limit aware request loop.
//!
//! - HTTP 429: sleep for `Retry-After` seconds when the server supplies it, else
//!   `2^attempt` seconds plus up to one second of jitter, then resend.
//! - Every pause is capped at `MAX_BACKOFF_SECS`.
//! - Any other non-success status is fatal immediately.
//! - At most `max_attempts` sends per logical request.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::data::transport::{Transport, TransportResponse};
use crate::data::wire::{EvaluateRequest, EvaluateResponse};
use crate::error::AppError;

const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Upper bound on any single backoff pause, server-requested or computed.
pub const MAX_BACKOFF_SECS: f64 = 600.0;

pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 8 }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt after a 429 on attempt `attempt` (0-based).
    pub fn backoff_delay(&self, attempt: u32, retry_after: Option<&str>, jitter: f64) -> Duration {
        let secs = match retry_after.and_then(parse_retry_after) {
            Some(secs) => secs,
            None => 2f64.powi(attempt.min(30) as i32) + jitter.clamp(0.0, 1.0),
        };
        Duration::from_secs_f64(secs.min(MAX_BACKOFF_SECS))
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values are not supported and
/// fall back to exponential backoff.
fn parse_retry_after(raw: &str) -> Option<f64> {
    let secs = raw.trim().parse::<f64>().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(secs)
    } else {
        None
    }
}

/// Outcome of a successful logical request.
#[derive(Debug, Clone)]
pub struct Evaluated {
    pub response: EvaluateResponse,
    /// Number of 429 responses absorbed before success.
    pub retries: u32,
}

/// Send `request` until it succeeds, backing off on 429.
pub fn post_with_retry<T, S, R>(
    transport: &T,
    request: &EvaluateRequest,
    policy: RetryPolicy,
    sleeper: &mut S,
    rng: &mut R,
) -> Result<Evaluated, AppError>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
    R: Rng,
{
    for attempt in 0..policy.max_attempts {
        let resp = transport.post(request)?;

        if resp.status == STATUS_TOO_MANY_REQUESTS {
            let jitter = rng.gen_range(0.0..1.0);
            let delay = policy.backoff_delay(attempt, resp.retry_after.as_deref(), jitter);
            warn!(
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                delay_s = delay.as_secs_f64(),
                "rate limited by evaluate endpoint, backing off"
            );
            sleeper.sleep(delay);
            continue;
        }

        if !resp.is_success() {
            return Err(AppError::remote(format!(
                "Evaluate request failed with status {}: {}",
                resp.status,
                body_excerpt(&resp)
            )));
        }

        debug!(attempt = attempt + 1, bytes = resp.body.len(), "evaluate response received");
        let response: EvaluateResponse = serde_json::from_str(&resp.body)
            .map_err(|e| AppError::remote(format!("Failed to parse evaluate response: {e}")))?;
        return Ok(Evaluated {
            response,
            retries: attempt,
        });
    }

    Err(AppError::remote(format!(
        "Gave up after {} consecutive rate-limited attempts.",
        policy.max_attempts
    )))
}

fn body_excerpt(resp: &TransportResponse) -> String {
    const MAX: usize = 200;
    let body = resp.body.trim();
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::data::wire::EvaluateRequest;

    /// Replays canned responses and records every request it receives.
    pub(crate) struct ScriptedTransport {
        pub responses: RefCell<VecDeque<TransportResponse>>,
        pub requests: RefCell<Vec<EvaluateRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<TransportResponse>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl Transport for ScriptedTransport {
        fn post(&self, request: &EvaluateRequest) -> Result<TransportResponse, AppError> {
            self.requests.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| AppError::remote("scripted transport exhausted"))
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingSleeper {
        pub sleeps: Vec<Duration>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.sleeps.push(duration);
        }
    }

    pub(crate) fn ok(body: &str) -> TransportResponse {
        TransportResponse {
            status: 200,
            retry_after: None,
            body: body.to_string(),
        }
    }

    pub(crate) fn too_many(retry_after: Option<&str>) -> TransportResponse {
        TransportResponse {
            status: 429,
            retry_after: retry_after.map(|s| s.to_string()),
            body: String::new(),
        }
    }

    fn request() -> EvaluateRequest {
        EvaluateRequest::new(Default::default())
    }

    const EMPTY_OK: &str = r#"{"evaluate": []}"#;

    #[test]
    fn retry_after_header_is_honoured() {
        let transport = ScriptedTransport::new(vec![too_many(Some("2")), ok(EMPTY_OK)]);
        let mut sleeper = RecordingSleeper::default();
        let mut rng = StdRng::seed_from_u64(7);

        let out = post_with_retry(&transport, &request(), RetryPolicy::default(), &mut sleeper, &mut rng)
            .unwrap();

        assert_eq!(out.retries, 1);
        assert_eq!(transport.calls(), 2);
        assert_eq!(sleeper.sleeps, vec![Duration::from_secs(2)]);
    }

    #[test]
    fn exponential_backoff_without_header() {
        let transport = ScriptedTransport::new(vec![
            too_many(None),
            too_many(None),
            too_many(None),
            ok(EMPTY_OK),
        ]);
        let mut sleeper = RecordingSleeper::default();
        let mut rng = StdRng::seed_from_u64(7);

        let out = post_with_retry(&transport, &request(), RetryPolicy::default(), &mut sleeper, &mut rng)
            .unwrap();
        assert_eq!(out.retries, 3);

        assert_eq!(sleeper.sleeps.len(), 3);
        for (attempt, delay) in sleeper.sleeps.iter().enumerate() {
            let base = 2f64.powi(attempt as i32);
            let secs = delay.as_secs_f64();
            assert!(
                secs >= base && secs <= base + 1.0,
                "attempt {attempt}: delay {secs} not in [{base}, {}]",
                base + 1.0
            );
        }
    }

    #[test]
    fn unparseable_retry_after_falls_back_to_backoff() {
        let policy = RetryPolicy::default();
        let delay = policy.backoff_delay(2, Some("Wed, 21 Oct 2015 07:28:00 GMT"), 0.5);
        assert_eq!(delay, Duration::from_secs_f64(4.5));
        assert_eq!(policy.backoff_delay(0, Some(" 1.5 "), 0.9), Duration::from_secs_f64(1.5));
        assert_eq!(policy.backoff_delay(0, Some("-3"), 0.0), Duration::from_secs(1));
    }

    #[test]
    fn oversized_delays_are_capped() {
        let policy = RetryPolicy::default();
        let cap = Duration::from_secs_f64(MAX_BACKOFF_SECS);
        assert_eq!(policy.backoff_delay(0, Some("1e30"), 0.0), cap);
        assert_eq!(policy.backoff_delay(0, Some("1e400"), 0.0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(29, None, 1.0), cap);
        assert_eq!(policy.backoff_delay(0, Some("600"), 0.0), cap);
    }

    #[test]
    fn huge_retry_after_does_not_abort_the_request() {
        let transport = ScriptedTransport::new(vec![too_many(Some("1e30")), ok(EMPTY_OK)]);
        let mut sleeper = RecordingSleeper::default();
        let mut rng = StdRng::seed_from_u64(7);

        let out = post_with_retry(&transport, &request(), RetryPolicy::default(), &mut sleeper, &mut rng)
            .unwrap();

        assert_eq!(out.retries, 1);
        assert_eq!(sleeper.sleeps, vec![Duration::from_secs(600)]);
    }

    #[test]
    fn retry_ceiling_is_fatal() {
        let transport = ScriptedTransport::new((0..8).map(|_| too_many(Some("0"))).collect());
        let mut sleeper = RecordingSleeper::default();
        let mut rng = StdRng::seed_from_u64(7);

        let err = post_with_retry(&transport, &request(), RetryPolicy::default(), &mut sleeper, &mut rng)
            .unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert_eq!(transport.calls(), 8);
        assert_eq!(sleeper.sleeps.len(), 8);
    }

    #[test]
    fn other_error_statuses_are_not_retried() {
        let transport = ScriptedTransport::new(vec![
            TransportResponse {
                status: 500,
                retry_after: Some("1".to_string()),
                body: "boom".to_string(),
            },
            ok(EMPTY_OK),
        ]);
        let mut sleeper = RecordingSleeper::default();
        let mut rng = StdRng::seed_from_u64(7);

        let err = post_with_retry(&transport, &request(), RetryPolicy::default(), &mut sleeper, &mut rng)
            .unwrap_err();

        assert!(err.message().contains("500"), "unexpected message: {err}");
        assert_eq!(transport.calls(), 1);
        assert!(sleeper.sleeps.is_empty());
    }

    #[test]
    fn malformed_success_body_is_fatal() {
        let transport = ScriptedTransport::new(vec![ok("not json")]);
        let mut sleeper = RecordingSleeper::default();
        let mut rng = StdRng::seed_from_u64(7);

        let err = post_with_retry(&transport, &request(), RetryPolicy::default(), &mut sleeper, &mut rng)
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
