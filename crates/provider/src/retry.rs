//! Wait-for-state-change polling
//!
//! `StateChangeConf` repeatedly asks a `StateRefresh` for the current remote
//! status until it lands in the target set, leaves the allowed sets, runs out
//! of not-found tolerance, times out, or the operation is cancelled.
//!
//! Poll cadence: the first fetch is immediate (after the optional `delay`).
//! The wait then starts at 100ms and doubles while no target has been seen,
//! clamped to `[min_timeout, 10s]`. A `poll_interval` below 180s replaces the
//! backoff with a fixed cadence.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const INITIAL_WAIT: Duration = Duration::from_millis(100);
const MAX_WAIT: Duration = Duration::from_secs(10);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(180);

/// Capability the wait loop polls.
///
/// `fetch_status` returns the observed object and its status string.
/// `is_not_found` decides whether a fetch error means "not there (yet)"
/// rather than a hard failure.
pub trait StateRefresh: Send + Sync {
    type Output: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_status(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<(Self::Output, String), Self::Error>> + Send + '_>>;

    fn is_not_found(&self, error: &Self::Error) -> bool;
}

/// Why a wait ended without reaching the target.
#[derive(Debug, thiserror::Error)]
pub enum WaitError<E> {
    #[error(
        "timeout while waiting for state to become '{}' (last state: '{}', timeout: {})",
        .expected.join(", "),
        .last_state.as_deref().unwrap_or_default(),
        HumanDuration(.timeout)
    )]
    Timeout {
        last_state: Option<String>,
        expected: Vec<String>,
        timeout: Duration,
    },

    #[error("couldn't find resource ({retries} retries)")]
    NotFound {
        retries: u32,
        #[source]
        last_error: Option<E>,
    },

    #[error("unexpected state '{state}', wanted target '{}'", .expected.join(", "))]
    UnexpectedState { state: String, expected: Vec<String> },

    #[error("wait cancelled")]
    Cancelled,

    #[error(transparent)]
    Refresh(E),
}

/// Configuration for one wait.
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    pub pending: Vec<String>,
    pub target: Vec<String>,
    pub timeout: Duration,
    /// Wait this long before the first fetch.
    pub delay: Duration,
    /// Lower bound on the backoff between fetches.
    pub min_timeout: Duration,
    pub poll_interval: Option<Duration>,
    /// Consecutive not-found observations tolerated before failing.
    pub not_found_checks: u32,
    /// Consecutive target observations required for success.
    pub continuous_target_occurrence: u32,
}

impl StateChangeConf {
    pub fn new<P, T>(pending: P, target: T, timeout: Duration) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            timeout,
            delay: Duration::ZERO,
            min_timeout: Duration::ZERO,
            poll_interval: None,
            not_found_checks: 0,
            continuous_target_occurrence: 1,
        }
    }

    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    pub fn continuous_target_occurrence(mut self, n: u32) -> Self {
        self.continuous_target_occurrence = n.max(1);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn min_timeout(mut self, min: Duration) -> Self {
        self.min_timeout = min;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Poll until a terminal outcome. Returns the object from the fetch that
    /// satisfied the target condition, or `None` when the target was absence.
    pub async fn wait_for_state<R: StateRefresh>(
        &self,
        refresh: &R,
        cancel: &CancellationToken,
    ) -> Result<Option<R::Output>, WaitError<R::Error>> {
        let deadline = Instant::now() + self.timeout;
        let required = self.continuous_target_occurrence.max(1);

        let mut last_state: Option<String> = None;
        let mut not_found_ticks: u32 = 0;
        let mut target_occurrence: u32 = 0;
        let mut wait = Duration::ZERO;
        let mut attempt: u32 = 0;

        if !self.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                _ = tokio::time::sleep_until((Instant::now() + self.delay).min(deadline)) => {}
            }
        }

        loop {
            if !wait.is_zero() {
                trace!(wait_ms = wait.as_millis() as u64, "waiting before next refresh");
                let wake = (Instant::now() + wait).min(deadline);
                tokio::select! {
                    _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                    _ = tokio::time::sleep_until(wake) => {}
                }
            }
            if Instant::now() >= deadline {
                return Err(self.timeout_error(last_state));
            }

            attempt += 1;
            let fetched = tokio::select! {
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                res = tokio::time::timeout_at(deadline, refresh.fetch_status()) => match res {
                    Ok(fetched) => fetched,
                    Err(_) => return Err(self.timeout_error(last_state)),
                },
            };

            match fetched {
                Err(err) if refresh.is_not_found(&err) => {
                    if self.target.is_empty() {
                        target_occurrence += 1;
                        if target_occurrence >= required {
                            debug!(attempt, "resource gone, absence reached");
                            return Ok(None);
                        }
                    } else {
                        not_found_ticks += 1;
                        debug!(attempt, not_found_ticks, "resource not found during wait");
                        if not_found_ticks > self.not_found_checks {
                            return Err(WaitError::NotFound {
                                retries: not_found_ticks,
                                last_error: Some(err),
                            });
                        }
                    }
                }
                Err(err) => return Err(WaitError::Refresh(err)),
                Ok((output, state)) => {
                    not_found_ticks = 0;
                    debug!(attempt, state = %state, "refreshed state");

                    if self.target.contains(&state) {
                        target_occurrence += 1;
                        if target_occurrence >= required {
                            return Ok(Some(output));
                        }
                    } else if self.pending.contains(&state) {
                        target_occurrence = 0;
                    } else if !self.pending.is_empty() {
                        return Err(WaitError::UnexpectedState {
                            state,
                            expected: self.target.clone(),
                        });
                    }
                    last_state = Some(state);
                }
            }

            wait = self.next_wait(wait, target_occurrence);
        }
    }

    fn next_wait(&self, previous: Duration, target_occurrence: u32) -> Duration {
        if let Some(interval) = self.poll_interval
            && !interval.is_zero()
            && interval < MAX_POLL_INTERVAL
        {
            return interval;
        }
        let mut wait = if previous.is_zero() {
            INITIAL_WAIT
        } else if target_occurrence == 0 {
            previous * 2
        } else {
            previous
        };
        if wait < self.min_timeout {
            wait = self.min_timeout;
        } else if wait > MAX_WAIT {
            wait = MAX_WAIT;
        }
        wait
    }

    fn timeout_error<E>(&self, last_state: Option<String>) -> WaitError<E> {
        WaitError::Timeout {
            last_state,
            expected: self.target.clone(),
            timeout: self.timeout,
        }
    }
}

struct HumanDuration<'a>(&'a Duration);

impl fmt::Display for HumanDuration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        match (secs / 60, secs % 60) {
            (0, s) => write!(f, "{s}s"),
            (m, 0) => write!(f, "{m}m0s"),
            (m, s) => write!(f, "{m}m{s}s"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum FakeError {
        #[error("not found")]
        Missing,
        #[error("throttled")]
        Throttled,
    }

    /// Replays a fixed script of observations; the last entry repeats.
    struct Script {
        steps: Mutex<VecDeque<Result<&'static str, bool>>>,
        calls: AtomicU32,
    }

    impl Script {
        /// `Err(true)` is not-found, `Err(false)` a hard failure.
        fn new(steps: Vec<Result<&'static str, bool>>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl StateRefresh for Script {
        type Output = u32;
        type Error = FakeError;

        fn fetch_status(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<(u32, String), FakeError>> + Send + '_>> {
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                let mut steps = self.steps.lock().unwrap();
                let step = if steps.len() > 1 {
                    steps.pop_front().unwrap()
                } else {
                    *steps.front().unwrap()
                };
                match step {
                    Ok(state) => Ok((n, state.to_string())),
                    Err(true) => Err(FakeError::Missing),
                    Err(false) => Err(FakeError::Throttled),
                }
            })
        }

        fn is_not_found(&self, error: &FakeError) -> bool {
            matches!(error, FakeError::Missing)
        }
    }

    fn creating() -> StateChangeConf {
        StateChangeConf::new(["CREATING"], ["READY"], Duration::from_secs(600))
            .not_found_checks(20)
            .continuous_target_occurrence(2)
    }

    #[tokio::test(start_paused = true)]
    async fn requires_consecutive_target_observations() {
        let script = Script::new(vec![Ok("CREATING"), Ok("CREATING"), Ok("READY"), Ok("READY")]);
        let out = creating()
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, Some(4), "success must come from the fourth fetch");
        assert_eq!(script.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_between_targets_resets_the_count() {
        let script = Script::new(vec![
            Ok("READY"),
            Ok("CREATING"),
            Ok("READY"),
            Ok("READY"),
        ]);
        creating()
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(script.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn tolerates_not_found_up_to_the_limit() {
        let mut steps = vec![Err(true); 20];
        steps.extend([Ok("READY"), Ok("READY")]);
        let script = Script::new(steps);
        let out = creating()
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, Some(22));
    }

    #[tokio::test(start_paused = true)]
    async fn fails_after_too_many_not_found() {
        let script = Script::new(vec![Err(true)]);
        let err = creating()
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::NotFound { retries: 21, .. }), "got {err:?}");
        assert_eq!(script.calls(), 21);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_not_found_checks_fails_immediately() {
        let script = Script::new(vec![Err(true)]);
        let conf = StateChangeConf::new(["DELETING"], ["GONE"], Duration::from_secs(600));
        let err = conf
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::NotFound { retries: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn single_target_observation_is_enough_by_default() {
        let script = Script::new(vec![Ok("DELETING"), Ok("GONE")]);
        let conf = StateChangeConf::new(["DELETING"], ["GONE"], Duration::from_secs(600));
        let out = conf
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_state_fails() {
        let script = Script::new(vec![Ok("CREATING"), Ok("FAILED")]);
        let err = creating()
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            WaitError::UnexpectedState { state, expected } => {
                assert_eq!(state, "FAILED");
                assert_eq!(expected, vec!["READY".to_string()]);
            }
            other => panic!("expected UnexpectedState, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hard_refresh_error_is_returned_as_is() {
        let script = Script::new(vec![Ok("CREATING"), Err(false)]);
        let err = creating()
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::Refresh(FakeError::Throttled)));
        assert_eq!(err.to_string(), "throttled");
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_last_state() {
        let script = Script::new(vec![Ok("CREATING")]);
        let conf = StateChangeConf::new(["CREATING"], ["READY"], Duration::from_secs(30));
        let err = conf
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap_err();
        match &err {
            WaitError::Timeout { last_state, .. } => {
                assert_eq!(last_state.as_deref(), Some("CREATING"));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert!(err.to_string().contains("timeout: 30s"), "got: {err}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_the_wait() {
        let script = Script::new(vec![Ok("CREATING")]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });
        let err = creating().wait_for_state(&script, &cancel).await.unwrap_err();
        assert!(matches!(err, WaitError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_target_treats_absence_as_success() {
        let script = Script::new(vec![Ok("DELETING"), Err(true)]);
        let conf = StateChangeConf::new(["DELETING"], Vec::<String>::new(), Duration::from_secs(60));
        let out = conf
            .wait_for_state(&script, &CancellationToken::new())
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn backoff_doubles_and_is_capped() {
        let conf = StateChangeConf::new(["A"], ["B"], Duration::from_secs(60));
        let mut wait = Duration::ZERO;
        let mut seen = Vec::new();
        for _ in 0..9 {
            wait = conf.next_wait(wait, 0);
            seen.push(wait);
        }
        assert_eq!(seen[0], Duration::from_millis(100));
        assert_eq!(seen[1], Duration::from_millis(200));
        assert_eq!(seen[6], Duration::from_millis(6400));
        assert_eq!(seen[7], MAX_WAIT);
        assert_eq!(seen[8], MAX_WAIT);
    }

    #[test]
    fn poll_interval_overrides_backoff() {
        let conf = StateChangeConf::new(["A"], ["B"], Duration::from_secs(60))
            .poll_interval(Duration::from_secs(5));
        assert_eq!(conf.next_wait(Duration::ZERO, 0), Duration::from_secs(5));

        let too_long = StateChangeConf::new(["A"], ["B"], Duration::from_secs(60))
            .poll_interval(Duration::from_secs(300));
        assert_eq!(too_long.next_wait(Duration::ZERO, 0), INITIAL_WAIT);
    }

    #[test]
    fn min_timeout_raises_the_floor() {
        let conf = StateChangeConf::new(["A"], ["B"], Duration::from_secs(60))
            .min_timeout(Duration::from_secs(3));
        assert_eq!(conf.next_wait(Duration::ZERO, 0), Duration::from_secs(3));
    }
}
