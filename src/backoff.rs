//! Full-jitter exponential backoff.
//!
//! For retry attempt `n` the delay is drawn uniformly from
//! `[0, min(cap, base * 2^n))`. Spreading delays over the whole window keeps
//! many clients hitting the same overloaded server from retrying in lockstep.

use std::time::Duration;

use rand::Rng;

// 2^31 already exceeds any sensible cap for a non-zero base.
const MAX_EXPONENT: u32 = 31;

/// Randomized delay policy used between 503 retries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FullJitterBackoff {
    base: Duration,
    cap: Duration,
}

impl Default for FullJitterBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_secs(5))
    }
}

impl FullJitterBackoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn cap(&self) -> Duration {
        self.cap
    }

    /// Exclusive upper bound of the delay for `attempt`: `min(cap, base * 2^attempt)`.
    pub fn ceiling(&self, attempt: usize) -> Duration {
        let exp = u32::try_from(attempt).unwrap_or(u32::MAX).min(MAX_EXPONENT);
        self.base
            .checked_mul(1u32 << exp)
            .map_or(self.cap, |delay| delay.min(self.cap))
    }

    /// Samples a delay for `attempt`, the number of retries already performed.
    pub fn delay(&self, attempt: usize) -> Duration {
        let ceiling = u64::try_from(self.ceiling(attempt).as_nanos()).unwrap_or(u64::MAX);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::rng().random_range(0..ceiling))
    }

    /// Sleeps for a sampled delay and returns it.
    ///
    /// The sleep is a tokio timer, so the calling task yields while waiting
    /// and dropping the future cancels the wait.
    pub async fn wait(&self, attempt: usize) -> Duration {
        let delay = self.delay(attempt);

        #[cfg(feature = "tracing")]
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off before retry");

        tokio::time::sleep(delay).await;
        delay
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::FullJitterBackoff;

    #[test]
    fn delay_stays_inside_full_jitter_window() {
        let policy = FullJitterBackoff::new(Duration::from_millis(100), Duration::from_secs(3));

        for attempt in 0..=20 {
            let ceiling = policy.ceiling(attempt);
            let expected = Duration::from_millis(100 * (1u64 << attempt)).min(Duration::from_secs(3));
            assert_eq!(ceiling, expected, "ceiling at attempt {attempt}");

            for _ in 0..200 {
                assert!(policy.delay(attempt) < ceiling, "delay at attempt {attempt}");
            }
        }
    }

    #[test]
    fn huge_attempts_do_not_overflow() {
        let policy = FullJitterBackoff::new(Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(policy.ceiling(usize::MAX), Duration::from_secs(10));
        assert!(policy.delay(1_000) < Duration::from_secs(10));
    }

    #[test]
    fn zero_base_never_waits() {
        let policy = FullJitterBackoff::new(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(policy.delay(5), Duration::ZERO);
    }

    #[test]
    fn delays_are_spread_across_the_window() {
        let policy = FullJitterBackoff::new(Duration::from_millis(1), Duration::from_secs(5));
        let ceiling = policy.ceiling(10);
        let samples: Vec<Duration> = (0..500).map(|_| policy.delay(10)).collect();

        assert!(samples.iter().any(|delay| *delay < ceiling / 4));
        assert!(samples.iter().any(|delay| *delay > ceiling / 2));
    }

    #[tokio::test]
    async fn wait_sleeps_for_the_sampled_delay() {
        let policy = FullJitterBackoff::new(Duration::from_millis(2), Duration::from_millis(4));
        let started = tokio::time::Instant::now();
        let delay = policy.wait(0).await;

        assert!(delay < Duration::from_millis(2));
        assert!(started.elapsed() >= delay);
    }
}
