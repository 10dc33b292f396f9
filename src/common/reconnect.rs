//! Reconnection backoff policy for the lobby session.

use std::time::Duration;

use backon::{BackoffBuilder, ConstantBuilder, ExponentialBuilder};

use crate::config::types::RetryConfig;

/// Default delay between lobby connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// How long to wait between lobby connection attempts.
///
/// Both variants retry forever: the lobby network is volatile and the bridge
/// is a long-running service.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryPolicy {
    /// Same delay before every attempt.
    Fixed { delay: Duration },
    /// Growing delay with jitter, capped at `max_delay`.
    Exponential {
        min_delay: Duration,
        max_delay: Duration,
        factor: f32,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Fixed {
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Build a policy from the `lobby.retry` config section.
    pub fn from_config(config: &RetryConfig) -> Self {
        let delay = Duration::from_secs(config.delay_secs);
        match config.strategy.to_lowercase().as_str() {
            "exponential" => RetryPolicy::Exponential {
                min_delay: delay,
                max_delay: Duration::from_secs(config.max_delay_secs.max(config.delay_secs)),
                factor: config.factor,
            },
            _ => RetryPolicy::Fixed { delay },
        }
    }

    /// Create a fresh, unbounded delay iterator. Called once per connect cycle
    /// so that a successful connection resets the schedule.
    pub fn backoff(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        match *self {
            RetryPolicy::Fixed { delay } => Box::new(
                ConstantBuilder::default()
                    .with_delay(delay)
                    .without_max_times()
                    .build(),
            ),
            RetryPolicy::Exponential {
                min_delay,
                max_delay,
                factor,
            } => Box::new(
                ExponentialBuilder::default()
                    .with_min_delay(min_delay)
                    .with_max_delay(max_delay)
                    .with_factor(factor)
                    .with_jitter()
                    .without_max_times()
                    .build(),
            ),
        }
    }

    /// Delay to fall back on if the iterator ever runs dry.
    pub fn ceiling(&self) -> Duration {
        match *self {
            RetryPolicy::Fixed { delay } => delay,
            RetryPolicy::Exponential { max_delay, .. } => max_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retry_config(strategy: &str) -> RetryConfig {
        RetryConfig {
            strategy: strategy.to_string(),
            delay_secs: 10,
            max_delay_secs: 60,
            factor: 2.0,
        }
    }

    #[test]
    fn test_default_is_fixed_ten_seconds() {
        assert_eq!(
            RetryPolicy::default(),
            RetryPolicy::Fixed {
                delay: Duration::from_secs(10)
            }
        );
    }

    #[test]
    fn test_fixed_backoff_never_grows_or_ends() {
        let policy = RetryPolicy::from_config(&retry_config("fixed"));
        let delays: Vec<Duration> = policy.backoff().take(50).collect();
        assert_eq!(delays.len(), 50);
        assert!(delays.iter().all(|d| *d == Duration::from_secs(10)));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let policy = RetryPolicy::from_config(&retry_config("Exponential"));
        assert_eq!(policy.ceiling(), Duration::from_secs(60));

        let delays: Vec<Duration> = policy.backoff().take(30).collect();
        assert_eq!(delays.len(), 30);
        // Jitter may add up to one extra delay on top of the cap
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(120)));
    }

    #[test]
    fn test_unknown_strategy_falls_back_to_fixed() {
        let policy = RetryPolicy::from_config(&retry_config("linear"));
        assert!(matches!(policy, RetryPolicy::Fixed { .. }));
    }
}
