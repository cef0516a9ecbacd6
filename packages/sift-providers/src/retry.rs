use std::time::Duration;

use crate::{BoxFuture, Result};

/// Exponential backoff schedule shared by every upstream caller.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &sift_config::Retry) -> Self {
		Self {
			max_attempts: cfg.max_attempts,
			base_delay: Duration::from_millis(cfg.base_delay_ms),
			max_delay: Duration::from_millis(cfg.max_delay_ms),
		}
	}

	/// Delay before retry number `attempt` (1-based), doubling from the base
	/// and capped at the maximum.
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));

		self.base_delay.saturating_mul(factor).min(self.max_delay)
	}
}

/// Runs `op` up to `policy.max_attempts` times, sleeping between attempts.
/// Errors that [`crate::Error::is_retryable`] rejects are returned at once.
pub async fn with_retry<'a, T>(
	policy: RetryPolicy,
	mut op: impl FnMut() -> BoxFuture<'a, Result<T>>,
) -> Result<T> {
	let attempts = policy.max_attempts.max(1);
	let mut attempt = 0;

	loop {
		attempt += 1;
		match op().await {
			Ok(value) => return Ok(value),
			Err(e) if e.is_retryable() && attempt < attempts => {
				tokio::time::sleep(policy.delay_for(attempt)).await;
			},
			Err(e) => return Err(e),
		}
	}
}
