// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{_prelude::*, client::RefreshState, obs};

/// Thread-safe counters for refresh exchanges and post-refresh retries.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	rejection: AtomicU64,
	retry: AtomicU64,
	state: Mutex<RefreshState>,
}
impl RefreshMetrics {
	/// Returns the total number of refresh exchanges started.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of exchanges that stored a new access token.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed exchanges, rejections included.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of exchanges rejected with `401`.
	pub fn rejections(&self) -> u64 {
		self.rejection.load(Ordering::Relaxed)
	}

	/// Returns the number of calls retried after a refresh.
	pub fn retries(&self) -> u64 {
		self.retry.load(Ordering::Relaxed)
	}

	/// Returns the state left behind by the most recent exchange.
	pub fn state(&self) -> RefreshState {
		*self.state.lock()
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejection(&self) {
		self.rejection.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retry.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_state(&self, state: RefreshState) {
		*self.state.lock() = state;

		obs::trace_refresh_state(state);
		obs::record_refresh_state(state);
	}
}
