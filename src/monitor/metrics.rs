// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for session checks and refresh outcomes.
#[derive(Debug, Default)]
pub struct MonitorMetrics {
	checks: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_success: AtomicU64,
	refresh_failure: AtomicU64,
}
impl MonitorMetrics {
	/// Returns the total number of session checks performed.
	pub fn checks(&self) -> u64 {
		self.checks.load(Ordering::Relaxed)
	}

	/// Returns the total number of refresh attempts.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful refreshes (including gate reuses).
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refreshes.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_check(&self) {
		self.checks.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failure.fetch_add(1, Ordering::Relaxed);
	}
}
