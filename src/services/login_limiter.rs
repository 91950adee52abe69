//! Failed admin-login attempts per client IP.
//!
//! State lives in this process only: a restart clears it and separate
//! instances do not share counts.

use crate::error::AppError;
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// Every this many recorded failures the whole map is swept, so IPs that
/// fail once and never return do not stay tracked forever.
const SWEEP_EVERY: usize = 64;

#[derive(Clone)]
pub struct LoginLimiter {
    failures: Arc<DashMap<IpAddr, Vec<Instant>>>,
    recorded: Arc<AtomicUsize>,
    max_attempts: usize,
    window: Duration,
}

impl LoginLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            failures: Arc::new(DashMap::new()),
            recorded: Arc::new(AtomicUsize::new(0)),
            max_attempts: max_attempts.max(1),
            window,
        }
    }

    pub fn check(&self, ip: IpAddr) -> Result<(), AppError> {
        self.check_at(ip, Instant::now())
    }

    pub fn record_failure(&self, ip: IpAddr) {
        self.record_failure_at(ip, Instant::now());
    }

    pub fn reset(&self, ip: IpAddr) {
        self.failures.remove(&ip);
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), AppError> {
        let Some(mut attempts) = self.failures.get_mut(&ip) else {
            return Ok(());
        };
        attempts.retain(|t| now.duration_since(*t) < self.window);
        if attempts.len() < self.max_attempts {
            if attempts.is_empty() {
                drop(attempts);
                self.failures.remove(&ip);
            }
            return Ok(());
        }

        let oldest = attempts.iter().min().copied().unwrap_or(now);
        let retry_after = self.window.saturating_sub(now.duration_since(oldest));
        Err(AppError::TooManyRequests {
            retry_after_secs: retry_after.as_secs().max(1),
        })
    }

    fn record_failure_at(&self, ip: IpAddr, now: Instant) {
        {
            let mut attempts = self.failures.entry(ip).or_default();
            attempts.retain(|t| now.duration_since(*t) < self.window);
            attempts.push(now);
            tracing::warn!(ip = %ip, failures = attempts.len(), "Failed admin login");
        }

        // The entry guard above must be released before retain locks every shard.
        if (self.recorded.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            self.sweep_at(now);
        }
    }

    fn sweep_at(&self, now: Instant) {
        let before = self.failures.len();
        self.failures.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < self.window);
            !attempts.is_empty()
        });
        tracing::debug!(
            dropped = before.saturating_sub(self.failures.len()),
            "Swept expired login failures"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const IP: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));

    #[test]
    fn allows_until_limit() {
        let limiter = LoginLimiter::new(3, Duration::from_secs(60));
        let t0 = Instant::now();
        for _ in 0..2 {
            limiter.record_failure_at(IP, t0);
        }
        assert!(limiter.check_at(IP, t0).is_ok());
        limiter.record_failure_at(IP, t0);
        assert!(matches!(
            limiter.check_at(IP, t0),
            Err(AppError::TooManyRequests { retry_after_secs: 60 })
        ));
    }

    #[test]
    fn window_expiry_unblocks() {
        let limiter = LoginLimiter::new(1, Duration::from_secs(60));
        let t0 = Instant::now();
        limiter.record_failure_at(IP, t0);
        assert!(limiter.check_at(IP, t0 + Duration::from_secs(30)).is_err());
        assert!(limiter.check_at(IP, t0 + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn other_ips_are_independent() {
        let limiter = LoginLimiter::new(1, Duration::from_secs(60));
        let t0 = Instant::now();
        limiter.record_failure_at(IP, t0);
        let other = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1));
        assert!(limiter.check_at(other, t0).is_ok());
    }

    #[test]
    fn one_off_failures_are_swept_after_expiry() {
        let limiter = LoginLimiter::new(5, Duration::from_secs(60));
        let t0 = Instant::now();
        limiter.record_failure_at(IP, t0);

        let later = t0 + Duration::from_secs(61);
        for i in 1..SWEEP_EVERY {
            let ip = IpAddr::V4(Ipv4Addr::new(10, 0, (i / 256) as u8, (i % 256) as u8));
            limiter.record_failure_at(ip, later);
        }

        assert!(!limiter.failures.contains_key(&IP));
        assert_eq!(limiter.failures.len(), SWEEP_EVERY - 1);
    }

    #[test]
    fn sweep_keeps_failures_inside_window() {
        let limiter = LoginLimiter::new(5, Duration::from_secs(60));
        let t0 = Instant::now();
        limiter.record_failure_at(IP, t0);
        limiter.sweep_at(t0 + Duration::from_secs(30));
        assert_eq!(limiter.failures.get(&IP).map(|a| a.len()), Some(1));
    }

    #[test]
    fn reset_clears_failures() {
        let limiter = LoginLimiter::new(1, Duration::from_secs(60));
        limiter.record_failure(IP);
        assert!(limiter.check(IP).is_err());
        limiter.reset(IP);
        assert!(limiter.check(IP).is_ok());
    }
}
