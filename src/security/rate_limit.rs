//! Per-client token bucket rate limiting.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// A simple token bucket rate limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Reads tokio's clock, which follows `time::pause` in tests.
fn now() -> Instant {
    time::Instant::now().into_std()
}

/// Admission control keyed by client address.
///
/// Each address owns one bucket. The bucket is created on first use through
/// the map's entry API, so concurrent first requests from the same address
/// share a single bucket, and refill plus decrement run under that entry's
/// lock as one step.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<IpAddr, TokenBucket>,
    enabled: bool,
    rate: f64,
    burst: f64,
    idle: Duration,
    sweep_interval: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            enabled: config.enabled,
            rate: config.requests_per_second,
            burst: f64::from(config.burst_size),
            idle: Duration::from_secs(config.idle_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Take one permit for `client`. Always true when disabled.
    pub fn allow(&self, client: IpAddr) -> bool {
        self.allow_at(client, now())
    }

    fn allow_at(&self, client: IpAddr, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        let mut bucket = self
            .buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(self.burst, now));

        let allowed = bucket.try_acquire(self.burst, self.rate, now);
        if !allowed {
            metrics::record_rate_limited();
        }
        allowed
    }

    /// Number of tracked client addresses.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Drop buckets that have not been touched for longer than the idle window.
    pub fn sweep(&self) -> usize {
        self.sweep_at(now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_update) <= self.idle);
        before.saturating_sub(self.buckets.len())
    }

    /// Periodically sweep idle buckets until shutdown is signalled.
    pub async fn run_sweeper(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        if !self.enabled {
            return;
        }

        let mut ticker = time::interval(self.sweep_interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.tracked_clients(), "Swept idle rate limit buckets");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn limiter(rps: f64, burst: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            enabled: true,
            requests_per_second: rps,
            burst_size: burst,
            ..RateLimitConfig::default()
        })
    }

    fn client(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn burst_then_deny() {
        let limiter = limiter(2.0, 4);
        let now = Instant::now();

        let allowed = (0..5).filter(|_| limiter.allow_at(client(1), now)).count();
        assert_eq!(allowed, 4);
    }

    #[test]
    fn refills_at_configured_rate() {
        let limiter = limiter(2.0, 4);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.allow_at(client(1), start);
        }

        let later = start + Duration::from_secs(1);
        let allowed = (0..5).filter(|_| limiter.allow_at(client(1), later)).count();
        assert_eq!(allowed, 2);
    }

    #[test]
    fn refill_is_capped_at_burst() {
        let limiter = limiter(2.0, 4);
        let start = Instant::now();
        limiter.allow_at(client(1), start);

        let much_later = start + Duration::from_secs(3600);
        let allowed = (0..10).filter(|_| limiter.allow_at(client(1), much_later)).count();
        assert_eq!(allowed, 4);
    }

    #[test]
    fn clients_have_independent_buckets() {
        let limiter = limiter(1.0, 1);
        let now = Instant::now();
        assert!(limiter.allow_at(client(1), now));
        assert!(!limiter.allow_at(client(1), now));
        assert!(limiter.allow_at(client(2), now));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn disabled_limiter_always_allows() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: false,
            burst_size: 1,
            ..RateLimitConfig::default()
        });
        assert!((0..100).all(|_| limiter.allow(client(1))));
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn sweep_drops_only_idle_buckets() {
        let limiter = limiter(2.0, 4);
        let start = Instant::now();
        limiter.allow_at(client(1), start);
        limiter.allow_at(client(2), start + Duration::from_secs(150));

        let removed = limiter.sweep_at(start + Duration::from_secs(200));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn concurrent_first_requests_share_one_bucket() {
        let limiter = Arc::new(limiter(0.0001, 4));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.allow(client(9)))
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(allowed, 4);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_drops_idle_buckets_and_stops_on_shutdown() {
        let limiter = Arc::new(RateLimiter::new(&RateLimitConfig {
            enabled: true,
            idle_secs: 180,
            sweep_interval_secs: 60,
            ..RateLimitConfig::default()
        }));
        limiter.allow(client(4));

        let (tx, rx) = broadcast::channel(1);
        let sweeper = tokio::spawn(limiter.clone().run_sweeper(rx));

        // Sweeps at 60s and 120s leave the bucket alone.
        time::sleep(Duration::from_secs(121)).await;
        assert_eq!(limiter.tracked_clients(), 1);

        // By 241s a sweep has found it idle past the window.
        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(limiter.tracked_clients(), 0);

        tx.send(()).unwrap();
        time::timeout(Duration::from_secs(1), sweeper)
            .await
            .expect("sweeper should exit on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn real_clock_refill() {
        let limiter = limiter(2.0, 4);
        let allowed = (0..5).filter(|_| limiter.allow(client(3))).count();
        assert_eq!(allowed, 4);

        tokio::time::sleep(Duration::from_millis(1050)).await;
        let allowed = (0..2).filter(|_| limiter.allow(client(3))).count();
        assert_eq!(allowed, 2);
    }
}
