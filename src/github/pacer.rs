use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Process-wide minimum spacing between upstream requests.
///
/// Callers are serialized through a single "last request" slot, so the gate caps
/// throughput no matter how many requests are in flight.
pub struct RequestPacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until the next request may be sent
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_request_is_not_delayed() {
        let pacer = RequestPacer::new(Duration::from_secs(1));
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_requests_are_spaced() {
        let pacer = RequestPacer::new(Duration::from_secs(1));
        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_the_gate() {
        let pacer = Arc::new(RequestPacer::new(Duration::from_millis(500)));
        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pacer = pacer.clone();
                tokio::spawn(async move { pacer.wait().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_counts_towards_spacing() {
        let pacer = RequestPacer::new(Duration::from_secs(1));
        pacer.wait().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
