use std::time::Duration;

use tokio::time::Instant;

/// Minimum delay between successive capture calls.
pub const CAPTURE_INTERVAL: Duration = Duration::from_secs(2);

/// Minimum delay between successive Diffbot calls. The free tier allows
/// roughly 5 requests per minute; 12.5s stays on the safe side.
pub const EXTRACTION_INTERVAL: Duration = Duration::from_millis(12_500);

/// Enforces a minimum interval between external calls to one provider.
/// `wait` blocks until at least `interval` has elapsed since the previous
/// `wait` returned; the first call returns immediately. One pacer instance
/// per provider per stage run.
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
