// Cancellable periodic tasks
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns one periodic task. Stopping or dropping the handle aborts the task,
/// so every started poller has a guaranteed teardown.
#[derive(Debug)]
pub struct PollingHandle {
    name: String,
    task: JoinHandle<()>,
}

impl PollingHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        if self.is_running() {
            self.task.abort();
            tracing::info!(poller = %self.name, "poller stopped");
        }
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `tick` every `period_ms`. The first run happens one full period after
/// the call, never immediately.
pub fn spawn_polling<F, Fut>(name: impl Into<String>, period_ms: u64, mut tick: F) -> PollingHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let name = name.into();
    let period = Duration::from_millis(period_ms.max(1));

    let task = tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            tick().await;
        }
    });

    tracing::info!(poller = %name, period_ms = period.as_millis() as u64, "poller started");
    PollingHandle { name, task }
}

/// Process-wide stop flag for long-lived work that is not a poller, such as
/// open update streams. Once triggered it stays triggered.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `trigger` has been called, immediately if it already was.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

/// RNG for one poller. With a configured seed every poller gets its own
/// reproducible stream derived from `salt`; otherwise it is seeded from the OS.
pub fn make_rng(seed: Option<u64>, salt: &str) -> StdRng {
    match seed {
        Some(seed) => {
            let mixed = salt
                .bytes()
                .fold(seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            StdRng::seed_from_u64(mixed)
        }
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_poller(period_ms: u64) -> (PollingHandle, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handle = spawn_polling("counter", period_ms, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (handle, count)
    }

    #[tokio::test]
    async fn test_poller_ticks_until_stopped() {
        let (handle, count) = counting_poller(10);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(count.load(Ordering::SeqCst) >= 2);
        assert!(handle.is_running());

        handle.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_stop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(count.load(Ordering::SeqCst), after_stop);
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_dropping_handle_cancels_task() {
        let (handle, count) = counting_poller(10);
        drop(handle);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(count.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test]
    async fn test_first_tick_waits_one_period() {
        let (handle, count) = counting_poller(200);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        handle.stop();
    }

    #[tokio::test]
    async fn test_shutdown_signal_wakes_every_waiter() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let signal = signal.clone();
                tokio::spawn(async move { signal.triggered().await })
            })
            .collect();
        signal.trigger();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
        }
        assert!(signal.is_triggered());
        // late waiters return straight away
        tokio::time::timeout(Duration::from_millis(50), signal.triggered())
            .await
            .unwrap();
    }

    #[test]
    fn test_seeded_rngs_are_reproducible_per_salt() {
        let a: f64 = make_rng(Some(42), "fleet").gen_range(0.0..1.0);
        let b: f64 = make_rng(Some(42), "fleet").gen_range(0.0..1.0);
        let c: f64 = make_rng(Some(42), "alerts").gen_range(0.0..1.0);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
