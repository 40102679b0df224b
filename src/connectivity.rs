//! Network availability monitoring
//!
//! Probes the forecast API host on an interval from a background task and
//! broadcasts the result through a watch channel. Subscribers see the
//! latest answer immediately and are only woken when it changes.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Host dialed to decide whether the network is usable
const PROBE_HOST: (&str, u16) = ("api.open-meteo.com", 443);

/// Time between probes
const PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// How long a single probe may take before counting as offline
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle over the background connectivity probe
pub struct ConnectivityObserver {
    receiver: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl ConnectivityObserver {
    /// Spawns the probe task against the forecast API host
    pub fn spawn() -> Self {
        Self::spawn_with(PROBE_HOST, PROBE_INTERVAL)
    }

    /// Spawns the probe task against a specific host and interval
    pub fn spawn_with(host: (&'static str, u16), interval: Duration) -> Self {
        // Assume online until the first probe answers
        let (tx, receiver) = watch::channel(true);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let available = probe(host).await;
                tx.send_if_modified(|current| {
                    let changed = *current != available;
                    *current = available;
                    changed
                });
            }
        });

        Self { receiver, task }
    }

    /// Subscribes to the availability signal
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.receiver.clone()
    }
}

impl Drop for ConnectivityObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn probe(host: (&str, u16)) -> bool {
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(host)).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_value_is_available() {
        let observer = ConnectivityObserver::spawn_with(("localhost", 1), Duration::from_secs(3600));
        assert!(*observer.subscribe().borrow());
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_offline() {
        // Port 1 on localhost refuses immediately
        let observer =
            ConnectivityObserver::spawn_with(("localhost", 1), Duration::from_millis(10));
        let mut rx = observer.subscribe();

        let result = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if !*rx.borrow() {
                    return;
                }
                rx.changed().await.expect("observer dropped");
            }
        })
        .await;
        assert!(result.is_ok(), "probe should report offline");
    }

    #[tokio::test]
    async fn test_drop_stops_probe_task() {
        let observer =
            ConnectivityObserver::spawn_with(("localhost", 1), Duration::from_millis(10));
        let mut rx = observer.subscribe();
        drop(observer);

        let closed = tokio::time::timeout(Duration::from_secs(2), async {
            while rx.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok(), "channel should close after drop");
    }
}
