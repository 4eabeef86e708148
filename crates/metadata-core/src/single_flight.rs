//! Keyed in-flight request coalescing.
//!
//! The first caller for a key becomes the leader and runs the work; callers
//! that arrive while it is running subscribe to a watch channel and receive a
//! clone of the leader's result. The key is removed as soon as the leader
//! finishes, so this never acts as a second cache layer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

pub struct SingleFlight<T> {
    in_flight: Mutex<HashMap<String, watch::Receiver<Option<T>>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }
}

struct FlightGuard<'a, T> {
    owner: &'a SingleFlight<T>,
    key: &'a str,
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        self.owner.map().remove(self.key);
    }
}

impl<T> SingleFlight<T> {
    fn map(&self) -> MutexGuard<'_, HashMap<String, watch::Receiver<Option<T>>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn in_flight(&self) -> usize {
        self.map().len()
    }
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` unless a call for `key` is already running, in which case
    /// the running call's result is awaited and returned instead.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let sender = loop {
            let mut receiver = {
                let mut map = self.map();
                match map.get(key) {
                    Some(receiver) => receiver.clone(),
                    None => {
                        let (sender, receiver) = watch::channel(None);
                        map.insert(key.to_string(), receiver);
                        break sender;
                    }
                }
            };

            debug!("singleflight wait: key={}", key);
            if let Ok(value) = receiver.wait_for(Option::is_some).await {
                if let Some(result) = value.as_ref() {
                    return result.clone();
                }
            }
            // Leader was dropped before finishing; try to take over.
            debug!("singleflight leader abandoned: key={}", key);
        };

        debug!("singleflight lead: key={}", key);
        let _guard = FlightGuard { owner: self, key };
        let result = work().await;
        sender.send_replace(Some(result.clone()));
        debug!("singleflight complete: key={}", key);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_execution() {
        let flight: Arc<SingleFlight<Result<i64, String>>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8).map(|_| {
            let flight = Arc::clone(&flight);
            let calls = Arc::clone(&calls);
            async move {
                flight
                    .run("series:lost:2004", || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(4815)
                    })
                    .await
            }
        });
        let results = futures::future::join_all(tasks).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r == &Ok(4815)));
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_waiters_receive_the_same_error() {
        let flight: Arc<SingleFlight<Result<i64, String>>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..4).map(|_| {
            let flight = Arc::clone(&flight);
            let calls = Arc::clone(&calls);
            async move {
                flight
                    .run("missing", || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Err("not found".to_string())
                    })
                    .await
            }
        });
        let results = futures::future::join_all(tasks).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r == &Err("not found".to_string())));
    }

    #[tokio::test]
    async fn test_sequential_calls_run_again() {
        let flight: SingleFlight<u32> = SingleFlight::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            flight
                .run("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    1
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_waiter_takes_over_when_leader_is_cancelled() {
        let flight: Arc<SingleFlight<u32>> = Arc::new(SingleFlight::new());

        let leader = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move {
                flight
                    .run("k", || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        1
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let waiter = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move { flight.run("k", || async { 2 }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        assert_eq!(waiter.await.unwrap(), 2);
        assert_eq!(flight.in_flight(), 0);
    }
}
