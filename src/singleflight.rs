//! Coalesce concurrent calls for the same key into one in-flight future.
//!
//! The first caller for a key becomes the leader and drives the work; every
//! caller that arrives while it is outstanding awaits the same result. The key
//! is released as soon as the leader's future completes or is dropped, so the
//! next call after that starts fresh.

use futures::{
    FutureExt,
    future::{BoxFuture, Shared, WeakShared},
};
use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError},
};

type Flight<T> = Shared<BoxFuture<'static, T>>;

struct Entries<K, T>
where
    T: Clone,
{
    next_generation: u64,
    flights: HashMap<K, (u64, WeakShared<BoxFuture<'static, T>>)>,
}

pub struct SingleFlight<K, T>
where
    T: Clone,
{
    entries: Arc<Mutex<Entries<K, T>>>,
}

impl<K, T> Default for SingleFlight<K, T>
where
    T: Clone,
{
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries {
                next_generation: 0,
                flights: HashMap::new(),
            })),
        }
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` unless a call for `key` is already in flight, in which case
    /// await that call's result instead. `work` is only polled through the
    /// shared handle, and is dropped once every waiter has gone away.
    pub async fn run<F>(&self, key: K, work: F) -> T
    where
        F: Future<Output = T> + Send + 'static,
    {
        let flight: Flight<T> = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

            let existing = entries
                .flights
                .get(&key)
                .and_then(|(_, weak)| weak.upgrade());

            match existing {
                Some(flight) => flight,
                None => {
                    let generation = entries.next_generation;
                    entries.next_generation = entries.next_generation.wrapping_add(1);

                    let release = Release {
                        key: key.clone(),
                        generation,
                        entries: Arc::clone(&self.entries),
                    };
                    let flight = async move {
                        let _release = release;
                        work.await
                    }
                    .boxed()
                    .shared();

                    if let Some(weak) = flight.downgrade() {
                        entries.flights.insert(key, (generation, weak));
                    }
                    flight
                }
            }
        };

        flight.await
    }

    /// Number of keys with a call outstanding.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flights
            .len()
    }
}

struct Release<K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    key: K,
    generation: u64,
    entries: Arc<Mutex<Entries<K, T>>>,
}

impl<K, T> Drop for Release<K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    fn drop(&mut self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let current = entries
            .flights
            .get(&self.key)
            .is_some_and(|(generation, _)| *generation == self.generation);
        if current {
            entries.flights.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{Duration, sleep};

    #[tokio::test]
    async fn concurrent_calls_share_one_execution() {
        let flights: SingleFlight<&'static str, usize> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let work = |calls: Arc<AtomicUsize>| async move {
            sleep(Duration::from_millis(50)).await;
            calls.fetch_add(1, Ordering::SeqCst) + 1
        };

        let (a, b, c) = tokio::join!(
            flights.run("renewal", work(Arc::clone(&calls))),
            flights.run("renewal", work(Arc::clone(&calls))),
            flights.run("renewal", work(Arc::clone(&calls))),
        );

        assert_eq!((a, b, c), (1, 1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_run_independently() {
        let flights: SingleFlight<u8, u8> = SingleFlight::new();
        let (a, b) = tokio::join!(
            flights.run(1, async { 1 }),
            flights.run(2, async { 2 }),
        );
        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn sequential_calls_run_again() {
        let flights: SingleFlight<(), usize> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            flights
                .run((), async move { calls.fetch_add(1, Ordering::SeqCst) })
                .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dropped_leader_releases_key() {
        let flights: SingleFlight<(), ()> = SingleFlight::new();
        {
            let pending = flights.run((), sleep(Duration::from_secs(60)));
            tokio::pin!(pending);
            assert!(futures::poll!(pending.as_mut()).is_pending());
            assert_eq!(flights.in_flight(), 1);
        }
        assert_eq!(flights.in_flight(), 0);
    }
}
