//! Per-key single-flight execution
//!
//! The first caller for a key becomes the leader and its work runs on a
//! spawned task; every caller, leader included, waits on a watch channel for
//! the published value. Dropping a waiting future therefore never cancels the
//! shared work.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::domain::DomainError;

type Slots<T> = Arc<Mutex<HashMap<String, watch::Receiver<Option<T>>>>>;

/// Value published by a flight, with whether this caller joined an existing one
#[derive(Debug, Clone, PartialEq)]
pub struct Flight<T> {
    pub value: T,
    pub shared: bool,
}

/// At most one in-flight computation per key; concurrent callers share its result
#[derive(Debug)]
pub struct SingleFlight<T> {
    slots: Slots<T>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` unless a flight for `key` is already running, then wait for the result
    ///
    /// `work` is only called by the leader. The slot is released before the
    /// value is published, so a caller arriving after completion starts a new
    /// flight.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<Flight<T>, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (mut receiver, shared) = {
            let mut slots = self
                .slots
                .lock()
                .map_err(|e| DomainError::internal(format!("Failed to acquire flight lock: {}", e)))?;

            match slots.get(key) {
                Some(receiver) => (receiver.clone(), true),
                None => {
                    let (sender, receiver) = watch::channel(None);
                    slots.insert(key.to_string(), receiver.clone());

                    let release = SlotRelease {
                        slots: self.slots.clone(),
                        key: key.to_string(),
                        receiver: receiver.clone(),
                    };
                    let future = work();

                    tokio::spawn(async move {
                        let value = future.await;
                        drop(release);
                        sender.send_replace(Some(value));
                    });

                    (receiver, false)
                }
            }
        };

        let value = match receiver.wait_for(Option::is_some).await {
            Ok(published) => published.clone(),
            Err(_) => None,
        };

        value
            .map(|value| Flight { value, shared })
            .ok_or_else(|| DomainError::internal(format!("in-flight work for '{}' was aborted", key)))
    }

    /// Number of keys with a flight currently running
    pub fn in_flight(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| slots.len())
            .unwrap_or_default()
    }
}

/// Removes the slot when the flight ends, even if its task panics
struct SlotRelease<T> {
    slots: Slots<T>,
    key: String,
    receiver: watch::Receiver<Option<T>>,
}

impl<T> Drop for SlotRelease<T> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        if slots
            .get(&self.key)
            .is_some_and(|current| current.same_channel(&self.receiver))
        {
            slots.remove(&self.key);
        }
    }
}
