//! Single-Flight Loading
//!
//! Coordinates concurrent misses on the same key: the first caller becomes
//! the leader and runs the loader, later callers park until the leader
//! publishes the outcome. A leader that unwinds without publishing releases
//! its waiters with [`Error::LoadAbandoned`] so the key never stays wedged.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::error::{Error, Result};

/// One in-progress load
pub(crate) struct Flight<V> {
    outcome: Mutex<Option<Result<V>>>,
    ready: Condvar,
}

impl<V: Clone> Flight<V> {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Block until the leader publishes, then share its outcome
    pub(crate) fn wait(&self) -> Result<V> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.ready.wait(&mut outcome);
        }
    }

    fn publish(&self, result: Result<V>) {
        *self.outcome.lock() = Some(result);
        self.ready.notify_all();
    }
}

/// How a caller takes part in a load
pub(crate) enum Role<'a, K: Eq + Hash, V: Clone> {
    /// Runs the loader
    Leader(FlightLeader<'a, K, V>),
    /// Waits for someone else's loader
    Follower(Arc<Flight<V>>),
}

/// Registry of loads in progress, keyed like the cache
pub(crate) struct Flights<K, V> {
    in_flight: DashMap<K, Arc<Flight<V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> Flights<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }

    /// Join the load for `key`, starting one if none is running
    pub(crate) fn join(&self, key: &K) -> Role<'_, K, V> {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => Role::Follower(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let flight = Arc::new(Flight::new());
                entry.insert(Arc::clone(&flight));
                Role::Leader(FlightLeader {
                    flights: self,
                    key: key.clone(),
                    flight,
                    published: false,
                })
            }
        }
    }

    /// Loads currently running
    pub(crate) fn len(&self) -> usize {
        self.in_flight.len()
    }

    fn retire(&self, key: &K, flight: &Arc<Flight<V>>) {
        self.in_flight
            .remove_if(key, |_, current| Arc::ptr_eq(current, flight));
    }
}

/// Exclusive right to run the loader for one key
pub(crate) struct FlightLeader<'a, K: Eq + Hash, V: Clone> {
    flights: &'a Flights<K, V>,
    key: K,
    flight: Arc<Flight<V>>,
    published: bool,
}

impl<K: Eq + Hash + Clone, V: Clone> FlightLeader<'_, K, V> {
    /// Hand `result` to every waiter and close the flight
    ///
    /// On success the value must already be visible in the key index, so a
    /// caller arriving after the flight closes finds it there.
    pub(crate) fn complete(mut self, result: Result<V>) -> Result<V> {
        self.flights.retire(&self.key, &self.flight);
        self.flight.publish(result.clone());
        self.published = true;
        result
    }
}

impl<K: Eq + Hash, V: Clone> Drop for FlightLeader<'_, K, V> {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        debug!("loader unwound, releasing waiters");
        self.flights
            .in_flight
            .remove_if(&self.key, |_, current| Arc::ptr_eq(current, &self.flight));
        self.flight.publish(Err(Error::LoadAbandoned));
    }
}

// =============================================================================
// Tests
// =============================================================================
