//! Keyed response cache with request generations.
//!
//! Sibling charts often ask for the same dataset. Responses are stored by
//! request key; each request begun for a key gets a ticket, and only the
//! newest ticket for a key may store its response.

use std::collections::HashMap;
use std::hash::Hash;

/// Handed out by [`ResponseCache::begin`] and redeemed by
/// [`ResponseCache::complete`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Ticket<K> {
    pub key: K,
    pub generation: u64,
}

#[derive(Debug)]
struct Slot<V> {
    latest: u64,
    value: Option<V>,
}

#[derive(Debug)]
pub struct ResponseCache<K, V> {
    slots: HashMap<K, Slot<V>>,
    next_generation: u64,
}

impl<K, V> Default for ResponseCache<K, V> {
    fn default() -> Self {
        ResponseCache {
            slots: HashMap::new(),
            next_generation: 0,
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> ResponseCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.slots.get(key).and_then(|slot| slot.value.clone())
    }

    /// Register a new request for `key`; earlier tickets for it become stale.
    pub fn begin(&mut self, key: K) -> Ticket<K> {
        self.next_generation += 1;
        let slot = self.slots.entry(key.clone()).or_insert(Slot {
            latest: 0,
            value: None,
        });
        slot.latest = self.next_generation;
        Ticket {
            key,
            generation: self.next_generation,
        }
    }

    /// Store `value` if `ticket` is still the newest for its key.
    /// Returns false when the response was stale and dropped.
    pub fn complete(&mut self, ticket: &Ticket<K>, value: V) -> bool {
        match self.slots.get_mut(&ticket.key) {
            Some(slot) if slot.latest == ticket.generation => {
                slot.value = Some(value);
                true
            }
            _ => false,
        }
    }

    pub fn invalidate(&mut self, key: &K) {
        self.slots.remove(key);
    }

    pub fn len(&self) -> usize {
        self.slots.values().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
