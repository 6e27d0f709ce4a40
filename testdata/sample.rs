//! Fixture: a small key-value cache.

use std::collections::HashMap;

pub const DEFAULT_CAPACITY: usize = 64;

pub type Key = String;

pub struct Cache {
    entries: HashMap<Key, Vec<u8>>,
    pub capacity: usize,
}

impl Cache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    fn evict(&mut self) {
        if let Some(key) = self.entries.keys().next().cloned() {
            self.entries.remove(&key);
        }
    }
}

pub trait Store {
    fn put(&mut self, key: Key, value: Vec<u8>);
}

impl Store for Cache {
    fn put(&mut self, key: Key, value: Vec<u8>) {
        if self.entries.len() >= self.capacity {
            self.evict();
        }
        self.entries.insert(key, value);
    }
}

pub enum Policy {
    Lru,
    Fifo,
}
