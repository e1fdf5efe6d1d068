// Memo of previous move decisions keyed by board state
//
// Purely an optimization. The key is the canonical text form of the pig's
// cell plus the walls in row-major order, so two requests share an entry only
// when they describe the same board. A cache belongs to one selector; its
// settings are not part of the key.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cellset::ObstacleSet;
use crate::grid::HexGrid;
use crate::selector::MoveDecision;
use crate::types::Cell;

#[derive(Debug, Default)]
struct CacheEntries {
    map: HashMap<String, MoveDecision>,
    /// Insertion order for FIFO eviction
    order: VecDeque<String>,
}

/// Bounded, thread-safe decision cache
#[derive(Debug)]
pub struct MoveCache {
    entries: Mutex<CacheEntries>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MoveCache {
    pub fn new(capacity: usize) -> Self {
        MoveCache {
            entries: Mutex::new(CacheEntries::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Canonical key: `q,r|q,r;q,r;...` with walls sorted row-major
    pub fn key(grid: &HexGrid, evader: Cell, obstacles: ObstacleSet) -> String {
        let walls: Vec<String> = obstacles
            .cells(grid)
            .map(|cell| format!("{},{}", cell.q, cell.r))
            .collect();
        format!("{},{}|{}", evader.q, evader.r, walls.join(";"))
    }

    pub fn get(&self, key: &str) -> Option<MoveDecision> {
        let entries = self.entries.lock();
        match entries.map.get(key) {
            Some(decision) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(decision.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: String, decision: MoveDecision) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.lock();
        if entries.map.contains_key(&key) {
            entries.map.insert(key, decision);
            return;
        }

        while entries.map.len() >= self.capacity {
            match entries.order.pop_front() {
                Some(oldest) => {
                    entries.map.remove(&oldest);
                }
                None => break,
            }
        }

        entries.order.push_back(key.clone());
        entries.map.insert(key, decision);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.map.clear();
        entries.order.clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
