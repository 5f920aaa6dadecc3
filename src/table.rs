use std::collections::HashSet;

use log::debug;

use crate::node::Node;
use crate::utils::MyHash;

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    next: u32,
    occupied: bool,
}

/// Unique table: node storage plus hash-consing.
///
/// Entry `0` holds the terminal and never takes part in a hash chain, so `next == 0`
/// marks the end of a chain. Freed slots are recycled before the storage grows.
#[derive(Debug)]
pub struct Table {
    entries: Vec<Entry>,
    buckets: Vec<u32>,
    bitmask: u64,
    free: Vec<u32>,
    live: usize,
}

impl Table {
    /// Create a table with `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");
        let size = 1usize << bits;
        let mut entries = Vec::with_capacity(size);
        entries.push(Entry {
            node: Node::TERMINAL,
            next: 0,
            occupied: true,
        });
        Self {
            entries,
            buckets: vec![0; size],
            bitmask: (size - 1) as u64,
            free: Vec::new(),
            live: 1,
        }
    }

    pub fn node(&self, id: u32) -> &Node {
        &self.entries[id as usize].node
    }

    /// Number of occupied slots, terminal included.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_of(&self, node: &Node) -> usize {
        (node.hash() & self.bitmask) as usize
    }

    /// Return the id of `node`, adding it if it is not in the table yet.
    pub fn put(&mut self, node: Node) -> u32 {
        let b = self.bucket_of(&node);
        let mut index = self.buckets[b];
        while index != 0 {
            let entry = &self.entries[index as usize];
            if entry.node == node {
                return index;
            }
            index = entry.next;
        }

        let entry = Entry {
            node,
            next: self.buckets[b],
            occupied: true,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.entries[id as usize] = entry;
                id
            }
            None => {
                self.entries.push(entry);
                (self.entries.len() - 1) as u32
            }
        };
        self.buckets[b] = id;
        self.live += 1;

        if self.live > 2 * self.buckets.len() {
            self.grow();
        }
        id
    }

    fn grow(&mut self) {
        let size = self.buckets.len() * 2;
        debug!("Growing unique table to {} buckets", size);
        self.buckets = vec![0; size];
        self.bitmask = (size - 1) as u64;
        self.relink();
    }

    fn relink(&mut self) {
        self.buckets.fill(0);
        for id in 1..self.entries.len() {
            if !self.entries[id].occupied {
                continue;
            }
            let b = self.bucket_of(&self.entries[id].node);
            self.entries[id].next = self.buckets[b];
            self.buckets[b] = id as u32;
        }
    }

    /// Free every slot whose id is not in `alive`. Returns the number of freed slots.
    pub fn sweep(&mut self, alive: &HashSet<u32>) -> usize {
        let mut freed = 0;
        for id in 1..self.entries.len() {
            let entry = &mut self.entries[id];
            if entry.occupied && !alive.contains(&(id as u32)) {
                entry.occupied = false;
                entry.next = 0;
                self.free.push(id as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        self.relink();
        freed
    }
}
