//! Load queue: tracks in-flight loads for store-forwarding and
//! memory-ordering-violation detection.
//!
//! Each load snapshots, at dispatch, which stores (by ROB tag) are older
//! than it and still in flight in the store buffer. This mirrors the
//! spec's "bitmap over in-flight stores" description with the store
//! buffer's actual addressing scheme: `StoreBuffer` is a ROB-tag-keyed
//! circular buffer with no stable external slot index, so `st_dep` is a
//! tag list rather than a bitmask over slot positions. A store resolving
//! its address later rescans every LDQ entry whose `st_dep` contains it.

use crate::core::pipeline::rob::RobTag;
use crate::core::pipeline::signals::MemWidth;

/// One in-flight load.
#[derive(Clone, Debug, Default)]
pub struct LdqEntry {
    pub rob_tag: RobTag,
    pub pc: u64,
    pub vaddr: u64,
    pub width: MemWidth,
    pub signed: bool,
    /// True once the load has gone through memory1/memory2 and has a result.
    pub executed: bool,
    /// Stores, oldest-to-youngest, that this load was speculatively younger
    /// than at dispatch time.
    pub st_dep: Vec<RobTag>,
    valid: bool,
}

/// Circular buffer of in-flight loads, ordered oldest-to-youngest like the
/// ROB and store buffer.
pub struct LoadQueue {
    entries: Vec<LdqEntry>,
    head: usize,
    tail: usize,
    count: usize,
}

impl LoadQueue {
    pub fn new(capacity: usize) -> Self {
        let placeholder = LdqEntry {
            rob_tag: RobTag(0),
            pc: 0,
            vaddr: 0,
            width: MemWidth::Byte,
            signed: false,
            executed: false,
            st_dep: Vec::new(),
            valid: false,
        };
        Self {
            entries: vec![placeholder; capacity],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    pub fn free_slots(&self) -> usize {
        self.entries.len() - self.count
    }

    /// Allocates a new entry for a dispatched load.
    pub fn allocate(
        &mut self,
        rob_tag: RobTag,
        pc: u64,
        vaddr: u64,
        width: MemWidth,
        signed: bool,
        st_dep: Vec<RobTag>,
    ) -> bool {
        if self.is_full() {
            return false;
        }
        let cap = self.entries.len();
        self.entries[self.tail] = LdqEntry {
            rob_tag,
            pc,
            vaddr,
            width,
            signed,
            executed: false,
            st_dep,
            valid: true,
        };
        self.tail = (self.tail + 1) % cap;
        self.count += 1;
        true
    }

    /// Marks a load as executed, updating its resolved address.
    pub fn mark_executed(&mut self, rob_tag: RobTag, vaddr: u64) {
        if let Some(e) = self.find_entry_mut(rob_tag) {
            e.executed = true;
            e.vaddr = vaddr;
        }
    }

    fn find_entry_mut(&mut self, rob_tag: RobTag) -> Option<&mut LdqEntry> {
        let cap = self.entries.len();
        let mut idx = self.head;
        for _ in 0..self.count {
            if self.entries[idx].valid && self.entries[idx].rob_tag == rob_tag {
                return Some(&mut self.entries[idx]);
            }
            idx = (idx + 1) % cap;
        }
        None
    }

    /// Scans every executed load depending on `store_rob_tag` for an
    /// address overlap with `[store_vaddr, store_vaddr + store_len)`.
    /// Returns the oldest (lowest ROB tag) overlapping load, if any — that
    /// load observed stale data and must restart.
    pub fn find_ordering_violation(
        &self,
        store_rob_tag: RobTag,
        store_vaddr: u64,
        store_len: u64,
    ) -> Option<RobTag> {
        let cap = self.entries.len();
        let mut idx = self.head;
        let mut violator: Option<RobTag> = None;
        for _ in 0..self.count {
            let e = &self.entries[idx];
            if e.valid && e.executed && e.st_dep.contains(&store_rob_tag) {
                let load_len = width_bytes(e.width);
                let overlaps = e.vaddr < store_vaddr + store_len && store_vaddr < e.vaddr + load_len;
                if overlaps {
                    violator = Some(match violator {
                        Some(v) if v.0 <= e.rob_tag.0 => v,
                        _ => e.rob_tag,
                    });
                }
            }
            idx = (idx + 1) % cap;
        }
        violator
    }

    /// Retires the oldest load (called when its owning ROB entry commits).
    pub fn commit_head(&mut self) {
        if self.count == 0 {
            return;
        }
        self.entries[self.head].valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;
    }

    /// Drops every load younger than (and including, if `inclusive`) the
    /// given tag, on a branch squash or exception flush.
    pub fn flush_after(&mut self, keep_tag: Option<RobTag>) {
        match keep_tag {
            None => {
                for e in self.entries.iter_mut() {
                    e.valid = false;
                }
                self.head = 0;
                self.tail = 0;
                self.count = 0;
            }
            Some(keep) => {
                let cap = self.entries.len();
                let mut idx = self.head;
                let mut new_count = 0;
                for _ in 0..self.count {
                    if self.entries[idx].valid && self.entries[idx].rob_tag.0 <= keep.0 {
                        new_count += 1;
                    } else {
                        self.entries[idx].valid = false;
                    }
                    idx = (idx + 1) % cap;
                }
                self.tail = (self.head + new_count) % cap;
                self.count = new_count;
            }
        }
    }
}

fn width_bytes(width: MemWidth) -> u64 {
    match width {
        MemWidth::Nop => 0,
        MemWidth::Byte => 1,
        MemWidth::Half => 2,
        MemWidth::Word => 4,
        MemWidth::Double => 8,
    }
}
