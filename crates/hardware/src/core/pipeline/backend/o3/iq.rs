//! Age-ordered issue queue with broadcast wakeup.
//!
//! Each queue holds micro-ops routed to it by `MicroOp::classify` (integer,
//! memory, or floating-point). A slot becomes selectable once every source
//! it needs a physical register for has had its wakeup broadcast seen.
//! There is no separate address/data-ready split for stores: `execute_inorder`
//! needs a store's address operand and its data operand in the same call, so
//! a store only issues once both are ready, same as any other instruction.

use super::microop::MicroOp;

struct IssueSlot {
    uop: MicroOp,
    src1_ready: bool,
    src2_ready: bool,
    src3_ready: bool,
}

impl IssueSlot {
    fn ready(&self) -> bool {
        self.src1_ready && self.src2_ready && self.src3_ready
    }
}

/// A single issue queue (one per functional-unit class).
pub struct IssueQueue {
    slots: Vec<Option<IssueSlot>>,
    capacity: usize,
}

impl IssueQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn free_slots(&self) -> usize {
        self.capacity - self.len()
    }

    pub fn is_full(&self) -> bool {
        self.free_slots() == 0
    }

    /// Inserts a micro-op, given whether each physical source is already
    /// non-busy in the PRF at dispatch time (so single-cycle-ready ops don't
    /// need to wait for a wakeup that will never come).
    pub fn enqueue(&mut self, uop: MicroOp, src1_ready: bool, src2_ready: bool, src3_ready: bool) -> bool {
        for slot in self.slots.iter_mut() {
            if slot.is_none() {
                *slot = Some(IssueSlot {
                    uop,
                    src1_ready,
                    src2_ready,
                    src3_ready,
                });
                return true;
            }
        }
        false
    }

    /// Broadcasts that a physical register has produced its result. Any
    /// waiting slot with a matching source tag is marked ready.
    pub fn wakeup(&mut self, preg: u32, is_fp: bool) {
        for slot in self.slots.iter_mut().flatten() {
            let bank_matches = |p: Option<u32>| p.map(|p| p == preg).unwrap_or(false);
            let fp_matches_rs1 = slot.uop.ctrl.rs1_fp == is_fp;
            let fp_matches_rs2 = slot.uop.ctrl.rs2_fp == is_fp;
            let fp_matches_rs3 = slot.uop.ctrl.rs3_fp == is_fp;
            if fp_matches_rs1 && bank_matches(slot.uop.prs1) {
                slot.src1_ready = true;
            }
            if fp_matches_rs2 && bank_matches(slot.uop.prs2) {
                slot.src2_ready = true;
            }
            if fp_matches_rs3 && bank_matches(slot.uop.prs3) {
                slot.src3_ready = true;
            }
        }
    }

    /// Selects up to `width` ready micro-ops, oldest (lowest ROB tag) first,
    /// removing them from the queue.
    pub fn select(&mut self, width: usize) -> Vec<MicroOp> {
        let mut ready_idx: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().filter(|s| s.ready()).map(|_| i))
            .collect();
        ready_idx.sort_by_key(|&i| self.slots[i].as_ref().unwrap().uop.rob_tag.0);
        ready_idx.truncate(width);

        ready_idx
            .into_iter()
            .map(|i| self.slots[i].take().unwrap().uop)
            .collect()
    }

    /// Drops every micro-op speculatively younger than a mispredicted branch.
    pub fn squash_by_mask(&mut self, bit: u32) {
        for slot in self.slots.iter_mut() {
            if let Some(s) = slot {
                if s.uop.br_mask & (1 << bit) != 0 {
                    *slot = None;
                }
            }
        }
    }

    /// Clears a resolved branch's bit from every slot's `br_mask` without
    /// touching the slots themselves. Called when a branch resolves without
    /// mispredicting, so its bit can be freed immediately instead of
    /// lingering (and potentially being reused and misread as live
    /// speculation by a younger, unrelated slot) until that branch commits.
    pub fn clear_br_mask_bit(&mut self, bit: u32) {
        for slot in self.slots.iter_mut() {
            if let Some(s) = slot {
                s.uop.br_mask &= !(1 << bit);
            }
        }
    }

    /// Drops every micro-op younger than `keep_tag`. Used for redirects that
    /// aren't a branch misprediction (CSR, MRET/SRET, FENCE.I), which have
    /// no branch-mask bit of their own to squash by.
    pub fn squash_after(&mut self, keep_tag: crate::core::pipeline::rob::RobTag) {
        for slot in self.slots.iter_mut() {
            if let Some(s) = slot {
                if s.uop.rob_tag.0 > keep_tag.0 {
                    *slot = None;
                }
            }
        }
    }

    /// Drops every micro-op in the queue, e.g. on an exception flush.
    pub fn flush_all(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }
}
