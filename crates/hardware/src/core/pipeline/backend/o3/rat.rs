//! Register Alias Table: speculative and committed map tables, and the
//! physical register free lists backing them.
//!
//! Two architectural register banks (integer, floating-point) are renamed
//! independently, each against its own physical register file sized by
//! `O3Config::num_int_phys_regs` / `num_fp_phys_regs`. Integer register x0
//! is never renamed: it always maps to physical register 0 and that mapping
//! is never placed on the free list.

use std::collections::VecDeque;

/// A snapshot of the speculative map + free list, taken when a branch is
/// dispatched so it can be restored verbatim on misprediction.
///
/// Mirrors the push/pop discipline of the branch predictor's return address
/// stack: one snapshot per in-flight branch, popped (discarded) on correct
/// resolution or restored on misprediction.
#[derive(Clone, Debug)]
pub struct RatSnapshot {
    int_map: [u32; 32],
    fp_map: [u32; 32],
    free_int: VecDeque<u32>,
    free_fp: VecDeque<u32>,
}

/// Register Alias Table for one hardware thread.
pub struct RegisterAliasTable {
    /// Speculative (in-flight) map: architectural reg -> physical reg.
    spec_int: [u32; 32],
    spec_fp: [u32; 32],
    /// Committed (architectural) map, updated only at commit.
    committed_int: [u32; 32],
    committed_fp: [u32; 32],
    free_int: VecDeque<u32>,
    free_fp: VecDeque<u32>,
    num_int: u32,
    num_fp: u32,
}

impl RegisterAliasTable {
    /// Creates a new RAT. Architectural registers 0..32 start mapped
    /// identity-wise to physical registers 0..32; the remainder of each
    /// physical file starts on the free list.
    pub fn new(num_int_phys_regs: usize, num_fp_phys_regs: usize) -> Self {
        let mut int_map = [0u32; 32];
        let mut fp_map = [0u32; 32];
        for i in 0..32 {
            int_map[i] = i as u32;
            fp_map[i] = i as u32;
        }

        let free_int = (32..num_int_phys_regs as u32).collect();
        let free_fp = (32..num_fp_phys_regs as u32).collect();

        Self {
            spec_int: int_map,
            spec_fp: fp_map,
            committed_int: int_map,
            committed_fp: fp_map,
            free_int,
            free_fp,
            num_int: num_int_phys_regs as u32,
            num_fp: num_fp_phys_regs as u32,
        }
    }

    /// True if the given bank has an unallocated physical register left.
    pub fn has_free(&self, is_fp: bool) -> bool {
        if is_fp {
            !self.free_fp.is_empty()
        } else {
            !self.free_int.is_empty()
        }
    }

    /// Looks up the current speculative physical register for a source.
    pub fn lookup(&self, areg: usize, is_fp: bool) -> u32 {
        if is_fp {
            self.spec_fp[areg]
        } else {
            self.spec_int[areg]
        }
    }

    /// Renames a destination register: allocates a fresh physical register,
    /// points the speculative map at it, and returns `(new_pdst, stale_pdst)`.
    /// Returns `None` if the free list for this bank is exhausted.
    ///
    /// x0 is never renamed — the caller should not invoke this for `areg == 0, !is_fp`.
    pub fn rename_dest(&mut self, areg: usize, is_fp: bool) -> Option<(u32, u32)> {
        let free_list = if is_fp {
            &mut self.free_fp
        } else {
            &mut self.free_int
        };
        let new_pdst = free_list.pop_front()?;

        let map = if is_fp {
            &mut self.spec_fp
        } else {
            &mut self.spec_int
        };
        let stale = map[areg];
        map[areg] = new_pdst;
        Some((new_pdst, stale))
    }

    /// Releases a physical register back to its bank's free list. Called
    /// when a `stale_pdst` is freed at commit, or when rolling back a
    /// speculative `pdst` that never got committed.
    pub fn free(&mut self, preg: u32, is_fp: bool) {
        if is_fp {
            self.free_fp.push_back(preg);
        } else if preg != 0 {
            self.free_int.push_back(preg);
        }
    }

    /// Updates the committed map once an instruction retires. The physical
    /// register it replaces should be freed by the caller via `free`.
    pub fn commit_rename(&mut self, areg: usize, pdst: u32, is_fp: bool) {
        if is_fp {
            self.committed_fp[areg] = pdst;
        } else if areg != 0 {
            self.committed_int[areg] = pdst;
        }
    }

    /// Reverts a single squashed instruction's rename: points `areg` back at
    /// the mapping it replaced and frees the physical register it had taken.
    /// Used to unwind redirects that have no branch checkpoint to restore
    /// from (CSR writes, MRET/SRET, FENCE.I) — callers walk squashed ROB
    /// entries from youngest to oldest so each undo sees the right prior map.
    pub fn undo_rename(&mut self, areg: usize, is_fp: bool, pdst: u32, stale_pdst: u32) {
        let map = if is_fp {
            &mut self.spec_fp
        } else {
            &mut self.spec_int
        };
        map[areg] = stale_pdst;
        self.free(pdst, is_fp);
    }

    /// Snapshots the speculative state for a newly dispatched branch.
    pub fn snapshot(&self) -> RatSnapshot {
        RatSnapshot {
            int_map: self.spec_int,
            fp_map: self.spec_fp,
            free_int: self.free_int.clone(),
            free_fp: self.free_fp.clone(),
        }
    }

    /// Restores the speculative state to a branch's snapshot, on misprediction.
    pub fn restore(&mut self, snap: &RatSnapshot) {
        self.spec_int = snap.int_map;
        self.spec_fp = snap.fp_map;
        self.free_int = snap.free_int.clone();
        self.free_fp = snap.free_fp.clone();
    }

    /// Rolls the speculative map back to the last committed state, e.g. on
    /// an architectural exception. Rebuilds the free lists from scratch
    /// rather than tracking every speculative allocation, since this path
    /// is only taken on the (rare) exception/flush-all case.
    pub fn rollback_to_committed(&mut self) {
        self.spec_int = self.committed_int;
        self.spec_fp = self.committed_fp;

        let mapped_int: std::collections::HashSet<u32> =
            self.committed_int.iter().copied().collect();
        self.free_int = (1..self.num_int).filter(|p| !mapped_int.contains(p)).collect();

        let mapped_fp: std::collections::HashSet<u32> =
            self.committed_fp.iter().copied().collect();
        self.free_fp = (0..self.num_fp).filter(|p| !mapped_fp.contains(p)).collect();
    }
}
