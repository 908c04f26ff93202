//! Out-of-order backend: register renaming, age-ordered issue queues, and a
//! load queue with memory-ordering-violation detection.
//!
//! Structurally this mirrors `backend::inorder`: the same reverse-pipeline-
//! order `tick()`, the same `ExMem1Entry`/`Mem1Mem2Entry`/`Mem2WbEntry`
//! latches, and the same shared memory1/memory2/writeback/commit stages.
//! What differs is everything upstream of execute: `rename` performs real
//! register renaming instead of scoreboard tagging, three `IssueQueue`s
//! replace the FIFO `InOrderIssueUnit`, and a `LoadQueue` tracks ordering
//! dependences the in-order backend doesn't need (it never reorders loads
//! past stores in the first place).

pub mod branch_mask;
pub mod commit;
pub mod execute;
pub mod iq;
pub mod ldq;
pub mod lsu;
pub mod microop;
pub mod prf;
pub mod rat;
pub mod rename;
pub mod writeback;

use crate::config::Config;
use crate::core::Cpu;
use crate::core::pipeline::engine::ExecutionEngine;
use crate::core::pipeline::latches::{ExMem1Entry, Mem1Mem2Entry, Mem2WbEntry, RenameIssueEntry};
use crate::core::pipeline::rob::{Rob, RobTag};
use crate::core::pipeline::scoreboard::Scoreboard;
use crate::core::pipeline::store_buffer::StoreBuffer;
use std::collections::HashMap;

use self::branch_mask::BranchMaskAllocator;
use self::iq::IssueQueue;
use self::ldq::LoadQueue;
use self::prf::PhysRegFile;
use self::rat::{RatSnapshot, RegisterAliasTable};

/// Out-of-order execution engine.
pub struct O3Engine {
    pub rob: Rob,
    pub store_buffer: StoreBuffer,
    /// Unused for dependency tracking (the RAT/PRF take that role) — kept
    /// only because `commit_stage` is shared with the in-order backend and
    /// expects one to clear stale producer tags against.
    pub scoreboard: Scoreboard,

    pub rat: RegisterAliasTable,
    pub prf: PhysRegFile,
    num_int_phys_regs: usize,
    num_fp_phys_regs: usize,

    pub branch_mask: BranchMaskAllocator,
    /// Per-bit RAT snapshot, taken when that bit's branch is dispatched.
    pub branch_checkpoints: Vec<Option<RatSnapshot>>,
    /// Maps an in-flight branch's ROB tag to the mask bit it was given,
    /// so commit can free the bit once the branch retires.
    pub branch_tag_to_bit: HashMap<RobTag, u32>,

    pub iq_int: IssueQueue,
    pub iq_mem: IssueQueue,
    pub iq_fp: IssueQueue,
    pub ldq: LoadQueue,

    pub issue_width_int: usize,
    pub issue_width_mem: usize,
    pub issue_width_fp: usize,
    pub width: usize,

    pub execute_mem1: Vec<ExMem1Entry>,
    pub mem1_mem2: Vec<Mem1Mem2Entry>,
    pub mem2_wb: Vec<Mem2WbEntry>,
    pub mem1_stall: u64,
}

impl O3Engine {
    pub fn new(config: &Config) -> Self {
        let o3 = &config.pipeline.o3;
        Self {
            rob: Rob::new(o3.num_rob_entries),
            store_buffer: StoreBuffer::new(o3.num_stq_entries),
            scoreboard: Scoreboard::new(),

            rat: RegisterAliasTable::new(o3.num_int_phys_regs, o3.num_fp_phys_regs),
            prf: PhysRegFile::new(o3.num_int_phys_regs, o3.num_fp_phys_regs),
            num_int_phys_regs: o3.num_int_phys_regs,
            num_fp_phys_regs: o3.num_fp_phys_regs,

            branch_mask: BranchMaskAllocator::new(o3.max_br_count),
            branch_checkpoints: (0..o3.max_br_count.min(32)).map(|_| None).collect(),
            branch_tag_to_bit: HashMap::new(),

            iq_int: IssueQueue::new(o3.num_rob_entries),
            iq_mem: IssueQueue::new(o3.num_rob_entries),
            iq_fp: IssueQueue::new(o3.num_rob_entries),
            ldq: LoadQueue::new(o3.num_ldq_entries),

            issue_width_int: o3.issue_width_int,
            issue_width_mem: o3.issue_width_mem,
            issue_width_fp: o3.issue_width_fp,
            width: config.pipeline.width,

            execute_mem1: Vec::with_capacity(config.pipeline.width),
            mem1_mem2: Vec::with_capacity(config.pipeline.width),
            mem2_wb: Vec::with_capacity(config.pipeline.width),
            mem1_stall: 0,
        }
    }

    /// Unwinds every speculative rename made by ROB entries younger than
    /// `keep_tag`, for redirects with no branch checkpoint to restore from
    /// (CSR writes, MRET/SRET, FENCE.I). Walked youngest-to-oldest so each
    /// undo sees the map exactly as it was just before that rename.
    fn unwind_renames_after(&mut self, keep_tag: RobTag) {
        let mut undone = Vec::new();
        self.rob.for_each_valid(|e| {
            if e.tag.0 > keep_tag.0 {
                if let Some(pdst) = e.pdst {
                    undone.push((e.rd, e.rd_fp, pdst, e.stale_pdst.unwrap_or(0)));
                }
            }
        });
        for (rd, is_fp, pdst, stale) in undone.into_iter().rev() {
            self.rat.undo_rename(rd, is_fp, pdst, stale);
        }
    }

    /// Handles a redirect detected during this cycle's execute: squashes
    /// everything younger than the redirecting instruction across every
    /// structure that can hold speculative state.
    fn handle_redirect(&mut self) {
        let Some(keep_tag) = self.execute_mem1.last().map(|e| e.rob_tag) else {
            return;
        };

        if let Some(&bit) = self.branch_tag_to_bit.get(&keep_tag) {
            if let Some(snapshot) = self.branch_checkpoints[bit as usize].clone() {
                self.rat.restore(&snapshot);
            }
            self.iq_int.squash_by_mask(bit);
            self.iq_mem.squash_by_mask(bit);
            self.iq_fp.squash_by_mask(bit);
        } else {
            self.unwind_renames_after(keep_tag);
            self.iq_int.squash_after(keep_tag);
            self.iq_mem.squash_after(keep_tag);
            self.iq_fp.squash_after(keep_tag);
        }

        self.rob.flush_after(keep_tag);
        self.store_buffer.flush_after(keep_tag);
        self.ldq.flush_after(Some(keep_tag));

        // Every branch younger than keep_tag was just squashed above and
        // will never reach commit, so commit's usual bit-reclaim
        // (commit.rs) never runs for it. Reclaim its mask bit here too, or
        // the bit leaks forever and, once every bit has leaked this way,
        // `BranchMaskAllocator::is_full()` never clears and dispatch stalls
        // on the next branch permanently.
        let squashed_tags: Vec<RobTag> = self
            .branch_tag_to_bit
            .keys()
            .filter(|tag| tag.0 > keep_tag.0)
            .copied()
            .collect();
        for tag in squashed_tags {
            if let Some(bit) = self.branch_tag_to_bit.remove(&tag) {
                self.branch_mask.free(bit);
                self.branch_checkpoints[bit as usize] = None;
            }
        }
    }

    /// Spec §4.3 step 5: on a branch resolution, clear its bit from every
    /// younger in-flight slot's `br_mask` rather than leaving it live until
    /// that branch commits. Without this, the bit stays set in every slot
    /// dispatched under it, `commit.rs` only frees it once the branch
    /// retires, and `BranchMaskAllocator` may hand that same bit to a later
    /// branch before the first one's stale copies are gone — a subsequent
    /// misprediction of the *new* branch then calls `squash_by_mask` on a
    /// bit that also still marks old, unrelated, already-resolved uops,
    /// wrongly squashing them.
    ///
    /// Must only be called for a branch that resolved correctly; the one
    /// that mispredicted (if any) keeps its bit until it commits, same as
    /// every other redirect source, handled separately by `handle_redirect`.
    fn resolve_branch(&mut self, tag: RobTag) {
        if let Some(bit) = self.branch_tag_to_bit.remove(&tag) {
            self.iq_int.clear_br_mask_bit(bit);
            self.iq_mem.clear_br_mask_bit(bit);
            self.iq_fp.clear_br_mask_bit(bit);
            self.branch_mask.free(bit);
            self.branch_checkpoints[bit as usize] = None;
        }
    }
}

impl ExecutionEngine for O3Engine {
    fn tick(&mut self, cpu: &mut Cpu, rename_output: &mut Vec<RenameIssueEntry>) {
        let trap_event = self::commit::commit(cpu, self);
        if let Some((trap, pc)) = trap_event {
            if cpu.trace {
                eprintln!("BE  * HANDLING TRAP: {:?} at PC {:#x}", trap, pc);
            }
            self.flush(cpu);
            cpu.trap(trap, pc);
            return;
        }

        self::writeback::writeback(cpu, self);

        // A load that observed stale data gets marked Faulted in the ROB by
        // memory_stage; commit takes the trap once it reaches the head, same
        // as any other execute-detected fault. Nothing needs squashing here.
        let _ = self::lsu::memory_stage(cpu, self);

        let backpressured = !self.execute_mem1.is_empty();

        let (results, needs_flush) = if backpressured {
            (Vec::new(), false)
        } else {
            self::execute::issue_and_execute(cpu, self)
        };

        // `execute_inorder` stops issuing as soon as one entry triggers a
        // flush, so that entry (if any) is always the last one in `results`.
        // Every other branch/jump in this batch resolved without
        // mispredicting and should release its bit now.
        let mispredict_tag = if needs_flush { results.last().map(|e| e.rob_tag) } else { None };
        for entry in &results {
            if (entry.ctrl.branch || entry.ctrl.jump) && Some(entry.rob_tag) != mispredict_tag {
                self.resolve_branch(entry.rob_tag);
            }
        }

        self.execute_mem1.extend(results);

        if needs_flush {
            self.handle_redirect();
            rename_output.clear();
            self.mem1_stall = 0;
        }
    }

    fn can_accept(&self) -> usize {
        let rob_free = self.rob.free_slots();
        let iq_free = self
            .iq_int
            .free_slots()
            .min(self.iq_mem.free_slots())
            .min(self.iq_fp.free_slots());
        let ldq_free = self.ldq.free_slots();
        let stq_free = self.store_buffer.free_slots();
        rob_free.min(iq_free).min(ldq_free).min(stq_free).min(self.width)
    }

    fn flush(&mut self, _cpu: &mut Cpu) {
        self.rob.flush_all();
        self.store_buffer.flush_speculative();
        self.iq_int.flush_all();
        self.iq_mem.flush_all();
        self.iq_fp.flush_all();
        self.ldq.flush_after(None);
        self.execute_mem1.clear();
        self.mem1_mem2.clear();
        self.mem2_wb.clear();
        self.mem1_stall = 0;

        self.rat.rollback_to_committed();
        // A full flush discards every in-flight producer, so every busy bit
        // must be cleared — otherwise a register handed back out by
        // `rollback_to_committed` would appear permanently unready.
        for preg in 0..self.num_int_phys_regs as u32 {
            self.prf.clear_busy(preg, false);
        }
        for preg in 0..self.num_fp_phys_regs as u32 {
            self.prf.clear_busy(preg, true);
        }

        self.branch_mask.free_all(self.branch_checkpoints.len());
        self.branch_checkpoints.iter_mut().for_each(|c| *c = None);
        self.branch_tag_to_bit.clear();
    }

    fn read_csr_speculative(&self, cpu: &Cpu, addr: u32) -> u64 {
        cpu.csr_read(addr)
    }

    fn rob(&self) -> &Rob {
        &self.rob
    }

    fn rob_mut(&mut self) -> &mut Rob {
        &mut self.rob
    }

    fn store_buffer(&self) -> &StoreBuffer {
        &self.store_buffer
    }

    fn store_buffer_mut(&mut self) -> &mut StoreBuffer {
        &mut self.store_buffer
    }

    fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    fn scoreboard_mut(&mut self) -> &mut Scoreboard {
        &mut self.scoreboard
    }

    fn rename_dispatch(
        &mut self,
        cpu: &mut Cpu,
        input: &mut Vec<crate::core::pipeline::latches::IdExEntry>,
        rename_output: &mut Vec<RenameIssueEntry>,
    ) {
        self::rename::rename_dispatch(cpu, input, self, rename_output);
    }
}
