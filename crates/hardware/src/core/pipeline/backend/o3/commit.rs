//! Out-of-order commit: wraps the shared `commit_stage` (reused verbatim —
//! it only ever touches `cpu.regs`/`cpu.csrs` via the architectural `rd`,
//! never a physical register) with register-rename retirement.
//!
//! `commit_stage` doesn't report which ROB entries it actually retired, so
//! this wrapper snapshots the head of the ROB before the call and diffs
//! against what's left afterward — committed entries are exactly the
//! snapshotted ones that disappeared, in head-to-tail order, stopping at
//! the first that's still present (commit only ever retires a FIFO prefix).
//! A synchronous fault also removes its ROB entry but never executes
//! architecturally, so the last disappearance is excluded from rename
//! retirement when a trap was taken.

use super::O3Engine;
use crate::common::Trap;
use crate::core::Cpu;
use crate::core::pipeline::backend::shared::commit::commit_stage;
use crate::core::pipeline::rob::RobTag;

struct RetiringEntry {
    tag: RobTag,
    pc: u64,
    inst: u32,
    rd: usize,
    rd_fp: bool,
    result: u64,
    pdst: Option<u32>,
    stale_pdst: Option<u32>,
    is_branch: bool,
    is_load: bool,
}

pub fn commit(cpu: &mut Cpu, engine: &mut O3Engine) -> Option<(Trap, u64)> {
    let width = engine.width;
    let mut snapshot = Vec::with_capacity(width);
    engine.rob.for_each_valid(|e| {
        if snapshot.len() < width {
            snapshot.push(RetiringEntry {
                tag: e.tag,
                pc: e.pc,
                inst: e.inst,
                rd: e.rd,
                rd_fp: e.rd_fp,
                result: e.result,
                pdst: e.pdst,
                stale_pdst: e.stale_pdst,
                is_branch: e.ctrl.branch || e.ctrl.jump,
                is_load: e.ctrl.mem_read,
            });
        }
    });

    let priv_mode = cpu.privilege;

    let trap_event = commit_stage(
        cpu,
        &mut engine.rob,
        &mut engine.store_buffer,
        &mut engine.scoreboard,
        width,
    );

    let mut removed: Vec<&RetiringEntry> = snapshot
        .iter()
        .take_while(|e| engine.rob.find_entry(e.tag).is_none())
        .collect();

    // The final disappearance on a synchronous fault is the faulting
    // instruction itself — it never retired architecturally.
    let faulted = if trap_event.is_some() { removed.pop() } else { None };

    for entry in &removed {
        if let Some(pdst) = entry.pdst {
            engine.rat.commit_rename(entry.rd, pdst, entry.rd_fp);
            if let Some(stale) = entry.stale_pdst {
                engine.rat.free(stale, entry.rd_fp);
            }
        }
        if entry.is_branch {
            if let Some(bit) = engine.branch_tag_to_bit.remove(&entry.tag) {
                engine.branch_mask.free(bit);
                engine.branch_checkpoints[bit as usize] = None;
            }
        }
        if entry.is_load {
            engine.ldq.commit_head();
        }
    }

    #[cfg(feature = "commit-log")]
    {
        for entry in &removed {
            log_retirement(priv_mode, entry, None);
        }
        if let Some(entry) = faulted {
            log_retirement(priv_mode, entry, trap_event.as_ref().map(|(t, _)| t));
        }
    }
    #[cfg(not(feature = "commit-log"))]
    {
        let _ = (priv_mode, faulted);
    }

    trap_event
}

/// One record per retired micro-op, per spec.md §6's trace-output contract:
/// `{ valid, iaddr, insn, priv, exception?, cause, wdata }`.
#[cfg(feature = "commit-log")]
fn log_retirement(
    priv_mode: crate::core::arch::mode::PrivilegeMode,
    entry: &RetiringEntry,
    cause: Option<&Trap>,
) {
    match cause {
        Some(trap) => println!(
            "C0: {:08x} (0x{:08x}) priv={:?} exception=1 cause={}",
            entry.pc, entry.inst, priv_mode, trap
        ),
        None => println!(
            "C0: {:08x} (0x{:08x}) priv={:?} x{:<2} 0x{:016x}",
            entry.pc, entry.inst, priv_mode, entry.rd, entry.result
        ),
    }
}
