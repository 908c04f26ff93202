//! Out-of-order issue + execute.
//!
//! Each issue queue independently selects its ready, oldest micro-ops. Their
//! physical source registers are read out of the PRF and substituted into a
//! `RenameIssueEntry`, reusing exactly the entry type the in-order backend's
//! execute stage already consumes. The combined, age-sorted batch is handed
//! to `execute_inorder` in a single call: that function's existing
//! trap/mispredict short-circuit (it stops processing the rest of its input
//! Vec once one entry triggers a flush) gives "only the oldest redirecting
//! instruction in the cycle wins" for free, since ROB tags are allocated in
//! program order and the batch is sorted by tag before the call.

use super::O3Engine;
use crate::core::Cpu;
use crate::core::pipeline::backend::inorder::execute::execute_inorder;
use crate::core::pipeline::latches::{ExMem1Entry, RenameIssueEntry};

/// Collects this cycle's selections from all three issue queues, executes
/// them as one program-ordered batch, and returns the in-order execute
/// stage's usual `(results, needs_flush)` pair.
pub fn issue_and_execute(cpu: &mut Cpu, engine: &mut O3Engine) -> (Vec<ExMem1Entry>, bool) {
    let mut selected = Vec::new();
    selected.extend(engine.iq_int.select(engine.issue_width_int));
    selected.extend(engine.iq_mem.select(engine.issue_width_mem));
    selected.extend(engine.iq_fp.select(engine.issue_width_fp));

    selected.sort_by_key(|uop| uop.rob_tag.0);

    let entries: Vec<RenameIssueEntry> = selected
        .into_iter()
        .map(|uop| {
            let rv1 = uop
                .prs1
                .map(|p| engine.prf.read(p, uop.ctrl.rs1_fp))
                .unwrap_or(0);
            let rv2 = uop
                .prs2
                .map(|p| engine.prf.read(p, uop.ctrl.rs2_fp))
                .unwrap_or(0);
            let rv3 = uop.prs3.map(|p| engine.prf.read(p, true)).unwrap_or(0);

            RenameIssueEntry {
                rob_tag: uop.rob_tag,
                pc: uop.pc,
                inst: uop.inst,
                inst_size: uop.inst_size,
                rs1: uop.rs1,
                rs2: uop.rs2,
                rs3: uop.rs3,
                rd: uop.rd,
                imm: uop.imm,
                rv1,
                rv2,
                rv3,
                rs1_tag: None,
                rs2_tag: None,
                rs3_tag: None,
                ctrl: uop.ctrl,
                trap: uop.trap,
                exception_stage: uop.exception_stage,
                pred_taken: uop.pred_taken,
                pred_target: uop.pred_target,
                ghr_snapshot: uop.ghr_snapshot,
            }
        })
        .collect();

    execute_inorder(cpu, entries, &mut engine.rob)
}
