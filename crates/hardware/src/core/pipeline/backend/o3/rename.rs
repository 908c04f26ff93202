//! Out-of-order rename/dispatch: register renaming, branch checkpointing,
//! and issue-queue insertion.
//!
//! Unlike the in-order `rename_stage` (which only allocates a ROB tag and
//! marks a scoreboard), this stage performs real register renaming against
//! a map table and physical register file, and routes each micro-op into
//! one of three issue queues. All resources an instruction needs (a ROB
//! slot, a free physical register, a store/load-queue slot, a branch tag,
//! an issue-queue slot) are checked before any of them are committed, so a
//! resource stall never leaves a half-dispatched instruction behind.

use super::microop::{FuClass, MicroOp};
use super::O3Engine;
use crate::core::Cpu;
use crate::core::pipeline::latches::{IdExEntry, RenameIssueEntry};
use crate::core::pipeline::signals::AtomicOp;

pub fn rename_dispatch(
    cpu: &mut Cpu,
    input: &mut Vec<IdExEntry>,
    engine: &mut O3Engine,
    rename_output: &mut Vec<RenameIssueEntry>,
) {
    let _ = rename_output; // O3 enqueues directly into persistent structures below.
    let entries = std::mem::take(input);
    let mut iter = entries.into_iter();

    while let Some(id) = iter.next() {
        if engine.can_accept() == 0 {
            input.push(id);
            continue;
        }

        let is_branch = id.ctrl.branch || id.ctrl.jump;
        let writes_reg = id.ctrl.reg_write || id.ctrl.fp_reg_write;
        let needs_rat_slot = writes_reg && !(id.rd == 0 && !id.ctrl.fp_reg_write);
        let is_store = id.ctrl.mem_write && id.ctrl.atomic_op == AtomicOp::None;
        let is_load = id.ctrl.mem_read;
        let fu_class = MicroOp::classify(&id.ctrl);

        let rat_ok = !needs_rat_slot || engine.rat.has_free(id.ctrl.fp_reg_write);
        let branch_ok = !is_branch || !engine.branch_mask.is_full();
        let rob_ok = !engine.rob.is_full();
        let stq_ok = !is_store || !engine.store_buffer.is_full();
        let ldq_ok = !is_load || !engine.ldq.is_full();
        let iq_ok = match fu_class {
            FuClass::Int => !engine.iq_int.is_full(),
            FuClass::Mem => !engine.iq_mem.is_full(),
            FuClass::Fp => !engine.iq_fp.is_full(),
        };

        if !(rat_ok && branch_ok && rob_ok && stq_ok && ldq_ok && iq_ok) {
            // `iter` still holds every younger instruction in this dispatch
            // group that we haven't looked at yet; they must go back to
            // `input` too; otherwise they're decoded but never dispatched
            // and the architectural state silently loses instructions.
            input.push(id);
            input.extend(iter);
            break;
        }

        let rob_tag = engine
            .rob
            .allocate(id.pc, id.inst, id.inst_size, id.rd, id.ctrl.fp_reg_write, id.ctrl)
            .expect("availability checked above");

        // Snapshot the speculation mask before this instruction allocates its
        // own branch tag, so it is never considered younger than itself.
        let br_mask = engine.branch_mask.active_mask();

        let prs1 = engine.rat.lookup(id.rs1, id.ctrl.rs1_fp);
        let prs2 = engine.rat.lookup(id.rs2, id.ctrl.rs2_fp);
        let prs3 = engine.rat.lookup(id.rs3, id.ctrl.rs3_fp);

        let src1_ready = !engine.prf.is_busy(prs1, id.ctrl.rs1_fp);
        let src2_ready = !engine.prf.is_busy(prs2, id.ctrl.rs2_fp);
        let src3_ready = !id.ctrl.rs3_fp || !engine.prf.is_busy(prs3, true);

        let pdst = if needs_rat_slot {
            let (new_pdst, stale_pdst) = engine
                .rat
                .rename_dest(id.rd, id.ctrl.fp_reg_write)
                .expect("availability checked above");
            engine.prf.set_busy(new_pdst, id.ctrl.fp_reg_write);
            engine.rob.set_pdst(rob_tag, new_pdst, Some(stale_pdst));
            Some(new_pdst)
        } else {
            None
        };

        if is_store {
            let allocated = engine.store_buffer.allocate(rob_tag, id.ctrl.width);
            debug_assert!(allocated, "availability checked above");
        }

        if is_load {
            let st_dep = engine.store_buffer.in_flight_rob_tags();
            engine
                .ldq
                .allocate(rob_tag, id.pc, 0, id.ctrl.width, id.ctrl.signed_load, st_dep);
        }

        if is_branch {
            let bit = engine.branch_mask.alloc().expect("availability checked above");
            let snapshot = engine.rat.snapshot();
            engine.branch_checkpoints[bit as usize] = Some(snapshot);
            let _ = engine.branch_tag_to_bit.insert(rob_tag, bit);
        }

        let uop = MicroOp {
            rob_tag,
            pc: id.pc,
            inst: id.inst,
            inst_size: id.inst_size,
            fu_class,
            rs1: id.rs1,
            rs2: id.rs2,
            rs3: id.rs3,
            rd: id.rd,
            imm: id.imm,
            prs1: Some(prs1),
            prs2: Some(prs2),
            prs3: Some(prs3),
            pdst,
            ctrl: id.ctrl,
            br_mask,
            trap: id.trap,
            exception_stage: id.exception_stage,
            pred_taken: id.pred_taken,
            pred_target: id.pred_target,
            ghr_snapshot: id.ghr_snapshot,
        };

        if cpu.trace {
            eprintln!(
                "RN  pc={:#x} rob_tag={} class={:?} pdst={:?} br_mask={:#x}",
                uop.pc, uop.rob_tag.0, uop.fu_class, uop.pdst, uop.br_mask
            );
        }

        let enqueued = match fu_class {
            FuClass::Int => engine.iq_int.enqueue(uop, src1_ready, src2_ready, src3_ready),
            FuClass::Mem => engine.iq_mem.enqueue(uop, src1_ready, src2_ready, src3_ready),
            FuClass::Fp => engine.iq_fp.enqueue(uop, src1_ready, src2_ready, src3_ready),
        };
        debug_assert!(enqueued, "issue queue slot was reserved but enqueue failed");
    }
}
