//! Out-of-order load/store pipeline: wraps the shared memory1/memory2
//! stages (reused verbatim — they are already ROB-tag-addressed and
//! backend-agnostic) with load-queue bookkeeping and memory-ordering
//! violation detection.
//!
//! `memory2_stage` already performs store-to-load forwarding via the store
//! buffer; what it cannot do on its own is notice that a load which *did
//! not* forward from an in-flight store observed stale memory because that
//! store's address wasn't known yet at the time the load executed. This
//! module re-checks that case once the store's address resolves.

use super::O3Engine;
use crate::common::error::Trap;
use crate::core::Cpu;
use crate::core::pipeline::backend::shared::{memory1, memory2};
use crate::core::pipeline::rob::RobTag;

/// Runs memory2 then memory1 for this cycle (the same reverse order the
/// in-order backend uses, so each stage still sees the *previous* cycle's
/// latch contents rather than collapsing a cycle of latency), then scans
/// the addresses memory1 just resolved for any load that raced ahead of a
/// store it depended on. Returns the ROB tag of the oldest such load, if a
/// violation occurred.
pub fn memory_stage(cpu: &mut Cpu, engine: &mut O3Engine) -> Option<RobTag> {
    memory2::memory2_stage(
        cpu,
        &mut engine.mem1_mem2,
        &mut engine.mem2_wb,
        &mut engine.store_buffer,
        &mut engine.rob,
    );

    if engine.mem1_stall == 0 {
        memory1::memory1_stage(
            cpu,
            &mut engine.execute_mem1,
            &mut engine.mem1_mem2,
            &mut engine.mem1_stall,
        );
    } else {
        engine.mem1_stall -= 1;
    }

    // mem1_mem2 now holds this cycle's freshly address-resolved entries,
    // produced by the memory1 call just above.
    let resolving_stores: Vec<(RobTag, u64, u64)> = engine
        .mem1_mem2
        .iter()
        .filter(|e| e.ctrl.mem_write)
        .map(|e| (e.rob_tag, e.paddr, mem_len(e.ctrl.width)))
        .collect();

    let executed_loads: Vec<(RobTag, u64)> = engine
        .mem1_mem2
        .iter()
        .filter(|e| e.ctrl.mem_read)
        .map(|e| (e.rob_tag, e.paddr))
        .collect();

    for (tag, vaddr) in executed_loads {
        engine.ldq.mark_executed(tag, vaddr);
    }

    let mut violator: Option<RobTag> = None;
    for (store_tag, store_paddr, store_len) in resolving_stores {
        if let Some(v) = engine
            .ldq
            .find_ordering_violation(store_tag, store_paddr, store_len)
        {
            violator = Some(match violator {
                Some(existing) if existing.0 <= v.0 => existing,
                _ => v,
            });
        }
    }

    if let Some(tag) = violator {
        if let Some(entry) = engine.rob.find_entry(tag) {
            if cpu.trace {
                eprintln!(
                    "LSU * memory ordering violation rob_tag={} pc={:#x}",
                    tag.0, entry.pc
                );
            }
            let pc = entry.pc;
            engine.rob.fault(
                tag,
                Trap::MemoryOrderingViolation(pc),
                crate::common::error::ExceptionStage::Memory,
            );
        }
    }

    violator
}

fn mem_len(width: crate::core::pipeline::signals::MemWidth) -> u64 {
    use crate::core::pipeline::signals::MemWidth;
    match width {
        MemWidth::Nop => 0,
        MemWidth::Byte => 1,
        MemWidth::Half => 2,
        MemWidth::Word => 4,
        MemWidth::Double => 8,
    }
}
