//! Out-of-order writeback: wraps the shared `writeback_stage` (reused
//! verbatim) with the physical register file update and issue-queue
//! wakeup broadcast that the in-order backend has no need for.

use super::O3Engine;
use crate::core::Cpu;
use crate::core::pipeline::backend::shared::writeback::writeback_stage;
use crate::core::pipeline::rob::RobTag;

pub fn writeback(cpu: &mut Cpu, engine: &mut O3Engine) {
    let completing: Vec<RobTag> = engine
        .mem2_wb
        .iter()
        .filter(|e| e.trap.is_none())
        .map(|e| e.rob_tag)
        .collect();

    writeback_stage(cpu, &mut engine.mem2_wb, &mut engine.rob);

    for tag in completing {
        let Some(entry) = engine.rob.find_entry(tag) else {
            continue;
        };
        let Some(pdst) = entry.pdst else { continue };
        let is_fp = entry.rd_fp;
        let result = entry.result;

        engine.prf.write(pdst, is_fp, result);
        engine.prf.clear_busy(pdst, is_fp);
        engine.iq_int.wakeup(pdst, is_fp);
        engine.iq_mem.wakeup(pdst, is_fp);
        engine.iq_fp.wakeup(pdst, is_fp);
    }
}
