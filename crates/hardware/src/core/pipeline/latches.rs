//! Pipeline latch structures for inter-stage communication.
//!
//! This module defines the buffers that connect the five stages of the pipeline. It implements:
//! 1. **Instruction Flow:** Structures for carrying state between Fetch, Decode, Execute, Memory, and Writeback.
//! 2. **Superscalar Support:** Multi-entry latches for wide-issue configurations.
//! 3. **Trap Propagation:** Carrying architectural exceptions and interrupts through the pipeline.

use crate::common::error::{ExceptionStage, Trap};
use crate::core::pipeline::rob::RobTag;
use crate::core::pipeline::signals::ControlSignals;

/// Entry in the Fetch1/Fetch2 latch (PC generation to I-cache access).
///
/// Carries the physical address resolved by the I-TLB and the branch
/// prediction made from the partially-decoded opcode, so Fetch2 doesn't
/// need to repeat translation or prediction.
#[derive(Clone, Default, Debug)]
pub struct Fetch1Fetch2Entry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// Physical address resolved by the I-TLB.
    pub paddr: u64,
    /// Whether the branch predictor predicted this instruction as taken.
    pub pred_taken: bool,
    /// Predicted target address for branch/jump instructions.
    pub pred_target: u64,
    /// Trap that occurred during fetch, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which `trap` was raised.
    pub exception_stage: Option<ExceptionStage>,
    /// Global history snapshot taken before prediction, for repair on redirect.
    pub ghr_snapshot: u64,
}

/// Entry in the IF/ID pipeline latch (Fetch to Decode stage).
///
/// Contains instruction information fetched from memory, including the raw
/// encoding and branch prediction metadata.
#[derive(Clone, Default, Debug)]
pub struct IfIdEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes (2 for compressed, 4 for standard).
    pub inst_size: u64,
    /// Whether the branch predictor predicted this instruction as taken.
    pub pred_taken: bool,
    /// Predicted target address for branch/jump instructions.
    pub pred_target: u64,
    /// Trap that occurred during fetch, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which `trap` was raised.
    pub exception_stage: Option<ExceptionStage>,
    /// Global history snapshot taken before prediction, for repair on redirect.
    pub ghr_snapshot: u64,
}

/// Entry in the ID/EX pipeline latch (Decode to Execute stage).
///
/// Contains decoded instruction information, including register indices,
/// immediate values, and control signals.
#[derive(Clone, Default, Debug)]
pub struct IdExEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// First source register index (rs1).
    pub rs1: usize,
    /// Second source register index (rs2).
    pub rs2: usize,
    /// Third source register index (rs3).
    pub rs3: usize,
    /// Destination register index (rd).
    pub rd: usize,
    /// Sign-extended immediate value.
    pub imm: i64,
    /// Value read from rs1 register.
    pub rv1: u64,
    /// Value read from rs2 register.
    pub rv2: u64,
    /// Value read from rs3 register.
    pub rv3: u64,
    /// Control signals for downstream pipeline stages.
    pub ctrl: ControlSignals,
    /// Trap that occurred during decode, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which `trap` was raised.
    pub exception_stage: Option<ExceptionStage>,
    /// Whether the branch predictor predicted this instruction as taken.
    pub pred_taken: bool,
    /// Predicted target address for branch/jump instructions.
    pub pred_target: u64,
    /// Global history snapshot taken before prediction, for repair on redirect.
    pub ghr_snapshot: u64,
}

/// Entry in the Rename/Issue latch (Rename/Dispatch to Issue stage).
///
/// Produced by the rename stage once a ROB (and, for stores, store buffer)
/// entry has been allocated. Source operand values start at zero and are
/// filled in at issue time using the tags captured here.
#[derive(Clone, Default, Debug)]
pub struct RenameIssueEntry {
    /// ROB tag allocated for this instruction.
    pub rob_tag: RobTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// First source register index (rs1).
    pub rs1: usize,
    /// Second source register index (rs2).
    pub rs2: usize,
    /// Third source register index (rs3).
    pub rs3: usize,
    /// Destination register index (rd).
    pub rd: usize,
    /// Sign-extended immediate value.
    pub imm: i64,
    /// Value read from rs1, filled in at issue.
    pub rv1: u64,
    /// Value read from rs2, filled in at issue.
    pub rv2: u64,
    /// Value read from rs3, filled in at issue.
    pub rv3: u64,
    /// Producer tag for rs1 captured at rename, or `None` if already architectural.
    pub rs1_tag: Option<RobTag>,
    /// Producer tag for rs2 captured at rename, or `None` if already architectural.
    pub rs2_tag: Option<RobTag>,
    /// Producer tag for rs3 captured at rename, or `None` if already architectural.
    pub rs3_tag: Option<RobTag>,
    /// Control signals for downstream pipeline stages.
    pub ctrl: ControlSignals,
    /// Trap that occurred upstream, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which `trap` was raised.
    pub exception_stage: Option<ExceptionStage>,
    /// Whether the branch predictor predicted this instruction as taken.
    pub pred_taken: bool,
    /// Predicted target address for branch/jump instructions.
    pub pred_target: u64,
    /// Global history snapshot taken before prediction, for repair on redirect.
    pub ghr_snapshot: u64,
}

/// Entry in the EX/MEM pipeline latch (Execute to Memory stage).
///
/// Contains execution results, including ALU outputs and memory operation parameters.
#[derive(Clone, Default, Debug)]
pub struct ExMemEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// Destination register index (rd).
    pub rd: usize,
    /// ALU computation result or address for memory operations.
    pub alu: u64,
    /// Data to be stored (for store instructions).
    pub store_data: u64,
    /// Control signals for downstream pipeline stages.
    pub ctrl: ControlSignals,
    /// Trap that occurred during execute, if any.
    pub trap: Option<Trap>,
}

/// Entry in the MEM/WB pipeline latch (Memory to Writeback stage).
///
/// Contains memory stage results, including loaded data and final register write values.
#[derive(Clone, Default, Debug)]
pub struct MemWbEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// Destination register index (rd).
    pub rd: usize,
    /// ALU computation result (for non-load instructions).
    pub alu: u64,
    /// Data loaded from memory (for load instructions).
    pub load_data: u64,
    /// Control signals for the writeback stage.
    pub ctrl: ControlSignals,
    /// Trap that occurred during memory access, if any.
    pub trap: Option<Trap>,
}

/// Entry in the Execute/Memory1 latch (Execute to address-translation stage).
///
/// Used by the superscalar backends (in-order and out-of-order), which split
/// memory access into translation (Memory1) and data access (Memory2).
#[derive(Clone, Default, Debug)]
pub struct ExMem1Entry {
    /// ROB tag of the instruction.
    pub rob_tag: RobTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// Destination register index (rd).
    pub rd: usize,
    /// ALU result, or the virtual address for memory operations.
    pub alu: u64,
    /// Data to be stored (for store instructions).
    pub store_data: u64,
    /// Control signals for downstream pipeline stages.
    pub ctrl: ControlSignals,
    /// Trap that occurred during execute, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which `trap` was raised.
    pub exception_stage: Option<ExceptionStage>,
}

/// Entry in the Memory1/Memory2 latch (address translation to data access).
#[derive(Clone, Default, Debug)]
pub struct Mem1Mem2Entry {
    /// ROB tag of the instruction.
    pub rob_tag: RobTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// Destination register index (rd).
    pub rd: usize,
    /// ALU result (for non-memory instructions).
    pub alu: u64,
    /// Virtual address of the memory operation.
    pub vaddr: u64,
    /// Physical address resolved by the D-TLB.
    pub paddr: u64,
    /// Data to be stored (for store instructions).
    pub store_data: u64,
    /// Control signals for downstream pipeline stages.
    pub ctrl: ControlSignals,
    /// Trap that occurred during translation, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which `trap` was raised.
    pub exception_stage: Option<ExceptionStage>,
}

/// Entry in the Memory2/Writeback latch (data access to writeback stage).
#[derive(Clone, Default, Debug)]
pub struct Mem2WbEntry {
    /// ROB tag of the instruction.
    pub rob_tag: RobTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// Destination register index (rd).
    pub rd: usize,
    /// ALU result (for non-load instructions).
    pub alu: u64,
    /// Data loaded from memory (for load instructions).
    pub load_data: u64,
    /// Control signals for the writeback stage.
    pub ctrl: ControlSignals,
    /// Trap that occurred during memory access, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which `trap` was raised.
    pub exception_stage: Option<ExceptionStage>,
}

/// IF/ID pipeline latch (Fetch to Decode stage).
///
/// Supports multiple instructions per cycle for superscalar execution.
#[derive(Clone, Debug)]
pub struct IfId {
    /// Vector of fetched instruction entries.
    pub entries: Vec<IfIdEntry>,
}

impl Default for IfId {
    /// Creates an empty IF/ID latch.
    ///
    /// # Returns
    ///
    /// A new `IfId` instance with an empty entries vector.
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// ID/EX pipeline latch (Decode to Execute stage).
///
/// Supports multiple instructions per cycle for superscalar execution.
#[derive(Clone, Default, Debug)]
pub struct IdEx {
    /// Vector of decoded instruction entries.
    pub entries: Vec<IdExEntry>,
}

/// EX/MEM pipeline latch (Execute to Memory stage).
///
/// Supports multiple instructions per cycle for superscalar execution.
#[derive(Clone, Default, Debug)]
pub struct ExMem {
    /// Vector of execution result entries.
    pub entries: Vec<ExMemEntry>,
}

/// MEM/WB pipeline latch (Memory to Writeback stage).
///
/// Supports multiple instructions per cycle for superscalar execution.
#[derive(Clone, Default, Debug)]
pub struct MemWb {
    /// Vector of memory stage result entries.
    pub entries: Vec<MemWbEntry>,
}
