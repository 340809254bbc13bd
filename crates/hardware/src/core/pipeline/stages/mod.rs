//! Pipeline stage implementations.
//!
//! This module contains the combinational logic of the five pipeline stages. Each stage
//! reads the previous cycle's state through a shared `&Cpu` and returns what it would
//! latch; nothing is committed until the hazard decision for the cycle is known. It includes:
//! 1. **Fetch:** Reads the instruction word at the PC.
//! 2. **Decode:** Produces control signals and register indices.
//! 3. **Execute:** Forwards operands, runs the ALU, and resolves branches.
//! 4. **Memory:** Accesses the data cache or the uncached port.
//! 5. **Writeback:** Selects the register/CSR update or the trap to take.

pub mod decode;
pub mod execute;
pub mod fetch;
pub mod memory;
pub mod writeback;

pub use decode::decode_stage;
pub use execute::{ExecuteOutput, execute_stage};
pub use fetch::fetch_stage;
pub use memory::{MemAction, MemoryOutput, mem_stage};
pub use writeback::{WritebackOutput, wb_stage};
