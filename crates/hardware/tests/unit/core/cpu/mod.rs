/// Interrupt delivery from the CLINT and the external line.
pub mod interrupts;
