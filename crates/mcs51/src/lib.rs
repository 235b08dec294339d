//! Instruction-level simulator core for the MCS-51 microcontroller family.

mod breakpoint;
mod cpu;
pub mod disasm;
mod interrupt;
pub mod memory;
mod ops;
pub mod sfr;
mod timer;
mod variant;

pub use breakpoint::{BreakpointError, Breakpoints, Condition, Watch};
pub use cpu::{ErrorKind, Mcu, Step};
pub use disasm::DEFAULT_FORMAT;
pub use interrupt::{VEC_EXT0, VEC_EXT1, VEC_TIMER0, VEC_TIMER1, VEC_TIMER2};
pub use memory::{AddrMode, Memory, Space, UsageStats};
pub use ops::{Descriptor, OPCODES};
pub use variant::{DEFAULT_OSCILLATOR_HZ, Extension, Profile, Variant};
