//! PC breakpoints, access pauses and conditional watches.
//!
//! The collection is append-only until cleared: insertion is idempotent and
//! removal compacts the backing vectors while preserving relative order.
//! Evaluation happens once per instruction, against the addresses the
//! instruction actually touched and the current memory contents.

use std::fmt;

use crate::memory::{Memory, Space};

use tracing::debug;

/// Comparison applied by a conditional watch. The bitwise forms treat a
/// non-zero result as true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Xor,
}

impl Condition {
    pub fn holds(self, value: u8, target: u8) -> bool {
        match self {
            Condition::Equal => value == target,
            Condition::NotEqual => value != target,
            Condition::Less => value < target,
            Condition::LessEqual => value <= target,
            Condition::Greater => value > target,
            Condition::GreaterEqual => value >= target,
            Condition::And => value & target != 0,
            Condition::Or => value | target != 0,
            Condition::Xor => value ^ target != 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Watch {
    pub addr: u16,
    pub condition: Condition,
    pub value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointError {
    /// The address lies outside the bounds of the given space.
    InvalidAddress(Space, u16),
    /// Conditional watches only exist for the writable data spaces.
    UnsupportedSpace(Space),
}

impl fmt::Display for BreakpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakpointError::InvalidAddress(space, addr) => {
                write!(f, "address {addr:#06X} is outside the {space:?} space")
            }
            BreakpointError::UnsupportedSpace(space) => {
                write!(f, "{space:?} does not support conditional watches")
            }
        }
    }
}

impl std::error::Error for BreakpointError {}

pub struct Breakpoints {
    pc: Vec<u16>,
    access: [Vec<u16>; 5],
    watches: [Vec<Watch>; 3],
}

fn access_index(space: Space) -> usize {
    match space {
        Space::Idata => 0,
        Space::Xdata => 1,
        Space::Sfr => 2,
        Space::Irom => 3,
        Space::Xrom => 4,
    }
}

fn watch_index(space: Space) -> Option<usize> {
    match space {
        Space::Idata => Some(0),
        Space::Xdata => Some(1),
        Space::Sfr => Some(2),
        _ => None,
    }
}

fn validate(space: Space, addr: u16) -> Result<(), BreakpointError> {
    let ok = match space {
        Space::Idata => addr <= 0xFF,
        Space::Sfr => (0x80..=0xFF).contains(&addr),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(BreakpointError::InvalidAddress(space, addr))
    }
}

impl Breakpoints {
    pub fn new() -> Self {
        Breakpoints {
            pc: Vec::new(),
            access: Default::default(),
            watches: Default::default(),
        }
    }

    pub fn add_pc(&mut self, addr: u16) {
        if !self.pc.contains(&addr) {
            self.pc.push(addr);
        }
    }

    pub fn remove_pc(&mut self, addr: u16) {
        self.pc.retain(|&a| a != addr);
    }

    pub fn add_access(&mut self, space: Space, addr: u16) -> Result<(), BreakpointError> {
        validate(space, addr)?;
        let list = &mut self.access[access_index(space)];
        if !list.contains(&addr) {
            list.push(addr);
        }
        Ok(())
    }

    pub fn remove_access(&mut self, space: Space, addr: u16) {
        self.access[access_index(space)].retain(|&a| a != addr);
    }

    pub fn add_watch(
        &mut self,
        space: Space,
        addr: u16,
        condition: Condition,
        value: u8,
    ) -> Result<(), BreakpointError> {
        let index = watch_index(space).ok_or(BreakpointError::UnsupportedSpace(space))?;
        validate(space, addr)?;
        let list = &mut self.watches[index];
        if !list.iter().any(|w| w.addr == addr) {
            list.push(Watch {
                addr,
                condition,
                value,
            });
        }
        Ok(())
    }

    pub fn remove_watch(&mut self, space: Space, addr: u16) {
        if let Some(index) = watch_index(space) {
            self.watches[index].retain(|w| w.addr != addr);
        }
    }

    pub fn clear_all(&mut self) {
        self.pc.clear();
        for list in &mut self.access {
            list.clear();
        }
        for list in &mut self.watches {
            list.clear();
        }
    }

    pub fn pc_breakpoints(&self) -> &[u16] {
        &self.pc
    }

    pub fn access_pauses(&self, space: Space) -> &[u16] {
        &self.access[access_index(space)]
    }

    pub fn watches(&self, space: Space) -> &[Watch] {
        watch_index(space).map_or(&[], |i| self.watches[i].as_slice())
    }
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::new()
    }
}

/// Decide whether execution should pause at the current instruction
/// boundary: the new PC matches a breakpoint, the just-executed instruction
/// touched a paused address, or a conditional watch holds.
pub(crate) fn should_halt(bp: &Breakpoints, mem: &Memory, pc: u16) -> bool {
    if bp.pc.contains(&pc) {
        debug!("pc breakpoint hit at {pc:04X}");
        return true;
    }

    for space in [Space::Idata, Space::Xdata, Space::Sfr, Space::Irom, Space::Xrom] {
        let list = &bp.access[access_index(space)];
        if list.is_empty() {
            continue;
        }
        if let Some(touched) = mem.accessed(space) {
            if list.contains(&touched) {
                debug!("access pause hit at {touched:04X} in {space:?}");
                return true;
            }
        }
    }

    for space in [Space::Idata, Space::Xdata, Space::Sfr] {
        for watch in bp.watches(space) {
            let value = mem.peek(space, watch.addr);
            if watch.condition.holds(value, watch.value) {
                debug!(
                    "watch hit at {:04X} in {space:?}: {value:02X} {:?} {:02X}",
                    watch.addr, watch.condition, watch.value
                );
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mcu, Variant};

    #[test]
    fn pc_breakpoint_insert_is_idempotent() {
        let mut bp = Breakpoints::new();
        bp.add_pc(0x0100);
        bp.add_pc(0x0100);
        assert_eq!(bp.pc_breakpoints(), &[0x0100]);
        bp.remove_pc(0x0100);
        assert!(bp.pc_breakpoints().is_empty());
    }

    #[test]
    fn removal_preserves_relative_order() {
        let mut bp = Breakpoints::new();
        for addr in [0x10, 0x20, 0x30] {
            bp.add_pc(addr);
        }
        bp.remove_pc(0x20);
        assert_eq!(bp.pc_breakpoints(), &[0x10, 0x30]);
    }

    #[test]
    fn access_pause_addresses_are_bounds_checked() {
        let mut bp = Breakpoints::new();
        assert!(bp.add_access(Space::Idata, 0x100).is_err());
        assert!(bp.add_access(Space::Sfr, 0x7F).is_err());
        assert!(bp.add_access(Space::Sfr, 0xE0).is_ok());
        assert!(bp.add_access(Space::Xdata, 0xFFFF).is_ok());
    }

    #[test]
    fn watches_reject_code_spaces() {
        let mut bp = Breakpoints::new();
        assert_eq!(
            bp.add_watch(Space::Irom, 0, Condition::Equal, 0),
            Err(BreakpointError::UnsupportedSpace(Space::Irom))
        );
    }

    #[test]
    fn pc_breakpoint_halts_a_step() {
        let mut m = Mcu::new(Variant::M8052);
        m.breakpoints_mut().add_pc(0x0001);
        let step = m.step(None); // nop lands exactly on the breakpoint
        assert!(step.halted);
        let step = m.step(None);
        assert!(!step.halted);
    }

    #[test]
    fn access_pause_fires_on_the_touched_address() {
        let mut m = Mcu::new(Variant::M8052);
        m.memory_mut()
            .load(Space::Irom, 0, &[0x75, 0x30, 0xAA, 0x00]); // mov 30h,#0AAh; nop
        m.breakpoints_mut().add_access(Space::Idata, 0x30).unwrap();
        let step = m.step(None);
        assert!(step.halted);
        // The pause stays latched to the last touch, as the next instruction
        // does not touch internal RAM.
        m.breakpoints_mut().remove_access(Space::Idata, 0x30);
        let step = m.step(None);
        assert!(!step.halted);
    }

    #[test]
    fn conditional_watch_compares_current_memory() {
        let mut m = Mcu::new(Variant::M8052);
        m.memory_mut().load(Space::Irom, 0, &[0x05, 0x40, 0x00]); // inc 40h
        m.breakpoints_mut()
            .add_watch(Space::Idata, 0x40, Condition::GreaterEqual, 1)
            .unwrap();
        let step = m.step(None);
        assert!(step.halted, "0x40 incremented to 1");
        m.breakpoints_mut().clear_all();
        let step = m.step(None);
        assert!(!step.halted);
    }

    #[test]
    fn bitwise_watch_conditions_use_nonzero_truth() {
        assert!(Condition::And.holds(0x0F, 0x01));
        assert!(!Condition::And.holds(0x0E, 0x01));
        assert!(Condition::Or.holds(0x00, 0x01));
        assert!(!Condition::Or.holds(0x00, 0x00));
        assert!(Condition::Xor.holds(0x01, 0x02));
        assert!(!Condition::Xor.holds(0x03, 0x03));
    }
}
