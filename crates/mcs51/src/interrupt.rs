//! Interrupt arbitration and vectoring.
//!
//! Runs once after every instruction. Sources are polled in the hardware's
//! fixed arbitration order, and at most one vectoring call happens per check
//! even when several are pending.

use crate::cpu::Mcu;
use crate::sfr::*;

pub const VEC_EXT0: u16 = 0x0003;
pub const VEC_TIMER0: u16 = 0x000B;
pub const VEC_EXT1: u16 = 0x0013;
pub const VEC_TIMER1: u16 = 0x001B;
pub const VEC_TIMER2: u16 = 0x002B;

pub(crate) fn check(m: &mut Mcu) {
    if !m.reg_bit(SFR_IE, IE_EA) {
        return;
    }

    if m.reg_bit(SFR_TCON, TCON_IE0) && m.reg_bit(SFR_IE, IE_EX0) {
        m.set_reg_bit(SFR_TCON, TCON_IE0, false);
        vector(m, VEC_EXT0);
        return;
    }
    if m.reg_bit(SFR_TCON, TCON_IE1) && m.reg_bit(SFR_IE, IE_EX1) {
        m.set_reg_bit(SFR_TCON, TCON_IE1, false);
        vector(m, VEC_EXT1);
        return;
    }
    if m.reg_bit(SFR_TCON, TCON_TF0) && m.reg_bit(SFR_IE, IE_ET0) {
        m.set_reg_bit(SFR_TCON, TCON_TF0, false);
        vector(m, VEC_TIMER0);
        return;
    }
    if m.reg_bit(SFR_TCON, TCON_TF1) && m.reg_bit(SFR_IE, IE_ET1) {
        m.set_reg_bit(SFR_TCON, TCON_TF1, false);
        vector(m, VEC_TIMER1);
        return;
    }
    if m.profile().has_timer2
        && m.reg_bit(SFR_T2CON, T2CON_TF2)
        && m.reg_bit(SFR_IE, IE_ET2)
    {
        // TF2 is never cleared by hardware; the service routine must do it.
        vector(m, VEC_TIMER2);
    }
}

/// The vectoring call: push the interrupted PC (low byte, then high byte)
/// and jump to the fixed vector.
fn vector(m: &mut Mcu, vec: u16) {
    let pc = m.pc;
    m.push16(pc);
    m.pc = vec;
}
