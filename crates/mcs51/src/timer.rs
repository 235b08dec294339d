//! Timer0/Timer1/Timer2, advanced in lock-step with instruction execution.
//!
//! Counters move by the cycle cost of the instruction that just executed.
//! Control-register polling goes through the raw SFR window so timer
//! bookkeeping never disturbs the per-instruction access trackers.

use crate::cpu::Mcu;
use crate::sfr::*;

pub(crate) fn tick(m: &mut Mcu) {
    let elapsed = m.last_op_cycles() as u16;
    tick_timer01(m, elapsed);
    if m.profile().has_timer2 {
        tick_timer2(m, elapsed);
    }
}

fn tick_timer01(m: &mut Mcu, elapsed: u16) {
    let tmod = m.mem.sfr_raw(SFR_TMOD);

    let mode0 = tmod & 0x03;
    let gate0_open = !m.reg_bit(SFR_TMOD, TMOD_GATE0) || m.reg_bit(SFR_P3, P3_INT0);
    if m.reg_bit(SFR_TCON, TCON_TR0) && gate0_open {
        match mode0 {
            0 => carry_into_high(m, SFR_TL0, SFR_TH0, 0x1F, TCON_TF0, elapsed),
            1 => carry_into_high(m, SFR_TL0, SFR_TH0, 0xFF, TCON_TF0, elapsed),
            2 => reload_from_high(m, SFR_TL0, SFR_TH0, TCON_TF0, elapsed),
            _ => free_eight_bit(m, SFR_TL0, TCON_TF0, elapsed),
        }
    }

    // Mode 3 splits timer 0: TH0 becomes a third 8-bit timer gated by TR1
    // and raising TF1.
    if mode0 == 3 && m.reg_bit(SFR_TCON, TCON_TR1) {
        free_eight_bit(m, SFR_TH0, TCON_TF1, elapsed);
    }

    let mode1 = (tmod >> 4) & 0x03;
    let gate1_open = !m.reg_bit(SFR_TMOD, TMOD_GATE1) || m.reg_bit(SFR_P3, P3_INT1);
    if m.reg_bit(SFR_TCON, TCON_TR1) && gate1_open {
        match mode1 {
            0 => carry_into_high(m, SFR_TL1, SFR_TH1, 0x1F, TCON_TF1, elapsed),
            1 => carry_into_high(m, SFR_TL1, SFR_TH1, 0xFF, TCON_TF1, elapsed),
            2 => reload_from_high(m, SFR_TL1, SFR_TH1, TCON_TF1, elapsed),
            _ => {} // mode 3 halts timer 1
        }
    }
}

/// Timer2 free-runs under TR2, each half reloading from its capture
/// register on overflow. Overflow raises TF2 and, as the 8052 line always
/// did, TF1 as well.
fn tick_timer2(m: &mut Mcu, elapsed: u16) {
    if !m.reg_bit(SFR_T2CON, T2CON_TR2) {
        return;
    }

    let tl2 = m.mem.sfr_raw(SFR_TL2);
    if tl2 as u16 + elapsed <= 0xFF {
        m.mem.sfr_raw_set(SFR_TL2, tl2 + elapsed as u8);
    } else {
        let reload = m.mem.sfr_raw(SFR_RCAP2L);
        m.mem.sfr_raw_set(SFR_TL2, reload);
        m.set_reg_bit(SFR_T2CON, T2CON_TF2, true);
        m.set_reg_bit(SFR_TCON, TCON_TF1, true);
    }

    let th2 = m.mem.sfr_raw(SFR_TH2);
    if th2 as u16 + elapsed <= 0xFF {
        m.mem.sfr_raw_set(SFR_TH2, th2 + elapsed as u8);
    } else {
        let reload = m.mem.sfr_raw(SFR_RCAP2H);
        m.mem.sfr_raw_set(SFR_TH2, reload);
        m.set_reg_bit(SFR_T2CON, T2CON_TF2, true);
        m.set_reg_bit(SFR_TCON, TCON_TF1, true);
    }
}

/// Low counter with a mode-dependent width (5 bits in mode 0); overflow
/// carries into the high byte, and the high byte's own wrap raises the flag.
fn carry_into_high(m: &mut Mcu, tl: u8, th: u8, threshold: u16, tf: u8, elapsed: u16) {
    let low = m.mem.sfr_raw(tl);
    if low as u16 + elapsed <= threshold {
        m.mem.sfr_raw_set(tl, low + elapsed as u8);
    } else {
        m.mem
            .sfr_raw_set(tl, (low as u16 + elapsed - (threshold + 1)) as u8);
        let high = m.mem.sfr_raw(th);
        if high < 0xFF {
            m.mem.sfr_raw_set(th, high + 1);
        } else {
            m.mem.sfr_raw_set(th, 0);
            m.set_reg_bit(SFR_TCON, tf, true);
        }
    }
}

/// Mode 2: eight-bit counter that reloads from the high byte on overflow.
fn reload_from_high(m: &mut Mcu, tl: u8, th: u8, tf: u8, elapsed: u16) {
    let low = m.mem.sfr_raw(tl);
    if low as u16 + elapsed <= 0xFF {
        m.mem.sfr_raw_set(tl, low + elapsed as u8);
    } else {
        let reload = m.mem.sfr_raw(th);
        m.mem.sfr_raw_set(tl, reload);
        m.set_reg_bit(SFR_TCON, tf, true);
    }
}

/// Plain eight-bit counter raising its flag on wrap (mode 3 halves).
fn free_eight_bit(m: &mut Mcu, tl: u8, tf: u8, elapsed: u16) {
    let low = m.mem.sfr_raw(tl);
    if low as u16 + elapsed <= 0xFF {
        m.mem.sfr_raw_set(tl, low + elapsed as u8);
    } else {
        m.mem
            .sfr_raw_set(tl, (low as u16 + elapsed - 0x100) as u8);
        m.set_reg_bit(SFR_TCON, tf, true);
    }
}

#[cfg(test)]
mod tests {
    use crate::memory::Space;
    use crate::sfr::*;
    use crate::{Mcu, Variant};

    // Zero-filled code executes as NOPs; each step elapses one cycle.
    fn mcu_running_nops(variant: Variant) -> Mcu {
        Mcu::new(variant)
    }

    fn poke_sfr(m: &mut Mcu, addr: u8, value: u8) {
        m.memory_mut().poke(Space::Sfr, addr as u16, value);
    }

    #[test]
    fn mode1_low_byte_carries_into_high() {
        let mut m = mcu_running_nops(Variant::M8051);
        poke_sfr(&mut m, SFR_TMOD, 0x01);
        poke_sfr(&mut m, SFR_TCON, 1 << TCON_TR0);
        poke_sfr(&mut m, SFR_TL0, 0xFF);
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TL0 as u16), 0x00);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TH0 as u16), 0x01);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TCON as u16) & (1 << TCON_TF0), 0);
    }

    #[test]
    fn mode1_full_wrap_raises_tf0() {
        let mut m = mcu_running_nops(Variant::M8051);
        poke_sfr(&mut m, SFR_TMOD, 0x01);
        poke_sfr(&mut m, SFR_TCON, 1 << TCON_TR0);
        poke_sfr(&mut m, SFR_TL0, 0xFF);
        poke_sfr(&mut m, SFR_TH0, 0xFF);
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TH0 as u16), 0x00);
        assert_ne!(m.memory().peek(Space::Sfr, SFR_TCON as u16) & (1 << TCON_TF0), 0);
    }

    #[test]
    fn mode0_counts_five_bits() {
        let mut m = mcu_running_nops(Variant::M8051);
        poke_sfr(&mut m, SFR_TMOD, 0x00);
        poke_sfr(&mut m, SFR_TCON, 1 << TCON_TR0);
        poke_sfr(&mut m, SFR_TL0, 0x1F);
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TL0 as u16), 0x00);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TH0 as u16), 0x01);
    }

    #[test]
    fn mode2_reloads_from_the_high_byte() {
        let mut m = mcu_running_nops(Variant::M8051);
        poke_sfr(&mut m, SFR_TMOD, 0x02);
        poke_sfr(&mut m, SFR_TCON, 1 << TCON_TR0);
        poke_sfr(&mut m, SFR_TL0, 0xFF);
        poke_sfr(&mut m, SFR_TH0, 0xA0);
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TL0 as u16), 0xA0);
        assert_ne!(m.memory().peek(Space::Sfr, SFR_TCON as u16) & (1 << TCON_TF0), 0);
    }

    #[test]
    fn gate_mode_requires_the_int_pin() {
        let mut m = mcu_running_nops(Variant::M8051);
        poke_sfr(&mut m, SFR_TMOD, 0x01 | 1 << TMOD_GATE0);
        poke_sfr(&mut m, SFR_TCON, 1 << TCON_TR0);
        poke_sfr(&mut m, SFR_P3, 0x00); // INT0 low
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TL0 as u16), 0x00);

        poke_sfr(&mut m, SFR_P3, 1 << P3_INT0);
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TL0 as u16), 0x01);
    }

    #[test]
    fn timer2_reloads_from_capture_and_raises_tf1() {
        let mut m = mcu_running_nops(Variant::M8052);
        poke_sfr(&mut m, SFR_T2CON, 1 << T2CON_TR2);
        poke_sfr(&mut m, SFR_TL2, 0xFF);
        poke_sfr(&mut m, SFR_RCAP2L, 0x34);
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TL2 as u16), 0x34);
        let t2con = m.memory().peek(Space::Sfr, SFR_T2CON as u16);
        assert_ne!(t2con & (1 << T2CON_TF2), 0);
        let tcon = m.memory().peek(Space::Sfr, SFR_TCON as u16);
        assert_ne!(tcon & (1 << TCON_TF1), 0);
    }

    #[test]
    fn timer2_is_absent_on_8051_parts() {
        let mut m = mcu_running_nops(Variant::M8051);
        poke_sfr(&mut m, SFR_T2CON, 1 << T2CON_TR2);
        poke_sfr(&mut m, SFR_TL2, 0xFF);
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_TL2 as u16), 0xFF);
    }
}
