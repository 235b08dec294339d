//! The machine-state aggregate and the step loop.
//!
//! [`Mcu`] owns the memory model, the breakpoint set and the counters, and
//! drives one instruction per [`Mcu::step`] call: execute, wrap PC, update
//! the change trackers, run timers, arbitrate interrupts, run the variant
//! extension hook, exchange UART bytes, and finally evaluate breakpoints.

use crate::breakpoint::{self, Breakpoints};
use crate::memory::{AddrMode, Memory, Space, UsageStats};
use crate::sfr::*;
use crate::variant::{DEFAULT_OSCILLATOR_HZ, Extension, Profile, Variant};
use crate::{interrupt, ops, timer};

use std::fmt;

/// Recoverable fault conditions. The instruction that raised one still
/// completes (with a wrapped address or a skipped byte); the latched value is
/// cleared at the start of the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoError,
    InternalRamOutOfRange,
    ExternalRamOutOfRange,
    UnsupportedOpcode,
}

impl ErrorKind {
    /// Human-readable description, `None` when there is nothing to report.
    pub fn message(self) -> Option<&'static str> {
        match self {
            ErrorKind::NoError => None,
            ErrorKind::InternalRamOutOfRange => {
                Some("Using an address outside the available internal ram memory.")
            }
            ErrorKind::ExternalRamOutOfRange => {
                Some("Using an address outside the available external ram memory.")
            }
            ErrorKind::UnsupportedOpcode => Some("Using unsupported instruction."),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("No error."))
    }
}

/// Result of a single [`Mcu::step`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Step {
    /// A breakpoint, access pause or conditional watch fired.
    pub halted: bool,
    /// Byte transmitted through the UART during this step, if any.
    pub output: Option<u8>,
    /// The input byte offered to this step was accepted into SBUF.
    pub input_consumed: bool,
}

pub struct Mcu {
    pub pc: u16,
    last_op: u8,

    variant: Variant,
    profile: Profile,

    cycles: u64,
    instructions: u64,
    oscillator_hz: u32,

    pub(crate) mem: Memory,
    pub(crate) breaks: Breakpoints,

    /// Internal-RAM base of the active register bank, recomputed from the
    /// PSW bank-select bits after every instruction. An instruction that
    /// flips the bank bits keeps the old bank for its own register accesses.
    bank_base: u8,

    /// SFR addresses the DPTR alias currently resolves to. Dual-DPTR parts
    /// retarget this to DP1L/DP1H when AUXR1.DPS is set.
    dptr_addrs: (u8, u8),

    /// Optional bit address that drives the EA pin level, sampled before
    /// every instruction.
    pub ea_connect: Option<u8>,

    err: ErrorKind,
    max_sp: u8,

    pub auto_read: bool,
    pub auto_write: bool,

    wdt_armed: bool,
    wdt_counter: u16,
}

impl Mcu {
    pub fn new(variant: Variant) -> Self {
        let profile = variant.profile();
        let mut mcu = Mcu {
            pc: 0,
            last_op: 0,
            variant,
            profile,
            cycles: 0,
            instructions: 0,
            oscillator_hz: DEFAULT_OSCILLATOR_HZ,
            mem: Memory::new(&profile),
            breaks: Breakpoints::new(),
            bank_base: 0,
            dptr_addrs: (SFR_DPL, SFR_DPH),
            ea_connect: None,
            err: ErrorKind::NoError,
            max_sp: 0x07,
            auto_read: true,
            auto_write: true,
            wdt_armed: false,
            wdt_counter: 0,
        };
        mcu.reset();
        mcu
    }

    /// Soft reset: clears registers, ports, counters and usage statistics,
    /// preserves loaded code and breakpoints.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.cycles = 0;
        self.instructions = 0;
        self.err = ErrorKind::NoError;
        self.bank_base = 0;
        self.dptr_addrs = (SFR_DPL, SFR_DPH);
        self.max_sp = 0x07;
        self.wdt_armed = false;
        self.wdt_counter = 0;

        self.mem.reset();
        self.mem.sfr_raw_set(SFR_P0, 0xFF);
        self.mem.sfr_raw_set(SFR_P1, 0xFF);
        self.mem.sfr_raw_set(SFR_P2, 0xFF);
        self.mem.sfr_raw_set(SFR_P3, 0xFF);
        self.mem.sfr_raw_set(SFR_SP, 0x07);
    }

    /// Execute exactly one instruction plus the timer/interrupt/breakpoint
    /// bookkeeping that runs in lock-step with it.
    ///
    /// `input` is a byte offered to the UART receiver; it is consumed only
    /// when the receiver is enabled and idle (see [`Step::input_consumed`]).
    pub fn step(&mut self, input: Option<u8>) -> Step {
        self.err = ErrorKind::NoError;
        self.mem.clear_fault();

        if let Some(conn) = self.ea_connect {
            self.mem.ea = self.mem.peek_bit(conn);
        }

        let op = self.mem.read_code(self.pc);
        self.last_op = op;
        self.instructions += 1;
        self.cycles += ops::OPCODES[op as usize].cycles as u64;

        if !ops::execute(self, op) {
            self.err = ErrorKind::UnsupportedOpcode;
            self.pc = self.pc.wrapping_add(1);
        }

        self.pc = (self.pc as u32 % self.profile.pc_wrap()) as u16;
        self.mem.note_pc_fetch(self.pc);
        self.mem.update_changed();

        self.max_sp = self.max_sp.max(self.sp());

        // P tracks the accumulator continuously: set for an odd bit count.
        let odd = self.acc().count_ones() % 2 == 1;
        self.flag_set(PSW_P, odd);

        // Bank recompute is deliberately post-instruction.
        self.bank_base = ((self.flag(PSW_RS1) as u8) << 1 | self.flag(PSW_RS0) as u8) * 8;

        timer::tick(self);
        interrupt::check(self);
        self.run_extension();

        if self.err == ErrorKind::NoError {
            self.err = self.mem.fault();
        }

        let mut output = None;
        if self.auto_read && self.mem.uart_out_pending() && !self.reg_bit(SFR_SCON, SCON_TI) {
            output = self.mem.take_uart_out();
            self.set_reg_bit(SFR_SCON, SCON_TI, true);
        }

        let mut input_consumed = false;
        if self.auto_write
            && self.reg_bit(SFR_SCON, SCON_REN)
            && !self.reg_bit(SFR_SCON, SCON_RI)
        {
            if let Some(byte) = input {
                self.mem.sfr_raw_set(SFR_SBUF, byte);
                self.set_reg_bit(SFR_SCON, SCON_RI, true);
                input_consumed = true;
            }
        }

        let halted = breakpoint::should_halt(&self.breaks, &self.mem, self.pc);

        Step {
            halted,
            output,
            input_consumed,
        }
    }

    fn run_extension(&mut self) {
        if self.profile.extension != Some(Extension::S5x) {
            return;
        }

        self.dptr_addrs = if self.mem.sfr_raw(SFR_AUXR1) & (1 << AUXR1_DPS) != 0 {
            (SFR_DP1L, SFR_DP1H)
        } else {
            (SFR_DPL, SFR_DPH)
        };

        // WDTRST arming sequence: 0x1E followed by 0xE1.
        if self.mem.accessed(Space::Sfr) == Some(SFR_WDTRST as u16)
            && self.mem.sfr_before() == 0x1E
            && self.mem.sfr_raw(SFR_WDTRST) == 0xE1
        {
            self.wdt_armed = true;
            self.wdt_counter = 0;
        }

        if self.wdt_armed {
            self.wdt_counter = self
                .wdt_counter
                .wrapping_add(ops::OPCODES[self.last_op as usize].cycles as u16);
            if self.wdt_counter > 0x3FFF {
                self.reset();
            }
        }
    }

    // Register and flag access used by the execution engine and exposed to
    // the debugger. Implicit-operand registers go through the raw SFR window
    // so the per-instruction access trackers only ever reflect addresses the
    // program named explicitly.

    pub fn acc(&self) -> u8 {
        self.mem.sfr_raw(SFR_ACC)
    }

    pub fn acc_set(&mut self, value: u8) {
        self.mem.sfr_raw_set(SFR_ACC, value);
    }

    pub fn b(&self) -> u8 {
        self.mem.sfr_raw(SFR_B)
    }

    pub fn b_set(&mut self, value: u8) {
        self.mem.sfr_raw_set(SFR_B, value);
    }

    pub fn psw(&self) -> u8 {
        self.mem.sfr_raw(SFR_PSW)
    }

    pub fn psw_set(&mut self, value: u8) {
        self.mem.sfr_raw_set(SFR_PSW, value);
    }

    pub fn sp(&self) -> u8 {
        self.mem.sfr_raw(SFR_SP)
    }

    pub fn sp_set(&mut self, value: u8) {
        self.mem.sfr_raw_set(SFR_SP, value);
    }

    pub fn dptr(&self) -> u16 {
        let (lo, hi) = self.dptr_addrs;
        (self.mem.sfr_raw(hi) as u16) << 8 | self.mem.sfr_raw(lo) as u16
    }

    pub fn dptr_set(&mut self, value: u16) {
        let (lo, hi) = self.dptr_addrs;
        self.mem.sfr_raw_set(hi, (value >> 8) as u8);
        self.mem.sfr_raw_set(lo, (value & 0xFF) as u8);
    }

    pub(crate) fn dpl_set(&mut self, value: u8) {
        self.mem.sfr_raw_set(self.dptr_addrs.0, value);
    }

    pub(crate) fn dph_set(&mut self, value: u8) {
        self.mem.sfr_raw_set(self.dptr_addrs.1, value);
    }

    pub fn port(&self, n: u8) -> u8 {
        let addr = match n {
            0 => SFR_P0,
            1 => SFR_P1,
            2 => SFR_P2,
            _ => SFR_P3,
        };
        self.mem.sfr_raw(addr)
    }

    pub fn flag(&self, bit: u8) -> bool {
        self.psw() & (1 << bit) != 0
    }

    pub fn flag_set(&mut self, bit: u8, value: bool) {
        let psw = self.psw();
        self.psw_set(if value { psw | 1 << bit } else { psw & !(1 << bit) });
    }

    /// Working register Rn of the bank that was active when the current
    /// instruction started.
    pub fn r(&self, n: u8) -> u8 {
        self.mem.peek(Space::Idata, (self.bank_base + n) as u16)
    }

    pub fn r_set(&mut self, n: u8, value: u8) {
        self.mem.poke(Space::Idata, (self.bank_base + n) as u16, value);
    }

    pub(crate) fn reg_bit(&self, sfr: u8, bit: u8) -> bool {
        self.mem.sfr_raw(sfr) & (1 << bit) != 0
    }

    pub(crate) fn set_reg_bit(&mut self, sfr: u8, bit: u8, value: bool) {
        let byte = self.mem.sfr_raw(sfr);
        let byte = if value {
            byte | 1 << bit
        } else {
            byte & !(1 << bit)
        };
        self.mem.sfr_raw_set(sfr, byte);
    }

    // Stack, through tracked indirect internal-RAM accesses.

    pub(crate) fn push(&mut self, value: u8) {
        let sp = self.sp().wrapping_add(1);
        self.sp_set(sp);
        self.mem
            .write(Space::Idata, sp as u16, value, AddrMode::Indirect);
    }

    pub(crate) fn push16(&mut self, value: u16) {
        self.push((value & 0xFF) as u8);
        self.push((value >> 8) as u8);
    }

    pub(crate) fn pop(&mut self) -> u8 {
        let sp = self.sp();
        let value = self.mem.read(Space::Idata, sp as u16, AddrMode::Indirect);
        self.sp_set(sp.wrapping_sub(1));
        value
    }

    pub(crate) fn pop16(&mut self) -> u16 {
        let hi = self.pop();
        let lo = self.pop();
        (hi as u16) << 8 | lo as u16
    }

    // Introspection.

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn last_error(&self) -> ErrorKind {
        self.err
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    pub fn oscillator_hz(&self) -> u32 {
        self.oscillator_hz
    }

    pub fn set_oscillator_hz(&mut self, hz: u32) {
        assert!(hz > 0, "oscillator frequency must be non-zero");
        self.oscillator_hz = hz;
    }

    /// Emulated wall-clock run time in seconds: one machine cycle is twelve
    /// oscillator periods.
    pub fn run_time(&self) -> f64 {
        self.cycles as f64 / (self.oscillator_hz as f64 / 12.0)
    }

    pub fn max_sp(&self) -> u8 {
        self.max_sp
    }

    pub fn stats(&self) -> &UsageStats {
        self.mem.stats()
    }

    pub fn ea(&self) -> bool {
        self.mem.ea
    }

    pub fn set_ea(&mut self, level: bool) {
        self.mem.ea = level;
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breaks
    }

    pub fn breakpoints_mut(&mut self) -> &mut Breakpoints {
        &mut self.breaks
    }

    pub(crate) fn last_op_cycles(&self) -> u8 {
        ops::OPCODES[self.last_op as usize].cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Space;

    fn mcu_with(variant: Variant, code: &[u8]) -> Mcu {
        let mut m = Mcu::new(variant);
        m.memory_mut().load(Space::Irom, 0, code);
        m
    }

    #[test]
    fn sbuf_write_surfaces_as_uart_output_and_sets_ti() {
        let mut m = mcu_with(Variant::M8052, &[0x75, 0x99, 0x41, 0x00]); // mov sbuf,#41h
        let step = m.step(None);
        assert_eq!(step.output, Some(0x41));
        assert!(m.reg_bit(SFR_SCON, SCON_TI));
        let step = m.step(None);
        assert_eq!(step.output, None);
    }

    #[test]
    fn pending_output_waits_until_ti_clears() {
        let mut m = mcu_with(Variant::M8052, &[0x75, 0x99, 0x41, 0x00, 0x00]);
        m.set_reg_bit(SFR_SCON, SCON_TI, true);
        let step = m.step(None);
        assert_eq!(step.output, None, "transmit flag still set");
        m.set_reg_bit(SFR_SCON, SCON_TI, false);
        let step = m.step(None);
        assert_eq!(step.output, Some(0x41));
    }

    #[test]
    fn uart_input_needs_receive_enable() {
        let mut m = mcu_with(Variant::M8052, &[0x00, 0x00, 0x00]);
        let step = m.step(Some(0x55));
        assert!(!step.input_consumed);

        m.set_reg_bit(SFR_SCON, SCON_REN, true);
        let step = m.step(Some(0x55));
        assert!(step.input_consumed);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_SBUF as u16), 0x55);
        assert!(m.reg_bit(SFR_SCON, SCON_RI));

        // A second byte is refused until the program clears RI.
        let step = m.step(Some(0x66));
        assert!(!step.input_consumed);
    }

    #[test]
    fn auto_io_gates_disable_the_exchange() {
        let mut m = mcu_with(Variant::M8052, &[0x75, 0x99, 0x41, 0x00]);
        m.auto_read = false;
        let step = m.step(None);
        assert_eq!(step.output, None);

        m.auto_write = false;
        m.set_reg_bit(SFR_SCON, SCON_REN, true);
        let step = m.step(Some(0x55));
        assert!(!step.input_consumed);
    }

    #[test]
    fn parity_tracks_the_accumulator() {
        let mut m = mcu_with(Variant::M8052, &[0x74, 0x01, 0x74, 0x03]);
        m.step(None);
        assert!(m.flag(PSW_P), "one bit set is odd parity");
        m.step(None);
        assert!(!m.flag(PSW_P), "two bits set is even parity");
    }

    #[test]
    fn run_time_derives_from_cycles_and_oscillator() {
        let mut m = mcu_with(Variant::M8052, &[0x00, 0x00]);
        m.set_oscillator_hz(12_000_000);
        m.step(None);
        m.step(None);
        assert_eq!(m.cycles(), 2);
        assert_eq!(m.instructions(), 2);
        assert!((m.run_time() - 2e-6).abs() < 1e-12);
    }

    #[test]
    fn reset_preserves_code_and_breakpoints() {
        let mut m = mcu_with(Variant::M8052, &[0x74, 0x42, 0x00]);
        m.breakpoints_mut().add_pc(0x0100);
        m.step(None);
        m.step(None);
        m.reset();
        assert_eq!(m.pc, 0);
        assert_eq!(m.cycles(), 0);
        assert_eq!(m.instructions(), 0);
        assert_eq!(m.sp(), 0x07);
        assert_eq!(m.port(0), 0xFF);
        assert_eq!(m.acc(), 0x00);
        assert_eq!(m.memory().peek(Space::Irom, 0), 0x74, "code survives");
        assert_eq!(m.breakpoints().pc_breakpoints(), &[0x0100]);
    }

    #[test]
    fn dual_dptr_parts_retarget_the_alias() {
        let mut m = mcu_with(
            Variant::M89S52,
            &[
                0x90, 0x11, 0x22, // mov dptr,#1122h (DP0)
                0x75, SFR_AUXR1, 0x01, // mov auxr1,#01h -> select DP1
                0x90, 0x33, 0x44, // mov dptr,#3344h (DP1)
            ],
        );
        m.step(None);
        m.step(None);
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_DPH as u16), 0x11);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_DPL as u16), 0x22);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_DP1H as u16), 0x33);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_DP1L as u16), 0x44);
        assert_eq!(m.dptr(), 0x3344);
    }

    #[test]
    fn plain_8052_ignores_auxr1() {
        let mut m = mcu_with(
            Variant::M8052,
            &[0x75, SFR_AUXR1, 0x01, 0x90, 0x33, 0x44],
        );
        m.step(None);
        m.step(None);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_DPH as u16), 0x33);
        assert_eq!(m.memory().peek(Space::Sfr, SFR_DP1H as u16), 0x00);
    }

    #[test]
    fn watchdog_times_out_after_the_arming_sequence() {
        let code = [
            0x75, SFR_WDTRST, 0x1E, // mov wdtrst,#1Eh
            0x75, SFR_WDTRST, 0xE1, // mov wdtrst,#0E1h
        ];
        let mut m = mcu_with(Variant::M89S51, &code);
        let total = 0x4010;
        for _ in 0..total {
            m.step(None);
        }
        assert!(
            m.instructions() < total,
            "watchdog reset should have cleared the instruction counter"
        );

        // The same sequence on a part without a watchdog free-runs.
        let mut m = mcu_with(Variant::M8052, &code);
        for _ in 0..total {
            m.step(None);
        }
        assert_eq!(m.instructions(), total);
    }

    #[test]
    fn ea_connect_samples_a_register_bit() {
        let mut m = mcu_with(Variant::M8052, &[0x00]);
        m.memory_mut().load(Space::Xrom, 0, &[0x74, 0x55]); // mov a,#55h
        m.ea_connect = Some(0x00); // idata 0x20 bit 0, currently clear
        m.step(None);
        assert!(!m.ea());
        assert_eq!(m.acc(), 0x55, "fetch went to external code");
    }

    #[test]
    fn usage_statistics_accumulate() {
        let mut m = mcu_with(
            Variant::M8052,
            &[
                0x75, 0x60, 0x01, // mov 60h,#01h
                0x75, 0x10, 0x02, // mov 10h,#02h
                0xC0, 0x60, // push 60h
            ],
        );
        m.step(None);
        m.step(None);
        m.step(None);
        let stats = m.stats();
        assert_eq!(stats.min_idata, Some(0x08), "stack slot below the data writes");
        assert_eq!(stats.max_idata, Some(0x60));
        assert_eq!(m.max_sp(), 0x08);
        assert_eq!(m.memory().last_changed(Space::Idata), Some(0x08));
    }
}

