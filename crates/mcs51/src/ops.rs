//! The 256-opcode execution engine and the shared per-opcode metadata.
//!
//! [`OPCODES`] maps every opcode byte to its length, base cycle count,
//! mnemonic and operand pattern; the same table drives both execution and
//! the disassembler. Dispatch is a single `match`: an opcode with no arm of
//! its own (0xA5) reports itself as unsupported instead of executing.
//!
//! Every routine advances PC itself, including on branch-taken paths; there
//! is no implicit "PC += length" wrapper around the dispatcher.

use crate::cpu::Mcu;
use crate::memory::{AddrMode, Space};
use crate::sfr::{PSW_AC, PSW_C, PSW_OV};

/// Static description of one opcode. One entry per possible opcode byte,
/// with a reserved sentinel for the hole at 0xA5.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// Instruction length in bytes (1-3).
    pub len: u8,
    /// Base machine-cycle cost.
    pub cycles: u8,
    /// Lower-case mnemonic, unpadded.
    pub mnemonic: &'static str,
    /// Operand pattern in the renderer's mini-language (see `disasm`).
    pub pattern: &'static str,
}

const fn d(len: u8, cycles: u8, mnemonic: &'static str, pattern: &'static str) -> Descriptor {
    Descriptor {
        len,
        cycles,
        mnemonic,
        pattern,
    }
}

/// Mnemonic used for the reserved opcode.
pub const RESERVED_MNEMONIC: &str = "RESVD";

pub static OPCODES: [Descriptor; 256] = [
    // 0x00
    d(1, 1, "nop", ""),
    d(2, 2, "ajmp", "00N%1"),
    d(3, 2, "ljmp", "N%1N%2"),
    d(1, 1, "rr", "A"),
    d(1, 1, "inc", "A"),
    d(2, 1, "inc", "%1"),
    d(1, 1, "inc", "@R0"),
    d(1, 1, "inc", "@R1"),
    d(1, 1, "inc", "R0"),
    d(1, 1, "inc", "R1"),
    d(1, 1, "inc", "R2"),
    d(1, 1, "inc", "R3"),
    d(1, 1, "inc", "R4"),
    d(1, 1, "inc", "R5"),
    d(1, 1, "inc", "R6"),
    d(1, 1, "inc", "R7"),
    // 0x10
    d(3, 2, "jbc", "0%1, O%2"),
    d(2, 2, "acall", "00N%1"),
    d(3, 2, "lcall", "N%1N%2"),
    d(1, 1, "rrc", "A"),
    d(1, 1, "dec", "A"),
    d(2, 1, "dec", "%1"),
    d(1, 1, "dec", "@R0"),
    d(1, 1, "dec", "@R1"),
    d(1, 1, "dec", "R0"),
    d(1, 1, "dec", "R1"),
    d(1, 1, "dec", "R2"),
    d(1, 1, "dec", "R3"),
    d(1, 1, "dec", "R4"),
    d(1, 1, "dec", "R5"),
    d(1, 1, "dec", "R6"),
    d(1, 1, "dec", "R7"),
    // 0x20
    d(3, 2, "jb", "0%1, O%2"),
    d(2, 2, "ajmp", "01N%1"),
    d(1, 2, "ret", ""),
    d(1, 1, "rl", "A"),
    d(2, 1, "add", "A, #%1"),
    d(2, 1, "add", "A, %1"),
    d(1, 1, "add", "A, @R0"),
    d(1, 1, "add", "A, @R1"),
    d(1, 1, "add", "A, R0"),
    d(1, 1, "add", "A, R1"),
    d(1, 1, "add", "A, R2"),
    d(1, 1, "add", "A, R3"),
    d(1, 1, "add", "A, R4"),
    d(1, 1, "add", "A, R5"),
    d(1, 1, "add", "A, R6"),
    d(1, 1, "add", "A, R7"),
    // 0x30
    d(3, 2, "jnb", "0%1, O%2"),
    d(2, 2, "acall", "01N%1"),
    d(1, 2, "reti", ""),
    d(1, 1, "rlc", "A"),
    d(2, 1, "addc", "A, #%1"),
    d(2, 1, "addc", "A, %1"),
    d(1, 1, "addc", "A, @R0"),
    d(1, 1, "addc", "A, @R1"),
    d(1, 1, "addc", "A, R0"),
    d(1, 1, "addc", "A, R1"),
    d(1, 1, "addc", "A, R2"),
    d(1, 1, "addc", "A, R3"),
    d(1, 1, "addc", "A, R4"),
    d(1, 1, "addc", "A, R5"),
    d(1, 1, "addc", "A, R6"),
    d(1, 1, "addc", "A, R7"),
    // 0x40
    d(2, 2, "jc", "O%1"),
    d(2, 2, "ajmp", "02N%1"),
    d(2, 1, "orl", "%1, A"),
    d(3, 2, "orl", "%1, #%2"),
    d(2, 1, "orl", "A, #%1"),
    d(2, 1, "orl", "A, %1"),
    d(1, 1, "orl", "A, @R0"),
    d(1, 1, "orl", "A, @R1"),
    d(1, 1, "orl", "A, R0"),
    d(1, 1, "orl", "A, R1"),
    d(1, 1, "orl", "A, R2"),
    d(1, 1, "orl", "A, R3"),
    d(1, 1, "orl", "A, R4"),
    d(1, 1, "orl", "A, R5"),
    d(1, 1, "orl", "A, R6"),
    d(1, 1, "orl", "A, R7"),
    // 0x50
    d(2, 2, "jnc", "O%1"),
    d(2, 2, "acall", "02N%1"),
    d(2, 1, "anl", "%1, A"),
    d(3, 2, "anl", "%1, #%2"),
    d(2, 1, "anl", "A, #%1"),
    d(2, 1, "anl", "A, %1"),
    d(1, 1, "anl", "A, @R0"),
    d(1, 1, "anl", "A, @R1"),
    d(1, 1, "anl", "A, R0"),
    d(1, 1, "anl", "A, R1"),
    d(1, 1, "anl", "A, R2"),
    d(1, 1, "anl", "A, R3"),
    d(1, 1, "anl", "A, R4"),
    d(1, 1, "anl", "A, R5"),
    d(1, 1, "anl", "A, R6"),
    d(1, 1, "anl", "A, R7"),
    // 0x60
    d(2, 2, "jz", "O%1"),
    d(2, 2, "ajmp", "03N%1"),
    d(2, 1, "xrl", "%1, A"),
    d(3, 2, "xrl", "%1, #%2"),
    d(2, 1, "xrl", "A, #%1"),
    d(2, 1, "xrl", "A, %1"),
    d(1, 1, "xrl", "A, @R0"),
    d(1, 1, "xrl", "A, @R1"),
    d(1, 1, "xrl", "A, R0"),
    d(1, 1, "xrl", "A, R1"),
    d(1, 1, "xrl", "A, R2"),
    d(1, 1, "xrl", "A, R3"),
    d(1, 1, "xrl", "A, R4"),
    d(1, 1, "xrl", "A, R5"),
    d(1, 1, "xrl", "A, R6"),
    d(1, 1, "xrl", "A, R7"),
    // 0x70
    d(2, 2, "jnz", "O%1"),
    d(2, 2, "acall", "03N%1"),
    d(2, 2, "orl", "C, 0%1"),
    d(1, 2, "jmp", "@A+DPTR"),
    d(2, 1, "mov", "A, #%1"),
    d(3, 2, "mov", "%1, #%2"),
    d(2, 1, "mov", "@R0, #%1"),
    d(2, 1, "mov", "@R1, #%1"),
    d(2, 1, "mov", "R0, #%1"),
    d(2, 1, "mov", "R1, #%1"),
    d(2, 1, "mov", "R2, #%1"),
    d(2, 1, "mov", "R3, #%1"),
    d(2, 1, "mov", "R4, #%1"),
    d(2, 1, "mov", "R5, #%1"),
    d(2, 1, "mov", "R6, #%1"),
    d(2, 1, "mov", "R7, #%1"),
    // 0x80
    d(2, 2, "sjmp", "O%1"),
    d(2, 2, "ajmp", "04N%1"),
    d(2, 2, "anl", "C, 0%1"),
    d(1, 2, "movc", "A, @A+PC"),
    d(1, 4, "div", "AB"),
    d(3, 2, "mov", "%2, %1"),
    d(2, 2, "mov", "%1, @R0"),
    d(2, 2, "mov", "%1, @R1"),
    d(2, 2, "mov", "%1, R0"),
    d(2, 2, "mov", "%1, R1"),
    d(2, 2, "mov", "%1, R2"),
    d(2, 2, "mov", "%1, R3"),
    d(2, 2, "mov", "%1, R4"),
    d(2, 2, "mov", "%1, R5"),
    d(2, 2, "mov", "%1, R6"),
    d(2, 2, "mov", "%1, R7"),
    // 0x90
    d(3, 2, "mov", "DPTR, #N%1N%2"),
    d(2, 2, "acall", "04N%1"),
    d(2, 2, "mov", "0%1, C"),
    d(1, 2, "movc", "A, @A+DPTR"),
    d(2, 1, "subb", "A, #%1"),
    d(2, 1, "subb", "A, %1"),
    d(1, 1, "subb", "A, @R0"),
    d(1, 1, "subb", "A, @R1"),
    d(1, 1, "subb", "A, R0"),
    d(1, 1, "subb", "A, R1"),
    d(1, 1, "subb", "A, R2"),
    d(1, 1, "subb", "A, R3"),
    d(1, 1, "subb", "A, R4"),
    d(1, 1, "subb", "A, R5"),
    d(1, 1, "subb", "A, R6"),
    d(1, 1, "subb", "A, R7"),
    // 0xA0
    d(2, 2, "orl", "C, /0%1"),
    d(2, 2, "ajmp", "05N%1"),
    d(2, 1, "mov", "C, 0%1"),
    d(1, 2, "inc", "DPTR"),
    d(1, 4, "mul", "AB"),
    d(1, 1, RESERVED_MNEMONIC, ""),
    d(2, 2, "mov", "@R0, %1"),
    d(2, 2, "mov", "@R1, %1"),
    d(2, 2, "mov", "R0, %1"),
    d(2, 2, "mov", "R1, %1"),
    d(2, 2, "mov", "R2, %1"),
    d(2, 2, "mov", "R3, %1"),
    d(2, 2, "mov", "R4, %1"),
    d(2, 2, "mov", "R5, %1"),
    d(2, 2, "mov", "R6, %1"),
    d(2, 2, "mov", "R7, %1"),
    // 0xB0
    d(2, 2, "anl", "C, /0%1"),
    d(2, 2, "acall", "05N%1"),
    d(2, 1, "cpl", "0%1"),
    d(1, 1, "cpl", "C"),
    d(3, 2, "cjne", "A, #%1, O%2"),
    d(3, 2, "cjne", "A, %1, O%2"),
    d(3, 2, "cjne", "@R0, #%1, O%2"),
    d(3, 2, "cjne", "@R1, #%1, O%2"),
    d(3, 2, "cjne", "R0, #%1, O%2"),
    d(3, 2, "cjne", "R1, #%1, O%2"),
    d(3, 2, "cjne", "R2, #%1, O%2"),
    d(3, 2, "cjne", "R3, #%1, O%2"),
    d(3, 2, "cjne", "R4, #%1, O%2"),
    d(3, 2, "cjne", "R5, #%1, O%2"),
    d(3, 2, "cjne", "R6, #%1, O%2"),
    d(3, 2, "cjne", "R7, #%1, O%2"),
    // 0xC0
    d(2, 2, "push", "%1"),
    d(2, 2, "ajmp", "06N%1"),
    d(2, 1, "clr", "0%1"),
    d(1, 1, "clr", "C"),
    d(1, 1, "swap", "A"),
    d(2, 1, "xch", "A, %1"),
    d(1, 1, "xch", "A, @R0"),
    d(1, 1, "xch", "A, @R1"),
    d(1, 1, "xch", "A, R0"),
    d(1, 1, "xch", "A, R1"),
    d(1, 1, "xch", "A, R2"),
    d(1, 1, "xch", "A, R3"),
    d(1, 1, "xch", "A, R4"),
    d(1, 1, "xch", "A, R5"),
    d(1, 1, "xch", "A, R6"),
    d(1, 1, "xch", "A, R7"),
    // 0xD0
    d(2, 2, "pop", "%1"),
    d(2, 2, "acall", "06N%1"),
    d(2, 1, "setb", "0%1"),
    d(1, 1, "setb", "C"),
    d(1, 1, "da", "A"),
    d(3, 2, "djnz", "%1, O%2"),
    d(1, 1, "xchd", "A, @R0"),
    d(1, 1, "xchd", "A, @R1"),
    d(2, 2, "djnz", "R0, O%1"),
    d(2, 2, "djnz", "R1, O%1"),
    d(2, 2, "djnz", "R2, O%1"),
    d(2, 2, "djnz", "R3, O%1"),
    d(2, 2, "djnz", "R4, O%1"),
    d(2, 2, "djnz", "R5, O%1"),
    d(2, 2, "djnz", "R6, O%1"),
    d(2, 2, "djnz", "R7, O%1"),
    // 0xE0
    d(1, 2, "movx", "A, @DPTR"),
    d(2, 2, "ajmp", "07N%1"),
    d(1, 2, "movx", "A, @R0"),
    d(1, 2, "movx", "A, @R1"),
    d(1, 1, "clr", "A"),
    d(2, 1, "mov", "A, %1"),
    d(1, 1, "mov", "A, @R0"),
    d(1, 1, "mov", "A, @R1"),
    d(1, 1, "mov", "A, R0"),
    d(1, 1, "mov", "A, R1"),
    d(1, 1, "mov", "A, R2"),
    d(1, 1, "mov", "A, R3"),
    d(1, 1, "mov", "A, R4"),
    d(1, 1, "mov", "A, R5"),
    d(1, 1, "mov", "A, R6"),
    d(1, 1, "mov", "A, R7"),
    // 0xF0
    d(1, 2, "movx", "@DPTR, A"),
    d(2, 2, "acall", "07N%1"),
    d(1, 2, "movx", "@R0, A"),
    d(1, 2, "movx", "@R1, A"),
    d(1, 1, "cpl", "A"),
    d(2, 1, "mov", "%1, A"),
    d(1, 1, "mov", "@R0, A"),
    d(1, 1, "mov", "@R1, A"),
    d(1, 1, "mov", "R0, A"),
    d(1, 1, "mov", "R1, A"),
    d(1, 1, "mov", "R2, A"),
    d(1, 1, "mov", "R3, A"),
    d(1, 1, "mov", "R4, A"),
    d(1, 1, "mov", "R5, A"),
    d(1, 1, "mov", "R6, A"),
    d(1, 1, "mov", "R7, A"),
];

fn code(m: &mut Mcu, addr: u16) -> u8 {
    m.mem.read_code(addr)
}

fn data(m: &mut Mcu, addr: u8) -> u8 {
    m.mem.read(Space::Idata, addr as u16, AddrMode::Direct)
}

fn data_set(m: &mut Mcu, addr: u8, value: u8) {
    m.mem.write(Space::Idata, addr as u16, value, AddrMode::Direct);
}

fn idata(m: &mut Mcu, addr: u8) -> u8 {
    m.mem.read(Space::Idata, addr as u16, AddrMode::Indirect)
}

fn idata_set(m: &mut Mcu, addr: u8, value: u8) {
    m.mem.write(Space::Idata, addr as u16, value, AddrMode::Indirect);
}

fn xdata(m: &mut Mcu, addr: u16) -> u8 {
    m.mem.read(Space::Xdata, addr, AddrMode::Indirect)
}

fn xdata_set(m: &mut Mcu, addr: u16, value: u8) {
    m.mem.write(Space::Xdata, addr, value, AddrMode::Indirect);
}

/// Branch target of a relative jump: displacement is signed and counted
/// from the address after the full instruction.
fn rel_target(op_addr: u16, len: u8, displacement: u8) -> u16 {
    op_addr
        .wrapping_add(len as u16)
        .wrapping_add(displacement as i8 as u16)
}

#[inline(always)]
fn add_with_carry(m: &mut Mcu, b: u8, carry_in: bool) {
    let a = m.acc();
    let c = carry_in as u16;
    let ac = (a & 0x0F) as u16 + (b & 0x0F) as u16 + c > 0x0F;
    // Signed overflow is carry-out-of-bit-6 XOR carry-out-of-bit-7.
    let c6 = (a & 0x7F) as u16 + (b & 0x7F) as u16 + c > 0x7F;
    let sum = a as u16 + b as u16 + c;
    let carry = sum > 0xFF;
    m.acc_set(sum as u8);
    m.flag_set(PSW_C, carry);
    m.flag_set(PSW_AC, ac);
    m.flag_set(PSW_OV, c6 != carry);
}

#[inline(always)]
fn sub_with_borrow(m: &mut Mcu, b: u8) {
    let a = m.acc();
    let c = m.flag(PSW_C) as u16;
    let ac = ((a & 0x0F) as u16) < (b & 0x0F) as u16 + c;
    let c6 = ((a & 0x7F) as u16) < (b & 0x7F) as u16 + c;
    let borrow = (a as u16) < b as u16 + c;
    let diff = (a as u16).wrapping_sub(b as u16).wrapping_sub(c);
    m.acc_set(diff as u8);
    m.flag_set(PSW_C, borrow);
    m.flag_set(PSW_AC, ac);
    m.flag_set(PSW_OV, c6 != borrow);
}

fn decimal_adjust(m: &mut Mcu) {
    let mut a = m.acc() as u16;
    let mut carry = m.flag(PSW_C);
    if (a & 0x0F) > 0x09 || m.flag(PSW_AC) {
        a += 0x06;
        if a > 0xFF {
            a &= 0xFF;
            carry = true;
        }
    }
    if carry || (a & 0xF0) > 0x90 {
        a += 0x60;
        if a > 0xFF {
            carry = true;
        }
    }
    m.acc_set(a as u8);
    m.flag_set(PSW_C, carry);
}

/// Unsigned compare for CJNE: carry means left < right.
fn cjne_flags(m: &mut Mcu, left: u8, right: u8) {
    m.flag_set(PSW_C, left < right);
}

/// Execute the instruction `op` fetched at the current PC. Returns `false`
/// when the opcode has no semantics (the caller latches the error and skips
/// the byte).
pub(crate) fn execute(m: &mut Mcu, op: u8) -> bool {
    let pc = m.pc;
    let n = op & 0x07;

    match op {
        0x00 => m.pc = pc.wrapping_add(1),

        // Absolute jumps and calls within a 2KB page: the page literal is
        // encoded in the opcode's top three bits.
        0x01 | 0x21 | 0x41 | 0x61 | 0x81 | 0xA1 | 0xC1 | 0xE1 => {
            let low = code(m, pc.wrapping_add(1));
            m.pc = ((op as u16) >> 5) << 8 | low as u16;
        }
        0x11 | 0x31 | 0x51 | 0x71 | 0x91 | 0xB1 | 0xD1 | 0xF1 => {
            let ret = pc.wrapping_add(2);
            let low = code(m, pc.wrapping_add(1));
            m.pc = ((op as u16) >> 5) << 8 | low as u16;
            m.push16(ret);
        }

        0x02 => {
            let hi = code(m, pc.wrapping_add(1));
            let lo = code(m, pc.wrapping_add(2));
            m.pc = (hi as u16) << 8 | lo as u16;
        }
        0x12 => {
            let ret = pc.wrapping_add(3);
            let hi = code(m, pc.wrapping_add(1));
            let lo = code(m, pc.wrapping_add(2));
            m.pc = (hi as u16) << 8 | lo as u16;
            m.push16(ret);
        }
        0x22 | 0x32 => m.pc = m.pop16(),
        0x73 => m.pc = m.dptr().wrapping_add(m.acc() as u16),
        0x80 => {
            let off = code(m, pc.wrapping_add(1));
            m.pc = rel_target(pc, 2, off);
        }

        // Conditional relative branches.
        0x40 | 0x50 | 0x60 | 0x70 => {
            let off = code(m, pc.wrapping_add(1));
            let taken = match op {
                0x40 => m.flag(PSW_C),
                0x50 => !m.flag(PSW_C),
                0x60 => m.acc() == 0,
                _ => m.acc() != 0,
            };
            m.pc = if taken {
                rel_target(pc, 2, off)
            } else {
                pc.wrapping_add(2)
            };
        }
        0x10 | 0x20 | 0x30 => {
            let bit = code(m, pc.wrapping_add(1));
            let off = code(m, pc.wrapping_add(2));
            let set = m.mem.check_bit(bit);
            let taken = match op {
                0x30 => !set,
                _ => set,
            };
            if taken && op == 0x10 {
                m.mem.set_bit(bit, false);
            }
            m.pc = if taken {
                rel_target(pc, 3, off)
            } else {
                pc.wrapping_add(3)
            };
        }

        0xD5 => {
            let addr = code(m, pc.wrapping_add(1));
            let off = code(m, pc.wrapping_add(2));
            let value = data(m, addr).wrapping_sub(1);
            data_set(m, addr, value);
            m.pc = if value != 0 {
                rel_target(pc, 3, off)
            } else {
                pc.wrapping_add(3)
            };
        }
        0xD8..=0xDF => {
            let off = code(m, pc.wrapping_add(1));
            let value = m.r(n).wrapping_sub(1);
            m.r_set(n, value);
            m.pc = if value != 0 {
                rel_target(pc, 2, off)
            } else {
                pc.wrapping_add(2)
            };
        }

        0xB4 | 0xB5 => {
            let operand = code(m, pc.wrapping_add(1));
            let off = code(m, pc.wrapping_add(2));
            let right = if op == 0xB4 {
                operand
            } else {
                data(m, operand)
            };
            let left = m.acc();
            cjne_flags(m, left, right);
            m.pc = if left != right {
                rel_target(pc, 3, off)
            } else {
                pc.wrapping_add(3)
            };
        }
        0xB6 | 0xB7 => {
            let right = code(m, pc.wrapping_add(1));
            let off = code(m, pc.wrapping_add(2));
            let ptr = m.r(op & 0x01);
            let left = idata(m, ptr);
            cjne_flags(m, left, right);
            m.pc = if left != right {
                rel_target(pc, 3, off)
            } else {
                pc.wrapping_add(3)
            };
        }
        0xB8..=0xBF => {
            let right = code(m, pc.wrapping_add(1));
            let off = code(m, pc.wrapping_add(2));
            let left = m.r(n);
            cjne_flags(m, left, right);
            m.pc = if left != right {
                rel_target(pc, 3, off)
            } else {
                pc.wrapping_add(3)
            };
        }

        // DPTR, MOVX and MOVC.
        0x90 => {
            let hi = code(m, pc.wrapping_add(1));
            let lo = code(m, pc.wrapping_add(2));
            m.dph_set(hi);
            m.dpl_set(lo);
            m.pc = pc.wrapping_add(3);
        }
        0xA3 => {
            let dptr = m.dptr().wrapping_add(1);
            m.dptr_set(dptr);
            m.pc = pc.wrapping_add(1);
        }
        0xE0 => {
            let addr = m.dptr();
            let value = xdata(m, addr);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }
        0xF0 => {
            let addr = m.dptr();
            let value = m.acc();
            xdata_set(m, addr, value);
            m.pc = pc.wrapping_add(1);
        }
        0xE2 | 0xE3 => {
            let addr = m.r(op & 0x01) as u16;
            let value = xdata(m, addr);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }
        0xF2 | 0xF3 => {
            let addr = m.r(op & 0x01) as u16;
            let value = m.acc();
            xdata_set(m, addr, value);
            m.pc = pc.wrapping_add(1);
        }
        0x93 => {
            let addr = m.dptr().wrapping_add(m.acc() as u16);
            let value = code(m, addr);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }
        0x83 => {
            let addr = pc.wrapping_add(1).wrapping_add(m.acc() as u16);
            let value = code(m, addr);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }

        // Accumulator arithmetic.
        0xE4 => {
            m.acc_set(0);
            m.pc = pc.wrapping_add(1);
        }
        0x04 => {
            let value = m.acc().wrapping_add(1);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }
        0x05 => {
            let addr = code(m, pc.wrapping_add(1));
            let value = data(m, addr).wrapping_add(1);
            data_set(m, addr, value);
            m.pc = pc.wrapping_add(2);
        }
        0x06 | 0x07 => {
            let ptr = m.r(op & 0x01);
            let value = idata(m, ptr).wrapping_add(1);
            idata_set(m, ptr, value);
            m.pc = pc.wrapping_add(1);
        }
        0x08..=0x0F => {
            let value = m.r(n).wrapping_add(1);
            m.r_set(n, value);
            m.pc = pc.wrapping_add(1);
        }
        0x14 => {
            let value = m.acc().wrapping_sub(1);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }
        0x15 => {
            let addr = code(m, pc.wrapping_add(1));
            let value = data(m, addr).wrapping_sub(1);
            data_set(m, addr, value);
            m.pc = pc.wrapping_add(2);
        }
        0x16 | 0x17 => {
            let ptr = m.r(op & 0x01);
            let value = idata(m, ptr).wrapping_sub(1);
            idata_set(m, ptr, value);
            m.pc = pc.wrapping_add(1);
        }
        0x18..=0x1F => {
            let value = m.r(n).wrapping_sub(1);
            m.r_set(n, value);
            m.pc = pc.wrapping_add(1);
        }

        0xF4 => {
            let value = !m.acc();
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }
        0xA4 => {
            let product = m.acc() as u16 * m.b() as u16;
            m.acc_set(product as u8);
            m.b_set((product >> 8) as u8);
            m.flag_set(PSW_C, false);
            m.flag_set(PSW_OV, product > 0xFF);
            m.pc = pc.wrapping_add(1);
        }
        0x84 => {
            m.flag_set(PSW_C, false);
            let b = m.b();
            if b != 0 {
                let a = m.acc();
                m.acc_set(a / b);
                m.b_set(a % b);
                m.flag_set(PSW_OV, false);
            } else {
                m.flag_set(PSW_OV, true);
            }
            m.pc = pc.wrapping_add(1);
        }

        0x24 | 0x34 => {
            let imm = code(m, pc.wrapping_add(1));
            let carry = op == 0x34 && m.flag(PSW_C);
            add_with_carry(m, imm, carry);
            m.pc = pc.wrapping_add(2);
        }
        0x25 | 0x35 => {
            let addr = code(m, pc.wrapping_add(1));
            let value = data(m, addr);
            let carry = op == 0x35 && m.flag(PSW_C);
            add_with_carry(m, value, carry);
            m.pc = pc.wrapping_add(2);
        }
        0x26 | 0x27 | 0x36 | 0x37 => {
            let ptr = m.r(op & 0x01);
            let value = idata(m, ptr);
            let carry = op & 0x10 != 0 && m.flag(PSW_C);
            add_with_carry(m, value, carry);
            m.pc = pc.wrapping_add(1);
        }
        0x28..=0x2F => {
            let value = m.r(n);
            add_with_carry(m, value, false);
            m.pc = pc.wrapping_add(1);
        }
        0x38..=0x3F => {
            let value = m.r(n);
            let carry = m.flag(PSW_C);
            add_with_carry(m, value, carry);
            m.pc = pc.wrapping_add(1);
        }

        0x94 => {
            let imm = code(m, pc.wrapping_add(1));
            sub_with_borrow(m, imm);
            m.pc = pc.wrapping_add(2);
        }
        0x95 => {
            let addr = code(m, pc.wrapping_add(1));
            let value = data(m, addr);
            sub_with_borrow(m, value);
            m.pc = pc.wrapping_add(2);
        }
        0x96 | 0x97 => {
            let ptr = m.r(op & 0x01);
            let value = idata(m, ptr);
            sub_with_borrow(m, value);
            m.pc = pc.wrapping_add(1);
        }
        0x98..=0x9F => {
            let value = m.r(n);
            sub_with_borrow(m, value);
            m.pc = pc.wrapping_add(1);
        }

        0x33 => {
            let a = m.acc();
            let carry = m.flag(PSW_C);
            m.acc_set(a << 1 | carry as u8);
            m.flag_set(PSW_C, a & 0x80 != 0);
            m.pc = pc.wrapping_add(1);
        }
        0x13 => {
            let a = m.acc();
            let carry = m.flag(PSW_C);
            m.acc_set(a >> 1 | (carry as u8) << 7);
            m.flag_set(PSW_C, a & 0x01 != 0);
            m.pc = pc.wrapping_add(1);
        }
        0x23 => {
            let a = m.acc();
            m.acc_set(a << 1 | a >> 7);
            m.pc = pc.wrapping_add(1);
        }
        0x03 => {
            let a = m.acc();
            m.acc_set(a >> 1 | a << 7);
            m.pc = pc.wrapping_add(1);
        }

        // Logic groups. The direct-destination forms are read-modify-write
        // on the direct address.
        0x42 | 0x52 | 0x62 => {
            let addr = code(m, pc.wrapping_add(1));
            let value = logic(op, data(m, addr), m.acc());
            data_set(m, addr, value);
            m.pc = pc.wrapping_add(2);
        }
        0x43 | 0x53 | 0x63 => {
            let addr = code(m, pc.wrapping_add(1));
            let imm = code(m, pc.wrapping_add(2));
            let value = logic(op, data(m, addr), imm);
            data_set(m, addr, value);
            m.pc = pc.wrapping_add(3);
        }
        0x44 | 0x54 | 0x64 => {
            let imm = code(m, pc.wrapping_add(1));
            let value = logic(op, m.acc(), imm);
            m.acc_set(value);
            m.pc = pc.wrapping_add(2);
        }
        0x45 | 0x55 | 0x65 => {
            let addr = code(m, pc.wrapping_add(1));
            let operand = data(m, addr);
            let value = logic(op, m.acc(), operand);
            m.acc_set(value);
            m.pc = pc.wrapping_add(2);
        }
        0x46 | 0x47 | 0x56 | 0x57 | 0x66 | 0x67 => {
            let ptr = m.r(op & 0x01);
            let operand = idata(m, ptr);
            let value = logic(op, m.acc(), operand);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }
        0x48..=0x4F | 0x58..=0x5F | 0x68..=0x6F => {
            let operand = m.r(n);
            let value = logic(op, m.acc(), operand);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }

        0xD4 => {
            decimal_adjust(m);
            m.pc = pc.wrapping_add(1);
        }

        // MOV families.
        0x74 => {
            let imm = code(m, pc.wrapping_add(1));
            m.acc_set(imm);
            m.pc = pc.wrapping_add(2);
        }
        0x75 => {
            let addr = code(m, pc.wrapping_add(1));
            let imm = code(m, pc.wrapping_add(2));
            data_set(m, addr, imm);
            m.pc = pc.wrapping_add(3);
        }
        0x76 | 0x77 => {
            let imm = code(m, pc.wrapping_add(1));
            let ptr = m.r(op & 0x01);
            idata_set(m, ptr, imm);
            m.pc = pc.wrapping_add(2);
        }
        0x78..=0x7F => {
            let imm = code(m, pc.wrapping_add(1));
            m.r_set(n, imm);
            m.pc = pc.wrapping_add(2);
        }
        0x85 => {
            // Encoding order is source first, destination second.
            let src = code(m, pc.wrapping_add(1));
            let dst = code(m, pc.wrapping_add(2));
            let value = data(m, src);
            data_set(m, dst, value);
            m.pc = pc.wrapping_add(3);
        }
        0x86 | 0x87 => {
            let addr = code(m, pc.wrapping_add(1));
            let ptr = m.r(op & 0x01);
            let value = idata(m, ptr);
            data_set(m, addr, value);
            m.pc = pc.wrapping_add(2);
        }
        0x88..=0x8F => {
            let addr = code(m, pc.wrapping_add(1));
            let value = m.r(n);
            data_set(m, addr, value);
            m.pc = pc.wrapping_add(2);
        }
        0xA6 | 0xA7 => {
            let addr = code(m, pc.wrapping_add(1));
            let value = data(m, addr);
            let ptr = m.r(op & 0x01);
            idata_set(m, ptr, value);
            m.pc = pc.wrapping_add(2);
        }
        0xA8..=0xAF => {
            let addr = code(m, pc.wrapping_add(1));
            let value = data(m, addr);
            m.r_set(n, value);
            m.pc = pc.wrapping_add(2);
        }
        0xE5 => {
            let addr = code(m, pc.wrapping_add(1));
            let value = data(m, addr);
            m.acc_set(value);
            m.pc = pc.wrapping_add(2);
        }
        0xF5 => {
            let addr = code(m, pc.wrapping_add(1));
            let value = m.acc();
            data_set(m, addr, value);
            m.pc = pc.wrapping_add(2);
        }
        0xE6 | 0xE7 => {
            let ptr = m.r(op & 0x01);
            let value = idata(m, ptr);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }
        0xF6 | 0xF7 => {
            let ptr = m.r(op & 0x01);
            let value = m.acc();
            idata_set(m, ptr, value);
            m.pc = pc.wrapping_add(1);
        }
        0xE8..=0xEF => {
            let value = m.r(n);
            m.acc_set(value);
            m.pc = pc.wrapping_add(1);
        }
        0xF8..=0xFF => {
            let value = m.acc();
            m.r_set(n, value);
            m.pc = pc.wrapping_add(1);
        }

        // Stack. SP moves before the direct operand is read (PUSH) and is
        // re-read for the decrement (POP), so pushing or popping SP itself
        // behaves like the hardware.
        0xC0 => {
            let addr = code(m, pc.wrapping_add(1));
            let sp = m.sp().wrapping_add(1);
            m.sp_set(sp);
            let value = data(m, addr);
            m.mem
                .write(Space::Idata, sp as u16, value, AddrMode::Indirect);
            m.pc = pc.wrapping_add(2);
        }
        0xD0 => {
            let addr = code(m, pc.wrapping_add(1));
            let sp = m.sp();
            let value = m.mem.read(Space::Idata, sp as u16, AddrMode::Indirect);
            data_set(m, addr, value);
            let sp = m.sp().wrapping_sub(1);
            m.sp_set(sp);
            m.pc = pc.wrapping_add(2);
        }

        // Carry and bit operations.
        0xC3 => {
            m.flag_set(PSW_C, false);
            m.pc = pc.wrapping_add(1);
        }
        0xD3 => {
            m.flag_set(PSW_C, true);
            m.pc = pc.wrapping_add(1);
        }
        0xB3 => {
            let carry = m.flag(PSW_C);
            m.flag_set(PSW_C, !carry);
            m.pc = pc.wrapping_add(1);
        }
        0xC2 | 0xD2 => {
            let bit = code(m, pc.wrapping_add(1));
            m.mem.set_bit(bit, op == 0xD2);
            m.pc = pc.wrapping_add(2);
        }
        0xB2 => {
            let bit = code(m, pc.wrapping_add(1));
            let value = m.mem.check_bit(bit);
            m.mem.set_bit(bit, !value);
            m.pc = pc.wrapping_add(2);
        }
        0xA2 => {
            let bit = code(m, pc.wrapping_add(1));
            let value = m.mem.check_bit(bit);
            m.flag_set(PSW_C, value);
            m.pc = pc.wrapping_add(2);
        }
        0x92 => {
            let bit = code(m, pc.wrapping_add(1));
            let carry = m.flag(PSW_C);
            m.mem.set_bit(bit, carry);
            m.pc = pc.wrapping_add(2);
        }
        0x72 | 0xA0 => {
            let bit = code(m, pc.wrapping_add(1));
            let value = m.mem.check_bit(bit) ^ (op == 0xA0);
            let carry = m.flag(PSW_C) | value;
            m.flag_set(PSW_C, carry);
            m.pc = pc.wrapping_add(2);
        }
        0x82 | 0xB0 => {
            let bit = code(m, pc.wrapping_add(1));
            let value = m.mem.check_bit(bit) ^ (op == 0xB0);
            let carry = m.flag(PSW_C) & value;
            m.flag_set(PSW_C, carry);
            m.pc = pc.wrapping_add(2);
        }

        // Exchange.
        0xC4 => {
            let a = m.acc();
            m.acc_set(a << 4 | a >> 4);
            m.pc = pc.wrapping_add(1);
        }
        0xC5 => {
            let addr = code(m, pc.wrapping_add(1));
            let value = data(m, addr);
            let a = m.acc();
            m.acc_set(value);
            data_set(m, addr, a);
            m.pc = pc.wrapping_add(2);
        }
        0xC6 | 0xC7 => {
            let ptr = m.r(op & 0x01);
            let value = idata(m, ptr);
            let a = m.acc();
            m.acc_set(value);
            idata_set(m, ptr, a);
            m.pc = pc.wrapping_add(1);
        }
        0xC8..=0xCF => {
            let value = m.r(n);
            let a = m.acc();
            m.acc_set(value);
            m.r_set(n, a);
            m.pc = pc.wrapping_add(1);
        }
        0xD6 | 0xD7 => {
            let ptr = m.r(op & 0x01);
            let value = idata(m, ptr);
            let a = m.acc();
            m.acc_set(a & 0xF0 | value & 0x0F);
            idata_set(m, ptr, value & 0xF0 | a & 0x0F);
            m.pc = pc.wrapping_add(1);
        }

        0xA5 => return false,
    }

    true
}

/// ORL/ANL/XRL selected by bits 4-5 of the opcode.
fn logic(op: u8, a: u8, b: u8) -> u8 {
    match op & 0x30 {
        0x00 => a | b,
        0x10 => a & b,
        _ => a ^ b,
    }
}
