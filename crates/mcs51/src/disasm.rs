//! Format-string-driven disassembler.
//!
//! Two independent mini-languages render one instruction:
//!
//! * The **operand pattern** stored per opcode in [`OPCODES`]: literal text
//!   plus `%1`/`%2` placeholders for the first/second operand byte. The
//!   character immediately before a placeholder qualifies it and is consumed
//!   by the substitution: `O` renders a signed branch displacement as the
//!   absolute target address, `0` renders a bit address through the bit-name
//!   table, `N` renders a raw two-digit hex byte, and anything else leaves
//!   the placeholder to the SFR-name table.
//!
//! * The **line format** supplied by the caller: `%a` address, `%m`
//!   mnemonic, `%o` opcode bytes, `%p` rendered operands, with `\n`, `\t`,
//!   octal `\NNN` and hex `\xHH` escapes. Other characters copy through.

use std::borrow::Cow;

use crate::cpu::Mcu;
use crate::ops::OPCODES;

/// Line format used when the caller has not configured one.
pub const DEFAULT_FORMAT: &str = "%a: %o %m  %p\\n";

/// Render the operand pattern of the instruction at `ip`.
pub fn operand_text(mcu: &Mcu, ip: u16) -> String {
    let op = mcu.memory().peek_code(ip);
    let desc = &OPCODES[op as usize];

    let mut out = String::new();
    let mut prev: Option<char> = None;
    let mut chars = desc.pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '%' {
            if let Some(&digit @ ('1' | '2')) = chars.peek() {
                chars.next();
                let offset = if digit == '1' { 1 } else { 2 };
                let operand = mcu.memory().peek_code(ip.wrapping_add(offset));
                match prev {
                    Some('O') => {
                        // The qualifier is already in the output; the
                        // substitution replaces it.
                        out.pop();
                        let target = ip
                            .wrapping_add(desc.len as u16)
                            .wrapping_add(operand as i8 as u16);
                        out.push_str(&format!("{target:04X}h"));
                    }
                    Some('0') => {
                        out.pop();
                        out.push_str(&bit_name(operand));
                    }
                    Some('N') => {
                        out.pop();
                        out.push_str(&format!("{operand:02X}"));
                    }
                    _ => out.push_str(&direct_name(operand)),
                }
                prev = Some(digit);
                continue;
            }
        }
        out.push(c);
        prev = Some(c);
    }

    out
}

/// Render one instruction through the caller's line format. Returns the text
/// and the address of the following instruction.
pub fn line(mcu: &Mcu, ip: u16, format: &str) -> (String, u16) {
    let op = mcu.memory().peek_code(ip);
    let desc = &OPCODES[op as usize];

    let mut out = String::new();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '%' => match chars.next() {
                Some('a') => out.push_str(&format!("{ip:04X}")),
                Some('m') => out.push_str(&format!("{:<5}", desc.mnemonic)),
                Some('o') => {
                    // Up to three space-separated opcode bytes, blank-padded
                    // so columns line up for shorter instructions.
                    for j in 0..3 {
                        if j < desc.len as u16 {
                            let byte = mcu.memory().peek_code(ip.wrapping_add(j));
                            out.push_str(&format!("{byte:02X} "));
                        } else {
                            out.push_str("   ");
                        }
                    }
                    out.pop();
                }
                Some('p') => out.push_str(&format!("{:<20}", operand_text(mcu, ip))),
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
                None => out.push('%'),
            },
            '\\' => match chars.peek() {
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                Some('x') => {
                    chars.next();
                    let mut value = 0u32;
                    let mut digits = 0;
                    while digits < 2 {
                        match chars.peek().and_then(|c| c.to_digit(16)) {
                            Some(d) => {
                                chars.next();
                                value = value << 4 | d;
                                digits += 1;
                            }
                            None => break,
                        }
                    }
                    out.push((value & 0xFF) as u8 as char);
                }
                Some(o) if o.is_digit(8) => {
                    let mut value = 0u32;
                    let mut digits = 0;
                    while digits < 3 {
                        match chars.peek().and_then(|c| c.to_digit(8)) {
                            Some(d) => {
                                chars.next();
                                value = value << 3 | d;
                                digits += 1;
                            }
                            None => break,
                        }
                    }
                    out.push((value & 0xFF) as u8 as char);
                }
                _ => out.push('\\'),
            },
            c => out.push(c),
        }
    }

    (out, ip.wrapping_add(desc.len as u16))
}

/// Render a run of instructions starting at `start`, stopping at the
/// instruction limit or, when `stop_at_zero_padding` is set, once the
/// address passes the highest non-zero code byte (trailing zero fill is
/// taken to mean "no more code"). Returns the text and the next address.
pub fn disassemble_range(
    mcu: &Mcu,
    start: u16,
    format: &str,
    instruction_limit: usize,
    stop_at_zero_padding: bool,
) -> (String, u16) {
    let end = if stop_at_zero_padding {
        mcu.memory().highest_code_addr()
    } else {
        None
    };

    let mut out = String::new();
    let mut ip = start;
    for _ in 0..instruction_limit {
        if let Some(end) = end {
            if ip > end {
                break;
            }
        }
        let (text, next) = line(mcu, ip, format);
        out.push_str(&text);
        ip = next;
    }

    (out, ip)
}

/// Name of a direct (byte) address as the disassembler prints it. Unnamed
/// SFRs and plain RAM addresses fall back to the `XXh` form.
pub fn direct_name(addr: u8) -> Cow<'static, str> {
    let name = match addr {
        0x80 => "P0",
        0x81 => "SP",
        0x82 => "DPL",
        0x83 => "DPH",
        0x87 => "PCON",
        0x88 => "TCON",
        0x89 => "TMOD",
        0x8A => "TL0",
        0x8B => "TL1",
        0x8C => "TH0",
        0x8D => "TH1",
        0x90 => "P1",
        0x98 => "SCON",
        0x99 => "SBUF",
        0xA0 => "P2",
        0xA8 => "IE",
        0xB0 => "P3",
        0xB8 => "IP",
        0xC8 => "T2CON",
        0xC9 => "T2MOD",
        0xCA => "RCAP2L",
        0xCB => "RCAP2H",
        0xCC => "TL2",
        0xCD => "TH2",
        0xD0 => "PSW",
        0xE0 => "ACC",
        0xF0 => "B",
        _ => return Cow::Owned(format!("{addr:02X}h")),
    };
    Cow::Borrowed(name)
}

/// Name of a bit address. Bits of named control registers print as their
/// datasheet names; everything else falls back to the `XXh.n` form.
pub fn bit_name(bit: u8) -> Cow<'static, str> {
    let pos = (bit & 0x07) as usize;
    if bit < 0x80 {
        return Cow::Owned(format!("{:02X}h.{}", 0x20 + (bit >> 3), pos));
    }

    let base = bit & 0xF8;
    let named: Option<[&'static str; 8]> = match base {
        0x88 => Some(["IT0", "IE0", "IT1", "IE1", "TR0", "TF0", "TR1", "TF1"]),
        0x98 => Some(["RI", "TI", "RB8", "TB8", "REN", "SM2", "SM1", "SM0"]),
        0xA8 => Some(["EX0", "ET0", "EX1", "ET1", "ES", "ET2", "IE.6", "EA"]),
        0xB0 => Some(["RXD", "TXD", "INT0", "INT1", "T0", "T1", "WR", "RD"]),
        0xB8 => Some(["PX0", "PT0", "PX1", "PT1", "PS", "PT2", "IP.6", "IP.7"]),
        0xC8 => Some([
            "CPRL2", "CT2", "TR2", "EXEN2", "TCLK", "RCLK", "EXF2", "TF2",
        ]),
        0xD0 => Some(["P", "PSW.1", "OV", "RS0", "RS1", "F0", "AC", "CY"]),
        _ => None,
    };

    if let Some(names) = named {
        return Cow::Borrowed(names[pos]);
    }
    match base {
        0x80 => Cow::Owned(format!("P0.{pos}")),
        0x90 => Cow::Owned(format!("P1.{pos}")),
        0xA0 => Cow::Owned(format!("P2.{pos}")),
        0xE0 => Cow::Owned(format!("ACC.{pos}")),
        0xF0 => Cow::Owned(format!("B.{pos}")),
        _ => Cow::Owned(format!("{base:02X}h.{pos}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Space;
    use crate::{Mcu, Variant};

    fn mcu_with(code: &[u8]) -> Mcu {
        let mut m = Mcu::new(Variant::M8052);
        m.memory_mut().load(Space::Irom, 0, code);
        m
    }

    #[test]
    fn immediate_operands_render_through_the_name_table() {
        let m = mcu_with(&[0x24, 0x05]); // add a,#05h
        assert_eq!(operand_text(&m, 0), "A, #05h");
        let (text, next) = line(&m, 0, DEFAULT_FORMAT);
        assert!(text.starts_with("0000: 24 05    add"), "{text:?}");
        assert!(text.contains("A, #05"), "{text:?}");
        assert!(text.ends_with('\n'));
        assert_eq!(next, 2);
    }

    #[test]
    fn branch_targets_render_as_absolute_addresses() {
        let mut m = mcu_with(&[]);
        m.memory_mut().load(Space::Irom, 0x0100, &[0x80, 0xFE]); // sjmp -2
        assert_eq!(operand_text(&m, 0x0100), "0100h");

        // cjne a,#10h,+4 at 0: target 0 + 3 + 4 = 7
        let m = mcu_with(&[0xB4, 0x10, 0x04]);
        assert_eq!(operand_text(&m, 0), "A, #10h, 0007h");
    }

    #[test]
    fn bit_operands_use_the_bit_name_table() {
        let m = mcu_with(&[0x20, 0xE0, 0x05]); // jb acc.0,+5
        assert_eq!(operand_text(&m, 0), "ACC.0, 0008h");

        let m = mcu_with(&[0xD2, 0x63]); // setb 63h -> 2Ch.3
        assert_eq!(operand_text(&m, 0), "2Ch.3");

        let m = mcu_with(&[0xD2, 0x8F]); // setb tf1
        assert_eq!(operand_text(&m, 0), "TF1");
    }

    #[test]
    fn raw_operands_skip_symbol_substitution() {
        let m = mcu_with(&[0x02, 0x12, 0x34]); // ljmp 1234h
        assert_eq!(operand_text(&m, 0), "1234");

        let m = mcu_with(&[0x90, 0xAB, 0xCD]); // mov dptr,#0ABCDh
        assert_eq!(operand_text(&m, 0), "DPTR, #ABCD");

        let m = mcu_with(&[0xA1, 0x42]); // ajmp into page 5
        assert_eq!(operand_text(&m, 0), "0542");
    }

    #[test]
    fn direct_operands_fall_back_to_hex_names() {
        let m = mcu_with(&[0xE5, 0x85]); // mov a,85h (unnamed sfr)
        assert_eq!(operand_text(&m, 0), "A, 85h");

        let m = mcu_with(&[0xE5, 0xE0]); // mov a,acc
        assert_eq!(operand_text(&m, 0), "A, ACC");

        let m = mcu_with(&[0xE5, 0x30]);
        assert_eq!(operand_text(&m, 0), "A, 30h");
    }

    #[test]
    fn opcode_bytes_column_pads_short_instructions() {
        let m = mcu_with(&[0x00]);
        let (text, _) = line(&m, 0, "%o");
        assert_eq!(text, "00      ");

        let m = mcu_with(&[0x02, 0x12, 0x34]);
        let (text, _) = line(&m, 0, "%o");
        assert_eq!(text, "02 12 34");
    }

    #[test]
    fn format_escapes_cover_octal_and_hex() {
        let m = mcu_with(&[0x00]);
        let (text, _) = line(&m, 0, "\\x41\\102\\t\\n");
        assert_eq!(text, "AB\t\n");
        let (text, _) = line(&m, 0, "a\\qb");
        assert_eq!(text, "a\\qb", "unknown escapes copy the backslash");
    }

    #[test]
    fn operand_column_is_padded_to_twenty() {
        let m = mcu_with(&[0x00]);
        let (text, _) = line(&m, 0, "%p|");
        assert_eq!(text, format!("{:<20}|", ""));
    }

    #[test]
    fn range_honors_the_instruction_limit() {
        let m = mcu_with(&[0x74, 0x01, 0x74, 0x02, 0x74, 0x03]);
        let (text, next) = disassemble_range(&m, 0, "%a\\n", 2, false);
        assert_eq!(text, "0000\n0002\n");
        assert_eq!(next, 4);
    }

    #[test]
    fn range_stops_at_trailing_zero_padding() {
        let m = mcu_with(&[0x74, 0x01, 0x74, 0x02]);
        let (text, next) = disassemble_range(&m, 0, "%a\\n", 1000, true);
        assert_eq!(text, "0000\n0002\n");
        assert_eq!(next, 4);
    }
}
