//! SFR (special-function register) addresses and register bit positions for
//! the MCS-51 family.

/// Base address of the SFR window: 0x80
pub const SFR_BASE: u8 = 0x80;
/// Port 0 register: 8-bit bidirectional I/O port
pub const SFR_P0: u8 = 0x80;
/// Stack pointer register: points to the top of the stack in internal RAM
pub const SFR_SP: u8 = 0x81;
/// Data pointer low byte: low byte of the 16-bit data pointer (DPTR)
pub const SFR_DPL: u8 = 0x82;
/// Data pointer high byte: high byte of the 16-bit data pointer (DPTR)
pub const SFR_DPH: u8 = 0x83;
/// Second data pointer low byte (89S5x only)
pub const SFR_DP1L: u8 = 0x84;
/// Second data pointer high byte (89S5x only)
pub const SFR_DP1H: u8 = 0x85;
/// Power control register: controls power management features
pub const SFR_PCON: u8 = 0x87;
/// Timer/counter control register: controls timer 0 and timer 1 operation
pub const SFR_TCON: u8 = 0x88;
/// Timer/counter mode register: sets operating modes for timer 0 and timer 1
pub const SFR_TMOD: u8 = 0x89;
/// Timer 0 low byte
pub const SFR_TL0: u8 = 0x8A;
/// Timer 1 low byte
pub const SFR_TL1: u8 = 0x8B;
/// Timer 0 high byte
pub const SFR_TH0: u8 = 0x8C;
/// Timer 1 high byte
pub const SFR_TH1: u8 = 0x8D;
/// Auxiliary register (89S5x only)
pub const SFR_AUXR: u8 = 0x8E;
/// Port 1 register: 8-bit bidirectional I/O port
pub const SFR_P1: u8 = 0x90;
/// Serial control register: controls serial port operation
pub const SFR_SCON: u8 = 0x98;
/// Serial buffer register: holds data for serial transmission/reception
pub const SFR_SBUF: u8 = 0x99;
/// Port 2 register: 8-bit bidirectional I/O port
pub const SFR_P2: u8 = 0xA0;
/// Auxiliary register 1, holds the DPS data-pointer select bit (89S5x only)
pub const SFR_AUXR1: u8 = 0xA2;
/// Watchdog reset register: accepts the 0x1E/0xE1 arming sequence (89S5x only)
pub const SFR_WDTRST: u8 = 0xA6;
/// Interrupt enable register: enables/disables individual interrupt sources
pub const SFR_IE: u8 = 0xA8;
/// Port 3 register: 8-bit bidirectional I/O port, carries INT0/INT1/T0/T1 pins
pub const SFR_P3: u8 = 0xB0;
/// Interrupt priority register
pub const SFR_IP: u8 = 0xB8;
/// Timer 2 control register (8052-class only)
pub const SFR_T2CON: u8 = 0xC8;
/// Timer 2 mode register (8052-class only)
pub const SFR_T2MOD: u8 = 0xC9;
/// Timer 2 capture/reload low byte (8052-class only)
pub const SFR_RCAP2L: u8 = 0xCA;
/// Timer 2 capture/reload high byte (8052-class only)
pub const SFR_RCAP2H: u8 = 0xCB;
/// Timer 2 low byte (8052-class only)
pub const SFR_TL2: u8 = 0xCC;
/// Timer 2 high byte (8052-class only)
pub const SFR_TH2: u8 = 0xCD;
/// Program status word: contains processor status flags
pub const SFR_PSW: u8 = 0xD0;
/// Accumulator register: primary working register for arithmetic operations
pub const SFR_ACC: u8 = 0xE0;
/// B register: secondary working register used in multiplication/division
pub const SFR_B: u8 = 0xF0;

/// Carry flag: indicates carry from/to the most significant bit
pub const PSW_C: u8 = 7;
/// Auxiliary carry flag: indicates carry out of bit 3
pub const PSW_AC: u8 = 6;
/// User-defined flag 0
pub const PSW_F0: u8 = 5;
/// Register bank select 1
pub const PSW_RS1: u8 = 4;
/// Register bank select 0
pub const PSW_RS0: u8 = 3;
/// Overflow flag: signed overflow out of the most significant bit
pub const PSW_OV: u8 = 2;
/// Parity flag: set when the accumulator holds an odd number of ones
pub const PSW_P: u8 = 0;

// TCON bits
pub const TCON_TF1: u8 = 7;
pub const TCON_TR1: u8 = 6;
pub const TCON_TF0: u8 = 5;
pub const TCON_TR0: u8 = 4;
pub const TCON_IE1: u8 = 3;
pub const TCON_IT1: u8 = 2;
pub const TCON_IE0: u8 = 1;
pub const TCON_IT0: u8 = 0;

// TMOD bits
pub const TMOD_GATE1: u8 = 7;
pub const TMOD_CT1: u8 = 6;
pub const TMOD_GATE0: u8 = 3;
pub const TMOD_CT0: u8 = 2;

// IE bits
pub const IE_EA: u8 = 7;
pub const IE_ET2: u8 = 5;
pub const IE_ES: u8 = 4;
pub const IE_ET1: u8 = 3;
pub const IE_EX1: u8 = 2;
pub const IE_ET0: u8 = 1;
pub const IE_EX0: u8 = 0;

// SCON bits
pub const SCON_SM0: u8 = 7;
pub const SCON_SM1: u8 = 6;
pub const SCON_SM2: u8 = 5;
pub const SCON_REN: u8 = 4;
pub const SCON_TB8: u8 = 3;
pub const SCON_RB8: u8 = 2;
pub const SCON_TI: u8 = 1;
pub const SCON_RI: u8 = 0;

// T2CON bits
pub const T2CON_TF2: u8 = 7;
pub const T2CON_EXF2: u8 = 6;
pub const T2CON_RCLK: u8 = 5;
pub const T2CON_TCLK: u8 = 4;
pub const T2CON_EXEN2: u8 = 3;
pub const T2CON_TR2: u8 = 2;
pub const T2CON_CT2: u8 = 1;
pub const T2CON_CPRL2: u8 = 0;

// P3 pin functions
pub const P3_RD: u8 = 7;
pub const P3_WR: u8 = 6;
pub const P3_T1: u8 = 5;
pub const P3_T0: u8 = 4;
pub const P3_INT1: u8 = 3;
pub const P3_INT0: u8 = 2;
pub const P3_TXD: u8 = 1;
pub const P3_RXD: u8 = 0;

/// Data-pointer select bit in AUXR1 (89S5x only)
pub const AUXR1_DPS: u8 = 0;
