//! Per-chip-type configuration.
//!
//! The supported family members differ only in a handful of orthogonal
//! toggles (memory sizes, Timer2, the 89S5x dual data pointer and watchdog),
//! so each [`Variant`] resolves to a plain [`Profile`] value at construction
//! time instead of a type hierarchy.

use std::fmt;

pub const MAX_XDATA_SIZE: u32 = 0x10000;
pub const MAX_ROM_SIZE: u32 = 0x10000;

/// Default oscillator frequency: the classic 11.0592 MHz UART crystal.
pub const DEFAULT_OSCILLATOR_HZ: u32 = 11_059_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    M8031,
    M8051,
    M8052,
    M8032,
    M89S51,
    M89S52,
}

impl Variant {
    pub fn profile(self) -> Profile {
        let profile = match self {
            Variant::M8031 => Profile {
                idata_size: 0x100,
                irom_size: 0,
                ..Profile::base()
            },
            Variant::M8051 => Profile {
                idata_size: 0x80,
                irom_size: 0x1000,
                ..Profile::base()
            },
            Variant::M8052 => Profile {
                irom_size: 0x2000,
                has_timer2: true,
                ..Profile::base()
            },
            Variant::M8032 => Profile {
                irom_size: 0,
                has_timer2: true,
                ..Profile::base()
            },
            Variant::M89S51 => Profile {
                irom_size: 0x1000,
                extension: Some(Extension::S5x),
                ..Profile::base()
            },
            Variant::M89S52 => Profile {
                irom_size: 0x2000,
                has_timer2: true,
                extension: Some(Extension::S5x),
                ..Profile::base()
            },
        };
        profile.validate();
        profile
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::M8031 => "8031",
            Variant::M8051 => "8051",
            Variant::M8052 => "8052",
            Variant::M8032 => "8032",
            Variant::M89S51 => "89S51",
            Variant::M89S52 => "89S52",
        };
        f.write_str(name)
    }
}

/// Behavior that runs as a hook after every instruction on parts that have
/// it. Resolved once from the [`Variant`], never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// 89S5x dual-DPTR selection and watchdog timeout reset.
    S5x,
}

/// Resolved per-variant configuration.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    /// Internal data RAM size in bytes (0x80 or 0x100).
    pub idata_size: u32,
    /// External data RAM size in bytes.
    pub xdata_size: u32,
    /// Internal code memory size in bytes. Zero on ROM-less parts.
    pub irom_size: u32,
    /// External code memory size in bytes.
    pub xrom_size: u32,
    /// Whether Timer2 and its interrupt exist.
    pub has_timer2: bool,
    /// Post-instruction hook, if the part has one.
    pub extension: Option<Extension>,
}

impl Profile {
    fn base() -> Self {
        Profile {
            idata_size: 0x100,
            xdata_size: MAX_XDATA_SIZE,
            irom_size: 0x1000,
            xrom_size: MAX_ROM_SIZE,
            has_timer2: false,
            extension: None,
        }
    }

    /// A profile with no code memory or no internal RAM cannot execute
    /// anything; that is a configuration bug, not a runtime condition.
    fn validate(&self) {
        assert!(self.idata_size > 0, "internal RAM size must be non-zero");
        assert!(self.xdata_size > 0, "external RAM size must be non-zero");
        assert!(
            self.irom_size > 0 || self.xrom_size > 0,
            "at least one code space must be non-zero"
        );
    }

    /// The modulus applied to PC after every instruction.
    pub fn pc_wrap(&self) -> u32 {
        self.irom_size.max(self.xrom_size)
    }

    pub fn has_dual_dptr(&self) -> bool {
        matches!(self.extension, Some(Extension::S5x))
    }

    pub fn has_watchdog(&self) -> bool {
        matches!(self.extension, Some(Extension::S5x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_resolve() {
        let p = Variant::M8052.profile();
        assert_eq!(p.idata_size, 0x100);
        assert_eq!(p.irom_size, 0x2000);
        assert!(p.has_timer2);
        assert!(p.extension.is_none());

        let p = Variant::M8051.profile();
        assert_eq!(p.idata_size, 0x80);
        assert!(!p.has_timer2);

        let p = Variant::M8031.profile();
        assert_eq!(p.irom_size, 0);
        assert_eq!(p.pc_wrap(), MAX_ROM_SIZE);

        let p = Variant::M89S52.profile();
        assert!(p.has_dual_dptr());
        assert!(p.has_watchdog());
        assert!(p.has_timer2);
    }
}
