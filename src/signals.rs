//! AXI4-Lite signal bundle as seen from the manager side of the bus.

use log::warn;

/// Width of the data bus in bits. Fixed, not configurable per transaction.
pub const DATA_WIDTH: u32 = 32;

/// Byte strobe with every lane enabled.
pub const STROBE_ALL: u8 = (1 << (DATA_WIDTH / 8)) - 1;

/// Address channel (AW or AR).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressChannel {
    pub addr: u32,
    pub valid: bool,
    pub ready: bool,
}

/// Write data channel (W).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteDataChannel {
    pub data: u32,
    pub strb: u8,
    pub valid: bool,
    pub ready: bool,
}

/// Write response channel (B).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteResponseChannel {
    pub resp: u8,
    pub valid: bool,
    pub ready: bool,
}

/// Read data channel (R).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadDataChannel {
    pub data: u32,
    pub resp: u8,
    pub valid: bool,
    pub ready: bool,
}

/// The five AXI4-Lite channels.
///
/// The manager drives `addr`/`data`/`strb`/`valid` on AW, W and AR plus
/// `ready` on B and R. Everything else is written back by the DUT on each
/// evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusSignals {
    pub aw: AddressChannel,
    pub w: WriteDataChannel,
    pub b: WriteResponseChannel,
    pub ar: AddressChannel,
    pub r: ReadDataChannel,
}

impl BusSignals {
    /// Drive every manager-owned signal to zero.
    pub fn clear_manager(&mut self) {
        self.aw.addr = 0;
        self.aw.valid = false;
        self.w.data = 0;
        self.w.strb = 0;
        self.w.valid = false;
        self.b.ready = false;
        self.ar.addr = 0;
        self.ar.valid = false;
        self.r.ready = false;
    }
}

/// Every pin of the DUT: clock, active-low reset and the bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DutPins {
    pub clk: bool,
    pub rst_n: bool,
    pub bus: BusSignals,
}

/// Response code carried on BRESP / RRESP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Okay,
    ExOkay,
    SlvErr,
    DecErr,
}

impl Response {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Response::Okay,
            0b01 => Response::ExOkay,
            0b10 => Response::SlvErr,
            _ => Response::DecErr,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Response::Okay => 0b00,
            Response::ExOkay => 0b01,
            Response::SlvErr => 0b10,
            Response::DecErr => 0b11,
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Response::SlvErr | Response::DecErr)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Response::Okay => "OKAY",
            Response::ExOkay => "EXOKAY",
            Response::SlvErr => "SLVERR",
            Response::DecErr => "DECERR",
        };
        f.write_str(name)
    }
}

/// Address width of one DUT instance. Data is always [`DATA_WIDTH`] bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusGeometry {
    pub addr_width: u32,
}

/// Result of fitting an address onto the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskedAddress {
    pub value: u32,
    /// A truncation happened and was reported with `warn!`.
    pub reported: bool,
}

impl BusGeometry {
    pub fn new(addr_width: u32) -> Self {
        assert!(
            (1..=32).contains(&addr_width),
            "Address width must be between 1 and 32 bits"
        );
        Self { addr_width }
    }

    pub fn addr_mask(&self) -> u32 {
        if self.addr_width >= 32 {
            u32::MAX
        } else {
            (1 << self.addr_width) - 1
        }
    }

    /// Keep the low `addr_width` bits of `addr`. When `diagnose` is set a
    /// truncation is reported with `warn!`.
    pub fn mask_address(&self, addr: u32, diagnose: bool) -> MaskedAddress {
        let value = addr & self.addr_mask();
        let reported = diagnose && value != addr;
        if reported {
            warn!(
                "address {:#x} exceeds {}-bit bus, truncated to {:#x}",
                addr, self.addr_width, value
            );
        }
        MaskedAddress { value, reported }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_address_keeps_low_bits() {
        let geometry = BusGeometry::new(4);
        assert_eq!(geometry.addr_mask(), 0xF);
        assert_eq!(geometry.mask_address(0x14, false).value, 0x4);
        assert_eq!(geometry.mask_address(0x4, true).value, 0x4);
        assert_eq!(geometry.mask_address(0xFFFF_FFF0, false).value, 0x0);
    }

    #[test]
    fn test_truncation_diagnostic() {
        let geometry = BusGeometry::new(4);
        // Fires only when bits are dropped and diagnostics are on
        assert_eq!(
            geometry.mask_address(0x14, true),
            MaskedAddress {
                value: 0x4,
                reported: true
            }
        );
        assert!(!geometry.mask_address(0x14, false).reported);
        assert!(!geometry.mask_address(0xC, true).reported);
        assert!(!geometry.mask_address(0xC, false).reported);
    }

    #[test]
    fn test_full_width_address_is_untouched() {
        let geometry = BusGeometry::new(32);
        let masked = geometry.mask_address(0xDEAD_BEEC, true);
        assert_eq!(masked.value, 0xDEAD_BEEC);
        assert!(!masked.reported);
    }

    #[test]
    fn test_response_decoding() {
        assert_eq!(Response::from_bits(0), Response::Okay);
        assert_eq!(Response::from_bits(2), Response::SlvErr);
        // Only the low two bits are meaningful
        assert_eq!(Response::from_bits(0b111), Response::DecErr);
        assert!(Response::DecErr.is_error());
        assert!(!Response::ExOkay.is_error());
        assert_eq!(Response::SlvErr.to_string(), "SLVERR");
    }

    #[test]
    fn test_clear_manager_leaves_dut_outputs() {
        let mut bus = BusSignals::default();
        bus.aw.valid = true;
        bus.aw.ready = true;
        bus.r.ready = true;
        bus.r.data = 7;
        bus.clear_manager();
        assert!(!bus.aw.valid);
        assert!(bus.aw.ready);
        assert!(!bus.r.ready);
        assert_eq!(bus.r.data, 7);
        assert_eq!(STROBE_ALL, 0xF);
    }
}
