//! The DUT capability and a synthetic register-file stand-in.

use crate::signals::{BusGeometry, DutPins, Response};

/// A clocked device exposing the AXI4-Lite subordinate signal set.
///
/// `eval` consumes the manager-driven inputs in `pins` (clock and reset
/// included), settles the model and writes the DUT-driven outputs back into
/// `pins`. Edge detection is the device's business: the stepper only ever
/// changes `pins.clk` between two evaluations.
pub trait AxiLiteDut {
    fn geometry(&self) -> BusGeometry;
    fn eval(&mut self, pins: &mut DutPins);
}

/// Handshake timing of [`RegisterFileModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelTiming {
    /// Rising edges with valid asserted before the ready pulse.
    pub ready_latency: u32,
    /// Rising edges between the address handshake and BVALID/RVALID.
    pub response_latency: u32,
    /// When false the model never raises a ready.
    pub responsive: bool,
}

impl Default for ModelTiming {
    fn default() -> Self {
        Self {
            ready_latency: 0,
            response_latency: 0,
            responsive: true,
        }
    }
}

/// Word-addressed register file behind an AXI4-Lite subordinate port.
///
/// Registers update on the rising clock edge. An address (or address + data)
/// handshake is accepted on the same edge that raises the one-cycle ready
/// pulse, so a manager may drop valid as soon as it sees ready.
#[derive(Debug, Clone)]
pub struct RegisterFileModel {
    geometry: BusGeometry,
    timing: ModelTiming,
    response: Response,
    regs: Vec<u32>,
    last_clk: bool,

    aw_ready: bool,
    w_ready: bool,
    b_valid: bool,
    b_pending: Option<u32>,
    write_wait: u32,

    ar_ready: bool,
    r_valid: bool,
    r_data: u32,
    r_pending: Option<u32>,
    read_wait: u32,

    writes: u64,
    reads: u64,
}

impl RegisterFileModel {
    pub fn new(addr_width: u32) -> Self {
        assert!(
            (2..=16).contains(&addr_width),
            "Model address width must be between 2 and 16 bits"
        );
        let geometry = BusGeometry::new(addr_width);
        Self {
            geometry,
            timing: ModelTiming::default(),
            response: Response::Okay,
            regs: vec![0; 1 << (addr_width - 2)],
            last_clk: false,
            aw_ready: false,
            w_ready: false,
            b_valid: false,
            b_pending: None,
            write_wait: 0,
            ar_ready: false,
            r_valid: false,
            r_data: 0,
            r_pending: None,
            read_wait: 0,
            writes: 0,
            reads: 0,
        }
    }

    // Same shape as rtl/top_wrapper.sv
    pub fn reference() -> Self {
        Self::new(4)
    }

    pub fn with_timing(mut self, timing: ModelTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Response code returned on every B and R beat.
    pub fn with_response(mut self, response: Response) -> Self {
        self.response = response;
        self
    }

    pub fn unresponsive(addr_width: u32) -> Self {
        Self::new(addr_width).with_timing(ModelTiming {
            responsive: false,
            ..ModelTiming::default()
        })
    }

    pub fn peek(&self, addr: u32) -> u32 {
        self.regs[self.index(addr)]
    }

    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn read_count(&self) -> u64 {
        self.reads
    }

    fn index(&self, addr: u32) -> usize {
        ((addr & self.geometry.addr_mask()) >> 2) as usize % self.regs.len()
    }

    fn reset(&mut self) {
        self.regs.iter_mut().for_each(|r| *r = 0);
        self.aw_ready = false;
        self.w_ready = false;
        self.b_valid = false;
        self.b_pending = None;
        self.write_wait = 0;
        self.ar_ready = false;
        self.r_valid = false;
        self.r_data = 0;
        self.r_pending = None;
        self.read_wait = 0;
    }

    fn posedge(&mut self, pins: &DutPins) {
        if !pins.rst_n {
            self.reset();
            return;
        }
        let bus = &pins.bus;

        // Ready is a single-cycle pulse
        let write_accepted_last = self.aw_ready;
        let read_accepted_last = self.ar_ready;
        self.aw_ready = false;
        self.w_ready = false;
        self.ar_ready = false;

        if self.b_valid && bus.b.ready {
            self.b_valid = false;
        }
        if self.r_valid && bus.r.ready {
            self.r_valid = false;
        }

        self.b_valid |= countdown(&mut self.b_pending);
        self.r_valid |= countdown(&mut self.r_pending);

        let write_idle = !write_accepted_last && !self.b_valid && self.b_pending.is_none();
        if self.timing.responsive && write_idle && bus.aw.valid && bus.w.valid {
            if self.write_wait >= self.timing.ready_latency {
                self.aw_ready = true;
                self.w_ready = true;
                let idx = self.index(bus.aw.addr);
                self.regs[idx] = apply_strobe(self.regs[idx], bus.w.data, bus.w.strb);
                self.b_pending = Some(self.timing.response_latency);
                self.write_wait = 0;
                self.writes += 1;
            } else {
                self.write_wait += 1;
            }
        }

        let read_idle = !read_accepted_last && !self.r_valid && self.r_pending.is_none();
        if self.timing.responsive && read_idle && bus.ar.valid {
            if self.read_wait >= self.timing.ready_latency {
                self.ar_ready = true;
                self.r_data = self.regs[self.index(bus.ar.addr)];
                self.r_pending = Some(self.timing.response_latency);
                self.read_wait = 0;
                self.reads += 1;
            } else {
                self.read_wait += 1;
            }
        }
    }
}

fn countdown(pending: &mut Option<u32>) -> bool {
    match pending {
        Some(0) => {
            *pending = None;
            true
        }
        Some(n) => {
            *n -= 1;
            false
        }
        None => false,
    }
}

fn apply_strobe(old: u32, data: u32, strb: u8) -> u32 {
    (0..4).fold(old, |acc, lane| {
        if strb & (1 << lane) != 0 {
            let mask = 0xFFu32 << (lane * 8);
            (acc & !mask) | (data & mask)
        } else {
            acc
        }
    })
}

impl AxiLiteDut for RegisterFileModel {
    fn geometry(&self) -> BusGeometry {
        self.geometry
    }

    fn eval(&mut self, pins: &mut DutPins) {
        let rising = pins.clk && !self.last_clk;
        self.last_clk = pins.clk;
        if rising {
            self.posedge(pins);
        }

        let bus = &mut pins.bus;
        bus.aw.ready = self.aw_ready;
        bus.w.ready = self.w_ready;
        bus.b.valid = self.b_valid;
        bus.b.resp = self.response.bits();
        bus.ar.ready = self.ar_ready;
        bus.r.valid = self.r_valid;
        bus.r.data = self.r_data;
        bus.r.resp = self.response.bits();
    }
}
