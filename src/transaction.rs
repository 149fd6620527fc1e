//! Single AXI4-Lite write and read handshakes.
//!
//! Each transaction is a small state machine driven to completion by
//! stepping the clock:
//!
//! ```text
//! write: Idle -> AddrDataPhase -> ResponsePhase -> Done
//! read:  Idle -> AddrPhase     -> ResponsePhase -> Done
//! ```
//!
//! Ready/valid levels are sampled after the rising edge of each step. A
//! valid is dropped as soon as its ready has been seen, so it reaches the
//! DUT deasserted on the following edge.

use log::{debug, trace, warn};

use crate::clock::SimContext;
use crate::dut::AxiLiteDut;
use crate::error::{BusError, BusResult, Channel};
use crate::signals::{Response, STROBE_ALL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// AW and W presented together
    AddrDataPhase,
    AddrPhase,
    ResponsePhase,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Address as presented on the bus, after masking.
    pub address: u32,
    /// Written data, or the captured RDATA of a read.
    pub data: u32,
    pub direction: Direction,
    pub phase: Phase,
    pub response: Response,
    /// Clock cycles from the first valid to the release of BREADY/RREADY.
    pub cycles: u64,
}

impl Transaction {
    fn start(direction: Direction, address: u32, data: u32) -> Self {
        Self {
            address,
            data,
            direction,
            phase: Phase::Idle,
            response: Response::Okay,
            cycles: 0,
        }
    }

    fn enter(&mut self, phase: Phase) {
        trace!(
            "{:?} {:#x}: {:?} -> {:?}",
            self.direction,
            self.address,
            self.phase,
            phase
        );
        self.phase = phase;
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}

impl<'t, D: AxiLiteDut> SimContext<'t, D> {
    /// Write `data` to `address` with every byte lane enabled.
    pub fn write(&mut self, address: u32, data: u32) -> BusResult<Transaction> {
        let address = self
            .geometry()
            .mask_address(address, self.policy.warn_on_truncation)
            .value;
        let mut txn = Transaction::start(Direction::Write, address, data);
        let start = self.cycles();

        {
            let bus = self.bus_mut();
            bus.aw.addr = address;
            bus.aw.valid = true;
            bus.w.data = data;
            bus.w.strb = STROBE_ALL;
            bus.w.valid = true;
            // B is opened before the address/data transfer completes
            bus.b.ready = true;
        }
        txn.enter(Phase::AddrDataPhase);

        self.wait_until(Channel::WriteAddressData, |bus| bus.aw.ready && bus.w.ready)?;
        {
            let bus = self.bus_mut();
            bus.aw.valid = false;
            bus.w.valid = false;
        }
        txn.enter(Phase::ResponsePhase);

        self.wait_until(Channel::WriteResponse, |bus| bus.b.valid)?;
        txn.response = Response::from_bits(self.bus().b.resp);

        self.step();
        self.bus_mut().b.ready = false;
        txn.enter(Phase::Done);
        txn.cycles = self.cycles() - start;

        debug!(
            "write {:#x} <= {:#010x} {} in {} cycles",
            address, data, txn.response, txn.cycles
        );
        self.check_response(Channel::WriteResponse, &txn)?;
        Ok(txn)
    }

    /// Read one word from `address`.
    pub fn read(&mut self, address: u32) -> BusResult<Transaction> {
        let address = self
            .geometry()
            .mask_address(address, self.policy.warn_on_truncation)
            .value;
        let mut txn = Transaction::start(Direction::Read, address, 0);
        let start = self.cycles();

        {
            let bus = self.bus_mut();
            bus.ar.addr = address;
            bus.ar.valid = true;
            bus.r.ready = true;
        }
        txn.enter(Phase::AddrPhase);

        self.wait_until(Channel::ReadAddress, |bus| bus.ar.ready)?;
        self.bus_mut().ar.valid = false;
        txn.enter(Phase::ResponsePhase);

        self.wait_until(Channel::ReadData, |bus| bus.r.valid)?;
        txn.data = self.bus().r.data;
        txn.response = Response::from_bits(self.bus().r.resp);

        self.step();
        self.bus_mut().r.ready = false;
        txn.enter(Phase::Done);
        txn.cycles = self.cycles() - start;

        debug!(
            "read {:#x} => {:#010x} {} in {} cycles",
            address, txn.data, txn.response, txn.cycles
        );
        self.check_response(Channel::ReadData, &txn)?;
        Ok(txn)
    }

    fn check_response(&self, channel: Channel, txn: &Transaction) -> BusResult<()> {
        if !txn.response.is_error() {
            return Ok(());
        }
        if self.policy.fail_on_error_response {
            return Err(BusError::ErrorResponse {
                channel,
                response: txn.response,
                addr: txn.address,
            });
        }
        warn!(
            "{:?} at {:#x} completed with {}",
            txn.direction, txn.address, txn.response
        );
        Ok(())
    }
}
