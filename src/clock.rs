use log::trace;

use crate::config::WaitPolicy;
use crate::dut::AxiLiteDut;
use crate::error::{BusError, BusResult, Channel};
use crate::signals::{BusGeometry, BusSignals, DutPins};
use crate::trace::TraceSink;

/// Simulation time in half-cycles. One clock cycle is two units.
pub type SimTime = u64;

/// Everything a transaction needs: the DUT, its pins, the clock and the
/// optional waveform sink.
pub struct SimContext<'t, D: AxiLiteDut> {
    dut: D,
    pins: DutPins,
    geometry: BusGeometry,
    time: SimTime,
    cycles: u64,
    trace: Option<Box<dyn TraceSink + 't>>,
    pub(crate) policy: WaitPolicy,
}

impl<'t, D: AxiLiteDut> SimContext<'t, D> {
    pub fn new(dut: D) -> Self {
        let geometry = dut.geometry();
        Self {
            dut,
            pins: DutPins::default(),
            geometry,
            time: 0,
            cycles: 0,
            trace: None,
            policy: WaitPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_trace(mut self, sink: impl TraceSink + 't) -> Self {
        self.trace = Some(Box::new(sink));
        self
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn geometry(&self) -> BusGeometry {
        self.geometry
    }

    pub fn pins(&self) -> &DutPins {
        &self.pins
    }

    pub fn bus(&self) -> &BusSignals {
        &self.pins.bus
    }

    pub(crate) fn bus_mut(&mut self) -> &mut BusSignals {
        &mut self.pins.bus
    }

    pub fn set_reset(&mut self, rst_n: bool) {
        self.pins.rst_n = rst_n;
    }

    pub fn dut(&self) -> &D {
        &self.dut
    }

    /// Advance one clock cycle: a low phase followed by a high phase.
    pub fn step(&mut self) {
        self.half_cycle(false);
        self.half_cycle(true);
        self.cycles += 1;
    }

    pub fn run(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.step();
        }
    }

    // Order matters: drive, evaluate, sample, then advance time.
    fn half_cycle(&mut self, clk: bool) {
        self.pins.clk = clk;
        self.dut.eval(&mut self.pins);
        if let Some(sink) = self.trace.as_mut() {
            sink.sample(self.time, &self.pins);
        }
        self.time += 1;
    }

    /// Step until `done` holds, checking before each step. Returns the
    /// number of cycles stepped.
    pub(crate) fn wait_until(
        &mut self,
        channel: Channel,
        done: impl Fn(&BusSignals) -> bool,
    ) -> BusResult<u64> {
        let mut waited = 0u64;
        while !done(&self.pins.bus) {
            if let Some(limit) = self.policy.max_wait_cycles {
                if waited >= limit {
                    return Err(BusError::HandshakeTimeout {
                        channel,
                        waited_cycles: waited,
                        time: self.time,
                    });
                }
            }
            self.step();
            waited += 1;
        }
        trace!("{} after {} cycles (t={})", channel, waited, self.time);
        Ok(waited)
    }
}
