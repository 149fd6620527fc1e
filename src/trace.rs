//! Waveform sinks. The stepper hands every sink exactly one sample per
//! half-cycle, in increasing time order.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::warn;
use vcd::{IdCode, TimescaleUnit, Value, Writer};

use crate::signals::DutPins;
use crate::SimTime;

pub trait TraceSink {
    fn sample(&mut self, time: SimTime, pins: &DutPins);
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn sample(&mut self, time: SimTime, pins: &DutPins) {
        (**self).sample(time, pins)
    }
}

/// Adapts a "dump at time t" callback, e.g. a simulator's native VCD dumper.
pub struct DumpFn<'a>(Box<dyn FnMut(SimTime) + 'a>);

impl<'a> DumpFn<'a> {
    pub fn new(dump: impl FnMut(SimTime) + 'a) -> Self {
        Self(Box::new(dump))
    }
}

impl TraceSink for DumpFn<'_> {
    fn sample(&mut self, time: SimTime, _pins: &DutPins) {
        (self.0)(time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub time: SimTime,
    pub pins: DutPins,
}

/// Keeps every sample in memory.
#[derive(Debug, Default, Clone)]
pub struct SampleLog {
    samples: Vec<Sample>,
}

impl SampleLog {
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Samples taken right after a rising edge.
    pub fn rising_edges(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|s| s.pins.clk)
    }
}

impl TraceSink for SampleLog {
    fn sample(&mut self, time: SimTime, pins: &DutPins) {
        self.samples.push(Sample { time, pins: *pins });
    }
}

struct Wires {
    clk: IdCode,
    rst_n: IdCode,
    awaddr: IdCode,
    awvalid: IdCode,
    awready: IdCode,
    wdata: IdCode,
    wstrb: IdCode,
    wvalid: IdCode,
    wready: IdCode,
    bresp: IdCode,
    bvalid: IdCode,
    bready: IdCode,
    araddr: IdCode,
    arvalid: IdCode,
    arready: IdCode,
    rdata: IdCode,
    rresp: IdCode,
    rvalid: IdCode,
    rready: IdCode,
}

// Lets `finish` reach the output after handing it to the VCD writer.
struct SharedOut<W>(Rc<RefCell<W>>);

impl<W: Write> Write for SharedOut<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.borrow_mut().flush()
    }
}

/// Writes the bus pins as a VCD file, for DUTs with no dumper of their own.
pub struct VcdTrace<W: Write> {
    out: Rc<RefCell<W>>,
    writer: Writer<SharedOut<W>>,
    wires: Wires,
    addr_width: u32,
    last: Option<DutPins>,
    error: Option<io::Error>,
}

impl<W: Write> VcdTrace<W> {
    pub fn new(out: W, addr_width: u32) -> io::Result<Self> {
        let out = Rc::new(RefCell::new(out));
        let mut writer = Writer::new(SharedOut(Rc::clone(&out)));
        writer.timescale(1, TimescaleUnit::NS)?;
        writer.add_module("top")?;
        let clk = writer.add_wire(1, "clk")?;
        let rst_n = writer.add_wire(1, "rst_n")?;

        writer.add_module("s_axi")?;
        let wires = Wires {
            clk,
            rst_n,
            awaddr: writer.add_wire(addr_width, "awaddr")?,
            awvalid: writer.add_wire(1, "awvalid")?,
            awready: writer.add_wire(1, "awready")?,
            wdata: writer.add_wire(32, "wdata")?,
            wstrb: writer.add_wire(4, "wstrb")?,
            wvalid: writer.add_wire(1, "wvalid")?,
            wready: writer.add_wire(1, "wready")?,
            bresp: writer.add_wire(2, "bresp")?,
            bvalid: writer.add_wire(1, "bvalid")?,
            bready: writer.add_wire(1, "bready")?,
            araddr: writer.add_wire(addr_width, "araddr")?,
            arvalid: writer.add_wire(1, "arvalid")?,
            arready: writer.add_wire(1, "arready")?,
            rdata: writer.add_wire(32, "rdata")?,
            rresp: writer.add_wire(2, "rresp")?,
            rvalid: writer.add_wire(1, "rvalid")?,
            rready: writer.add_wire(1, "rready")?,
        };
        writer.upscope()?; // s_axi
        writer.upscope()?; // top
        writer.enddefinitions()?;

        Ok(Self {
            out,
            writer,
            wires,
            addr_width,
            last: None,
            error: None,
        })
    }

    /// Flush the output. Reports the first error seen while sampling, or
    /// the flush error.
    pub fn finish(mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        let mut out = self.out.borrow_mut();
        out.flush()
    }

    fn levels(&self, pins: &DutPins) -> [(IdCode, u32, u64); 19] {
        let w = &self.wires;
        let bus = &pins.bus;
        let aw = self.addr_width;
        [
            (w.clk, 1, pins.clk as u64),
            (w.rst_n, 1, pins.rst_n as u64),
            (w.awaddr, aw, bus.aw.addr as u64),
            (w.awvalid, 1, bus.aw.valid as u64),
            (w.awready, 1, bus.aw.ready as u64),
            (w.wdata, 32, bus.w.data as u64),
            (w.wstrb, 4, bus.w.strb as u64),
            (w.wvalid, 1, bus.w.valid as u64),
            (w.wready, 1, bus.w.ready as u64),
            (w.bresp, 2, bus.b.resp as u64),
            (w.bvalid, 1, bus.b.valid as u64),
            (w.bready, 1, bus.b.ready as u64),
            (w.araddr, aw, bus.ar.addr as u64),
            (w.arvalid, 1, bus.ar.valid as u64),
            (w.arready, 1, bus.ar.ready as u64),
            (w.rdata, 32, bus.r.data as u64),
            (w.rresp, 2, bus.r.resp as u64),
            (w.rvalid, 1, bus.r.valid as u64),
            (w.rready, 1, bus.r.ready as u64),
        ]
    }

    fn write_sample(&mut self, time: SimTime, pins: &DutPins) -> io::Result<()> {
        let current = self.levels(pins);
        let previous = self.last.map(|p| self.levels(&p));

        self.writer.timestamp(time)?;
        for (i, (id, width, value)) in current.into_iter().enumerate() {
            // Only changes after the first sample
            if previous.map_or(false, |prev| prev[i].2 == value) {
                continue;
            }
            if width == 1 {
                let bit = if value != 0 { Value::V1 } else { Value::V0 };
                self.writer.change_scalar(id, bit)?;
            } else {
                self.writer.change_vector(id, u64_to_vec(value, width))?;
            }
        }
        self.last = Some(*pins);
        Ok(())
    }
}

impl<W: Write> TraceSink for VcdTrace<W> {
    fn sample(&mut self, time: SimTime, pins: &DutPins) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write_sample(time, pins) {
            warn!("waveform write failed at t={}: {}", time, e);
            self.error = Some(e);
        }
    }
}

// MSB first
fn u64_to_vec(val: u64, width: u32) -> Vec<Value> {
    (0..width)
        .rev()
        .map(|i| if (val >> i) & 1 == 1 { Value::V1 } else { Value::V0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_to_vec_is_msb_first() {
        assert_eq!(
            u64_to_vec(0b0110, 4),
            vec![Value::V0, Value::V1, Value::V1, Value::V0]
        );
    }

    #[test]
    fn test_sample_log_filters_rising_edges() {
        let mut log = SampleLog::default();
        let mut pins = DutPins::default();
        log.sample(0, &pins);
        pins.clk = true;
        log.sample(1, &pins);
        assert_eq!(log.samples().len(), 2);
        let rising: Vec<_> = log.rising_edges().map(|s| s.time).collect();
        assert_eq!(rising, vec![1]);
    }

    #[test]
    fn test_vcd_trace_writes_header_and_changes() {
        let mut out = Vec::new();
        {
            let mut trace = VcdTrace::new(&mut out, 4).unwrap();
            let mut pins = DutPins::default();
            trace.sample(0, &pins);
            pins.clk = true;
            pins.bus.aw.addr = 0x4;
            trace.sample(1, &pins);
            trace.finish().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("$scope module s_axi $end"));
        assert!(text.contains("awaddr"));
        assert!(text.contains("#0"));
        assert!(text.contains("#1"));
        assert!(text.contains("b0100"));
    }

    #[test]
    fn test_dump_fn_forwards_time() {
        let mut times = Vec::new();
        {
            let mut sink = DumpFn::new(|t| times.push(t));
            let pins = DutPins::default();
            sink.sample(3, &pins);
            sink.sample(4, &pins);
        }
        assert_eq!(times, vec![3, 4]);
    }

    struct FlakyOut {
        data: Vec<u8>,
        flushes: Rc<std::cell::Cell<u32>>,
        fail_flush: bool,
    }

    impl Write for FlakyOut {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes.set(self.flushes.get() + 1);
            if self.fail_flush {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            } else {
                Ok(())
            }
        }
    }

    fn flaky(fail_flush: bool) -> (FlakyOut, Rc<std::cell::Cell<u32>>) {
        let flushes = Rc::new(std::cell::Cell::new(0));
        let out = FlakyOut {
            data: Vec::new(),
            flushes: Rc::clone(&flushes),
            fail_flush,
        };
        (out, flushes)
    }

    #[test]
    fn test_finish_flushes_output() {
        let (out, flushes) = flaky(false);
        let mut trace = VcdTrace::new(out, 4).unwrap();
        trace.sample(0, &DutPins::default());
        let before = flushes.get();
        trace.finish().unwrap();
        assert_eq!(flushes.get(), before + 1);
    }

    #[test]
    fn test_finish_reports_flush_failure() {
        let (out, _) = flaky(true);
        let mut trace = VcdTrace::new(out, 4).unwrap();
        trace.sample(0, &DutPins::default());
        let err = trace.finish().unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
