use camino::Utf8Path;
use eyre::Result;
use marlin::{
    verilator::{VerilatedModelConfig, VerilatorRuntime, VerilatorRuntimeOptions},
    verilog::prelude::*,
};

use crate::dut::AxiLiteDut;
use crate::signals::{BusGeometry, DutPins};

/// Address width of `rtl/top_wrapper.sv`.
pub const TOP_ADDR_WIDTH: u32 = 4;

/// Waveform file written when tracing is enabled.
pub const VCD_PATH: &str = "dump.vcd";

// AXI4-Lite register file under test
#[verilog(src = "rtl/top_wrapper.sv", name = "top_wrapper")]
pub struct TopWrapper;

pub fn create_axil_runtime() -> Result<VerilatorRuntime> {
    let include_paths = [Utf8Path::new("rtl")];
    let src_files = [Utf8Path::new("rtl/top_wrapper.sv")];

    VerilatorRuntime::new(
        Utf8Path::new("artifacts"),
        &src_files,
        &include_paths,
        [],
        VerilatorRuntimeOptions::default_logging(),
    )
    .map_err(|e| eyre::eyre!("Failed to create runtime: {}", e))
}

/// Build the DUT, with Verilator tracing compiled in when `tracing` is set.
pub fn create_top<'ctx>(runtime: &'ctx VerilatorRuntime, tracing: bool) -> Result<TopWrapper<'ctx>> {
    if tracing {
        runtime
            .create_model::<TopWrapper>(&VerilatedModelConfig {
                enable_tracing: true,
                ..Default::default()
            })
            .map_err(|e| eyre::eyre!("Failed to create traced model: {:?}", e))
    } else {
        runtime
            .create_model_simple::<TopWrapper>()
            .map_err(|e| eyre::eyre!("Failed to create model: {:?}", e))
    }
}

fn bit(level: bool) -> u8 {
    level as u8
}

impl<'ctx> AxiLiteDut for TopWrapper<'ctx> {
    fn geometry(&self) -> BusGeometry {
        BusGeometry::new(TOP_ADDR_WIDTH)
    }

    fn eval(&mut self, pins: &mut DutPins) {
        let bus = &mut pins.bus;

        self.clk = bit(pins.clk);
        self.rst_n = bit(pins.rst_n);
        self.s_axi_awaddr = bus.aw.addr as u8;
        self.s_axi_awvalid = bit(bus.aw.valid);
        self.s_axi_wdata = bus.w.data;
        self.s_axi_wstrb = bus.w.strb;
        self.s_axi_wvalid = bit(bus.w.valid);
        self.s_axi_bready = bit(bus.b.ready);
        self.s_axi_araddr = bus.ar.addr as u8;
        self.s_axi_arvalid = bit(bus.ar.valid);
        self.s_axi_rready = bit(bus.r.ready);

        TopWrapper::eval(self);

        bus.aw.ready = self.s_axi_awready != 0;
        bus.w.ready = self.s_axi_wready != 0;
        bus.b.resp = self.s_axi_bresp;
        bus.b.valid = self.s_axi_bvalid != 0;
        bus.ar.ready = self.s_axi_arready != 0;
        bus.r.data = self.s_axi_rdata;
        bus.r.resp = self.s_axi_rresp;
        bus.r.valid = self.s_axi_rvalid != 0;
    }
}
