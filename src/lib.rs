pub mod clock;
pub mod config;
pub mod driver;
pub mod dut;
pub mod error;
pub mod signals;
pub mod trace;
pub mod transaction;
pub mod verilated;

pub use clock::{SimContext, SimTime};
pub use config::{DriverConfig, WaitPolicy};
pub use driver::{reference_script, Report, ScriptStep, TransactionDriver};
pub use dut::{AxiLiteDut, ModelTiming, RegisterFileModel};
pub use error::{BusError, BusResult, Channel};
pub use signals::{BusGeometry, BusSignals, DutPins, MaskedAddress, Response};
pub use trace::{DumpFn, SampleLog, TraceSink, VcdTrace};
pub use transaction::{Direction, Phase, Transaction};
pub use verilated::{create_axil_runtime, create_top, TopWrapper};
