use clap::Parser;
use eyre::Result;
use axil_sim::{
    create_axil_runtime, create_top, reference_script, AxiLiteDut, DriverConfig,
    RegisterFileModel, Report, SimContext, TransactionDriver, WaitPolicy,
};

#[derive(Parser, Debug)]
#[command(name = "axil-sim", about = "AXI4-Lite register read-back test bench")]
struct Args {
    /// Drive the built-in register-file model instead of the Verilated RTL
    #[arg(long)]
    synthetic: bool,

    /// Give up on a handshake after this many cycles (0 waits forever)
    #[arg(long, default_value_t = 10_000)]
    max_wait_cycles: u64,

    /// Exit with failure when a read-back mismatches
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let policy = match args.max_wait_cycles {
        0 => WaitPolicy::unbounded(),
        limit => WaitPolicy {
            max_wait_cycles: Some(limit),
            ..WaitPolicy::default()
        },
    };
    let driver = TransactionDriver::new(DriverConfig::default());

    println!("🚀 AXI4-Lite test bench starting...");
    let report = if args.synthetic {
        run_synthetic(&driver, policy)?
    } else {
        run_verilated(&driver, policy)?
    };

    let failed = report.mismatches().count();
    if failed == 0 {
        println!("🎉 All {} read-backs matched", report.checks.len());
    } else {
        println!("❌ {} of {} read-backs mismatched", failed, report.checks.len());
        if args.strict {
            return Err(eyre::eyre!("{} read-back mismatch(es)", failed));
        }
    }
    Ok(())
}

fn play<D: AxiLiteDut>(driver: &TransactionDriver, ctx: &mut SimContext<'_, D>) -> Result<Report> {
    Ok(driver.run(ctx, &reference_script())?)
}

fn run_verilated(driver: &TransactionDriver, policy: WaitPolicy) -> Result<Report> {
    let runtime = create_axil_runtime()?;
    let top = create_top(&runtime, cfg!(feature = "trace"))?;
    println!("✅ AXI4-Lite DUT model created!");

    #[cfg(feature = "trace")]
    {
        let mut top = top;
        let mut vcd = top.open_vcd(axil_sim::verilated::VCD_PATH);
        let mut ctx = SimContext::new(top)
            .with_policy(policy)
            .with_trace(axil_sim::DumpFn::new(move |t| {
                vcd.dump(t);
            }));
        return play(driver, &mut ctx);
    }

    #[cfg(not(feature = "trace"))]
    {
        let mut ctx = SimContext::new(top).with_policy(policy);
        play(driver, &mut ctx)
    }
}

fn run_synthetic(driver: &TransactionDriver, policy: WaitPolicy) -> Result<Report> {
    let model = RegisterFileModel::reference();

    #[cfg(feature = "trace")]
    {
        let file = std::io::BufWriter::new(std::fs::File::create(axil_sim::verilated::VCD_PATH)?);
        let mut vcd = axil_sim::VcdTrace::new(file, model.geometry().addr_width)?;
        let report = {
            let mut ctx = SimContext::new(model)
                .with_policy(policy)
                .with_trace(&mut vcd);
            play(driver, &mut ctx)?
        };
        vcd.finish()?;
        return Ok(report);
    }

    #[cfg(not(feature = "trace"))]
    {
        let mut ctx = SimContext::new(model).with_policy(policy);
        play(driver, &mut ctx)
    }
}
