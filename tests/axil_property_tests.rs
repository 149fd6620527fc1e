use proptest::prelude::*;

use axil_sim::{ModelTiming, RegisterFileModel, SimContext, TransactionDriver};

fn ready_context(model: RegisterFileModel) -> SimContext<'static, RegisterFileModel> {
    let mut ctx = SimContext::new(model);
    TransactionDriver::default().reset(&mut ctx);
    ctx
}

/// Word-aligned address on the 4-bit reference bus
fn word_addr() -> impl Strategy<Value = u32> {
    (0u32..4).prop_map(|i| i << 2)
}

fn data_value() -> impl Strategy<Value = u32> {
    any::<u32>()
}

fn timing() -> impl Strategy<Value = ModelTiming> {
    (0u32..8, 0u32..16).prop_map(|(ready_latency, response_latency)| ModelTiming {
        ready_latency,
        response_latency,
        responsive: true,
    })
}

proptest! {
    /// Property: a read returns the last value written to the same address
    #[test]
    fn prop_write_read_coherence(addr in word_addr(), data in data_value(), timing in timing()) {
        let mut ctx = ready_context(RegisterFileModel::reference().with_timing(timing));
        let written = ctx.write(addr, data).unwrap();
        let read = ctx.read(written.address).unwrap();
        prop_assert_eq!(read.data, data);
    }

    /// Property: later writes win, other registers are untouched
    #[test]
    fn prop_last_write_wins(
        writes in prop::collection::vec((word_addr(), data_value()), 1..12)
    ) {
        let mut ctx = ready_context(RegisterFileModel::reference());
        let mut expected = [0u32; 4];
        for &(addr, data) in &writes {
            ctx.write(addr, data).unwrap();
            expected[(addr >> 2) as usize] = data;
        }
        for (i, &value) in expected.iter().enumerate() {
            prop_assert_eq!(ctx.read((i as u32) << 2).unwrap().data, value);
        }
    }

    /// Property: only the low address bits reach the bus
    #[test]
    fn prop_address_truncation(high in 1u32..0x1000_0000, addr in word_addr(), data in data_value()) {
        let mut ctx = ready_context(RegisterFileModel::reference());
        let wide = ctx.write((high << 4) | addr, data).unwrap();
        prop_assert_eq!(wide.address, addr);
        prop_assert_eq!(ctx.read(addr).unwrap().data, data);
    }

    /// Property: every step costs exactly two time units
    #[test]
    fn prop_time_is_twice_cycles(addr in word_addr(), data in data_value(), timing in timing()) {
        let mut ctx = ready_context(RegisterFileModel::reference().with_timing(timing));
        let before = ctx.time();
        let txn = ctx.write(addr, data).unwrap();
        prop_assert_eq!(ctx.time() - before, 2 * txn.cycles);
        prop_assert_eq!(ctx.time(), 2 * ctx.cycles());
    }
}
