//! Tunables for the transaction engine and the reset/script driver.

/// How the transaction engine waits on handshakes and treats responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Upper bound on the cycles spent in any single handshake wait.
    /// `None` waits forever.
    pub max_wait_cycles: Option<u64>,
    /// Report addresses that do not fit the bus.
    pub warn_on_truncation: bool,
    /// Turn SLVERR/DECERR responses into errors instead of warnings.
    pub fail_on_error_response: bool,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_wait_cycles: Some(10_000),
            warn_on_truncation: true,
            fail_on_error_response: false,
        }
    }
}

impl WaitPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_wait_cycles: None,
            ..Self::default()
        }
    }
}

/// Cycle counts used around the scripted transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Cycles with rst_n held low.
    pub reset_cycles: u32,
    /// Cycles after releasing reset before the first transaction.
    pub settle_cycles: u32,
    /// Cycles run after the script, before teardown.
    pub trailing_cycles: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            reset_cycles: 5,
            settle_cycles: 5,
            trailing_cycles: 10,
        }
    }
}
