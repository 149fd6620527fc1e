use crate::signals::Response;
use crate::SimTime;

/// Handshake condition a transaction was blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// AWREADY and WREADY together
    WriteAddressData,
    WriteResponse,
    ReadAddress,
    ReadData,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Channel::WriteAddressData => "AWREADY/WREADY",
            Channel::WriteResponse => "BVALID",
            Channel::ReadAddress => "ARREADY",
            Channel::ReadData => "RVALID",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Handshake timeout waiting for {channel} after {waited_cycles} cycles (t={time})")]
    HandshakeTimeout {
        channel: Channel,
        waited_cycles: u64,
        time: SimTime,
    },
    #[error("{channel} returned {response} for address {addr:#x}")]
    ErrorResponse {
        channel: Channel,
        response: Response,
        addr: u32,
    },
}

pub type BusResult<T> = Result<T, BusError>;
