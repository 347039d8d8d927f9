use num_enum::TryFromPrimitiveError;

use crate::link::LinkCommand;
use crate::subsystems::telemetry::LandedState;

/// [Result] alias for return types of the crate API
pub type Result<T> = std::result::Result<T, Error>;

/// Error enum type
///
/// Only transport-level faults end up here. A bounded wait that expires, a
/// nack from the vehicle or a cancelled maneuver are reported as a
/// [CommandOutcome](crate::CommandOutcome) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The link to the vehicle is gone, or the controller has been disconnected.
    Disconnected,
    /// An argument passed to the API is out of range. The String contains the reason.
    InvalidArgument(String),
    /// Telemetry could not be decoded. The String contains the reason.
    ProtocolError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Disconnected => write!(f, "vehicle link disconnected"),
            Error::InvalidArgument(reason) => write!(f, "invalid argument: {}", reason),
            Error::ProtocolError(reason) => write!(f, "protocol error: {}", reason),
        }
    }
}

impl std::error::Error for Error {}

impl From<TryFromPrimitiveError<LandedState>> for Error {
    fn from(e: TryFromPrimitiveError<LandedState>) -> Self {
        Self::ProtocolError(format!("unknown landed state {}", e.number))
    }
}

impl From<flume::RecvError> for Error {
    fn from(_: flume::RecvError) -> Self {
        self::Error::Disconnected
    }
}

impl From<flume::SendError<LinkCommand>> for Error {
    fn from(_: flume::SendError<LinkCommand>) -> Self {
        self::Error::Disconnected
    }
}
