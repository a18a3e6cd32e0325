/*!
    definition of the general axis error type

    Every failure path of this crate is representable as data here, nothing is reported
    through logs alone. Only [AxisError::Transport] is worth retrying (after reconnecting),
    the other variants indicate either a configuration mismatch or a real physical state.
*/

use core::fmt;
use std::sync::Arc;
use crate::{frame::ProtocolError, registers::OperationMode, state::DriveState};


/**
    unexpected result of an axis operation

    Its variants are meant to help finding which layer is responsible for the problem and
    whether retrying can help.
*/
#[derive(Clone, Debug)]
pub enum AxisError {
    /// connect/send/receive failure or response timeout
    ///
    /// these errors are exterior to this library and can be retried after reconnecting
    Transport(Arc<std::io::Error>),

    /// the peer replied with fewer bytes than the gateway frame requires
    ///
    /// this usually means the peer is not speaking the gateway encapsulation at all (plain
    /// modbus for instance), retrying without reconfiguration cannot help
    ShortResponse(usize),

    /// the peer returned an explicit exception function code
    ///
    /// retrying the same request cannot help
    Exception(u8),

    /// the caller requested an object size the protocol does not carry, programmer error
    InvalidSize(u8),

    /// the drive did not reach the expected state within the bounded transition polls
    StateTransitionTimeout {
        expected: DriveState,
        observed: DriveState,
    },

    /// the drive did not acknowledge the requested operation mode in its mode display
    ModeSwitchTimeout(OperationMode),

    /// homing did not complete within the bounded polls, the axis is left in its last observed state
    HomingTimeout,

    /// a profile position move did not complete within the bounded polls, the axis is left in its last observed state
    MoveTimeout,

    /// a motion command was issued while the drive cannot execute it (fault, disabled, ...)
    NotOperational(DriveState),

    /// the caller requested an abort through the axis abort handle
    Aborted,
}

/// convenient alias to simplify return annotations
pub type AxisResult<T = ()> = core::result::Result<T, AxisError>;

impl fmt::Display for AxisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transport: {err}"),
            Self::ShortResponse(len) => write!(f, "response too short ({len} bytes), peer is likely not in gateway mode"),
            Self::Exception(code) => write!(f, "gateway exception {code:#04x}"),
            Self::InvalidSize(size) => write!(f, "unsupported object size {size}"),
            Self::StateTransitionTimeout {expected, observed} =>
                write!(f, "drive did not reach '{expected}', still '{observed}'"),
            Self::ModeSwitchTimeout(mode) => write!(f, "drive did not switch to mode {mode:?}"),
            Self::HomingTimeout => write!(f, "homing did not complete in time"),
            Self::MoveTimeout => write!(f, "move did not complete in time"),
            Self::NotOperational(state) => write!(f, "drive is '{state}', not operational"),
            Self::Aborted => write!(f, "operation aborted by caller"),
        }
    }
}

impl std::error::Error for AxisError {}

impl From<std::io::Error> for AxisError {
    fn from(src: std::io::Error) -> Self {
        AxisError::Transport(Arc::new(src))
    }
}

impl From<ProtocolError> for AxisError {
    fn from(src: ProtocolError) -> Self {
        match src {
            ProtocolError::ShortResponse(len) => AxisError::ShortResponse(len),
            ProtocolError::Exception(code) => AxisError::Exception(code),
            ProtocolError::InvalidSize(size) => AxisError::InvalidSize(size),
        }
    }
}
