/*!
    Control of linear-axis motor controllers speaking CANopen through a vendor Modbus-TCP
    gateway encapsulation: device state machine bring-up, homing and profile position moves.
*/

pub mod frame;
pub mod registers;
pub mod socket;
pub mod client;
pub mod state;
pub mod axis;
pub mod motion;
pub mod axes;
mod error;

pub use crate::axes::{AxisMove, AxisSet};
pub use crate::axis::{AbortHandle, Axis, Timing};
pub use crate::client::OdClient;
pub use crate::error::{AxisError, AxisResult};
pub use crate::motion::{HomingProfile, MotionProfile, Positioning};
pub use crate::registers::{ControlWord, OperationMode, StatusWord};
pub use crate::socket::{GatewaySocket, TcpSocket};
pub use crate::state::DriveState;
