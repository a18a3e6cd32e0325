/*!
    This struct exposes one physical axis controller: one persistent connection, one
    [OdClient], and the last statusword observed on it.

    ## Note

    An `Axis` is protocol-safe as long as it stays the exclusive owner of its connection:
    nothing the user calls can interleave two frames on the wire. It is created at startup
    and torn down on shutdown or connection loss; share it between tasks only behind a
    mutex or a single-owner channel.

    ## Example

    The typical life of an axis:

    ```ignore
    let mut axis = Axis::connect("169.254.239.1:502".parse()?).await?;
    axis.bring_up().await?;
    axis.home(&HomingProfile::default()).await?;
    axis.move_to(5400, &MotionProfile::default(), Positioning::Absolute).await?;
    ```
*/

use core::time::Duration;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use crate::{
    client::OdClient,
    error::{AxisError, AxisResult},
    registers::{self, StatusWord},
    socket::{GatewaySocket, TcpSocket},
    state::{command, DriveState},
    };


/**
    timing/bound policy for the polling loops of one axis

    Network timeouts apply per round trip (see [crate::client::OdClient]); the poll bounds
    here are independent of them, so a stalled peer degrades to a deterministic failure
    instead of hanging forever.
*/
#[derive(Copy, Clone, Debug)]
pub struct Timing {
    /// response timeout of each network round trip
    pub response: Duration,
    /// delay after a controlword write before re-reading the statusword
    pub settle: Duration,
    /// delay between two motion completion polls
    pub poll: Duration,
    /// bounded polls for one state machine transition (and the mode display readback)
    pub transition_polls: u32,
    /// bounded polls for homing completion
    pub homing_polls: u32,
    /// bounded polls for a profile position move
    pub motion_polls: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            response: crate::client::RESPONSE_TIMEOUT,
            settle: Duration::from_millis(200),
            poll: Duration::from_millis(500),
            transition_polls: 10,
            homing_polls: 240,
            motion_polls: 120,
        }
    }
}

/// cloneable handle requesting the abort of the motion currently polled on an axis
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// request the abort of the current motion, the poll loop will stop the axis and return [AxisError::Aborted]
    pub fn abort(&self) {
        self.0.store(true, Ordering::Release);
    }
    pub(crate) fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// one axis controller: connection, dictionary client, last known status
pub struct Axis<S> {
    client: OdClient<S>,
    timing: Timing,
    abort: AbortHandle,
    /// last statusword read from the drive, refreshed by every status poll
    status: u16,
}

impl Axis<TcpSocket> {
    /// connect to the controller at the given address, the gateway listens on port [crate::socket::GATEWAY_PORT]
    pub async fn connect(address: SocketAddr) -> AxisResult<Self> {
        let socket = TcpSocket::connect(address).await?;
        log::debug!("connected to controller at {address}");
        Ok(Self::new(socket))
    }
}

impl<S: GatewaySocket> Axis<S> {
    pub fn new(socket: S) -> Self {
        Self::with_timing(socket, Timing::default())
    }
    pub fn with_timing(socket: S, timing: Timing) -> Self {
        let mut client = OdClient::new(socket);
        client.set_timeout(timing.response);
        Self {client, timing, abort: AbortHandle::default(), status: 0}
    }

    pub fn timing(&self) -> &Timing  {&self.timing}
    /// access to the dictionary client, for objects this crate has no shortcut for
    pub fn client(&mut self) -> &mut OdClient<S>  {&mut self.client}
    /// handle that another task can use to abort the motion this axis is polling
    pub fn abort_handle(&self) -> AbortHandle  {self.abort.clone()}
    pub(crate) fn abort_requested(&self) -> bool  {self.abort.take()}

    /// last statusword observed on this axis, with its flag bits
    pub fn last_status(&self) -> StatusWord  {StatusWord::from(self.status)}

    /// read the statusword and classify it
    pub async fn status(&mut self) -> AxisResult<DriveState> {
        Ok(DriveState::classify(self.read_status().await?))
    }
    pub(crate) async fn read_status(&mut self) -> AxisResult<u16> {
        let status = self.client.read(registers::cia402::statusword).await?;
        self.status = status;
        Ok(status)
    }

    /// read the measured position
    pub async fn position(&mut self) -> AxisResult<i32> {
        self.client.read(registers::cia402::actual_position).await
    }

    /// read the device type object, probing that the peer speaks the gateway encapsulation
    pub async fn device_type(&mut self) -> AxisResult<u32> {
        self.client.read(registers::device_type).await
    }

    /// send a fault reset and wait for the drive to report [DriveState::SwitchOnDisabled]
    pub async fn fault_reset(&mut self) -> AxisResult<()> {
        self.client.write(registers::cia402::controlword, command::FAULT_RESET).await?;
        self.wait_for(DriveState::SwitchOnDisabled).await?;
        Ok(())
    }

    /**
        walk the device state machine from whatever the current state is up to
        [DriveState::OperationEnabled]

        A drive starting in [DriveState::Fault] is reset first; one starting in
        [DriveState::NotReadyToSwitchOn] is given a bounded wait for its own internal
        transition before any controlword is issued.
    */
    pub async fn bring_up(&mut self) -> AxisResult<()> {
        let mut state = DriveState::classify(self.read_status().await?);
        log::debug!("bring up from '{state}'");

        if ! self.last_status().remote() {
            log::warn!("remote bit clear: hardware enable input looks off, the motor may not power");
        }
        if let DriveState::NotReadyToSwitchOn | DriveState::Unknown = state {
            // the controller transitions out of these on its own
            state = self.wait_for(DriveState::SwitchOnDisabled).await?;
        }
        loop {
            if state == DriveState::OperationEnabled {
                log::debug!("operation enabled");
                return Ok(());
            }
            let Some(controlword) = state.advance() else {
                return Err(AxisError::NotOperational(state));
            };
            // successor is always defined where advance is
            let expected = state.successor()
                .unwrap_or(DriveState::OperationEnabled);
            self.client.write(registers::cia402::controlword, controlword).await?;
            state = self.wait_for(expected).await?;
        }
    }

    /// poll the statusword until the expected state is observed, bounded by the transition poll ceiling
    pub(crate) async fn wait_for(&mut self, expected: DriveState) -> AxisResult<DriveState> {
        let mut observed = DriveState::Unknown;
        for _ in 0 .. self.timing.transition_polls {
            tokio::time::sleep(self.timing.settle).await;
            observed = DriveState::classify(self.read_status().await?);
            if observed == expected {
                return Ok(observed);
            }
        }
        Err(AxisError::StateTransitionTimeout {expected, observed})
    }

    /**
        best-effort stop: clear the start bit and halt the current motion

        This never raises, a transport failure while stopping is only logged since the
        caller's priority is to not block on a stop request.
    */
    pub async fn stop(&mut self) {
        if let Err(err) = self.client.write(registers::cia402::controlword, command::HALT).await {
            log::warn!("stop failed: {err}");
        }
    }

    /// best-effort quick stop: immediate ramp-down, the drive leaves [DriveState::OperationEnabled]
    pub async fn quick_stop(&mut self) {
        if let Err(err) = self.client.write(registers::cia402::controlword, command::QUICK_STOP).await {
            log::warn!("quick stop failed: {err}");
        }
    }
}
