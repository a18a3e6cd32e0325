/*!
    sequencing of homing and profile position moves on one axis.

    Both procedures follow the same shape: check the drive is operational, switch the
    operation mode (verified through the mode display, a silent write is never assumed to
    have worked), write the profile parameters, then pulse the controlword start bit as a
    rising edge and poll the statusword until completion, abort or the bounded ceiling.

    The start bit is edge-triggered on these drives. Leaving it set between polls would make
    every poll cycle a potential re-trigger, so the pulse is always `set, short delay, clear`
    and the resting controlword keeps the bit low.
*/

use crate::{
    axis::Axis,
    error::{AxisError, AxisResult},
    registers::{self, ControlWord, OperationMode, StatusWord},
    socket::GatewaySocket,
    state::{command, DriveState},
    };


/**
    parameters of the homing procedure

    The defaults are the values the axes of this gantry were commissioned with: search and
    zero speeds of 6000, acceleration 100000, and a feed constant of 5400 per shaft
    revolution. `method` is only written when set, drives keep their configured method
    otherwise.
*/
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HomingProfile {
    /// homing method selector (0x6098), written only when `Some`
    pub method: Option<u8>,
    /// speed while searching for the reference switch
    pub speed_switch: u32,
    /// speed while searching for the zero position
    pub speed_zero: u32,
    pub acceleration: u32,
    /// feed constant numerator (0x6092:1)
    pub feed: u32,
    /// shaft revolutions for the feed constant (0x6092:2)
    pub revolutions: u32,
}

impl Default for HomingProfile {
    fn default() -> Self {
        Self {
            method: None,
            speed_switch: 6000,
            speed_zero: 6000,
            acceleration: 100_000,
            feed: 5400,
            revolutions: 1,
        }
    }
}

/// ramp parameters of a profile position move, defaults are the jog values of the original gantry
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MotionProfile {
    pub velocity: u32,
    pub acceleration: u32,
    pub deceleration: u32,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {velocity: 50, acceleration: 200, deceleration: 200}
    }
}

/// how the target position of a move is interpreted. The sequencer never infers this, callers select it explicitly
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Positioning {
    /// target is an absolute position
    Absolute,
    /// target is an offset from the previous commanded target
    Relative,
}

/// outcome of one completion poll
pub(crate) enum Poll {
    Busy,
    Done,
    Left(DriveState),
}

impl<S: GatewaySocket> Axis<S> {
    /**
        run the homing procedure and wait for its completion

        The drive must already be in [DriveState::OperationEnabled] (call
        [Axis::bring_up] first), otherwise this fails fast with
        [AxisError::NotOperational] instead of queueing anything.
    */
    pub async fn home(&mut self, profile: &HomingProfile) -> AxisResult<()> {
        self.require_operational().await?;
        self.set_mode(OperationMode::Homing).await?;

        if let Some(method) = profile.method {
            self.client().write(registers::homing::method, method).await?;
        }
        self.client().write(registers::homing::speed_switch, profile.speed_switch).await?;
        self.client().write(registers::homing::speed_zero, profile.speed_zero).await?;
        self.client().write(registers::homing::acceleration, profile.acceleration).await?;
        self.client().write(registers::feed::feed, profile.feed).await?;
        self.client().write(registers::feed::revolutions, profile.revolutions).await?;

        self.start_edge(command::ENABLE_OPERATION).await?;
        log::debug!("homing started");

        for _ in 0 .. self.timing().homing_polls {
            tokio::time::sleep(self.timing().poll).await;
            match self.poll_homing().await? {
                Poll::Done => {
                    log::debug!("homing attained");
                    return Ok(());
                }
                Poll::Left(state) => return Err(AxisError::NotOperational(state)),
                Poll::Busy => continue,
            }
        }
        Err(AxisError::HomingTimeout)
    }

    /**
        run a profile position move to `target` and wait for its completion

        Same preconditions as [Axis::home]. The target is written as-is; whether the drive
        treats it as absolute or as an offset from the last commanded target is selected by
        `positioning` through the controlword relative bit.
    */
    pub async fn move_to(&mut self, target: i32, profile: &MotionProfile, positioning: Positioning) -> AxisResult<()> {
        self.require_operational().await?;
        self.set_mode(OperationMode::ProfilePosition).await?;
        self.setup_move(target, profile).await?;
        self.start_move(positioning).await?;
        log::debug!("move to {target} started");

        for _ in 0 .. self.timing().motion_polls {
            tokio::time::sleep(self.timing().poll).await;
            match self.poll_move().await? {
                Poll::Done => return Ok(()),
                Poll::Left(state) => return Err(AxisError::NotOperational(state)),
                Poll::Busy => {
                    if let Ok(position) = self.position().await {
                        log::debug!("moving, position {position}");
                    }
                }
            }
        }
        Err(AxisError::MoveTimeout)
    }

    /// fail fast unless the drive is currently [DriveState::OperationEnabled]
    pub(crate) async fn require_operational(&mut self) -> AxisResult<()> {
        match self.status().await? {
            DriveState::OperationEnabled => Ok(()),
            state => Err(AxisError::NotOperational(state)),
        }
    }

    /**
        switch the operation mode, verified by reading the mode display back

        The write is not assumed to have succeeded silently: the display must echo the
        requested mode within the transition poll ceiling.
    */
    pub(crate) async fn set_mode(&mut self, mode: OperationMode) -> AxisResult<()> {
        let requested = u8::from(mode);
        if self.client().read(registers::cia402::mode_of_operation_display).await? == requested {
            return Ok(());
        }
        self.client().write(registers::cia402::mode_of_operation, requested).await?;
        for _ in 0 .. self.timing().transition_polls {
            tokio::time::sleep(self.timing().settle).await;
            if self.client().read(registers::cia402::mode_of_operation_display).await? == requested {
                return Ok(());
            }
        }
        Err(AxisError::ModeSwitchTimeout(mode))
    }

    /// write the ramp parameters and the target of a profile position move, without starting it
    pub(crate) async fn setup_move(&mut self, target: i32, profile: &MotionProfile) -> AxisResult<()> {
        self.client().write(registers::profile::velocity, profile.velocity).await?;
        self.client().write(registers::profile::acceleration, profile.acceleration).await?;
        self.client().write(registers::profile::deceleration, profile.deceleration).await?;
        self.client().write(registers::cia402::target_position, target).await?;
        Ok(())
    }

    /// pulse the start bit for a move with the given positioning
    pub(crate) async fn start_move(&mut self, positioning: Positioning) -> AxisResult<()> {
        let mut resting = ControlWord::from(command::ENABLE_OPERATION);
        if positioning == Positioning::Relative {
            resting.set_relative(true);
        }
        self.start_edge(u16::from(resting)).await
    }

    /// rising edge on the controlword start bit: set on top of `resting`, short delay, back to `resting`
    async fn start_edge(&mut self, resting: u16) -> AxisResult<()> {
        let mut start = ControlWord::from(resting);
        start.set_new_setpoint(true);
        self.client().write(registers::cia402::controlword, u16::from(start)).await?;
        tokio::time::sleep(self.timing().settle).await;
        self.client().write(registers::cia402::controlword, resting).await?;
        Ok(())
    }

    /// one homing completion poll: done on target-reached or the vendor homing-attained bit
    async fn poll_homing(&mut self) -> AxisResult<Poll> {
        self.poll_completion(|word| word.target_reached() || word.homing_attained()).await
    }
    /// one move completion poll: done on target-reached
    pub(crate) async fn poll_move(&mut self) -> AxisResult<Poll> {
        self.poll_completion(|word| word.target_reached()).await
    }

    async fn poll_completion(&mut self, done: impl Fn(StatusWord) -> bool) -> AxisResult<Poll> {
        if self.abort_requested() {
            self.stop().await;
            return Err(AxisError::Aborted);
        }
        let status = self.read_status().await?;
        match DriveState::classify(status) {
            DriveState::OperationEnabled => {
                if done(StatusWord::from(status)) {Ok(Poll::Done)}
                else {Ok(Poll::Busy)}
            }
            // fault or dropped enable aborts the motion
            state => Ok(Poll::Left(state)),
        }
    }
}
