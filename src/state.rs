/*!
    the canonical CiA 402 device state machine: classification of a statusword into a drive
    state, and the controlword values walking the chain toward [DriveState::OperationEnabled].

    Classification is recomputed from every freshly read statusword and never cached as
    authoritative, the drive may change state on its own (enable input dropped, fault, ...).
*/

use core::fmt;


/// standard controlword command values, one per legal transition of the state machine
pub mod command {
    /// `SwitchOnDisabled -> ReadyToSwitchOn`
    pub const SHUTDOWN: u16 = 0x0006;
    /// `ReadyToSwitchOn -> SwitchedOn`
    pub const SWITCH_ON: u16 = 0x0007;
    /// `SwitchedOn -> OperationEnabled`, also the resting value that keeps the start bit cleared
    pub const ENABLE_OPERATION: u16 = 0x000f;
    /// `Fault -> SwitchOnDisabled`, only meaningful from [super::DriveState::Fault]
    pub const FAULT_RESET: u16 = 0x0080;
    /// requests an immediate quick-stop ramp (bit 2 cleared)
    pub const QUICK_STOP: u16 = 0x0002;
    /// keeps the drive enabled but halts the current motion (bit 8 set)
    pub const HALT: u16 = 0x010f;
}

/// canonical drive state, decoded from the 6 low statusword state bits
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DriveState {
    /// the controller is still initializing, it transitions to [Self::SwitchOnDisabled] on its own
    NotReadyToSwitchOn,
    SwitchOnDisabled,
    ReadyToSwitchOn,
    SwitchedOn,
    /// power stage on, motion commands are accepted
    OperationEnabled,
    /// a fault latched, [command::FAULT_RESET] is required before anything else
    Fault,
    /// bit pattern matching no canonical state (quick-stop active, or garbage)
    Unknown,
}

impl DriveState {
    /**
        classify a freshly read statusword

        The masks are applied in this fixed priority, first match wins. The two mask widths
        (0x4f and 0x6f) follow the standard: bit 5 (quick stop) only discriminates the three
        powered states.
    */
    pub fn classify(status: u16) -> Self {
        if status & 0x004f == 0x0008        {Self::Fault}
        else if status & 0x006f == 0x0027   {Self::OperationEnabled}
        else if status & 0x006f == 0x0023   {Self::SwitchedOn}
        else if status & 0x006f == 0x0021   {Self::ReadyToSwitchOn}
        else if status & 0x004f == 0x0040   {Self::SwitchOnDisabled}
        else if status & 0x004f == 0x0000   {Self::NotReadyToSwitchOn}
        else                                {Self::Unknown}
    }

    /**
        controlword advancing one step toward [Self::OperationEnabled], or None when there is
        no command to send from this state (already enabled, or the drive must transition by
        itself as from [Self::NotReadyToSwitchOn])
    */
    pub fn advance(self) -> Option<u16> {
        match self {
            Self::SwitchOnDisabled => Some(command::SHUTDOWN),
            Self::ReadyToSwitchOn => Some(command::SWITCH_ON),
            Self::SwitchedOn => Some(command::ENABLE_OPERATION),
            Self::Fault => Some(command::FAULT_RESET),
            _ => None,
        }
    }

    /// state expected after sending the controlword from [Self::advance]
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::SwitchOnDisabled => Some(Self::ReadyToSwitchOn),
            Self::ReadyToSwitchOn => Some(Self::SwitchedOn),
            Self::SwitchedOn => Some(Self::OperationEnabled),
            Self::Fault => Some(Self::SwitchOnDisabled),
            _ => None,
        }
    }
}

impl fmt::Display for DriveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotReadyToSwitchOn => "not ready to switch on",
            Self::SwitchOnDisabled => "switch on disabled",
            Self::ReadyToSwitchOn => "ready to switch on",
            Self::SwitchedOn => "switched on",
            Self::OperationEnabled => "operation enabled",
            Self::Fault => "fault",
            Self::Unknown => "unknown",
        })
    }
}
