/*!
    catalogue of the drive's dictionary objects used by this crate, and the bit layout of the
    command/status registers. This should be used instead of any hardcoded index value.

    The goal of this file is to gather every object the crate touches at one place, so what
    you see here is exactly what the drive exposes, no more, no less.
*/
#![allow(non_upper_case_globals)]

use core::fmt;
use core::marker::PhantomData;
use bilge::prelude::*;


/**
    trait for value types that can live in a dictionary object

    The wire representation is always little-endian and at most 4 bytes, carried around as a
    zero-extended `u64` between the codec and the typed layer.
*/
pub trait OdValue: Copy {
    /// byte size of the object on the wire, one of 1, 2 or 4
    const SIZE: u8;
    fn to_raw(self) -> u64;
    fn from_raw(raw: u64) -> Self;
}

macro_rules! odvalue {
    ($($int:ty = $size:literal),* $(,)?) => {$(
        impl OdValue for $int {
            const SIZE: u8 = $size;
            fn to_raw(self) -> u64  {self as u64 & ((1 << (8 * $size)) - 1)}
            fn from_raw(raw: u64) -> Self  {raw as $int}
        }
    )*};
}
odvalue!(u8 = 1, i8 = 1, u16 = 2, i16 = 2, u32 = 4, i32 = 4);

/// locator of one dictionary object: index, sub-index, and value type giving the byte size
pub struct Object<T> {
    pub index: u16,
    pub sub: u8,
    extracted: PhantomData<T>,
}
impl<T> Clone for Object<T> {
    fn clone(&self) -> Self  {*self}
}
impl<T> Copy for Object<T> {}
impl<T: OdValue> Object<T> {
    pub const fn new(index: u16, sub: u8) -> Self {
        Self {index, sub, extracted: PhantomData}
    }
    pub const fn size(&self) -> u8  {T::SIZE}
}
impl<T> fmt::Debug for Object<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:#06x}:{})", self.index, self.sub)
    }
}

/// device type (0x1000), handy to probe whether the peer actually speaks the gateway encapsulation
pub const device_type: Object<u32> = Object::new(0x1000, 0);

/// the standard device-control and motion objects
pub mod cia402 {
    use super::*;

    /// command register driving the device state machine
    pub const controlword: Object<u16> = Object::new(0x6040, 0);
    /// status register reporting the device state machine
    pub const statusword: Object<u16> = Object::new(0x6041, 0);
    /// requested operation mode
    pub const mode_of_operation: Object<u8> = Object::new(0x6060, 0);
    /// operation mode the drive actually runs, readback of [mode_of_operation]
    pub const mode_of_operation_display: Object<u8> = Object::new(0x6061, 0);
    /// commanded position for profile position mode
    pub const target_position: Object<i32> = Object::new(0x607a, 0);
    /// measured position
    pub const actual_position: Object<i32> = Object::new(0x6064, 0);
}

/// ramp parameters for profile position moves
pub mod profile {
    use super::*;

    pub const velocity: Object<u32> = Object::new(0x6081, 0);
    pub const acceleration: Object<u32> = Object::new(0x6083, 0);
    pub const deceleration: Object<u32> = Object::new(0x6084, 0);
}

/// parameters of the homing procedure
pub mod homing {
    use super::*;

    /// homing method selector, vendor-documented small integer
    pub const method: Object<u8> = Object::new(0x6098, 0);
    /// speed during search for the reference switch
    pub const speed_switch: Object<u32> = Object::new(0x6099, 1);
    /// speed during search for the zero position
    pub const speed_zero: Object<u32> = Object::new(0x6099, 2);
    pub const acceleration: Object<u32> = Object::new(0x609a, 0);
}

/// feed constant, converting shaft revolutions to user positions
pub mod feed {
    use super::*;

    pub const feed: Object<u32> = Object::new(0x6092, 1);
    pub const revolutions: Object<u32> = Object::new(0x6092, 2);
}


/// CiA 402 statusword bit layout. The 6 low state bits are interpreted by [crate::state::DriveState::classify], the remaining flags are independent
#[bitsize(16)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct StatusWord {
    pub ready_to_switch_on: bool,
    pub switched_on: bool,
    pub operation_enabled: bool,
    pub fault: bool,
    pub voltage_enabled: bool,
    /// low-active: false means a quick stop is being executed
    pub quick_stop: bool,
    pub switch_on_disabled: bool,
    pub warning: bool,
    reserved: u1,
    /// drive accepts commands from the bus, wired to the hardware enable input on these controllers
    pub remote: bool,
    /// the last commanded motion has completed
    pub target_reached: bool,
    pub internal_limit: bool,
    /// mode dependent: homing attained in homing mode, set-point acknowledged in profile position mode
    pub homing_attained: bool,
    /// mode dependent: homing error in homing mode
    pub homing_error: bool,
    reserved: u2,
}

/// CiA 402 controlword bit layout, see [crate::state::command] for the standard transition values
#[bitsize(16)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct ControlWord {
    pub switch_on: bool,
    pub enable_voltage: bool,
    /// low-active: clearing it requests a quick stop
    pub quick_stop: bool,
    pub enable_operation: bool,
    /// edge-triggered: starts homing or latches a new set-point on its rising edge
    pub new_setpoint: bool,
    /// apply a new set-point immediately instead of queuing it
    pub change_set_immediately: bool,
    /// interpret the target position as an offset from the previous one
    pub relative: bool,
    /// edge-triggered: resets a fault on its rising edge
    pub fault_reset: bool,
    pub halt: bool,
    reserved: u7,
}

/// operation modes supported by these drives (0x6060/0x6061)
#[bitsize(8)]
#[derive(TryFromBits, Debug, Copy, Clone, Eq, PartialEq)]
pub enum OperationMode {
    /// the drive ramps autonomously to a commanded target position
    ProfilePosition = 1,
    ProfileVelocity = 3,
    /// the drive searches its reference (zero) position
    Homing = 6,
}
