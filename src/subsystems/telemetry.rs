//! # Telemetry mirror
//!
//! The vehicle reports its state asynchronously: connection and arming status, the extended landed state and the
//! local position estimate. This subsystem keeps the latest value of each of them so that the control loop can read
//! them synchronously at any time.
//!
//! The mirror is written by the telemetry dispatch task started by [Controller](crate::Controller) and read by the
//! other subsystems. Values are never synthesized: a read returns whatever the vehicle last reported, which may be
//! stale.
//!
//! ``` no_run
//! # fn report(controller: &mav_control::Controller) {
//! let state = controller.telemetry.read_state();
//! let (pose, stamp) = controller.telemetry.read_pose();
//! println!(
//!     "armed: {}, mode: {}, z: {:.2} m at {:?}",
//!     state.armed, state.guidance_mode, pose.position.z, stamp
//! );
//! # }
//! ```

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use nalgebra::{UnitQuaternion, Vector3};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::link::TelemetryUpdate;
use crate::Result;

/// Connection, arming and guidance mode status of the vehicle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleState {
    /// The flight controller is connected to the link
    pub connected: bool,
    /// The motors are armed
    pub armed: bool,
    /// Name of the active guidance mode, for example `OFFBOARD` or `AUTO.LAND`
    pub guidance_mode: String,
}

/// Landed state as reported by the vehicle
///
/// Discriminants follow the MAVLink `MAV_LANDED_STATE` enum so that a raw
/// value can be converted with `LandedState::try_from(u8)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum LandedState {
    /// Not reported yet, or the vehicle cannot tell
    #[default]
    Undefined = 0,
    /// On the ground, motors may still be armed
    OnGround = 1,
    /// Flying
    InAir = 2,
    /// Taking off
    Takeoff = 3,
    /// Landing
    Landing = 4,
}

/// Extended vehicle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendedVehicleState {
    /// Landed state
    pub landed_state: LandedState,
}

impl ExtendedVehicleState {
    /// Decode the raw `MAV_LANDED_STATE` value of an `EXTENDED_SYS_STATE` message
    ///
    /// Returns [Error::ProtocolError](crate::Error::ProtocolError) for values outside of the MAVLink enum.
    pub fn from_mavlink(landed_state: u8) -> Result<Self> {
        Ok(Self {
            landed_state: LandedState::try_from(landed_state)?,
        })
    }
}

/// Position and orientation in the local tangent-plane frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position (meters)
    pub position: Vector3<f64>,
    /// Orientation
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    /// Create a pose from a position and an orientation
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }
}

/// Timestamp attached by the vehicle to a pose update
///
/// The stamp is opaque to this crate. It is only echoed back in setpoints so
/// that the flight controller sees the time base it produced itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stamp {
    /// Seconds
    pub sec: i32,
    /// Nanoseconds within the second
    pub nanosec: u32,
}

impl Stamp {
    /// Create a stamp
    pub fn new(sec: i32, nanosec: u32) -> Self {
        Self { sec, nanosec }
    }
}

/// # Latest telemetry received from the vehicle
///
/// Each value sits in its own lock and is replaced as a whole, a reader never observes a partially updated value.
/// The handle is cheap to clone, all clones share the same cells.
///
/// See the [telemetry module documentation](crate::subsystems::telemetry) for more context and information.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    cells: Arc<Cells>,
}

#[derive(Debug, Default)]
struct Cells {
    state: RwLock<VehicleState>,
    extended_state: RwLock<ExtendedVehicleState>,
    pose: RwLock<(Pose, Stamp)>,
}

// A writer only ever does a single assignment, so a poisoned lock still holds a whole value.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl Telemetry {
    /// Create a mirror with every value at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the vehicle state
    pub fn update_state(&self, state: VehicleState) {
        *write(&self.cells.state) = state;
    }

    /// Replace the extended vehicle state
    pub fn update_extended_state(&self, extended_state: ExtendedVehicleState) {
        *write(&self.cells.extended_state) = extended_state;
    }

    /// Replace the pose and the stamp it was reported with
    pub fn update_pose(&self, pose: Pose, stamp: Stamp) {
        *write(&self.cells.pose) = (pose, stamp);
    }

    /// Apply an update received from the telemetry channel
    pub fn apply(&self, update: TelemetryUpdate) {
        match update {
            TelemetryUpdate::State(state) => self.update_state(state),
            TelemetryUpdate::ExtendedState(extended_state) => {
                self.update_extended_state(extended_state)
            }
            TelemetryUpdate::Pose(pose, stamp) => self.update_pose(pose, stamp),
        }
    }

    /// Snapshot of the vehicle state
    pub fn read_state(&self) -> VehicleState {
        read(&self.cells.state).clone()
    }

    /// Snapshot of the extended vehicle state
    pub fn read_extended_state(&self) -> ExtendedVehicleState {
        *read(&self.cells.extended_state)
    }

    /// Snapshot of the last pose and its stamp
    pub fn read_pose(&self) -> (Pose, Stamp) {
        *read(&self.cells.pose)
    }

    /// Stamp of the last pose update
    pub fn read_stamp(&self) -> Stamp {
        read(&self.cells.pose).1
    }
}
