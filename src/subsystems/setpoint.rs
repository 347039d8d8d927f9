//! # Setpoint streaming
//!
//! In offboard (guided) mode the flight controller expects a continuous flow of setpoints. If the flow stops for too
//! long the vehicle leaves offboard mode and falls back to a failsafe. This subsystem sends position setpoints at a
//! fixed rate for a given duration, or one at a time for callers doing their own pacing.
//!
//! Every setpoint carries the stamp of the last pose received from the vehicle, not the local clock. The flight
//! controller may reject setpoints whose stamp looks stale compared to its own time base.
//!
//! Sending is fire-and-forget: a setpoint the transport fails to send is logged and the stream goes on.
//!
//! The following example holds the vehicle one meter above the origin for two seconds:
//! ``` no_run
//! # async fn hover(controller: &mav_control::Controller) {
//! use mav_control::subsystems::setpoint::pose_from_xyz_rpy;
//!
//! let target = pose_from_xyz_rpy(0.0, 0.0, 1.0, 0.0, 0.0, 0.0);
//! controller.setpoint.stream(target, 20.0, 2.0).await;
//! # }
//! ```

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use log::warn;
use nalgebra::{UnitQuaternion, Vector3};

use crate::link::Link;
use crate::subsystems::telemetry::{Pose, Stamp, Telemetry};
use crate::ticker::{tick_count, Ticker};

/// Yaw correction between the maneuver yaw convention and the vehicle body yaw
///
/// Added to every yaw passed to [orientation_from_rpy()].
pub const YAW_OFFSET: f64 = FRAC_PI_2;

/// Orientation for the given roll, pitch and yaw (radians, static XYZ axes)
///
/// [YAW_OFFSET] is applied to `yaw` before the conversion.
pub fn orientation_from_rpy(roll: f64, pitch: f64, yaw: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(roll, pitch, yaw + YAW_OFFSET)
}

/// Pose at `(x, y, z)` (meters, local frame) with the orientation from [orientation_from_rpy()]
pub fn pose_from_xyz_rpy(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Pose {
    Pose::new(Vector3::new(x, y, z), orientation_from_rpy(roll, pitch, yaw))
}

/// Position setpoint as sent to the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointCommand {
    /// Target pose
    pub pose: Pose,
    /// Stamp of the last pose received from the vehicle
    pub stamp: Stamp,
}

/// Linear (m/s) and angular (rad/s) velocity setpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist {
    /// Linear velocity
    pub linear: Vector3<f64>,
    /// Angular velocity
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
        }
    }
}

/// # Setpoint streamer
///
/// See the [setpoint module documentation](crate::subsystems::setpoint) for more context and information.
pub struct Setpoint {
    link: Arc<dyn Link>,
    telemetry: Telemetry,
    rate_hz: f64,
}

impl Setpoint {
    pub(crate) fn new(link: Arc<dyn Link>, telemetry: Telemetry, rate_hz: f64) -> Self {
        Self {
            link,
            telemetry,
            rate_hz,
        }
    }

    /// Send `target` `round(rate_hz * duration_s)` times, one setpoint per tick
    ///
    /// The call returns after the last tick. A non-positive or non-finite `rate_hz` sends nothing.
    pub async fn stream(&self, target: Pose, rate_hz: f64, duration_s: f64) {
        let ticks = tick_count(rate_hz, duration_s);
        if ticks == 0 {
            return;
        }
        let mut ticker = match Ticker::every(rate_hz) {
            Ok(ticker) => ticker,
            Err(e) => {
                warn!("Setpoint stream not started: {}", e);
                return;
            }
        };

        for _ in 0..ticks {
            self.stream_once(target).await;
            ticker.tick().await;
        }
    }

    /// Send `target` once, without waiting
    pub async fn stream_once(&self, target: Pose) {
        let setpoint = SetpointCommand {
            pose: target,
            stamp: self.telemetry.read_stamp(),
        };

        if let Err(e) = self.link.publish_setpoint_pose(&setpoint).await {
            warn!("Setpoint dropped: {}", e);
        }
    }

    /// Go to a pose given as position and roll/pitch/yaw (meters, radians)
    ///
    /// If `looping` is true the setpoint is streamed at the controller rate for `duration_s`. Otherwise it is sent
    /// once, followed by one tick of wait.
    #[allow(clippy::too_many_arguments)]
    pub async fn goto_xyz_rpy(
        &self,
        x: f64,
        y: f64,
        z: f64,
        roll: f64,
        pitch: f64,
        yaw: f64,
        duration_s: f64,
        looping: bool,
    ) {
        let target = pose_from_xyz_rpy(x, y, z, roll, pitch, yaw);

        if looping {
            self.stream(target, self.rate_hz, duration_s).await;
        } else {
            self.stream_once(target).await;
            if let Ok(mut ticker) = Ticker::every(self.rate_hz) {
                ticker.tick().await;
            }
        }
    }

    /// Send a velocity setpoint
    ///
    /// Like position setpoints, velocity setpoints must be repeated by the caller to keep the vehicle in offboard
    /// mode.
    pub async fn send_velocity(&self, velocity: &Twist) {
        if let Err(e) = self.link.publish_velocity(velocity).await {
            warn!("Velocity setpoint dropped: {}", e);
        }
    }

    /// Rate used by the maneuvers (Hz)
    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }
}
