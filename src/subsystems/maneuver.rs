//! # Maneuver sequences
//!
//! Takeoff and landing built on top of the [mode](crate::subsystems::mode) and
//! [setpoint](crate::subsystems::setpoint) subsystems.
//!
//! A takeoff arms the vehicle and then streams a position setpoint above the origin. The altitude is never checked,
//! the flight controller is trusted to converge while the setpoint is streamed. If arming times out, no setpoint is
//! sent at all.
//!
//! A landing switches the vehicle to `AUTO.LAND` every tick until it reports being on the ground, then disarms it.
//! [Maneuver::land()] waits for as long as it takes: there is no timeout, the caller has to step in if the vehicle
//! never touches down. [Maneuver::land_with_cancel()] gives the caller a [CancelToken] to do so.
//!
//! ``` no_run
//! # async fn fly(controller: &mav_control::Controller) -> mav_control::Result<()> {
//! use mav_control::CommandOutcome;
//!
//! if controller.maneuver.takeoff(1.5, 10.0).await? == CommandOutcome::Success {
//!     controller.maneuver.land().await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::subsystems::mode::ModeControl;
use crate::subsystems::setpoint::{pose_from_xyz_rpy, Setpoint};
use crate::subsystems::telemetry::{LandedState, Telemetry};
use crate::ticker::Ticker;
use crate::{CommandOutcome, Result};

/// Guidance mode used to land
pub const LAND_MODE: &str = "AUTO.LAND";

/// Cooperative cancellation flag for long running maneuvers
///
/// Clones share the same flag. Maneuvers check it once per tick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Relaxed);
    }

    /// True once [CancelToken::cancel()] has been called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Relaxed)
    }
}

/// # Maneuver sequencer
///
/// See the [maneuver module documentation](crate::subsystems::maneuver) for more context and information.
pub struct Maneuver {
    mode: Arc<ModeControl>,
    setpoint: Arc<Setpoint>,
    telemetry: Telemetry,
    rate_hz: f64,
    arm_timeout: Duration,
}

impl Maneuver {
    pub(crate) fn new(
        mode: Arc<ModeControl>,
        setpoint: Arc<Setpoint>,
        telemetry: Telemetry,
        rate_hz: f64,
        arm_timeout: Duration,
    ) -> Self {
        Self {
            mode,
            setpoint,
            telemetry,
            rate_hz,
            arm_timeout,
        }
    }

    /// Arm and take off to `height` meters above the origin
    ///
    /// After arming, the setpoint `(0, 0, height)` with zero roll, pitch and yaw is streamed at the controller rate
    /// for `duration_s` seconds. If arming does not succeed the outcome of [ModeControl::arm()] is returned and no
    /// setpoint is sent.
    pub async fn takeoff(&self, height: f64, duration_s: f64) -> Result<CommandOutcome> {
        let outcome = self.mode.arm(self.arm_timeout).await?;
        if outcome != CommandOutcome::Success {
            warn!("Takeoff aborted, arming outcome: {:?}", outcome);
            return Ok(outcome);
        }

        let target = pose_from_xyz_rpy(0.0, 0.0, height, 0.0, 0.0, 0.0);
        self.setpoint.stream(target, self.rate_hz, duration_s).await;

        Ok(CommandOutcome::Success)
    }

    /// Land and disarm
    ///
    /// Requests [LAND_MODE] every tick until the vehicle reports being on the ground, then disarms it once. This
    /// never gives up.
    pub async fn land(&self) -> Result<()> {
        self.land_until(None).await.map(|_| ())
    }

    /// Land and disarm, unless `cancel` is triggered first
    ///
    /// Returns [CommandOutcome::Cancelled] without disarming if the token is cancelled before the vehicle reports
    /// being on the ground, and [CommandOutcome::Success] once landed and disarmed.
    pub async fn land_with_cancel(&self, cancel: &CancelToken) -> Result<CommandOutcome> {
        self.land_until(Some(cancel)).await
    }

    async fn land_until(&self, cancel: Option<&CancelToken>) -> Result<CommandOutcome> {
        let mut ticker = Ticker::every(self.rate_hz)?;
        loop {
            self.mode.set_mode(LAND_MODE).await?;
            ticker.tick().await;

            if self.telemetry.read_extended_state().landed_state == LandedState::OnGround {
                break;
            }
            if cancel.map_or(false, CancelToken::is_cancelled) {
                warn!("Landing cancelled");
                return Ok(CommandOutcome::Cancelled);
            }
        }

        info!("Changed mode: land");

        self.mode.disarm().await?;
        info!("Disarmed");

        Ok(CommandOutcome::Success)
    }
}
