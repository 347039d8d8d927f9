//! # Mode and arming control
//!
//! Arming, disarming and guidance mode changes are requests: the flight controller acknowledges them, but whether
//! the vehicle actually reached the requested state is only known once its telemetry says so.
//!
//! [ModeControl::arm()] therefore keeps sending the arming request once per tick and checks the
//! [telemetry mirror](crate::subsystems::telemetry) after each tick until the vehicle reports being armed, or until
//! the timeout expires. The request is repeated because the flight controller may ignore an isolated request while it
//! is running its pre-arm checks.
//!
//! ``` no_run
//! # async fn arm(controller: &mav_control::Controller) -> mav_control::Result<()> {
//! use std::time::Duration;
//! use mav_control::CommandOutcome;
//!
//! match controller.mode.arm(Duration::from_secs(5)).await? {
//!     CommandOutcome::Success => println!("Armed"),
//!     outcome => println!("Arming failed: {:?}", outcome),
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info};

use crate::link::Link;
use crate::subsystems::telemetry::Telemetry;
use crate::ticker::{tick_count, Ticker};
use crate::{CommandOutcome, Result};

/// Arming as seen by this controller
///
/// The vehicle stays the authority on its true state, this only tracks what the controller last requested and
/// observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArmState {
    /// Disarmed, or arming timed out
    #[default]
    Disarmed,
    /// Arming requested, not yet confirmed by telemetry
    Arming,
    /// Telemetry reported the vehicle armed
    Armed,
}

/// # Access to mode and arming control
///
/// See the [mode module documentation](crate::subsystems::mode) for more context and information.
pub struct ModeControl {
    link: Arc<dyn Link>,
    telemetry: Telemetry,
    rate_hz: f64,
    arm_state: Mutex<ArmState>,
}

impl ModeControl {
    pub(crate) fn new(link: Arc<dyn Link>, telemetry: Telemetry, rate_hz: f64) -> Self {
        Self {
            link,
            telemetry,
            rate_hz,
            arm_state: Mutex::new(ArmState::Disarmed),
        }
    }

    fn set_arm_state(&self, state: ArmState) {
        *self.arm_state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Last arm state requested or observed by this controller
    pub fn arm_state(&self) -> ArmState {
        *self.arm_state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Arm the vehicle
    ///
    /// Sends an arming request every tick, for at most `timeout * rate` ticks, and returns
    /// [CommandOutcome::Success] as soon as telemetry reports the vehicle armed. Returns [CommandOutcome::TimedOut]
    /// otherwise. A refused request is not fatal, the next tick sends it again.
    ///
    /// An error is only returned if the link fails.
    pub async fn arm(&self, timeout: Duration) -> Result<CommandOutcome> {
        let mut ticker = Ticker::every(self.rate_hz)?;
        self.set_arm_state(ArmState::Arming);

        for attempt in 1..=tick_count(self.rate_hz, timeout.as_secs_f64()) {
            let request = self.link.request_arm(true).await;
            match request {
                Ok(true) => (),
                Ok(false) => debug!("Arming request {} refused", attempt),
                Err(e) => {
                    self.set_arm_state(ArmState::Disarmed);
                    return Err(e);
                }
            }

            ticker.tick().await;

            if self.telemetry.read_state().armed {
                info!("Armed");
                self.set_arm_state(ArmState::Armed);
                return Ok(CommandOutcome::Success);
            }
        }

        error!("Failed to arm");
        self.set_arm_state(ArmState::Disarmed);
        Ok(CommandOutcome::TimedOut)
    }

    /// Disarm the vehicle
    ///
    /// Sends a single disarming request. There is no retry and no wait for confirmation.
    pub async fn disarm(&self) -> Result<()> {
        let acked = self.link.request_arm(false).await?;
        if !acked {
            debug!("Disarming request refused");
        }
        self.set_arm_state(ArmState::Disarmed);
        Ok(())
    }

    /// Request a guidance mode change
    ///
    /// Returns [CommandOutcome::Success] if the flight controller acknowledged the request and
    /// [CommandOutcome::Rejected] otherwise. Use [Telemetry::read_state()] to confirm the mode took effect.
    pub async fn set_mode(&self, mode: &str) -> Result<CommandOutcome> {
        if self.link.request_mode_change(mode).await? {
            Ok(CommandOutcome::Success)
        } else {
            debug!("Mode change to {} refused", mode);
            Ok(CommandOutcome::Rejected)
        }
    }
}
