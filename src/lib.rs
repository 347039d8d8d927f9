//! # MAV control library
//!
//! This crate sequences the flight of a vehicle flown in offboard (guided) mode: arming, takeoff to an altitude,
//! hovering and landing. It talks to the flight controller through a [Link], implemented on top of whatever
//! transport is available (MAVROS, a MAVLink connection, a simulator...), and follows the vehicle state through a
//! channel of [TelemetryUpdate]s pushed by the same transport.
//!
//! ## Commands and state
//!
//! Commands are sent optimistically and their effect is only confirmed later, when the vehicle telemetry reports it.
//! The subsystems deal with this in three ways:
//!  - [Setpoint](subsystems::setpoint) streams position setpoints at a fixed rate. The flight controller leaves
//!    offboard mode if setpoints stop arriving, so maneuvers keep streaming even while they wait.
//!  - [Mode](subsystems::mode) repeats arming requests every tick until telemetry shows the vehicle armed, or the
//!    timeout expires.
//!  - [Maneuver](subsystems::maneuver) composes both into takeoff and landing sequences.
//!
//! Expected failures such as an arming timeout or a refused mode change are reported as a [CommandOutcome]. Only a
//! failing link is reported as an [Error].
//!
//! ## Usage
//!
//! The basic procedure to use the lib is:
//!  - Create a telemetry channel with [link::telemetry_channel()] and have the transport push vehicle telemetry in it
//!  - Implement [Link] for the transport, or use [link::ChannelLink] and consume the commands it produces
//!  - Create a [Controller] with [Controller::connect()], this waits for the vehicle to report being connected
//!  - Subsystems are available as public fields of the [Controller] struct
//!  - Drop the Controller object or call [Controller::disconnect()]
//!
//! All subsystems functions are only taking an un-mutable reference to self (`&self`), the intention is for the
//! Controller object to be shared between tasks using `Arc<>`.
//!
//! For example:
//! ``` no_run
//! # async fn fly() -> Result<(), Box<dyn std::error::Error>> {
//! use mav_control::{link, CommandOutcome, Controller, ControllerConfig};
//!
//! let (link, _commands) = link::ChannelLink::new();
//! let (_telemetry_tx, telemetry_rx) = link::telemetry_channel();
//!
//! // Hand `_commands` and `_telemetry_tx` to the transport here
//!
//! let controller = Controller::connect(link, telemetry_rx, ControllerConfig::new(20.0)?).await?;
//!
//! if controller.maneuver.takeoff(2.0, 10.0).await? == CommandOutcome::Success {
//!     controller.maneuver.land().await?;
//! }
//!
//! controller.disconnect().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod controller;
mod error;
mod ticker;

pub mod link;
pub mod subsystems;

pub use crate::controller::{Controller, ControllerConfig, DEFAULT_ARM_TIMEOUT, DEFAULT_RATE_HZ};
pub use crate::error::{Error, Result};
pub use crate::link::{Link, TelemetryUpdate};

/// Result of a blocking command
///
/// Returned by every operation that waits for the vehicle. None of these outcomes is an error: the caller decides
/// whether to retry, abort or escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The vehicle acknowledged the command, or reached the requested state
    Success,
    /// The vehicle did not reach the requested state before the timeout
    TimedOut,
    /// The flight controller refused the request
    Rejected,
    /// The caller cancelled the operation
    Cancelled,
}
