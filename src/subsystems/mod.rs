//! # Controller subsystems
//!
//! The controller is organized in subsystems, each with one logical role. The
//! [telemetry](crate::subsystems::telemetry) mirror is the only one fed by the
//! vehicle, the others send commands and read the mirror to know when a
//! command took effect.
//!
//! Modules here implement the Rust API for the different subsystems, they are
//! exposed as public fields of [Controller](crate::Controller).

pub mod maneuver;
pub mod mode;
pub mod setpoint;
pub mod telemetry;
