//! # Vehicle link
//!
//! The link is the boundary between this crate and the transport that talks to the flight controller (MAVROS topics
//! and services, a MAVLink connection, a simulator...). It has two halves:
//!  - Outbound, the [Link] trait carries the command primitives: position and velocity setpoints, mode change and
//!    arming requests.
//!  - Inbound, the transport pushes [TelemetryUpdate]s into a channel created with [telemetry_channel()]. The
//!    receiving end is handed to [Controller::connect()](crate::Controller::connect) which drains it into the
//!    [telemetry mirror](crate::subsystems::telemetry).
//!
//! Transports that prefer to consume commands from a queue can use [ChannelLink], which turns every call of the
//! [Link] trait into a [LinkCommand] message.

use async_trait::async_trait;
use flume::{Receiver, Sender};

use crate::subsystems::setpoint::{SetpointCommand, Twist};
use crate::subsystems::telemetry::{ExtendedVehicleState, Pose, Stamp, VehicleState};
use crate::Result;

/// Command primitives the transport has to provide
///
/// Request methods return `Ok(true)` when the flight controller acknowledged the request and `Ok(false)` when it
/// refused it. An acknowledge does not mean the vehicle reached the requested state, this is only observable through
/// telemetry.
///
/// An `Err` must only be returned when the transport itself failed.
#[async_trait]
pub trait Link: Send + Sync {
    /// Publish a position setpoint in the local frame
    async fn publish_setpoint_pose(&self, setpoint: &SetpointCommand) -> Result<()>;

    /// Publish a velocity setpoint
    async fn publish_velocity(&self, velocity: &Twist) -> Result<()>;

    /// Request a guidance mode change, for example to `AUTO.LAND`
    async fn request_mode_change(&self, mode: &str) -> Result<bool>;

    /// Request the vehicle to arm (`true`) or disarm (`false`)
    async fn request_arm(&self, arm: bool) -> Result<bool>;
}

/// Telemetry message pushed by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryUpdate {
    /// New vehicle state
    State(VehicleState),
    /// New extended vehicle state
    ExtendedState(ExtendedVehicleState),
    /// New local pose with the stamp the vehicle attached to it
    Pose(Pose, Stamp),
}

/// Create the channel used to deliver telemetry to a [Controller](crate::Controller)
pub fn telemetry_channel() -> (Sender<TelemetryUpdate>, Receiver<TelemetryUpdate>) {
    flume::unbounded()
}

/// Command message produced by [ChannelLink]
///
/// Requests carry a reply channel. The transport must send `true` (ack) or `false` (nack) on it. Dropping the reply
/// sender without answering makes the request fail with [Error::Disconnected](crate::Error::Disconnected).
#[derive(Debug)]
pub enum LinkCommand {
    /// Position setpoint
    Setpoint(SetpointCommand),
    /// Velocity setpoint
    Velocity(Twist),
    /// Mode change request
    SetMode {
        /// Requested mode
        mode: String,
        /// Ack/nack reply
        reply: Sender<bool>,
    },
    /// Arming request
    Arm {
        /// `true` to arm, `false` to disarm
        arm: bool,
        /// Ack/nack reply
        reply: Sender<bool>,
    },
}

/// [Link] implementation forwarding every primitive to a channel
#[derive(Debug, Clone)]
pub struct ChannelLink {
    uplink: Sender<LinkCommand>,
}

impl ChannelLink {
    /// Create a link and the receiver the transport consumes commands from
    pub fn new() -> (Self, Receiver<LinkCommand>) {
        let (uplink, rx) = flume::unbounded();
        (Self { uplink }, rx)
    }

    async fn request(&self, command: impl FnOnce(Sender<bool>) -> LinkCommand) -> Result<bool> {
        let (reply, answer) = flume::bounded(1);
        self.uplink.send_async(command(reply)).await?;
        Ok(answer.recv_async().await?)
    }
}

#[async_trait]
impl Link for ChannelLink {
    async fn publish_setpoint_pose(&self, setpoint: &SetpointCommand) -> Result<()> {
        self.uplink
            .send_async(LinkCommand::Setpoint(*setpoint))
            .await?;
        Ok(())
    }

    async fn publish_velocity(&self, velocity: &Twist) -> Result<()> {
        self.uplink
            .send_async(LinkCommand::Velocity(*velocity))
            .await?;
        Ok(())
    }

    async fn request_mode_change(&self, mode: &str) -> Result<bool> {
        let mode = mode.to_owned();
        self.request(|reply| LinkCommand::SetMode { mode, reply })
            .await
    }

    async fn request_arm(&self, arm: bool) -> Result<bool> {
        self.request(|reply| LinkCommand::Arm { arm, reply }).await
    }
}
