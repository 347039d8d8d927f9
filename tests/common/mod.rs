// Scripted vehicle shared by the integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flume::{Receiver, Sender};
use mav_control::link::{telemetry_channel, Link, TelemetryUpdate};
use mav_control::subsystems::maneuver::LAND_MODE;
use mav_control::subsystems::setpoint::{SetpointCommand, Twist};
use mav_control::subsystems::telemetry::{
    ExtendedVehicleState, LandedState, Pose, Stamp, VehicleState,
};
use mav_control::{Controller, ControllerConfig, Error, Result};

/// Rate used by the tests, 100 ms per tick
pub const RATE_HZ: f64 = 10.0;

#[derive(Debug, Default)]
pub struct Record {
    pub setpoints: Vec<SetpointCommand>,
    pub velocities: Vec<Twist>,
    pub modes: Vec<String>,
    pub arm_requests: Vec<bool>,
}

#[derive(Debug)]
struct Script {
    state: VehicleState,
    arm_after: Option<usize>,
    ground_after: Option<usize>,
    ack: bool,
    link_down: bool,
    advance_stamp: bool,
    stamp: Stamp,
}

/// Vehicle that answers the [Link] primitives and reports telemetry according to a script
///
/// Every call is recorded. Telemetry goes through the same channel a real transport would use.
#[derive(Clone)]
pub struct SimVehicle {
    record: Arc<Mutex<Record>>,
    script: Arc<Mutex<Script>>,
    telemetry: Sender<TelemetryUpdate>,
}

/// Show the controller logs when a test is run with RUST_LOG set
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

impl SimVehicle {
    pub fn new() -> (Self, Receiver<TelemetryUpdate>) {
        init_logging();

        let (telemetry, rx) = telemetry_channel();
        let sim = Self {
            record: Default::default(),
            script: Arc::new(Mutex::new(Script {
                state: VehicleState {
                    connected: true,
                    armed: false,
                    guidance_mode: "MANUAL".to_owned(),
                },
                arm_after: None,
                ground_after: None,
                ack: true,
                link_down: false,
                advance_stamp: false,
                stamp: Stamp::default(),
            })),
            telemetry,
        };
        (sim, rx)
    }

    /// Report armed when the k-th arming request is received
    pub fn arm_after(self, k: usize) -> Self {
        self.script.lock().unwrap().arm_after = Some(k);
        self
    }

    /// Report on ground when the n-th land mode request is received
    pub fn ground_after(self, n: usize) -> Self {
        self.script.lock().unwrap().ground_after = Some(n);
        self
    }

    /// Refuse every request
    pub fn nack(self) -> Self {
        self.script.lock().unwrap().ack = false;
        self
    }

    /// Publish a new pose stamp, one second later, after every setpoint received
    pub fn advance_stamp(self) -> Self {
        self.script.lock().unwrap().advance_stamp = true;
        self
    }

    /// Make every primitive fail as if the transport was gone
    pub fn link_down(&self) {
        self.script.lock().unwrap().link_down = true;
    }

    /// Push telemetry, dropped silently once the controller stopped listening
    pub fn send(&self, update: TelemetryUpdate) {
        let _ = self.telemetry.send(update);
    }

    pub fn send_pose(&self, pose: Pose, stamp: Stamp) {
        self.script.lock().unwrap().stamp = stamp;
        self.send(TelemetryUpdate::Pose(pose, stamp));
    }

    /// Report the current scripted state, connected, and connect a controller to it
    pub async fn connect(&self, rx: Receiver<TelemetryUpdate>) -> Controller {
        self.connect_with(rx, ControllerConfig::new(RATE_HZ).unwrap())
            .await
    }

    pub async fn connect_with(
        &self,
        rx: Receiver<TelemetryUpdate>,
        config: ControllerConfig,
    ) -> Controller {
        let state = self.script.lock().unwrap().state.clone();
        self.send(TelemetryUpdate::State(state));
        Controller::connect(self.clone(), rx, config).await.unwrap()
    }

    pub fn record(&self) -> std::sync::MutexGuard<'_, Record> {
        self.record.lock().unwrap()
    }

    fn check_link(&self) -> Result<()> {
        if self.script.lock().unwrap().link_down {
            Err(Error::Disconnected)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Link for SimVehicle {
    async fn publish_setpoint_pose(&self, setpoint: &SetpointCommand) -> Result<()> {
        self.check_link()?;
        self.record().setpoints.push(*setpoint);

        let mut script = self.script.lock().unwrap();
        if script.advance_stamp {
            script.stamp.sec += 1;
            let stamp = script.stamp;
            drop(script);
            self.send(TelemetryUpdate::Pose(setpoint.pose, stamp));
        }
        Ok(())
    }

    async fn publish_velocity(&self, velocity: &Twist) -> Result<()> {
        self.check_link()?;
        self.record().velocities.push(*velocity);
        Ok(())
    }

    async fn request_mode_change(&self, mode: &str) -> Result<bool> {
        self.check_link()?;
        let land_requests = {
            let mut record = self.record();
            record.modes.push(mode.to_owned());
            record.modes.iter().filter(|m| *m == LAND_MODE).count()
        };

        let mut script = self.script.lock().unwrap();
        if script.ack {
            script.state.guidance_mode = mode.to_owned();
            self.send(TelemetryUpdate::State(script.state.clone()));
        }
        if mode == LAND_MODE && script.ground_after == Some(land_requests) {
            self.send(TelemetryUpdate::ExtendedState(ExtendedVehicleState {
                landed_state: LandedState::OnGround,
            }));
        }
        Ok(script.ack)
    }

    async fn request_arm(&self, arm: bool) -> Result<bool> {
        self.check_link()?;
        let arm_requests = {
            let mut record = self.record();
            record.arm_requests.push(arm);
            record.arm_requests.iter().filter(|a| **a).count()
        };

        let mut script = self.script.lock().unwrap();
        if !arm {
            script.state.armed = false;
            self.send(TelemetryUpdate::State(script.state.clone()));
        } else if script.arm_after == Some(arm_requests) {
            script.state.armed = true;
            self.send(TelemetryUpdate::State(script.state.clone()));
        }
        Ok(script.ack)
    }
}
