// Demo that takes off, hovers and lands a simulated vehicle
//
// The vehicle is a crude first order altitude model fed through a ChannelLink. It
// only arms after a few arming requests, like a flight controller running its
// pre-arm checks, and lands by itself once switched to AUTO.LAND.
//
// Run with `RUST_LOG=info cargo run --bin sim-flight` to see the controller logs.

use std::time::Duration;

use flume::{Receiver, Sender};
use log::info;
use mav_control::link::{telemetry_channel, ChannelLink, LinkCommand, TelemetryUpdate};
use mav_control::subsystems::maneuver::LAND_MODE;
use mav_control::subsystems::setpoint::pose_from_xyz_rpy;
use mav_control::subsystems::telemetry::{ExtendedVehicleState, LandedState, Stamp, VehicleState};
use mav_control::{CommandOutcome, Controller, ControllerConfig};

const PHYSICS_RATE_HZ: u32 = 50;
const ARM_REQUESTS_NEEDED: u32 = 3;
const CLIMB_GAIN: f64 = 0.05;
const DESCENT_SPEED: f64 = 0.5;

struct SimVehicle {
    state: VehicleState,
    arm_requests: u32,
    z: f64,
    target_z: f64,
    ticks: u32,
}

impl SimVehicle {
    fn new() -> Self {
        Self {
            state: VehicleState {
                connected: true,
                armed: false,
                guidance_mode: "MANUAL".to_owned(),
            },
            arm_requests: 0,
            z: 0.0,
            target_z: 0.0,
            ticks: 0,
        }
    }

    fn handle(&mut self, command: LinkCommand) {
        match command {
            LinkCommand::Arm { arm, reply } => {
                if arm {
                    self.arm_requests += 1;
                    self.state.armed = self.arm_requests >= ARM_REQUESTS_NEEDED;
                } else {
                    self.arm_requests = 0;
                    self.state.armed = false;
                }
                let _ = reply.send(true);
            }
            LinkCommand::SetMode { mode, reply } => {
                self.state.guidance_mode = mode;
                let _ = reply.send(true);
            }
            LinkCommand::Setpoint(setpoint) => {
                self.state.guidance_mode = "OFFBOARD".to_owned();
                self.target_z = setpoint.pose.position.z;
            }
            LinkCommand::Velocity(_) => (),
        }
    }

    fn step(&mut self) -> [TelemetryUpdate; 3] {
        let dt = 1.0 / PHYSICS_RATE_HZ as f64;
        self.ticks += 1;

        if self.state.armed {
            if self.state.guidance_mode == LAND_MODE {
                self.z = (self.z - DESCENT_SPEED * dt).max(0.0);
            } else {
                self.z += (self.target_z - self.z) * CLIMB_GAIN;
            }
        }

        let landed_state = if self.z < 0.02 {
            LandedState::OnGround
        } else if self.state.guidance_mode == LAND_MODE {
            LandedState::Landing
        } else {
            LandedState::InAir
        };

        let stamp = Stamp::new(
            (self.ticks / PHYSICS_RATE_HZ) as i32,
            (self.ticks % PHYSICS_RATE_HZ) * (1_000_000_000 / PHYSICS_RATE_HZ),
        );

        [
            TelemetryUpdate::State(self.state.clone()),
            TelemetryUpdate::ExtendedState(ExtendedVehicleState { landed_state }),
            TelemetryUpdate::Pose(pose_from_xyz_rpy(0.0, 0.0, self.z, 0.0, 0.0, 0.0), stamp),
        ]
    }

    async fn run(mut self, commands: Receiver<LinkCommand>, telemetry: Sender<TelemetryUpdate>) {
        let mut physics = tokio::time::interval(Duration::from_secs(1) / PHYSICS_RATE_HZ);
        loop {
            tokio::select! {
                command = commands.recv_async() => match command {
                    Ok(command) => self.handle(command),
                    Err(_) => return,
                },
                _ = physics.tick() => {
                    for update in self.step() {
                        if telemetry.send_async(update).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (link, commands) = ChannelLink::new();
    let (telemetry_tx, telemetry_rx) = telemetry_channel();
    tokio::spawn(SimVehicle::new().run(commands, telemetry_tx));

    let controller = Controller::connect(link, telemetry_rx, ControllerConfig::new(20.0)?).await?;

    match controller.maneuver.takeoff(1.5, 4.0).await? {
        CommandOutcome::Success => {
            let (pose, stamp) = controller.telemetry.read_pose();
            info!("Hovering at {:.2} m (stamp {:?})", pose.position.z, stamp);

            controller.maneuver.land().await?;
            let (pose, _) = controller.telemetry.read_pose();
            info!("Landed at {:.2} m", pose.position.z);
        }
        outcome => info!("Takeoff failed: {:?}", outcome),
    }

    controller.disconnect().await;
    Ok(())
}
