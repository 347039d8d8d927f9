use crate::link::{Link, TelemetryUpdate};
use crate::subsystems::maneuver::Maneuver;
use crate::subsystems::mode::ModeControl;
use crate::subsystems::setpoint::Setpoint;
use crate::subsystems::telemetry::Telemetry;

use crate::ticker::{check_rate, Ticker};
use crate::{Error, Result};
use flume::Receiver;
use futures::lock::Mutex;
use log::info;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default command and polling rate (Hz)
pub const DEFAULT_RATE_HZ: f64 = 20.0;

/// Default time given to the vehicle to confirm arming during a takeoff
pub const DEFAULT_ARM_TIMEOUT: Duration = Duration::from_secs(5);

/// # Controller configuration
///
/// The rate is used for everything that runs at a fixed rate: setpoint streaming during maneuvers, arming and
/// landing polls, and the wait for the vehicle connection. It is fixed for the lifetime of a [Controller].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    rate_hz: f64,
    /// Arming timeout used by [Maneuver::takeoff()]
    pub arm_timeout: Duration,
}

impl ControllerConfig {
    /// Configuration running at `rate_hz`, with the default arming timeout
    ///
    /// Returns [Error::InvalidArgument] if `rate_hz` is not a positive finite number.
    pub fn new(rate_hz: f64) -> Result<Self> {
        check_rate(rate_hz)?;
        Ok(Self {
            rate_hz,
            arm_timeout: DEFAULT_ARM_TIMEOUT,
        })
    }

    /// Set the arming timeout used by takeoffs
    pub fn with_arm_timeout(mut self, arm_timeout: Duration) -> Self {
        self.arm_timeout = arm_timeout;
        self
    }

    /// Command and polling rate (Hz)
    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            rate_hz: DEFAULT_RATE_HZ,
            arm_timeout: DEFAULT_ARM_TIMEOUT,
        }
    }
}

/// # The vehicle controller
///
/// Creating a controller starts the telemetry dispatch task and waits for the vehicle to report being connected.
/// Once disconnected, either by calling [Controller::disconnect()] or by dropping it, telemetry is no longer applied
/// and a new controller has to be created.
///
/// See the [mav-control crate root documentation](crate) for more context and information.
pub struct Controller {
    /// Latest telemetry received from the vehicle
    pub telemetry: Telemetry,
    /// Setpoint streaming
    pub setpoint: Arc<Setpoint>,
    /// Mode and arming control
    pub mode: Arc<ModeControl>,
    /// Takeoff and landing sequences
    pub maneuver: Maneuver,
    config: ControllerConfig,
    dispatch_task: Mutex<Option<JoinHandle<()>>>,
    disconnect: Arc<AtomicBool>,
}

impl Controller {
    /// Connect a controller to a vehicle
    ///
    /// `link` carries commands to the vehicle and `telemetry` is the receiving end of the channel created with
    /// [telemetry_channel()](crate::link::telemetry_channel) on which the transport pushes vehicle telemetry.
    ///
    /// This function only returns once the vehicle reported `connected`, there is no timeout. It returns
    /// [Error::Disconnected] if the telemetry channel is closed before that.
    pub async fn connect(
        link: impl Link + 'static,
        telemetry: Receiver<TelemetryUpdate>,
        config: ControllerConfig,
    ) -> Result<Self> {
        let mut ticker = Ticker::every(config.rate_hz)?;

        let disconnect = Arc::new(AtomicBool::new(false));
        let link: Arc<dyn Link> = Arc::new(link);
        let mirror = Telemetry::new();

        // Telemetry dispatcher
        let dispatch_task = Self::spawn_dispatch(telemetry, mirror.clone(), disconnect.clone());

        while !mirror.read_state().connected {
            // The dispatcher may have applied `connected` right before exiting
            if dispatch_task.is_finished() && !mirror.read_state().connected {
                return Err(Error::Disconnected);
            }
            ticker.tick().await;
        }

        let setpoint = Arc::new(Setpoint::new(link.clone(), mirror.clone(), config.rate_hz));
        let mode = Arc::new(ModeControl::new(link, mirror.clone(), config.rate_hz));
        let maneuver = Maneuver::new(
            mode.clone(),
            setpoint.clone(),
            mirror.clone(),
            config.rate_hz,
            config.arm_timeout,
        );

        info!("Controller initiated");

        Ok(Controller {
            telemetry: mirror,
            setpoint,
            mode,
            maneuver,
            config,
            dispatch_task: Mutex::new(Some(dispatch_task)),
            disconnect,
        })
    }

    fn spawn_dispatch(
        downlink: Receiver<TelemetryUpdate>,
        mirror: Telemetry,
        disconnect: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while !disconnect.load(Relaxed) {
                match tokio::time::timeout(Duration::from_millis(200), downlink.recv_async()).await {
                    Ok(Ok(update)) => mirror.apply(update),
                    Err(_) => continue,
                    Ok(Err(_)) => return, // Transport dropped its sender
                }
            }
        })
    }

    /// Configuration the controller was created with
    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    /// Stop applying telemetry
    ///
    /// Once this function returns the dispatch task has exited and the [telemetry mirror](Controller::telemetry)
    /// keeps its last values forever.
    pub async fn disconnect(&self) {
        self.disconnect.store(true, Relaxed);

        if let Some(dispatch_task) = self.dispatch_task.lock().await.take() {
            // The task only ends by returning, a JoinError would mean it was aborted or panicked
            let _ = dispatch_task.await;
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.disconnect.store(true, Relaxed);
    }
}
