mod common;

use std::time::Duration;

use common::{SimVehicle, RATE_HZ};
use mav_control::subsystems::mode::ArmState;
use mav_control::{CommandOutcome, Error};
use tokio::time::Instant;

const TICK: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn arm_succeeds_on_the_tick_the_vehicle_reports_armed() {
    let (sim, rx) = SimVehicle::new();
    let sim = sim.arm_after(3);
    let controller = sim.connect(rx).await;

    let start = Instant::now();
    let outcome = controller.mode.arm(Duration::from_secs(1)).await.unwrap();

    assert_eq!(outcome, CommandOutcome::Success);
    assert_eq!(start.elapsed(), 3 * TICK);
    assert_eq!(sim.record().arm_requests, vec![true; 3]);
    assert_eq!(controller.mode.arm_state(), ArmState::Armed);
}

#[tokio::test(start_paused = true)]
async fn arm_succeeds_on_the_last_allowed_tick() {
    let (sim, rx) = SimVehicle::new();
    let sim = sim.arm_after(10);
    let controller = sim.connect(rx).await;

    let outcome = controller.mode.arm(Duration::from_secs(1)).await.unwrap();

    assert_eq!(outcome, CommandOutcome::Success);
    assert_eq!(sim.record().arm_requests.len(), (RATE_HZ * 1.0) as usize);
}

#[tokio::test(start_paused = true)]
async fn arm_times_out_after_rate_times_timeout_requests() {
    let (sim, rx) = SimVehicle::new();
    let sim = sim.arm_after(11);
    let controller = sim.connect(rx).await;

    let start = Instant::now();
    let outcome = controller.mode.arm(Duration::from_secs(1)).await.unwrap();

    assert_eq!(outcome, CommandOutcome::TimedOut);
    assert_eq!(start.elapsed(), 10 * TICK);
    assert_eq!(sim.record().arm_requests, vec![true; 10]);
    assert_eq!(controller.mode.arm_state(), ArmState::Disarmed);
}

#[tokio::test(start_paused = true)]
async fn arm_keeps_requesting_when_refused() {
    let (sim, rx) = SimVehicle::new();
    let sim = sim.nack().arm_after(4);
    let controller = sim.connect(rx).await;

    let outcome = controller.mode.arm(Duration::from_secs(2)).await.unwrap();

    assert_eq!(outcome, CommandOutcome::Success);
    assert_eq!(sim.record().arm_requests, vec![true; 4]);
}

#[tokio::test(start_paused = true)]
async fn arm_with_zero_timeout_sends_nothing() {
    let (sim, rx) = SimVehicle::new();
    let sim = sim.arm_after(1);
    let controller = sim.connect(rx).await;

    let outcome = controller.mode.arm(Duration::ZERO).await.unwrap();

    assert_eq!(outcome, CommandOutcome::TimedOut);
    assert!(sim.record().arm_requests.is_empty());
}

#[tokio::test(start_paused = true)]
async fn arm_reports_a_failing_link() {
    let (sim, rx) = SimVehicle::new();
    let controller = sim.connect(rx).await;
    sim.link_down();

    let result = controller.mode.arm(Duration::from_secs(1)).await;

    assert_eq!(result, Err(Error::Disconnected));
    assert_eq!(controller.mode.arm_state(), ArmState::Disarmed);
}

#[tokio::test(start_paused = true)]
async fn disarm_sends_a_single_request() {
    let (sim, rx) = SimVehicle::new();
    let sim = sim.arm_after(1);
    let controller = sim.connect(rx).await;

    controller.mode.arm(Duration::from_secs(1)).await.unwrap();
    let start = Instant::now();
    controller.mode.disarm().await.unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(sim.record().arm_requests, vec![true, false]);
    assert_eq!(controller.mode.arm_state(), ArmState::Disarmed);
}

#[tokio::test(start_paused = true)]
async fn disarm_is_sent_even_when_already_disarmed() {
    let (sim, rx) = SimVehicle::new();
    let sim = sim.nack();
    let controller = sim.connect(rx).await;

    controller.mode.disarm().await.unwrap();

    assert_eq!(sim.record().arm_requests, vec![false]);
}

#[tokio::test(start_paused = true)]
async fn set_mode_reports_ack_and_nack() {
    let (sim, rx) = SimVehicle::new();
    let controller = sim.connect(rx).await;

    let outcome = controller.mode.set_mode("OFFBOARD").await.unwrap();
    assert_eq!(outcome, CommandOutcome::Success);

    // The mode shows up in telemetry once the dispatcher applied it
    tokio::time::sleep(TICK).await;
    assert_eq!(controller.telemetry.read_state().guidance_mode, "OFFBOARD");

    let (sim, rx) = SimVehicle::new();
    let sim = sim.nack();
    let controller = sim.connect(rx).await;

    let outcome = controller.mode.set_mode("OFFBOARD").await.unwrap();
    assert_eq!(outcome, CommandOutcome::Rejected);
    assert_eq!(sim.record().modes, vec!["OFFBOARD".to_owned()]);
}
