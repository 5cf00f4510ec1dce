//! # Vehicle Module
//!
//! Dispatch entry point: one gamepad report in, at most one command per
//! motor out.
//!
//! A [`Vehicle`] owns both motor drivers, both policies and the drive
//! latch. Reports are processed to completion, steering first, then drive.
//! When more than one controller may drive the same car, wrap the vehicle
//! in a [`SharedVehicle`] so each report holds the lock for its whole tick.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::control::{DriveLatch, DrivePolicy, DriveRule, SteeringPolicy};
use crate::controller::snapshot::{ControllerClass, ControllerSnapshot};
use crate::motor::{Actuation, MotorActuator, MotorId};

/// What a report did to the car.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Steering motor outcome.
    pub steering: Actuation,
    /// Drive motor outcome.
    pub drive: Actuation,
    /// Latch state after the report.
    pub powered: bool,
    /// Drive rules that fired, in evaluation order.
    pub drive_rules: Vec<DriveRule>,
}

/// Drive and steering motors plus the state that steers them.
pub struct Vehicle<D, S> {
    drive_motor: D,
    steering_motor: S,
    steering: SteeringPolicy,
    drive: DrivePolicy,
    latch: DriveLatch,
}

impl<D, S> std::fmt::Debug for Vehicle<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vehicle")
            .field("steering", &self.steering)
            .field("drive", &self.drive)
            .field("latch", &self.latch)
            .finish_non_exhaustive()
    }
}

impl<D: MotorActuator, S: MotorActuator> Vehicle<D, S> {
    /// Creates a vehicle with an unlatched drive.
    pub fn new(drive_motor: D, steering_motor: S, steering: SteeringPolicy, drive: DrivePolicy) -> Self {
        Self {
            drive_motor,
            steering_motor,
            steering,
            drive,
            latch: DriveLatch::new(),
        }
    }

    /// Processes one report.
    ///
    /// Non-gamepad reports return `None` and touch nothing.
    pub fn dispatch(&mut self, snapshot: &ControllerSnapshot) -> Option<TickReport> {
        if snapshot.class != ControllerClass::Gamepad {
            debug!("ignoring {:?} report", snapshot.class);
            return None;
        }

        let steering = self.steering.decide(snapshot.axis_x);
        steering.issue(MotorId::Steering, &mut self.steering_motor);

        let outcome = self.drive.decide(&mut self.latch, snapshot);
        if !outcome.fired.is_empty() {
            debug!("drive rules: {:?}", outcome.fired);
        }
        outcome.actuation.issue(MotorId::Drive, &mut self.drive_motor);

        Some(TickReport {
            steering,
            drive: outcome.actuation,
            powered: self.latch.is_powered(),
            drive_rules: outcome.fired,
        })
    }

    /// Coasts both motors and clears the latch.
    ///
    /// Used when the last controller goes away or on shutdown.
    pub fn stop(&mut self) {
        for (id, result) in [
            (MotorId::Steering, self.steering_motor.coast()),
            (MotorId::Drive, self.drive_motor.coast()),
        ] {
            if let Err(e) = result {
                warn!("{} motor failed to coast: {}", id, e);
            }
        }
        self.latch = DriveLatch::new();
    }

    #[must_use]
    pub fn latch(&self) -> DriveLatch {
        self.latch
    }
}

/// Vehicle shared between controller sessions.
///
/// # Examples
///
/// ```
/// use rc_car_bridge::control::{DrivePolicy, SteeringPolicy};
/// use rc_car_bridge::controller::snapshot::ControllerSnapshot;
/// use rc_car_bridge::motor::tracing_motor::TracingMotor;
/// use rc_car_bridge::motor::{MotorId, DUTY_MAX};
/// use rc_car_bridge::vehicle::{SharedVehicle, Vehicle};
///
/// let vehicle = Vehicle::new(
///     TracingMotor::new(MotorId::Drive, DUTY_MAX),
///     TracingMotor::new(MotorId::Steering, DUTY_MAX),
///     SteeringPolicy::new(Default::default(), DUTY_MAX),
///     DrivePolicy::default(),
/// );
/// let shared = SharedVehicle::new(vehicle);
/// let other = shared.clone();
///
/// assert!(other.dispatch(&ControllerSnapshot::gamepad()).is_some());
/// ```
pub struct SharedVehicle<D, S> {
    inner: Arc<Mutex<Vehicle<D, S>>>,
}

impl<D, S> Clone for SharedVehicle<D, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: MotorActuator, S: MotorActuator> SharedVehicle<D, S> {
    pub fn new(vehicle: Vehicle<D, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vehicle)),
        }
    }

    /// Processes one report under the vehicle lock.
    pub fn dispatch(&self, snapshot: &ControllerSnapshot) -> Option<TickReport> {
        self.with(|vehicle| vehicle.dispatch(snapshot))
    }

    /// Coasts both motors under the vehicle lock.
    pub fn stop(&self) {
        self.with(Vehicle::stop);
    }

    /// Runs `f` with exclusive access to the vehicle.
    ///
    /// A panic in another holder does not stop the car from being driven;
    /// the poisoned guard is recovered.
    pub fn with<R>(&self, f: impl FnOnce(&mut Vehicle<D, S>) -> R) -> R {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut *guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::SteeringThresholds;
    use crate::controller::snapshot::Buttons;
    use crate::motor::mocks::{MotorCall, RecordingMotor};
    use crate::motor::{MockMotorActuator, MotorCommand};
    use mockall::predicate::eq;
    use std::thread;

    fn policies() -> (SteeringPolicy, DrivePolicy) {
        (
            SteeringPolicy::new(SteeringThresholds::default(), 3200),
            DrivePolicy::new(1020, 3200),
        )
    }

    fn recording_vehicle() -> (Vehicle<RecordingMotor, RecordingMotor>, RecordingMotor, RecordingMotor) {
        let drive = RecordingMotor::new();
        let steering = RecordingMotor::new();
        let (s, d) = policies();
        (Vehicle::new(drive.clone(), steering.clone(), s, d), drive, steering)
    }

    #[test]
    fn test_right_turn_scenario() {
        let mut drive = MockMotorActuator::new();
        let mut steering = MockMotorActuator::new();
        steering.expect_reverse().times(1).returning(|| Ok(()));
        steering.expect_set_speed().with(eq(2297)).times(1).returning(|_| Ok(()));
        drive.expect_coast().times(0);

        let (s, d) = policies();
        let mut vehicle = Vehicle::new(drive, steering, s, d);
        let report = vehicle
            .dispatch(&ControllerSnapshot::gamepad().with_axis_x(400))
            .unwrap();

        assert_eq!(report.steering, Actuation::Command(MotorCommand::Reverse(2297)));
        assert_eq!(report.drive, Actuation::NoChange);
    }

    #[test]
    fn test_forward_then_release_scenario() {
        let (mut vehicle, drive, steering) = recording_vehicle();

        let report = vehicle
            .dispatch(
                &ControllerSnapshot::gamepad()
                    .with_throttle(510)
                    .with_buttons(Buttons::TRIGGER_R),
            )
            .unwrap();
        assert!(report.powered);
        assert_eq!(drive.calls(), vec![MotorCall::Forward, MotorCall::SetSpeed(1600)]);
        // axis_x = 0 is inside the noise guard
        assert!(steering.calls().is_empty());

        drive.clear();
        let report = vehicle.dispatch(&ControllerSnapshot::gamepad()).unwrap();
        assert!(!report.powered);
        assert_eq!(report.drive, Actuation::Command(MotorCommand::Coast));
        assert_eq!(drive.calls(), vec![MotorCall::Coast]);
    }

    #[test]
    fn test_non_gamepad_ignored() {
        let drive = MockMotorActuator::new();
        let steering = MockMotorActuator::new();
        let (s, d) = policies();
        let mut vehicle = Vehicle::new(drive, steering, s, d);

        for class in [ControllerClass::Mouse, ControllerClass::Keyboard, ControllerClass::BalanceBoard] {
            let snap = ControllerSnapshot::gamepad()
                .with_class(class)
                .with_axis_x(500)
                .with_buttons(Buttons::TRIGGER_R)
                .with_throttle(1020);
            assert!(vehicle.dispatch(&snap).is_none());
        }
        assert!(!vehicle.latch().is_powered());
    }

    #[test]
    fn test_steering_and_drive_in_same_report() {
        let (mut vehicle, drive, steering) = recording_vehicle();

        let report = vehicle
            .dispatch(
                &ControllerSnapshot::gamepad()
                    .with_axis_x(-512)
                    .with_brake(1020)
                    .with_buttons(Buttons::TRIGGER_L),
            )
            .unwrap();

        assert_eq!(report.steering, Actuation::Command(MotorCommand::Forward(3200)));
        assert_eq!(report.drive, Actuation::Command(MotorCommand::Reverse(3200)));
        assert_eq!(steering.calls(), vec![MotorCall::Forward, MotorCall::SetSpeed(3200)]);
        assert_eq!(drive.calls(), vec![MotorCall::Reverse, MotorCall::SetSpeed(3200)]);
    }

    #[test]
    fn test_handbrake_with_forward_trigger() {
        let (mut vehicle, drive, _) = recording_vehicle();
        let report = vehicle
            .dispatch(
                &ControllerSnapshot::gamepad()
                    .with_throttle(1020)
                    .with_buttons(Buttons::TRIGGER_R | Buttons::A),
            )
            .unwrap();

        assert_eq!(report.drive, Actuation::Command(MotorCommand::Brake));
        assert!(!report.powered);
        assert_eq!(drive.calls(), vec![MotorCall::Brake]);
    }

    #[test]
    fn test_one_command_per_motor_per_report() {
        let (mut vehicle, drive, _) = recording_vehicle();
        vehicle.dispatch(&ControllerSnapshot::gamepad().with_buttons(Buttons::TRIGGER_R).with_throttle(200));
        drive.clear();

        // Rule 1 and rule 3 both fire; only the brake reaches the motor
        let report = vehicle
            .dispatch(&ControllerSnapshot::gamepad().with_buttons(Buttons::TRIGGER_R | Buttons::A))
            .unwrap();
        assert_eq!(drive.calls(), vec![MotorCall::Brake]);
        assert_eq!(report.drive_rules, vec![DriveRule::CoastOnRelease, DriveRule::Handbrake]);
    }

    #[test]
    fn test_driver_error_does_not_abort_tick() {
        let mut drive = MockMotorActuator::new();
        let mut steering = MockMotorActuator::new();
        steering.expect_coast().times(1).returning(|| {
            Err(crate::error::RcCarError::Motor {
                motor: "steering",
                reason: "fault".to_string(),
            })
        });
        drive.expect_brake().times(1).returning(|| Ok(()));

        let (s, d) = policies();
        let mut vehicle = Vehicle::new(drive, steering, s, d);
        let report = vehicle
            .dispatch(&ControllerSnapshot::gamepad().with_axis_x(10).with_buttons(Buttons::A))
            .unwrap();
        assert_eq!(report.drive, Actuation::Command(MotorCommand::Brake));
    }

    #[test]
    fn test_stop_coasts_and_unlatches() {
        let (mut vehicle, drive, steering) = recording_vehicle();
        vehicle.dispatch(&ControllerSnapshot::gamepad().with_buttons(Buttons::TRIGGER_R).with_throttle(1020));
        assert!(vehicle.latch().is_powered());

        drive.clear();
        vehicle.stop();
        assert!(!vehicle.latch().is_powered());
        assert_eq!(drive.calls(), vec![MotorCall::Coast]);
        assert_eq!(steering.calls(), vec![MotorCall::Coast]);
    }

    #[test]
    fn test_concurrent_seats_serialize_ticks() {
        let (vehicle, drive, _) = recording_vehicle();
        let shared = SharedVehicle::new(vehicle);

        let forward = ControllerSnapshot::gamepad()
            .with_buttons(Buttons::TRIGGER_R)
            .with_throttle(1020);
        let reverse = ControllerSnapshot::gamepad()
            .with_buttons(Buttons::TRIGGER_L)
            .with_brake(1020);

        let handles: Vec<_> = [forward, reverse]
            .into_iter()
            .map(|snap| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let report = shared.dispatch(&snap).unwrap();
                        // The tick that powered the drive must report it
                        if let Actuation::Command(MotorCommand::Forward(_) | MotorCommand::Reverse(_)) =
                            report.drive
                        {
                            assert!(report.powered);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Directional calls are always followed by their speed, never interleaved
        let calls = drive.calls();
        assert_eq!(calls.len() % 2, 0);
        for pair in calls.chunks(2) {
            match pair {
                [MotorCall::Forward, MotorCall::SetSpeed(3200)]
                | [MotorCall::Reverse, MotorCall::SetSpeed(3200)] => {}
                other => panic!("interleaved drive calls: {:?}", other),
            }
        }
        assert!(shared.with(|v| v.latch().is_powered()));
    }
}
