//! # Controller Input Mapper Module
//!
//! Turns raw evdev events from a Linux gamepad into [`ControllerSnapshot`]
//! reports and system-button presses.
//!
//! Events accumulate into the current state until a `SYN_REPORT` closes
//! the frame; each closed frame produces one snapshot.
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | evdev Range | Snapshot Field |
//! |------|------------|-------------|----------------|
//! | Left Stick X | ABS_X | 0-255 | `axis_x` (-512..=512) |
//! | L2 Trigger | ABS_RX | 0-255 | `brake` (0..=1020) |
//! | R2 Trigger | ABS_RY | 0-255 | `throttle` (0..=1020) |
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code | Function |
//! |--------|------------|----------|
//! | Cross (×) | BTN_SOUTH | Handbrake |
//! | Circle (○) | BTN_EAST | - |
//! | Square (□) | BTN_WEST | - |
//! | Triangle (△) | BTN_NORTH | - |
//! | L1 | BTN_TL | - |
//! | R1 | BTN_TR | - |
//! | L2 (click) | BTN_TL2 | Reverse |
//! | R2 (click) | BTN_TR2 | Forward |
//! | PS | BTN_MODE | Seat toggle |
//!
//! ## Usage
//!
//! ```no_run
//! use rc_car_bridge::controller::gamepad::GamepadDevice;
//! use rc_car_bridge::controller::mapper::{EventMapper, InputReport};
//!
//! let mut device = GamepadDevice::open("/dev/input/event5")?;
//! let mut mapper = EventMapper::new();
//!
//! loop {
//!     for event in device.fetch_events()? {
//!         if let Some(InputReport::Snapshot(snapshot)) = mapper.process_event(&event) {
//!             println!("axis_x = {}", snapshot.axis_x);
//!         }
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key, Synchronization};

use super::snapshot::{Buttons, ControllerSnapshot, AXIS_MAX, TRIGGER_MAX};

/// evdev stick/trigger range upper bound.
pub const EVDEV_AXIS_MAX: i32 = 255;
/// evdev stick center.
pub const EVDEV_AXIS_CENTER: i32 = 128;

/// Something the mapper produced from an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputReport {
    /// A complete frame.
    Snapshot(ControllerSnapshot),
    /// The system button went down.
    SystemButton,
}

/// Converts an evdev stick reading (0-255, 128 center) to `-512..=512`.
///
/// # Examples
///
/// ```
/// use rc_car_bridge::controller::mapper::stick_to_axis;
///
/// assert_eq!(stick_to_axis(128), 0);
/// assert_eq!(stick_to_axis(255), 512);
/// assert_eq!(stick_to_axis(0), -512);
/// ```
#[must_use]
pub fn stick_to_axis(raw: i32) -> i32 {
    let offset = raw.clamp(0, EVDEV_AXIS_MAX) - EVDEV_AXIS_CENTER;
    let span = EVDEV_AXIS_MAX - EVDEV_AXIS_CENTER;
    (offset * AXIS_MAX / span).clamp(-AXIS_MAX, AXIS_MAX)
}

/// Converts an evdev trigger reading (0-255) to `0..=1020`.
///
/// # Examples
///
/// ```
/// use rc_car_bridge::controller::mapper::trigger_to_value;
///
/// assert_eq!(trigger_to_value(0), 0);
/// assert_eq!(trigger_to_value(255), 1020);
/// ```
#[must_use]
pub fn trigger_to_value(raw: i32) -> u32 {
    let raw = raw.clamp(0, EVDEV_AXIS_MAX).unsigned_abs();
    raw * TRIGGER_MAX / EVDEV_AXIS_MAX.unsigned_abs()
}

/// Accumulates evdev events into snapshots.
///
/// # Thread Safety
///
/// `EventMapper` is not thread-safe. Use from a single task/thread only.
#[derive(Debug, Default)]
pub struct EventMapper {
    state: ControllerSnapshot,
}

impl EventMapper {
    /// Creates a mapper with a neutral gamepad state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current (possibly incomplete) frame.
    #[must_use]
    pub fn state(&self) -> &ControllerSnapshot {
        &self.state
    }

    /// Processes a single evdev input event.
    ///
    /// Returns a snapshot when the event closes a frame and
    /// [`InputReport::SystemButton`] when the PS button goes down.
    pub fn process_event(&mut self, event: &InputEvent) -> Option<InputReport> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                self.process_axis_event(axis, event.value());
                None
            }
            InputEventKind::Key(key) => self.process_key_event(key, event.value() != 0),
            InputEventKind::Synchronization(Synchronization::SYN_REPORT) => {
                Some(InputReport::Snapshot(self.state))
            }
            _ => None,
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        match axis {
            AbsoluteAxisType::ABS_X => self.state.axis_x = stick_to_axis(value),
            AbsoluteAxisType::ABS_RX => self.state.brake = trigger_to_value(value),
            AbsoluteAxisType::ABS_RY => self.state.throttle = trigger_to_value(value),
            _ => {
                // Other sticks, d-pad and motion sensors are unused
            }
        }
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) -> Option<InputReport> {
        let button = match key {
            Key::BTN_SOUTH => Buttons::A,
            Key::BTN_EAST => Buttons::B,
            Key::BTN_WEST => Buttons::X,
            Key::BTN_NORTH => Buttons::Y,
            Key::BTN_TL => Buttons::SHOULDER_L,
            Key::BTN_TR => Buttons::SHOULDER_R,
            Key::BTN_TL2 => Buttons::TRIGGER_L,
            Key::BTN_TR2 => Buttons::TRIGGER_R,
            Key::BTN_MODE => Buttons::SYSTEM,
            _ => return None,
        };

        let was_pressed = self.state.buttons.contains(button);
        self.state.buttons.set(button, pressed);

        (button == Buttons::SYSTEM && pressed && !was_pressed).then_some(InputReport::SystemButton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::EventType;

    fn make_axis_event(axis: AbsoluteAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, axis.0, value)
    }

    fn make_key_event(key: Key, pressed: bool) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), if pressed { 1 } else { 0 })
    }

    fn syn_report() -> InputEvent {
        InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0)
    }

    #[test]
    fn test_stick_conversion() {
        assert_eq!(stick_to_axis(EVDEV_AXIS_CENTER), 0);
        assert_eq!(stick_to_axis(255), 512);
        assert_eq!(stick_to_axis(0), -512);
        // Out of range readings clamp
        assert_eq!(stick_to_axis(400), 512);
        assert_eq!(stick_to_axis(-20), -512);
    }

    #[test]
    fn test_trigger_conversion() {
        assert_eq!(trigger_to_value(0), 0);
        assert_eq!(trigger_to_value(255), 1020);
        assert_eq!(trigger_to_value(128), 512);
        assert_eq!(trigger_to_value(-5), 0);
    }

    #[test]
    fn test_snapshot_only_on_syn_report() {
        let mut mapper = EventMapper::new();
        assert_eq!(mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 255)), None);
        assert_eq!(mapper.process_event(&make_key_event(Key::BTN_TR2, true)), None);

        let report = mapper.process_event(&syn_report());
        let Some(InputReport::Snapshot(snapshot)) = report else {
            panic!("expected snapshot, got {:?}", report);
        };
        assert_eq!(snapshot.axis_x, 512);
        assert!(snapshot.is_pressed(Buttons::TRIGGER_R));
    }

    #[test]
    fn test_triggers_map_to_throttle_and_brake() {
        let mut mapper = EventMapper::new();
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_RY, 255));
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_RX, 64));

        assert_eq!(mapper.state().throttle, 1020);
        assert_eq!(mapper.state().brake, 256);
    }

    #[test]
    fn test_button_mapping() {
        let cases = [
            (Key::BTN_SOUTH, Buttons::A),
            (Key::BTN_EAST, Buttons::B),
            (Key::BTN_WEST, Buttons::X),
            (Key::BTN_NORTH, Buttons::Y),
            (Key::BTN_TL, Buttons::SHOULDER_L),
            (Key::BTN_TR, Buttons::SHOULDER_R),
            (Key::BTN_TL2, Buttons::TRIGGER_L),
            (Key::BTN_TR2, Buttons::TRIGGER_R),
        ];
        for (key, button) in cases {
            let mut mapper = EventMapper::new();
            mapper.process_event(&make_key_event(key, true));
            assert!(mapper.state().buttons.contains(button), "{:?}", key);
            mapper.process_event(&make_key_event(key, false));
            assert!(!mapper.state().buttons.contains(button), "{:?}", key);
        }
    }

    #[test]
    fn test_system_button_fires_on_press_edge_only() {
        let mut mapper = EventMapper::new();
        assert_eq!(
            mapper.process_event(&make_key_event(Key::BTN_MODE, true)),
            Some(InputReport::SystemButton)
        );
        // Autorepeat while held
        assert_eq!(mapper.process_event(&make_key_event(Key::BTN_MODE, true)), None);
        // Release
        assert_eq!(mapper.process_event(&make_key_event(Key::BTN_MODE, false)), None);
        assert_eq!(
            mapper.process_event(&make_key_event(Key::BTN_MODE, true)),
            Some(InputReport::SystemButton)
        );
    }

    #[test]
    fn test_unmapped_events_ignored() {
        let mut mapper = EventMapper::new();
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_Y, 0));
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_HAT0X, 1));
        mapper.process_event(&make_key_event(Key::BTN_THUMBL, true));
        assert_eq!(*mapper.state(), ControllerSnapshot::default());
    }

    #[test]
    fn test_state_persists_across_frames() {
        let mut mapper = EventMapper::new();
        mapper.process_event(&make_key_event(Key::BTN_TL2, true));
        mapper.process_event(&syn_report());
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 0));

        let Some(InputReport::Snapshot(snapshot)) = mapper.process_event(&syn_report()) else {
            panic!("expected snapshot");
        };
        assert!(snapshot.is_pressed(Buttons::TRIGGER_L));
        assert_eq!(snapshot.axis_x, -512);
    }
}
