//! # Host Module
//!
//! Adapter between the host runtime and the vehicle core.
//!
//! The host delivers lifecycle notifications, out-of-band events and
//! controller reports as [`HostEvent`]s. A [`Platform`] keeps one session
//! per connected controller, assigns seats, and forwards gamepad reports
//! to the shared vehicle.
//!
//! ## Event Handling
//!
//! | Event | Effect |
//! |-------|--------|
//! | `DeviceDiscovered` | logged |
//! | `Connected` | session opened |
//! | `Ready` | seat A assigned, feedback played |
//! | `ControllerData` | steering + drive dispatched |
//! | `SystemButton` | seat toggled, feedback played |
//! | `Disconnected` | session closed; last one out coasts the car |
//! | `BluetoothEnabled` | logged |
//! | `Unsupported` | logged |
//!
//! Events naming an unknown controller are logged and dropped.

pub mod evdev_source;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::controller::snapshot::ControllerSnapshot;
use crate::error::{RcCarError, Result};
use crate::feedback::{ControllerInstance, FeedbackDevice, RumblePulse, Seat};
use crate::motor::MotorActuator;
use crate::telemetry::{ActuationLog, ActuationRecord};
use crate::vehicle::{SharedVehicle, TickReport};

/// Host-assigned controller handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ControllerId(pub u32);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notification from the host runtime.
pub enum HostEvent<F> {
    /// A device showed up during scanning.
    DeviceDiscovered { name: String },
    /// A controller connected; `feedback` drives its outputs.
    Connected { id: ControllerId, feedback: F },
    /// A controller went away.
    Disconnected(ControllerId),
    /// A connected controller finished its setup.
    Ready(ControllerId),
    /// The system button was pressed. `None` if the host lost the handle.
    SystemButton(Option<ControllerId>),
    /// One controller report.
    ControllerData { id: ControllerId, snapshot: ControllerSnapshot },
    /// Bluetooth radio switched on or off.
    BluetoothEnabled(bool),
    /// Any other out-of-band event code.
    Unsupported(u16),
}

impl<F> fmt::Debug for HostEvent<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::DeviceDiscovered { name } => write!(f, "DeviceDiscovered({})", name),
            HostEvent::Connected { id, .. } => write!(f, "Connected({})", id),
            HostEvent::Disconnected(id) => write!(f, "Disconnected({})", id),
            HostEvent::Ready(id) => write!(f, "Ready({})", id),
            HostEvent::SystemButton(id) => write!(f, "SystemButton({:?})", id),
            HostEvent::ControllerData { id, .. } => write!(f, "ControllerData({})", id),
            HostEvent::BluetoothEnabled(on) => write!(f, "BluetoothEnabled({})", on),
            HostEvent::Unsupported(code) => write!(f, "Unsupported(0x{:04x})", code),
        }
    }
}

/// One connected controller.
struct Session<F> {
    feedback: F,
    /// Set once the controller is ready.
    instance: Option<ControllerInstance>,
}

/// Host-side state: controller sessions plus the vehicle they drive.
pub struct Platform<D, S, F> {
    vehicle: SharedVehicle<D, S>,
    rumble: RumblePulse,
    sessions: HashMap<ControllerId, Session<F>>,
    telemetry: Option<ActuationLog>,
}

impl<D, S, F> Platform<D, S, F>
where
    D: MotorActuator,
    S: MotorActuator,
    F: FeedbackDevice,
{
    pub fn new(vehicle: SharedVehicle<D, S>, rumble: RumblePulse) -> Self {
        Self {
            vehicle,
            rumble,
            sessions: HashMap::new(),
            telemetry: None,
        }
    }

    /// Records every dispatched report to `log`.
    #[must_use]
    pub fn with_telemetry(mut self, log: ActuationLog) -> Self {
        self.telemetry = Some(log);
        self
    }

    pub fn vehicle(&self) -> &SharedVehicle<D, S> {
        &self.vehicle
    }

    /// Seat of a ready controller.
    #[must_use]
    pub fn seat(&self, id: ControllerId) -> Option<Seat> {
        self.sessions.get(&id)?.instance.map(|i| i.seat())
    }

    /// Number of connected controllers.
    #[must_use]
    pub fn connected(&self) -> usize {
        self.sessions.len()
    }

    /// Handles one host event.
    ///
    /// Returns the tick report when the event dispatched a gamepad report.
    pub fn handle(&mut self, event: HostEvent<F>) -> Option<TickReport> {
        match event {
            HostEvent::DeviceDiscovered { name } => {
                info!("device discovered: {}", name);
                None
            }
            HostEvent::Connected { id, feedback } => {
                info!("device connected: {}", id);
                self.sessions.insert(id, Session { feedback, instance: None });
                None
            }
            HostEvent::Disconnected(id) => {
                info!("device disconnected: {}", id);
                if self.sessions.remove(&id).is_none() {
                    warn!("disconnect for unknown controller {}", id);
                }
                if self.sessions.is_empty() {
                    self.vehicle.stop();
                }
                None
            }
            HostEvent::Ready(id) => {
                if let Err(e) = self.on_ready(id) {
                    error!("dropping ready event: {}", e);
                }
                None
            }
            HostEvent::SystemButton(id) => {
                if let Err(e) = self.on_system_button(id) {
                    error!("dropping system button event: {}", e);
                }
                None
            }
            HostEvent::ControllerData { id, snapshot } => match self.on_controller_data(id, &snapshot) {
                Ok(report) => report,
                Err(e) => {
                    error!("dropping controller report: {}", e);
                    None
                }
            },
            HostEvent::BluetoothEnabled(on) => {
                info!("Bluetooth enabled: {}", on);
                None
            }
            HostEvent::Unsupported(code) => {
                info!("unsupported event: 0x{:04x}", code);
                None
            }
        }
    }

    /// Handles events until the channel closes, then coasts the car.
    pub async fn run(&mut self, mut events: mpsc::Receiver<HostEvent<F>>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        info!("event source closed");
        self.shutdown();
    }

    /// Coasts the car and writes out buffered telemetry.
    pub fn shutdown(&mut self) {
        self.vehicle.stop();
        if let Some(log) = self.telemetry.as_mut() {
            if let Err(e) = log.flush() {
                warn!("failed to flush telemetry: {}", e);
            }
        }
    }

    fn session(&mut self, id: ControllerId) -> Result<&mut Session<F>> {
        self.sessions
            .get_mut(&id)
            .ok_or_else(|| RcCarError::InvalidHandle(format!("controller {} is not connected", id)))
    }

    fn on_ready(&mut self, id: ControllerId) -> Result<()> {
        let rumble = self.rumble;
        let session = self.session(id)?;
        session.instance = Some(ControllerInstance::ready(&rumble, &mut session.feedback));
        Ok(())
    }

    fn on_system_button(&mut self, id: Option<ControllerId>) -> Result<()> {
        let id = id.ok_or_else(|| RcCarError::InvalidHandle("missing controller handle".to_string()))?;
        let rumble = self.rumble;
        let session = self.session(id)?;
        let Session { feedback, instance } = session;
        let instance = instance
            .as_mut()
            .ok_or_else(|| RcCarError::InvalidHandle(format!("controller {} is not ready", id)))?;
        instance.toggle_seat(&rumble, feedback);
        Ok(())
    }

    fn on_controller_data(&mut self, id: ControllerId, snapshot: &ControllerSnapshot) -> Result<Option<TickReport>> {
        if self.session(id)?.instance.is_none() {
            return Err(RcCarError::InvalidHandle(format!("controller {} is not ready", id)));
        }

        let Some(report) = self.vehicle.dispatch(snapshot) else {
            return Ok(None);
        };

        if let Some(log) = self.telemetry.as_mut() {
            if let Err(e) = log.append(&ActuationRecord::now(id, &report)) {
                warn!("failed to write telemetry: {}", e);
            }
        }
        Ok(Some(report))
    }
}
