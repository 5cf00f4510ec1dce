//! Blocking evdev reader that feeds [`HostEvent`]s to the platform.
//!
//! Runs on a blocking thread. The device counts as connected and ready
//! once opened; a read error ends the session with `Disconnected`.
//!
//! Every frame is delivered. A full queue blocks the reader until the
//! dispatch loop catches up; evdev level-triggers on change only, so a
//! skipped frame (e.g. a trigger release) would never be corrected.

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::{ControllerId, HostEvent};
use crate::controller::gamepad::{EvdevFeedback, GamepadDevice};
use crate::controller::mapper::{EventMapper, InputReport};

/// Reads `device` until it fails or the receiver goes away.
pub fn pump(mut device: GamepadDevice, id: ControllerId, tx: mpsc::Sender<HostEvent<EvdevFeedback>>) {
    let name = device.name().unwrap_or("unknown").to_string();
    let path = device.device_path().to_string();
    let opening = [
        HostEvent::DeviceDiscovered { name },
        HostEvent::Connected { id, feedback: EvdevFeedback },
        HostEvent::Ready(id),
    ];
    for event in opening {
        if tx.blocking_send(event).is_err() {
            return;
        }
    }

    let mut mapper = EventMapper::new();
    loop {
        let events = match device.fetch_events() {
            Ok(events) => events,
            Err(e) => {
                error!("{}: {}", path, e);
                break;
            }
        };

        if forward(&mut mapper, id, events, &tx).is_err() {
            debug!("event receiver closed, stopping reader");
            return;
        }
    }

    info!("gamepad {} lost", id);
    let _ = tx.blocking_send(HostEvent::Disconnected(id));
}

/// Maps `events` and sends each resulting report, waiting for queue room.
///
/// # Errors
///
/// Returns the undelivered event once the receiver has been dropped.
fn forward<F>(
    mapper: &mut EventMapper,
    id: ControllerId,
    events: impl IntoIterator<Item = evdev::InputEvent>,
    tx: &mpsc::Sender<HostEvent<F>>,
) -> Result<(), mpsc::error::SendError<HostEvent<F>>> {
    for event in events {
        let host_event = match mapper.process_event(&event) {
            Some(InputReport::Snapshot(snapshot)) => HostEvent::ControllerData { id, snapshot },
            Some(InputReport::SystemButton) => HostEvent::SystemButton(Some(id)),
            None => continue,
        };
        tx.blocking_send(host_event)?;
    }
    Ok(())
}
