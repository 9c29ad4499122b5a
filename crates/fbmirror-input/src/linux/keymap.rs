//! Mapping between fbmirror event types and evdev records.

use evdev::InputEvent;
use fbmirror_types::InjectedEvent;

/// Build the evdev record for `event`, stamped with the current time.
pub fn to_evdev(event: InjectedEvent) -> InputEvent {
    let (type_, code, value) = event.to_raw();
    InputEvent::new_now(type_, code, value)
}
