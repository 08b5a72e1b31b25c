//! BLE remote-control UI peripheral.
//!
//! Publishes a fixed table of named, typed attributes describing a UI
//! layout (labels, buttons, sliders, ...) over a GATT service and exchanges
//! compact binary messages with the companion app: 6-byte interaction
//! events inbound, variable-length text updates outbound.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ble_remote_ui::{Control, ControlColor, Registry, RemoteAdapter};
//!
//! # fn transport() -> Box<dyn RemoteAdapter> { unimplemented!() }
//! # fn main() -> Result<(), ble_remote_ui::Error> {
//! let label = Control::label(1, 0, 2, 1, ControlColor::Pink, "...");
//! let button = Control::button(0, 0, 1, 1, ControlColor::Orange, "ok");
//!
//! let mut remote = Registry::new("MyRemote");
//! remote.set_grid(3, 5);
//! remote.add_controls([label.clone(), button.clone()])?;
//!
//! // With the `bluez` feature, `BlueZAdapter::new()` is the transport.
//! remote.begin(
//!     move |control, _code, value| {
//!         if Arc::ptr_eq(control, &button) {
//!             label.update_text(if value != 0 { "ok" } else { "..." });
//!         }
//!     },
//!     transport(),
//! )?;
//! # remote.stop();
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::control::{Control, ControlColor, ControlKind, CONFIG_DATA_LEN};
pub use domain::registry::{Dispatcher, EventHandler, Orientation, Registry};
pub use domain::settings::{LogSettings, Settings, SettingsService};
pub use error::{Error, Result};
pub use infrastructure::bluetooth::adapter::{
    AdapterEvent, AdapterEventSender, RemoteAdapter, ServiceDefinition,
};
#[cfg(feature = "bluez")]
pub use infrastructure::bluetooth::bluez::BlueZAdapter;
pub use infrastructure::bluetooth::protocol::{
    AttributeId, AttributeValue, Event, UpdateMessage, ValueType, EVENT_LEN, PROTOCOL_VERSION,
    SERVICE_UUID,
};
pub use infrastructure::bluetooth::worker::{WorkerState, DEFAULT_START_TIMEOUT};
