//! Attribute Table Service
//!
//! Holds the current value and notification flag of every attribute in the
//! fixed table, dispatches reads, funnels writes into the registry's event
//! path, and gates outbound notifications.

use tracing::{debug, trace, warn};

use crate::domain::registry::Dispatcher;
use crate::error::Error;
use crate::infrastructure::bluetooth::protocol::{AttributeId, AttributeValue};

#[derive(Debug, Default)]
struct Entry {
    value: Option<AttributeValue>,
    notify: bool,
}

/// The exposed attribute table.
///
/// Owned by the worker; all mutation happens on the worker thread, so the
/// table needs no internal locking.
#[derive(Debug)]
pub struct AttributeTable {
    entries: [Entry; AttributeId::ALL.len()],
}

impl AttributeTable {
    /// Build the table from the initial snapshot.
    pub fn new(snapshot: Vec<(AttributeId, AttributeValue)>) -> AttributeTable {
        let mut table = AttributeTable {
            entries: Default::default(),
        };
        for (id, value) in snapshot {
            if value.value_type() != id.value_type() {
                warn!(
                    "snapshot value for {} has wrong type, skipping",
                    id.name()
                );
                continue;
            }
            table.entries[id.index()].value = Some(value);
        }
        table
    }

    /// Encode the current value of an attribute for a read request.
    pub fn read(&self, id: AttributeId) -> Result<Vec<u8>, Error> {
        trace!("Got read request of {}", id.name());
        self.entries[id.index()]
            .value
            .as_ref()
            .map(AttributeValue::encode)
            .ok_or(Error::NoValue(id.name()))
    }

    /// Forward an inbound write to the registry's event path.
    ///
    /// The caller (the worker run loop) catches and logs the error so a
    /// malformed write never takes the service down.
    pub fn write(
        &self,
        id: AttributeId,
        raw: &[u8],
        dispatcher: &mut Dispatcher,
    ) -> Result<(), Error> {
        trace!("Got write request of {}: {:02X?}", id.name(), raw);
        dispatcher.dispatch(id, raw)
    }

    /// Toggle notification delivery for an attribute.
    pub fn set_notify(&mut self, id: AttributeId, enabled: bool) {
        debug!("Notifications for {} {}", id.name(), if enabled { "on" } else { "off" });
        self.entries[id.index()].notify = enabled;
    }

    /// Replace an attribute's value.
    ///
    /// Returns the encoded bytes to push to the transport when notification
    /// is enabled for this attribute - exactly one notification per call -
    /// and `None` otherwise. A value whose type does not match the
    /// attribute's declared type is rejected.
    pub fn update(&mut self, id: AttributeId, value: AttributeValue) -> Option<Vec<u8>> {
        if value.value_type() != id.value_type() {
            warn!(
                "ignoring update of {} with mismatched value type {:?}",
                id.name(),
                value.value_type()
            );
            return None;
        }
        let raw = value.encode();
        let entry = &mut self.entries[id.index()];
        entry.value = Some(value);
        entry.notify.then_some(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::control::{Control, ControlColor};
    use crate::infrastructure::bluetooth::protocol::PROTOCOL_VERSION;

    fn table_with_version() -> AttributeTable {
        AttributeTable::new(vec![(
            AttributeId::ProtocolVersion,
            AttributeValue::Int32(PROTOCOL_VERSION),
        )])
    }

    #[test]
    fn test_read_returns_encoded_value() {
        let table = table_with_version();
        assert_eq!(
            table.read(AttributeId::ProtocolVersion).unwrap(),
            PROTOCOL_VERSION.to_ne_bytes().to_vec()
        );
    }

    #[test]
    fn test_read_of_unset_attribute_fails() {
        let table = table_with_version();
        assert!(matches!(
            table.read(AttributeId::Names),
            Err(Error::NoValue("rcNames"))
        ));
    }

    #[test]
    fn test_update_without_notify_is_silent() {
        let mut table = table_with_version();
        let pushed = table.update(AttributeId::UiUpdate, AttributeValue::Bytes(vec![1, 2, 0]));
        assert_eq!(pushed, None);
        assert_eq!(table.read(AttributeId::UiUpdate).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn test_update_with_notify_pushes_exactly_once() {
        let mut table = table_with_version();
        table.set_notify(AttributeId::UiUpdate, true);
        let pushed = table.update(AttributeId::UiUpdate, AttributeValue::Bytes(vec![1, 2, 0]));
        assert_eq!(pushed, Some(vec![1, 2, 0]));

        table.set_notify(AttributeId::UiUpdate, false);
        let pushed = table.update(AttributeId::UiUpdate, AttributeValue::Bytes(vec![3, 2, 0]));
        assert_eq!(pushed, None);
    }

    #[test]
    fn test_update_rejects_mismatched_type() {
        let mut table = table_with_version();
        table.set_notify(AttributeId::UiUpdate, true);
        let pushed = table.update(AttributeId::UiUpdate, AttributeValue::Int32(7));
        assert_eq!(pushed, None);
        assert!(table.read(AttributeId::UiUpdate).is_err());
    }

    #[test]
    fn test_write_funnels_into_dispatcher() {
        let button = Control::button(0, 0, 1, 1, ControlColor::Orange, "ok");
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_in_handler = seen.clone();
        let mut dispatcher = Dispatcher::new(
            vec![button],
            Box::new(move |_, code, value| {
                seen_in_handler.lock().unwrap().push((code, value));
            }),
        );

        let table = table_with_version();
        table
            .write(AttributeId::Event, &[0, 0, 1, 0, 7, 0], &mut dispatcher)
            .unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[(1, 7)]);

        // Writes to layout attributes are ignored
        table
            .write(AttributeId::Names, b"x", &mut dispatcher)
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
