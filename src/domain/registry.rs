//! Control registry: the whole remote-UI definition, plus the event
//! dispatch half that runs on the worker thread.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::control::Control;
use crate::error::Error;
use crate::infrastructure::bluetooth::adapter::{RemoteAdapter, ServiceDefinition};
use crate::infrastructure::bluetooth::protocol::{
    AttributeId, AttributeValue, Event, PROTOCOL_VERSION, SERVICE_UUID,
};
use crate::infrastructure::bluetooth::worker::{
    WorkerHandle, WorkerState, DEFAULT_START_TIMEOUT,
};

/// Screen orientation the companion app renders the layout in.
/// The discriminant is the wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait = 0,
    Landscape = 1,
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(Error::InvalidOrientation(other.to_string())),
        }
    }
}

/// Callback invoked for every decoded interaction event:
/// `(control, event code, data value)`.
pub type EventHandler = Box<dyn FnMut(&Arc<Control>, u8, u16) + Send>;

/// The remote-UI definition: advertised name, layout metadata, and the
/// ordered control list.
///
/// Insertion order is the wire index the companion app addresses controls
/// by; controls are never removed or reordered once added. One registry
/// instance drives one worker.
pub struct Registry {
    name: String,
    orientation: Orientation,
    columns: u8,
    rows: u8,
    controls: Vec<Arc<Control>>,
    start_timeout: Duration,
    worker: Option<WorkerHandle>,
}

impl Registry {
    pub fn new(name: impl Into<String>) -> Registry {
        Registry {
            name: name.into(),
            orientation: Orientation::Portrait,
            columns: 0,
            rows: 0,
            controls: Vec::new(),
            start_timeout: DEFAULT_START_TIMEOUT,
            worker: None,
        }
    }

    /// Set the advertised device name. Takes effect on the next `begin`.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Grid dimensions, stored verbatim.
    pub fn set_grid(&mut self, columns: u8, rows: u8) {
        self.columns = columns;
        self.rows = rows;
    }

    /// How long `begin` waits for the transport registration to complete.
    pub fn set_start_timeout(&mut self, timeout: Duration) {
        self.start_timeout = timeout;
    }

    /// Append a control, assigning it the next wire index.
    ///
    /// Adding a control that is already registered is a no-op preserving
    /// its first index. The layout is frozen while the worker runs.
    pub fn add_control(&mut self, control: Arc<Control>) -> Result<(), Error> {
        if self.worker.is_some() {
            return Err(Error::LayoutFrozen);
        }
        if self.controls.iter().any(|c| Arc::ptr_eq(c, &control)) {
            debug!("control already registered, keeping first index");
            return Ok(());
        }
        control.bind_slot(self.controls.len() as u8);
        self.controls.push(control);
        Ok(())
    }

    pub fn add_controls(
        &mut self,
        controls: impl IntoIterator<Item = Arc<Control>>,
    ) -> Result<(), Error> {
        for control in controls {
            self.add_control(control)?;
        }
        Ok(())
    }

    pub fn controls(&self) -> &[Arc<Control>] {
        &self.controls
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Current worker lifecycle state, if a worker exists.
    pub fn worker_state(&self) -> Option<WorkerState> {
        self.worker.as_ref().map(WorkerHandle::state)
    }

    /// Build the initial attribute snapshot from the current registry
    /// state. Pure function of the control list and layout metadata.
    pub fn snapshot(&self) -> Vec<(AttributeId, AttributeValue)> {
        let controls = &self.controls;
        vec![
            (
                AttributeId::ProtocolVersion,
                AttributeValue::Int32(PROTOCOL_VERSION),
            ),
            (
                AttributeId::ControlCount,
                AttributeValue::Int32(controls.len() as i32),
            ),
            (
                AttributeId::ControlTypes,
                AttributeValue::Bytes(controls.iter().map(|c| c.kind().wire_value()).collect()),
            ),
            (AttributeId::Row, AttributeValue::Int32(self.rows as i32)),
            (AttributeId::Col, AttributeValue::Int32(self.columns as i32)),
            (
                AttributeId::Colors,
                AttributeValue::Bytes(controls.iter().map(|c| c.color().wire_value()).collect()),
            ),
            (
                AttributeId::Frames,
                AttributeValue::Bytes(
                    controls
                        .iter()
                        .flat_map(|c| {
                            let (x, y, w, h) = c.frame();
                            [x, y, w, h]
                        })
                        .collect(),
                ),
            ),
            (
                AttributeId::Names,
                AttributeValue::Text(
                    controls
                        .iter()
                        .map(|c| c.text())
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
            ),
            (
                AttributeId::Orientation,
                AttributeValue::Int32(self.orientation as i32),
            ),
            (
                AttributeId::ConfigDataArray,
                AttributeValue::Bytes(controls.iter().flat_map(|c| c.config_data()).collect()),
            ),
            (AttributeId::Event, AttributeValue::Bytes(vec![0; 6])),
            (AttributeId::UiUpdate, AttributeValue::Bytes(vec![0; 3])),
        ]
    }

    /// Bring the remote UI online.
    ///
    /// Builds the snapshot, starts the worker with it, and blocks until the
    /// transport registration completes (or fails, or times out). `handler`
    /// is invoked on the worker thread for every decoded interaction event.
    pub fn begin<F>(&mut self, handler: F, adapter: Box<dyn RemoteAdapter>) -> Result<(), Error>
    where
        F: FnMut(&Arc<Control>, u8, u16) + Send + 'static,
    {
        if self.worker.is_some() {
            return Err(Error::AlreadyRunning);
        }

        info!(
            "starting remote UI \"{}\" with {} controls",
            self.name,
            self.controls.len()
        );

        let definition = ServiceDefinition {
            service_uuid: SERVICE_UUID,
            local_name: self.name.clone(),
            attributes: AttributeId::ALL.to_vec(),
        };
        let dispatcher = Dispatcher::new(self.controls.clone(), Box::new(handler));
        let worker = WorkerHandle::spawn(
            adapter,
            definition,
            self.snapshot(),
            dispatcher,
            self.start_timeout,
        )?;

        let updates = worker.command_sender();
        for control in &self.controls {
            control.attach_updates(updates.clone());
        }
        self.worker = Some(worker);
        Ok(())
    }

    /// Take the remote UI offline, blocking until the worker has stopped.
    /// No-op if not running. `begin` may be called again afterwards.
    pub fn stop(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };
        info!("stopping remote UI \"{}\"", self.name);
        for control in &self.controls {
            control.detach_updates();
        }
        worker.stop();
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker-side half of the registry: resolves decoded events to controls
/// and invokes the caller's handler.
pub struct Dispatcher {
    controls: Vec<Arc<Control>>,
    handler: EventHandler,
}

impl Dispatcher {
    pub fn new(controls: Vec<Arc<Control>>, handler: EventHandler) -> Dispatcher {
        Dispatcher { controls, handler }
    }

    /// Decode and dispatch an inbound write.
    ///
    /// Only the event attribute carries interaction events; writes to any
    /// other attribute are ignored. A stale or invalid control index is an
    /// error and the event is dropped. Handler panics are not caught here;
    /// they propagate to the worker thread boundary.
    pub fn dispatch(&mut self, id: AttributeId, raw: &[u8]) -> Result<(), Error> {
        if id != AttributeId::Event {
            return Ok(());
        }
        let event = Event::decode(raw)?;
        let control = self
            .controls
            .get(event.control_index as usize)
            .ok_or(Error::IndexOutOfRange(event.control_index))?;
        (self.handler)(control, event.code, event.data_value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::control::{ControlColor, ControlKind};

    fn sample_registry() -> Registry {
        let mut registry = Registry::new("TestRemote");
        registry.set_grid(3, 5);
        registry
            .add_controls([
                Control::button(0, 0, 1, 1, ControlColor::Orange, "ok"),
                Control::label(1, 0, 2, 1, ControlColor::Pink, "..."),
            ])
            .unwrap();
        registry
    }

    fn snapshot_value(registry: &Registry, id: AttributeId) -> AttributeValue {
        registry
            .snapshot()
            .into_iter()
            .find(|(i, _)| *i == id)
            .map(|(_, v)| v)
            .unwrap()
    }

    #[test]
    fn test_add_controls_is_idempotent() {
        let mut registry = Registry::new("TestRemote");
        let button = Control::button(0, 0, 1, 1, ControlColor::Orange, "ok");
        registry
            .add_controls([button.clone(), button.clone()])
            .unwrap();
        registry.add_control(button).unwrap();
        assert_eq!(registry.controls().len(), 1);
    }

    #[test]
    fn test_snapshot_layout_attributes() {
        let registry = sample_registry();
        assert_eq!(
            snapshot_value(&registry, AttributeId::ControlCount),
            AttributeValue::Int32(2)
        );
        assert_eq!(
            snapshot_value(&registry, AttributeId::ControlTypes),
            AttributeValue::Bytes(vec![
                ControlKind::Button.wire_value(),
                ControlKind::Label.wire_value()
            ])
        );
        assert_eq!(
            snapshot_value(&registry, AttributeId::Colors),
            AttributeValue::Bytes(vec![
                ControlColor::Orange.wire_value(),
                ControlColor::Pink.wire_value()
            ])
        );
        assert_eq!(
            snapshot_value(&registry, AttributeId::Frames),
            AttributeValue::Bytes(vec![0, 0, 1, 1, 1, 0, 2, 1])
        );
        assert_eq!(
            snapshot_value(&registry, AttributeId::Names),
            AttributeValue::Text("ok\n...".to_string())
        );
        assert_eq!(
            snapshot_value(&registry, AttributeId::Col),
            AttributeValue::Int32(3)
        );
        assert_eq!(
            snapshot_value(&registry, AttributeId::Row),
            AttributeValue::Int32(5)
        );
        assert_eq!(
            snapshot_value(&registry, AttributeId::ConfigDataArray),
            AttributeValue::Bytes(vec![0; 16])
        );
        assert_eq!(
            snapshot_value(&registry, AttributeId::Event),
            AttributeValue::Bytes(vec![0; 6])
        );
        assert_eq!(
            snapshot_value(&registry, AttributeId::UiUpdate),
            AttributeValue::Bytes(vec![0; 3])
        );
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let registry = sample_registry();
        assert_eq!(registry.snapshot(), registry.snapshot());
    }

    #[test]
    fn test_orientation_parse() {
        assert_eq!(
            "portrait".parse::<Orientation>().unwrap(),
            Orientation::Portrait
        );
        assert_eq!(
            "landscape".parse::<Orientation>().unwrap(),
            Orientation::Landscape
        );
        assert!(matches!(
            "upside-down".parse::<Orientation>(),
            Err(Error::InvalidOrientation(_))
        ));
    }

    #[test]
    fn test_dispatch_resolves_control_by_index() {
        let button = Control::button(0, 0, 1, 1, ControlColor::Orange, "ok");
        let label = Control::label(1, 0, 2, 1, ControlColor::Pink, "...");
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_in_handler = seen.clone();
        let label_in_handler = label.clone();
        let mut dispatcher = Dispatcher::new(
            vec![button, label.clone()],
            Box::new(move |control, code, value| {
                seen_in_handler.lock().unwrap().push((
                    Arc::ptr_eq(control, &label_in_handler),
                    code,
                    value,
                ));
            }),
        );

        dispatcher.dispatch(AttributeId::Event, &[0, 1, 2, 0, 44, 1]).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[(true, 2, 300)]);
    }

    #[test]
    fn test_dispatch_rejects_stale_index() {
        let mut dispatcher = Dispatcher::new(
            vec![Control::button(0, 0, 1, 1, ControlColor::Orange, "ok")],
            Box::new(|_, _, _| {}),
        );
        assert!(matches!(
            dispatcher.dispatch(AttributeId::Event, &[0, 5, 1, 0, 0, 0]),
            Err(Error::IndexOutOfRange(5))
        ));
    }

    #[test]
    fn test_dispatch_rejects_malformed_event() {
        let mut dispatcher = Dispatcher::new(Vec::new(), Box::new(|_, _, _| {}));
        assert!(matches!(
            dispatcher.dispatch(AttributeId::Event, &[1, 2, 3]),
            Err(Error::Decode(_))
        ));
    }
}
