//! UI control model: typed descriptors for the layout elements the
//! companion app renders.

use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::mpsc;

use crate::error::Error;
use crate::infrastructure::bluetooth::protocol::{AttributeId, AttributeValue, UpdateMessage};
use crate::infrastructure::bluetooth::worker::WorkerCommand;

/// Size of the per-control extra configuration block.
pub const CONFIG_DATA_LEN: usize = 8;

/// Kind of a UI control. The discriminant is the wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Label = 1,
    Button = 2,
    CircleButton = 3,
    Switch = 4,
    Slider = 5,
    Analog = 6,
}

impl ControlKind {
    pub fn wire_value(self) -> u8 {
        self as u8
    }
}

impl FromStr for ControlKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "label" => Ok(ControlKind::Label),
            "button" => Ok(ControlKind::Button),
            "circlebtn" => Ok(ControlKind::CircleButton),
            "switch" => Ok(ControlKind::Switch),
            "slider" => Ok(ControlKind::Slider),
            "analog" => Ok(ControlKind::Analog),
            other => Err(Error::InvalidKind(other.to_string())),
        }
    }
}

/// Accent color of a UI control. The discriminant is the wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlColor {
    Orange = 1,
    Yellow = 2,
    Blue = 3,
    Green = 4,
    Pink = 5,
    Grey = 6,
}

impl ControlColor {
    pub fn wire_value(self) -> u8 {
        self as u8
    }
}

impl FromStr for ControlColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "orange" => Ok(ControlColor::Orange),
            "yellow" => Ok(ControlColor::Yellow),
            "blue" => Ok(ControlColor::Blue),
            "green" => Ok(ControlColor::Green),
            "pink" => Ok(ControlColor::Pink),
            "grey" => Ok(ControlColor::Grey),
            other => Err(Error::InvalidColor(other.to_string())),
        }
    }
}

pub(crate) type UpdateSender = mpsc::UnboundedSender<WorkerCommand>;

/// One UI element of the remote layout.
///
/// Controls are shared between the caller and the registry as
/// `Arc<Control>`, so the caller can keep a handle for identity checks in
/// the event handler and for [`update_text`](Control::update_text). A
/// control belongs to at most one registry; registration pins its wire
/// index for the lifetime of the process.
#[derive(Debug)]
pub struct Control {
    kind: ControlKind,
    x: u8,
    y: u8,
    w: u8,
    h: u8,
    color: ControlColor,
    text: Mutex<String>,
    // Wire index, assigned once at registration
    slot: OnceLock<u8>,
    // Live while the worker runs; text updates are queued through it
    updates: Mutex<Option<UpdateSender>>,
}

impl Control {
    pub fn new(
        kind: ControlKind,
        x: u8,
        y: u8,
        w: u8,
        h: u8,
        color: ControlColor,
        text: impl Into<String>,
    ) -> Arc<Control> {
        Arc::new(Control {
            kind,
            x,
            y,
            w,
            h,
            color,
            text: Mutex::new(text.into()),
            slot: OnceLock::new(),
            updates: Mutex::new(None),
        })
    }

    pub fn label(x: u8, y: u8, w: u8, h: u8, color: ControlColor, text: &str) -> Arc<Control> {
        Control::new(ControlKind::Label, x, y, w, h, color, text)
    }

    pub fn button(x: u8, y: u8, w: u8, h: u8, color: ControlColor, text: &str) -> Arc<Control> {
        Control::new(ControlKind::Button, x, y, w, h, color, text)
    }

    pub fn circle_button(
        x: u8,
        y: u8,
        w: u8,
        h: u8,
        color: ControlColor,
        text: &str,
    ) -> Arc<Control> {
        Control::new(ControlKind::CircleButton, x, y, w, h, color, text)
    }

    pub fn switch(x: u8, y: u8, w: u8, h: u8, color: ControlColor, text: &str) -> Arc<Control> {
        Control::new(ControlKind::Switch, x, y, w, h, color, text)
    }

    pub fn slider(x: u8, y: u8, w: u8, h: u8, color: ControlColor, text: &str) -> Arc<Control> {
        Control::new(ControlKind::Slider, x, y, w, h, color, text)
    }

    pub fn analog(x: u8, y: u8, w: u8, h: u8, color: ControlColor, text: &str) -> Arc<Control> {
        Control::new(ControlKind::Analog, x, y, w, h, color, text)
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn color(&self) -> ControlColor {
        self.color
    }

    /// Grid frame as (x, y, w, h).
    pub fn frame(&self) -> (u8, u8, u8, u8) {
        (self.x, self.y, self.w, self.h)
    }

    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    /// Per-type extra configuration block, reserved and zero-filled.
    pub fn config_data(&self) -> [u8; CONFIG_DATA_LEN] {
        [0; CONFIG_DATA_LEN]
    }

    /// Replace the control's text.
    ///
    /// If the control is registered and its worker is running, an update
    /// message is queued into the worker's run loop and pushed to any
    /// subscriber of the UI-update attribute. Otherwise the text is only
    /// stored locally.
    pub fn update_text(&self, text: impl Into<String>) {
        let text = text.into();
        *self.text.lock().unwrap() = text.clone();

        let updates = self.updates.lock().unwrap();
        if let (Some(tx), Some(&index)) = (updates.as_ref(), self.slot.get()) {
            let message = UpdateMessage {
                control_index: index,
                text,
            };
            let _ = tx.send(WorkerCommand::PushUpdate {
                id: AttributeId::UiUpdate,
                value: AttributeValue::Bytes(message.encode()),
            });
        }
    }

    /// Pin the control's wire index. Returns false if already registered.
    pub(crate) fn bind_slot(&self, index: u8) -> bool {
        self.slot.set(index).is_ok()
    }

    pub(crate) fn attach_updates(&self, tx: UpdateSender) {
        *self.updates.lock().unwrap() = Some(tx);
    }

    pub(crate) fn detach_updates(&self) {
        *self.updates.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        for (name, kind) in [
            ("label", ControlKind::Label),
            ("button", ControlKind::Button),
            ("circlebtn", ControlKind::CircleButton),
            ("switch", ControlKind::Switch),
            ("slider", ControlKind::Slider),
            ("analog", ControlKind::Analog),
        ] {
            assert_eq!(name.parse::<ControlKind>().unwrap(), kind);
        }
        assert!(matches!(
            "dial".parse::<ControlKind>(),
            Err(Error::InvalidKind(_))
        ));
    }

    #[test]
    fn test_color_parse() {
        for (name, color) in [
            ("orange", ControlColor::Orange),
            ("yellow", ControlColor::Yellow),
            ("blue", ControlColor::Blue),
            ("green", ControlColor::Green),
            ("pink", ControlColor::Pink),
            ("grey", ControlColor::Grey),
        ] {
            assert_eq!(name.parse::<ControlColor>().unwrap(), color);
        }
        assert!(matches!(
            "red".parse::<ControlColor>(),
            Err(Error::InvalidColor(_))
        ));
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(ControlKind::Label.wire_value(), 1);
        assert_eq!(ControlKind::Analog.wire_value(), 6);
        assert_eq!(ControlColor::Orange.wire_value(), 1);
        assert_eq!(ControlColor::Grey.wire_value(), 6);
    }

    #[test]
    fn test_construction_read_back() {
        let control = Control::new(ControlKind::Slider, 0, 2, 3, 1, ControlColor::Blue, "vol");
        assert_eq!(control.kind(), ControlKind::Slider);
        assert_eq!(control.color(), ControlColor::Blue);
        assert_eq!(control.frame(), (0, 2, 3, 1));
        assert_eq!(control.text(), "vol");
    }

    #[test]
    fn test_config_data_is_zero_filled() {
        let control = Control::button(0, 0, 1, 1, ControlColor::Orange, "ok");
        assert_eq!(control.config_data(), [0u8; CONFIG_DATA_LEN]);
    }

    #[test]
    fn test_update_text_without_worker_is_local() {
        let control = Control::label(0, 0, 1, 1, ControlColor::Pink, "...");
        control.update_text("ok");
        assert_eq!(control.text(), "ok");
    }
}
