//! Remote-UI Protocol
//!
//! This module contains the protocol definitions shared with the companion
//! app: the fixed attribute table, the per-type binary value encoding, and
//! the event / UI-update message formats.

use crate::error::Error;

/// Remote-UI BLE Service UUID
pub const SERVICE_UUID: &str = "3f60ab39-1710-4456-930c-7e9c9539917e";

/// Protocol version published through [`AttributeId::ProtocolVersion`]
pub const PROTOCOL_VERSION: i32 = 4;

/// Length of the fixed event record written by the companion app
pub const EVENT_LEN: usize = 6;

/// One named entry of the exposed attribute table.
///
/// The table is fixed: every service instance publishes exactly these twelve
/// attributes. Their UUIDs are protocol constants and must match the
/// companion app bit-exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeId {
    ProtocolVersion,
    ControlCount,
    ControlTypes,
    Row,
    Col,
    Colors,
    Frames,
    Names,
    Orientation,
    ConfigDataArray,
    /// 6-byte event record, write-only from the companion app
    Event,
    /// Variable-length update message, notify-only toward the companion app
    UiUpdate,
}

impl AttributeId {
    /// Every attribute, in table order.
    pub const ALL: [AttributeId; 12] = [
        AttributeId::ProtocolVersion,
        AttributeId::ControlCount,
        AttributeId::ControlTypes,
        AttributeId::Row,
        AttributeId::Col,
        AttributeId::Colors,
        AttributeId::Frames,
        AttributeId::Names,
        AttributeId::Orientation,
        AttributeId::ConfigDataArray,
        AttributeId::Event,
        AttributeId::UiUpdate,
    ];

    /// Characteristic UUID for this attribute.
    pub fn uuid(self) -> &'static str {
        match self {
            AttributeId::ProtocolVersion => "ae73266e-65d4-4023-8868-88b070d5d576",
            AttributeId::ControlCount => "3f60ab39-1711-4456-930c-7e9c9539917e",
            AttributeId::ControlTypes => "3f60ab39-1712-4456-930c-7e9c9539917e",
            AttributeId::Row => "3f60ab39-1713-4456-930c-7e9c9539917e",
            AttributeId::Col => "3f60ab39-1714-4456-930c-7e9c9539917e",
            AttributeId::Colors => "3f60ab39-1715-4456-930c-7e9c9539917e",
            AttributeId::Frames => "3f60ab39-1716-4456-930c-7e9c9539917e",
            AttributeId::Names => "3f60ab39-1717-4456-930c-7e9c9539917e",
            AttributeId::Orientation => "203fbbcd-9967-4eba-b0ff-0f72e5a634eb",
            AttributeId::ConfigDataArray => "5d7a63ff-4155-4c7c-a348-1c0a323a6383",
            AttributeId::Event => "b5d2ff7b-6eff-4fb5-9b72-6b9cff5181e7",
            AttributeId::UiUpdate => "e4b1ddfe-eb37-4c78-aba8-c5fa944775cb",
        }
    }

    /// Wire name of this attribute, used for logs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            AttributeId::ProtocolVersion => "rcProtocolVersion",
            AttributeId::ControlCount => "rcControlCount",
            AttributeId::ControlTypes => "rcControlTypes",
            AttributeId::Row => "rcRow",
            AttributeId::Col => "rcCol",
            AttributeId::Colors => "rcColors",
            AttributeId::Frames => "rcFrames",
            AttributeId::Names => "rcNames",
            AttributeId::Orientation => "rcOrientation",
            AttributeId::ConfigDataArray => "rcConfigDataArray",
            AttributeId::Event => "rcEvent",
            AttributeId::UiUpdate => "rcUIUpdate",
        }
    }

    /// Declared value type of this attribute.
    pub fn value_type(self) -> ValueType {
        match self {
            AttributeId::ProtocolVersion
            | AttributeId::ControlCount
            | AttributeId::Row
            | AttributeId::Col
            | AttributeId::Orientation => ValueType::Int32,
            AttributeId::ControlTypes
            | AttributeId::Colors
            | AttributeId::Frames
            | AttributeId::ConfigDataArray
            | AttributeId::Event
            | AttributeId::UiUpdate => ValueType::Bytes,
            AttributeId::Names => ValueType::Text,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Wire encoding class of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int32,
    Bytes,
    Text,
}

/// A typed attribute value together with its binary encoding rules.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int32(i32),
    Bytes(Vec<u8>),
    Text(String),
}

impl AttributeValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            AttributeValue::Int32(_) => ValueType::Int32,
            AttributeValue::Bytes(_) => ValueType::Bytes,
            AttributeValue::Text(_) => ValueType::Text,
        }
    }

    /// Encode this value for the wire.
    ///
    /// Int32 values use the platform-native 4-byte signed encoding, byte
    /// arrays are emitted one byte per element in order, and text is the
    /// string's UTF-8 bytes with no length prefix.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            AttributeValue::Int32(v) => v.to_ne_bytes().to_vec(),
            AttributeValue::Bytes(b) => b.clone(),
            AttributeValue::Text(s) => s.as_bytes().to_vec(),
        }
    }

    /// Decode raw bytes into a value of the given type.
    ///
    /// Exact inverse of [`encode`](Self::encode); malformed input is an
    /// error, never a partial value.
    pub fn decode(value_type: ValueType, raw: &[u8]) -> Result<AttributeValue, Error> {
        match value_type {
            ValueType::Int32 => {
                let bytes: [u8; 4] = raw.try_into().map_err(|_| {
                    Error::Decode(format!("expected 4 bytes for int32 value, got {}", raw.len()))
                })?;
                Ok(AttributeValue::Int32(i32::from_ne_bytes(bytes)))
            }
            ValueType::Bytes => Ok(AttributeValue::Bytes(raw.to_vec())),
            ValueType::Text => String::from_utf8(raw.to_vec())
                .map(AttributeValue::Text)
                .map_err(|e| Error::Decode(format!("text value is not valid UTF-8: {}", e))),
        }
    }
}

/// Decoded interaction event from the companion app.
///
/// # Event Record Structure (6 bytes)
///
/// ```text
/// [0] : Sequence number
/// [1] : Control index (registry insertion order)
/// [2] : Event code
/// [3] : Processed sequence (reserved, carried but not interpreted)
/// [4] : Data value low byte
/// [5] : Data value high byte
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub sequence: u8,
    pub control_index: u8,
    pub code: u8,
    pub processed_sequence: u8,
    pub data_value: u16,
}

impl Event {
    /// Decode a raw 6-byte event record.
    pub fn decode(raw: &[u8]) -> Result<Event, Error> {
        if raw.len() != EVENT_LEN {
            return Err(Error::Decode(format!(
                "event record must be {} bytes, got {}",
                EVENT_LEN,
                raw.len()
            )));
        }
        Ok(Event {
            sequence: raw[0],
            control_index: raw[1],
            code: raw[2],
            processed_sequence: raw[3],
            data_value: raw[4] as u16 | (raw[5] as u16) << 8,
        })
    }

    pub fn encode(&self) -> [u8; EVENT_LEN] {
        [
            self.sequence,
            self.control_index,
            self.code,
            self.processed_sequence,
            (self.data_value & 0xff) as u8,
            (self.data_value >> 8) as u8,
        ]
    }
}

/// Text push toward the companion app.
///
/// Encoded as `[controlIndex, textLen + 1, text bytes..., 0]` - the length
/// field counts the trailing null terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMessage {
    pub control_index: u8,
    pub text: String,
}

impl UpdateMessage {
    pub fn encode(&self) -> Vec<u8> {
        let text = self.text.as_bytes();
        let mut out = Vec::with_capacity(text.len() + 3);
        out.push(self.control_index);
        out.push((text.len() + 1) as u8);
        out.extend_from_slice(text);
        out.push(0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int32_round_trip() {
        for v in [0, 1, -1, 4, i32::MAX, i32::MIN] {
            let value = AttributeValue::Int32(v);
            let decoded = AttributeValue::decode(ValueType::Int32, &value.encode()).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_bytes_round_trip() {
        for bytes in [vec![], vec![0u8], vec![1, 2, 3, 255]] {
            let value = AttributeValue::Bytes(bytes);
            let decoded = AttributeValue::decode(ValueType::Bytes, &value.encode()).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_text_round_trip() {
        for text in ["", "ok", "a\nb\nc"] {
            let value = AttributeValue::Text(text.to_string());
            let decoded = AttributeValue::decode(ValueType::Text, &value.encode()).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_int32_decode_rejects_wrong_length() {
        assert!(AttributeValue::decode(ValueType::Int32, &[1, 2, 3]).is_err());
        assert!(AttributeValue::decode(ValueType::Int32, &[1, 2, 3, 4, 5]).is_err());
    }

    #[test]
    fn test_event_decode() {
        let event = Event::decode(&[0, 2, 1, 0, 7, 0]).unwrap();
        assert_eq!(event.control_index, 2);
        assert_eq!(event.code, 1);
        assert_eq!(event.data_value, 7);

        let event = Event::decode(&[0, 2, 1, 0, 255, 1]).unwrap();
        assert_eq!(event.data_value, 511);
    }

    #[test]
    fn test_event_decode_rejects_wrong_length() {
        assert!(Event::decode(&[0, 2, 1, 0, 7]).is_err());
        assert!(Event::decode(&[0, 2, 1, 0, 7, 0, 0]).is_err());
    }

    #[test]
    fn test_event_encode_is_decode_inverse() {
        let event = Event {
            sequence: 9,
            control_index: 3,
            code: 1,
            processed_sequence: 0,
            data_value: 511,
        };
        assert_eq!(Event::decode(&event.encode()).unwrap(), event);
    }

    #[test]
    fn test_update_message_encode() {
        let msg = UpdateMessage {
            control_index: 1,
            text: "ok".to_string(),
        };
        assert_eq!(msg.encode(), vec![1, 3, 111, 107, 0]);
    }

    #[test]
    fn test_update_message_empty_text() {
        let msg = UpdateMessage {
            control_index: 0,
            text: String::new(),
        };
        assert_eq!(msg.encode(), vec![0, 1, 0]);
    }

    #[test]
    fn test_attribute_table_is_complete() {
        assert_eq!(AttributeId::ALL.len(), 12);
        for (i, id) in AttributeId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(id.uuid().len(), 36);
        }
    }
}
