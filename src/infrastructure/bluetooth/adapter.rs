//! Transport adapter seam.
//!
//! The core never talks to a BLE stack directly; it hands the adapter a
//! service definition and a channel for inbound traffic, and calls back out
//! for notifications. Everything radio-related (advertising, connections,
//! pairing) stays on the adapter's side of this seam.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::error::Error;
use crate::infrastructure::bluetooth::protocol::AttributeId;

/// What the adapter must expose on the air for one remote-UI service.
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    /// GATT service UUID, a protocol constant.
    pub service_uuid: &'static str,
    /// Advertised device name.
    pub local_name: String,
    /// Attributes to expose, one characteristic each, in table order.
    pub attributes: Vec<AttributeId>,
}

/// Inbound traffic delivered by the adapter to the worker run loop.
#[derive(Debug)]
pub enum AdapterEvent {
    /// The companion app wrote raw bytes to an attribute.
    Write { id: AttributeId, value: Vec<u8> },
    /// The companion app read an attribute; the encoded value (or the read
    /// failure) goes back through `reply`.
    Read {
        id: AttributeId,
        reply: oneshot::Sender<Result<Vec<u8>, Error>>,
    },
    /// The companion app subscribed to or unsubscribed from an attribute.
    NotifyChanged { id: AttributeId, enabled: bool },
}

pub type AdapterEventSender = mpsc::UnboundedSender<AdapterEvent>;

/// Narrow interface the core consumes from the wireless transport.
///
/// Implementations own all radio state. `register` must bring both the GATT
/// service and the advertisement online before returning; a failure of
/// either is a registration failure and the worker never reaches ready.
#[async_trait]
pub trait RemoteAdapter: Send {
    /// Register the service and advertisement, delivering subsequent inbound
    /// traffic through `events`.
    async fn register(
        &mut self,
        definition: &ServiceDefinition,
        events: AdapterEventSender,
    ) -> anyhow::Result<()>;

    /// Push a changed attribute value to subscribers.
    async fn notify(&mut self, id: AttributeId, value: Vec<u8>) -> anyhow::Result<()>;

    /// Tear down the advertisement and service. Idempotent.
    async fn unregister(&mut self);
}
