//! Bluetooth Module
//!
//! Exposes the remote-UI layout as a BLE GATT service and relays
//! interaction traffic between the companion app and the registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Worker                            │
//! │   (lifecycle state machine + single-threaded run loop)   │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐
//! │ Attribute │  │  Protocol  │  │ Adapter  │
//! │   Table   │  │            │  │          │
//! │ - values  │  │ - UUIDs    │  │ - GATT   │
//! │ - notify  │  │ - codec    │  │   service │
//! │   gating  │  │ - events   │  │ - adverts │
//! └───────────┘  └────────────┘  └──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - attribute table constants, value codec, event and
//!   update message formats
//! - [`attributes`] - attribute table service (reads, writes, notification
//!   gating)
//! - [`worker`] - peripheral worker and lifecycle state machine
//! - [`adapter`] - transport adapter seam
//! - [`bluez`] - BlueZ-backed adapter (feature `bluez`)

pub mod adapter;
pub mod attributes;
#[cfg(feature = "bluez")]
pub mod bluez;
pub mod protocol;
pub mod worker;
