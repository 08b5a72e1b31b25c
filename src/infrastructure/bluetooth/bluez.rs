//! BlueZ-backed transport adapter.
//!
//! Maps the adapter seam onto `bluer`: one GATT characteristic per
//! attribute, an advertisement carrying the service UUID and device name,
//! and a forwarding task per characteristic that drains queued
//! notifications into the subscriber's notifier.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bluer::adv::{Advertisement, AdvertisementHandle};
use bluer::gatt::local::{
    Application, ApplicationHandle, Characteristic, CharacteristicNotify,
    CharacteristicNotifyMethod, CharacteristicRead, CharacteristicWrite,
    CharacteristicWriteMethod, ReqError, Service,
};
use bluer::Uuid;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::infrastructure::bluetooth::adapter::{
    AdapterEvent, AdapterEventSender, RemoteAdapter, ServiceDefinition,
};
use crate::infrastructure::bluetooth::protocol::AttributeId;

const NOTIFY_QUEUE_DEPTH: usize = 32;

/// BlueZ implementation of the transport adapter.
pub struct BlueZAdapter {
    adapter: Option<bluer::Adapter>,
    notify_txs: HashMap<AttributeId, mpsc::Sender<Vec<u8>>>,
    adv_handle: Option<AdvertisementHandle>,
    app_handle: Option<ApplicationHandle>,
}

impl BlueZAdapter {
    pub fn new() -> BlueZAdapter {
        BlueZAdapter {
            adapter: None,
            notify_txs: HashMap::new(),
            adv_handle: None,
            app_handle: None,
        }
    }

    fn build_characteristic(
        id: AttributeId,
        events: &AdapterEventSender,
        notify_rx: mpsc::Receiver<Vec<u8>>,
    ) -> Result<Characteristic> {
        let uuid = Uuid::from_str(id.uuid())
            .with_context(|| format!("bad characteristic uuid for {}", id.name()))?;
        let notify_rx = Arc::new(Mutex::new(notify_rx));

        let read_events = events.clone();
        let write_events = events.clone();
        let notify_events = events.clone();

        Ok(Characteristic {
            uuid,
            read: Some(CharacteristicRead {
                read: true,
                fun: Box::new(move |_req| {
                    let events = read_events.clone();
                    Box::pin(async move {
                        let (reply_tx, reply_rx) = oneshot::channel();
                        events
                            .send(AdapterEvent::Read {
                                id,
                                reply: reply_tx,
                            })
                            .map_err(|_| ReqError::Failed)?;
                        match reply_rx.await {
                            Ok(Ok(value)) => Ok(value),
                            Ok(Err(e)) => {
                                warn!("read of {} failed: {}", id.name(), e);
                                Err(ReqError::Failed)
                            }
                            Err(_) => Err(ReqError::Failed),
                        }
                    })
                }),
                ..Default::default()
            }),
            write: Some(CharacteristicWrite {
                write: true,
                write_without_response: true,
                method: CharacteristicWriteMethod::Fun(Box::new(move |data, _req| {
                    let events = write_events.clone();
                    Box::pin(async move {
                        events
                            .send(AdapterEvent::Write { id, value: data })
                            .map_err(|_| ReqError::Failed)?;
                        Ok(())
                    })
                })),
                ..Default::default()
            }),
            notify: Some(CharacteristicNotify {
                notify: true,
                method: CharacteristicNotifyMethod::Fun(Box::new(move |mut notifier| {
                    let notify_rx = notify_rx.clone();
                    let events = notify_events.clone();
                    Box::pin(async move {
                        debug!("notification session for {} started", id.name());
                        let _ = events.send(AdapterEvent::NotifyChanged { id, enabled: true });
                        loop {
                            let data = { notify_rx.lock().await.recv().await };
                            match data {
                                Some(data) => {
                                    if let Err(e) = notifier.notify(data).await {
                                        debug!("notify of {} failed: {}", id.name(), e);
                                        break;
                                    }
                                }
                                None => break,
                            }
                        }
                        let _ = events.send(AdapterEvent::NotifyChanged { id, enabled: false });
                        debug!("notification session for {} ended", id.name());
                    })
                })),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

impl Default for BlueZAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteAdapter for BlueZAdapter {
    async fn register(
        &mut self,
        definition: &ServiceDefinition,
        events: AdapterEventSender,
    ) -> Result<()> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        info!("Using Bluetooth adapter: {}", adapter.name());

        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }
        adapter.set_alias(definition.local_name.clone()).await?;

        let service_uuid =
            Uuid::from_str(definition.service_uuid).context("bad service uuid")?;

        let mut characteristics = Vec::with_capacity(definition.attributes.len());
        for &id in &definition.attributes {
            let (notify_tx, notify_rx) = mpsc::channel(NOTIFY_QUEUE_DEPTH);
            self.notify_txs.insert(id, notify_tx);
            characteristics.push(Self::build_characteristic(id, &events, notify_rx)?);
        }

        let app = Application {
            services: vec![Service {
                uuid: service_uuid,
                primary: true,
                characteristics,
                ..Default::default()
            }],
            ..Default::default()
        };
        self.app_handle = Some(
            adapter
                .serve_gatt_application(app)
                .await
                .context("GATT service registration rejected")?,
        );
        info!("GATT service registered");

        let advertisement = Advertisement {
            service_uuids: std::iter::once(service_uuid).collect(),
            discoverable: Some(true),
            local_name: Some(definition.local_name.clone()),
            ..Default::default()
        };
        self.adv_handle = Some(
            adapter
                .advertise(advertisement)
                .await
                .context("advertisement registration rejected")?,
        );
        info!("Advertising as \"{}\"", definition.local_name);

        self.adapter = Some(adapter);
        Ok(())
    }

    async fn notify(&mut self, id: AttributeId, value: Vec<u8>) -> Result<()> {
        let tx = self
            .notify_txs
            .get(&id)
            .ok_or_else(|| anyhow!("no notification queue for {}", id.name()))?;
        tx.try_send(value)
            .map_err(|e| anyhow!("notification queue for {}: {}", id.name(), e))
    }

    async fn unregister(&mut self) {
        if self.adv_handle.take().is_some() {
            info!("Advertisement unregistered");
        }
        if self.app_handle.take().is_some() {
            info!("GATT service unregistered");
        }
        self.notify_txs.clear();
        self.adapter = None;
    }
}
