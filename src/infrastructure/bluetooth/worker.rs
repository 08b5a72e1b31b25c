//! Peripheral worker.
//!
//! Owns the attribute table and the transport adapter on a dedicated thread
//! with a single-threaded run loop. The caller rendezvous with the worker
//! twice: at start through a one-shot ready-or-error channel (with a
//! timeout, so a hung transport registration surfaces as an error instead
//! of blocking forever), and at stop by joining the thread.

use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::domain::registry::Dispatcher;
use crate::error::Error;
use crate::infrastructure::bluetooth::adapter::{AdapterEvent, RemoteAdapter, ServiceDefinition};
use crate::infrastructure::bluetooth::attributes::AttributeTable;
use crate::infrastructure::bluetooth::protocol::{AttributeId, AttributeValue};

/// Default time the caller waits for the worker to come online.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle of the worker, observable through a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Starting,
    Ready,
    Running,
    Stopping,
    Stopped,
}

/// Commands queued into the worker's run loop.
#[derive(Debug)]
pub enum WorkerCommand {
    /// Store a new attribute value, notifying subscribers if enabled.
    PushUpdate {
        id: AttributeId,
        value: AttributeValue,
    },
    /// Cooperative shutdown request.
    Quit,
}

/// Caller-side handle to a running worker.
pub struct WorkerHandle {
    commands: mpsc::UnboundedSender<WorkerCommand>,
    state: watch::Receiver<WorkerState>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawn the worker and block until it is ready.
    ///
    /// Returns once the adapter has accepted the service and advertisement
    /// registration. A rejection is returned as
    /// [`Error::Registration`]; a registration that never completes is cut
    /// off after `start_timeout`.
    pub fn spawn(
        adapter: Box<dyn RemoteAdapter>,
        definition: ServiceDefinition,
        snapshot: Vec<(AttributeId, AttributeValue)>,
        dispatcher: Dispatcher,
        start_timeout: Duration,
    ) -> Result<WorkerHandle, Error> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(WorkerState::Created);
        let (ready_tx, ready_rx) = std_mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("remote-ui-worker".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(Error::Registration(format!(
                            "failed to build worker runtime: {}",
                            e
                        ))));
                        let _ = state_tx.send(WorkerState::Stopped);
                        return;
                    }
                };
                runtime.block_on(run(
                    adapter, definition, snapshot, dispatcher, cmd_rx, state_tx, ready_tx,
                ));
            })
            .map_err(|e| Error::Registration(format!("failed to spawn worker thread: {}", e)))?;

        match ready_rx.recv_timeout(start_timeout) {
            Ok(Ok(())) => Ok(WorkerHandle {
                commands: cmd_tx,
                state: state_rx,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                // The thread may be stuck inside the adapter's registration
                // call, so it cannot be joined. Dropping the command channel
                // makes the run loop exit immediately if it ever starts.
                let _ = cmd_tx.send(WorkerCommand::Quit);
                warn!(
                    "worker did not become ready within {:?}, abandoning start",
                    start_timeout
                );
                Err(Error::StartTimeout(start_timeout))
            }
            Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                let _ = thread.join();
                Err(Error::WorkerGone)
            }
        }
    }

    /// Sender used to queue commands into the run loop from other threads.
    pub fn command_sender(&self) -> mpsc::UnboundedSender<WorkerCommand> {
        self.commands.clone()
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Request shutdown and block until the worker has stopped.
    pub fn stop(&mut self) {
        let _ = self.commands.send(WorkerCommand::Quit);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    mut adapter: Box<dyn RemoteAdapter>,
    definition: ServiceDefinition,
    snapshot: Vec<(AttributeId, AttributeValue)>,
    mut dispatcher: Dispatcher,
    mut commands: mpsc::UnboundedReceiver<WorkerCommand>,
    state: watch::Sender<WorkerState>,
    ready: std_mpsc::Sender<Result<(), Error>>,
) {
    info!("remote-ui worker starting");
    let _ = state.send(WorkerState::Starting);

    let (event_tx, mut events) = mpsc::unbounded_channel();
    if let Err(e) = adapter.register(&definition, event_tx).await {
        error!("transport registration failed: {:#}", e);
        let _ = ready.send(Err(Error::Registration(e.to_string())));
        // A partial registration (service accepted, advertisement rejected)
        // still needs teardown.
        adapter.unregister().await;
        let _ = state.send(WorkerState::Stopped);
        return;
    }

    let mut table = AttributeTable::new(snapshot);
    let _ = state.send(WorkerState::Ready);
    let _ = ready.send(Ok(()));

    let _ = state.send(WorkerState::Running);
    info!("remote-ui worker running");

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(WorkerCommand::PushUpdate { id, value }) => {
                    if let Some(raw) = table.update(id, value) {
                        if let Err(e) = adapter.notify(id, raw).await {
                            warn!("notify of {} failed: {:#}", id.name(), e);
                        }
                    }
                }
                Some(WorkerCommand::Quit) | None => break,
            },
            event = events.recv() => match event {
                Some(AdapterEvent::Write { id, value }) => {
                    // A bad write is logged and dropped; it never takes the
                    // service down.
                    if let Err(e) = table.write(id, &value, &mut dispatcher) {
                        warn!("dropping write to {}: {}", id.name(), e);
                    }
                }
                Some(AdapterEvent::Read { id, reply }) => {
                    let _ = reply.send(table.read(id));
                }
                Some(AdapterEvent::NotifyChanged { id, enabled }) => {
                    table.set_notify(id, enabled);
                }
                None => {
                    warn!("adapter event channel closed, shutting down");
                    break;
                }
            },
        }
    }

    let _ = state.send(WorkerState::Stopping);
    adapter.unregister().await;
    let _ = state.send(WorkerState::Stopped);
    info!("remote-ui worker stopped");
}
