use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{
    core::state::{PersistentState, StateError},
    op::Update,
    persist::FlatStore,
    record::{Patch, Record},
    types::{BoxError, Revision},
};

use super::events::StateEvent;

/// Errors surfaced through a [`StateHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The engine rejected the operation.
    #[error(transparent)]
    State(#[from] StateError),
    /// The runtime loop has stopped.
    #[error("state runtime is closed")]
    ChannelClosed,
}

/// Runtime tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Bound of the command queue.
    pub command_queue_bound: usize,
    /// Capacity of the event broadcast buffer.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable handle to a state engine running on its own task.
pub struct StateHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<StateEvent>,
}

impl Clone for StateHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Apply {
        updates: Vec<Update>,
        resp: oneshot::Sender<Result<Arc<Record>, RuntimeError>>,
    },
    Get {
        resp: oneshot::Sender<(Revision, Arc<Record>)>,
    },
    Reload {
        resp: oneshot::Sender<Result<Arc<Record>, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `state` onto a tokio task that applies commands in arrival order.
pub fn spawn_state<S>(state: PersistentState<S>, config: RuntimeConfig) -> StateHandle
where
    S: FlatStore + Send + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<StateEvent>(config.event_capacity);

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut state = state;
        tracing::debug!(schema = %state.schema_id(), "state runtime started");

        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &mut state, &events_tx_loop) {
                break;
            }
        }

        tracing::debug!(schema = %state.schema_id(), revision = state.revision(), "state runtime stopped");
    });

    StateHandle { cmd_tx, events_tx }
}

impl StateHandle {
    /// Subscribes to commit events.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events_tx.subscribe()
    }

    /// Applies one update.
    pub async fn apply(&self, update: Update) -> Result<Arc<Record>, RuntimeError> {
        self.batch(vec![update]).await
    }

    /// Applies a literal patch.
    pub async fn set(&self, patch: Patch) -> Result<Arc<Record>, RuntimeError> {
        self.apply(Update::Set(patch)).await
    }

    /// Applies a patch computed from the value current at execution time.
    pub async fn update<F>(&self, f: F) -> Result<Arc<Record>, RuntimeError>
    where
        F: FnOnce(&Record) -> Patch + Send + 'static,
    {
        self.apply(Update::with(f)).await
    }

    /// Applies a fallible patch computed from the value current at execution time.
    pub async fn try_update<F>(&self, f: F) -> Result<Arc<Record>, RuntimeError>
    where
        F: FnOnce(&Record) -> Result<Patch, BoxError> + Send + 'static,
    {
        self.apply(Update::try_with(f)).await
    }

    /// Applies several updates as one tick, each seeing the previous result.
    pub async fn batch(&self, updates: Vec<Update>) -> Result<Arc<Record>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Apply { updates, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Current value.
    pub async fn get(&self) -> Result<Arc<Record>, RuntimeError> {
        self.get_with_revision().await.map(|(_, record)| record)
    }

    /// Current value and its revision.
    pub async fn get_with_revision(&self) -> Result<(Revision, Arc<Record>), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Get { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Re-reads the store.
    pub async fn reload(&self) -> Result<Arc<Record>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Reload { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Stops the runtime loop after pending commands.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command<S: FlatStore>(
    cmd: Command,
    state: &mut PersistentState<S>,
    events_tx: &broadcast::Sender<StateEvent>,
) -> bool {
    match cmd {
        Command::Apply { updates, resp } => {
            let mut res = Ok(state.snapshot());
            for update in updates {
                match state.apply(update) {
                    Ok(record) => {
                        let _ = events_tx.send(StateEvent::Committed {
                            revision: state.revision(),
                        });
                        res = Ok(record);
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, revision = state.revision(), "update rejected");
                        let _ = events_tx.send(StateEvent::UpdateFailed {
                            revision: state.revision(),
                        });
                        res = Err(RuntimeError::from(err));
                        break;
                    }
                }
            }
            let _ = resp.send(res);
        }
        Command::Get { resp } => {
            let _ = resp.send((state.revision(), state.snapshot()));
        }
        Command::Reload { resp } => {
            let res = state.reload().map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(StateEvent::Reloaded {
                    revision: state.revision(),
                });
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}
