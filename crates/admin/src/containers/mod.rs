//! Entity containers.
//!
//! One container per entity type owns that entity's in-memory collection.
//! A container is an actor task: callers hold a cloneable [`EntityHandle`],
//! send it commands, and read the state it publishes.
//!
//! ```text
//!  handle ──Command──▶ actor ──Pending──▶ state (watch)
//!                        │
//!                        └─spawn─▶ request task ──store call──▶ DocumentStore
//!                                       │
//!  handle ◀──reply── request task ◀─ack─┴─Settled(Fulfilled|Rejected)─▶ actor
//! ```
//!
//! The actor never awaits the store itself, so several requests may be in
//! flight at once. Their completions are applied in arrival order, and a
//! caller is answered only after its completion has been applied, so reading
//! [`EntityHandle::snapshot`] right after an operation returns always
//! reflects it.

pub mod state;

pub use state::{Completion, EntityState, Operation, Outcome, Transition};

use storedesk_core::{Document, Editable, Entity, Fields, FieldsError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::instrument;

use crate::store::{SharedStore, StoreError};

const COMMAND_BUFFER: usize = 64;

/// Errors returned to container callers.
///
/// The container's own `error` string is set independently of these.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The store request failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A record could not be encoded or decoded.
    #[error(transparent)]
    Fields(#[from] FieldsError),

    /// The container task is gone.
    #[error("{entity} container has shut down")]
    Closed { entity: &'static str },
}

type Reply<T> = oneshot::Sender<Result<T, ContainerError>>;

enum Command<E> {
    List {
        reply: Reply<()>,
    },
    Create {
        fields: Fields,
        reply: Reply<E>,
    },
    Update {
        id: String,
        fields: Fields,
        reply: Reply<()>,
    },
    Delete {
        id: String,
        reply: Reply<()>,
    },
    ResetError,
}

/// A finished store request, waiting to be applied.
struct Settled<E> {
    transition: Transition<E>,
    applied: oneshot::Sender<()>,
}

/// Handle to an entity container.
pub struct EntityHandle<E> {
    commands: mpsc::Sender<Command<E>>,
    state: watch::Receiver<EntityState<E>>,
}

impl<E> Clone for EntityHandle<E> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            state: self.state.clone(),
        }
    }
}

impl<E: Entity> EntityHandle<E> {
    /// Start a container over `store`.
    ///
    /// Must be called from within a Tokio runtime. The container stops once
    /// every handle is dropped and no request is in flight.
    #[must_use]
    pub fn spawn(store: SharedStore) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(EntityState::default());

        let actor = Actor {
            store,
            state: state_tx,
            settled: settled_tx,
        };
        tokio::spawn(actor.run(commands_rx, settled_rx));

        tracing::debug!(entity = E::PLURAL, "Container started");

        Self {
            commands: commands_tx,
            state: state_rx,
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> EntityState<E> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EntityState<E>> {
        self.state.clone()
    }

    /// Fetch every record, replacing the local collection.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError` if the store request fails (the local
    /// collection is kept) or the container is gone.
    #[instrument(skip(self), fields(entity = E::PLURAL))]
    pub async fn list(&self) -> Result<(), ContainerError> {
        self.request(|reply| Command::List { reply }).await
    }

    /// Delete a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError` if the store request fails or the container
    /// is gone.
    #[instrument(skip(self), fields(entity = E::PLURAL))]
    pub async fn delete(&self, id: &str) -> Result<(), ContainerError> {
        let id = id.to_string();
        self.request(|reply| Command::Delete { id, reply }).await
    }

    /// Clear the container's error message.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::Closed` if the container is gone.
    pub async fn reset_error(&self) -> Result<(), ContainerError> {
        self.commands
            .send(Command::ResetError)
            .await
            .map_err(|_| ContainerError::Closed { entity: E::PLURAL })
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command<E>,
    ) -> Result<T, ContainerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ContainerError::Closed { entity: E::PLURAL })?;
        response
            .await
            .map_err(|_| ContainerError::Closed { entity: E::PLURAL })?
    }
}

impl<E: Editable> EntityHandle<E> {
    /// Create a record; returns it with its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError` if the draft cannot be encoded, the store
    /// request fails, or the container is gone.
    #[instrument(skip(self, draft), fields(entity = E::PLURAL))]
    pub async fn create(&self, draft: &E::Draft) -> Result<E, ContainerError> {
        let fields = E::draft_fields(draft)?;
        self.request(|reply| Command::Create { fields, reply }).await
    }

    /// Write a partial update to record `id`.
    ///
    /// On success the local copy, if any, is replaced by the local copy
    /// merged with the patch.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError` if the patch cannot be encoded, the store
    /// request fails, or the container is gone.
    #[instrument(skip(self, patch), fields(entity = E::PLURAL))]
    pub async fn update(&self, id: &str, patch: &E::Patch) -> Result<(), ContainerError> {
        let fields = E::patch_fields(patch)?;
        let id = id.to_string();
        self.request(|reply| Command::Update { id, fields, reply })
            .await
    }
}

struct Actor<E> {
    store: SharedStore,
    state: watch::Sender<EntityState<E>>,
    settled: mpsc::UnboundedSender<Settled<E>>,
}

impl<E: Entity> Actor<E> {
    async fn run(
        self,
        mut commands: mpsc::Receiver<Command<E>>,
        mut settled: mpsc::UnboundedReceiver<Settled<E>>,
    ) {
        let mut open = true;

        loop {
            tokio::select! {
                command = commands.recv(), if open => match command {
                    Some(command) => self.dispatch(command),
                    None => open = false,
                },
                Some(done) = settled.recv() => {
                    self.apply(done.transition);
                    let _ = done.applied.send(());
                }
            }

            if !open && self.state.borrow().in_flight() == 0 {
                break;
            }
        }

        tracing::debug!(entity = E::PLURAL, "Container stopped");
    }

    fn apply(&self, transition: Transition<E>) {
        self.state.send_modify(|state| state.apply(transition));
    }

    fn dispatch(&self, command: Command<E>) {
        match command {
            Command::List { reply } => {
                self.apply(Transition::Pending(Operation::List));
                let store = self.store.clone();
                self.settle(Operation::List, reply, async move {
                    let documents = store.list(E::COLLECTION).await?;
                    let items = documents
                        .into_iter()
                        .map(E::from_document)
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok::<_, ContainerError>((Outcome::Listed(items), ()))
                });
            }
            Command::Create { fields, reply } => {
                self.apply(Transition::Pending(Operation::Create));
                let store = self.store.clone();
                self.settle(Operation::Create, reply, async move {
                    // Fields that would not list back are never written.
                    let mut item = E::from_document(Document::new("", fields.clone()))?;
                    let id = store.add(E::COLLECTION, fields).await?;
                    item.set_id(id);
                    Ok::<_, ContainerError>((Outcome::Created(item.clone()), item))
                });
            }
            Command::Update { id, fields, reply } => {
                self.apply(Transition::Pending(Operation::Update));
                let store = self.store.clone();
                self.settle(Operation::Update, reply, async move {
                    store.update(E::COLLECTION, &id, fields.clone()).await?;
                    Ok::<_, ContainerError>((Outcome::Updated { id, patch: fields }, ()))
                });
            }
            Command::Delete { id, reply } => {
                self.apply(Transition::Pending(Operation::Delete));
                let store = self.store.clone();
                self.settle(Operation::Delete, reply, async move {
                    store.delete(E::COLLECTION, &id).await?;
                    Ok::<_, ContainerError>((Outcome::Deleted { id }, ()))
                });
            }
            Command::ResetError => self.apply(Transition::ResetError),
        }
    }

    /// Run `request` on its own task, hand its transition back to the actor,
    /// and answer the caller once the transition has been applied.
    fn settle<T, F>(&self, operation: Operation, reply: Reply<T>, request: F)
    where
        T: Send + 'static,
        F: Future<Output = Result<(Outcome<E>, T), ContainerError>> + Send + 'static,
    {
        let settled = self.settled.clone();

        tokio::spawn(async move {
            let (transition, result) = match request.await {
                Ok((outcome, value)) => (Transition::Fulfilled(outcome), Ok(value)),
                Err(e) => {
                    tracing::error!(
                        entity = E::PLURAL,
                        operation = %operation,
                        error = %e,
                        "{}",
                        operation.failure_message::<E>()
                    );
                    (Transition::Rejected(operation), Err(e))
                }
            };

            let (applied, wait) = oneshot::channel();
            if settled.send(Settled { transition, applied }).is_err() {
                return;
            }
            if wait.await.is_ok() {
                let _ = reply.send(result);
            }
        });
    }
}
