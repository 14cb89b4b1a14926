//! Entity container state and its reducer.
//!
//! Every container operation moves through three phases: it is `Pending`
//! while the store request is in flight, then either `Fulfilled` with an
//! [`Outcome`] or `Rejected`. [`EntityState::apply`] is the only way state
//! changes, and it performs no I/O.

use std::fmt;

use storedesk_core::{Entity, Fields};

/// Container operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Verb used in failure messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::List => "fetch",
            Self::Create => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Human-readable failure message for entity `E`
    /// ("Failed to fetch products", "Failed to delete order").
    #[must_use]
    pub fn failure_message<E: Entity>(self) -> String {
        let noun = match self {
            Self::List => E::PLURAL,
            Self::Create | Self::Update | Self::Delete => E::LABEL,
        };
        format!("Failed to {} {noun}", self.verb())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Result of a successful store request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<E> {
    /// The full collection, in store order.
    Listed(Vec<E>),
    /// A new record carrying its store-assigned identifier.
    Created(E),
    /// The fields that were written to record `id`.
    Updated { id: String, patch: Fields },
    /// Record `id` was removed.
    Deleted { id: String },
}

impl<E> Outcome<E> {
    /// The operation this outcome completes.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Listed(_) => Operation::List,
            Self::Created(_) => Operation::Create,
            Self::Updated { .. } => Operation::Update,
            Self::Deleted { .. } => Operation::Delete,
        }
    }
}

/// A state change.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<E> {
    Pending(Operation),
    Fulfilled(Outcome<E>),
    Rejected(Operation),
    ResetError,
}

/// How the most recent operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub operation: Operation,
    pub succeeded: bool,
}

/// Snapshot of an entity container.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState<E> {
    /// Records, in the order the store last returned them (creates appended).
    pub items: Vec<E>,
    /// Message of the most recent failure, until cleared.
    pub error: Option<String>,
    /// Most recently completed operation.
    pub last: Option<Completion>,
    in_flight: usize,
}

impl<E> Default for EntityState<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
            last: None,
            in_flight: 0,
        }
    }
}

impl<E: Entity> EntityState<E> {
    /// Whether any operation is still waiting on the store.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Number of operations waiting on the store.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Record with the given identifier.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Apply a transition.
    pub fn apply(&mut self, transition: Transition<E>) {
        match transition {
            Transition::Pending(operation) => {
                self.in_flight += 1;
                if operation == Operation::List {
                    self.error = None;
                }
            }
            Transition::Fulfilled(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.last = Some(Completion {
                    operation: outcome.operation(),
                    succeeded: true,
                });
                self.fulfil(outcome);
            }
            Transition::Rejected(operation) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.last = Some(Completion {
                    operation,
                    succeeded: false,
                });
                self.error = Some(operation.failure_message::<E>());
            }
            Transition::ResetError => self.error = None,
        }
    }

    fn fulfil(&mut self, outcome: Outcome<E>) {
        match outcome {
            Outcome::Listed(items) => {
                self.items = items;
                self.error = None;
            }
            Outcome::Created(item) => self.items.push(item),
            Outcome::Updated { id, patch } => {
                let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
                    return;
                };
                match item.merged(patch) {
                    Ok(merged) => *item = merged,
                    Err(e) => {
                        tracing::warn!(entity = E::LABEL, id = %id, error = %e, "Updated record no longer decodes, keeping previous copy");
                    }
                }
            }
            Outcome::Deleted { id } => self.items.retain(|item| item.id() != id),
        }
    }
}
