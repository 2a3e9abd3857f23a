use super::SignatureTableError;
use crate::OutcomeKind;
use alloy_json_abi::{Event, JsonAbi};
use alloy_primitives::B256;
use std::collections::{BTreeMap, HashMap};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

/// A recognized outcome event together with its precomputed signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefinition {
    kind: OutcomeKind,
    event: Event,
    signature: B256,
}

impl EventDefinition {
    /// Creates a new [`EventDefinition`], hashing the event's canonical signature.
    pub fn new(kind: OutcomeKind, event: Event) -> Self {
        let signature = event.selector();
        Self { kind, event, signature }
    }

    /// The outcome kind this definition represents.
    pub const fn kind(&self) -> OutcomeKind {
        self.kind
    }

    /// The event member as declared by the contract interface.
    pub const fn event(&self) -> &Event {
        &self.event
    }

    /// The `keccak256` of the canonical signature, matched against `topics[0]`.
    pub const fn signature(&self) -> B256 {
        self.signature
    }

    /// The canonical signature string, e.g. `OmniverseNotOwner(bytes)`.
    pub fn canonical(&self) -> String {
        self.event.signature()
    }
}

/// Index of the recognized outcome events of the token-logic contract.
///
/// Built once at initialization and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureTable {
    definitions: BTreeMap<OutcomeKind, EventDefinition>,
    by_signature: HashMap<B256, OutcomeKind>,
}

impl SignatureTable {
    /// Builds the table from a contract interface description.
    ///
    /// Kinds missing from the interface are skipped. An interface declaring the same recognized
    /// name twice is rejected.
    pub fn build(abi: &JsonAbi) -> Result<Self, SignatureTableError> {
        let mut table = Self::default();

        for kind in OutcomeKind::iter() {
            let Some(events) = abi.event(kind.event_name()) else {
                debug!(target: "relay::table", %kind, "Outcome event not declared by interface");
                continue;
            };

            let event = match events.as_slice() {
                [event] => event,
                [] => continue,
                events => {
                    return Err(SignatureTableError::Duplicate { kind, count: events.len() });
                }
            };

            if event.anonymous {
                warn!(target: "relay::table", %kind, "Skipping anonymous outcome event");
                continue;
            }

            table.insert(EventDefinition::new(kind, event.clone()))?;
        }

        debug!(target: "relay::table", entries = table.len(), "Signature table built");
        Ok(table)
    }

    fn insert(&mut self, definition: EventDefinition) -> Result<(), SignatureTableError> {
        let kind = definition.kind();
        if let Some(first) = self.by_signature.insert(definition.signature(), kind) {
            return Err(SignatureTableError::SelectorCollision {
                first,
                second: kind,
                signature: definition.signature(),
            });
        }
        self.definitions.insert(kind, definition);
        Ok(())
    }

    /// Returns the definition registered for `kind`.
    pub fn get(&self, kind: OutcomeKind) -> Option<&EventDefinition> {
        self.definitions.get(&kind)
    }

    /// Resolves a log's first topic to the matching definition.
    pub fn resolve(&self, topic: &B256) -> Option<&EventDefinition> {
        self.by_signature.get(topic).and_then(|kind| self.definitions.get(kind))
    }

    /// Iterates over the definitions in classification priority order.
    pub fn iter(&self) -> impl Iterator<Item = &EventDefinition> {
        self.definitions.values()
    }

    /// Number of recognized kinds present in the table.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if the interface declared none of the recognized kinds.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
