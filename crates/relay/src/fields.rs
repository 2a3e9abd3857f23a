//! Name-based access to decoded ABI values.

use alloy_dyn_abi::{DecodedEvent, DynSolValue};
use alloy_json_abi::{Event, Param};
use alloy_primitives::{Bytes, U256};
use std::collections::HashMap;

/// Decoded event fields keyed by their declared parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct EventFields {
    values: HashMap<String, DynSolValue>,
}

impl EventFields {
    /// Pairs each declared input with its decoded value, pulling indexed inputs from the topics
    /// and the rest from the data section.
    pub(crate) fn new(event: &Event, decoded: DecodedEvent) -> Self {
        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();

        let values = event
            .inputs
            .iter()
            .filter_map(|input| {
                let value = if input.indexed { indexed.next() } else { body.next() }?;
                Some((input.name.clone(), value))
            })
            .collect();

        Self { values }
    }

    /// Removes and returns the value declared under `name`.
    pub(crate) fn take(&mut self, name: &str) -> Option<DynSolValue> {
        self.values.remove(name)
    }
}

/// Looks up a named value inside decoded function outputs, descending into tuples.
pub(crate) fn find_output<'a>(
    params: &[Param],
    values: &'a [DynSolValue],
    name: &str,
) -> Option<&'a DynSolValue> {
    for (param, value) in params.iter().zip(values) {
        if param.name == name {
            return Some(value);
        }
        if param.components.is_empty() {
            continue;
        }
        if let Some(found) =
            value.as_tuple().and_then(|inner| find_output(&param.components, inner, name))
        {
            return Some(found);
        }
    }
    None
}

/// Interprets an account-like value (`bytes`, `address`, or a fixed byte array) as raw bytes.
pub(crate) fn party_bytes(value: &DynSolValue) -> Option<Bytes> {
    match value {
        DynSolValue::Bytes(bytes) => Some(Bytes::copy_from_slice(bytes)),
        DynSolValue::Address(address) => Some(Bytes::copy_from_slice(address.as_slice())),
        DynSolValue::FixedBytes(word, size) => Some(Bytes::copy_from_slice(&word[..*size])),
        _ => None,
    }
}

/// Interprets an unsigned integer value of any width.
pub(crate) fn uint(value: &DynSolValue) -> Option<U256> {
    value.as_uint().map(|(value, _)| value)
}
