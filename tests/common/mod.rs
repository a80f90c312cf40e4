//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use datapipe_rs::Value;
use std::collections::HashMap;

/// Build an input map from name/value pairs
pub fn inputs<V: Clone>(pairs: &[(&str, V)]) -> HashMap<String, V> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Integer addition over `Value`s, failing on anything else
pub fn add_values(args: &[Value]) -> anyhow::Result<Value> {
    let mut total = 0i64;
    for arg in args {
        match arg.as_int() {
            Some(v) => total += v,
            None => anyhow::bail!("cannot add {}", arg.type_name()),
        }
    }
    Ok(Value::Int(total))
}

/// Sorted keys of an output map
pub fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}
