//! # Latest-Value Cache
//!
//! Keeps the most recent reading per (quantity, subsystem) pair. The cache
//! is fed by the collector's value stream and read back in two places: the
//! `cache fetch` command, and the single decode-time dependency of the
//! message codec (the heating-system type steering HK opmode offsets).

use crate::payload::names::{describe, quantity_name, subsystem_name};
use crate::payload::value::{EmsValue, Quantity, Subsystem};
use std::collections::HashMap;

/// In-memory store of the latest value per (quantity, subsystem).
#[derive(Debug, Default)]
pub struct ValueCache {
    values: HashMap<(Quantity, Subsystem), EmsValue>,
}

impl ValueCache {
    pub fn new() -> ValueCache {
        ValueCache::default()
    }

    /// Stores `value` as the latest reading of its key.
    pub fn update(&mut self, value: &EmsValue) {
        self.values
            .insert((value.quantity, value.subsystem), value.clone());
    }

    /// The latest reading for a key, if any arrived yet.
    pub fn get(&self, quantity: Quantity, subsystem: Subsystem) -> Option<&EmsValue> {
        self.values.get(&(quantity, subsystem))
    }

    /// Renders every entry whose quantity or subsystem name matches all
    /// `selector` tokens. An empty selector dumps the whole cache.
    pub fn dump(&self, selector: &[String]) -> Vec<String> {
        let mut lines: Vec<String> = self
            .values
            .values()
            .filter(|value| {
                selector.iter().all(|token| {
                    quantity_name(value.quantity) == token.as_str()
                        || subsystem_name(value.subsystem) == token.as_str()
                })
            })
            .map(describe)
            .collect();
        lines.sort();
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_replaces_previous_reading() {
        let mut cache = ValueCache::new();
        cache.update(&EmsValue::enumeration(Quantity::HeatingSystem, Subsystem::Hk1, 1));
        cache.update(&EmsValue::enumeration(Quantity::HeatingSystem, Subsystem::Hk1, 3));
        let value = cache.get(Quantity::HeatingSystem, Subsystem::Hk1).unwrap();
        assert_eq!(value.enum_value(), Some(3));
    }

    #[test]
    fn keys_are_per_subsystem() {
        let mut cache = ValueCache::new();
        cache.update(&EmsValue::enumeration(Quantity::HeatingSystem, Subsystem::Hk1, 3));
        assert!(cache.get(Quantity::HeatingSystem, Subsystem::Hk2).is_none());
    }

    #[test]
    fn dump_filters_by_selector() {
        let mut cache = ValueCache::new();
        cache.update(&EmsValue::enumeration(Quantity::OpMode, Subsystem::Hk1, 2));
        cache.update(&EmsValue::boolean(Quantity::FlameActive, Subsystem::None, 1, 0));

        let all = cache.dump(&[]);
        assert_eq!(all.len(), 2);

        let hk1 = cache.dump(&["hk1".to_string()]);
        assert_eq!(hk1, vec!["hk1 opmode = auto".to_string()]);
    }
}
