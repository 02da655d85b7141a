// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-node-type activation accounting.
//!
//! The ledger is the one serialization point in the coordinator: the
//! quota check and the increment happen under a single mutex acquisition,
//! so two concurrent requests for the last remaining slot resolve to
//! exactly one grant. There is no un-reserve; revocation is out of scope.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Activation quota for a node type is exhausted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("activation quota exhausted for node type {node_type:?}")]
pub struct QuotaExceeded {
    pub node_type: String,
}

/// Counts activations granted per node type.
#[derive(Debug, Default)]
pub struct ActivationLedger {
    counts: Mutex<BTreeMap<String, u32>>,
}

impl ActivationLedger {
    /// Create a ledger with every given node type initialized to zero.
    pub fn new<'a>(node_types: impl Iterator<Item = &'a str>) -> Self {
        let counts =
            node_types.map(|name| (name.to_string(), 0)).collect();
        ActivationLedger { counts: Mutex::new(counts) }
    }

    /// Atomically reserve one activation slot for `node_type`.
    ///
    /// A `max_activations` of zero means unlimited: the reservation always
    /// succeeds and no count is tracked. Otherwise the count is
    /// incremented only if it is below `max_activations`; on failure
    /// nothing is mutated.
    pub fn try_reserve(
        &self,
        node_type: &str,
        max_activations: u32,
    ) -> Result<(), QuotaExceeded> {
        if max_activations == 0 {
            return Ok(());
        }
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(node_type.to_string()).or_insert(0);
        if *count < max_activations {
            *count += 1;
            Ok(())
        } else {
            Err(QuotaExceeded { node_type: node_type.to_string() })
        }
    }

    /// The number of activations granted so far for `node_type`.
    pub fn granted(&self, node_type: &str) -> u32 {
        self.counts.lock().unwrap().get(node_type).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn reserves_up_to_the_quota() {
        let ledger = ActivationLedger::new(["backend"].into_iter());
        assert!(ledger.try_reserve("backend", 2).is_ok());
        assert!(ledger.try_reserve("backend", 2).is_ok());
        assert!(ledger.try_reserve("backend", 2).is_err());
        assert_eq!(ledger.granted("backend"), 2);
    }

    #[test]
    fn zero_quota_is_unlimited() {
        let ledger = ActivationLedger::default();
        for _ in 0..1000 {
            assert!(ledger.try_reserve("backend", 0).is_ok());
        }
        assert_eq!(ledger.granted("backend"), 0);
    }

    #[test]
    fn failed_reservation_does_not_mutate() {
        let ledger = ActivationLedger::default();
        assert!(ledger.try_reserve("backend", 1).is_ok());
        for _ in 0..10 {
            assert!(ledger.try_reserve("backend", 1).is_err());
        }
        assert_eq!(ledger.granted("backend"), 1);
    }

    #[test]
    fn node_types_are_tracked_independently() {
        let ledger =
            ActivationLedger::new(["frontend", "backend"].into_iter());
        assert!(ledger.try_reserve("frontend", 1).is_ok());
        assert!(ledger.try_reserve("frontend", 1).is_err());
        assert!(ledger.try_reserve("backend", 1).is_ok());
    }

    // N threads race for K slots; exactly K must win regardless of
    // scheduling.
    #[test]
    fn concurrent_reservations_never_exceed_the_quota() {
        const N: usize = 64;
        const K: u32 = 5;

        let ledger = Arc::new(ActivationLedger::default());
        let handles: Vec<_> = (0..N)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    ledger.try_reserve("backend", K).is_ok()
                })
            })
            .collect();

        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|reserved| *reserved)
            .count();
        assert_eq!(granted, K as usize);
        assert_eq!(ledger.granted("backend"), K);
    }
}
