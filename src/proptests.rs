use std::collections::BTreeMap;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use crate::error::KeyError;
use crate::table::ArrayHashTable;

/// Model implementation using BTreeMap for comparison.
#[derive(Default)]
struct Model {
    map: BTreeMap<Vec<u8>, u64>,
}

/// Actions to test against both implementations.
#[derive(Arbitrary, Debug, Clone)]
enum Action {
    Insert(KeyValue),
    Get(Key),
    GetOrInsert(Key),
}

/// Wrapper for key generation with custom strategy.
#[derive(Debug, Clone)]
struct Key(Vec<u8>);

/// Wrapper for a key-value pair.
#[derive(Debug, Clone)]
struct KeyValue {
    key: Key,
    value: u64,
}

impl Arbitrary for Key {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            // Rejected at the boundary.
            1 => Just(Key(vec![])),
            // Short keys, arbitrary bytes (embedded zeros included).
            4 => prop::collection::vec(any::<u8>(), 1..4).prop_map(Key),
            4 => prop::collection::vec(any::<u8>(), 4..64).prop_map(Key),
            // Around the one-byte/two-byte length prefix boundary.
            2 => prop::collection::vec(any::<u8>(), 120..140).prop_map(Key),
        ]
        .boxed()
    }
}

impl Arbitrary for KeyValue {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<Key>(), any::<u64>())
            .prop_map(|(key, value)| KeyValue { key, value })
            .boxed()
    }
}

/// Test harness that executes actions on both the table and the model.
#[derive(Default)]
struct Test {
    table: ArrayHashTable<u64>,
    model: Model,
}

impl Test {
    fn execute(&mut self, action: Action) {
        match action {
            Action::Insert(kv) => {
                let key = kv.key.0;
                let table_result = self.table.insert(&key, kv.value);
                if key.is_empty() {
                    assert_eq!(table_result, Err(KeyError::ZeroLength));
                } else {
                    let model_result = self.model.map.insert(key.clone(), kv.value);
                    assert_eq!(
                        table_result,
                        Ok(model_result),
                        "Insert mismatch: key={:?}",
                        key
                    );
                }
            }
            Action::Get(key) => {
                let key = key.0;
                let table_result = self.table.get(&key);
                if key.is_empty() {
                    assert_eq!(table_result, Err(KeyError::ZeroLength));
                } else {
                    let model_result = self.model.map.get(&key).copied();
                    assert_eq!(
                        table_result,
                        Ok(model_result),
                        "Get mismatch: key={:?}",
                        key
                    );
                }
            }
            Action::GetOrInsert(key) => {
                let key = key.0;
                if key.is_empty() {
                    assert!(self.table.get_or_insert(&key).is_err());
                } else {
                    let expected = *self.model.map.entry(key.clone()).or_insert(0);
                    let got = self.table.get_or_insert(&key).unwrap().get();
                    assert_eq!(got, expected, "GetOrInsert mismatch: key={:?}", key);
                }
            }
        }
        // Always verify len matches.
        assert_eq!(
            self.table.len(),
            self.model.map.len(),
            "Length mismatch after action"
        );
        assert_eq!(self.table.is_empty(), self.model.map.is_empty());
    }

    /// A full traversal must agree with the model, record for record.
    fn check_iteration(&self) {
        let iterated: BTreeMap<Vec<u8>, u64> =
            self.table.iter().map(|(k, v)| (k.to_vec(), v)).collect();
        assert_eq!(iterated, self.model.map, "Iteration mismatch");
        assert_eq!(self.table.iter().count(), self.table.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn proptest_vs_btreemap(actions in prop::collection::vec(any::<Action>(), 1..64)) {
        let mut test = Test::default();
        for action in actions {
            test.execute(action);
        }
        test.check_iteration();
    }

    #[test]
    fn proptest_dense_insert_crosses_expansion(kvs in prop::collection::vec(any::<KeyValue>(), 64..200)) {
        let mut test = Test::default();
        for kv in kvs {
            test.execute(Action::Insert(kv));
        }
        test.check_iteration();
    }

    #[test]
    fn proptest_clear_resets(kvs in prop::collection::vec(any::<KeyValue>(), 1..100)) {
        let mut table: ArrayHashTable<u64> = ArrayHashTable::new();
        for kv in &kvs {
            if !kv.key.0.is_empty() {
                table.insert(&kv.key.0, kv.value).unwrap();
            }
        }

        table.clear();
        prop_assert_eq!(table.len(), 0);
        prop_assert_eq!(table.iter().count(), 0);
        prop_assert_eq!(table.bucket_count(), 8);

        table.insert(b"z", 1).unwrap();
        prop_assert_eq!(table.get(b"z").unwrap(), Some(1));
        prop_assert_eq!(table.len(), 1);
    }
}
