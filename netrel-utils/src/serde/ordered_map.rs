//! Module that allows to (de-)serialize a `BTreeMap` with structured keys with `serde`.
//!
//! JSON only supports string keys. Maps keyed by edges or node pairs are therefore written as a
//! sequence of `{"key": ..., "val": ...}` entries, in key order.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Helper struct that allows (de-)serialization of a single entry.
#[derive(Deserialize, Serialize)]
struct Entry<K, V> {
    key: K,
    val: V,
}

/// Serialize a BTreeMap whose key is not a string as a sequence of entries.
pub fn serialize<K: Serialize, V: Serialize, S: Serializer>(
    map: &BTreeMap<K, V>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(map.iter().map(|(key, val)| Entry { key, val }))
}

/// Deserialize a BTreeMap from a sequence of entries. Later entries overwrite earlier ones with
/// the same key.
pub fn deserialize<'de, K: Deserialize<'de> + Ord, V: Deserialize<'de>, D>(
    deserializer: D,
) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Entry<K, V>>::deserialize(deserializer).map(|v| {
        v.into_iter()
            .map(|entry: Entry<K, V>| (entry.key, entry.val))
            .collect()
    })
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Loads {
        #[serde(with = "super")]
        flows: BTreeMap<(usize, usize), f64>,
    }

    #[test]
    fn test_serialize_sorted_entries() {
        let loads = Loads {
            flows: BTreeMap::from_iter([((2, 3), 1.5), ((0, 1), 5.0)]),
        };
        let serialized = serde_json::to_string(&loads).unwrap();
        assert_eq!(
            serialized,
            r#"{"flows":[{"key":[0,1],"val":5.0},{"key":[2,3],"val":1.5}]}"#
        );
    }

    #[test]
    fn test_deserialize_entries() {
        let json = r#"{"flows":[{"key":[1,2],"val":3.0},{"key":[0,4],"val":0.5}]}"#;
        let loads: Loads = serde_json::from_str(json).unwrap();
        assert_eq!(loads.flows.len(), 2);
        assert_eq!(loads.flows[&(1, 2)], 3.0);
        assert_eq!(loads.flows[&(0, 4)], 0.5);
    }
}
