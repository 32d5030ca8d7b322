// Dict property tests over the public surface.
//
// Property 1: snapshot round trip.
//  - For arbitrary u64 -> u64 and text -> i32 contents, deserialize(serialize(d))
//    holds exactly the same (key, value) pairs and no chain is longer than
//    the bucket count.
//
// Property 2: arena-backed table agrees with a hashbrown model.
//  - Operations: put, remove, contains, read.
//  - Invariant after each op: len and membership match the model, and every
//    value read equals the model's last write.
use hashbrown::HashMap;
use kind_dict::{Arena, ArenaConfig, Dict, KeyAttr, ValueAttr};
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn prop_u64_snapshot_round_trip(entries in proptest::collection::btree_map(any::<u64>(), any::<u64>(), 0..600)) {
        let mut d: Dict<u64> = Dict::with_value_size(8);
        for (k, v) in &entries {
            *d.get_as::<u64>(k) = *v;
        }
        let bytes = d.serialize();
        let mut back = Dict::<u64>::deserialize(KeyAttr::new(), ValueAttr::new(8), &bytes)
            .expect("same descriptors");
        prop_assert_eq!(back.len(), entries.len());
        prop_assert!(back.max_chain_len() <= back.bucket_count());
        for (k, v) in &entries {
            prop_assert!(back.contains_key(k));
            prop_assert_eq!(*back.get_as::<u64>(k), *v);
        }
    }

    #[test]
    fn prop_text_snapshot_round_trip(entries in proptest::collection::btree_map("[ -~]{0,12}", any::<i32>(), 0..200)) {
        let mut d: Dict<str> = Dict::new(KeyAttr::new(), ValueAttr::new(4));
        for (k, v) in &entries {
            *d.get_as::<i32>(k) = *v;
        }
        let bytes = d.serialize();
        let back = Dict::<str>::deserialize(KeyAttr::new(), ValueAttr::new(4), &bytes)
            .expect("same descriptors");
        let got: BTreeMap<String, i32> = back
            .iter()
            .map(|(h, _, v)| {
                let k = h.key(&back).expect("live");
                (k, i32::from_ne_bytes([v[0], v[1], v[2], v[3]]))
            })
            .collect();
        prop_assert_eq!(got, entries);
    }
}

#[derive(Clone, Debug)]
enum Op {
    Put(u16, u32),
    Remove(u16),
    Contains(u16),
    Read(u16),
}

fn arb_op() -> impl Strategy<Value = Op> {
    // A small key space keeps hits, misses and removals all common.
    let key = 0u16..300;
    prop_oneof![
        3 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
        1 => key.clone().prop_map(Op::Remove),
        1 => key.clone().prop_map(Op::Contains),
        1 => key.prop_map(Op::Read),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn prop_arena_table_matches_model(ops in proptest::collection::vec(arb_op(), 1..400)) {
        let arena = Arena::with_config(ArenaConfig::new(64));
        let mut sut = Dict::with_alloc(KeyAttr::<str>::new(), ValueAttr::new(4), &arena);
        let mut model: HashMap<String, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    let k = format!("k{k}");
                    *sut.get_as::<u32>(&k) = v;
                    model.insert(k, v);
                }
                Op::Remove(k) => {
                    let k = format!("k{k}");
                    prop_assert_eq!(sut.remove(&k), model.remove(&k).is_some());
                }
                Op::Contains(k) => {
                    let k = format!("k{k}");
                    prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
                }
                Op::Read(k) => {
                    let k = format!("k{k}");
                    // Reading an absent key inserts a zeroed value.
                    let expected = *model.entry(k.clone()).or_insert(0);
                    prop_assert_eq!(*sut.get_as::<u32>(&k), expected);
                }
            }
            prop_assert_eq!(sut.len(), model.len());
        }
    }
}
