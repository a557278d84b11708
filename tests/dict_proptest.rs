// Property tests for Dict and HashMap against a std::collections::HashMap model.

use std::collections::HashMap as ModelMap;
use std::collections::HashSet;

use proptest::prelude::*;
use tabdict::Config;
use tabdict::Dict;
use tabdict::DictError;
use tabdict::DictKey;
use tabdict::HashKind;
use tabdict::HashMap;
use tabdict::Key;
use tabdict::KeyHasher;
use tabdict::ProbeKind;
use tabdict::ProbeStrategy;

#[derive(Clone, Debug)]
enum Op {
    Insert(Key, i32),
    Delete(Key),
    Get(Key),
    Compact,
    Shrink,
    Clear,
    Iterate,
}

fn arb_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        "[a-d]{0,3}".prop_map(|s| Key::from(s.as_str())),
        (-20i64..20).prop_map(Key::from),
        ((-3i64..3), "[a-b]{0,1}")
            .prop_map(|(i, s)| Key::tuple([Key::from(i), Key::from(s.as_str())])),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            6 => (arb_key(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            3 => arb_key().prop_map(Op::Delete),
            3 => arb_key().prop_map(Op::Get),
            1 => Just(Op::Compact),
            1 => Just(Op::Shrink),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ],
        1..200,
    )
}

fn arb_config() -> impl Strategy<Value = Config> {
    (
        prop_oneof![Just(HashKind::Polynomial), Just(HashKind::Tabulation)],
        prop_oneof![Just(ProbeKind::Perturbation), Just(ProbeKind::Linear)],
        1u32..9,
        any::<u64>(),
    )
        .prop_map(|(hash, probe, shift, seed)| {
            Config::default()
                .hash(hash)
                .probe(probe)
                .perturb_shift(shift)
                .seed(seed)
        })
}

fn check_shape<K, V>(dict: &Dict<K, V>, expected_len: usize) -> Result<(), TestCaseError> {
    prop_assert_eq!(dict.len(), expected_len);
    prop_assert!(dict.size().is_power_of_two());
    prop_assert!(dict.size() >= tabdict::MIN_SIZE);
    prop_assert!(dict.len() <= dict.fill());
    prop_assert!(dict.fill() < dict.size(), "no empty slot left");
    Ok(())
}

proptest! {
    #[test]
    fn prop_model_check(config in arb_config(), collide in any::<bool>(), ops in arb_ops()) {
        let hasher = KeyHasher::new(&config).unwrap();
        let dict: Dict<Key, i32> = Dict::with_config(&config).unwrap();
        let mut model: ModelMap<Key, i32> = ModelMap::new();

        // Folding hashes onto four values makes every probe walk long chains.
        let hash_of = |key: &Key| {
            let hash = key.hash_key(&hasher).unwrap();
            if collide { hash & 3 } else { hash }
        };

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let fill_before = dict.fill();
                    let size_before = dict.size();
                    let old = dict.set(k.clone(), hash_of(&k), v).unwrap();
                    prop_assert_eq!(old, model.insert(k, v));
                    if old.is_some() {
                        prop_assert_eq!(dict.fill(), fill_before);
                        prop_assert_eq!(dict.size(), size_before);
                    }
                }
                Op::Delete(k) => {
                    let fill_before = dict.fill();
                    match dict.delete(&k, hash_of(&k)) {
                        Ok(()) => {
                            prop_assert!(model.remove(&k).is_some());
                            prop_assert_eq!(dict.fill(), fill_before);
                        }
                        Err(DictError::KeyNotFound) => prop_assert!(!model.contains_key(&k)),
                        Err(e) => prop_assert!(false, "unexpected error {e}"),
                    }
                    prop_assert_eq!(dict.get(&k, hash_of(&k)).unwrap(), None);
                }
                Op::Get(k) => {
                    prop_assert_eq!(dict.get(&k, hash_of(&k)).unwrap(), model.get(&k).copied());
                    prop_assert_eq!(dict.contains(&k, hash_of(&k)).unwrap(), model.contains_key(&k));
                }
                Op::Compact => {
                    let size = dict.size();
                    dict.compact().unwrap();
                    prop_assert_eq!(dict.size(), size);
                    prop_assert_eq!(dict.fill(), dict.len());
                }
                Op::Shrink => {
                    dict.shrink_to_fit().unwrap();
                    prop_assert_eq!(dict.fill(), dict.len());
                }
                Op::Clear => {
                    dict.clear();
                    model.clear();
                    prop_assert_eq!(dict.size(), tabdict::MIN_SIZE);
                }
                Op::Iterate => {
                    let mut seen = ModelMap::new();
                    for item in dict.iter() {
                        let (k, v) = item.unwrap();
                        prop_assert!(seen.insert(k, v).is_none(), "key yielded twice");
                    }
                    prop_assert_eq!(&seen, &model);
                }
            }
            check_shape(&dict, model.len())?;
        }

        for (k, v) in &model {
            prop_assert_eq!(dict.get(k, hash_of(k)).unwrap(), Some(*v));
        }
    }

    #[test]
    fn prop_resize_preserves_contents(
        config in arb_config(),
        keys in proptest::collection::hash_set("[a-z0-9.]{1,8}", 1..300),
        deletions in 0usize..300,
    ) {
        let mut map: HashMap<String, usize> = HashMap::with_config(&config).unwrap();
        let keys: Vec<String> = keys.into_iter().collect();
        for (i, key) in keys.iter().enumerate() {
            map.insert(key.clone(), i).unwrap();
        }
        for key in keys.iter().take(deletions) {
            prop_assert!(map.remove(key).unwrap().is_some());
        }

        let snapshot = |map: &HashMap<String, usize>| {
            map.iter().map(|r| r.unwrap()).collect::<ModelMap<_, _>>()
        };
        let before = snapshot(&map);

        map.compact().unwrap();
        prop_assert_eq!(&snapshot(&map), &before);
        map.shrink_to_fit().unwrap();
        prop_assert_eq!(&snapshot(&map), &before);
        map.reserve(1000).unwrap();
        prop_assert_eq!(&snapshot(&map), &before);
    }

    #[test]
    fn prop_probe_covers_table(hash in any::<u64>(), bits in 3u32..13, shift in 1u32..64) {
        let mask = (1usize << bits) - 1;
        for strategy in [ProbeStrategy::perturbation(shift).unwrap(), ProbeStrategy::linear()] {
            let visited: HashSet<usize> = strategy.sequence(hash, mask).collect();
            prop_assert_eq!(visited.len(), mask + 1);
        }
    }

    #[test]
    fn prop_hash_determinism(bytes in proptest::collection::vec(any::<u8>(), 0..64), seed in any::<u64>()) {
        for kind in [HashKind::Polynomial, HashKind::Tabulation] {
            let config = Config::default().hash(kind).seed(seed);
            let a = KeyHasher::new(&config).unwrap();
            let b = KeyHasher::new(&config).unwrap();
            let hash = a.hash_bytes(&bytes);
            prop_assert_eq!(hash, b.hash_bytes(&bytes));
            prop_assert_eq!(hash, a.hash_bytes(&bytes));
            prop_assert_ne!(hash, tabdict::hashing::INVALID_HASH);
            if bytes.is_empty() {
                prop_assert_eq!(hash, 0);
            }
        }
    }
}

#[test]
fn growth_from_six_inserts() {
    let dict: Dict<i64, i64> = Dict::new();
    for i in 0..5 {
        dict.set(i, i as u64, i).unwrap();
        assert_eq!(dict.size(), 8);
    }
    dict.set(5, 5, 5).unwrap();
    assert_eq!(dict.size(), 32);
}

#[test]
fn eight_letters_land_in_thirty_two_slots() {
    for kind in [HashKind::Polynomial, HashKind::Tabulation] {
        let mut map = HashMap::with_config(&Config::default().hash(kind)).unwrap();
        for (i, letter) in ('a'..='h').enumerate() {
            map.insert(letter.to_string(), i).unwrap();
        }
        assert_eq!(map.size(), 32);
        for (i, letter) in ('a'..='h').enumerate() {
            assert_eq!(map.get(&letter.to_string()).unwrap(), Some(i));
        }
    }
}

#[test]
fn iteration_reports_mid_walk_delete() {
    let mut map = HashMap::with_config(&Config::default().seed(1)).unwrap();
    for i in 0..10i64 {
        map.insert(i, i).unwrap();
    }

    let mut iter = map.dict().iter();
    let first = iter.next().unwrap().unwrap();
    let hash = map.hasher().hash_int(first.0);
    map.dict().delete(&first.0, hash).unwrap();

    assert!(matches!(
        iter.next(),
        Some(Err(DictError::IterationInvalidated))
    ));
    assert!(iter.next().is_none());
    assert_eq!(map.len(), 9);
}
