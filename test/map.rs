use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use orsetmap::*;

struct Case {
    name: &'static str,
    mutations: fn(&OrSetMap),
    want_contains: &'static [(&'static str, bool)],
    want_list: &'static [(&'static str, &'static str)],
    want_state: Completeness,
}

fn unknown_parent() -> ContentHash {
    ContentHash::digest(b"unknown")
}

fn cases() -> Vec<Case> {
    vec![
        Case {
            name: "add single elements",
            mutations: |map| {
                map.add("fruit", "apple").unwrap();
                map.add("computer", "laptop").unwrap();
                map.add("car", "Toyota").unwrap();
            },
            want_contains: &[("fruit", true), ("computer", true), ("car", true), ("bike", false)],
            want_list: &[("fruit", "apple"), ("computer", "laptop"), ("car", "Toyota")],
            want_state: Completeness::Complete,
        },
        Case {
            name: "update existing element",
            mutations: |map| {
                map.add("fruit", "apple").unwrap();
                map.add("fruit", "banana").unwrap();
            },
            want_contains: &[("fruit", true)],
            want_list: &[("fruit", "banana")],
            want_state: Completeness::Complete,
        },
        Case {
            name: "remove element",
            mutations: |map| {
                map.add("fruit", "apple").unwrap();
                map.remove("fruit").unwrap();
            },
            want_contains: &[("fruit", false)],
            want_list: &[],
            want_state: Completeness::Complete,
        },
        Case {
            name: "remove and re-add element",
            mutations: |map| {
                map.add("fruit", "apple").unwrap();
                map.remove("fruit").unwrap();
                map.add("fruit", "cherry").unwrap();
            },
            want_contains: &[("fruit", true)],
            want_list: &[("fruit", "cherry")],
            want_state: Completeness::Complete,
        },
        Case {
            name: "remove non-existent element",
            mutations: |map| {
                map.remove("fruit").unwrap();
            },
            want_contains: &[("fruit", false)],
            want_list: &[],
            want_state: Completeness::Complete,
        },
        Case {
            name: "update with unknown parents",
            mutations: |map| {
                map.add("fruit", "apple").unwrap();
                let foreign = Mutation::new(
                    "B",
                    vec![unknown_parent()].into_iter().collect(),
                    vec![Op::add("fruit", "banana", Tag::new(1, "B"))],
                );
                assert_eq!(map.import_log(vec![foreign]), Ok(1));
            },
            want_contains: &[("fruit", true)],
            want_list: &[("fruit", "banana")],
            want_state: Completeness::Partial,
        },
        Case {
            name: "add, update, remove element",
            mutations: |map| {
                map.add("fruit", "apple").unwrap();
                map.add("fruit", "banana").unwrap();
                map.remove("fruit").unwrap();
            },
            want_contains: &[("fruit", false)],
            want_list: &[],
            want_state: Completeness::Complete,
        },
    ]
}

fn list_of(pairs: &[(&str, &str)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::from(*v)))
        .collect()
}

fn check(case: &Case, map: &OrSetMap, label: &str) {
    for (key, expected) in case.want_contains {
        assert_eq!(
            map.contains(key),
            *expected,
            "{} ({}): contains {}",
            case.name,
            label,
            key
        );
    }
    assert_eq!(map.list(), list_of(case.want_list), "{} ({}): list", case.name, label);
    assert_eq!(map.completeness(), case.want_state, "{} ({}): state", case.name, label);
}

#[test]
fn scenarios_hold_locally_and_after_replication() {
    for case in cases() {
        let map = OrSetMap::new("A");
        (case.mutations)(&map);
        check(&case, &map, "local");

        let replica = OrSetMap::new("C");
        replica.import_log(map.export_log()).unwrap();
        check(&case, &replica, "replicated");
        assert_eq!(replica.heads(), map.heads(), "{}: heads", case.name);
        assert_eq!(replica.len(), map.len(), "{}: log size", case.name);
    }
}

#[test]
fn partial_log_reports_missing_ancestor() {
    let map = OrSetMap::new("A");
    let foreign = Mutation::new(
        "B",
        vec![unknown_parent()].into_iter().collect(),
        vec![Op::add("veg", "carrot", Tag::new(7, "B"))],
    );
    map.import_log(vec![foreign]).unwrap();
    assert!(!map.is_complete());
    assert_eq!(map.missing_ancestors(), vec![unknown_parent()].into_iter().collect());
    assert_eq!(map.get("veg"), Some(Value::from("carrot")));

    // local writes still descend from the partial frontier
    map.add("veg", "leek").unwrap();
    assert_eq!(map.get("veg"), Some(Value::from("leek")));
    assert_eq!(map.heads().len(), 1);
}

#[test]
fn add_wins_over_unobserved_concurrent_remove() {
    let a = OrSetMap::new("A");
    let b = OrSetMap::new("B");

    a.add("fruit", "apple").unwrap();
    b.merge(&a).unwrap();

    // a re-adds concurrently with b removing what it saw
    a.add("fruit", "cherry").unwrap();
    b.remove("fruit").unwrap();

    a.merge(&b).unwrap();
    b.merge(&a).unwrap();

    for map in &[&a, &b] {
        assert!(map.contains("fruit"));
        assert_eq!(map.get("fruit"), Some(Value::from("cherry")));
    }
    assert_eq!(a.list(), b.list());
}

#[test]
fn remove_on_empty_replica_does_not_touch_remote_adds() {
    let a = OrSetMap::new("A");
    let b = OrSetMap::new("B");
    a.add("fruit", "apple").unwrap();
    b.remove("fruit").unwrap();

    b.merge(&a).unwrap();
    assert!(b.contains("fruit"));
    assert_eq!(b.heads().len(), 2);
}

#[test]
fn observed_remove_converges_to_absent() {
    let a = OrSetMap::new("A");
    let b = OrSetMap::new("B");
    a.add("fruit", "apple").unwrap();
    b.add("fruit", "pear").unwrap();
    a.merge(&b).unwrap();

    a.remove("fruit").unwrap();
    b.merge(&a).unwrap();
    assert!(!a.contains("fruit"));
    assert!(!b.contains("fruit"));
}

#[test]
fn equal_clocks_from_different_replicas_resolve_the_same_everywhere() {
    let a = OrSetMap::new("A");
    let b = OrSetMap::new("B");
    a.add("fruit", "apple").unwrap();
    b.add("fruit", "banana").unwrap();

    a.merge(&b).unwrap();
    b.merge(&a).unwrap();
    assert_eq!(a.get("fruit"), Some(Value::from("banana")));
    assert_eq!(b.get("fruit"), Some(Value::from("banana")));
}

#[test]
fn cycle_in_imported_batch_is_rejected() {
    fn by_key(mutation: &Mutation) -> Result<ContentHash, Error> {
        Ok(ContentHash::digest(mutation.ops[0].key().as_bytes()))
    }
    let named = |name: &str| ContentHash::digest(name.as_bytes());

    let map = OrSetMap::with_hasher("A", by_key);
    let a = Mutation::new(
        "B",
        vec![named("b")].into_iter().collect(),
        vec![Op::add("a", "1", Tag::new(1, "B"))],
    );
    let b = Mutation::new(
        "B",
        vec![named("a")].into_iter().collect(),
        vec![Op::add("b", "2", Tag::new(2, "B"))],
    );
    let c = Mutation::new("B", Default::default(), vec![Op::add("c", "3", Tag::new(3, "B"))]);

    let err = map.import_log(vec![a, b, c]).unwrap_err();
    assert_eq!(err, Error::CycleDetected { hash: named("b") });

    // only the offending mutation is dropped; the rest of the batch lands
    assert_eq!(map.len(), 2);
    assert!(map.contains("a"));
    assert!(!map.contains("b"));
    assert!(map.contains("c"));
    assert_eq!(map.get("c"), Some(Value::from("3")));
}

#[test]
fn add_after_observing_the_last_clock_value_fails_cleanly() {
    let map = OrSetMap::new("A");
    let foreign = Mutation::new(
        "B",
        Default::default(),
        vec![Op::add("k", "x", Tag::new(u64::MAX, "B"))],
    );
    map.import_log(vec![foreign]).unwrap();
    let heads = map.heads();

    let err = map.add("k", "mine").unwrap_err();
    assert_eq!(err, Error::ClockExhausted { clock: u64::MAX });
    assert_eq!(map.get("k"), Some(Value::from("x")));
    assert_eq!(map.len(), 1);
    assert_eq!(map.heads(), heads);

    // removes mint no tag and keep working
    map.remove("k").unwrap();
    assert!(!map.contains("k"));
}

#[test]
fn encoding_failures_leave_the_map_unchanged() {
    fn refuse_poison(mutation: &Mutation) -> Result<ContentHash, Error> {
        if mutation.ops.iter().any(|op| op.key() == "poison") {
            return Err(Error::Encoding("unencodable payload".into()));
        }
        hash::hash_mutation(mutation)
    }

    let map = OrSetMap::with_hasher("A", refuse_poison);
    map.add("fruit", "apple").unwrap();
    let (len, heads, list) = (map.len(), map.heads(), map.list());

    let err = map.add("poison", "x").unwrap_err();
    assert_eq!(err, Error::Encoding("unencodable payload".into()));
    assert_eq!((map.len(), map.heads(), map.list()), (len, heads.clone(), list.clone()));

    let foreign = Mutation::new(
        "B",
        Default::default(),
        vec![Op::add("poison", "y", Tag::new(9, "B"))],
    );
    let err = map.import_log(vec![foreign]).unwrap_err();
    assert_eq!(err, Error::Encoding("unencodable payload".into()));
    assert_eq!((map.len(), map.heads(), map.list()), (len, heads, list));
    assert!(map.is_complete());
}

#[test]
fn typed_values_round_trip_through_the_map() {
    let map = OrSetMap::new("A");
    map.add("name", "ada").unwrap();
    map.add("age", 36i64).unwrap();
    map.add("id", 7u64).unwrap();
    map.add("pi", 3.25).unwrap();
    map.add("blob", vec![1u8, 2, 3]).unwrap();
    map.add("admin", true).unwrap();

    assert_eq!(map.get("name").unwrap().as_str(), Some("ada"));
    assert_eq!(map.get("age").and_then(|v| v.as_i64()), Some(36));
    assert_eq!(map.get("id").and_then(|v| v.as_u64()), Some(7));
    assert_eq!(map.get("pi").and_then(|v| v.as_f64()), Some(3.25));
    assert_eq!(map.get("blob").unwrap().as_bytes(), Some(&[1u8, 2, 3][..]));
    assert_eq!(map.get("admin").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(map.get("admin").unwrap().value_type(), ValueType::Bool);
}

#[test]
fn concurrent_callers_are_serialized() {
    let map = Arc::new(OrSetMap::new("A"));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..25 {
                    map.add(format!("k{}-{}", t, i), i as u64).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(map.list().len(), 100);
    assert_eq!(map.len(), 100);
    assert_eq!(map.heads().len(), 1);
}
