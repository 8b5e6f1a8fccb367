//! Property Tests
//!
//! Random operation sequences checked against simple reference models.
//!
//! ## Test Strategy
//! - LRU and FIFO caches are compared step by step with a `Vec`-based model
//! - ARC and LFU policies are driven directly and validate their internal
//!   invariants after every step
//! - Expiration is checked against a model keyed on `FakeClock` time
//! - Every loaded value must leave through `on_evicted` or the purge visitor

use polycache::{
    ArcPolicy, Cache, CacheConfig, CacheError, EvictionKind, EvictionPolicy, FakeClock,
    LfuPolicy, RemovalCause,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u32),
    Get(u8),
    Remove(u8),
}

fn op_strategy(keys: u8) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..keys, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        3 => (0..keys).prop_map(Op::Get),
        1 => (0..keys).prop_map(Op::Remove),
    ]
}

fn kind_strategy() -> impl Strategy<Value = EvictionKind> {
    prop_oneof![
        Just(EvictionKind::Fifo),
        Just(EvictionKind::Lru),
        Just(EvictionKind::Lfu),
        Just(EvictionKind::Arc),
    ]
}

/// Ordered reference model. The front is the next victim.
struct OrderModel {
    capacity: usize,
    order: Vec<u8>,
    values: HashMap<u8, u32>,
    reorder_on_use: bool,
}

impl OrderModel {
    fn new(capacity: usize, reorder_on_use: bool) -> Self {
        OrderModel {
            capacity,
            order: Vec::new(),
            values: HashMap::new(),
            reorder_on_use,
        }
    }

    fn touch(&mut self, key: u8) {
        if self.reorder_on_use {
            self.order.retain(|k| *k != key);
            self.order.push(key);
        }
    }

    fn set(&mut self, key: u8, value: u32) {
        if self.values.insert(key, value).is_some() {
            self.touch(key);
            return;
        }
        if self.order.len() == self.capacity {
            let victim = self.order.remove(0);
            self.values.remove(&victim);
        }
        self.order.push(key);
    }

    fn get(&mut self, key: u8) -> Option<u32> {
        let value = self.values.get(&key).copied()?;
        self.touch(key);
        Some(value)
    }

    fn remove(&mut self, key: u8) -> bool {
        self.order.retain(|k| *k != key);
        self.values.remove(&key).is_some()
    }
}

fn check_against_model(
    kind: EvictionKind,
    capacity: usize,
    ops: &[Op],
) -> Result<(), TestCaseError> {
    let cache: Cache<u8, u32> = Cache::init(CacheConfig::new(capacity, kind)).unwrap();
    let mut model = OrderModel::new(capacity, kind == EvictionKind::Lru);

    for op in ops {
        match *op {
            Op::Set(k, v) => {
                cache.set(k, v).unwrap();
                model.set(k, v);
            }
            Op::Get(k) => {
                prop_assert_eq!(cache.get_if_present(&k).ok(), model.get(k), "get {}", k);
            }
            Op::Remove(k) => {
                prop_assert_eq!(cache.remove(&k), model.remove(k), "remove {}", k);
            }
        }
        prop_assert_eq!(cache.len(), model.order.len());
    }

    let mut keys = cache.keys();
    keys.sort_unstable();
    let mut expected = model.order.clone();
    expected.sort_unstable();
    prop_assert_eq!(keys, expected);
    Ok(())
}

/// Applies one admission to a bare policy the way the cache does.
fn admit<P: EvictionPolicy<u16>>(
    policy: &mut P,
    resident: &mut HashSet<u16>,
    capacity: usize,
    key: u16,
) {
    if resident.contains(&key) {
        policy.on_access(&key);
        return;
    }
    if resident.len() == capacity {
        let victim = policy.select_victim(&key).expect("full policy has a victim");
        assert!(resident.remove(&victim), "victim {victim} is not resident");
        policy.on_remove(&victim, RemovalCause::Evicted);
    }
    policy.on_insert(&key);
    resident.insert(key);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_lru_matches_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(op_strategy(12), 1..200),
    ) {
        check_against_model(EvictionKind::Lru, capacity, &ops)?;
    }

    #[test]
    fn prop_fifo_matches_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(op_strategy(12), 1..200),
    ) {
        check_against_model(EvictionKind::Fifo, capacity, &ops)?;
    }

    #[test]
    fn prop_every_policy_keeps_latest_write(
        kind in kind_strategy(),
        capacity in 1usize..8,
        ops in prop::collection::vec(op_strategy(20), 1..300),
    ) {
        let cache: Cache<u8, u32> = Cache::init(CacheConfig::new(capacity, kind)).unwrap();
        let mut written: HashMap<u8, u32> = HashMap::new();
        for op in ops {
            match op {
                Op::Set(k, v) => {
                    cache.set(k, v).unwrap();
                    written.insert(k, v);
                    prop_assert_eq!(cache.get_if_present(&k).ok(), Some(v));
                }
                Op::Get(k) => {
                    if let Ok(v) = cache.get_if_present(&k) {
                        prop_assert_eq!(written.get(&k), Some(&v));
                    }
                }
                Op::Remove(k) => {
                    cache.remove(&k);
                    written.remove(&k);
                    prop_assert!(!cache.has(&k));
                }
            }
            prop_assert!(cache.len() <= capacity);
        }
        prop_assert_eq!(cache.lookup_count(), cache.hit_count() + cache.miss_count());
    }

    #[test]
    fn prop_arc_invariants_hold(
        capacity in 1usize..10,
        steps in prop::collection::vec((0u16..40, any::<bool>()), 1..400),
    ) {
        let mut policy: ArcPolicy<u16> = ArcPolicy::new(capacity);
        let mut resident = HashSet::new();
        for (key, remove) in steps {
            if remove && resident.remove(&key) {
                policy.on_remove(&key, RemovalCause::Removed);
            } else {
                admit(&mut policy, &mut resident, capacity, key);
            }
            policy.debug_validate_invariants();
            prop_assert_eq!(policy.len(), resident.len());
            prop_assert!(policy.b1_len() + policy.b2_len() <= 2 * capacity);
            for key in &resident {
                prop_assert!(!policy.is_ghost(key));
            }
        }
    }

    #[test]
    fn prop_lfu_victim_has_lowest_frequency(
        capacity in 1usize..8,
        keys in prop::collection::vec(0u16..24, 1..400),
    ) {
        let mut policy: LfuPolicy<u16> = LfuPolicy::new(capacity);
        let mut resident = HashSet::new();
        for key in keys {
            if !resident.contains(&key) && resident.len() == capacity {
                let lowest = resident
                    .iter()
                    .filter_map(|k| policy.frequency(k))
                    .min();
                let victim = policy.select_victim(&key);
                prop_assert_eq!(victim.and_then(|v| policy.frequency(&v)), lowest);
            }
            admit(&mut policy, &mut resident, capacity, key);
            policy.debug_validate_invariants();
            prop_assert_eq!(policy.len(), resident.len());
        }
    }

    #[test]
    fn prop_loaded_values_leave_through_callbacks(
        kind in kind_strategy(),
        capacity in 1usize..6,
        keys in prop::collection::vec(0u8..16, 1..200),
    ) {
        let loaded = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));
        let cache: Cache<u8, u8> = {
            let loaded = Arc::clone(&loaded);
            let evicted = Arc::clone(&released);
            let purged = Arc::clone(&released);
            Cache::init(
                CacheConfig::new(capacity, kind)
                    .with_loader(move |k: &u8| {
                        loaded.fetch_add(1, Ordering::SeqCst);
                        Ok(*k)
                    })
                    .with_on_evicted(move |_: &u8, _: &u8| {
                        evicted.fetch_add(1, Ordering::SeqCst);
                    })
                    .with_on_purge_visit(move |_: &u8, _: &u8| {
                        purged.fetch_add(1, Ordering::SeqCst);
                    }),
            )
            .unwrap()
        };

        for key in keys {
            prop_assert_eq!(cache.get(&key).ok(), Some(key));
        }
        cache.purge();
        prop_assert_eq!(loaded.load(Ordering::SeqCst), released.load(Ordering::SeqCst));
    }

    #[test]
    fn prop_expired_entries_are_never_returned(
        kind in kind_strategy(),
        steps in prop::collection::vec((0u8..8, 0u64..4, 0u64..3), 1..150),
    ) {
        let clock = Arc::new(FakeClock::new());
        let cache: Cache<u8, u64> = Cache::init(
            CacheConfig::new(4, kind).with_clock(clock.clone()),
        )
        .unwrap();
        // key -> (value, deadline in whole seconds since start)
        let mut model: HashMap<u8, (u64, u64)> = HashMap::new();
        let mut now = 0u64;

        for (i, (key, ttl, advance)) in steps.into_iter().enumerate() {
            let value = i as u64;
            if ttl > 0 {
                cache.set_with_expire(key, value, Duration::from_secs(ttl)).unwrap();
                model.insert(key, (value, now + ttl));
            }

            clock.advance(Duration::from_secs(advance));
            now += advance;

            let target = (key + 3) % 8;
            let live = model
                .get(&target)
                .filter(|(_, deadline)| now <= *deadline)
                .map(|(value, _)| *value);
            match cache.get_if_present(&target) {
                Ok(value) => prop_assert_eq!(Some(value), live),
                Err(err) => prop_assert!(matches!(err, CacheError::KeyNotFound)),
            }
            prop_assert!(cache.len() <= 4);
        }
    }
}
