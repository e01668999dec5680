use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use etidorhpa_client::{Pool, PoolHandle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[test]
fn random_acquire_release_sequences_never_lose_entities() {
    for seed in 1..=8u64 {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let mut pool = Pool::new(move || Ok(counter.fetch_add(1, Ordering::SeqCst)), 4).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut held: Vec<PoolHandle> = Vec::new();
        let mut released: Vec<PoolHandle> = Vec::new();

        for _ in 0..500 {
            match rng.gen_range(0..4) {
                0 | 1 => held.push(pool.acquire().unwrap()),
                2 if !held.is_empty() => {
                    let index = rng.gen_range(0..held.len());
                    let handle = held.swap_remove(index);
                    assert!(pool.release(handle));
                    released.push(handle);
                }
                _ => {
                    // Releasing something already returned must change nothing,
                    // even when its slot has been handed out again.
                    if !released.is_empty() {
                        let stale = released[rng.gen_range(0..released.len())];
                        let before = pool.stats();
                        assert!(!pool.release(stale));
                        assert_eq!(pool.stats(), before);
                    }
                }
            }

            let stats = pool.stats();
            assert_eq!(stats.total, stats.available + stats.in_use);
            assert_eq!(stats.total, created.load(Ordering::SeqCst));
            assert_eq!(stats.in_use, held.len());

            let distinct: HashSet<usize> = held.iter().map(|&h| *pool.get(h).unwrap()).collect();
            assert_eq!(distinct.len(), held.len(), "entity handed out twice");
        }
    }
}

#[test]
fn drain_scenario_matches_documented_behaviour() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let mut pool = Pool::new(move || Ok(counter.fetch_add(1, Ordering::SeqCst)), 3).unwrap();

    let held: Vec<_> = (0..3).map(|_| pool.acquire().unwrap()).collect();
    assert_eq!(pool.stats().available, 0);
    assert_eq!(pool.stats().in_use, 3);

    let extra = pool.acquire().unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 4);
    assert_eq!(pool.stats().total, 4);

    for handle in held.into_iter().chain(std::iter::once(extra)) {
        assert!(pool.release(handle));
    }
    assert_eq!(pool.stats().available, 4);
}
