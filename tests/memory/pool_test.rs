/*!
 * Memory Pool Tests
 * Reservation accounting, contention and conservation
 */

use memsim_kernel::memory::{MemoryError, MemoryPool, MemoryPressure};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

#[test]
fn test_pool_initialization() {
    let pool = MemoryPool::new(1024);
    assert_eq!(pool.total(), 1024);
    assert_eq!(pool.available(), 1024);
    assert_eq!(pool.used(), 0);
    assert_eq!(pool.stats().memory_pressure(), MemoryPressure::Low);
}

#[test]
fn test_reserve_reports_shortfall() {
    let pool = Arc::new(MemoryPool::new(1024));
    let _held = pool.reserve(700).unwrap();

    let err = pool.reserve(700).unwrap_err();
    assert_eq!(
        err,
        MemoryError::Insufficient {
            requested: 700,
            available: 324
        }
    );
    assert_eq!(pool.available(), 324);
}

#[test]
fn test_contended_reserve_never_overcommits() {
    let pool = Arc::new(MemoryPool::new(1000));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let mut held = Vec::new();
                for _ in 0..100 {
                    if let Ok(r) = pool.reserve(30) {
                        held.push(r);
                    }
                    assert!(pool.used() <= pool.total());
                }
                held
            })
        })
        .collect();

    let held: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    // 1000 / 30 = 33 reservations fit, and all of them were taken
    assert_eq!(held.len(), 33);
    assert_eq!(pool.available(), 10);

    drop(held);
    assert_eq!(pool.available(), 1000);
}

#[test]
fn test_reserve_release_churn_balances() {
    let pool = Arc::new(MemoryPool::new(512));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for n in 0..1_000u64 {
                    let amount = 1 + (n + i) % 64;
                    if pool.try_reserve(amount) {
                        pool.release(amount);
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(pool.available(), 512);
}

#[derive(Debug, Clone)]
enum Op {
    Reserve(u64),
    Release(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..300).prop_map(Op::Reserve),
        any::<usize>().prop_map(Op::Release),
    ]
}

proptest! {
    #[test]
    fn prop_available_plus_reserved_is_total(ops in prop::collection::vec(op(), 1..64)) {
        let pool = Arc::new(MemoryPool::new(1024));
        let mut held = Vec::new();

        for op in ops {
            match op {
                Op::Reserve(amount) => {
                    if let Ok(r) = pool.reserve(amount) {
                        held.push(r);
                    }
                }
                Op::Release(index) if !held.is_empty() => {
                    let r = held.swap_remove(index % held.len());
                    r.release();
                }
                Op::Release(_) => {}
            }

            let reserved: u64 = held.iter().map(|r| r.amount()).sum();
            prop_assert_eq!(pool.available() + reserved, pool.total());
            prop_assert!(pool.used() <= pool.total());
        }

        drop(held);
        prop_assert_eq!(pool.available(), 1024);
    }
}
