//! Concurrency tests for the rule store
//!
//! Readers race a writer that keeps swapping between two tables. Every
//! answer must come from exactly one of them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use permtree::{Permission, RuleStore, StoreConfig};

/// Install a test subscriber; `RUST_LOG=permtree=debug` shows swaps
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "permtree=info".into()),
        )
        .with_thread_ids(true)
        .with_test_writer()
        .try_init();
}

fn table(permission: Permission) -> Vec<(&'static str, Permission)> {
    vec![
        ("org", permission),
        ("org.*.docs", permission),
        ("org.acme.docs.secret", Permission::DENY),
    ]
}

#[test]
fn test_readers_never_observe_a_mixed_tree() {
    init_tracing();
    let store = Arc::new(RuleStore::new(StoreConfig::default()).unwrap());
    store.replace(table(Permission::READ)).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let mut handles = vec![];

    for _ in 0..4 {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        handles.push(thread::spawn(move || {
            let mut reads = 0usize;
            while !done.load(Ordering::Relaxed) || reads < 100 {
                let tree = store.snapshot();
                let shallow = tree.permissions("org.acme", false).unwrap();
                let deep = tree.permissions("org.beta.docs", false).unwrap();

                assert!(shallow == Permission::READ || shallow == Permission::WRITE);
                assert_eq!(shallow, deep, "one snapshot must answer from one table");
                assert!(!tree.check("org.acme.docs.secret", Permission::READ).unwrap());
                reads += 1;
            }
            reads
        }));
    }

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..200 {
                let permission = if i % 2 == 0 { Permission::WRITE } else { Permission::READ };
                store.replace(table(permission)).unwrap();
            }
        })
    };

    writer.join().unwrap();
    done.store(true, Ordering::Relaxed);

    for handle in handles {
        assert!(handle.join().unwrap() >= 100);
    }

    assert_eq!(store.generation(), 201);
    assert_eq!(store.permissions("org.acme", false).unwrap(), Permission::READ);
}

#[test]
fn test_store_checks_during_swaps_see_a_full_table() {
    init_tracing();
    let store = Arc::new(RuleStore::new(StoreConfig::default()).unwrap());
    store.replace(table(Permission::READ)).unwrap();

    let mut handles = vec![];

    for _ in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                let permission = store.permissions("org.beta.docs.readme", false).unwrap();
                assert!(permission == Permission::READ || permission == Permission::WRITE);
                assert!(!store.check("org.acme.docs.secret", Permission::READ, false).unwrap());
            }
        }));
    }

    for i in 0..100 {
        let permission = if i % 2 == 0 { Permission::WRITE } else { Permission::READ };
        store.replace(table(permission)).unwrap();
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = store.stats();
    assert!(stats.entries <= stats.capacity);

    // counters belong to the snapshot, so a swap starts them over
    store.replace(table(Permission::READ)).unwrap();
    let stats = store.stats();
    assert_eq!(stats.hits + stats.misses, 0);
    assert_eq!(stats.entries, 0);
}

#[test]
fn test_failed_rebuild_during_reads_keeps_old_tree() {
    init_tracing();
    let store = Arc::new(RuleStore::new(StoreConfig::default()).unwrap());
    store.replace(table(Permission::READ)).unwrap();

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..500 {
                assert_eq!(store.permissions("org.acme", false).unwrap(), Permission::READ);
            }
        })
    };

    for _ in 0..50 {
        assert!(store.replace([("org", Permission::WRITE), ("org..x", Permission::WRITE)]).is_err());
    }

    reader.join().unwrap();
    assert_eq!(store.generation(), 1);
}
