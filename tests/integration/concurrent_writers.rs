use nestedset::concurrency::TreeLockManager;
use nestedset::{check, MemoryRecordStore, NestedSet};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

#[test]
fn writers_serialized_by_collection_lock_keep_index_consistent() {
    let store = Arc::new(MemoryRecordStore::new());
    let api = Arc::new(NestedSet::new(store.clone()));
    let locks = Arc::new(TreeLockManager::new());
    let root = api.insert_root(BTreeMap::new()).unwrap().id;

    let mut handles = vec![];
    for worker in 0..4 {
        let api = api.clone();
        let locks = locks.clone();
        handles.push(thread::spawn(move || {
            let mut parent = root;
            for step in 0..10 {
                let lock = locks.collection_lock();
                let _guard = lock.write();
                let meta = BTreeMap::from([("worker".to_string(), worker.to_string())]);
                let (node, _) = api.insert(Some(parent), meta).unwrap();
                if step % 3 == 0 {
                    parent = node.id;
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 41);
    let report = check::verify(store.as_ref()).unwrap();
    assert!(report.is_consistent(), "{:?}", report.violations);
    let root = api.get(&root).unwrap().unwrap();
    assert_eq!(root.interval.map(|i| i.right), Some(82));
}

#[test]
fn readers_share_tree_lock() {
    let store = Arc::new(MemoryRecordStore::new());
    let api = Arc::new(NestedSet::new(store));
    let locks = Arc::new(TreeLockManager::new());
    let root = api.insert_root(BTreeMap::new()).unwrap();
    for _ in 0..5 {
        api.insert(Some(root.id), BTreeMap::new()).unwrap();
    }

    let lock = locks.get_lock(&root.id);
    let first = lock.read();
    let second = lock.try_read();
    assert!(second.is_some());
    assert!(lock.try_write().is_none());
    drop(second);
    drop(first);

    let mut handles = vec![];
    for _ in 0..3 {
        let api = api.clone();
        let locks = locks.clone();
        let root = root.id;
        handles.push(thread::spawn(move || {
            let lock = locks.get_lock(&root);
            let _guard = lock.read();
            api.descendants(&root).unwrap().len()
        }));
    }
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 5);
    }
}
