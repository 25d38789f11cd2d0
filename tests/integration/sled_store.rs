use nestedset::{
    check, Field, Filter, Interval, NestedSet, Node, NodeId, RecordStore, Shift, SledRecordStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

fn open(temp_dir: &TempDir) -> Arc<SledRecordStore> {
    Arc::new(SledRecordStore::new(&temp_dir.path().join("store")).unwrap())
}

fn interval(store: &SledRecordStore, id: NodeId) -> Option<Interval> {
    store.find_by_id(&id).unwrap().unwrap().interval
}

#[test]
fn two_children_then_middle_removal() {
    let temp_dir = TempDir::new().unwrap();
    let store = open(&temp_dir);
    let api = NestedSet::new(store.clone());

    let root = api.insert_root(BTreeMap::new()).unwrap();
    let (a, _) = api.insert(Some(root.id), BTreeMap::new()).unwrap();
    let (b, _) = api.insert(Some(root.id), BTreeMap::new()).unwrap();
    assert_eq!(interval(&store, root.id), Some(Interval::new(1, 6)));
    assert_eq!(interval(&store, a.id), Some(Interval::new(2, 3)));
    assert_eq!(interval(&store, b.id), Some(Interval::new(4, 5)));

    let (c, _) = api.insert(Some(root.id), BTreeMap::new()).unwrap();
    api.remove(&b.id).unwrap();
    assert_eq!(interval(&store, a.id), Some(Interval::new(2, 3)));
    assert_eq!(interval(&store, c.id), Some(Interval::new(4, 5)));
    assert_eq!(interval(&store, root.id), Some(Interval::new(1, 6)));
    assert!(check::verify(store.as_ref()).unwrap().is_consistent());
}

#[test]
fn intervals_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let (root, child) = {
        let store = open(&temp_dir);
        let api = NestedSet::new(store.clone());
        let root = api.insert_root(BTreeMap::new()).unwrap();
        let meta = BTreeMap::from([("title".to_string(), "chapter".to_string())]);
        let (child, _) = api.insert(Some(root.id), meta).unwrap();
        store.flush().unwrap();
        (root.id, child.id)
    };

    let store = open(&temp_dir);
    assert_eq!(interval(&store, root), Some(Interval::new(1, 4)));
    let child = store.find_by_id(&child).unwrap().unwrap();
    assert_eq!(child.metadata["title"], "chapter");

    let next = store.next_id().unwrap();
    assert!(next > child.id);
}

#[test]
fn bulk_update_touches_only_matching_records() {
    let temp_dir = TempDir::new().unwrap();
    let store = open(&temp_dir);
    for (id, left, right) in [(1, 1, 8), (2, 2, 3), (3, 4, 7), (4, 5, 6)] {
        let mut node = Node::new(NodeId(id), if id == 1 { None } else { Some(NodeId(1)) });
        node.interval = Some(Interval::new(left, right));
        store.persist(&node).unwrap();
    }
    store.persist(&Node::new(NodeId(5), Some(NodeId(1)))).unwrap();

    let moved = store
        .bulk_update(&Filter::beyond(Field::Left, 3), Shift::new(Field::Left, 2))
        .unwrap();
    assert_eq!(moved, 2);
    assert_eq!(interval(&store, NodeId(2)), Some(Interval::new(2, 3)));
    assert_eq!(interval(&store, NodeId(3)), Some(Interval::new(6, 7)));
    assert_eq!(interval(&store, NodeId(4)), Some(Interval::new(7, 6)));
    assert_eq!(interval(&store, NodeId(5)), None);
}

#[test]
fn rebuild_all_over_sled() {
    let temp_dir = TempDir::new().unwrap();
    let store = open(&temp_dir);
    let api = NestedSet::new(store.clone());

    let (first, _) = api.insert(None, BTreeMap::new()).unwrap();
    let (second, _) = api.insert(None, BTreeMap::new()).unwrap();
    let (a, _) = api.insert(Some(first.id), BTreeMap::new()).unwrap();
    let (b, _) = api.insert(Some(second.id), BTreeMap::new()).unwrap();
    assert_eq!(check::verify(store.as_ref()).unwrap().unbuilt.len(), 4);

    let report = api.rebuild_all().unwrap();
    assert_eq!(report.nodes(), 4);
    assert_eq!(interval(&store, first.id), Some(Interval::new(1, 4)));
    assert_eq!(interval(&store, a.id), Some(Interval::new(2, 3)));
    assert_eq!(interval(&store, second.id), Some(Interval::new(5, 8)));
    assert_eq!(interval(&store, b.id), Some(Interval::new(6, 7)));
    assert!(check::verify(store.as_ref()).unwrap().is_consistent());

    let ancestors: Vec<NodeId> = api.ancestors(&b.id).unwrap().iter().map(|n| n.id).collect();
    assert_eq!(ancestors, vec![second.id]);
}

#[test]
fn insert_under_directly_persisted_root_gets_fresh_id() {
    let temp_dir = TempDir::new().unwrap();
    let store = open(&temp_dir);
    let mut root = Node::new(NodeId(1), None);
    root.interval = Some(Interval::new(1, 2));
    store.persist(&root).unwrap();

    let api = NestedSet::new(store.clone());
    let (child, _) = api.insert(Some(NodeId(1)), BTreeMap::new()).unwrap();
    assert_ne!(child.id, NodeId(1));

    let root = store.find_by_id(&NodeId(1)).unwrap().unwrap();
    assert_eq!(root.parent_id, None);
    assert_eq!(root.interval, Some(Interval::new(1, 4)));
    assert_eq!(interval(&store, child.id), Some(Interval::new(2, 3)));
    assert!(check::verify(store.as_ref()).unwrap().is_consistent());
}
