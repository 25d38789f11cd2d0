use nestedset::{check, ApiError, MemoryRecordStore, NestedSet, Node, NodeId, RecordStore};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Insert(usize),
    Remove(usize),
    RemoveSubtree(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<usize>().prop_map(Op::Insert),
        1 => any::<usize>().prop_map(Op::Remove),
        1 => any::<usize>().prop_map(Op::RemoveSubtree),
    ]
}

fn apply(api: &NestedSet, root: NodeId, op: &Op) {
    let all = api.store().find_by_filter(&nestedset::Filter::all()).unwrap();
    let others: Vec<NodeId> = all.iter().map(|n| n.id).filter(|id| *id != root).collect();
    match op {
        Op::Insert(i) => {
            let parent = all[i % all.len()].id;
            api.insert(Some(parent), BTreeMap::new()).unwrap();
        }
        Op::Remove(i) if !others.is_empty() => {
            let target = others[i % others.len()];
            let has_children = all.iter().any(|n| n.parent_id == Some(target));
            match api.remove(&target) {
                Ok(_) => assert!(!has_children),
                Err(ApiError::HasChildren(id)) => {
                    assert!(has_children);
                    assert_eq!(id, target);
                }
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        Op::RemoveSubtree(i) if !others.is_empty() => {
            let target = others[i % others.len()];
            api.remove_subtree(&target).unwrap();
        }
        _ => {}
    }
}

fn is_ancestor(parents: &HashMap<NodeId, Option<NodeId>>, a: NodeId, b: NodeId) -> bool {
    let mut current = parents.get(&b).copied().flatten();
    while let Some(id) = current {
        if id == a {
            return true;
        }
        current = parents.get(&id).copied().flatten();
    }
    false
}

/// Containment, leaf and sibling-order properties over a fully built tree.
fn assert_nested_set(nodes: &[Node]) {
    let parents: HashMap<NodeId, Option<NodeId>> =
        nodes.iter().map(|n| (n.id, n.parent_id)).collect();
    for node in nodes {
        assert!(node.is_built(), "node {} has no interval", node.id);
    }

    for a in nodes {
        for b in nodes {
            if a.id == b.id {
                continue;
            }
            assert_eq!(
                is_ancestor(&parents, a.id, b.id),
                a.is_ancestor_of(b),
                "ancestry of {} over {} disagrees with intervals",
                a.id,
                b.id
            );
        }
        let has_children = nodes.iter().any(|n| n.parent_id == Some(a.id));
        assert_eq!(a.is_leaf(), !has_children, "leaf flag of {}", a.id);
    }

    let mut by_parent: BTreeMap<Option<NodeId>, Vec<&Node>> = BTreeMap::new();
    for node in nodes {
        by_parent.entry(node.parent_id).or_default().push(node);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by_key(|n| n.id);
        for pair in siblings.windows(2) {
            let (earlier, later) = (pair[0].interval.unwrap(), pair[1].interval.unwrap());
            assert!(earlier.is_disjoint(&later));
            assert!(earlier.right < later.left, "siblings out of creation order");
        }
    }
}

fn seeded() -> (Arc<MemoryRecordStore>, NestedSet, NodeId) {
    let store = Arc::new(MemoryRecordStore::new());
    let api = NestedSet::new(store.clone());
    let root = api.insert_root(BTreeMap::new()).unwrap();
    (store, api, root.id)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn maintained_index_matches_parent_pointers(ops in prop::collection::vec(op(), 1..40)) {
        let (store, api, root) = seeded();
        for op in &ops {
            apply(&api, root, op);
            assert_nested_set(&store.all());
        }
        let report = check::verify(store.as_ref()).unwrap();
        prop_assert!(report.is_consistent(), "{:?}", report.violations);
        let root_node = api.get(&root).unwrap().unwrap();
        prop_assert_eq!(root_node.interval.map(|i| i.right), Some(2 * store.len() as u64));
    }

    #[test]
    fn rebuild_agrees_with_incremental_maintenance(ops in prop::collection::vec(op(), 1..40)) {
        let (store, api, root) = seeded();
        for op in &ops {
            apply(&api, root, op);
        }
        let maintained = store.all();
        api.rebuild(&root, 1).unwrap();
        prop_assert_eq!(&store.all(), &maintained);
        api.rebuild_all().unwrap();
        prop_assert_eq!(&store.all(), &maintained);
    }

    #[test]
    fn insert_then_remove_is_identity(
        ops in prop::collection::vec(op(), 0..30),
        pick in any::<usize>(),
    ) {
        let (store, api, root) = seeded();
        for op in &ops {
            apply(&api, root, op);
        }
        let before = store.all();
        let parent = before[pick % before.len()].id;
        let (leaf, _) = api.insert(Some(parent), BTreeMap::new()).unwrap();
        api.remove(&leaf.id).unwrap();
        prop_assert_eq!(store.all(), before);
    }

    #[test]
    fn rebuild_from_parent_pointers_alone(ops in prop::collection::vec(op(), 1..30)) {
        let (store, api, root) = seeded();
        for op in &ops {
            apply(&api, root, op);
        }
        let maintained = store.all();
        for mut node in store.all() {
            node.interval = None;
            store.persist(&node).unwrap();
        }
        api.rebuild(&root, 1).unwrap();
        prop_assert_eq!(store.all(), maintained);
    }
}

#[test]
fn leaf_self_and_descendants_is_single_record() {
    let (_, api, root) = seeded();
    let (leaf, _) = api.insert(Some(root), BTreeMap::new()).unwrap();
    let leaf = api.get(&leaf.id).unwrap().unwrap();
    let nodes = api.builder().self_and_descendants(&leaf).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].id, leaf.id);
}

#[test]
fn root_without_descendants_views_as_bare_root() {
    let (_, api, root) = seeded();
    let tree = api.tree(Some(root)).unwrap().unwrap();
    assert_eq!(tree.node.id, root);
    assert!(tree.children.is_empty());
}
