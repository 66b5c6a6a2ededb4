//! Ownership, ordering, namespace and xml:base properties of the tree

use std::cmp::Ordering;
use xmldom::{DomArena, DomError, NodeId, XML_NAMESPACE};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn owner_lists(arena: &DomArena, node: NodeId) -> bool {
    let Some(owner) = arena.parent(node).unwrap() else {
        return false;
    };
    let element = arena.element(owner).unwrap();
    element.attributes.iter().any(|id| id == node) || element.namespaces.iter().any(|id| id == node)
}

#[test]
fn test_single_owner_after_mixed_mutations() {
    init_tracing();
    let mut arena = DomArena::new();
    let e1 = arena.create_element(None, "e1").unwrap();
    let e2 = arena.create_element(None, "e2").unwrap();

    let a = arena.add_attribute(e1, None, "a", "a", "1").unwrap();
    let b = arena.add_attribute(e1, None, "b", "b", "2").unwrap();
    let ns = arena.add_namespace(e1, Some("p"), "urn:p").unwrap();
    let moved = arena.create_attribute(None, "a", "a", "moved").unwrap();

    arena.set_attribute(e2, a).unwrap();
    arena.set_attribute(e1, moved).unwrap();
    arena.set_attribute(e2, b).unwrap();
    arena.set_namespace(e2, ns).unwrap();

    for node in [a, b, ns, moved] {
        assert!(owner_lists(&arena, node), "{} is not listed by its owner", node);
    }
    assert_eq!(arena.parent(a).unwrap(), Some(e2));
    assert_eq!(arena.parent(moved).unwrap(), Some(e1));
    assert_eq!(arena.attributes(e1).unwrap().iter().collect::<Vec<_>>(), vec![moved]);
    assert_eq!(arena.attributes(e2).unwrap().iter().collect::<Vec<_>>(), vec![a, b]);
}

#[test]
fn test_replacement_preserves_order() {
    let mut arena = DomArena::new();
    let el = arena.create_element(None, "e").unwrap();
    let x = arena.add_attribute(el, None, "x", "x", "1").unwrap();
    let y = arena.add_attribute(el, None, "y", "y", "2").unwrap();
    let z = arena.add_attribute(el, None, "z", "z", "3").unwrap();

    let replacement = arena.create_attribute(None, "y", "y", "new").unwrap();
    assert_eq!(arena.set_attribute(el, replacement).unwrap(), Some(y));

    let order: Vec<_> = arena.attributes(el).unwrap().iter().collect();
    assert_eq!(order, vec![x, replacement, z]);
    assert_eq!(arena.parent(y).unwrap(), None);
}

#[test]
fn test_order_is_total_on_one_tree() {
    let mut arena = DomArena::new();
    let doc = arena.create_document(None).unwrap();
    let e1 = arena.create_element(None, "E1").unwrap();
    let c1 = arena.create_element(None, "C1").unwrap();
    let c2 = arena.create_element(None, "C2").unwrap();
    arena.append_child(doc, e1).unwrap();
    arena.append_child(e1, c1).unwrap();
    arena.append_child(e1, c2).unwrap();

    assert_eq!(arena.compare_order(c1, c2).unwrap(), Some(Ordering::Less));
    assert_eq!(arena.compare_order(c2, c1).unwrap(), Some(Ordering::Greater));
    assert_eq!(arena.compare_order(c1, c1).unwrap(), Some(Ordering::Equal));
    assert_eq!(arena.compare_order(e1, c1).unwrap(), Some(Ordering::Less));

    // antisymmetry and transitivity over every triple
    let nodes = [doc, e1, c1, c2];
    for &a in &nodes {
        for &b in &nodes {
            let ab = arena.compare_order(a, b).unwrap().unwrap();
            let ba = arena.compare_order(b, a).unwrap().unwrap();
            assert_eq!(ab, ba.reverse());
            for &c in &nodes {
                let bc = arena.compare_order(b, c).unwrap().unwrap();
                let ac = arena.compare_order(a, c).unwrap().unwrap();
                if ab == Ordering::Less && bc == Ordering::Less {
                    assert_eq!(ac, Ordering::Less);
                }
            }
        }
    }
}

#[test]
fn test_cross_document_order_follows_creation() {
    let mut arena = DomArena::new();
    let d1 = arena.create_document(None).unwrap();
    let d2 = arena.create_document(None).unwrap();

    // deep node in the first document, shallow one in the second
    let mut deep = arena.create_element(None, "deep").unwrap();
    arena.append_child(d1, deep).unwrap();
    for _ in 0..5 {
        let next = arena.create_element(None, "deep").unwrap();
        arena.append_child(deep, next).unwrap();
        deep = next;
    }
    let shallow = arena.create_element(None, "shallow").unwrap();
    arena.append_child(d2, shallow).unwrap();

    assert_eq!(arena.compare_order(deep, shallow).unwrap(), Some(Ordering::Less));
    assert_eq!(arena.compare_order(shallow, deep).unwrap(), Some(Ordering::Greater));
    assert_eq!(arena.compare_order(d2, deep).unwrap(), Some(Ordering::Greater));
}

#[test]
fn test_detached_trees_are_unorderable() {
    let mut arena = DomArena::new();
    let doc = arena.create_document(None).unwrap();
    let attached = arena.create_element(None, "a").unwrap();
    arena.append_child(doc, attached).unwrap();
    let loose = arena.create_element(None, "loose").unwrap();

    assert_eq!(arena.compare_order(attached, loose).unwrap(), None);
    assert_eq!(arena.compare_order(loose, attached).unwrap(), None);
}

#[test]
fn test_inscope_closest_declaration_wins() {
    let mut arena = DomArena::new();
    let e0 = arena.create_element(None, "E0").unwrap();
    let e1 = arena.create_element(None, "E1").unwrap();
    arena.append_child(e0, e1).unwrap();
    arena.add_namespace(e0, Some("p"), "urn:a").unwrap();
    arena.add_namespace(e1, Some("p"), "urn:b").unwrap();

    let inner = arena.inscope_namespaces(e1).unwrap();
    let p = inner.get(Some("p")).unwrap();
    assert_eq!(arena.namespace(p).unwrap().value, "urn:b");
    let xml = inner.get(Some("xml")).unwrap();
    assert_eq!(arena.namespace(xml).unwrap().value, XML_NAMESPACE);

    assert_eq!(arena.lookup_namespace(e0, Some("p")).unwrap(), Some("urn:a"));
}

#[test]
fn test_empty_default_namespace_is_skipped() {
    let mut arena = DomArena::new();
    let parent = arena.create_element(Some("urn:x"), "parent").unwrap();
    let child = arena.create_element(None, "child").unwrap();
    arena.append_child(parent, child).unwrap();
    let outer = arena.add_namespace(parent, None, "urn:x").unwrap();
    let empty = arena.add_namespace(child, None, "").unwrap();

    let inscope = arena.inscope_namespaces(child).unwrap();
    assert_eq!(inscope.get(None), Some(outer));
    assert!(inscope.iter().all(|id| id != empty));
    assert_eq!(arena.lookup_namespace(child, None).unwrap(), Some("urn:x"));
}

#[test]
fn test_empty_default_without_outer_default() {
    let mut arena = DomArena::new();
    let el = arena.create_element(None, "e").unwrap();
    arena.add_namespace(el, None, "").unwrap();
    arena.add_namespace(el, Some("p"), "").unwrap();

    let inscope = arena.inscope_namespaces(el).unwrap();
    assert!(!inscope.contains(None));
    // only the default prefix treats an empty value as unbinding
    assert_eq!(arena.lookup_namespace(el, Some("p")).unwrap(), Some(""));
}

#[test]
fn test_xml_base_resolution() {
    init_tracing();
    let mut arena = DomArena::new();
    let doc = arena.create_document(Some("relative/doc.xml")).unwrap();
    let a = arena.create_element(None, "A").unwrap();
    let b = arena.create_element(None, "B").unwrap();
    let plain = arena.create_element(None, "plain").unwrap();
    arena.append_child(doc, a).unwrap();
    arena.append_child(a, b).unwrap();
    arena.append_child(doc, plain).unwrap();
    arena
        .add_attribute(a, Some(XML_NAMESPACE), "xml:base", "base", "http://h/dir/")
        .unwrap();
    arena
        .add_attribute(b, Some(XML_NAMESPACE), "xml:base", "base", "sub/")
        .unwrap();

    assert_eq!(arena.base_uri(b).unwrap().as_deref(), Some("http://h/dir/sub/"));
    assert_eq!(arena.base_uri(plain).unwrap(), None);
}

#[test]
fn test_prefix_requires_namespace() {
    let mut arena = DomArena::new();
    assert!(matches!(
        arena.create_element(None, "p:x"),
        Err(DomError::NamespaceConstraint { .. })
    ));

    let el = arena.create_element(Some("urn:a"), "p:x").unwrap();
    let data = arena.element(el).unwrap();
    assert_eq!(data.prefix(), Some("p"));
    assert_eq!(data.local_name, "x");
    assert_eq!(data.namespace_uri.as_deref(), Some("urn:a"));
}

#[test]
fn test_snapshot_restore_keeps_structure() {
    let mut arena = DomArena::new();
    let doc = arena.create_document(Some("http://h/doc.xml")).unwrap();
    let root = arena.create_element(None, "root").unwrap();
    let first = arena.create_element(None, "first").unwrap();
    let second = arena.create_element(None, "second").unwrap();
    arena.append_child(doc, root).unwrap();
    arena.append_child(root, first).unwrap();
    arena.append_child(root, second).unwrap();
    arena.add_attribute(root, None, "b", "b", "2").unwrap();
    arena.add_attribute(root, None, "a", "a", "1").unwrap();
    arena.add_namespace(root, None, "urn:d").unwrap();

    let json = serde_json::to_string(&arena).unwrap();
    let restored: DomArena = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.len(), arena.len());
    assert_eq!(restored.children(root).unwrap(), &[first, second]);
    assert_eq!(restored.compare_order(first, second).unwrap(), Some(Ordering::Less));
    let names: Vec<_> = restored
        .attributes(root)
        .unwrap()
        .keys()
        .map(|key| key.local.as_str())
        .collect();
    assert_eq!(names, vec!["b", "a"]);
    assert_eq!(restored.lookup_namespace(root, None).unwrap(), Some("urn:d"));
    assert_eq!(
        restored.base_uri(second).unwrap().as_deref(),
        Some("http://h/doc.xml")
    );
}
