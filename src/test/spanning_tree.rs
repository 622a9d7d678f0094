use crate::net::{Dpid, PortNo};
use crate::topo::Topology;
use crate::topo::core_edge::{CoreEdgeOpts, build_core_edge};
use std::collections::BTreeSet;

fn topo(cores: u16, edges: u16) -> Topology {
    build_core_edge(&CoreEdgeOpts {
        cores,
        edges,
        hosts_per_edge: 1,
    })
    .expect("valid fabric")
    .topology()
}

fn set(ps: &[u16]) -> BTreeSet<PortNo> {
    ps.iter().copied().map(PortNo).collect()
}

#[test]
fn spanning_tree_blocks_e_minus_n_plus_one_links() {
    let topo = topo(3, 4);
    assert_eq!(topo.link_count(), 12);
    assert_eq!(topo.len(), 7);

    let tree = topo.spanning_tree();

    assert_eq!(tree.blocked_link_count(), 12 - 6);
    let entries: usize = tree.blocked.values().map(BTreeSet::len).sum();
    assert_eq!(entries, 12);
    assert!(tree.topology.is_connected());
    assert_eq!(tree.topology.link_count(), topo.len() - 1);
}

#[test]
fn spanning_tree_keeps_principal_core_links() {
    let tree = topo(3, 4).spanning_tree();

    assert_eq!(tree.root, Some(Dpid(1)));
    assert_eq!(tree.blocked[&Dpid(1)], set(&[]));
    assert_eq!(
        tree.topology.node(Dpid(1)).unwrap().neighbors(),
        [4, 5, 6, 7].into_iter().map(Dpid).collect()
    );
    // 非主核心各保留最后一条链路以免被孤立
    assert_eq!(tree.blocked[&Dpid(2)], set(&[1, 2, 3]));
    assert_eq!(tree.blocked[&Dpid(3)], set(&[1, 2, 3]));
    assert_eq!(tree.blocked[&Dpid(4)], set(&[2, 3]));
    assert_eq!(tree.blocked[&Dpid(7)], set(&[]));
}

#[test]
fn spanning_tree_has_entry_for_every_node_and_leaves_source_untouched() {
    let topo = topo(2, 3);
    let before = topo.links();

    let tree = topo.spanning_tree();

    assert_eq!(topo.links(), before);
    for node in topo.nodes() {
        assert!(tree.blocked.contains_key(&node.id()), "{}", node.id());
    }
}

#[test]
fn spanning_tree_without_principal_still_prunes_cycles() {
    // 没有任何核心与全部边缘直连
    let mut t = Topology::new([Dpid(1), Dpid(2), Dpid(10)]);
    t.add_link(Dpid(1), Dpid(3), PortNo(1), PortNo(1)).unwrap();
    t.add_link(Dpid(1), Dpid(4), PortNo(2), PortNo(1)).unwrap();
    t.add_link(Dpid(2), Dpid(3), PortNo(1), PortNo(2)).unwrap();
    t.add_link(Dpid(2), Dpid(4), PortNo(2), PortNo(2)).unwrap();
    t.add_link(Dpid(10), Dpid(4), PortNo(1), PortNo(3)).unwrap();
    t.add_link(Dpid(10), Dpid(5), PortNo(2), PortNo(1)).unwrap();
    assert!(t.elect_principal_core().is_none());

    let tree = t.spanning_tree();

    assert_eq!(tree.root, None);
    assert_eq!(tree.blocked_link_count(), 6 - 5);
    assert!(tree.topology.is_connected());
}

#[test]
fn spanning_tree_on_partial_fabric_yields_forest() {
    // 两个互不相连的部分，其中一个含环
    let mut t = Topology::new([Dpid(1), Dpid(2), Dpid(10)]);
    t.add_link(Dpid(1), Dpid(3), PortNo(1), PortNo(1)).unwrap();
    t.add_link(Dpid(1), Dpid(4), PortNo(2), PortNo(1)).unwrap();
    t.add_link(Dpid(2), Dpid(3), PortNo(1), PortNo(2)).unwrap();
    t.add_link(Dpid(2), Dpid(4), PortNo(2), PortNo(2)).unwrap();
    t.add_link(Dpid(10), Dpid(11), PortNo(1), PortNo(1)).unwrap();
    assert!(!t.is_connected());

    let tree = t.spanning_tree();

    assert_eq!(tree.blocked_link_count(), 1);
    assert!(tree.topology.connects(Dpid(1), Dpid(2)));
    assert!(tree.topology.connects(Dpid(10), Dpid(11)));
}
