use super::{Harness, frame, mac, ports};
use crate::ctl::{BlockUpdate, SwitchBase, SwitchPolicy, TreeSwitch, VlanPlan, VlanSwitch};
use crate::net::{Command, Dpid, FlowMatch, MacAddr, PortNo};
use crate::topo::Topology;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

fn out_ports(cmds: &[Command]) -> Vec<PortNo> {
    cmds.iter()
        .filter_map(|c| match c {
            Command::PacketOut { out_port, .. } => Some(*out_port),
            _ => None,
        })
        .collect()
}

fn blocked(ps: &[u16]) -> BTreeSet<PortNo> {
    ps.iter().copied().map(PortNo).collect()
}

#[test]
fn switch_base_drops_local_port() {
    let base = SwitchBase::new(Dpid(4), [PortNo(2), PortNo::LOCAL, PortNo(1), PortNo(2)]);
    assert_eq!(base.ports(), &[PortNo(1), PortNo(2)]);
}

#[test]
fn tree_switch_floods_around_blocked_ports_until_learned() {
    let mut h = Harness::new();
    let mut sw = TreeSwitch::new(SwitchBase::new(Dpid(5), ports(&[1, 2, 3, 4])));
    sw.block_ports(blocked(&[2, 3]));

    let a = mac(0x0501);
    let b = mac(0x0601);

    sw.on_packet_in(&frame(5, 4, a, MacAddr::BROADCAST), &mut h.ctx());
    let cmds = h.out.take();
    assert_eq!(out_ports(&cmds), vec![PortNo(1)]);
    assert!(cmds.iter().all(|c| matches!(c, Command::PacketOut { .. })));
    assert_eq!(sw.learned().lookup(&a), Some(PortNo(4)));

    sw.on_packet_in(&frame(5, 1, b, a), &mut h.ctx());
    let cmds = h.out.take();
    assert_eq!(out_ports(&cmds), vec![PortNo(4)]);
    assert!(cmds.contains(&Command::InstallFlow {
        dpid: Dpid(5),
        matching: FlowMatch {
            src: b,
            dst: a,
            ethertype: None,
        },
        out_port: PortNo(4),
        hard_timeout: 10,
    }));
}

#[test]
fn tree_switch_does_not_learn_from_blocked_port() {
    let mut h = Harness::new();
    let mut sw = TreeSwitch::new(SwitchBase::new(Dpid(5), ports(&[1, 2, 3, 4])));
    sw.block_ports(blocked(&[2]));

    sw.on_packet_in(&frame(5, 2, mac(9), MacAddr::BROADCAST), &mut h.ctx());

    assert!(sw.learned().is_empty());
    assert_eq!(out_ports(h.out.commands()), vec![PortNo(1), PortNo(3), PortNo(4)]);
}

#[test]
fn new_blocked_set_resets_learned_table() {
    let mut h = Harness::new();
    let mut policy = SwitchPolicy::Tree(TreeSwitch::new(SwitchBase::new(
        Dpid(5),
        ports(&[1, 2, 3]),
    )));
    policy.on_packet_in(&frame(5, 3, mac(1), mac(2)), &mut h.ctx());

    assert!(policy.on_blocked_ports(&BlockUpdate::Shared(blocked(&[1]))));

    let SwitchPolicy::Tree(sw) = &policy else {
        panic!("expected tree policy");
    };
    assert!(sw.learned().is_empty());
    assert_eq!(sw.blocked(), &blocked(&[1]));
    // VLAN 方案对树策略无效
    assert!(!policy.on_blocked_ports(&BlockUpdate::PerVlan(Arc::default())));
}

/// 核心 1、2，边缘 3、4 的全连接；边缘端口 1/2 接核心，端口 3 接主机
fn two_by_two() -> Topology {
    let mut t = Topology::new([Dpid(1), Dpid(2)]);
    for core in [1u64, 2] {
        for (idx, edge) in [3u64, 4].into_iter().enumerate() {
            t.add_link(Dpid(core), Dpid(edge), PortNo(idx as u16 + 1), PortNo(core as u16))
                .unwrap();
        }
    }
    t
}

fn plan_for(topo: &Topology, assignment: &[(&str, u64)]) -> Arc<VlanPlan> {
    let mut core_to_blocked = BTreeMap::new();
    for core in topo.fully_connected_cores() {
        core_to_blocked.insert(core, topo.rooted_tree(core).unwrap().blocked);
    }
    Arc::new(VlanPlan {
        vlan_to_core: assignment
            .iter()
            .map(|(v, c)| (v.to_string(), Dpid(*c)))
            .collect(),
        core_to_blocked,
    })
}

#[test]
fn vlan_switch_floods_along_the_tree_of_the_source_vlan() {
    let topo = two_by_two();
    let plan = plan_for(&topo, &[("blue", 1), ("red", 2), ("default", 1)]);

    let mut h = Harness::new();
    let red = mac(0xa);
    let blue = mac(0xb);
    h.tenants.assign(red, "red");
    h.tenants.assign(blue, "blue");

    let mut sw = VlanSwitch::new(SwitchBase::new(Dpid(3), ports(&[1, 2, 3])));
    sw.apply_plan(plan);

    sw.on_packet_in(&frame(3, 3, red, MacAddr::BROADCAST), &mut h.ctx());
    assert_eq!(out_ports(&h.out.take()), vec![PortNo(2)]);

    sw.on_packet_in(&frame(3, 3, blue, MacAddr::BROADCAST), &mut h.ctx());
    assert_eq!(out_ports(&h.out.take()), vec![PortNo(1)]);

    // 未登记的主机走 default VLAN
    sw.on_packet_in(&frame(3, 3, mac(0xc), MacAddr::BROADCAST), &mut h.ctx());
    assert_eq!(out_ports(&h.out.take()), vec![PortNo(1)]);
}

#[test]
fn vlan_switch_unicasts_known_destination() {
    let topo = two_by_two();
    let mut h = Harness::new();
    let mut sw = VlanSwitch::new(SwitchBase::new(Dpid(3), ports(&[1, 2, 3])));
    sw.apply_plan(plan_for(&topo, &[("default", 1)]));

    sw.on_packet_in(&frame(3, 3, mac(1), MacAddr::BROADCAST), &mut h.ctx());
    h.out.take();
    sw.on_packet_in(&frame(3, 1, mac(2), mac(1)), &mut h.ctx());

    assert_eq!(h.out.packet_outs(), 1);
    assert_eq!(h.out.flow_mods(), 1);
    assert_eq!(out_ports(h.out.commands()), vec![PortNo(3)]);
}

#[test]
fn vlan_switch_without_plan_drops_unknown_destination() {
    let mut h = Harness::new();
    let mut sw = VlanSwitch::new(SwitchBase::new(Dpid(3), ports(&[1, 2, 3])));

    sw.on_packet_in(&frame(3, 3, mac(1), MacAddr::BROADCAST), &mut h.ctx());

    assert!(h.out.is_empty());
    assert_eq!(sw.learned().lookup(&mac(1)), Some(PortNo(3)));
}
