use super::{Harness, frame, mac, ports};
use crate::ctl::{AdaptiveCoreSwitch, AdaptiveEdgeSwitch, EdgeDecision, LinkLoad, LoadTable, SwitchBase};
use crate::net::{Command, Dpid, Endpoint, MacAddr, PortNo, PortStats};

fn ep(dpid: u64, port: u16) -> Endpoint {
    Endpoint::new(Dpid(dpid), PortNo(port))
}

fn stats(port: u16, total: u64) -> PortStats {
    PortStats {
        port_no: PortNo(port),
        tx_bytes: total / 2,
        rx_bytes: total - total / 2,
    }
}

fn local_entry() -> PortStats {
    PortStats {
        port_no: PortNo::LOCAL,
        tx_bytes: 1_000_000,
        rx_bytes: 1_000_000,
    }
}

#[test]
fn load_is_delta_between_samples() {
    let mut loads = LoadTable::default();
    loads.link_up(ep(1, 1), ep(4, 1));
    assert_eq!(loads.load(ep(4, 1)), LinkLoad::Active(0));

    let mut seen = Vec::new();
    for total in [100, 250, 400] {
        assert_eq!(loads.record(Dpid(1), &[local_entry(), stats(1, total)]), 1);
        seen.push(loads.load(ep(4, 1)));
    }

    assert_eq!(
        seen,
        vec![
            LinkLoad::Active(100),
            LinkLoad::Active(150),
            LinkLoad::Active(150)
        ]
    );
}

#[test]
fn removed_uplink_is_unknown_not_absent() {
    let mut loads = LoadTable::default();
    loads.link_up(ep(1, 1), ep(4, 1));
    loads.record(Dpid(1), &[stats(1, 500)]);
    loads.link_down(ep(1, 1), ep(4, 1));

    assert_eq!(loads.load(ep(4, 1)), LinkLoad::Unknown);
    assert_eq!(loads.load(ep(4, 2)), LinkLoad::Absent);
    assert_eq!(loads.edge_of(ep(1, 1)), None);
    // 断开后的统计不再更新该链路
    assert_eq!(loads.record(Dpid(1), &[stats(1, 900)]), 0);

    // 重新发现时从零开始
    loads.link_up(ep(1, 1), ep(4, 1));
    assert_eq!(loads.load(ep(4, 1)), LinkLoad::Active(0));
}

#[test]
fn least_loaded_ignores_unknown_uplinks() {
    let mut loads = LoadTable::default();
    for core in 1..=3u64 {
        loads.link_up(ep(core, 1), ep(4, core as u16));
    }
    loads.record(Dpid(1), &[stats(1, 500)]);
    loads.record(Dpid(2), &[stats(1, 100)]);
    loads.record(Dpid(3), &[stats(1, 300)]);
    assert_eq!(loads.least_loaded(Dpid(4)), Some(PortNo(2)));

    loads.link_down(ep(2, 1), ep(4, 2));
    assert_eq!(loads.least_loaded(Dpid(4)), Some(PortNo(3)));

    assert_eq!(loads.least_loaded(Dpid(5)), None);
}

#[test]
fn least_loaded_breaks_ties_by_port_order() {
    let mut loads = LoadTable::default();
    loads.link_up(ep(2, 1), ep(4, 2));
    loads.link_up(ep(1, 1), ep(4, 1));
    assert_eq!(loads.least_loaded(Dpid(4)), Some(PortNo(1)));
}

/// 边缘交换机 4：端口 1..3 接核心 1..3，端口 4、5 接主机；核心 2 的链路最空闲
fn edge_harness() -> (Harness, AdaptiveEdgeSwitch) {
    let mut h = Harness::new();
    for core in 1..=3u64 {
        h.loads.link_up(ep(core, 1), ep(4, core as u16));
    }
    h.loads.record(Dpid(1), &[stats(1, 500)]);
    h.loads.record(Dpid(2), &[stats(1, 100)]);
    h.loads.record(Dpid(3), &[stats(1, 300)]);
    let sw = AdaptiveEdgeSwitch::new(
        SwitchBase::new(Dpid(4), ports(&[1, 2, 3, 4, 5])),
        &[Dpid(1), Dpid(2), Dpid(3)],
    );
    (h, sw)
}

#[test]
fn edge_sends_remote_unicast_only_to_selected_uplink_when_surface_known() {
    let (mut h, mut sw) = edge_harness();
    h.hosts.learn(Dpid(4), mac(0x41), PortNo(4));
    h.hosts.learn(Dpid(4), mac(0x42), PortNo(5));

    let d = sw.on_packet_in(&frame(4, 4, mac(0x41), mac(0x99)), &mut h.ctx());

    assert_eq!(d, EdgeDecision::Uplink(PortNo(2)));
    assert_eq!(h.out.flow_mods(), 1);
    assert_eq!(h.out.packet_outs(), 1);
    assert!(matches!(
        h.out.commands()[0],
        Command::PacketOut {
            out_port: PortNo(2),
            ..
        }
    ));
}

#[test]
fn edge_floods_locally_and_copies_upstream_when_surface_incomplete() {
    let (mut h, mut sw) = edge_harness();

    let d = sw.on_packet_in(&frame(4, 4, mac(0x41), mac(0x99)), &mut h.ctx());

    assert_eq!(
        d,
        EdgeDecision::FloodAndProbe {
            uplink: Some(PortNo(2)),
            local: vec![PortNo(5)],
        }
    );
    assert_eq!(h.out.flow_mods(), 0);
    assert_eq!(h.out.packet_outs(), 2);
}

#[test]
fn edge_broadcast_from_host_is_never_pinned_to_uplink() {
    let (mut h, mut sw) = edge_harness();
    h.hosts.learn(Dpid(4), mac(0x41), PortNo(4));
    h.hosts.learn(Dpid(4), mac(0x42), PortNo(5));

    let d = sw.on_packet_in(&frame(4, 4, mac(0x41), MacAddr::BROADCAST), &mut h.ctx());

    assert!(matches!(d, EdgeDecision::FloodAndProbe { .. }));
    assert_eq!(h.out.flow_mods(), 0);
}

#[test]
fn edge_frame_from_uplink_only_floods_host_ports() {
    let (mut h, mut sw) = edge_harness();

    let d = sw.on_packet_in(&frame(4, 1, mac(0x77), MacAddr::BROADCAST), &mut h.ctx());

    assert_eq!(d, EdgeDecision::LocalFlood(vec![PortNo(4), PortNo(5)]));
    assert_eq!(h.out.flow_mods(), 0);
}

#[test]
fn edge_delivers_to_known_local_host() {
    let (mut h, mut sw) = edge_harness();
    h.hosts.learn(Dpid(4), mac(0x42), PortNo(5));

    let d = sw.on_packet_in(&frame(4, 2, mac(0x77), mac(0x42)), &mut h.ctx());

    assert_eq!(d, EdgeDecision::LocalHost(PortNo(5)));
    assert_eq!(h.out.flow_mods(), 1);
}

#[test]
fn edge_picks_random_core_port_without_load_samples() {
    let mut h = Harness::new();
    let mut sw = AdaptiveEdgeSwitch::new(
        SwitchBase::new(Dpid(4), ports(&[1, 2, 3, 4, 5])),
        &[Dpid(1), Dpid(2), Dpid(3)],
    );

    for i in 0..20 {
        let d = sw.on_packet_in(&frame(4, 4, mac(0x41), mac(0x100 + i)), &mut h.ctx());
        let EdgeDecision::FloodAndProbe { uplink, .. } = d else {
            panic!("unexpected decision {d:?}");
        };
        assert!(sw.core_ports().contains(&uplink.expect("random uplink")));
    }
}

#[test]
fn core_switch_learns_and_floods_to_all() {
    let mut h = Harness::new();
    let mut sw = AdaptiveCoreSwitch::new(SwitchBase::new(Dpid(1), ports(&[1, 2, 3, 4])));

    sw.on_packet_in(&frame(1, 2, mac(1), mac(2)), &mut h.ctx());
    assert!(matches!(
        h.out.take().as_slice(),
        [Command::PacketOut {
            out_port: PortNo::ALL,
            ..
        }]
    ));

    sw.on_packet_in(&frame(1, 3, mac(2), mac(1)), &mut h.ctx());
    let cmds = h.out.take();
    assert_eq!(cmds.len(), 2);
    assert!(cmds.iter().any(|c| matches!(
        c,
        Command::InstallFlow { matching, out_port: PortNo(2), .. } if matching.ethertype == Some(0x0800)
    )));
}
