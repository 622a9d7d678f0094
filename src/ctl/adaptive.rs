//! 自适应负载策略
//!
//! 核心交换机：普通 MAC 学习交换机，未知目的地址时全端口泛洪，并被周期性轮询端口计数器。
//! 边缘交换机：知道本地主机，按上行链路负载为未知流量选择一个核心。

use rand::seq::SliceRandom;
use tracing::{debug, trace};

use super::switch::{LearningTable, PolicyCtx, SwitchBase};
use crate::net::{Dpid, PacketIn, PortNo};

#[derive(Debug)]
pub struct AdaptiveCoreSwitch {
    base: SwitchBase,
    macs: LearningTable,
}

impl AdaptiveCoreSwitch {
    pub fn new(base: SwitchBase) -> Self {
        Self {
            base,
            macs: LearningTable::default(),
        }
    }

    pub fn base(&self) -> &SwitchBase {
        &self.base
    }

    pub fn learned(&self) -> &LearningTable {
        &self.macs
    }

    pub fn on_packet_in(&mut self, pkt: &PacketIn, ctx: &mut PolicyCtx<'_>) {
        self.macs.learn(pkt.src, pkt.in_port);
        match self.macs.lookup(&pkt.dst) {
            Some(out_port) => self.base.forward_and_install(
                ctx.out,
                pkt,
                out_port,
                Some(pkt.ethertype),
                ctx.hard_timeout,
            ),
            None => self.base.send_packet_out(ctx.out, pkt, PortNo::ALL),
        }
    }
}

/// 边缘交换机对一帧作出的决定（便于日志与测试）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    /// 目的主机挂在本交换机上
    LocalHost(PortNo),
    /// 目的地址必然在远端：只发往选中的上行口并装流表
    Uplink(PortNo),
    /// 来自上行口的未知流量：只向本地主机端口泛洪
    LocalFlood(Vec<PortNo>),
    /// 来自本地主机的未知流量：本地泛洪，同时复制一份发往上行口
    FloodAndProbe {
        uplink: Option<PortNo>,
        local: Vec<PortNo>,
    },
}

#[derive(Debug)]
pub struct AdaptiveEdgeSwitch {
    base: SwitchBase,
    /// 约定：端口号 c 连到 DPID 为 c 的核心交换机
    core_ports: Vec<PortNo>,
}

impl AdaptiveEdgeSwitch {
    pub fn new(base: SwitchBase, core_ids: &[Dpid]) -> Self {
        let core_ports = core_ids
            .iter()
            .filter_map(|id| u16::try_from(id.0).ok().map(PortNo))
            .collect();
        Self { base, core_ports }
    }

    pub fn base(&self) -> &SwitchBase {
        &self.base
    }

    pub fn core_ports(&self) -> &[PortNo] {
        &self.core_ports
    }

    fn is_uplink(&self, port: PortNo) -> bool {
        self.core_ports.contains(&port)
    }

    /// 本地主机端口泛洪，跳过入端口
    fn host_flood(&self, ctx: &mut PolicyCtx<'_>, pkt: &PacketIn) -> Vec<PortNo> {
        self.base
            .flood(ctx.out, pkt, |p| p == pkt.in_port || self.is_uplink(p))
    }

    pub fn on_packet_in(&mut self, pkt: &PacketIn, ctx: &mut PolicyCtx<'_>) -> EdgeDecision {
        let dpid = self.base.dpid();

        if let Some(port) = ctx.hosts.port_of(dpid, &pkt.dst) {
            self.base.forward_and_install(
                ctx.out,
                pkt,
                port,
                Some(pkt.ethertype),
                ctx.hard_timeout,
            );
            return EdgeDecision::LocalHost(port);
        }

        let uplink = ctx
            .loads
            .least_loaded(dpid)
            .or_else(|| self.core_ports.choose(&mut *ctx.rng).copied());
        trace!(dpid = %dpid, uplink = ?uplink, "选择上行口");

        // 已知主机数 + 上行口数 == 数据端口数：所有挂接点都已知，目的地址必在远端
        let surface_known = ctx.hosts.count(dpid) + self.core_ports.len() == self.base.ports().len();
        let unicast_dst = !pkt.dst.is_broadcast() && !pkt.dst.is_zero();

        let decision = match uplink {
            Some(port) if unicast_dst && surface_known => {
                self.base.forward_and_install(
                    ctx.out,
                    pkt,
                    port,
                    Some(pkt.ethertype),
                    ctx.hard_timeout,
                );
                EdgeDecision::Uplink(port)
            }
            _ if self.is_uplink(pkt.in_port) => EdgeDecision::LocalFlood(self.host_flood(ctx, pkt)),
            _ => {
                if let Some(port) = uplink {
                    self.base.send_packet_out(ctx.out, pkt, port);
                }
                EdgeDecision::FloodAndProbe {
                    uplink,
                    local: self.host_flood(ctx, pkt),
                }
            }
        };
        debug!(dpid = %dpid, src = %pkt.src, dst = %pkt.dst, decision = ?decision, "边缘交换机转发决定");
        decision
    }
}
