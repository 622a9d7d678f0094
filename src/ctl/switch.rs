//! 交换机转发策略
//!
//! 每个已连接的交换机对应一个 [`SwitchPolicy`]，在连接建立时按控制器模式选定。
//! 策略集合是封闭的：树、VLAN、自适应核心、自适应边缘。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rand::rngs::StdRng;
use tracing::{debug, trace};

use super::adaptive::{AdaptiveCoreSwitch, AdaptiveEdgeSwitch};
use super::hosts::HostTable;
use super::load::LoadTable;
use super::tenants::TenantTable;
use super::tree_switch::TreeSwitch;
use super::vlan_switch::{VlanPlan, VlanSwitch};
use crate::net::{ControlChannel, Dpid, FlowMatch, MacAddr, PacketIn, PortNo};

/// 所有策略共享的部分：交换机标识与数据端口列表（不含本地控制端口）。
#[derive(Debug, Clone)]
pub struct SwitchBase {
    dpid: Dpid,
    ports: Vec<PortNo>,
}

impl SwitchBase {
    pub fn new(dpid: Dpid, ports: impl IntoIterator<Item = PortNo>) -> Self {
        let mut ports: Vec<PortNo> = ports.into_iter().filter(|p| !p.is_reserved()).collect();
        ports.sort();
        ports.dedup();
        Self { dpid, ports }
    }

    pub fn dpid(&self) -> Dpid {
        self.dpid
    }

    pub fn ports(&self) -> &[PortNo] {
        &self.ports
    }

    pub(crate) fn send_packet_out(&self, out: &mut dyn ControlChannel, pkt: &PacketIn, port: PortNo) {
        out.packet_out(self.dpid, &pkt.data, port);
    }

    /// 转发当前帧并为同一 (src, dst[, ethertype]) 安装流表
    pub(crate) fn forward_and_install(
        &self,
        out: &mut dyn ControlChannel,
        pkt: &PacketIn,
        port: PortNo,
        ethertype: Option<u16>,
        hard_timeout: u16,
    ) {
        self.send_packet_out(out, pkt, port);
        let matching = FlowMatch {
            src: pkt.src,
            dst: pkt.dst,
            ethertype,
        };
        out.install_flow(self.dpid, matching, port, hard_timeout);
        debug!(dpid = %self.dpid, src = %pkt.src, dst = %pkt.dst, port = %port, "安装流表");
    }

    /// 逐端口泛洪，跳过 `skip` 中的端口，返回实际发送的端口
    pub(crate) fn flood<F>(&self, out: &mut dyn ControlChannel, pkt: &PacketIn, skip: F) -> Vec<PortNo>
    where
        F: Fn(PortNo) -> bool,
    {
        let ports: Vec<PortNo> = self.ports.iter().copied().filter(|p| !skip(*p)).collect();
        for &p in &ports {
            self.send_packet_out(out, pkt, p);
        }
        trace!(dpid = %self.dpid, ports = ?ports, "泛洪");
        ports
    }
}

/// MAC 学习表
#[derive(Debug, Default, Clone)]
pub struct LearningTable {
    mac_to_port: HashMap<MacAddr, PortNo>,
}

impl LearningTable {
    pub fn learn(&mut self, mac: MacAddr, port: PortNo) {
        self.mac_to_port.insert(mac, port);
    }

    pub fn lookup(&self, mac: &MacAddr) -> Option<PortNo> {
        self.mac_to_port.get(mac).copied()
    }

    pub fn clear(&mut self) {
        self.mac_to_port.clear();
    }

    pub fn len(&self) -> usize {
        self.mac_to_port.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mac_to_port.is_empty()
    }
}

/// 处理 PacketIn 时可用的控制器状态
pub struct PolicyCtx<'a> {
    pub out: &'a mut dyn ControlChannel,
    pub tenants: &'a TenantTable,
    pub loads: &'a LoadTable,
    pub hosts: &'a HostTable,
    pub rng: &'a mut StdRng,
    pub hard_timeout: u16,
}

/// 编排器下发的阻断端口更新
#[derive(Debug, Clone)]
pub enum BlockUpdate {
    /// 单一生成树中本交换机的阻断端口
    Shared(BTreeSet<PortNo>),
    /// 完整的 VLAN -> 核心、核心 -> 阻断端口方案
    PerVlan(Arc<VlanPlan>),
}

#[derive(Debug)]
pub enum SwitchPolicy {
    Tree(TreeSwitch),
    Vlan(VlanSwitch),
    AdaptiveCore(AdaptiveCoreSwitch),
    AdaptiveEdge(AdaptiveEdgeSwitch),
}

impl SwitchPolicy {
    pub fn base(&self) -> &SwitchBase {
        match self {
            SwitchPolicy::Tree(s) => s.base(),
            SwitchPolicy::Vlan(s) => s.base(),
            SwitchPolicy::AdaptiveCore(s) => s.base(),
            SwitchPolicy::AdaptiveEdge(s) => s.base(),
        }
    }

    pub fn dpid(&self) -> Dpid {
        self.base().dpid()
    }

    pub fn on_packet_in(&mut self, pkt: &PacketIn, ctx: &mut PolicyCtx<'_>) {
        match self {
            SwitchPolicy::Tree(s) => s.on_packet_in(pkt, ctx),
            SwitchPolicy::Vlan(s) => s.on_packet_in(pkt, ctx),
            SwitchPolicy::AdaptiveCore(s) => s.on_packet_in(pkt, ctx),
            SwitchPolicy::AdaptiveEdge(s) => {
                s.on_packet_in(pkt, ctx);
            }
        }
    }

    /// 应用阻断端口更新；策略与更新类型不匹配时忽略并返回 false
    pub fn on_blocked_ports(&mut self, update: &BlockUpdate) -> bool {
        match (self, update) {
            (SwitchPolicy::Tree(s), BlockUpdate::Shared(ports)) => {
                s.block_ports(ports.clone());
                true
            }
            (SwitchPolicy::Vlan(s), BlockUpdate::PerVlan(plan)) => {
                s.apply_plan(Arc::clone(plan));
                true
            }
            (other, _) => {
                debug!(dpid = %other.dpid(), "策略不接受此类阻断更新");
                false
            }
        }
    }
}
