//! 按 VLAN 隔离的多树策略
//!
//! 与生成树策略的区别只在未知目的地址的处理：按源主机所属 VLAN 选出负责的核心，
//! 使用该核心根树的阻断端口泛洪。

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use super::switch::{LearningTable, PolicyCtx, SwitchBase};
use super::tenants::DEFAULT_VLAN;
use crate::net::{Dpid, MacAddr, PacketIn, PortNo};
use crate::topo::BlockedPorts;

/// 一次 VLAN 树计算的完整结果，原样分发给所有交换机
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VlanPlan {
    pub vlan_to_core: BTreeMap<String, Dpid>,
    pub core_to_blocked: BTreeMap<Dpid, BlockedPorts>,
}

impl VlanPlan {
    /// VLAN 对应的核心；未登记的 VLAN 走 default
    pub fn core_for(&self, vlan: &str) -> Option<Dpid> {
        self.vlan_to_core
            .get(vlan)
            .or_else(|| self.vlan_to_core.get(DEFAULT_VLAN))
            .copied()
    }

    /// `vlan` 的树在交换机 `dpid` 上阻断的端口
    pub fn blocked_for(&self, vlan: &str, dpid: Dpid) -> Option<&BTreeSet<PortNo>> {
        let core = self.core_for(vlan)?;
        self.core_to_blocked.get(&core)?.get(&dpid)
    }
}

static NO_PORTS: BTreeSet<PortNo> = BTreeSet::new();

#[derive(Debug)]
pub struct VlanSwitch {
    base: SwitchBase,
    macs: LearningTable,
    plan: Option<Arc<VlanPlan>>,
}

impl VlanSwitch {
    pub fn new(base: SwitchBase) -> Self {
        Self {
            base,
            macs: LearningTable::default(),
            plan: None,
        }
    }

    pub fn base(&self) -> &SwitchBase {
        &self.base
    }

    pub fn plan(&self) -> Option<&VlanPlan> {
        self.plan.as_deref()
    }

    pub fn learned(&self) -> &LearningTable {
        &self.macs
    }

    pub fn apply_plan(&mut self, plan: Arc<VlanPlan>) {
        debug!(dpid = %self.base.dpid(), vlans = ?plan.vlan_to_core, "更新 VLAN 树");
        self.plan = Some(plan);
        self.macs.clear();
    }

    /// `src` 所在 VLAN 在本交换机上的阻断端口。交换机不在该树中时没有阻断端口。
    fn blocked_for_source<'a>(&'a self, plan: &'a VlanPlan, vlan: &str) -> &'a BTreeSet<PortNo> {
        plan.blocked_for(vlan, self.base.dpid()).unwrap_or(&NO_PORTS)
    }

    fn learn(&mut self, src: MacAddr, in_port: PortNo, vlan: &str) {
        let blocked = match &self.plan {
            Some(plan) => self.blocked_for_source(plan, vlan).contains(&in_port),
            None => false,
        };
        if !blocked {
            self.macs.learn(src, in_port);
        }
    }

    pub fn on_packet_in(&mut self, pkt: &PacketIn, ctx: &mut PolicyCtx<'_>) {
        let vlan = ctx.tenants.vlan_of(&pkt.src);
        self.learn(pkt.src, pkt.in_port, vlan);

        if let Some(out_port) = self.macs.lookup(&pkt.dst) {
            self.base
                .forward_and_install(ctx.out, pkt, out_port, None, ctx.hard_timeout);
            return;
        }

        let Some(plan) = &self.plan else {
            // 尚未有任何核心与全部边缘直连，无法确定无环的泛洪范围
            warn!(dpid = %self.base.dpid(), src = %pkt.src, "尚无 VLAN 树，丢弃未知目的帧");
            return;
        };
        let blocked = self.blocked_for_source(plan, vlan);
        let ports = self
            .base
            .flood(ctx.out, pkt, |p| p == pkt.in_port || blocked.contains(&p));
        debug!(
            dpid = %self.base.dpid(),
            vlan,
            core = ?plan.core_for(vlan),
            ports = ?ports,
            "按 VLAN 树泛洪"
        );
    }
}
