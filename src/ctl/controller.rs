//! 中央编排器
//!
//! 持有拓扑与每个交换机的转发策略，消费连接/链路/PacketIn/统计/主机事件：
//! 链路变化后重新计算树（或 VLAN 树），把阻断端口下发给各交换机；
//! 自适应模式下维护上行链路负载并定时轮询核心交换机的端口计数器。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use super::adaptive::{AdaptiveCoreSwitch, AdaptiveEdgeSwitch};
use super::config::{ConfigError, ControllerConfig, Mode};
use super::hosts::HostTable;
use super::load::LoadTable;
use super::switch::{BlockUpdate, PolicyCtx, SwitchBase, SwitchPolicy};
use super::tenants::{DEFAULT_VLAN, TenantTable};
use super::tree_switch::TreeSwitch;
use super::vlan_switch::{VlanPlan, VlanSwitch};
use super::world::PollPortStats;
use crate::net::{
    CommandLog, ControlChannel, ControlStats, Dpid, Endpoint, MacAddr, PacketIn, PortNo, PortStats,
};
use crate::sim::{EventId, Simulator};
use crate::topo::{BlockedPorts, Topology, TopologyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    Added,
    Removed,
}

/// 协议层上送给控制器的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// `ports` 不含本地控制端口
    ConnectionUp { dpid: Dpid, ports: Vec<PortNo> },
    ConnectionDown { dpid: Dpid },
    Link {
        change: LinkChange,
        a: Endpoint,
        b: Endpoint,
    },
    PacketIn(PacketIn),
    PortStatsReceived { dpid: Dpid, stats: Vec<PortStats> },
    HostDiscovered {
        dpid: Dpid,
        mac: MacAddr,
        port: PortNo,
    },
}

impl ControllerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerEvent::ConnectionUp { .. } => "connection_up",
            ControllerEvent::ConnectionDown { .. } => "connection_down",
            ControllerEvent::Link {
                change: LinkChange::Added,
                ..
            } => "link_added",
            ControllerEvent::Link {
                change: LinkChange::Removed,
                ..
            } => "link_removed",
            ControllerEvent::PacketIn(_) => "packet_in",
            ControllerEvent::PortStatsReceived { .. } => "port_stats",
            ControllerEvent::HostDiscovered { .. } => "host_discovered",
        }
    }
}

pub struct Controller {
    cfg: ControllerConfig,
    topology: Topology,
    switches: BTreeMap<Dpid, SwitchPolicy>,
    tenants: TenantTable,
    loads: LoadTable,
    hosts: HostTable,
    pollers: HashMap<Dpid, EventId>,
    /// 最近一次生成树的阻断端口（树模式）
    last_blocked: BlockedPorts,
    /// 最近一次成功的 VLAN 方案（VLAN 模式）
    vlan_plan: Option<Arc<VlanPlan>>,
    rng: StdRng,
    pub outbox: CommandLog,
    pub stats: ControlStats,
}

impl Controller {
    pub fn new(cfg: ControllerConfig, tenants: TenantTable) -> Result<Self, ConfigError> {
        cfg.validate()?;
        info!(mode = %cfg.mode, core_ids = ?cfg.core_ids, interval = cfg.interval, "创建控制器");
        Ok(Self {
            topology: Topology::new(cfg.core_ids.iter().copied()),
            rng: StdRng::seed_from_u64(cfg.seed),
            cfg,
            switches: BTreeMap::new(),
            tenants,
            loads: LoadTable::default(),
            hosts: HostTable::default(),
            pollers: HashMap::new(),
            last_blocked: BlockedPorts::new(),
            vlan_plan: None,
            outbox: CommandLog::default(),
            stats: ControlStats::default(),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.cfg
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn switch(&self, dpid: Dpid) -> Option<&SwitchPolicy> {
        self.switches.get(&dpid)
    }

    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    pub fn loads(&self) -> &LoadTable {
        &self.loads
    }

    pub fn hosts(&self) -> &HostTable {
        &self.hosts
    }

    pub fn vlan_plan(&self) -> Option<&VlanPlan> {
        self.vlan_plan.as_deref()
    }

    pub fn blocked_ports(&self) -> &BlockedPorts {
        &self.last_blocked
    }

    pub fn is_polling(&self, dpid: Dpid) -> bool {
        self.pollers.contains_key(&dpid)
    }

    /// 替换租户表快照，下一次链路事件时生效
    pub fn set_tenants(&mut self, tenants: TenantTable) {
        self.tenants = tenants;
    }

    #[tracing::instrument(skip(self, ev, sim), fields(kind = ev.kind(), now = %sim.now()))]
    pub fn handle(&mut self, ev: ControllerEvent, sim: &mut Simulator) {
        match ev {
            ControllerEvent::ConnectionUp { dpid, ports } => self.connection_up(dpid, ports, sim),
            ControllerEvent::ConnectionDown { dpid } => self.connection_down(dpid, sim),
            ControllerEvent::Link { change, a, b } => self.link_event(change, a, b),
            ControllerEvent::PacketIn(pkt) => self.packet_in(&pkt),
            ControllerEvent::PortStatsReceived { dpid, stats } => self.port_stats(dpid, &stats),
            ControllerEvent::HostDiscovered { dpid, mac, port } => {
                debug!(dpid = %dpid, mac = %mac, port = %port, "发现主机");
                self.hosts.learn(dpid, mac, port);
            }
        }
    }

    fn connection_up(&mut self, dpid: Dpid, ports: Vec<PortNo>, sim: &mut Simulator) {
        if self.switches.contains_key(&dpid) {
            debug!(dpid = %dpid, "交换机重新连接，丢弃旧状态");
            self.connection_down(dpid, sim);
        }

        let base = SwitchBase::new(dpid, ports);
        let policy = match self.cfg.mode {
            Mode::Tree => {
                let mut sw = TreeSwitch::new(base);
                if let Some(ports) = self.last_blocked.get(&dpid) {
                    sw.block_ports(ports.clone());
                }
                SwitchPolicy::Tree(sw)
            }
            Mode::Vlan => {
                let mut sw = VlanSwitch::new(base);
                if let Some(plan) = &self.vlan_plan {
                    sw.apply_plan(Arc::clone(plan));
                }
                SwitchPolicy::Vlan(sw)
            }
            Mode::Adaptive if self.cfg.core_ids.contains(&dpid) => {
                SwitchPolicy::AdaptiveCore(AdaptiveCoreSwitch::new(base))
            }
            Mode::Adaptive => SwitchPolicy::AdaptiveEdge(AdaptiveEdgeSwitch::new(base, &self.cfg.core_ids)),
        };
        info!(dpid = %dpid, ports = ?policy.base().ports(), "🔌 交换机已连接");
        let is_core = matches!(policy, SwitchPolicy::AdaptiveCore(_));
        self.switches.insert(dpid, policy);

        if is_core {
            self.poll_port_stats(dpid, sim);
        }
    }

    /// 移除交换机的转发策略，停止统计轮询，并忘记其上的主机
    fn connection_down(&mut self, dpid: Dpid, sim: &mut Simulator) {
        let existed = self.switches.remove(&dpid).is_some();
        if let Some(timer) = self.pollers.remove(&dpid) {
            sim.cancel(timer);
        }
        self.hosts.forget_switch(dpid);
        if existed {
            info!(dpid = %dpid, "交换机已断开");
        } else {
            debug!(dpid = %dpid, "未知交换机断开，忽略");
        }
    }

    /// 统计轮询定时器：发送请求并在一个周期后再次触发
    pub(crate) fn poll_port_stats(&mut self, dpid: Dpid, sim: &mut Simulator) {
        if !matches!(self.switches.get(&dpid), Some(SwitchPolicy::AdaptiveCore(_))) {
            self.pollers.remove(&dpid);
            return;
        }
        self.outbox.request_port_stats(dpid);
        let next = sim.schedule_in(self.cfg.poll_interval(), PollPortStats { dpid });
        self.pollers.insert(dpid, next);
    }

    fn report(&mut self, err: TopologyError) {
        self.stats.topology_warnings += 1;
        warn!(error = %err, "拓扑修改被拒绝");
    }

    fn link_event(&mut self, change: LinkChange, a: Endpoint, b: Endpoint) {
        let changed = match change {
            LinkChange::Added => self.topology.add_link(a.dpid, b.dpid, a.port, b.port),
            LinkChange::Removed => self
                .topology
                .remove_link(a.dpid, b.dpid, a.port, b.port)
                .map(|()| true),
        };
        match changed {
            Ok(true) => debug!(a = %a, b = %b, ?change, "拓扑已更新"),
            Ok(false) => {
                debug!(a = %a, b = %b, "链路已存在，忽略");
                return;
            }
            Err(err) => {
                self.report(err);
                return;
            }
        }

        match self.cfg.mode {
            Mode::Tree => self.recompute_spanning_tree(),
            Mode::Vlan => self.recompute_vlan_trees(),
            Mode::Adaptive => self.track_uplink(change, a, b),
        }
    }

    fn track_uplink(&mut self, change: LinkChange, a: Endpoint, b: Endpoint) {
        let (core, edge) = if self.topology.is_core(a.dpid) {
            (a, b)
        } else if self.topology.is_core(b.dpid) {
            (b, a)
        } else {
            warn!(a = %a, b = %b, "链路两端都不是核心交换机，不跟踪负载");
            return;
        };
        match change {
            LinkChange::Added => self.loads.link_up(core, edge),
            LinkChange::Removed => self.loads.link_down(core, edge),
        }
    }

    fn recompute_spanning_tree(&mut self) {
        let tree = self.topology.spanning_tree();
        info!(
            principal = ?tree.root,
            blocked_links = tree.blocked_link_count(),
            "🌲 生成树已重新计算"
        );
        for (dpid, ports) in &tree.blocked {
            // 已连接但还没有任何链路的交换机不在表中，直接跳过
            if let Some(sw) = self.switches.get_mut(dpid) {
                sw.on_blocked_ports(&BlockUpdate::Shared(ports.clone()));
            }
        }
        self.last_blocked = tree.blocked;
        self.stats.tree_updates += 1;
    }

    fn recompute_vlan_trees(&mut self) {
        if let Some((expected, actual)) = self.tenants.count_mismatch() {
            warn!(expected, actual, "租户表中的 VLAN 数与 vlan_count 不一致");
        }

        let cores = self.topology.fully_connected_cores();
        if cores.is_empty() {
            debug!("没有与全部边缘直连的核心，沿用上一次的 VLAN 方案");
            return;
        }

        let mut vlan_to_core = BTreeMap::new();
        let mut t = 0;
        for vlan in self.tenants.vlans().into_iter().filter(|v| *v != DEFAULT_VLAN) {
            vlan_to_core.insert(vlan.to_string(), cores[t]);
            t = (t + 1) % cores.len();
        }
        vlan_to_core.insert(DEFAULT_VLAN.to_string(), cores[t]);

        let mut core_to_blocked = BTreeMap::new();
        for &core in &cores {
            match self.topology.rooted_tree(core) {
                Ok(tree) => {
                    core_to_blocked.insert(core, tree.blocked);
                }
                Err(err) => {
                    self.stats.tree_failures += 1;
                    warn!(error = %err, "根树计算失败，放弃本轮 VLAN 更新");
                    return;
                }
            }
        }

        let plan = Arc::new(VlanPlan {
            vlan_to_core,
            core_to_blocked,
        });
        info!(cores = ?cores, vlans = ?plan.vlan_to_core, "🌲 VLAN 树已重新计算");
        let update = BlockUpdate::PerVlan(Arc::clone(&plan));
        for sw in self.switches.values_mut() {
            sw.on_blocked_ports(&update);
        }
        self.vlan_plan = Some(plan);
        self.stats.tree_updates += 1;
    }

    fn packet_in(&mut self, pkt: &PacketIn) {
        self.stats.packet_ins += 1;
        let Some(sw) = self.switches.get_mut(&pkt.dpid) else {
            debug!(dpid = %pkt.dpid, "来自未连接交换机的 PacketIn，忽略");
            return;
        };
        let mut ctx = PolicyCtx {
            out: &mut self.outbox,
            tenants: &self.tenants,
            loads: &self.loads,
            hosts: &self.hosts,
            rng: &mut self.rng,
            hard_timeout: self.cfg.flow_hard_timeout,
        };
        sw.on_packet_in(pkt, &mut ctx);
    }

    fn port_stats(&mut self, dpid: Dpid, stats: &[PortStats]) {
        self.stats.stats_replies += 1;
        if self.cfg.mode != Mode::Adaptive {
            return;
        }
        let updated = self.loads.record(dpid, stats);
        debug!(dpid = %dpid, ports = stats.len(), updated, "处理端口统计");
    }
}
