//! 上行链路负载表
//!
//! 按核心交换机的端口计数器估计每条核心-边缘链路的瞬时负载（两次采样之间的字节增量），
//! 以边缘端点为键。链路删除后条目保留为 [`LinkLoad::Unknown`]，与从未见过的链路区分开。

use std::collections::{BTreeMap, HashMap};

use crate::net::{Dpid, Endpoint, PortNo, PortStats};
use tracing::trace;

/// 链路负载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLoad {
    /// 最近一个采样周期的字节增量
    Active(u64),
    /// 链路曾经存在，现已断开
    Unknown,
    /// 从未发现过该链路
    Absent,
}

impl LinkLoad {
    pub fn value(self) -> Option<u64> {
        match self {
            LinkLoad::Active(v) => Some(v),
            LinkLoad::Unknown | LinkLoad::Absent => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    load: LinkLoad,
    prev_total: u64,
}

#[derive(Debug, Default, Clone)]
pub struct LoadTable {
    /// 核心端点 -> 边缘端点；链路断开后为 None
    core_to_edge: HashMap<Endpoint, Option<Endpoint>>,
    samples: BTreeMap<Endpoint, Sample>,
}

impl LoadTable {
    /// 链路建立：负载与基线都从 0 开始
    pub fn link_up(&mut self, core: Endpoint, edge: Endpoint) {
        self.core_to_edge.insert(core, Some(edge));
        self.samples.insert(
            edge,
            Sample {
                load: LinkLoad::Active(0),
                prev_total: 0,
            },
        );
    }

    /// 链路断开：保留条目并标记为未知
    pub fn link_down(&mut self, core: Endpoint, edge: Endpoint) {
        self.core_to_edge.insert(core, None);
        self.samples.insert(
            edge,
            Sample {
                load: LinkLoad::Unknown,
                prev_total: 0,
            },
        );
    }

    pub fn edge_of(&self, core: Endpoint) -> Option<Endpoint> {
        self.core_to_edge.get(&core).copied().flatten()
    }

    pub fn load(&self, edge: Endpoint) -> LinkLoad {
        self.samples
            .get(&edge)
            .map(|s| s.load)
            .unwrap_or(LinkLoad::Absent)
    }

    /// 处理核心交换机 `core` 的端口统计回复，返回更新的链路数。
    ///
    /// 计数器回退（交换机重启）时把本次总量当作增量。
    pub fn record(&mut self, core: Dpid, stats: &[PortStats]) -> usize {
        let mut updated = 0;
        for s in stats.iter().filter(|s| s.port_no != PortNo::LOCAL) {
            let Some(edge) = self.edge_of(Endpoint::new(core, s.port_no)) else {
                continue;
            };
            let Some(sample) = self.samples.get_mut(&edge) else {
                continue;
            };
            if sample.load == LinkLoad::Unknown {
                continue;
            }
            let total = s.total_bytes();
            let delta = total.checked_sub(sample.prev_total).unwrap_or(total);
            trace!(core = %core, port = %s.port_no, edge = %edge, total, delta, "更新链路负载");
            sample.load = LinkLoad::Active(delta);
            sample.prev_total = total;
            updated += 1;
        }
        updated
    }

    /// 边缘交换机 `edge` 的所有上行口及其负载（按端口升序）
    pub fn uplinks(&self, edge: Dpid) -> impl Iterator<Item = (PortNo, LinkLoad)> + '_ {
        self.samples
            .range(Endpoint::new(edge, PortNo(0))..=Endpoint::new(edge, PortNo(u16::MAX)))
            .map(|(e, s)| (e.port, s.load))
    }

    /// 负载最小的在用上行口；并列时取端口号最小者。没有任何在用链路时返回 None。
    pub fn least_loaded(&self, edge: Dpid) -> Option<PortNo> {
        self.uplinks(edge)
            .filter_map(|(port, load)| load.value().map(|v| (port, v)))
            .min_by_key(|(_, v)| *v)
            .map(|(port, _)| port)
    }
}
