//! 核心/边缘二层交换网络构建
//!
//! 端口编号约定：边缘交换机的端口 `c` 连到 DPID 为 `c` 的核心交换机，
//! 其后的端口接主机；核心交换机的端口 `e - cores` 连到边缘交换机 `e`。

use crate::net::{Dpid, Endpoint, MacAddr, PortNo};
use crate::topo::Topology;
use serde::{Deserialize, Serialize};

/// 主机 MAC 的低 8 位是主机序号
const MAX_HOSTS_PER_EDGE: u16 = 0xff;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FabricError {
    #[error("{role} switches would need {ports} ports, last usable port is {last}", last = PortNo::MAX.0)]
    TooManyPorts { role: &'static str, ports: u32 },
    #[error("hosts_per_edge is {0}, at most {max} supported", max = MAX_HOSTS_PER_EDGE)]
    TooManyHosts(u16),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreEdgeOpts {
    pub cores: u16,
    pub edges: u16,
    #[serde(default = "default_hosts_per_edge")]
    pub hosts_per_edge: u16,
}

fn default_hosts_per_edge() -> u16 {
    1
}

impl Default for CoreEdgeOpts {
    fn default() -> Self {
        Self {
            cores: 3,
            edges: 4,
            hosts_per_edge: default_hosts_per_edge(),
        }
    }
}

fn port_count(role: &'static str, ports: u32) -> Result<u16, FabricError> {
    u16::try_from(ports)
        .ok()
        .filter(|&n| n <= PortNo::MAX.0)
        .ok_or(FabricError::TooManyPorts { role, ports })
}

impl CoreEdgeOpts {
    /// 返回 (核心端口数, 边缘端口数)；任何端口落入保留区间时报错
    pub fn port_counts(&self) -> Result<(u16, u16), FabricError> {
        if self.hosts_per_edge > MAX_HOSTS_PER_EDGE {
            return Err(FabricError::TooManyHosts(self.hosts_per_edge));
        }
        let core = port_count("core", u32::from(self.edges))?;
        let edge = port_count("edge", u32::from(self.cores) + u32::from(self.hosts_per_edge))?;
        Ok((core, edge))
    }
}

/// 一个主机挂接点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostAttachment {
    pub edge: Dpid,
    pub port: PortNo,
    pub mac: MacAddr,
}

#[derive(Debug, Clone)]
pub struct CoreEdgeFabric {
    pub cores: Vec<Dpid>,
    pub edges: Vec<Dpid>,
    pub hosts: Vec<HostAttachment>,
    /// (核心端点, 边缘端点)
    pub links: Vec<(Endpoint, Endpoint)>,
    hosts_per_edge: u16,
    core_ports: u16,
    edge_ports: u16,
}

impl CoreEdgeFabric {
    /// 交换机的全部数据端口（不含本地控制端口）
    pub fn ports(&self, dpid: Dpid) -> Vec<PortNo> {
        let n = if self.cores.contains(&dpid) {
            self.core_ports
        } else {
            self.edge_ports
        };
        (1..=n).map(PortNo).collect()
    }

    pub fn switches(&self) -> impl Iterator<Item = Dpid> + '_ {
        self.cores.iter().chain(self.edges.iter()).copied()
    }

    pub fn host(&self, edge_idx: usize, host_idx: usize) -> HostAttachment {
        self.hosts[edge_idx * self.hosts_per_edge as usize + host_idx]
    }

    /// 所有链路均已加入的拓扑
    pub fn topology(&self) -> Topology {
        let mut topo = Topology::new(self.cores.iter().copied());
        for (core, edge) in &self.links {
            let _ = topo.add_link(core.dpid, edge.dpid, core.port, edge.port);
        }
        topo
    }
}

pub fn build_core_edge(opts: &CoreEdgeOpts) -> Result<CoreEdgeFabric, FabricError> {
    let (core_ports, edge_ports) = opts.port_counts()?;
    let n_cores = u64::from(opts.cores);
    let cores: Vec<Dpid> = (1..=n_cores).map(Dpid).collect();
    let edges: Vec<Dpid> = (1..=u64::from(opts.edges)).map(|e| Dpid(n_cores + e)).collect();

    let mut links = Vec::with_capacity(cores.len() * edges.len());
    for c in 1..=opts.cores {
        for (e, &edge) in (1..=opts.edges).zip(&edges) {
            links.push((
                Endpoint::new(Dpid(u64::from(c)), PortNo(e)),
                Endpoint::new(edge, PortNo(c)),
            ));
        }
    }

    let mut hosts = Vec::with_capacity(edges.len() * opts.hosts_per_edge as usize);
    for &edge in &edges {
        for h in 1..=opts.hosts_per_edge {
            hosts.push(HostAttachment {
                edge,
                port: PortNo(opts.cores + h),
                mac: MacAddr::from_u64((edge.0 << 8) | u64::from(h)),
            });
        }
    }

    Ok(CoreEdgeFabric {
        cores,
        edges,
        hosts,
        links,
        hosts_per_edge: opts.hosts_per_edge,
        core_ports,
        edge_ports,
    })
}
