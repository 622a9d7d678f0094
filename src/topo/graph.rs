//! 拓扑图
//!
//! 交换机（节点）、端口与链路的可变模型。每条链路在两端节点的端口表中各存一份，
//! 两份始终对称；任何会破坏对称性的修改都会被拒绝，原状态保持不变。

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use crate::net::{Dpid, Endpoint, PortNo};

/// 交换机角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Core,
    Edge,
}

/// 拓扑修改错误（非致命：调用方记录告警后继续运行）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("port {port} of {dpid} already used (linked to {peer})")]
    PortInUse {
        dpid: Dpid,
        port: PortNo,
        peer: Endpoint,
    },
    #[error("unknown link: {a} - {b}")]
    UnknownLink { a: Endpoint, b: Endpoint },
    #[error("refusing self-loop on {0}")]
    SelfLoop(Dpid),
}

/// 拓扑中的一个交换机
#[derive(Debug, Clone)]
pub struct Node {
    id: Dpid,
    role: Role,
    /// 本端端口 -> 对端端点
    links: BTreeMap<PortNo, Endpoint>,
}

impl Node {
    fn new(id: Dpid, role: Role) -> Self {
        Self {
            id,
            role,
            links: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Dpid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_core(&self) -> bool {
        self.role == Role::Core
    }

    /// 按端口号升序遍历 (本端端口, 对端端点)
    pub fn links(&self) -> impl Iterator<Item = (PortNo, Endpoint)> + '_ {
        self.links.iter().map(|(p, peer)| (*p, *peer))
    }

    pub fn peer(&self, port: PortNo) -> Option<Endpoint> {
        self.links.get(&port).copied()
    }

    pub fn neighbors(&self) -> BTreeSet<Dpid> {
        self.links.values().map(|e| e.dpid).collect()
    }

    pub fn degree(&self) -> usize {
        self.links.len()
    }
}

/// 交换网络拓扑：节点集合 + 指定的核心交换机集合（其余为边缘交换机）。
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: BTreeMap<Dpid, Node>,
    core_ids: BTreeSet<Dpid>,
}

impl Topology {
    pub fn new(core_ids: impl IntoIterator<Item = Dpid>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            core_ids: core_ids.into_iter().collect(),
        }
    }

    pub fn core_ids(&self) -> &BTreeSet<Dpid> {
        &self.core_ids
    }

    pub fn is_core(&self, id: Dpid) -> bool {
        self.core_ids.contains(&id)
    }

    pub fn node(&self, id: Dpid) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// 按 DPID 升序遍历节点
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// 拓扑中出现的核心节点（升序）
    pub fn core_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values().filter(|n| n.is_core())
    }

    /// 拓扑中出现的全部边缘节点 id
    pub fn edge_ids(&self) -> BTreeSet<Dpid> {
        self.nodes
            .values()
            .filter(|n| !n.is_core())
            .map(|n| n.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_node(&mut self, id: Dpid) {
        let role = if self.is_core(id) { Role::Core } else { Role::Edge };
        self.nodes.entry(id).or_insert_with(|| Node::new(id, role));
    }

    /// 添加链路 `id1:port1 <-> id2:port2`，缺失的节点自动创建。
    ///
    /// 返回 `Ok(false)` 表示完全相同的链路已存在（幂等）。
    /// 端口已连到其他对端时拒绝添加，拓扑不做任何修改。
    pub fn add_link(
        &mut self,
        id1: Dpid,
        id2: Dpid,
        port1: PortNo,
        port2: PortNo,
    ) -> Result<bool, TopologyError> {
        if id1 == id2 {
            return Err(TopologyError::SelfLoop(id1));
        }
        let a = Endpoint::new(id1, port1);
        let b = Endpoint::new(id2, port2);
        let peer_a = self.nodes.get(&id1).and_then(|n| n.peer(port1));
        let peer_b = self.nodes.get(&id2).and_then(|n| n.peer(port2));

        if peer_a == Some(b) && peer_b == Some(a) {
            return Ok(false);
        }
        if let Some(peer) = peer_a {
            return Err(TopologyError::PortInUse {
                dpid: id1,
                port: port1,
                peer,
            });
        }
        if let Some(peer) = peer_b {
            return Err(TopologyError::PortInUse {
                dpid: id2,
                port: port2,
                peer,
            });
        }

        self.add_node(id1);
        self.add_node(id2);
        if let Some(n) = self.nodes.get_mut(&id1) {
            n.links.insert(port1, b);
        }
        if let Some(n) = self.nodes.get_mut(&id2) {
            n.links.insert(port2, a);
        }
        Ok(true)
    }

    /// 删除链路的两个方向。端点、端口不存在或两端不匹配时返回错误且不做修改。
    pub fn remove_link(
        &mut self,
        id1: Dpid,
        id2: Dpid,
        port1: PortNo,
        port2: PortNo,
    ) -> Result<(), TopologyError> {
        let a = Endpoint::new(id1, port1);
        let b = Endpoint::new(id2, port2);
        let peer_a = self.nodes.get(&id1).and_then(|n| n.peer(port1));
        let peer_b = self.nodes.get(&id2).and_then(|n| n.peer(port2));
        if peer_a != Some(b) || peer_b != Some(a) {
            return Err(TopologyError::UnknownLink { a, b });
        }

        if let Some(n) = self.nodes.get_mut(&id1) {
            n.links.remove(&port1);
        }
        if let Some(n) = self.nodes.get_mut(&id2) {
            n.links.remove(&port2);
        }
        Ok(())
    }

    /// `src` 上通往 `dst` 的第一个（端口号最小的）端口
    pub fn port_towards(&self, src: Dpid, dst: Dpid) -> Option<PortNo> {
        self.nodes
            .get(&src)?
            .links()
            .find(|(_, peer)| peer.dpid == dst)
            .map(|(port, _)| port)
    }

    /// 每条无向链路列出一次，小端点在前
    pub fn links(&self) -> Vec<(Endpoint, Endpoint)> {
        let mut out = Vec::new();
        for node in self.nodes.values() {
            for (port, peer) in node.links() {
                let local = Endpoint::new(node.id, port);
                if local < peer {
                    out.push((local, peer));
                }
            }
        }
        out
    }

    pub fn link_count(&self) -> usize {
        self.nodes.values().map(Node::degree).sum::<usize>() / 2
    }

    fn reachable_from(&self, start: Dpid) -> BTreeSet<Dpid> {
        let mut seen = BTreeSet::from([start]);
        let mut q = VecDeque::from([start]);
        while let Some(id) = q.pop_front() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            for peer in node.links.values() {
                if seen.insert(peer.dpid) {
                    q.push_back(peer.dpid);
                }
            }
        }
        seen
    }

    /// 从任一节点出发能否到达所有节点。空拓扑视为连通。
    pub fn is_connected(&self) -> bool {
        match self.nodes.keys().next() {
            Some(&start) => self.reachable_from(start).len() == self.nodes.len(),
            None => true,
        }
    }

    /// `a` 与 `b` 之间是否存在路径
    pub fn connects(&self, a: Dpid, b: Dpid) -> bool {
        self.nodes.contains_key(&a) && self.reachable_from(a).contains(&b)
    }

    /// 邻居集合恰好等于全部边缘节点集合的核心节点（升序）
    pub fn fully_connected_cores(&self) -> Vec<Dpid> {
        let edges = self.edge_ids();
        self.core_nodes()
            .filter(|n| n.neighbors() == edges)
            .map(|n| n.id)
            .collect()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes.values() {
            write!(f, "{}", node.id)?;
            if node.is_core() {
                f.write_str(" [core]")?;
            }
            f.write_str(":")?;
            for (port, peer) in node.links() {
                write!(f, " {port}->{peer}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
