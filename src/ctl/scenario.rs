//! 场景文件
//!
//! 协议层是外部组件；为了端到端驱动控制器，用 JSON 场景描述按时间排列的输入事件，
//! 可选地由核心/边缘拓扑构建器生成初始的连接与链路事件。

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::controller::{ControllerEvent, LinkChange};
use super::world::Deliver;
use crate::net::{Dpid, Endpoint, MacAddr, PacketIn, PortNo, PortStats};
use crate::sim::{SimTime, Simulator};
use crate::topo::core_edge::{CoreEdgeOpts, FabricError, build_core_edge};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported schema_version {0} (expected {expected})", expected = SCHEMA_VERSION)]
    Schema(u32),
    #[error("invalid core_edge topology: {0}")]
    Fabric(#[from] FabricError),
    #[error("core_ids {configured:?} do not match the scenario's core switches {built:?}")]
    CoreMismatch {
        configured: Vec<Dpid>,
        built: Vec<Dpid>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub topology: Option<TopologySpec>,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySpec {
    CoreEdge {
        #[serde(flatten)]
        opts: CoreEdgeOpts,
        /// 同时生成所有主机的 HostDiscovered 事件
        #[serde(default)]
        discover_hosts: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioEvent {
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub body: EventSpec,
}

fn default_ethertype() -> u16 {
    0x0800
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventSpec {
    ConnectionUp {
        dpid: Dpid,
        ports: Vec<PortNo>,
    },
    ConnectionDown {
        dpid: Dpid,
    },
    LinkAdded {
        a: Endpoint,
        b: Endpoint,
    },
    LinkRemoved {
        a: Endpoint,
        b: Endpoint,
    },
    PacketIn {
        dpid: Dpid,
        in_port: PortNo,
        src: MacAddr,
        dst: MacAddr,
        #[serde(default = "default_ethertype")]
        ethertype: u16,
        #[serde(default)]
        data: Vec<u8>,
    },
    PortStats {
        dpid: Dpid,
        stats: Vec<PortStats>,
    },
    HostDiscovered {
        dpid: Dpid,
        mac: MacAddr,
        port: PortNo,
    },
}

impl From<EventSpec> for ControllerEvent {
    fn from(ev: EventSpec) -> Self {
        match ev {
            EventSpec::ConnectionUp { dpid, ports } => ControllerEvent::ConnectionUp { dpid, ports },
            EventSpec::ConnectionDown { dpid } => ControllerEvent::ConnectionDown { dpid },
            EventSpec::LinkAdded { a, b } => ControllerEvent::Link {
                change: LinkChange::Added,
                a,
                b,
            },
            EventSpec::LinkRemoved { a, b } => ControllerEvent::Link {
                change: LinkChange::Removed,
                a,
                b,
            },
            EventSpec::PacketIn {
                dpid,
                in_port,
                src,
                dst,
                ethertype,
                data,
            } => ControllerEvent::PacketIn(PacketIn {
                dpid,
                in_port,
                src,
                dst,
                ethertype,
                data,
            }),
            EventSpec::PortStats { dpid, stats } => ControllerEvent::PortStatsReceived { dpid, stats },
            EventSpec::HostDiscovered { dpid, mac, port } => {
                ControllerEvent::HostDiscovered { dpid, mac, port }
            }
        }
    }
}

impl ScenarioSpec {
    pub fn from_json_str(s: &str) -> Result<Self, ScenarioError> {
        let scenario: ScenarioSpec = serde_json::from_str(s)?;
        if scenario.schema_version != SCHEMA_VERSION {
            return Err(ScenarioError::Schema(scenario.schema_version));
        }
        if let Some(TopologySpec::CoreEdge { opts, .. }) = &scenario.topology {
            opts.port_counts()?;
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// 拓扑生成的核心交换机（升序）；没有拓扑描述时为 None
    pub fn core_ids(&self) -> Option<Vec<Dpid>> {
        match &self.topology {
            Some(TopologySpec::CoreEdge { opts, .. }) => {
                Some((1..=u64::from(opts.cores)).map(Dpid).collect())
            }
            None => None,
        }
    }

    /// 配置的核心列表必须与拓扑生成的核心集合一致（顺序无关）
    pub fn check_core_ids(&self, configured: &[Dpid]) -> Result<(), ScenarioError> {
        let Some(built) = self.core_ids() else {
            return Ok(());
        };
        let mut sorted = configured.to_vec();
        sorted.sort();
        if sorted != built {
            return Err(ScenarioError::CoreMismatch {
                configured: configured.to_vec(),
                built,
            });
        }
        Ok(())
    }

    /// 拓扑生成的事件（t=0）在前，随后是显式事件，按时间稳定排序
    pub fn timeline(&self) -> Result<Vec<(SimTime, ControllerEvent)>, ScenarioError> {
        let mut out = Vec::new();
        if let Some(TopologySpec::CoreEdge {
            opts,
            discover_hosts,
        }) = &self.topology
        {
            let fabric = build_core_edge(opts)?;
            for dpid in fabric.switches() {
                out.push((
                    SimTime::ZERO,
                    ControllerEvent::ConnectionUp {
                        dpid,
                        ports: fabric.ports(dpid),
                    },
                ));
            }
            for &(core, edge) in &fabric.links {
                out.push((
                    SimTime::ZERO,
                    ControllerEvent::Link {
                        change: LinkChange::Added,
                        a: core,
                        b: edge,
                    },
                ));
            }
            if *discover_hosts {
                for h in &fabric.hosts {
                    out.push((
                        SimTime::ZERO,
                        ControllerEvent::HostDiscovered {
                            dpid: h.edge,
                            mac: h.mac,
                            port: h.port,
                        },
                    ));
                }
            }
        }
        for ev in &self.events {
            out.push((SimTime::from_millis(ev.at_ms), ev.body.clone().into()));
        }
        out.sort_by_key(|(at, _)| *at);
        Ok(out)
    }

    pub fn last_event_time(&self) -> SimTime {
        self.events
            .iter()
            .map(|e| SimTime::from_millis(e.at_ms))
            .max()
            .unwrap_or(SimTime::ZERO)
    }

    /// 把全部事件排入调度器，返回事件数
    pub fn schedule(&self, sim: &mut Simulator) -> Result<usize, ScenarioError> {
        let timeline = self.timeline()?;
        let n = timeline.len();
        for (at, ev) in timeline {
            sim.schedule(at, Deliver(ev));
        }
        Ok(n)
    }
}
