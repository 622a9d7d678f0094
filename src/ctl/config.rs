//! 控制器配置
//!
//! 在构造任何控制器状态之前完成校验。

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::net::Dpid;
use crate::sim::SimTime;

/// 流表硬超时默认值（秒），三种模式共用
pub const DEFAULT_FLOW_HARD_TIMEOUT: u16 = 10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("core_ids must be a comma separated list of integers (e.g. 1,2), got {0:?}")]
    MalformedCoreIds(String),
    #[error("core_ids must not be empty")]
    NoCores,
    #[error("core id {0} listed twice")]
    DuplicateCore(u64),
    #[error("interval must be a positive number of seconds (at least 1ns), got {0}")]
    BadInterval(f64),
    #[error("unknown controller mode {0:?} (expected tree, vlan or adaptive)")]
    UnknownMode(String),
}

/// 控制器运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// 单一生成树
    Tree,
    /// 每个 VLAN 一棵根树
    Vlan,
    /// 按链路负载动态选择上行口
    Adaptive,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tree" => Ok(Mode::Tree),
            "vlan" | "vlans" => Ok(Mode::Vlan),
            "adaptive" => Ok(Mode::Adaptive),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Tree => "tree",
            Mode::Vlan => "vlan",
            Mode::Adaptive => "adaptive",
        })
    }
}

/// 解析 `"1,2,3"` 形式的核心交换机列表，保持顺序。
pub fn parse_core_ids(s: &str) -> Result<Vec<Dpid>, ConfigError> {
    let mut out = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        let id: u64 = part
            .parse()
            .map_err(|_| ConfigError::MalformedCoreIds(s.to_string()))?;
        out.push(Dpid(id));
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub mode: Mode,
    pub core_ids: Vec<Dpid>,
    /// 统计轮询间隔（秒，仅 adaptive 模式使用）
    pub interval: f64,
    pub flow_hard_timeout: u16,
    /// 无负载数据时随机选择上行口所用的种子
    pub seed: u64,
}

impl ControllerConfig {
    pub fn new(mode: Mode, core_ids: Vec<Dpid>) -> Self {
        Self {
            mode,
            core_ids,
            interval: 1.0,
            flow_hard_timeout: DEFAULT_FLOW_HARD_TIMEOUT,
            seed: 0,
        }
    }

    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.core_ids.is_empty() {
            return Err(ConfigError::NoCores);
        }
        let mut seen = BTreeSet::new();
        for id in &self.core_ids {
            if !seen.insert(*id) {
                return Err(ConfigError::DuplicateCore(id.0));
            }
        }
        // 不足 1ns 的间隔会让轮询定时器在同一时刻无限重排
        if !self.interval.is_finite() || self.poll_interval() == SimTime::ZERO {
            return Err(ConfigError::BadInterval(self.interval));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> SimTime {
        SimTime::from_secs_f64(self.interval)
    }
}
