//! 租户表：主机 MAC -> VLAN
//!
//! 作为配置快照注入控制器，可在测试中替换。

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::net::MacAddr;
use super::scenario::ScenarioError;

/// 未登记主机所属的 VLAN
pub const DEFAULT_VLAN: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantTable {
    /// 期望的 VLAN 数；与 `hosts` 中实际出现的数目不符时告警
    #[serde(default)]
    pub vlan_count: Option<usize>,
    #[serde(default)]
    pub hosts: BTreeMap<MacAddr, String>,
}

impl TenantTable {
    pub fn from_json_str(s: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn assign(&mut self, mac: MacAddr, vlan: impl Into<String>) {
        self.hosts.insert(mac, vlan.into());
    }

    /// 主机所属 VLAN，未登记时为 [`DEFAULT_VLAN`]
    pub fn vlan_of(&self, mac: &MacAddr) -> &str {
        self.hosts.get(mac).map(String::as_str).unwrap_or(DEFAULT_VLAN)
    }

    /// 出现过的 VLAN（按名字排序）
    pub fn vlans(&self) -> BTreeSet<&str> {
        self.hosts.values().map(String::as_str).collect()
    }

    /// 返回 `Some((期望, 实际))` 表示数目不一致
    pub fn count_mismatch(&self) -> Option<(usize, usize)> {
        let expected = self.vlan_count?;
        let actual = self.vlans().len();
        (expected != actual).then_some((expected, actual))
    }
}
