//! 控制层
//!
//! 配置、租户表、各交换机转发策略、负载与主机表、中央编排器，以及把它们
//! 挂到事件调度器上的世界实现。

pub mod adaptive;
pub mod config;
pub mod controller;
pub mod hosts;
pub mod load;
pub mod scenario;
pub mod switch;
pub mod tenants;
pub mod tree_switch;
pub mod vlan_switch;
pub mod world;

pub use adaptive::{AdaptiveCoreSwitch, AdaptiveEdgeSwitch, EdgeDecision};
pub use config::{ConfigError, ControllerConfig, DEFAULT_FLOW_HARD_TIMEOUT, Mode, parse_core_ids};
pub use controller::{Controller, ControllerEvent, LinkChange};
pub use hosts::HostTable;
pub use load::{LinkLoad, LoadTable};
pub use scenario::{ScenarioError, ScenarioSpec};
pub use switch::{BlockUpdate, LearningTable, PolicyCtx, SwitchBase, SwitchPolicy};
pub use tenants::{DEFAULT_VLAN, TenantTable};
pub use tree_switch::TreeSwitch;
pub use vlan_switch::{VlanPlan, VlanSwitch};
pub use world::{Deliver, FabricWorld, PollPortStats};
