//! 控制器世界与事件适配
//!
//! 把控制器挂到事件调度器上：外部事件通过 [`Deliver`] 进入，统计轮询由
//! 自我重排的 [`PollPortStats`] 定时器驱动。

use super::controller::{Controller, ControllerEvent};
use crate::net::Dpid;
use crate::sim::{Event, Simulator, World};
use std::any::Any;

/// 持有控制器的世界
pub struct FabricWorld {
    pub ctl: Controller,
}

impl FabricWorld {
    pub fn new(ctl: Controller) -> Self {
        Self { ctl }
    }

    fn from_dyn(world: &mut dyn World) -> &mut FabricWorld {
        world
            .as_any_mut()
            .downcast_mut::<FabricWorld>()
            .expect("world must be FabricWorld")
    }
}

impl World for FabricWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 事件：把一个外部事件交给控制器处理
#[derive(Debug)]
pub struct Deliver(pub ControllerEvent);

impl Event for Deliver {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Deliver(ev) = *self;
        FabricWorld::from_dyn(world).ctl.handle(ev, sim);
    }

    fn label(&self) -> &'static str {
        self.0.kind()
    }
}

/// 定时器：向核心交换机请求端口统计
#[derive(Debug)]
pub struct PollPortStats {
    pub dpid: Dpid,
}

impl Event for PollPortStats {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        FabricWorld::from_dyn(world).ctl.poll_port_stats(self.dpid, sim);
    }
}
