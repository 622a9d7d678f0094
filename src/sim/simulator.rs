//! 事件调度器
//!
//! 单一逻辑事件流：维护当前时间与按 (时间, 序号) 排序的事件队列，
//! 支持取消尚未执行的事件（用于停止已断开交换机的统计轮询）。

use super::event::{Event, World};
use super::time::SimTime;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, info, trace};

/// 已调度事件的句柄，可用于 [`Simulator::cancel`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u64);

struct Scheduled {
    at: SimTime,
    seq: u64,
    ev: Box<dyn Event>,
}

// BinaryHeap 是 max-heap；需要最早时间优先，同一时间按调度顺序执行。
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .cmp(&other.at)
            .then_with(|| self.seq.cmp(&other.seq))
            .reverse()
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Scheduled {}

#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<Scheduled>,
    cancelled: HashSet<u64>,
    executed: u64,
}

impl Simulator {
    /// 获取当前时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 已执行的事件数（不含被取消的事件）
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// 队列中尚未执行且未被取消的事件数
    pub fn pending(&self) -> usize {
        self.q
            .iter()
            .filter(|s| !self.cancelled.contains(&s.seq))
            .count()
    }

    /// 调度事件在指定时间执行；早于当前时间的请求按当前时间处理。
    #[tracing::instrument(level = "trace", skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> EventId {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(Scheduled {
            at: at.max(self.now),
            seq,
            ev: Box::new(ev),
        });
        trace!(seq, queue_size = self.q.len(), "事件已加入队列");
        EventId(seq)
    }

    /// 在 `delay` 之后执行。
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) -> EventId {
        self.schedule(self.now.after(delay), ev)
    }

    /// 取消尚未执行的事件。返回 false 表示事件已执行或已被取消。
    pub fn cancel(&mut self, id: EventId) -> bool {
        if !self.q.iter().any(|s| s.seq == id.0) {
            return false;
        }
        let fresh = self.cancelled.insert(id.0);
        if fresh {
            debug!(seq = id.0, "取消事件");
        }
        fresh
    }

    fn pop_live(&mut self) -> Option<Scheduled> {
        while let Some(item) = self.q.pop() {
            if self.cancelled.remove(&item.seq) {
                continue;
            }
            return Some(item);
        }
        None
    }

    fn dispatch(&mut self, item: Scheduled, world: &mut dyn World) {
        self.now = item.at;
        self.executed += 1;
        trace!(seq = item.seq, event = item.ev.label(), now = %self.now, "执行事件");
        item.ev.execute(self, world);
    }

    /// 运行直到事件队列为空或到达 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        loop {
            match self.q.peek() {
                Some(top) if top.at <= until => {}
                _ => break,
            }
            if let Some(item) = self.pop_live() {
                if item.at > until {
                    // 取消的事件被跳过后，下一个可能已经越界
                    self.q.push(item);
                    break;
                }
                self.dispatch(item, world);
            }
        }
        self.now = self.now.max(until);
    }

    /// 运行所有事件直到队列为空。存在自我重排的定时器时不会返回，应改用 `run_until`。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始分发事件");
        let start = self.executed;
        while let Some(item) = self.pop_live() {
            self.dispatch(item, world);
        }
        info!(
            total_events = self.executed - start,
            final_time = %self.now,
            "✅ 事件队列已清空"
        );
    }
}
