//! 桥接链路指标
//!
//! 原子计数器，任何线程都可以无锁读取。

use std::sync::atomic::{AtomicU64, Ordering};

/// 桥接链路实时指标
///
/// # 使用示例
///
/// ```rust
/// use thymio_driver::BridgeMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = BridgeMetrics::new();
/// metrics.messages_total.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.messages_total, 1);
/// ```
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    /// 收到的消息总数（状态 + 事件）
    pub messages_total: AtomicU64,

    /// 已存储的状态更新数
    pub state_updates: AtomicU64,

    /// 事件消息数（非状态更新）
    pub event_frames: AtomicU64,

    /// 字段不足而被丢弃的状态更新数
    pub malformed_frames: AtomicU64,

    /// 事件流断开后重新订阅的次数
    pub reconnects: AtomicU64,

    /// 订阅请求失败次数
    pub subscribe_failures: AtomicU64,

    /// 完成往返的命令数
    pub commands_sent: AtomicU64,

    /// 传输失败的命令数
    pub command_failures: AtomicU64,

    /// 因队列满被拒绝的命令数
    pub command_queue_full: AtomicU64,

    /// 正常完成的排队运动数
    pub motions_completed: AtomicU64,

    /// 被放弃的排队运动数（被覆盖、断开、请求失败）
    pub motions_abandoned: AtomicU64,
}

impl BridgeMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_total: self.messages_total.load(Ordering::Relaxed),
            state_updates: self.state_updates.load(Ordering::Relaxed),
            event_frames: self.event_frames.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            subscribe_failures: self.subscribe_failures.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            command_failures: self.command_failures.load(Ordering::Relaxed),
            command_queue_full: self.command_queue_full.load(Ordering::Relaxed),
            motions_completed: self.motions_completed.load(Ordering::Relaxed),
            motions_abandoned: self.motions_abandoned.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        for counter in [
            &self.messages_total,
            &self.state_updates,
            &self.event_frames,
            &self.malformed_frames,
            &self.reconnects,
            &self.subscribe_failures,
            &self.commands_sent,
            &self.command_failures,
            &self.command_queue_full,
            &self.motions_completed,
            &self.motions_abandoned,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub messages_total: u64,
    pub state_updates: u64,
    pub event_frames: u64,
    pub malformed_frames: u64,
    pub reconnects: u64,
    pub subscribe_failures: u64,
    pub commands_sent: u64,
    pub command_failures: u64,
    pub command_queue_full: u64,
    pub motions_completed: u64,
    pub motions_abandoned: u64,
}

impl MetricsSnapshot {
    /// 命令失败率（百分比），没有命令时为 0.0
    pub fn command_failure_rate(&self) -> f64 {
        let total = self.commands_sent + self.command_failures;
        if total == 0 {
            return 0.0;
        }
        (self.command_failures as f64 / total as f64) * 100.0
    }

    /// 被丢弃的状态更新占比（百分比）
    pub fn malformed_rate(&self) -> f64 {
        let total = self.state_updates + self.malformed_frames;
        if total == 0 {
            return 0.0;
        }
        (self.malformed_frames as f64 / total as f64) * 100.0
    }
}
