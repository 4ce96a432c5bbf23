//! 共享状态上下文
//!
//! 遥测线程写、调用方线程读：
//!
//! - 最新完整状态帧：`ArcSwapOption`，读者无锁拿到一致快照
//! - 连接状态：原子枚举
//! - 排队运动完成槽位、新鲜度监控、指标、钩子
//!
//! ## 会话代次
//!
//! 每次 `connect()` 开启一个新的会话代次，`disconnect()` 也会推进代次。
//! 遥测线程持有启动时的代次，每读一行先检查代次是否仍是当前的，
//! 不是就立即退出，旧会话晚到的数据不会再写入状态。

use crate::completion::{AbandonReason, Completion, CompletionCallback, CompletionSlot};
use crate::connection::{AtomicConnectionState, ConnectionState};
use crate::heartbeat::TelemetryMonitor;
use crate::hooks::HookManager;
use crate::metrics::BridgeMetrics;
use arc_swap::ArcSwapOption;
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use thymio_protocol::TelemetryFrame;

/// 桥接共享上下文
pub struct BridgeContext {
    /// 最近一次完整的状态更新
    pub latest: ArcSwapOption<TelemetryFrame>,
    pub connection: AtomicConnectionState,
    pub completion: CompletionSlot,
    pub monitor: TelemetryMonitor,
    pub metrics: BridgeMetrics,
    pub hooks: RwLock<HookManager>,
    generation: Mutex<u64>,
    session_changed: Condvar,
}

impl BridgeContext {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            latest: ArcSwapOption::empty(),
            connection: AtomicConnectionState::default(),
            completion: CompletionSlot::new(),
            monitor: TelemetryMonitor::new(stale_after),
            metrics: BridgeMetrics::new(),
            hooks: RwLock::new(HookManager::new()),
            generation: Mutex::new(0),
            session_changed: Condvar::new(),
        }
    }

    /// 开启新会话，返回新代次
    pub fn begin_session(&self) -> u64 {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.session_changed.notify_all();
        *generation
    }

    /// 结束当前会话并把连接状态置为 `Disconnected`
    pub fn end_session(&self) {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.connection
            .set(ConnectionState::Disconnected, Ordering::Release);
        self.session_changed.notify_all();
    }

    /// 当前代次
    pub fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    /// 仅当代次仍是当前代次且未断开时安装完成观察者
    ///
    /// 检查和安装都在代次锁内完成，与 `end_session` 互斥：
    /// 会话结束后不会再出现新的观察者。拒绝时原样交还回调。
    /// 返回是否覆盖了之前的观察者（被覆盖者以 `Abandoned(Superseded)` 解决）。
    pub fn install_watcher(
        &self,
        generation: u64,
        marker: &str,
        callback: CompletionCallback,
    ) -> Result<bool, CompletionCallback> {
        let superseded = {
            let current = self.generation.lock();
            if *current != generation
                || self.connection_state() == ConnectionState::Disconnected
            {
                return Err(callback);
            }
            self.completion.replace(marker, callback)
        };
        match superseded {
            Some(previous) => {
                previous(Completion::Abandoned(AbandonReason::Superseded));
                Ok(true)
            },
            None => Ok(false),
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        *self.generation.lock() == generation
    }

    /// 仅当代次仍是当前代次时更新连接状态
    pub fn transition(&self, generation: u64, state: ConnectionState) -> bool {
        let current = self.generation.lock();
        if *current != generation {
            return false;
        }
        self.connection.set(state, Ordering::Release);
        true
    }

    /// 等待 `duration`，会话结束时提前返回
    ///
    /// 返回代次是否仍是当前代次。
    pub fn pause(&self, generation: u64, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut current = self.generation.lock();
        while *current == generation {
            if self
                .session_changed
                .wait_until(&mut current, deadline)
                .timed_out()
            {
                break;
            }
        }
        *current == generation
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.get(Ordering::Acquire)
    }

    /// 最新完整状态帧（尚未收到时为 `None`）
    pub fn latest_frame(&self) -> Option<Arc<TelemetryFrame>> {
        self.latest.load_full()
    }

    pub(crate) fn store_state(&self, frame: Arc<TelemetryFrame>) {
        self.latest.store(Some(frame));
        self.monitor.register_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stale_generation_cannot_transition() {
        let ctx = BridgeContext::new(Duration::from_secs(1));
        let first = ctx.begin_session();
        assert!(ctx.transition(first, ConnectionState::Connected));

        let second = ctx.begin_session();
        assert!(!ctx.is_current(first));
        assert!(!ctx.transition(first, ConnectionState::Disconnected));
        assert_eq!(ctx.connection_state(), ConnectionState::Connected);
        assert!(ctx.transition(second, ConnectionState::Connecting));

        ctx.end_session();
        assert!(!ctx.is_current(second));
        assert_eq!(ctx.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_install_watcher_requires_live_session() {
        let ctx = BridgeContext::new(Duration::from_secs(1));
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let record = |outcomes: &Arc<Mutex<Vec<Completion>>>| -> CompletionCallback {
            let outcomes = outcomes.clone();
            Box::new(move |completion| outcomes.lock().push(completion))
        };

        // 从未连接：状态为 Disconnected
        let idle = ctx.generation();
        assert!(ctx.install_watcher(idle, "Q_motion_noneleft", record(&outcomes)).is_err());
        assert!(!ctx.completion.is_armed());

        let generation = ctx.begin_session();
        assert!(ctx.transition(generation, ConnectionState::Connected));
        assert_eq!(
            ctx.install_watcher(generation, "Q_motion_noneleft", record(&outcomes)).ok(),
            Some(false)
        );
        assert_eq!(
            ctx.install_watcher(generation, "Q_motion_noneleft", record(&outcomes)).ok(),
            Some(true)
        );
        assert_eq!(
            *outcomes.lock(),
            vec![Completion::Abandoned(AbandonReason::Superseded)]
        );

        ctx.end_session();
        ctx.completion.abandon(AbandonReason::Disconnected);
        let rejected = ctx.install_watcher(generation, "Q_motion_noneleft", record(&outcomes));
        let Err(callback) = rejected else {
            panic!("watcher installed after session ended");
        };
        callback(Completion::Abandoned(AbandonReason::Disconnected));
        assert!(!ctx.completion.is_armed());
        assert_eq!(outcomes.lock().len(), 3);
    }

    #[test]
    fn test_pause_runs_to_deadline() {
        let ctx = BridgeContext::new(Duration::from_secs(1));
        let generation = ctx.begin_session();
        let start = Instant::now();
        assert!(ctx.pause(generation, Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_pause_interrupted_by_end_session() {
        let ctx = Arc::new(BridgeContext::new(Duration::from_secs(1)));
        let generation = ctx.begin_session();

        let sleeper = ctx.clone();
        let handle = thread::spawn(move || sleeper.pause(generation, Duration::from_secs(10)));

        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        ctx.end_session();
        assert!(!handle.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_store_state_marks_fresh() {
        let ctx = BridgeContext::new(Duration::from_secs(1));
        assert!(ctx.latest_frame().is_none());
        assert!(ctx.monitor.is_stale());

        let frame: TelemetryFrame = "R_state_update 1 2".parse().unwrap();
        ctx.store_state(Arc::new(frame.clone()));
        assert_eq!(ctx.latest_frame().as_deref(), Some(&frame));
        assert!(!ctx.monitor.is_stale());
    }
}
