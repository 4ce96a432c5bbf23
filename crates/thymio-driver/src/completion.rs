//! 排队运动完成通知
//!
//! 排队运动的结束只能从遥测中观察到：机器人执行完运动队列后发出 `Q_motion_noneleft` 事件。
//! 桥接的确认（HTTP 往返完成）只表示命令已入队，不表示运动完成。
//!
//! [`CompletionSlot`] 是唯一的等待槽位：收到确认后安装一个观察者，
//! 第一个标签匹配前缀的事件帧到达时触发并清空槽位。每个观察者恰好被解决一次：
//!
//! - 匹配到结束事件 → [`Completion::Completed`]
//! - 被新的排队运动覆盖 → `Abandoned(Superseded)`
//! - 事件流断开或调用 `disconnect()` → `Abandoned(Disconnected)`
//! - 排队请求本身失败 → `Abandoned(RequestFailed)`
//! - 桥接在命令执行前被释放 → `Abandoned(Shutdown)`

use crate::error::DriverError;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError, bounded};
use parking_lot::Mutex;
use std::sync::OnceLock;
use std::time::Duration;
use thymio_protocol::TelemetryFrame;

/// 运动被放弃的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// 新的排队运动占用了等待槽位
    Superseded,
    /// 事件流断开
    Disconnected,
    /// 排队请求传输失败
    RequestFailed,
    /// 桥接已释放，命令未执行
    Shutdown,
}

/// 排队运动的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Completed,
    Abandoned(AbandonReason),
}

impl Completion {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// 完成回调（恰好调用一次）
pub type CompletionCallback = Box<dyn FnOnce(Completion) + Send + 'static>;

struct Watcher {
    marker: String,
    callback: CompletionCallback,
}

/// 单槽位完成观察者
///
/// 回调总是在释放锁之后调用，回调内部可以再次安装观察者。
#[derive(Default)]
pub struct CompletionSlot {
    watcher: Mutex<Option<Watcher>>,
}

impl CompletionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 安装观察者，返回是否覆盖了之前的观察者
    ///
    /// 被覆盖的观察者以 `Abandoned(Superseded)` 解决。
    pub fn install(&self, marker: impl Into<String>, callback: CompletionCallback) -> bool {
        match self.replace(marker, callback) {
            Some(previous) => {
                previous(Completion::Abandoned(AbandonReason::Superseded));
                true
            },
            None => false,
        }
    }

    /// 安装观察者，把被覆盖的回调交还调用方（不调用）
    pub fn replace(
        &self,
        marker: impl Into<String>,
        callback: CompletionCallback,
    ) -> Option<CompletionCallback> {
        self.watcher
            .lock()
            .replace(Watcher {
                marker: marker.into(),
                callback,
            })
            .map(|previous| previous.callback)
    }

    /// 把一帧交给观察者，匹配时触发并清空槽位
    pub fn offer(&self, frame: &TelemetryFrame) -> bool {
        let matched = {
            let mut slot = self.watcher.lock();
            match slot.as_ref() {
                Some(watcher) if frame.tag_starts_with(&watcher.marker) => slot.take(),
                _ => None,
            }
        };
        match matched {
            Some(watcher) => {
                (watcher.callback)(Completion::Completed);
                true
            },
            None => false,
        }
    }

    /// 放弃当前观察者（如有）
    pub fn abandon(&self, reason: AbandonReason) -> bool {
        let taken = self.watcher.lock().take();
        match taken {
            Some(watcher) => {
                (watcher.callback)(Completion::Abandoned(reason));
                true
            },
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.watcher.lock().is_some()
    }
}

/// 排队运动句柄
///
/// 结果只会产生一次，之后每次查询都返回同一个值。
///
/// # 示例
///
/// ```rust
/// use thymio_driver::{Completion, MotionHandle};
///
/// let (handle, resolve) = MotionHandle::channel(None);
/// assert_eq!(handle.try_completion(), None);
///
/// resolve(Completion::Completed);
/// assert_eq!(handle.wait().unwrap(), Completion::Completed);
/// assert!(handle.is_finished());
/// ```
#[derive(Debug)]
pub struct MotionHandle {
    rx: Receiver<Completion>,
    default_timeout: Option<Duration>,
    outcome: OnceLock<Completion>,
}

impl MotionHandle {
    /// 创建句柄和与之配对的完成回调
    ///
    /// `default_timeout` 是 [`wait`](Self::wait) 的等待上限，`None` 表示一直等待。
    pub fn channel(default_timeout: Option<Duration>) -> (Self, CompletionCallback) {
        let (tx, rx) = bounded(1);
        let handle = Self {
            rx,
            default_timeout,
            outcome: OnceLock::new(),
        };
        let callback: CompletionCallback = Box::new(move |completion| {
            let _ = tx.send(completion);
        });
        (handle, callback)
    }

    fn settle(&self, completion: Completion) -> Completion {
        *self.outcome.get_or_init(|| completion)
    }

    /// 非阻塞查询
    pub fn try_completion(&self) -> Option<Completion> {
        if let Some(completion) = self.outcome.get() {
            return Some(*completion);
        }
        match self.rx.try_recv() {
            Ok(completion) => Some(self.settle(completion)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(self.settle(Completion::Abandoned(AbandonReason::Shutdown)))
            },
        }
    }

    pub fn is_finished(&self) -> bool {
        self.try_completion().is_some()
    }

    /// 等待结果（使用配置的默认超时）
    ///
    /// # 错误
    ///
    /// - `DriverError::Timeout`: 超过默认超时仍未解决
    pub fn wait(&self) -> Result<Completion, DriverError> {
        if let Some(timeout) = self.default_timeout {
            return self.wait_timeout(timeout);
        }
        if let Some(completion) = self.outcome.get() {
            return Ok(*completion);
        }
        let completion = self
            .rx
            .recv()
            .unwrap_or(Completion::Abandoned(AbandonReason::Shutdown));
        Ok(self.settle(completion))
    }

    /// 在给定时间内等待结果
    ///
    /// 超时不会消耗句柄，之后仍可继续等待。
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Completion, DriverError> {
        if let Some(completion) = self.outcome.get() {
            return Ok(*completion);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => Ok(self.settle(completion)),
            Err(RecvTimeoutError::Timeout) => Err(DriverError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                Ok(self.settle(Completion::Abandoned(AbandonReason::Shutdown)))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn frame(text: &str) -> TelemetryFrame {
        text.parse().unwrap()
    }

    fn counting() -> (Arc<AtomicUsize>, Arc<Mutex<Vec<Completion>>>, CompletionCallback) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (c, s) = (calls.clone(), seen.clone());
        let callback: CompletionCallback = Box::new(move |completion| {
            c.fetch_add(1, Ordering::SeqCst);
            s.lock().push(completion);
        });
        (calls, seen, callback)
    }

    #[test]
    fn test_fires_once_on_marker() {
        let slot = CompletionSlot::new();
        let (calls, seen, callback) = counting();
        assert!(!slot.install("Q_motion_noneleft", callback));
        assert!(slot.is_armed());

        assert!(!slot.offer(&frame("R_state_update 1 2 3")));
        assert!(!slot.offer(&frame("Q_other_event")));
        assert!(slot.offer(&frame("Q_motion_noneleft 0")));
        assert!(!slot.offer(&frame("Q_motion_noneleft 0")));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock(), vec![Completion::Completed]);
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_install_supersedes_previous() {
        let slot = CompletionSlot::new();
        let (_, first_seen, first) = counting();
        let (_, second_seen, second) = counting();

        slot.install("Q_motion_noneleft", first);
        assert!(slot.install("Q_motion_noneleft", second));
        assert_eq!(
            *first_seen.lock(),
            vec![Completion::Abandoned(AbandonReason::Superseded)]
        );

        slot.offer(&frame("Q_motion_noneleft"));
        assert_eq!(*second_seen.lock(), vec![Completion::Completed]);
    }

    #[test]
    fn test_abandon() {
        let slot = CompletionSlot::new();
        assert!(!slot.abandon(AbandonReason::Disconnected));

        let (calls, seen, callback) = counting();
        slot.install("Q_motion_noneleft", callback);
        assert!(slot.abandon(AbandonReason::Disconnected));
        assert!(!slot.offer(&frame("Q_motion_noneleft")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *seen.lock(),
            vec![Completion::Abandoned(AbandonReason::Disconnected)]
        );
    }

    #[test]
    fn test_callback_may_reinstall() {
        let slot = Arc::new(CompletionSlot::new());
        let inner_slot = slot.clone();
        let (calls, _, next) = counting();
        slot.install(
            "Q_motion_noneleft",
            Box::new(move |_| {
                inner_slot.install("Q_motion_noneleft", next);
            }),
        );

        slot.offer(&frame("Q_motion_noneleft"));
        assert!(slot.is_armed());
        slot.offer(&frame("Q_motion_noneleft"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_resolves_once() {
        let (handle, resolve) = MotionHandle::channel(None);
        resolve(Completion::Abandoned(AbandonReason::RequestFailed));
        assert_eq!(
            handle.try_completion(),
            Some(Completion::Abandoned(AbandonReason::RequestFailed))
        );
        assert_eq!(
            handle.wait().unwrap(),
            Completion::Abandoned(AbandonReason::RequestFailed)
        );
    }

    #[test]
    fn test_handle_timeout() {
        let (handle, _resolve) = MotionHandle::channel(Some(Duration::from_millis(20)));
        assert!(matches!(handle.wait(), Err(DriverError::Timeout)));
        assert!(!handle.is_finished());
    }

    #[test]
    fn test_handle_dropped_callback_is_shutdown() {
        let (handle, resolve) = MotionHandle::channel(None);
        drop(resolve);
        assert_eq!(
            handle.wait().unwrap(),
            Completion::Abandoned(AbandonReason::Shutdown)
        );
    }
}
