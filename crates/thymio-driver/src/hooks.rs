//! 钩子系统（Hook System）
//!
//! 在遥测帧到达、命令完成往返时触发自定义回调。
//!
//! # 使用示例
//!
//! ```rust
//! use thymio_driver::hooks::{FrameCallback, HookManager};
//! use thymio_protocol::TelemetryFrame;
//! use std::sync::Arc;
//!
//! struct PrintEvents;
//!
//! impl FrameCallback for PrintEvents {
//!     fn on_frame_received(&self, frame: &TelemetryFrame) {
//!         if !frame.is_state_update() {
//!             println!("event: {}", frame.tag());
//!         }
//!     }
//! }
//!
//! let mut hooks = HookManager::new();
//! hooks.add_callback(Arc::new(PrintEvents));
//!
//! let frame: TelemetryFrame = "Q_motion_noneleft".parse().unwrap();
//! hooks.trigger_all(&frame);
//! ```

use std::sync::Arc;
use thymio_protocol::{BridgeRequest, TelemetryFrame};

/// 帧回调 Trait
///
/// 回调在遥测线程或命令线程上同步执行，实现应尽快返回，
/// 耗时处理请转发到 channel（推荐 `crossbeam_channel::Sender::try_send`）。
pub trait FrameCallback: Send + Sync {
    /// 收到一条遥测消息（状态更新和事件都会触发）
    fn on_frame_received(&self, frame: &TelemetryFrame);

    /// 一条命令完成了 HTTP 往返（可选）
    ///
    /// 仅在传输成功后触发，失败的请求不会出现在这里。
    fn on_command_sent(&self, request: &BridgeRequest) {
        let _ = request;
    }
}

/// 钩子管理器
///
/// 回调列表本身不是线程安全的，需要外部同步（`BridgeContext` 中使用 `RwLock<HookManager>`）。
#[derive(Default)]
pub struct HookManager {
    callbacks: Vec<Arc<dyn FrameCallback>>,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn add_callback(&mut self, callback: Arc<dyn FrameCallback>) {
        self.callbacks.push(callback);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// 触发所有接收回调（遥测线程中调用）
    pub fn trigger_all(&self, frame: &TelemetryFrame) {
        for callback in self.callbacks.iter() {
            callback.on_frame_received(frame);
        }
    }

    /// 触发所有发送回调（命令线程中调用）
    pub fn trigger_all_sent(&self, request: &BridgeRequest) {
        for callback in self.callbacks.iter() {
            callback.on_command_sent(request);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
