//! 连接状态定义
//!
//! 事件流生命周期驱动的状态机：
//!
//! ```text
//! Disconnected → Connecting（开始订阅）→ Connected（流打开或收到第一条消息）
//!      ↑                                          │
//!      └──────────── 流错误 / disconnect() ────────┘
//! ```
//!
//! 流错误后会自动重新进入 `Connecting`，直到调用 `disconnect()`。

use std::sync::atomic::{AtomicU8, Ordering};

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConnectionState {
    /// 未连接（默认）
    #[default]
    Disconnected = 0,

    /// 正在订阅事件流
    Connecting = 1,

    /// 事件流已打开
    Connected = 2,
}

impl ConnectionState {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 Disconnected。
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    pub fn is_disconnected(self) -> bool {
        self == Self::Disconnected
    }
}

/// 连接状态（原子版本，用于线程间共享）
///
/// 遥测线程写入，任意线程读取。
#[derive(Debug)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    /// 获取当前状态
    pub fn get(&self, ordering: Ordering) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(ordering))
    }

    /// 设置状态，返回旧状态
    pub fn swap(&self, state: ConnectionState, ordering: Ordering) -> ConnectionState {
        ConnectionState::from_u8(self.inner.swap(state.as_u8(), ordering))
    }

    pub fn set(&self, state: ConnectionState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }
}

impl Default for AtomicConnectionState {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_conversions() {
        assert_eq!(ConnectionState::Disconnected.as_u8(), 0);
        assert_eq!(ConnectionState::Connected.as_u8(), 2);
        assert_eq!(ConnectionState::from_u8(1), ConnectionState::Connecting);
        assert_eq!(ConnectionState::from_u8(255), ConnectionState::Disconnected); // 无效值
        assert!(ConnectionState::Connected.is_connected());
        assert!(ConnectionState::default().is_disconnected());
    }

    #[test]
    fn test_atomic_state() {
        let state = AtomicConnectionState::default();
        assert_eq!(state.get(Ordering::Relaxed), ConnectionState::Disconnected);

        state.set(ConnectionState::Connecting, Ordering::Relaxed);
        let previous = state.swap(ConnectionState::Connected, Ordering::Relaxed);
        assert_eq!(previous, ConnectionState::Connecting);
        assert_eq!(state.get(Ordering::Relaxed), ConnectionState::Connected);
    }
}
