//! Builder 模式实现
//!
//! 提供链式构造 `ThymioBridge` 实例的便捷方式。

use crate::bridge::ThymioBridge;
use crate::config::BridgeConfig;
use crate::error::DriverError;
use crate::transport::{BridgeTransport, HttpTransport};
use std::sync::Arc;
use std::time::Duration;

/// ThymioBridge Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use thymio_driver::BridgeBuilder;
///
/// // 使用默认配置（http://127.0.0.1:3000，节点 thymio-II）并立即订阅遥测
/// let bridge = BridgeBuilder::new().build().unwrap();
///
/// // 自定义地址与超时
/// let bridge = BridgeBuilder::new()
///     .base_url("http://192.168.1.20:3000")
///     .node("thymio-II")
///     .completion_timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// ```
pub struct BridgeBuilder {
    config: BridgeConfig,
    /// 自定义传输层（默认使用 `HttpTransport`）
    transport: Option<Arc<dyn BridgeTransport>>,
    /// 构造后是否立即订阅遥测
    auto_connect: bool,
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::default(),
            transport: None,
            auto_connect: true,
        }
    }

    /// 桥接根地址
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// 节点名称
    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.config.node = node.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// `MotionHandle::wait()` 的默认等待上限
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.config.completion_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// 事件流关闭后重新订阅前的等待
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay_ms = delay.as_millis() as u64;
        self
    }

    /// 订阅失败后重试前的等待
    pub fn subscribe_retry(mut self, delay: Duration) -> Self {
        self.config.subscribe_retry_ms = delay.as_millis() as u64;
        self
    }

    pub fn stale_after(mut self, window: Duration) -> Self {
        self.config.stale_after_ms = window.as_millis() as u64;
        self
    }

    pub fn command_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.command_queue_capacity = capacity;
        self
    }

    /// 整体替换配置（例如从 TOML 文件加载的配置）
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// 使用自定义传输层（测试时传入 `MockTransport`）
    pub fn transport(mut self, transport: Arc<dyn BridgeTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 构造后是否立即调用 `connect()`（默认 true）
    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.auto_connect = enabled;
        self
    }

    /// 构建 `ThymioBridge`
    ///
    /// # 错误
    /// - `DriverError::Config`: 配置无效
    /// - `DriverError::Transport`: HTTP 客户端初始化失败
    /// - `DriverError::IoThread`: 后台线程启动失败
    pub fn build(self) -> Result<ThymioBridge, DriverError> {
        self.config.validate()?;

        let transport: Arc<dyn BridgeTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };

        let bridge = ThymioBridge::new(transport, self.config)?;
        if self.auto_connect {
            bridge.connect()?;
        }
        Ok(bridge)
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
