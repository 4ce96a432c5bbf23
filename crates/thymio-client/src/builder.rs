//! Client 层 Builder
//!
//! 在驱动层 [`BridgeBuilder`] 之上构造 [`Thymio`]，可选地等待第一条遥测。

use crate::error::Result;
use crate::thymio::Thymio;
use std::sync::Arc;
use std::time::Duration;
use thymio_driver::{BridgeBuilder, BridgeConfig, BridgeTransport};

/// Thymio 客户端 Builder
///
/// # 示例
///
/// ```rust,no_run
/// use std::time::Duration;
/// use thymio_client::ThymioBuilder;
///
/// let thymio = ThymioBuilder::new()
///     .base_url("http://192.168.1.20:3000")
///     .node("thymio-II")
///     .wait_for_telemetry(Duration::from_secs(3))
///     .build()?;
/// # Ok::<(), thymio_client::ClientError>(())
/// ```
pub struct ThymioBuilder {
    bridge: BridgeBuilder,
    telemetry_timeout: Option<Duration>,
}

impl ThymioBuilder {
    pub fn new() -> Self {
        Self {
            bridge: BridgeBuilder::new(),
            telemetry_timeout: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.bridge = self.bridge.base_url(base_url);
        self
    }

    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.bridge = self.bridge.node(node);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.bridge = self.bridge.request_timeout(timeout);
        self
    }

    /// `MotionHandle::wait()` 的默认等待上限
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.bridge = self.bridge.completion_timeout(timeout);
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.bridge = self.bridge.reconnect_delay(delay);
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.bridge = self.bridge.config(config);
        self
    }

    /// 自定义传输层（测试时传入 mock）
    pub fn transport(mut self, transport: Arc<dyn BridgeTransport>) -> Self {
        self.bridge = self.bridge.transport(transport);
        self
    }

    /// 是否在构造后立即订阅事件流（默认开启）
    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.bridge = self.bridge.auto_connect(enabled);
        self
    }

    /// 构造完成前等待第一条遥测
    pub fn wait_for_telemetry(mut self, timeout: Duration) -> Self {
        self.telemetry_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Thymio> {
        let thymio = Thymio::new(self.bridge.build()?);
        if let Some(timeout) = self.telemetry_timeout {
            thymio.wait_for_telemetry(timeout)?;
        }
        Ok(thymio)
    }
}

impl Default for ThymioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use thymio_driver::{ConnectionState, DriverError, MockTransport};

    #[test]
    fn test_build_without_connect() {
        let thymio = ThymioBuilder::new()
            .transport(Arc::new(MockTransport::new()))
            .auto_connect(false)
            .build()
            .unwrap();
        assert_eq!(thymio.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_invalid_node_rejected() {
        let result = ThymioBuilder::new()
            .transport(Arc::new(MockTransport::new()))
            .node("")
            .build();
        assert!(matches!(
            result,
            Err(ClientError::Driver(DriverError::Config(_)))
        ));
    }

    #[test]
    fn test_build_waits_for_telemetry() {
        let result = ThymioBuilder::new()
            .transport(Arc::new(MockTransport::new()))
            .wait_for_telemetry(Duration::from_millis(30))
            .build();
        assert!(matches!(result, Err(ClientError::TelemetryTimeout { .. })));
    }
}
