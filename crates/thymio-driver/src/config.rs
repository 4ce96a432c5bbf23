//! 桥接连接配置
//!
//! 所有字段都有默认值，TOML 文件中只需写出要覆盖的键：
//!
//! ```toml
//! base_url = "http://192.168.1.20:3000"
//! request_timeout_ms = 2000
//! completion_timeout_ms = 30000
//! ```

use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thymio_protocol::{BridgeRequest, DEFAULT_BASE_URL, DEFAULT_NODE};

/// 桥接配置
///
/// # Example
///
/// ```
/// use thymio_driver::BridgeConfig;
///
/// let config = BridgeConfig::from_toml_str("node = \"thymio-2\"").unwrap();
/// assert_eq!(config.node, "thymio-2");
/// assert_eq!(config.base_url, "http://127.0.0.1:3000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// 桥接根地址
    pub base_url: String,
    /// 节点名
    pub node: String,
    /// 单个命令请求的 HTTP 超时（毫秒）
    pub request_timeout_ms: u64,
    /// `MotionHandle::wait()` 的默认等待上限（毫秒），`None` 表示一直等到结果
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_timeout_ms: Option<u64>,
    /// 事件流断开后重新订阅前的等待（毫秒），0 表示立即重连
    pub reconnect_delay_ms: u64,
    /// 订阅请求本身失败时的重试间隔（毫秒）
    pub subscribe_retry_ms: u64,
    /// 遥测超过此时长未更新即视为过期（毫秒）
    pub stale_after_ms: u64,
    /// 命令队列容量
    pub command_queue_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            node: DEFAULT_NODE.to_string(),
            request_timeout_ms: 5000,
            completion_timeout_ms: None,
            reconnect_delay_ms: 0,
            subscribe_retry_ms: 500,
            stale_after_ms: 1000,
            command_queue_capacity: 64,
        }
    }
}

impl BridgeConfig {
    /// 从 TOML 字符串解析（缺省字段取默认值）
    pub fn from_toml_str(content: &str) -> Result<Self, DriverError> {
        let config: Self =
            toml::from_str(content).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        toml::to_string(self).map_err(|e| DriverError::Config(e.to_string()))
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), DriverError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(DriverError::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.node.trim().is_empty() || self.node.contains('/') {
            return Err(DriverError::Config(format!(
                "invalid node name {:?}",
                self.node
            )));
        }
        if self.command_queue_capacity == 0 {
            return Err(DriverError::Config(
                "command_queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 拼接完整 URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// 事件流路径
    pub fn events_path(&self) -> String {
        BridgeRequest::events_path(&self.node)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_ms.map(Duration::from_millis)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn subscribe_retry(&self) -> Duration {
        Duration::from_millis(self.subscribe_retry_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}
