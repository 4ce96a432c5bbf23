//! 客户端层错误类型

use thiserror::Error;
use thymio_driver::DriverError;
use thymio_protocol::ProtocolError;

/// 客户端层错误
#[derive(Error, Debug)]
pub enum ClientError {
    /// 驱动层错误（传输失败、队列满、线程退出等）
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 协议错误（菜单选项无法识别等）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 等待遥测超时
    #[error("Timed out after {timeout_ms} ms waiting for telemetry")]
    TelemetryTimeout { timeout_ms: u64 },
}

/// 客户端层 Result 别名
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ClientError::TelemetryTimeout { timeout_ms: 250 };
        assert_eq!(err.to_string(), "Timed out after 250 ms waiting for telemetry");

        let err: ClientError = DriverError::ChannelClosed.into();
        assert!(err.to_string().contains("Command channel closed"));
    }
}
