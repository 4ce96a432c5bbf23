//! 驱动层错误类型定义

use crate::transport::TransportError;
use thymio_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// HTTP 传输错误
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 命令通道已关闭（命令线程退出）
    #[error("Command channel closed")]
    ChannelClosed,

    /// 命令通道已满
    #[error("Command channel full (capacity: {0})")]
    ChannelFull(usize),

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,

    /// 配置错误
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO 线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),
}
