//! 桥接传输层
//!
//! [`BridgeTransport`] 是驱动层与网络之间唯一的接缝：
//!
//! - `execute()`：一次短请求/响应（动作、排队运动、程序上传）
//! - `subscribe()`：打开长连接事件流，按行读取遥测
//!
//! 两个方法都是阻塞的，只在驱动层自己的线程上调用。
//! 生产环境使用基于 `reqwest` 阻塞客户端的 [`HttpTransport`]；测试使用 `MockTransport`。

use crate::config::BridgeConfig;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::io::{BufRead, BufReader};
use std::time::Duration;
use thiserror::Error;
use thymio_protocol::{BridgeRequest, HttpMethod, RequestBody};
use tracing::trace;

/// 事件流（逐行读取）
pub type TelemetryStream = Box<dyn BufRead + Send>;

/// 传输层错误
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP 客户端错误（连接失败、超时等）
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 桥接返回非 2xx 状态（仅事件流订阅视为失败）
    #[error("Bridge returned status {status} for {path}")]
    Status { status: u16, path: String },

    /// 请求体编码失败
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// 事件流读取错误
    #[error("Stream IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 桥接不可用
    #[error("Bridge unavailable: {0}")]
    Unavailable(String),
}

/// 桥接响应
///
/// 任何完成的 HTTP 往返都算作确认，与状态码无关；状态码留给调用方检查。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeReply {
    pub status: u16,
    pub body: String,
}

impl BridgeReply {
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 桥接传输 Trait
pub trait BridgeTransport: Send + Sync {
    /// 执行一次请求
    fn execute(&self, request: &BridgeRequest) -> Result<BridgeReply, TransportError>;

    /// 订阅事件流
    ///
    /// 返回的流在对端关闭时读到 EOF，在网络错误时返回 `Err` 行。
    fn subscribe(&self, path: &str) -> Result<TelemetryStream, TransportError>;
}

/// 基于 reqwest 阻塞客户端的 HTTP 传输
///
/// 命令请求使用带超时的客户端；事件流使用不设总超时的独立客户端，
/// 否则长连接会在超时后被截断。
pub struct HttpTransport {
    base_url: String,
    client: Client,
    stream_client: Client,
}

impl HttpTransport {
    /// 按配置创建
    ///
    /// # 错误
    ///
    /// - `TransportError::Http`: TLS 后端或内部运行时初始化失败
    pub fn new(config: &BridgeConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.request_timeout())
            .build()?;
        let stream_client = Client::builder()
            .timeout(None::<Duration>)
            .connect_timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            stream_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl BridgeTransport for HttpTransport {
    fn execute(&self, request: &BridgeRequest) -> Result<BridgeReply, TransportError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
        };

        match &request.body {
            Some(RequestBody::Values(values)) => {
                builder = builder
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(serde_json::to_string(values)?);
            },
            Some(RequestBody::Raw(bytes)) => {
                builder = builder.body(bytes.clone());
            },
            None => {},
        }

        trace!("{} {}", request.method, url);
        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(BridgeReply { status, body })
    }

    fn subscribe(&self, path: &str) -> Result<TelemetryStream, TransportError> {
        let response = self
            .stream_client
            .get(self.url(path))
            .header(ACCEPT, "text/event-stream")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        Ok(Box::new(BufReader::new(response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_success_range() {
        assert!(BridgeReply::ok().is_success());
        let reply = BridgeReply {
            status: 404,
            body: String::new(),
        };
        assert!(!reply.is_success());
    }

    #[test]
    fn test_http_transport_builds_urls() {
        let config = BridgeConfig {
            base_url: "http://127.0.0.1:3000/".to_string(),
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.url("/nodes/thymio-II/events"),
            "http://127.0.0.1:3000/nodes/thymio-II/events"
        );
    }
}
