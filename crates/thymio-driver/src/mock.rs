//! Mock 传输层
//!
//! 用于在没有桥接和机器人的情况下测试驱动层和客户端：
//!
//! - 记录所有执行过的请求
//! - 测试代码通过 [`MockTransport::open_stream`] 预先排入事件流，
//!   再用 [`MockStream`] 逐行推送遥测
//! - 可以模拟请求失败和非 2xx 响应

use crate::transport::{BridgeReply, BridgeTransport, TelemetryStream, TransportError};
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex};
use std::io::{self, BufReader, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thymio_protocol::{BridgeRequest, STATE_UPDATE_TAG};

/// 没有排队的事件流时 `subscribe()` 的等待时间
const SUBSCRIBE_WAIT: Duration = Duration::from_millis(50);

#[derive(Default)]
struct MockInner {
    requests: Mutex<Vec<BridgeRequest>>,
    activity: Condvar,
    subscriptions: AtomicUsize,
    fail_requests: AtomicBool,
    status: AtomicU16,
}

/// Mock 传输层（克隆后共享同一份状态）
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
    streams_tx: Sender<Receiver<Vec<u8>>>,
    streams_rx: Receiver<Receiver<Vec<u8>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        let (streams_tx, streams_rx) = unbounded();
        let inner = MockInner {
            status: AtomicU16::new(200),
            ..Default::default()
        };
        Self {
            inner: Arc::new(inner),
            streams_tx,
            streams_rx,
        }
    }

    /// 排入一条事件流，下一次 `subscribe()` 会拿到它
    pub fn open_stream(&self) -> MockStream {
        let (tx, rx) = unbounded();
        let _ = self.streams_tx.send(rx);
        MockStream { tx: Some(tx) }
    }

    /// 已执行的请求（按执行顺序）
    pub fn requests(&self) -> Vec<BridgeRequest> {
        self.inner.requests.lock().clone()
    }

    /// 等待至少 `count` 条请求被执行，返回是否在超时前达到
    pub fn wait_for_requests(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut requests = self.inner.requests.lock();
        while requests.len() < count {
            if self
                .inner
                .activity
                .wait_until(&mut requests, deadline)
                .timed_out()
            {
                return requests.len() >= count;
            }
        }
        true
    }

    /// `subscribe()` 被调用的次数（包括失败的）
    pub fn subscriptions(&self) -> usize {
        self.inner.subscriptions.load(Ordering::SeqCst)
    }

    /// 等待 `subscribe()` 至少被调用 `count` 次
    pub fn wait_for_subscriptions(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.subscriptions() < count {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        true
    }

    /// 之后的请求全部以传输错误失败
    pub fn set_fail_requests(&self, fail: bool) {
        self.inner.fail_requests.store(fail, Ordering::SeqCst);
    }

    /// 之后的请求返回给定状态码
    pub fn set_status(&self, status: u16) {
        self.inner.status.store(status, Ordering::SeqCst);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeTransport for MockTransport {
    fn execute(&self, request: &BridgeRequest) -> Result<BridgeReply, TransportError> {
        let result = if self.inner.fail_requests.load(Ordering::SeqCst) {
            Err(TransportError::Unavailable("mock bridge offline".to_string()))
        } else {
            Ok(BridgeReply {
                status: self.inner.status.load(Ordering::SeqCst),
                body: String::new(),
            })
        };

        self.inner.requests.lock().push(request.clone());
        self.inner.activity.notify_all();
        result
    }

    fn subscribe(&self, path: &str) -> Result<TelemetryStream, TransportError> {
        self.inner.subscriptions.fetch_add(1, Ordering::SeqCst);
        match self.streams_rx.recv_timeout(SUBSCRIBE_WAIT) {
            Ok(chunks) => Ok(Box::new(BufReader::new(ChannelReader {
                chunks,
                pending: Vec::new(),
                offset: 0,
            }))),
            Err(_) => Err(TransportError::Unavailable(format!(
                "no mock stream queued for {path}"
            ))),
        }
    }
}

/// 测试端的事件流句柄
///
/// 释放或调用 [`close`](Self::close) 后，读取端读到 EOF。
pub struct MockStream {
    tx: Option<Sender<Vec<u8>>>,
}

impl MockStream {
    /// 推送一行原始文本（自动补换行）
    pub fn send_line(&self, line: &str) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(format!("{line}\n").into_bytes());
        }
    }

    /// 推送一条 SSE `data:` 消息
    pub fn send_data(&self, message: &str) {
        self.send_line(&format!("data: {message}"));
        self.send_line("");
    }

    /// 推送一条状态更新，`fields` 依次对应索引 1、2、3……
    pub fn send_state(&self, fields: &[i32]) {
        let mut message = String::from(STATE_UPDATE_TAG);
        for field in fields {
            message.push(' ');
            message.push_str(&field.to_string());
        }
        self.send_data(&message);
    }

    pub fn close(&mut self) {
        self.tx = None;
    }
}

struct ChannelReader {
    chunks: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.offset >= self.pending.len() {
            match self.chunks.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                },
                Err(_) => return Ok(0),
            }
        }
        let available = &self.pending[self.offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.offset += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use thymio_protocol::ActionRequest;

    #[test]
    fn test_records_requests() {
        let transport = MockTransport::new();
        let request = ActionRequest::sound_play(2.0).to_bridge_request("thymio-II");
        let reply = transport.execute(&request).unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(transport.requests(), vec![request]);
        assert!(transport.wait_for_requests(1, Duration::from_millis(10)));
    }

    #[test]
    fn test_failures_and_status() {
        let transport = MockTransport::new();
        let request = ActionRequest::sound_play(2.0).to_bridge_request("thymio-II");

        transport.set_status(404);
        assert_eq!(transport.execute(&request).unwrap().status, 404);

        transport.set_fail_requests(true);
        assert!(transport.execute(&request).is_err());
    }

    #[test]
    fn test_subscribe_without_stream_fails() {
        let transport = MockTransport::new();
        assert!(transport.subscribe("/nodes/thymio-II/events").is_err());
        assert_eq!(transport.subscriptions(), 1);
    }

    #[test]
    fn test_stream_lines() {
        let transport = MockTransport::new();
        let mut stream = transport.open_stream();
        stream.send_data("Q_motion_noneleft 0");
        stream.send_state(&[1, 2]);
        stream.close();

        let reader = transport.subscribe("/nodes/thymio-II/events").unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(
            lines,
            vec![
                "data: Q_motion_noneleft 0",
                "",
                "data: R_state_update 1 2",
                ""
            ]
        );
    }
}
