//! 命令类型定义模块
//!
//! 命令线程按 FIFO 顺序执行 [`BridgeCommand`]，每条命令可选携带一个应答回调。
//! [`Ack`] 把回调转换为可阻塞等待的句柄，[`AckSet`] 聚合多条命令的确认
//! （例如一次 RGB 设置会拆成顶部和两侧底部三条请求）。

use crate::error::DriverError;
use crate::transport::{BridgeReply, TransportError};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError, bounded};
use std::fmt;
use std::time::{Duration, Instant};
use thymio_protocol::BridgeRequest;

/// 应答回调（在命令线程上调用，恰好一次）
pub type ReplyCallback = Box<dyn FnOnce(Result<BridgeReply, TransportError>) + Send + 'static>;

/// 待执行的桥接命令
pub struct BridgeCommand {
    pub request: BridgeRequest,
    pub on_reply: Option<ReplyCallback>,
}

impl BridgeCommand {
    /// 不关心结果的命令
    pub fn fire_and_forget(request: BridgeRequest) -> Self {
        Self {
            request,
            on_reply: None,
        }
    }

    pub fn with_reply(request: BridgeRequest, on_reply: ReplyCallback) -> Self {
        Self {
            request,
            on_reply: Some(on_reply),
        }
    }
}

impl fmt::Debug for BridgeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeCommand")
            .field("request", &self.request)
            .field("on_reply", &self.on_reply.is_some())
            .finish()
    }
}

type AckResult = Result<BridgeReply, DriverError>;

/// 单条命令的确认句柄
///
/// 命令未执行就被丢弃（桥接释放）时，等待返回 `DriverError::ChannelClosed`。
#[derive(Debug)]
pub struct Ack {
    rx: Receiver<AckResult>,
}

impl Ack {
    /// 创建句柄和配对的应答回调
    pub fn channel() -> (Self, ReplyCallback) {
        Self::channel_with(|_| {})
    }

    /// 同 [`channel`](Self::channel)，但在转发结果前先在命令线程上执行 `side_effect`
    pub fn channel_with<F>(side_effect: F) -> (Self, ReplyCallback)
    where
        F: FnOnce(&Result<BridgeReply, TransportError>) + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let callback: ReplyCallback = Box::new(move |result| {
            side_effect(&result);
            let _ = tx.send(result.map_err(DriverError::from));
        });
        (Self { rx }, callback)
    }

    /// 阻塞等待确认
    pub fn wait(self) -> AckResult {
        self.rx.recv().unwrap_or(Err(DriverError::ChannelClosed))
    }

    /// 在给定时间内等待确认
    ///
    /// # 错误
    ///
    /// - `DriverError::Timeout`: 超时
    /// - `DriverError::ChannelClosed`: 命令未执行就被丢弃
    /// - `DriverError::Transport`: 传输失败
    pub fn wait_timeout(self, timeout: Duration) -> AckResult {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(DriverError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(DriverError::ChannelClosed),
        }
    }

    /// 非阻塞查询，尚未完成时返回 `None`
    pub fn try_wait(&self) -> Option<AckResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(DriverError::ChannelClosed)),
        }
    }
}

/// 多条命令的确认集合
#[derive(Debug, Default)]
pub struct AckSet {
    acks: Vec<Ack>,
}

impl AckSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ack: Ack) {
        self.acks.push(ack);
    }

    pub fn len(&self) -> usize {
        self.acks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acks.is_empty()
    }

    /// 等待全部确认，返回各自的应答（按提交顺序）
    ///
    /// 所有确认都会被等待，即使前面的已经失败；返回第一个错误。
    pub fn wait_all(self) -> Result<Vec<BridgeReply>, DriverError> {
        let mut replies = Vec::with_capacity(self.acks.len());
        let mut first_error = None;
        for ack in self.acks {
            match ack.wait() {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    first_error.get_or_insert(e);
                },
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(replies),
        }
    }

    /// 在总时限内等待全部确认
    pub fn wait_all_timeout(self, timeout: Duration) -> Result<Vec<BridgeReply>, DriverError> {
        let deadline = Instant::now() + timeout;
        let mut replies = Vec::with_capacity(self.acks.len());
        for ack in self.acks {
            let remaining = deadline.saturating_duration_since(Instant::now());
            replies.push(ack.wait_timeout(remaining)?);
        }
        Ok(replies)
    }
}

impl FromIterator<Ack> for AckSet {
    fn from_iter<I: IntoIterator<Item = Ack>>(iter: I) -> Self {
        Self {
            acks: iter.into_iter().collect(),
        }
    }
}
