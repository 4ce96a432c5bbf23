//! Bridge API 模块
//!
//! 提供对外的 `ThymioBridge` 结构体，封装后台线程和状态同步细节。
//!
//! - 命令线程：生命周期与 `ThymioBridge` 相同，按 FIFO 顺序执行请求
//! - 遥测线程：每次 `connect()` 启动一个，绑定到当时的会话代次

use crate::command::{Ack, BridgeCommand, ReplyCallback};
use crate::completion::{AbandonReason, Completion, CompletionCallback, MotionHandle};
use crate::config::BridgeConfig;
use crate::connection::ConnectionState;
use crate::error::DriverError;
use crate::hooks::FrameCallback;
use crate::metrics::{BridgeMetrics, MetricsSnapshot};
use crate::pipeline::{command_loop, telemetry_loop};
use crate::state::BridgeContext;
use crate::transport::{BridgeReply, BridgeTransport, TransportError};
use crossbeam_channel::{Sender, TrySendError, bounded};
use parking_lot::Mutex;
use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thymio_protocol::{
    ActionRequest, BridgeRequest, HttpMethod, MOTION_DONE_PREFIX, QueuedMotion, TelemetryFrame,
};
use tracing::{error, info, warn};

/// Extension trait for timeout-capable thread joins
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: std::marker::Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();

        // Watchdog thread joins the target; on timeout it is left behind
        thread::spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// 遥测会话启动器
///
/// 可克隆，程序上传确认后在命令线程上重新订阅也用它。
#[derive(Clone)]
struct SessionLauncher {
    transport: Arc<dyn BridgeTransport>,
    ctx: Arc<BridgeContext>,
    path: String,
    reconnect_delay: Duration,
    subscribe_retry: Duration,
    telemetry_thread: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionLauncher {
    /// 开启新会话并启动遥测线程
    ///
    /// 旧的遥测线程在下一行或下一次重试前自行退出。
    fn start(&self) -> Result<(), DriverError> {
        let generation = self.ctx.begin_session();
        self.ctx.transition(generation, ConnectionState::Connecting);
        self.ctx.completion.abandon(AbandonReason::Disconnected);

        let transport = self.transport.clone();
        let ctx = self.ctx.clone();
        let path = self.path.clone();
        let (reconnect_delay, subscribe_retry) = (self.reconnect_delay, self.subscribe_retry);
        let handle = thread::Builder::new()
            .name(format!("thymio-telemetry-{generation}"))
            .spawn(move || {
                telemetry_loop(transport, ctx, path, generation, reconnect_delay, subscribe_retry)
            })
            .map_err(|e| DriverError::IoThread(e.to_string()))?;

        *self.telemetry_thread.lock() = Some(handle);
        info!("Telemetry session {} started on {}", generation, self.path);
        Ok(())
    }

    /// 结束当前会话，返回遥测线程句柄（如有）
    fn stop(&self) -> Option<JoinHandle<()>> {
        self.ctx.end_session();
        self.ctx.completion.abandon(AbandonReason::Disconnected);
        self.telemetry_thread.lock().take()
    }
}

/// Thymio 桥接驱动（对外 API）
///
/// # 示例
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use thymio_driver::{BridgeConfig, HttpTransport, ThymioBridge};
/// use thymio_protocol::ActionRequest;
///
/// # fn main() -> Result<(), thymio_driver::DriverError> {
/// let config = BridgeConfig::default();
/// let transport = HttpTransport::new(&config)?;
/// let bridge = ThymioBridge::new(Arc::new(transport), config)?;
/// bridge.connect()?;
///
/// let ack = bridge.send_action_acked(ActionRequest::sound_system(1.0))?;
/// ack.wait()?;
/// # Ok(())
/// # }
/// ```
pub struct ThymioBridge {
    /// 命令发送通道
    ///
    /// Drop 时必须先关闭通道再 join 命令线程，否则 `command_loop` 永远收不到 `Disconnected`。
    cmd_tx: ManuallyDrop<Sender<BridgeCommand>>,
    ctx: Arc<BridgeContext>,
    launcher: SessionLauncher,
    command_thread: Option<JoinHandle<()>>,
    config: BridgeConfig,
}

impl ThymioBridge {
    /// 创建桥接驱动并启动命令线程（不会自动订阅遥测）
    ///
    /// # 错误
    /// - `DriverError::Config`: 配置无效
    /// - `DriverError::IoThread`: 命令线程启动失败
    pub fn new(
        transport: Arc<dyn BridgeTransport>,
        config: BridgeConfig,
    ) -> Result<Self, DriverError> {
        config.validate()?;

        let ctx = Arc::new(BridgeContext::new(config.stale_after()));
        let (cmd_tx, cmd_rx) = bounded(config.command_queue_capacity);

        let command_thread = {
            let transport = transport.clone();
            let ctx = ctx.clone();
            thread::Builder::new()
                .name("thymio-command".to_string())
                .spawn(move || command_loop(transport, cmd_rx, ctx))
                .map_err(|e| DriverError::IoThread(e.to_string()))?
        };

        let launcher = SessionLauncher {
            transport,
            ctx: ctx.clone(),
            path: config.events_path(),
            reconnect_delay: config.reconnect_delay(),
            subscribe_retry: config.subscribe_retry(),
            telemetry_thread: Arc::new(Mutex::new(None)),
        };

        Ok(Self {
            cmd_tx: ManuallyDrop::new(cmd_tx),
            ctx,
            launcher,
            command_thread: Some(command_thread),
            config,
        })
    }

    // ==================== 生命周期 ====================

    /// 订阅遥测事件流
    ///
    /// 已连接时会重新开始一个会话；未完成的排队运动以 `Abandoned(Disconnected)` 结束。
    pub fn connect(&self) -> Result<(), DriverError> {
        self.launcher.start()
    }

    /// 停止遥测订阅
    ///
    /// 连接状态立即变为 `Disconnected`，之后旧会话的数据不会再写入状态。
    /// 重复调用无副作用。
    pub fn disconnect(&self) {
        if self.launcher.stop().is_some() {
            info!("Telemetry session stopped");
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.ctx.connection_state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    // ==================== 遥测 ====================

    /// 最新完整状态帧
    pub fn latest_frame(&self) -> Option<Arc<TelemetryFrame>> {
        self.ctx.latest_frame()
    }

    /// 是否收到过状态更新
    pub fn has_telemetry(&self) -> bool {
        self.ctx.monitor.has_update()
    }

    /// 最新状态是否已过期（从未收到也算过期）
    pub fn is_stale(&self) -> bool {
        self.ctx.monitor.is_stale()
    }

    pub fn telemetry_age(&self) -> Option<Duration> {
        self.ctx.monitor.time_since_last_update()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.ctx.metrics.reset();
    }

    /// 注册帧回调
    pub fn add_frame_callback(&self, callback: Arc<dyn FrameCallback>) {
        self.ctx.hooks.write().add_callback(callback);
    }

    /// 是否有排队运动正在等待完成事件
    pub fn motion_pending(&self) -> bool {
        self.ctx.completion.is_armed()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn node(&self) -> &str {
        &self.config.node
    }

    // ==================== 命令 ====================

    fn enqueue(&self, command: BridgeCommand) -> Result<(), DriverError> {
        self.cmd_tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => {
                BridgeMetrics::bump(&self.ctx.metrics.command_queue_full);
                DriverError::ChannelFull(self.config.command_queue_capacity)
            },
            TrySendError::Disconnected(_) => DriverError::ChannelClosed,
        })
    }

    /// 发送请求并返回确认句柄
    pub fn send_request(&self, request: BridgeRequest) -> Result<Ack, DriverError> {
        let (ack, on_reply) = Ack::channel();
        self.enqueue(BridgeCommand::with_reply(request, on_reply))?;
        Ok(ack)
    }

    /// 发送动作（不等待确认）
    ///
    /// # 错误
    /// - `DriverError::ChannelFull`: 命令队列已满
    /// - `DriverError::ChannelClosed`: 命令线程已退出
    pub fn send_action(&self, action: ActionRequest) -> Result<(), DriverError> {
        let request = action.to_bridge_request(&self.config.node);
        self.enqueue(BridgeCommand::fire_and_forget(request))
    }

    /// 发送动作，确认后在命令线程上调用 `on_reply`
    pub fn send_action_then<F>(&self, action: ActionRequest, on_reply: F) -> Result<(), DriverError>
    where
        F: FnOnce(Result<BridgeReply, TransportError>) + Send + 'static,
    {
        let request = action.to_bridge_request(&self.config.node);
        self.enqueue(BridgeCommand::with_reply(request, Box::new(on_reply)))
    }

    /// 发送动作并返回确认句柄
    pub fn send_action_acked(&self, action: ActionRequest) -> Result<Ack, DriverError> {
        self.send_request(action.to_bridge_request(&self.config.node))
    }

    /// 发送结构化请求，请求体为 `[3, a, b, c]`
    pub fn request_send(
        &self,
        method: HttpMethod,
        name: &str,
        values: [f64; 3],
    ) -> Result<Ack, DriverError> {
        self.send_request(BridgeRequest::structured(
            &self.config.node,
            method,
            name,
            values,
        ))
    }

    /// 排队一段运动
    ///
    /// 确认后开始观察 `Q_motion_noneleft`；返回的句柄在运动结束或被放弃时解决。
    /// 同一时刻只有一个观察者，新的排队运动会让之前未完成的以 `Abandoned(Superseded)` 结束。
    /// 确认到达时会话已结束或连接已断开，则以 `Abandoned(Disconnected)` 结束。
    pub fn queue_motion(&self, motion: QueuedMotion) -> Result<MotionHandle, DriverError> {
        let (handle, resolve) = MotionHandle::channel(self.config.completion_timeout());
        self.queue_motion_with(motion, resolve)?;
        Ok(handle)
    }

    /// 同 [`queue_motion`](Self::queue_motion)，以回调形式通知结果
    pub fn queue_motion_then<F>(&self, motion: QueuedMotion, on_done: F) -> Result<(), DriverError>
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        self.queue_motion_with(motion, Box::new(on_done))
    }

    fn queue_motion_with(
        &self,
        motion: QueuedMotion,
        resolve: CompletionCallback,
    ) -> Result<(), DriverError> {
        let ctx = self.ctx.clone();
        // 确认到达时会话已结束的运动不再安装观察者
        let generation = self.ctx.generation();
        let on_reply: ReplyCallback = Box::new(move |result| match result {
            Ok(_) => {
                let abandoned = ctx.clone();
                let resolve: CompletionCallback = Box::new(move |completion| {
                    if !completion.is_completed() {
                        BridgeMetrics::bump(&abandoned.metrics.motions_abandoned);
                    }
                    resolve(completion);
                });
                if let Err(resolve) =
                    ctx.install_watcher(generation, MOTION_DONE_PREFIX, resolve)
                {
                    warn!("Queued motion acknowledged while disconnected (session {})", generation);
                    resolve(Completion::Abandoned(AbandonReason::Disconnected));
                }
            },
            Err(e) => {
                warn!("Queued motion was not accepted: {}", e);
                BridgeMetrics::bump(&ctx.metrics.motions_abandoned);
                resolve(Completion::Abandoned(AbandonReason::RequestFailed));
            },
        });

        let request = motion.to_bridge_request(&self.config.node);
        self.enqueue(BridgeCommand::with_reply(request, on_reply))
    }

    /// 上传 Aseba 程序
    ///
    /// 上传确认后重新订阅事件流。
    pub fn upload_program(&self, program: Vec<u8>) -> Result<Ack, DriverError> {
        let launcher = self.launcher.clone();
        let (ack, on_reply) = Ack::channel_with(move |result| {
            if result.is_ok()
                && let Err(e) = launcher.start()
            {
                error!("Failed to re-subscribe after upload: {}", e);
            }
        });
        let request = BridgeRequest::upload(&self.config.node, program);
        self.enqueue(BridgeCommand::with_reply(request, on_reply))?;
        Ok(ack)
    }
}

impl Drop for ThymioBridge {
    fn drop(&mut self) {
        let telemetry_thread = self.launcher.stop();

        // 先关闭命令通道，命令线程处理完剩余命令后退出
        unsafe {
            ManuallyDrop::drop(&mut self.cmd_tx);
        }

        let join_timeout = Duration::from_secs(2);
        if let Some(handle) = self.command_thread.take()
            && let Err(_e) = handle.join_timeout(join_timeout)
        {
            error!(
                "Command thread panicked or failed to shut down within {:?}",
                join_timeout
            );
        }

        // 遥测线程可能阻塞在读取上，只做短暂等待
        if let Some(handle) = telemetry_thread
            && handle.join_timeout(Duration::from_millis(100)).is_err()
        {
            warn!("Telemetry thread still blocked on the event stream, detaching");
        }
    }
}
