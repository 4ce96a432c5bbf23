//! Pipeline 模块
//!
//! 两个后台线程的主循环：
//!
//! - [`telemetry_loop`]：订阅事件流，逐行解析，更新共享状态；流断开后自动重新订阅
//! - [`command_loop`]：按 FIFO 顺序执行命令队列中的请求

use crate::command::BridgeCommand;
use crate::completion::AbandonReason;
use crate::connection::ConnectionState;
use crate::metrics::BridgeMetrics;
use crate::state::BridgeContext;
use crate::transport::{BridgeTransport, TelemetryStream};
use crossbeam_channel::Receiver;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use thymio_protocol::{STATE_FIELD_COUNT, TelemetryFrame, decode_stream_line};
use tracing::{debug, error, info, trace, warn};

/// 事件流结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    /// 对端关闭或读取出错
    Closed,
    /// 会话已被 `connect()`/`disconnect()` 取代
    Superseded,
}

/// 遥测线程主循环
///
/// # 参数
/// - `transport`: 传输层
/// - `ctx`: 共享状态上下文
/// - `path`: 事件流路径（`/nodes/{node}/events`）
/// - `generation`: 本线程所属的会话代次
/// - `reconnect_delay`: 流关闭后重新订阅前的等待
/// - `subscribe_retry`: 订阅失败后重试前的等待
///
/// 代次失效后（`disconnect()` 或新的 `connect()`）在下一行或下一次重试前退出。
pub fn telemetry_loop(
    transport: Arc<dyn BridgeTransport>,
    ctx: Arc<BridgeContext>,
    path: String,
    generation: u64,
    reconnect_delay: Duration,
    subscribe_retry: Duration,
) {
    loop {
        if !ctx.transition(generation, ConnectionState::Connecting) {
            break;
        }

        match transport.subscribe(&path) {
            Ok(stream) => {
                if !ctx.transition(generation, ConnectionState::Connected) {
                    break;
                }
                info!("Subscribed to event stream {}", path);

                if read_stream(stream, &ctx, generation) == StreamEnd::Superseded {
                    break;
                }

                if !ctx.transition(generation, ConnectionState::Disconnected) {
                    break;
                }
                ctx.completion.abandon(AbandonReason::Disconnected);
                BridgeMetrics::bump(&ctx.metrics.reconnects);

                if !ctx.pause(generation, reconnect_delay) {
                    break;
                }
                debug!("Re-subscribing to {}", path);
            },
            Err(e) => {
                warn!("Failed to subscribe to {}: {}", path, e);
                BridgeMetrics::bump(&ctx.metrics.subscribe_failures);
                if !ctx.transition(generation, ConnectionState::Disconnected) {
                    break;
                }
                ctx.completion.abandon(AbandonReason::Disconnected);
                if !ctx.pause(generation, subscribe_retry) {
                    break;
                }
            },
        }
    }

    trace!("Telemetry thread (session {}): loop exited", generation);
}

fn read_stream(stream: TelemetryStream, ctx: &BridgeContext, generation: u64) -> StreamEnd {
    for line in stream.lines() {
        if !ctx.is_current(generation) {
            trace!("Telemetry thread: session {} superseded", generation);
            return StreamEnd::Superseded;
        }
        match line {
            Ok(line) => handle_stream_line(ctx, &line),
            Err(e) => {
                warn!("Event stream read error: {}", e);
                return StreamEnd::Closed;
            },
        }
    }

    if !ctx.is_current(generation) {
        return StreamEnd::Superseded;
    }
    info!("Event stream closed by bridge");
    StreamEnd::Closed
}

/// 处理事件流中的一行
///
/// 1. 解码 SSE 行，空行和非数据字段忽略
/// 2. 完整状态更新存入 `latest`；字段不足的状态更新丢弃
/// 3. 其它消息按事件处理并记录
/// 4. 每条消息都交给完成槽位和钩子
pub fn handle_stream_line(ctx: &BridgeContext, line: &str) {
    let Some(payload) = decode_stream_line(line) else {
        return;
    };
    let Ok(frame) = payload.parse::<TelemetryFrame>() else {
        return;
    };
    let frame = Arc::new(frame);
    BridgeMetrics::bump(&ctx.metrics.messages_total);

    if frame.is_state_update() {
        if frame.is_complete_state() {
            ctx.store_state(frame.clone());
            BridgeMetrics::bump(&ctx.metrics.state_updates);
        } else {
            warn!(
                "Dropping state update with {} tokens (expected {})",
                frame.len(),
                STATE_FIELD_COUNT
            );
            BridgeMetrics::bump(&ctx.metrics.malformed_frames);
        }
    } else {
        info!("Thymio emitted: {}", frame.to_message());
        BridgeMetrics::bump(&ctx.metrics.event_frames);
    }

    if ctx.completion.offer(&frame) {
        BridgeMetrics::bump(&ctx.metrics.motions_completed);
    }

    if let Some(hooks) = ctx.hooks.try_read() {
        hooks.trigger_all(&frame);
    }
}

/// 命令线程主循环
///
/// 命令按入队顺序逐条执行；上一条往返完成后才发送下一条。
/// 所有发送端被释放后退出。
pub fn command_loop(
    transport: Arc<dyn BridgeTransport>,
    cmd_rx: Receiver<BridgeCommand>,
    ctx: Arc<BridgeContext>,
) {
    while let Ok(command) = cmd_rx.recv() {
        let BridgeCommand { request, on_reply } = command;
        let result = transport.execute(&request);

        match &result {
            Ok(reply) => {
                BridgeMetrics::bump(&ctx.metrics.commands_sent);
                if reply.is_success() {
                    trace!("{} {} -> {}", request.method, request.path, reply.status);
                } else {
                    warn!(
                        "Bridge answered {} {} with status {}",
                        request.method, request.path, reply.status
                    );
                }
                if let Some(hooks) = ctx.hooks.try_read() {
                    hooks.trigger_all_sent(&request);
                }
            },
            Err(e) => {
                error!("Command thread: {} {} failed: {}", request.method, request.path, e);
                BridgeMetrics::bump(&ctx.metrics.command_failures);
            },
        }

        if let Some(on_reply) = on_reply {
            on_reply(result);
        }
    }

    trace!("Command thread: command channel disconnected, loop exited");
}
