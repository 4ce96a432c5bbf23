//! MotionCommander（运动控制）
//!
//! 所有运动操作都是异步的：立即返回一个 [`MotionHandle`]，运动结束时解决。
//!
//! - 排队运动：机器人发出 `Q_motion_noneleft` 时解决
//! - 直接电机指令（距离为 0 的蠕行、速度给定但距离为 0 等）：右电机指令确认后解决
//!
//! 命令线程按 FIFO 执行，右电机指令总是在左电机指令往返完成后才发出。

use crate::error::Result;
use crate::types::MotorSelection;
use std::sync::Arc;
use thymio_driver::{AbandonReason, Completion, MotionHandle, ThymioBridge};
use thymio_protocol::{
    ActionRequest, MotionPlan, plan_arc, plan_move, plan_move_with_speed, plan_move_with_time,
    plan_turn, plan_turn_with_speed, plan_turn_with_time,
};
use tracing::debug;

/// 运动控制器
#[derive(Clone)]
pub struct MotionCommander {
    bridge: Arc<ThymioBridge>,
}

impl MotionCommander {
    pub(crate) fn new(bridge: Arc<ThymioBridge>) -> Self {
        Self { bridge }
    }

    /// 执行一个运动规划
    pub fn execute(&self, plan: MotionPlan) -> Result<MotionHandle> {
        match plan {
            MotionPlan::Queued(motion) => {
                debug!(
                    "Queue motion: {} ticks, left {}, right {}",
                    motion.duration_ticks, motion.left, motion.right
                );
                Ok(self.bridge.queue_motion(motion)?)
            },
            MotionPlan::Direct { left, right } => {
                let (handle, resolve) =
                    MotionHandle::channel(self.bridge.config().completion_timeout());
                self.bridge.send_action(ActionRequest::motor_left(left))?;
                self.bridge
                    .send_action_then(ActionRequest::motor_right(right), move |result| {
                        resolve(match result {
                            Ok(_) => Completion::Completed,
                            Err(_) => Completion::Abandoned(AbandonReason::RequestFailed),
                        })
                    })?;
                Ok(handle)
            },
        }
    }

    /// 直线移动（mm），速度按距离自动选择
    pub fn move_by(&self, distance: f64) -> Result<MotionHandle> {
        self.execute(plan_move(distance))
    }

    /// 以给定速度（mm/s）直线移动
    pub fn move_with_speed(&self, distance: f64, speed: f64) -> Result<MotionHandle> {
        self.execute(plan_move_with_speed(distance, speed))
    }

    /// 在给定时间（秒）内直线移动
    pub fn move_with_time(&self, distance: f64, seconds: f64) -> Result<MotionHandle> {
        self.execute(plan_move_with_time(distance, seconds))
    }

    /// 原地转向（度），正角度向右
    pub fn turn(&self, angle: f64) -> Result<MotionHandle> {
        self.execute(plan_turn(angle))
    }

    pub fn turn_with_speed(&self, angle: f64, speed: f64) -> Result<MotionHandle> {
        self.execute(plan_turn_with_speed(angle, speed))
    }

    pub fn turn_with_time(&self, angle: f64, seconds: f64) -> Result<MotionHandle> {
        self.execute(plan_turn_with_time(angle, seconds))
    }

    /// 沿半径 `radius`（mm）的圆弧转过 `angle`（度）
    pub fn arc(&self, radius: f64, angle: f64) -> Result<MotionHandle> {
        self.execute(plan_arc(radius, angle))
    }

    // ==================== 电机 ====================

    /// 设置电机速度（Aseba 单位，钳位到 ±500）
    pub fn set_motor(&self, motor: MotorSelection, velocity: f64) -> Result<()> {
        debug!("Set motor {} to {}", motor, velocity);
        match motor {
            MotorSelection::Left => self.bridge.send_action(ActionRequest::motor_left(velocity))?,
            MotorSelection::Right => {
                self.bridge.send_action(ActionRequest::motor_right(velocity))?
            },
            MotorSelection::All => {
                self.bridge.send_action(ActionRequest::motor_left(velocity))?;
                self.bridge.send_action(ActionRequest::motor_right(velocity))?;
            },
        }
        Ok(())
    }

    pub fn stop_motors(&self) -> Result<()> {
        self.set_motor(MotorSelection::All, 0.0)
    }

    /// 重置里程计
    pub fn set_odometer(&self, theta: f64, x: f64, y: f64) -> Result<()> {
        Ok(self
            .bridge
            .send_action(ActionRequest::set_odometer(theta, x, y))?)
    }
}
