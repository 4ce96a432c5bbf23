//! 运动规划
//!
//! 把用户层的距离（mm）、角度（度）、速度（mm/s）和时间（秒）换算为桥接运动原语：
//!
//! - [`MotionPlan::Queued`]：时长 + 左右轮速，执行完毕后机器人发出 `Q_motion_noneleft`
//! - [`MotionPlan::Direct`]：直接设置左右电机速度，没有结束事件
//!
//! 输入先向零截断为整数，再按固定的经验公式计算；所有函数都是纯函数。

use crate::constants::{MAX_SPEED_MM_S, SPEED_TO_VELOCITY, TICKS_PER_SECOND, TURN_ANGLE_FACTOR};
use crate::control::{QueuedMotion, to_wire_int};

/// 距离为 0 时的蠕行速度（mm/s）
pub const CREEP_SPEED_MM_S: f64 = 10.0;

/// 普通移动的速度范围（mm/s）
pub const MOVE_MIN_SPEED_MM_S: f64 = 20.0;
pub const MOVE_MAX_SPEED_MM_S: f64 = 150.0;

/// 大角度转向时的轮速与每度 tick 数
const TURN_FAST_VELOCITY: f64 = 208.0;
const TURN_FAST_TICKS_PER_DEGREE: f64 = 1.3;

/// 小角度转向时的轮速
const TURN_SLOW_VELOCITY: f64 = 137.6;

/// 弧线运动的最小半径（mm）与外轮速度
const ARC_MIN_RADIUS: f64 = 100.0;
const ARC_OUTER_VELOCITY: f64 = 400.0;

/// 一次运动的规划结果（速度为 Aseba 单位，尚未取整）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionPlan {
    /// 排队运动
    Queued(QueuedMotion),
    /// 直接电机指令（需要调用方钳位）
    Direct { left: f64, right: f64 },
}

impl MotionPlan {
    fn queued(duration_ticks: f64, left: f64, right: f64) -> Self {
        Self::Queued(QueuedMotion::new(duration_ticks, left, right))
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued(_))
    }
}

/// 整数截断（与线上取整一致）
fn int(value: f64) -> f64 {
    f64::from(to_wire_int(value))
}

/// 速度取绝对值并截断，再钳位到 ±156.25 mm/s 后截断
fn user_speed(speed: f64) -> f64 {
    int(int(speed.abs()).clamp(-MAX_SPEED_MM_S, MAX_SPEED_MM_S))
}

fn signed(value: f64, positive: bool) -> f64 {
    if positive { value } else { -value }
}

/// 直线移动给定距离（mm），速度随距离自动选择
///
/// 距离为 0 时以蠕行速度持续前进（直接电机指令）。
pub fn plan_move(distance: f64) -> MotionPlan {
    let mm = int(distance);
    if mm == 0.0 {
        let v = CREEP_SPEED_MM_S * SPEED_TO_VELOCITY;
        return MotionPlan::Direct { left: v, right: v };
    }

    let speed = mm.abs().clamp(MOVE_MIN_SPEED_MM_S, MOVE_MAX_SPEED_MM_S);
    let ticks = mm.abs() * TICKS_PER_SECOND / speed;
    let v = signed(speed * SPEED_TO_VELOCITY, mm > 0.0);
    MotionPlan::queued(ticks, v, v)
}

/// 以给定速度（mm/s）直线移动给定距离
///
/// 距离为 0 时以该速度持续前进。
pub fn plan_move_with_speed(distance: f64, speed: f64) -> MotionPlan {
    let mm = int(distance);
    let speed = user_speed(speed);
    let v = speed * SPEED_TO_VELOCITY;
    if mm == 0.0 {
        return MotionPlan::Direct { left: v, right: v };
    }

    let ticks = mm.abs() * TICKS_PER_SECOND / speed;
    let v = signed(v, mm > 0.0);
    MotionPlan::queued(ticks, v, v)
}

/// 在给定时间（秒）内直线移动给定距离
pub fn plan_move_with_time(distance: f64, seconds: f64) -> MotionPlan {
    let mm = int(distance);
    let time = int(seconds.abs());
    let speed = int(int(mm.abs() / time).clamp(-MAX_SPEED_MM_S, MAX_SPEED_MM_S));
    let ticks = time * TICKS_PER_SECOND;
    let v = signed(speed * SPEED_TO_VELOCITY, mm > 0.0);
    MotionPlan::queued(ticks, v, v)
}

/// 原地转向给定角度（度，正值向右）
///
/// 超过 90° 时使用固定轮速和线性时长；否则使用较慢轮速和经验二次公式。
pub fn plan_turn(angle: f64) -> MotionPlan {
    let a = int(angle);
    let (velocity, ticks) = if a.abs() > 90.0 {
        (TURN_FAST_VELOCITY, a.abs() * TURN_FAST_TICKS_PER_DEGREE)
    } else {
        (
            TURN_SLOW_VELOCITY,
            a * a * 2.0 / (a.abs() * 1.016 - 0.52),
        )
    };
    let right_turn = a > 0.0;
    MotionPlan::queued(
        ticks,
        signed(velocity, right_turn),
        signed(velocity, !right_turn),
    )
}

/// 以给定速度（mm/s）转向给定角度
///
/// 角度为 0 时以该速度持续原地旋转。
pub fn plan_turn_with_speed(angle: f64, speed: f64) -> MotionPlan {
    let a = int(angle) * TURN_ANGLE_FACTOR;
    let speed = user_speed(speed);
    let v = speed * SPEED_TO_VELOCITY;
    if a == 0.0 {
        return MotionPlan::Direct { left: v, right: -v };
    }

    let ticks = a.abs() * TICKS_PER_SECOND / speed;
    let right_turn = a > 0.0;
    MotionPlan::queued(ticks, signed(v, right_turn), signed(v, !right_turn))
}

/// 在给定时间（秒）内转向给定角度
pub fn plan_turn_with_time(angle: f64, seconds: f64) -> MotionPlan {
    let a = int(angle) * TURN_ANGLE_FACTOR;
    let time = int(seconds.abs());
    let v = a.abs() / time * SPEED_TO_VELOCITY;
    let ticks = time * TICKS_PER_SECOND;
    let right_turn = a > 0.0;
    MotionPlan::queued(ticks, signed(v, right_turn), signed(v, !right_turn))
}

/// 沿给定半径（mm）的圆弧转过给定角度（度）
///
/// 半径绝对值小于 100 时按 ±100 处理；负半径表示倒退。
/// 角度为负时时长也为负，原样发送给桥接。
pub fn plan_arc(radius: f64, angle: f64) -> MotionPlan {
    let a = int(angle);
    let mut r = int(radius);
    if r.abs() < ARC_MIN_RADIUS {
        r = if r < 0.0 { -ARC_MIN_RADIUS } else { ARC_MIN_RADIUS };
    }

    let ratio = (r.abs() - 95.0) * 10000.0 / r.abs();
    let ticks = a * (50.36 * r + 25.0) / 3600.0;

    let mut outer = ARC_OUTER_VELOCITY;
    let mut inner = outer * ratio / 10000.0;
    if r < 0.0 {
        outer = -outer;
        inner = -inner;
    }

    if a > 0.0 {
        MotionPlan::queued(ticks, outer, inner)
    } else {
        MotionPlan::queued(ticks, inner, outer)
    }
}
