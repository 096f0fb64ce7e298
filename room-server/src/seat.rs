//! 座位分配
//!
//! 连接建立时根据出示的令牌与偏好决定：凭令牌回到原座、占用空座、
//! 抢占超过宽限期的弃座，或作为观战者接入。座位一旦占用不会因断线
//! 释放，只能被宽限期后的抢占或持有者主动离座清空。

use uuid::Uuid;

use protocol::{Role, RoomKind, RoomRecord, GRACE_MS, SEAT_A, SEAT_B, SPECTATOR};

/// 入座偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Want {
    /// 自动：先试 A 座再试 B 座
    Auto,
    /// 指定 A 座（五子棋黑方 / 象棋红方）
    SeatA,
    /// 指定 B 座（五子棋白方 / 象棋黑方）
    SeatB,
    /// 只观战
    Spectate,
}

impl Want {
    /// 解析查询参数，按房间类型识别颜色别名；无法识别按自动处理
    pub fn parse(raw: &str, kind: RoomKind) -> Want {
        let lower = raw.trim().to_ascii_lowercase();
        match lower.as_str() {
            "" | "auto" => Want::Auto,
            "spectate" | "watch" | "0" => Want::Spectate,
            "1" => Want::SeatA,
            "2" => Want::SeatB,
            "black" | "b" => match kind {
                // 五子棋黑方执先（A 座），象棋黑方为后手（B 座）
                RoomKind::Gomoku => Want::SeatA,
                _ => Want::SeatB,
            },
            "red" | "r" => Want::SeatA,
            "white" | "w" => Want::SeatB,
            _ => Want::Auto,
        }
    }
}

/// 分配结果：角色与随之下发的座位令牌（观战为空串）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatDecision {
    pub role: Role,
    pub token: String,
}

impl SeatDecision {
    fn spectator() -> Self {
        Self {
            role: SPECTATOR,
            token: String::new(),
        }
    }
}

/// 运行座位分配算法，必要时改写记录（回座刷新活动时间 / 占座发新令牌）
pub fn allocate<M>(
    record: &mut RoomRecord<M>,
    presented: &str,
    want: Want,
    online_a: usize,
    online_b: usize,
    now: i64,
) -> SeatDecision {
    // 1. 令牌匹配即回到原座
    if !presented.is_empty() {
        if presented == record.seat_token(SEAT_A) {
            record.touch(SEAT_A, now);
            return SeatDecision {
                role: SEAT_A,
                token: presented.to_string(),
            };
        }
        if presented == record.seat_token(SEAT_B) {
            record.touch(SEAT_B, now);
            return SeatDecision {
                role: SEAT_B,
                token: presented.to_string(),
            };
        }
    }

    // 2. 明确观战
    if want == Want::Spectate {
        return SeatDecision::spectator();
    }

    // 3. 弃座判定：有令牌、持有者不在线、空闲严格超过宽限期
    let can_steal_a = !record.seat_token(SEAT_A).is_empty()
        && online_a == 0
        && now - record.last_seen(SEAT_A) > GRACE_MS;
    let can_steal_b = !record.seat_token(SEAT_B).is_empty()
        && online_b == 0
        && now - record.last_seen(SEAT_B) > GRACE_MS;

    // 4/5. 按偏好依次尝试两个座位
    if matches!(want, Want::SeatA | Want::Auto)
        && (record.seat_token(SEAT_A).is_empty() || can_steal_a)
    {
        return assign(record, SEAT_A, now);
    }
    if matches!(want, Want::SeatB | Want::Auto)
        && (record.seat_token(SEAT_B).is_empty() || can_steal_b)
    {
        return assign(record, SEAT_B, now);
    }

    // 6. 无座可用
    SeatDecision::spectator()
}

fn assign<M>(record: &mut RoomRecord<M>, role: Role, now: i64) -> SeatDecision {
    let token = Uuid::new_v4().to_string();
    record.set_seat(role, token.clone(), now);
    SeatDecision { role, token }
}
