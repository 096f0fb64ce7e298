//! 房间记录模型
//!
//! 每个房间持久化一条记录：座位令牌、最近活动时间、走法列表、
//! 轮次与终局状态、再来一局 / 交换执子的投票。字段名与线上格式
//! 保持一致（camelCase），读取时容忍未知字段并以默认值补齐缺失字段。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::piece::{Color, Pos};

/// 座位角色：0 观战，1 为 A 座（五子棋黑方 / 象棋红方），2 为 B 座
pub type Role = u8;

/// 观战者
pub const SPECTATOR: Role = 0;
/// A 座（先手）
pub const SEAT_A: Role = 1;
/// B 座（后手）
pub const SEAT_B: Role = 2;

/// 获取对座角色
pub fn opponent_role(role: Role) -> Role {
    if role == SEAT_A {
        SEAT_B
    } else {
        SEAT_A
    }
}

/// 角色对应的象棋阵营
pub fn color_of_role(role: Role) -> Option<Color> {
    match role {
        SEAT_A => Some(Color::Red),
        SEAT_B => Some(Color::Black),
        _ => None,
    }
}

/// 房间类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    /// 五子棋
    Gomoku,
    /// 中国象棋
    Xiangqi,
    /// 消息中继
    Relay,
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::Gomoku => "gomoku",
            RoomKind::Xiangqi => "xiangqi",
            RoomKind::Relay => "relay",
        }
    }
}

/// 五子棋走法记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GomokuMove {
    pub r: u8,
    pub c: u8,
    pub p: Role,
}

/// 象棋走法记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XqMove {
    pub from: Pos,
    pub to: Pos,
    pub p: Role,
}

/// 投票表：角色 -> 是否同意
pub type VoteMap = BTreeMap<Role, bool>;

/// 房间持久化记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomRecord<M> {
    /// A 座令牌，空串表示无人占座
    pub token_a: String,
    /// B 座令牌
    pub token_b: String,
    /// A 座持有者最近一次 打开/关闭/走子 的毫秒时间戳，0 表示从未活动
    pub last_seen_a: i64,
    /// B 座持有者最近活动时间
    pub last_seen_b: i64,
    /// 已接受的走法，按顺序追加
    pub moves: Vec<M>,
    /// 当前轮到的角色
    pub current: Role,
    /// 对局是否结束
    pub game_over: bool,
    /// 胜方角色，0 表示无
    pub winner: Role,
    /// 终局原因
    pub reason: String,
    /// 再来一局投票
    pub rematch: VoteMap,
    /// 交换执子投票
    pub swap: VoteMap,
}

impl<M> Default for RoomRecord<M> {
    fn default() -> Self {
        Self {
            token_a: String::new(),
            token_b: String::new(),
            last_seen_a: 0,
            last_seen_b: 0,
            moves: Vec::new(),
            current: SEAT_A,
            game_over: false,
            winner: 0,
            reason: String::new(),
            rematch: VoteMap::new(),
            swap: VoteMap::new(),
        }
    }
}

impl<M> RoomRecord<M> {
    /// 令牌对应的角色；空令牌或不匹配返回观战
    ///
    /// 每条消息都通过当前记录重新推导角色，被抢占的旧令牌自动失效。
    pub fn role_for_token(&self, token: &str) -> Role {
        if token.is_empty() {
            return SPECTATOR;
        }
        if token == self.token_a {
            SEAT_A
        } else if token == self.token_b {
            SEAT_B
        } else {
            SPECTATOR
        }
    }

    /// 获取指定座位的令牌
    pub fn seat_token(&self, role: Role) -> &str {
        match role {
            SEAT_A => &self.token_a,
            SEAT_B => &self.token_b,
            _ => "",
        }
    }

    /// 占用指定座位
    pub fn set_seat(&mut self, role: Role, token: String, now: i64) {
        match role {
            SEAT_A => {
                self.token_a = token;
                self.last_seen_a = now;
            }
            SEAT_B => {
                self.token_b = token;
                self.last_seen_b = now;
            }
            _ => {}
        }
    }

    /// 清空指定座位
    pub fn clear_seat(&mut self, role: Role) {
        self.set_seat(role, String::new(), 0);
    }

    /// 刷新指定座位的活动时间
    pub fn touch(&mut self, role: Role, now: i64) {
        match role {
            SEAT_A => self.last_seen_a = now,
            SEAT_B => self.last_seen_b = now,
            _ => {}
        }
    }

    /// 获取指定座位的最近活动时间
    pub fn last_seen(&self, role: Role) -> i64 {
        match role {
            SEAT_A => self.last_seen_a,
            SEAT_B => self.last_seen_b,
            _ => 0,
        }
    }

    /// 两个座位是否都有人占用
    pub fn both_seated(&self) -> bool {
        !self.token_a.is_empty() && !self.token_b.is_empty()
    }

    /// 清空两张投票表（每次接受走法和每次重置时调用）
    pub fn clear_votes(&mut self) {
        self.rematch.clear();
        self.swap.clear();
    }

    /// 投票表是否已集齐双方同意
    pub fn votes_complete(votes: &VoteMap) -> bool {
        votes.get(&SEAT_A).copied().unwrap_or(false) && votes.get(&SEAT_B).copied().unwrap_or(false)
    }

    /// 交换双方座位（令牌与活动时间一起交换）
    pub fn swap_seats(&mut self) {
        std::mem::swap(&mut self.token_a, &mut self.token_b);
        std::mem::swap(&mut self.last_seen_a, &mut self.last_seen_b);
    }

    /// 重置对局：清走法、回到 A 座先手、清终局与投票
    pub fn reset_game(&mut self) {
        self.moves.clear();
        self.current = SEAT_A;
        self.game_over = false;
        self.winner = 0;
        self.reason.clear();
        self.clear_votes();
    }
}
