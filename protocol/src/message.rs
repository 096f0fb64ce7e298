//! 消息类型定义
//!
//! 双向均为单帧 UTF-8 JSON 对象，以 `type` 字段区分。服务端对未知
//! 或无法解析的入站消息一律静默丢弃。

use serde::{Deserialize, Serialize};

use crate::piece::Pos;
use crate::room::{GomokuMove, Role, VoteMap, XqMove};

/// 入站坐标（允许越界值，由房间处理器拒绝）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coord {
    pub r: i32,
    pub c: i32,
}

impl Coord {
    /// 在指定行列数内时转换为棋盘坐标
    pub fn to_pos(&self, rows: i32, cols: i32) -> Option<Pos> {
        if self.r >= 0 && self.r < rows && self.c >= 0 && self.c < cols {
            Some(Pos::new_unchecked(self.r as u8, self.c as u8))
        } else {
            None
        }
    }
}

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    // === 五子棋 ===
    /// 落子
    Move { r: i32, c: i32 },
    /// 己方超时认负
    Timeout,
    /// 请求再来一局
    Rematch,
    /// 请求交换执子
    Swap,
    /// 主动让出座位
    #[serde(rename = "gm_leave", alias = "leave")]
    GmLeave,

    // === 象棋 ===
    /// 走棋
    XqMove { from: Coord, to: Coord },
    /// 己方超时认负
    XqTimeout,
    /// 请求再来一局
    XqRematch,
    /// 请求交换执子
    XqSwap,
    /// 主动让出座位
    XqLeave,
}

/// 座位占用情况（五子棋）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmSeatState {
    pub black: bool,
    pub white: bool,
}

/// 座位占用情况（象棋）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XqSeatState {
    pub red: bool,
    pub black: bool,
}

/// 进入 `init` 消息的座位占用情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeatState {
    Gomoku(GmSeatState),
    Xiangqi(XqSeatState),
}

/// 进入 `init` / `state` 消息的走法列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveList {
    Gomoku(Vec<GomokuMove>),
    Xiangqi(Vec<XqMove>),
}

/// `serde` 的内部标记枚举通过 `Content` 缓冲反序列化嵌套字段，该缓冲区
/// 无法把字符串形式的 map key 还原成非字符串类型，因此 `VoteMap`
/// （`BTreeMap<Role, bool>`）在 `ServerMessage` 内需要手动把 key 从
/// 字符串解析回 `Role`。序列化侧不受影响，沿用默认实现。
fn deserialize_vote_map<'de, D>(deserializer: D) -> Result<VoteMap, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let map: std::collections::BTreeMap<String, bool> = Deserialize::deserialize(deserializer)?;
    map.into_iter()
        .map(|(k, v)| {
            k.parse::<Role>()
                .map(|k| (k, v))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

/// 两张投票表的当前状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteState {
    #[serde(deserialize_with = "deserialize_vote_map")]
    pub rematch: VoteMap,
    #[serde(deserialize_with = "deserialize_vote_map")]
    pub swap: VoteMap,
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 定向：连接建立或状态重同步
    Init {
        you: Role,
        token: String,
        moves: MoveList,
        current: Role,
        #[serde(rename = "gameOver")]
        game_over: bool,
        winner: Role,
        reason: String,
        seats: SeatState,
        votes: VoteState,
    },

    /// 定向：交换执子后告知新角色
    Role { you: Role },

    /// 广播：在线连接数变化
    Presence { n: usize },

    /// 广播：五子棋座位变化
    GmSeats { seats: GmSeatState },

    /// 广播：象棋座位变化
    XqSeats { seats: XqSeatState },

    /// 广播：五子棋落子被接受（超时判负时 r/c 为 -1）
    Move {
        r: i32,
        c: i32,
        p: Role,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        win: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// 广播：象棋走棋被接受
    XqMove {
        from: Pos,
        to: Pos,
        p: Role,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        win: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// 广播：象棋对局终结
    XqOver { winner: Role, reason: String },

    /// 广播：五子棋重置后的全量状态
    State {
        moves: Vec<GomokuMove>,
        current: Role,
        #[serde(rename = "gameOver")]
        game_over: bool,
    },

    /// 广播：象棋对局重置（reason 为 "rematch" 或 "swap"）
    XqReset {
        reason: String,
        current: Role,
        moves: Vec<XqMove>,
    },

    /// 广播：一方已投再来一局票
    RematchPending,

    /// 广播：一方已投交换执子票
    SwapPending,

    /// 广播：一方已投再来一局票（象棋）
    XqRematchPending,

    /// 广播：一方已投交换执子票（象棋）
    XqSwapPending,

    /// 广播：投票状态变化
    Votes { votes: VoteState },

    /// 广播：投票状态变化（象棋）
    XqVotes { votes: VoteState },

    /// 定向：动作被拒绝
    Reject { reason: String },
}
