//! 协议常量定义

/// 象棋棋盘行数
pub const XQ_ROWS: usize = 10;

/// 象棋棋盘列数
pub const XQ_COLS: usize = 9;

/// 五子棋棋盘边长
pub const GOMOKU_SIZE: usize = 19;

/// 座位宽限期（毫秒）- 空闲超过此时间的座位才可被抢占
pub const GRACE_MS: i64 = 3 * 60 * 1000;

/// 默认服务端口
pub const DEFAULT_PORT: u16 = 8787;

/// 默认房间名
pub const DEFAULT_ROOM: &str = "default";

/// 五子棋房间记录的存储键
pub const GM_ROOM_KEY: &str = "gm_room";

/// 象棋房间记录的存储键
pub const XQ_ROOM_KEY: &str = "xq_room";

/// 五子棋胜因：五连
pub const REASON_FIVE: &str = "五连";

/// 象棋胜因：将死
pub const REASON_CHECKMATE: &str = "绝杀";

/// 象棋胜因：困毙（无子可动但未被将军）
pub const REASON_STALEMATE: &str = "困毙";

/// 超时判负
pub const REASON_TIMEOUT: &str = "超时判负";
