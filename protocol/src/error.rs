//! 错误类型定义

use thiserror::Error;

/// 象棋规则错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// 不是该方的回合
    #[error("not your turn")]
    NotYourTurn,

    /// 走法不合法（包括起点无子、目标不可达、走后被将军）
    #[error("illegal move: ({0}, {1}) -> ({2}, {3})")]
    IllegalMove(u8, u8, u8, u8),

    /// 无效的 FEN 字符串
    #[error("invalid FEN string: {reason}")]
    InvalidFen { reason: String },
}
