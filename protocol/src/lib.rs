//! 对局房间共享协议库
//!
//! 包含:
//! - 象棋棋子、棋盘、走法生成与规则判定
//! - 五子棋棋盘与连五判定
//! - 房间持久化记录模型（座位令牌、走法、投票）
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 局面记号 (FEN) 解析

mod board;
mod constants;
mod engine;
mod error;
mod fen;
mod gomoku;
mod message;
mod piece;
mod room;

pub use board::Board;
pub use constants::*;
pub use engine::{
    find_legal_move, generate_legal, generate_pseudo_legal, is_checked, terminal_reason, Engine,
    EngineMove,
};
pub use error::RuleError;
pub use fen::{Fen, INITIAL_FEN};
pub use gomoku::GomokuBoard;
pub use message::{
    ClientMessage, Coord, GmSeatState, MoveList, SeatState, ServerMessage, VoteState, XqSeatState,
};
pub use piece::{Color, Piece, PieceKind, Pos};
pub use room::{
    color_of_role, opponent_role, GomokuMove, Role, RoomKind, RoomRecord, VoteMap, XqMove,
    SEAT_A, SEAT_B, SPECTATOR,
};
