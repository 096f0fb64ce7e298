//! 对局房间服务端
//!
//! 包含:
//! - 房间注册表与单写者房间任务
//! - 座位分配（令牌回座 / 宽限期抢占）
//! - 连接扇出与重复连接顶替
//! - 五子棋 / 象棋 / 中继三类房间
//! - 房间记录存储

pub mod actor;
pub mod fanout;
pub mod gomoku;
pub mod relay;
pub mod router;
pub mod seat;
pub mod storage;
pub mod xiangqi;

pub use actor::{Registry, RoomEvent};
pub use fanout::{Attachment, ConnId, FanOut, Outbound};
pub use gomoku::GomokuRoom;
pub use relay::RelayRoom;
pub use seat::{allocate, SeatDecision, Want};
pub use storage::Storage;
pub use xiangqi::XiangqiRoom;
