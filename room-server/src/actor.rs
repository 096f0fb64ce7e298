//! 房间事件与房间注册表
//!
//! 每个房间是一个独占写者：一条事件通道把 打开/消息/关闭 串行化进
//! 单个 tokio 任务，任务内部从加载到落盘到广播一气呵成。房间之间
//! 完全并行，互不可见。

use std::collections::HashMap;

use tokio::sync::{mpsc, Mutex};
use tracing::info;

use protocol::RoomKind;

use crate::fanout::{ConnId, Outbound};
use crate::gomoku::GomokuRoom;
use crate::relay::RelayRoom;
use crate::storage::Storage;
use crate::xiangqi::XiangqiRoom;

/// 房间事件通道容量
const EVENT_CAPACITY: usize = 64;

/// 连接出站通道容量
pub const OUTBOUND_CAPACITY: usize = 256;

/// 路由进房间的三类事件
#[derive(Debug)]
pub enum RoomEvent {
    /// 连接建立，携带出站通道与入座参数
    Open {
        conn: ConnId,
        tx: mpsc::Sender<Outbound>,
        token: String,
        want: String,
    },
    /// 收到一帧文本
    Inbound { conn: ConnId, text: String },
    /// 传输层关闭
    Closed { conn: ConnId },
}

/// 当前毫秒时间戳
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 房间注册表：路由键 -> 房间事件入口，懒创建且常驻
pub struct Registry {
    storage: Storage,
    rooms: Mutex<HashMap<String, mpsc::Sender<RoomEvent>>>,
}

impl Registry {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// 取得指定房间的事件入口，不存在则启动新的房间任务
    pub async fn room(&self, kind: RoomKind, key: String) -> mpsc::Sender<RoomEvent> {
        let mut rooms = self.rooms.lock().await;
        if let Some(tx) = rooms.get(&key) {
            return tx.clone();
        }

        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        info!(room = %key, kind = kind.as_str(), "创建房间");
        match kind {
            RoomKind::Gomoku => {
                let room = GomokuRoom::new(key.clone(), self.storage.clone());
                tokio::spawn(room.run(rx));
            }
            RoomKind::Xiangqi => {
                let room = XiangqiRoom::new(key.clone(), self.storage.clone());
                tokio::spawn(room.run(rx));
            }
            RoomKind::Relay => {
                let room = RelayRoom::new(key.clone());
                tokio::spawn(room.run(rx));
            }
        }
        rooms.insert(key, tx.clone());
        tx
    }
}
