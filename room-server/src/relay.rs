//! 消息中继房间
//!
//! 无状态：不落盘、不鉴权、不限速。入站 JSON 原样广播给房间内
//! 所有连接（含发送者），只额外维护在线人数广播。

use tokio::sync::mpsc;
use tracing::info;

use protocol::{RoomKind, ServerMessage};

use crate::actor::RoomEvent;
use crate::fanout::{Attachment, ConnId, FanOut, Outbound};

pub struct RelayRoom {
    key: String,
    clients: FanOut,
}

impl RelayRoom {
    pub fn new(key: String) -> Self {
        Self {
            key,
            clients: FanOut::new(),
        }
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<RoomEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                RoomEvent::Open { conn, tx, .. } => self.on_open(conn, tx),
                RoomEvent::Inbound { conn, text } => self.on_message(conn, &text),
                RoomEvent::Closed { conn } => self.on_close(conn),
            }
        }
    }

    pub fn on_open(&mut self, conn: ConnId, tx: mpsc::Sender<Outbound>) {
        self.clients
            .admit(conn, tx, Attachment::spectator(RoomKind::Relay));
        self.broadcast_presence();
        info!(room = %self.key, "连接加入");
    }

    pub fn on_message(&mut self, _conn: ConnId, text: &str) {
        // 只要求是合法 JSON，其余不做任何解释
        if serde_json::from_str::<serde_json::Value>(text).is_ok() {
            self.clients.broadcast_text(text);
        }
    }

    pub fn on_close(&mut self, conn: ConnId) {
        if self.clients.remove(conn).is_some() {
            self.broadcast_presence();
        }
    }

    fn broadcast_presence(&self) {
        self.clients.broadcast(&ServerMessage::Presence {
            n: self.clients.count(),
        });
    }
}
