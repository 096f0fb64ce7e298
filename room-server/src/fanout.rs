//! 房间内连接集合与消息扇出
//!
//! 每条连接挂一份席位凭据（attachment）。凭据不是身份缓存：处理
//! 消息时总是拿其中的令牌对照当前房间记录重新推导角色，座位被
//! 抢占后旧连接立即失去权限而无须动它的套接字。

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use protocol::{Role, RoomKind, ServerMessage, SPECTATOR};

/// 连接标识
pub type ConnId = Uuid;

/// 出站帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// 一帧 JSON 文本
    Frame(String),
    /// 要求传输层以指定状态码关闭连接
    Close { code: u16, reason: &'static str },
}

/// 每条连接的席位凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: RoomKind,
    pub role: Role,
    pub token: String,
}

impl Attachment {
    /// 观战者凭据
    pub fn spectator(kind: RoomKind) -> Self {
        Self {
            kind,
            role: SPECTATOR,
            token: String::new(),
        }
    }
}

/// 一条已接入的连接
#[derive(Debug)]
pub struct Client {
    tx: mpsc::Sender<Outbound>,
    pub attachment: Attachment,
}

/// 房间内的连接集合
#[derive(Debug, Default)]
pub struct FanOut {
    clients: HashMap<ConnId, Client>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接入连接
    pub fn admit(&mut self, conn: ConnId, tx: mpsc::Sender<Outbound>, attachment: Attachment) {
        self.clients.insert(conn, Client { tx, attachment });
    }

    /// 移除连接
    pub fn remove(&mut self, conn: ConnId) -> Option<Client> {
        self.clients.remove(&conn)
    }

    /// 获取连接凭据
    pub fn attachment(&self, conn: ConnId) -> Option<&Attachment> {
        self.clients.get(&conn).map(|c| &c.attachment)
    }

    /// 获取连接凭据（可变）
    pub fn attachment_mut(&mut self, conn: ConnId) -> Option<&mut Attachment> {
        self.clients.get_mut(&conn).map(|c| &mut c.attachment)
    }

    /// 当前连接数
    pub fn count(&self) -> usize {
        self.clients.len()
    }

    /// 当前连接标识快照
    pub fn conn_ids(&self) -> Vec<ConnId> {
        self.clients.keys().copied().collect()
    }

    /// 遍历所有连接凭据
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.clients.values().map(|c| &c.attachment)
    }

    /// 查找持有指定令牌的另一条连接
    pub fn find_token(&self, token: &str, except: ConnId) -> Option<ConnId> {
        if token.is_empty() {
            return None;
        }
        self.clients
            .iter()
            .find(|(id, c)| **id != except && c.attachment.token == token)
            .map(|(id, _)| *id)
    }

    /// 定向发送一条消息
    pub fn send(&self, conn: ConnId, msg: &ServerMessage) {
        if let Some(json) = encode(msg) {
            if let Some(client) = self.clients.get(&conn) {
                // 慢客户端塞满队列时按传输故障丢弃
                let _ = client.tx.try_send(Outbound::Frame(json));
            }
        }
    }

    /// 广播一条消息给所有连接
    pub fn broadcast(&self, msg: &ServerMessage) {
        if let Some(json) = encode(msg) {
            self.broadcast_text(&json);
        }
    }

    /// 广播一帧原文（中继房间原样转发时使用）
    pub fn broadcast_text(&self, text: &str) {
        for client in self.clients.values() {
            let _ = client.tx.try_send(Outbound::Frame(text.to_string()));
        }
    }

    /// 关闭一条连接并将其移出集合
    pub fn close(&mut self, conn: ConnId, code: u16, reason: &'static str) {
        if let Some(client) = self.clients.remove(&conn) {
            let _ = client.tx.try_send(Outbound::Close { code, reason });
        }
    }

    /// 关闭所有连接（交换执子后强制重连时使用）
    pub fn close_all(&mut self, code: u16, reason: &'static str) {
        for (_, client) in self.clients.drain() {
            let _ = client.tx.try_send(Outbound::Close { code, reason });
        }
    }
}

fn encode(msg: &ServerMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "序列化出站消息失败");
            None
        }
    }
}
