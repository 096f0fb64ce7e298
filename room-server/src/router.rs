//! HTTP 升级入口与房间路由
//!
//! - `GET /ws?room=` 升级后接入五子棋房间
//! - `GET /relay?room=&game=&token=&want=` 按 game 参数接入象棋或中继房间
//! - 其余路径一律返回 `200 OK`
//!
//! 路由键即房间身份：五子棋为 `gm:{room}`，象棋为 `xq:{room}`，
//! 中继为 `{game}:{room}`，整个进程内一键对应一个房间任务。

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;
use uuid::Uuid;

use protocol::{RoomKind, DEFAULT_ROOM};

use crate::actor::{Registry, RoomEvent, OUTBOUND_CAPACITY};
use crate::fanout::Outbound;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

/// 组装路由表
pub fn app(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/ws", get(gomoku_ws))
        .route("/relay", get(relay_ws))
        .fallback(ok)
        .with_state(AppState { registry })
}

async fn ok() -> &'static str {
    "OK"
}

/// 从查询参数中取房间标识与入座参数
fn conn_params(params: &HashMap<String, String>) -> (String, String, String) {
    let room = params
        .get("room")
        .filter(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| DEFAULT_ROOM.to_string());
    let token = params.get("token").cloned().unwrap_or_default();
    let want = params.get("want").cloned().unwrap_or_default();
    (room, token, want)
}

/// 推导 /relay 入口的房间类型与路由键
pub fn relay_target(game: &str, room: &str) -> (RoomKind, String) {
    let game = if game.is_empty() { "relay" } else { game };
    if game == "xq" {
        (RoomKind::Xiangqi, format!("xq:{}", room))
    } else {
        (RoomKind::Relay, format!("{}:{}", game, room))
    }
}

async fn gomoku_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Ok(ws) = ws else {
        return (StatusCode::UPGRADE_REQUIRED, "Upgrade Required").into_response();
    };

    let (room, token, want) = conn_params(&params);
    let key = format!("gm:{}", room);
    let room_tx = state.registry.room(RoomKind::Gomoku, key).await;
    ws.on_upgrade(move |socket| pump(socket, room_tx, token, want))
}

async fn relay_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Ok(ws) = ws else {
        return (StatusCode::UPGRADE_REQUIRED, "Upgrade Required").into_response();
    };

    let (room, token, want) = conn_params(&params);
    let game = params.get("game").cloned().unwrap_or_default();
    let (kind, key) = relay_target(&game, &room);
    let room_tx = state.registry.room(kind, key).await;
    ws.on_upgrade(move |socket| pump(socket, room_tx, token, want))
}

/// 连接泵：一侧转发房间出站帧，一侧把入站文本交给房间事件通道
async fn pump(
    mut socket: WebSocket,
    room: mpsc::Sender<RoomEvent>,
    token: String,
    want: String,
) {
    let conn = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel::<Outbound>(OUTBOUND_CAPACITY);

    if room
        .send(RoomEvent::Open {
            conn,
            tx,
            token,
            want,
        })
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            out = rx.recv() => match out {
                Some(Outbound::Frame(text)) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close { code, reason }) => {
                    let _ = socket
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await;
                    break;
                }
                None => break,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if room
                        .send(RoomEvent::Inbound {
                            conn,
                            text: text.to_string(),
                        })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }

    // 传输层收尾事件；被顶替的连接此时在房间里已无记录，是空操作
    let _ = room.send(RoomEvent::Closed { conn }).await;
}
