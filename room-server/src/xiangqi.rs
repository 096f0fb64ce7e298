//! 象棋房间
//!
//! A 座执红先行。每步走棋都从走法列表重放引擎后校验，拒绝时
//! 附带一份完整 `init` 帮客户端重新对齐状态。换边成功后关闭
//! 全部连接，客户端凭（已互换座位的）旧令牌重连协商新身份。

use tokio::sync::mpsc;
use tracing::{error, info};

use protocol::{
    color_of_role, opponent_role, terminal_reason, ClientMessage, Coord, Engine, MoveList,
    Role, RoomKind, RoomRecord, RuleError, SeatState, ServerMessage, VoteState, XqMove,
    XqSeatState, REASON_TIMEOUT, SEAT_A, SEAT_B, SPECTATOR, XQ_COLS, XQ_ROOM_KEY, XQ_ROWS,
};

use crate::actor::{now_ms, RoomEvent};
use crate::fanout::{Attachment, ConnId, FanOut, Outbound};
use crate::seat::{self, Want};
use crate::storage::Storage;

pub struct XiangqiRoom {
    key: String,
    record: RoomRecord<XqMove>,
    clients: FanOut,
    storage: Storage,
}

impl XiangqiRoom {
    pub fn new(key: String, storage: Storage) -> Self {
        let record = storage.load_record(&key, XQ_ROOM_KEY);
        Self {
            key,
            record,
            clients: FanOut::new(),
            storage,
        }
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<RoomEvent>) {
        while let Some(event) = rx.recv().await {
            let now = now_ms();
            match event {
                RoomEvent::Open {
                    conn,
                    tx,
                    token,
                    want,
                } => self.on_open(conn, tx, &token, &want, now),
                RoomEvent::Inbound { conn, text } => self.on_message(conn, &text, now),
                RoomEvent::Closed { conn } => self.on_close(conn, now),
            }
        }
    }

    pub fn on_open(
        &mut self,
        conn: ConnId,
        tx: mpsc::Sender<Outbound>,
        token: &str,
        want: &str,
        now: i64,
    ) {
        self.clients
            .admit(conn, tx, Attachment::spectator(RoomKind::Xiangqi));

        let (online_a, online_b) = self.online_counts();
        let want = Want::parse(want, RoomKind::Xiangqi);
        let decision = seat::allocate(&mut self.record, token, want, online_a, online_b, now);

        if decision.role != SPECTATOR {
            if let Some(prior) = self.clients.find_token(&decision.token, conn) {
                self.clients.close(prior, 1000, "reconnect");
            }
        }

        if !self.persist() {
            return;
        }

        if let Some(att) = self.clients.attachment_mut(conn) {
            att.role = decision.role;
            att.token = decision.token.clone();
        }

        self.clients
            .send(conn, &self.init_msg(decision.role, &decision.token));
        self.broadcast_presence();
        self.clients.broadcast(&self.seats_msg());
        info!(room = %self.key, role = decision.role, "连接加入");
    }

    pub fn on_close(&mut self, conn: ConnId, now: i64) {
        let Some(client) = self.clients.remove(conn) else {
            return;
        };

        let role = self.record.role_for_token(&client.attachment.token);
        if role != SPECTATOR {
            self.record.touch(role, now);
            if !self.persist() {
                return;
            }
        }

        self.clients.broadcast(&self.seats_msg());
        self.broadcast_presence();
    }

    pub fn on_message(&mut self, conn: ConnId, text: &str, now: i64) {
        let Ok(msg) = serde_json::from_str::<ClientMessage>(text) else {
            return;
        };
        let Some(att) = self.clients.attachment(conn) else {
            return;
        };

        let token = att.token.clone();
        let role = self.record.role_for_token(&token);

        match msg {
            ClientMessage::XqMove { from, to } => self.handle_move(conn, role, &token, from, to, now),
            ClientMessage::XqTimeout => self.handle_timeout(conn, role, now),
            ClientMessage::XqRematch => self.handle_rematch(conn, role),
            ClientMessage::XqSwap => self.handle_swap(conn, role),
            ClientMessage::XqLeave => self.handle_leave(role),
            _ => {}
        }
    }

    fn handle_move(
        &mut self,
        conn: ConnId,
        role: Role,
        token: &str,
        from: Coord,
        to: Coord,
        now: i64,
    ) {
        if !is_player(role) {
            return self.reject(conn, "观战不能落子");
        }
        if self.record.game_over {
            return self.reject_sync(conn, role, token, "对局已结束");
        }

        let (rows, cols) = (XQ_ROWS as i32, XQ_COLS as i32);
        let (Some(from), Some(to)) = (from.to_pos(rows, cols), to.to_pos(rows, cols)) else {
            return self.reject_sync(conn, role, token, "落子越界");
        };

        // 引擎总是从走法列表重放，和客户端口径完全一致
        let mut engine = Engine::replay(self.record.moves.iter().map(|m| (m.from, m.to)));
        let Some(color) = color_of_role(role) else {
            return;
        };

        match engine.try_move(color, from, to) {
            Err(RuleError::NotYourTurn) => self.reject_sync(conn, role, token, "还没轮到你"),
            Err(_) => self.reject_sync(conn, role, token, "非法走法"),
            Ok(mv) => {
                engine.apply(mv.from, mv.to);
                self.record.moves.push(XqMove { from, to, p: role });
                self.record.touch(role, now);
                self.record.clear_votes();

                if let Some(reason) = terminal_reason(&engine.board, color) {
                    self.record.game_over = true;
                    self.record.winner = role;
                    self.record.reason = reason.to_string();
                    if !self.persist() {
                        return;
                    }
                    self.clients.broadcast(&ServerMessage::XqMove {
                        from,
                        to,
                        p: role,
                        next: None,
                        win: Some(role),
                        reason: Some(reason.to_string()),
                    });
                    self.clients.broadcast(&ServerMessage::XqOver {
                        winner: role,
                        reason: reason.to_string(),
                    });
                } else {
                    self.record.current = opponent_role(role);
                    if !self.persist() {
                        return;
                    }
                    self.clients.broadcast(&ServerMessage::XqMove {
                        from,
                        to,
                        p: role,
                        next: Some(self.record.current),
                        win: None,
                        reason: None,
                    });
                }
            }
        }
    }

    fn handle_timeout(&mut self, conn: ConnId, role: Role, now: i64) {
        if !is_player(role) {
            return self.reject(conn, "观战不能落子");
        }
        if self.record.game_over {
            return self.reject(conn, "对局已结束");
        }
        if self.record.current != role {
            return self.reject(conn, "还没轮到你");
        }

        let winner = opponent_role(role);
        self.record.game_over = true;
        self.record.winner = winner;
        self.record.reason = REASON_TIMEOUT.to_string();
        self.record.touch(role, now);
        if !self.persist() {
            return;
        }

        self.clients.broadcast(&ServerMessage::XqOver {
            winner,
            reason: REASON_TIMEOUT.to_string(),
        });
    }

    fn handle_rematch(&mut self, conn: ConnId, role: Role) {
        if !is_player(role) {
            return self.reject(conn, "观战不能落子");
        }
        if !self.record.game_over {
            return self.reject(conn, "对局尚未结束");
        }

        self.record.rematch.insert(role, true);

        if RoomRecord::<XqMove>::votes_complete(&self.record.rematch) && self.record.both_seated() {
            self.record.reset_game();
            if !self.persist() {
                return;
            }
            self.broadcast_reset("rematch");
            self.clients.broadcast(&self.votes_msg());
        } else {
            if !self.persist() {
                return;
            }
            self.clients.broadcast(&ServerMessage::XqRematchPending);
            self.clients.broadcast(&self.votes_msg());
        }
    }

    fn handle_swap(&mut self, conn: ConnId, role: Role) {
        if !is_player(role) {
            return self.reject(conn, "观战不能落子");
        }
        if !self.record.game_over && !self.record.moves.is_empty() {
            return self.reject(conn, "对局进行中不能换边");
        }

        self.record.swap.insert(role, true);

        if RoomRecord::<XqMove>::votes_complete(&self.record.swap) && self.record.both_seated() {
            self.record.swap_seats();
            self.record.reset_game();
            if !self.persist() {
                return;
            }

            self.clients.broadcast(&self.seats_msg());
            self.broadcast_reset("swap");
            self.clients.broadcast(&self.votes_msg());

            // 全员强制重连，令牌仍有效但座位已互换
            self.clients.close_all(1000, "swap");
        } else {
            if !self.persist() {
                return;
            }
            self.clients.broadcast(&ServerMessage::XqSwapPending);
            self.clients.broadcast(&self.votes_msg());
        }
    }

    fn handle_leave(&mut self, role: Role) {
        if role == SPECTATOR {
            return;
        }
        self.record.clear_seat(role);
        if !self.persist() {
            return;
        }

        self.clients.broadcast(&self.seats_msg());
        self.broadcast_presence();
    }

    fn reject(&self, conn: ConnId, reason: &str) {
        self.clients.send(
            conn,
            &ServerMessage::Reject {
                reason: reason.to_string(),
            },
        );
    }

    /// 拒绝并重发 init，帮落后的客户端重新同步
    fn reject_sync(&self, conn: ConnId, role: Role, token: &str, reason: &str) {
        self.reject(conn, reason);
        self.clients.send(conn, &self.init_msg(role, token));
    }

    fn online_counts(&self) -> (usize, usize) {
        let mut a = 0;
        let mut b = 0;
        for att in self.clients.attachments() {
            match self.record.role_for_token(&att.token) {
                SEAT_A => a += 1,
                SEAT_B => b += 1,
                _ => {}
            }
        }
        (a, b)
    }

    fn persist(&self) -> bool {
        match self.storage.put_record(&self.key, XQ_ROOM_KEY, &self.record) {
            Ok(()) => true,
            Err(e) => {
                error!(room = %self.key, error = %e, "写入房间记录失败");
                false
            }
        }
    }

    fn init_msg(&self, role: Role, token: &str) -> ServerMessage {
        ServerMessage::Init {
            you: role,
            token: if role == SPECTATOR {
                String::new()
            } else {
                token.to_string()
            },
            moves: MoveList::Xiangqi(self.record.moves.clone()),
            current: self.record.current,
            game_over: self.record.game_over,
            winner: self.record.winner,
            reason: self.record.reason.clone(),
            seats: SeatState::Xiangqi(self.seat_state()),
            votes: self.vote_state(),
        }
    }

    fn seat_state(&self) -> XqSeatState {
        XqSeatState {
            red: !self.record.token_a.is_empty(),
            black: !self.record.token_b.is_empty(),
        }
    }

    fn seats_msg(&self) -> ServerMessage {
        ServerMessage::XqSeats {
            seats: self.seat_state(),
        }
    }

    fn vote_state(&self) -> VoteState {
        VoteState {
            rematch: self.record.rematch.clone(),
            swap: self.record.swap.clone(),
        }
    }

    fn votes_msg(&self) -> ServerMessage {
        ServerMessage::XqVotes {
            votes: self.vote_state(),
        }
    }

    fn broadcast_reset(&self, reason: &str) {
        self.clients.broadcast(&ServerMessage::XqReset {
            reason: reason.to_string(),
            current: self.record.current,
            moves: self.record.moves.clone(),
        });
    }

    fn broadcast_presence(&self) {
        self.clients.broadcast(&ServerMessage::Presence {
            n: self.clients.count(),
        });
    }

    #[cfg(test)]
    pub fn record(&self) -> &RoomRecord<XqMove> {
        &self.record
    }
}

fn is_player(role: Role) -> bool {
    role == SEAT_A || role == SEAT_B
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::REASON_CHECKMATE;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn new_room() -> (XiangqiRoom, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path()).unwrap();
        (XiangqiRoom::new("xq:test".into(), storage), temp)
    }

    struct TestClient {
        conn: ConnId,
        rx: mpsc::Receiver<Outbound>,
    }

    impl TestClient {
        fn drain(&mut self) -> Vec<ServerMessage> {
            let mut msgs = Vec::new();
            while let Ok(out) = self.rx.try_recv() {
                if let Outbound::Frame(json) = out {
                    msgs.push(serde_json::from_str(&json).unwrap());
                }
            }
            msgs
        }

        fn drain_raw(&mut self) -> Vec<Outbound> {
            let mut out = Vec::new();
            while let Ok(o) = self.rx.try_recv() {
                out.push(o);
            }
            out
        }

        fn init(&mut self) -> (Role, String) {
            match self.drain().into_iter().next() {
                Some(ServerMessage::Init { you, token, .. }) => (you, token),
                other => panic!("expected init, got {:?}", other),
            }
        }
    }

    fn connect(room: &mut XiangqiRoom, token: &str, want: &str, now: i64) -> TestClient {
        let (tx, rx) = mpsc::channel(64);
        let conn = Uuid::new_v4();
        room.on_open(conn, tx, token, want, now);
        TestClient { conn, rx }
    }

    fn mv(room: &mut XiangqiRoom, client: &TestClient, from: (i32, i32), to: (i32, i32)) {
        let json = format!(
            r#"{{"type":"xq_move","from":{{"r":{},"c":{}}},"to":{{"r":{},"c":{}}}}}"#,
            from.0, from.1, to.0, to.1
        );
        room.on_message(client.conn, &json, 1);
    }

    /// 红方 9 步杀：车吃士闷杀，黑方士象马原位自堵、
    /// 过河兵封住将的出路，白脸将封住吃车的应法。
    const MATE_LINE: [((i32, i32), (i32, i32)); 17] = [
        ((9, 5), (8, 4)), // 红仕上中
        ((3, 0), (4, 0)),
        ((9, 4), (9, 5)), // 红帅平六
        ((4, 0), (5, 0)),
        ((6, 4), (5, 4)), // 红兵挺进
        ((5, 0), (5, 1)),
        ((5, 4), (4, 4)),
        ((3, 2), (4, 2)),
        ((4, 4), (3, 4)), // 兵吃卒
        ((4, 2), (5, 2)),
        ((3, 4), (2, 4)),
        ((5, 2), (5, 3)),
        ((9, 8), (8, 8)), // 红车起横
        ((3, 6), (4, 6)),
        ((8, 8), (8, 5)),
        ((3, 8), (4, 8)),
        ((8, 5), (0, 5)), // 车吃士，绝杀
    ];

    fn seated_pair(room: &mut XiangqiRoom) -> (TestClient, TestClient) {
        let mut red = connect(room, "", "red", 0);
        let mut black = connect(room, "", "black", 0);
        assert_eq!(red.init().0, SEAT_A);
        assert_eq!(black.init().0, SEAT_B);
        red.drain();
        black.drain();
        (red, black)
    }

    #[test]
    fn test_opening_move_broadcast() {
        let (mut room, _tmp) = new_room();
        let (red, mut black) = seated_pair(&mut room);

        // 炮二平五
        mv(&mut room, &red, (7, 7), (7, 4));

        let msgs = black.drain();
        assert!(msgs.iter().any(|m| matches!(
            m,
            ServerMessage::XqMove {
                p: SEAT_A,
                next: Some(SEAT_B),
                win: None,
                ..
            }
        )));
        assert_eq!(room.record().moves.len(), 1);
        assert_eq!(room.record().current, SEAT_B);
    }

    #[test]
    fn test_wrong_turn_rejected_with_resync() {
        let (mut room, _tmp) = new_room();
        let (mut red, mut black) = seated_pair(&mut room);

        // 黑方抢先：拒绝并重发 init，红方毫无感知
        mv(&mut room, &black, (2, 1), (2, 4));

        let msgs = black.drain();
        assert!(msgs.contains(&ServerMessage::Reject {
            reason: "还没轮到你".into()
        }));
        assert!(msgs.iter().any(|m| matches!(m, ServerMessage::Init { .. })));
        assert!(red.drain().is_empty());
        assert!(room.record().moves.is_empty());
    }

    #[test]
    fn test_illegal_elephant_cross_river_resync() {
        let (mut room, _tmp) = new_room();
        let (mut red, mut black) = seated_pair(&mut room);

        // 两个回合把红象送上河沿
        mv(&mut room, &red, (9, 2), (7, 0));
        mv(&mut room, &black, (3, 0), (4, 0));
        mv(&mut room, &red, (7, 0), (5, 2));
        mv(&mut room, &black, (4, 0), (5, 0));
        red.drain();
        black.drain();

        // 象从 (5,2) 过河到 (3,0)：非法，拒绝并重发 init
        mv(&mut room, &red, (5, 2), (3, 0));

        let msgs = red.drain();
        assert!(msgs.contains(&ServerMessage::Reject {
            reason: "非法走法".into()
        }));
        assert!(msgs.iter().any(|m| matches!(m, ServerMessage::Init { .. })));
        // 其他客户端看不到任何东西
        assert!(black.drain().is_empty());
        assert_eq!(room.record().moves.len(), 4);
    }

    #[test]
    fn test_out_of_bounds_rejected_before_engine() {
        let (mut room, _tmp) = new_room();
        let (mut red, _black) = seated_pair(&mut room);

        mv(&mut room, &red, (10, 0), (9, 0));
        let msgs = red.drain();
        assert!(msgs.contains(&ServerMessage::Reject {
            reason: "落子越界".into()
        }));

        mv(&mut room, &red, (7, 7), (7, -1));
        let msgs = red.drain();
        assert!(msgs.contains(&ServerMessage::Reject {
            reason: "落子越界".into()
        }));
    }

    #[test]
    fn test_checkmate_broadcasts_win_and_over() {
        let (mut room, _tmp) = new_room();
        let (mut red, mut black) = seated_pair(&mut room);

        for (i, (from, to)) in MATE_LINE.iter().enumerate() {
            let mover = if i % 2 == 0 { &red } else { &black };
            mv(&mut room, mover, *from, *to);
        }

        let msgs = black.drain();
        assert!(msgs.contains(&ServerMessage::XqMove {
            from: protocol::Pos::new_unchecked(8, 5),
            to: protocol::Pos::new_unchecked(0, 5),
            p: SEAT_A,
            next: None,
            win: Some(SEAT_A),
            reason: Some(REASON_CHECKMATE.into()),
        }));
        assert!(msgs.contains(&ServerMessage::XqOver {
            winner: SEAT_A,
            reason: REASON_CHECKMATE.into(),
        }));
        assert!(room.record().game_over);
        assert_eq!(room.record().winner, SEAT_A);

        // 终局后黑方走棋被拒
        mv(&mut room, &black, (0, 4), (1, 4));
        let msgs = black.drain();
        assert!(msgs.contains(&ServerMessage::Reject {
            reason: "对局已结束".into()
        }));
        let _ = red.drain();
    }

    #[test]
    fn test_replay_equals_incremental_after_game() {
        let (mut room, _tmp) = new_room();
        let (red, black) = seated_pair(&mut room);

        for (i, (from, to)) in MATE_LINE.iter().take(6).enumerate() {
            let mover = if i % 2 == 0 { &red } else { &black };
            mv(&mut room, mover, *from, *to);
        }

        // 服务端接受的走法重放出的局面是不动点
        let replayed = Engine::replay(room.record().moves.iter().map(|m| (m.from, m.to)));
        let again = Engine::replay(room.record().moves.iter().map(|m| (m.from, m.to)));
        assert_eq!(replayed, again);
        assert_eq!(room.record().moves.len(), 6);
    }

    #[test]
    fn test_timeout_broadcasts_over() {
        let (mut room, _tmp) = new_room();
        let (mut red, mut black) = seated_pair(&mut room);

        room.on_message(red.conn, r#"{"type":"xq_timeout"}"#, 1);

        let msgs = black.drain();
        assert!(msgs.contains(&ServerMessage::XqOver {
            winner: SEAT_B,
            reason: REASON_TIMEOUT.into(),
        }));
        assert!(room.record().game_over);
        let _ = red.drain();
    }

    #[test]
    fn test_rematch_resets_with_xq_reset() {
        let (mut room, _tmp) = new_room();
        let (mut red, mut black) = seated_pair(&mut room);

        room.on_message(red.conn, r#"{"type":"xq_timeout"}"#, 1);
        red.drain();
        black.drain();

        room.on_message(red.conn, r#"{"type":"xq_rematch"}"#, 2);
        let msgs = black.drain();
        assert!(msgs.contains(&ServerMessage::XqRematchPending));

        room.on_message(black.conn, r#"{"type":"xq_rematch"}"#, 3);
        let msgs = red.drain();
        assert!(msgs.contains(&ServerMessage::XqReset {
            reason: "rematch".into(),
            current: SEAT_A,
            moves: vec![],
        }));
        assert!(!room.record().game_over);
        assert!(room.record().rematch.is_empty());
    }

    #[test]
    fn test_swap_closes_all_with_swap_reason() {
        let (mut room, _tmp) = new_room();
        let (mut red, mut black) = seated_pair(&mut room);
        let token_red = room.record().token_a.clone();

        room.on_message(red.conn, r#"{"type":"xq_swap"}"#, 1);
        let msgs = black.drain();
        assert!(msgs.contains(&ServerMessage::XqSwapPending));

        room.on_message(black.conn, r#"{"type":"xq_swap"}"#, 2);

        // 双方都收到 xq_reset 然后被要求重连
        let outs = red.drain_raw();
        assert!(outs.iter().any(|o| matches!(o, Outbound::Frame(j) if j.contains("xq_reset"))));
        assert!(outs.contains(&Outbound::Close {
            code: 1000,
            reason: "swap"
        }));
        assert_eq!(room.clients.count(), 0);

        // 旧令牌重连后坐到对面
        let mut back = connect(&mut room, &token_red, "auto", 3);
        let (you, _) = back.init();
        assert_eq!(you, SEAT_B);
        let _ = black.drain_raw();
    }

    #[test]
    fn test_spectator_rejected() {
        let (mut room, _tmp) = new_room();
        let (_red, _black) = seated_pair(&mut room);
        let mut watcher = connect(&mut room, "", "watch", 0);
        watcher.drain();

        mv(&mut room, &watcher, (7, 7), (7, 4));
        let msgs = watcher.drain();
        assert!(msgs.contains(&ServerMessage::Reject {
            reason: "观战不能落子".into()
        }));
    }
}
