//! 五子棋房间
//!
//! 19x19 棋盘，A 座执黑先行。记录在每次状态变更后落盘，
//! 落盘失败时中止本次处理（不再广播），内存记录保持自洽。

use tokio::sync::mpsc;
use tracing::{error, info};

use protocol::{
    opponent_role, ClientMessage, GmSeatState, GomokuBoard, GomokuMove, MoveList, Role,
    RoomKind, RoomRecord, SeatState, ServerMessage, VoteState, GM_ROOM_KEY, GOMOKU_SIZE,
    REASON_FIVE, REASON_TIMEOUT, SEAT_A, SEAT_B, SPECTATOR,
};

use crate::actor::{now_ms, RoomEvent};
use crate::fanout::{Attachment, ConnId, FanOut, Outbound};
use crate::seat::{self, Want};
use crate::storage::Storage;

pub struct GomokuRoom {
    key: String,
    record: RoomRecord<GomokuMove>,
    clients: FanOut,
    storage: Storage,
}

impl GomokuRoom {
    pub fn new(key: String, storage: Storage) -> Self {
        let record = storage.load_record(&key, GM_ROOM_KEY);
        Self {
            key,
            record,
            clients: FanOut::new(),
            storage,
        }
    }

    /// 事件循环：同房间事件严格串行
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
        // 先接入再分配座位，在线人数不含新连接（其凭据尚为空）
        self.clients
            .admit(conn, tx, Attachment::spectator(RoomKind::Gomoku));

        let (online_a, online_b) = self.online_counts();
        let want = Want::parse(want, RoomKind::Gomoku);
        let decision = seat::allocate(&mut self.record, token, want, online_a, online_b, now);

        // 同一令牌的旧连接被新连接顶替
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
            // 已被顶替或换边强制下线的连接，此前就移出了集合
            return;
        };

        let role = self.record.role_for_token(&client.attachment.token);
        if role != SPECTATOR {
            // 座位不因断线释放，只刷新活动时间供宽限期判定
            self.record.touch(role, now);
            if !self.persist() {
                return;
            }
        }

        self.clients.broadcast(&self.seats_msg());
        self.broadcast_presence();
    }

    pub fn on_message(&mut self, conn: ConnId, text: &str, now: i64) {
        // 解析失败与未知类型一律静默丢弃
        let Ok(msg) = serde_json::from_str::<ClientMessage>(text) else {
            return;
        };
        let Some(att) = self.clients.attachment(conn) else {
            return;
        };

        // 权限以当前记录为准，凭据令牌过期则视同观战
        let role = self.record.role_for_token(&att.token);

        match msg {
            ClientMessage::Move { r, c } => self.handle_move(conn, role, r, c, now),
            ClientMessage::Timeout => self.handle_timeout(conn, role, now),
            ClientMessage::Rematch => self.handle_rematch(conn, role),
            ClientMessage::Swap => self.handle_swap(conn, role),
            ClientMessage::GmLeave => self.handle_leave(role),
            // 其他棋种的消息在本房间无意义
            _ => {}
        }
    }

    fn handle_move(&mut self, conn: ConnId, role: Role, r: i32, c: i32, now: i64) {
        if !is_player(role) {
            return self.reject(conn, "观战不能落子");
        }
        if self.record.game_over {
            return self.reject(conn, "对局已结束");
        }
        if self.record.current != role {
            return self.reject(conn, "还没轮到你");
        }
        let size = GOMOKU_SIZE as i32;
        if r < 0 || r >= size || c < 0 || c >= size {
            return self.reject(conn, "落子越界");
        }
        let (r, c) = (r as u8, c as u8);

        let mut board = GomokuBoard::from_moves(&self.record.moves);
        if !board.is_empty_at(r, c) {
            return self.reject(conn, "该位置已有棋子");
        }

        self.record.moves.push(GomokuMove { r, c, p: role });
        self.record.touch(role, now);
        self.record.clear_votes();

        board.place(r, c, role);
        if board.five_at(r, c, role) {
            self.record.game_over = true;
            self.record.winner = role;
            self.record.reason = REASON_FIVE.to_string();
            if !self.persist() {
                return;
            }
            self.clients.broadcast(&ServerMessage::Move {
                r: r as i32,
                c: c as i32,
                p: role,
                next: None,
                win: Some(role),
                reason: None,
            });
        } else {
            self.record.current = opponent_role(role);
            if !self.persist() {
                return;
            }
            self.clients.broadcast(&ServerMessage::Move {
                r: r as i32,
                c: c as i32,
                p: role,
                next: Some(self.record.current),
                win: None,
                reason: None,
            });
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

        self.clients.broadcast(&ServerMessage::Move {
            r: -1,
            c: -1,
            p: role,
            next: None,
            win: Some(winner),
            reason: Some(REASON_TIMEOUT.to_string()),
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

        if RoomRecord::<GomokuMove>::votes_complete(&self.record.rematch)
            && self.record.both_seated()
        {
            self.record.reset_game();
            if !self.persist() {
                return;
            }
            self.broadcast_state();
            self.clients.broadcast(&self.votes_msg());
        } else {
            if !self.persist() {
                return;
            }
            self.clients.broadcast(&ServerMessage::RematchPending);
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

        if RoomRecord::<GomokuMove>::votes_complete(&self.record.swap) && self.record.both_seated()
        {
            self.record.swap_seats();
            self.record.reset_game();
            if !self.persist() {
                return;
            }

            self.clients.broadcast(&self.seats_msg());

            // 每条连接按新令牌映射获知自己的新角色，无须重连
            for id in self.clients.conn_ids() {
                let token = match self.clients.attachment(id) {
                    Some(att) => att.token.clone(),
                    None => continue,
                };
                let new_role = self.record.role_for_token(&token);
                if let Some(att) = self.clients.attachment_mut(id) {
                    att.role = new_role;
                }
                self.clients.send(id, &ServerMessage::Role { you: new_role });
            }

            self.broadcast_state();
            self.clients.broadcast(&self.votes_msg());
        } else {
            if !self.persist() {
                return;
            }
            self.clients.broadcast(&ServerMessage::SwapPending);
            self.clients.broadcast(&self.votes_msg());
        }
    }

    fn handle_leave(&mut self, role: Role) {
        // 凭据令牌仍指向座位时才清座；过期令牌无事发生
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
        match self.storage.put_record(&self.key, GM_ROOM_KEY, &self.record) {
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
            moves: MoveList::Gomoku(self.record.moves.clone()),
            current: self.record.current,
            game_over: self.record.game_over,
            winner: self.record.winner,
            reason: self.record.reason.clone(),
            seats: SeatState::Gomoku(self.seat_state()),
            votes: self.vote_state(),
        }
    }

    fn seat_state(&self) -> GmSeatState {
        GmSeatState {
            black: !self.record.token_a.is_empty(),
            white: !self.record.token_b.is_empty(),
        }
    }

    fn seats_msg(&self) -> ServerMessage {
        ServerMessage::GmSeats {
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
        ServerMessage::Votes {
            votes: self.vote_state(),
        }
    }

    fn broadcast_state(&self) {
        self.clients.broadcast(&ServerMessage::State {
            moves: self.record.moves.clone(),
            current: self.record.current,
            game_over: self.record.game_over,
        });
    }

    fn broadcast_presence(&self) {
        self.clients.broadcast(&ServerMessage::Presence {
            n: self.clients.count(),
        });
    }

    #[cfg(test)]
    pub fn record(&self) -> &RoomRecord<GomokuMove> {
        &self.record
    }
}

fn is_player(role: Role) -> bool {
    role == SEAT_A || role == SEAT_B
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::GRACE_MS;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn new_room() -> (GomokuRoom, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path()).unwrap();
        (GomokuRoom::new("gm:test".into(), storage), temp)
    }

    struct TestClient {
        conn: ConnId,
        rx: mpsc::Receiver<Outbound>,
    }

    impl TestClient {
        /// 读空出站队列，JSON 帧解析为消息
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

        /// 取本连接的 init 消息（应为第一帧）
        fn init(&mut self) -> (Role, String) {
            match self.drain().into_iter().next() {
                Some(ServerMessage::Init { you, token, .. }) => (you, token),
                other => panic!("expected init, got {:?}", other),
            }
        }
    }

    fn connect(room: &mut GomokuRoom, token: &str, want: &str, now: i64) -> TestClient {
        let (tx, rx) = mpsc::channel(64);
        let conn = Uuid::new_v4();
        room.on_open(conn, tx, token, want, now);
        TestClient { conn, rx }
    }

    fn send(room: &mut GomokuRoom, client: &TestClient, json: &str, now: i64) {
        room.on_message(client.conn, json, now);
    }

    #[test]
    fn test_two_clients_get_both_seats() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 1000);
        let mut white = connect(&mut room, "", "auto", 1000);

        let (you_a, token_a) = black.init();
        assert_eq!(you_a, SEAT_A);
        assert!(!token_a.is_empty());

        let (you_b, token_b) = white.init();
        assert_eq!(you_b, SEAT_B);
        assert_ne!(token_a, token_b);
    }

    #[test]
    fn test_happy_path_diagonal_win() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 0);
        let mut white = connect(&mut room, "", "auto", 0);
        black.drain();
        white.drain();

        // 黑方斜线五连，白方跟着排兵
        let black_moves = [(5u8, 5u8), (6, 6), (7, 7), (8, 8), (9, 9)];
        let white_moves = [(0u8, 1u8), (0, 2), (0, 3), (0, 4)];
        for i in 0..4 {
            let (r, c) = black_moves[i];
            send(&mut room, &black, &format!(r#"{{"type":"move","r":{},"c":{}}}"#, r, c), 1);
            let (r, c) = white_moves[i];
            send(&mut room, &white, &format!(r#"{{"type":"move","r":{},"c":{}}}"#, r, c), 1);
        }
        black.drain();
        white.drain();

        send(&mut room, &black, r#"{"type":"move","r":9,"c":9}"#, 1);

        let msgs = white.drain();
        assert!(msgs.contains(&ServerMessage::Move {
            r: 9,
            c: 9,
            p: SEAT_A,
            next: None,
            win: Some(SEAT_A),
            reason: None,
        }));
        assert!(room.record().game_over);
        assert_eq!(room.record().winner, SEAT_A);
        assert_eq!(room.record().reason, REASON_FIVE);

        // 终局后落子被拒
        send(&mut room, &white, r#"{"type":"move","r":10,"c":10}"#, 2);
        let msgs = white.drain();
        assert!(matches!(msgs.last(), Some(ServerMessage::Reject { .. })));
    }

    #[test]
    fn test_turn_alternates_and_occupied_rejected() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 0);
        let mut white = connect(&mut room, "", "auto", 0);
        black.drain();
        white.drain();

        // 白方抢先被拒
        send(&mut room, &white, r#"{"type":"move","r":0,"c":0}"#, 1);
        assert!(matches!(
            white.drain().last(),
            Some(ServerMessage::Reject { .. })
        ));

        send(&mut room, &black, r#"{"type":"move","r":9,"c":9}"#, 1);
        black.drain();

        // 白方落在已占位置被拒
        send(&mut room, &white, r#"{"type":"move","r":9,"c":9}"#, 1);
        assert!(matches!(
            white.drain().last(),
            Some(ServerMessage::Reject { .. })
        ));

        // 越界被拒
        send(&mut room, &white, r#"{"type":"move","r":19,"c":0}"#, 1);
        assert!(matches!(
            white.drain().last(),
            Some(ServerMessage::Reject { .. })
        ));
        send(&mut room, &white, r#"{"type":"move","r":0,"c":-1}"#, 1);
        assert!(matches!(
            white.drain().last(),
            Some(ServerMessage::Reject { .. })
        ));

        assert_eq!(room.record().moves.len(), 1);
    }

    #[test]
    fn test_spectator_cannot_move() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 0);
        let _white = connect(&mut room, "", "auto", 0);
        let mut watcher = connect(&mut room, "", "spectate", 0);
        black.drain();
        watcher.drain();

        send(&mut room, &watcher, r#"{"type":"move","r":0,"c":0}"#, 1);
        let msgs = watcher.drain();
        assert!(msgs.contains(&ServerMessage::Reject {
            reason: "观战不能落子".into()
        }));
        // 拒绝只发给本人
        assert!(black.drain().is_empty());
    }

    #[test]
    fn test_reconnect_with_token_keeps_seat() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 1000);
        let (_, token) = black.init();
        room.on_close(black.conn, 2000);

        // 10 秒内凭令牌重连：同座同令牌
        let mut again = connect(&mut room, &token, "auto", 12_000);
        let (you, token2) = again.init();
        assert_eq!(you, SEAT_A);
        assert_eq!(token2, token);
        assert_eq!(room.record().last_seen_a, 12_000);
    }

    #[test]
    fn test_seat_steal_after_grace() {
        let (mut room, _tmp) = new_room();

        let black = connect(&mut room, "", "black", 0);
        let _white = connect(&mut room, "", "white", 0);
        let stale_token = room.record().token_a.clone();
        room.on_close(black.conn, 1000);

        // 恰好到宽限期还不能抢
        let mut early = connect(&mut room, "", "black", 1000 + GRACE_MS);
        let (you, _) = early.init();
        assert_eq!(you, SPECTATOR);
        room.on_close(early.conn, 1000 + GRACE_MS);

        // 四分钟后第三方抢座，换发新令牌
        let steal_at = 1000 + GRACE_MS + 60_000;
        let mut thief = connect(&mut room, "", "black", steal_at);
        let (you, new_token) = thief.init();
        assert_eq!(you, SEAT_A);
        assert_ne!(new_token, stale_token);

        // 旧令牌持有者回来：两座有主，只能观战
        let mut old = connect(&mut room, &stale_token, "auto", steal_at + 1000);
        let (you, token) = old.init();
        assert_eq!(you, SPECTATOR);
        assert!(token.is_empty());
    }

    #[test]
    fn test_duplicate_token_connection_evicted() {
        let (mut room, _tmp) = new_room();

        let mut first = connect(&mut room, "", "auto", 0);
        let (_, token) = first.init();

        let mut second = connect(&mut room, &token, "auto", 1000);
        let (you, _) = second.init();
        assert_eq!(you, SEAT_A);

        // 旧连接收到关闭指令并被移出集合
        let outs = first.drain_raw();
        assert!(outs.contains(&Outbound::Close {
            code: 1000,
            reason: "reconnect"
        }));
        assert_eq!(room.clients.count(), 1);

        // 旧连接随后的传输层关闭事件是空操作
        room.on_close(first.conn, 2000);
        assert_eq!(room.clients.count(), 1);
    }

    #[test]
    fn test_timeout_ends_game() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 0);
        let mut white = connect(&mut room, "", "auto", 0);
        black.drain();
        white.drain();

        // 轮到黑方，黑方自认超时，白方胜
        send(&mut room, &black, r#"{"type":"timeout"}"#, 1);
        let msgs = white.drain();
        assert!(msgs.contains(&ServerMessage::Move {
            r: -1,
            c: -1,
            p: SEAT_A,
            next: None,
            win: Some(SEAT_B),
            reason: Some(REASON_TIMEOUT.into()),
        }));
        assert!(room.record().game_over);
        assert_eq!(room.record().winner, SEAT_B);
    }

    #[test]
    fn test_rematch_votes_reset_game() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 0);
        let mut white = connect(&mut room, "", "auto", 0);
        black.drain();
        white.drain();

        // 对局未结束时不能再来一局
        send(&mut room, &black, r#"{"type":"rematch"}"#, 1);
        assert!(matches!(
            black.drain().last(),
            Some(ServerMessage::Reject { .. })
        ));

        send(&mut room, &black, r#"{"type":"timeout"}"#, 1);
        black.drain();
        white.drain();

        send(&mut room, &black, r#"{"type":"rematch"}"#, 2);
        let msgs = white.drain();
        assert!(msgs.contains(&ServerMessage::RematchPending));

        // 同一方重复投票不触发重置
        send(&mut room, &black, r#"{"type":"rematch"}"#, 3);
        assert!(!room.record().rematch.is_empty());
        assert!(room.record().game_over);
        white.drain();

        send(&mut room, &white, r#"{"type":"rematch"}"#, 4);
        let msgs = black.drain();
        assert!(msgs.contains(&ServerMessage::State {
            moves: vec![],
            current: SEAT_A,
            game_over: false,
        }));
        assert!(!room.record().game_over);
        assert!(room.record().rematch.is_empty());
        assert!(room.record().swap.is_empty());
        assert_eq!(room.record().winner, 0);
    }

    #[test]
    fn test_swap_in_lobby_exchanges_tokens() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 0);
        let mut white = connect(&mut room, "", "auto", 0);
        let (_, token_a) = black.init();
        let (_, token_b) = white.init();
        white.drain();

        // 开局前（零着）允许换边
        send(&mut room, &black, r#"{"type":"swap"}"#, 1);
        let msgs = white.drain();
        assert!(msgs.contains(&ServerMessage::SwapPending));

        send(&mut room, &white, r#"{"type":"swap"}"#, 2);

        // 双方各收到定向 role，令牌不变但映射互换
        let black_msgs = black.drain();
        assert!(black_msgs.contains(&ServerMessage::Role { you: SEAT_B }));
        assert!(black_msgs.iter().any(|m| matches!(m, ServerMessage::GmSeats { .. })));
        assert!(black_msgs.contains(&ServerMessage::State {
            moves: vec![],
            current: SEAT_A,
            game_over: false,
        }));

        let white_msgs = white.drain();
        assert!(white_msgs.contains(&ServerMessage::Role { you: SEAT_A }));

        assert_eq!(room.record().role_for_token(&token_a), SEAT_B);
        assert_eq!(room.record().role_for_token(&token_b), SEAT_A);
        assert!(room.record().swap.is_empty());
    }

    #[test]
    fn test_move_clears_pending_votes() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 0);
        let mut white = connect(&mut room, "", "auto", 0);
        black.drain();
        white.drain();

        // 开局前黑方投了换边票
        send(&mut room, &black, r#"{"type":"swap"}"#, 1);
        assert!(!room.record().swap.is_empty());
        black.drain();
        white.drain();

        // 落子清空投票，白方事后投票不会凑成两票
        send(&mut room, &black, r#"{"type":"move","r":3,"c":3}"#, 2);
        assert!(room.record().swap.is_empty());

        send(&mut room, &white, r#"{"type":"swap"}"#, 3);
        assert!(matches!(
            white.drain().last(),
            Some(ServerMessage::Reject { .. })
        ));
    }

    #[test]
    fn test_leave_clears_seat() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 0);
        black.drain();
        assert!(!room.record().token_a.is_empty());

        send(&mut room, &black, r#"{"type":"gm_leave"}"#, 1);
        assert!(room.record().token_a.is_empty());
        assert_eq!(room.record().last_seen_a, 0);

        let msgs = black.drain();
        assert!(msgs.contains(&ServerMessage::GmSeats {
            seats: GmSeatState {
                black: false,
                white: false,
            }
        }));
    }

    #[test]
    fn test_malformed_and_unknown_dropped() {
        let (mut room, _tmp) = new_room();

        let mut black = connect(&mut room, "", "auto", 0);
        black.drain();

        send(&mut room, &black, "not json at all", 1);
        send(&mut room, &black, r#"{"type":"chat","text":"hello"}"#, 1);
        // 象棋消息在五子棋房间同样无效
        send(
            &mut room,
            &black,
            r#"{"type":"xq_move","from":{"r":7,"c":7},"to":{"r":7,"c":4}}"#,
            1,
        );

        assert!(black.drain().is_empty());
        assert!(room.record().moves.is_empty());
    }

    #[test]
    fn test_record_survives_restart() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path()).unwrap();

        let token = {
            let mut room = GomokuRoom::new("gm:persist".into(), storage.clone());
            let mut black = connect(&mut room, "", "auto", 0);
            let (_, token) = black.init();
            send(&mut room, &black, r#"{"type":"move","r":4,"c":4}"#, 1);
            token
        };

        // 新实例从存储恢复记录
        let room = GomokuRoom::new("gm:persist".into(), storage);
        assert_eq!(room.record().moves.len(), 1);
        assert_eq!(room.record().role_for_token(&token), SEAT_A);
    }
}
