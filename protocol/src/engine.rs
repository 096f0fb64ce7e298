//! 象棋走法生成与规则判定

use crate::board::Board;
use crate::error::RuleError;
use crate::piece::{Color, Piece, PieceKind, Pos};

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineMove {
    /// 起始位置
    pub from: Pos,
    /// 目标位置
    pub to: Pos,
    /// 被吃的棋子（如果有）
    pub capture: Option<Piece>,
}

impl EngineMove {
    fn new(from: Pos, to: Pos) -> Self {
        Self {
            from,
            to,
            capture: None,
        }
    }

    fn with_capture(from: Pos, to: Pos, captured: Piece) -> Self {
        Self {
            from,
            to,
            capture: Some(captured),
        }
    }
}

/// 对局引擎：棋盘加走子方
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    pub board: Board,
    /// 当前走子方（红方先行）
    pub turn: Color,
}

impl Engine {
    /// 创建初始局面
    pub fn new() -> Self {
        Self {
            board: Board::initial(),
            turn: Color::Red,
        }
    }

    /// 从初始局面重放一串走法（走法在接受时已校验，重放不再检查）
    pub fn replay<I>(moves: I) -> Self
    where
        I: IntoIterator<Item = (Pos, Pos)>,
    {
        let mut engine = Self::new();
        for (from, to) in moves {
            engine.apply(from, to);
        }
        engine
    }

    /// 执行走法：覆盖目标、清空起点、交换走子方
    pub fn apply(&mut self, from: Pos, to: Pos) -> Option<Piece> {
        let captured = self.board.move_piece(from, to);
        self.turn = self.turn.opponent();
        captured
    }

    /// 校验一步棋：轮次正确且在合法走法之内
    pub fn try_move(&self, color: Color, from: Pos, to: Pos) -> Result<EngineMove, RuleError> {
        if self.turn != color {
            return Err(RuleError::NotYourTurn);
        }
        find_legal_move(&self.board, color, from, to)
            .ok_or(RuleError::IllegalMove(from.r, from.c, to.r, to.c))
    }

    /// 指定阵营的全部合法走法
    pub fn legal_moves(&self, color: Color) -> Vec<EngineMove> {
        generate_legal(&self.board, color)
    }

    /// 指定阵营是否被将军
    pub fn is_checked(&self, color: Color) -> bool {
        is_checked(&self.board, color)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// 生成指定阵营的所有伪合法走法（不考虑将军）
pub fn generate_pseudo_legal(board: &Board, color: Color) -> Vec<EngineMove> {
    let mut moves = Vec::with_capacity(64);

    for (pos, piece) in board.pieces(color) {
        generate_piece_moves(board, pos, piece, &mut moves);
    }

    moves
}

/// 生成指定阵营的所有合法走法（过滤掉走后被将军的走法）
pub fn generate_legal(board: &Board, color: Color) -> Vec<EngineMove> {
    generate_pseudo_legal(board, color)
        .into_iter()
        .filter(|mv| {
            // 模拟走法后检查本方是否被将军（含飞将）
            let mut test = board.clone();
            test.move_piece(mv.from, mv.to);
            !is_checked(&test, color)
        })
        .collect()
}

/// 在合法走法中查找指定起止点的走法
pub fn find_legal_move(board: &Board, color: Color, from: Pos, to: Pos) -> Option<EngineMove> {
    generate_legal(board, color)
        .into_iter()
        .find(|mv| mv.from == from && mv.to == to)
}

/// 检查指定阵营是否被将军
///
/// 将军来源有两种：双将同列无遮挡（飞将），或对方任一棋子有
/// 伪合法走法落在本方将的位置上。
pub fn is_checked(board: &Board, color: Color) -> bool {
    let king_pos = match board.find_king(color) {
        Some(pos) => pos,
        None => return false,
    };

    if board.kings_facing() {
        return true;
    }

    let opponent = color.opponent();
    for (pos, piece) in board.pieces(opponent) {
        if can_attack(board, pos, piece, king_pos) {
            return true;
        }
    }

    false
}

/// 一方走棋后的终局判定：对方无合法走法时返回胜因
pub fn terminal_reason(board: &Board, mover: Color) -> Option<&'static str> {
    let opponent = mover.opponent();
    if generate_legal(board, opponent).is_empty() {
        if is_checked(board, opponent) {
            Some(crate::constants::REASON_CHECKMATE)
        } else {
            Some(crate::constants::REASON_STALEMATE)
        }
    } else {
        None
    }
}

/// 生成指定棋子的所有伪合法走法
fn generate_piece_moves(board: &Board, pos: Pos, piece: Piece, moves: &mut Vec<EngineMove>) {
    match piece.kind {
        PieceKind::King => generate_king_moves(board, pos, piece.color, moves),
        PieceKind::Advisor => generate_advisor_moves(board, pos, piece.color, moves),
        PieceKind::Elephant => generate_elephant_moves(board, pos, piece.color, moves),
        PieceKind::Horse => generate_horse_moves(board, pos, piece.color, moves),
        PieceKind::Rook => generate_rook_moves(board, pos, piece.color, moves),
        PieceKind::Cannon => generate_cannon_moves(board, pos, piece.color, moves),
        PieceKind::Pawn => generate_pawn_moves(board, pos, piece.color, moves),
    }
}

/// 生成将/帅的走法：九宫格内直走一步
fn generate_king_moves(board: &Board, pos: Pos, color: Color, moves: &mut Vec<EngineMove>) {
    let directions = [(0, 1), (0, -1), (1, 0), (-1, 0)];

    for (dr, dc) in directions {
        if let Some(to) = pos.offset(dr, dc) {
            if !to.in_palace(color) {
                continue;
            }

            try_add_move(board, pos, to, color, moves);
        }
    }
}

/// 生成士/仕的走法：九宫格内斜走一步
fn generate_advisor_moves(board: &Board, pos: Pos, color: Color, moves: &mut Vec<EngineMove>) {
    let directions = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

    for (dr, dc) in directions {
        if let Some(to) = pos.offset(dr, dc) {
            if !to.in_palace(color) {
                continue;
            }

            try_add_move(board, pos, to, color, moves);
        }
    }
}

/// 生成象/相的走法：田字走法，象眼无子，不可过河
fn generate_elephant_moves(board: &Board, pos: Pos, color: Color, moves: &mut Vec<EngineMove>) {
    let directions = [(2, 2), (2, -2), (-2, 2), (-2, -2)];
    let eyes = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

    for i in 0..4 {
        let (dr, dc) = directions[i];
        let (er, ec) = eyes[i];

        // 检查象眼是否被堵
        match pos.offset(er, ec) {
            Some(eye) if board.get(eye).is_none() => {}
            _ => continue,
        }

        if let Some(to) = pos.offset(dr, dc) {
            if to.on_home_side(color) {
                try_add_move(board, pos, to, color, moves);
            }
        }
    }
}

/// 生成马/傌的走法：日字走法，蹩马腿
fn generate_horse_moves(board: &Board, pos: Pos, color: Color, moves: &mut Vec<EngineMove>) {
    // 8 个方向及对应的马腿位置
    let horse_moves = [
        ((1, 2), (0, 1)),
        ((2, 1), (1, 0)),
        ((2, -1), (1, 0)),
        ((1, -2), (0, -1)),
        ((-1, -2), (0, -1)),
        ((-2, -1), (-1, 0)),
        ((-2, 1), (-1, 0)),
        ((-1, 2), (0, 1)),
    ];

    for ((dr, dc), (lr, lc)) in horse_moves {
        // 检查马腿是否被堵
        match pos.offset(lr, lc) {
            Some(leg) if board.get(leg).is_none() => {}
            _ => continue,
        }

        if let Some(to) = pos.offset(dr, dc) {
            try_add_move(board, pos, to, color, moves);
        }
    }
}

/// 生成车/俥的走法：直线滑行至阻挡，可吃第一个敌子
fn generate_rook_moves(board: &Board, pos: Pos, color: Color, moves: &mut Vec<EngineMove>) {
    let directions = [(0, 1), (0, -1), (1, 0), (-1, 0)];

    for (dr, dc) in directions {
        let mut current = pos;
        while let Some(to) = current.offset(dr, dc) {
            if let Some(target) = board.get(to) {
                if target.color != color {
                    moves.push(EngineMove::with_capture(pos, to, target));
                }
                break;
            } else {
                moves.push(EngineMove::new(pos, to));
            }
            current = to;
        }
    }
}

/// 生成炮/砲的走法：空行直走，隔一个炮架吃子
fn generate_cannon_moves(board: &Board, pos: Pos, color: Color, moves: &mut Vec<EngineMove>) {
    let directions = [(0, 1), (0, -1), (1, 0), (-1, 0)];

    for (dr, dc) in directions {
        let mut current = pos;
        let mut screened = false;

        while let Some(to) = current.offset(dr, dc) {
            if let Some(target) = board.get(to) {
                if screened {
                    // 已隔一子，落在敌子上则吃
                    if target.color != color {
                        moves.push(EngineMove::with_capture(pos, to, target));
                    }
                    break;
                } else {
                    // 第一个遇到的棋子作为炮架
                    screened = true;
                }
            } else if !screened {
                moves.push(EngineMove::new(pos, to));
            }
            current = to;
        }
    }
}

/// 生成兵/卒的走法：始终可进一步，过河后可横走一步
fn generate_pawn_moves(board: &Board, pos: Pos, color: Color, moves: &mut Vec<EngineMove>) {
    if let Some(to) = pos.offset(color.forward(), 0) {
        try_add_move(board, pos, to, color, moves);
    }

    if pos.crossed_river(color) {
        for dc in [-1i8, 1i8] {
            if let Some(to) = pos.offset(0, dc) {
                try_add_move(board, pos, to, color, moves);
            }
        }
    }
}

/// 尝试添加走法（目标为空位或敌子）
fn try_add_move(board: &Board, from: Pos, to: Pos, color: Color, moves: &mut Vec<EngineMove>) {
    if let Some(target) = board.get(to) {
        if target.color != color {
            moves.push(EngineMove::with_capture(from, to, target));
        }
    } else {
        moves.push(EngineMove::new(from, to));
    }
}

/// 检查棋子是否能攻击到目标位置（用于将军检测）
fn can_attack(board: &Board, from: Pos, piece: Piece, target: Pos) -> bool {
    match piece.kind {
        PieceKind::King => {
            // 将帅对脸由飞将规则单独处理
            false
        }
        PieceKind::Advisor => {
            let dr = (target.r as i8 - from.r as i8).abs();
            let dc = (target.c as i8 - from.c as i8).abs();
            dr == 1 && dc == 1 && target.in_palace(piece.color)
        }
        PieceKind::Elephant => {
            let dr = target.r as i8 - from.r as i8;
            let dc = target.c as i8 - from.c as i8;
            if dr.abs() != 2 || dc.abs() != 2 || !target.on_home_side(piece.color) {
                return false;
            }
            // 检查象眼
            let eye = Pos::new_unchecked(
                (from.r as i8 + dr / 2) as u8,
                (from.c as i8 + dc / 2) as u8,
            );
            board.get(eye).is_none()
        }
        PieceKind::Horse => {
            let dr = target.r as i8 - from.r as i8;
            let dc = target.c as i8 - from.c as i8;
            let is_horse_move =
                (dr.abs() == 1 && dc.abs() == 2) || (dr.abs() == 2 && dc.abs() == 1);
            if !is_horse_move {
                return false;
            }
            // 检查马腿
            let (lr, lc) = if dr.abs() == 2 {
                (dr.signum(), 0)
            } else {
                (0, dc.signum())
            };
            let leg = Pos::new_unchecked((from.r as i8 + lr) as u8, (from.c as i8 + lc) as u8);
            board.get(leg).is_none()
        }
        PieceKind::Rook => can_rook_attack(board, from, target),
        PieceKind::Cannon => can_cannon_attack(board, from, target),
        PieceKind::Pawn => {
            let dr = target.r as i8 - from.r as i8;
            let dc = target.c as i8 - from.c as i8;
            if dc == 0 && dr == piece.color.forward() {
                true
            } else {
                from.crossed_river(piece.color) && dr == 0 && dc.abs() == 1
            }
        }
    }
}

/// 检查车是否能攻击目标（同行同列且中间无子）
fn can_rook_attack(board: &Board, from: Pos, target: Pos) -> bool {
    if from.r != target.r && from.c != target.c {
        return false;
    }

    let (dr, dc) = if from.c == target.c {
        (if target.r > from.r { 1 } else { -1 }, 0)
    } else {
        (0, if target.c > from.c { 1 } else { -1 })
    };

    let mut current = from;
    while let Some(next) = current.offset(dr, dc) {
        if next == target {
            return true;
        }
        if board.get(next).is_some() {
            return false;
        }
        current = next;
    }
    false
}

/// 检查炮是否能攻击目标（必须恰好隔一个炮架）
fn can_cannon_attack(board: &Board, from: Pos, target: Pos) -> bool {
    if from.r != target.r && from.c != target.c {
        return false;
    }

    let (dr, dc) = if from.c == target.c {
        (if target.r > from.r { 1 } else { -1 }, 0)
    } else {
        (0, if target.c > from.c { 1 } else { -1 })
    };

    let mut current = from;
    let mut screened = false;

    while let Some(next) = current.offset(dr, dc) {
        if next == target {
            return screened;
        }
        if board.get(next).is_some() {
            if screened {
                return false;
            }
            screened = true;
        }
        current = next;
    }
    false
}
