//! 象棋棋盘

use serde::{Deserialize, Serialize};

use crate::constants::{XQ_COLS, XQ_ROWS};
use crate::piece::{Color, Piece, PieceKind, Pos};

/// 10x9 棋盘，索引为 r * 9 + c，使用 Vec 以支持 serde
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    squares: Vec<Option<Piece>>,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: vec![None; XQ_ROWS * XQ_COLS],
        }
    }

    /// 创建初始棋盘
    pub fn initial() -> Self {
        let mut board = Self::empty();

        let back_rank = [
            PieceKind::Rook,
            PieceKind::Horse,
            PieceKind::Elephant,
            PieceKind::Advisor,
            PieceKind::King,
            PieceKind::Advisor,
            PieceKind::Elephant,
            PieceKind::Horse,
            PieceKind::Rook,
        ];

        // 黑方（上方，第 0 行为底线）
        for (c, kind) in back_rank.iter().enumerate() {
            board.set(Pos::new_unchecked(0, c as u8), Some(Piece::new(*kind, Color::Black)));
        }
        board.set(Pos::new_unchecked(2, 1), Some(Piece::new(PieceKind::Cannon, Color::Black)));
        board.set(Pos::new_unchecked(2, 7), Some(Piece::new(PieceKind::Cannon, Color::Black)));
        for c in (0..XQ_COLS as u8).step_by(2) {
            board.set(Pos::new_unchecked(3, c), Some(Piece::new(PieceKind::Pawn, Color::Black)));
        }

        // 红方（下方，第 9 行为底线）
        for (c, kind) in back_rank.iter().enumerate() {
            board.set(Pos::new_unchecked(9, c as u8), Some(Piece::new(*kind, Color::Red)));
        }
        board.set(Pos::new_unchecked(7, 1), Some(Piece::new(PieceKind::Cannon, Color::Red)));
        board.set(Pos::new_unchecked(7, 7), Some(Piece::new(PieceKind::Cannon, Color::Red)));
        for c in (0..XQ_COLS as u8).step_by(2) {
            board.set(Pos::new_unchecked(6, c), Some(Piece::new(PieceKind::Pawn, Color::Red)));
        }

        board
    }

    /// 获取指定位置的棋子
    pub fn get(&self, pos: Pos) -> Option<Piece> {
        if pos.is_valid() {
            self.squares[pos.index()]
        } else {
            None
        }
    }

    /// 设置指定位置的棋子
    pub fn set(&mut self, pos: Pos, piece: Option<Piece>) {
        if pos.is_valid() {
            self.squares[pos.index()] = piece;
        }
    }

    /// 移动棋子（不检查规则），返回被吃的棋子
    pub fn move_piece(&mut self, from: Pos, to: Pos) -> Option<Piece> {
        let piece = self.get(from);
        let captured = self.get(to);
        self.set(from, None);
        self.set(to, piece);
        captured
    }

    /// 查找指定阵营的将/帅位置
    pub fn find_king(&self, color: Color) -> Option<Pos> {
        for r in 0..XQ_ROWS {
            for c in 0..XQ_COLS {
                let pos = Pos::new_unchecked(r as u8, c as u8);
                if let Some(piece) = self.get(pos) {
                    if piece.kind == PieceKind::King && piece.color == color {
                        return Some(pos);
                    }
                }
            }
        }
        None
    }

    /// 获取指定阵营的所有棋子位置
    pub fn pieces(&self, color: Color) -> Vec<(Pos, Piece)> {
        let mut result = Vec::new();
        for r in 0..XQ_ROWS {
            for c in 0..XQ_COLS {
                let pos = Pos::new_unchecked(r as u8, c as u8);
                if let Some(piece) = self.get(pos) {
                    if piece.color == color {
                        result.push((pos, piece));
                    }
                }
            }
        }
        result
    }

    /// 检查两个将是否面对面（飞将）：同列且中间无子
    pub fn kings_facing(&self) -> bool {
        let red = self.find_king(Color::Red);
        let black = self.find_king(Color::Black);

        if let (Some(red_pos), Some(black_pos)) = (red, black) {
            if red_pos.c != black_pos.c {
                return false;
            }

            let (min_r, max_r) = if red_pos.r < black_pos.r {
                (red_pos.r, black_pos.r)
            } else {
                (black_pos.r, red_pos.r)
            };

            for r in (min_r + 1)..max_r {
                if self.get(Pos::new_unchecked(r, red_pos.c)).is_some() {
                    return false;
                }
            }

            true
        } else {
            false
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}
