//! 棋子与坐标定义
//!
//! 坐标约定：`r` 为行（0-9），`c` 为列（0-8）。第 0 行是黑方底线，
//! 第 9 行是红方底线；红方位于棋盘下方（7-9 行为红方九宫）。

use serde::{Deserialize, Serialize};

use crate::constants::{XQ_COLS, XQ_ROWS};

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// 将/帅
    King,
    /// 士/仕
    Advisor,
    /// 象/相
    Elephant,
    /// 马/傌
    Horse,
    /// 车/俥
    Rook,
    /// 炮/砲
    Cannon,
    /// 兵/卒
    Pawn,
}

impl PieceKind {
    /// 棋子字母代号
    pub fn code(&self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Advisor => 'A',
            PieceKind::Elephant => 'E',
            PieceKind::Horse => 'H',
            PieceKind::Rook => 'R',
            PieceKind::Cannon => 'C',
            PieceKind::Pawn => 'P',
        }
    }

    /// 从字母代号解析
    pub fn from_code(c: char) -> Option<PieceKind> {
        match c.to_ascii_uppercase() {
            'K' => Some(PieceKind::King),
            'A' => Some(PieceKind::Advisor),
            'E' => Some(PieceKind::Elephant),
            'H' => Some(PieceKind::Horse),
            'R' => Some(PieceKind::Rook),
            'C' => Some(PieceKind::Cannon),
            'P' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// 红方（先手，下方）
    Red,
    /// 黑方（后手，上方）
    Black,
}

impl Color {
    /// 获取对方阵营
    pub fn opponent(&self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// 符号表示：红 +1，黑 -1
    pub fn sign(&self) -> i8 {
        match self {
            Color::Red => 1,
            Color::Black => -1,
        }
    }

    /// 从符号解析
    pub fn from_sign(sign: i8) -> Option<Color> {
        match sign {
            1 => Some(Color::Red),
            -1 => Some(Color::Black),
            _ => None,
        }
    }

    /// 本方兵卒前进时的行增量（红方向上为负）
    pub fn forward(&self) -> i8 {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    /// 创建新棋子
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// 单字符表示（红方大写，黑方小写）
    pub fn code(&self) -> char {
        match self.color {
            Color::Red => self.kind.code().to_ascii_uppercase(),
            Color::Black => self.kind.code().to_ascii_lowercase(),
        }
    }

    /// 从单字符解析
    pub fn from_code(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() {
            Color::Red
        } else {
            Color::Black
        };
        PieceKind::from_code(c).map(|kind| Piece { kind, color })
    }
}

/// 棋盘坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    /// 行 (0-9)
    pub r: u8,
    /// 列 (0-8)
    pub c: u8,
}

impl Pos {
    /// 创建新坐标（越界返回 None）
    pub fn new(r: u8, c: u8) -> Option<Self> {
        if (r as usize) < XQ_ROWS && (c as usize) < XQ_COLS {
            Some(Self { r, c })
        } else {
            None
        }
    }

    /// 创建新坐标（不检查边界，内部使用）
    pub const fn new_unchecked(r: u8, c: u8) -> Self {
        Self { r, c }
    }

    /// 检查坐标是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (self.r as usize) < XQ_ROWS && (self.c as usize) < XQ_COLS
    }

    /// 获取偏移后的坐标
    pub fn offset(&self, dr: i8, dc: i8) -> Option<Pos> {
        let nr = self.r as i8 + dr;
        let nc = self.c as i8 + dc;
        if nr >= 0 && (nr as usize) < XQ_ROWS && nc >= 0 && (nc as usize) < XQ_COLS {
            Some(Pos {
                r: nr as u8,
                c: nc as u8,
            })
        } else {
            None
        }
    }

    /// 检查坐标是否在指定阵营的九宫格内（列 3-5）
    pub fn in_palace(&self, color: Color) -> bool {
        let in_c = (3..=5).contains(&self.c);
        let in_r = match color {
            Color::Red => (7..=9).contains(&self.r),
            Color::Black => (0..=2).contains(&self.r),
        };
        in_c && in_r
    }

    /// 检查坐标是否在指定阵营的本方半区（象不可过河）
    pub fn on_home_side(&self, color: Color) -> bool {
        match color {
            Color::Red => self.r >= 5,
            Color::Black => self.r <= 4,
        }
    }

    /// 检查坐标是否已过河（兵卒过河后可横走）
    pub fn crossed_river(&self, color: Color) -> bool {
        match color {
            Color::Red => self.r <= 4,
            Color::Black => self.r >= 5,
        }
    }

    /// 转换为数组索引
    pub fn index(&self) -> usize {
        self.r as usize * XQ_COLS + self.c as usize
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.r, self.c)
    }
}
