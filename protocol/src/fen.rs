//! 局面记号解析和生成
//!
//! 格式：`<棋盘> <走子方>`，棋盘自上而下逐行描述（第 0 行在前），
//! 红方大写、黑方小写，数字表示连续空位。
//!
//! 示例（初始局面）：
//! `rheakaehr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RHEAKAEHR r`

use crate::board::Board;
use crate::engine::Engine;
use crate::error::RuleError;
use crate::piece::{Color, Piece, Pos};

/// 初始局面
pub const INITIAL_FEN: &str = "rheakaehr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RHEAKAEHR r";

/// 局面记号处理
pub struct Fen;

impl Fen {
    /// 解析局面字符串
    pub fn parse(fen: &str) -> Result<Engine, RuleError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.is_empty() {
            return Err(RuleError::InvalidFen {
                reason: "empty string".to_string(),
            });
        }

        let board = Self::parse_board(parts[0])?;

        // 走子方（默认红方）
        let turn = match parts.get(1).and_then(|s| s.chars().next()) {
            Some('b') | Some('B') => Color::Black,
            _ => Color::Red,
        };

        Ok(Engine { board, turn })
    }

    /// 解析棋盘部分
    fn parse_board(board_str: &str) -> Result<Board, RuleError> {
        let mut board = Board::empty();
        let rows: Vec<&str> = board_str.split('/').collect();

        if rows.len() != 10 {
            return Err(RuleError::InvalidFen {
                reason: format!("expected 10 rows, got {}", rows.len()),
            });
        }

        for (r, row) in rows.iter().enumerate() {
            let mut c = 0u8;

            for ch in row.chars() {
                if c >= 9 {
                    return Err(RuleError::InvalidFen {
                        reason: format!("row {} has too many columns", r),
                    });
                }

                if ch.is_ascii_digit() {
                    c += ch.to_digit(10).unwrap() as u8;
                } else if let Some(piece) = Piece::from_code(ch) {
                    board.set(Pos::new_unchecked(r as u8, c), Some(piece));
                    c += 1;
                } else {
                    return Err(RuleError::InvalidFen {
                        reason: format!("invalid piece character: {}", ch),
                    });
                }
            }

            if c != 9 {
                return Err(RuleError::InvalidFen {
                    reason: format!("row {} has {} columns, expected 9", r, c),
                });
            }
        }

        Ok(board)
    }

    /// 将局面转换为字符串
    pub fn format(engine: &Engine) -> String {
        let mut rows = Vec::with_capacity(10);

        for r in 0..10 {
            let mut row = String::new();
            let mut empty_count = 0;

            for c in 0..9 {
                if let Some(piece) = engine.board.get(Pos::new_unchecked(r, c)) {
                    if empty_count > 0 {
                        row.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    row.push(piece.code());
                } else {
                    empty_count += 1;
                }
            }

            if empty_count > 0 {
                row.push_str(&empty_count.to_string());
            }

            rows.push(row);
        }

        let turn = match engine.turn {
            Color::Red => 'r',
            Color::Black => 'b',
        };
        format!("{} {}", rows.join("/"), turn)
    }
}
