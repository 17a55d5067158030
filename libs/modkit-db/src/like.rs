//! LIKE pattern helpers for SeaORM queries.
//!
//! Patterns escape `%`, `_` and `\` with a backslash and are paired with
//! `ESCAPE '\'` so user input is always matched literally.
//!
//! SQLite's `LOWER` and `NOCASE` only fold ASCII, so case-insensitive
//! matching goes through a shadow column holding [`fold_case`] of the value.

use sea_orm::sea_query::{Expr, IntoColumnRef, LikeExpr, SimpleExpr};

pub const LIKE_ESCAPE: char = '\\';

pub fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push(LIKE_ESCAPE);
        }
        out.push(ch);
    }
    out
}

pub fn like_contains(s: &str) -> String {
    format!("%{}%", like_escape(s))
}

pub fn like_starts(s: &str) -> String {
    format!("{}%", like_escape(s))
}

fn escaped(pattern: String) -> LikeExpr {
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

/// Unicode lowercase used for folded shadow columns and their needles.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// `folded_col LIKE '%needle%'` where `folded_col` holds [`fold_case`] values.
pub fn folded_contains<C: IntoColumnRef>(folded_col: C, needle: &str) -> SimpleExpr {
    Expr::col(folded_col).like(escaped(like_contains(&fold_case(needle))))
}

/// `expr LIKE 'prefix%'` over an arbitrary expression.
pub fn expr_starts_with(expr: impl Into<SimpleExpr>, prefix: &str) -> SimpleExpr {
    Expr::expr(expr).like(escaped(like_starts(prefix)))
}
