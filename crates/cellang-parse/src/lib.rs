pub mod parser;
pub mod pretty;
pub mod tokenizer;

pub use parser::{BinOp, Expr, ExprKind, ParseError, UnaryOp, parse, parse_at};
pub use pretty::{AstFormat, render};
pub use tokenizer::{Func, LexError, Token, TokenKind, tokenize, tokenize_at};

// Re-export common types
pub use cellang_common::{DiagKind, Diagnostic, Value};
