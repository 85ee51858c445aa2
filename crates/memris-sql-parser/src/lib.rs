//! Parser for the embedded JPQL-like query language (spec.md §4.6):
//! `SELECT`/`UPDATE`/`DELETE` over an entity, lowered directly into the
//! same `LogicalQuery` shape the derived-method planner produces.

mod error;
mod lexer;
mod parser;

pub use error::{LexError, ParseError};
pub use lexer::{tokenize, Keyword, Token};
pub use parser::{parse, QueryContext, ReturnArity};
