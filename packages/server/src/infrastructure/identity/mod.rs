//! Identity resolver 実装

pub mod token_table;

pub use token_table::{TokenTable, TokenTableError};
