pub mod ast;
pub mod parse;

pub use parse::parse_chain_text;
