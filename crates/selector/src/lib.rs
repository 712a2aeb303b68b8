pub mod ast;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod node;
pub mod operators;
pub mod parser;
pub mod program;

pub use ast::{AttrStep, AttrTest, SelectorSegment, SuffixKind, SuffixSet, SuffixValue};
pub use engine::{Item, Resolution, resolve};
pub use error::SelectorError;
pub use node::{AttrValue, Node};
pub use parser::compile;
pub use program::{Cursor, SelectorProgram};

// Re-export test utilities for integration testing in downstream crates
pub use node::tests;
