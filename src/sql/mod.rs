//! SQL text helpers - identifier quoting and generated statements

mod template;

pub use template::*;
