// Core primitives for CSV tokenizing

pub mod dialect;
pub mod field;
pub mod row;
pub mod scanner;

pub use dialect::*;
pub use field::*;
pub use row::*;
pub use scanner::*;
