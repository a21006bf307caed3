// Tokenizing strategies: streaming (chunked), collecting, columnar (bulk), and encoding

pub mod collect;
pub mod columnar;
pub mod encode;
pub mod streaming;

pub use collect::*;
pub use columnar::*;
pub use encode::*;
pub use streaming::*;
