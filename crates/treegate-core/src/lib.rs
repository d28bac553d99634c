// Treegate core library
//
// This crate owns the query pipeline: statement rewriting, the engine
// connection seam, type-directed value decoding (including embedded UAST
// tree payloads), and the execution/cancellation controller.

pub mod engine;
pub mod exec;
pub mod rewrite;
pub mod testkit;
pub mod typemap;
pub mod uast;
pub mod value;
