//! Books API application library
//!
//! Application modules mounted by the `books-app` binary.

pub mod modules;

pub use modules::*;
