//! Docsmith Docstring - Source-to-source docstring transformations
//!
//! Locates class and function definitions in a parsed Python module,
//! builds the fragments a [`Generator`] documents, inserts or strips
//! docstrings, and proves that only documentation changed.

mod extract;
mod locate;
mod mutate;
mod pipeline;
mod preflight;
mod synthesize;
mod validate;

pub use extract::*;
pub use locate::*;
pub use mutate::*;
pub use pipeline::*;
pub use preflight::*;
pub use synthesize::*;
pub use validate::*;
