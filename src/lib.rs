//! Translation of annotated C++ compute-kernel structs into GLSL compute
//! shaders.
//!
//! A kernel is a struct marked `[[clang::annotate("kernel")]]` that
//! declares a constant `fileLocation` and a `main` method. The same struct
//! can run on the CPU through the host runtime; this crate produces the
//! GPU side: one `<fileLocation>.comp` per kernel.
//!
//! ```no_run
//! use std::path::Path;
//! use tinycompute::transpile::{transpile_file, Options};
//!
//! let report = transpile_file(Path::new("kernels.h"), &Options::default())?;
//! for outcome in &report.outcomes {
//!     println!("{}: {:?}", outcome.descriptor.name, outcome.status);
//! }
//! # Ok::<(), tinycompute::transpile::Error>(())
//! ```

pub mod ast;
pub mod config;
pub mod diagnostic;
pub mod syntax;
pub mod transpile;
pub mod typecheck;

pub use syntax::source::SourceFile;
pub use syntax::span;
pub use transpile::{transpile_file, transpile_source, Options, RunReport};
