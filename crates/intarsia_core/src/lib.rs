//! Platform-agnostic template compiler front-end.
//!
//! The pipeline has three stages plus a finalizer:
//!
//! 1. [`parser::base_parse`] — recursive-descent parse into a positioned AST
//! 2. [`transform::transform`] — visitor-based rewriting into codegen IR
//! 3. [`transforms::hoist_static`] — constancy analysis and static hoisting
//! 4. root codegen — the finalized [`ast::RootNode`] carries everything a
//!    code generator needs
//!
//! [`compile::base_compile`] wires the stages together with the default
//! transform preset.

pub use compact_str::CompactString as String;
pub use rustc_hash::{FxHashMap, FxHashSet};

pub mod ast;
pub mod compile;
pub mod errors;
pub mod flags;
pub mod options;
pub mod parser;
pub mod runtime_helpers;
pub mod transform;
pub mod transforms;
pub mod utils;

pub use ast::*;
pub use compile::{base_compile, get_base_transform_preset, CompileResult};
pub use errors::{CompilerError, DiagnosticCategory, ErrorCode};
pub use flags::PatchFlags;
pub use options::{ParserOptions, TextMode, TransformOptions, WhitespaceStrategy};
pub use parser::{base_parse, ParseResult};
pub use runtime_helpers::RuntimeHelper;
