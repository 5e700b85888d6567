//! HTML/DOM option layer over the platform-agnostic compiler core.
//!
//! Supplies the browser tag tables, namespace rules, text modes and a
//! full entity decoder, plus a [`compile`] convenience wrapper with
//! static hoisting enabled.

pub mod options;

use intarsia_core::compile::{base_compile, CompileResult};
use intarsia_core::options::{ParserOptions, TransformOptions};

pub use intarsia_core;

/// Parser options for browser HTML templates.
pub fn parser_options() -> ParserOptions {
    ParserOptions {
        is_void_tag: options::is_void_tag,
        is_pre_tag: options::is_pre_tag,
        is_native_tag: Some(options::is_native_tag),
        get_namespace: options::get_namespace,
        get_text_mode: options::get_text_mode,
        decode_entities: options::decode_entities,
        ..ParserOptions::default()
    }
}

/// Compile an HTML template with the default DOM setup.
pub fn compile(source: &str) -> CompileResult {
    compile_with(source, TransformOptions { hoist_static: true, ..Default::default() })
}

/// Compile with caller-provided transform options on top of the DOM
/// parser options.
pub fn compile_with(source: &str, transform_options: TransformOptions) -> CompileResult {
    base_compile(source, parser_options(), transform_options)
}
