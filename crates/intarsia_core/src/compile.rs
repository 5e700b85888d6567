//! End-to-end compilation entry point.

use crate::errors::CompilerError;
use crate::options::{ParserOptions, TransformOptions};
use crate::parser::base_parse;
use crate::transform::{transform, DirectiveTransform, NodeTransform};
use crate::transforms;
use crate::FxHashMap;
use crate::RootNode;

/// The finalized root plus every diagnostic from both stages.
#[derive(Debug)]
pub struct CompileResult {
    pub root: RootNode,
    pub errors: Vec<CompilerError>,
}

/// Platform-agnostic transform preset. Order matters: structural
/// directives must see their host before the element transform consumes
/// it, and text merging runs last so it sees settled children.
pub fn get_base_transform_preset() -> (
    Vec<NodeTransform>,
    FxHashMap<&'static str, DirectiveTransform>,
) {
    let node_transforms: Vec<NodeTransform> = vec![
        transforms::transform_once,
        transforms::transform_if,
        transforms::transform_for,
        transforms::transform_slot_outlet,
        transforms::transform_element,
        transforms::track_slot_scopes,
        transforms::transform_text,
    ];
    let mut directive_transforms: FxHashMap<&'static str, DirectiveTransform> =
        FxHashMap::default();
    directive_transforms.insert("on", transforms::transform_on as DirectiveTransform);
    directive_transforms.insert("bind", transforms::transform_bind as DirectiveTransform);
    (node_transforms, directive_transforms)
}

/// Parse and transform `source`. The base preset always runs; transforms
/// in `transform_options` are appended after it, and its directive table
/// can override the built-in `on` / `bind` entries.
pub fn base_compile(
    source: &str,
    parser_options: ParserOptions,
    transform_options: TransformOptions,
) -> CompileResult {
    let parse_result = base_parse(source, parser_options);
    let mut root = parse_result.root;
    let mut errors = parse_result.errors;

    let TransformOptions {
        node_transforms: extra_transforms,
        directive_transforms: extra_directives,
        hoist_static,
        cache_handlers,
        is_builtin_component,
        is_custom_element,
        on_error,
        on_warn,
    } = transform_options;
    let (mut node_transforms, mut directive_transforms) = get_base_transform_preset();
    node_transforms.extend(extra_transforms);
    directive_transforms.extend(extra_directives);

    let options = TransformOptions {
        node_transforms,
        directive_transforms,
        hoist_static,
        cache_handlers,
        is_builtin_component,
        is_custom_element,
        on_error,
        on_warn,
    };
    errors.extend(transform(&mut root, options));

    CompileResult { root, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::runtime_helpers::RuntimeHelper;

    #[test]
    fn test_full_pipeline() {
        let result = base_compile(
            "<div id=\"app\"><p v-if=\"ok\">{{ msg }}</p></div>",
            ParserOptions::default(),
            TransformOptions { hoist_static: true, ..Default::default() },
        );
        assert!(result.errors.is_empty());
        assert!(result.root.transformed);
        assert!(result.root.codegen_node.is_some());
        assert!(result.root.helpers.contains(&RuntimeHelper::OpenBlock));
        assert!(result.root.helpers.contains(&RuntimeHelper::ToDisplayString));
        assert!(result.root.helpers.contains(&RuntimeHelper::CreateComment));
    }

    #[test]
    fn test_parse_errors_are_carried_through() {
        let result = base_compile(
            "<div><span></div>",
            ParserOptions::default(),
            Default::default(),
        );
        assert!(!result.errors.is_empty());
        assert!(result.root.codegen_node.is_some());
    }

    #[test]
    fn test_lone_interpolation_root() {
        let result = base_compile("{{ msg }}", ParserOptions::default(), Default::default());
        assert!(result.errors.is_empty());
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::Call(call)) => {
                assert_eq!(call.callee, RuntimeHelper::ToDisplayString);
                assert_eq!(call.args.len(), 1);
            }
            other => panic!("expected display-string call, got {other:?}"),
        }
        assert!(result.root.helpers.contains(&RuntimeHelper::ToDisplayString));
    }

    #[test]
    fn test_mixed_text_root_promotes_compound() {
        let result =
            base_compile("hello {{ name }}", ParserOptions::default(), Default::default());
        assert!(result.errors.is_empty());
        assert!(matches!(
            result.root.codegen_node,
            Some(JsChildNode::Compound(_))
        ));
    }

    #[test]
    fn test_empty_template() {
        let result = base_compile("", ParserOptions::default(), Default::default());
        assert!(result.errors.is_empty());
        assert!(result.root.children.is_empty());
        assert!(result.root.codegen_node.is_none());
        assert!(result.root.helpers.is_empty());
    }
}
