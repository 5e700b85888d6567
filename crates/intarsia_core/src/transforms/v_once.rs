//! `v-once` transform.
//!
//! The subtree renders once and is served from `_cache` afterwards. The
//! whole codegen of the host is wrapped in a cache expression with block
//! tracking paused while the cached value is produced.

use crate::ast::*;
use crate::errors::ErrorCode;
use crate::runtime_helpers::RuntimeHelper;
use crate::transform::{
    codegen_node_mut, Siblings, TransformContext, TransformNode, VisitAction,
};
use crate::utils::take_dir;

pub fn transform_once(
    node: TransformNode<'_>,
    _siblings: &mut Siblings<'_>,
    ctx: &mut TransformContext,
) -> VisitAction {
    let TransformNode::Child(TemplateChildNode::Element(el)) = node else {
        return VisitAction::None;
    };
    let Some(dir) = take_dir(el, |d| d.name == "once") else {
        return VisitAction::None;
    };
    if ctx.in_v_once {
        // Redundant nested v-once, the outer cache already covers it.
        ctx.warn(ErrorCode::VOnceDuplicate, Some(dir.loc));
        return VisitAction::None;
    }
    if !ctx.v_once_seen.insert(el.id) {
        return VisitAction::None;
    }

    ctx.in_v_once = true;
    ctx.helper(RuntimeHelper::SetBlockTracking);
    VisitAction::Exit(Box::new(|ctx, mut node| {
        ctx.in_v_once = false;
        // The host may have become an If or For container by now.
        let slot = match node.reborrow() {
            TransformNode::Child(child) => codegen_node_mut(child),
            _ => None,
        };
        if let Some(slot) = slot {
            if let Some(codegen) = slot.take() {
                let cached = ctx.cache(codegen, true);
                *slot = Some(JsChildNode::Cache(Box::new(cached)));
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{base_compile, CompileResult};
    use crate::errors::CompilerError;
    use crate::options::{ParserOptions, TransformOptions};

    fn compile(source: &str) -> CompileResult {
        base_compile(source, ParserOptions::default(), Default::default())
    }

    #[test]
    fn test_v_once_caches_the_vnode() {
        let result = compile("<div v-once>{{ msg }}</div>");
        assert!(result.errors.is_empty());
        assert_eq!(result.root.cached, 1);
        assert!(result.root.helpers.contains(&RuntimeHelper::SetBlockTracking));
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::Cache(cache)) => {
                assert_eq!(cache.index, 0);
                assert!(cache.need_pause_tracking);
                assert!(matches!(cache.value, JsChildNode::VNodeCall(_)));
            }
            other => panic!("expected cache codegen, got {other:?}"),
        }
    }

    #[test]
    fn test_v_once_with_v_if_caches_the_chain() {
        let result = compile("<div v-once v-if=\"ok\"/>");
        assert!(result.errors.is_empty());
        assert_eq!(result.root.cached, 1);
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::Cache(cache)) => {
                assert!(matches!(cache.value, JsChildNode::Conditional(_)));
            }
            other => panic!("expected cache codegen, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_v_once_warns_and_caches_once() {
        let result = compile("<div v-once><span v-once/></div>");
        assert_eq!(result.root.cached, 1);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::VOnceDuplicate));
    }

    #[test]
    fn test_duplicate_warning_uses_the_warn_channel() {
        use std::sync::atomic::{AtomicU32, Ordering};
        static WARNED: AtomicU32 = AtomicU32::new(0);
        static ERRORED: AtomicU32 = AtomicU32::new(0);
        fn on_warn(err: &CompilerError) {
            assert_eq!(err.code, ErrorCode::VOnceDuplicate);
            WARNED.fetch_add(1, Ordering::SeqCst);
        }
        fn on_error(_err: &CompilerError) {
            ERRORED.fetch_add(1, Ordering::SeqCst);
        }

        let options = TransformOptions {
            on_warn: Some(on_warn),
            on_error: Some(on_error),
            ..Default::default()
        };
        let result =
            base_compile("<div v-once><span v-once/></div>", ParserOptions::default(), options);
        assert_eq!(WARNED.load(Ordering::SeqCst), 1);
        assert_eq!(ERRORED.load(Ordering::SeqCst), 0);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::VOnceDuplicate));
    }
}
