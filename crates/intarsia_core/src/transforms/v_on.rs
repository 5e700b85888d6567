//! `v-on` directive transform (argument form only; `v-on="handlers"` is
//! folded into `mergeProps` via `toHandlers` by the element transform).

use crate::ast::*;
use crate::errors::ErrorCode;
use crate::runtime_helpers::RuntimeHelper;
use crate::transform::{DirectiveTransformResult, TransformContext};
use crate::utils::{camelize, to_handler_key};
use crate::String;

pub fn transform_on(
    dir: DirectiveNode,
    el: &ElementNode,
    ctx: &mut TransformContext,
) -> DirectiveTransformResult {
    let loc = dir.loc;
    let key = match dir.arg {
        Some(ExpressionNode::Simple(arg)) if arg.is_static => {
            // @my-event -> onMyEvent
            let name = to_handler_key(&camelize(&arg.content));
            SimpleExpressionNode::new(name, true, arg.loc).into_expr()
        }
        Some(arg) => {
            // Dynamic event name: toHandlerKey(arg) at runtime.
            ctx.helper(RuntimeHelper::ToHandlerKey);
            ExpressionNode::Compound(Box::new(CompoundExpressionNode {
                children: vec![
                    CompoundChild::Raw(String::from("_toHandlerKey(")),
                    CompoundChild::Expression(arg),
                    CompoundChild::Raw(String::from(")")),
                ],
                loc: loc.clone(),
            }))
        }
        None => {
            // The no-argument form never reaches a directive transform.
            return DirectiveTransformResult { props: Vec::new(), need_runtime: None };
        }
    };

    let exp_is_empty = match &dir.exp {
        None => true,
        Some(ExpressionNode::Simple(e)) => e.content.trim().is_empty(),
        Some(ExpressionNode::Compound(_)) => false,
    };
    let value: JsChildNode = if exp_is_empty {
        ctx.error(ErrorCode::VOnNoExpression, Some(loc.clone()));
        JsChildNode::Simple(Box::new(SimpleExpressionNode::new("() => {}", false, loc)))
    } else {
        let exp = match dir.exp {
            Some(exp) => exp,
            None => SimpleExpressionNode::new("() => {}", false, loc).into_expr(),
        };
        // Handler caching keeps the same function identity across renders.
        // Skipped inside v-once (already cached wholesale) and inside
        // v-for (the handler closes over scope variables).
        let cacheable = ctx.cache_handlers
            && !ctx.in_v_once
            && ctx.scopes.v_for == 0
            && el.tag_type != ElementType::Component
            && matches!(exp, ExpressionNode::Simple(_));
        if cacheable {
            let cached = ctx.cache(exp.into(), false);
            JsChildNode::Cache(Box::new(cached))
        } else {
            exp.into()
        }
    };

    DirectiveTransformResult {
        props: vec![Property { key, value }],
        need_runtime: None,
    }
}
