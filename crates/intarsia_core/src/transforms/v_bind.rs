//! `v-bind` directive transform (argument form only; the spread form is
//! folded into `mergeProps` by the element transform).

use crate::ast::*;
use crate::errors::ErrorCode;
use crate::transform::{DirectiveTransformResult, TransformContext};
use crate::utils::camelize;
use crate::String;

pub fn transform_bind(
    dir: DirectiveNode,
    _el: &ElementNode,
    ctx: &mut TransformContext,
) -> DirectiveTransformResult {
    let loc = dir.loc;
    let mut arg = match dir.arg {
        Some(arg) => arg,
        None => {
            // Unreachable through the element transform; fail soft.
            ctx.error(ErrorCode::VBindNoExpression, Some(loc));
            return DirectiveTransformResult { props: Vec::new(), need_runtime: None };
        }
    };

    if let ExpressionNode::Simple(key) = &mut arg {
        if key.is_static {
            if dir.modifiers.iter().any(|m| m == "camel") {
                key.content = camelize(&key.content);
            }
            if dir.modifiers.iter().any(|m| m == "prop") {
                prefix_key(key, '.');
            } else if dir.modifiers.iter().any(|m| m == "attr") {
                prefix_key(key, '^');
            }
        }
    }

    let exp_is_empty = match &dir.exp {
        None => true,
        Some(ExpressionNode::Simple(e)) => e.content.trim().is_empty(),
        Some(ExpressionNode::Compound(_)) => false,
    };
    if exp_is_empty {
        ctx.error(ErrorCode::VBindNoExpression, Some(loc.clone()));
        let value = SimpleExpressionNode::new("", true, loc);
        return DirectiveTransformResult {
            props: vec![Property { key: arg, value: JsChildNode::Simple(Box::new(value)) }],
            need_runtime: None,
        };
    }

    let exp = match dir.exp {
        Some(exp) => exp,
        None => SimpleExpressionNode::new("", true, loc).into_expr(),
    };
    DirectiveTransformResult {
        props: vec![Property { key: arg, value: exp.into() }],
        need_runtime: None,
    }
}

fn prefix_key(key: &mut SimpleExpressionNode, prefix: char) {
    let mut content = std::string::String::with_capacity(key.content.len() + 1);
    content.push(prefix);
    content.push_str(&key.content);
    key.content = String::from(content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{base_compile, CompileResult};
    use crate::options::ParserOptions;

    fn compile(source: &str) -> CompileResult {
        base_compile(source, ParserOptions::default(), Default::default())
    }

    fn first_prop(result: &CompileResult) -> &Property {
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => match &vnode.props {
                Some(JsChildNode::Object(obj)) => &obj.properties[0],
                other => panic!("expected object props, got {other:?}"),
            },
            other => panic!("expected vnode codegen, got {other:?}"),
        }
    }

    #[test]
    fn test_basic_binding() {
        let result = compile("<div :title=\"t\"/>");
        let prop = first_prop(&result);
        assert_eq!(prop.key.static_content(), Some("title"));
        match &prop.value {
            JsChildNode::Simple(e) => {
                assert_eq!(e.content, "t");
                assert!(!e.is_static);
            }
            other => panic!("expected simple value, got {other:?}"),
        }
    }

    #[test]
    fn test_camel_modifier() {
        let result = compile("<svg :view-box.camel=\"vb\"/>");
        let prop = first_prop(&result);
        assert_eq!(prop.key.static_content(), Some("viewBox"));
    }

    #[test]
    fn test_prop_shorthand_prefixes_key() {
        let result = compile("<div :textContent.prop=\"text\"/>");
        let prop = first_prop(&result);
        assert_eq!(prop.key.static_content(), Some(".textContent"));
    }

    #[test]
    fn test_attr_modifier_prefixes_key() {
        let result = compile("<div :width.attr=\"w\"/>");
        let prop = first_prop(&result);
        assert_eq!(prop.key.static_content(), Some("^width"));
    }

    #[test]
    fn test_missing_expression_errors() {
        let result = compile("<div :title=\"\"/>");
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::VBindNoExpression));
    }
}
