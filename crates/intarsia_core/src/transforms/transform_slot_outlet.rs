//! `<slot>` outlet transform.
//!
//! A slot outlet compiles to `renderSlot(_ctx.$slots, name, props?,
//! fallback?)`; remaining props on the outlet are forwarded to the slot.

use crate::ast::*;
use crate::runtime_helpers::RuntimeHelper;
use crate::transform::{Siblings, TransformContext, TransformNode, VisitAction};
use crate::String;

pub fn transform_slot_outlet(
    node: TransformNode<'_>,
    _siblings: &mut Siblings<'_>,
    _ctx: &mut TransformContext,
) -> VisitAction {
    let applies = matches!(
        &node,
        TransformNode::Child(TemplateChildNode::Element(el)) if el.tag_type == ElementType::Slot
    );
    if !applies {
        return VisitAction::None;
    }
    VisitAction::Exit(Box::new(|ctx, node| {
        let TransformNode::Child(TemplateChildNode::Element(el)) = node else {
            return;
        };
        ctx.helper(RuntimeHelper::RenderSlot);

        let name = take_slot_name(el);
        let mut args = vec![
            JsArg::Raw(String::from("_ctx.$slots")),
            JsArg::Expression(name),
        ];

        let props = super::transform_element::build_props(el, ctx);
        if let Some(props) = props.props {
            args.push(JsArg::Js(props));
        }

        if !el.children.is_empty() {
            if args.len() == 2 {
                // Fallback content needs the props slot filled.
                args.push(JsArg::Raw(String::from("{}")));
            }
            args.push(JsArg::Children(std::mem::take(&mut el.children)));
        }

        let call = CallExpression {
            callee: RuntimeHelper::RenderSlot,
            args,
            loc: el.loc.clone(),
        };
        el.codegen_node = Some(JsChildNode::Call(Box::new(call)));
    }))
}

/// Remove and return the outlet's name: a static string for plain or
/// absent names, the bound expression for `:name`.
fn take_slot_name(el: &mut ElementNode) -> ExpressionNode {
    let position = el.props.iter().position(|p| match p {
        PropNode::Attribute(attr) => attr.name == "name",
        PropNode::Directive(dir) => {
            dir.name == "bind" && dir.arg.as_ref().and_then(|a| a.static_content()) == Some("name")
        }
    });
    match position.map(|i| el.props.remove(i)) {
        Some(PropNode::Attribute(attr)) => {
            let content = attr.value.map(|v| v.content).unwrap_or_default();
            SimpleExpressionNode::new(content, true, attr.loc).into_expr()
        }
        Some(PropNode::Directive(dir)) => match dir.exp {
            Some(exp) => exp,
            None => SimpleExpressionNode::new("default", true, dir.loc).into_expr(),
        },
        None => SimpleExpressionNode::new("default", true, SourceLocation::stub()).into_expr(),
    }
}
