//! `v-if` / `v-else-if` / `v-else` transform.
//!
//! The first branch replaces its host element with an [`IfNode`]; later
//! branches attach themselves to the nearest `IfNode` among the preceding
//! siblings and remove their own host from the tree. Codegen is a chain of
//! conditional expressions ending in a comment placeholder.

use crate::ast::*;
use crate::errors::ErrorCode;
use crate::flags::PatchFlags;
use crate::runtime_helpers::RuntimeHelper;
use crate::transform::{
    convert_to_block, create_vnode_call, traverse_branch, Siblings, TransformContext,
    TransformNode, VisitAction,
};
use crate::utils::{find_dir, find_prop, is_template_node, take_dir};
use crate::String;

pub fn transform_if(
    node: TransformNode<'_>,
    siblings: &mut Siblings<'_>,
    ctx: &mut TransformContext,
) -> VisitAction {
    let TransformNode::Child(slot) = node else {
        return VisitAction::None;
    };
    let dir = match &mut *slot {
        TemplateChildNode::Element(el) => {
            match take_dir(el, |d| matches!(d.name.as_str(), "if" | "else-if" | "else")) {
                Some(dir) => dir,
                None => return VisitAction::None,
            }
        }
        _ => return VisitAction::None,
    };

    let mut exp = dir.exp;
    let exp_is_empty = match &exp {
        None => true,
        Some(ExpressionNode::Simple(e)) => e.content.trim().is_empty(),
        Some(ExpressionNode::Compound(_)) => false,
    };
    if dir.name != "else" && exp_is_empty {
        ctx.error(ErrorCode::VIfNoExpression, Some(dir.loc.clone()));
        exp = Some(SimpleExpressionNode::new("true", false, dir.loc.clone()).into_expr());
    }
    let condition = if dir.name == "else" { None } else { exp };

    if dir.name == "if" {
        let loc = slot.loc().clone();
        let branch = create_if_branch(slot, condition);
        *slot = TemplateChildNode::If(Box::new(IfNode {
            branches: vec![branch],
            codegen_node: None,
            loc,
        }));
        return VisitAction::Exit(Box::new(|ctx, node| {
            let TransformNode::Child(TemplateChildNode::If(if_node)) = node else {
                return;
            };
            let consequent = create_branch_codegen(ctx, &mut if_node.branches[0], 0);
            let test = match if_node.branches[0].condition.clone() {
                Some(test) => test,
                None => return,
            };
            if_node.codegen_node = Some(JsChildNode::Conditional(Box::new(
                ConditionalExpression {
                    test,
                    consequent,
                    alternate: comment_placeholder(ctx),
                    newline: true,
                },
            )));
        }));
    }

    // v-else-if / v-else: attach to the preceding IfNode.
    let prev_if = find_adjacent_if(siblings);
    let Some(prev_if) = prev_if else {
        ctx.error(ErrorCode::VElseNoAdjacentIf, Some(dir.loc));
        return VisitAction::None;
    };

    let branch = create_if_branch(slot, condition);
    if let Some(key) = branch_key(&branch) {
        for existing in &prev_if.branches {
            if existing.user_key.is_some() && branch_key(existing) == Some(key) {
                ctx.error(ErrorCode::VIfSameKey, Some(branch.loc.clone()));
                break;
            }
        }
    }

    prev_if.branches.push(branch);
    let index = prev_if.branches.len() - 1;
    // The host node is about to be removed, so the engine will never
    // descend into this branch; do it here.
    traverse_branch(ctx, &mut prev_if.branches[index]);

    let codegen = create_branch_codegen(ctx, &mut prev_if.branches[index], index as u32);
    let test = prev_if.branches[index].condition.clone();
    if let Some(chain) = prev_if.codegen_node.as_mut() {
        if let Some(tail) = deepest_conditional(chain) {
            match test {
                Some(test) => {
                    let prev_alternate = std::mem::replace(
                        &mut tail.alternate,
                        JsChildNode::Simple(Box::new(SimpleExpressionNode::new(
                            "",
                            true,
                            SourceLocation::stub(),
                        ))),
                    );
                    tail.alternate = JsChildNode::Conditional(Box::new(ConditionalExpression {
                        test,
                        consequent: codegen,
                        alternate: prev_alternate,
                        newline: true,
                    }));
                }
                None => tail.alternate = codegen,
            }
        }
    }

    ctx.remove_node();
    VisitAction::None
}

/// Wrap the host node into a branch. A `<template>` host without `v-for`
/// contributes its children directly.
fn create_if_branch(slot: &mut TemplateChildNode, condition: Option<ExpressionNode>) -> IfBranchNode {
    let loc = slot.loc().clone();
    let owned = std::mem::replace(
        slot,
        TemplateChildNode::Text(Box::new(TextNode {
            content: String::default(),
            loc: SourceLocation::stub(),
        })),
    );
    match owned {
        TemplateChildNode::Element(mut el) => {
            let user_key = find_prop(&el, "key").cloned();
            if is_template_node(&el) && find_dir(&el, "for").is_none() {
                IfBranchNode {
                    condition,
                    children: std::mem::take(&mut el.children),
                    user_key,
                    is_template_if: true,
                    loc,
                }
            } else {
                IfBranchNode {
                    condition,
                    children: vec![TemplateChildNode::Element(el)],
                    user_key,
                    is_template_if: false,
                    loc,
                }
            }
        }
        other => IfBranchNode {
            condition,
            children: vec![other],
            user_key: None,
            is_template_if: false,
            loc,
        },
    }
}

/// Scan the earlier siblings backwards past comments and whitespace for
/// the IfNode this branch belongs to.
fn find_adjacent_if<'a>(siblings: &'a mut Siblings<'_>) -> Option<&'a mut IfNode> {
    let index = siblings.index;
    let nodes = siblings.nodes.as_deref_mut()?;
    for candidate in nodes[..index].iter_mut().rev() {
        match candidate {
            TemplateChildNode::Comment(_) => continue,
            TemplateChildNode::Text(t) if t.content.trim().is_empty() => continue,
            TemplateChildNode::If(if_node) => return Some(if_node),
            _ => return None,
        }
    }
    None
}

fn branch_key(branch: &IfBranchNode) -> Option<&str> {
    match branch.user_key.as_ref()? {
        PropNode::Attribute(attr) => attr.value.as_ref().map(|v| v.content.as_str()),
        PropNode::Directive(dir) => match dir.exp.as_ref()? {
            ExpressionNode::Simple(e) => Some(e.content.as_str()),
            ExpressionNode::Compound(_) => None,
        },
    }
}

fn deepest_conditional(node: &mut JsChildNode) -> Option<&mut ConditionalExpression> {
    match node {
        JsChildNode::Conditional(cond) => {
            if matches!(cond.alternate, JsChildNode::Conditional(_)) {
                deepest_conditional(&mut cond.alternate)
            } else {
                Some(cond)
            }
        }
        _ => None,
    }
}

fn comment_placeholder(ctx: &mut TransformContext) -> JsChildNode {
    ctx.helper(RuntimeHelper::CreateComment);
    JsChildNode::Call(Box::new(CallExpression::new(
        RuntimeHelper::CreateComment,
        vec![
            JsArg::Raw(String::from("\"v-if\"")),
            JsArg::Raw(String::from("true")),
        ],
    )))
}

/// Codegen for one branch: a single vnode child is reused directly with a
/// key injected, anything else gets a keyed fragment wrapper.
pub(crate) fn create_branch_codegen(
    ctx: &mut TransformContext,
    branch: &mut IfBranchNode,
    index: u32,
) -> JsChildNode {
    let key_prop = branch_key_property(branch, index);

    if branch.children.len() == 1 {
        match &mut branch.children[0] {
            TemplateChildNode::Element(el) if el.codegen_node.is_some() => {
                if let Some(mut codegen) = el.codegen_node.take() {
                    if let JsChildNode::VNodeCall(vnode) = &mut codegen {
                        super::transform_element::inject_prop(vnode, key_prop, ctx);
                        convert_to_block(vnode, ctx);
                    }
                    branch.children.clear();
                    return codegen;
                }
            }
            TemplateChildNode::For(for_node) if for_node.codegen_node.is_some() => {
                // Already a keyed/unkeyed fragment block of its own.
                if let Some(codegen) = for_node.codegen_node.take() {
                    branch.children.clear();
                    return codegen;
                }
            }
            _ => {}
        }
    }

    let children = std::mem::take(&mut branch.children);
    let vnode = create_vnode_call(
        ctx,
        VNodeTag::Helper(RuntimeHelper::Fragment),
        Some(JsChildNode::Object(Box::new(ObjectExpression::new(vec![key_prop])))),
        Some(VNodeChildren::Children(children)),
        Some(PatchFlags::STABLE_FRAGMENT),
        None,
        None,
        true,
        false,
        false,
        branch.loc.clone(),
    );
    JsChildNode::VNodeCall(Box::new(vnode))
}

fn branch_key_property(branch: &IfBranchNode, index: u32) -> Property {
    let key = SimpleExpressionNode::new("key", true, SourceLocation::stub()).into_expr();
    let value = match branch.user_key.clone() {
        Some(PropNode::Attribute(attr)) => {
            let content = attr.value.map(|v| v.content).unwrap_or_default();
            JsChildNode::Simple(Box::new(SimpleExpressionNode::new(content, true, attr.loc)))
        }
        Some(PropNode::Directive(dir)) => match dir.exp {
            Some(exp) => exp.into(),
            None => JsChildNode::Simple(Box::new(SimpleExpressionNode::new(
                format_index(index),
                false,
                SourceLocation::stub(),
            ))),
        },
        None => JsChildNode::Simple(Box::new(
            SimpleExpressionNode::new(format_index(index), false, SourceLocation::stub())
                .with_const_type(ConstantType::CanHoist),
        )),
    };
    Property { key, value }
}

fn format_index(index: u32) -> String {
    String::from(index.to_string())
}
