//! Static hoisting and constancy analysis.
//!
//! Runs after traversal, before root codegen. Fully constant subtrees are
//! moved into the root's hoist list and replaced by `_hoisted_N`
//! references; dynamic elements may still get their constant props
//! hoisted. Constancy results are memoized per element id because the
//! analysis revisits nodes while walking ancestors.

use std::cmp::min;

use crate::ast::*;
use crate::flags::PatchFlags;
use crate::runtime_helpers::RuntimeHelper;
use crate::transform::{get_vnode_block_helper, get_vnode_helper, TransformContext};

pub fn hoist_static(root: &mut RootNode, ctx: &mut TransformContext) {
    // A single element root becomes the root block itself and must stay.
    let do_not_hoist = match root.children.as_slice() {
        [TemplateChildNode::Element(el)] if el.tag_type != ElementType::Slot => Some(el.id),
        _ => None,
    };
    walk_children(&mut root.children, ctx, do_not_hoist);
}

/// Walk one child list. Returns `(hoisted, total)` so callers can decide
/// whether the entire list can be lifted as one array.
fn walk_children(
    children: &mut Vec<TemplateChildNode>,
    ctx: &mut TransformContext,
    do_not_hoist: Option<u32>,
) -> (usize, usize) {
    let total = children.len();
    let mut hoisted = 0usize;

    for child in children.iter_mut() {
        match child {
            TemplateChildNode::Element(el) if el.tag_type == ElementType::Element => {
                let allowed = do_not_hoist != Some(el.id);
                if element_constant_type(el, ctx) >= ConstantType::CanHoist && allowed {
                    if let Some(JsChildNode::VNodeCall(vnode)) = el.codegen_node.as_mut() {
                        vnode.patch_flag = Some(PatchFlags::HOISTED);
                    }
                    if let Some(codegen) = el.codegen_node.take() {
                        let reference = ctx.hoist(codegen);
                        el.codegen_node = Some(JsChildNode::Simple(Box::new(reference)));
                        hoisted += 1;
                    }
                    // The whole subtree moved; nothing left to visit.
                    continue;
                }
                // Dynamic element: its constant props may still be lifted.
                if let Some(JsChildNode::VNodeCall(vnode)) = el.codegen_node.as_mut() {
                    let flag_allows = match vnode.patch_flag {
                        None => true,
                        Some(flag) => {
                            !flag.is_sentinel()
                                && (flag - (PatchFlags::TEXT | PatchFlags::NEED_PATCH)).is_empty()
                        }
                    };
                    if flag_allows
                        && props_constant_type(vnode.props.as_ref()) >= ConstantType::CanHoist
                    {
                        if let Some(props) = vnode.props.take() {
                            let reference = ctx.hoist(props);
                            vnode.props = Some(JsChildNode::Simple(Box::new(reference)));
                        }
                    }
                }
            }
            TemplateChildNode::TextCall(text_call) => {
                let content_type = match &text_call.content {
                    TextSource::Text(_) => ConstantType::CanStringify,
                    TextSource::Interpolation(interp) => expr_constant_type(&interp.content),
                    TextSource::Compound(_) => ConstantType::NotConstant,
                };
                if content_type >= ConstantType::CanHoist {
                    if let Some(codegen) = text_call.codegen_node.take() {
                        let reference = ctx.hoist(codegen);
                        text_call.codegen_node = Some(JsChildNode::Simple(Box::new(reference)));
                        hoisted += 1;
                    }
                }
                continue;
            }
            _ => {}
        }
        descend(child, ctx);
    }

    (hoisted, total)
}

fn descend(child: &mut TemplateChildNode, ctx: &mut TransformContext) {
    match child {
        TemplateChildNode::Element(el) => {
            if let Some(codegen) = el.codegen_node.as_mut() {
                walk_js(codegen, ctx);
            }
        }
        TemplateChildNode::If(if_node) => {
            if let Some(chain) = if_node.codegen_node.as_mut() {
                walk_js(chain, ctx);
            }
        }
        TemplateChildNode::For(for_node) => {
            if let Some(codegen) = for_node.codegen_node.as_mut() {
                walk_js(codegen, ctx);
            }
        }
        _ => {}
    }
}

fn walk_js(node: &mut JsChildNode, ctx: &mut TransformContext) {
    match node {
        JsChildNode::VNodeCall(vnode) => walk_vnode(vnode, ctx),
        JsChildNode::Conditional(cond) => {
            walk_js(&mut cond.consequent, ctx);
            walk_js(&mut cond.alternate, ctx);
        }
        JsChildNode::Cache(cache) => walk_js(&mut cache.value, ctx),
        JsChildNode::Call(call) => walk_call(call, ctx),
        _ => {}
    }
}

fn walk_vnode(vnode: &mut VNodeCall, ctx: &mut TransformContext) {
    match vnode.children.as_mut() {
        Some(VNodeChildren::Children(children)) => {
            let (hoisted, total) = walk_children(children, ctx, None);
            if total > 0 && hoisted == total {
                // Every child moved out; lift the whole array too.
                let elements: Vec<JsArg> = children
                    .drain(..)
                    .filter_map(|child| match child {
                        TemplateChildNode::Element(mut el) => el.codegen_node.take().map(JsArg::Js),
                        TemplateChildNode::TextCall(mut tc) => {
                            tc.codegen_node.take().map(JsArg::Js)
                        }
                        _ => None,
                    })
                    .collect();
                let array = JsChildNode::Array(Box::new(ArrayExpression {
                    elements,
                    loc: SourceLocation::stub(),
                }));
                let reference = ctx.hoist(array);
                vnode.children = Some(VNodeChildren::Hoisted(Box::new(reference)));
            }
        }
        Some(VNodeChildren::Call(call)) => walk_call(call, ctx),
        _ => {}
    }
}

fn walk_call(call: &mut CallExpression, ctx: &mut TransformContext) {
    for arg in call.args.iter_mut() {
        match arg {
            JsArg::Js(node) => walk_js(node, ctx),
            JsArg::Children(children) => {
                walk_children(children, ctx, None);
            }
            JsArg::Template(child) => descend(child, ctx),
            _ => {}
        }
    }
}

pub(crate) fn expr_constant_type(expr: &ExpressionNode) -> ConstantType {
    match expr {
        ExpressionNode::Simple(e) => {
            if e.is_static {
                ConstantType::CanStringify
            } else {
                e.const_type
            }
        }
        ExpressionNode::Compound(_) => ConstantType::NotConstant,
    }
}

/// Constancy of a child node, memoized per element id.
pub(crate) fn get_constant_type(
    child: &mut TemplateChildNode,
    ctx: &mut TransformContext,
) -> ConstantType {
    match child {
        TemplateChildNode::Text(_) | TemplateChildNode::Comment(_) => ConstantType::CanStringify,
        TemplateChildNode::Interpolation(interp) => expr_constant_type(&interp.content),
        TemplateChildNode::Element(el) => element_constant_type(el, ctx),
        TemplateChildNode::TextCall(tc) => match &tc.content {
            TextSource::Text(_) => ConstantType::CanStringify,
            TextSource::Interpolation(interp) => expr_constant_type(&interp.content),
            TextSource::Compound(_) => ConstantType::NotConstant,
        },
        _ => ConstantType::NotConstant,
    }
}

fn element_constant_type(el: &mut ElementNode, ctx: &mut TransformContext) -> ConstantType {
    if el.tag_type != ElementType::Element {
        return ConstantType::NotConstant;
    }
    if let Some(&cached) = ctx.constant_cache.get(&el.id) {
        return cached;
    }
    let id = el.id;
    let tag = el.tag.clone();

    let result = match el.codegen_node.as_mut() {
        Some(JsChildNode::VNodeCall(vnode)) => {
            if vnode.is_block && tag != "svg" && tag != "foreignObject" {
                ConstantType::NotConstant
            } else if vnode.patch_flag.is_some() {
                ConstantType::NotConstant
            } else {
                let mut result = ConstantType::CanStringify;
                result = min(result, props_constant_type(vnode.props.as_ref()));
                if result != ConstantType::NotConstant {
                    match vnode.children.as_mut() {
                        Some(VNodeChildren::Children(children)) => {
                            for child in children.iter_mut() {
                                result = min(result, get_constant_type(child, ctx));
                                if result == ConstantType::NotConstant {
                                    break;
                                }
                            }
                        }
                        Some(VNodeChildren::Text(text)) => {
                            result = min(result, expr_constant_type(text));
                        }
                        Some(_) => result = ConstantType::NotConstant,
                        None => {}
                    }
                }
                if result > ConstantType::NotConstant && vnode.is_block {
                    // A forced block (svg) that turned out constant goes
                    // back to a plain vnode so it can be hoisted.
                    ctx.remove_helper(RuntimeHelper::OpenBlock);
                    ctx.remove_helper(get_vnode_block_helper(false));
                    vnode.is_block = false;
                    ctx.helper(get_vnode_helper(false));
                }
                result
            }
        }
        _ => ConstantType::NotConstant,
    };

    ctx.constant_cache.insert(id, result);
    result
}

fn props_constant_type(props: Option<&JsChildNode>) -> ConstantType {
    let Some(props) = props else {
        return ConstantType::CanStringify;
    };
    match props {
        JsChildNode::Object(obj) => {
            let mut result = ConstantType::CanStringify;
            for prop in &obj.properties {
                let key_type = expr_constant_type(&prop.key);
                if key_type == ConstantType::NotConstant {
                    return ConstantType::NotConstant;
                }
                result = min(result, key_type);
                let value_type = match &prop.value {
                    JsChildNode::Simple(e) => {
                        if e.is_static {
                            ConstantType::CanStringify
                        } else {
                            e.const_type
                        }
                    }
                    _ => ConstantType::NotConstant,
                };
                if value_type == ConstantType::NotConstant {
                    return ConstantType::NotConstant;
                }
                result = min(result, value_type);
            }
            result
        }
        JsChildNode::Simple(e) if e.is_static || e.const_type > ConstantType::NotConstant => {
            e.const_type
        }
        _ => ConstantType::NotConstant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{base_compile, CompileResult};
    use crate::options::{ParserOptions, TransformOptions};

    fn compile_hoisted(source: &str) -> CompileResult {
        let options = TransformOptions { hoist_static: true, ..Default::default() };
        base_compile(source, ParserOptions::default(), options)
    }

    fn fragment_children(result: &CompileResult) -> &Vec<TemplateChildNode> {
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => match &vnode.children {
                Some(VNodeChildren::Children(children)) => children,
                other => panic!("expected fragment children, got {other:?}"),
            },
            other => panic!("expected fragment codegen, got {other:?}"),
        }
    }

    #[test]
    fn test_static_sibling_is_hoisted() {
        let result = compile_hoisted("<div>{{ msg }}</div><p class=\"x\">static</p>");
        assert_eq!(result.root.hoists.len(), 1);
        match &result.root.hoists[0] {
            JsChildNode::VNodeCall(vnode) => {
                assert_eq!(vnode.patch_flag, Some(PatchFlags::HOISTED));
            }
            other => panic!("expected hoisted vnode, got {other:?}"),
        }
        let children = fragment_children(&result);
        match &children[1] {
            TemplateChildNode::Element(el) => match el.codegen_node.as_ref() {
                Some(JsChildNode::Simple(reference)) => {
                    assert_eq!(reference.content, "_hoisted_1");
                    assert_eq!(reference.const_type, ConstantType::CanHoist);
                }
                other => panic!("expected hoist reference, got {other:?}"),
            },
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_single_element_root_is_not_hoisted() {
        let result = compile_hoisted("<div class=\"x\">static</div>");
        assert!(result.root.hoists.is_empty());
    }

    #[test]
    fn test_dynamic_element_is_not_hoisted() {
        let result = compile_hoisted("<div/><p :id=\"x\"/>");
        assert!(result.root.hoists.iter().all(|h| {
            !matches!(h, JsChildNode::VNodeCall(v) if matches!(&v.tag, VNodeTag::Plain(t) if t == "p"))
        }));
    }

    #[test]
    fn test_props_hoisted_on_dynamic_element() {
        // Text is dynamic but the props object is fully static.
        let result = compile_hoisted("<span/><div class=\"a\" id=\"b\">{{ n }}</div>");
        let children = fragment_children(&result);
        match &children[1] {
            TemplateChildNode::Element(el) => match el.codegen_node.as_ref() {
                Some(JsChildNode::VNodeCall(vnode)) => {
                    assert_eq!(vnode.patch_flag, Some(PatchFlags::TEXT));
                    assert!(matches!(vnode.props, Some(JsChildNode::Simple(_))));
                }
                other => panic!("expected vnode, got {other:?}"),
            },
            other => panic!("expected element, got {other:?}"),
        }
        assert!(!result.root.hoists.is_empty());
    }

    #[test]
    fn test_nested_static_tree_hoists_once() {
        let result = compile_hoisted("<div>{{ d }}</div><ul><li>a</li><li>b</li></ul>");
        // The whole <ul> subtree is one hoist entry.
        assert_eq!(result.root.hoists.len(), 1);
    }

    #[test]
    fn test_all_static_children_hoist_as_array() {
        let result =
            compile_hoisted("<div :id=\"x\"><p>a</p><p>b</p></div>");
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => {
                assert!(matches!(vnode.children, Some(VNodeChildren::Hoisted(_))));
            }
            other => panic!("expected vnode codegen, got {other:?}"),
        }
        // Two element hoists plus the children array.
        assert_eq!(result.root.hoists.len(), 3);
    }

    #[test]
    fn test_v_if_branch_content_is_not_hoisted_as_root() {
        let result = compile_hoisted("<div v-if=\"ok\" class=\"x\"/>");
        // The branch vnode is a block and stays in place.
        assert!(result.root.hoists.is_empty());
    }

    #[test]
    fn test_static_content_inside_v_for_is_hoisted() {
        let result = compile_hoisted("<li v-for=\"i in xs\"><span class=\"dot\"/>{{ i }}</li>");
        assert_eq!(result.root.hoists.len(), 1);
    }
}
