//! `v-for` transform.
//!
//! `v-for="(item, key, index) in source"` replaces its host with a
//! [`ForNode`] and compiles to an untracked fragment block whose children
//! come from a `renderList` call.

use crate::ast::*;
use crate::errors::ErrorCode;
use crate::flags::PatchFlags;
use crate::parser::advance_position;
use crate::runtime_helpers::RuntimeHelper;
use crate::transform::{
    convert_to_block, create_vnode_call, Siblings, TransformContext, TransformNode, VisitAction,
};
use crate::utils::{find_prop, is_template_node, take_dir};
use crate::String;

pub fn transform_for(
    node: TransformNode<'_>,
    _siblings: &mut Siblings<'_>,
    ctx: &mut TransformContext,
) -> VisitAction {
    let TransformNode::Child(slot) = node else {
        return VisitAction::None;
    };
    let dir = match &mut *slot {
        TemplateChildNode::Element(el) => match take_dir(el, |d| d.name == "for") {
            Some(dir) => dir,
            None => return VisitAction::None,
        },
        _ => return VisitAction::None,
    };

    let exp = match dir.exp {
        Some(ExpressionNode::Simple(e)) if !e.content.trim().is_empty() => e,
        _ => {
            ctx.error(ErrorCode::VForNoExpression, Some(dir.loc));
            return VisitAction::None;
        }
    };
    let Some(parsed) = parse_for_expression(&exp) else {
        ctx.error(ErrorCode::VForMalformedExpression, Some(dir.loc));
        return VisitAction::None;
    };

    let loc = slot.loc().clone();
    let owned = std::mem::replace(
        slot,
        TemplateChildNode::Text(Box::new(TextNode {
            content: String::default(),
            loc: SourceLocation::stub(),
        })),
    );
    let (children, keyed) = match owned {
        TemplateChildNode::Element(mut el) => {
            let keyed = find_prop(&el, "key").is_some();
            if is_template_node(&el) {
                let keyed = keyed
                    || el.children.iter().any(|c| {
                        matches!(c, TemplateChildNode::Element(child) if find_prop(child, "key").is_some())
                    });
                (std::mem::take(&mut el.children), keyed)
            } else {
                (vec![TemplateChildNode::Element(el)], keyed)
            }
        }
        other => (vec![other], false),
    };

    *slot = TemplateChildNode::For(Box::new(ForNode {
        source: parsed.source,
        value_alias: parsed.value,
        key_alias: parsed.key,
        index_alias: parsed.index,
        children,
        codegen_node: None,
        loc,
    }));

    ctx.scopes.v_for += 1;
    ctx.helper(RuntimeHelper::RenderList);

    VisitAction::Exit(Box::new(move |ctx, node| {
        ctx.scopes.v_for -= 1;
        let TransformNode::Child(TemplateChildNode::For(for_node)) = node else {
            return;
        };
        for_node.codegen_node = Some(build_for_codegen(ctx, for_node, keyed));
    }))
}

/// Fragment block over `renderList(source, (aliases) => child)`.
fn build_for_codegen(ctx: &mut TransformContext, for_node: &mut ForNode, keyed: bool) -> JsChildNode {
    let params = render_item_params(for_node);
    let mut args = vec![
        JsArg::Expression(for_node.source.clone()),
        JsArg::Raw(params),
    ];

    if for_node.children.len() == 1 {
        if let TemplateChildNode::Element(el) = &mut for_node.children[0] {
            if let Some(mut codegen) = el.codegen_node.take() {
                // Each iteration opens its own block.
                if let JsChildNode::VNodeCall(vnode) = &mut codegen {
                    convert_to_block(vnode, ctx);
                }
                for_node.children.clear();
                args.push(JsArg::Js(codegen));
            }
        }
    }
    if for_node.children.len() > 1 || !matches!(args.last(), Some(JsArg::Js(_))) {
        // Multi-child template body renders a nested fragment per item.
        let children = std::mem::take(&mut for_node.children);
        if !children.is_empty() {
            let item = create_vnode_call(
                ctx,
                VNodeTag::Helper(RuntimeHelper::Fragment),
                None,
                Some(VNodeChildren::Children(children)),
                Some(PatchFlags::STABLE_FRAGMENT),
                None,
                None,
                true,
                false,
                false,
                for_node.loc.clone(),
            );
            args.push(JsArg::Js(JsChildNode::VNodeCall(Box::new(item))));
        }
    }

    let render_list = CallExpression {
        callee: RuntimeHelper::RenderList,
        args,
        loc: for_node.loc.clone(),
    };
    let patch_flag = if keyed {
        PatchFlags::KEYED_FRAGMENT
    } else {
        PatchFlags::UNKEYED_FRAGMENT
    };
    let vnode = create_vnode_call(
        ctx,
        VNodeTag::Helper(RuntimeHelper::Fragment),
        None,
        Some(VNodeChildren::Call(Box::new(render_list))),
        Some(patch_flag),
        None,
        None,
        true,
        true,
        false,
        for_node.loc.clone(),
    );
    JsChildNode::VNodeCall(Box::new(vnode))
}

/// `(item, key, index)` with absent trailing aliases dropped and absent
/// middle aliases kept as `_`.
fn render_item_params(for_node: &ForNode) -> String {
    let alias = |e: &Option<ExpressionNode>| -> Option<std::string::String> {
        e.as_ref().map(|e| e.loc().source.to_string())
    };
    let mut parts = vec![alias(&for_node.value_alias), alias(&for_node.key_alias), alias(&for_node.index_alias)];
    while matches!(parts.last(), Some(None)) {
        parts.pop();
    }
    let mut out = std::string::String::from("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(part.as_deref().unwrap_or("_"));
    }
    out.push_str(") =>");
    String::from(out)
}

pub(crate) struct ForParseResult {
    pub source: ExpressionNode,
    pub value: Option<ExpressionNode>,
    pub key: Option<ExpressionNode>,
    pub index: Option<ExpressionNode>,
}

/// Split `LHS in RHS` / `LHS of RHS` without parsing the expressions
/// themselves. The left side may be `item`, `(item, key)` or
/// `(item, key, index)`; destructuring patterns pass through opaquely.
pub(crate) fn parse_for_expression(exp: &SimpleExpressionNode) -> Option<ForParseResult> {
    let content = exp.content.as_str();
    let (lhs_end, rhs_start) = find_in_or_of(content)?;
    let rhs = &content[rhs_start..];
    let rhs_trimmed = rhs.trim();
    if rhs_trimmed.is_empty() {
        return None;
    }
    let rhs_offset = rhs_start + (rhs.len() - rhs.trim_start().len());
    let source = sub_expression(exp, rhs_offset, rhs_trimmed.len(), false);

    let lhs = &content[..lhs_end];
    let lhs_trimmed = lhs.trim();
    if lhs_trimmed.is_empty() {
        return None;
    }
    let mut lhs_offset = lhs.len() - lhs.trim_start().len();
    let mut inner = lhs_trimmed;
    if inner.starts_with('(') && inner.ends_with(')') {
        lhs_offset += 1;
        inner = &inner[1..inner.len() - 1];
    }

    let mut aliases: [Option<ExpressionNode>; 3] = [None, None, None];
    for (i, (start, part)) in split_top_level(inner).into_iter().enumerate() {
        if i >= 3 {
            return None;
        }
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let part_offset = lhs_offset + start + (part.len() - part.trim_start().len());
        aliases[i] = Some(sub_expression(exp, part_offset, trimmed.len(), false).into_expr());
    }
    let [value, key, index] = aliases;

    Some(ForParseResult { source: source.into_expr(), value, key, index })
}

/// Byte ranges of the pieces of `s` separated by top-level commas.
fn split_top_level(s: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push((start, &s[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push((start, &s[start..]));
    parts
}

/// Find the first top-level whitespace-delimited `in` / `of` separator.
/// Returns (end of the LHS, start of the RHS).
fn find_in_or_of(content: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let bytes = content.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if depth == 0 && b.is_ascii_whitespace() => {
                let lhs_end = i;
                let mut j = i;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                let rest = &bytes[j..];
                if (rest.starts_with(b"in") || rest.starts_with(b"of"))
                    && rest.get(2).is_some_and(|b| b.is_ascii_whitespace())
                {
                    return Some((lhs_end, j + 3));
                }
                i = j;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn sub_expression(
    exp: &SimpleExpressionNode,
    offset: usize,
    len: usize,
    is_static: bool,
) -> SimpleExpressionNode {
    let content = &exp.content[offset..offset + len];
    let start = advance_position(exp.loc.start, &exp.content, offset);
    let end = advance_position(start, content, len);
    SimpleExpressionNode::new(content, is_static, SourceLocation::new(start, end, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{base_compile, CompileResult};
    use crate::options::ParserOptions;

    fn compile(source: &str) -> CompileResult {
        base_compile(source, ParserOptions::default(), Default::default())
    }

    fn parse_exp(content: &str) -> Option<ForParseResult> {
        let exp = SimpleExpressionNode::new(content, false, SourceLocation::stub());
        parse_for_expression(&exp)
    }

    fn content(e: &ExpressionNode) -> &str {
        match e {
            ExpressionNode::Simple(e) => e.content.as_str(),
            ExpressionNode::Compound(_) => panic!("expected simple expression"),
        }
    }

    #[test]
    fn test_parse_aliases() {
        let r = parse_exp("item in items").unwrap();
        assert_eq!(content(&r.source), "items");
        assert_eq!(content(r.value.as_ref().unwrap()), "item");
        assert!(r.key.is_none() && r.index.is_none());

        let r = parse_exp("(item, key, index) of list").unwrap();
        assert_eq!(content(&r.source), "list");
        assert_eq!(content(r.value.as_ref().unwrap()), "item");
        assert_eq!(content(r.key.as_ref().unwrap()), "key");
        assert_eq!(content(r.index.as_ref().unwrap()), "index");
    }

    #[test]
    fn test_parse_skipped_value_alias() {
        let r = parse_exp("(, key) in items").unwrap();
        assert!(r.value.is_none());
        assert_eq!(content(r.key.as_ref().unwrap()), "key");
    }

    #[test]
    fn test_parse_destructured_alias() {
        let r = parse_exp("({ id, name }, i) in users").unwrap();
        assert_eq!(content(r.value.as_ref().unwrap()), "{ id, name }");
        assert_eq!(content(r.key.as_ref().unwrap()), "i");
        assert_eq!(content(&r.source), "users");
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_exp("items").is_none());
        assert!(parse_exp("item in ").is_none());
        assert!(parse_exp(" in items").is_none());
    }

    #[test]
    fn test_parse_separator_whitespace_variants() {
        let r = parse_exp("item\nin items").unwrap();
        assert_eq!(content(r.value.as_ref().unwrap()), "item");
        assert_eq!(content(&r.source), "items");

        let r = parse_exp("(item, i)  of\n list").unwrap();
        assert_eq!(content(r.key.as_ref().unwrap()), "i");
        assert_eq!(content(&r.source), "list");

        // `in` leading an identifier is not a separator.
        assert!(parse_exp("index insitems").is_none());
    }

    #[test]
    fn test_alias_spans_round_trip() {
        let source = "<li v-for=\"(a, b) in xs\"/>";
        let result = compile(source);
        match &result.root.children[0] {
            TemplateChildNode::For(for_node) => {
                let a = for_node.value_alias.as_ref().unwrap().loc();
                assert_eq!(
                    &source[a.start.offset as usize..a.end.offset as usize],
                    "a"
                );
                let src = for_node.source.loc();
                assert_eq!(
                    &source[src.start.offset as usize..src.end.offset as usize],
                    "xs"
                );
            }
            other => panic!("expected for node, got {other:?}"),
        }
    }

    #[test]
    fn test_for_codegen_is_untracked_fragment() {
        let result = compile("<li v-for=\"item in items\"/>");
        assert!(result.errors.is_empty());
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => {
                assert!(vnode.is_block);
                assert!(vnode.disable_tracking);
                assert_eq!(vnode.patch_flag, Some(PatchFlags::UNKEYED_FRAGMENT));
                match &vnode.children {
                    Some(VNodeChildren::Call(call)) => {
                        assert_eq!(call.callee, RuntimeHelper::RenderList);
                        assert_eq!(call.args.len(), 3);
                        match &call.args[1] {
                            JsArg::Raw(params) => assert_eq!(params, "(item) =>"),
                            other => panic!("expected raw params, got {other:?}"),
                        }
                    }
                    other => panic!("expected renderList children, got {other:?}"),
                }
            }
            other => panic!("expected vnode codegen, got {other:?}"),
        }
    }

    #[test]
    fn test_keyed_for_fragment() {
        let result = compile("<li v-for=\"item in items\" :key=\"item.id\"/>");
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => {
                assert_eq!(vnode.patch_flag, Some(PatchFlags::KEYED_FRAGMENT));
            }
            other => panic!("expected vnode codegen, got {other:?}"),
        }
    }

    #[test]
    fn test_for_without_expression() {
        let result = compile("<li v-for=\"\"/>");
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::VForNoExpression));
    }

    #[test]
    fn test_for_malformed_expression() {
        let result = compile("<li v-for=\"items\"/>");
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::VForMalformedExpression));
    }
}
