//! Text merging transform.
//!
//! Runs on exit for every container. Adjacent text and interpolation
//! children collapse into a single compound expression joined with `+`.
//! When text-ish children sit next to element siblings they are wrapped
//! in `createTextVNode` calls so the runtime can track them.

use crate::ast::*;
use crate::flags::PatchFlags;
use crate::runtime_helpers::RuntimeHelper;
use crate::transform::{Siblings, TransformContext, TransformNode, VisitAction};
use crate::String;

pub fn transform_text(
    node: TransformNode<'_>,
    _siblings: &mut Siblings<'_>,
    _ctx: &mut TransformContext,
) -> VisitAction {
    let applies = matches!(
        &node,
        TransformNode::Root(_)
            | TransformNode::Branch(_)
            | TransformNode::Child(TemplateChildNode::Element(_) | TemplateChildNode::For(_))
    );
    if !applies {
        return VisitAction::None;
    }
    VisitAction::Exit(Box::new(|ctx, node| {
        let (children, inline_ok) = match node {
            TransformNode::Root(root) => (&mut root.children, true),
            TransformNode::Branch(branch) => (&mut branch.children, false),
            TransformNode::Child(TemplateChildNode::Element(el)) => {
                let plain = el.tag_type == ElementType::Element;
                (&mut el.children, plain)
            }
            TransformNode::Child(TemplateChildNode::For(for_node)) => {
                (&mut for_node.children, false)
            }
            _ => return,
        };

        merge_adjacent_text(children);

        // A lone text-ish child can stay inline; the parent vnode uses the
        // single-text-child fast path instead of a createTextVNode call.
        if children.len() == 1 && inline_ok && children[0].is_text_like() {
            return;
        }
        if !children.iter().any(|c| c.is_text_like()) {
            return;
        }

        for child in children.iter_mut() {
            if !child.is_text_like() {
                continue;
            }
            let owned = std::mem::replace(
                child,
                TemplateChildNode::Text(Box::new(TextNode {
                    content: String::default(),
                    loc: SourceLocation::stub(),
                })),
            );
            let loc = owned.loc().clone();
            let (content, dynamic) = match owned {
                TemplateChildNode::Text(t) => (TextSource::Text(t), false),
                TemplateChildNode::Interpolation(i) => {
                    let dynamic = !i.content.is_static();
                    (TextSource::Interpolation(i), dynamic)
                }
                TemplateChildNode::Compound(c) => (TextSource::Compound(c), true),
                _ => continue,
            };
            ctx.helper(RuntimeHelper::CreateText);
            let mut args = vec![JsArg::Expression(text_source_expr(&content))];
            if dynamic {
                args.push(JsArg::Raw(String::from(
                    PatchFlags::TEXT.bits().to_string(),
                )));
            }
            let call = CallExpression { callee: RuntimeHelper::CreateText, args, loc: loc.clone() };
            *child = TemplateChildNode::TextCall(Box::new(TextCallNode {
                content,
                codegen_node: Some(JsChildNode::Call(Box::new(call))),
                loc,
            }));
        }
    }))
}

/// Collapse every run of adjacent text-ish children into one compound
/// expression with ` + ` joiners.
pub(crate) fn merge_adjacent_text(children: &mut Vec<TemplateChildNode>) {
    let mut i = 0;
    while i < children.len() {
        if !children[i].is_text() {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < children.len() && children[j].is_text() {
            j += 1;
        }
        if j - i > 1 {
            let start = children[i].loc().start;
            let end = children[j - 1].loc().end;
            let run: Vec<TemplateChildNode> = children.drain(i..j).collect();
            let mut source = std::string::String::new();
            let mut parts = Vec::with_capacity(run.len() * 2 - 1);
            for (k, child) in run.into_iter().enumerate() {
                if k > 0 {
                    parts.push(CompoundChild::Raw(String::from(" + ")));
                }
                source.push_str(child.loc().source.as_str());
                match child {
                    TemplateChildNode::Text(t) => parts.push(CompoundChild::Text(t)),
                    TemplateChildNode::Interpolation(n) => {
                        parts.push(CompoundChild::Interpolation(n));
                    }
                    _ => {}
                }
            }
            children.insert(
                i,
                TemplateChildNode::Compound(Box::new(CompoundExpressionNode {
                    children: parts,
                    loc: SourceLocation::new(start, end, source),
                })),
            );
        }
        i += 1;
    }
}

fn text_source_expr(source: &TextSource) -> ExpressionNode {
    match source {
        TextSource::Text(t) => {
            SimpleExpressionNode::new(t.content.clone(), true, t.loc.clone()).into_expr()
        }
        TextSource::Interpolation(i) => i.content.clone(),
        TextSource::Compound(c) => ExpressionNode::Compound(c.clone()),
    }
}

impl TemplateChildNode {
    /// Text, interpolation, or an already-merged compound.
    pub(crate) fn is_text_like(&self) -> bool {
        matches!(
            self,
            TemplateChildNode::Text(_)
                | TemplateChildNode::Interpolation(_)
                | TemplateChildNode::Compound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{base_compile, CompileResult};
    use crate::options::ParserOptions;

    fn compile(source: &str) -> CompileResult {
        base_compile(source, ParserOptions::default(), Default::default())
    }

    #[test]
    fn test_adjacent_text_and_interpolation_merge() {
        let result = compile("<div>hello {{ name }}!</div>");
        assert!(result.errors.is_empty());
        // Merged into a single compound, kept inline as the element's text.
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => match &vnode.children {
                Some(VNodeChildren::Text(ExpressionNode::Compound(compound))) => {
                    assert_eq!(compound.children.len(), 5);
                    assert!(matches!(&compound.children[1], CompoundChild::Raw(r) if r == " + "));
                }
                other => panic!("expected compound text child, got {other:?}"),
            },
            other => panic!("expected vnode codegen, got {other:?}"),
        }
    }

    #[test]
    fn test_text_next_to_element_becomes_text_call() {
        let result = compile("<div>before<span/>{{ after }}</div>");
        assert!(result.errors.is_empty());
        let children = match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => match &vnode.children {
                Some(VNodeChildren::Children(children)) => children,
                other => panic!("expected children, got {other:?}"),
            },
            other => panic!("expected vnode codegen, got {other:?}"),
        };
        assert_eq!(children.len(), 3);
        match &children[0] {
            TemplateChildNode::TextCall(tc) => {
                // Static text call carries no flag argument.
                match tc.codegen_node.as_ref() {
                    Some(JsChildNode::Call(call)) => {
                        assert_eq!(call.callee, RuntimeHelper::CreateText);
                        assert_eq!(call.args.len(), 1);
                    }
                    other => panic!("expected call codegen, got {other:?}"),
                }
            }
            other => panic!("expected text call, got {other:?}"),
        }
        match &children[2] {
            TemplateChildNode::TextCall(tc) => match tc.codegen_node.as_ref() {
                Some(JsChildNode::Call(call)) => {
                    // Dynamic text carries the TEXT patch flag.
                    assert_eq!(call.args.len(), 2);
                    match &call.args[1] {
                        JsArg::Raw(flag) => {
                            assert_eq!(flag.as_str(), PatchFlags::TEXT.bits().to_string());
                        }
                        other => panic!("expected raw flag, got {other:?}"),
                    }
                }
                other => panic!("expected call codegen, got {other:?}"),
            },
            other => panic!("expected text call, got {other:?}"),
        }
        assert!(result.root.helpers.contains(&RuntimeHelper::CreateText));
    }

    #[test]
    fn test_single_text_child_stays_inline() {
        let result = compile("<p>just text</p>");
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => {
                assert!(matches!(&vnode.children, Some(VNodeChildren::Text(_))));
            }
            other => panic!("expected vnode codegen, got {other:?}"),
        }
        assert!(!result.root.helpers.contains(&RuntimeHelper::CreateText));
    }

    #[test]
    fn test_merge_spans_cover_the_run() {
        let source = "<div>a{{ b }}c<hr/></div>";
        let result = compile(source);
        let children = match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => match &vnode.children {
                Some(VNodeChildren::Children(children)) => children,
                other => panic!("expected children, got {other:?}"),
            },
            other => panic!("expected vnode codegen, got {other:?}"),
        };
        match &children[0] {
            TemplateChildNode::TextCall(tc) => {
                let loc = &tc.loc;
                assert_eq!(
                    &source[loc.start.offset as usize..loc.end.offset as usize],
                    "a{{ b }}c"
                );
            }
            other => panic!("expected text call, got {other:?}"),
        }
    }
}
