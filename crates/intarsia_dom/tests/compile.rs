//! End-to-end compilation over the DOM option layer.

use intarsia_core::ast::*;
use intarsia_core::flags::PatchFlags;
use intarsia_core::runtime_helpers::RuntimeHelper;
use intarsia_dom::{compile, compile_with, parser_options};

fn root_vnode(result: &intarsia_core::compile::CompileResult) -> &VNodeCall {
    match result.root.codegen_node.as_ref() {
        Some(JsChildNode::VNodeCall(vnode)) => vnode,
        other => panic!("expected vnode codegen, got {other:?}"),
    }
}

#[test]
fn test_void_tags_self_close() {
    // Hoisting off so the children stay inspectable in place.
    let result = compile_with(
        "<div>text<br>more</div>",
        intarsia_core::options::TransformOptions::default(),
    );
    assert!(result.errors.is_empty());
    let children = match &root_vnode(&result).children {
        Some(VNodeChildren::Children(children)) => children,
        other => panic!("expected children, got {other:?}"),
    };
    assert_eq!(children.len(), 3);
    match &children[1] {
        TemplateChildNode::Element(el) => {
            assert_eq!(el.tag, "br");
            assert!(el.children.is_empty());
        }
        other => panic!("expected br element, got {other:?}"),
    }
}

#[test]
fn test_named_entities_decode() {
    let result = compile("<p>Tom &amp; Jerry &copy; &hellip;</p>");
    assert!(result.errors.is_empty());
    match &root_vnode(&result).children {
        Some(VNodeChildren::Text(text)) => {
            assert_eq!(text.static_content(), Some("Tom & Jerry \u{a9} \u{2026}"));
        }
        other => panic!("expected text child, got {other:?}"),
    }
}

#[test]
fn test_textarea_content_is_rcdata() {
    // Tags inside textarea are literal text; interpolation still works.
    let result = compile("<textarea><b>{{ v }}</textarea>");
    assert!(result.errors.is_empty());
    match &root_vnode(&result).children {
        Some(VNodeChildren::Text(ExpressionNode::Compound(compound))) => {
            assert!(matches!(&compound.children[0], CompoundChild::Text(t) if t.content == "<b>"));
            assert!(matches!(&compound.children[2], CompoundChild::Interpolation(_)));
        }
        other => panic!("expected compound text, got {other:?}"),
    }
}

#[test]
fn test_style_content_is_raw_text() {
    let result = compile("<style>a {{ not_an_interpolation }}</style>");
    assert!(result.errors.is_empty());
    match &root_vnode(&result).children {
        Some(VNodeChildren::Text(text)) => {
            assert_eq!(text.static_content(), Some("a {{ not_an_interpolation }}"));
        }
        other => panic!("expected raw text child, got {other:?}"),
    }
}

#[test]
fn test_pre_preserves_whitespace() {
    let result = compile("<pre>  a\n  b  </pre>");
    assert!(result.errors.is_empty());
    match &root_vnode(&result).children {
        Some(VNodeChildren::Text(text)) => {
            assert_eq!(text.static_content(), Some("  a\n  b  "));
        }
        other => panic!("expected text child, got {other:?}"),
    }
}

#[test]
fn test_svg_namespace_and_foreign_object_exit() {
    // Check namespaces on the parsed tree, before transforms move
    // children into codegen.
    let result = intarsia_core::parser::base_parse(
        "<svg><foreignObject><div/></foreignObject></svg>",
        parser_options(),
    );
    assert!(result.errors.is_empty());
    match &result.root.children[0] {
        TemplateChildNode::Element(svg) => {
            assert_eq!(svg.ns, Namespace::Svg);
            match &svg.children[0] {
                TemplateChildNode::Element(foreign) => {
                    assert_eq!(foreign.ns, Namespace::Svg);
                    match &foreign.children[0] {
                        TemplateChildNode::Element(div) => assert_eq!(div.ns, Namespace::Html),
                        other => panic!("expected div, got {other:?}"),
                    }
                }
                other => panic!("expected foreignObject, got {other:?}"),
            }
        }
        other => panic!("expected svg element, got {other:?}"),
    }
}

#[test]
fn test_unknown_tag_is_component() {
    let result = compile("<my-widget/>");
    let vnode = root_vnode(&result);
    assert!(vnode.is_component);
    assert_eq!(result.root.components.len(), 1);
}

#[test]
fn test_static_hoisting_end_to_end() {
    let result = compile("<div><p class=\"note\">static</p><span>{{ n }}</span></div>");
    assert!(result.errors.is_empty());
    assert_eq!(result.root.hoists.len(), 1);
    match &result.root.hoists[0] {
        JsChildNode::VNodeCall(hoisted) => {
            assert_eq!(hoisted.patch_flag, Some(PatchFlags::HOISTED));
            assert!(matches!(&hoisted.tag, VNodeTag::Plain(t) if t == "p"));
        }
        other => panic!("expected hoisted vnode, got {other:?}"),
    }
}

#[test]
fn test_v_if_subtree_is_never_hoisted() {
    let result = compile("<div><p v-if=\"ok\" class=\"x\"/><p class=\"y\"/></div>");
    assert!(result.errors.is_empty());
    // Only the static sibling is hoisted, not the branch block.
    assert_eq!(result.root.hoists.len(), 1);
}

#[test]
fn test_helpers_are_deterministic_and_deduped() {
    let a = compile("<div v-if=\"x\"/><div v-if=\"y\"/>");
    let b = compile("<div v-if=\"x\"/><div v-if=\"y\"/>");
    assert_eq!(a.root.helpers, b.root.helpers);
    let mut deduped = a.root.helpers.clone();
    deduped.dedup();
    assert_eq!(a.root.helpers, deduped);
}

#[test]
fn test_full_template_smoke() {
    let source = r#"
      <div id="app">
        <h1 :class="titleClass">{{ title }}</h1>
        <ul>
          <li v-for="item in items" :key="item.id" @click="select(item)">
            {{ item.label }}
          </li>
        </ul>
        <p v-if="empty">Nothing here</p>
        <p v-else>{{ items.length }} items</p>
      </div>
    "#;
    let result = compile(source);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    let vnode = root_vnode(&result);
    assert!(vnode.is_block);
    assert!(result.root.helpers.contains(&RuntimeHelper::RenderList));
    assert!(result.root.helpers.contains(&RuntimeHelper::ToDisplayString));
    assert!(result.root.helpers.contains(&RuntimeHelper::Fragment));
    assert!(result.root.transformed);
}

#[test]
fn test_custom_transform_options_pass_through() {
    use intarsia_core::options::TransformOptions;
    let result = compile_with(
        "<button @click=\"go\"/>",
        TransformOptions { cache_handlers: true, ..Default::default() },
    );
    assert_eq!(result.root.cached, 1);
}

#[test]
fn test_parser_options_expose_dom_tables() {
    let options = parser_options();
    assert!((options.is_void_tag)("img"));
    assert!(!(options.is_void_tag)("span"));
    assert!((options.is_pre_tag)("pre"));
}
