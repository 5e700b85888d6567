//! Shared helpers for the parser and transforms.

use crate::ast::*;
use crate::runtime_helpers::RuntimeHelper;
use crate::String;

/// Core built-in components available on every platform.
pub fn is_core_component(tag: &str) -> Option<RuntimeHelper> {
    match tag {
        "Teleport" | "teleport" => Some(RuntimeHelper::Teleport),
        "Suspense" | "suspense" => Some(RuntimeHelper::Suspense),
        "KeepAlive" | "keep-alive" => Some(RuntimeHelper::KeepAlive),
        "BaseTransition" | "base-transition" => Some(RuntimeHelper::BaseTransition),
        _ => None,
    }
}

/// Find a directive by normalized name.
pub fn find_dir<'a>(el: &'a ElementNode, name: &str) -> Option<&'a DirectiveNode> {
    el.props.iter().find_map(|p| match p {
        PropNode::Directive(dir) if dir.name == name => Some(dir),
        _ => None,
    })
}

/// Find a static attribute or a bound prop by key name.
pub fn find_prop<'a>(el: &'a ElementNode, name: &str) -> Option<&'a PropNode> {
    el.props.iter().find(|p| match p {
        PropNode::Attribute(attr) => attr.name == name,
        PropNode::Directive(dir) => {
            dir.name == "bind" && dir.arg.as_ref().and_then(|a| a.static_content()) == Some(name)
        }
    })
}

/// Remove and return the first directive matched by `pred`.
pub fn take_dir(
    el: &mut ElementNode,
    pred: impl Fn(&DirectiveNode) -> bool,
) -> Option<DirectiveNode> {
    let idx = el.props.iter().position(|p| match p {
        PropNode::Directive(dir) => pred(dir),
        _ => false,
    })?;
    match el.props.remove(idx) {
        PropNode::Directive(dir) => Some(dir),
        _ => unreachable!(),
    }
}

pub fn is_slot_outlet(node: &TemplateChildNode) -> bool {
    matches!(node, TemplateChildNode::Element(el) if el.tag_type == ElementType::Slot)
}

pub fn is_template_node(el: &ElementNode) -> bool {
    el.tag_type == ElementType::Template
}

/// `Foo-bar` -> `_component_Foo_bar`
pub fn to_valid_asset_id(name: &str, kind: &str) -> String {
    let mut id = std::string::String::with_capacity(name.len() + kind.len() + 2);
    id.push('_');
    id.push_str(kind);
    id.push('_');
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            id.push(c);
        } else {
            id.push('_');
        }
    }
    String::from(id)
}

/// A name usable as a plain object key without quoting.
pub fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Collapse every whitespace run into a single space.
pub fn condense_whitespace(text: &str) -> String {
    let mut out = std::string::String::with_capacity(text.len());
    let mut prev_was_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_was_space {
                out.push(' ');
                prev_was_space = true;
            }
        } else {
            out.push(c);
            prev_was_space = false;
        }
    }
    String::from(out)
}

/// `foo-bar` -> `fooBar`
pub fn camelize(name: &str) -> String {
    let mut out = std::string::String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    String::from(out)
}

/// `click` -> `onClick`
pub fn to_handler_key(name: &str) -> String {
    let mut out = std::string::String::with_capacity(name.len() + 2);
    out.push_str("on");
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
    String::from(out)
}
