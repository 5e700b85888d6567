//! Compiler options.
//!
//! Platform specifics enter the core through plain function hooks so the
//! core stays data-driven; `intarsia_dom` supplies the HTML versions.

use rustc_hash::FxHashMap;

use crate::ast::{ElementNode, Namespace};
use crate::errors::CompilerError;
use crate::runtime_helpers::RuntimeHelper;
use crate::transform::{DirectiveTransform, NodeTransform};
use crate::String;

/// Text mode for different parsing contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Normal content (default): elements, comments and interpolation.
    #[default]
    Data,
    /// Interpolation and entities but no child elements (e.g. textarea).
    RcData,
    /// Raw text until the matching end tag (e.g. style).
    RawText,
    /// Inside a `<![CDATA[ ]]>` section.
    CData,
    /// Inside an attribute value.
    AttributeValue,
}

/// Whitespace handling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespaceStrategy {
    /// Condense runs of whitespace and drop purely-structural text (default).
    #[default]
    Condense,
    /// Keep every text node as written.
    Preserve,
}

/// Parser options.
#[derive(Clone)]
pub struct ParserOptions {
    pub whitespace: WhitespaceStrategy,
    /// Interpolation delimiters (default `{{` / `}}`).
    pub delimiters: (String, String),
    /// Whether to keep comment nodes.
    pub comments: bool,
    /// Void tags never have children or an end tag.
    pub is_void_tag: fn(&str) -> bool,
    /// Tags whose content preserves whitespace.
    pub is_pre_tag: fn(&str) -> bool,
    /// Custom elements are never treated as components.
    pub is_custom_element: fn(&str) -> bool,
    /// When present, unknown tags are assumed to be components.
    pub is_native_tag: Option<fn(&str) -> bool>,
    /// Platform built-in components (Teleport, Transition, ...).
    pub is_builtin_component: Option<fn(&str) -> Option<RuntimeHelper>>,
    pub get_namespace: fn(&str, Option<&ElementNode>) -> Namespace,
    pub get_text_mode: fn(&ElementNode, Option<&ElementNode>) -> TextMode,
    /// Character-reference decoding; the flag marks attribute-value context.
    pub decode_entities: fn(&str, bool) -> String,
    pub on_error: Option<fn(&CompilerError)>,
    pub on_warn: Option<fn(&CompilerError)>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            whitespace: WhitespaceStrategy::Condense,
            delimiters: (String::from("{{"), String::from("}}")),
            comments: true,
            is_void_tag: |_| false,
            is_pre_tag: |_| false,
            is_custom_element: |_| false,
            is_native_tag: None,
            is_builtin_component: None,
            get_namespace: |_, _| Namespace::Html,
            get_text_mode: |_, _| TextMode::Data,
            decode_entities: decode_base_entities,
            on_error: None,
            on_warn: None,
        }
    }
}

impl std::fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserOptions")
            .field("whitespace", &self.whitespace)
            .field("delimiters", &self.delimiters)
            .field("comments", &self.comments)
            .finish_non_exhaustive()
    }
}

/// Base decoder: only the five XML-style named references. Platforms
/// override this with a full decoder.
pub fn decode_base_entities(text: &str, _as_attribute_value: bool) -> String {
    if !text.contains('&') {
        return String::from(text);
    }
    let mut out = std::string::String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let mut matched = false;
        for (entity, ch) in [
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&amp;", '&'),
            ("&apos;", '\''),
            ("&quot;", '"'),
        ] {
            if rest.starts_with(entity) {
                out.push(ch);
                rest = &rest[entity.len()..];
                matched = true;
                break;
            }
        }
        if !matched {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    String::from(out)
}

/// Transform options.
#[derive(Clone)]
pub struct TransformOptions {
    /// Node transforms, applied in order to every node.
    pub node_transforms: Vec<NodeTransform>,
    /// Directive transforms consulted while building element props.
    pub directive_transforms: FxHashMap<&'static str, DirectiveTransform>,
    /// Run the static-hoisting pass after traversal.
    pub hoist_static: bool,
    /// Cache event handlers in `_cache` slots.
    pub cache_handlers: bool,
    pub is_builtin_component: Option<fn(&str) -> Option<RuntimeHelper>>,
    pub is_custom_element: fn(&str) -> bool,
    pub on_error: Option<fn(&CompilerError)>,
    pub on_warn: Option<fn(&CompilerError)>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            node_transforms: Vec::new(),
            directive_transforms: FxHashMap::default(),
            hoist_static: false,
            cache_handlers: false,
            is_builtin_component: None,
            is_custom_element: |_| false,
            on_error: None,
            on_warn: None,
        }
    }
}

impl std::fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformOptions")
            .field("node_transforms", &self.node_transforms.len())
            .field("directive_transforms", &self.directive_transforms.len())
            .field("hoist_static", &self.hoist_static)
            .field("cache_handlers", &self.cache_handlers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base_entities() {
        assert_eq!(decode_base_entities("a &lt; b &amp; c", false), "a < b & c");
        assert_eq!(decode_base_entities("&quot;x&quot;", true), "\"x\"");
        // Unknown references pass through untouched.
        assert_eq!(decode_base_entities("&copy; &unknown;", false), "&copy; &unknown;");
        assert_eq!(decode_base_entities("no refs", false), "no refs");
    }
}
