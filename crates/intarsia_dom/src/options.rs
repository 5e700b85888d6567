//! HTML parsing options: tag tables, namespaces, text modes and entity
//! decoding for browser templates.

use intarsia_core::ast::{ElementNode, Namespace, PropNode};
use intarsia_core::options::TextMode;
use intarsia_core::String;

static VOID_TAGS: phf::Set<&'static str> = phf::phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
};

static HTML_TAGS: phf::Set<&'static str> = phf::phf_set! {
    "html", "body", "base", "head", "link", "meta", "style", "title",
    "address", "article", "aside", "footer", "header", "hgroup", "h1",
    "h2", "h3", "h4", "h5", "h6", "nav", "section", "div", "dd", "dl",
    "dt", "figcaption", "figure", "picture", "hr", "img", "li", "main",
    "ol", "p", "pre", "ul", "a", "b", "abbr", "bdi", "bdo", "br", "cite",
    "code", "data", "dfn", "em", "i", "kbd", "mark", "q", "rp", "rt",
    "ruby", "s", "samp", "small", "span", "strong", "sub", "sup", "time",
    "u", "var", "wbr", "area", "audio", "map", "track", "video", "embed",
    "object", "param", "source", "canvas", "script", "noscript", "del",
    "ins", "caption", "col", "colgroup", "table", "thead", "tbody", "td",
    "th", "tr", "tfoot", "button", "datalist", "fieldset", "form",
    "input", "label", "legend", "meter", "optgroup", "option", "output",
    "progress", "select", "textarea", "details", "dialog", "menu",
    "summary", "template", "blockquote", "iframe", "slot",
};

static SVG_TAGS: phf::Set<&'static str> = phf::phf_set! {
    "svg", "animate", "animateMotion", "animateTransform", "circle",
    "clipPath", "defs", "desc", "ellipse", "feBlend", "feColorMatrix",
    "feComponentTransfer", "feComposite", "feConvolveMatrix",
    "feDiffuseLighting", "feDisplacementMap", "feDistantLight",
    "feDropShadow", "feFlood", "feFuncA", "feFuncB", "feFuncG", "feFuncR",
    "feGaussianBlur", "feImage", "feMerge", "feMergeNode", "feMorphology",
    "feOffset", "fePointLight", "feSpecularLighting", "feSpotLight",
    "feTile", "feTurbulence", "filter", "foreignObject", "g", "image",
    "line", "linearGradient", "marker", "mask", "metadata", "mpath",
    "path", "pattern", "polygon", "polyline", "radialGradient", "rect",
    "set", "stop", "switch", "symbol", "text", "textPath", "tspan",
    "use", "view",
};

static MATHML_TAGS: phf::Set<&'static str> = phf::phf_set! {
    "math", "maction", "maligngroup", "malignmark", "menclose", "merror",
    "mfenced", "mfrac", "mi", "mlongdiv", "mmultiscripts", "mn", "mo",
    "mover", "mpadded", "mphantom", "mroot", "mrow", "ms", "mscarries",
    "mscarry", "msgroup", "msline", "mspace", "msqrt", "msrow", "mstack",
    "mstyle", "msub", "msup", "msubsup", "mtable", "mtd", "mtext", "mtr",
    "munder", "munderover", "semantics", "annotation", "annotation-xml",
};

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag)
}

pub fn is_native_tag(tag: &str) -> bool {
    HTML_TAGS.contains(tag) || SVG_TAGS.contains(tag) || MATHML_TAGS.contains(tag)
}

pub fn is_pre_tag(tag: &str) -> bool {
    tag == "pre"
}

/// HTML namespace inheritance with the foreign-content exit points.
pub fn get_namespace(tag: &str, parent: Option<&ElementNode>) -> Namespace {
    let mut ns = parent.map_or(Namespace::Html, |p| p.ns);
    if let Some(parent) = parent {
        match parent.ns {
            Namespace::MathMl => {
                if parent.tag == "annotation-xml" {
                    if tag == "svg" {
                        return Namespace::Svg;
                    }
                    if has_html_encoding(parent) {
                        ns = Namespace::Html;
                    }
                } else if matches!(parent.tag.as_str(), "mi" | "mo" | "mn" | "ms" | "mtext")
                    && tag != "mglyph"
                    && tag != "malignmark"
                {
                    ns = Namespace::Html;
                }
            }
            Namespace::Svg => {
                if matches!(parent.tag.as_str(), "foreignObject" | "desc" | "title") {
                    ns = Namespace::Html;
                }
            }
            Namespace::Html => {}
        }
    }
    if ns == Namespace::Html {
        if tag == "svg" {
            return Namespace::Svg;
        }
        if tag == "math" {
            return Namespace::MathMl;
        }
    }
    ns
}

fn has_html_encoding(el: &ElementNode) -> bool {
    el.props.iter().any(|p| match p {
        PropNode::Attribute(attr) => {
            attr.name == "encoding"
                && attr.value.as_ref().is_some_and(|v| {
                    v.content.eq_ignore_ascii_case("text/html")
                        || v.content.eq_ignore_ascii_case("application/xhtml+xml")
                })
        }
        _ => false,
    })
}

/// Text mode of an element's content.
pub fn get_text_mode(el: &ElementNode, _parent: Option<&ElementNode>) -> TextMode {
    if el.ns == Namespace::Html {
        match el.tag.as_str() {
            "textarea" | "title" => return TextMode::RcData,
            "style" | "iframe" | "script" | "noscript" => return TextMode::RawText,
            _ => {}
        }
    }
    TextMode::Data
}

/// Full HTML character-reference decoding, including named references and
/// the laxer attribute-value rules for `&` without a semicolon.
pub fn decode_entities(text: &str, as_attribute_value: bool) -> String {
    let decoded = if as_attribute_value {
        htmlize::unescape_attribute(text)
    } else {
        htmlize::unescape(text)
    };
    String::from(decoded.as_ref())
}
