//! AST and codegen IR node definitions.
//!
//! The parser produces the template-side nodes; transforms attach codegen IR
//! (`JsChildNode` trees) to them and may introduce the structural containers
//! (`IfNode`, `ForNode`, `TextCallNode`, `CompoundExpressionNode`).
//!
//! Every node carries a `SourceLocation` whose `source` field is the exact
//! slice of the input it covers, so spans always round-trip.

use smallvec::SmallVec;

use crate::flags::PatchFlags;
use crate::runtime_helpers::RuntimeHelper;
use crate::String;

/// A position in the source text. `line` and `column` are 1-based,
/// `offset` is a byte index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Self { offset, line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { offset: 0, line: 1, column: 1 }
    }
}

/// Span of a node in the original source.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
    pub source: String,
}

impl SourceLocation {
    pub fn new(start: Position, end: Position, source: impl Into<String>) -> Self {
        Self { start, end, source: source.into() }
    }

    /// Placeholder location for synthesized nodes.
    pub fn stub() -> Self {
        Self::default()
    }
}

/// Element namespace, decided by the platform's `get_namespace` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum Namespace {
    #[default]
    Html = 0,
    Svg = 1,
    MathMl = 2,
}

/// How the parser classified an element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum ElementType {
    /// Plain platform element
    Element = 0,
    /// Component (resolved at runtime)
    Component = 1,
    /// `<slot>` outlet
    Slot = 2,
    /// `<template>` wrapper with a structural or slot directive
    Template = 3,
}

/// Constancy tier of an expression or subtree. Higher tiers imply all
/// lower ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum ConstantType {
    NotConstant = 0,
    CanSkipPatch = 1,
    CanHoist = 2,
    CanStringify = 3,
}

/// The root of a parsed template. Transform fills in the registries and
/// the final codegen node.
#[derive(Debug, Clone)]
pub struct RootNode {
    pub children: Vec<TemplateChildNode>,
    /// Runtime helpers still referenced after transform, in deterministic order.
    pub helpers: Vec<RuntimeHelper>,
    /// Component asset names to resolve at runtime.
    pub components: Vec<String>,
    /// Directive asset names to resolve at runtime.
    pub directives: Vec<String>,
    /// Hoisted static subtrees, referenced as `_hoisted_N` (1-based).
    pub hoists: Vec<JsChildNode>,
    /// Number of cached expressions (`_cache[i]` slots).
    pub cached: u32,
    /// Number of temporary variables needed by generated code.
    pub temps: u32,
    pub codegen_node: Option<JsChildNode>,
    /// Set once the transform stage has run.
    pub transformed: bool,
    pub source: String,
    pub loc: SourceLocation,
}

impl RootNode {
    pub fn new(source: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            children: Vec::new(),
            helpers: Vec::new(),
            components: Vec::new(),
            directives: Vec::new(),
            hoists: Vec::new(),
            cached: 0,
            temps: 0,
            codegen_node: None,
            transformed: false,
            source: source.into(),
            loc,
        }
    }
}

/// Any node that can appear in a children list.
#[derive(Debug, Clone)]
pub enum TemplateChildNode {
    Element(Box<ElementNode>),
    Text(Box<TextNode>),
    Comment(Box<CommentNode>),
    Interpolation(Box<InterpolationNode>),
    Compound(Box<CompoundExpressionNode>),
    If(Box<IfNode>),
    For(Box<ForNode>),
    TextCall(Box<TextCallNode>),
}

impl TemplateChildNode {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            TemplateChildNode::Element(n) => &n.loc,
            TemplateChildNode::Text(n) => &n.loc,
            TemplateChildNode::Comment(n) => &n.loc,
            TemplateChildNode::Interpolation(n) => &n.loc,
            TemplateChildNode::Compound(n) => &n.loc,
            TemplateChildNode::If(n) => &n.loc,
            TemplateChildNode::For(n) => &n.loc,
            TemplateChildNode::TextCall(n) => &n.loc,
        }
    }

    /// True for text and interpolation nodes, the inputs of text merging.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            TemplateChildNode::Text(_) | TemplateChildNode::Interpolation(_)
        )
    }

    /// True for a text node that is entirely whitespace.
    pub fn is_whitespace_text(&self) -> bool {
        match self {
            TemplateChildNode::Text(t) => t.content.trim().is_empty(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    /// Dense parser-assigned id, used as the memoization key for
    /// constancy analysis and the v-once seen set.
    pub id: u32,
    pub tag: String,
    pub tag_type: ElementType,
    pub ns: Namespace,
    pub props: Vec<PropNode>,
    pub children: Vec<TemplateChildNode>,
    pub self_closing: bool,
    pub codegen_node: Option<JsChildNode>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct TextNode {
    pub content: String,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct CommentNode {
    pub content: String,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct InterpolationNode {
    pub content: ExpressionNode,
    pub loc: SourceLocation,
}

/// An element prop: plain attribute or parsed directive.
#[derive(Debug, Clone)]
pub enum PropNode {
    Attribute(AttributeNode),
    Directive(DirectiveNode),
}

impl PropNode {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            PropNode::Attribute(a) => &a.loc,
            PropNode::Directive(d) => &d.loc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributeNode {
    pub name: String,
    pub value: Option<TextNode>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct DirectiveNode {
    /// Normalized name without the `v-` prefix (`bind`, `on`, `if`, ...).
    pub name: String,
    /// The attribute name exactly as written (`:foo`, `@click.stop`, ...).
    pub raw_name: String,
    pub exp: Option<ExpressionNode>,
    pub arg: Option<ExpressionNode>,
    pub modifiers: SmallVec<[String; 4]>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum ExpressionNode {
    Simple(Box<SimpleExpressionNode>),
    Compound(Box<CompoundExpressionNode>),
}

impl ExpressionNode {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            ExpressionNode::Simple(e) => &e.loc,
            ExpressionNode::Compound(e) => &e.loc,
        }
    }

    /// Static simple-expression content, if this is one.
    pub fn static_content(&self) -> Option<&str> {
        match self {
            ExpressionNode::Simple(e) if e.is_static => Some(&e.content),
            _ => None,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, ExpressionNode::Simple(e) if e.is_static)
    }
}

/// An opaque expression. The front-end never parses expression syntax; the
/// content is carried through verbatim.
#[derive(Debug, Clone)]
pub struct SimpleExpressionNode {
    pub content: String,
    pub is_static: bool,
    pub const_type: ConstantType,
    pub loc: SourceLocation,
}

impl SimpleExpressionNode {
    /// Static content is always stringifiable; dynamic content starts out
    /// not-constant until analysis proves otherwise.
    pub fn new(content: impl Into<String>, is_static: bool, loc: SourceLocation) -> Self {
        Self {
            content: content.into(),
            is_static,
            const_type: if is_static {
                ConstantType::CanStringify
            } else {
                ConstantType::NotConstant
            },
            loc,
        }
    }

    pub fn with_const_type(mut self, const_type: ConstantType) -> Self {
        self.const_type = const_type;
        self
    }

    pub fn into_expr(self) -> ExpressionNode {
        ExpressionNode::Simple(Box::new(self))
    }
}

impl From<ExpressionNode> for JsChildNode {
    fn from(expr: ExpressionNode) -> Self {
        match expr {
            ExpressionNode::Simple(e) => JsChildNode::Simple(e),
            ExpressionNode::Compound(e) => JsChildNode::Compound(e),
        }
    }
}

/// An ordered mix of literal fragments and sub-expressions, produced by
/// text merging.
#[derive(Debug, Clone)]
pub struct CompoundExpressionNode {
    pub children: Vec<CompoundChild>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum CompoundChild {
    /// Literal output fragment, e.g. `" + "`.
    Raw(String),
    Expression(ExpressionNode),
    Text(Box<TextNode>),
    Interpolation(Box<InterpolationNode>),
}

#[derive(Debug, Clone)]
pub struct IfNode {
    pub branches: Vec<IfBranchNode>,
    pub codegen_node: Option<JsChildNode>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct IfBranchNode {
    /// `None` for a plain `v-else` branch.
    pub condition: Option<ExpressionNode>,
    pub children: Vec<TemplateChildNode>,
    pub user_key: Option<PropNode>,
    pub is_template_if: bool,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ForNode {
    pub source: ExpressionNode,
    pub value_alias: Option<ExpressionNode>,
    pub key_alias: Option<ExpressionNode>,
    pub index_alias: Option<ExpressionNode>,
    pub children: Vec<TemplateChildNode>,
    pub codegen_node: Option<JsChildNode>,
    pub loc: SourceLocation,
}

/// A text-producing child that needs a `createTextVNode` call because it
/// sits next to non-text siblings.
#[derive(Debug, Clone)]
pub struct TextCallNode {
    pub content: TextSource,
    pub codegen_node: Option<JsChildNode>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum TextSource {
    Text(Box<TextNode>),
    Interpolation(Box<InterpolationNode>),
    Compound(Box<CompoundExpressionNode>),
}

// ---------------------------------------------------------------------------
// Codegen IR
// ---------------------------------------------------------------------------

/// A node of the codegen IR attached to the AST by transforms.
#[derive(Debug, Clone)]
pub enum JsChildNode {
    VNodeCall(Box<VNodeCall>),
    Call(Box<CallExpression>),
    Object(Box<ObjectExpression>),
    Array(Box<ArrayExpression>),
    Simple(Box<SimpleExpressionNode>),
    Compound(Box<CompoundExpressionNode>),
    Conditional(Box<ConditionalExpression>),
    Cache(Box<CacheExpression>),
}

/// The IR for one vnode creation call.
#[derive(Debug, Clone)]
pub struct VNodeCall {
    pub tag: VNodeTag,
    /// Object, `mergeProps` call, or a hoisted reference.
    pub props: Option<JsChildNode>,
    pub children: Option<VNodeChildren>,
    pub patch_flag: Option<PatchFlags>,
    pub dynamic_props: Option<Vec<String>>,
    /// Runtime directives to apply with `withDirectives`.
    pub directives: Option<DirectiveArguments>,
    pub is_block: bool,
    /// Blocks inside `v-for` disable dynamic-child tracking.
    pub disable_tracking: bool,
    pub is_component: bool,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum VNodeTag {
    /// Native element tag, emitted as a string literal.
    Plain(String),
    /// Resolved component asset id, e.g. `_component_Foo`.
    Component(String),
    /// Built-in component symbol or `Fragment`.
    Helper(RuntimeHelper),
    /// Dynamic tag, e.g. a `resolveDynamicComponent` call.
    Call(Box<CallExpression>),
}

#[derive(Debug, Clone)]
pub enum VNodeChildren {
    /// Full child list, owned by the vnode call after the element transform.
    Children(Vec<TemplateChildNode>),
    /// Single text-ish child fast path.
    Text(ExpressionNode),
    /// A call producing the children, e.g. `renderList` for `v-for`.
    Call(Box<CallExpression>),
    /// Hoisted children array reference.
    Hoisted(Box<SimpleExpressionNode>),
}

/// A call to a runtime helper.
#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: RuntimeHelper,
    pub args: Vec<JsArg>,
    pub loc: SourceLocation,
}

impl CallExpression {
    pub fn new(callee: RuntimeHelper, args: Vec<JsArg>) -> Self {
        Self { callee, args, loc: SourceLocation::stub() }
    }
}

/// An argument in a call or array element position.
#[derive(Debug, Clone)]
pub enum JsArg {
    Expression(ExpressionNode),
    Js(JsChildNode),
    Template(TemplateChildNode),
    Children(Vec<TemplateChildNode>),
    /// Verbatim output fragment, e.g. a string literal or numeric flag.
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
    pub loc: SourceLocation,
}

impl ObjectExpression {
    pub fn new(properties: Vec<Property>) -> Self {
        Self { properties, loc: SourceLocation::stub() }
    }
}

#[derive(Debug, Clone)]
pub struct Property {
    pub key: ExpressionNode,
    pub value: JsChildNode,
}

#[derive(Debug, Clone)]
pub struct ArrayExpression {
    pub elements: Vec<JsArg>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpression {
    pub test: ExpressionNode,
    pub consequent: JsChildNode,
    pub alternate: JsChildNode,
    pub newline: bool,
}

/// A `_cache[i]`-backed expression, produced by `v-once` and handler caching.
#[derive(Debug, Clone)]
pub struct CacheExpression {
    pub index: u32,
    pub value: JsChildNode,
    /// Vnode caching pauses dependency tracking while evaluating.
    pub need_pause_tracking: bool,
    pub in_v_once: bool,
}

/// Runtime directive application list for `withDirectives`.
#[derive(Debug, Clone)]
pub struct DirectiveArguments {
    pub directives: Vec<RuntimeDirective>,
}

#[derive(Debug, Clone)]
pub struct RuntimeDirective {
    /// Directive asset name, resolved with `resolveDirective`.
    pub name: String,
    pub exp: Option<ExpressionNode>,
    pub arg: Option<ExpressionNode>,
    pub modifiers: SmallVec<[String; 4]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_type_ordering() {
        assert!(ConstantType::NotConstant < ConstantType::CanSkipPatch);
        assert!(ConstantType::CanSkipPatch < ConstantType::CanHoist);
        assert!(ConstantType::CanHoist < ConstantType::CanStringify);
    }

    #[test]
    fn test_simple_expression_defaults() {
        let e = SimpleExpressionNode::new("msg", false, SourceLocation::stub());
        assert_eq!(e.const_type, ConstantType::NotConstant);
        let e = SimpleExpressionNode::new("class", true, SourceLocation::stub());
        assert_eq!(e.const_type, ConstantType::CanStringify);
    }

    #[test]
    fn test_position_default() {
        let p = Position::default();
        assert_eq!((p.offset, p.line, p.column), (0, 1, 1));
    }
}
