//! Transform engine: depth-first traversal with exit callbacks.
//!
//! Node transforms run in configured order against each node on the way
//! down; the exit callbacks they return run in reverse order on the way
//! back up, after all children are done. Mutation during traversal is
//! restricted: the engine lends each child out of its parent slot, so a
//! transform may rebuild the current node in place or remove it through
//! the context, and nothing else.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::*;
use crate::errors::{CompilerError, ErrorCode};
use crate::options::TransformOptions;
use crate::runtime_helpers::RuntimeHelper;
use crate::String;

/// The node a transform is visiting.
pub enum TransformNode<'n> {
    Root(&'n mut RootNode),
    Child(&'n mut TemplateChildNode),
    Branch(&'n mut IfBranchNode),
}

impl<'n> TransformNode<'n> {
    /// Reborrow so the handle can be passed to several callees in turn.
    pub fn reborrow(&mut self) -> TransformNode<'_> {
        match self {
            TransformNode::Root(r) => TransformNode::Root(&mut **r),
            TransformNode::Child(c) => TransformNode::Child(&mut **c),
            TransformNode::Branch(b) => TransformNode::Branch(&mut **b),
        }
    }
}

/// Callback run after the node's children have been transformed.
pub type ExitFn = Box<dyn for<'n> FnOnce(&mut TransformContext, TransformNode<'n>)>;

/// What a node transform asks the engine to do on exit.
pub enum VisitAction {
    None,
    Exit(ExitFn),
    ExitMany(Vec<ExitFn>),
}

/// Access to the earlier siblings of the node being visited. The current
/// node itself is lent out of `nodes[index]` while transforms run.
pub struct Siblings<'p> {
    pub nodes: Option<&'p mut Vec<TemplateChildNode>>,
    pub index: usize,
}

impl Siblings<'_> {
    pub fn detached() -> Siblings<'static> {
        Siblings { nodes: None, index: 0 }
    }
}

pub type NodeTransform =
    fn(TransformNode<'_>, &mut Siblings<'_>, &mut TransformContext) -> VisitAction;

/// Transform for a single directive while element props are built.
pub type DirectiveTransform =
    fn(DirectiveNode, &ElementNode, &mut TransformContext) -> DirectiveTransformResult;

pub struct DirectiveTransformResult {
    pub props: Vec<Property>,
    /// Helper to import when the directive still needs a runtime half.
    pub need_runtime: Option<RuntimeHelper>,
}

/// Scope counters maintained during traversal.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scopes {
    pub v_for: u32,
    pub v_slot: u32,
}

pub struct TransformContext {
    pub node_transforms: Vec<NodeTransform>,
    pub directive_transforms: FxHashMap<&'static str, DirectiveTransform>,
    pub cache_handlers: bool,
    pub is_builtin_component: Option<fn(&str) -> Option<RuntimeHelper>>,
    pub is_custom_element: fn(&str) -> bool,
    pub on_error: Option<fn(&CompilerError)>,
    pub on_warn: Option<fn(&CompilerError)>,
    pub errors: Vec<CompilerError>,
    pub components: FxHashSet<String>,
    pub directives: FxHashSet<String>,
    pub hoists: Vec<JsChildNode>,
    pub cached: u32,
    pub temps: u32,
    pub scopes: Scopes,
    pub in_v_once: bool,
    pub(crate) constant_cache: FxHashMap<u32, ConstantType>,
    pub(crate) v_once_seen: FxHashSet<u32>,
    helpers: FxHashMap<RuntimeHelper, u32>,
    removed: bool,
}

impl TransformContext {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            node_transforms: options.node_transforms,
            directive_transforms: options.directive_transforms,
            cache_handlers: options.cache_handlers,
            is_builtin_component: options.is_builtin_component,
            is_custom_element: options.is_custom_element,
            on_error: options.on_error,
            on_warn: options.on_warn,
            errors: Vec::new(),
            components: FxHashSet::default(),
            directives: FxHashSet::default(),
            hoists: Vec::new(),
            cached: 0,
            temps: 0,
            scopes: Scopes::default(),
            in_v_once: false,
            constant_cache: FxHashMap::default(),
            v_once_seen: FxHashSet::default(),
            helpers: FxHashMap::default(),
            removed: false,
        }
    }

    /// Register a helper reference and hand the symbol back.
    pub fn helper(&mut self, helper: RuntimeHelper) -> RuntimeHelper {
        *self.helpers.entry(helper).or_insert(0) += 1;
        helper
    }

    /// Drop one reference; the helper is evicted when the count hits zero.
    pub fn remove_helper(&mut self, helper: RuntimeHelper) {
        if let Some(count) = self.helpers.get_mut(&helper) {
            *count -= 1;
            if *count == 0 {
                self.helpers.remove(&helper);
            }
        }
    }

    pub fn helper_count(&self, helper: RuntimeHelper) -> u32 {
        self.helpers.get(&helper).copied().unwrap_or(0)
    }

    /// Move a static subtree into the hoist list, returning the
    /// `_hoisted_N` reference that replaces it (1-based).
    pub fn hoist(&mut self, node: JsChildNode) -> SimpleExpressionNode {
        self.hoists.push(node);
        let name = format!("_hoisted_{}", self.hoists.len());
        SimpleExpressionNode::new(String::from(name), false, SourceLocation::stub())
            .with_const_type(ConstantType::CanHoist)
    }

    /// Wrap a value in the next `_cache[i]` slot.
    pub fn cache(&mut self, value: JsChildNode, need_pause_tracking: bool) -> CacheExpression {
        let index = self.cached;
        self.cached += 1;
        CacheExpression { index, value, need_pause_tracking, in_v_once: self.in_v_once }
    }

    pub fn error(&mut self, code: ErrorCode, loc: Option<SourceLocation>) {
        let err = CompilerError::new(code, loc);
        if let Some(handler) = self.on_error {
            handler(&err);
        }
        self.errors.push(err);
    }

    pub fn warn(&mut self, code: ErrorCode, loc: Option<SourceLocation>) {
        let err = CompilerError::warning(code, loc);
        if let Some(handler) = self.on_warn.or(self.on_error) {
            handler(&err);
        }
        self.errors.push(err);
    }

    /// Drop the node currently being visited. Remaining transforms and
    /// exit callbacks for it are skipped.
    pub fn remove_node(&mut self) {
        self.removed = true;
    }
}

/// Run the configured transforms over the tree, then hoisting and root
/// codegen, and freeze the registries into the root.
pub fn transform(root: &mut RootNode, options: TransformOptions) -> Vec<CompilerError> {
    let hoist = options.hoist_static;
    let mut ctx = TransformContext::new(options);
    traverse_root(&mut ctx, root);
    if hoist {
        crate::transforms::hoist_static::hoist_static(root, &mut ctx);
    }
    create_root_codegen(root, &mut ctx);
    finalize(root, ctx)
}

fn finalize(root: &mut RootNode, ctx: TransformContext) -> Vec<CompilerError> {
    let mut helpers: Vec<RuntimeHelper> = ctx.helpers.keys().copied().collect();
    helpers.sort_by_key(|h| *h as u8);
    root.helpers = helpers;

    let mut components: Vec<String> = ctx.components.into_iter().collect();
    components.sort();
    root.components = components;
    let mut directives: Vec<String> = ctx.directives.into_iter().collect();
    directives.sort();
    root.directives = directives;

    root.hoists = ctx.hoists;
    root.cached = ctx.cached;
    root.temps = ctx.temps;
    root.transformed = true;
    ctx.errors
}

fn traverse_root(ctx: &mut TransformContext, root: &mut RootNode) {
    let exits = run_transforms(ctx, TransformNode::Root(root), &mut Siblings::detached())
        .unwrap_or_default();
    ctx.removed = false;
    traverse_children(ctx, &mut root.children);
    run_exits(ctx, exits, TransformNode::Root(root));
}

/// Visit one node. Returns false if a transform removed it.
pub fn traverse_node(
    ctx: &mut TransformContext,
    node: &mut TemplateChildNode,
    siblings: &mut Siblings<'_>,
) -> bool {
    let exits = match run_transforms(ctx, TransformNode::Child(node), siblings) {
        Some(exits) => exits,
        None => {
            ctx.removed = false;
            return false;
        }
    };

    match node {
        TemplateChildNode::Element(el) => traverse_children(ctx, &mut el.children),
        TemplateChildNode::If(if_node) => {
            for branch in if_node.branches.iter_mut() {
                traverse_branch(ctx, branch);
            }
        }
        TemplateChildNode::For(for_node) => traverse_children(ctx, &mut for_node.children),
        TemplateChildNode::Interpolation(_) => {
            ctx.helper(RuntimeHelper::ToDisplayString);
        }
        TemplateChildNode::Comment(_) => {
            ctx.helper(RuntimeHelper::CreateComment);
        }
        _ => {}
    }

    run_exits(ctx, exits, TransformNode::Child(node));
    true
}

/// Visit an if branch as a first-class target so container-level
/// transforms (text merging) see it.
pub fn traverse_branch(ctx: &mut TransformContext, branch: &mut IfBranchNode) {
    let exits = run_transforms(ctx, TransformNode::Branch(branch), &mut Siblings::detached())
        .unwrap_or_default();
    ctx.removed = false;
    traverse_children(ctx, &mut branch.children);
    run_exits(ctx, exits, TransformNode::Branch(branch));
}

pub fn traverse_children(ctx: &mut TransformContext, children: &mut Vec<TemplateChildNode>) {
    let mut i = 0;
    while i < children.len() {
        let mut node = std::mem::replace(&mut children[i], placeholder());
        let keep = {
            let mut siblings = Siblings { nodes: Some(children), index: i };
            traverse_node(ctx, &mut node, &mut siblings)
        };
        if keep {
            children[i] = node;
            i += 1;
        } else {
            children.remove(i);
        }
    }
}

fn run_transforms(
    ctx: &mut TransformContext,
    mut node: TransformNode<'_>,
    siblings: &mut Siblings<'_>,
) -> Option<Vec<ExitFn>> {
    let mut exits = Vec::new();
    for i in 0..ctx.node_transforms.len() {
        let transform = ctx.node_transforms[i];
        match transform(node.reborrow(), siblings, ctx) {
            VisitAction::None => {}
            VisitAction::Exit(exit) => exits.push(exit),
            VisitAction::ExitMany(mut more) => exits.append(&mut more),
        }
        if ctx.removed {
            return None;
        }
    }
    Some(exits)
}

fn run_exits(ctx: &mut TransformContext, mut exits: Vec<ExitFn>, mut node: TransformNode<'_>) {
    while let Some(exit) = exits.pop() {
        exit(ctx, node.reborrow());
    }
}

/// Placeholder left in a parent slot while its node is lent out.
fn placeholder() -> TemplateChildNode {
    TemplateChildNode::Comment(Box::new(CommentNode {
        content: String::default(),
        loc: SourceLocation::stub(),
    }))
}

// ---------------------------------------------------------------------------
// VNode call helpers
// ---------------------------------------------------------------------------

pub fn get_vnode_helper(is_component: bool) -> RuntimeHelper {
    if is_component {
        RuntimeHelper::CreateVNode
    } else {
        RuntimeHelper::CreateElementVNode
    }
}

pub fn get_vnode_block_helper(is_component: bool) -> RuntimeHelper {
    if is_component {
        RuntimeHelper::CreateBlock
    } else {
        RuntimeHelper::CreateElementBlock
    }
}

/// Build a vnode call and register the helpers it needs.
#[allow(clippy::too_many_arguments)]
pub fn create_vnode_call(
    ctx: &mut TransformContext,
    tag: VNodeTag,
    props: Option<JsChildNode>,
    children: Option<VNodeChildren>,
    patch_flag: Option<crate::flags::PatchFlags>,
    dynamic_props: Option<Vec<String>>,
    directives: Option<DirectiveArguments>,
    is_block: bool,
    disable_tracking: bool,
    is_component: bool,
    loc: SourceLocation,
) -> VNodeCall {
    if is_block {
        ctx.helper(RuntimeHelper::OpenBlock);
        ctx.helper(get_vnode_block_helper(is_component));
    } else {
        ctx.helper(get_vnode_helper(is_component));
    }
    if let VNodeTag::Helper(h) = tag {
        ctx.helper(h);
    }
    if directives.is_some() {
        ctx.helper(RuntimeHelper::WithDirectives);
    }
    VNodeCall {
        tag,
        props,
        children,
        patch_flag,
        dynamic_props,
        directives,
        is_block,
        disable_tracking,
        is_component,
        loc,
    }
}

/// Promote a plain vnode call to a block, swapping its create helper.
pub fn convert_to_block(vnode: &mut VNodeCall, ctx: &mut TransformContext) {
    if !vnode.is_block {
        vnode.is_block = true;
        ctx.remove_helper(get_vnode_helper(vnode.is_component));
        ctx.helper(RuntimeHelper::OpenBlock);
        ctx.helper(get_vnode_block_helper(vnode.is_component));
    }
}

/// The codegen slot of any node that has one.
pub fn codegen_node_mut(node: &mut TemplateChildNode) -> Option<&mut Option<JsChildNode>> {
    match node {
        TemplateChildNode::Element(el) => Some(&mut el.codegen_node),
        TemplateChildNode::If(n) => Some(&mut n.codegen_node),
        TemplateChildNode::For(n) => Some(&mut n.codegen_node),
        TemplateChildNode::TextCall(n) => Some(&mut n.codegen_node),
        _ => None,
    }
}

/// Attach the root's own codegen: promote a single child's IR or wrap
/// multiple children in a stable fragment block.
fn create_root_codegen(root: &mut RootNode, ctx: &mut TransformContext) {
    match root.children.len() {
        0 => {}
        1 => {
            let child = &mut root.children[0];
            match child {
                TemplateChildNode::Element(el) if el.tag_type != ElementType::Slot => {
                    if let Some(mut codegen) = el.codegen_node.take() {
                        if let JsChildNode::VNodeCall(vnode) = &mut codegen {
                            convert_to_block(vnode, ctx);
                        }
                        root.codegen_node = Some(codegen);
                    }
                }
                TemplateChildNode::Element(el) => {
                    // Slot outlet root keeps its renderSlot call.
                    root.codegen_node = el.codegen_node.take();
                }
                TemplateChildNode::If(n) => root.codegen_node = n.codegen_node.take(),
                TemplateChildNode::For(n) => root.codegen_node = n.codegen_node.take(),
                TemplateChildNode::TextCall(n) => root.codegen_node = n.codegen_node.take(),
                TemplateChildNode::Text(t) => {
                    root.codegen_node = Some(JsChildNode::Simple(Box::new(
                        SimpleExpressionNode::new(t.content.clone(), true, t.loc.clone()),
                    )));
                }
                TemplateChildNode::Interpolation(interp) => {
                    // Helper was registered when the node was traversed.
                    let call = CallExpression {
                        callee: RuntimeHelper::ToDisplayString,
                        args: vec![JsArg::Expression(interp.content.clone())],
                        loc: interp.loc.clone(),
                    };
                    root.codegen_node = Some(JsChildNode::Call(Box::new(call)));
                }
                TemplateChildNode::Compound(compound) => {
                    root.codegen_node = Some(JsChildNode::Compound(compound.clone()));
                }
                _ => {}
            }
        }
        _ => {
            let children = std::mem::take(&mut root.children);
            let loc = root.loc.clone();
            let vnode = create_vnode_call(
                ctx,
                VNodeTag::Helper(RuntimeHelper::Fragment),
                None,
                Some(VNodeChildren::Children(children)),
                Some(crate::flags::PatchFlags::STABLE_FRAGMENT),
                None,
                None,
                true,
                false,
                false,
                loc,
            );
            root.codegen_node = Some(JsChildNode::VNodeCall(Box::new(vnode)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TransformOptions;

    fn empty_ctx() -> TransformContext {
        TransformContext::new(TransformOptions::default())
    }

    #[test]
    fn test_helper_refcount_eviction() {
        let mut ctx = empty_ctx();
        ctx.helper(RuntimeHelper::OpenBlock);
        ctx.helper(RuntimeHelper::OpenBlock);
        assert_eq!(ctx.helper_count(RuntimeHelper::OpenBlock), 2);
        ctx.remove_helper(RuntimeHelper::OpenBlock);
        assert_eq!(ctx.helper_count(RuntimeHelper::OpenBlock), 1);
        ctx.remove_helper(RuntimeHelper::OpenBlock);
        assert_eq!(ctx.helper_count(RuntimeHelper::OpenBlock), 0);
        // Removing an absent helper is a no-op.
        ctx.remove_helper(RuntimeHelper::OpenBlock);
        assert_eq!(ctx.helper_count(RuntimeHelper::OpenBlock), 0);
    }

    #[test]
    fn test_hoist_names_are_one_based() {
        let mut ctx = empty_ctx();
        let first = ctx.hoist(JsChildNode::Simple(Box::new(SimpleExpressionNode::new(
            "x",
            true,
            SourceLocation::stub(),
        ))));
        let second = ctx.hoist(JsChildNode::Simple(Box::new(SimpleExpressionNode::new(
            "y",
            true,
            SourceLocation::stub(),
        ))));
        assert_eq!(first.content, "_hoisted_1");
        assert_eq!(second.content, "_hoisted_2");
        assert_eq!(first.const_type, ConstantType::CanHoist);
        assert_eq!(ctx.hoists.len(), 2);
    }

    #[test]
    fn test_cache_indices_increment() {
        let mut ctx = empty_ctx();
        let value = JsChildNode::Simple(Box::new(SimpleExpressionNode::new(
            "f",
            false,
            SourceLocation::stub(),
        )));
        let a = ctx.cache(value.clone(), false);
        let b = ctx.cache(value, true);
        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
        assert_eq!(ctx.cached, 2);
        assert!(b.need_pause_tracking);
    }

    #[test]
    fn test_remove_node_drops_child() {
        fn drop_comments(
            node: TransformNode<'_>,
            _siblings: &mut Siblings<'_>,
            ctx: &mut TransformContext,
        ) -> VisitAction {
            if let TransformNode::Child(TemplateChildNode::Comment(_)) = node {
                ctx.remove_node();
            }
            VisitAction::None
        }

        let result = crate::parser::base_parse("<div/><!-- x --><span/>", Default::default());
        let mut root = result.root;
        let options = TransformOptions {
            node_transforms: vec![drop_comments],
            ..Default::default()
        };
        let errors = transform(&mut root, options);
        assert!(errors.is_empty());
        // Two children remain, so the root becomes a fragment block.
        match &root.codegen_node {
            Some(JsChildNode::VNodeCall(vnode)) => {
                assert!(vnode.is_block);
                match &vnode.children {
                    Some(VNodeChildren::Children(children)) => assert_eq!(children.len(), 2),
                    other => panic!("expected children, got {other:?}"),
                }
            }
            other => panic!("expected fragment vnode, got {other:?}"),
        }
    }

    #[test]
    fn test_exit_callbacks_run_in_reverse() {
        use std::sync::atomic::{AtomicU32, Ordering};
        static STAMP: AtomicU32 = AtomicU32::new(0);
        static FIRST_EXIT_AT: AtomicU32 = AtomicU32::new(0);
        static SECOND_EXIT_AT: AtomicU32 = AtomicU32::new(0);

        fn first(
            node: TransformNode<'_>,
            _siblings: &mut Siblings<'_>,
            _ctx: &mut TransformContext,
        ) -> VisitAction {
            if let TransformNode::Child(TemplateChildNode::Element(_)) = node {
                return VisitAction::Exit(Box::new(|_, _| {
                    FIRST_EXIT_AT.store(STAMP.fetch_add(1, Ordering::SeqCst) + 1, Ordering::SeqCst);
                }));
            }
            VisitAction::None
        }
        fn second(
            node: TransformNode<'_>,
            _siblings: &mut Siblings<'_>,
            _ctx: &mut TransformContext,
        ) -> VisitAction {
            if let TransformNode::Child(TemplateChildNode::Element(_)) = node {
                return VisitAction::Exit(Box::new(|_, _| {
                    SECOND_EXIT_AT
                        .store(STAMP.fetch_add(1, Ordering::SeqCst) + 1, Ordering::SeqCst);
                }));
            }
            VisitAction::None
        }

        let result = crate::parser::base_parse("<div/>", Default::default());
        let mut root = result.root;
        let options = TransformOptions {
            node_transforms: vec![first, second],
            ..Default::default()
        };
        transform(&mut root, options);
        // Registered first means it runs last.
        assert!(FIRST_EXIT_AT.load(Ordering::SeqCst) > SECOND_EXIT_AT.load(Ordering::SeqCst));
    }

    #[test]
    fn test_root_finalize_is_deterministic() {
        let result = crate::parser::base_parse("<div/><span/>", Default::default());
        let mut root = result.root;
        transform(&mut root, TransformOptions::default());
        assert!(root.transformed);
        let mut sorted = root.helpers.clone();
        sorted.sort_by_key(|h| *h as u8);
        assert_eq!(root.helpers, sorted);
    }
}
