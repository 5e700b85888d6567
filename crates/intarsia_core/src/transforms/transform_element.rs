//! Element codegen transform.
//!
//! Runs on exit so the children already carry their own codegen. Resolves
//! the tag, folds props into IR while accumulating patch flags, applies
//! the registered directive transforms, and attaches the final
//! [`VNodeCall`] to the element.

use crate::ast::*;
use crate::errors::ErrorCode;
use crate::flags::PatchFlags;
use crate::runtime_helpers::RuntimeHelper;
use crate::transform::{
    create_vnode_call, Siblings, TransformContext, TransformNode, VisitAction,
};
use crate::utils::{find_prop, is_core_component, to_valid_asset_id};
use crate::{FxHashMap, String};

pub fn transform_element(
    node: TransformNode<'_>,
    _siblings: &mut Siblings<'_>,
    _ctx: &mut TransformContext,
) -> VisitAction {
    let applies = matches!(
        &node,
        TransformNode::Child(TemplateChildNode::Element(el))
            if matches!(el.tag_type, ElementType::Element | ElementType::Component)
    );
    if !applies {
        return VisitAction::None;
    }
    VisitAction::Exit(Box::new(|ctx, node| {
        let TransformNode::Child(TemplateChildNode::Element(el)) = node else {
            return;
        };
        let is_component = el.tag_type == ElementType::Component;
        let tag = resolve_tag(el, ctx);
        let should_use_block = match &tag {
            VNodeTag::Call(_) => true,
            VNodeTag::Helper(RuntimeHelper::Teleport | RuntimeHelper::Suspense) => true,
            VNodeTag::Plain(t) => t == "svg" || t == "foreignObject",
            _ => false,
        };

        let props = build_props(el, ctx);
        let mut patch_flags = props.patch_flags;

        let children = match el.children.len() {
            0 => None,
            1 => match el.children.pop() {
                Some(TemplateChildNode::Text(text)) => {
                    Some(VNodeChildren::Text(
                        SimpleExpressionNode::new(text.content, true, text.loc).into_expr(),
                    ))
                }
                Some(TemplateChildNode::Interpolation(interp)) => {
                    if !interp.content.is_static() {
                        patch_flags |= PatchFlags::TEXT;
                    }
                    Some(VNodeChildren::Text(interp.content))
                }
                Some(TemplateChildNode::Compound(compound)) => {
                    patch_flags |= PatchFlags::TEXT;
                    Some(VNodeChildren::Text(ExpressionNode::Compound(compound)))
                }
                Some(other) => Some(VNodeChildren::Children(vec![other])),
                None => None,
            },
            _ => Some(VNodeChildren::Children(std::mem::take(&mut el.children))),
        };

        let patch_flag = if patch_flags.is_empty() { None } else { Some(patch_flags) };
        let dynamic_props =
            if props.dynamic_prop_names.is_empty() { None } else { Some(props.dynamic_prop_names) };
        let directives = if props.directives.is_empty() {
            None
        } else {
            Some(DirectiveArguments { directives: props.directives })
        };

        let vnode = create_vnode_call(
            ctx,
            tag,
            props.props,
            children,
            patch_flag,
            dynamic_props,
            directives,
            should_use_block,
            false,
            is_component,
            el.loc.clone(),
        );
        el.codegen_node = Some(JsChildNode::VNodeCall(Box::new(vnode)));
    }))
}

fn is_component_tag(tag: &str) -> bool {
    tag == "component" || tag == "Component"
}

fn resolve_tag(el: &mut ElementNode, ctx: &mut TransformContext) -> VNodeTag {
    if el.tag_type != ElementType::Component {
        return VNodeTag::Plain(el.tag.clone());
    }

    let mut name = el.tag.clone();
    if is_component_tag(&el.tag) {
        // `<component is=...>` picks the real target.
        match find_prop(el, "is") {
            Some(PropNode::Attribute(attr)) => {
                if let Some(value) = &attr.value {
                    match value.content.strip_prefix("vue:") {
                        Some(stripped) => name = String::from(stripped),
                        None => {
                            ctx.helper(RuntimeHelper::ResolveDynamicComponent);
                            let exp = SimpleExpressionNode::new(
                                value.content.clone(),
                                true,
                                value.loc.clone(),
                            );
                            return VNodeTag::Call(Box::new(CallExpression::new(
                                RuntimeHelper::ResolveDynamicComponent,
                                vec![JsArg::Expression(exp.into_expr())],
                            )));
                        }
                    }
                }
            }
            Some(PropNode::Directive(dir)) if dir.name == "bind" => {
                if let Some(exp) = dir.exp.clone() {
                    ctx.helper(RuntimeHelper::ResolveDynamicComponent);
                    return VNodeTag::Call(Box::new(CallExpression::new(
                        RuntimeHelper::ResolveDynamicComponent,
                        vec![JsArg::Expression(exp)],
                    )));
                }
            }
            _ => {}
        }
    } else if let Some(PropNode::Attribute(attr)) = find_prop(el, "is") {
        // Parser upgraded this element because of a `vue:` prefix.
        if let Some(value) = &attr.value {
            if let Some(stripped) = value.content.strip_prefix("vue:") {
                name = String::from(stripped);
            }
        }
    }

    let builtin =
        is_core_component(&name).or_else(|| ctx.is_builtin_component.and_then(|f| f(&name)));
    if let Some(helper) = builtin {
        // Built-ins are emitted as direct symbol references.
        ctx.helper(helper);
        return VNodeTag::Helper(helper);
    }

    ctx.helper(RuntimeHelper::ResolveComponent);
    ctx.components.insert(name.clone());
    VNodeTag::Component(to_valid_asset_id(&name, "component"))
}

pub(crate) struct PropsResult {
    pub props: Option<JsChildNode>,
    pub patch_flags: PatchFlags,
    pub dynamic_prop_names: Vec<String>,
    pub directives: Vec<RuntimeDirective>,
}

#[derive(Default)]
struct PropAnalysis {
    has_ref: bool,
    has_class_binding: bool,
    has_style_binding: bool,
    has_hydration_event_binding: bool,
    has_dynamic_keys: bool,
    dynamic_prop_names: Vec<String>,
}

impl PropAnalysis {
    fn visit(&mut self, prop: &Property, is_component: bool) {
        let Some(name) = prop.key.static_content() else {
            self.has_dynamic_keys = true;
            return;
        };
        if name == "ref" {
            self.has_ref = true;
            return;
        }
        if name == "key" || value_is_constant(&prop.value) {
            return;
        }
        if let JsChildNode::Cache(_) = prop.value {
            // Cached handlers never need patching.
            return;
        }
        if name.starts_with("on") && name.len() > 2 {
            if !is_component && !name.eq_ignore_ascii_case("onclick") {
                self.has_hydration_event_binding = true;
            }
            self.dynamic_prop_names.push(String::from(name));
            return;
        }
        match name {
            "class" if !is_component => self.has_class_binding = true,
            "style" if !is_component => self.has_style_binding = true,
            _ => self.dynamic_prop_names.push(String::from(name)),
        }
    }
}

fn value_is_constant(value: &JsChildNode) -> bool {
    match value {
        JsChildNode::Simple(e) => e.is_static || e.const_type > ConstantType::NotConstant,
        _ => false,
    }
}

/// Fold the element's props into IR, recording patch flags, dynamic prop
/// names and runtime directives along the way.
pub(crate) fn build_props(el: &mut ElementNode, ctx: &mut TransformContext) -> PropsResult {
    let is_component = el.tag_type == ElementType::Component;
    let consumed_is = is_component_tag(&el.tag);
    let mut properties: Vec<Property> = Vec::new();
    let mut merge_args: Vec<JsChildNode> = Vec::new();
    let mut runtime_directives: Vec<RuntimeDirective> = Vec::new();
    let mut analysis = PropAnalysis::default();

    for prop in std::mem::take(&mut el.props) {
        match prop {
            PropNode::Attribute(attr) => {
                if attr.name == "ref" {
                    analysis.has_ref = true;
                }
                if attr.name == "is"
                    && (consumed_is
                        || attr
                            .value
                            .as_ref()
                            .is_some_and(|v| v.content.starts_with("vue:")))
                {
                    continue;
                }
                let key = SimpleExpressionNode::new(attr.name, true, SourceLocation::stub());
                let (content, value_loc) = match attr.value {
                    Some(v) => (v.content, v.loc),
                    None => (String::default(), SourceLocation::stub()),
                };
                properties.push(Property {
                    key: key.into_expr(),
                    value: JsChildNode::Simple(Box::new(SimpleExpressionNode::new(
                        content, true, value_loc,
                    ))),
                });
            }
            PropNode::Directive(dir) => {
                match dir.name.as_str() {
                    // Structural and scope directives are consumed elsewhere.
                    "if" | "else-if" | "else" | "for" | "once" | "slot" | "pre" => continue,
                    "bind" | "on" if dir.arg.is_none() => {
                        // Spread form: v-bind="obj" / v-on="handlers".
                        analysis.has_dynamic_keys = true;
                        let is_bind = dir.name == "bind";
                        match dir.exp {
                            Some(exp) => {
                                if !properties.is_empty() {
                                    merge_args.push(JsChildNode::Object(Box::new(
                                        ObjectExpression::new(dedupe_properties(std::mem::take(
                                            &mut properties,
                                        ))),
                                    )));
                                }
                                if is_bind {
                                    merge_args.push(exp.into());
                                } else {
                                    ctx.helper(RuntimeHelper::ToHandlers);
                                    merge_args.push(JsChildNode::Call(Box::new(
                                        CallExpression::new(
                                            RuntimeHelper::ToHandlers,
                                            vec![JsArg::Expression(exp)],
                                        ),
                                    )));
                                }
                            }
                            None => {
                                let code = if is_bind {
                                    ErrorCode::VBindNoExpression
                                } else {
                                    ErrorCode::VOnNoExpression
                                };
                                ctx.error(code, Some(dir.loc));
                            }
                        }
                        continue;
                    }
                    _ => {}
                }
                if dir.name == "bind" && consumed_is {
                    if dir.arg.as_ref().and_then(|a| a.static_content()) == Some("is") {
                        continue;
                    }
                }
                if let Some(&transform) = ctx.directive_transforms.get(dir.name.as_str()) {
                    let result = transform(dir, el, ctx);
                    for prop in result.props {
                        analysis.visit(&prop, is_component);
                        properties.push(prop);
                    }
                    if let Some(helper) = result.need_runtime {
                        ctx.helper(helper);
                    }
                } else {
                    // User directive: resolve at runtime, apply with
                    // withDirectives.
                    ctx.helper(RuntimeHelper::ResolveDirective);
                    ctx.directives.insert(dir.name.clone());
                    runtime_directives.push(RuntimeDirective {
                        name: dir.name,
                        exp: dir.exp,
                        arg: dir.arg,
                        modifiers: dir.modifiers,
                    });
                }
            }
        }
    }

    let props = if !merge_args.is_empty() {
        if !properties.is_empty() {
            merge_args.push(JsChildNode::Object(Box::new(ObjectExpression::new(
                dedupe_properties(properties),
            ))));
        }
        if merge_args.len() == 1 {
            merge_args.pop()
        } else {
            ctx.helper(RuntimeHelper::MergeProps);
            let args = merge_args.into_iter().map(JsArg::Js).collect();
            Some(JsChildNode::Call(Box::new(CallExpression::new(
                RuntimeHelper::MergeProps,
                args,
            ))))
        }
    } else if !properties.is_empty() {
        Some(JsChildNode::Object(Box::new(ObjectExpression::new(dedupe_properties(
            properties,
        )))))
    } else {
        None
    };

    let mut patch_flags = PatchFlags::empty();
    if analysis.has_dynamic_keys {
        patch_flags |= PatchFlags::FULL_PROPS;
    } else {
        if analysis.has_class_binding {
            patch_flags |= PatchFlags::CLASS;
        }
        if analysis.has_style_binding {
            patch_flags |= PatchFlags::STYLE;
        }
        if !analysis.dynamic_prop_names.is_empty() {
            patch_flags |= PatchFlags::PROPS;
        }
        if analysis.has_hydration_event_binding {
            patch_flags |= PatchFlags::NEED_HYDRATION;
        }
    }
    if (patch_flags.is_empty() || patch_flags == PatchFlags::NEED_HYDRATION)
        && (analysis.has_ref || !runtime_directives.is_empty())
    {
        patch_flags |= PatchFlags::NEED_PATCH;
    }

    PropsResult {
        props,
        patch_flags,
        dynamic_prop_names: analysis.dynamic_prop_names,
        directives: runtime_directives,
    }
}

/// Merge duplicate `class` / `style` / event keys into arrays; other
/// duplicates keep the first occurrence.
fn dedupe_properties(properties: Vec<Property>) -> Vec<Property> {
    let mut known: FxHashMap<String, usize> = FxHashMap::default();
    let mut deduped: Vec<Property> = Vec::new();
    for prop in properties {
        let name = match prop.key.static_content() {
            Some(name) => String::from(name),
            None => {
                deduped.push(prop);
                continue;
            }
        };
        match known.get(&name) {
            Some(&i) if name == "class" || name == "style" || name.starts_with("on") => {
                merge_as_array(&mut deduped[i], prop);
            }
            Some(_) => {}
            None => {
                known.insert(name, deduped.len());
                deduped.push(prop);
            }
        }
    }
    deduped
}

fn merge_as_array(existing: &mut Property, incoming: Property) {
    match &mut existing.value {
        JsChildNode::Array(arr) => arr.elements.push(JsArg::Js(incoming.value)),
        _ => {
            let first = std::mem::replace(
                &mut existing.value,
                JsChildNode::Simple(Box::new(SimpleExpressionNode::new(
                    "",
                    true,
                    SourceLocation::stub(),
                ))),
            );
            existing.value = JsChildNode::Array(Box::new(ArrayExpression {
                elements: vec![JsArg::Js(first), JsArg::Js(incoming.value)],
                loc: SourceLocation::stub(),
            }));
        }
    }
}

/// Add a prop to an already-built vnode call, in front of whatever is
/// there.
pub(crate) fn inject_prop(vnode: &mut VNodeCall, prop: Property, ctx: &mut TransformContext) {
    match vnode.props.take() {
        None => {
            vnode.props = Some(JsChildNode::Object(Box::new(ObjectExpression::new(vec![prop]))));
        }
        Some(JsChildNode::Object(mut obj)) => {
            obj.properties.insert(0, prop);
            vnode.props = Some(JsChildNode::Object(obj));
        }
        Some(JsChildNode::Call(mut call)) if call.callee == RuntimeHelper::MergeProps => {
            call.args.insert(
                0,
                JsArg::Js(JsChildNode::Object(Box::new(ObjectExpression::new(vec![prop])))),
            );
            vnode.props = Some(JsChildNode::Call(call));
        }
        Some(other) => {
            // Unknown props shape (e.g. a spread ref): wrap in mergeProps.
            ctx.helper(RuntimeHelper::MergeProps);
            vnode.props = Some(JsChildNode::Call(Box::new(CallExpression::new(
                RuntimeHelper::MergeProps,
                vec![
                    JsArg::Js(JsChildNode::Object(Box::new(ObjectExpression::new(vec![prop])))),
                    JsArg::Js(other),
                ],
            ))));
        }
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

    fn root_vnode(result: &CompileResult) -> &VNodeCall {
        match result.root.codegen_node.as_ref() {
            Some(JsChildNode::VNodeCall(vnode)) => vnode,
            other => panic!("expected vnode codegen, got {other:?}"),
        }
    }

    #[test]
    fn test_static_element() {
        let result = compile("<div id=\"app\">hi</div>");
        assert!(result.errors.is_empty());
        let vnode = root_vnode(&result);
        assert!(matches!(&vnode.tag, VNodeTag::Plain(t) if t == "div"));
        assert_eq!(vnode.patch_flag, None);
        match &vnode.children {
            Some(VNodeChildren::Text(text)) => assert!(text.is_static()),
            other => panic!("expected text child, got {other:?}"),
        }
    }

    #[test]
    fn test_class_binding_flag() {
        let result = compile("<div :class=\"cls\"/>");
        let vnode = root_vnode(&result);
        assert_eq!(vnode.patch_flag, Some(PatchFlags::CLASS));
    }

    #[test]
    fn test_dynamic_prop_names() {
        let result = compile("<div :id=\"dynamicId\" title=\"static\"/>");
        let vnode = root_vnode(&result);
        assert_eq!(vnode.patch_flag, Some(PatchFlags::PROPS));
        assert_eq!(vnode.dynamic_props.as_deref(), Some(&[String::from("id")][..]));
    }

    #[test]
    fn test_dynamic_key_forces_full_props() {
        let result = compile("<div :[name]=\"value\"/>");
        let vnode = root_vnode(&result);
        assert_eq!(vnode.patch_flag, Some(PatchFlags::FULL_PROPS));
    }

    #[test]
    fn test_interpolation_child_sets_text_flag() {
        let result = compile("<span>{{ msg }}</span>");
        let vnode = root_vnode(&result);
        assert_eq!(vnode.patch_flag, Some(PatchFlags::TEXT));
        assert!(matches!(&vnode.children, Some(VNodeChildren::Text(_))));
    }

    #[test]
    fn test_component_resolution() {
        let result = compile("<MyWidget/>");
        let vnode = root_vnode(&result);
        assert!(vnode.is_component);
        assert!(matches!(&vnode.tag, VNodeTag::Component(id) if id == "_component_MyWidget"));
        assert_eq!(result.root.components, vec![String::from("MyWidget")]);
        assert!(result.root.helpers.contains(&RuntimeHelper::ResolveComponent));
    }

    #[test]
    fn test_builtin_component_is_helper() {
        let result = compile("<Teleport to=\"#end\"><div/></Teleport>");
        let vnode = root_vnode(&result);
        assert!(matches!(vnode.tag, VNodeTag::Helper(RuntimeHelper::Teleport)));
        // Teleport forces a block.
        assert!(vnode.is_block);
        assert!(result.root.components.is_empty());
    }

    #[test]
    fn test_dynamic_component() {
        let result = compile("<component :is=\"view\"/>");
        let vnode = root_vnode(&result);
        match &vnode.tag {
            VNodeTag::Call(call) => {
                assert_eq!(call.callee, RuntimeHelper::ResolveDynamicComponent);
            }
            other => panic!("expected dynamic component call, got {other:?}"),
        }
        assert!(vnode.is_block);
    }

    #[test]
    fn test_v_bind_spread_merges() {
        let result = compile("<div id=\"a\" v-bind=\"rest\"/>");
        let vnode = root_vnode(&result);
        assert_eq!(vnode.patch_flag, Some(PatchFlags::FULL_PROPS));
        match &vnode.props {
            Some(JsChildNode::Call(call)) => assert_eq!(call.callee, RuntimeHelper::MergeProps),
            other => panic!("expected mergeProps call, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_class_merges_to_array() {
        let result = compile("<div class=\"a\" :class=\"b\"/>");
        let vnode = root_vnode(&result);
        match &vnode.props {
            Some(JsChildNode::Object(obj)) => {
                assert_eq!(obj.properties.len(), 1);
                assert!(matches!(obj.properties[0].value, JsChildNode::Array(_)));
            }
            other => panic!("expected object props, got {other:?}"),
        }
    }

    #[test]
    fn test_user_directive_needs_runtime() {
        let result = compile("<div v-focus/>");
        let vnode = root_vnode(&result);
        assert!(vnode.directives.is_some());
        assert_eq!(vnode.patch_flag, Some(PatchFlags::NEED_PATCH));
        assert_eq!(result.root.directives, vec![String::from("focus")]);
        assert!(result.root.helpers.contains(&RuntimeHelper::WithDirectives));
        assert!(result.root.helpers.contains(&RuntimeHelper::ResolveDirective));
    }

    #[test]
    fn test_svg_is_block() {
        let result = compile("<svg><path/></svg>");
        let vnode = root_vnode(&result);
        assert!(vnode.is_block);
    }
}
