//! Slot scope tracking.
//!
//! Components and templates carrying `v-slot` open a slot scope for the
//! duration of their subtree; `v-slot` anywhere else is an error.

use crate::ast::*;
use crate::errors::ErrorCode;
use crate::transform::{Siblings, TransformContext, TransformNode, VisitAction};
use crate::utils::{find_dir, take_dir};

pub fn track_slot_scopes(
    node: TransformNode<'_>,
    _siblings: &mut Siblings<'_>,
    ctx: &mut TransformContext,
) -> VisitAction {
    let TransformNode::Child(TemplateChildNode::Element(el)) = node else {
        return VisitAction::None;
    };
    match el.tag_type {
        ElementType::Component | ElementType::Template => {
            if find_dir(el, "slot").is_some() {
                ctx.scopes.v_slot += 1;
                return VisitAction::Exit(Box::new(|ctx, _| {
                    ctx.scopes.v_slot -= 1;
                }));
            }
        }
        ElementType::Element => {
            if let Some(dir) = take_dir(el, |d| d.name == "slot") {
                ctx.error(ErrorCode::VSlotMisplaced, Some(dir.loc));
            }
        }
        ElementType::Slot => {}
    }
    VisitAction::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::base_compile;
    use crate::options::ParserOptions;

    #[test]
    fn test_v_slot_on_plain_element_errors() {
        let result = base_compile(
            "<div v-slot=\"props\"/>",
            ParserOptions::default(),
            Default::default(),
        );
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::VSlotMisplaced));
    }

    #[test]
    fn test_v_slot_on_component_is_accepted() {
        let result = base_compile(
            "<Card v-slot=\"{ item }\">{{ item }}</Card>",
            ParserOptions::default(),
            Default::default(),
        );
        assert!(result.errors.is_empty());
    }
}
