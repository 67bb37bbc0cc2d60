//! Server node and directive transforms.
//!
//! The structural transforms (`v-if`, `v-for`), slot scope tracking and the
//! expression rewriter are shared with the client backend. Elements,
//! components and slot outlets get server versions that fill
//! `ssr_codegen_node` instead of `codegen_node`; the statement lowering in
//! [`crate::codegen`] then turns the tree into `_push` calls.

pub mod component;
pub mod element;
pub mod fallthrough;
pub mod slot_outlet;
pub mod v_model;
pub mod v_show;

use tessera_arena::String;
use tessera_core::transforms::transform_expression::TransformExpression;
use tessera_core::transforms::v_for::transform_for_ssr;
use tessera_core::transforms::v_if::transform_if;
use tessera_core::transforms::v_slot::{TrackSlotScopes, TrackVForSlotScopes};
use tessera_core::{BoxedNodeTransform, DirectiveTransform, TransformPreset};
use tessera_dom::transforms::transform_style::TransformStyle;

/// Node transforms of the server backend, in registration order.
///
/// Fallthrough injection comes first so it still sees the raw `v-if`
/// siblings at the root.
pub fn ssr_node_transforms() -> std::vec::Vec<BoxedNodeTransform> {
    vec![
        Box::new(fallthrough::InjectFallthroughAttrs),
        Box::new(transform_if()),
        Box::new(transform_for_ssr()),
        Box::new(TrackVForSlotScopes),
        Box::new(TransformExpression),
        Box::new(slot_outlet::SsrTransformSlotOutlet),
        Box::new(element::SsrTransformElement),
        Box::new(component::SsrTransformComponent),
        Box::new(TrackSlotScopes),
        Box::new(TransformStyle),
    ]
}

pub fn ssr_directive_transforms() -> std::vec::Vec<(String, DirectiveTransform)> {
    vec![
        ("cloak".into(), DirectiveTransform::Noop),
        ("show".into(), DirectiveTransform::Extension(v_show::ssr_transform_show)),
        ("model".into(), DirectiveTransform::Extension(v_model::ssr_transform_model)),
    ]
}

/// Full server preset. The tree is lowered to statements once walked.
pub fn ssr_preset() -> TransformPreset {
    TransformPreset {
        node_transforms: ssr_node_transforms(),
        directive_transforms: ssr_directive_transforms(),
        transform_hoist: None,
        transform_root: Some(crate::codegen::lower_root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_shape() {
        let preset = ssr_preset();
        assert_eq!(preset.node_transforms.len(), 10);
        assert!(preset.transform_hoist.is_none());
        assert!(preset.transform_root.is_some());
        let names: std::vec::Vec<&str> =
            preset.directive_transforms.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["cloak", "show", "model"]);
    }
}
