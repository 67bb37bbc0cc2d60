//! DOM-specific transforms layered over the core preset.

pub mod constant;
pub mod ignore_side_effect_tags;
pub mod inner_content;
pub mod stringify_static;
pub mod transform_style;
pub mod transform_transition;
pub mod v_html;
pub mod v_model;
pub mod v_on;
pub mod v_show;
pub mod v_text;

use tessera_arena::String;
use tessera_core::{base_node_transforms, BoxedNodeTransform, DirectiveTransform, TransformPreset};

/// Core node transforms followed by the DOM ones.
///
/// The DOM transforms run last on enter and first on exit, so their exit
/// hooks see an element before it is lowered to a vnode call.
pub fn dom_node_transforms() -> std::vec::Vec<BoxedNodeTransform> {
    let mut transforms = base_node_transforms();
    transforms.push(Box::new(ignore_side_effect_tags::IgnoreSideEffectTags));
    transforms.push(Box::new(transform_style::TransformStyle));
    transforms.push(Box::new(transform_transition::TransformTransition));
    transforms.push(Box::new(inner_content::DropOverriddenChildren));
    transforms
}

pub fn dom_directive_transforms() -> std::vec::Vec<(String, DirectiveTransform)> {
    vec![
        ("cloak".into(), DirectiveTransform::Noop),
        ("html".into(), DirectiveTransform::Extension(v_html::transform_v_html)),
        ("text".into(), DirectiveTransform::Extension(v_text::transform_v_text)),
        ("model".into(), DirectiveTransform::Extension(v_model::transform_v_model)),
        ("on".into(), DirectiveTransform::Extension(v_on::transform_v_on)),
        ("show".into(), DirectiveTransform::Extension(v_show::transform_v_show)),
    ]
}

/// Full client preset for browser targets.
pub fn dom_preset() -> TransformPreset {
    TransformPreset {
        node_transforms: dom_node_transforms(),
        directive_transforms: dom_directive_transforms(),
        transform_hoist: Some(stringify_static::stringify_static),
        transform_root: None,
    }
}
