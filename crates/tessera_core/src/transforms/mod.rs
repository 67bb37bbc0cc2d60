//! Built-in transforms.
//!
//! Order matters: structural directives run first so later transforms see
//! the replaced nodes, expressions are rewritten before the element
//! transform reads them, and the text transform is registered last so its
//! children pass runs before any container is lowered.

pub mod hoist_static;
pub mod transform_element;
pub mod transform_expression;
pub mod transform_slot_outlet;
pub mod transform_text;
pub mod v_bind;
pub mod v_for;
pub mod v_if;
pub mod v_memo;
pub mod v_model;
pub mod v_on;
pub mod v_once;
pub mod v_slot;

use crate::transform::{BoxedNodeTransform, TransformPreset};

/// Node transforms of the client backend, in registration order.
pub fn base_node_transforms() -> std::vec::Vec<BoxedNodeTransform> {
    vec![
        std::boxed::Box::new(v_once::TransformOnce),
        std::boxed::Box::new(v_if::transform_if()),
        std::boxed::Box::new(v_memo::TransformMemo),
        std::boxed::Box::new(v_for::transform_for()),
        std::boxed::Box::new(v_slot::TrackVForSlotScopes),
        std::boxed::Box::new(transform_expression::TransformExpression),
        std::boxed::Box::new(transform_slot_outlet::TransformSlotOutlet),
        std::boxed::Box::new(transform_element::TransformElement),
        std::boxed::Box::new(v_slot::TrackSlotScopes),
        std::boxed::Box::new(transform_text::TransformText),
    ]
}

/// Platform independent client preset. Directive kinds `bind`, `on`,
/// `model` and `cloak` resolve to their built-in transforms.
pub fn base_preset() -> TransformPreset {
    TransformPreset {
        node_transforms: base_node_transforms(),
        directive_transforms: std::vec::Vec::new(),
        transform_hoist: None,
        transform_root: None,
    }
}
