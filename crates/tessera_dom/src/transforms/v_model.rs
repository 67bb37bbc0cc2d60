//! v-model on native form elements.
//!
//! Wraps the component form from the core: the `modelValue` prop is
//! dropped because the runtime directive reads the bound value itself, and
//! the directive to apply is picked from the tag and its `type`.

use tessera_ast::{
    DirectiveNode, ElementNode, ElementType, ExpressionNode, PropNode, RuntimeHelper,
};
use tessera_core::transforms::v_model::transform_model;
use tessera_core::utils::{find_dir, find_prop, is_static_arg_of};
use tessera_core::{DirectiveTransformResult, NeedRuntime, TransformContext};

use crate::errors::{create_dom_error, DomErrorCode};
use crate::options::element_checks::is_v_model_element;

pub fn transform_v_model<'a>(
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    let mut result = transform_model(dir, el, ctx);
    if result.props.is_empty() || el.tag_type == ElementType::Component {
        return result;
    }

    if let Some(arg) = &dir.arg {
        ctx.on_error(create_dom_error(DomErrorCode::VModelArgOnElement, arg.loc()));
    }

    let tag = el.tag.as_str();
    let is_custom_element = ctx.options.is_custom_element.is_some_and(|f| f(tag));
    if is_v_model_element(tag) || is_custom_element {
        let mut directive = Some(RuntimeHelper::VModelText);
        if tag == "input" || is_custom_element {
            match find_prop(el, "type", false, false) {
                Some(PropNode::Directive(_)) => directive = Some(RuntimeHelper::VModelDynamic),
                Some(PropNode::Attribute(attr)) => {
                    match attr.value.as_ref().map(|v| v.content.as_str()) {
                        Some("radio") => directive = Some(RuntimeHelper::VModelRadio),
                        Some("checkbox") => directive = Some(RuntimeHelper::VModelCheckbox),
                        Some("file") => {
                            directive = None;
                            ctx.on_error(create_dom_error(
                                DomErrorCode::VModelOnFileInputElement,
                                &dir.loc,
                            ));
                        }
                        _ => check_duplicated_value(el, ctx),
                    }
                }
                None if has_dynamic_key_v_bind(el) => {
                    directive = Some(RuntimeHelper::VModelDynamic);
                }
                None => check_duplicated_value(el, ctx),
            }
        } else if tag == "select" {
            directive = Some(RuntimeHelper::VModelSelect);
        } else {
            check_duplicated_value(el, ctx);
        }
        result.need_runtime = directive.map(NeedRuntime::Helper);
    } else {
        ctx.on_error(create_dom_error(DomErrorCode::VModelOnInvalidElement, &dir.loc));
    }

    result
        .props
        .retain(|p| !matches!(&p.key, ExpressionNode::Simple(k) if k.content == "modelValue"));
    result
}

fn check_duplicated_value(el: &ElementNode<'_>, ctx: &mut TransformContext<'_>) {
    if let Some(value) = find_dir(el, "bind", false) {
        if is_static_arg_of(value.arg.as_ref(), "value") {
            ctx.on_error(create_dom_error(DomErrorCode::VModelUnnecessaryValue, &value.loc));
        }
    }
}

/// `v-bind="obj"` or `:[key]` may set `type` at runtime.
fn has_dynamic_key_v_bind(el: &ElementNode<'_>) -> bool {
    el.props.iter().any(|p| match p {
        PropNode::Directive(dir) => {
            dir.name == "bind"
                && !matches!(&dir.arg, Some(ExpressionNode::Simple(arg)) if arg.is_static)
        }
        PropNode::Attribute(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{compile, root_props};

    #[test]
    fn test_text_input() {
        root_props(r#"<input v-model="model"/>"#, |props| {
            assert_eq!(props.len(), 1);
            assert_eq!(props[0].static_key(), Some("onUpdate:modelValue"));
        });
        let output = compile(r#"<input v-model="model"/>"#);
        assert!(output.code.contains("[_vModelText, model]"), "{}", output.code);
    }

    #[test]
    fn test_directive_by_type() {
        let cases = [
            (r#"<input type="radio" v-model="m"/>"#, "_vModelRadio"),
            (r#"<input type="checkbox" v-model="m"/>"#, "_vModelCheckbox"),
            (r#"<input :type="t" v-model="m"/>"#, "_vModelDynamic"),
            (r#"<input v-bind="attrs" v-model="m"/>"#, "_vModelDynamic"),
            (r#"<select v-model="m"/>"#, "_vModelSelect"),
            (r#"<textarea v-model="m"/>"#, "_vModelText"),
        ];
        for (source, helper) in cases {
            let output = compile(source);
            assert!(output.errors.is_empty(), "{}: {:?}", source, output.errors);
            assert!(output.code.contains(helper), "{}:\n{}", source, output.code);
        }
    }

    #[test]
    fn test_modifiers_are_passed_to_directive() {
        let output = compile(r#"<input v-model.trim.lazy="m"/>"#);
        // the two-key modifiers object is printed over several lines
        let flat = output.code.split_whitespace().collect::<std::vec::Vec<_>>().join(" ");
        assert!(
            flat.contains("[_vModelText, m, void 0, { trim: true, lazy: true }]"),
            "{}",
            output.code
        );
    }

    #[test]
    fn test_invalid_usages() {
        assert_eq!(compile(r#"<div v-model="m"/>"#).errors[0].code, 57);
        assert_eq!(compile(r#"<input v-model:value="m"/>"#).errors[0].code, 58);
        assert_eq!(compile(r#"<input type="file" v-model="m"/>"#).errors[0].code, 59);
        assert_eq!(compile(r#"<input v-model="m" :value="v"/>"#).errors[0].code, 60);
    }

    #[test]
    fn test_component_keeps_model_value() {
        let output = compile(r#"<Comp v-model="m"/>"#);
        assert!(output.code.contains("modelValue: m"), "{}", output.code);
        assert!(!output.code.contains("_vModel"), "{}", output.code);
    }
}
