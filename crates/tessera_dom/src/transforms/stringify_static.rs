//! Merge long runs of hoisted static nodes into one `createStaticVNode`.
//!
//! Runs hook into the hoisting pass: after a children list had nodes
//! hoisted, consecutive hoisted nodes are measured and, once a run holds
//! enough nodes or enough elements with bindings, it is serialized to
//! markup and the whole run shares a single hoist.

use once_cell::sync::Lazy;
use regex::Regex;
use tessera_arena::{
    escape_html, is_boolean_attr, is_known_html_attr, is_known_math_ml_attr, is_known_svg_attr,
    is_void_tag, Vec,
};
use tessera_ast::{
    create_call_expression, Callee, CompoundExpressionNode, CompoundPart, ConstantType,
    ElementNode, ElementType, ExpressionNode, JsNode, Namespace, PropNode, RuntimeHelper,
    SourceLocation, TemplateChildNode, TextCallContent,
};
use tessera_core::utils::is_static_arg_of;
use tessera_core::{ParentInfo, TransformContext};

use super::constant::{
    evaluate_constant, normalize_class, normalize_style, stringify_style, to_display_string,
    ConstantValue,
};
use crate::options::element_checks::is_non_stringifiable;

/// Nodes in a run before it is worth stringifying
pub const NODE_COUNT_THRESHOLD: usize = 20;
/// Elements with attributes in a run before it is worth stringifying
pub const ELEMENT_WITH_BINDING_COUNT_THRESHOLD: usize = 5;

const EXP_START: &str = "__TESSERA_EXP_START__";
const EXP_END: &str = "__TESSERA_EXP_END__";

static EXP_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{}(.*?){}", EXP_START, EXP_END)).expect("valid regex")
});

/// Hoist hook registered by the DOM preset.
pub fn stringify_static<'a>(
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    ctx: &mut TransformContext<'a>,
    parent: &ParentInfo,
) {
    // slot content is rendered by the child component and may be reused
    if ctx.scopes.v_slot > 0 || parent.is_component() {
        return;
    }

    let mut run = Run::default();
    let mut i = 0;
    while i < children.len() {
        if is_hoisted(&children[i], ctx) {
            if let Some((nc, ec)) = analyze_node(&children[i]) {
                run.push(i, nc, ec);
                i += 1;
                continue;
            }
        }
        i -= stringify_run(children, &run, ctx);
        run = Run::default();
        i += 1;
    }
    stringify_run(children, &run, ctx);
}

#[derive(Default)]
struct Run {
    indices: std::vec::Vec<usize>,
    node_count: usize,
    element_with_binding_count: usize,
}

impl Run {
    fn push(&mut self, index: usize, nc: usize, ec: usize) {
        self.indices.push(index);
        self.node_count += nc;
        self.element_with_binding_count += ec;
    }

    fn is_worth_stringifying(&self) -> bool {
        !self.indices.is_empty()
            && (self.node_count >= NODE_COUNT_THRESHOLD
                || self.element_with_binding_count >= ELEMENT_WITH_BINDING_COUNT_THRESHOLD)
    }
}

fn is_hoisted(node: &TemplateChildNode<'_>, ctx: &TransformContext<'_>) -> bool {
    let (id, codegen) = match node {
        TemplateChildNode::Element(el) if el.tag_type == ElementType::Element => {
            (el.id, el.codegen_node.as_ref())
        }
        TemplateChildNode::TextCall(text) => (text.id, text.codegen_node.as_ref()),
        _ => return false,
    };
    matches!(codegen, Some(JsNode::Simple(_))) && ctx.hoisted_nodes.contains_key(&id)
}

/// Replace the run with one static vnode; returns the number of removed
/// children.
fn stringify_run<'a>(
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    run: &Run,
    ctx: &mut TransformContext<'a>,
) -> usize {
    if !run.is_worth_stringifying() {
        return 0;
    }
    let scope_id = ctx.options.scope_id.as_ref().map(|s| s.to_string());
    let mut markup = std::string::String::new();
    for &index in &run.indices {
        match stringify_node(&children[index], scope_id.as_deref()) {
            Some(html) => markup.push_str(&html),
            None => return 0,
        }
    }
    let Ok(literal) = serde_json::to_string(&markup) else {
        return 0;
    };
    let literal = EXP_MARKER_RE.replace_all(&literal, "\" + ${1} + \"");

    let hoist_indices: std::vec::Vec<usize> = run
        .indices
        .iter()
        .filter_map(|index| children[*index].id())
        .filter_map(|id| ctx.hoisted_nodes.get(&id).copied())
        .collect();
    let Some((&first, rest)) = hoist_indices.split_first() else {
        return 0;
    };

    for &index in &run.indices {
        release_helpers(&children[index], ctx);
    }
    let helper = ctx.helper(RuntimeHelper::CreateStatic);
    ctx.hoists[first] = Some(create_call_expression(
        Callee::Helper(helper),
        vec![
            JsNode::raw(literal.into_owned()),
            JsNode::raw(run.indices.len().to_string()),
        ],
        SourceLocation::STUB,
    ));
    for &index in rest {
        ctx.hoists[index] = None;
    }

    let removed = run.indices.len() - 1;
    if removed > 0 {
        let start = run.indices[1];
        children.drain(start..start + removed);
    }
    tracing::trace!(
        nodes = run.indices.len(),
        node_count = run.node_count,
        "stringified static run"
    );
    removed
}

/// Give back the vnode helpers of a node that now lives in static markup.
fn release_helpers(node: &TemplateChildNode<'_>, ctx: &mut TransformContext<'_>) {
    match node {
        TemplateChildNode::Element(el) => {
            ctx.remove_helper(RuntimeHelper::CreateElementVNode);
            for child in el.children.iter() {
                release_helpers(child, ctx);
            }
        }
        TemplateChildNode::TextCall(_) => ctx.remove_helper(RuntimeHelper::CreateText),
        _ => {}
    }
}

/// `(node count, element-with-binding count)` of a stringifiable node.
fn analyze_node(node: &TemplateChildNode<'_>) -> Option<(usize, usize)> {
    match node {
        TemplateChildNode::TextCall(_) => Some((1, 0)),
        TemplateChildNode::Element(el) => {
            if is_non_stringifiable(&el.tag) {
                return None;
            }
            let mut nc = 1;
            let mut ec = usize::from(!el.props.is_empty());
            walk(el, &mut nc, &mut ec).then_some((nc, ec))
        }
        _ => None,
    }
}

fn walk(el: &ElementNode<'_>, nc: &mut usize, ec: &mut usize) -> bool {
    let is_option = el.tag == "option" && el.ns == Namespace::Html;
    for prop in el.props.iter() {
        match prop {
            PropNode::Attribute(attr) => {
                if !is_stringifiable_attr(&attr.name, el.ns) {
                    return false;
                }
            }
            PropNode::Directive(dir) if dir.name == "bind" => {
                match &dir.arg {
                    Some(ExpressionNode::Compound(_)) => return false,
                    Some(ExpressionNode::Simple(arg))
                        if arg.is_static && !is_stringifiable_attr(&arg.content, el.ns) =>
                    {
                        return false
                    }
                    _ => {}
                }
                match &dir.exp {
                    Some(ExpressionNode::Compound(_)) => return false,
                    Some(ExpressionNode::Simple(exp))
                        if exp.const_type < ConstantType::CanStringify =>
                    {
                        return false
                    }
                    _ => {}
                }
                // the runtime keeps a non-string option value on the element
                if is_option && is_static_arg_of(dir.arg.as_ref(), "value") {
                    let literal = match &dir.exp {
                        Some(ExpressionNode::Simple(exp)) => {
                            matches!(evaluate_constant(&exp.content), Some(ConstantValue::String(_)))
                        }
                        _ => false,
                    };
                    if !literal {
                        return false;
                    }
                }
            }
            PropNode::Directive(_) => {}
        }
    }
    for child in el.children.iter() {
        *nc += 1;
        if let TemplateChildNode::Element(child) = child {
            if !child.props.is_empty() {
                *ec += 1;
            }
            if !walk(child, nc, ec) {
                return false;
            }
        }
    }
    true
}

fn is_stringifiable_attr(name: &str, ns: Namespace) -> bool {
    let known = match ns {
        Namespace::Html => is_known_html_attr(name),
        Namespace::Svg => is_known_svg_attr(name),
        Namespace::MathMl => is_known_math_ml_attr(name),
    };
    known || name.starts_with("data-") || name.starts_with("aria-")
}

fn stringify_node(node: &TemplateChildNode<'_>, scope_id: Option<&str>) -> Option<std::string::String> {
    match node {
        TemplateChildNode::Element(el) => stringify_element(el, scope_id),
        TemplateChildNode::Text(text) => Some(escape_html(&text.content).to_string()),
        TemplateChildNode::Comment(comment) => {
            Some(format!("<!--{}-->", escape_html(&comment.content)))
        }
        TemplateChildNode::Interpolation(interp) => {
            Some(escape_html(&to_display_string(&evaluate_expression(&interp.content)?)).to_string())
        }
        TemplateChildNode::Compound(compound) => {
            Some(escape_html(&evaluate_compound(compound)?).to_string())
        }
        TemplateChildNode::TextCall(text) => match &text.content {
            TextCallContent::Text(text) => Some(escape_html(&text.content).to_string()),
            TextCallContent::Interpolation(interp) => Some(
                escape_html(&to_display_string(&evaluate_expression(&interp.content)?)).to_string(),
            ),
            TextCallContent::Compound(compound) => {
                Some(escape_html(&evaluate_compound(compound)?).to_string())
            }
        },
        TemplateChildNode::If(_) | TemplateChildNode::For(_) => None,
    }
}

fn stringify_element(el: &ElementNode<'_>, scope_id: Option<&str>) -> Option<std::string::String> {
    let mut res = format!("<{}", el.tag);
    let mut inner_html: Option<std::string::String> = None;
    for prop in el.props.iter() {
        match prop {
            PropNode::Attribute(attr) => {
                res.push(' ');
                res.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    res.push_str(&format!("=\"{}\"", escape_html(&value.content)));
                }
            }
            PropNode::Directive(dir) => {
                let Some(ExpressionNode::Simple(exp)) = &dir.exp else {
                    continue;
                };
                match dir.name.as_str() {
                    "bind" => {
                        let Some(ExpressionNode::Simple(arg)) = &dir.arg else {
                            return None;
                        };
                        let name = arg.content.as_str();
                        // hoisted asset references are resolved at runtime
                        if exp.content.starts_with('_') {
                            res.push_str(&format!(
                                " {}=\"{}{}{}\"",
                                name, EXP_START, exp.content, EXP_END
                            ));
                            continue;
                        }
                        if is_boolean_attr(name) && exp.content == "false" {
                            continue;
                        }
                        let value = evaluate_constant(&exp.content)?;
                        if matches!(value, ConstantValue::Null | ConstantValue::Undefined) {
                            continue;
                        }
                        let text = match name {
                            "class" => normalize_class(&value),
                            "style" => stringify_style(&normalize_style(&value)),
                            _ => value.to_js_string(),
                        };
                        res.push_str(&format!(" {}=\"{}\"", name, escape_html(&text)));
                    }
                    "html" => inner_html = Some(evaluate_constant(&exp.content)?.to_js_string()),
                    "text" => {
                        let value = evaluate_constant(&exp.content)?;
                        inner_html = Some(escape_html(&to_display_string(&value)).to_string());
                    }
                    _ => {}
                }
            }
        }
    }
    if let Some(scope_id) = scope_id {
        res.push(' ');
        res.push_str(scope_id);
    }
    res.push('>');
    match inner_html {
        Some(html) => res.push_str(&html),
        None => {
            for child in el.children.iter() {
                res.push_str(&stringify_node(child, scope_id)?);
            }
        }
    }
    if !is_void_tag(&el.tag) {
        res.push_str(&format!("</{}>", el.tag));
    }
    Some(res)
}

fn evaluate_expression(exp: &ExpressionNode) -> Option<ConstantValue> {
    match exp {
        ExpressionNode::Simple(simple) => evaluate_constant(&simple.content),
        ExpressionNode::Compound(compound) => evaluate_compound(compound).map(ConstantValue::String),
    }
}

fn evaluate_compound(compound: &CompoundExpressionNode) -> Option<std::string::String> {
    let mut out = std::string::String::new();
    for part in &compound.parts {
        match part {
            CompoundPart::Code(_) | CompoundPart::Helper(_) => {}
            CompoundPart::Text(text) => out.push_str(&text.content),
            CompoundPart::Interpolation(interp) => {
                out.push_str(&to_display_string(&evaluate_expression(&interp.content)?))
            }
            CompoundPart::Simple(simple) => {
                out.push_str(&evaluate_constant(&simple.content)?.to_js_string())
            }
            CompoundPart::Compound(inner) => out.push_str(&evaluate_compound(inner)?),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::compile_with;
    use crate::DomCompilerOptions;

    fn hoisting() -> DomCompilerOptions {
        DomCompilerOptions {
            hoist_static: true,
            prefix_identifiers: true,
            ..Default::default()
        }
    }

    fn repeat(fragment: &str, n: usize) -> std::string::String {
        fragment.repeat(n)
    }

    #[test]
    fn test_below_threshold_is_left_alone() {
        let source = format!("<div :id=\"x\"><div>{}</div></div>", repeat("<span class=\"foo\"/>", 4));
        let output = compile_with(&source, hoisting());
        assert!(!output.code.contains("_createStaticVNode"), "{}", output.code);
    }

    #[test]
    fn test_node_count_threshold() {
        let source = format!(
            "<div :id=\"x\"><div>{}</div></div>",
            repeat("<span/>", NODE_COUNT_THRESHOLD)
        );
        let output = compile_with(&source, hoisting());
        assert!(
            output.code.contains(&format!(
                "_createStaticVNode(\"<div>{}</div>\", 1)",
                repeat("<span></span>", NODE_COUNT_THRESHOLD)
            )),
            "{}",
            output.code
        );
    }

    #[test]
    fn test_stringified_run_releases_vnode_helper() {
        let source = format!(
            "<div :id=\"x\"><div>{}</div></div>",
            repeat("<span/>", NODE_COUNT_THRESHOLD)
        );
        let output = compile_with(&source, hoisting());
        assert!(output.code.contains("createStaticVNode: _createStaticVNode"), "{}", output.code);
        assert!(!output.code.contains("createElementVNode"), "{}", output.code);

        // an unstringified sibling still needs it
        let source = format!(
            "<div :id=\"x\"><div>{}</div><p class=\"a\">{{{{ y }}}}</p></div>",
            repeat("<span/>", NODE_COUNT_THRESHOLD)
        );
        let output = compile_with(&source, hoisting());
        assert!(output.code.contains("_createElementVNode(\"p\""), "{}", output.code);
        assert!(output.code.contains("createElementVNode: _createElementVNode"), "{}", output.code);
    }

    #[test]
    fn test_binding_count_threshold_with_constant_bindings() {
        let source = format!(
            "<div :id=\"x\"><div>{}</div></div>",
            repeat("<span :class=\"'foo' + 'bar'\" :title=\"1 + 1\"/>", 5)
        );
        let output = compile_with(&source, hoisting());
        assert!(
            output
                .code
                .contains(&repeat("<span class=\\\"foobar\\\" title=\\\"2\\\"></span>", 5)),
            "{}",
            output.code
        );
    }

    #[test]
    fn test_sibling_run_shares_one_hoist() {
        let source = format!(
            "<div>{}<div :id=\"foo\"/></div>",
            repeat("<span class=\"a\">x</span>", 5)
        );
        let output = compile_with(&source, hoisting());
        assert!(output.code.contains("_createStaticVNode("), "{}", output.code);
        assert!(output.code.contains("</span>\", 5)"), "{}", output.code);
        assert!(!output.code.contains("_hoisted_2"), "{}", output.code);
    }

    #[test]
    fn test_non_stringifiable_attribute_bails() {
        let source = format!(
            "<div :id=\"x\"><div>{}</div></div>",
            repeat("<span unknown-attr=\"a\"/>", NODE_COUNT_THRESHOLD)
        );
        let output = compile_with(&source, hoisting());
        assert!(!output.code.contains("_createStaticVNode"), "{}", output.code);
    }

    #[test]
    fn test_table_sections_are_not_stringified() {
        let source = format!("<table :id=\"x\"><tr>{}</tr></table>", repeat("<td>x</td>", 25));
        let output = compile_with(&source, hoisting());
        assert!(!output.code.contains("_createStaticVNode"), "{}", output.code);
    }

    #[test]
    fn test_option_with_non_string_value_bails() {
        let source = format!(
            "<div :id=\"x\"><select>{}</select></div>",
            repeat("<option :value=\"1\">1</option>", 10)
        );
        let output = compile_with(&source, hoisting());
        assert!(!output.code.contains("_createStaticVNode"), "{}", output.code);
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let source = format!(
            "<div :id=\"x\"><div>{}</div></div>",
            repeat("<span title=\"a&quot;b\">&lt;x&gt;</span>", NODE_COUNT_THRESHOLD)
        );
        let output = compile_with(&source, hoisting());
        assert!(
            output.code.contains("<span title=\\\"a&quot;b\\\">&lt;x&gt;</span>"),
            "{}",
            output.code
        );
    }
}
