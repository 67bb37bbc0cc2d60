//! Static `style` attributes.
//!
//! A static `style="color: red"` is turned into a constant `:style` binding
//! holding the parsed declarations as an object literal, so class and style
//! normalization treat static and bound styles alike.

use tessera_arena::{Box, String};
use tessera_ast::{
    ConstantType, DirectiveNode, ExpressionNode, PropNode, SimpleExpressionNode, SourceLocation,
    TemplateChildNode,
};
use tessera_core::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};

pub struct TransformStyle;

impl<'a> NodeTransform<'a> for TransformStyle {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node_mut() else {
            return None;
        };
        for prop in el.props.iter_mut() {
            let PropNode::Attribute(attr) = prop else {
                continue;
            };
            if attr.name != "style" {
                continue;
            }
            let Some(value) = &attr.value else {
                continue;
            };
            let loc = attr.loc.clone();
            let mut dir = DirectiveNode::new(ctx.allocator, "bind", loc.clone());
            dir.raw_name = String::from(":style");
            dir.arg = Some(ExpressionNode::Simple(SimpleExpressionNode::new(
                "style",
                true,
                loc.clone(),
            )));
            dir.exp = Some(parse_inline_css(&value.content, loc));
            *prop = PropNode::Directive(Box::new_in(dir, ctx.allocator));
        }
        None
    }
}

fn parse_inline_css(css: &str, loc: SourceLocation) -> ExpressionNode {
    let declarations = parse_string_style(css);
    let mut object = std::string::String::from("{");
    for (i, (name, value)) in declarations.iter().enumerate() {
        if i > 0 {
            object.push(',');
        }
        object.push_str(&json_string(name));
        object.push(':');
        object.push_str(&json_string(value));
    }
    object.push('}');
    ExpressionNode::Simple(
        SimpleExpressionNode::new(object, false, loc).with_const_type(ConstantType::CanStringify),
    )
}

fn json_string(value: &str) -> std::string::String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

/// Split a declaration list into `(property, value)` pairs.
///
/// Semicolons inside parentheses (`url(a;b)`) do not end a declaration and
/// comments are dropped. A repeated property keeps its first position and
/// its last value.
pub fn parse_string_style(css: &str) -> std::vec::Vec<(std::string::String, std::string::String)> {
    let css = strip_comments(css);
    let mut declarations: std::vec::Vec<(std::string::String, std::string::String)> =
        std::vec::Vec::new();
    for item in split_declarations(&css) {
        let Some((name, value)) = item.split_once(':') else {
            continue;
        };
        let name = name.trim().to_string();
        let value = value.trim().to_string();
        match declarations.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => declarations.push((name, value)),
        }
    }
    declarations
}

fn strip_comments(css: &str) -> std::string::String {
    let mut out = std::string::String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn split_declarations(css: &str) -> std::vec::Vec<&str> {
    let mut items = std::vec::Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in css.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                items.push(&css[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&css[start..]);
    items
}
