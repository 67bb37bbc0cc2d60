//! Compile-time evaluation of constant binding expressions.
//!
//! Only literal-shaped JavaScript is understood: primitives, template
//! literals, array and object literals, and unary, binary, logical and
//! conditional operators over them. Anything else evaluates to `None` and
//! the caller keeps the node dynamic.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrayExpressionElement, Expression, ObjectPropertyKind, PropertyKey, PropertyKind,
};
use oxc_parser::Parser;
use oxc_span::SourceType;
use oxc_syntax::operator::{BinaryOperator, LogicalOperator, UnaryOperator};
use tessera_arena::hyphenate;

use super::transform_style::parse_string_style;

/// A JavaScript value produced by a constant expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(std::string::String),
    Array(std::vec::Vec<ConstantValue>),
    /// Properties in insertion order
    Object(std::vec::Vec<(std::string::String, ConstantValue)>),
}

/// Parse and evaluate `source`.
pub fn evaluate_constant(source: &str) -> Option<ConstantValue> {
    let allocator = Allocator::default();
    let expr = Parser::new(&allocator, source, SourceType::default())
        .parse_expression()
        .ok()?;
    evaluate(&expr)
}

fn evaluate(expr: &Expression<'_>) -> Option<ConstantValue> {
    use ConstantValue as V;
    Some(match expr {
        Expression::StringLiteral(s) => V::String(s.value.to_string()),
        Expression::NumericLiteral(n) => V::Number(n.value),
        Expression::BooleanLiteral(b) => V::Bool(b.value),
        Expression::NullLiteral(_) => V::Null,
        Expression::Identifier(id) => match id.name.as_str() {
            "undefined" => V::Undefined,
            "NaN" => V::Number(f64::NAN),
            "Infinity" => V::Number(f64::INFINITY),
            _ => return None,
        },
        Expression::TemplateLiteral(tpl) => {
            let mut out = std::string::String::new();
            for (i, quasi) in tpl.quasis.iter().enumerate() {
                out.push_str(quasi.value.cooked.as_ref()?.as_str());
                if let Some(exp) = tpl.expressions.get(i) {
                    out.push_str(&evaluate(exp)?.to_js_string());
                }
            }
            V::String(out)
        }
        Expression::ArrayExpression(array) => {
            let mut items = std::vec::Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                match element {
                    ArrayExpressionElement::SpreadElement(spread) => {
                        match evaluate(&spread.argument)? {
                            V::Array(inner) => items.extend(inner),
                            V::String(s) => {
                                items.extend(s.chars().map(|c| V::String(c.to_string())))
                            }
                            _ => return None,
                        }
                    }
                    ArrayExpressionElement::Elision(_) => items.push(V::Undefined),
                    other => items.push(evaluate(other.as_expression()?)?),
                }
            }
            V::Array(items)
        }
        Expression::ObjectExpression(object) => {
            let mut entries: std::vec::Vec<(std::string::String, ConstantValue)> =
                std::vec::Vec::new();
            for property in &object.properties {
                match property {
                    ObjectPropertyKind::ObjectProperty(prop) => {
                        if prop.kind != PropertyKind::Init || prop.method {
                            return None;
                        }
                        let key = property_key(&prop.key, prop.computed)?;
                        let value = evaluate(&prop.value)?;
                        set_entry(&mut entries, key, value);
                    }
                    ObjectPropertyKind::SpreadProperty(spread) => {
                        match evaluate(&spread.argument)? {
                            V::Object(inner) => {
                                for (key, value) in inner {
                                    set_entry(&mut entries, key, value);
                                }
                            }
                            V::Null | V::Undefined => {}
                            _ => return None,
                        }
                    }
                }
            }
            V::Object(entries)
        }
        Expression::ParenthesizedExpression(paren) => evaluate(&paren.expression)?,
        Expression::UnaryExpression(unary) => {
            let value = evaluate(&unary.argument)?;
            match unary.operator {
                UnaryOperator::UnaryNegation => V::Number(-value.to_number()),
                UnaryOperator::UnaryPlus => V::Number(value.to_number()),
                UnaryOperator::LogicalNot => V::Bool(!value.is_truthy()),
                UnaryOperator::Typeof => V::String(value.type_of().to_string()),
                UnaryOperator::Void => V::Undefined,
                _ => return None,
            }
        }
        Expression::BinaryExpression(binary) => {
            let left = evaluate(&binary.left)?;
            let right = evaluate(&binary.right)?;
            binary_op(binary.operator, left, right)?
        }
        Expression::LogicalExpression(logical) => {
            let left = evaluate(&logical.left)?;
            let take_left = match logical.operator {
                LogicalOperator::Or => left.is_truthy(),
                LogicalOperator::And => !left.is_truthy(),
                LogicalOperator::Coalesce => !matches!(left, V::Null | V::Undefined),
            };
            if take_left {
                left
            } else {
                evaluate(&logical.right)?
            }
        }
        Expression::ConditionalExpression(cond) => {
            if evaluate(&cond.test)?.is_truthy() {
                evaluate(&cond.consequent)?
            } else {
                evaluate(&cond.alternate)?
            }
        }
        _ => return None,
    })
}

fn property_key(key: &PropertyKey<'_>, computed: bool) -> Option<std::string::String> {
    match key {
        PropertyKey::StaticIdentifier(id) if !computed => Some(id.name.to_string()),
        PropertyKey::PrivateIdentifier(_) => None,
        other => Some(evaluate(other.as_expression()?)?.to_js_string()),
    }
}

fn set_entry(
    entries: &mut std::vec::Vec<(std::string::String, ConstantValue)>,
    key: std::string::String,
    value: ConstantValue,
) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

fn binary_op(op: BinaryOperator, left: ConstantValue, right: ConstantValue) -> Option<ConstantValue> {
    use ConstantValue as V;
    Some(match op {
        BinaryOperator::Addition => {
            if left.is_primitive_number_like() && right.is_primitive_number_like() {
                V::Number(left.to_number() + right.to_number())
            } else {
                V::String(format!("{}{}", left.to_js_string(), right.to_js_string()))
            }
        }
        BinaryOperator::Subtraction => V::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiplication => V::Number(left.to_number() * right.to_number()),
        BinaryOperator::Division => V::Number(left.to_number() / right.to_number()),
        BinaryOperator::Remainder => V::Number(left.to_number() % right.to_number()),
        BinaryOperator::Exponential => V::Number(left.to_number().powf(right.to_number())),
        BinaryOperator::StrictEquality => V::Bool(left.strict_equals(&right)),
        BinaryOperator::StrictInequality => V::Bool(!left.strict_equals(&right)),
        BinaryOperator::Equality => V::Bool(left.loose_equals(&right)?),
        BinaryOperator::Inequality => V::Bool(!left.loose_equals(&right)?),
        BinaryOperator::LessThan => V::Bool(compare(&left, &right).is_some_and(|o| o.is_lt())),
        BinaryOperator::LessEqualThan => V::Bool(compare(&left, &right).is_some_and(|o| o.is_le())),
        BinaryOperator::GreaterThan => V::Bool(compare(&left, &right).is_some_and(|o| o.is_gt())),
        BinaryOperator::GreaterEqualThan => V::Bool(compare(&left, &right).is_some_and(|o| o.is_ge())),
        _ => return None,
    })
}

/// `None` stands for a comparison involving NaN, which is always false.
fn compare(left: &ConstantValue, right: &ConstantValue) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (ConstantValue::String(a), ConstantValue::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

impl ConstantValue {
    fn is_primitive_number_like(&self) -> bool {
        matches!(
            self,
            Self::Undefined | Self::Null | Self::Bool(_) | Self::Number(_)
        )
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }

    fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Null | Self::Array(_) | Self::Object(_) => "object",
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Self::Array(_) | Self::Object(_) => Self::String(self.to_js_string()).to_number(),
        }
    }

    /// `String(value)`
    pub fn to_js_string(&self) -> std::string::String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => number_to_string(*n),
            Self::String(s) => s.clone(),
            Self::Array(items) => items
                .iter()
                .map(|item| match item {
                    Self::Undefined | Self::Null => std::string::String::new(),
                    other => other.to_js_string(),
                })
                .collect::<std::vec::Vec<_>>()
                .join(","),
            Self::Object(_) => "[object Object]".to_string(),
        }
    }

    fn strict_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            // distinct literals are distinct objects
            _ => false,
        }
    }

    fn loose_equals(&self, other: &Self) -> Option<bool> {
        use ConstantValue as V;
        Some(match (self, other) {
            (V::Null | V::Undefined, V::Null | V::Undefined) => true,
            (V::Null | V::Undefined, _) | (_, V::Null | V::Undefined) => false,
            (V::Array(_) | V::Object(_), _) | (_, V::Array(_) | V::Object(_)) => return None,
            (V::String(a), V::String(b)) => a == b,
            _ => self.to_number() == other.to_number(),
        })
    }
}

/// `Number.prototype.toString()` for the values templates produce.
pub fn number_to_string(n: f64) -> std::string::String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        if n.fract() == 0.0 {
            format!("{:.0}", n)
        } else {
            format!("{}", n)
        }
    } else {
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        }
    }
}

/// `toDisplayString`: nullish values vanish, containers print as JSON.
pub fn to_display_string(value: &ConstantValue) -> std::string::String {
    match value {
        ConstantValue::Undefined | ConstantValue::Null => std::string::String::new(),
        ConstantValue::Array(_) | ConstantValue::Object(_) => {
            to_pretty_json(value, 0).unwrap_or_default()
        }
        other => other.to_js_string(),
    }
}

/// `JSON.stringify(value, null, 2)`; `None` where JSON has no text.
fn to_pretty_json(value: &ConstantValue, depth: usize) -> Option<std::string::String> {
    let pad = "  ".repeat(depth + 1);
    let close_pad = "  ".repeat(depth);
    Some(match value {
        ConstantValue::Undefined => return None,
        ConstantValue::Null => "null".to_string(),
        ConstantValue::Bool(b) => b.to_string(),
        ConstantValue::Number(n) if n.is_finite() => number_to_string(*n),
        ConstantValue::Number(_) => "null".to_string(),
        ConstantValue::String(s) => serde_json::to_string(s).ok()?,
        ConstantValue::Array(items) => {
            if items.is_empty() {
                return Some("[]".to_string());
            }
            let parts: std::vec::Vec<_> = items
                .iter()
                .map(|item| {
                    format!(
                        "{}{}",
                        pad,
                        to_pretty_json(item, depth + 1).unwrap_or_else(|| "null".to_string())
                    )
                })
                .collect();
            format!("[\n{}\n{}]", parts.join(",\n"), close_pad)
        }
        ConstantValue::Object(entries) => {
            let parts: std::vec::Vec<_> = entries
                .iter()
                .filter_map(|(key, value)| {
                    let value = to_pretty_json(value, depth + 1)?;
                    let key = serde_json::to_string(key).ok()?;
                    Some(format!("{}{}: {}", pad, key, value))
                })
                .collect();
            if parts.is_empty() {
                return Some("{}".to_string());
            }
            format!("{{\n{}\n{}}}", parts.join(",\n"), close_pad)
        }
    })
}

/// `normalizeClass`
pub fn normalize_class(value: &ConstantValue) -> std::string::String {
    match value {
        ConstantValue::String(s) => s.clone(),
        ConstantValue::Array(items) => items
            .iter()
            .map(normalize_class)
            .filter(|c| !c.is_empty())
            .collect::<std::vec::Vec<_>>()
            .join(" "),
        ConstantValue::Object(entries) => entries
            .iter()
            .filter(|(_, enabled)| enabled.is_truthy())
            .map(|(name, _)| name.as_str())
            .collect::<std::vec::Vec<_>>()
            .join(" "),
        _ => std::string::String::new(),
    }
    .trim()
    .to_string()
}

/// Result of `normalizeStyle`
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedStyle {
    Text(std::string::String),
    Rules(std::vec::Vec<(std::string::String, ConstantValue)>),
    None,
}

/// `normalizeStyle`
pub fn normalize_style(value: &ConstantValue) -> NormalizedStyle {
    match value {
        ConstantValue::String(s) => NormalizedStyle::Text(s.clone()),
        ConstantValue::Object(entries) => NormalizedStyle::Rules(entries.clone()),
        ConstantValue::Array(items) => {
            let mut merged = std::vec::Vec::new();
            for item in items {
                let rules = match item {
                    ConstantValue::String(s) => parse_string_style(s)
                        .into_iter()
                        .map(|(k, v)| (k, ConstantValue::String(v)))
                        .collect(),
                    other => match normalize_style(other) {
                        NormalizedStyle::Rules(rules) => rules,
                        _ => continue,
                    },
                };
                for (key, value) in rules {
                    set_entry(&mut merged, key, value);
                }
            }
            NormalizedStyle::Rules(merged)
        }
        _ => NormalizedStyle::None,
    }
}

/// `stringifyStyle`
pub fn stringify_style(style: &NormalizedStyle) -> std::string::String {
    match style {
        NormalizedStyle::Text(s) => s.clone(),
        NormalizedStyle::None => std::string::String::new(),
        NormalizedStyle::Rules(rules) => {
            let mut out = std::string::String::new();
            for (key, value) in rules {
                let value = match value {
                    ConstantValue::String(s) => s.clone(),
                    ConstantValue::Number(n) => number_to_string(*n),
                    _ => continue,
                };
                let key = if key.starts_with("--") {
                    key.clone()
                } else {
                    hyphenate(key).to_string()
                };
                out.push_str(&format!("{}:{};", key, value));
            }
            out
        }
    }
}
