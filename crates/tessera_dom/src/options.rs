//! DOM compiler options and browser platform hooks.

use serde::{Deserialize, Serialize};
use tessera_arena::String;
use tessera_ast::{
    BindingMetadata, CodegenMode, CodegenOptions, CompilerOptions, ElementNode, Namespace,
    ParserOptions, PropNode, RuntimeHelper, TextMode, TransformOptions, WhitespaceStrategy,
};

/// DOM compiler options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomCompilerOptions {
    /// Output mode: function or module
    pub mode: CodegenMode,

    /// Whether to prefix identifiers
    pub prefix_identifiers: bool,

    /// Whether to hoist static nodes
    pub hoist_static: bool,

    /// Whether to cache event handlers
    pub cache_handlers: bool,

    /// Scope ID for scoped CSS
    pub scope_id: Option<String>,

    /// Whether to render for the server
    pub ssr: bool,

    /// Whether to generate source map
    pub source_map: bool,

    /// Whether to preserve comments
    pub comments: bool,

    pub whitespace: WhitespaceStrategy,

    /// Interpolation delimiters
    pub delimiters: Option<(String, String)>,

    /// Whether to inline template
    pub inline: bool,

    /// Binding metadata from script setup
    pub binding_metadata: Option<BindingMetadata>,

    /// Whether is TypeScript
    pub is_ts: bool,

    pub filename: String,

    /// Hoist asset resolution out of the render function
    pub optimize_imports: bool,

    pub runtime_module_name: String,

    pub runtime_global_name: String,

    pub ssr_css_vars: Option<String>,
}

impl Default for DomCompilerOptions {
    fn default() -> Self {
        Self {
            mode: CodegenMode::Function,
            prefix_identifiers: false,
            hoist_static: false,
            cache_handlers: false,
            scope_id: None,
            ssr: false,
            source_map: false,
            comments: true,
            whitespace: WhitespaceStrategy::Condense,
            delimiters: None,
            inline: false,
            binding_metadata: None,
            is_ts: false,
            filename: String::from("template.vue"),
            optimize_imports: false,
            runtime_module_name: String::from("vue"),
            runtime_global_name: String::from("Vue"),
            ssr_css_vars: None,
        }
    }
}

impl DomCompilerOptions {
    /// Stage options with the browser platform hooks installed.
    pub fn to_compiler_options(&self) -> CompilerOptions {
        let mut parser = parser_options();
        parser.comments = self.comments;
        parser.whitespace = self.whitespace;
        if let Some(delimiters) = &self.delimiters {
            parser.delimiters = delimiters.clone();
        }

        let transform = TransformOptions {
            filename: self.filename.clone(),
            prefix_identifiers: self.prefix_identifiers,
            hoist_static: self.hoist_static,
            cache_handlers: self.cache_handlers,
            scope_id: self.scope_id.clone(),
            ssr: self.ssr,
            in_ssr: self.ssr,
            ssr_css_vars: self.ssr_css_vars.clone(),
            binding_metadata: self.binding_metadata.clone(),
            inline: self.inline,
            is_ts: self.is_ts,
            is_built_in_component: Some(is_built_in_component),
            ..Default::default()
        };

        let codegen = CodegenOptions {
            mode: self.mode,
            source_map: self.source_map,
            optimize_imports: self.optimize_imports,
            runtime_module_name: self.runtime_module_name.clone(),
            runtime_global_name: self.runtime_global_name.clone(),
            ..Default::default()
        };

        CompilerOptions {
            parser,
            transform,
            codegen,
        }
    }
}

/// Parser options for browser templates.
pub fn parser_options() -> ParserOptions {
    ParserOptions {
        is_void_tag: tessera_arena::is_void_tag,
        is_native_tag: Some(tessera_arena::is_native_tag),
        is_pre_tag: |tag| tag == "pre",
        is_built_in_component: Some(is_built_in_component),
        get_namespace,
        get_text_mode,
        ..ParserOptions::default()
    }
}

/// Components the DOM runtime provides.
pub fn is_built_in_component(tag: &str) -> Option<RuntimeHelper> {
    match tag {
        "Transition" | "transition" => Some(RuntimeHelper::Transition),
        "TransitionGroup" | "transition-group" => Some(RuntimeHelper::TransitionGroup),
        _ => None,
    }
}

/// Namespace of `tag` from its parent, following the HTML integration
/// points for SVG and MathML.
pub fn get_namespace(tag: &str, parent: Option<&ElementNode<'_>>, root: Namespace) -> Namespace {
    let mut ns = parent.map(|p| p.ns).unwrap_or(root);
    if let Some(parent) = parent {
        match ns {
            Namespace::MathMl => {
                if parent.tag == "annotation-xml" {
                    if tag == "svg" {
                        return Namespace::Svg;
                    }
                    let html_encoding = parent.props.iter().any(|p| match p {
                        PropNode::Attribute(attr) => {
                            attr.name == "encoding"
                                && attr.value.as_ref().is_some_and(|v| {
                                    v.content == "text/html" || v.content == "application/xhtml+xml"
                                })
                        }
                        PropNode::Directive(_) => false,
                    });
                    if html_encoding {
                        ns = Namespace::Html;
                    }
                } else if is_math_ml_text_integration_point(&parent.tag)
                    && tag != "mglyph"
                    && tag != "malignmark"
                {
                    ns = Namespace::Html;
                }
            }
            Namespace::Svg => {
                if matches!(parent.tag.as_str(), "foreignObject" | "desc" | "title") {
                    ns = Namespace::Html;
                }
            }
            Namespace::Html => {}
        }
    }
    if ns == Namespace::Html {
        if tag == "svg" {
            return Namespace::Svg;
        }
        if tag == "math" {
            return Namespace::MathMl;
        }
    }
    ns
}

fn is_math_ml_text_integration_point(tag: &str) -> bool {
    matches!(tag, "mi" | "mo" | "mn" | "ms" | "mtext")
}

/// Text mode of an element's content.
pub fn get_text_mode(tag: &str, ns: Namespace) -> TextMode {
    if ns != Namespace::Html {
        return TextMode::Data;
    }
    match tag {
        "textarea" | "title" => TextMode::RcData,
        "style" | "iframe" | "script" | "noscript" | "xmp" | "noembed" | "noframes" => {
            TextMode::RawText
        }
        _ => TextMode::Data,
    }
}

/// DOM-specific element checks
pub mod element_checks {
    use phf::phf_set;

    /// Form elements that v-model can be used on
    pub static V_MODEL_ELEMENTS: phf::Set<&'static str> = phf_set! {
        "input", "textarea", "select"
    };

    /// Tags whose children cannot be produced by parsing a markup string
    /// outside of their table context
    pub static NON_STRINGIFIABLE: phf::Set<&'static str> = phf_set! {
        "caption", "thead", "tr", "th", "tbody", "td", "tfoot", "colgroup", "col"
    };

    /// Check if element supports v-model
    #[inline]
    pub fn is_v_model_element(tag: &str) -> bool {
        V_MODEL_ELEMENTS.contains(tag)
    }

    #[inline]
    pub fn is_non_stringifiable(tag: &str) -> bool {
        NON_STRINGIFIABLE.contains(tag)
    }
}

/// Event modifier keys for v-on
pub mod event_modifiers {
    use phf::phf_set;

    /// Event modifiers that map to event options
    pub static EVENT_OPTION_MODIFIERS: phf::Set<&'static str> = phf_set! {
        "passive", "once", "capture"
    };

    /// Modifiers handled by `withModifiers` rather than key filtering
    pub static NON_KEY_MODIFIERS: phf::Set<&'static str> = phf_set! {
        "stop", "prevent", "self", "ctrl", "shift", "alt", "meta", "exact", "middle"
    };

    /// Modifiers that are a mouse button or a key depending on the event
    pub static MAYBE_KEY_MODIFIERS: phf::Set<&'static str> = phf_set! {
        "left", "right"
    };

    pub static KEYBOARD_EVENTS: phf::Set<&'static str> = phf_set! {
        "onkeyup", "onkeydown", "onkeypress"
    };

    /// Check if modifier is an event option
    #[inline]
    pub fn is_event_option_modifier(modifier: &str) -> bool {
        EVENT_OPTION_MODIFIERS.contains(modifier)
    }

    #[inline]
    pub fn is_non_key_modifier(modifier: &str) -> bool {
        NON_KEY_MODIFIERS.contains(modifier)
    }

    #[inline]
    pub fn is_maybe_key_modifier(modifier: &str) -> bool {
        MAYBE_KEY_MODIFIERS.contains(modifier)
    }

    /// Check a lowercased handler key such as `onkeyup`
    #[inline]
    pub fn is_keyboard_event(key: &str) -> bool {
        KEYBOARD_EVENTS.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_arena::Bump;
    use tessera_ast::{SourceLocation, TemplateChildNode};

    fn element<'a>(bump: &'a Bump, tag: &str, ns: Namespace) -> ElementNode<'a> {
        let mut el = ElementNode::new(bump, tessera_ast::NodeId(1), tag, SourceLocation::STUB);
        el.ns = ns;
        el
    }

    #[test]
    fn test_default_options() {
        let opts = DomCompilerOptions::default();
        assert!(!opts.prefix_identifiers);
        assert!(!opts.hoist_static);
        assert!(opts.comments);
        assert!(!opts.ssr);
    }

    #[test]
    fn test_options_from_json() {
        let json = r#"{"mode":"module","hoistStatic":true,"scopeId":"data-v-1"}"#;
        let opts: DomCompilerOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.mode, CodegenMode::Module);
        assert!(opts.hoist_static);
        assert_eq!(opts.scope_id.as_deref(), Some("data-v-1"));
        assert!(opts.comments);
    }

    #[test]
    fn test_namespace_resolution() {
        let bump = Bump::new();
        assert_eq!(get_namespace("svg", None, Namespace::Html), Namespace::Svg);
        assert_eq!(get_namespace("math", None, Namespace::Html), Namespace::MathMl);

        let svg = element(&bump, "svg", Namespace::Svg);
        assert_eq!(get_namespace("circle", Some(&svg), Namespace::Html), Namespace::Svg);
        let foreign = element(&bump, "foreignObject", Namespace::Svg);
        assert_eq!(get_namespace("div", Some(&foreign), Namespace::Html), Namespace::Html);

        let mi = element(&bump, "mi", Namespace::MathMl);
        assert_eq!(get_namespace("span", Some(&mi), Namespace::Html), Namespace::Html);
        assert_eq!(get_namespace("mglyph", Some(&mi), Namespace::Html), Namespace::MathMl);
        let annotation = element(&bump, "annotation-xml", Namespace::MathMl);
        assert_eq!(get_namespace("svg", Some(&annotation), Namespace::Html), Namespace::Svg);
    }

    #[test]
    fn test_text_modes() {
        assert_eq!(get_text_mode("textarea", Namespace::Html), TextMode::RcData);
        assert_eq!(get_text_mode("script", Namespace::Html), TextMode::RawText);
        assert_eq!(get_text_mode("title", Namespace::Svg), TextMode::Data);
        assert_eq!(get_text_mode("div", Namespace::Html), TextMode::Data);
    }

    #[test]
    fn test_parse_with_platform_options() {
        let bump = Bump::new();
        let (root, errors) = tessera_parser::parse_with_options(
            &bump,
            "<svg><foreignObject><p/></foreignObject></svg><Transition/>",
            parser_options(),
        );
        assert!(errors.is_empty());
        let svg = root.children[0].as_element().unwrap();
        assert_eq!(svg.ns, Namespace::Svg);
        let TemplateChildNode::Element(foreign) = &svg.children[0] else {
            panic!("expected element");
        };
        assert_eq!(foreign.children[0].as_element().unwrap().ns, Namespace::Html);
        assert!(root.children[1].as_element().unwrap().is_component());
    }

    #[test]
    fn test_event_modifiers() {
        assert!(event_modifiers::is_event_option_modifier("passive"));
        assert!(event_modifiers::is_non_key_modifier("stop"));
        assert!(event_modifiers::is_maybe_key_modifier("right"));
        assert!(event_modifiers::is_keyboard_event("onkeyup"));
        assert!(!event_modifiers::is_non_key_modifier("enter"));
    }
}
