//! Compiler options.

use tessera_arena::{FxHashMap, String};

use crate::ast::{ElementNode, Namespace};
use crate::errors::{CompilerError, ErrorCode};
use crate::helpers::RuntimeHelper;

/// Text mode of the element whose children are being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Tags, entities and interpolation are recognized
    #[default]
    Data,
    /// Entities and interpolation, but no tags (`textarea`, `title`)
    RcData,
    /// Everything is text until the matching end tag (`script`, `style`)
    RawText,
    /// `<![CDATA[ ... ]]>` in foreign content
    CData,
}

/// Whitespace handling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespaceStrategy {
    /// Remove or collapse insignificant whitespace
    #[default]
    Condense,
    /// Keep whitespace as written
    Preserve,
}

/// Parser options
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub whitespace: WhitespaceStrategy,
    /// Interpolation delimiters, `{{` and `}}` by default
    pub delimiters: (String, String),
    /// Tags whose content keeps whitespace (`pre`)
    pub is_pre_tag: fn(&str) -> bool,
    pub is_void_tag: fn(&str) -> bool,
    pub is_native_tag: Option<fn(&str) -> bool>,
    pub is_custom_element: Option<fn(&str) -> bool>,
    /// Platform built-in components such as `Transition`
    pub is_built_in_component: Option<fn(&str) -> Option<RuntimeHelper>>,
    /// Namespace of `tag` given its parent element and the root namespace
    pub get_namespace: fn(&str, Option<&ElementNode<'_>>, Namespace) -> Namespace,
    pub get_text_mode: fn(&str, Namespace) -> TextMode,
    /// Replace character references; the flag is true inside attribute values
    pub decode_entities: Option<fn(&str, bool) -> String>,
    pub ns: Namespace,
    /// Keep comment nodes
    pub comments: bool,
    pub on_error: Option<fn(&CompilerError)>,
    pub on_warn: Option<fn(&CompilerError)>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            whitespace: WhitespaceStrategy::Condense,
            delimiters: (String::from("{{"), String::from("}}")),
            is_pre_tag: |_| false,
            is_void_tag: tessera_arena::is_void_tag,
            is_native_tag: None,
            is_custom_element: None,
            is_built_in_component: None,
            get_namespace: |_, parent, root| parent.map(|p| p.ns).unwrap_or(root),
            get_text_mode: |_, _| TextMode::Data,
            decode_entities: None,
            ns: Namespace::Html,
            comments: true,
            on_error: None,
            on_warn: None,
        }
    }
}

/// Transform options
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Filename, used to infer the component's own name
    pub filename: String,
    /// Rewrite free identifiers to `_ctx.` / binding access paths
    pub prefix_identifiers: bool,
    pub hoist_static: bool,
    pub cache_handlers: bool,
    /// Scope id for scoped styles (`data-v-xxxx`)
    pub scope_id: Option<String>,
    pub ssr: bool,
    /// Transforming client branches for the server renderer
    pub in_ssr: bool,
    pub ssr_css_vars: Option<String>,
    pub binding_metadata: Option<BindingMetadata>,
    /// Render function is inlined into the setup function
    pub inline: bool,
    pub is_ts: bool,
    /// Whether the component has `:slotted` styles
    pub slotted: bool,
    pub is_built_in_component: Option<fn(&str) -> Option<RuntimeHelper>>,
    pub is_custom_element: Option<fn(&str) -> bool>,
    pub on_error: Option<fn(&CompilerError)>,
    pub on_warn: Option<fn(&CompilerError)>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            filename: String::from("template.vue"),
            prefix_identifiers: false,
            hoist_static: false,
            cache_handlers: false,
            scope_id: None,
            ssr: false,
            in_ssr: false,
            ssr_css_vars: None,
            binding_metadata: None,
            inline: false,
            is_ts: false,
            slotted: true,
            is_built_in_component: None,
            is_custom_element: None,
            on_error: None,
            on_warn: None,
        }
    }
}

impl TransformOptions {
    /// Component name inferred from the filename (`FooBar.vue` → `FooBar`).
    pub fn self_name(&self) -> Option<String> {
        let base = self.filename.rsplit(['/', '\\']).next()?;
        let name = base.split('.').next()?;
        if name.is_empty() {
            None
        } else {
            Some(tessera_arena::capitalize(&tessera_arena::camelize(name)))
        }
    }
}

/// Bindings declared by the component script
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingMetadata {
    pub bindings: FxHashMap<std::string::String, BindingType>,

    /// Destructured prop aliases (local name → prop key)
    #[serde(default)]
    pub props_aliases: FxHashMap<std::string::String, std::string::String>,

    /// Whether the bindings come from `<script setup>`
    #[serde(default)]
    pub is_script_setup: bool,
}

impl BindingMetadata {
    pub fn get(&self, name: &str) -> Option<BindingType> {
        self.bindings.get(name).copied()
    }
}

/// Kind of a script binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum BindingType {
    /// `let` in setup; may or may not hold a ref
    SetupLet = 0,
    /// `const` that may be a ref
    SetupMaybeRef = 1,
    /// `const` that is definitely a ref
    SetupRef = 2,
    /// `const x = reactive()`
    SetupReactiveConst = 3,
    /// `const` that is never a ref (functions, imports of values)
    SetupConst = 4,
    Props = 5,
    PropsAliased = 6,
    Data = 7,
    Options = 8,
    /// `const x = 1`
    LiteralConst = 9,
}

/// Codegen options
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    pub mode: CodegenMode,
    pub prefix_identifiers: bool,
    pub source_map: bool,
    pub filename: String,
    pub scope_id: Option<String>,
    pub ssr: bool,
    /// Hoist `resolveComponent` results out of the render function
    pub optimize_imports: bool,
    pub runtime_module_name: String,
    pub runtime_global_name: String,
    pub ssr_runtime_module_name: String,
    pub is_ts: bool,
    pub inline: bool,
    pub binding_metadata: Option<BindingMetadata>,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            mode: CodegenMode::Function,
            prefix_identifiers: false,
            source_map: false,
            filename: String::from("template.vue"),
            scope_id: None,
            ssr: false,
            optimize_imports: false,
            runtime_module_name: String::from("vue"),
            runtime_global_name: String::from("Vue"),
            ssr_runtime_module_name: String::from("vue/server-renderer"),
            is_ts: false,
            inline: false,
            binding_metadata: None,
        }
    }
}

/// Shape of the generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodegenMode {
    /// `const _Vue = Vue; return function render(...) {}`
    #[default]
    Function,
    /// `import { ... } from "vue"; export function render(...) {}`
    Module,
}

/// Combined compiler options
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    pub parser: ParserOptions,
    pub transform: TransformOptions,
    pub codegen: CodegenOptions,
}

impl CompilerOptions {
    /// Whether free identifiers get rewritten. Module mode implies it.
    pub fn prefix_identifiers(&self) -> bool {
        self.transform.prefix_identifiers || self.codegen.mode == CodegenMode::Module
    }

    /// Propagate shared settings between the stage options.
    pub fn normalize(&mut self) {
        let prefix = self.prefix_identifiers();
        self.transform.prefix_identifiers = prefix;
        self.codegen.prefix_identifiers = prefix;
        self.codegen.ssr = self.transform.ssr;
        self.codegen.inline = self.transform.inline;
        self.codegen.is_ts = self.transform.is_ts;
        self.codegen.scope_id = self.transform.scope_id.clone();
        self.codegen.filename = self.transform.filename.clone();
        self.codegen.binding_metadata = self.transform.binding_metadata.clone();
        if self.transform.on_error.is_none() {
            self.transform.on_error = self.parser.on_error;
        }
        if self.transform.on_warn.is_none() {
            self.transform.on_warn = self.parser.on_warn;
        }
    }

    /// Reject incompatible option combinations.
    pub fn validate(&self) -> std::vec::Vec<CompilerError> {
        let mut errors = std::vec::Vec::new();
        if self.transform.cache_handlers && !self.prefix_identifiers() {
            errors.push(CompilerError::new(ErrorCode::CacheHandlerNotSupported, None));
        }
        if self.transform.scope_id.is_some() && self.codegen.mode != CodegenMode::Module {
            errors.push(CompilerError::new(ErrorCode::ScopeIdNotSupported, None));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_name() {
        let options = TransformOptions {
            filename: "src/components/foo-bar.vue".into(),
            ..Default::default()
        };
        assert_eq!(options.self_name().as_deref(), Some("FooBar"));
    }

    #[test]
    fn test_validate_cache_handlers_requires_prefix() {
        let mut options = CompilerOptions::default();
        options.transform.cache_handlers = true;
        let errors = options.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, 49);

        options.codegen.mode = CodegenMode::Module;
        assert!(options.validate().is_empty());
    }

    #[test]
    fn test_validate_scope_id_requires_module() {
        let mut options = CompilerOptions::default();
        options.transform.scope_id = Some("data-v-1".into());
        assert_eq!(options.validate()[0].code, 50);
    }

    #[test]
    fn test_binding_metadata_json() {
        let json = r#"{"bindings":{"count":"setup-ref","msg":"props"},"isScriptSetup":true}"#;
        let meta: BindingMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.get("count"), Some(BindingType::SetupRef));
        assert_eq!(meta.get("msg"), Some(BindingType::Props));
        assert!(meta.is_script_setup);
    }

    #[test]
    fn test_normalize_module_implies_prefix() {
        let mut options = CompilerOptions::default();
        options.codegen.mode = CodegenMode::Module;
        options.normalize();
        assert!(options.transform.prefix_identifiers);
        assert!(options.codegen.prefix_identifiers);
    }
}
