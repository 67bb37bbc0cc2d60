//! Configuration file loading for tessera.
//!
//! Reads `tessera.config.json` from the current working directory. Keys
//! mirror [`DomCompilerOptions`] in camelCase; anything missing keeps its
//! default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tessera_dom::DomCompilerOptions;

pub const CONFIG_FILE_NAME: &str = "tessera.config.json";

/// Top-level tessera configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TesseraConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(flatten)]
    pub compiler: DomCompilerOptions,
}

/// Load `tessera.config.json` from the given directory (or CWD if None).
pub fn load_config(dir: Option<&Path>) -> TesseraConfig {
    let base = dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    load_config_file(&base.join(CONFIG_FILE_NAME))
}

/// Load a config file, falling back to defaults when it is missing or
/// malformed.
pub fn load_config_file(path: &Path) -> TesseraConfig {
    if !path.exists() {
        return TesseraConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", path.display(), e);
                TesseraConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("failed to read {}: {}", path.display(), e);
            TesseraConfig::default()
        }
    }
}

pub fn parse_config(content: &str) -> Result<TesseraConfig, serde_json::Error> {
    serde_json::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_ast::CodegenMode;

    #[test]
    fn empty_object_keeps_defaults() {
        let config = parse_config("{}").unwrap();
        assert!(config.schema.is_none());
        assert_eq!(config.compiler.mode, CodegenMode::Function);
        assert!(!config.compiler.ssr);
        assert!(config.compiler.comments);
        assert_eq!(config.compiler.filename.as_str(), "template.vue");
    }

    #[test]
    fn camel_case_keys() {
        let config = parse_config(
            r#"{
                "$schema": "./schema.json",
                "mode": "module",
                "prefixIdentifiers": true,
                "hoistStatic": true,
                "scopeId": "data-v-1",
                "ssrCssVars": "{ color: _ctx.color }"
            }"#,
        )
        .unwrap();
        assert_eq!(config.schema.as_deref(), Some("./schema.json"));
        assert_eq!(config.compiler.mode, CodegenMode::Module);
        assert!(config.compiler.prefix_identifiers);
        assert!(config.compiler.hoist_static);
        assert_eq!(config.compiler.scope_id.as_deref(), Some("data-v-1"));
        assert_eq!(config.compiler.ssr_css_vars.as_deref(), Some("{ color: _ctx.color }"));
    }

    #[test]
    fn bad_mode_is_rejected() {
        assert!(parse_config(r#"{ "mode": "iife" }"#).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("tessera-config-missing");
        let config = load_config(Some(&dir));
        assert!(!config.compiler.hoist_static);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("tessera-config-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE_NAME), "{ not json").unwrap();
        let config = load_config(Some(&dir));
        assert_eq!(config.compiler.mode, CodegenMode::Function);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
