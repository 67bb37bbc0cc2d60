//! DOM compiler error codes.
//!
//! Numbering continues from [`ErrorCode::EXTEND_POINT`] so DOM errors share
//! one code space with the core errors.

use tessera_ast::{CompilerError, ErrorCode, SourceLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DomErrorCode {
    VHtmlNoExpression = ErrorCode::EXTEND_POINT,
    VHtmlWithChildren,
    VTextNoExpression,
    VTextWithChildren,
    VModelOnInvalidElement,
    VModelArgOnElement,
    VModelOnFileInputElement,
    VModelUnnecessaryValue,
    VShowNoExpression,
    TransitionInvalidChildren,
    IgnoredSideEffectTag,
}

impl DomErrorCode {
    /// First code available to compilers layered on the DOM compiler.
    pub const EXTEND_POINT: u16 = 64;

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::VHtmlNoExpression => "v-html is missing expression.",
            Self::VHtmlWithChildren => "v-html will override element children.",
            Self::VTextNoExpression => "v-text is missing expression.",
            Self::VTextWithChildren => "v-text will override element children.",
            Self::VModelOnInvalidElement => {
                "v-model can only be used on <input>, <textarea> and <select> elements."
            }
            Self::VModelArgOnElement => "v-model argument is not supported on plain elements.",
            Self::VModelOnFileInputElement => {
                "v-model cannot be used on file inputs since they are read-only. Use a v-on:change listener instead."
            }
            Self::VModelUnnecessaryValue => {
                "Unnecessary value binding used alongside v-model. It will interfere with v-model's behavior."
            }
            Self::VShowNoExpression => "v-show is missing expression.",
            Self::TransitionInvalidChildren => {
                "<Transition> expects exactly one child element or component."
            }
            Self::IgnoredSideEffectTag => {
                "Tags with side effect (<script> and <style>) are ignored in client component templates."
            }
        }
    }
}

pub fn create_dom_error(code: DomErrorCode, loc: &SourceLocation) -> CompilerError {
    CompilerError::custom(code.code(), code.message(), Some(loc.clone()))
}
