//! Server rendering error codes.
//!
//! Numbering continues after the DOM codes.

use serde::Serialize;
use tessera_ast::{CompilerError, SourceLocation};
use tessera_dom::DomErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum SsrErrorCode {
    /// Attribute name that cannot be written into markup safely.
    UnsafeAttrName = DomErrorCode::EXTEND_POINT + 1,
    /// `<Teleport>` without a `to` prop.
    NoTeleportTarget,
    /// Node kind the server lowering does not know how to print.
    InvalidAstNode,
}

impl SsrErrorCode {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::UnsafeAttrName => "Unsafe attribute name for SSR.",
            Self::NoTeleportTarget => "Missing the 'to' prop on teleport element.",
            Self::InvalidAstNode => "Invalid AST node during SSR transform.",
        }
    }
}

pub fn create_ssr_error(code: SsrErrorCode, loc: &SourceLocation) -> CompilerError {
    CompilerError::custom(code.code(), code.message(), Some(loc.clone()))
}
