//! Compiler error codes and the reported error type.
//!
//! Codes are stable numbers. Parse errors come first, then template
//! structural errors, then generic option errors. Platform crates continue
//! the numbering from [`ErrorCode::EXTEND_POINT`].

use serde::{Deserialize, Serialize};
use tessera_arena::String;

use crate::ast::SourceLocation;

/// Core error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // Parse errors
    AbruptClosingOfEmptyComment = 0,
    CDataInHtmlContent = 1,
    DuplicateAttribute = 2,
    EndTagWithAttributes = 3,
    EndTagWithTrailingSolidus = 4,
    EofBeforeTagName = 5,
    EofInCdata = 6,
    EofInComment = 7,
    EofInScriptHtmlCommentLikeText = 8,
    EofInTag = 9,
    IncorrectlyClosedComment = 10,
    IncorrectlyOpenedComment = 11,
    InvalidFirstCharacterOfTagName = 12,
    MissingAttributeValue = 13,
    MissingEndTagName = 14,
    MissingWhitespaceBetweenAttributes = 15,
    NestedComment = 16,
    UnexpectedCharacterInAttributeName = 17,
    UnexpectedCharacterInUnquotedAttributeValue = 18,
    UnexpectedEqualsSignBeforeAttributeName = 19,
    UnexpectedNullCharacter = 20,
    UnexpectedQuestionMarkInsteadOfTagName = 21,
    UnexpectedSolidusInTag = 22,

    // Template parse errors
    InvalidEndTag = 23,
    MissingEndTag = 24,
    MissingInterpolationEnd = 25,
    MissingDirectiveName = 26,
    MissingDynamicDirectiveArgumentEnd = 27,

    // Transform errors
    VIfNoExpression = 28,
    VIfSameKey = 29,
    VElseNoAdjacentIf = 30,
    VForNoExpression = 31,
    VForMalformedExpression = 32,
    VForTemplateKeyPlacement = 33,
    VBindNoExpression = 34,
    VOnNoExpression = 35,
    VSlotUnexpectedDirectiveOnSlotOutlet = 36,
    VSlotMixedSlotUsage = 37,
    VSlotDuplicateSlotNames = 38,
    VSlotExtraneousDefaultSlotChildren = 39,
    VSlotMisplaced = 40,
    VModelNoExpression = 41,
    VModelMalformedExpression = 42,
    VModelOnScopeVariable = 43,
    VModelOnProps = 44,
    InvalidExpression = 45,
    KeepAliveInvalidChildren = 46,

    // Generic errors
    PrefixIdNotSupported = 47,
    ModuleModeNotSupported = 48,
    CacheHandlerNotSupported = 49,
    ScopeIdNotSupported = 50,

    // Deprecations / late additions
    VnodeHooks = 51,
    VBindInvalidSameNameArgument = 52,
}

impl ErrorCode {
    /// First code available to platform compilers.
    pub const EXTEND_POINT: u16 = 53;

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::AbruptClosingOfEmptyComment => "Illegal comment.",
            Self::CDataInHtmlContent => "CDATA section is allowed only in XML context.",
            Self::DuplicateAttribute => "Duplicate attribute.",
            Self::EndTagWithAttributes => "End tag cannot have attributes.",
            Self::EndTagWithTrailingSolidus => "Illegal '/' in tags.",
            Self::EofBeforeTagName => "Unexpected EOF in tag.",
            Self::EofInCdata => "Unexpected EOF in CDATA section.",
            Self::EofInComment => "Unexpected EOF in comment.",
            Self::EofInScriptHtmlCommentLikeText => "Unexpected EOF in script.",
            Self::EofInTag => "Unexpected EOF in tag.",
            Self::IncorrectlyClosedComment => "Incorrectly closed comment.",
            Self::IncorrectlyOpenedComment => "Incorrectly opened comment.",
            Self::InvalidFirstCharacterOfTagName => {
                "Illegal tag name. Use '&lt;' to print '<'."
            }
            Self::MissingAttributeValue => "Attribute value was expected.",
            Self::MissingEndTagName => "End tag name was expected.",
            Self::MissingWhitespaceBetweenAttributes => "Whitespace was expected.",
            Self::NestedComment => "Unexpected '<!--' in comment.",
            Self::UnexpectedCharacterInAttributeName => {
                "Attribute name cannot contain U+0022 (\"), U+0027 ('), and U+003C (<)."
            }
            Self::UnexpectedCharacterInUnquotedAttributeValue => {
                "Unquoted attribute value cannot contain U+0022 (\"), U+0027 ('), U+003C (<), U+003D (=), and U+0060 (`)."
            }
            Self::UnexpectedEqualsSignBeforeAttributeName => {
                "Attribute name cannot start with '='."
            }
            Self::UnexpectedNullCharacter => "Unexpected null character.",
            Self::UnexpectedQuestionMarkInsteadOfTagName => "'<?' is allowed only in XML context.",
            Self::UnexpectedSolidusInTag => "Illegal '/' in tags.",

            Self::InvalidEndTag => "Invalid end tag.",
            Self::MissingEndTag => "Element is missing end tag.",
            Self::MissingInterpolationEnd => "Interpolation end sign was not found.",
            Self::MissingDirectiveName => "Legal directive name was expected.",
            Self::MissingDynamicDirectiveArgumentEnd => {
                "End bracket for dynamic directive argument was not found. Note that dynamic directive argument cannot contain spaces."
            }

            Self::VIfNoExpression => "v-if/v-else-if is missing expression.",
            Self::VIfSameKey => "v-if/else branches must use unique keys.",
            Self::VElseNoAdjacentIf => "v-else/v-else-if has no adjacent v-if or v-else-if.",
            Self::VForNoExpression => "v-for is missing expression.",
            Self::VForMalformedExpression => "v-for has invalid expression.",
            Self::VForTemplateKeyPlacement => {
                "<template v-for> key should be placed on the <template> tag."
            }
            Self::VBindNoExpression => "v-bind is missing expression.",
            Self::VOnNoExpression => "v-on is missing expression.",
            Self::VSlotUnexpectedDirectiveOnSlotOutlet => {
                "Unexpected custom directive on <slot> outlet."
            }
            Self::VSlotMixedSlotUsage => {
                "Mixed v-slot usage on both the component and nested <template>. When there are multiple named slots, all slots should use <template> syntax to avoid scope ambiguity."
            }
            Self::VSlotDuplicateSlotNames => "Duplicate slot names found.",
            Self::VSlotExtraneousDefaultSlotChildren => {
                "Extraneous children found when component already has explicitly named default slot. These children will be ignored."
            }
            Self::VSlotMisplaced => "v-slot can only be used on components or <template> tags.",
            Self::VModelNoExpression => "v-model is missing expression.",
            Self::VModelMalformedExpression => {
                "v-model value must be a valid JavaScript member expression."
            }
            Self::VModelOnScopeVariable => {
                "v-model cannot be used on v-for or v-slot scope variables because they are not writable."
            }
            Self::VModelOnProps => {
                "v-model cannot be used on a prop, because local prop bindings are not writable. Use a v-bind binding combined with a v-on listener that emits update:x event instead."
            }
            Self::InvalidExpression => "Error parsing JavaScript expression.",
            Self::KeepAliveInvalidChildren => "<KeepAlive> expects exactly one child component.",

            Self::PrefixIdNotSupported => {
                "\"prefixIdentifiers\" option is not supported in this build of compiler."
            }
            Self::ModuleModeNotSupported => "ES module mode is not supported in this build of compiler.",
            Self::CacheHandlerNotSupported => {
                "\"cacheHandlers\" option is only supported when the \"prefixIdentifiers\" option is enabled."
            }
            Self::ScopeIdNotSupported => "\"scopeId\" option is only supported in module mode.",

            Self::VnodeHooks => {
                "@vnode-* hooks in templates are no longer supported. Use the vue: prefix instead."
            }
            Self::VBindInvalidSameNameArgument => {
                "v-bind with same-name shorthand only allows static argument."
            }
        }
    }
}

/// An error or warning reported by any compiler stage
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[error("{message}")]
pub struct CompilerError {
    /// Stable numeric code
    pub code: u16,
    pub loc: Option<SourceLocation>,
    pub message: String,
}

impl CompilerError {
    pub fn new(code: ErrorCode, loc: Option<SourceLocation>) -> Self {
        Self {
            code: code.code(),
            loc,
            message: String::from(code.message()),
        }
    }

    /// Core error with extra detail appended to the default message.
    pub fn with_detail(code: ErrorCode, loc: Option<SourceLocation>, detail: &str) -> Self {
        let mut message = String::from(code.message());
        message.push(' ');
        message.push_str(detail);
        Self {
            code: code.code(),
            loc,
            message,
        }
    }

    /// Error from a platform code range.
    pub fn custom(code: u16, message: impl Into<String>, loc: Option<SourceLocation>) -> Self {
        Self {
            code,
            loc,
            message: message.into(),
        }
    }

    /// The core code, when this error uses one.
    pub fn error_code(&self) -> Option<ErrorCode> {
        ALL_CODES.iter().copied().find(|c| c.code() == self.code)
    }
}

const ALL_CODES: [ErrorCode; 53] = [
    ErrorCode::AbruptClosingOfEmptyComment,
    ErrorCode::CDataInHtmlContent,
    ErrorCode::DuplicateAttribute,
    ErrorCode::EndTagWithAttributes,
    ErrorCode::EndTagWithTrailingSolidus,
    ErrorCode::EofBeforeTagName,
    ErrorCode::EofInCdata,
    ErrorCode::EofInComment,
    ErrorCode::EofInScriptHtmlCommentLikeText,
    ErrorCode::EofInTag,
    ErrorCode::IncorrectlyClosedComment,
    ErrorCode::IncorrectlyOpenedComment,
    ErrorCode::InvalidFirstCharacterOfTagName,
    ErrorCode::MissingAttributeValue,
    ErrorCode::MissingEndTagName,
    ErrorCode::MissingWhitespaceBetweenAttributes,
    ErrorCode::NestedComment,
    ErrorCode::UnexpectedCharacterInAttributeName,
    ErrorCode::UnexpectedCharacterInUnquotedAttributeValue,
    ErrorCode::UnexpectedEqualsSignBeforeAttributeName,
    ErrorCode::UnexpectedNullCharacter,
    ErrorCode::UnexpectedQuestionMarkInsteadOfTagName,
    ErrorCode::UnexpectedSolidusInTag,
    ErrorCode::InvalidEndTag,
    ErrorCode::MissingEndTag,
    ErrorCode::MissingInterpolationEnd,
    ErrorCode::MissingDirectiveName,
    ErrorCode::MissingDynamicDirectiveArgumentEnd,
    ErrorCode::VIfNoExpression,
    ErrorCode::VIfSameKey,
    ErrorCode::VElseNoAdjacentIf,
    ErrorCode::VForNoExpression,
    ErrorCode::VForMalformedExpression,
    ErrorCode::VForTemplateKeyPlacement,
    ErrorCode::VBindNoExpression,
    ErrorCode::VOnNoExpression,
    ErrorCode::VSlotUnexpectedDirectiveOnSlotOutlet,
    ErrorCode::VSlotMixedSlotUsage,
    ErrorCode::VSlotDuplicateSlotNames,
    ErrorCode::VSlotExtraneousDefaultSlotChildren,
    ErrorCode::VSlotMisplaced,
    ErrorCode::VModelNoExpression,
    ErrorCode::VModelMalformedExpression,
    ErrorCode::VModelOnScopeVariable,
    ErrorCode::VModelOnProps,
    ErrorCode::InvalidExpression,
    ErrorCode::KeepAliveInvalidChildren,
    ErrorCode::PrefixIdNotSupported,
    ErrorCode::ModuleModeNotSupported,
    ErrorCode::CacheHandlerNotSupported,
    ErrorCode::ScopeIdNotSupported,
    ErrorCode::VnodeHooks,
    ErrorCode::VBindInvalidSameNameArgument,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_dense_and_stable() {
        for (i, code) in ALL_CODES.iter().enumerate() {
            assert_eq!(code.code() as usize, i);
        }
        assert_eq!(ErrorCode::MissingEndTag.code(), 24);
        assert_eq!(ErrorCode::VIfSameKey.code(), 29);
        assert_eq!(ErrorCode::ScopeIdNotSupported.code(), 50);
        assert_eq!(ErrorCode::EXTEND_POINT, 53);
    }

    #[test]
    fn test_error_display_and_lookup() {
        let err = CompilerError::new(ErrorCode::VForNoExpression, None);
        assert_eq!(err.to_string(), "v-for is missing expression.");
        assert_eq!(err.error_code(), Some(ErrorCode::VForNoExpression));

        let custom = CompilerError::custom(65, "Unsafe attribute name for SSR.", None);
        assert_eq!(custom.error_code(), None);
    }

    #[test]
    fn test_detail_appended() {
        let err = CompilerError::with_detail(ErrorCode::InvalidEndTag, None, "</span>");
        assert!(err.message.ends_with("</span>"));
    }
}
