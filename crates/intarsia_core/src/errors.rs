//! Compiler diagnostics.
//!
//! Malformed input never aborts compilation: the parser and transforms emit
//! a `CompilerError` for every problem and keep going with a best-effort
//! node. Internal invariants use `debug_assert!` instead.

use thiserror::Error;

use crate::ast::SourceLocation;

/// Every diagnostic the front-end can emit.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Parse errors aligned with the HTML spec's tokenizer error names.
    #[error("illegal comment closing sequence")]
    AbruptClosingOfEmptyComment,
    #[error("CDATA section is only allowed in foreign content")]
    CdataInHtmlContent,
    #[error("duplicate attribute")]
    DuplicateAttribute,
    #[error("end tag cannot have attributes")]
    EndTagWithAttributes,
    #[error("end tag cannot be self-closing")]
    EndTagWithTrailingSolidus,
    #[error("unexpected end of file before tag name")]
    EofBeforeTagName,
    #[error("unexpected end of file in CDATA section")]
    EofInCdata,
    #[error("unexpected end of file in comment")]
    EofInComment,
    #[error("unexpected end of file in tag")]
    EofInTag,
    #[error("incorrectly closed comment")]
    IncorrectlyClosedComment,
    #[error("incorrectly opened comment")]
    IncorrectlyOpenedComment,
    #[error("invalid first character of tag name")]
    InvalidFirstCharacterOfTagName,
    #[error("attribute value is missing")]
    MissingAttributeValue,
    #[error("end tag name is missing")]
    MissingEndTagName,
    #[error("missing whitespace between attributes")]
    MissingWhitespaceBetweenAttributes,
    #[error("nested comment")]
    NestedComment,
    #[error("unexpected character in attribute name")]
    UnexpectedCharacterInAttributeName,
    #[error("unexpected character in unquoted attribute value")]
    UnexpectedCharacterInUnquotedAttributeValue,
    #[error("attribute name cannot start with '='")]
    UnexpectedEqualsSignBeforeAttributeName,
    #[error("'<?' is not a valid tag open")]
    UnexpectedQuestionMarkInsteadOfTagName,
    #[error("unexpected '/' in tag")]
    UnexpectedSolidusInTag,

    // Template-structure errors.
    #[error("invalid end tag")]
    InvalidEndTag,
    #[error("element is missing its end tag")]
    MissingEndTag,
    #[error("interpolation is missing its end delimiter")]
    MissingInterpolationEnd,
    #[error("directive name is missing")]
    MissingDirectiveName,

    // Transform errors.
    #[error("v-if is missing its expression")]
    VIfNoExpression,
    #[error("v-if branches must not share the same key")]
    VIfSameKey,
    #[error("v-else/v-else-if has no adjacent v-if")]
    VElseNoAdjacentIf,
    #[error("v-for is missing its expression")]
    VForNoExpression,
    #[error("v-for has a malformed expression")]
    VForMalformedExpression,
    #[error("v-bind is missing its expression")]
    VBindNoExpression,
    #[error("v-on is missing its expression")]
    VOnNoExpression,
    #[error("v-slot can only be used on components or templates")]
    VSlotMisplaced,
    #[error("v-once used on the same node more than once")]
    VOnceDuplicate,
}

/// Whether a diagnostic blocks downstream usage or is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Error,
    Warning,
}

/// A diagnostic with its source span.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}")]
pub struct CompilerError {
    pub code: ErrorCode,
    pub category: DiagnosticCategory,
    pub loc: Option<SourceLocation>,
}

impl CompilerError {
    pub fn new(code: ErrorCode, loc: Option<SourceLocation>) -> Self {
        Self { code, category: DiagnosticCategory::Error, loc }
    }

    pub fn warning(code: ErrorCode, loc: Option<SourceLocation>) -> Self {
        Self { code, category: DiagnosticCategory::Warning, loc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ErrorCode::VElseNoAdjacentIf.to_string(),
            "v-else/v-else-if has no adjacent v-if"
        );
        let err = CompilerError::new(ErrorCode::MissingEndTag, None);
        assert_eq!(err.to_string(), "element is missing its end tag");
        assert_eq!(err.category, DiagnosticCategory::Error);
    }
}
