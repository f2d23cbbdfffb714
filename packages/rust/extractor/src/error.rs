//! Failure reasons for a single schema extraction.

use crate::eval::EvalError;
use crate::literal::LiteralError;
use crate::widgets::RegistryError;

/// Why a module produced no schema.
///
/// [`SchemaExtractor::process_module`](crate::SchemaExtractor::process_module)
/// logs this and returns `None`; [`SchemaExtractor::extract`](crate::SchemaExtractor::extract)
/// returns it as is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error("widget registry unavailable")]
    RegistryUnavailable(#[source] RegistryError),

    #[error("no UUID found in module content")]
    MissingUuid,

    #[error("no schema export found in module")]
    MissingSchemaExport,

    #[error("could not extract schema content")]
    EmptyLiteral,

    #[error("schema literal never closes (scanned {scanned} bytes)")]
    UnbalancedLiteral { scanned: usize },

    #[error("schema literal is {len} bytes, limit is {limit}")]
    LiteralTooLarge { len: usize, limit: usize },

    #[error("failed to parse schema literal")]
    Parse(#[from] LiteralError),

    #[error("failed to evaluate schema literal")]
    Evaluation(#[from] EvalError),

    #[error("module processed but no fields found (result type: {observed})")]
    MissingFields { observed: &'static str },
}

impl ExtractError {
    /// Whether the module was simply not a schema module (logged as a warning),
    /// as opposed to a schema module that failed (logged as an error).
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::MissingUuid | Self::MissingSchemaExport | Self::EmptyLiteral | Self::MissingFields { .. }
        )
    }
}

/// Render an error and its `source()` chain as `outer: inner: root`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::LiteralErrorKind;

    #[test]
    fn chain_includes_sources() {
        let err = ExtractError::Evaluation(EvalError::Widget {
            name: "slug".into(),
            source: RegistryError::UnknownWidget("slug".into()),
        });
        assert_eq!(
            error_chain(&err),
            "failed to evaluate schema literal: widget `slug` failed: unknown widget `slug`"
        );
    }

    #[test]
    fn parse_errors_include_offset() {
        let err = ExtractError::from(LiteralError {
            offset: 12,
            kind: LiteralErrorKind::UnexpectedEnd,
        });
        assert!(!err.is_warning());
        assert!(error_chain(&err).ends_with("unexpected end of input at byte 12"));
    }

    #[test]
    fn marker_problems_are_warnings() {
        assert!(ExtractError::MissingUuid.is_warning());
        assert!(ExtractError::MissingFields { observed: "string" }.is_warning());
        assert!(!ExtractError::UnbalancedLiteral { scanned: 3 }.is_warning());
        assert!(!ExtractError::RegistryUnavailable(RegistryError::NotInitialized("x".into())).is_warning());
    }
}
