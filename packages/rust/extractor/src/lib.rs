//! Schema extraction from collection module source text.
//!
//! A collection module carries a `// UUID: ...` marker and an
//! `export const schema = { ... }` literal. Extraction finds both, delimits the
//! literal with a quote-aware brace scan, parses it with a restricted literal
//! grammar, and evaluates it with the widget registry as the only capability
//! in scope. Nothing is executed and no global state is touched, so one
//! extractor can serve concurrent callers.

pub mod error;
pub mod eval;
pub mod literal;
pub mod scanner;
pub mod widgets;

use serde_json::Value;
use tracing::{debug, error, instrument, trace, warn};

use contentkit_shared::{ExtractorOptions, Schema};

pub use error::{ExtractError, error_chain};
pub use eval::{EvalError, evaluate, value_type_name};
pub use literal::{Expr, LiteralError, LiteralErrorKind, parse_literal};
pub use scanner::{ScannedLiteral, find_schema_start, find_uuid, scan_balanced_literal};
pub use widgets::{CapabilityRegistry, RegistryError, WidgetFactory, WidgetRegistry};

/// Extracts collection schemas from module text using an injected registry.
#[derive(Debug)]
pub struct SchemaExtractor<R> {
    registry: R,
    options: ExtractorOptions,
}

impl<R: CapabilityRegistry> SchemaExtractor<R> {
    /// Extractor with default limits.
    pub fn new(registry: R) -> Self {
        Self::with_options(registry, ExtractorOptions::default())
    }

    pub fn with_options(registry: R, options: ExtractorOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Extract the module's schema, or `None` with the reason logged.
    ///
    /// Never fails: missing markers and non-schema results are logged at
    /// `warn`, parse and evaluation failures at `error` with their cause chain.
    pub fn process_module(&self, source: &str) -> Option<Schema> {
        match self.extract(source) {
            Ok(schema) => {
                trace!(uuid = %schema.id, "successfully processed collection");
                Some(schema)
            }
            Err(err) if err.is_warning() => {
                warn!(reason = %err, "module skipped");
                None
            }
            Err(err) => {
                error!(error = %err, chain = %error_chain(&err), "failed to process module");
                None
            }
        }
    }

    /// Extract the module's schema, reporting exactly why when there is none.
    #[instrument(skip_all, fields(source_len = source.len()))]
    pub fn extract(&self, source: &str) -> Result<Schema, ExtractError> {
        self.registry
            .ensure_initialized()
            .map_err(ExtractError::RegistryUnavailable)?;

        let uuid = scanner::find_uuid(source).ok_or(ExtractError::MissingUuid)?;
        let start = scanner::find_schema_start(source).ok_or(ExtractError::MissingSchemaExport)?;

        let literal = scanner::scan_balanced_literal(source, start);
        if literal.text.trim().is_empty() {
            return Err(ExtractError::EmptyLiteral);
        }
        if !literal.balanced {
            debug!(%uuid, scanned = literal.text.len(), "brace scan reached end of text");
            return Err(ExtractError::UnbalancedLiteral {
                scanned: literal.text.len(),
            });
        }
        if literal.text.len() > self.options.max_literal_bytes {
            return Err(ExtractError::LiteralTooLarge {
                len: literal.text.len(),
                limit: self.options.max_literal_bytes,
            });
        }

        let expr = literal::parse_literal(literal.text, self.options.max_nesting_depth)?;
        let value = eval::evaluate(&expr, &self.registry)?;
        shape_schema(value, uuid)
    }
}

/// Accept only objects with `fields`; stamp the marker UUID as `_id`.
fn shape_schema(value: Value, uuid: String) -> Result<Schema, ExtractError> {
    let observed = value_type_name(&value);
    let Value::Object(mut map) = value else {
        return Err(ExtractError::MissingFields { observed });
    };
    let Some(fields) = map.remove("fields") else {
        return Err(ExtractError::MissingFields { observed });
    };

    // The marker is authoritative over any `_id` the literal declares.
    map.remove("_id");
    let path = match map.remove("path") {
        Some(Value::String(path)) => Some(path),
        Some(other) => {
            map.insert("path".into(), other);
            None
        }
        None => None,
    };

    Ok(Schema {
        id: uuid,
        path,
        fields,
        extra: map,
    })
}
