//! Capability registry contract and the built-in widget registry.
//!
//! A schema literal sees exactly one capability, `widgets`; every call it
//! makes is routed through [`CapabilityRegistry::invoke`].

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Errors raised by a capability registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("widget registry is not initialized: {0}")]
    NotInitialized(String),
    #[error("unknown widget `{0}`")]
    UnknownWidget(String),
    #[error("invalid arguments for widget `{widget}`: {message}")]
    InvalidArguments { widget: String, message: String },
}

/// Lookup of widget constructors available to schema literals.
pub trait CapabilityRegistry: Send + Sync {
    /// Idempotent readiness check, run before every extraction.
    fn ensure_initialized(&self) -> Result<(), RegistryError>;

    /// Build the field definition produced by `widgets.<widget>(args...)`.
    fn invoke(&self, widget: &str, args: &[Value]) -> Result<Value, RegistryError>;
}

impl<T: CapabilityRegistry + ?Sized> CapabilityRegistry for &T {
    fn ensure_initialized(&self) -> Result<(), RegistryError> {
        (**self).ensure_initialized()
    }

    fn invoke(&self, widget: &str, args: &[Value]) -> Result<Value, RegistryError> {
        (**self).invoke(widget, args)
    }
}

impl<T: CapabilityRegistry + ?Sized> CapabilityRegistry for Arc<T> {
    fn ensure_initialized(&self) -> Result<(), RegistryError> {
        (**self).ensure_initialized()
    }

    fn invoke(&self, widget: &str, args: &[Value]) -> Result<Value, RegistryError> {
        (**self).invoke(widget, args)
    }
}

// ---------------------------------------------------------------------------
// WidgetRegistry
// ---------------------------------------------------------------------------

/// Constructor for one widget kind.
pub type WidgetFactory = Box<dyn Fn(&[Value]) -> Result<Value, RegistryError> + Send + Sync>;

/// Widget names registered by [`WidgetRegistry::with_builtin_widgets`].
pub const BUILTIN_WIDGETS: &[&str] = &[
    "text", "richText", "number", "email", "date", "checkbox", "select", "relation", "media",
    "group",
];

/// Name-keyed registry of widget factories.
#[derive(Default)]
pub struct WidgetRegistry {
    factories: HashMap<String, WidgetFactory>,
}

impl WidgetRegistry {
    /// An empty registry. It reports itself uninitialized until a widget is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the standard field widgets.
    pub fn with_builtin_widgets() -> Self {
        let mut registry = Self::new();
        for &name in BUILTIN_WIDGETS {
            registry.register(name, field_widget(name));
        }
        registry
    }

    /// Add or replace the factory for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, RegistryError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Registered widget names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("widgets", &self.names())
            .finish()
    }
}

impl CapabilityRegistry for WidgetRegistry {
    fn ensure_initialized(&self) -> Result<(), RegistryError> {
        if self.is_empty() {
            return Err(RegistryError::NotInitialized("no widgets registered".into()));
        }
        Ok(())
    }

    fn invoke(&self, widget: &str, args: &[Value]) -> Result<Value, RegistryError> {
        let factory = self
            .factories
            .get(widget)
            .ok_or_else(|| RegistryError::UnknownWidget(widget.to_string()))?;
        factory(args)
    }
}

/// Standard field factory: `{"widget": <name>}` merged with an optional
/// options object. The widget name always wins over an options key.
fn field_widget(name: &'static str) -> impl Fn(&[Value]) -> Result<Value, RegistryError> {
    move |args| {
        let invalid = |message: &str| RegistryError::InvalidArguments {
            widget: name.to_string(),
            message: message.to_string(),
        };

        let mut field = match args {
            [] => Map::new(),
            [Value::Object(options)] => options.clone(),
            [_] => return Err(invalid("expected an options object")),
            _ => return Err(invalid("expected at most one argument")),
        };
        field.insert("widget".into(), Value::String(name.to_string()));
        Ok(Value::Object(field))
    }
}
