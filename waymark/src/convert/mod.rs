//! Defines the `ConverterRegistry`, which turns raw request values into the types declared by
//! handler parameters.
//!
//! Converters are keyed by `(source type, target type)`. Binding always starts from a `String`,
//! but converters for other source types can be registered and are used when a session attribute
//! of that type is bound.

mod builtin;
mod datetime;

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::trace;

/// Errors produced by a converter.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The source value could not be parsed as the target type.
    #[error("unable to convert `{value}` into {target}")]
    Unparsable {
        /// The rejected value.
        value: String,
        /// Name of the target type.
        target: &'static str,
    },

    /// A converter registered by the application failed.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConvertError {
    /// Builds an `Unparsable` error for the target type `T`.
    pub fn unparsable<T>(value: &str) -> Self {
        ConvertError::Unparsable {
            value: value.to_owned(),
            target: type_name::<T>(),
        }
    }
}

type ConvertFn =
    Arc<dyn Fn(&dyn Any) -> Result<Box<dyn Any + Send>, ConvertError> + Send + Sync>;

#[derive(Clone)]
struct Converter {
    target: TypeId,
    convert: ConvertFn,
}

/// Holds every converter known to a `Router`.
///
/// The registry is populated while the `Router` is built and is read-only afterwards.
#[derive(Clone)]
pub struct ConverterRegistry {
    by_type: HashMap<(TypeId, TypeId), Converter>,
    named: HashMap<String, Converter>,
}

impl ConverterRegistry {
    /// Creates a registry without any converters.
    pub fn empty() -> Self {
        ConverterRegistry {
            by_type: HashMap::new(),
            named: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in converters for `String`, `bool`, `char`, the
    /// numeric primitives and the `time` date and time types.
    pub fn new() -> Self {
        let mut registry = ConverterRegistry::empty();
        builtin::register(&mut registry);
        datetime::register(&mut registry);
        registry
    }

    /// Registers a converter from `S` to `T`, replacing any previous one for that pair.
    pub fn register<S, T, F>(&mut self, f: F)
    where
        S: 'static,
        T: Send + 'static,
        F: Fn(&S) -> Result<T, ConvertError> + Send + Sync + 'static,
    {
        trace!(
            " registering converter {} -> {}",
            type_name::<S>(),
            type_name::<T>()
        );
        self.by_type
            .insert((TypeId::of::<S>(), TypeId::of::<T>()), erase(f));
    }

    /// Registers a converter from strings to `T` under `name`. Parameters declaring that
    /// converter name use it in preference to the type based lookup.
    pub fn register_named<T, F>(&mut self, name: &str, f: F)
    where
        T: Send + 'static,
        F: Fn(&String) -> Result<T, ConvertError> + Send + Sync + 'static,
    {
        trace!(" registering converter `{}` -> {}", name, type_name::<T>());
        self.named.insert(name.to_owned(), erase(f));
    }

    /// Registers a string converter for a type implementing `FromStr`.
    pub fn register_from_str<T>(&mut self)
    where
        T: std::str::FromStr + Send + 'static,
    {
        self.register::<String, T, _>(|s: &String| {
            s.trim().parse::<T>().map_err(|_| ConvertError::unparsable::<T>(s))
        });
    }

    /// Determines if a value of type `S` can be converted into `T`.
    pub fn can_convert<S: 'static, T: 'static>(&self) -> bool {
        self.can_convert_ids(TypeId::of::<S>(), TypeId::of::<T>())
    }

    pub(crate) fn can_convert_ids(&self, source: TypeId, target: TypeId) -> bool {
        source == target || self.by_type.contains_key(&(source, target))
    }

    /// Converts a string into `T`, yielding `None` when there is no converter or it fails.
    pub fn convert<T: 'static>(&self, value: &str) -> Option<T> {
        self.convert_any(&value.to_owned(), TypeId::of::<T>(), None)
            .and_then(|b| b.downcast::<T>().ok())
            .map(|b| *b)
    }

    /// Converts `value` into the type identified by `target`.
    ///
    /// A named converter matching `hint` and producing `target` is preferred. Conversion errors
    /// are logged and yield `None`.
    pub fn convert_any(
        &self,
        value: &dyn Any,
        target: TypeId,
        hint: Option<&str>,
    ) -> Option<Box<dyn Any + Send>> {
        let named = hint
            .and_then(|name| self.named.get(name))
            .filter(|c| c.target == target && value.is::<String>());

        let converter = match named {
            Some(converter) => converter,
            None => self.by_type.get(&(value.type_id(), target))?,
        };

        match (converter.convert)(value) {
            Ok(converted) => Some(converted),
            Err(e) => {
                trace!(" conversion failed: {}", e);
                None
            }
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        ConverterRegistry::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.by_type.len())
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn erase<S, T, F>(f: F) -> Converter
where
    S: 'static,
    T: Send + 'static,
    F: Fn(&S) -> Result<T, ConvertError> + Send + Sync + 'static,
{
    Converter {
        target: TypeId::of::<T>(),
        convert: Arc::new(
            move |value: &dyn Any| -> Result<Box<dyn Any + Send>, ConvertError> {
                let source = value
                    .downcast_ref::<S>()
                    .ok_or_else(|| anyhow::anyhow!("expected a {}", type_name::<S>()))?;
                f(source).map(|t| Box::new(t) as Box<dyn Any + Send>)
            },
        ),
    }
}
