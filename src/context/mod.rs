//! Per-request context handed to handlers and middleware.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::Request;

/// Type-erased request extensions map — used to inject per-request state
/// into handlers without requiring handlers to know about each other's types.
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Creates a new empty extensions map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value into the extensions map.
    pub fn insert<T>(&mut self, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.map.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Gets a value from the extensions map.
    pub fn get<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Gets a mutable reference to a value from the extensions map.
    pub fn get_mut<T>(&mut self) -> Option<&mut T>
    where
        T: Send + Sync + 'static,
    {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Removes a value from the extensions map.
    pub fn remove<T>(&mut self) -> Option<T>
    where
        T: Send + Sync + 'static,
    {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }
}

/// REST parameters captured from path segments during route matching.
///
/// An ordered, append-only list of name/value pairs. Lookup returns the
/// first entry with the given name.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    list: Vec<(String, String)>,
}

impl Parameters {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.list.push((name.into(), value.into()));
    }

    /// Returns the first value captured under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.list
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of captured parameters.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns an iterator over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.list.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Per-request context carrying the parsed request, its captured REST
/// parameters, and type-erased extensions.
pub struct Context {
    request: Request,
    extensions: Extensions,
}

impl Context {
    /// Creates a context from a request.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            extensions: Extensions::new(),
        }
    }

    /// Returns the request this context wraps.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the REST parameters captured during route matching.
    pub fn params(&self) -> &Parameters {
        self.request.params()
    }

    /// Returns the extensions map.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the extensions map mutably.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Deserializes the request body as JSON.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(self.request.body())
    }
}
