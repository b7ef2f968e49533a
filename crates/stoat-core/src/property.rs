//! Property keys and descriptors

use std::sync::Arc;

use crate::symbol::JsSymbol;
use crate::value::Value;

/// Property key (string, integer index, or symbol).
///
/// Canonical array-index strings normalize to the `Index` variant so that
/// `o["3"]` and `o[3]` address the same property and enumeration can order
/// integer keys first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String property key
    String(Arc<str>),
    /// Integer index
    Index(u32),
    /// Symbol property key
    Symbol(JsSymbol),
}

impl PropertyKey {
    /// Create a key from a string, normalizing canonical indices.
    pub fn string(s: &str) -> Self {
        if let Some(index) = canonical_index(s) {
            Self::Index(index)
        } else {
            Self::String(Arc::from(s))
        }
    }

    /// Create an index key
    pub fn index(i: u32) -> Self {
        Self::Index(i)
    }

    /// Create a symbol key
    pub fn symbol(s: JsSymbol) -> Self {
        Self::Symbol(s)
    }

    /// Is this a string key with the given spelling?
    pub fn is_string(&self, s: &str) -> bool {
        matches!(self, Self::String(k) if &**k == s)
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        Self::Index(i)
    }
}

impl From<JsSymbol> for PropertyKey {
    fn from(s: JsSymbol) -> Self {
        Self::Symbol(s)
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Index(i) => write!(f, "{i}"),
            Self::Symbol(s) => write!(f, "{s}"),
        }
    }
}

/// A string is a canonical array index when it round-trips through u32
/// (no leading zeros, in range).
fn canonical_index(s: &str) -> Option<u32> {
    if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
        return None;
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok()
}

/// Property attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyAttributes {
    /// Property is writable
    pub writable: bool,
    /// Property is enumerable
    pub enumerable: bool,
    /// Property is configurable
    pub configurable: bool,
}

impl PropertyAttributes {
    /// Default data property attributes (all true)
    pub const fn data() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Non-writable, non-enumerable, non-configurable
    pub const fn frozen() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// Writable and configurable but hidden from enumeration
    pub const fn hidden() -> Self {
        Self {
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }
}

/// Property descriptor.
///
/// Fields are optional so the same type serves both as the partial input to
/// `define_own_property` and, once completed, as the stored own-property
/// entry. A descriptor is accessor-shaped when either `get` or `set` is
/// present and data-shaped otherwise; exactly one of [`is_data`] and
/// [`is_accessor`] holds for every descriptor.
///
/// [`is_data`]: PropertyDescriptor::is_data
/// [`is_accessor`]: PropertyDescriptor::is_accessor
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyDescriptor {
    /// Data value
    pub value: Option<Value>,
    /// Data property is writable
    pub writable: Option<bool>,
    /// Getter (callable or absent)
    pub get: Option<Value>,
    /// Setter (callable or absent)
    pub set: Option<Value>,
    /// Property shows up in enumeration
    pub enumerable: Option<bool>,
    /// Property may be deleted or reshaped
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Data descriptor with default (all-true) attributes.
    pub fn data(value: Value) -> Self {
        Self::data_with_attrs(value, PropertyAttributes::data())
    }

    /// Data descriptor with specific attributes.
    pub fn data_with_attrs(value: Value, attrs: PropertyAttributes) -> Self {
        Self {
            value: Some(value),
            writable: Some(attrs.writable),
            enumerable: Some(attrs.enumerable),
            configurable: Some(attrs.configurable),
            get: None,
            set: None,
        }
    }

    /// Accessor descriptor, enumerable and configurable.
    pub fn accessor(get: Option<Value>, set: Option<Value>) -> Self {
        Self {
            value: None,
            writable: None,
            get,
            set,
            enumerable: Some(true),
            configurable: Some(true),
        }
    }

    /// Accessor descriptor with specific attributes (`writable` ignored).
    pub fn accessor_with_attrs(
        get: Option<Value>,
        set: Option<Value>,
        attrs: PropertyAttributes,
    ) -> Self {
        Self {
            value: None,
            writable: None,
            get,
            set,
            enumerable: Some(attrs.enumerable),
            configurable: Some(attrs.configurable),
        }
    }

    /// Accessor-shaped: a getter or setter is present.
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// Data-shaped: not accessor-shaped.
    pub fn is_data(&self) -> bool {
        !self.is_accessor()
    }

    /// Carries a data field (`value` or `writable`)? Distinguishes a
    /// data-reshaping request from a generic attribute change.
    pub fn has_data_fields(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// No field is set at all.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.writable.is_none()
            && self.get.is_none()
            && self.set.is_none()
            && self.enumerable.is_none()
            && self.configurable.is_none()
    }

    /// `writable`, defaulting to false.
    pub fn writable(&self) -> bool {
        self.writable.unwrap_or(false)
    }

    /// `enumerable`, defaulting to false.
    pub fn enumerable(&self) -> bool {
        self.enumerable.unwrap_or(false)
    }

    /// `configurable`, defaulting to false.
    pub fn configurable(&self) -> bool {
        self.configurable.unwrap_or(false)
    }

    /// The data value, or `undefined` when unset.
    pub fn value_or_undefined(&self) -> Value {
        self.value.clone().unwrap_or_default()
    }

    /// Fill unset fields with their spec defaults: `undefined` for `value`,
    /// false for the flags. Accessor descriptors keep absent getters/setters
    /// absent. Stored own-property entries are always completed.
    pub fn complete(mut self) -> Self {
        if self.is_data() {
            self.value.get_or_insert_with(Value::undefined);
            self.writable.get_or_insert(false);
        }
        self.enumerable.get_or_insert(false);
        self.configurable.get_or_insert(false);
        self
    }
}
