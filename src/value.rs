//! `Value` — Type-erased subject data the engine matches against
//!
//! Patterns are matched against arbitrary in-memory data: object graphs,
//! mappings, sequences, scalars. All of it flows through one closed enum,
//! so matcher variants stay non-generic and shareable.
//!
//! # Extensibility via `Object`
//!
//! Domain types enter the engine by implementing [`ObjectNode`] and wrapping
//! in `Value::Object(Arc::new(node))`. The trait is the only reflection
//! surface the engine uses: a node declares its type name, its subclass
//! relation, and its composite children.

use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

/// Extension trait for domain objects participating in matching.
///
/// Implementations must be `Send + Sync` so matcher trees and subjects can
/// be shared across threads.
///
/// # Identity
///
/// The engine tracks object identity by the `Arc` allocation, not by value.
/// Recursive path resolution relies on this for cycle safety: keep handing
/// out the *same* `Arc` for the same logical node (store children as
/// `Arc`s, clone them in [`fields`](ObjectNode::fields)), and two
/// equal-but-distinct instances are never conflated.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use suma::{ObjectNode, Value};
///
/// #[derive(Debug)]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// impl ObjectNode for Point {
///     fn type_name(&self) -> &'static str {
///         "Point"
///     }
///
///     fn fields(&self) -> Vec<(&'static str, Value)> {
///         vec![("x", self.x.into()), ("y", self.y.into())]
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let subject = Value::Object(Arc::new(Point { x: 1, y: 2 }));
/// assert_eq!(subject.type_name(), "Point");
/// ```
pub trait ObjectNode: Send + Sync + Debug {
    /// Returns the node's runtime type name.
    ///
    /// Shape matchers compare this against their declared class for the
    /// exact-type gate. Convention: the bare type name, e.g. `"Point"`.
    fn type_name(&self) -> &'static str;

    /// Returns `true` if this node is an instance of `name`, including
    /// supertypes. Drives shape matching in subclass mode.
    ///
    /// Default: exact type name equality. Override to declare ancestors.
    fn has_type(&self, name: &str) -> bool {
        self.type_name() == name
    }

    /// Enumerates the node's fields in declaration order.
    ///
    /// This is the "list my composite children" capability used by direct
    /// field access and by structural descendant closure (`"*"` paths).
    fn fields(&self) -> Vec<(&'static str, Value)>;

    /// Resolves a single field by name. Default scans [`fields`](ObjectNode::fields).
    fn field(&self, name: &str) -> Option<Value> {
        self.fields().into_iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Returns `self` as `&dyn Any`, enabling downcasts in [`eq_node`](ObjectNode::eq_node)
    /// implementations.
    fn as_any(&self) -> &dyn Any;

    /// Structural equality hook for non-linear binding checks.
    ///
    /// Two `Value::Object`s compare equal when they share an allocation or
    /// when this hook says so. Default: `false` (identity only). Override
    /// with a downcast when distinct instances should count as equal:
    ///
    /// ```ignore
    /// fn eq_node(&self, other: &dyn ObjectNode) -> bool {
    ///     other.as_any().downcast_ref::<Point>().is_some_and(|p| p.x == self.x && p.y == self.y)
    /// }
    /// ```
    fn eq_node(&self, _other: &dyn ObjectNode) -> bool {
        false
    }
}

/// The erased data type patterns are evaluated against.
///
/// Composite variants (`Seq`, `Map`, `Object`) are `Arc`-shared: cloning a
/// `Value` is cheap, and the allocation pointer is the node's identity.
/// Binding contexts clone values freely on branch divergence because of
/// this.
///
/// # Example
///
/// ```
/// use suma::Value;
///
/// let data = Value::from("hello");
/// assert_eq!(data.as_str(), Some("hello"));
/// assert_eq!(data.type_name(), "str");
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean data. Never equal to a number.
    Bool(bool),
    /// Integer data. Cross-compares with `Float` (`3 == 3.0`).
    Int(i64),
    /// Floating point data.
    Float(f64),
    /// String data.
    Str(String),
    /// An ordered sequence.
    Seq(Arc<Vec<Value>>),
    /// A string-keyed mapping. Iteration (and therefore descendant-closure
    /// discovery over map entries) is in key order.
    Map(Arc<BTreeMap<String, Value>>),
    /// A domain object, reflected through [`ObjectNode`].
    Object(Arc<dyn ObjectNode>),
}

// Structural equality with numeric cross-comparison. Object equality is
// allocation identity unless the node's eq_node hook says otherwise.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                Arc::ptr_eq(a, b) || a.eq_node(b.as_ref())
            }
            _ => false,
        }
    }
}

impl Value {
    /// Returns `true` if this is the `Null` variant.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a float, widening integers.
    ///
    /// Booleans are not numbers and return `None`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get the value as a sequence slice.
    #[inline]
    #[must_use]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(s) => Some(s.as_slice()),
            _ => None,
        }
    }

    /// Try to get the value as an object node.
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&dyn ObjectNode> {
        match self {
            Self::Object(o) => Some(o.as_ref()),
            _ => None,
        }
    }

    /// Returns a string describing this value's runtime type.
    ///
    /// Shape matchers use this for their type gate. `Object` delegates to
    /// [`ObjectNode::type_name`].
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Seq(_) => "seq",
            Self::Map(_) => "map",
            Self::Object(o) => o.type_name(),
        }
    }

    /// Identity comparison: allocation pointer for composites, type-strict
    /// value equality for scalars (scalars model interned constants).
    ///
    /// Unlike `==`, `3.is_same(&3.0)` is `false`, and two structurally
    /// equal sequences in different allocations are not the same.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Seq(a), Self::Seq(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Allocation pointer for composite variants, `None` for scalars.
    pub(crate) fn identity_ptr(&self) -> Option<usize> {
        match self {
            Self::Seq(a) => Some(Arc::as_ptr(a) as *const () as usize),
            Self::Map(a) => Some(Arc::as_ptr(a) as *const () as usize),
            Self::Object(a) => Some(Arc::as_ptr(a) as *const () as usize),
            _ => None,
        }
    }

    /// Build a map value from `(key, value)` entries.
    ///
    /// # Example
    ///
    /// ```
    /// use suma::Value;
    ///
    /// let m = Value::map([("x", 4.into()), ("y", 8.into())]);
    /// assert_eq!(m.type_name(), "map");
    /// ```
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build a sequence value from elements.
    pub fn seq(elements: impl IntoIterator<Item = Value>) -> Self {
        Self::Seq(Arc::new(elements.into_iter().collect()))
    }

    /// Wrap a domain object.
    pub fn object(node: Arc<dyn ObjectNode>) -> Self {
        Self::Object(node)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Seq(Arc::new(v))
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Self::Map(Arc::new(m))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Flatten one resolved value into candidate elements.
///
/// Sequences are flattened recursively (nested sequences collapse into
/// their elements); anything else — maps included — stays a single
/// candidate. Path resolution applies this to every resolved field or key.
pub(crate) fn flatten(value: &Value) -> Vec<Value> {
    match value {
        Value::Seq(items) => items.iter().flat_map(flatten).collect(),
        other => vec![other.clone()],
    }
}

/// A visited set keyed by node identity, not equality.
///
/// Recursive path resolution uses this as its cycle guard: composite
/// values are tracked by allocation pointer, scalars by type-strict value
/// equality. Two equal-but-distinct composites are never conflated.
#[derive(Debug, Default)]
pub(crate) struct IdentitySet {
    composites: HashSet<usize>,
    scalars: Vec<Value>,
}

impl IdentitySet {
    pub fn contains(&self, value: &Value) -> bool {
        match value.identity_ptr() {
            Some(ptr) => self.composites.contains(&ptr),
            None => self.scalars.iter().any(|s| s.is_same(value)),
        }
    }

    pub fn insert(&mut self, value: &Value) {
        match value.identity_ptr() {
            Some(ptr) => {
                self.composites.insert(ptr);
            }
            None => {
                if !self.contains(value) {
                    self.scalars.push(value.clone());
                }
            }
        }
    }
}
