//! Tagged result values and the record that accumulates them during a parse.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single parsed value.
///
/// `Tuple` holds the values of one `nargs > 1` occurrence; `List` is the
/// accumulator built by the append actions. The two are kept distinct so a
/// multi-token value pushed onto an accumulator stays recognizable.
///
/// Serialization is untagged, so a `Values` record renders as plain JSON
/// (`3`, `true`, `["a", "b"]`); tuples deserialize back as lists.
///
/// # Examples
///
/// ```
/// use optargs_core::Val;
///
/// let val = Val::from("report.txt");
/// assert_eq!(val.to_string(), "report.txt");
/// assert!(!val.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Val {
    /// The explicit "no value" value, distinct from an absent key.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex { re: f64, im: f64 },
    Str(String),
    List(Vec<Val>),
    Tuple(Vec<Val>),
}

impl Val {
    pub fn is_none(&self) -> bool {
        matches!(self, Val::None)
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::None => write!(f, "none"),
            Val::Bool(b) => write!(f, "{b}"),
            Val::Int(n) => write!(f, "{n}"),
            Val::Float(x) => write!(f, "{x}"),
            Val::Complex { re, im } => {
                if *im < 0.0 {
                    write!(f, "{re}-{}j", -im)
                } else {
                    write!(f, "{re}+{im}j")
                }
            }
            Val::Str(s) => write!(f, "{s}"),
            Val::List(items) => write!(f, "[{}]", join_items(items)),
            Val::Tuple(items) => write!(f, "({})", join_items(items)),
        }
    }
}

fn join_items(items: &[Val]) -> String {
    items
        .iter()
        .map(Val::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<bool> for Val {
    fn from(v: bool) -> Self {
        Val::Bool(v)
    }
}

impl From<i64> for Val {
    fn from(v: i64) -> Self {
        Val::Int(v)
    }
}

impl From<f64> for Val {
    fn from(v: f64) -> Self {
        Val::Float(v)
    }
}

impl From<&str> for Val {
    fn from(v: &str) -> Self {
        Val::Str(v.to_string())
    }
}

impl From<String> for Val {
    fn from(v: String) -> Self {
        Val::Str(v)
    }
}

/// The mutable record that accumulates parsed results.
///
/// Keys are option destination names. A record is created once per parse
/// invocation, seeded from the container's defaults, mutated exclusively by
/// option actions during that invocation, and returned to the caller.
///
/// # Examples
///
/// ```
/// use optargs_core::{Val, Values};
///
/// let mut values = Values::new();
/// values.set("verbose", true);
/// assert_eq!(values.get_bool("verbose"), Some(true));
///
/// // ensure installs the default only when the key is absent or None
/// values.set("count", Val::None);
/// values.ensure("count", Val::Int(0));
/// assert_eq!(values.get("count"), Some(&Val::Int(0)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values {
    entries: BTreeMap<String, Val>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record from a defaults table.
    pub fn with_defaults(defaults: BTreeMap<String, Val>) -> Self {
        Values { entries: defaults }
    }

    pub fn get(&self, key: &str) -> Option<&Val> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, val: impl Into<Val>) {
        self.entries.insert(key.into(), val.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Val)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Return the slot for `key`, installing `default` first when the key
    /// is absent or currently [`Val::None`].
    pub fn ensure(&mut self, key: &str, default: Val) -> &mut Val {
        let slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Val::None);
        if slot.is_none() {
            *slot = default;
        }
        slot
    }

    /// Overwrite only keys that already exist in this record, skipping
    /// [`Val::None`] source values.
    pub fn update_careful(&mut self, other: &BTreeMap<String, Val>) {
        for (key, val) in other {
            if val.is_none() {
                continue;
            }
            if let Some(slot) = self.entries.get_mut(key) {
                *slot = val.clone();
            }
        }
    }

    /// Overwrite or insert every key from `other`, unconditionally.
    pub fn update_loose(&mut self, other: &BTreeMap<String, Val>) {
        for (key, val) in other {
            self.entries.insert(key.clone(), val.clone());
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.get(key) {
            Some(Val::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.entries.get(key) {
            Some(Val::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(Val::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Parser scratch state exposed to callback actions while a parse is in
/// flight: the accumulating record, the unconsumed tail of the argument
/// vector, and the leftovers collected so far.
#[derive(Debug)]
pub struct CallbackContext<'a> {
    pub values: &'a mut Values,
    pub rargs: &'a mut Vec<String>,
    pub largs: &'a mut Vec<String>,
}
