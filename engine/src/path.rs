//! Field paths: addresses of values inside a nested form value tree.
//!
//! A path is the dot-joined chain of ancestor names, with numeric segments
//! for array entries: `address.city`, `contacts.2.email`.

use crate::{error::Result, Error};
use serde_json::Value;
use std::fmt;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Object property
    Key(String),
    /// Array entry
    Index(usize),
}

impl Segment {
    fn as_key(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Address of a value within a form value tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// The empty path, addressing the whole tree.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dot-joined path. All-digit segments become indices.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self::root());
        }
        raw.split('.')
            .map(|part| {
                if part.is_empty() {
                    Err(Error::InvalidPath(raw.to_string()))
                } else if part.bytes().all(|b| b.is_ascii_digit()) {
                    part.parse()
                        .map(Segment::Index)
                        .map_err(|_| Error::InvalidPath(raw.to_string()))
                } else {
                    Ok(Segment::Key(part.to_string()))
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Child path for an object property.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.into()));
        Self(segments)
    }

    /// Child path for an array entry.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` is an ancestor of (or equal to) this path.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Copy of this path with the segment at `position` replaced.
    pub(crate) fn with_segment(&self, position: usize, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        if let Some(slot) = segments.get_mut(position) {
            *slot = segment;
        }
        Self(segments)
    }

    /// Read the value at this path.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(root, |current, segment| match (current, segment) {
                (Value::Object(map), segment) => map.get(&segment.as_key()),
                (Value::Array(items), Segment::Index(i)) => items.get(*i),
                _ => None,
            })
    }

    /// Mutable access to an existing value at this path.
    pub fn get_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = root;
        for segment in &self.0 {
            current = match (current, segment) {
                (Value::Object(map), segment) => map.get_mut(&segment.as_key())?,
                (Value::Array(items), Segment::Index(i)) => items.get_mut(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at this path, creating missing containers on the way.
    ///
    /// An index may address an existing entry or the slot right after the
    /// last one. The whole path is checked first, so a failed write leaves
    /// `root` untouched.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<()> {
        self.check_writable(root)?;
        let Some(first) = self.0.first() else {
            *root = value;
            return Ok(());
        };
        if root.is_null() {
            *root = empty_container(first);
        }

        let mut current = root;
        for (position, segment) in self.0.iter().enumerate() {
            current = self.child_mut(current, segment)?;
            if let Some(next) = self.0.get(position + 1) {
                if current.is_null() {
                    *current = empty_container(next);
                }
            }
        }
        *current = value;
        Ok(())
    }

    /// Walk the path without mutating. `None` stands for a container that
    /// `set` would create.
    fn check_writable(&self, root: &Value) -> Result<()> {
        let mut current = Some(root);
        for segment in &self.0 {
            current = match (current, segment) {
                (None | Some(Value::Null), Segment::Index(i)) if *i > 0 => {
                    return Err(Error::IndexOutOfBounds {
                        path: self.to_string(),
                        index: *i,
                        len: 0,
                    });
                }
                (None | Some(Value::Null), _) => None,
                (Some(Value::Object(map)), segment) => map.get(&segment.as_key()),
                (Some(Value::Array(items)), Segment::Index(i)) => {
                    if *i > items.len() {
                        return Err(Error::IndexOutOfBounds {
                            path: self.to_string(),
                            index: *i,
                            len: items.len(),
                        });
                    }
                    items.get(*i)
                }
                _ => return Err(Error::InvalidPath(self.to_string())),
            };
        }
        Ok(())
    }

    fn child_mut<'a>(&self, current: &'a mut Value, segment: &Segment) -> Result<&'a mut Value> {
        match (current, segment) {
            (Value::Object(map), segment) => Ok(map.entry(segment.as_key()).or_insert(Value::Null)),
            (Value::Array(items), Segment::Index(i)) => {
                let len = items.len();
                if *i == len {
                    items.push(Value::Null);
                }
                items.get_mut(*i).ok_or_else(|| Error::IndexOutOfBounds {
                    path: self.to_string(),
                    index: *i,
                    len,
                })
            }
            _ => Err(Error::InvalidPath(self.to_string())),
        }
    }
}

fn empty_container(next: &Segment) -> Value {
    match next {
        Segment::Key(_) => Value::Object(serde_json::Map::new()),
        Segment::Index(_) => Value::Array(Vec::new()),
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
