//! Identity-keyed structural patches
//!
//! A patch sets exactly one field of one resource. Paths are built from mapping keys and
//! sequence indexes; missing mappings along the way are created, and a sequence may grow
//! by one element when the index equals its length.

use std::fmt;

use serde_yaml::{Mapping, Value};

use super::gvk::ResId;

/// One step into a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Path to a field inside a resource document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a dotted path such as `spec.rules[0].host`
    ///
    /// Keys containing dots cannot be written this way; build those with [`FieldPath::key`].
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        for part in path.split('.').filter(|p| !p.is_empty()) {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.to_string()));
            }
            while let Some(stripped) = rest.strip_prefix('[') {
                let Some(end) = stripped.find(']') else {
                    break;
                };
                match stripped[..end].parse::<usize>() {
                    Ok(index) => segments.push(PathSegment::Index(index)),
                    Err(_) => segments.push(PathSegment::Key(stripped[..end].to_string())),
                }
                rest = &stripped[end + 1..];
            }
        }
        Self(segments)
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Read the value at this path, if every step exists
    pub fn get<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        let mut node = doc;
        for segment in &self.0 {
            node = match segment {
                PathSegment::Key(key) => node.as_mapping()?.get(key.as_str())?,
                PathSegment::Index(index) => node.as_sequence()?.get(*index)?,
            };
        }
        Some(node)
    }

    /// Set the value at this path, creating intermediate nodes
    pub fn set(&self, doc: &mut Value, value: Value) -> Result<(), String> {
        let Some((last, parents)) = self.0.split_last() else {
            return Err("empty field path".to_string());
        };

        let mut node = doc;
        for (depth, segment) in parents.iter().enumerate() {
            node = step_into(node, segment, || self.prefix(depth))?;
        }
        *step_into(node, last, || self.prefix(parents.len()))? = value;
        Ok(())
    }

    fn prefix(&self, len: usize) -> String {
        let shown = FieldPath(self.0[..len].to_vec()).to_string();
        if shown.is_empty() {
            "<root>".to_string()
        } else {
            shown
        }
    }
}

fn step_into<'a>(
    node: &'a mut Value,
    segment: &PathSegment,
    location: impl Fn() -> String,
) -> Result<&'a mut Value, String> {
    match segment {
        PathSegment::Key(key) => {
            if node.is_null() {
                *node = Value::Mapping(Mapping::new());
            }
            let map = node
                .as_mapping_mut()
                .ok_or_else(|| format!("expected a mapping at {}", location()))?;
            Ok(map
                .entry(Value::String(key.clone()))
                .or_insert(Value::Null))
        }
        PathSegment::Index(index) => {
            if node.is_null() {
                *node = Value::Sequence(Vec::new());
            }
            let seq = node
                .as_sequence_mut()
                .ok_or_else(|| format!("expected a sequence at {}", location()))?;
            if *index == seq.len() {
                seq.push(Value::Null);
            }
            let len = seq.len();
            seq.get_mut(*index).ok_or_else(|| {
                format!(
                    "index {index} out of range at {} (length {len})",
                    location()
                )
            })
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// A single-field mutation of the resource with the given identity
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralPatch {
    pub id: ResId,
    pub path: FieldPath,
    pub value: Value,
}

impl StructuralPatch {
    pub fn new(id: ResId, path: FieldPath, value: impl Into<Value>) -> Self {
        Self {
            id,
            path,
            value: value.into(),
        }
    }
}
