//! Kubernetes resource model
//!
//! A **Resource** is one YAML document with `apiVersion`, `kind` and `metadata.name`.
//! A **ResourceSet** is the ordered result of composing a module, unique by [`ResId`].
//!
//! ## Module Organization
//!
//! - `gvk.rs`: group/version/kind and resource identity
//! - `patch.rs`: field paths and identity-keyed structural patches

pub mod gvk;
pub mod patch;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{BananaError, Result};

pub use gvk::{Gvk, ResId};
pub use patch::{FieldPath, PathSegment, StructuralPatch};

/// Kinds that never carry a namespace
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "APIService",
    "ClusterIssuer",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "IngressClass",
    "MutatingWebhookConfiguration",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PriorityClass",
    "StorageClass",
    "ValidatingWebhookConfiguration",
];

/// A single Kubernetes resource document
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    doc: Value,
}

impl Resource {
    /// Wrap a parsed document, checking it has the fields every resource needs
    pub fn from_value(doc: Value) -> std::result::Result<Self, String> {
        let Some(map) = doc.as_mapping() else {
            return Err("resource document is not a mapping".to_string());
        };
        for field in ["apiVersion", "kind"] {
            if map.get(field).and_then(Value::as_str).is_none_or(str::is_empty) {
                return Err(format!("resource is missing '{field}'"));
            }
        }
        let name = map
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str);
        if name.is_none_or(str::is_empty) {
            return Err("resource is missing 'metadata.name'".to_string());
        }
        Ok(Self { doc })
    }

    /// Parse a single YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(doc).map_err(|reason| BananaError::CompositionFailed {
            path: "<inline>".to_string(),
            reason,
        })
    }

    fn str_field(&self, path: &[&str]) -> &str {
        let mut node = &self.doc;
        for key in path {
            match node.get(*key) {
                Some(next) => node = next,
                None => return "",
            }
        }
        node.as_str().unwrap_or_default()
    }

    pub fn api_version(&self) -> &str {
        self.str_field(&["apiVersion"])
    }

    pub fn kind(&self) -> &str {
        self.str_field(&["kind"])
    }

    pub fn name(&self) -> &str {
        self.str_field(&["metadata", "name"])
    }

    pub fn namespace(&self) -> &str {
        self.str_field(&["metadata", "namespace"])
    }

    pub fn gvk(&self) -> Gvk {
        Gvk::from_api_version(self.api_version(), self.kind())
    }

    pub fn id(&self) -> ResId {
        ResId::new(self.gvk(), self.namespace(), self.name())
    }

    pub fn is_cluster_scoped(&self) -> bool {
        CLUSTER_SCOPED_KINDS.contains(&self.kind())
    }

    pub fn value(&self) -> &Value {
        &self.doc
    }

    pub(crate) fn value_mut(&mut self) -> &mut Value {
        &mut self.doc
    }

    pub fn into_value(self) -> Value {
        self.doc
    }

    /// Read a field
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.doc)
    }

    /// Set a field, creating intermediate nodes
    pub fn set(&mut self, path: &FieldPath, value: Value) -> std::result::Result<(), String> {
        path.set(&mut self.doc, value)
    }

    pub fn set_namespace(&mut self, namespace: &str) -> std::result::Result<(), String> {
        self.set(&FieldPath::parse("metadata.namespace"), Value::from(namespace))
    }

    /// Merge labels into `metadata.labels`, overwriting existing keys
    pub fn add_labels<'a>(
        &mut self,
        labels: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> std::result::Result<(), String> {
        for (key, value) in labels {
            let path = FieldPath::new().key("metadata").key("labels").key(key.as_str());
            self.set(&path, Value::from(value.as_str()))?;
        }
        Ok(())
    }

    /// `<kind>_<name>.yaml`, lower-cased
    pub fn file_name(&self) -> String {
        format!("{}_{}.yaml", self.kind(), self.name()).to_lowercase()
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.doc).map_err(|e| BananaError::ExportFailed {
            path: self.id().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Parse a multi-document YAML stream into resources
///
/// Empty documents are skipped; `origin` names the source in error messages.
pub fn parse_documents(content: &str, origin: &str) -> Result<Vec<Resource>> {
    let composition_error = |reason: String| BananaError::CompositionFailed {
        path: origin.to_string(),
        reason,
    };

    let mut resources = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let doc = Value::deserialize(document).map_err(|e| composition_error(e.to_string()))?;
        if doc.is_null() {
            continue;
        }
        // `kind: List` documents carry their resources in `items`
        if doc.get("kind").and_then(Value::as_str) == Some("List") {
            let items = doc
                .get("items")
                .and_then(Value::as_sequence)
                .cloned()
                .unwrap_or_default();
            for item in items {
                resources.push(Resource::from_value(item).map_err(composition_error)?);
            }
            continue;
        }
        resources.push(Resource::from_value(doc).map_err(composition_error)?);
    }
    Ok(resources)
}

/// Ordered set of resources, unique by identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSet {
    resources: Vec<Resource>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        self.resources.iter_mut()
    }

    /// Append a resource; an identity already present is returned as the error
    pub fn push(&mut self, resource: Resource) -> std::result::Result<(), ResId> {
        let id = resource.id();
        if self.contains(&id) {
            return Err(id);
        }
        self.resources.push(resource);
        Ok(())
    }

    /// Append every resource of `other`, stopping at the first duplicate
    pub fn append(&mut self, other: ResourceSet) -> std::result::Result<(), ResId> {
        for resource in other.resources {
            self.push(resource)?;
        }
        Ok(())
    }

    pub fn contains(&self, id: &ResId) -> bool {
        self.resources.iter().any(|r| &r.id() == id)
    }

    pub fn get(&self, id: &ResId) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.id() == id)
    }

    pub fn get_mut(&mut self, id: &ResId) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| &r.id() == id)
    }

    /// Find the first resource with the given kind and name, ignoring group and namespace
    pub(crate) fn find_by_kind_name_mut(&mut self, kind: &str, name: &str) -> Option<&mut Resource> {
        self.resources
            .iter_mut()
            .find(|r| r.kind() == kind && r.name() == name)
    }

    /// Identities of all resources matching a group/version/kind
    pub fn ids_matching(&self, gvk: &Gvk) -> Vec<ResId> {
        self.resources
            .iter()
            .filter(|r| &r.gvk() == gvk)
            .map(Resource::id)
            .collect()
    }

    /// Stable sort by a key function
    pub(crate) fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&Resource) -> K) {
        self.resources.sort_by_key(key);
    }

    /// Serialize as one multi-document YAML stream
    pub fn to_yaml_stream(&self) -> Result<String> {
        let docs = self
            .resources
            .iter()
            .map(Resource::to_yaml)
            .collect::<Result<Vec<_>>>()?;
        Ok(docs.join("---\n"))
    }
}

impl IntoIterator for ResourceSet {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}
