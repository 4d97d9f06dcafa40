//! `.tmpl` rendering for fetched modules
//!
//! Files ending in `.tmpl` are Go templates rendered with the module's `opts.vars`
//! and written next to the template without the suffix. The template file itself is
//! removed so the builder never sees it.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use gtmpl::{Context, Template, Value};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{BananaError, Result};

pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Render every template below `dir`, returning the written paths
pub fn render_dir(dir: &Path, vars: &BTreeMap<String, serde_yaml::Value>) -> Result<Vec<PathBuf>> {
    let templates: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(TEMPLATE_SUFFIX) && name.len() > TEMPLATE_SUFFIX.len())
        })
        .collect();

    if templates.is_empty() {
        return Ok(Vec::new());
    }

    let context = Context::from(vars_to_gtmpl(vars));
    let mut written = Vec::with_capacity(templates.len());

    for template_path in templates {
        let source = fs::read_to_string(&template_path).map_err(|e| BananaError::FileReadFailed {
            path: template_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let rendered = render(&source, &context).map_err(|reason| BananaError::TemplateFailed {
            path: template_path.display().to_string(),
            reason,
        })?;

        let target = template_path.with_extension("");
        fs::write(&target, rendered).map_err(|e| BananaError::FileWriteFailed {
            path: target.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::remove_file(&template_path)?;

        debug!(template = %template_path.display(), output = %target.display(), "rendered template");
        written.push(target);
    }

    Ok(written)
}

fn render(source: &str, context: &Context) -> std::result::Result<String, String> {
    let mut tmpl = Template::default();
    tmpl.parse(source).map_err(|e| format!("parse error: {e}"))?;
    tmpl.render(context).map_err(|e| format!("render error: {e}"))
}

fn vars_to_gtmpl(vars: &BTreeMap<String, serde_yaml::Value>) -> Value {
    let map: HashMap<String, Value> = vars
        .iter()
        .map(|(k, v)| (k.clone(), yaml_to_gtmpl(v)))
        .collect();
    Value::Map(map)
}

/// Convert a YAML value into a template value
fn yaml_to_gtmpl(value: &serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(f.into())
            } else {
                Value::Nil
            }
        }
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(seq) => Value::Array(seq.iter().map(yaml_to_gtmpl).collect()),
        Yaml::Mapping(mapping) => {
            let map: HashMap<String, Value> = mapping
                .iter()
                .filter_map(|(k, v)| scalar_key(k).map(|key| (key, yaml_to_gtmpl(v))))
                .collect();
            Value::Map(map)
        }
        Yaml::Tagged(tagged) => yaml_to_gtmpl(&tagged.value),
    }
}

fn scalar_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
