//! Strategic-merge style document merging for patch files
//!
//! Mappings merge key by key and a `null` value deletes the key. Lists whose items are all
//! mappings with a `name` (containers, ports, env) merge item by item on that name; any
//! other list is replaced wholesale.

use serde_yaml::{Sequence, Value};

/// Merge `patch` into `base` in place
pub fn merge_into(base: &mut Value, patch: Value) {
    match patch {
        Value::Mapping(source) => {
            if let Value::Mapping(target) = base {
                for (key, value) in source {
                    if value.is_null() {
                        target.remove(&key);
                    } else if let Some(existing) = target.get_mut(&key) {
                        merge_into(existing, value);
                    } else {
                        target.insert(key, value);
                    }
                }
            } else {
                *base = Value::Mapping(source);
            }
        }
        Value::Sequence(items) => {
            if let Value::Sequence(target) = base {
                if is_named_list(target) && is_named_list(&items) {
                    merge_named_items(target, items);
                    return;
                }
            }
            *base = Value::Sequence(items);
        }
        other => *base = other,
    }
}

fn item_name(item: &Value) -> Option<&str> {
    item.as_mapping()?.get("name")?.as_str()
}

fn is_named_list(items: &Sequence) -> bool {
    !items.is_empty() && items.iter().all(|item| item_name(item).is_some())
}

fn merge_named_items(target: &mut Sequence, items: Sequence) {
    for item in items {
        let name = item_name(&item).map(str::to_string);
        let existing = target
            .iter_mut()
            .find(|candidate| item_name(candidate).map(str::to_string) == name);
        match existing {
            Some(existing) => merge_into(existing, item),
            None => target.push(item),
        }
    }
}
