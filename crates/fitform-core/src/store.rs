#![forbid(unsafe_code)]

//! Form data store contract and an in-memory JSON implementation.
//!
//! The editor treats the form tree as an external collaborator with exactly
//! two operations: read the value at a path, and write a value at a path.
//! Collection writes are always whole arrays; the editor never patches a
//! single index through the store.
//!
//! # Failure Modes
//!
//! | Condition | `get` | `set` |
//! |-----------|-------|-------|
//! | Intermediate segment missing | `None` | `Err(Unresolved)` |
//! | Key used on an array (or index on an object) | `None` | `Err(TypeMismatch)` at the leaf, `Err(Unresolved)` above it |
//! | Leaf index past `len` | `None` | `Err(IndexOutOfBounds)` |
//! | Empty path | whole tree | `Err(RootWrite)` |

use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, PathSegment};

/// Read/write access to the hierarchical form tree.
pub trait FormDataStore {
    /// Value at `path`, if the path resolves.
    fn get(&self, path: &CollectionPath) -> Option<Value>;

    /// Replace the value at `path`.
    fn set(&mut self, path: &CollectionPath, value: Value) -> StoreResult<()>;

    /// Array at `path`, if the path resolves to an array.
    fn get_array(&self, path: &CollectionPath) -> Option<Vec<Value>> {
        match self.get(path)? {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// In-memory store over a single `serde_json::Value` tree.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonFormStore {
    root: Value,
}

impl Default for JsonFormStore {
    fn default() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }
}

impl JsonFormStore {
    /// Wrap an existing form tree.
    #[must_use]
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Borrow the whole tree.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Consume the store and return the tree.
    #[must_use]
    pub fn into_inner(self) -> Value {
        self.root
    }

    fn lookup(&self, path: &CollectionPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(&self.root, |node, segment| match segment {
                PathSegment::Key(k) => node.as_object()?.get(k),
                PathSegment::Index(i) => node.as_array()?.get(*i),
            })
    }

    fn lookup_mut(&mut self, segments: &[PathSegment]) -> Option<&mut Value> {
        segments
            .iter()
            .try_fold(&mut self.root, |node, segment| match segment {
                PathSegment::Key(k) => node.as_object_mut()?.get_mut(k),
                PathSegment::Index(i) => node.as_array_mut()?.get_mut(*i),
            })
    }
}

impl FormDataStore for JsonFormStore {
    fn get(&self, path: &CollectionPath) -> Option<Value> {
        self.lookup(path).cloned()
    }

    fn set(&mut self, path: &CollectionPath, value: Value) -> StoreResult<()> {
        let Some((leaf, parent)) = path.segments().split_last() else {
            return Err(StoreError::RootWrite);
        };
        let node = self
            .lookup_mut(parent)
            .ok_or_else(|| StoreError::unresolved(path))?;

        match leaf {
            PathSegment::Key(k) => {
                let Some(map) = node.as_object_mut() else {
                    return Err(StoreError::TypeMismatch {
                        path: path.clone(),
                        expected: "object",
                    });
                };
                map.insert(k.clone(), value);
                Ok(())
            }
            PathSegment::Index(i) => {
                let Some(items) = node.as_array_mut() else {
                    return Err(StoreError::TypeMismatch {
                        path: path.clone(),
                        expected: "array",
                    });
                };
                let length = items.len();
                if *i < length {
                    items[*i] = value;
                    Ok(())
                } else if *i == length {
                    items.push(value);
                    Ok(())
                } else {
                    Err(StoreError::IndexOutOfBounds {
                        path: path.clone(),
                        index: *i,
                        length,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpath;
    use serde_json::json;

    fn workout() -> JsonFormStore {
        JsonFormStore::new(json!({
            "name": "Leg day",
            "exerciseList": [{"id": 1}, {"id": 2}],
            "groups": [
                {"title": "warmup", "exercises": [{"id": 10}]},
            ],
        }))
    }

    #[test]
    fn get_walks_keys_and_indices() {
        let store = workout();
        assert_eq!(store.get(&cpath!["name"]), Some(json!("Leg day")));
        assert_eq!(
            store.get(&cpath!["groups", 0usize, "exercises", 0usize, "id"]),
            Some(json!(10))
        );
        assert_eq!(store.get(&cpath!["groups", 1usize]), None);
        assert_eq!(store.get(&cpath!["name", 0usize]), None);
        assert_eq!(store.get(&CollectionPath::root()), Some(store.root().clone()));
    }

    #[test]
    fn get_array_rejects_scalars() {
        let store = workout();
        assert_eq!(store.get_array(&cpath!["exerciseList"]).map(|a| a.len()), Some(2));
        assert!(store.get_array(&cpath!["name"]).is_none());
    }

    #[test]
    fn set_replaces_whole_array() {
        let mut store = workout();
        store
            .set(&cpath!["exerciseList"], json!([{"id": 3}]))
            .unwrap();
        assert_eq!(store.get(&cpath!["exerciseList"]), Some(json!([{"id": 3}])));
    }

    #[test]
    fn set_creates_missing_leaf_key() {
        let mut store = workout();
        store
            .set(&cpath!["groups", 0usize, "notes"], json!("easy"))
            .unwrap();
        assert_eq!(store.get(&cpath!["groups", 0usize, "notes"]), Some(json!("easy")));
    }

    #[test]
    fn set_index_appends_at_len_only() {
        let mut store = workout();
        store.set(&cpath!["groups", 1usize], json!({"title": "main"})).unwrap();
        assert_eq!(store.get_array(&cpath!["groups"]).map(|g| g.len()), Some(2));

        let err = store
            .set(&cpath!["groups", 5usize], json!({}))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::IndexOutOfBounds {
                path: cpath!["groups", 5usize],
                index: 5,
                length: 2,
            }
        );
    }

    #[test]
    fn set_under_missing_parent_is_unresolved() {
        let mut store = workout();
        let path = cpath!["groups", 3usize, "exercises"];
        assert_eq!(
            store.set(&path, json!([])),
            Err(StoreError::Unresolved { path })
        );
    }

    #[test]
    fn set_type_mismatch_and_root() {
        let mut store = workout();
        assert!(matches!(
            store.set(&cpath!["exerciseList", "x"], json!(1)),
            Err(StoreError::TypeMismatch { expected: "object", .. })
        ));
        assert_eq!(
            store.set(&CollectionPath::root(), json!({})),
            Err(StoreError::RootWrite)
        );
    }
}
