//! Property-based tests for typed paths and the JSON store.
//!
//! 1. **Path structure**: `child_*` then `parent` is the identity, and a
//!    child always starts with its parent.
//! 2. **Index rewrite**: `with_index_at` changes exactly one segment.
//! 3. **Leaf index writes**: writing at `i < len` replaces, `i == len`
//!    appends, `i > len` fails and leaves the tree untouched.

use fitform_core::{CollectionPath, FormDataStore, JsonFormStore, PathSegment, StoreError};
use proptest::prelude::*;
use serde_json::{Value, json};

fn segment_strategy() -> impl Strategy<Value = PathSegment> {
    prop_oneof![
        "[a-zA-Z]{1,8}".prop_map(PathSegment::Key),
        (0usize..16).prop_map(PathSegment::Index),
    ]
}

fn path_strategy() -> impl Strategy<Value = CollectionPath> {
    prop::collection::vec(segment_strategy(), 0..6).prop_map(|segments| CollectionPath::new(segments))
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Path structure
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn child_then_parent_is_identity(path in path_strategy(), key in "[a-z]{1,6}", index in 0usize..32) {
        let by_key = path.child_key(key.clone());
        let by_index = path.child_index(index);

        let by_key_parent = by_key.parent();
        let by_index_parent = by_index.parent();
        prop_assert_eq!(by_key_parent.as_ref(), Some(&path));
        prop_assert_eq!(by_index_parent.as_ref(), Some(&path));
        prop_assert!(by_key.starts_with(&path));
        prop_assert_eq!(by_index.len(), path.len() + 1);
        prop_assert_eq!(by_index.index_at(path.len()), Some(index));
        prop_assert_eq!(by_key.last().and_then(PathSegment::as_key), Some(key.as_str()));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2. Index rewrite
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn with_index_at_touches_one_segment(path in path_strategy(), depth in 0usize..6, index in 0usize..32) {
        match path.with_index_at(depth, index) {
            Some(rewritten) => {
                prop_assert!(matches!(path.segments()[depth], PathSegment::Index(_)));
                prop_assert_eq!(rewritten.len(), path.len());
                for (i, (a, b)) in path.segments().iter().zip(rewritten.segments()).enumerate() {
                    if i == depth {
                        prop_assert_eq!(b, &PathSegment::Index(index));
                    } else {
                        prop_assert_eq!(a, b);
                    }
                }
            }
            None => prop_assert!(path.index_at(depth).is_none()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Leaf index writes
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn leaf_index_writes(len in 0usize..8, at in 0usize..12) {
        let items: Vec<Value> = (0..len).map(|i| json!(i)).collect();
        let mut store = JsonFormStore::new(json!({ "list": items }));
        let before = store.clone();
        let path = CollectionPath::key("list").child_index(at);

        let result = store.set(&path, json!("new"));
        let after = store.get_array(&CollectionPath::key("list")).unwrap_or_default();

        if at < len {
            prop_assert!(result.is_ok());
            prop_assert_eq!(after.len(), len);
            prop_assert_eq!(&after[at], &json!("new"));
        } else if at == len {
            prop_assert!(result.is_ok());
            prop_assert_eq!(after.len(), len + 1);
            prop_assert_eq!(after.last(), Some(&json!("new")));
        } else {
            prop_assert_eq!(
                result,
                Err(StoreError::IndexOutOfBounds { path, index: at, length: len })
            );
            prop_assert_eq!(store, before);
        }
    }
}
