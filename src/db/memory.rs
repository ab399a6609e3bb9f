// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store with Firestore read semantics.
//!
//! Documents are JSON objects. Reads inject the document ID under
//! `_firestore_id`, the same magic field the Firestore client fills in,
//! so models deserialize identically from both backends.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field name the Firestore client uses to expose document IDs.
pub const DOCUMENT_ID_FIELD: &str = "_firestore_id";

/// Collection name → (document ID → body).
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<String, Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id).map(|body| with_id(id, body)))
    }

    /// All documents in a collection, ordered by document ID.
    pub fn list(&self, collection: &str) -> Vec<Value> {
        self.collections
            .get(collection)
            .map(|docs| docs.iter().map(|(id, body)| with_id(id, body)).collect())
            .unwrap_or_default()
    }

    /// Documents whose `field` is the string `value`.
    pub fn query_eq(&self, collection: &str, field: &str, value: &str) -> Vec<Value> {
        self.filter(collection, |body| {
            body.get(field).and_then(Value::as_str) == Some(value)
        })
    }

    /// Documents whose array `field` contains the string `value`.
    pub fn query_array_contains(&self, collection: &str, field: &str, value: &str) -> Vec<Value> {
        self.filter(collection, |body| {
            body.get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(value)))
        })
    }

    /// Replace (or create) a document.
    pub fn set(&self, collection: &str, id: &str, body: Map<String, Value>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), body);
    }

    /// Overwrite only the given top-level fields, creating the document if needed.
    pub fn merge(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let body = docs.entry(id.to_string()).or_default();
        for (key, value) in fields {
            body.insert(key, value);
        }
    }

    pub fn delete(&self, collection: &str, id: &str) {
        if let Some(mut docs) = self.collections.get_mut(collection) {
            docs.remove(id);
        }
    }

    fn filter<F>(&self, collection: &str, predicate: F) -> Vec<Value>
    where
        F: Fn(&Map<String, Value>) -> bool,
    {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, body)| predicate(body))
                    .map(|(id, body)| with_id(id, body))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn with_id(id: &str, body: &Map<String, Value>) -> Value {
    let mut doc = body.clone();
    doc.insert(DOCUMENT_ID_FIELD.to_string(), Value::String(id.to_string()));
    Value::Object(doc)
}
