//! # covenant-schema
//!
//! Runtime validation schemas for contract-driven routes.
//!
//! A [`Schema`] is a closed tree of node kinds built with the free builder
//! functions ([`object`], [`string`], [`array`], ...). The same tree is used
//! to match incoming values, to project JSON-Schema for OpenAPI documents,
//! and to coerce string-typed request parts.
//!
//! ```
//! use covenant_schema::{enumeration, object, uuid};
//! use serde_json::json;
//!
//! let body = object([("hello", enumeration(["hi", "hello"]))]);
//! let params = object([("id", uuid())]);
//!
//! assert!(body.matches(&json!({ "hello": "hi" })));
//! assert!(!params.matches(&json!({ "id": "nope" })));
//! ```

pub mod coerce;
pub mod error;
pub mod json;
pub mod matching;
pub mod schema;

pub use error::{issues_to_json, ValidationIssue};
pub use json::{definition_ref, DEFINITIONS_PREFIX};
pub use schema::{
    array, boolean, enumeration, hashmap, integer, iso_date, lazy, named, number, object,
    object_with_only, one_of, string, string_enum, url, uuid, ArrayRules, BooleanRules,
    EnumRules, LazySchema, NumberRules, ObjectRules, Schema, SchemaKind, StringFormat,
    StringRules,
};
