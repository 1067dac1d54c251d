//! Building a source tree from its JSON description.
//!
//! A JSON string is a text node; an object `{ "tag", "attrs", "children" }`
//! is an element. The top level is either one such node list, or an object
//! with a `children` list; either way the result is rooted at `body`.

use crate::error::QuireError;
use quire_dom::{Document, NodeId, SourceTree};
use serde_json::Value;
use std::path::Path;

pub fn load_document(json: &Value) -> Result<SourceTree, QuireError> {
    let mut doc = Document::new("body");
    let root = doc.root();
    let children = match json {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("children") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => return Err(invalid("children must be an array", other)),
            None => &[],
        },
        other => return Err(invalid("document must be an array or an object", other)),
    };
    for child in children {
        append(&mut doc, root, child)?;
    }
    Ok(SourceTree::new(doc)?)
}

pub fn load_document_str(json: &str) -> Result<SourceTree, QuireError> {
    let value: Value = serde_json::from_str(json)?;
    load_document(&value)
}

pub fn load_document_path(path: impl AsRef<Path>) -> Result<SourceTree, QuireError> {
    let path = path.as_ref();
    log::debug!("Loading document from {}", path.display());
    let json = std::fs::read_to_string(path)?;
    load_document_str(&json)
}

fn invalid(message: &str, value: &Value) -> QuireError {
    QuireError::Document(format!("{}, got {}", message, value))
}

fn append(doc: &mut Document, parent: NodeId, value: &Value) -> Result<(), QuireError> {
    match value {
        Value::String(text) => {
            doc.append_text(parent, text.as_str())?;
        }
        Value::Object(map) => {
            let tag = match map.get("tag") {
                Some(Value::String(tag)) if !tag.is_empty() => tag.to_ascii_lowercase(),
                Some(other) => return Err(invalid("tag must be a non-empty string", other)),
                None => return Err(invalid("element needs a tag", value)),
            };
            let node = doc.append_element(parent, &tag)?;
            if let Some(attrs) = map.get("attrs") {
                let Value::Object(attrs) = attrs else {
                    return Err(invalid("attrs must be an object", attrs));
                };
                for (name, attr) in attrs {
                    let attr = match attr {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        other => return Err(invalid("attribute values must be scalars", other)),
                    };
                    doc.set_attr(node, name, attr);
                }
            }
            match map.get("children") {
                Some(Value::Array(children)) => {
                    for child in children {
                        append(doc, node, child)?;
                    }
                }
                Some(other) => return Err(invalid("children must be an array", other)),
                None => {}
            }
        }
        other => return Err(invalid("a node must be a string or an object", other)),
    }
    Ok(())
}
