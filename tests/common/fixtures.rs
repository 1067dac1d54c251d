use serde_json::{Value, json};

pub fn paragraph(text: &str) -> Value {
    json!({ "tag": "p", "children": [text] })
}

pub fn element(tag: &str, children: Vec<Value>) -> Value {
    json!({ "tag": tag, "children": children })
}

pub fn element_with(tag: &str, attrs: Value, children: Vec<Value>) -> Value {
    json!({ "tag": tag, "attrs": attrs, "children": children })
}

pub fn cell(text: &str) -> Value {
    json!({ "tag": "td", "children": [text] })
}

pub fn row(cells: Vec<Value>) -> Value {
    element("tr", cells)
}

pub fn table(rows: Vec<Value>) -> Value {
    element("table", vec![element("tbody", rows)])
}

pub fn document(children: Vec<Value>) -> Value {
    Value::Array(children)
}
