#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use dqlgraph::{DqlError, FieldDescriptor, FieldFlags, Record, Request, Response, Transaction};
use serde_json::{Map, Value, json};

#[derive(Clone, Debug, Default)]
pub struct Product {
    pub uid: String,
    pub name: String,
    pub sku: String,
    pub tags: Vec<String>,
    pub category: String,
    pub suppliers: Vec<String>,
    pub note: Option<String>,
}

impl Record for Product {
    const TYPE_NAME: &'static str = "Product";
    const FIELDS: &'static [FieldDescriptor<Self>] = &[
        FieldDescriptor::new("Uid", "uid", |p: &Product| json!(p.uid), FieldFlags::NONE),
        FieldDescriptor::new(
            "Name",
            "name",
            |p: &Product| json!(p.name),
            FieldFlags::NONE.required().unique(),
        ),
        FieldDescriptor::new(
            "Sku",
            "sku",
            |p: &Product| json!(p.sku),
            FieldFlags::NONE.unique(),
        ),
        FieldDescriptor::new("Tags", "tags", |p: &Product| json!(p.tags), FieldFlags::NONE),
        FieldDescriptor::new(
            "Category",
            "category",
            |p: &Product| json!(p.category),
            FieldFlags::NONE.edge(),
        ),
        FieldDescriptor::new(
            "Suppliers",
            "suppliers",
            |p: &Product| json!(p.suppliers),
            FieldFlags::NONE.edge(),
        ),
        FieldDescriptor::new("Note", "note", |p: &Product| json!(p.note), FieldFlags::NONE),
    ];
}

/// A type with no unique or edge fields.
#[derive(Clone, Debug, Default)]
pub struct Note {
    pub uid: String,
    pub title: String,
}

impl Record for Note {
    const TYPE_NAME: &'static str = "Note";
    const FIELDS: &'static [FieldDescriptor<Self>] = &[
        FieldDescriptor::new("Uid", "uid", |n: &Note| json!(n.uid), FieldFlags::NONE),
        FieldDescriptor::new(
            "Title",
            "title",
            |n: &Note| json!(n.title),
            FieldFlags::NONE.required(),
        ),
    ];
}

pub fn product(name: &str) -> Product {
    Product {
        name: name.to_string(),
        ..Product::default()
    }
}

/// Records every call and replays queued responses in order.
#[derive(Default)]
pub struct ScriptedTxn {
    pub requests: Vec<Request>,
    pub queries: Vec<String>,
    responses: VecDeque<Result<Response, DqlError>>,
}

impl ScriptedTxn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_json(mut self, json: &str) -> Self {
        self.responses.push_back(Ok(Response::from_json(json)));
        self
    }

    pub fn respond_minted(mut self, uid: &str) -> Self {
        let mut uids = HashMap::new();
        uids.insert("dg.1.0".to_string(), uid.to_string());
        self.responses.push_back(Ok(Response {
            json: b"{}".to_vec(),
            uids,
        }));
        self
    }

    pub fn fail(mut self, err: DqlError) -> Self {
        self.responses.push_back(Err(err));
        self
    }

    fn next(&mut self) -> Result<Response, DqlError> {
        self.responses.pop_front().unwrap_or_else(|| Ok(Response::default()))
    }
}

impl Transaction for ScriptedTxn {
    fn query(&mut self, query: &str) -> Result<Response, DqlError> {
        self.queries.push(query.to_string());
        self.next()
    }

    fn execute(&mut self, request: &Request) -> Result<Response, DqlError> {
        self.requests.push(request.clone());
        self.next()
    }
}

#[derive(Clone, Debug)]
pub struct StoredNode {
    pub uid: String,
    pub dtype: String,
    pub values: Map<String, Value>,
}

/// Small stand-in for the server: applies guarded requests against an
/// in-memory node list. Unique predicates are read from the `eq(..)` and
/// `uid_in(..)` calls of the request query, so the guard that runs is the one
/// the builder rendered.
#[derive(Default)]
pub struct MemoryTxn {
    pub nodes: Vec<StoredNode>,
    next_uid: u64,
}

impl MemoryTxn {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            next_uid: 1,
        }
    }

    pub fn count_where(&self, dtype: &str, key: &str, value: &Value) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.dtype == dtype && node.values.get(key) == Some(value))
            .count()
    }

    pub fn node(&self, uid: &str) -> Option<&StoredNode> {
        self.nodes.iter().find(|node| node.uid == uid)
    }

    fn conflicts(
        &self,
        query: &str,
        dtype: &str,
        payload: &Map<String, Value>,
        skip: &str,
    ) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| node.dtype == dtype && node.uid != skip)
            .filter(|node| {
                payload.iter().any(|(key, value)| {
                    let guarded = query.contains(&format!("eq({key}, "))
                        || query.contains(&format!("uid_in({key}, "));
                    guarded && node.values.get(key) == Some(value)
                })
            })
            .map(|node| node.uid.clone())
            .collect()
    }

    fn guard_list(uids: &[String]) -> Value {
        Value::Array(uids.iter().map(|uid| json!({ "uid": uid })).collect())
    }
}

fn parse_object(bytes: &Option<Vec<u8>>) -> Option<Map<String, Value>> {
    let bytes = bytes.as_ref()?;
    match serde_json::from_slice(bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn between<'a>(text: &'a str, open: &str, close: char) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text[start..].find(close)? + start;
    Some(&text[start..end])
}

impl Transaction for MemoryTxn {
    fn query(&mut self, query: &str) -> Result<Response, DqlError> {
        let dtype = between(query, "type(", ')').unwrap_or_default();
        let target = between(query, "@filter(uid(", ')');
        let data: Vec<Value> = self
            .nodes
            .iter()
            .filter(|node| node.dtype == dtype)
            .filter(|node| target.is_none_or(|uid| node.uid == uid))
            .map(|node| {
                let mut values = node.values.clone();
                values.insert("uid".into(), Value::String(node.uid.clone()));
                Value::Object(values)
            })
            .collect();
        Ok(Response::from_json(json!({ "data": data }).to_string()))
    }

    fn execute(&mut self, request: &Request) -> Result<Response, DqlError> {
        let set = request.mutations.iter().find_map(|m| parse_object(&m.set_json));
        let delete = request.mutations.iter().find_map(|m| parse_object(&m.delete_json));
        let query = request.query.as_str();

        match (set, delete) {
            (Some(payload), edge_delete) if payload.contains_key("uid") => {
                let dtype = payload["dgraph.type"].as_str().unwrap_or_default().to_string();
                let uid = payload["uid"].as_str().unwrap_or_default().to_string();
                let me: Vec<String> = self
                    .nodes
                    .iter()
                    .filter(|node| node.uid == uid && node.dtype == dtype)
                    .map(|node| node.uid.clone())
                    .collect();
                let other = self.conflicts(query, &dtype, &payload, &uid);
                if me.len() == 1 && other.is_empty() {
                    let node = self
                        .nodes
                        .iter_mut()
                        .find(|node| node.uid == uid)
                        .expect("guarded node");
                    if let Some(edges) = edge_delete {
                        for key in edges.keys().filter(|key| *key != "uid") {
                            node.values.remove(key);
                        }
                    }
                    for (key, value) in payload {
                        if key != "uid" && key != "dgraph.type" {
                            node.values.insert(key, value);
                        }
                    }
                }
                let json = json!({
                    "me": Self::guard_list(&me),
                    "other": Self::guard_list(&other),
                });
                Ok(Response::from_json(json.to_string()))
            }
            (Some(payload), _) => {
                let dtype = payload["dgraph.type"].as_str().unwrap_or_default().to_string();
                if !self.conflicts(query, &dtype, &payload, "").is_empty() {
                    return Ok(Response::from_json("{}"));
                }
                let uid = format!("0x{:x}", self.next_uid);
                self.next_uid += 1;
                let mut values = payload;
                values.remove("dgraph.type");
                self.nodes.push(StoredNode {
                    uid: uid.clone(),
                    dtype,
                    values,
                });
                let mut uids = HashMap::new();
                uids.insert("dg.1.0".to_string(), uid);
                Ok(Response {
                    json: b"{}".to_vec(),
                    uids,
                })
            }
            (None, Some(target)) => {
                let dtype = between(query, "type(", ')').unwrap_or_default().to_string();
                let uid = target["uid"].as_str().unwrap_or_default().to_string();
                let exist: Vec<String> = self
                    .nodes
                    .iter()
                    .filter(|node| node.uid == uid && node.dtype == dtype)
                    .map(|node| node.uid.clone())
                    .collect();
                if exist.len() == 1 {
                    self.nodes.retain(|node| node.uid != uid);
                }
                Ok(Response::from_json(
                    json!({ "exist": Self::guard_list(&exist) }).to_string(),
                ))
            }
            (None, None) => Err(DqlError::transport("empty request")),
        }
    }
}
