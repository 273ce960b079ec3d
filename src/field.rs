//! Record classification. Each record type declares a descriptor table once;
//! classification walks it and splits the record into data, unique-check and
//! edge fields.

use serde_json::{Map, Value};

use crate::{
    dql::{self, Filter},
    errors::DqlError,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldFlags {
    pub required: bool,
    pub unique: bool,
    pub edge: bool,
}

impl FieldFlags {
    pub const NONE: FieldFlags = FieldFlags {
        required: false,
        unique: false,
        edge: false,
    };

    pub const fn required(self) -> Self {
        FieldFlags {
            required: true,
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        FieldFlags {
            unique: true,
            ..self
        }
    }

    pub const fn edge(self) -> Self {
        FieldFlags {
            edge: true,
            ..self
        }
    }
}

pub struct FieldDescriptor<T> {
    pub name: &'static str,
    pub external_name: &'static str,
    pub extract: fn(&T) -> Value,
    pub flags: FieldFlags,
}

impl<T> FieldDescriptor<T> {
    pub const fn new(
        name: &'static str,
        external_name: &'static str,
        extract: fn(&T) -> Value,
        flags: FieldFlags,
    ) -> Self {
        Self {
            name,
            external_name,
            extract,
            flags,
        }
    }
}

/// A record type stored as one Dgraph type.
///
/// ```
/// use dqlgraph::field::{FieldDescriptor, FieldFlags, Record};
/// use serde_json::Value;
///
/// struct Tag {
///     uid: String,
///     label: String,
/// }
///
/// impl Record for Tag {
///     const TYPE_NAME: &'static str = "Tag";
///     const FIELDS: &'static [FieldDescriptor<Self>] = &[
///         FieldDescriptor::new(
///             "Uid",
///             "uid",
///             |t: &Tag| Value::from(t.uid.clone()),
///             FieldFlags::NONE,
///         ),
///         FieldDescriptor::new(
///             "Label",
///             "label",
///             |t: &Tag| Value::from(t.label.clone()),
///             FieldFlags::NONE.required().unique(),
///         ),
///     ];
/// }
/// ```
pub trait Record: Sized + 'static {
    const TYPE_NAME: &'static str;
    const FIELDS: &'static [FieldDescriptor<Self>];
}

/// A classified value. Both the mutation payload and the filter expression
/// are rendered from the same literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Text(String),
    TextList(Vec<String>),
    Edge(String),
    EdgeList(Vec<String>),
}

impl Literal {
    pub fn to_json(&self) -> Value {
        match self {
            Literal::Text(value) => Value::String(value.clone()),
            Literal::TextList(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
            Literal::Edge(uid) => uid_object(uid),
            Literal::EdgeList(uids) => Value::Array(uids.iter().map(|u| uid_object(u)).collect()),
        }
    }

    /// Equality predicate against `key`: `eq` for values, `uid_in` for edges.
    pub fn filter(&self, key: &str) -> Result<Filter, DqlError> {
        match self {
            Literal::Text(value) => Filter::eq_text(key, value),
            Literal::TextList(_) => Filter::func("eq", key, self.to_json().to_string()),
            Literal::Edge(uid) => Filter::func("uid_in", key, uid.clone()),
            Literal::EdgeList(uids) => {
                Filter::func("uid_in", key, format!("[{}]", uids.join(", ")))
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text(value) => Some(value),
            _ => None,
        }
    }
}

fn uid_object(uid: &str) -> Value {
    let mut map = Map::new();
    map.insert("uid".to_string(), Value::String(uid.to_string()));
    Value::Object(map)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub value: Literal,
}

impl Field {
    fn new(key: &str, value: Literal) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classified {
    pub data: Option<Field>,
    pub unique: Option<Field>,
    pub edge: Option<Field>,
}

pub fn classify_field(
    name: &str,
    external_name: &str,
    value: &Value,
    flags: FieldFlags,
) -> Result<Classified, DqlError> {
    dql::ident(external_name)?;
    let literal = match value {
        Value::Null => {
            if flags.required {
                return Err(DqlError::validation(name));
            }
            return Ok(Classified::default());
        }
        Value::String(text) if text.is_empty() => {
            if flags.required {
                return Err(DqlError::validation(name));
            }
            return Ok(Classified {
                data: Some(Field::new(external_name, Literal::Text(String::new()))),
                ..Classified::default()
            });
        }
        Value::String(text) => {
            if flags.edge {
                Literal::Edge(dql::uid(text)?.to_string())
            } else {
                Literal::Text(text.clone())
            }
        }
        Value::Array(items) if items.is_empty() => {
            if flags.required {
                return Err(DqlError::validation(name));
            }
            return Ok(Classified::default());
        }
        Value::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(text) if flags.edge => values.push(dql::uid(text)?.to_string()),
                    Value::String(text) => values.push(text.clone()),
                    _ => return Err(DqlError::unsupported_type(name)),
                }
            }
            if flags.edge {
                Literal::EdgeList(values)
            } else {
                Literal::TextList(values)
            }
        }
        _ => return Err(DqlError::unsupported_type(name)),
    };

    let field = Field::new(external_name, literal);
    Ok(Classified {
        unique: flags.unique.then(|| field.clone()),
        edge: flags.edge.then(|| field.clone()),
        data: Some(field),
    })
}
