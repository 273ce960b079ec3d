//! Seam between the query builders and the database client. Implementors own
//! the connection, cancellation and timeouts; every builder operation issues
//! exactly one call through this trait.

use std::collections::HashMap;

use serde::{Deserialize, de::DeserializeOwned};

use crate::errors::DqlError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mutation {
    pub cond: Option<String>,
    pub set_json: Option<Vec<u8>>,
    pub delete_json: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    pub commit_now: bool,
    pub query: String,
    pub mutations: Vec<Mutation>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    pub json: Vec<u8>,
    /// Blank-node names mapped to the uids minted by the mutation.
    pub uids: HashMap<String, String>,
}

impl Response {
    pub fn from_json(json: impl Into<Vec<u8>>) -> Self {
        Self {
            json: json.into(),
            uids: HashMap::new(),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DqlError> {
        if self.json.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_slice(&self.json)?)
    }
}

pub trait Transaction {
    fn query(&mut self, query: &str) -> Result<Response, DqlError>;
    fn execute(&mut self, request: &Request) -> Result<Response, DqlError>;
}

impl<T: Transaction + ?Sized> Transaction for &mut T {
    fn query(&mut self, query: &str) -> Result<Response, DqlError> {
        (**self).query(query)
    }

    fn execute(&mut self, request: &Request) -> Result<Response, DqlError> {
        (**self).execute(request)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UidRef {
    pub uid: String,
}

/// Guard variables of an update request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UniqueCheck {
    #[serde(default)]
    pub me: Vec<UidRef>,
    #[serde(default)]
    pub other: Vec<UidRef>,
}

/// Guard variable of a delete request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExistCheck {
    #[serde(default)]
    pub exist: Vec<UidRef>,
}
