//! Guarded create, update and delete. Each operation is one request whose
//! mutations only fire when the server-side guard variables allow it, so the
//! uniqueness and existence checks never race the write.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    dql::{self, Filter},
    errors::DqlError,
    field::{Field, Record, classify_field},
    txn::{ExistCheck, Mutation, Request, Transaction, UniqueCheck},
};

const TYPE_PREDICATE: &str = "dgraph.type";
const UID_KEY: &str = "uid";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordModel {
    type_name: String,
    fields: Vec<Field>,
    unique_fields: Vec<Field>,
    edge_fields: Vec<Field>,
    /// Every predicate the type declares as an edge, set or not.
    edge_keys: Vec<String>,
}

impl RecordModel {
    pub fn from_record<R: Record>(record: &R) -> Result<Self, DqlError> {
        let type_name = dql::ident(R::TYPE_NAME)?.to_string();
        let mut fields = Vec::new();
        let mut unique_fields = Vec::new();
        let mut edge_fields = Vec::new();
        let mut edge_keys = Vec::new();
        for descriptor in R::FIELDS {
            let value = (descriptor.extract)(record);
            let classified = classify_field(
                descriptor.name,
                descriptor.external_name,
                &value,
                descriptor.flags,
            )?;
            fields.extend(classified.data);
            unique_fields.extend(classified.unique);
            edge_fields.extend(classified.edge);
            if descriptor.flags.edge {
                edge_keys.push(descriptor.external_name.to_string());
            }
        }
        Ok(Self {
            type_name,
            fields,
            unique_fields,
            edge_fields,
            edge_keys,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn unique_fields(&self) -> &[Field] {
        &self.unique_fields
    }

    pub fn edge_fields(&self) -> &[Field] {
        &self.edge_fields
    }

    /// The non-empty `uid` data field, if the record carries one.
    pub fn uid(&self) -> Option<&str> {
        self.fields
            .iter()
            .filter(|field| field.key == UID_KEY)
            .find_map(|field| field.value.as_text())
            .filter(|uid| !uid.is_empty())
    }

    /// Disjunction of equality predicates over the unique fields, `None` when
    /// the type declares none.
    pub fn unique_filter(&self) -> Result<Option<Filter>, DqlError> {
        if self.unique_fields.is_empty() {
            return Ok(None);
        }
        let parts = self
            .unique_fields
            .iter()
            .map(|field| field.value.filter(&field.key))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Filter::Or(parts)))
    }

    pub fn set_json(&self) -> Result<Vec<u8>, DqlError> {
        let mut map = Map::new();
        map.insert(
            TYPE_PREDICATE.to_string(),
            Value::String(self.type_name.clone()),
        );
        for field in &self.fields {
            if field.key == UID_KEY && field.value.as_text() == Some("") {
                continue;
            }
            map.insert(field.key.clone(), field.value.to_json());
        }
        let payload = Value::Object(map);
        debug!(%payload, "dql.model.set_json");
        Ok(serde_json::to_vec(&payload)?)
    }

    /// Clears every declared edge predicate on the node bound to `myId`,
    /// including edges the record leaves empty.
    pub fn edge_delete_json(&self) -> Result<Option<Vec<u8>>, DqlError> {
        if self.edge_keys.is_empty() {
            return Ok(None);
        }
        let mut map = Map::new();
        map.insert(UID_KEY.to_string(), Value::String("uid(myId)".to_string()));
        for key in &self.edge_keys {
            map.insert(key.clone(), Value::Null);
        }
        Ok(Some(serde_json::to_vec(&Value::Object(map))?))
    }

    pub fn create_request(&self, commit_now: bool) -> Result<Request, DqlError> {
        let mut mutation = Mutation {
            set_json: Some(self.set_json()?),
            ..Mutation::default()
        };
        let mut query = String::new();
        if let Some(filter) = self.unique_filter()? {
            let root = dql::type_root(&self.type_name)?;
            query = dql::document(&[dql::block("data", &root, &[], &filter, "v as uid")]);
            mutation.cond = Some("@if(eq(len(v), 0))".to_string());
        }
        Ok(Request {
            commit_now,
            query,
            mutations: vec![mutation],
        })
    }

    pub fn update_request(&self, commit_now: bool) -> Result<Request, DqlError> {
        let uid = match self.uid() {
            Some(uid) => dql::uid(uid)?,
            None => return Err(DqlError::validation(UID_KEY)),
        };
        let root = dql::type_root(&self.type_name)?;
        let mut blocks = vec![dql::block(
            "me",
            &root,
            &[],
            &Filter::uid(uid)?,
            "myId as uid",
        )];
        let mut cond = "@if(eq(len(myId), 1))".to_string();
        if let Some(unique) = self.unique_filter()? {
            let filter = Filter::And(vec![unique, Filter::not(Filter::uid(uid)?)]);
            blocks.push(dql::block("other", &root, &[], &filter, "otherId as uid"));
            cond = "@if(eq(len(myId), 1) and eq(len(otherId), 0))".to_string();
        }

        let mut mutations = Vec::with_capacity(2);
        if let Some(delete_json) = self.edge_delete_json()? {
            mutations.push(Mutation {
                cond: Some(cond.clone()),
                delete_json: Some(delete_json),
                ..Mutation::default()
            });
        }
        mutations.push(Mutation {
            cond: Some(cond),
            set_json: Some(self.set_json()?),
            ..Mutation::default()
        });
        Ok(Request {
            commit_now,
            query: dql::document(&blocks),
            mutations,
        })
    }

    /// Inserts the record unless another record of the type already holds one
    /// of its unique values.
    pub fn create<T: Transaction + ?Sized>(
        &self,
        txn: &mut T,
        commit_now: bool,
    ) -> Result<(), DqlError> {
        let request = self.create_request(commit_now)?;
        debug!(query = %request.query, "dql.create.request");
        let response = txn.execute(&request)?;
        if response.uids.is_empty() {
            warn!(dtype = %self.type_name, "dql.create.exists");
            return Err(DqlError::already_exists(self.type_name.as_str()));
        }
        Ok(())
    }

    /// Replaces the record's fields and edges, guarded on the target existing
    /// and no other record holding its unique values.
    pub fn update<T: Transaction + ?Sized>(
        &self,
        txn: &mut T,
        commit_now: bool,
    ) -> Result<(), DqlError> {
        let request = self.update_request(commit_now)?;
        debug!(query = %request.query, "dql.update.request");
        let check: UniqueCheck = txn.execute(&request)?.decode()?;
        let uid = self.uid().unwrap_or_default();
        if check.me.is_empty() {
            warn!(dtype = %self.type_name, uid, "dql.update.missing");
            return Err(DqlError::not_found(format!("{} {uid}", self.type_name)));
        }
        if !check.other.is_empty() {
            warn!(
                dtype = %self.type_name,
                uid,
                conflicts = check.other.len(),
                "dql.update.conflict"
            );
            return Err(DqlError::conflict(format!("{} {uid}", self.type_name)));
        }
        Ok(())
    }
}

pub fn delete_request(type_name: &str, uid: &str, commit_now: bool) -> Result<Request, DqlError> {
    let root = dql::type_root(type_name)?;
    let filter = Filter::uid(uid)?;
    let mut target = Map::new();
    target.insert(UID_KEY.to_string(), Value::String(uid.to_string()));
    Ok(Request {
        commit_now,
        query: dql::document(&[dql::block("exist", &root, &[], &filter, "v as uid")]),
        mutations: vec![Mutation {
            cond: Some("@if(eq(len(v), 1))".to_string()),
            delete_json: Some(serde_json::to_vec(&Value::Object(target))?),
            ..Mutation::default()
        }],
    })
}

/// Deletes the node `uid` if it exists and has type `type_name`.
pub fn delete_record<T: Transaction + ?Sized>(
    txn: &mut T,
    type_name: &str,
    uid: &str,
    commit_now: bool,
) -> Result<(), DqlError> {
    let request = delete_request(type_name, uid, commit_now)?;
    debug!(query = %request.query, "dql.delete.request");
    let check: ExistCheck = txn.execute(&request)?.decode()?;
    if check.exist.is_empty() {
        warn!(dtype = type_name, uid, "dql.delete.missing");
        return Err(DqlError::not_found(format!("{type_name} {uid}")));
    }
    Ok(())
}
