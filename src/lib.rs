//! Typed record mapping and guarded DQL construction for Dgraph transactions.
//! Records are classified through a per-type descriptor table, rendered into
//! conditional upsert requests, and list queries compile into a single
//! count-plus-page request.

pub mod client;
pub mod config;
pub mod dql;
pub mod errors;
pub mod field;
pub mod info;
pub mod list;
pub mod model;
pub mod txn;

pub use crate::client::Client;
pub use crate::config::ClientConfig;
pub use crate::errors::DqlError;
pub use crate::field::{Field, FieldDescriptor, FieldFlags, Literal, Record};
pub use crate::info::{fetch_by_uid, fetch_one};
pub use crate::list::{ExactFilter, ListPage, ListQuery, RelFilter};
pub use crate::model::{RecordModel, delete_record};
pub use crate::txn::{Mutation, Request, Response, Transaction};
