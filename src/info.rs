use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    dql::{self, Filter},
    errors::DqlError,
    txn::Transaction,
};

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct DataRoot<T> {
    #[serde(default)]
    data: Vec<T>,
}

pub fn fetch_query(type_name: &str, uid: &str, fields: &[&str]) -> Result<String, DqlError> {
    let root = dql::type_root(type_name)?;
    let projection = projection(fields)?;
    Ok(dql::document(&[dql::block(
        "data",
        &root,
        &[],
        &Filter::uid(uid)?,
        &projection,
    )]))
}

/// Space separated projection list; an empty list projects `uid` only.
pub(crate) fn projection<S: AsRef<str>>(fields: &[S]) -> Result<String, DqlError> {
    if fields.is_empty() {
        return Ok("uid".to_string());
    }
    let names = fields
        .iter()
        .map(|field| projection_item(field.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.join(" "))
}

// Accepts plain predicates and `count(pred)` / `expand(_all_)` style calls.
fn projection_item(item: &str) -> Result<&str, DqlError> {
    if let Some((func, rest)) = item.split_once('(') {
        let inner = rest
            .strip_suffix(')')
            .ok_or_else(|| DqlError::invalid_input(format!("invalid projection {item:?}")))?;
        dql::ident(func)?;
        dql::ident(inner)?;
        return Ok(item);
    }
    dql::ident(item)
}

/// Fetches the node `uid` of type `type_name`, returning the raw response.
/// A missing node yields `{"data":[]}` rather than an error.
pub fn fetch_by_uid<T: Transaction + ?Sized>(
    txn: &mut T,
    type_name: &str,
    uid: &str,
    fields: &[&str],
) -> Result<Vec<u8>, DqlError> {
    let query = fetch_query(type_name, uid, fields)?;
    debug!(query = %query, "dql.fetch.query");
    Ok(txn.query(&query)?.json)
}

pub fn fetch_one<R, T>(
    txn: &mut T,
    type_name: &str,
    uid: &str,
    fields: &[&str],
) -> Result<Option<R>, DqlError>
where
    R: DeserializeOwned,
    T: Transaction + ?Sized,
{
    let query = fetch_query(type_name, uid, fields)?;
    debug!(query = %query, "dql.fetch.query");
    let root: DataRoot<R> = txn.query(&query)?.decode()?;
    Ok(root.data.into_iter().next())
}
