use ahash::AHashSet;
use serde::de::DeserializeOwned;

use crate::{
    DqlError,
    config::ClientConfig,
    field::Record,
    info,
    list::{ListPage, ListQuery, decode_page},
    model::{RecordModel, delete_record},
    txn::Transaction,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLineConfig {
    pub command: String,
    pub dtype: String,
    pub uid: String,
    pub predicates: Vec<String>,
    pub fuzzy_fields: Vec<String>,
    pub keyword: String,
    pub order: Option<String>,
    pub order_options: Vec<String>,
    pub default_order: String,
    pub page_size: i64,
    pub current: i64,
}

impl CommandLineConfig {
    pub fn from_args(args: &[&str]) -> Result<Self, String> {
        let mut config = Self {
            command: String::from("list"),
            dtype: String::new(),
            uid: String::new(),
            predicates: Vec::new(),
            fuzzy_fields: Vec::new(),
            keyword: String::new(),
            order: None,
            order_options: Vec::new(),
            default_order: String::new(),
            page_size: 20,
            current: 1,
        };
        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            let mut value = |flag: &str| {
                iter.next()
                    .map(|v| v.to_string())
                    .ok_or_else(|| format!("{flag} requires a value"))
            };
            match *arg {
                "--command" => config.command = value("--command")?,
                "--type" => config.dtype = value("--type")?,
                "--uid" => config.uid = value("--uid")?,
                "--predicates" => config.predicates = split_list(&value("--predicates")?),
                "--fuzzy-fields" => config.fuzzy_fields = split_list(&value("--fuzzy-fields")?),
                "--keyword" => config.keyword = value("--keyword")?,
                "--order" => config.order = Some(value("--order")?),
                "--order-options" => {
                    config.order_options = split_list(&value("--order-options")?)
                }
                "--default-order" => config.default_order = value("--default-order")?,
                "--page-size" => {
                    config.page_size = parse_int("--page-size", &value("--page-size")?)?
                }
                "--current" => config.current = parse_int("--current", &value("--current")?)?,
                other if other.starts_with('-') => {
                    return Err(format!("unknown flag {other}"));
                }
                _ => config.command = arg.to_string(),
            }
        }
        if config.dtype.is_empty() {
            return Err("--type is required".to_string());
        }
        Ok(config)
    }

    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            dtype: self.dtype.clone(),
            predicates: self.predicates.clone(),
            fuzzy_fields: self.fuzzy_fields.clone(),
            fuzzy_keyword: self.keyword.clone(),
            order_options: self.order_options.iter().cloned().collect::<AHashSet<_>>(),
            default_order: self.default_order.clone(),
            order: self.order.clone(),
            page_size: self.page_size,
            current: self.current,
            ..ListQuery::default()
        }
    }

    pub fn help() -> &'static str {
        "Usage: dqlgraph [list|fetch] --type TYPE [--uid UID] [--predicates a,b]
                [--fuzzy-fields a,b --keyword KW] [--order [-]FIELD --order-options a,b]
                [--default-order CLAUSE] [--page-size N] [--current N]
"
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_int(flag: &str, value: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| format!("{flag} expects an integer, got {value}"))
}

/// A transaction handle paired with the options applied to every call.
pub struct Client<T> {
    txn: T,
    config: ClientConfig,
}

impl<T> Client<T> {
    pub fn new(txn: T) -> Self {
        Self::with_config(txn, ClientConfig::default())
    }

    pub fn with_config(txn: T, config: ClientConfig) -> Self {
        Self { txn, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transaction(&self) -> &T {
        &self.txn
    }

    pub fn into_inner(self) -> T {
        self.txn
    }
}

impl<T> Client<T>
where
    T: Transaction,
{
    pub fn fetch_by_uid(
        &mut self,
        dtype: &str,
        uid: &str,
        fields: &[&str],
    ) -> Result<Vec<u8>, DqlError> {
        info::fetch_by_uid(&mut self.txn, dtype, uid, fields)
    }

    pub fn fetch_one<R: DeserializeOwned>(
        &mut self,
        dtype: &str,
        uid: &str,
        fields: &[&str],
    ) -> Result<Option<R>, DqlError> {
        info::fetch_one(&mut self.txn, dtype, uid, fields)
    }

    pub fn create<R: Record>(&mut self, record: &R) -> Result<(), DqlError> {
        RecordModel::from_record(record)?.create(&mut self.txn, self.config.commit_now)
    }

    pub fn update<R: Record>(&mut self, record: &R) -> Result<(), DqlError> {
        RecordModel::from_record(record)?.update(&mut self.txn, self.config.commit_now)
    }

    pub fn delete(&mut self, dtype: &str, uid: &str) -> Result<(), DqlError> {
        delete_record(&mut self.txn, dtype, uid, self.config.commit_now)
    }

    pub fn list(&mut self, query: &ListQuery) -> Result<Vec<u8>, DqlError> {
        query.execute_with_limit(&mut self.txn, self.config.unbounded_page_limit)
    }

    pub fn list_page<R: DeserializeOwned>(
        &mut self,
        query: &ListQuery,
    ) -> Result<ListPage<R>, DqlError> {
        decode_page(&self.list(query)?)
    }
}
