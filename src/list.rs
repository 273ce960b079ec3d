//! List query compiler: one request carrying relational `var` blocks, a
//! `Total` count and a paginated, ordered `Data` block over the same filter.

use ahash::AHashSet;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    config::DEFAULT_UNBOUNDED_PAGE_LIMIT,
    dql::{self, Filter},
    errors::DqlError,
    info::projection,
    txn::Transaction,
};

const EXACT_FUNCTIONS: &[&str] = &[
    "eq",
    "ge",
    "gt",
    "le",
    "lt",
    "anyofterms",
    "allofterms",
    "anyoftext",
    "alloftext",
];

/// `function(predicate, "value")`, AND-combined with the other filters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExactFilter {
    pub predicate: String,
    pub function: String,
    pub value: String,
}

impl ExactFilter {
    pub fn new(predicate: &str, function: &str, value: &str) -> Self {
        Self {
            predicate: predicate.to_string(),
            function: function.to_string(),
            value: value.to_string(),
        }
    }

    fn to_filter(&self) -> Result<Filter, DqlError> {
        let name = EXACT_FUNCTIONS
            .iter()
            .find(|name| **name == self.function)
            .copied()
            .ok_or_else(|| DqlError::unsupported_function(self.function.as_str()))?;
        Filter::func(name, &self.predicate, dql::string_literal(&self.value))
    }
}

/// Keeps records reachable through `edge_name` from the `rel_type` nodes in
/// `rel_uids`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelFilter {
    pub rel_type: String,
    pub edge_name: String,
    pub rel_uids: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub dtype: String,
    pub predicates: Vec<String>,
    pub exact_filters: Vec<ExactFilter>,
    pub rel_filters: Vec<RelFilter>,
    pub fuzzy_fields: Vec<String>,
    pub fuzzy_keyword: String,
    pub order_options: AHashSet<String>,
    pub default_order: String,
    /// Requested order; a leading `-` sorts descending.
    pub order: Option<String>,
    /// Negative page size lists up to the unbounded limit with no offset.
    pub page_size: i64,
    /// 1-based page number.
    pub current: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListPage<T> {
    pub total: u64,
    pub data: Vec<T>,
}

#[derive(Deserialize)]
struct CountRow {
    #[serde(default)]
    count: u64,
}

#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ListRoot<T> {
    #[serde(rename = "Total", default)]
    total: Vec<CountRow>,
    #[serde(rename = "Data", default)]
    data: Vec<T>,
}

impl ListQuery {
    pub fn new(dtype: &str) -> Self {
        Self {
            dtype: dtype.to_string(),
            page_size: 20,
            current: 1,
            ..Self::default()
        }
    }

    pub fn with_order_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_options = options.into_iter().map(Into::into).collect();
        self
    }

    fn fuzzy_filter(&self) -> Result<Filter, DqlError> {
        if self.fuzzy_keyword.is_empty() {
            return Ok(Filter::Or(Vec::new()));
        }
        let parts = self
            .fuzzy_fields
            .iter()
            .map(|field| Filter::regexp(field, &self.fuzzy_keyword))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Filter::Or(parts))
    }

    /// `var` blocks binding `uid0..uidN`, plus the disjunction over them.
    fn rel_filter(&self) -> Result<(Vec<String>, Filter), DqlError> {
        let mut vars = Vec::with_capacity(self.rel_filters.len());
        let mut refs = Vec::with_capacity(self.rel_filters.len());
        for (i, rel) in self.rel_filters.iter().enumerate() {
            let var = format!("uid{i}");
            let root = dql::type_root(&rel.rel_type)?;
            let body = format!("{var} as {}", dql::ident(&rel.edge_name)?);
            vars.push(dql::block(
                "var",
                &root,
                &[],
                &Filter::uid_list(&rel.rel_uids)?,
                &body,
            ));
            refs.push(Filter::uid_var(&var)?);
        }
        Ok((vars, Filter::Or(refs)))
    }

    /// Order argument for the `Data` block. An explicit order must name a
    /// whitelisted field; the default order is used verbatim.
    pub fn order_arg(&self) -> Result<Option<String>, DqlError> {
        let order = match self.order.as_deref() {
            Some(order) if !order.is_empty() => order,
            _ if self.default_order.is_empty() => return Ok(None),
            _ => return Ok(Some(self.default_order.clone())),
        };
        let (direction, field) = match order.strip_prefix('-') {
            Some(field) => ("orderdesc", field),
            None => ("orderasc", order),
        };
        if !self.order_options.contains(field) {
            return Err(DqlError::invalid_field(field));
        }
        Ok(Some(format!("{direction}: {}", dql::ident(field)?)))
    }

    /// `(first, offset)` for the `Data` block.
    pub fn pagination(&self, unbounded_limit: i64) -> Result<(i64, i64), DqlError> {
        if self.page_size < 0 {
            return Ok((unbounded_limit, 0));
        }
        if self.current < 1 {
            return Err(DqlError::invalid_input(format!(
                "page {} is out of range",
                self.current
            )));
        }
        let offset = (self.current - 1)
            .checked_mul(self.page_size)
            .ok_or_else(|| DqlError::invalid_input("page offset overflows"))?;
        Ok((self.page_size, offset))
    }

    pub fn compile(&self) -> Result<String, DqlError> {
        self.compile_with_limit(DEFAULT_UNBOUNDED_PAGE_LIMIT)
    }

    pub fn compile_with_limit(&self, unbounded_limit: i64) -> Result<String, DqlError> {
        let root = dql::type_root(&self.dtype)?;
        let (mut blocks, rel) = self.rel_filter()?;
        let mut parts = vec![self.fuzzy_filter()?];
        for exact in &self.exact_filters {
            parts.push(exact.to_filter()?);
        }
        parts.push(rel);
        let filter = Filter::And(parts);

        let mut args = Vec::with_capacity(3);
        if let Some(order) = self.order_arg()? {
            args.push(order);
        }
        let (first, offset) = self.pagination(unbounded_limit)?;
        args.push(format!("first: {first}"));
        args.push(format!("offset: {offset}"));

        blocks.push(dql::block("Total", &root, &[], &filter, "count(uid)"));
        blocks.push(dql::block(
            "Data",
            &root,
            &args,
            &filter,
            &projection(&self.predicates)?,
        ));
        Ok(dql::document(&blocks))
    }

    pub fn execute<T: Transaction + ?Sized>(&self, txn: &mut T) -> Result<Vec<u8>, DqlError> {
        self.execute_with_limit(txn, DEFAULT_UNBOUNDED_PAGE_LIMIT)
    }

    pub fn execute_with_limit<T: Transaction + ?Sized>(
        &self,
        txn: &mut T,
        unbounded_limit: i64,
    ) -> Result<Vec<u8>, DqlError> {
        let query = self.compile_with_limit(unbounded_limit)?;
        debug!(query = %query, "dql.list.query");
        Ok(txn.query(&query)?.json)
    }

    pub fn fetch_page<R, T>(&self, txn: &mut T) -> Result<ListPage<R>, DqlError>
    where
        R: DeserializeOwned,
        T: Transaction + ?Sized,
    {
        decode_page(&self.execute(txn)?)
    }
}

pub fn decode_page<R: DeserializeOwned>(json: &[u8]) -> Result<ListPage<R>, DqlError> {
    let root: ListRoot<R> = serde_json::from_slice(json)?;
    Ok(ListPage {
        total: root.total.first().map(|row| row.count).unwrap_or(0),
        data: root.data,
    })
}
