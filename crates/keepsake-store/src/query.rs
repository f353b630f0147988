//! Row query builder speaking the store's PostgREST wire format.
//!
//! Filters, ordering, and pagination become query parameters
//! (`user_id=eq.<uuid>`, `order=created_at.desc`, `limit`/`offset`);
//! embedded joins ride in the `select` parameter; counts travel back in
//! the `Content-Range` response header when requested.

use serde::de::DeserializeOwned;
use serde_json::Value;

use keepsake_core::{Error, Result};

use crate::client::StoreClient;

/// Sort direction for [`Query::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn suffix(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

enum Operation {
    Select,
    Insert(Value),
    Upsert { value: Value, on_conflict: String },
    Update(Value),
    Delete,
}

/// A pending row operation against one table.
pub struct Query<'a> {
    client: &'a StoreClient,
    table: String,
    operation: Operation,
    params: Vec<(String, String)>,
}

impl<'a> Query<'a> {
    pub(crate) fn new(client: &'a StoreClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            operation: Operation::Select,
            params: Vec::new(),
        }
    }

    /// Choose returned columns, including embedded resources, e.g.
    /// `*, media (file_url, file_type), memory_tags (tags (id, name))`.
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.to_string()));
        self
    }

    /// Equality filter. Dotted paths reach into embedded resources.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.params
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Case-insensitive LIKE filter. `%` wildcards are the caller's
    /// responsibility; without them this is a ci exact match.
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.params
            .push((column.to_string(), format!("ilike.{}", pattern)));
        self
    }

    /// Disjunction over raw filter expressions, e.g.
    /// `title.ilike.*beach*,description.ilike.*beach*`.
    pub fn or(mut self, filters: &str) -> Self {
        self.params.push(("or".into(), format!("({})", filters)));
        self
    }

    pub fn order(mut self, column: &str, direction: Order) -> Self {
        self.params
            .push(("order".into(), format!("{}.{}", column, direction.suffix())));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".into(), limit.to_string()));
        self
    }

    /// Inclusive row range, the offset-pagination form used by list
    /// endpoints (`page`/`limit` → `from..=to`).
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.params.push(("offset".into(), from.to_string()));
        self.params
            .push(("limit".into(), (to.saturating_sub(from) + 1).to_string()));
        self
    }

    /// Turn this query into an insert of `value` (object or array).
    pub fn insert(mut self, value: Value) -> Self {
        self.operation = Operation::Insert(value);
        self
    }

    /// Idempotent insert keyed on `on_conflict` columns; conflicting
    /// rows are merged rather than erroring.
    pub fn upsert(mut self, value: Value, on_conflict: &str) -> Self {
        self.operation = Operation::Upsert {
            value,
            on_conflict: on_conflict.to_string(),
        };
        self
    }

    /// Turn this query into an update with the current filters.
    pub fn update(mut self, value: Value) -> Self {
        self.operation = Operation::Update(value);
        self
    }

    /// Turn this query into a delete with the current filters.
    pub fn delete(mut self) -> Self {
        self.operation = Operation::Delete;
        self
    }

    // ------------------------------------------------------------------
    // Terminal methods
    // ------------------------------------------------------------------

    /// Execute and deserialize all returned rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let response = self.dispatch(false, false, false).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| Error::Serialization(format!("store row decode failed: {}", e)))
    }

    /// Execute expecting exactly one row; zero or many is `NotFound`.
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T> {
        let table = self.table.clone();
        let response = self.dispatch(true, false, false).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Serialization(format!("{} row decode failed: {}", table, e)))
    }

    /// Execute and return the first row, if any.
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>> {
        let rows = self.limit(1).fetch::<T>().await?;
        Ok(rows.into_iter().next())
    }

    /// Execute with an exact total count alongside the rows.
    pub async fn fetch_with_count<T: DeserializeOwned>(self) -> Result<(Vec<T>, u64)> {
        let response = self.dispatch(false, true, false).await?;
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0);
        let rows = response
            .json::<Vec<T>>()
            .await
            .map_err(|e| Error::Serialization(format!("store row decode failed: {}", e)))?;
        Ok((rows, total))
    }

    /// Count matching rows without fetching them (HEAD request).
    pub async fn count(self) -> Result<u64> {
        let response = self.dispatch(false, true, true).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| Error::Store("count response missing Content-Range".into()))
    }

    /// Execute a write without asking for rows back.
    pub async fn execute(self) -> Result<()> {
        self.dispatch(false, false, false).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Wire plumbing
    // ------------------------------------------------------------------

    async fn dispatch(
        self,
        single: bool,
        want_count: bool,
        head: bool,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/rest/v1/{}", self.client.base_url, self.table);

        let mut params = self.params;
        let mut prefer: Vec<&str> = Vec::new();
        if want_count {
            prefer.push("count=exact");
        }

        let builder = match &self.operation {
            Operation::Select => {
                if head {
                    self.client.http.head(&url)
                } else {
                    self.client.http.get(&url)
                }
            }
            Operation::Insert(value) => {
                prefer.push("return=representation");
                self.client.http.post(&url).json(value)
            }
            Operation::Upsert { value, on_conflict } => {
                params.push(("on_conflict".into(), on_conflict.clone()));
                prefer.push("resolution=merge-duplicates");
                prefer.push("return=representation");
                self.client.http.post(&url).json(value)
            }
            Operation::Update(value) => {
                prefer.push("return=representation");
                self.client.http.patch(&url).json(value)
            }
            Operation::Delete => self.client.http.delete(&url),
        };

        let mut builder = self.client.request(builder).query(&params);
        if !prefer.is_empty() {
            builder = builder.header("Prefer", prefer.join(","));
        }
        if single {
            builder = builder.header("Accept", "application/vnd.pgrst.object+json");
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Store(format!("request to {} failed: {}", self.table, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_ACCEPTABLE && single {
            return Err(Error::NotFound(format!("{} row", self.table)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "{} returned {}: {}",
                self.table, status, body
            )));
        }

        Ok(response)
    }
}

/// Parse the total from a `Content-Range` header, e.g. `0-11/57` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StoreClient;

    fn client() -> StoreClient {
        StoreClient::new("https://xyz.supabase.co", "anon-key").unwrap()
    }

    #[test]
    fn test_eq_filter_param() {
        let c = client();
        let q = c.from("memories").eq("user_id", "abc");
        assert_eq!(q.params, vec![("user_id".to_string(), "eq.abc".to_string())]);
    }

    #[test]
    fn test_embedded_path_filter() {
        let c = client();
        let q = c.from("memories").eq("memory_tags.tags.name", "summer");
        assert_eq!(q.params[0].0, "memory_tags.tags.name");
        assert_eq!(q.params[0].1, "eq.summer");
    }

    #[test]
    fn test_or_filter_wraps_parens() {
        let c = client();
        let q = c
            .from("memories")
            .or("title.ilike.*beach*,description.ilike.*beach*");
        assert_eq!(
            q.params[0],
            (
                "or".to_string(),
                "(title.ilike.*beach*,description.ilike.*beach*)".to_string()
            )
        );
    }

    #[test]
    fn test_order_param() {
        let c = client();
        let q = c.from("memories").order("created_at", Order::Desc);
        assert_eq!(
            q.params[0],
            ("order".to_string(), "created_at.desc".to_string())
        );
    }

    #[test]
    fn test_range_becomes_offset_and_limit() {
        // page=2, page size 12 → rows 12..=23
        let c = client();
        let q = c.from("memories").range(12, 23);
        assert!(q.params.contains(&("offset".to_string(), "12".to_string())));
        assert!(q.params.contains(&("limit".to_string(), "12".to_string())));
    }

    #[test]
    fn test_range_single_row() {
        let c = client();
        let q = c.from("memories").range(0, 0);
        assert!(q.params.contains(&("limit".to_string(), "1".to_string())));
    }

    #[test]
    fn test_ilike_without_wildcards_is_exact_ci() {
        let c = client();
        let q = c.from("tags").ilike("name", "Summer");
        assert_eq!(q.params[0], ("name".to_string(), "ilike.Summer".to_string()));
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-11/57"), Some(57));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
