//! Reqwest-backed adapter for the hosted store's REST dialect.
//!
//! Owns transport details only: URL and header construction, timeout and
//! status mapping, and JSON decoding into rows.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_RANGE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::Value;

use super::{RemoteError, RemoteErrorKind, TableClient, TableQuery};
use crate::config::BackendConfig;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct RestTableClient {
    client: Client,
    base: Url,
}

impl RestTableClient {
    /// # Errors
    ///
    /// Returns an error when the URL doesn't parse, the key isn't a valid
    /// header value, or the reqwest client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, RemoteError> {
        let base = rest_base(&config.url)?;

        let key = config.anon_key.expose_secret();
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {key}"))?);

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(map_transport_error)?;

        Ok(Self { client, base })
    }

    fn table_url(&self, table: &str) -> Result<Url, RemoteError> {
        self.base
            .join(table)
            .map_err(|e| RemoteError::new(RemoteErrorKind::InvalidRequest, e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<(HeaderMap, Vec<u8>), RemoteError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok((headers, body.to_vec()))
    }
}

#[async_trait]
impl TableClient for RestTableClient {
    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, RemoteError> {
        let mut request = self
            .client
            .get(self.table_url(&query.table)?)
            .query(&query_params(query, true));
        if query.single {
            request = request.header(ACCEPT, SINGLE_OBJECT);
        }

        let (_, body) = self.send(request).await?;
        parse_rows(&body)
    }

    async fn count(&self, query: &TableQuery) -> Result<u64, RemoteError> {
        let request = self
            .client
            .head(self.table_url(&query.table)?)
            .query(&query_params(query, false))
            .header("Prefer", "count=exact");

        let (headers, _) = self.send(request).await?;
        headers
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| RemoteError::decode("missing or malformed Content-Range header"))
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError> {
        let request = self
            .client
            .post(self.table_url(table)?)
            .header("Prefer", "return=representation")
            .json(&rows);

        let (_, body) = self.send(request).await?;
        parse_rows(&body)
    }

    async fn update(&self, query: &TableQuery, patch: Value) -> Result<Vec<Value>, RemoteError> {
        let request = self
            .client
            .patch(self.table_url(&query.table)?)
            .query(&query_params(query, false))
            .header("Prefer", "return=representation")
            .json(&patch);

        let (_, body) = self.send(request).await?;
        parse_rows(&body)
    }
}

fn rest_base(url: &str) -> Result<Url, RemoteError> {
    let trimmed = url.trim().trim_end_matches('/');
    Url::parse(&format!("{trimmed}/rest/v1/"))
        .map_err(|e| RemoteError::new(RemoteErrorKind::InvalidRequest, format!("invalid backend url: {e}")))
}

fn header_value(raw: &str) -> Result<HeaderValue, RemoteError> {
    HeaderValue::from_str(raw)
        .map_err(|_| RemoteError::new(RemoteErrorKind::InvalidRequest, "access key is not a valid header value"))
}

/// `select`, filters, `order` and `limit` in the store's query-string form.
fn query_params(query: &TableQuery, with_shape: bool) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(query.filters.len() + 3);

    if with_shape {
        let columns: String = query.columns.chars().filter(|c| !c.is_whitespace()).collect();
        params.push(("select".to_owned(), columns));
    }

    for filter in &query.filters {
        params.push((
            filter.column.clone(),
            format!("{}.{}", filter.op.as_str(), filter.value),
        ));
    }

    if with_shape {
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_owned(), format!("{}.{direction}", order.column)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_owned(), limit.to_string()));
        }
    }

    params
}

/// Rows from a JSON array, or a single object wrapped in one.
fn parse_rows(body: &[u8]) -> Result<Vec<Value>, RemoteError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(row @ Value::Object(_)) => Ok(vec![row]),
        Ok(other) => Err(RemoteError::decode(format!("expected rows, got {other}"))),
        Err(e) => Err(RemoteError::decode(e.to_string())),
    }
}

/// Total from `0-24/3573` or `*/0`.
fn parse_content_range_total(raw: &str) -> Option<u64> {
    raw.rsplit_once('/')?.1.trim().parse().ok()
}

fn map_transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::timeout(error.to_string())
    } else if error.is_decode() {
        RemoteError::decode(error.to_string())
    } else {
        RemoteError::network(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RemoteError {
    let preview = body_preview(body);
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RemoteError::timeout(preview),
        _ => RemoteError::status(status.as_u16(), preview),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tables;

    #[test]
    fn test_query_params() {
        let query = TableQuery::from(tables::ATTENDANCE)
            .eq("student_id", "S1")
            .gte("date", "2026-03-01")
            .lte("date", "2026-03-31")
            .order("date", false)
            .limit(31);

        let params = query_params(&query, true);
        assert_eq!(
            params,
            vec![
                ("select".to_owned(), "*".to_owned()),
                ("student_id".to_owned(), "eq.S1".to_owned()),
                ("date".to_owned(), "gte.2026-03-01".to_owned()),
                ("date".to_owned(), "lte.2026-03-31".to_owned()),
                ("order".to_owned(), "date.desc".to_owned()),
                ("limit".to_owned(), "31".to_owned()),
            ]
        );

        let filters_only = query_params(&query, false);
        assert_eq!(filters_only.len(), 3);
    }

    #[test]
    fn test_rest_base() {
        let base = rest_base("https://abc.supabase.co/").unwrap();
        assert_eq!(base.join("fees").unwrap().as_str(), "https://abc.supabase.co/rest/v1/fees");
        assert!(rest_base("not a url").is_err());
    }

    #[test]
    fn test_parse_rows() {
        assert_eq!(parse_rows(b"[{\"id\":1},{\"id\":2}]").unwrap().len(), 2);
        assert_eq!(parse_rows(b"{\"id\":1}").unwrap().len(), 1);
        assert!(parse_rows(b"").unwrap().is_empty());
        assert_eq!(parse_rows(b"42").unwrap_err().kind, RemoteErrorKind::Decode);
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
    }

    #[test]
    fn test_status_mapping() {
        let err = map_status_error(StatusCode::UNAUTHORIZED, b"{\"message\":\"JWT expired\"}");
        assert_eq!(err.kind, RemoteErrorKind::Status(401));
        assert!(err.to_string().contains("401"));

        let err = map_status_error(StatusCode::GATEWAY_TIMEOUT, b"");
        assert_eq!(err.kind, RemoteErrorKind::Timeout);
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = BackendConfig::new("https://abc.supabase.co", "anon-key");
        assert!(RestTableClient::new(&config).is_ok());

        let bad_key = BackendConfig::new("https://abc.supabase.co", "line\nbreak");
        assert!(RestTableClient::new(&bad_key).is_err());
    }
}
