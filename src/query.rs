//! GraphQL over HTTP: one POST per query or mutation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::subscription::Payload;
use crate::transport;

/// Request body: `{"query": "..."}`.
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Response body: `{"data": {...}, "errors": [...]}`, both optional.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: Option<Payload>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

/// POSTs `query` to `endpoint` with a bearer token and returns `data`.
///
/// A missing or `null` `data` yields an empty object. The HTTP status is not
/// checked: GraphQL servers report failures in the body.
///
/// # Errors
///
/// - [`ClientError::InvalidEndpoint`] if `endpoint` is not an http(s) URL.
/// - [`ClientError::Http`] if the request or body read fails.
/// - [`ClientError::Decode`] if the body is not a GraphQL response.
/// - [`ClientError::Application`] if the body carries an `errors` array,
///   even an empty one; the message is the array serialized as JSON.
pub async fn post_query(
    http: &reqwest::Client,
    endpoint: &str,
    token: &str,
    query: &str,
) -> Result<Payload, ClientError> {
    let url = transport::parse_endpoint(endpoint, &["http", "https"])?;

    let response = http
        .post(url)
        .bearer_auth(token)
        .json(&QueryRequest { query })
        .send()
        .await?;
    let status = response.status();
    let body = response.bytes().await?;

    let parsed: QueryResponse = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(%status, error = %e, "undecodable graphql response");
        ClientError::from(e)
    })?;

    match parsed.errors {
        Some(errors) => {
            let err = ClientError::from_graphql_errors(&errors);
            tracing::debug!(%status, error = %err, "graphql query returned errors");
            Err(err)
        }
        None => Ok(parsed.data.unwrap_or_default()),
    }
}
