use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::models::{Channel, ErrorBody, Guild, RateLimitBody, SearchResult, User};
use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::errors::ApiError;
use crate::snowflake::Snowflake;

/// Attempts allowed while the search index is still being built.
pub const INDEX_RETRY_ATTEMPTS: u32 = 5;
pub const INDEX_RETRY_DELAY: Duration = Duration::from_millis(3000);
/// Added on top of the server's `retry_after` before retrying a 429.
pub const RATE_LIMIT_PADDING: Duration = Duration::from_millis(1000);
/// Added on top of `x-ratelimit-reset-after` when a bucket is drained.
pub const BUCKET_RESET_PADDING: Duration = Duration::from_millis(200);
pub const GUILD_PAGE_SIZE: usize = 200;
/// Hits per search page; fixed by the platform.
pub const SEARCH_PAGE_SIZE: u64 = 25;

/// Error code the platform returns when writing to an archived thread.
const ARCHIVED_THREAD_CODE: u64 = 50083;

const RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATELIMIT_RESET_AFTER: &str = "x-ratelimit-reset-after";

/// Where a search runs: across a whole community, or inside one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Guild(Snowflake),
    Channel(Snowflake),
}

impl SearchScope {
    pub fn path(&self) -> String {
        match self {
            SearchScope::Guild(id) => format!("/guilds/{}/messages/search", id),
            SearchScope::Channel(id) => format!("/channels/{}/messages/search", id),
        }
    }
}

/// Author-scoped search bounded by message ids. `max_id` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQuery {
    pub author_id: Snowflake,
    pub max_id: Option<Snowflake>,
    pub min_id: Option<Snowflake>,
}

impl SearchQuery {
    fn to_params(self) -> Vec<(String, String)> {
        let mut params = vec![("author_id".to_string(), self.author_id.to_string())];
        if let Some(max_id) = self.max_id {
            params.push(("max_id".to_string(), max_id.to_string()));
        }
        if let Some(min_id) = self.min_id {
            params.push(("min_id".to_string(), min_id.to_string()));
        }
        params.push(("sort_by".to_string(), "timestamp".to_string()));
        params.push(("sort_order".to_string(), "asc".to_string()));
        params.push(("include_nsfw".to_string(), "true".to_string()));
        params
    }
}

/// Typed binding to the platform API. Every call goes through one retry ladder.
pub struct ApiClient<T> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue a request, retrying rate limits and index builds.
    ///
    /// Returns `Value::Null` for empty successful responses.
    pub async fn call(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let mut index_attempts = 0u32;

        loop {
            let resp = self
                .transport
                .send(&request)
                .await
                .map_err(|source| ApiError::Transport {
                    path: request.path.clone(),
                    source,
                })?;

            match resp.status {
                StatusCode::TOO_MANY_REQUESTS => {
                    let body: RateLimitBody = serde_json::from_str(&resp.body).unwrap_or_default();
                    let wait = rate_limit_wait(body.retry_after);
                    warn!(
                        path = %request.path,
                        retry_after = body.retry_after,
                        global = body.global,
                        wait_ms = wait.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                StatusCode::ACCEPTED => {
                    index_attempts += 1;
                    if index_attempts >= INDEX_RETRY_ATTEMPTS {
                        return Err(ApiError::IndexNotReady {
                            path: request.path.clone(),
                            attempts: index_attempts,
                        });
                    }
                    debug!(
                        path = %request.path,
                        attempt = index_attempts,
                        "Search index not ready, retrying"
                    );
                    tokio::time::sleep(INDEX_RETRY_DELAY).await;
                }
                StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized),
                StatusCode::FORBIDDEN => {
                    return Err(ApiError::Forbidden {
                        path: request.path.clone(),
                    });
                }
                StatusCode::NOT_FOUND => {
                    return Err(ApiError::NotFound {
                        path: request.path.clone(),
                    });
                }
                status if status.is_success() => {
                    self.respect_bucket(&resp).await;
                    if status == StatusCode::NO_CONTENT || resp.body.trim().is_empty() {
                        return Ok(Value::Null);
                    }
                    return serde_json::from_str(&resp.body).map_err(|source| ApiError::Decode {
                        path: request.path.clone(),
                        source,
                    });
                }
                status => return Err(classify_failure(&request, status, resp.body)),
            }
        }
    }

    /// Sleep until the bucket refills when the server reports it drained.
    async fn respect_bucket(&self, resp: &ApiResponse) {
        let drained = resp
            .header(RATELIMIT_REMAINING)
            .and_then(|v| v.trim().parse::<u64>().ok())
            == Some(0);
        if !drained {
            return;
        }
        if let Some(reset_after) = resp
            .header(RATELIMIT_RESET_AFTER)
            .and_then(|v| v.trim().parse::<f64>().ok())
        {
            let wait = secs_to_duration(reset_after) + BUCKET_RESET_PADDING;
            debug!(wait_ms = wait.as_millis() as u64, "Rate-limit bucket drained, pausing");
            tokio::time::sleep(wait).await;
        }
    }

    async fn get<D: DeserializeOwned>(&self, request: ApiRequest) -> Result<D, ApiError> {
        let path = request.path.clone();
        let value = self.call(request).await?;
        serde_json::from_value(value).map_err(|source| ApiError::Decode { path, source })
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get(ApiRequest::new(Method::GET, "/users/@me")).await
    }

    /// All communities of the account, walking pages of `GUILD_PAGE_SIZE`.
    pub async fn guilds(&self) -> Result<Vec<Guild>, ApiError> {
        let mut all = Vec::new();
        let mut after: Option<Snowflake> = None;

        loop {
            let mut query = vec![("limit".to_string(), GUILD_PAGE_SIZE.to_string())];
            if let Some(after) = after {
                query.push(("after".to_string(), after.to_string()));
            }
            let page: Vec<Guild> = self
                .get(ApiRequest::new(Method::GET, "/users/@me/guilds").with_query(query))
                .await?;

            let count = page.len();
            after = page.last().map(|g| g.id);
            all.extend(page);

            if count < GUILD_PAGE_SIZE {
                break;
            }
        }

        Ok(all)
    }

    pub async fn dm_channels(&self) -> Result<Vec<Channel>, ApiError> {
        self.get(ApiRequest::new(Method::GET, "/users/@me/channels"))
            .await
    }

    pub async fn guild_channels(&self, guild_id: Snowflake) -> Result<Vec<Channel>, ApiError> {
        self.get(ApiRequest::new(
            Method::GET,
            format!("/guilds/{}/channels", guild_id),
        ))
        .await
    }

    pub async fn search(
        &self,
        scope: SearchScope,
        query: SearchQuery,
    ) -> Result<SearchResult, ApiError> {
        self.get(ApiRequest::new(Method::GET, scope.path()).with_query(query.to_params()))
            .await
    }

    pub async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<(), ApiError> {
        self.call(ApiRequest::new(
            Method::DELETE,
            format!("/channels/{}/messages/{}", channel_id, message_id),
        ))
        .await
        .map(|_| ())
    }
}

fn classify_failure(request: &ApiRequest, status: StatusCode, body: String) -> ApiError {
    if status == StatusCode::BAD_REQUEST {
        let code = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.code)
            .unwrap_or_default();
        if code == ARCHIVED_THREAD_CODE {
            return ApiError::ArchivedThread {
                path: request.path.clone(),
            };
        }
    }
    ApiError::Http {
        status,
        method: request.method.clone(),
        path: request.path.clone(),
        body,
    }
}

fn rate_limit_wait(retry_after: f64) -> Duration {
    secs_to_duration(retry_after) + RATE_LIMIT_PADDING
}

fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_millis((secs * 1000.0).ceil() as u64)
    } else {
        Duration::ZERO
    }
}
