use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Album, Post, PostId, Resource, User},
    protocol::{PostTitleEcho, UpdatePostTitleRequest, JSON_UTF8_CONTENT_TYPE},
};
use tracing::debug;
use url::Url;

use crate::{
    config::normalize_base_url,
    error::{FeedError, Result},
};

/// Remote collections the board reads from and the two mutations it issues.
#[async_trait]
pub trait FeedApi: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn list_albums(&self) -> Result<Vec<Album>>;
    async fn list_posts(&self) -> Result<Vec<Post>>;
    async fn update_post_title(&self, post_id: PostId, title: &str) -> Result<PostTitleEcho>;
    async fn delete_post(&self, post_id: PostId) -> Result<()>;
}

pub struct HttpFeedClient {
    http: Client,
    base_url: Url,
}

impl HttpFeedClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let normalized = normalize_base_url(base_url);
        let base_url = Url::parse(&normalized).map_err(|source| FeedError::InvalidBaseUrl {
            url: normalized.clone(),
            source,
        })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|source| FeedError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                source,
            })
    }

    fn post_url(&self, post_id: PostId) -> Result<Url> {
        self.join(&format!("{}{}", Resource::Posts.collection_path(), post_id))
    }

    async fn send(&self, method: &'static str, request: RequestBuilder, url: &Url) -> Result<Response> {
        let res = request.send().await.map_err(|source| FeedError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = res.status();
        debug!(method, %url, status = status.as_u16(), "feed api response");
        if !status.is_success() {
            return Err(FeedError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(res)
    }

    async fn get_collection<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>> {
        let url = self.join(resource.collection_path())?;
        let res = self
            .send("GET", self.http.get(url.clone()), &url)
            .await?;
        res.json().await.map_err(|source| FeedError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl FeedApi for HttpFeedClient {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.get_collection(Resource::Users).await
    }

    async fn list_albums(&self) -> Result<Vec<Album>> {
        self.get_collection(Resource::Albums).await
    }

    async fn list_posts(&self) -> Result<Vec<Post>> {
        self.get_collection(Resource::Posts).await
    }

    async fn update_post_title(&self, post_id: PostId, title: &str) -> Result<PostTitleEcho> {
        let url = self.post_url(post_id)?;
        let body = serde_json::to_vec(&UpdatePostTitleRequest {
            title: title.to_string(),
        })
        .map_err(|source| FeedError::Encode {
            url: url.to_string(),
            source,
        })?;
        let request = self
            .http
            .patch(url.clone())
            .header(CONTENT_TYPE, JSON_UTF8_CONTENT_TYPE)
            .body(body);
        let res = self.send("PATCH", request, &url).await?;
        res.json().await.map_err(|source| FeedError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn delete_post(&self, post_id: PostId) -> Result<()> {
        let url = self.post_url(post_id)?;
        self.send("DELETE", self.http.delete(url.clone()), &url)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
