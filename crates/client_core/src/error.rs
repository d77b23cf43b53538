use shared::domain::Resource;
use thiserror::Error;

use crate::row::RowKey;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },
    #[error("{method} {url} returned status {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },
    #[error("failed to encode request body for {url}: {source}")]
    Encode {
        url: String,
        source: serde_json::Error,
    },
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        source: reqwest::Error,
    },
    #[error("failed to load {resource}: {source}")]
    Load {
        resource: Resource,
        source: Box<FeedError>,
    },
    #[error("cannot compose rows: the {0} collection is empty")]
    EmptyCollection(Resource),
    #[error("no rendered row {0}")]
    UnknownRow(RowKey),
    #[error("feed api unavailable: {0}")]
    Unavailable(String),
}

impl FeedError {
    pub(crate) fn load(resource: Resource, source: FeedError) -> Self {
        Self::Load {
            resource,
            source: Box::new(source),
        }
    }
}

pub type Result<T, E = FeedError> = std::result::Result<T, E>;
