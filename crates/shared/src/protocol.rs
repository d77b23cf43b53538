use serde::{Deserialize, Serialize};

use crate::domain::PostId;

/// `Content-Type` sent with title updates.
pub const JSON_UTF8_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Body of `PATCH posts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePostTitleRequest {
    pub title: String,
}

/// Resource echoed back by a title update. Only `title` is inspected; a
/// response without one never counts as a confirmed update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTitleEcho {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PostId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PostTitleEcho {
    pub fn confirms(&self, local_title: &str) -> bool {
        self.title.as_deref() == Some(local_title)
    }
}
