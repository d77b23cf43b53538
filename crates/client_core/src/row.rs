//! Row view-models: one sampled (user, album, post) triple plus the state of
//! its title field and its update/delete affordances.

use std::fmt;

use shared::domain::{Album, Post, PostId, User};

pub const CONFIRMATION_LABEL: &str = "updated!";

/// Identity of a rendered row. Sampling repeats posts, so the post id alone
/// does not identify a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub index: usize,
    pub post_id: PostId,
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row{}-post{}", self.index, self.post_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAffordance {
    Idle,
    InProgress,
    /// The PATCH failed. Stays disabled for the lifetime of the row.
    Stuck,
}

impl UpdateAffordance {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "update",
            Self::InProgress | Self::Stuck => "updating...",
        }
    }

    pub fn is_clickable(self) -> bool {
        self == Self::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAffordance {
    Idle,
    InProgress,
}

impl DeleteAffordance {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "delete",
            Self::InProgress => "deleting...",
        }
    }

    pub fn is_clickable(self) -> bool {
        self == Self::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    key: RowKey,
    user: User,
    album: Album,
    post: Post,
    title_field: String,
    update: Option<UpdateAffordance>,
    confirmation: Option<u64>,
    confirmation_seq: u64,
    delete: DeleteAffordance,
    detached: bool,
}

impl Row {
    pub fn new(index: usize, user: User, album: Album, post: Post) -> Self {
        Self {
            key: RowKey {
                index,
                post_id: post.id,
            },
            title_field: post.title.clone(),
            user,
            album,
            post,
            update: None,
            confirmation: None,
            confirmation_seq: 0,
            delete: DeleteAffordance::Idle,
            detached: false,
        }
    }

    pub fn key(&self) -> RowKey {
        self.key
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    /// The post as it was fetched; edits only touch [`Row::title_field`].
    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn title_field(&self) -> &str {
        &self.title_field
    }

    pub fn update(&self) -> Option<UpdateAffordance> {
        self.update
    }

    pub fn shows_confirmation(&self) -> bool {
        self.confirmation.is_some()
    }

    pub fn delete(&self) -> DeleteAffordance {
        self.delete
    }

    pub fn title_field_id(&self) -> String {
        self.post.id.to_string()
    }

    pub fn album_label_id(&self) -> String {
        format!("album{}", self.album.id)
    }

    pub fn user_label_id(&self) -> String {
        format!("user{}", self.user.id)
    }

    pub fn delete_label_id(&self) -> String {
        self.post.id.to_string()
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached
    }

    /// Returns true when this edit inserted the update affordance.
    pub(crate) fn edit_title(&mut self, value: String) -> bool {
        self.title_field = value;
        if self.update.is_some() {
            return false;
        }
        self.update = Some(UpdateAffordance::Idle);
        true
    }

    /// Moves an idle update affordance to in-progress and returns the title
    /// to send.
    pub(crate) fn begin_update(&mut self) -> Option<String> {
        match self.update {
            Some(UpdateAffordance::Idle) => {
                self.update = Some(UpdateAffordance::InProgress);
                Some(self.title_field.clone())
            }
            _ => None,
        }
    }

    /// Replaces the update affordance with a confirmation and returns the
    /// ticket the dismissal timer must present.
    pub(crate) fn confirm_update(&mut self) -> u64 {
        self.update = None;
        self.confirmation_seq += 1;
        self.confirmation = Some(self.confirmation_seq);
        self.confirmation_seq
    }

    pub(crate) fn mark_update_stuck(&mut self) {
        self.update = Some(UpdateAffordance::Stuck);
    }

    /// Only the timer holding the current ticket clears the confirmation.
    pub(crate) fn dismiss_confirmation(&mut self, ticket: u64) -> bool {
        if self.confirmation != Some(ticket) {
            return false;
        }
        self.confirmation = None;
        true
    }

    pub(crate) fn begin_delete(&mut self) -> bool {
        if !self.delete.is_clickable() {
            return false;
        }
        self.delete = DeleteAffordance::InProgress;
        true
    }

    pub(crate) fn revert_delete(&mut self) {
        self.delete = DeleteAffordance::Idle;
    }

    pub(crate) fn detach(&mut self) {
        self.detached = true;
    }
}
