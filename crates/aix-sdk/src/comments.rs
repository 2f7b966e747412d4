//! Threaded comments
//!
//! Comments are stored flat; a reply points at its parent through
//! `parent_id`. Threads are two levels deep: top-level comments and their
//! direct replies.

use crate::error::{Result, SdkError};
use crate::session::SessionProvider;
use aix_store_client::{Query, RemoteStore, RemoteStoreExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A stored comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Article or catalog item the comment belongs to
    pub target_id: String,
    pub user_name: String,
    pub text: String,
    /// RFC 3339 timestamp set by the store
    pub created_at: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Row sent when posting
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub target_id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub parent_id: Option<String>,
}

/// A top-level comment followed by its direct replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread<'a> {
    pub parent: &'a Comment,
    pub replies: Vec<&'a Comment>,
}

/// Group a chronologically ordered flat list into threads.
///
/// Replies keep their input order under their parent. A reply whose parent
/// is not a top-level comment in `comments` is not part of any thread.
pub fn build_threads(comments: &[Comment]) -> Vec<CommentThread<'_>> {
    let (parents, replies): (Vec<&Comment>, Vec<&Comment>) =
        comments.iter().partition(|c| c.parent_id.is_none());

    parents
        .into_iter()
        .map(|parent| CommentThread {
            parent,
            replies: replies
                .iter()
                .copied()
                .filter(|r| r.parent_id.as_deref() == Some(parent.id.as_str()))
                .collect(),
        })
        .collect()
}

/// Comment list and input state for one target
pub struct CommentBoard {
    store: Arc<dyn RemoteStore>,
    table: String,
    target_id: String,
    comments: Vec<Comment>,
    /// Top-level input buffer
    pub draft: String,
    /// Reply input buffer, only meaningful while a reply editor is open
    pub reply_draft: String,
    active_reply: Option<String>,
}

impl CommentBoard {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        table: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            target_id: target_id.into(),
            comments: Vec::new(),
            draft: String::new(),
            reply_draft: String::new(),
            active_reply: None,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// All comments, oldest first
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn threads(&self) -> Vec<CommentThread<'_>> {
        build_threads(&self.comments)
    }

    /// Comment whose reply editor is open
    pub fn active_reply(&self) -> Option<&str> {
        self.active_reply.as_deref()
    }

    /// Open the reply editor under `parent_id`, closing any other
    pub fn open_reply(&mut self, parent_id: impl Into<String>) {
        let parent_id = parent_id.into();
        if self.active_reply.as_deref() != Some(parent_id.as_str()) {
            self.reply_draft.clear();
        }
        self.active_reply = Some(parent_id);
    }

    pub fn close_reply(&mut self) {
        self.active_reply = None;
        self.reply_draft.clear();
    }

    /// Reload the comments for this target, oldest first
    pub async fn load(&mut self) -> Result<&[Comment]> {
        let query = Query::new()
            .eq("target_id", self.target_id.as_str())
            .order_asc("created_at");
        self.comments = self.store.select_as::<Comment>(&self.table, &query).await?;
        tracing::debug!(
            target_id = %self.target_id,
            count = self.comments.len(),
            "Comments loaded"
        );
        Ok(&self.comments)
    }

    /// Post the top-level draft, or the reply draft when `parent_id` is set.
    ///
    /// Needs a signed-in user and non-blank text. A reply must target the
    /// comment whose reply editor is open. On success the stored comment is
    /// appended, the used buffer is cleared and the reply editor closes.
    pub async fn post_comment(
        &mut self,
        session: &SessionProvider,
        parent_id: Option<&str>,
    ) -> Result<&Comment> {
        let identity = session.require()?;

        if parent_id.is_some() && parent_id != self.active_reply.as_deref() {
            return Err(SdkError::Validation(format!(
                "no reply editor open for comment {}",
                parent_id.unwrap_or_default()
            )));
        }

        let text = match parent_id {
            Some(_) => self.reply_draft.trim(),
            None => self.draft.trim(),
        };
        if text.is_empty() {
            return Err(SdkError::Validation("comment text is empty".to_string()));
        }

        let record = NewComment {
            target_id: self.target_id.clone(),
            user_id: identity.user_id.clone(),
            user_name: identity.display_name.clone(),
            text: text.to_string(),
            parent_id: parent_id.map(str::to_string),
        };

        let stored: Comment = self
            .store
            .insert_as(&self.table, &record)
            .await
            .map_err(|e| {
                tracing::error!(target_id = %self.target_id, error = %e, "Failed to post comment");
                e
            })?;

        self.comments.push(stored);
        match parent_id {
            Some(_) => self.close_reply(),
            None => self.draft.clear(),
        }

        let index = self.comments.len() - 1;
        Ok(&self.comments[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, parent: Option<&str>) -> Comment {
        Comment {
            id: id.to_string(),
            target_id: "a-1".to_string(),
            user_name: "budi".to_string(),
            text: format!("text {}", id),
            created_at: format!("2025-01-01T00:00:0{}Z", id.len()),
            parent_id: parent.map(str::to_string),
        }
    }

    fn ids(thread: &CommentThread<'_>) -> (String, Vec<String>) {
        (
            thread.parent.id.clone(),
            thread.replies.iter().map(|r| r.id.clone()).collect(),
        )
    }

    #[test]
    fn test_replies_follow_their_parent_in_order() {
        let comments = vec![
            comment("c1", None),
            comment("c2", None),
            comment("r1", Some("c2")),
            comment("r2", Some("c1")),
            comment("r3", Some("c2")),
        ];

        let threads = build_threads(&comments);
        let shape: Vec<_> = threads.iter().map(ids).collect();
        assert_eq!(
            shape,
            vec![
                ("c1".to_string(), vec!["r2".to_string()]),
                ("c2".to_string(), vec!["r1".to_string(), "r3".to_string()]),
            ]
        );
    }

    #[test]
    fn test_well_formed_input_keeps_every_comment_once() {
        let comments = vec![
            comment("c1", None),
            comment("r1", Some("c1")),
            comment("c2", None),
            comment("r2", Some("c1")),
        ];

        let threads = build_threads(&comments);
        let count: usize = threads.iter().map(|t| 1 + t.replies.len()).sum();
        assert_eq!(count, comments.len());
    }

    #[test]
    fn test_reply_to_reply_is_not_rendered() {
        let comments = vec![
            comment("c1", None),
            comment("r1", Some("c1")),
            comment("rr", Some("r1")),
        ];

        let threads = build_threads(&comments);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.len(), 1);
        assert!(threads.iter().all(|t| t.replies.iter().all(|r| r.id != "rr")));
    }
}
