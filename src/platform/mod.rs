pub mod http;
pub mod shortcode;

use crate::error::PlatformError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Account handle. Case-sensitive, compared byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform-assigned account id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Media primary key, as decoded from a post shortcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaPk(pub u64);

impl fmt::Display for MediaPk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub user_id: UserId,
    pub username: Username,
}

/// The account the client is logged in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: UserId,
    pub username: Username,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: Username,
    pub follower_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub pk: MediaPk,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub author: UserSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReelShareKind {
    Mention,
    Reply,
    Reaction,
    #[serde(other)]
    Other,
}

/// Story share attached to a direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelShare {
    pub kind: ReelShareKind,
    pub mentioned_user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub timestamp: DateTime<Utc>,
    pub reel_share: Option<ReelShare>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMessageThread {
    pub users: Vec<UserSummary>,
    pub messages: Vec<ThreadMessage>,
}

impl DirectMessageThread {
    /// The thread's counterparty. Multi-recipient story tags arrive as
    /// threads without users and have none.
    pub fn counterparty(&self) -> Option<&UserSummary> {
        self.users.first()
    }
}

/// Per-post engagement counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PostMetrics {
    pub reach: u64,
    pub impressions: u64,
    pub shares: u64,
    pub likes: u64,
    pub comments: u64,
    pub total_engagement: u64,
}

impl PostMetrics {
    pub fn new(reach: u64, impressions: u64, shares: u64, likes: u64, comments: u64) -> Self {
        Self {
            reach,
            impressions,
            shares,
            likes,
            comments,
            total_engagement: likes + comments,
        }
    }
}

/// The calls gramkit makes against the platform's private API.
///
/// Pagination, session cookies and response decoding belong to the
/// implementation; callers only see typed records.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Cheap authenticated call. Fails with [`PlatformError::LoginRequired`]
    /// when the session is missing or expired.
    async fn check_session(&self) -> Result<()>;

    async fn login(
        &self,
        username: &str,
        password: &str,
        verification_code: Option<&str>,
    ) -> Result<SessionUser>;

    fn session_user(&self) -> Option<SessionUser>;

    async fn followers(&self, user_id: &UserId) -> Result<Vec<UserSummary>>;

    async fn media_likers(&self, media: MediaPk) -> Result<Vec<UserSummary>>;

    async fn media_comments(&self, media: MediaPk) -> Result<Vec<Comment>>;

    async fn media_info(&self, media: MediaPk) -> Result<MediaInfo>;

    /// Most recent direct-message threads, at most `amount` of them.
    async fn direct_threads(&self, amount: usize) -> Result<Vec<DirectMessageThread>>;

    async fn user_by_username(&self, username: &str) -> Result<UserProfile>;

    /// Most recent posts of `user_id`, newest first, at most `amount`.
    async fn user_medias(&self, user_id: &UserId, amount: usize) -> Result<Vec<MediaInfo>>;

    /// `None` when the platform has no metrics for the post, which happens
    /// for posts made before the account became a professional account.
    async fn media_insights(&self, media: MediaPk) -> Result<Option<PostMetrics>>;
}
