use super::{
    Comment, DirectMessageThread, MediaInfo, MediaPk, Platform, PostMetrics, ReelShare,
    ReelShareKind, Result, SessionUser, ThreadMessage, UserId, UserProfile, UserSummary,
    Username,
};
use crate::config::PlatformConfig;
use crate::error::PlatformError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::RwLock;
use std::time::Duration;

/// [`Platform`] over the private JSON API, keeping the session in a cookie jar.
pub struct HttpPlatform {
    base_url: String,
    page_size: usize,
    /// Messages fetched per thread when listing the inbox
    thread_message_limit: usize,
    client: reqwest::Client,
    session: RwLock<Option<SessionUser>>,
}

// Wire records. Ids arrive as numbers or strings depending on the endpoint.

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Number(u64),
    Text(String),
}

impl From<ApiId> for String {
    fn from(id: ApiId) -> Self {
        match id {
            ApiId::Number(n) => n.to_string(),
            ApiId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiTimestamp {
    Number(i64),
    Text(String),
}

impl ApiTimestamp {
    fn value(&self) -> Option<i64> {
        match self {
            ApiTimestamp::Number(n) => Some(*n),
            ApiTimestamp::Text(s) => s.parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    pk: ApiId,
    username: String,
}

impl From<ApiUser> for UserSummary {
    fn from(user: ApiUser) -> Self {
        UserSummary {
            user_id: UserId::new(user.pk),
            username: Username::new(user.username),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentUserResponse {
    user: ApiUser,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    logged_in_user: Option<ApiUser>,
    #[serde(default)]
    two_factor_required: bool,
    #[serde(default)]
    two_factor_info: Option<TwoFactorInfo>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwoFactorInfo {
    two_factor_identifier: String,
}

#[derive(Debug, Deserialize)]
struct UserListPage {
    users: Vec<ApiUser>,
    #[serde(default)]
    next_max_id: Option<ApiId>,
}

#[derive(Debug, Deserialize)]
struct CommentPage {
    comments: Vec<ApiComment>,
    #[serde(default)]
    next_min_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiComment {
    user: ApiUser,
}

#[derive(Debug, Deserialize)]
struct ApiMedia {
    pk: ApiId,
    taken_at: ApiTimestamp,
}

#[derive(Debug, Deserialize)]
struct MediaInfoResponse {
    items: Vec<ApiMedia>,
}

#[derive(Debug, Deserialize)]
struct UserFeedPage {
    items: Vec<ApiMedia>,
    #[serde(default)]
    more_available: bool,
    #[serde(default)]
    next_max_id: Option<ApiId>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    user: ApiProfile,
}

#[derive(Debug, Deserialize)]
struct ApiProfile {
    pk: ApiId,
    username: String,
    #[serde(default)]
    follower_count: u64,
}

#[derive(Debug, Deserialize)]
struct InboxResponse {
    inbox: ApiInbox,
}

#[derive(Debug, Deserialize)]
struct ApiInbox {
    threads: Vec<ApiThread>,
    #[serde(default)]
    has_older: bool,
    #[serde(default)]
    oldest_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiThread {
    #[serde(default)]
    users: Vec<ApiUser>,
    #[serde(default)]
    items: Vec<ApiThreadItem>,
}

#[derive(Debug, Deserialize)]
struct ApiThreadItem {
    /// Microseconds since the epoch
    timestamp: ApiTimestamp,
    #[serde(default)]
    reel_share: Option<ApiReelShare>,
}

#[derive(Debug, Deserialize)]
struct ApiReelShare {
    #[serde(rename = "type")]
    kind: ReelShareKind,
    #[serde(default)]
    mentioned_user_id: Option<ApiId>,
}

#[derive(Debug, Deserialize)]
struct MediaInsightsResponse {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    comment_count: u64,
    #[serde(default)]
    inline_insights_node: Option<InlineInsightsNode>,
}

#[derive(Debug, Deserialize)]
struct InlineInsightsNode {
    #[serde(default)]
    metrics: Option<ApiMetrics>,
}

#[derive(Debug, Deserialize)]
struct ApiMetrics {
    #[serde(default)]
    reach_count: Option<u64>,
    #[serde(default)]
    impression_count: Option<u64>,
    #[serde(default)]
    share_count: Option<ShareCount>,
}

#[derive(Debug, Deserialize)]
struct ShareCount {
    tray: ShareTray,
}

#[derive(Debug, Deserialize)]
struct ShareTray {
    #[serde(default)]
    nodes: Vec<ShareNode>,
}

#[derive(Debug, Deserialize)]
struct ShareNode {
    #[serde(default)]
    value: u64,
}

impl TryFrom<ApiMedia> for MediaInfo {
    type Error = PlatformError;

    fn try_from(media: ApiMedia) -> Result<Self> {
        let pk: String = media.pk.into();
        let pk = pk
            .split('_')
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| PlatformError::InvalidResponse(format!("media pk {:?}", pk)))?;
        let taken_at = media
            .taken_at
            .value()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| PlatformError::InvalidResponse("media taken_at".to_string()))?;

        Ok(MediaInfo {
            pk: MediaPk(pk),
            taken_at,
        })
    }
}

impl TryFrom<ApiThread> for DirectMessageThread {
    type Error = PlatformError;

    fn try_from(thread: ApiThread) -> Result<Self> {
        let messages = thread
            .items
            .into_iter()
            .map(|item| {
                let timestamp = item
                    .timestamp
                    .value()
                    .and_then(DateTime::<Utc>::from_timestamp_micros)
                    .ok_or_else(|| {
                        PlatformError::InvalidResponse("direct message timestamp".to_string())
                    })?;
                Ok(ThreadMessage {
                    timestamp,
                    reel_share: item.reel_share.map(|share| ReelShare {
                        kind: share.kind,
                        mentioned_user_id: share.mentioned_user_id.map(UserId::new),
                    }),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DirectMessageThread {
            users: thread.users.into_iter().map(UserSummary::from).collect(),
            messages,
        })
    }
}

impl MediaInsightsResponse {
    fn into_metrics(self) -> Option<PostMetrics> {
        let metrics = self.inline_insights_node?.metrics?;
        if metrics.reach_count.is_none()
            && metrics.impression_count.is_none()
            && metrics.share_count.is_none()
        {
            return None;
        }

        let shares = metrics
            .share_count
            .map(|s| s.tray.nodes.iter().map(|n| n.value).sum())
            .unwrap_or(0);

        Some(PostMetrics::new(
            metrics.reach_count.unwrap_or(0),
            metrics.impression_count.unwrap_or(0),
            shares,
            self.like_count,
            self.comment_count,
        ))
    }
}

fn is_login_required(status: reqwest::StatusCode, message: Option<&str>) -> bool {
    status == reqwest::StatusCode::UNAUTHORIZED
        || matches!(message, Some("login_required") | Some("Login required"))
}

impl HttpPlatform {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
            thread_message_limit: config.thread_message_limit.max(1),
            client,
            session: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn set_session(&self, user: SessionUser) {
        if let Ok(mut guard) = self.session.write() {
            *guard = Some(user);
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        tracing::debug!(path, "GET");
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            if is_login_required(status, message.as_deref()) {
                return Err(PlatformError::LoginRequired);
            }
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: message.unwrap_or(body),
            });
        }

        serde_json::from_str(&body).map_err(|e| PlatformError::InvalidResponse(e.to_string()))
    }

    async fn post_login(&self, path: &str, form: &[(&str, &str)]) -> Result<LoginResponse> {
        tracing::debug!(path, "POST");
        let response = self.client.post(self.url(path)).form(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Two-factor challenges come back as 400 with a regular login body
        match serde_json::from_str::<LoginResponse>(&body) {
            Ok(login) if status.is_success() || login.two_factor_required => Ok(login),
            Ok(login) => Err(PlatformError::Api {
                status: status.as_u16(),
                message: login.message.unwrap_or(body),
            }),
            Err(e) if status.is_success() => Err(PlatformError::InvalidResponse(e.to_string())),
            Err(_) => Err(PlatformError::Api {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

#[async_trait]
impl Platform for HttpPlatform {
    async fn check_session(&self) -> Result<()> {
        let current: CurrentUserResponse = self
            .get("accounts/current_user/", &[("edit", "true".to_string())])
            .await?;
        self.set_session(SessionUser {
            user_id: UserId::new(current.user.pk),
            username: Username::new(current.user.username),
        });
        Ok(())
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
        verification_code: Option<&str>,
    ) -> Result<SessionUser> {
        let mut login = self
            .post_login(
                "accounts/login/",
                &[("username", username), ("password", password)],
            )
            .await?;

        if login.two_factor_required {
            let code = verification_code.ok_or(PlatformError::TwoFactorRequired)?;
            let identifier = login
                .two_factor_info
                .map(|info| info.two_factor_identifier)
                .ok_or_else(|| {
                    PlatformError::InvalidResponse("two_factor_info missing".to_string())
                })?;
            login = self
                .post_login(
                    "accounts/two_factor_login/",
                    &[
                        ("username", username),
                        ("verification_code", code),
                        ("two_factor_identifier", identifier.as_str()),
                    ],
                )
                .await?;
        }

        let user = login
            .logged_in_user
            .ok_or_else(|| PlatformError::InvalidResponse("logged_in_user missing".to_string()))?;
        let session = SessionUser {
            user_id: UserId::new(user.pk),
            username: Username::new(user.username),
        };
        self.set_session(session.clone());
        Ok(session)
    }

    fn session_user(&self) -> Option<SessionUser> {
        self.session.read().ok().and_then(|guard| guard.clone())
    }

    async fn followers(&self, user_id: &UserId) -> Result<Vec<UserSummary>> {
        let path = format!("friendships/{}/followers/", user_id);
        let mut users = Vec::new();
        let mut max_id: Option<String> = None;

        loop {
            let mut query = vec![("count", self.page_size.to_string())];
            if let Some(cursor) = max_id.take() {
                query.push(("max_id", cursor));
            }
            let page: UserListPage = self.get(&path, &query).await?;
            let received = page.users.len();
            users.extend(page.users.into_iter().map(UserSummary::from));

            match page.next_max_id {
                Some(next) if received > 0 => max_id = Some(next.into()),
                _ => break,
            }
        }

        Ok(users)
    }

    async fn media_likers(&self, media: MediaPk) -> Result<Vec<UserSummary>> {
        let page: UserListPage = self.get(&format!("media/{}/likers/", media), &[]).await?;
        Ok(page.users.into_iter().map(UserSummary::from).collect())
    }

    async fn media_comments(&self, media: MediaPk) -> Result<Vec<Comment>> {
        let path = format!("media/{}/comments/", media);
        let mut comments = Vec::new();
        let mut min_id: Option<String> = None;

        loop {
            let mut query = vec![("can_support_threading", "true".to_string())];
            if let Some(cursor) = min_id.take() {
                query.push(("min_id", cursor));
            }
            let page: CommentPage = self.get(&path, &query).await?;
            let received = page.comments.len();
            comments.extend(page.comments.into_iter().map(|c| Comment {
                author: c.user.into(),
            }));

            match page.next_min_id {
                Some(next) if received > 0 => min_id = Some(next),
                _ => break,
            }
        }

        Ok(comments)
    }

    async fn media_info(&self, media: MediaPk) -> Result<MediaInfo> {
        let info: MediaInfoResponse = self.get(&format!("media/{}/info/", media), &[]).await?;
        info.items
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::InvalidResponse(format!("no info for media {}", media)))?
            .try_into()
    }

    async fn direct_threads(&self, amount: usize) -> Result<Vec<DirectMessageThread>> {
        let mut threads = Vec::new();
        let mut cursor: Option<String> = None;

        while threads.len() < amount {
            let limit = self.page_size.min(amount - threads.len());
            let mut query = vec![
                ("limit", limit.to_string()),
                ("thread_message_limit", self.thread_message_limit.to_string()),
            ];
            if let Some(c) = cursor.take() {
                query.push(("cursor", c));
            }

            let page: InboxResponse = self.get("direct_v2/inbox/", &query).await?;
            let received = page.inbox.threads.len();
            for thread in page.inbox.threads.into_iter().take(amount - threads.len()) {
                threads.push(DirectMessageThread::try_from(thread)?);
            }

            match page.inbox.oldest_cursor {
                Some(next) if page.inbox.has_older && received > 0 => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!(threads = threads.len(), "Fetched direct threads");
        Ok(threads)
    }

    async fn user_by_username(&self, username: &str) -> Result<UserProfile> {
        let path = format!("users/{}/usernameinfo/", urlencoding::encode(username));
        let info: UserInfoResponse = self.get(&path, &[]).await?;
        Ok(UserProfile {
            user_id: UserId::new(info.user.pk),
            username: Username::new(info.user.username),
            follower_count: info.user.follower_count,
        })
    }

    async fn user_medias(&self, user_id: &UserId, amount: usize) -> Result<Vec<MediaInfo>> {
        let path = format!("feed/user/{}/", user_id);
        let mut medias = Vec::new();
        let mut max_id: Option<String> = None;

        while medias.len() < amount {
            let mut query = vec![("count", self.page_size.min(amount - medias.len()).to_string())];
            if let Some(cursor) = max_id.take() {
                query.push(("max_id", cursor));
            }

            let page: UserFeedPage = self.get(&path, &query).await?;
            let received = page.items.len();
            for item in page.items.into_iter().take(amount - medias.len()) {
                medias.push(MediaInfo::try_from(item)?);
            }

            match page.next_max_id {
                Some(next) if page.more_available && received > 0 => max_id = Some(next.into()),
                _ => break,
            }
        }

        Ok(medias)
    }

    async fn media_insights(&self, media: MediaPk) -> Result<Option<PostMetrics>> {
        let response: MediaInsightsResponse =
            self.get(&format!("insights/media/{}/", media), &[]).await?;
        Ok(response.into_metrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn platform(server: &MockServer) -> HttpPlatform {
        let config = PlatformConfig {
            base_url: server.uri(),
            page_size: 2,
            ..PlatformConfig::default()
        };
        HttpPlatform::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_check_session_login_required() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/current_user/"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({"message": "login_required", "status": "fail"})),
            )
            .mount(&server)
            .await;

        let result = platform(&server).check_session().await;
        assert!(matches!(result, Err(PlatformError::LoginRequired)));
    }

    #[tokio::test]
    async fn test_check_session_other_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/current_user/"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(json!({"message": "Please wait"})),
            )
            .mount(&server)
            .await;

        match platform(&server).check_session().await {
            Err(PlatformError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Please wait");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_session_records_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/current_user/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"user": {"pk": 42, "username": "owner"}})),
            )
            .mount(&server)
            .await;

        let platform = platform(&server);
        platform.check_session().await.unwrap();
        let session = platform.session_user().unwrap();
        assert_eq!(session.user_id, UserId::new("42"));
        assert_eq!(session.username, Username::new("owner"));
    }

    #[tokio::test]
    async fn test_login_with_two_factor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts/login/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "two_factor_required": true,
                "two_factor_info": {"two_factor_identifier": "abc"},
                "message": "two factor required"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts/two_factor_login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logged_in_user": {"pk": "7", "username": "owner"},
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let platform = platform(&server);
        let session = platform
            .login("owner", "hunter2", Some("123456"))
            .await
            .unwrap();
        assert_eq!(session.user_id, UserId::new("7"));
        assert_eq!(platform.session_user(), Some(session));
    }

    #[tokio::test]
    async fn test_login_two_factor_without_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts/login/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "two_factor_required": true,
                "two_factor_info": {"two_factor_identifier": "abc"}
            })))
            .mount(&server)
            .await;

        let result = platform(&server).login("owner", "hunter2", None).await;
        assert!(matches!(result, Err(PlatformError::TwoFactorRequired)));
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts/login/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "The password you entered is incorrect.",
                "status": "fail"
            })))
            .mount(&server)
            .await;

        match platform(&server).login("owner", "wrong", None).await {
            Err(PlatformError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains("incorrect"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_followers_paginates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/friendships/42/followers/"))
            .and(query_param("max_id", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{"pk": 3, "username": "carol"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/friendships/42/followers/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{"pk": 1, "username": "alice"}, {"pk": 2, "username": "bob"}],
                "next_max_id": "page2"
            })))
            .mount(&server)
            .await;

        let followers = platform(&server)
            .followers(&UserId::new("42"))
            .await
            .unwrap();
        let names: Vec<_> = followers.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_media_info_decodes_taken_at() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/99/info/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"pk": 99, "taken_at": 1_700_000_000, "like_count": 10, "comment_count": 2}]
            })))
            .mount(&server)
            .await;

        let info = platform(&server).media_info(MediaPk(99)).await.unwrap();
        assert_eq!(info.pk, MediaPk(99));
        assert_eq!(info.taken_at.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_direct_threads_decodes_reel_share() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct_v2/inbox/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "inbox": {
                    "threads": [
                        {
                            "users": [{"pk": 1, "username": "alice"}],
                            "items": [
                                {
                                    "timestamp": "1700000000000000",
                                    "item_type": "reel_share",
                                    "reel_share": {"type": "mention", "mentioned_user_id": 42}
                                },
                                {"timestamp": 1700000001000000_i64, "item_type": "text"}
                            ]
                        },
                        {
                            "users": [],
                            "items": [{
                                "timestamp": 1700000002000000_i64,
                                "reel_share": {"type": "reaction"}
                            }]
                        }
                    ],
                    "has_older": false
                }
            })))
            .mount(&server)
            .await;

        let threads = platform(&server).direct_threads(10).await.unwrap();
        assert_eq!(threads.len(), 2);

        let first = &threads[0];
        assert_eq!(first.counterparty().unwrap().username, Username::new("alice"));
        assert_eq!(first.messages.len(), 2);
        let share = first.messages[0].reel_share.as_ref().unwrap();
        assert_eq!(share.kind, ReelShareKind::Mention);
        assert_eq!(share.mentioned_user_id, Some(UserId::new("42")));
        assert_eq!(first.messages[0].timestamp.timestamp(), 1_700_000_000);
        assert!(first.messages[1].reel_share.is_none());

        assert!(threads[1].counterparty().is_none());
        assert_eq!(
            threads[1].messages[0].reel_share.as_ref().unwrap().kind,
            ReelShareKind::Reaction
        );
    }

    #[tokio::test]
    async fn test_direct_threads_respects_amount() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct_v2/inbox/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "inbox": {
                    "threads": [
                        {"users": [{"pk": 1, "username": "a"}], "items": []},
                        {"users": [{"pk": 2, "username": "b"}], "items": []}
                    ],
                    "has_older": true,
                    "oldest_cursor": "older"
                }
            })))
            .mount(&server)
            .await;

        let threads = platform(&server).direct_threads(3).await.unwrap();
        assert_eq!(threads.len(), 3);
    }

    #[tokio::test]
    async fn test_user_by_username() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/owner/usernameinfo/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"pk": 42, "username": "owner", "follower_count": 1234}
            })))
            .mount(&server)
            .await;

        let profile = platform(&server).user_by_username("owner").await.unwrap();
        assert_eq!(profile.user_id, UserId::new("42"));
        assert_eq!(profile.follower_count, 1234);
    }

    #[tokio::test]
    async fn test_direct_threads_sends_message_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct_v2/inbox/"))
            .and(query_param("thread_message_limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "inbox": {"threads": [{"users": [{"pk": 1, "username": "a"}], "items": []}]}
            })))
            .mount(&server)
            .await;

        let config = PlatformConfig {
            base_url: server.uri(),
            thread_message_limit: 5,
            ..PlatformConfig::default()
        };
        let threads = HttpPlatform::new(&config)
            .unwrap()
            .direct_threads(10)
            .await
            .unwrap();
        assert_eq!(threads.len(), 1);
    }

    #[tokio::test]
    async fn test_media_likers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/99/likers/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{"pk": 1, "username": "alice"}, {"pk": "2", "username": "bob"}]
            })))
            .mount(&server)
            .await;

        let likers = platform(&server).media_likers(MediaPk(99)).await.unwrap();
        assert_eq!(likers.len(), 2);
        assert_eq!(likers[1].user_id, UserId::new("2"));
        assert_eq!(likers[1].username, Username::new("bob"));
    }

    #[tokio::test]
    async fn test_media_comments_follows_min_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/99/comments/"))
            .and(query_param("min_id", "c2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "comments": [{"user": {"pk": 3, "username": "carol"}, "text": "hi"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/99/comments/"))
            .and(query_param("can_support_threading", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "comments": [
                    {"user": {"pk": 1, "username": "alice"}, "text": "me"},
                    {"user": {"pk": 2, "username": "bob"}, "text": "me too"}
                ],
                "next_min_id": "c2"
            })))
            .mount(&server)
            .await;

        let comments = platform(&server)
            .media_comments(MediaPk(99))
            .await
            .unwrap();
        let names: Vec<_> = comments
            .iter()
            .map(|c| c.author.username.as_str())
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_user_medias_paginates_up_to_amount() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed/user/42/"))
            .and(query_param("max_id", "m2"))
            .and(query_param("count", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"pk": 3, "taken_at": 1_700_000_300},
                    {"pk": 4, "taken_at": 1_700_000_400}
                ],
                "more_available": true,
                "next_max_id": "m3"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/feed/user/42/"))
            .and(query_param("count", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"pk": 1, "taken_at": 1_700_000_100},
                    {"pk": "2", "taken_at": "1700000200"}
                ],
                "more_available": true,
                "next_max_id": "m2"
            })))
            .mount(&server)
            .await;

        let medias = platform(&server)
            .user_medias(&UserId::new("42"), 3)
            .await
            .unwrap();
        let pks: Vec<_> = medias.iter().map(|m| m.pk).collect();
        assert_eq!(pks, vec![MediaPk(1), MediaPk(2), MediaPk(3)]);
        assert_eq!(medias[1].taken_at.timestamp(), 1_700_000_200);
    }

    #[tokio::test]
    async fn test_media_insights_populated_and_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/insights/media/7/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "like_count": 10,
                "comment_count": 2,
                "inline_insights_node": {
                    "metrics": {
                        "reach_count": 80,
                        "impression_count": 120,
                        "share_count": {"tray": {"nodes": [{"value": 1}]}}
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/insights/media/8/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "like_count": 4,
                "comment_count": 0,
                "inline_insights_node": {"metrics": null}
            })))
            .mount(&server)
            .await;

        let platform = platform(&server);
        assert_eq!(
            platform.media_insights(MediaPk(7)).await.unwrap(),
            Some(PostMetrics::new(80, 120, 1, 10, 2))
        );
        assert_eq!(platform.media_insights(MediaPk(8)).await.unwrap(), None);
    }

    #[test]
    fn test_insights_metrics_mapping() {
        let response: MediaInsightsResponse = serde_json::from_value(json!({
            "like_count": 100,
            "comment_count": 20,
            "inline_insights_node": {
                "metrics": {
                    "reach_count": 900,
                    "impression_count": 1500,
                    "share_count": {"tray": {"nodes": [{"value": 3}, {"value": 4}]}}
                }
            }
        }))
        .unwrap();

        assert_eq!(
            response.into_metrics(),
            Some(PostMetrics {
                reach: 900,
                impressions: 1500,
                shares: 7,
                likes: 100,
                comments: 20,
                total_engagement: 120,
            })
        );
    }

    #[test]
    fn test_insights_empty_metrics_is_none() {
        let empty: MediaInsightsResponse = serde_json::from_value(json!({
            "like_count": 5,
            "comment_count": 1,
            "inline_insights_node": {"metrics": {}}
        }))
        .unwrap();
        assert_eq!(empty.into_metrics(), None);

        let null: MediaInsightsResponse = serde_json::from_value(json!({
            "like_count": 5,
            "comment_count": 1,
            "inline_insights_node": {"metrics": null}
        }))
        .unwrap();
        assert_eq!(null.into_metrics(), None);
    }

    #[test]
    fn test_unknown_reel_share_kind() {
        let share: ApiReelShare =
            serde_json::from_value(json!({"type": "story_chain", "mentioned_user_id": "1"}))
                .unwrap();
        assert_eq!(share.kind, ReelShareKind::Other);
    }
}
