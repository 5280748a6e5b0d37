//! Account performance over recent posts.
//!
//! Raw comment counts include the owner's own replies. `comment_pct` is the
//! share of comments assumed to be such replies and is removed before the
//! engagement rate is computed.

use crate::credentials::CredentialProvider;
use crate::error::InsightsError;
use crate::platform::{MediaInfo, Platform, PostMetrics};
use crate::session::{self, LoginOptions};
use serde::Serialize;

/// Per-post averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateInsights {
    pub reach: f64,
    pub impressions: f64,
    pub shares: f64,
    pub likes: f64,
    /// Already discounted by `comment_pct`
    pub comments: f64,
    pub total_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountPerformance {
    /// Posts requested
    pub posts: usize,
    /// Posts that returned metrics and went into the averages
    pub posts_with_insights: usize,
    pub current_follower_count: u64,
    pub engagement: f64,
    pub per_post_reach: f64,
    pub per_post_impressions: f64,
    pub per_post_shares: f64,
}

#[derive(Debug, Clone)]
pub struct InsightsOptions {
    pub num_posts: usize,
    pub comment_pct: f64,
    pub login: LoginOptions,
}

/// Average `metrics` and discount comments. `None` for an empty slice.
///
/// `comment_pct` must lie within [0, 1]; [`run`] rejects anything else
/// before making any call.
pub fn aggregate(metrics: &[PostMetrics], comment_pct: f64) -> Option<AggregateInsights> {
    debug_assert!((0.0..=1.0).contains(&comment_pct));
    if metrics.is_empty() {
        return None;
    }

    tracing::info!("Aggregating insights.");

    let n = metrics.len() as f64;
    let mean =
        |field: fn(&PostMetrics) -> u64| metrics.iter().map(field).sum::<u64>() as f64 / n;

    let likes = mean(|m| m.likes);
    let comments = mean(|m| m.comments) * (1.0 - comment_pct);

    Some(AggregateInsights {
        reach: mean(|m| m.reach),
        impressions: mean(|m| m.impressions),
        shares: mean(|m| m.shares),
        likes,
        comments,
        total_engagement: likes + comments,
    })
}

/// Average engagement per post as a share of the follower base.
pub fn engagement_rate(
    aggregate: &AggregateInsights,
    follower_count: u64,
    username: &str,
) -> Result<f64, InsightsError> {
    if follower_count == 0 {
        return Err(InsightsError::NoFollowers(username.to_string()));
    }
    Ok(aggregate.total_engagement / follower_count as f64)
}

async fn collect_metrics(
    platform: &dyn Platform,
    posts: &[MediaInfo],
) -> Result<Vec<PostMetrics>, InsightsError> {
    let mut metrics = Vec::with_capacity(posts.len());
    for post in posts {
        match platform.media_insights(post.pk).await? {
            Some(m) => metrics.push(m),
            None => tracing::debug!(media = %post.pk, "No insights for post"),
        }
    }
    Ok(metrics)
}

/// Log in if needed and compute performance over the latest posts of
/// `username`. `None` when no post has insights.
pub async fn run(
    platform: &dyn Platform,
    username: &str,
    credentials: &mut dyn CredentialProvider,
    options: &InsightsOptions,
) -> Result<Option<AccountPerformance>, InsightsError> {
    if !(0.0..=1.0).contains(&options.comment_pct) {
        return Err(InsightsError::InvalidCommentShare(options.comment_pct));
    }

    tracing::info!(
        "Gathering account performance data from {} {} posts.",
        options.num_posts,
        username
    );

    session::maybe_login(platform, username, credentials, options.login).await?;

    tracing::info!("Gathering information about each post.");
    let profile = platform.user_by_username(username).await?;
    let posts = platform
        .user_medias(&profile.user_id, options.num_posts)
        .await?;
    let metrics = collect_metrics(platform, &posts).await?;

    let Some(averages) = aggregate(&metrics, options.comment_pct) else {
        tracing::info!("No insights available.");
        return Ok(None);
    };

    let engagement = engagement_rate(&averages, profile.follower_count, username)?;

    Ok(Some(AccountPerformance {
        posts: options.num_posts,
        posts_with_insights: metrics.len(),
        current_follower_count: profile.follower_count,
        engagement,
        per_post_reach: averages.reach,
        per_post_impressions: averages.impressions,
        per_post_shares: averages.shares,
    }))
}
