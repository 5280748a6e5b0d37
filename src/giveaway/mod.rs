//! Giveaway winner selection.
//!
//! Eligibility starts at "follows the account and liked the post". Each
//! eligible user gets one entry, plus one more for commenting and one more
//! for mentioning the account in a story, so nobody holds more than three.

pub mod mentions;

use crate::credentials::CredentialProvider;
use crate::error::{GiveawayError, PlatformError};
use crate::platform::shortcode::media_pk_from_url;
use crate::platform::{MediaPk, Platform, SessionUser, UserSummary, Username};
use crate::session::{self, LoginOptions};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;

/// Followers who liked the post.
pub fn eligible_base(
    followers: &BTreeSet<Username>,
    likers: &BTreeSet<Username>,
) -> BTreeSet<Username> {
    followers.intersection(likers).cloned().collect()
}

/// The three qualifying sets derived from the raw signals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Followers who liked the post
    pub base: BTreeSet<Username>,
    /// Members of `base` who commented
    pub commented: BTreeSet<Username>,
    /// Members of `base` who mentioned the account in a story
    pub mentioned: BTreeSet<Username>,
}

impl Reconciliation {
    pub fn new(
        followers: &BTreeSet<Username>,
        likers: &BTreeSet<Username>,
        commenters: &BTreeSet<Username>,
        mentioners: &BTreeSet<Username>,
    ) -> Self {
        Self::from_base(eligible_base(followers, likers), commenters, mentioners)
    }

    /// Reconcile against an already computed follow+like base.
    pub fn from_base(
        base: BTreeSet<Username>,
        commenters: &BTreeSet<Username>,
        mentioners: &BTreeSet<Username>,
    ) -> Self {
        let commented = commenters.intersection(&base).cloned().collect();
        let mentioned = mentioners.intersection(&base).cloned().collect();

        Self {
            base,
            commented,
            mentioned,
        }
    }

    /// One slot per qualification. Duplicates are the weighting.
    pub fn entries(&self) -> Vec<Username> {
        self.base
            .iter()
            .chain(&self.commented)
            .chain(&self.mentioned)
            .cloned()
            .collect()
    }
}

/// Pick one entry uniformly at random.
pub fn draw_winner<'a, R: Rng + ?Sized>(
    entries: &'a [Username],
    rng: &mut R,
) -> Result<&'a Username, GiveawayError> {
    entries.choose(rng).ok_or(GiveawayError::NoEligibleEntries)
}

#[derive(Debug, Clone)]
pub struct GiveawayOptions {
    pub post_url: String,
    pub thread_limit: usize,
    pub login: LoginOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct GiveawayResult {
    pub followers: BTreeSet<Username>,
    pub likers: BTreeSet<Username>,
    pub commenters: BTreeSet<Username>,
    pub mentioners: BTreeSet<Username>,
    pub entries: Vec<Username>,
    pub winner: Username,
}

fn usernames(users: Vec<UserSummary>) -> BTreeSet<Username> {
    users.into_iter().map(|u| u.username).collect()
}

async fn gather_followers(
    platform: &dyn Platform,
    owner: &SessionUser,
) -> Result<BTreeSet<Username>, PlatformError> {
    tracing::info!("Gathering followers - this may take a few minutes");

    let start = Instant::now();
    let followers = usernames(platform.followers(&owner.user_id).await?);

    tracing::info!(
        "Gathered {} followers in ~{} seconds",
        followers.len(),
        start.elapsed().as_secs()
    );
    Ok(followers)
}

async fn gather_likers(
    platform: &dyn Platform,
    media: MediaPk,
) -> Result<BTreeSet<Username>, PlatformError> {
    tracing::info!(%media, "Getting post likers");
    let likers = usernames(platform.media_likers(media).await?);
    tracing::info!("Found {} likers", likers.len());
    Ok(likers)
}

/// Comment authors, minus the account owner's own replies.
async fn gather_commenters(
    platform: &dyn Platform,
    media: MediaPk,
    owner: &SessionUser,
) -> Result<BTreeSet<Username>, PlatformError> {
    tracing::info!(%media, "Getting post commenters");
    let commenters: BTreeSet<Username> = platform
        .media_comments(media)
        .await?
        .into_iter()
        .map(|c| c.author.username)
        .filter(|name| *name != owner.username)
        .collect();
    tracing::info!("Found {} commenters", commenters.len());
    Ok(commenters)
}

/// Log in if needed, gather every signal for the post at `post_url`, and
/// draw a winner.
pub async fn run<R: Rng + ?Sized>(
    platform: &dyn Platform,
    username: &str,
    credentials: &mut dyn CredentialProvider,
    options: &GiveawayOptions,
    rng: &mut R,
) -> Result<GiveawayResult, GiveawayError> {
    let owner = session::maybe_login(platform, username, credentials, options.login).await?;
    let media = media_pk_from_url(&options.post_url)?;

    let followers = gather_followers(platform, &owner).await?;
    let likers = gather_likers(platform, media).await?;
    let commenters = gather_commenters(platform, media, &owner).await?;

    let posted_at = platform.media_info(media).await?.taken_at;
    let base = eligible_base(&followers, &likers);
    let mentioners = mentions::gather_mentioners(
        platform,
        &owner.user_id,
        &base,
        posted_at,
        options.thread_limit,
    )
    .await?;

    let reconciliation = Reconciliation::from_base(base, &commenters, &mentioners);
    tracing::info!(
        liked = reconciliation.base.len(),
        liked_and_commented = reconciliation.commented.len(),
        liked_and_mentioned = reconciliation.mentioned.len(),
        "Reconciled giveaway signals"
    );

    let entries = reconciliation.entries();
    tracing::info!("Selecting a winner from {} entries", entries.len());
    let winner = draw_winner(&entries, rng)?.clone();

    Ok(GiveawayResult {
        followers,
        likers,
        commenters,
        mentioners,
        entries,
        winner,
    })
}
