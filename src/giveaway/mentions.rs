//! Story-mention inference.
//!
//! The platform has no call listing who mentioned an account in a story, or
//! who shared a given post. A story mention does, however, land in the
//! mentioned account's inbox as a direct message carrying a `reel_share`
//! of type `mention`. This module scans recent threads for those messages.
//!
//! The result is approximate:
//!
//! * a story that tags several accounts arrives as a thread without users;
//!   such threads are skipped and their mentions are lost;
//! * only the first user of a thread is taken as the author;
//! * shares without a mention are invisible, and mentions unrelated to the
//!   giveaway post still count;
//! * only the newest `platform.thread_message_limit` messages of each thread
//!   are fetched (20 by default), so a mention followed by a longer
//!   conversation is not seen.

use crate::platform::{DirectMessageThread, Platform, ReelShareKind, UserId, Username};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Candidates who mentioned `owner` in a story after `cutoff`.
pub fn infer_story_mentioners(
    threads: &[DirectMessageThread],
    candidates: &BTreeSet<Username>,
    owner: &UserId,
    cutoff: DateTime<Utc>,
) -> BTreeSet<Username> {
    threads
        .iter()
        .filter_map(|thread| {
            let author = &thread.counterparty()?.username;
            if !candidates.contains(author) {
                return None;
            }

            let mentioned = thread.messages.iter().any(|message| {
                message.timestamp > cutoff
                    && message.reel_share.as_ref().is_some_and(|share| {
                        share.kind == ReelShareKind::Mention
                            && share.mentioned_user_id.as_ref() == Some(owner)
                    })
            });
            mentioned.then(|| author.clone())
        })
        .collect()
}

/// Scan up to `thread_limit` inbox threads for story mentions of `owner`.
pub async fn gather_mentioners(
    platform: &dyn Platform,
    owner: &UserId,
    candidates: &BTreeSet<Username>,
    cutoff: DateTime<Utc>,
    thread_limit: usize,
) -> crate::platform::Result<BTreeSet<Username>> {
    tracing::info!("Getting story mentioners");

    let threads = platform.direct_threads(thread_limit).await?;
    let skipped = threads.iter().filter(|t| t.users.is_empty()).count();
    if skipped > 0 {
        tracing::debug!(skipped, "Skipping threads without users");
    }

    let mentioners = infer_story_mentioners(&threads, candidates, owner, cutoff);
    tracing::info!("Found {} mentioners", mentioners.len());
    Ok(mentioners)
}
