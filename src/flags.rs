//! Flagging and moderation operations
//!
//! A flag records that one user performed one action on one review; the
//! `(user, review, flag)` triple is unique, so repeating an action collapses
//! into the existing flag instead of accumulating rows. Every operation
//! leaves an audit flag and broadcasts to the flag subscribers.

use crate::auth::UserInfo;
use crate::backend::ReviewStore;
use crate::orm::review_flags::{self, MODERATOR_APPROVAL, MODERATOR_DELETION, SUGGEST_REMOVAL};
use crate::orm::reviews;
use crate::signals;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::DbErr;

/// Whether the operation created a new flag row or found a prior one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOutcome {
    Created,
    Existing,
}

/// Get or create the `(user, review, flag)` row.
///
/// A concurrent request may insert the same triple between our lookup and
/// insert; the unique constraint rejects the second insert, and the re-query
/// then finds the winner's row.
async fn get_or_create(
    store: &dyn ReviewStore,
    user_id: i32,
    review_id: i32,
    flag: &str,
) -> Result<(review_flags::Model, FlagOutcome), DbErr> {
    if let Some(existing) = store.find_flag(user_id, review_id, flag).await? {
        return Ok((existing, FlagOutcome::Existing));
    }

    let pending = review_flags::ActiveModel {
        user_id: Set(user_id),
        review_id: Set(review_id),
        flag: Set(flag.to_string()),
        flag_date: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    match store.insert_flag(pending).await {
        Ok(created) => Ok((created, FlagOutcome::Created)),
        Err(insert_err) => match store.find_flag(user_id, review_id, flag).await? {
            Some(existing) => Ok((existing, FlagOutcome::Existing)),
            None => Err(insert_err),
        },
    }
}

/// Record that `user` suggests removal of `review`.
pub async fn perform_flag(
    store: &dyn ReviewStore,
    user: &UserInfo,
    review: &reviews::Model,
) -> Result<FlagOutcome, DbErr> {
    let (flag, outcome) = get_or_create(store, user.id, review.id, SUGGEST_REMOVAL).await?;
    log::info!(
        "Review {} flagged for removal by user {} ({:?})",
        review.id,
        user.id,
        outcome
    );
    signals::dispatch_flagged(review, &flag, outcome == FlagOutcome::Created);
    Ok(outcome)
}

/// Moderator deletion: mark the review removed and leave an audit flag.
pub async fn perform_delete(
    store: &dyn ReviewStore,
    user: &UserInfo,
    review: reviews::Model,
) -> Result<reviews::Model, DbErr> {
    let (flag, outcome) = get_or_create(store, user.id, review.id, MODERATOR_DELETION).await?;
    let is_public = review.is_public;
    let updated = store.set_moderation(review, is_public, true).await?;
    log::info!("Review {} deleted by moderator {}", updated.id, user.id);
    signals::dispatch_flagged(&updated, &flag, outcome == FlagOutcome::Created);
    Ok(updated)
}

/// Moderator approval: make the review public again and leave an audit flag.
pub async fn perform_approve(
    store: &dyn ReviewStore,
    user: &UserInfo,
    review: reviews::Model,
) -> Result<reviews::Model, DbErr> {
    let (flag, outcome) = get_or_create(store, user.id, review.id, MODERATOR_APPROVAL).await?;
    let updated = store.set_moderation(review, true, false).await?;
    log::info!("Review {} approved by moderator {}", updated.id, user.id);
    signals::dispatch_flagged(&updated, &flag, outcome == FlagOutcome::Created);
    Ok(updated)
}
