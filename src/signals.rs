//! Broadcast hooks around review posting and flagging
//!
//! Subscribers are named callbacks held in ordered global lists. Pre-save
//! subscribers run before anything is persisted and may veto the submission;
//! post-save and flag subscribers are purely observational, which is encoded
//! in their signatures rather than left to convention.

use crate::auth::UserInfo;
use crate::orm::{review_flags, review_segments, reviews};
use once_cell::sync::Lazy;
use std::sync::RwLock;

/// Context of the originating request, handed to every subscriber.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub path: String,
    pub ip_address: Option<String>,
    pub user: Option<UserInfo>,
}

/// Verdict of a pre-save subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookResult {
    Proceed,
    /// Discard the submission; the reason is logged, not shown to the user.
    Veto(String),
}

type PreSaveFn = dyn Fn(&reviews::ActiveModel, &[review_segments::ActiveModel], &RequestInfo) -> HookResult
    + Send
    + Sync;
type PostSaveFn =
    dyn Fn(&reviews::Model, &[review_segments::Model], &RequestInfo) + Send + Sync;
type FlagFn = dyn Fn(&reviews::Model, &review_flags::Model, bool) + Send + Sync;

static PRE_SAVE: Lazy<RwLock<Vec<(String, Box<PreSaveFn>)>>> =
    Lazy::new(|| RwLock::new(Vec::new()));
static POST_SAVE: Lazy<RwLock<Vec<(String, Box<PostSaveFn>)>>> =
    Lazy::new(|| RwLock::new(Vec::new()));
static FLAGGED: Lazy<RwLock<Vec<(String, Box<FlagFn>)>>> = Lazy::new(|| RwLock::new(Vec::new()));

/// Subscribe to the pre-save broadcast. Subscribers run in registration
/// order and may veto; the pending review and segments are not yet saved.
pub fn connect_pre_save<F>(name: &str, subscriber: F)
where
    F: Fn(&reviews::ActiveModel, &[review_segments::ActiveModel], &RequestInfo) -> HookResult
        + Send
        + Sync
        + 'static,
{
    PRE_SAVE
        .write()
        .unwrap()
        .push((name.to_string(), Box::new(subscriber)));
}

/// Subscribe to the post-save broadcast (observational only).
pub fn connect_post_save<F>(name: &str, subscriber: F)
where
    F: Fn(&reviews::Model, &[review_segments::Model], &RequestInfo) + Send + Sync + 'static,
{
    POST_SAVE
        .write()
        .unwrap()
        .push((name.to_string(), Box::new(subscriber)));
}

/// Subscribe to flag creation. `created` is false when the flag already
/// existed and the operation was collapsed into it.
pub fn connect_flagged<F>(name: &str, subscriber: F)
where
    F: Fn(&reviews::Model, &review_flags::Model, bool) + Send + Sync + 'static,
{
    FLAGGED
        .write()
        .unwrap()
        .push((name.to_string(), Box::new(subscriber)));
}

/// Run the pre-save broadcast. Returns the name of the vetoing subscriber
/// and its reason on the first veto; later subscribers do not run.
pub fn dispatch_pre_save(
    review: &reviews::ActiveModel,
    segments: &[review_segments::ActiveModel],
    request: &RequestInfo,
) -> Result<(), (String, String)> {
    for (name, subscriber) in PRE_SAVE.read().unwrap().iter() {
        if let HookResult::Veto(reason) = subscriber(review, segments, request) {
            log::info!("Pre-save subscriber {} vetoed a review: {}", name, reason);
            return Err((name.clone(), reason));
        }
    }
    Ok(())
}

/// Run the post-save broadcast.
pub fn dispatch_post_save(
    review: &reviews::Model,
    segments: &[review_segments::Model],
    request: &RequestInfo,
) {
    for (_, subscriber) in POST_SAVE.read().unwrap().iter() {
        subscriber(review, segments, request);
    }
}

/// Run the flag broadcast.
pub fn dispatch_flagged(review: &reviews::Model, flag: &review_flags::Model, created: bool) {
    for (_, subscriber) in FLAGGED.read().unwrap().iter() {
        subscriber(review, flag, created);
    }
}

/// Drop every subscriber. Intended for tests that need a clean slate.
pub fn disconnect_all() {
    PRE_SAVE.write().unwrap().clear();
    POST_SAVE.write().unwrap().clear();
    FLAGGED.write().unwrap().clear();
}
