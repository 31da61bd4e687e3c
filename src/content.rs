//! Content-object resolution
//!
//! Reviews attach to arbitrary host objects addressed by a
//! `(content type descriptor, primary key)` pair, e.g. `("garage.car",
//! "42")`. The host registers one [`ContentResolver`] per reviewable type;
//! the submission controller uses the registry to turn the hidden form
//! fields back into a live target object.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use sea_orm::DbErr;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A resolved content object, as much of it as this subsystem needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetObject {
    /// Type descriptor, e.g. "garage.car"
    pub content_type: String,
    /// Primary key as an opaque string; None when the object has not been
    /// persisted yet (such a target renders a form but lists no reviews)
    pub object_pk: Option<String>,
    /// Canonical location of the object, the redirect of last resort
    pub url: String,
}

/// Looks up one reviewable host type by primary key.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// The descriptor this resolver answers for.
    fn content_type(&self) -> &str;

    /// Fetch the object; `None` when no object exists at that key.
    async fn resolve(&self, object_pk: &str) -> Result<Option<TargetObject>, DbErr>;
}

/// Why a submitted target reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    MissingFields,
    InvalidContentType(String),
    NotFound { content_type: String, object_pk: String },
    Database(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::MissingFields => {
                write!(f, "Missing content_type or object_pk field.")
            }
            ResolveError::InvalidContentType(ctype) => {
                write!(f, "Invalid content_type value: {:?}", ctype)
            }
            ResolveError::NotFound {
                content_type,
                object_pk,
            } => write!(
                f,
                "No object matching content-type {:?} and object PK {:?} exists.",
                content_type, object_pk
            ),
            ResolveError::Database(e) => {
                write!(f, "Looking up the target object failed: {}", e)
            }
        }
    }
}

static RESOLVERS: Lazy<RwLock<HashMap<String, Arc<dyn ContentResolver>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a reviewable content type. Call at startup, once per type.
pub fn register_content_type(resolver: Arc<dyn ContentResolver>) {
    let key = resolver.content_type().to_string();
    let mut map = RESOLVERS.write().unwrap();
    if map.insert(key.clone(), resolver).is_some() {
        log::warn!("Content type {:?} registered twice; replaced", key);
    }
}

/// Resolve the target object named by raw submission fields.
pub async fn resolve_target(
    content_type: Option<&str>,
    object_pk: Option<&str>,
) -> Result<TargetObject, ResolveError> {
    let (ctype, pk) = match (content_type, object_pk) {
        (Some(c), Some(p)) if !c.is_empty() && !p.is_empty() => (c, p),
        _ => return Err(ResolveError::MissingFields),
    };

    let resolver = RESOLVERS
        .read()
        .unwrap()
        .get(ctype)
        .cloned()
        .ok_or_else(|| ResolveError::InvalidContentType(ctype.to_string()))?;

    match resolver.resolve(pk).await {
        Ok(Some(target)) => Ok(target),
        Ok(None) => Err(ResolveError::NotFound {
            content_type: ctype.to_string(),
            object_pk: pk.to_string(),
        }),
        Err(e) => Err(ResolveError::Database(e.to_string())),
    }
}
