//! Backend resolution registry
//!
//! A host application can substitute its own review implementation — the
//! storage operations behind the models, the submission form construction,
//! and the four URL-producing helpers — without touching this crate. A
//! backend is a named bundle of optional capabilities; any capability left
//! as `None` falls back to the built-in implementation. The active backend
//! name comes from configuration (`reviews.backend`) and resolution fails
//! fast with [`ConfigurationError`] when that name was never installed.

use crate::content::TargetObject;
use crate::db::get_db_pool;
use crate::form::{FieldMap, ReviewForm};
use crate::orm::{categories, category_segments, review_flags, review_segments, reviews};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use sea_orm::{entity::*, query::*, ActiveValue::Set, ColumnTrait, DbErr, QueryFilter};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Name of the built-in backend.
pub const DEFAULT_BACKEND: &str = "reviews";

/// The configured backend cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// `reviews.backend` names a backend that was never installed.
    UnknownBackend(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::UnknownBackend(name) => {
                write!(
                    f,
                    "The configured review backend {:?} is not installed",
                    name
                )
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Persistence and query operations behind the review models.
///
/// This is the "model capability": replacing the stored representation of
/// reviews means implementing this trait. The built-in [`DefaultStore`]
/// works on the crate's own sea-orm entities through the global pool.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn category_by_code(&self, code: &str) -> Result<Option<categories::Model>, DbErr>;

    /// Segments of a category in position order; drives the sub-form set.
    async fn category_segments(
        &self,
        category_id: i32,
    ) -> Result<Vec<category_segments::Model>, DbErr>;

    async fn find_review(&self, id: i32) -> Result<Option<reviews::Model>, DbErr>;

    /// Prior reviews by the same author for the same target, for duplicate
    /// suppression.
    async fn duplicate_candidates(
        &self,
        content_type: &str,
        object_pk: &str,
        user_name: &str,
        user_email: &str,
    ) -> Result<Vec<reviews::Model>, DbErr>;

    async fn insert_review(&self, review: reviews::ActiveModel) -> Result<reviews::Model, DbErr>;

    async fn insert_segment(
        &self,
        segment: review_segments::ActiveModel,
    ) -> Result<review_segments::Model, DbErr>;

    /// Flip the moderation bits on a persisted review.
    async fn set_moderation(
        &self,
        review: reviews::Model,
        is_public: bool,
        is_removed: bool,
    ) -> Result<reviews::Model, DbErr>;

    async fn find_flag(
        &self,
        user_id: i32,
        review_id: i32,
        flag: &str,
    ) -> Result<Option<review_flags::Model>, DbErr>;

    async fn insert_flag(
        &self,
        flag: review_flags::ActiveModel,
    ) -> Result<review_flags::Model, DbErr>;
}

/// Built-in store over the crate's own entities.
pub struct DefaultStore;

#[async_trait]
impl ReviewStore for DefaultStore {
    async fn category_by_code(&self, code: &str) -> Result<Option<categories::Model>, DbErr> {
        crate::schema::category_by_code(get_db_pool(), code).await
    }

    async fn category_segments(
        &self,
        category_id: i32,
    ) -> Result<Vec<category_segments::Model>, DbErr> {
        crate::schema::segments_for(get_db_pool(), category_id).await
    }

    async fn find_review(&self, id: i32) -> Result<Option<reviews::Model>, DbErr> {
        reviews::Entity::find_by_id(id).one(get_db_pool()).await
    }

    async fn duplicate_candidates(
        &self,
        content_type: &str,
        object_pk: &str,
        user_name: &str,
        user_email: &str,
    ) -> Result<Vec<reviews::Model>, DbErr> {
        reviews::Entity::find()
            .filter(reviews::Column::ContentType.eq(content_type))
            .filter(reviews::Column::ObjectPk.eq(object_pk))
            .filter(reviews::Column::UserName.eq(user_name))
            .filter(reviews::Column::UserEmail.eq(user_email))
            .all(get_db_pool())
            .await
    }

    async fn insert_review(&self, review: reviews::ActiveModel) -> Result<reviews::Model, DbErr> {
        review.insert(get_db_pool()).await
    }

    async fn insert_segment(
        &self,
        segment: review_segments::ActiveModel,
    ) -> Result<review_segments::Model, DbErr> {
        segment.insert(get_db_pool()).await
    }

    async fn set_moderation(
        &self,
        review: reviews::Model,
        is_public: bool,
        is_removed: bool,
    ) -> Result<reviews::Model, DbErr> {
        let mut active: reviews::ActiveModel = review.into();
        active.is_public = Set(is_public);
        active.is_removed = Set(is_removed);
        active.update(get_db_pool()).await
    }

    async fn find_flag(
        &self,
        user_id: i32,
        review_id: i32,
        flag: &str,
    ) -> Result<Option<review_flags::Model>, DbErr> {
        review_flags::Entity::find()
            .filter(review_flags::Column::UserId.eq(user_id))
            .filter(review_flags::Column::ReviewId.eq(review_id))
            .filter(review_flags::Column::Flag.eq(flag))
            .one(get_db_pool())
            .await
    }

    async fn insert_flag(
        &self,
        flag: review_flags::ActiveModel,
    ) -> Result<review_flags::Model, DbErr> {
        flag.insert(get_db_pool()).await
    }
}

/// Builds the submission form; the "form capability".
pub type FormFactory =
    dyn Fn(TargetObject, categories::Model, FieldMap) -> ReviewForm + Send + Sync;

/// A named bundle of capability overrides. Every field left `None` resolves
/// to the built-in behavior.
#[derive(Default)]
pub struct ReviewBackend {
    pub name: String,
    pub store: Option<Arc<dyn ReviewStore>>,
    pub form: Option<Arc<FormFactory>>,
    pub form_target: Option<fn() -> String>,
    pub flag_url: Option<fn(i32) -> String>,
    pub delete_url: Option<fn(i32) -> String>,
    pub approve_url: Option<fn(i32) -> String>,
}

impl ReviewBackend {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

static REGISTRY: Lazy<RwLock<HashMap<String, Arc<ReviewBackend>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Install a backend. Call at startup before serving requests.
pub fn install(backend: ReviewBackend) {
    let name = backend.name.clone();
    let mut registry = REGISTRY.write().unwrap();
    if registry.insert(name.clone(), Arc::new(backend)).is_some() {
        log::warn!("Review backend {:?} installed twice; replaced", name);
    }
}

/// Remove every installed backend. Intended for tests.
pub fn uninstall_all() {
    REGISTRY.write().unwrap().clear();
}

/// The configured backend name (default: [`DEFAULT_BACKEND`]).
pub fn active_backend_name() -> String {
    crate::app_config::reviews().backend
}

/// Resolve the active backend, failing fast when the configured name is not
/// the default and was never installed.
pub fn resolve() -> Result<Arc<ReviewBackend>, ConfigurationError> {
    let name = active_backend_name();
    if name == DEFAULT_BACKEND {
        // The built-in backend needs no registration; an installed override
        // under the default name is still honored.
        if let Some(backend) = REGISTRY.read().unwrap().get(&name) {
            return Ok(backend.clone());
        }
        return Ok(Arc::new(ReviewBackend::named(DEFAULT_BACKEND)));
    }
    REGISTRY
        .read()
        .unwrap()
        .get(&name)
        .cloned()
        .ok_or(ConfigurationError::UnknownBackend(name))
}

/// The active store implementation.
pub fn store() -> Result<Arc<dyn ReviewStore>, ConfigurationError> {
    let backend = resolve()?;
    Ok(backend.store.clone().unwrap_or_else(|| Arc::new(DefaultStore)))
}

/// Build the submission form through the active backend.
pub fn build_form(
    target: TargetObject,
    category: categories::Model,
    data: FieldMap,
) -> Result<ReviewForm, ConfigurationError> {
    let backend = resolve()?;
    Ok(match &backend.form {
        Some(factory) => factory(target, category, data),
        None => ReviewForm::new(target, category, data),
    })
}

/// Target URL of the review submission form.
pub fn form_target() -> Result<String, ConfigurationError> {
    let backend = resolve()?;
    Ok(match backend.form_target {
        Some(f) => f(),
        None => "/reviews/post".to_string(),
    })
}

/// URL for the "flag this review" action.
pub fn flag_url(review_id: i32) -> Result<String, ConfigurationError> {
    let backend = resolve()?;
    Ok(match backend.flag_url {
        Some(f) => f(review_id),
        None => format!("/reviews/{}/flag", review_id),
    })
}

/// URL for the "delete this review" moderation action.
pub fn delete_url(review_id: i32) -> Result<String, ConfigurationError> {
    let backend = resolve()?;
    Ok(match backend.delete_url {
        Some(f) => f(review_id),
        None => format!("/reviews/{}/delete", review_id),
    })
}

/// URL for the "approve this review" moderation action.
pub fn approve_url(review_id: i32) -> Result<String, ConfigurationError> {
    let backend = resolve()?;
    Ok(match backend.approve_url {
        Some(f) => f(review_id),
        None => format!("/reviews/{}/approve", review_id),
    })
}
