//! Shared fixtures for the endpoint tests: an in-memory review store, a
//! fixed content resolver, and a header-driven auth provider.

use actix_web::HttpRequest;
use async_trait::async_trait;
use critique::auth::{AuthProvider, UserInfo};
use critique::backend::{ReviewBackend, ReviewStore};
use critique::content::{ContentResolver, TargetObject};
use critique::form::FieldMap;
use critique::orm::{categories, category_segments, review_flags, review_segments, reviews};
use sea_orm::ActiveValue::Set;
use sea_orm::DbErr;
use std::sync::{Arc, Mutex, Once};

pub const CONTENT_TYPE: &str = "garage.car";
pub const OBJECT_PK: &str = "42";
pub const CATEGORY_CODE: &str = "service";

fn set_or<T: Clone>(value: &sea_orm::ActiveValue<T>, default: T) -> T
where
    T: Into<sea_orm::Value>,
{
    match value {
        Set(v) => v.clone(),
        _ => default,
    }
}

/// Store backed by vectors, close enough to the real thing for endpoint
/// behavior.
#[derive(Default)]
pub struct MemoryStore {
    pub categories: Vec<categories::Model>,
    pub segments: Vec<category_segments::Model>,
    pub reviews: Mutex<Vec<reviews::Model>>,
    pub review_segments: Mutex<Vec<review_segments::Model>>,
    pub flags: Mutex<Vec<review_flags::Model>>,
}

impl MemoryStore {
    /// One category with two segments, no reviews yet.
    pub fn with_fixture() -> Arc<Self> {
        Arc::new(Self {
            categories: vec![categories::Model {
                id: 3,
                code: CATEGORY_CODE.to_string(),
            }],
            segments: vec![
                category_segments::Model {
                    id: 10,
                    title: "cleanliness".to_string(),
                    position: 0,
                    category_id: 3,
                },
                category_segments::Model {
                    id: 11,
                    title: "speed".to_string(),
                    position: 1,
                    category_id: 3,
                },
            ],
            ..Default::default()
        })
    }

    pub fn review_count(&self) -> usize {
        self.reviews.lock().unwrap().len()
    }

    pub fn segment_count(&self) -> usize {
        self.review_segments.lock().unwrap().len()
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn category_by_code(&self, code: &str) -> Result<Option<categories::Model>, DbErr> {
        Ok(self.categories.iter().find(|c| c.code == code).cloned())
    }

    async fn category_segments(
        &self,
        category_id: i32,
    ) -> Result<Vec<category_segments::Model>, DbErr> {
        let mut segments: Vec<_> = self
            .segments
            .iter()
            .filter(|s| s.category_id == category_id)
            .cloned()
            .collect();
        segments.sort_by_key(|s| s.position);
        Ok(segments)
    }

    async fn find_review(&self, id: i32) -> Result<Option<reviews::Model>, DbErr> {
        Ok(self.reviews.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn duplicate_candidates(
        &self,
        content_type: &str,
        object_pk: &str,
        user_name: &str,
        user_email: &str,
    ) -> Result<Vec<reviews::Model>, DbErr> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.content_type == content_type
                    && r.object_pk == object_pk
                    && r.user_name == user_name
                    && r.user_email == user_email
            })
            .cloned()
            .collect())
    }

    async fn insert_review(&self, review: reviews::ActiveModel) -> Result<reviews::Model, DbErr> {
        let mut rows = self.reviews.lock().unwrap();
        let model = reviews::Model {
            id: rows.len() as i32 + 1,
            content_type: set_or(&review.content_type, String::new()),
            object_pk: set_or(&review.object_pk, String::new()),
            site_id: set_or(&review.site_id, 0),
            user_id: set_or(&review.user_id, None),
            user_name: set_or(&review.user_name, String::new()),
            user_email: set_or(&review.user_email, String::new()),
            text: set_or(&review.text, String::new()),
            submit_date: set_or(&review.submit_date, chrono::Utc::now().naive_utc()),
            ip_address: set_or(&review.ip_address, None),
            is_public: set_or(&review.is_public, false),
            is_removed: set_or(&review.is_removed, false),
            category_id: set_or(&review.category_id, 0),
        };
        rows.push(model.clone());
        Ok(model)
    }

    async fn insert_segment(
        &self,
        segment: review_segments::ActiveModel,
    ) -> Result<review_segments::Model, DbErr> {
        let mut rows = self.review_segments.lock().unwrap();
        let model = review_segments::Model {
            id: rows.len() as i32 + 1,
            review_id: set_or(&segment.review_id, 0),
            segment_id: set_or(&segment.segment_id, 0),
            rating: set_or(&segment.rating, 0),
            text: set_or(&segment.text, String::new()),
        };
        rows.push(model.clone());
        Ok(model)
    }

    async fn set_moderation(
        &self,
        review: reviews::Model,
        is_public: bool,
        is_removed: bool,
    ) -> Result<reviews::Model, DbErr> {
        let mut rows = self.reviews.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == review.id)
            .ok_or_else(|| DbErr::Custom("review vanished".to_string()))?;
        row.is_public = is_public;
        row.is_removed = is_removed;
        Ok(row.clone())
    }

    async fn find_flag(
        &self,
        user_id: i32,
        review_id: i32,
        flag: &str,
    ) -> Result<Option<review_flags::Model>, DbErr> {
        Ok(self
            .flags
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.user_id == user_id && f.review_id == review_id && f.flag == flag)
            .cloned())
    }

    async fn insert_flag(
        &self,
        flag: review_flags::ActiveModel,
    ) -> Result<review_flags::Model, DbErr> {
        let mut rows = self.flags.lock().unwrap();
        let model = review_flags::Model {
            id: rows.len() as i32 + 1,
            user_id: set_or(&flag.user_id, 0),
            review_id: set_or(&flag.review_id, 0),
            flag: set_or(&flag.flag, String::new()),
            flag_date: set_or(&flag.flag_date, chrono::Utc::now().naive_utc()),
        };
        rows.push(model.clone());
        Ok(model)
    }
}

struct CarResolver;

#[async_trait]
impl ContentResolver for CarResolver {
    fn content_type(&self) -> &str {
        CONTENT_TYPE
    }

    async fn resolve(&self, object_pk: &str) -> Result<Option<TargetObject>, DbErr> {
        if object_pk == OBJECT_PK {
            Ok(Some(TargetObject {
                content_type: CONTENT_TYPE.to_string(),
                object_pk: Some(OBJECT_PK.to_string()),
                url: "/cars/42/".to_string(),
            }))
        } else {
            Ok(None)
        }
    }
}

/// Decides the user from the `x-test-user` header so one installed provider
/// serves every test in the process.
struct HeaderAuth;

impl AuthProvider for HeaderAuth {
    fn current_user(&self, req: &HttpRequest) -> Option<UserInfo> {
        match req.headers().get("x-test-user")?.to_str().ok()? {
            "moderator" => Some(UserInfo {
                id: 1,
                name: "Mira".to_string(),
                email: "mira@example.com".to_string(),
                is_moderator: true,
            }),
            "member" => Some(UserInfo {
                id: 2,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                is_moderator: false,
            }),
            _ => None,
        }
    }
}

static INIT: Once = Once::new();

/// Process-wide setup plus a clean slate for the calling test. Installs the
/// given store as the active backend.
pub fn setup(store: Arc<MemoryStore>) {
    INIT.call_once(|| {
        {
            let mut config = critique::app_config::APP_CONFIG.write().unwrap();
            config.security.secret_key = "endpoint-test-secret".to_string();
            config.reviews.profanity_list = vec!["darn".to_string()];
            config.debug = true;
        }
        critique::auth::install_auth_provider(Arc::new(HeaderAuth));
        critique::content::register_content_type(Arc::new(CarResolver));
    });

    critique::signals::disconnect_all();
    critique::backend::uninstall_all();
    let mut backend = ReviewBackend::named(critique::backend::DEFAULT_BACKEND);
    backend.store = Some(store);
    critique::backend::install(backend);
}

/// A complete, valid submission for the fixture category and target.
pub fn valid_submission() -> FieldMap {
    let stamp = critique::security::generate(CONTENT_TYPE, OBJECT_PK);
    let mut data = FieldMap::new();
    data.insert("content_type".to_string(), stamp.content_type);
    data.insert("object_pk".to_string(), stamp.object_pk);
    data.insert("timestamp".to_string(), stamp.timestamp.to_string());
    data.insert("security_hash".to_string(), stamp.security_hash);
    data.insert(
        "category".to_string(),
        critique::signing::encode(CATEGORY_CODE),
    );
    data.insert("name".to_string(), "Ada".to_string());
    data.insert("email".to_string(), "ada@example.com".to_string());
    data.insert("text".to_string(), "Prompt and careful work.".to_string());
    data.insert("segment-10-rating".to_string(), "4".to_string());
    data.insert("segment-10-text".to_string(), "Spotless.".to_string());
    data.insert("segment-11-rating".to_string(), "5".to_string());
    data.insert("segment-11-text".to_string(), "Same day.".to_string());
    data
}
