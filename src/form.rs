//! Review submission form
//!
//! Validates the raw field map of a submission against the security stamp,
//! the signed category token (decoded by the caller), the content policy,
//! and the category's segment sub-forms, then materializes a pending review
//! plus its pending segments. Errors are collected per field so the caller
//! can re-render the form with inline messages; only structurally broken
//! input (an undecodable category token, missing security fields) is
//! escalated to a hard rejection by the controller.
//!
//! Segment sub-form fields are keyed by the category segment's primary key:
//! `segment-{pk}-rating` and `segment-{pk}-text`, one pair per segment of
//! the review's category, in `position` order.

use crate::backend::ReviewStore;
use crate::content::TargetObject;
use crate::orm::{categories, category_segments, review_segments, reviews};
use crate::{profanity, security};
use chrono::{NaiveDateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::DbErr;
use std::collections::{BTreeMap, HashMap};

/// Raw form-encoded submission data.
pub type FieldMap = HashMap<String, String>;

/// Fields whose errors mean the submission failed security verification
/// rather than ordinary validation.
pub const SECURITY_FIELDS: &[&str] = &["honeypot", "timestamp", "security_hash"];

const REQUIRED_MESSAGE: &str = "This field is required.";
const MAX_NAME_LENGTH: usize = 50;

/// Per-field validation messages, ordered by field name for deterministic
/// rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// The subset of errors on security fields.
    pub fn security_subset(&self) -> FieldErrors {
        let mut subset = FieldErrors::default();
        for field in SECURITY_FIELDS {
            if let Some(messages) = self.0.get(*field) {
                for message in messages {
                    subset.add(field, message.clone());
                }
            }
        }
        subset
    }
}

/// One segment sub-form, carrying the raw submitted values for re-rendering.
#[derive(Debug, Clone)]
pub struct SegmentSubForm {
    pub segment: category_segments::Model,
    pub rating_raw: String,
    /// Parsed during validation; only meaningful when the rating field
    /// collected no errors.
    pub rating: i32,
    pub text: String,
}

impl SegmentSubForm {
    pub fn rating_field(&self) -> String {
        segment_rating_field(self.segment.id)
    }

    pub fn text_field(&self) -> String {
        segment_text_field(self.segment.id)
    }
}

pub fn segment_rating_field(segment_pk: i32) -> String {
    format!("segment-{}-rating", segment_pk)
}

pub fn segment_text_field(segment_pk: i32) -> String {
    format!("segment-{}-text", segment_pk)
}

/// Result of a full validation pass.
pub enum FormOutcome {
    /// Everything checked out; nothing has been persisted yet. The segment
    /// models are in category position order with `review_id` unset, since
    /// that key only exists after the review row is saved.
    Valid {
        review: reviews::ActiveModel,
        segments: Vec<review_segments::ActiveModel>,
    },
    /// The same author already posted this text for this target today; the
    /// prior review is returned instead of creating a new one.
    Duplicate(reviews::Model),
    /// At least one field failed; messages are on [`ReviewForm::errors`].
    Invalid,
}

/// The review submission form.
pub struct ReviewForm {
    pub target: TargetObject,
    pub category: categories::Model,
    pub data: FieldMap,
    pub errors: FieldErrors,
    /// Populated by [`validate`](Self::validate), in position order.
    pub segment_forms: Vec<SegmentSubForm>,
}

impl ReviewForm {
    pub fn new(target: TargetObject, category: categories::Model, data: FieldMap) -> Self {
        Self {
            target,
            category,
            data,
            errors: FieldErrors::default(),
            segment_forms: Vec::new(),
        }
    }

    /// Hidden security/category fields for rendering a fresh form.
    pub fn initial_fields(target: &TargetObject, category_code: &str) -> Vec<(String, String)> {
        let stamp = security::generate(
            &target.content_type,
            target.object_pk.as_deref().unwrap_or(""),
        );
        vec![
            ("content_type".to_string(), stamp.content_type),
            ("object_pk".to_string(), stamp.object_pk),
            ("timestamp".to_string(), stamp.timestamp.to_string()),
            ("security_hash".to_string(), stamp.security_hash),
            (
                "category".to_string(),
                crate::signing::encode(category_code),
            ),
        ]
    }

    fn field(&self, name: &str) -> &str {
        self.data.get(name).map(String::as_str).unwrap_or("")
    }

    /// Just those errors associated with security verification.
    pub fn security_errors(&self) -> FieldErrors {
        self.errors.security_subset()
    }

    /// Run every check and, on success, materialize the pending review and
    /// segments (or hand back a same-day duplicate).
    pub async fn validate(&mut self, store: &dyn ReviewStore) -> Result<FormOutcome, DbErr> {
        let policy = crate::app_config::reviews();

        self.check_security_fields();
        self.check_author_fields();
        self.check_text_field(policy.max_length);

        let segments = store.category_segments(self.category.id).await?;
        self.check_segment_fields(segments, policy.max_length);

        if !self.errors.is_empty() {
            return Ok(FormOutcome::Invalid);
        }

        let submit_date = Utc::now().naive_utc();
        let candidates = store
            .duplicate_candidates(
                &self.target.content_type,
                self.target.object_pk.as_deref().unwrap_or(""),
                self.field("name"),
                self.field("email"),
            )
            .await?;
        if let Some(existing) = find_duplicate(&candidates, self.field("text"), submit_date) {
            log::info!(
                "Suppressed duplicate review of {}:{} by {}",
                self.target.content_type,
                existing.object_pk,
                existing.user_name
            );
            return Ok(FormOutcome::Duplicate(existing));
        }

        let review = reviews::ActiveModel {
            content_type: Set(self.target.content_type.clone()),
            object_pk: Set(self.target.object_pk.clone().unwrap_or_default()),
            site_id: Set(crate::app_config::site().id),
            user_name: Set(self.field("name").to_string()),
            user_email: Set(self.field("email").to_string()),
            text: Set(self.field("text").to_string()),
            submit_date: Set(submit_date),
            is_public: Set(true),
            is_removed: Set(false),
            category_id: Set(self.category.id),
            ..Default::default()
        };

        let segments = self
            .segment_forms
            .iter()
            .map(|sub| review_segments::ActiveModel {
                segment_id: Set(sub.segment.id),
                // Review key is bound at persistence time
                rating: Set(sub.rating),
                text: Set(sub.text.clone()),
                ..Default::default()
            })
            .collect();

        Ok(FormOutcome::Valid { review, segments })
    }

    fn check_security_fields(&mut self) {
        // Honeypot: any content marks the submission as automated spam. The
        // message must not hint at what an acceptable value would be.
        if !self.field("honeypot").is_empty() {
            self.errors.add(
                "honeypot",
                "If you enter anything in this field your review will be treated as spam",
            );
        }

        let timestamp_raw = self.field("timestamp").to_string();
        match timestamp_raw.parse::<u64>() {
            Ok(timestamp) => {
                if let Err(e) = security::verify_timestamp(timestamp) {
                    self.errors.add("timestamp", e.to_string());
                }
            }
            Err(_) => {
                self.errors.add("timestamp", "Timestamp check failed.");
            }
        }

        let provided_hash = self.field("security_hash").to_string();
        if provided_hash.is_empty() {
            self.errors.add("security_hash", REQUIRED_MESSAGE);
        } else if let Err(e) = security::verify_hash(
            self.field("content_type"),
            self.field("object_pk"),
            &timestamp_raw,
            &provided_hash,
        ) {
            self.errors.add("security_hash", e.to_string());
        }
    }

    fn check_author_fields(&mut self) {
        let name = self.field("name");
        if name.is_empty() {
            self.errors.add("name", REQUIRED_MESSAGE);
        } else if name.chars().count() > MAX_NAME_LENGTH {
            self.errors.add(
                "name",
                format!(
                    "Ensure this value has at most {} characters.",
                    MAX_NAME_LENGTH
                ),
            );
        }

        let email = self.field("email");
        if email.is_empty() {
            self.errors.add("email", REQUIRED_MESSAGE);
        } else if !validator::validate_email(email) {
            self.errors.add("email", "Enter a valid email address.");
        }
    }

    fn check_text_field(&mut self, max_length: usize) {
        let text = self.field("text").to_string();
        if text.is_empty() {
            self.errors.add("text", REQUIRED_MESSAGE);
            return;
        }
        self.check_text_policy("text", &text, max_length);
    }

    fn check_text_policy(&mut self, field: &str, text: &str, max_length: usize) {
        let length = text.chars().count();
        if length > max_length {
            self.errors.add(
                field,
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max_length, length
                ),
            );
        }
        if let Err(message) = profanity::check(text) {
            self.errors.add(field, message);
        }
    }

    /// Build and validate one sub-form per category segment, in position
    /// order. A segment missing from the submission fails its own fields
    /// rather than being dropped.
    fn check_segment_fields(&mut self, segments: Vec<category_segments::Model>, max_length: usize) {
        let mut rating_errors = Vec::new();
        self.segment_forms = segments
            .into_iter()
            .map(|segment| {
                let rating_field = segment_rating_field(segment.id);
                let rating_raw = self.field(&rating_field).to_string();
                let text = self.field(&segment_text_field(segment.id)).to_string();

                // Parse once here; materialization reads the stored value
                let trimmed = rating_raw.trim();
                let rating = if trimmed.is_empty() {
                    rating_errors.push((rating_field, REQUIRED_MESSAGE));
                    0
                } else {
                    match trimmed.parse() {
                        Ok(rating) => rating,
                        Err(_) => {
                            rating_errors.push((rating_field, "Enter a whole number."));
                            0
                        }
                    }
                };

                SegmentSubForm {
                    segment,
                    rating_raw,
                    rating,
                    text,
                }
            })
            .collect();

        for (field, message) in rating_errors {
            self.errors.add(&field, message);
        }

        let texts: Vec<(String, String)> = self
            .segment_forms
            .iter()
            .map(|sub| (sub.text_field(), sub.text.clone()))
            .collect();
        for (text_field, text) in texts {
            if text.is_empty() {
                self.errors.add(&text_field, REQUIRED_MESSAGE);
            } else {
                self.check_text_policy(&text_field, &text, max_length);
            }
        }
    }
}

/// Pick the prior review that makes `text` a same-day duplicate, if any.
pub fn find_duplicate(
    candidates: &[reviews::Model],
    text: &str,
    submit_date: NaiveDateTime,
) -> Option<reviews::Model> {
    candidates
        .iter()
        .find(|old| old.submit_date.date() == submit_date.date() && old.text == text)
        .cloned()
}
