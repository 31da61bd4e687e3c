//! Review submission endpoints
//!
//! `POST /reviews/post` is the single entry point for new reviews. Input
//! that only a broken or hostile client produces (undecodable category
//! token, unresolvable target, failed security verification, a hook veto)
//! gets a hard 400 and is never re-rendered; ordinary validation mistakes
//! re-render the form as a preview with inline errors.

use crate::backend;
use crate::content::{self, ResolveError};
use crate::form::{FieldMap, FormOutcome, ReviewForm, SegmentSubForm};
use crate::orm::reviews;
use crate::signals::{self, RequestInfo};
use crate::{auth, ip, signing};
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::ActiveValue::Set;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_review).service(review_done);
}

#[derive(Template)]
#[template(path = "reviews/400_debug.html")]
struct BadRequestTemplate {
    why: String,
}

/// A 400 whose reason is only shown when debug mode is on; production
/// clients get no hint about which check they failed.
pub(super) fn bad_request(why: impl Into<String>) -> HttpResponse {
    let why = why.into();
    log::debug!("Review request rejected: {}", why);
    if crate::app_config::debug() {
        let mut response = BadRequestTemplate { why }.to_response();
        *response.status_mut() = actix_web::http::StatusCode::BAD_REQUEST;
        response
    } else {
        HttpResponse::BadRequest().body("Bad request.")
    }
}

/// Append the new review's id to the destination as the `c` parameter.
fn redirect_to(next: Option<&str>, fallback: String, review_id: i32) -> HttpResponse {
    let base = match next {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => fallback,
    };
    let sep = if base.contains('?') { '&' } else { '?' };
    HttpResponse::Found()
        .append_header(("Location", format!("{}{}c={}", base, sep, review_id)))
        .finish()
}

struct SegmentRow {
    title: String,
    rating_field: String,
    rating_value: String,
    text_field: String,
    text_value: String,
}

impl SegmentRow {
    fn from_sub_form(sub: &SegmentSubForm) -> Self {
        Self {
            title: sub.segment.title.clone(),
            rating_field: sub.rating_field(),
            rating_value: sub.rating_raw.clone(),
            text_field: sub.text_field(),
            text_value: sub.text.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "reviews/preview.html")]
struct PreviewTemplate {
    site_name: String,
    form_target: String,
    /// Hidden security and category fields, echoed verbatim
    hidden: Vec<(String, String)>,
    name: String,
    email: String,
    text: String,
    next: String,
    segments: Vec<SegmentRow>,
    errors: Vec<(String, Vec<String>)>,
}

fn render_preview(form: &ReviewForm) -> Result<HttpResponse, Error> {
    let hidden = ["content_type", "object_pk", "timestamp", "security_hash", "category"]
        .iter()
        .map(|name| {
            (
                name.to_string(),
                form.data.get(*name).cloned().unwrap_or_default(),
            )
        })
        .collect();

    Ok(PreviewTemplate {
        site_name: crate::app_config::site().name,
        form_target: backend::form_target().map_err(error::ErrorInternalServerError)?,
        hidden,
        name: form.data.get("name").cloned().unwrap_or_default(),
        email: form.data.get("email").cloned().unwrap_or_default(),
        text: form.data.get("text").cloned().unwrap_or_default(),
        next: form.data.get("next").cloned().unwrap_or_default(),
        segments: form.segment_forms.iter().map(SegmentRow::from_sub_form).collect(),
        errors: form
            .errors
            .iter()
            .map(|(field, messages)| (field.clone(), messages.clone()))
            .collect(),
    }
    .to_response())
}

/// Post a review.
#[post("/reviews/post")]
async fn post_review(
    req: HttpRequest,
    form_data: web::Form<FieldMap>,
) -> Result<HttpResponse, Error> {
    let mut data = form_data.into_inner();
    let user = auth::current_user(&req);

    // An authenticated user's profile fills in whatever the form left blank
    if let Some(user) = &user {
        if data.get("name").map_or(true, |v| v.is_empty()) {
            data.insert("name".to_string(), user.name.clone());
        }
        if data.get("email").map_or(true, |v| v.is_empty()) {
            data.insert("email".to_string(), user.email.clone());
        }
    }

    let target = match content::resolve_target(
        data.get("content_type").map(String::as_str),
        data.get("object_pk").map(String::as_str),
    )
    .await
    {
        Ok(target) => target,
        Err(e @ ResolveError::Database(_)) => {
            return Err(error::ErrorInternalServerError(e.to_string()))
        }
        Err(e) => return Ok(bad_request(e.to_string())),
    };

    // The category travels as a signed token; decode failure means the
    // client tampered with it.
    let category_code = match data.get("category").map(String::as_str) {
        Some(token) => match signing::decode(token) {
            Ok(code) => code,
            Err(_) => return Ok(bad_request("Review category token was tampered with.")),
        },
        None => return Ok(bad_request("Missing category field.")),
    };

    let store = backend::store().map_err(error::ErrorInternalServerError)?;
    let category = match store
        .category_by_code(&category_code)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        Some(category) => category,
        None => {
            return Ok(bad_request(format!(
                "Review category {:?} does not exist.",
                category_code
            )))
        }
    };

    let preview_requested = data.contains_key("preview");
    let next = data.get("next").cloned();
    let mut form =
        backend::build_form(target, category, data).map_err(error::ErrorInternalServerError)?;

    let outcome = form
        .validate(store.as_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;

    if !form.security_errors().is_empty() {
        return Ok(bad_request(format!(
            "The review form failed security verification: {:?}",
            form.security_errors()
        )));
    }

    let (mut review, segments) = match outcome {
        FormOutcome::Duplicate(existing) => {
            return Ok(redirect_to(next.as_deref(), done_url(), existing.id))
        }
        FormOutcome::Invalid => return render_preview(&form),
        FormOutcome::Valid { review, segments } => {
            if preview_requested {
                return render_preview(&form);
            }
            (review, segments)
        }
    };

    let request_info = RequestInfo {
        path: req.path().to_string(),
        ip_address: ip::extract_client_ip(&req),
        user: user.clone(),
    };
    review.user_id = Set(user.as_ref().map(|u| u.id));
    review.ip_address = Set(request_info.ip_address.clone());

    if let Err((name, _reason)) = signals::dispatch_pre_save(&review, &segments, &request_info) {
        return Ok(bad_request(format!(
            "post_review() received a veto from the subscriber {:?}",
            name
        )));
    }

    // Segments carry the review id assigned by the first insert, so the
    // review row must land before any segment row.
    let saved = store
        .insert_review(review)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let mut saved_segments = Vec::with_capacity(segments.len());
    for mut segment in segments {
        segment.review_id = Set(saved.id);
        saved_segments.push(
            store
                .insert_segment(segment)
                .await
                .map_err(error::ErrorInternalServerError)?,
        );
    }

    log::info!(
        "Review {} posted on {}:{} by {:?}",
        saved.id,
        saved.content_type,
        saved.object_pk,
        saved.user_name
    );
    signals::dispatch_post_save(&saved, &saved_segments, &request_info);

    Ok(redirect_to(next.as_deref(), done_url(), saved.id))
}

fn done_url() -> String {
    "/reviews/posted".to_string()
}

#[derive(Template)]
#[template(path = "reviews/posted.html")]
struct PostedTemplate {
    site_name: String,
    review_url: Option<String>,
}

#[derive(serde::Deserialize)]
struct DoneQuery {
    /// Review id as submitted; anything unparseable renders the page
    /// without a review link rather than erroring
    c: Option<String>,
}

/// Confirmation page after a successful post.
#[get("/reviews/posted")]
async fn review_done(query: web::Query<DoneQuery>) -> Result<impl Responder, Error> {
    let review_url = match query.c.as_deref().and_then(|c| c.parse::<i32>().ok()) {
        Some(id) => {
            let store = backend::store().map_err(error::ErrorInternalServerError)?;
            store
                .find_review(id)
                .await
                .map_err(error::ErrorInternalServerError)?
                .map(|review: reviews::Model| review.absolute_url())
        }
        None => None,
    };

    Ok(PostedTemplate {
        site_name: crate::app_config::site().name,
        review_url,
    }
    .to_response())
}
