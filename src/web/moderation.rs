//! Flagging and moderation endpoints
//!
//! Any authenticated user may flag a review for removal; deleting and
//! approving are reserved for moderators. Each POST performs the operation
//! and redirects to a confirmation page carrying the review id as `c`.

use crate::backend::{self, ReviewStore};
use crate::form::FieldMap;
use crate::orm::reviews;
use crate::{auth, flags};
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(flag_review)
        .service(delete_review)
        .service(approve_review)
        .service(review_flagged)
        .service(review_deleted)
        .service(review_approved);
}

async fn load_review(store: &dyn ReviewStore, id: i32) -> Result<reviews::Model, Error> {
    store
        .find_review(id)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("No review matches the given id."))
}

fn active_store() -> Result<Arc<dyn ReviewStore>, Error> {
    backend::store().map_err(error::ErrorInternalServerError)
}

fn confirm_redirect(next: Option<&str>, fallback: String, review_id: i32) -> HttpResponse {
    let base = match next {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => fallback,
    };
    let sep = if base.contains('?') { '&' } else { '?' };
    HttpResponse::Found()
        .append_header(("Location", format!("{}{}c={}", base, sep, review_id)))
        .finish()
}

/// Suggest removal of a review. Flagging twice is a no-op.
#[post("/reviews/{id}/flag")]
async fn flag_review(
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Form<FieldMap>,
) -> Result<HttpResponse, Error> {
    let user = auth::current_user(&req)
        .ok_or_else(|| error::ErrorUnauthorized("Must be logged in"))?;

    let store = active_store()?;
    let review_id = path.into_inner();
    let review = load_review(store.as_ref(), review_id).await?;

    flags::perform_flag(store.as_ref(), &user, &review)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(confirm_redirect(
        form.get("next").map(String::as_str),
        "/reviews/flagged".to_string(),
        review_id,
    ))
}

/// Moderator: remove a review from public listings.
#[post("/reviews/{id}/delete")]
async fn delete_review(
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Form<FieldMap>,
) -> Result<HttpResponse, Error> {
    let user = auth::current_user(&req)
        .ok_or_else(|| error::ErrorUnauthorized("Must be logged in"))?;
    if !user.is_moderator {
        return Err(error::ErrorForbidden("Moderator account required"));
    }

    let store = active_store()?;
    let review_id = path.into_inner();
    let review = load_review(store.as_ref(), review_id).await?;

    flags::perform_delete(store.as_ref(), &user, review)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(confirm_redirect(
        form.get("next").map(String::as_str),
        "/reviews/deleted".to_string(),
        review_id,
    ))
}

/// Moderator: approve a review, restoring it to public listings.
#[post("/reviews/{id}/approve")]
async fn approve_review(
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Form<FieldMap>,
) -> Result<HttpResponse, Error> {
    let user = auth::current_user(&req)
        .ok_or_else(|| error::ErrorUnauthorized("Must be logged in"))?;
    if !user.is_moderator {
        return Err(error::ErrorForbidden("Moderator account required"));
    }

    let store = active_store()?;
    let review_id = path.into_inner();
    let review = load_review(store.as_ref(), review_id).await?;

    flags::perform_approve(store.as_ref(), &user, review)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(confirm_redirect(
        form.get("next").map(String::as_str),
        "/reviews/approved".to_string(),
        review_id,
    ))
}

#[derive(serde::Deserialize)]
struct ConfirmQuery {
    /// Review id as submitted; anything unparseable renders the page
    /// without a review link rather than erroring
    c: Option<String>,
}

#[derive(Template)]
#[template(path = "reviews/flagged.html")]
struct FlaggedTemplate {
    site_name: String,
    review_url: Option<String>,
}

#[derive(Template)]
#[template(path = "reviews/deleted.html")]
struct DeletedTemplate {
    site_name: String,
    review_url: Option<String>,
}

#[derive(Template)]
#[template(path = "reviews/approved.html")]
struct ApprovedTemplate {
    site_name: String,
    review_url: Option<String>,
}

async fn confirmed_review_url(query: &ConfirmQuery) -> Result<Option<String>, Error> {
    match query.c.as_deref().and_then(|c| c.parse::<i32>().ok()) {
        Some(id) => {
            let store = active_store()?;
            Ok(store
                .find_review(id)
                .await
                .map_err(error::ErrorInternalServerError)?
                .map(|review| review.absolute_url()))
        }
        None => Ok(None),
    }
}

#[get("/reviews/flagged")]
async fn review_flagged(query: web::Query<ConfirmQuery>) -> Result<impl Responder, Error> {
    Ok(FlaggedTemplate {
        site_name: crate::app_config::site().name,
        review_url: confirmed_review_url(&query).await?,
    }
    .to_response())
}

#[get("/reviews/deleted")]
async fn review_deleted(query: web::Query<ConfirmQuery>) -> Result<impl Responder, Error> {
    Ok(DeletedTemplate {
        site_name: crate::app_config::site().name,
        review_url: confirmed_review_url(&query).await?,
    }
    .to_response())
}

#[get("/reviews/approved")]
async fn review_approved(query: web::Query<ConfirmQuery>) -> Result<impl Responder, Error> {
    Ok(ApprovedTemplate {
        site_name: crate::app_config::site().name,
        review_url: confirmed_review_url(&query).await?,
    }
    .to_response())
}
