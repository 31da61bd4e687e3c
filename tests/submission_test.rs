//! Endpoint tests for review posting.

mod common;

use actix_web::{test, App};
use common::MemoryStore;
use critique::signals::{self, HookResult};
use serial_test::serial;
use std::sync::atomic::{AtomicI32, Ordering};

macro_rules! app {
    () => {
        test::init_service(App::new().configure(critique::web::configure)).await
    };
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_rt::test]
#[serial]
async fn test_post_creates_review_and_segments() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&common::valid_submission())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/reviews/posted?c=1");

    let reviews = store.reviews.lock().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].content_type, common::CONTENT_TYPE);
    assert_eq!(reviews[0].object_pk, common::OBJECT_PK);
    assert_eq!(reviews[0].site_id, 1);
    assert_eq!(reviews[0].user_id, None);
    assert!(reviews[0].is_public);
    assert!(!reviews[0].is_removed);
    drop(reviews);

    // Segments persisted in category position order
    let segments = store.review_segments.lock().unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].segment_id, 10);
    assert_eq!(segments[0].rating, 4);
    assert_eq!(segments[0].review_id, 1);
    assert_eq!(segments[1].segment_id, 11);
    assert_eq!(segments[1].rating, 5);
}

#[actix_rt::test]
#[serial]
async fn test_redirect_honors_next_param() {
    let store = MemoryStore::with_fixture();
    common::setup(store);
    let app = app!();

    let mut data = common::valid_submission();
    data.insert("next".to_string(), "/cars/42/?page=2".to_string());
    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&data)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/cars/42/?page=2&c=1");
}

#[actix_rt::test]
#[serial]
async fn test_honeypot_rejects_submission() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    let mut data = common::valid_submission();
    data.insert("honeypot".to_string(), "definitely human".to_string());
    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&data)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    assert_eq!(store.review_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_expired_timestamp_rejected() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    let mut data = common::valid_submission();
    // A correctly signed but ancient stamp
    data.insert("timestamp".to_string(), "1".to_string());
    data.insert(
        "security_hash".to_string(),
        critique::security::stamp_hash(common::CONTENT_TYPE, common::OBJECT_PK, "1"),
    );
    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&data)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    assert_eq!(store.review_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_tampered_category_token_rejected() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    let mut data = common::valid_submission();
    let mut token = data.get("category").cloned().unwrap();
    token.pop();
    data.insert("category".to_string(), token);
    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&data)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    assert_eq!(store.review_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_unknown_target_rejected() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    let mut data = common::valid_submission();
    let stamp = critique::security::generate(common::CONTENT_TYPE, "43");
    data.insert("object_pk".to_string(), "43".to_string());
    data.insert("timestamp".to_string(), stamp.timestamp.to_string());
    data.insert("security_hash".to_string(), stamp.security_hash);
    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&data)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    assert_eq!(store.review_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_field_errors_render_preview_not_400() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    let mut data = common::valid_submission();
    data.remove("name");
    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&data)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("This field is required."));
    // The submitted text survives into the re-rendered form
    assert!(body.contains("Prompt and careful work."));
    assert_eq!(store.review_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_preview_request_persists_nothing() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    let mut data = common::valid_submission();
    data.insert("preview".to_string(), "Preview".to_string());
    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&data)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(store.review_count(), 0);
    assert_eq!(store.segment_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_same_day_duplicate_redirects_to_existing() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/reviews/post")
            .set_form(&common::valid_submission())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(location(&resp), "/reviews/posted?c=1");
    }

    assert_eq!(store.review_count(), 1);
    assert_eq!(store.segment_count(), 2);
}

#[actix_rt::test]
#[serial]
async fn test_pre_save_veto_discards_submission() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    signals::connect_pre_save("spam-scanner", |_, _, _| {
        HookResult::Veto("looks automated".to_string())
    });
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&common::valid_submission())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    // Debug mode names the vetoing subscriber
    assert!(body.contains("spam-scanner"));
    assert_eq!(store.review_count(), 0);
    assert_eq!(store.segment_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_authenticated_user_fills_identity() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    let mut data = common::valid_submission();
    data.remove("name");
    data.remove("email");
    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .insert_header(("x-test-user", "member"))
        .set_form(&data)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 302);
    let reviews = store.reviews.lock().unwrap();
    assert_eq!(reviews[0].user_id, Some(2));
    assert_eq!(reviews[0].user_name, "Ada");
    assert_eq!(reviews[0].user_email, "ada@example.com");
}

#[actix_rt::test]
#[serial]
async fn test_post_save_hook_sees_saved_models() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());

    let seen_id: &'static AtomicI32 = Box::leak(Box::new(AtomicI32::new(0)));
    let seen_segments: &'static AtomicI32 = Box::leak(Box::new(AtomicI32::new(0)));
    signals::connect_post_save("recorder", move |review, segments, _| {
        seen_id.store(review.id, Ordering::SeqCst);
        seen_segments.store(segments.len() as i32, Ordering::SeqCst);
    });
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&common::valid_submission())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 302);
    assert_eq!(seen_id.load(Ordering::SeqCst), 1);
    assert_eq!(seen_segments.load(Ordering::SeqCst), 2);
}

#[actix_rt::test]
#[serial]
async fn test_done_page_links_to_review() {
    let store = MemoryStore::with_fixture();
    common::setup(store.clone());
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/reviews/post")
        .set_form(&common::valid_submission())
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/reviews/posted?c=1")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("/cr/garage.car/42/#c1"));
}

#[actix_rt::test]
#[serial]
async fn test_done_page_tolerates_garbage_id() {
    let store = MemoryStore::with_fixture();
    common::setup(store);
    let app = app!();

    // A mangled or hand-edited id still renders the confirmation, just
    // without the review link
    let req = test::TestRequest::get()
        .uri("/reviews/posted?c=abc")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(!body.contains("/cr/garage.car/42/#c1"));
}
