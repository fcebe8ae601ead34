//! Profile loading, editing and saving.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use shopkeep_client::views::{EMPTY_BIO, ProfileField, ProfileView};
use shopkeep_client::{Field, ViewError};
use shopkeep_integration_tests::{EMAIL, TOKEN, TestContext, USERNAME, bearer};

#[tokio::test]
async fn test_open_loads_profile_with_token() {
    let ctx = TestContext::start().await;
    let view = ProfileView::open(ctx.app_with_token(TOKEN)).await.unwrap();

    let profile = view.profile().unwrap();
    assert_eq!(profile.username, USERNAME);
    assert_eq!(profile.email, EMAIL);
    assert_eq!(view.created_at_display().as_deref(), Some("2024-03-05"));
    assert_eq!(view.bio_display(), EMPTY_BIO);

    let reads = ctx.requests_to("GET", "/users/profile").await;
    assert_eq!(reads.len(), 1);
    assert_eq!(bearer(reads.first().unwrap()).as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn test_save_sends_only_editable_fields() {
    let ctx = TestContext::start().await;
    let mut view = ProfileView::open(ctx.app_with_token(TOKEN)).await.unwrap();

    assert!(view.toggle_edit(ProfileField::Bio));
    assert!(view.set(ProfileField::Bio, "Collector of teapots"));
    view.save().await.unwrap();

    let sent = ctx.backend.state().last_profile_update.clone().unwrap();
    assert_eq!(
        sent,
        json!({ "username": USERNAME, "email": EMAIL, "bio": "Collector of teapots" })
    );
    assert!(sent.get("createdAt").is_none());

    // The save invalidated the cached profile, so it was read again.
    assert_eq!(ctx.requests_to("GET", "/users/profile").await.len(), 2);
    assert_eq!(view.bio_display(), "Collector of teapots");
    assert!(!view.is_editing(ProfileField::Bio));
    assert!(!view.is_dirty());
}

#[tokio::test]
async fn test_locked_fields_are_not_sent_changed() {
    let ctx = TestContext::start().await;
    let mut view = ProfileView::open(ctx.app_with_token(TOKEN)).await.unwrap();

    assert!(!view.set(ProfileField::Username, "mallory"));
    view.save().await.unwrap();

    let sent = ctx.backend.state().last_profile_update.clone().unwrap();
    assert_eq!(sent.get("username"), Some(&json!(USERNAME)));
}

#[tokio::test]
async fn test_invalid_draft_is_not_sent() {
    let ctx = TestContext::start().await;
    let mut view = ProfileView::open(ctx.app_with_token(TOKEN)).await.unwrap();

    view.toggle_edit(ProfileField::Email);
    view.set(ProfileField::Email, "not an email");
    let err = view.save().await.unwrap_err();

    assert!(matches!(err, ViewError::Invalid(_)));
    assert!(view.field_errors().get(Field::Email).is_some());
    assert!(ctx.requests_to("PATCH", "/user").await.is_empty());
    assert_eq!(view.draft().email, "not an email");
}

#[tokio::test]
async fn test_failed_save_keeps_draft_and_shows_message() {
    let ctx = TestContext::start().await;
    let mut view = ProfileView::open(ctx.app_with_token(TOKEN)).await.unwrap();

    view.toggle_edit(ProfileField::Username);
    view.set(ProfileField::Username, "grace");
    ctx.backend.state().fail_next = Some((
        400,
        json!({ "message": ["username already taken"], "statusCode": 400 }),
    ));

    let err = view.save().await.unwrap_err();
    assert_eq!(err, ViewError::Failed("username already taken".to_owned()));
    assert_eq!(view.notice(), Some("username already taken"));
    assert_eq!(view.draft().username, "grace");
    assert!(view.is_editing(ProfileField::Username));
    assert_eq!(view.profile().unwrap().username, USERNAME);
}
