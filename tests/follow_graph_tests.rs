mod common;

use bloga::{
    config::Config,
    error::AppError,
    models::{
        comment::CreateCommentRequest,
        profile::UpdateProfileRequest,
        reaction::{CreateCommentReactionRequest, CreatePostReactionRequest},
        saved_post::CreateSavedPostRequest,
        user::{CreateUserRequest, LoginRequest, UpdateUserRequest},
    },
};
use common::*;
use serde_json::json;

#[tokio::test]
async fn follow_and_unfollow_update_both_sides() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let profiles = &state.profile_service;

    profiles.follow(&alice.id, &bob.id).await.unwrap();

    let a = profiles.get_or_create_profile(&alice.id).await.unwrap();
    let b = profiles.get_or_create_profile(&bob.id).await.unwrap();
    assert_eq!(a.follows, vec![bob.id.clone()]);
    assert!(a.followers.is_empty());
    assert_eq!(b.followers, vec![alice.id.clone()]);
    assert!(b.follows.is_empty());

    // 重复关注不会产生重复条目
    profiles.follow(&alice.id, &bob.id).await.unwrap();
    let a = profiles.get_or_create_profile(&alice.id).await.unwrap();
    assert_eq!(a.follows.len(), 1);

    profiles.unfollow(&alice.id, &bob.id).await.unwrap();
    let a = profiles.get_or_create_profile(&alice.id).await.unwrap();
    let b = profiles.get_or_create_profile(&bob.id).await.unwrap();
    assert!(a.follows.is_empty());
    assert!(b.followers.is_empty());
}

#[tokio::test]
async fn following_yourself_is_a_no_op() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;

    state.profile_service.follow(&alice.id, &alice.id).await.unwrap();

    let profile = state.profile_service.get_or_create_profile(&alice.id).await.unwrap();
    assert!(!profile.is_following(&alice.id));
    assert!(!profile.is_followed_by(&alice.id));
}

#[tokio::test]
async fn syncing_follows_adds_and_removes_edges() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let carol = signup(&state, "carol").await;
    let profiles = &state.profile_service;

    let profile = profiles.get_or_create_profile(&alice.id).await.unwrap();
    let synced = profiles
        .sync_follows(&alice, &profile.key(), &["bob".to_string(), "carol".to_string()])
        .await
        .unwrap();
    assert!(synced.is_following(&bob.id));
    assert!(synced.is_following(&carol.id));

    // 省略 bob 即取消关注，两侧同时移除
    let synced = profiles
        .sync_follows(&alice, &profile.key(), &["carol".to_string()])
        .await
        .unwrap();
    assert!(!synced.is_following(&bob.id));
    assert!(synced.is_following(&carol.id));

    let b = profiles.get_or_create_profile(&bob.id).await.unwrap();
    let c = profiles.get_or_create_profile(&carol.id).await.unwrap();
    assert!(!b.is_followed_by(&alice.id));
    assert!(c.is_followed_by(&alice.id));

    let response = profiles.to_response(synced).await.unwrap();
    assert_eq!(response.username, "alice");
    assert_eq!(response.follows, vec!["carol".to_string()]);
}

#[tokio::test]
async fn own_name_in_follows_is_dropped() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;

    let profile = state.profile_service.get_or_create_profile(&alice.id).await.unwrap();
    let synced = state
        .profile_service
        .sync_follows(&alice, &profile.key(), &["alice".to_string(), "bob".to_string()])
        .await
        .unwrap();

    assert_eq!(synced.follows, vec![bob.id.clone()]);
    assert!(!synced.is_followed_by(&alice.id));
}

#[tokio::test]
async fn only_the_owner_may_change_follows() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    signup(&state, "carol").await;
    let profiles = &state.profile_service;

    let profile = profiles.get_or_create_profile(&alice.id).await.unwrap();
    profiles
        .sync_follows(&alice, &profile.key(), &["carol".to_string()])
        .await
        .unwrap();

    let result = profiles
        .update_profile(
            &bob,
            &profile.key(),
            UpdateProfileRequest {
                follows: Some(vec!["bob".to_string()]),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Authorization(_))));

    let result = profiles.sync_follows(&bob, &profile.key(), &[]).await;
    assert!(matches!(result, Err(AppError::Authorization(_))));

    let unchanged = profiles.get_profile(&profile.key()).await.unwrap();
    assert_eq!(unchanged.follows.len(), 1);
    assert!(!unchanged.is_following(&bob.id));
}

#[tokio::test]
async fn unknown_username_is_a_field_error() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;

    let profile = state.profile_service.get_or_create_profile(&alice.id).await.unwrap();
    let result = state
        .profile_service
        .sync_follows(&alice, &profile.key(), &["nobody".to_string()])
        .await;

    match result {
        Err(AppError::FieldValidation { field, .. }) => assert_eq!(field, "follows"),
        other => panic!("expected field error, got {:?}", other.map(|p| p.follows)),
    }
}

#[tokio::test]
async fn deleting_a_user_removes_them_from_the_graph() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let profiles = &state.profile_service;

    profiles.follow(&alice.id, &bob.id).await.unwrap();
    profiles.follow(&bob.id, &alice.id).await.unwrap();
    published_post(&state, &bob).await;

    state.user_service.delete_user(&bob, "bob").await.unwrap();

    let a = profiles.get_or_create_profile(&alice.id).await.unwrap();
    assert!(a.follows.is_empty());
    assert!(a.followers.is_empty());
    assert!(matches!(
        state.user_service.get_user_by_username("bob").await,
        Err(AppError::NotFound(_))
    ));
    assert!(state.post_service.list_posts(None, None).await.unwrap().is_empty());
    assert!(profiles.get_profile_by_user(&bob.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_user_removes_their_activity_on_other_posts() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let post = published_post(&state, &alice).await;

    let bobs_comment = state
        .comment_service
        .create_comment(
            &bob,
            CreateCommentRequest {
                post: post.link.clone(),
                content: "From bob".to_string(),
            },
        )
        .await
        .unwrap()
        .created()
        .expect("comment created");
    let alices_comment = state
        .comment_service
        .create_comment(
            &alice,
            CreateCommentRequest {
                post: post.link.clone(),
                content: "From alice".to_string(),
            },
        )
        .await
        .unwrap()
        .created()
        .expect("comment created");

    // bob 对别人的文章和评论点赞、收藏；alice 给 bob 的评论点赞
    state
        .reaction_service
        .react_to_post(
            &bob,
            CreatePostReactionRequest {
                post: post.link.clone(),
                kind: Default::default(),
            },
        )
        .await
        .unwrap();
    state
        .reaction_service
        .react_to_comment(
            &bob,
            CreateCommentReactionRequest {
                comment: alices_comment.key(),
                kind: Default::default(),
            },
        )
        .await
        .unwrap();
    state
        .reaction_service
        .react_to_comment(
            &alice,
            CreateCommentReactionRequest {
                comment: bobs_comment.key(),
                kind: Default::default(),
            },
        )
        .await
        .unwrap();
    state
        .saved_post_service
        .save_post(
            &bob,
            CreateSavedPostRequest {
                post: post.link.clone(),
            },
        )
        .await
        .unwrap();

    state.user_service.delete_user(&bob, "bob").await.unwrap();

    let comments = state.comment_service.list_comments(Some(post.link.as_str())).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].user_id, alice.id);

    assert!(state
        .reaction_service
        .list_post_reactions(Some(post.link.as_str()))
        .await
        .unwrap()
        .is_empty());
    assert!(state
        .reaction_service
        .list_comment_reactions(None)
        .await
        .unwrap()
        .is_empty());

    let saved_rows: Vec<String> = state
        .db
        .query("SELECT VALUE meta::id(id) FROM saved_post")
        .await
        .unwrap()
        .take(0)
        .unwrap();
    assert!(saved_rows.is_empty());

    // alice 的文章本身保留
    assert!(state.post_service.get_post_by_link(&post.link, None).await.is_ok());
}

#[tokio::test]
async fn follow_clears_a_stale_self_reference() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let profiles = &state.profile_service;

    profiles.get_or_create_profile(&alice.id).await.unwrap();
    state
        .db
        .execute(
            "UPDATE profile SET follows = array::union(follows, [$uid]) WHERE user_id = $uid",
            json!({ "uid": alice.id }),
        )
        .await
        .unwrap();
    assert!(profiles.get_or_create_profile(&alice.id).await.unwrap().is_following(&alice.id));

    profiles.follow(&alice.id, &bob.id).await.unwrap();

    let a = profiles.get_or_create_profile(&alice.id).await.unwrap();
    assert!(!a.is_following(&alice.id));
    assert_eq!(a.follows, vec![bob.id.clone()]);
}

#[tokio::test]
async fn bio_limit_comes_from_configuration() {
    let long_bio = "b".repeat(600);

    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let profile = state.profile_service.get_or_create_profile(&alice.id).await.unwrap();
    let rejected = state
        .profile_service
        .update_profile(
            &alice,
            &profile.key(),
            UpdateProfileRequest {
                bio: Some(long_bio.clone()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(rejected, Err(AppError::FieldValidation { .. })));

    let mut config = Config::default();
    config.max_bio_length = 1000;
    let state = setup_with(config).await;
    let alice = signup(&state, "alice").await;
    let profile = state.profile_service.get_or_create_profile(&alice.id).await.unwrap();
    let updated = state
        .profile_service
        .update_profile(
            &alice,
            &profile.key(),
            UpdateProfileRequest {
                bio: Some(long_bio),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.bio.len(), 600);
}

#[tokio::test]
async fn duplicate_profile_is_a_conflict() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;

    state
        .profile_service
        .create_profile(&alice, Default::default())
        .await
        .unwrap();
    let again = state
        .profile_service
        .create_profile(&alice, Default::default())
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn password_change_requires_the_old_password() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let users = &state.user_service;

    let wrong = users
        .update_user(
            &alice,
            "alice",
            UpdateUserRequest {
                old_password: Some("not-my-password".to_string()),
                password: Some("new-secret".to_string()),
                ..Default::default()
            },
        )
        .await;
    match wrong {
        Err(AppError::FieldValidation { field, message }) => {
            assert_eq!(field, "old_password");
            assert_eq!(message, "Old password is incorrect.");
        }
        other => panic!("expected field error, got {:?}", other.map(|u| u.username)),
    }

    let missing = users
        .update_user(
            &alice,
            "alice",
            UpdateUserRequest {
                password: Some("new-secret".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(missing, Err(AppError::FieldValidation { .. })));

    users
        .update_user(
            &alice,
            "alice",
            UpdateUserRequest {
                old_password: Some("password123".to_string()),
                password: Some("new-secret".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let login = |password: &str| LoginRequest {
        username: "alice".to_string(),
        password: password.to_string(),
    };
    assert!(users.authenticate(login("new-secret")).await.is_ok());
    assert!(matches!(
        users.authenticate(login("password123")).await,
        Err(AppError::Authentication(_))
    ));
}

#[tokio::test]
async fn usernames_are_unique() {
    let state = setup().await;
    signup(&state, "alice").await;

    let result = state
        .user_service
        .create_user(CreateUserRequest {
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            password: "password123".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        })
        .await;
    assert!(result.is_err());
}
