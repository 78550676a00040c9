mod common;

use bloga::{
    models::{
        comment::{Comment, CreateCommentRequest, UpdateCommentRequest},
        post::{PostStatus, UpdatePostRequest},
        reaction::{CreateCommentReactionRequest, CreatePostReactionRequest},
        saved_post::{CreateSavedPostRequest, SavedPost},
        IgnoreReason, WriteOutcome,
    },
    services::VisibilityGuard,
};
use common::*;
use serde_json::json;

fn comment_on(link: &str, content: &str) -> CreateCommentRequest {
    CreateCommentRequest {
        post: link.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn writes_against_a_draft_are_discarded() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let draft = draft_post(&state, &alice).await;

    let comment = state
        .comment_service
        .create_comment(&bob, comment_on(&draft.link, "First!"))
        .await
        .unwrap();
    assert_eq!(comment.ignored_reason(), Some(IgnoreReason::DraftPost));

    let reaction = state
        .reaction_service
        .react_to_post(
            &bob,
            CreatePostReactionRequest {
                post: draft.link.clone(),
                kind: Default::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(reaction.ignored_reason(), Some(IgnoreReason::DraftPost));

    let saved = state
        .saved_post_service
        .save_post(
            &bob,
            CreateSavedPostRequest {
                post: draft.link.clone(),
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.ignored_reason(), Some(IgnoreReason::DraftPost));

    // 作者本人同样不能在草稿上评论
    let own = state
        .comment_service
        .create_comment(&alice, comment_on(&draft.link, "Note to self"))
        .await
        .unwrap();
    assert!(!own.is_created());

    assert!(state.comment_service.list_comments(Some(draft.link.as_str())).await.unwrap().is_empty());
    assert!(state
        .reaction_service
        .list_post_reactions(Some(draft.link.as_str()))
        .await
        .unwrap()
        .is_empty());
    assert!(state.saved_post_service.list_saved(&bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn published_posts_accept_dependent_writes() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let post = published_post(&state, &alice).await;

    let comment = state
        .comment_service
        .create_comment(&bob, comment_on(&post.link, "Great read"))
        .await
        .unwrap()
        .created()
        .expect("comment created");
    assert_eq!(comment.post_id, post.key());
    assert_eq!(comment.user_id, bob.id);

    let responses = state.comment_service.to_responses(vec![comment]).await.unwrap();
    assert_eq!(responses[0].post, post.link);
    assert_eq!(responses[0].user, "bob");
}

#[tokio::test]
async fn repeated_reaction_and_save_keep_a_single_row() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let post = published_post(&state, &alice).await;

    let react = || {
        state.reaction_service.react_to_post(
            &bob,
            CreatePostReactionRequest {
                post: post.link.clone(),
                kind: Default::default(),
            },
        )
    };
    assert!(react().await.unwrap().is_created());
    let again = react().await.unwrap();
    assert_eq!(again.ignored_reason(), Some(IgnoreReason::Duplicate));

    let reactions = state
        .reaction_service
        .list_post_reactions(Some(post.link.as_str()))
        .await
        .unwrap();
    assert_eq!(reactions.len(), 1);

    let save = || {
        state.saved_post_service.save_post(
            &bob,
            CreateSavedPostRequest {
                post: post.link.clone(),
            },
        )
    };
    assert!(save().await.unwrap().is_created());
    assert_eq!(
        save().await.unwrap().ignored_reason(),
        Some(IgnoreReason::Duplicate)
    );
    assert_eq!(state.saved_post_service.list_saved(&bob).await.unwrap().len(), 1);

    // 另一个用户不受影响
    let carol = signup(&state, "carol").await;
    let other = state
        .saved_post_service
        .save_post(
            &carol,
            CreateSavedPostRequest {
                post: post.link.clone(),
            },
        )
        .await
        .unwrap();
    assert!(other.is_created());
}

#[tokio::test]
async fn unique_index_backs_up_the_duplicate_check() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let post = published_post(&state, &alice).await;

    let guard = VisibilityGuard::new(state.db.clone());
    let content = json!({
        "user_id": bob.id,
        "post_id": post.key(),
        "created": chrono::Utc::now(),
    });

    let first: WriteOutcome<SavedPost> = guard
        .create_if_published("saved_post", &post.key(), content.clone())
        .await
        .unwrap();
    assert!(first.is_created());

    // 绕过预检查直接写入，唯一索引拒绝第二行
    let second: WriteOutcome<SavedPost> = guard
        .create_if_published("saved_post", &post.key(), content)
        .await
        .unwrap();
    assert_eq!(second.ignored_reason(), Some(IgnoreReason::Duplicate));

    assert!(guard
        .exists(
            "saved_post",
            &[("user_id", bob.id.as_str()), ("post_id", post.key().as_str())],
        )
        .await
        .unwrap());
    assert_eq!(state.saved_post_service.list_saved(&bob).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reverting_to_draft_blocks_further_dependent_writes() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let post = published_post(&state, &alice).await;

    let comment: Comment = state
        .comment_service
        .create_comment(&bob, comment_on(&post.link, "Before revert"))
        .await
        .unwrap()
        .created()
        .expect("comment created");

    state
        .post_service
        .update_post(
            &alice,
            &post.link,
            UpdatePostRequest {
                status: Some(PostStatus::Draft),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let reaction = state
        .reaction_service
        .react_to_comment(
            &alice,
            CreateCommentReactionRequest {
                comment: comment.key(),
                kind: Default::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(reaction.ignored_reason(), Some(IgnoreReason::DraftPost));
    assert!(state
        .reaction_service
        .list_comment_reactions(Some(comment.key().as_str()))
        .await
        .unwrap()
        .is_empty());

    let edit = state
        .comment_service
        .update_comment(
            &bob,
            &comment.key(),
            UpdateCommentRequest {
                content: "After revert".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(edit.ignored_reason(), Some(IgnoreReason::DraftPost));

    let stored = state.comment_service.get_comment(&comment.key()).await.unwrap();
    assert_eq!(stored.content, "Before revert");
}

#[tokio::test]
async fn comment_edits_on_published_posts_apply() {
    let state = setup().await;
    let alice = signup(&state, "alice").await;
    let bob = signup(&state, "bob").await;
    let post = published_post(&state, &alice).await;

    let comment = state
        .comment_service
        .create_comment(&bob, comment_on(&post.link, "tpyo"))
        .await
        .unwrap()
        .created()
        .expect("comment created");

    let edited = state
        .comment_service
        .update_comment(
            &bob,
            &comment.key(),
            UpdateCommentRequest {
                content: "typo".to_string(),
            },
        )
        .await
        .unwrap()
        .created()
        .expect("comment updated");
    assert_eq!(edited.content, "typo");

    let by_other = state
        .comment_service
        .update_comment(
            &alice,
            &comment.key(),
            UpdateCommentRequest {
                content: "hijack".to_string(),
            },
        )
        .await;
    assert!(by_other.is_err());
}
