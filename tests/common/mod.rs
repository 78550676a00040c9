#![allow(dead_code)]

use bloga::{
    config::Config,
    models::{
        post::{CreatePostRequest, Post, PostStatus},
        user::CreateUserRequest,
    },
    services::{auth::AuthUser, Database},
    state::AppState,
};
use fake::{
    faker::lorem::en::{Paragraph, Sentence},
    Fake,
};
use std::sync::Arc;

/// 每个测试使用独立的内存数据库
pub async fn setup() -> Arc<AppState> {
    setup_with(Config::default()).await
}

pub async fn setup_with(config: Config) -> Arc<AppState> {
    let db = Database::new(&config).await.expect("in-memory database");
    Arc::new(
        AppState::new(config, Arc::new(db))
            .await
            .expect("application state"),
    )
}

pub async fn signup(state: &AppState, username: &str) -> AuthUser {
    let user = state
        .user_service
        .create_user(CreateUserRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "password123".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        })
        .await
        .expect("user created");
    AuthUser::from(&user)
}

pub async fn create_post(
    state: &AppState,
    author: &AuthUser,
    title: &str,
    status: PostStatus,
) -> Post {
    state
        .post_service
        .create_post(
            author,
            CreatePostRequest {
                title: title.to_string(),
                content: Paragraph(2..4).fake(),
                status,
                tags: vec![],
            },
        )
        .await
        .expect("post created")
}

pub async fn published_post(state: &AppState, author: &AuthUser) -> Post {
    let title: String = Sentence(3..6).fake();
    create_post(state, author, &title, PostStatus::Published).await
}

pub async fn draft_post(state: &AppState, author: &AuthUser) -> Post {
    let title: String = Sentence(3..6).fake();
    create_post(state, author, &title, PostStatus::Draft).await
}
