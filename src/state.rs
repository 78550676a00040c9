use crate::{
    config::Config,
    error::Result,
    services::{
        AuthService, CommentService, Database, PostService, ProfileService, ReactionService,
        SavedPostService, TagService, UserService,
    },
    utils::middleware::{build_rate_limiter, KeyedRateLimiter},
};
use std::sync::Arc;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    /// 认证服务
    pub auth_service: AuthService,

    /// 用户服务
    pub user_service: UserService,

    /// 资料与关注服务
    pub profile_service: ProfileService,

    /// 文章服务
    pub post_service: PostService,

    /// 评论服务
    pub comment_service: CommentService,

    /// 点赞服务
    pub reaction_service: ReactionService,

    /// 收藏服务
    pub saved_post_service: SavedPostService,

    /// 标签服务
    pub tag_service: TagService,

    /// 按客户端 IP 的速率限制器
    pub rate_limiter: Arc<KeyedRateLimiter>,
}

impl AppState {
    /// 基于已建立的数据库连接初始化所有服务
    pub async fn new(config: Config, db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            auth_service: AuthService::new(&config).await?,
            user_service: UserService::new(db.clone()).await?,
            profile_service: ProfileService::new(db.clone()).await?,
            post_service: PostService::new(db.clone()).await?,
            comment_service: CommentService::new(db.clone()).await?,
            reaction_service: ReactionService::new(db.clone()).await?,
            saved_post_service: SavedPostService::new(db.clone()).await?,
            tag_service: TagService::new(db.clone()).await?,
            rate_limiter: Arc::new(build_rate_limiter(&config)?),
            config,
            db,
        })
    }
}
