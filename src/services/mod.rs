pub mod database;
pub mod auth;
pub mod user;
pub mod profile;
pub mod post;
pub mod guard;
pub mod comment;
pub mod reaction;
pub mod saved_post;
pub mod tag;

// 重新导出常用类型
pub use database::Database;
pub use auth::AuthService;
pub use user::UserService;
pub use profile::ProfileService;
pub use post::PostService;
pub use guard::VisibilityGuard;
pub use comment::CommentService;
pub use reaction::ReactionService;
pub use saved_post::SavedPostService;
pub use tag::TagService;
