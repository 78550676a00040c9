use serde::{Deserialize, Serialize};

/// 标签及其已发布文章数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub post_count: usize,
}
