use serde::{Deserialize, Serialize};

/// 受保护写入的结果：写入成功，或被静默忽略
///
/// 评论、点赞和收藏只允许针对已发布的文章，且每个 (用户, 目标) 至多一条。
/// 违反这些规则的写入不会报错，而是返回 `Ignored`，由调用方决定如何呈现。
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    Created(T),
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// 目标文章仍是草稿
    DraftPost,
    /// 相同 (用户, 目标) 的记录已存在
    Duplicate,
}

impl<T> WriteOutcome<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, WriteOutcome::Created(_))
    }

    pub fn created(self) -> Option<T> {
        match self {
            WriteOutcome::Created(value) => Some(value),
            WriteOutcome::Ignored(_) => None,
        }
    }

    pub fn ignored_reason(&self) -> Option<IgnoreReason> {
        match self {
            WriteOutcome::Created(_) => None,
            WriteOutcome::Ignored(reason) => Some(*reason),
        }
    }
}
