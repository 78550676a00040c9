use once_cell::sync::Lazy;
use rand::{distributions::Uniform, Rng};
use regex::Regex;

static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9\-_]").expect("valid slug regex")
});

static HYPHEN_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-+").expect("valid hyphen regex")
});

static VALID_SLUG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9\-_]+$").expect("valid slug check regex")
});

/// 随机后缀的字符集：小写字母和数字
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// 第一个随机后缀的长度，之后每次重试加一
pub const INITIAL_SUFFIX_LEN: usize = 4;

const MAX_SLUG_LEN: usize = 100;

/// 从标题生成 URL 友好的 slug
pub fn generate_slug(title: &str) -> String {
    // 转换为小写，空白替换为连字符
    let mut slug = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    // 移除所有非字母数字和连字符的字符
    slug = SLUG_REGEX.replace_all(&slug, "").to_string();

    // 移除连续的连字符
    slug = HYPHEN_RUN_REGEX.replace_all(&slug, "-").to_string();

    slug = slug.trim_matches('-').to_string();

    // 限制长度，尽量在单词边界截断
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        if let Some(last_hyphen) = slug.rfind('-') {
            if last_hyphen > MAX_SLUG_LEN / 2 {
                slug.truncate(last_hyphen);
            }
        }
        slug = slug.trim_matches('-').to_string();
    }

    if slug.is_empty() {
        slug = "untitled".to_string();
    }

    slug
}

/// 生成指定长度的随机后缀（小写字母 + 数字）
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let range = Uniform::from(0..SUFFIX_CHARSET.len());
    (0..len)
        .map(|_| SUFFIX_CHARSET[rng.sample(range)] as char)
        .collect()
}

/// 第 `attempt` 个候选 slug：0 为基础 slug，之后追加长度递增的随机后缀
pub fn slug_candidate(base: &str, attempt: usize) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        let len = INITIAL_SUFFIX_LEN + attempt - 1;
        format!("{}-{}", base, random_suffix(len))
    }
}

/// 验证 slug 格式是否正确
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN + 32 {
        return false;
    }

    if !VALID_SLUG_REGEX.is_match(slug) {
        return false;
    }

    // 不能以连字符开头或结尾
    if slug.starts_with('-') || slug.ends_with('-') {
        return false;
    }

    !slug.contains("--")
}
