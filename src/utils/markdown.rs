use ammonia::Builder;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Options, Parser, Tag};
use regex::Regex;
use std::collections::{HashMap, HashSet};

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("valid whitespace regex")
});

#[derive(Clone)]
pub struct MarkdownProcessor {}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        Self {}
    }

    fn get_sanitizer() -> Builder<'static> {
        // 配置 HTML 清理器
        let mut sanitizer = Builder::default();

        // 允许的标签
        let tags: HashSet<&'static str> = [
            "h1", "h2", "h3", "h4", "h5", "h6",
            "p", "br", "hr",
            "strong", "em", "del", "code",
            "pre", "blockquote",
            "ul", "ol", "li",
            "a", "img",
            "table", "thead", "tbody", "tr", "th", "td",
            "sup",
        ]
        .into_iter()
        .collect();
        sanitizer.tags(tags);

        // 配置标签属性
        let mut tag_attrs = HashMap::new();
        tag_attrs.insert("a", ["href", "title"].into_iter().collect::<HashSet<_>>());
        tag_attrs.insert("img", ["src", "alt", "title"].into_iter().collect::<HashSet<_>>());
        tag_attrs.insert("code", ["class"].into_iter().collect::<HashSet<_>>());

        sanitizer.tag_attributes(tag_attrs);
        sanitizer
    }

    /// 将 Markdown 转换为安全的 HTML
    pub fn to_html(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);

        let parser = Parser::new_ext(markdown, options);

        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        Self::get_sanitizer().clean(&html_output).to_string()
    }

    /// 从 Markdown 提取纯文本
    pub fn to_text(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Options::empty());

        let mut text = String::new();
        for event in parser {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                Event::End(Tag::Paragraph)
                | Event::End(Tag::Heading(..))
                | Event::End(Tag::Item) => text.push(' '),
                _ => {}
            }
        }

        WHITESPACE_REGEX.replace_all(&text, " ").trim().to_string()
    }

    /// 生成文章摘要
    pub fn generate_excerpt(&self, markdown: &str, max_length: usize) -> String {
        let text = self.to_text(markdown);

        if text.chars().count() <= max_length {
            return text;
        }

        let truncated: String = text.chars().take(max_length).collect();
        // 在最接近的单词边界处截断
        let cut = match truncated.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &truncated[..idx],
            _ => truncated.as_str(),
        };

        format!("{}...", cut.trim_end())
    }
}
