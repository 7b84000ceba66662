//! 整词匹配与打码引擎（Aho-Corasick 预筛 + 逐词正则）
//!
//! 设计要点：
//! - 每个词条编译为一条大小写不敏感的整词正则：`\b` + 字面转义词条 + `\b`。
//!   转义保证词条中的正则元字符（`.`、`*` 等）只按字面匹配，永不编译失败。
//! - 折叠口径按词条定：纯 ASCII 词条禁用 Unicode 扩展（大小写折叠与 `\b`
//!   均为 ASCII 语义），含非 ASCII 字符的词条按 Unicode 语义编译。
//!   词条之间互不影响，匹配结果只由词条自身决定。
//! - 预筛：词表全为 ASCII 时构建 ASCII 大小写折叠的 AC 自动机，无子串命中
//!   的文本直接原样返回（借用，零拷贝）。两侧折叠口径一致，门控不漏报；
//!   词表含非 ASCII 词条时停用预筛，退回逐词正则。
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;

/// 编译后的词表匹配器集合
pub struct MatcherSet {
    prefilter: Option<AhoCorasick>,
    patterns: Vec<Regex>,
}

/// 单段文本的打码结果
/// - `text`：未命中时为 `Cow::Borrowed`（内容与输入逐字节一致）
/// - `hits`：各词条对原始文本的命中总数（不同词条的重叠命中分别计数）
#[derive(Debug)]
pub struct MaskOutcome<'t> {
    pub text: Cow<'t, str>,
    pub hits: usize,
}

impl<'t> MaskOutcome<'t> {
    /// 文本是否被改写
    pub fn changed(&self) -> bool {
        matches!(self.text, Cow::Owned(_))
    }
}

impl MatcherSet {
    /// 从活动词表构建匹配器集合（词条按字面转义，构建不会失败）
    pub fn from_words(words: &[String]) -> Self {
        let ascii_only = words.iter().all(|w| w.is_ascii());
        let prefilter = if ascii_only && !words.is_empty() {
            Some(
                AhoCorasickBuilder::new()
                    .ascii_case_insensitive(true)
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(words)
                    .expect("build word prefilter"),
            )
        } else {
            None
        };

        let patterns = words
            .iter()
            .filter_map(|w| {
                // 纯 ASCII 词条禁用 Unicode 扩展，折叠口径与预筛一致
                RegexBuilder::new(&format!(r"\b{}\b", regex::escape(w)))
                    .case_insensitive(true)
                    .unicode(!w.is_ascii())
                    .build()
                    .ok()
            })
            .collect();

        Self { prefilter, patterns }
    }

    /// 词条数量
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// 对一段文本执行整词打码
    /// - 命中计数针对原始文本统计（每个词条独立计数）
    /// - 替换按词表顺序逐词作用于当前文本，命中片段改写为等字符数的 `*`
    pub fn mask<'t>(&self, text: &'t str) -> MaskOutcome<'t> {
        if self.patterns.is_empty() {
            return MaskOutcome { text: Cow::Borrowed(text), hits: 0 };
        }
        // 预筛：无任何词条子串出现时零拷贝返回
        if let Some(ac) = &self.prefilter {
            if !ac.is_match(text) {
                return MaskOutcome { text: Cow::Borrowed(text), hits: 0 };
            }
        }

        let mut hits = 0usize;
        for re in &self.patterns {
            hits += re.find_iter(text).count();
        }
        if hits == 0 {
            return MaskOutcome { text: Cow::Borrowed(text), hits: 0 };
        }

        let mut masked = text.to_string();
        for re in &self.patterns {
            if re.is_match(&masked) {
                masked = re
                    .replace_all(&masked, |caps: &regex::Captures| {
                        "*".repeat(caps[0].chars().count())
                    })
                    .into_owned();
            }
        }

        MaskOutcome { text: Cow::Owned(masked), hits }
    }
}
