//! 词表分层与活动词表构建（TOML）
//!
//! 三档强度严格嵌套：low ⊂ medium ⊂ high。分层以“增量数组”表达
//! （base / medium_extra / high_extra），嵌套关系由构造保证而非运行时校验。
use anyhow::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::settings::Strength;

/// 内置默认词表（编译期嵌入；与外置文件同格式）
const DEFAULT_TIERS_TOML: &str = include_str!("../wordlists/default.toml");

/// 分层词表：base 为 low 档全集，其余两档在前一档之上追加
#[derive(Debug, Clone, Deserialize)]
pub struct WordTiers {
    #[serde(default)]
    pub base: Vec<String>,
    #[serde(default)]
    pub medium_extra: Vec<String>,
    #[serde(default)]
    pub high_extra: Vec<String>,
}

impl WordTiers {
    /// 内置默认分层词表
    pub fn builtin() -> Self {
        Self::from_toml_str(DEFAULT_TIERS_TOML).expect("parse builtin word tiers")
    }

    /// 从 TOML 文本解析；所有词条归一化为小写
    pub fn from_toml_str(txt: &str) -> Result<Self> {
        let mut tiers: WordTiers = toml::from_str(txt)?;
        for list in [
            &mut tiers.base,
            &mut tiers.medium_extra,
            &mut tiers.high_extra,
        ] {
            for w in list.iter_mut() {
                *w = w.to_lowercase();
            }
        }
        Ok(tiers)
    }

    /// 指定强度档覆盖的全部词条（保持分层声明顺序）
    pub fn words_for(&self, strength: Strength) -> Vec<&str> {
        let mut out: Vec<&str> = self.base.iter().map(String::as_str).collect();
        if matches!(strength, Strength::Medium | Strength::High) {
            out.extend(self.medium_extra.iter().map(String::as_str));
        }
        if matches!(strength, Strength::High) {
            out.extend(self.high_extra.iter().map(String::as_str));
        }
        out
    }
}

/// 从 TOML 词表文件加载分层定义
pub fn load_word_tiers(path: &Path) -> Result<WordTiers> {
    let txt = std::fs::read_to_string(path)?;
    WordTiers::from_toml_str(&txt)
}

/// 构建活动词表：默认分层词条在前、自定义词条在后，首见保留去重
/// - `use_default_list` 为 false 时忽略分层词条，仅保留自定义词条
/// - 纯函数：无副作用、无 I/O；输出顺序稳定以便复现
pub fn build_active_list(
    tiers: &WordTiers,
    strength: Strength,
    use_default_list: bool,
    custom_words: &[String],
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();

    if use_default_list {
        for w in tiers.words_for(strength) {
            // 空词会产生零宽匹配，直接跳过
            if w.is_empty() {
                continue;
            }
            if seen.insert(w.to_string()) {
                out.push(w.to_string());
            }
        }
    }

    for w in custom_words {
        if w.is_empty() {
            continue;
        }
        if seen.insert(w.clone()) {
            out.push(w.clone());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_set(words: &[String]) -> HashSet<&str> {
        words.iter().map(String::as_str).collect()
    }

    #[test]
    fn builtin_tiers_have_expected_sizes() {
        let tiers = WordTiers::builtin();
        assert_eq!(tiers.base.len(), 6);
        assert_eq!(tiers.medium_extra.len(), 5);
        assert_eq!(tiers.high_extra.len(), 7);
    }

    #[test]
    fn strength_tiers_are_strictly_nested() {
        let tiers = WordTiers::builtin();
        let low = build_active_list(&tiers, Strength::Low, true, &[]);
        let medium = build_active_list(&tiers, Strength::Medium, true, &[]);
        let high = build_active_list(&tiers, Strength::High, true, &[]);

        assert_eq!(low.len(), 6);
        assert_eq!(medium.len(), 11);
        assert_eq!(high.len(), 18);

        let (low_s, medium_s, high_s) = (as_set(&low), as_set(&medium), as_set(&high));
        assert!(low_s.is_subset(&medium_s));
        assert!(medium_s.is_subset(&high_s));
    }

    #[test]
    fn disabled_default_list_keeps_custom_words_only() {
        let tiers = WordTiers::builtin();
        let custom = vec!["frak".to_string(), "gorram".to_string()];
        let list = build_active_list(&tiers, Strength::High, false, &custom);
        assert_eq!(list, custom);
    }

    #[test]
    fn custom_words_follow_tier_words_in_order() {
        let tiers = WordTiers::builtin();
        let custom = vec!["zap".to_string()];
        let list = build_active_list(&tiers, Strength::Low, true, &custom);
        assert_eq!(list.len(), 7);
        assert_eq!(list.first().map(String::as_str), Some("shit"));
        assert_eq!(list.last().map(String::as_str), Some("zap"));
    }

    #[test]
    fn duplicates_are_dropped_first_wins() {
        let tiers = WordTiers::builtin();
        // 自定义词与分层词重复时不会出现两次
        let custom = vec!["damn".to_string(), "damn".to_string(), "frak".to_string()];
        let list = build_active_list(&tiers, Strength::Low, true, &custom);
        assert_eq!(list.iter().filter(|w| w.as_str() == "damn").count(), 1);
        assert_eq!(list.len(), 7);
    }

    #[test]
    fn empty_entries_are_skipped() {
        let tiers = WordTiers::from_toml_str(r#"base = ["ok", ""]"#).unwrap();
        let custom = vec![String::new(), "fine".to_string()];
        let list = build_active_list(&tiers, Strength::Low, true, &custom);
        assert_eq!(list, vec!["ok".to_string(), "fine".to_string()]);
    }

    #[test]
    fn tier_file_entries_are_lowercased() {
        let tiers = WordTiers::from_toml_str(
            r#"
            base = ["Loud"]
            medium_extra = ["NOISY"]
            "#,
        )
        .unwrap();
        assert_eq!(tiers.base, vec!["loud".to_string()]);
        assert_eq!(tiers.medium_extra, vec!["noisy".to_string()]);
        assert!(tiers.high_extra.is_empty());
    }
}
