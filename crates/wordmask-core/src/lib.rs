//! 页面文本过滤核心库
//!
//! 设计要点：
//! - 词表按强度分层（low ⊂ medium ⊂ high），与用户自定义词条合并为活动词表。
//! - 匹配为整词、大小写不敏感；命中片段改写为等字符数的 `*`。
//! - 文档树遍历对 script/style 子树整棵跳过；打码直接改写文本叶。
//! - 协调器负责配置装载、统计累计与持久化；扫描路径自身永不失败。

mod document;
mod filter;
mod matcher;
mod settings;
mod walker;
mod wordlist;

pub use document::{is_opaque_tag, read_document, write_document, DocumentNode};
pub use filter::{ControlMessage, ControlResponse, PageFilter};
pub use matcher::{MaskOutcome, MatcherSet};
pub use settings::{
    FilterConfig, JsonFileStore, MemoryStore, ScanStats, SettingsStore, StoreError,
    StoredSettings, Strength, Theme,
};
pub use walker::{walk, walk_many, WalkOutcome};
pub use wordlist::{build_active_list, load_word_tiers, WordTiers};
