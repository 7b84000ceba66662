//! 设置文档与持久化存储（模块）
//!
//! 设计要点：
//! - 所有持久化键集中在一个 JSON 文档（`StoredSettings`），与外部 UI 共享；
//!   核心只读取过滤相关键，只写回 `stats`，其余键（含未建模的陌生键）原样保留。
//! - 每个字段带 serde 默认值：旧版/残缺文档反序列化后自动补全为文档化默认。
//! - 存储层抽象为 `SettingsStore` trait；文件实现与内存实现可互换。
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;

/// 过滤强度档位（决定默认词表覆盖范围）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Low,
    #[default]
    Medium,
    High,
}

impl Strength {
    /// 持久化/展示用的小写名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Low => "low",
            Strength::Medium => "medium",
            Strength::High => "high",
        }
    }
}

/// 界面主题（仅供外部 UI 使用；核心不读取，但写回时必须保留）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// 核心消费的过滤配置（由设置文档派生，扫描过程中不被修改）
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub enabled: bool,
    pub strength: Strength,
    pub use_default_list: bool,
    pub custom_words: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: Strength::Medium,
            use_default_list: true,
            custom_words: Vec::new(),
        }
    }
}

impl From<&StoredSettings> for FilterConfig {
    fn from(doc: &StoredSettings) -> Self {
        Self {
            enabled: doc.enabled,
            strength: doc.strength,
            use_default_list: doc.use_default_list,
            custom_words: doc.custom_words.clone(),
        }
    }
}

/// 扫描统计（单调递增，每次持久化整体写回）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    #[serde(default)]
    pub blocked_words: u64,
    #[serde(default)]
    pub pages_scanned: u64,
    #[serde(default)]
    pub last_scan_timestamp: String,
}

/// 持久化设置文档（完整键集）
/// 对应键名：enabled / strength / useDefaultList / customWords / theme / stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub strength: Strength,

    #[serde(default = "default_use_default_list")]
    pub use_default_list: bool,

    #[serde(default)]
    pub custom_words: Vec<String>,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub stats: ScanStats,

    /// 未建模的键（其他界面写入）：读写往返原样保留
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

fn default_use_default_list() -> bool {
    true
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            strength: Strength::default(),
            use_default_list: default_use_default_list(),
            custom_words: Vec::new(),
            theme: Theme::default(),
            stats: ScanStats::default(),
            extra: BTreeMap::new(),
        }
    }
}

/// 存储层错误：不可读（IO）或文档损坏（JSON 解析失败）
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings store unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings document corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// 设置存储抽象（读写均为阻塞调用）
/// - `save_stats` 语义等价于“只更新 stats 键”：读取-修改-写回，保留其余键。
pub trait SettingsStore {
    fn load(&self) -> Result<StoredSettings, StoreError>;
    fn save(&self, doc: &StoredSettings) -> Result<(), StoreError>;

    fn save_stats(&self, stats: &ScanStats) -> Result<(), StoreError> {
        // 文档损坏时退回默认骨架，避免统计写入被旧损坏内容卡死
        let mut doc = self.load().unwrap_or_default();
        doc.stats = stats.clone();
        self.save(&doc)
    }
}

/// 基于单个 JSON 文件的存储实现
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    /// 读取设置文档
    /// - 文件不存在视为首次运行，返回默认文档（与原生 KV 存储“缺键给默认”一致）
    /// - 读失败或解析失败按 `StoreError` 上抛，由调用方决定降级策略
    fn load(&self) -> Result<StoredSettings, StoreError> {
        let txt = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredSettings::default());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(serde_json::from_str(&txt)?)
    }

    fn save(&self, doc: &StoredSettings) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// 内存存储（共享句柄）：供嵌入方与测试使用
/// 克隆得到的是同一份文档的句柄，模拟多方共享同一个外部存储区
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    doc: StoredSettings,
    saves: usize,
    fail_loads: bool,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: StoredSettings) -> Self {
        let store = Self::default();
        store.inner.borrow_mut().doc = doc;
        store
    }

    /// 当前文档快照
    pub fn document(&self) -> StoredSettings {
        self.inner.borrow().doc.clone()
    }

    pub fn set_document(&self, doc: StoredSettings) {
        self.inner.borrow_mut().doc = doc;
    }

    /// 累计成功写入次数（用于验证持久化触发时机）
    pub fn saves(&self) -> usize {
        self.inner.borrow().saves
    }

    /// 让后续 load 调用失败（模拟存储不可读）
    pub fn set_fail_loads(&self, fail: bool) {
        self.inner.borrow_mut().fail_loads = fail;
    }

    /// 让后续 save 调用失败（模拟存储不可写）
    pub fn set_fail_saves(&self, fail: bool) {
        self.inner.borrow_mut().fail_saves = fail;
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<StoredSettings, StoreError> {
        let inner = self.inner.borrow();
        if inner.fail_loads {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store unavailable",
            )));
        }
        Ok(inner.doc.clone())
    }

    fn save(&self, doc: &StoredSettings) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_saves {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store unavailable",
            )));
        }
        inner.doc = doc.clone();
        inner.saves += 1;
        Ok(())
    }
}
