//! 扫描协调器：配置、统计与扫描调度
//!
//! 设计要点：
//! - 协调器独占配置与统计的写权；遍历与匹配只读词表、只写文本叶。
//! - 未初始化或未启用时所有扫描入口直接空转（页面侧零感知）。
//! - 全页扫描无条件回写统计（pagesScanned / lastScanTimestamp 必变）；
//!   增量扫描仅在有命中时回写。两者不对称，刻意保留。
//! - 统计写入失败只告警不上抛，后续扫描不受影响。
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::DocumentNode;
use crate::matcher::MatcherSet;
use crate::settings::{FilterConfig, ScanStats, SettingsStore, StoreError, Strength};
use crate::walker::{self, WalkOutcome};
use crate::wordlist::{self, WordTiers};

/// UI 下发的控制消息（JSON，`action` 字段区分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlMessage {
    UpdateFilterState { enabled: bool },
    UpdateFilterStrength { strength: Strength },
}

/// 控制消息的应答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ControlResponse {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(err: impl std::fmt::Display) -> Self {
        Self { success: false, error: Some(err.to_string()) }
    }
}

/// 页面过滤协调器
///
/// 文档树由宿主持有，扫描入口按次传入可变引用；
/// 存储句柄与分层词表在构造时注入。
pub struct PageFilter<S: SettingsStore> {
    store: S,
    tiers: WordTiers,
    config: FilterConfig,
    stats: ScanStats,
    matchers: MatcherSet,
    initialized: bool,
}

impl<S: SettingsStore> PageFilter<S> {
    /// 使用内置分层词表构造（未初始化状态）
    pub fn new(store: S) -> Self {
        Self::with_tiers(store, WordTiers::builtin())
    }

    /// 使用外部分层词表构造
    pub fn with_tiers(store: S, tiers: WordTiers) -> Self {
        Self {
            store,
            tiers,
            config: FilterConfig::default(),
            stats: ScanStats::default(),
            matchers: MatcherSet::from_words(&[]),
            initialized: false,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 当前活动词条数
    pub fn word_count(&self) -> usize {
        self.matchers.len()
    }

    /// 加载持久化设置并构建活动词表；可重复调用（按新设置重建）
    ///
    /// 加载失败时退回内置默认配置并告警；`initialized` 保持原值，
    /// 首次初始化失败即意味着过滤器不激活。
    pub fn init(&mut self) {
        match self.store.load() {
            Ok(doc) => {
                self.config = FilterConfig::from(&doc);
                self.stats = doc.stats;
                self.rebuild_matchers();
                self.initialized = true;
                debug!(
                    words = self.matchers.len(),
                    enabled = self.config.enabled,
                    strength = self.config.strength.as_str(),
                    "content filter initialized"
                );
            }
            Err(err) => {
                warn!(error = %err, "failed to load settings, falling back to defaults");
                self.config = FilterConfig::default();
                self.rebuild_matchers();
            }
        }
    }

    /// 全页扫描：遍历整棵文档树并就地打码
    ///
    /// 无条件推进 pagesScanned 与 lastScanTimestamp 并回写统计，
    /// 零命中也不例外。
    pub fn scan_document(&mut self, root: &mut DocumentNode) -> WalkOutcome {
        if !self.config.enabled || !self.initialized {
            return WalkOutcome::default();
        }

        let outcome = walker::walk(root, &self.matchers);
        self.stats.blocked_words += outcome.matched as u64;
        self.stats.pages_scanned += 1;
        self.stats.last_scan_timestamp = current_timestamp();
        self.persist_stats();
        debug!(
            matched = outcome.matched,
            masked_nodes = outcome.masked_nodes,
            "full page scan finished"
        );
        outcome
    }

    /// 增量扫描：处理一批新观测到的子树
    ///
    /// 仅在产生命中时累计并回写统计。
    pub fn scan_nodes<'a, I>(&mut self, nodes: I) -> WalkOutcome
    where
        I: IntoIterator<Item = &'a mut DocumentNode>,
    {
        if !self.config.enabled || !self.initialized {
            return WalkOutcome::default();
        }

        let outcome = walker::walk_many(nodes, &self.matchers);
        if outcome.matched > 0 {
            self.stats.blocked_words += outcome.matched as u64;
            self.persist_stats();
            debug!(matched = outcome.matched, "incremental scan masked new content");
        }
        outcome
    }

    /// 更新启用开关；本身不触发重扫（重扫由消息层决定）
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        debug!(enabled, "filter state updated");
    }

    /// 更新过滤强度：从存储重读词源（useDefaultList / customWords），
    /// 按新强度重建活动词表；若当前启用则立即全页重扫。
    ///
    /// 重读失败时返回错误，词表维持原样（强度字段已按新值记录）。
    pub fn update_strength(
        &mut self,
        strength: Strength,
        root: &mut DocumentNode,
    ) -> Result<(), StoreError> {
        self.config.strength = strength;
        let doc = self.store.load()?;
        self.config.use_default_list = doc.use_default_list;
        self.config.custom_words = doc.custom_words;
        self.rebuild_matchers();
        debug!(
            strength = strength.as_str(),
            words = self.matchers.len(),
            "filter strength updated"
        );
        if self.config.enabled {
            self.scan_document(root);
        }
        Ok(())
    }

    /// 处理一条控制消息并生成应答
    pub fn handle_message(
        &mut self,
        message: ControlMessage,
        root: &mut DocumentNode,
    ) -> ControlResponse {
        match message {
            ControlMessage::UpdateFilterState { enabled } => {
                self.set_enabled(enabled);
                // 开启时立即全量重扫，关闭时不动已渲染内容
                if enabled {
                    self.scan_document(root);
                }
                ControlResponse::ok()
            }
            ControlMessage::UpdateFilterStrength { strength } => {
                match self.update_strength(strength, root) {
                    Ok(()) => ControlResponse::ok(),
                    Err(err) => {
                        warn!(error = %err, "strength update failed");
                        ControlResponse::failed(err)
                    }
                }
            }
        }
    }

    fn rebuild_matchers(&mut self) {
        let words = wordlist::build_active_list(
            &self.tiers,
            self.config.strength,
            self.config.use_default_list,
            &self.config.custom_words,
        );
        self.matchers = MatcherSet::from_words(&words);
    }

    fn persist_stats(&self) {
        if let Err(err) = self.store.save_stats(&self.stats) {
            warn!(error = %err, "failed to persist scan stats");
        }
    }
}

fn current_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
