//! 基于文件存储的端到端流程测试
use std::fs;

use wordmask_core::{
    ControlMessage, DocumentNode, JsonFileStore, PageFilter, SettingsStore, Strength,
};

fn body(leaves: &[&str]) -> DocumentNode {
    DocumentNode::element(
        "body",
        leaves.iter().map(|t| DocumentNode::text(*t)).collect(),
    )
}

#[test]
fn scan_round_trip_preserves_foreign_settings_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{
            "enabled": true,
            "strength": "low",
            "useDefaultList": true,
            "customWords": ["flibber"],
            "theme": "dark",
            "syncRevision": 4,
            "stats": {"blockedWords": 5, "pagesScanned": 2, "lastScanTimestamp": ""}
        }"#,
    )
    .unwrap();

    let mut filter = PageFilter::new(JsonFileStore::new(path.clone()));
    filter.init();
    assert!(filter.is_initialized());
    assert_eq!(filter.word_count(), 7);

    let mut root = body(&["this is shit", "flibber flies"]);
    let outcome = filter.scan_document(&mut root);
    assert_eq!(outcome.matched, 2);
    assert_eq!(root.text_content(), "this is *********** flies");

    // 统计写回文件，theme / customWords 乃至未建模键都原样保留
    let raw = fs::read_to_string(&path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["theme"], "dark");
    assert_eq!(doc["customWords"][0], "flibber");
    assert_eq!(doc["syncRevision"], 4);
    assert_eq!(doc["stats"]["blockedWords"], 7);
    assert_eq!(doc["stats"]["pagesScanned"], 3);
    assert_ne!(doc["stats"]["lastScanTimestamp"], "");
}

#[test]
fn missing_settings_file_means_first_run_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut filter = PageFilter::new(JsonFileStore::new(path.clone()));
    filter.init();
    assert!(filter.is_initialized());
    assert!(filter.config().enabled);
    assert_eq!(filter.config().strength, Strength::Medium);

    let mut root = body(&["damn"]);
    filter.scan_document(&mut root);
    assert_eq!(root.text_content(), "****");

    // 首次统计写回会落出完整设置文件
    let raw = fs::read_to_string(&path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["enabled"], true);
    assert_eq!(doc["strength"], "medium");
    assert_eq!(doc["stats"]["blockedWords"], 1);
}

#[test]
fn corrupt_settings_file_leaves_filter_inactive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();

    let mut filter = PageFilter::new(JsonFileStore::new(path.clone()));
    filter.init();
    assert!(!filter.is_initialized());

    let mut root = body(&["damn"]);
    let outcome = filter.scan_document(&mut root);
    assert_eq!(outcome.matched, 0);
    assert_eq!(root.text_content(), "damn");
    // 文件不被覆盖
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn strength_message_picks_up_externally_edited_words() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{"enabled": true, "strength": "medium", "useDefaultList": true, "customWords": []}"#,
    )
    .unwrap();

    let mut filter = PageFilter::new(JsonFileStore::new(path.clone()));
    filter.init();
    let mut root = body(&["bloody zork"]);
    filter.scan_document(&mut root);
    assert_eq!(root.text_content(), "bloody zork");

    // 模拟界面端：先改写设置文件，再下发强度消息
    let ui_store = JsonFileStore::new(path.clone());
    let mut doc = ui_store.load().unwrap();
    doc.strength = Strength::High;
    doc.custom_words.push("zork".to_string());
    ui_store.save(&doc).unwrap();

    let message: ControlMessage =
        serde_json::from_str(r#"{"action": "updateFilterStrength", "strength": "high"}"#).unwrap();
    let resp = filter.handle_message(message, &mut root);
    assert!(resp.success);
    assert_eq!(filter.word_count(), 19);
    assert_eq!(root.text_content(), "****** ****");
}
