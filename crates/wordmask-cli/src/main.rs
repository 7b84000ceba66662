use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;
use wordmask_core::{
    load_word_tiers, read_document, write_document, DocumentNode, JsonFileStore, PageFilter,
    SettingsStore, StoredSettings, Strength, WordTiers,
};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "wordmask", version, about = "页面脏话扫描与打码工具")]
struct Cli {
    /// 设置文件路径（默认 <用户配置目录>/wordmask/settings.json）
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描文档并输出打码结果
    Scan {
        /// 输入文件或目录（.json 按文档树解析，其余按纯文本）
        #[arg(long)]
        input: PathBuf,

        /// 输出路径（缺省打印到标准输出；输入为目录时必须给目录）
        #[arg(long)]
        output: Option<PathBuf>,

        /// 分层词表文件（TOML），缺省使用内置词表
        #[arg(long)]
        wordlist: Option<PathBuf>,
    },

    /// 查看累计统计
    Stats,

    /// 开启过滤
    Enable,

    /// 关闭过滤
    Disable,

    /// 调整过滤强度
    Strength {
        /// 档位：low / medium / high
        #[arg(value_parser = ["low", "medium", "high"])]
        level: String,
    },

    /// 管理自定义词条
    Words {
        #[command(subcommand)]
        action: WordsAction,
    },
}

#[derive(Subcommand, Debug)]
enum WordsAction {
    /// 添加词条（统一转小写保存）
    Add { word: String },
    /// 移除词条
    Remove { word: String },
    /// 列出全部词条
    List,
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();
    let store = JsonFileStore::new(settings_path(cli.settings)?);

    match cli.command {
        Commands::Scan { input, output, wordlist } => run_scan(store, input, output, wordlist)?,
        Commands::Stats => show_stats(&store)?,
        Commands::Enable => set_enabled_key(&store, true)?,
        Commands::Disable => set_enabled_key(&store, false)?,
        Commands::Strength { level } => set_strength_key(&store, parse_strength(&level)?)?,
        Commands::Words { action } => run_words(&store, action)?,
    }

    Ok(())
}

/// 扫描单个文件或目录下的全部文档
fn run_scan(
    store: JsonFileStore,
    input: PathBuf,
    output: Option<PathBuf>,
    wordlist: Option<PathBuf>,
) -> Result<()> {
    let tiers = match wordlist {
        Some(path) => load_word_tiers(&path)
            .with_context(|| format!("load word list {}", path.display()))?,
        None => WordTiers::builtin(),
    };

    let settings_file = store.path().clone();
    let mut filter = PageFilter::with_tiers(store, tiers);
    filter.init();
    if !filter.is_initialized() {
        bail!("settings store {} unreadable, fix or remove it", settings_file.display());
    }
    if !filter.config().enabled {
        warn!("filtering disabled in settings, text passes through unmasked");
    }
    info!(words = filter.word_count(), ?input, "starting scan");

    if input.is_dir() {
        let Some(out_dir) = output else {
            bail!("--output directory is required when input is a directory");
        };
        fs::create_dir_all(&out_dir).context("create output directory")?;

        // 只取第一层文件，按名字排序保证处理顺序稳定
        let mut files: Vec<PathBuf> = WalkDir::new(&input)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();

        let mut total = 0usize;
        let mut written = 0usize;
        for path in files {
            let mut doc = match read_document(&path) {
                Ok(doc) => doc,
                Err(err) => {
                    warn!(error = %err, file = %path.display(), "skip unreadable document");
                    continue;
                }
            };
            let outcome = filter.scan_document(&mut doc);
            let name = path.file_name().context("document file name")?;
            write_document(&out_dir.join(name), &doc)?;
            total += outcome.matched;
            written += 1;
        }
        info!(files_written = written, matched = total, "scan finished");
    } else {
        let mut doc = read_document(&input)?;
        let outcome = filter.scan_document(&mut doc);
        match output {
            Some(path) => {
                write_document(&path, &doc)?;
                info!(output = %path.display(), matched = outcome.matched, "scan finished");
            }
            None => {
                print_document(&input, &doc)?;
                info!(matched = outcome.matched, "scan finished");
            }
        }
    }

    Ok(())
}

/// 读设置并在报错里带上文件位置，方便用户定位坏文件
fn load_settings(store: &JsonFileStore) -> Result<StoredSettings> {
    store
        .load()
        .with_context(|| format!("load settings {}", store.path().display()))
}

fn show_stats(store: &JsonFileStore) -> Result<()> {
    let doc = load_settings(store)?;
    println!("blocked words: {}", doc.stats.blocked_words);
    println!("pages scanned: {}", doc.stats.pages_scanned);
    if doc.stats.last_scan_timestamp.is_empty() {
        println!("last scan:     never");
    } else {
        println!("last scan:     {}", doc.stats.last_scan_timestamp);
    }
    Ok(())
}

fn set_enabled_key(store: &JsonFileStore, enabled: bool) -> Result<()> {
    let mut doc = load_settings(store)?;
    doc.enabled = enabled;
    store.save(&doc).context("save settings")?;
    info!(enabled, "filter state saved");
    Ok(())
}

fn set_strength_key(store: &JsonFileStore, strength: Strength) -> Result<()> {
    let mut doc = load_settings(store)?;
    doc.strength = strength;
    store.save(&doc).context("save settings")?;
    info!(strength = strength.as_str(), "filter strength saved");
    Ok(())
}

fn run_words(store: &JsonFileStore, action: WordsAction) -> Result<()> {
    let mut doc = load_settings(store)?;
    match action {
        WordsAction::Add { word } => {
            // 与界面侧一致：词条统一保存为小写
            let word = word.trim().to_lowercase();
            if word.is_empty() {
                bail!("word must not be empty");
            }
            if doc.custom_words.contains(&word) {
                info!(%word, "word already present");
                return Ok(());
            }
            doc.custom_words.push(word.clone());
            store.save(&doc).context("save settings")?;
            info!(%word, count = doc.custom_words.len(), "word added");
        }
        WordsAction::Remove { word } => {
            let word = word.trim().to_lowercase();
            let before = doc.custom_words.len();
            doc.custom_words.retain(|w| *w != word);
            if doc.custom_words.len() == before {
                warn!(%word, "word not found");
                return Ok(());
            }
            store.save(&doc).context("save settings")?;
            info!(%word, count = doc.custom_words.len(), "word removed");
        }
        WordsAction::List => {
            if doc.custom_words.is_empty() {
                println!("no custom words");
            }
            for word in &doc.custom_words {
                println!("{word}");
            }
        }
    }
    Ok(())
}

/// 把打码结果打印到标准输出（格式跟随输入文件）
fn print_document(input: &Path, doc: &DocumentNode) -> Result<()> {
    if input.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        println!("{}", serde_json::to_string_pretty(doc).context("serialize document tree")?);
    } else {
        print!("{}", doc.text_content());
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析设置文件位置：命令行优先，其次用户配置目录
fn settings_path(arg: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path);
    }
    let base = dirs::config_dir().context("cannot locate user config directory")?;
    Ok(base.join("wordmask").join("settings.json"))
}

/// 解析强度档位
fn parse_strength(s: &str) -> Result<Strength> {
    match s.to_ascii_lowercase().as_str() {
        "low" => Ok(Strength::Low),
        "medium" => Ok(Strength::Medium),
        "high" => Ok(Strength::High),
        other => bail!("unknown strength level: {other}"),
    }
}
