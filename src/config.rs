use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::LocatorScheme;
use crate::services::normalizer::DEFAULT_CACHE_CAPACITY;

/// 运行模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 只采集，输出带标签的数据集
    Harvest,
    /// 采集的同时删除判定为垃圾的评论
    Moderate,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "harvest" => Ok(Mode::Harvest),
            "moderate" | "remove" => Ok(Mode::Moderate),
            other => Err(other.to_string()),
        }
    }
}

/// 评论排序方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Newest,
    Top,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "top" => Ok(SortOrder::Top),
            other => Err(other.to_string()),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 运行模式
    pub mode: Mode,
    /// 目标视频链接
    pub target_urls: Vec<String>,
    /// 链接列表文件（每行一个）
    pub url_file: Option<String>,
    /// 数据集输出目录
    pub output_dir: String,
    /// 分类模型路径
    pub model_path: Option<String>,
    // --- 浏览器配置 ---
    /// 已运行浏览器的调试端口；未设置时自行启动浏览器
    pub browser_debug_port: Option<u16>,
    pub headless: bool,
    pub chrome_executable: Option<String>,
    pub user_data_dir: Option<String>,
    /// 登录 Cookie 文件（JSON 数组）
    pub cookies_file: Option<String>,
    // --- 采集配置 ---
    pub sort_by: SortOrder,
    /// 同一位置连续找不到评论的最大次数
    pub max_fails: u32,
    pub max_comments: Option<usize>,
    pub locate_timeout_ms: u64,
    pub action_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub recovery_scroll_px: i64,
    pub recovery_pause_ms: u64,
    pub click_settle_ms: u64,
    pub confirm_settle_ms: u64,
    // --- 规范化配置 ---
    pub lemmatize: bool,
    pub lemma_cache_capacity: usize,
    pub stopwords_file: Option<String>,
    pub lemma_dictionary_file: Option<String>,
    /// 输出日志文件
    pub output_log_file: String,
    /// 定位方案
    pub locators: LocatorScheme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Harvest,
            target_urls: Vec::new(),
            url_file: None,
            output_dir: "output".to_string(),
            model_path: None,
            browser_debug_port: None,
            headless: false,
            chrome_executable: None,
            user_data_dir: None,
            cookies_file: None,
            sort_by: SortOrder::Newest,
            max_fails: 3,
            max_comments: None,
            locate_timeout_ms: 10_000,
            action_timeout_ms: 5_000,
            poll_interval_ms: 250,
            recovery_scroll_px: 500,
            recovery_pause_ms: 1_000,
            click_settle_ms: 500,
            confirm_settle_ms: 1_500,
            lemmatize: true,
            lemma_cache_capacity: DEFAULT_CACHE_CAPACITY,
            stopwords_file: None,
            lemma_dictionary_file: None,
            output_log_file: "anti_judol.log".to_string(),
            locators: LocatorScheme::default(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → 配置文件（`ANTI_JUDOL_CONFIG`）→ 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("ANTI_JUDOL_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 只从环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(mode) = parse_env::<Mode>("MODE", "harvest|moderate")? {
            self.mode = mode;
        }
        if let Ok(urls) = std::env::var("TARGET_URLS") {
            self.target_urls = urls
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect();
        }
        override_string(&mut self.url_file, "URL_FILE");
        if let Ok(dir) = std::env::var("OUTPUT_DIR") {
            self.output_dir = dir;
        }
        override_string(&mut self.model_path, "MODEL_PATH");
        if let Some(port) = parse_env::<u16>("BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = Some(port);
        }
        if let Some(headless) = parse_env::<bool>("HEADLESS", "bool")? {
            self.headless = headless;
        }
        override_string(&mut self.chrome_executable, "CHROME_EXECUTABLE");
        override_string(&mut self.user_data_dir, "USER_DATA_DIR");
        override_string(&mut self.cookies_file, "COOKIES_FILE");
        if let Some(sort_by) = parse_env::<SortOrder>("SORT_BY", "newest|top")? {
            self.sort_by = sort_by;
        }
        if let Some(max_fails) = parse_env::<u32>("MAX_FAILS", "u32")? {
            self.max_fails = max_fails;
        }
        if let Some(max_comments) = parse_env::<usize>("MAX_COMMENTS", "usize")? {
            self.max_comments = Some(max_comments);
        }
        if let Some(ms) = parse_env::<u64>("LOCATE_TIMEOUT_MS", "u64")? {
            self.locate_timeout_ms = ms;
        }
        if let Some(ms) = parse_env::<u64>("ACTION_TIMEOUT_MS", "u64")? {
            self.action_timeout_ms = ms;
        }
        if let Some(lemmatize) = parse_env::<bool>("LEMMATIZE", "bool")? {
            self.lemmatize = lemmatize;
        }
        override_string(&mut self.stopwords_file, "STOPWORDS_FILE");
        override_string(&mut self.lemma_dictionary_file, "LEMMA_DICTIONARY_FILE");
        if let Ok(file) = std::env::var("OUTPUT_LOG_FILE") {
            self.output_log_file = file;
        }
        Ok(self)
    }

    pub fn locate_timeout(&self) -> Duration {
        Duration::from_millis(self.locate_timeout_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn recovery_pause(&self) -> Duration {
        Duration::from_millis(self.recovery_pause_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn confirm_settle(&self) -> Duration {
        Duration::from_millis(self.confirm_settle_ms)
    }
}

fn override_string(field: &mut Option<String>, var_name: &str) {
    if let Ok(value) = std::env::var(var_name) {
        *field = (!value.trim().is_empty()).then_some(value);
    }
}

fn parse_env<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
