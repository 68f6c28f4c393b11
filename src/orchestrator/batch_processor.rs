//! 批量目标处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量目标的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：加载目标、规范化器、模型，打开浏览器，注入 Cookie
//! 2. **顺序处理**：目标之间严格串行，每个目标一次全新的采集会话
//! 3. **中断处理**：收到取消信号后写完当前目标即停止，不再开始新目标
//! 4. **资源管理**：持有 Browser 和 ChromeSession，确保生命周期正确
//! 5. **全局统计**：汇总所有目标的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个目标的细节
//! - **资源所有者**：唯一持有 Browser 的模块
//! - **向下委托**：委托 target_processor 处理单个目标

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use url::Url;

use crate::browser;
use crate::config::{Config, Mode};
use crate::error::ConfigError;
use crate::infrastructure::{AutomationSession, ChromeSession, Cookie};
use crate::models::{load_url_file, Target};
use crate::orchestrator::target_processor::{self, TargetContext};
use crate::services::{DatasetWriter, SpamClassifier, TextNormalizer};
use crate::utils::logging::{log_startup, log_target_start, print_final_stats};
use crate::workflow::TerminationReason;

/// 应用主结构
pub struct App {
    config: Config,
    targets: Vec<Target>,
    normalizer: Arc<TextNormalizer>,
    classifier: Option<SpamClassifier>,
    writer: DatasetWriter,
    _browser: Browser,
    session: ChromeSession,
}

impl App {
    /// 初始化应用
    ///
    /// 任何一步失败都属于启动失败，不会开始采集
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let targets = load_targets(&config).await?;
        let normalizer = Arc::new(TextNormalizer::from_config(&config)?);
        let classifier = load_classifier(&config, &normalizer)?;
        let cookies = load_cookies(&config)?;

        // 连接浏览器
        let (browser, page) = browser::open(&config).await?;
        let session = ChromeSession::new(page).with_poll_interval(config.poll_interval());

        if !cookies.is_empty() {
            inject_cookies(&session, cookies, targets.first()).await;
        }

        Ok(Self {
            writer: DatasetWriter::new(&config.output_dir),
            config,
            targets,
            normalizer,
            classifier,
            _browser: browser,
            session,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, cancel: &CancellationToken) -> RunSummary {
        let ctx = TargetContext {
            config: &self.config,
            normalizer: &self.normalizer,
            classifier: self.classifier.as_ref(),
            writer: &self.writer,
            cancel,
        };
        run_targets(&self.session, &self.targets, &ctx).await
    }
}

/// 严格串行处理所有目标
///
/// 开始每个目标前检查取消信号；当前目标被中断时写完它的数据集后停止
pub async fn run_targets(
    session: &dyn AutomationSession,
    targets: &[Target],
    ctx: &TargetContext<'_>,
) -> RunSummary {
    let mut summary = RunSummary {
        total: targets.len(),
        ..Default::default()
    };

    for target in targets {
        if ctx.cancel.is_cancelled() {
            warn!("🛑 已中断，跳过剩余 {} 个目标", summary.total - summary.processed());
            summary.interrupted = true;
            break;
        }

        log_target_start(target, summary.total);
        match target_processor::process_target(session, target, ctx).await {
            Ok(stats) => {
                summary.removed += stats.removed;
                match stats.reason {
                    TerminationReason::Fatal(_) => summary.failed += 1,
                    TerminationReason::Interrupted => {
                        summary.success += 1;
                        summary.interrupted = true;
                    }
                    _ => summary.success += 1,
                }
            }
            Err(e) => {
                error!("[目标 {}] ❌ 处理过程中发生错误: {}", target.ordinal, e);
                summary.failed += 1;
            }
        }

        if summary.interrupted {
            break;
        }
    }

    print_final_stats(
        summary.success,
        summary.failed,
        summary.total,
        summary.removed,
        &ctx.config.output_log_file,
    );
    summary
}

/// 全局处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    pub removed: usize,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.success + self.failed
    }

    /// 有任何目标异常结束时返回 1；中断不算失败
    pub fn exit_code(&self) -> u8 {
        u8::from(self.failed > 0)
    }
}

/// 合并配置里的链接和链接文件
async fn load_targets(config: &Config) -> Result<Vec<Target>> {
    let mut urls = config.target_urls.clone();
    if let Some(path) = &config.url_file {
        urls.extend(load_url_file(Path::new(path)).await?);
    }
    if urls.is_empty() {
        return Err(ConfigError::NoTargets.into());
    }

    info!("✓ 找到 {} 个待处理的视频", urls.len());
    Ok(urls
        .into_iter()
        .enumerate()
        .map(|(i, url)| Target::new(i + 1, url))
        .collect())
}

/// 加载分类模型
///
/// 删除模式必须有模型；采集模式下模型可选，加载失败时标签全部为 0
fn load_classifier(
    config: &Config,
    normalizer: &Arc<TextNormalizer>,
) -> Result<Option<SpamClassifier>> {
    let path = match (&config.model_path, config.mode) {
        (Some(path), _) => Path::new(path),
        (None, Mode::Moderate) => return Err(ConfigError::ModelRequired.into()),
        (None, Mode::Harvest) => {
            info!("未配置模型，数据集标签将全部为 0");
            return Ok(None);
        }
    };

    match SpamClassifier::load(path, normalizer.clone()) {
        Ok(classifier) => Ok(Some(classifier)),
        Err(e) if config.mode == Mode::Harvest => {
            warn!("⚠️ 模型加载失败，数据集标签将全部为 0: {}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// 读取登录 Cookie
///
/// 删除模式下 Cookie 文件必须存在（视为未登录）
fn load_cookies(config: &Config) -> Result<Vec<Cookie>> {
    let Some(path) = &config.cookies_file else {
        if config.mode == Mode::Moderate && config.browser_debug_port.is_none() {
            warn!("⚠️ 未配置 Cookie 文件，删除操作需要浏览器已登录");
        }
        return Ok(Vec::new());
    };

    if !Path::new(path).exists() {
        if config.mode == Mode::Moderate {
            return Err(ConfigError::NotLoggedIn { path: path.clone() }.into());
        }
        warn!("⚠️ Cookie 文件不存在，以未登录状态继续: {}", path);
        return Ok(Vec::new());
    }

    let content =
        std::fs::read_to_string(path).with_context(|| format!("无法读取Cookie文件: {}", path))?;
    let cookies: Vec<Cookie> = serde_json::from_str(&content)
        .with_context(|| format!("Cookie文件格式错误: {}", path))?;
    info!("✓ 加载了 {} 个 Cookie", cookies.len());
    Ok(cookies)
}

/// 注入 Cookie，单个失败只记录警告
///
/// 没有 domain 的 Cookie 使用第一个目标的域名
async fn inject_cookies(
    session: &dyn AutomationSession,
    cookies: Vec<Cookie>,
    first: Option<&Target>,
) {
    let fallback_domain = first
        .and_then(|t| Url::parse(&t.url).ok())
        .and_then(|u| u.domain().map(|d| format!(".{}", d.trim_start_matches("www."))));

    let total = cookies.len();
    let mut added = 0;
    for mut cookie in cookies {
        if cookie.domain.is_none() {
            cookie.domain = fallback_domain.clone();
        }
        match session.add_cookie(&cookie).await {
            Ok(()) => added += 1,
            Err(e) => warn!("⚠️ 跳过 Cookie {}: {}", cookie.name, e),
        }
    }
    info!("✓ 已注入 {}/{} 个 Cookie", added, total);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_exit_code() {
        let mut summary = RunSummary {
            total: 2,
            success: 2,
            interrupted: true,
            ..Default::default()
        };
        assert_eq!(summary.exit_code(), 0);
        summary.failed = 1;
        assert_eq!(summary.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_load_targets_merges_sources() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://youtu.be/b\n\nhttps://youtu.be/c").unwrap();

        let config = Config {
            target_urls: vec!["https://youtu.be/a".into()],
            url_file: Some(file.path().display().to_string()),
            ..Config::default()
        };
        let targets = load_targets(&config).await.unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[2], Target::new(3, "https://youtu.be/c"));
    }

    #[tokio::test]
    async fn test_no_targets_is_setup_failure() {
        let err = load_targets(&Config::default()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NoTargets)
        ));
    }

    #[test]
    fn test_moderate_requires_model_and_cookies() {
        let normalizer = Arc::new(TextNormalizer::new());
        let config = Config {
            mode: Mode::Moderate,
            ..Config::default()
        };
        let err = load_classifier(&config, &normalizer).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ModelRequired)
        ));

        let config = Config {
            mode: Mode::Moderate,
            cookies_file: Some("/nonexistent/cookies.json".into()),
            ..Config::default()
        };
        let err = load_cookies(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotLoggedIn { .. })
        ));
    }

    #[test]
    fn test_harvest_tolerates_missing_model() {
        let normalizer = Arc::new(TextNormalizer::new());
        let config = Config {
            model_path: Some("/nonexistent/model.json".into()),
            ..Config::default()
        };
        assert!(load_classifier(&config, &normalizer).unwrap().is_none());
    }
}
