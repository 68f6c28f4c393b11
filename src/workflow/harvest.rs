//! 评论采集会话 - 流程层
//!
//! 在虚拟化、懒渲染的评论列表上逐条枚举评论。
//!
//! 状态流转：
//!
//! ```text
//! ScrollingToList → Locating(i) → Extracting(i) → Recorded(i) → Locating(i+1) …
//!                        ↓               ↓
//!                     Retry(i) ←─────────┘
//!                        ↓ (fail_count ≥ max_fails)
//!                   Terminated(reason)
//! ```
//!
//! 列表是虚拟化的，单次探测无法区分"还没渲染"和"已经到底"。重试预算把这种
//! 歧义变成一个有界的停止规则：同一位置连续 `max_fails` 次找不到就结束。
//! 这是启发式上界，不保证采集完整：加载慢的页面可能提前结束。
//!
//! 重试预算由状态机自己持有（`max_fails` × `locate_timeout`），因为两次尝试之间
//! 必须插入一次恢复滚动；单次尝试内部的轮询由会话层的 `BoundedRetry::once` 完成。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{Config, SortOrder};
use crate::error::BrowserError;
use crate::infrastructure::AutomationSession;
use crate::models::{Comment, HarvestState, LocatorScheme};

/// 采集参数
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub max_fails: u32,
    pub max_comments: Option<usize>,
    /// 等待第 i 条评论出现的超时
    pub locate_timeout: Duration,
    /// 读取作者/正文的超时
    pub read_timeout: Duration,
    /// 设置排序时等待菜单的超时
    pub action_timeout: Duration,
    pub recovery_scroll_px: i64,
    pub recovery_pause: Duration,
    pub sort_by: SortOrder,
}

impl HarvestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_fails: config.max_fails,
            max_comments: config.max_comments,
            locate_timeout: config.locate_timeout(),
            read_timeout: config.locate_timeout(),
            action_timeout: config.action_timeout(),
            recovery_scroll_px: config.recovery_scroll_px,
            recovery_pause: config.recovery_pause(),
            sort_by: config.sort_by,
        }
    }
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 终止原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// 达到 `max_comments`
    Limit,
    /// 同一位置重试预算耗尽（视为列表结束）
    Exhausted,
    /// 非预期错误
    Fatal(String),
    /// 收到取消信号
    Interrupted,
}

impl TerminationReason {
    pub fn is_abnormal(&self) -> bool {
        matches!(self, TerminationReason::Fatal(_))
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Limit => write!(f, "达到数量上限"),
            TerminationReason::Exhausted => write!(f, "重试次数耗尽"),
            TerminationReason::Fatal(msg) => write!(f, "非预期错误: {}", msg),
            TerminationReason::Interrupted => write!(f, "用户中断"),
        }
    }
}

/// 采集阶段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestPhase {
    ScrollingToList,
    Locating(usize),
    Extracting(usize),
    Recorded(usize),
    Retry(usize),
    Terminated(TerminationReason),
}

/// 记录一条评论后枚举位置如何移动
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// 前进到下一条
    Next,
    /// 留在原位（该条已被删除，后面的评论补位）
    Stay,
}

/// 每条评论记录后的回调
#[async_trait]
pub trait CommentSink: Send {
    async fn on_recorded(
        &mut self,
        session: &dyn AutomationSession,
        index: usize,
        comment: &mut Comment,
    ) -> Result<Advance, BrowserError>;
}

/// 只采集，不做任何处理
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectOnly;

#[async_trait]
impl CommentSink for CollectOnly {
    async fn on_recorded(
        &mut self,
        _session: &dyn AutomationSession,
        _index: usize,
        _comment: &mut Comment,
    ) -> Result<Advance, BrowserError> {
        Ok(Advance::Next)
    }
}

/// 采集结果
#[derive(Debug)]
pub struct HarvestOutcome {
    pub reason: TerminationReason,
    pub comments: Vec<Comment>,
    pub state: HarvestState,
}

/// 单个页面的一次采集
pub struct HarvestSession {
    locators: LocatorScheme,
    options: HarvestOptions,
    state: HarvestState,
    comments: Vec<Comment>,
    cancel: CancellationToken,
    label: String,
}

impl HarvestSession {
    pub fn new(locators: LocatorScheme, options: HarvestOptions, cancel: CancellationToken) -> Self {
        Self {
            state: HarvestState::new(options.max_fails, options.max_comments),
            locators,
            options,
            comments: Vec::new(),
            cancel,
            label: "采集".to_string(),
        }
    }

    /// 日志前缀
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// 运行到终止状态
    ///
    /// 无论以何种原因终止，已记录的评论都会随结果返回
    pub async fn run(
        mut self,
        session: &dyn AutomationSession,
        sink: &mut dyn CommentSink,
    ) -> HarvestOutcome {
        let mut phase = HarvestPhase::ScrollingToList;

        loop {
            if self.cancel.is_cancelled() && !matches!(phase, HarvestPhase::Terminated(_)) {
                info!("[{}] 🛑 收到中断信号，停止采集", self.label);
                phase = HarvestPhase::Terminated(TerminationReason::Interrupted);
            }

            debug!("[{}] 阶段: {:?}", self.label, phase);
            phase = match phase {
                HarvestPhase::ScrollingToList => self.scroll_to_list(session).await,
                HarvestPhase::Locating(i) => self.locate(session, i).await,
                HarvestPhase::Extracting(i) => self.extract(session, i).await,
                HarvestPhase::Recorded(i) => self.after_record(session, sink, i).await,
                HarvestPhase::Retry(i) => self.retry(session, i).await,
                HarvestPhase::Terminated(reason) => return self.finish(reason),
            };
        }
    }

    async fn scroll_to_list(&mut self, session: &dyn AutomationSession) -> HarvestPhase {
        let root = self.locators.root();
        match session.wait_visible(&root, self.options.locate_timeout).await {
            Ok(true) => {}
            Ok(false) => {
                return self.fatal(BrowserError::not_found(&root));
            }
            Err(e) => return self.fatal(e),
        }
        if let Err(e) = session.scroll_into_view(&root).await {
            return self.fatal(e);
        }

        if self.options.sort_by == SortOrder::Newest {
            self.select_newest(session).await;
        }
        HarvestPhase::Locating(self.state.index)
    }

    /// 切换为"最新优先"，失败只记录警告
    async fn select_newest(&self, session: &dyn AutomationSession) {
        let timeout = self.options.action_timeout;
        let opened = session
            .click(&self.locators.sort_menu(), timeout)
            .await
            .unwrap_or(false);
        let selected = opened
            && session
                .click(&self.locators.newest_option(), timeout)
                .await
                .unwrap_or(false);

        if selected {
            info!("[{}] 评论排序已切换为最新优先", self.label);
            sleep(self.options.recovery_pause).await;
        } else {
            warn!("[{}] ⚠️ 无法切换评论排序，保持默认排序", self.label);
        }
    }

    async fn locate(&mut self, session: &dyn AutomationSession, index: usize) -> HarvestPhase {
        let item = self.locators.item(index);
        match session.wait_visible(&item, self.options.locate_timeout).await {
            Ok(true) => {}
            Ok(false) => return HarvestPhase::Retry(index),
            Err(e) if e.is_transient() => return HarvestPhase::Retry(index),
            Err(e) => return self.fatal(e),
        }

        match session.scroll_into_view(&item).await {
            Ok(()) => HarvestPhase::Extracting(index),
            Err(e) if e.is_transient() => HarvestPhase::Retry(index),
            Err(e) => self.fatal(e),
        }
    }

    async fn extract(&mut self, session: &dyn AutomationSession, index: usize) -> HarvestPhase {
        let timeout = self.options.read_timeout;
        let author = match session.read_text(&self.locators.author(index), timeout).await {
            Ok(author) => author,
            Err(e) => return self.read_failed(index, e),
        };
        let body = match session.read_text(&self.locators.body(index), timeout).await {
            Ok(body) => body,
            Err(e) => return self.read_failed(index, e),
        };

        let comment = Comment::new(author.trim(), body.trim());
        info!("[{}] {}. 提取到 {} 的评论", self.label, index, comment.author);
        self.comments.push(comment);
        HarvestPhase::Recorded(index)
    }

    fn read_failed(&self, index: usize, e: BrowserError) -> HarvestPhase {
        if e.is_transient() {
            debug!("[{}] 读取第 {} 条评论失败: {}", self.label, index, e);
            HarvestPhase::Retry(index)
        } else {
            self.fatal(e)
        }
    }

    async fn after_record(
        &mut self,
        session: &dyn AutomationSession,
        sink: &mut dyn CommentSink,
        index: usize,
    ) -> HarvestPhase {
        self.state.reset_failures();

        let handled = match self.comments.last_mut() {
            Some(comment) => sink.on_recorded(session, index, comment).await,
            None => Ok(Advance::Next),
        };
        let advance = match handled {
            Ok(advance) => advance,
            Err(e) if e.is_transient() => {
                warn!("[{}] 处理第 {} 条评论失败，跳过: {}", self.label, index, e);
                Advance::Next
            }
            Err(e) => return self.fatal(e),
        };

        if self.state.limit_reached(self.comments.len()) {
            info!(
                "[{}] 已达到最大评论数 ({})",
                self.label,
                self.comments.len()
            );
            return HarvestPhase::Terminated(TerminationReason::Limit);
        }

        if advance == Advance::Next {
            self.state.advance();
        }
        HarvestPhase::Locating(self.state.index)
    }

    async fn retry(&mut self, session: &dyn AutomationSession, index: usize) -> HarvestPhase {
        let exhausted = self.state.record_failure();
        warn!(
            "[{}] 未找到第 {} 条评论 ({}/{})",
            self.label, index, self.state.fail_count, self.state.max_fails
        );
        if exhausted {
            return HarvestPhase::Terminated(TerminationReason::Exhausted);
        }

        let script = format!("window.scrollBy(0, {});", self.options.recovery_scroll_px);
        if let Err(e) = session.run_script(&script).await {
            return self.fatal(e);
        }
        sleep(self.options.recovery_pause).await;
        HarvestPhase::Locating(index)
    }

    fn fatal(&self, e: BrowserError) -> HarvestPhase {
        error!("[{}] ❌ 非预期错误: {}", self.label, e);
        HarvestPhase::Terminated(TerminationReason::Fatal(e.to_string()))
    }

    fn finish(self, reason: TerminationReason) -> HarvestOutcome {
        info!(
            "[{}] 采集结束: {} (共 {} 条评论，停在第 {} 条)",
            self.label,
            reason,
            self.comments.len(),
            self.state.index
        );
        HarvestOutcome {
            reason,
            comments: self.comments,
            state: self.state,
        }
    }
}
