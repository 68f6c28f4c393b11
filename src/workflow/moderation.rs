//! 评论删除执行器 - 流程层
//!
//! 三个有序的 UI 步骤：打开选项菜单 → 删除 → 确认。
//! 步骤之间没有事务，失败后不回滚，也不再尝试后续步骤。

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::BrowserError;
use crate::infrastructure::{AutomationSession, BoundedRetry};
use crate::models::{Comment, Locator, LocatorScheme};

/// 删除结果
///
/// `Removed` 时列表少了一条，调用方不能前进；`Failed` 时调用方必须跳过该条
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationOutcome {
    Removed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    OpenOptions,
    Remove,
    Confirm,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::OpenOptions => "打开选项菜单",
            Step::Remove => "删除",
            Step::Confirm => "确认",
        };
        f.write_str(name)
    }
}

pub struct ModerationExecutor {
    locators: LocatorScheme,
    retry: BoundedRetry,
    /// 控件出现后、点击前的停顿
    click_settle: Duration,
    /// 确认后等待列表刷新的停顿
    confirm_settle: Duration,
}

impl ModerationExecutor {
    pub fn new(locators: LocatorScheme, retry: BoundedRetry) -> Self {
        Self {
            locators,
            retry,
            click_settle: Duration::from_millis(500),
            confirm_settle: Duration::from_millis(1500),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.locators.clone(),
            BoundedRetry::once(config.action_timeout()).with_poll_interval(config.poll_interval()),
        )
        .with_settle(config.click_settle(), config.confirm_settle())
    }

    pub fn with_settle(mut self, click_settle: Duration, confirm_settle: Duration) -> Self {
        self.click_settle = click_settle;
        self.confirm_settle = confirm_settle;
        self
    }

    /// 删除第 `index` 条评论（即 `comment`）
    ///
    /// 控件等不到属于预期内的失败（返回 `Failed`）；其他浏览器错误原样返回。
    /// 三步都成功后，如果该位置仍是同一条评论，也按 `Failed` 处理
    pub async fn remove(
        &self,
        session: &dyn AutomationSession,
        index: usize,
        comment: &Comment,
    ) -> Result<ModerationOutcome, BrowserError> {
        let steps = [
            (Step::OpenOptions, self.locators.options(index)),
            (Step::Remove, self.locators.remove()),
            (Step::Confirm, self.locators.confirm()),
        ];

        for (step, locator) in &steps {
            match self.perform(session, locator).await {
                Ok(true) => debug!("第 {} 条评论: {} ✓", index, step),
                Ok(false) => {
                    let e = BrowserError::ActionFailed {
                        step: step.to_string(),
                        locator: locator.to_string(),
                    };
                    warn!("⚠️ 第 {} 条评论删除失败: {}", index, e);
                    return Ok(ModerationOutcome::Failed);
                }
                Err(e) if e.is_transient() => {
                    warn!("⚠️ 第 {} 条评论删除失败（{}）: {}", index, step, e);
                    return Ok(ModerationOutcome::Failed);
                }
                Err(e) => return Err(e),
            }
        }

        sleep(self.confirm_settle).await;
        if self.still_in_place(session, index, comment).await? {
            warn!("⚠️ 第 {} 条评论确认删除后仍在原位，跳过", index);
            return Ok(ModerationOutcome::Failed);
        }
        info!("🗑️ 已删除第 {} 条评论", index);
        Ok(ModerationOutcome::Removed)
    }

    /// 删除后该位置是否还是同一条评论（作者和正文都相同）
    async fn still_in_place(
        &self,
        session: &dyn AutomationSession,
        index: usize,
        comment: &Comment,
    ) -> Result<bool, BrowserError> {
        let Some(author) = read_now(session, &self.locators.author(index)).await? else {
            return Ok(false);
        };
        if author != comment.author {
            return Ok(false);
        }
        let body = read_now(session, &self.locators.body(index)).await?;
        Ok(body.as_deref() == Some(comment.raw_text.as_str()))
    }

    async fn perform(
        &self,
        session: &dyn AutomationSession,
        locator: &Locator,
    ) -> Result<bool, BrowserError> {
        let settle = self.click_settle;
        self.retry
            .attempt(move |timeout| async move {
                match session.wait_visible(locator, timeout).await {
                    Ok(true) => {}
                    other => return other,
                }
                sleep(settle).await;
                session.click(locator, timeout).await
            })
            .await
    }
}

/// 立即读取一次文本，找不到时为 `None`
async fn read_now(
    session: &dyn AutomationSession,
    locator: &Locator,
) -> Result<Option<String>, BrowserError> {
    match session.read_text(locator, Duration::ZERO).await {
        Ok(text) => Ok(Some(text.trim().to_string())),
        Err(e) if e.is_transient() => Ok(None),
        Err(e) => Err(e),
    }
}
