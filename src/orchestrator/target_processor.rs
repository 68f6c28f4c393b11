//! 单个目标处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理一个视频页面，是目标级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **导航**：打开目标页面
//! 2. **采集**：运行一次全新的 `HarvestSession`（重试预算不跨目标）
//! 3. **审核**：删除模式下逐条规范化、分类，命中即交给 `ModerationExecutor`
//! 4. **落盘**：会话结束后（包括异常结束）一次性写出数据集
//! 5. **统计输出**：记录采集/写入/丢弃/删除数量

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{Config, Mode};
use crate::error::{AppResult, BrowserError};
use crate::infrastructure::AutomationSession;
use crate::models::{Comment, Target};
use crate::services::{DatasetRow, DatasetWriter, SpamClassifier, TextNormalizer};
use crate::utils::logging::truncate_text;
use crate::workflow::{
    Advance, CollectOnly, CommentSink, HarvestOptions, HarvestSession, ModerationExecutor,
    ModerationOutcome, TerminationReason,
};

/// 单个目标的处理统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStats {
    pub reason: TerminationReason,
    /// 采集到的评论数
    pub recorded: usize,
    /// 写入数据集的行数
    pub written: usize,
    /// 规范化后为空而丢弃的行数
    pub dropped: usize,
    pub removed: usize,
    pub moderation_failed: usize,
}

/// 处理一个目标所需的共享资源（由 App 持有）
pub struct TargetContext<'a> {
    pub config: &'a Config,
    pub normalizer: &'a Arc<TextNormalizer>,
    pub classifier: Option<&'a SpamClassifier>,
    pub writer: &'a DatasetWriter,
    pub cancel: &'a CancellationToken,
}

/// 删除模式下的逐条处理：规范化 → 分类 → 命中则删除
struct ModerationSink<'a> {
    ordinal: usize,
    normalizer: &'a TextNormalizer,
    classifier: &'a SpamClassifier,
    executor: ModerationExecutor,
    removed: usize,
    failed: usize,
}

#[async_trait]
impl<'a> CommentSink for ModerationSink<'a> {
    async fn on_recorded(
        &mut self,
        session: &dyn AutomationSession,
        index: usize,
        comment: &mut Comment,
    ) -> Result<Advance, BrowserError> {
        let normalized = self.normalizer.normalize(&comment.raw_text);
        let empty = normalized.is_empty();
        comment.normalized_text = Some(normalized);
        if empty {
            comment.label = Some(0);
            return Ok(Advance::Next);
        }

        let label = match self.classifier.predict_ints(&[comment.raw_text.as_str()]) {
            Ok(labels) => labels.first().copied().unwrap_or(0),
            Err(e) => {
                warn!("[目标 {}] ⚠️ 第 {} 条评论分类失败: {}", self.ordinal, index, e);
                return Ok(Advance::Next);
            }
        };
        comment.label = Some(label);
        if label != 1 {
            return Ok(Advance::Next);
        }

        info!(
            "[目标 {}] 🚨 第 {} 条评论判定为垃圾: {}",
            self.ordinal,
            index,
            truncate_text(&comment.raw_text, 40)
        );
        match self.executor.remove(session, index, comment).await? {
            ModerationOutcome::Removed => {
                self.removed += 1;
                Ok(Advance::Stay)
            }
            ModerationOutcome::Failed => {
                self.failed += 1;
                Ok(Advance::Next)
            }
        }
    }
}

/// 处理单个目标
///
/// 采集会话的任何终止原因都会走到落盘这一步；只有写文件失败才返回错误
pub async fn process_target(
    session: &dyn AutomationSession,
    target: &Target,
    ctx: &TargetContext<'_>,
) -> AppResult<TargetStats> {
    let label = format!("目标 {}", target.ordinal);
    let harvest = HarvestSession::new(
        ctx.config.locators.clone(),
        HarvestOptions::from_config(ctx.config),
        ctx.cancel.clone(),
    )
    .with_label(label.clone());

    let mut removed = 0;
    let mut moderation_failed = 0;

    let outcome = match session.navigate(&target.url).await {
        Err(e) => {
            error!("[{}] ❌ 打开页面失败: {}", label, e);
            None
        }
        Ok(()) => match (ctx.config.mode, ctx.classifier) {
            (Mode::Moderate, Some(classifier)) => {
                let mut sink = ModerationSink {
                    ordinal: target.ordinal,
                    normalizer: ctx.normalizer,
                    classifier,
                    executor: ModerationExecutor::from_config(ctx.config),
                    removed: 0,
                    failed: 0,
                };
                let outcome = harvest.run(session, &mut sink).await;
                removed = sink.removed;
                moderation_failed = sink.failed;
                Some(outcome)
            }
            _ => Some(harvest.run(session, &mut CollectOnly).await),
        },
    };

    let (reason, mut comments) = match outcome {
        Some(outcome) => (outcome.reason, outcome.comments),
        None => (
            TerminationReason::Fatal(format!("无法打开页面: {}", target.url)),
            Vec::new(),
        ),
    };

    let recorded = comments.len();
    let (rows, dropped) = build_rows(&mut comments, ctx.normalizer, ctx.classifier);
    if dropped > 0 {
        info!("[{}] 丢弃 {} 条规范化后为空的评论", label, dropped);
    }

    let report = ctx.writer.write(&target.slug(), &rows)?;

    let stats = TargetStats {
        reason,
        recorded,
        written: report.written,
        dropped,
        removed,
        moderation_failed,
    };
    log_target_complete(&label, &stats);
    Ok(stats)
}

/// 把评论整理成数据集行
///
/// 补齐缺失的规范化文本和标签（没有模型或预测失败时标签为 0），
/// 丢弃规范化后为空的行。返回 (行, 丢弃数量)
pub fn build_rows(
    comments: &mut [Comment],
    normalizer: &TextNormalizer,
    classifier: Option<&SpamClassifier>,
) -> (Vec<DatasetRow>, usize) {
    for comment in comments.iter_mut() {
        if comment.normalized_text.is_none() {
            comment.normalized_text = Some(normalizer.normalize(&comment.raw_text));
        }
    }

    let pending: Vec<usize> = comments
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.label.is_none() && c.normalized_text.as_deref().is_some_and(|t| !t.is_empty())
        })
        .map(|(i, _)| i)
        .collect();

    if let Some(classifier) = classifier.filter(|_| !pending.is_empty()) {
        let texts: Vec<&str> = pending
            .iter()
            .map(|&i| comments[i].raw_text.as_str())
            .collect();
        match classifier.predict_ints(&texts) {
            Ok(labels) => {
                for (&i, label) in pending.iter().zip(labels) {
                    comments[i].label = Some(label);
                }
            }
            Err(e) => warn!("⚠️ 批量分类失败，标签按 0 处理: {}", e),
        }
    }

    let mut dropped = 0;
    let rows = comments
        .iter()
        .filter_map(|comment| match comment.normalized_text.as_deref() {
            Some(text) if !text.is_empty() => Some(DatasetRow {
                author: comment.author.clone(),
                text: text.to_string(),
                label: comment.label.unwrap_or(0),
            }),
            _ => {
                dropped += 1;
                None
            }
        })
        .collect();
    (rows, dropped)
}

// ========== 日志辅助函数 ==========

fn log_target_complete(label: &str, stats: &TargetStats) {
    info!(
        "[{}] 评论统计: 采集 {}, 写入 {}, 丢弃 {}",
        label, stats.recorded, stats.written, stats.dropped
    );
    if stats.removed > 0 || stats.moderation_failed > 0 {
        info!(
            "[{}] 删除统计: 成功 {}, 失败 {}",
            label, stats.removed, stats.moderation_failed
        );
    }
    if stats.reason.is_abnormal() {
        error!("[{}] ❌ 处理异常结束: {}\n", label, stats.reason);
    } else {
        info!("[{}] ✅ 处理完成: {}\n", label, stats.reason);
    }
}
