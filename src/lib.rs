//! # Anti Judol
//!
//! 采集视频评论、规范化文本、识别赌博推广（judol）垃圾评论，并可选地自动删除
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `AutomationSession` - 核心流程唯一依赖的页面能力
//! - `ChromeSession` - 唯一的 page owner
//! - `BoundedRetry` - 有界重试原语
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `TextNormalizer` - 七阶段文本规范化
//! - `SpamClassifier` - 加载模型并分类
//! - `DatasetWriter` - 写 CSV 数据集
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个页面"的处理流程
//! - `HarvestSession` - 评论枚举状态机
//! - `ModerationExecutor` - 三步删除
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量目标处理器，管理资源
//! - `orchestrator/target_processor` - 单个目标处理器，采集并落盘
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Mode};
pub use error::{AppError, AppResult};
pub use infrastructure::{AutomationSession, BoundedRetry, ChromeSession};
pub use models::{Comment, Target};
pub use orchestrator::{process_target, App, RunSummary};
pub use services::{SpamClassifier, TextNormalizer};
pub use workflow::{HarvestSession, ModerationExecutor, ModerationOutcome, TerminationReason};
