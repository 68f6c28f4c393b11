//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量目标处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载目标列表、模型、Cookie
//! - 管理浏览器资源（Browser、ChromeSession）
//! - 输出全局统计信息
//!
//! ### `target_processor` - 单个目标处理器
//! - 打开页面，运行一次采集会话
//! - 删除模式下逐条分类并删除
//! - 会话结束后一次性写出数据集
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Target>)
//!     ↓
//! target_processor (处理单个 Target)
//!     ↓
//! workflow::HarvestSession / ModerationExecutor
//!     ↓
//! services (能力层：normalizer / classifier / dataset_writer)
//!     ↓
//! infrastructure (基础设施：AutomationSession / BoundedRetry)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，target_processor 管单个
//! 2. **资源隔离**：只有编排层持有 Browser
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **严格串行**：目标之间不共享重试状态

pub mod batch_processor;
pub mod target_processor;

// 重新导出主要类型
pub use batch_processor::{run_targets, App, RunSummary};
pub use target_processor::{build_rows, process_target, TargetContext, TargetStats};
