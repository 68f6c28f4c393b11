use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

use crate::config::{Config, Mode};
use crate::models::Target;

/// 初始化日志文件（写入带时间的表头，覆盖旧日志）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n评论处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    let mode = match config.mode {
        Mode::Harvest => "采集模式（只输出数据集）",
        Mode::Moderate => "删除模式（删除垃圾评论）",
    };
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!("📁 输出目录: {}", config.output_dir);
    if let Some(max) = config.max_comments {
        info!("📊 每个视频最多处理 {} 条评论", max);
    }
    info!("{}", "=".repeat(60));
}

/// 记录单个目标开始
pub fn log_target_start(target: &Target, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("[目标 {}] 开始处理 ({}/{})", target.ordinal, target.ordinal, total);
    info!("[目标 {}] 链接: {}", target.ordinal, target.url);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(
    success: usize,
    failed: usize,
    total: usize,
    removed: usize,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    if removed > 0 {
        info!("🗑️ 删除评论: {}", removed);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("slot gacor", 4), "slot...");
        assert_eq!(truncate_text("评论内容", 2), "评论...");
        assert_eq!(truncate_text("ok", 10), "ok");
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        init_log_file(path.to_str().unwrap()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("评论处理日志"));
    }
}
