//! 数据集写入服务 - 业务能力层
//!
//! 只负责"把一个目标的评论写成 CSV"能力，不关心流程

use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::OutputError;

/// 一行输出记录，列顺序固定为 author, text, label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRow {
    pub author: String,
    pub text: String,
    pub label: u8,
}

/// 写入结果统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub written: usize,
}

/// 数据集写入服务
pub struct DatasetWriter {
    output_dir: PathBuf,
}

impl DatasetWriter {
    /// 创建新的写入服务
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 输出文件路径
    pub fn path_for(&self, slug: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", slug))
    }

    /// 一次性写入整个数据集（所有字段加引号，UTF-8）
    pub fn write(&self, slug: &str, rows: &[DatasetRow]) -> Result<WriteReport, OutputError> {
        let path = self.path_for(slug);
        ensure_parent_dir(&path)?;

        debug!("写入数据集: {} ({} 行)", path.display(), rows.len());

        let write_err = |source| OutputError::Write {
            path: path.display().to_string(),
            source,
        };

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_path(&path)
            .map_err(write_err)?;

        // 空数据集也要有表头
        if rows.is_empty() {
            writer
                .write_record(["author", "text", "label"])
                .map_err(write_err)?;
        }
        for row in rows {
            writer.serialize(row).map_err(write_err)?;
        }
        writer
            .flush()
            .map_err(|e| write_err(csv::Error::from(e)))?;

        info!("✓ 数据已保存至 {} ({} 行)", path.display(), rows.len());
        Ok(WriteReport {
            path,
            written: rows.len(),
        })
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), OutputError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_quotes_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path().join("nested/out"));

        let rows = vec![
            DatasetRow {
                author: "@budi".into(),
                text: "slot gacor".into(),
                label: 1,
            },
            DatasetRow {
                author: "Sari, \"S\"".into(),
                text: "video bagus".into(),
                label: 0,
            },
        ];
        let report = writer.write("abc", &rows).unwrap();
        assert_eq!(report.written, 2);

        let content = std::fs::read_to_string(report.path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], r#""author","text","label""#);
        assert_eq!(lines[1], r#""@budi","slot gacor","1""#);
        assert_eq!(lines[2], r#""Sari, ""S""","video bagus","0""#);
    }

    #[test]
    fn test_empty_dataset_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let report = DatasetWriter::new(dir.path()).write("empty", &[]).unwrap();
        let content = std::fs::read_to_string(report.path).unwrap();
        assert_eq!(content.trim(), r#""author","text","label""#);
    }
}
