use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use url::Url;

/// 待处理的视频页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// 序号（从 1 开始，用于日志和文件名）
    pub ordinal: usize,
    pub url: String,
}

impl Target {
    pub fn new(ordinal: usize, url: impl Into<String>) -> Self {
        Self {
            ordinal,
            url: url.into(),
        }
    }

    /// 输出文件名：`<序号>-<视频 ID>`，取不到 ID 时为 `target-<序号>`
    ///
    /// 带序号是为了同一视频出现多次（重复链接、短链接）时不会互相覆盖
    pub fn slug(&self) -> String {
        match video_id(&self.url) {
            Some(id) => format!("{}-{}", self.ordinal, id),
            None => format!("target-{}", self.ordinal),
        }
    }
}

/// 从视频链接中提取 ID（`watch?v=` 或 `youtu.be/<id>`）
fn video_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;

    let id = match url.host_str() {
        Some("youtu.be") => url.path_segments()?.next().map(str::to_string),
        _ => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
    }?;

    let id: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!id.is_empty()).then_some(id)
}

/// 从文本文件加载 URL 列表（每行一个，忽略空行）
pub async fn load_url_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取URL文件: {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        anyhow::bail!("URL文件中没有找到任何链接: {}", path.display());
    }

    tracing::info!("从 {} 加载了 {} 个链接", path.display(), urls.len());
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_slug_from_watch_url() {
        let target = Target::new(1, "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42");
        assert_eq!(target.slug(), "1-dQw4w9WgXcQ");
    }

    #[test]
    fn test_slug_from_short_url() {
        let target = Target::new(2, "https://youtu.be/abc_DEF-1");
        assert_eq!(target.slug(), "2-abc_DEF-1");
    }

    #[test]
    fn test_same_video_gets_distinct_slugs() {
        let long = Target::new(1, "https://www.youtube.com/watch?v=abc123");
        let short = Target::new(2, "https://youtu.be/abc123");
        assert_ne!(long.slug(), short.slug());
    }

    #[test]
    fn test_slug_falls_back_to_ordinal() {
        assert_eq!(Target::new(3, "not a url").slug(), "target-3");
        assert_eq!(Target::new(4, "https://example.com/x").slug(), "target-4");
    }

    #[tokio::test]
    async fn test_load_url_file_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://youtu.be/a\n\n   \nhttps://youtu.be/b  ").unwrap();

        let urls = load_url_file(file.path()).await.unwrap();
        assert_eq!(urls, vec!["https://youtu.be/a", "https://youtu.be/b"]);
    }

    #[tokio::test]
    async fn test_load_url_file_rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        tokio_test::assert_err!(load_url_file(file.path()).await);
    }
}
