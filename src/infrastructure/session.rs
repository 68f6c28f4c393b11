//! 自动化会话能力 - 基础设施层
//!
//! 核心流程只依赖这个 trait，不认识 chromiumoxide

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::BrowserError;
use crate::models::Locator;

/// 要注入会话的 Cookie
///
/// 兼容浏览器导出的 JSON 格式，`sameSite` / `expiry` 等字段被忽略
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default, rename = "httpOnly")]
    pub http_only: Option<bool>,
}

/// 已认证的页面自动化会话
///
/// 所有等待都是有界超时的轮询。同一时刻只有一个调用方持有会话
#[async_trait]
pub trait AutomationSession: Send + Sync {
    /// 导航到指定 URL
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// 把元素滚动到可视区域，元素不存在时返回 `NotFound`
    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), BrowserError>;

    /// 在超时内等待元素可见
    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<bool, BrowserError>;

    /// 在超时内读取元素文本，超时返回 `NotFound`
    async fn read_text(&self, locator: &Locator, timeout: Duration) -> Result<String, BrowserError>;

    /// 在超时内等待元素可点击并点击，控件始终不可用时返回 `Ok(false)`
    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<bool, BrowserError>;

    /// 执行一段脚本
    async fn run_script(&self, code: &str) -> Result<(), BrowserError>;

    /// 添加一个 Cookie
    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), BrowserError>;
}
