//! Chrome 会话 - 基础设施层
//!
//! 持有唯一的 page 资源，把 `AutomationSession` 能力翻译成 CDP 调用和页面脚本

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::BrowserError;
use crate::infrastructure::retry::BoundedRetry;
use crate::infrastructure::session::{AutomationSession, Cookie};
use crate::models::Locator;

/// 基于 chromiumoxide 的自动化会话
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval_as() 能力
/// - 不认识 Comment / 分类器
pub struct ChromeSession {
    page: Page,
    poll_interval: Duration,
}

impl ChromeSession {
    /// 创建新的会话
    pub fn new(page: Page) -> Self {
        Self {
            page,
            poll_interval: Duration::from_millis(250),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 执行 JS 代码并反序列化为指定类型
    ///
    /// 脚本没有返回值（`null` / `undefined`）时得到 `None`；CDP 调用本身失败
    /// （连接断开、页面崩溃）原样返回错误
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<Option<T>, BrowserError> {
        let result = self.page.evaluate(js_code.into()).await?;
        match result.value() {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    fn retry(&self, timeout: Duration) -> BoundedRetry {
        BoundedRetry::once(timeout).with_poll_interval(self.poll_interval)
    }

    /// 探测元素状态：`Some(text)` 表示元素存在且可见
    async fn probe(
        &self,
        locator: &Locator,
        require_enabled: bool,
    ) -> Result<Option<String>, BrowserError> {
        let js_code = probe_script(locator, require_enabled)?;
        self.eval_as::<String>(js_code).await.inspect_err(|e| {
            debug!("探测元素失败 ({}): {}", locator, e);
        })
    }
}

/// 按 XPath 查找元素并检查可见性，可见时返回其文本内容
fn probe_script(locator: &Locator, require_enabled: bool) -> Result<String, serde_json::Error> {
    Ok(format!(
        r#"
        (() => {{
            const node = document.evaluate({}, document, null,
                XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
            if (!node) return null;
            const rect = node.getBoundingClientRect();
            const style = window.getComputedStyle(node);
            if (rect.width === 0 && rect.height === 0) return null;
            if (style.visibility === 'hidden' || style.display === 'none') return null;
            if ({} && (node.disabled || node.getAttribute('aria-disabled') === 'true')) return null;
            return (node.textContent || '').trim();
        }})()
        "#,
        serde_json::to_string(locator.as_str())?,
        require_enabled
    ))
}

#[async_trait]
impl AutomationSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        debug!("已导航到: {}", url);
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), BrowserError> {
        let element = self
            .page
            .find_xpath(locator.as_str())
            .await
            .map_err(|_| BrowserError::not_found(locator))?;
        element.scroll_into_view().await?;
        Ok(())
    }

    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<bool, BrowserError> {
        Ok(self
            .retry(timeout)
            .poll(|| self.probe(locator, false))
            .await?
            .is_some())
    }

    async fn read_text(&self, locator: &Locator, timeout: Duration) -> Result<String, BrowserError> {
        self.retry(timeout)
            .poll(|| self.probe(locator, false))
            .await?
            .ok_or_else(|| BrowserError::not_found(locator))
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<bool, BrowserError> {
        if self
            .retry(timeout)
            .poll(|| self.probe(locator, true))
            .await?
            .is_none()
        {
            return Ok(false);
        }

        let element = match self.page.find_xpath(locator.as_str()).await {
            Ok(element) => element,
            Err(e) => {
                warn!("控件可见但无法定位 ({}): {}", locator, e);
                return Ok(false);
            }
        };

        if let Err(e) = element.click().await {
            warn!("点击失败 ({}): {}", locator, e);
            return Ok(false);
        }
        Ok(true)
    }

    async fn run_script(&self, code: &str) -> Result<(), BrowserError> {
        self.page.evaluate(code.to_string()).await?;
        Ok(())
    }

    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), BrowserError> {
        let mut builder = CookieParam::builder()
            .name(cookie.name.clone())
            .value(cookie.value.clone());
        if let Some(domain) = &cookie.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(path) = &cookie.path {
            builder = builder.path(path.clone());
        }
        if let Some(secure) = cookie.secure {
            builder = builder.secure(secure);
        }
        if let Some(http_only) = cookie.http_only {
            builder = builder.http_only(http_only);
        }

        let param = builder.build().map_err(|reason| BrowserError::Cookie {
            name: cookie.name.clone(),
            reason,
        })?;

        self.page.set_cookie(param).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_script_escapes_locator() {
        let locator = Locator::new(r#"//*[@id="contents"]"#);
        let script = probe_script(&locator, true).unwrap();
        assert!(script.contains(r#""//*[@id=\"contents\"]""#));
        assert!(script.contains("if (true &&"));
    }
}
