//! 浏览器资源的获取：连接已运行的浏览器，或自行启动

mod connection;
mod headless;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_browser;

use anyhow::Result;
use chromiumoxide::{Browser, Page};

use crate::config::Config;

/// 按配置打开浏览器：设置了调试端口就连接，否则启动
pub async fn open(config: &Config) -> Result<(Browser, Page)> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser_and_page(port).await,
        None => launch_browser(config).await,
    }
}
