//! 定位方案
//!
//! 一个带序号参数的模板生成第 i 条评论的容器，作者和正文是相对容器的子路径；
//! 删除、确认等控件是模板之外的固定定位

use std::fmt;

use serde::Deserialize;

/// 元素定位表达式（XPath）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(xpath: impl Into<String>) -> Self {
        Self(xpath.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 拼接相对子路径
    fn join(&self, relative: &str) -> Locator {
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return self.clone();
        }
        Locator(format!("{}/{}", self.0, relative))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 评论区定位方案，默认值对应 YouTube 当前的评论线程布局
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LocatorScheme {
    /// 评论列表根节点
    pub root: String,
    /// 第 i 条评论容器模板，`{index}` 为占位符
    pub item_template: String,
    /// 作者（相对容器）
    pub author: String,
    /// 正文（相对容器）
    pub body: String,
    /// 每条评论的"更多操作"按钮（相对容器）
    pub options: String,
    /// 删除菜单项
    pub remove: String,
    /// 确认删除按钮
    pub confirm: String,
    /// 排序下拉菜单
    pub sort_menu: String,
    /// "最新优先"菜单项
    pub newest_option: String,
}

impl Default for LocatorScheme {
    fn default() -> Self {
        Self {
            root: r#"//*[@id="contents"]"#.to_string(),
            item_template: r#"//*[@id="contents"]/ytd-comment-thread-renderer[{index}]"#
                .to_string(),
            author: "ytd-comment-view-model/div[3]/div[2]/div/div[2]/h3/a/span".to_string(),
            body: "ytd-comment-view-model/div[3]/div[2]/ytd-expander/div/yt-attributed-string/span"
                .to_string(),
            options: "ytd-comment-view-model/div[3]/div[3]/ytd-menu-renderer/yt-icon-button/button"
                .to_string(),
            remove: r#"//*[@id="items"]/ytd-menu-navigation-item-renderer[2]"#.to_string(),
            confirm: r#"//*[@id="confirm-button"]/yt-button-shape/button"#.to_string(),
            sort_menu: r#"//*[@id="sort-menu"]/yt-sort-filter-sub-menu-renderer/yt-dropdown-menu"#
                .to_string(),
            newest_option: r#"//*[@id="menu"]/a[2]"#.to_string(),
        }
    }
}

impl LocatorScheme {
    pub fn root(&self) -> Locator {
        Locator::new(&self.root)
    }

    /// 第 `index` 条评论的容器（从 1 开始）
    pub fn item(&self, index: usize) -> Locator {
        Locator::new(self.item_template.replace("{index}", &index.to_string()))
    }

    pub fn author(&self, index: usize) -> Locator {
        self.item(index).join(&self.author)
    }

    pub fn body(&self, index: usize) -> Locator {
        self.item(index).join(&self.body)
    }

    pub fn options(&self, index: usize) -> Locator {
        self.item(index).join(&self.options)
    }

    pub fn remove(&self) -> Locator {
        Locator::new(&self.remove)
    }

    pub fn confirm(&self) -> Locator {
        Locator::new(&self.confirm)
    }

    pub fn sort_menu(&self) -> Locator {
        Locator::new(&self.sort_menu)
    }

    pub fn newest_option(&self) -> Locator {
        Locator::new(&self.newest_option)
    }
}
