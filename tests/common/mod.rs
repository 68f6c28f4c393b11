//! 测试用的内存页面：一个可以删除条目、可以按滚动逐步渲染的评论列表

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anti_judol::error::BrowserError;
use anti_judol::infrastructure::{AutomationSession, Cookie};
use anti_judol::models::{Locator, LocatorScheme};
use anti_judol::Config;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub fn scheme() -> LocatorScheme {
    LocatorScheme {
        root: "list".into(),
        item_template: "list/item[{index}]".into(),
        author: "author".into(),
        body: "body".into(),
        options: "options".into(),
        remove: "menu/remove".into(),
        confirm: "dialog/confirm".into(),
        sort_menu: "sort".into(),
        newest_option: "sort/newest".into(),
    }
}

pub fn config() -> Config {
    Config {
        locators: scheme(),
        max_fails: 3,
        ..Config::default()
    }
}

#[derive(Default)]
struct PageState {
    comments: Vec<(String, String)>,
    /// 已渲染的条目数量
    rendered: usize,
    reveal_per_scroll: usize,
    broken: HashSet<String>,
    fatal_on: Option<String>,
    flaky_reads: HashMap<String, usize>,
    confirm_ignored: bool,
    menu_for: Option<usize>,
    confirm_for: Option<usize>,
    body_reads: usize,
    cancel_after_reads: Option<(usize, CancellationToken)>,
    navigate_fails: bool,
    calls: Vec<String>,
}

pub struct FakePage {
    state: Mutex<PageState>,
}

impl FakePage {
    pub fn new(comments: &[(&str, &str)]) -> Self {
        let comments: Vec<(String, String)> = comments
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        Self {
            state: Mutex::new(PageState {
                rendered: comments.len(),
                comments,
                ..Default::default()
            }),
        }
    }

    /// 只渲染前 `initial` 条，每次滚动再多渲染 `per_scroll` 条
    pub fn lazy(self, initial: usize, per_scroll: usize) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.rendered = initial;
            state.reveal_per_scroll = per_scroll;
        }
        self
    }

    /// 让某个控件永远不可用（`options` / `remove` / `confirm`）
    pub fn break_control(self, name: &str) -> Self {
        self.state.lock().unwrap().broken.insert(name.to_string());
        self
    }

    /// 探测该定位时返回非预期错误
    pub fn fatal_on(self, locator: &str) -> Self {
        self.state.lock().unwrap().fatal_on = Some(locator.to_string());
        self
    }

    /// 该定位可见，但前 `times` 次读取失败
    pub fn flaky_read(self, locator: &str, times: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .flaky_reads
            .insert(locator.to_string(), times);
        self
    }

    /// 确认按钮点击成功，但评论并没有被删掉
    pub fn ignore_confirm(self) -> Self {
        self.state.lock().unwrap().confirm_ignored = true;
        self
    }

    /// 第 n 次读取正文后触发取消
    pub fn cancel_after_reads(self, n: usize, token: CancellationToken) -> Self {
        self.state.lock().unwrap().cancel_after_reads = Some((n, token));
        self
    }

    pub fn failing_navigation(self) -> Self {
        self.state.lock().unwrap().navigate_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn remaining_bodies(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .comments
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }
}

fn parse_item(locator: &str) -> Option<(usize, &str)> {
    let rest = locator.strip_prefix("list/item[")?;
    let (index, suffix) = rest.split_once(']')?;
    Some((index.parse().ok()?, suffix.trim_start_matches('/')))
}

impl PageState {
    fn visible(&self, locator: &str) -> Result<bool, BrowserError> {
        if self.fatal_on.as_deref() == Some(locator) {
            return Err(BrowserError::Script {
                source: "页面崩溃".into(),
            });
        }
        Ok(match locator {
            "list" | "sort" | "sort/newest" => true,
            "menu/remove" => self.menu_for.is_some() && !self.broken.contains("remove"),
            "dialog/confirm" => self.confirm_for.is_some() && !self.broken.contains("confirm"),
            other => match parse_item(other) {
                Some((index, suffix)) => {
                    let exists = index >= 1 && index <= self.comments.len().min(self.rendered);
                    exists && !(suffix == "options" && self.broken.contains("options"))
                }
                None => false,
            },
        })
    }
}

#[async_trait]
impl AutomationSession for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("navigate:{}", url));
        if state.navigate_fails {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                source: "net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("scroll:{}", locator));
        if state.visible(locator.as_str())? {
            Ok(())
        } else {
            Err(BrowserError::not_found(locator))
        }
    }

    async fn wait_visible(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<bool, BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("visible:{}", locator));
        state.visible(locator.as_str())
    }

    async fn read_text(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<String, BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("read:{}", locator));
        if !state.visible(locator.as_str())? {
            return Err(BrowserError::not_found(locator));
        }
        if let Some(left) = state.flaky_reads.get_mut(locator.as_str()) {
            if *left > 0 {
                *left -= 1;
                return Err(BrowserError::not_found(locator));
            }
        }
        let (index, suffix) =
            parse_item(locator.as_str()).ok_or_else(|| BrowserError::not_found(locator))?;
        let (author, body) = state.comments[index - 1].clone();
        if suffix == "body" {
            state.body_reads += 1;
            if let Some((n, token)) = &state.cancel_after_reads {
                if state.body_reads >= *n {
                    token.cancel();
                }
            }
            Ok(body)
        } else {
            Ok(author)
        }
    }

    async fn click(&self, locator: &Locator, _timeout: Duration) -> Result<bool, BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("click:{}", locator));
        if !state.visible(locator.as_str())? {
            return Ok(false);
        }
        match locator.as_str() {
            "menu/remove" => {
                let index = state.menu_for.take();
                state.confirm_for = index;
            }
            "dialog/confirm" => {
                if let Some(index) = state.confirm_for.take() {
                    if !state.confirm_ignored {
                        state.comments.remove(index - 1);
                    }
                }
            }
            other => {
                if let Some((index, "options")) = parse_item(other) {
                    state.menu_for = Some(index);
                }
            }
        }
        Ok(true)
    }

    async fn run_script(&self, code: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("script:{}", code));
        if code.contains("scrollBy") {
            state.rendered += state.reveal_per_scroll;
        }
        Ok(())
    }

    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), BrowserError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("cookie:{}", cookie.name));
        Ok(())
    }
}
