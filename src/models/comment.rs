use std::fmt;

/// 一条采集到的评论
///
/// 由采集会话创建；`normalized_text` / `label` 在下游补齐，落盘后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    pub raw_text: String,
    pub normalized_text: Option<String>,
    pub label: Option<u8>,
}

impl Comment {
    pub fn new(author: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            raw_text: raw_text.into(),
            normalized_text: None,
            label: None,
        }
    }
}

/// 分类标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// 正常评论
    NotSpam,
    /// 判定为赌博推广（judol）
    Spam,
}

impl Label {
    /// 获取数值标签
    pub fn code(self) -> u8 {
        match self {
            Label::NotSpam => 0,
            Label::Spam => 1,
        }
    }

    /// 从数值标签解析，非 0 即视为垃圾评论
    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            Label::NotSpam
        } else {
            Label::Spam
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::NotSpam => "not-spam",
            Label::Spam => "spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 采集状态
///
/// 由单个采集会话独占。`index` 只在成功记录后递增，重试期间保持不变；
/// `fail_count` 在任何一次成功提取或删除后清零
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestState {
    /// 当前评论序号（从 1 开始）
    pub index: usize,
    pub fail_count: u32,
    pub max_fails: u32,
    pub max_comments: Option<usize>,
}

impl HarvestState {
    pub fn new(max_fails: u32, max_comments: Option<usize>) -> Self {
        Self {
            index: 1,
            fail_count: 0,
            max_fails: max_fails.max(1),
            max_comments,
        }
    }

    /// 记录一次暂时性失败，返回预算是否已耗尽
    pub fn record_failure(&mut self) -> bool {
        self.fail_count = (self.fail_count + 1).min(self.max_fails);
        self.fail_count >= self.max_fails
    }

    pub fn reset_failures(&mut self) {
        self.fail_count = 0;
    }

    pub fn advance(&mut self) {
        self.index += 1;
    }

    /// 已记录数量是否达到上限
    pub fn limit_reached(&self, recorded: usize) -> bool {
        self.max_comments.is_some_and(|max| recorded >= max)
    }
}
