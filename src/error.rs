use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 分类模型错误
    #[error("模型错误: {0}")]
    Artifact(#[from] ArtifactError),
    /// 输出文件错误
    #[error("输出错误: {0}")]
    Output(#[from] OutputError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 元素在探测时不存在（可重试）
    #[error("未找到元素: {locator}")]
    NotFound { locator: String },
    /// 控件始终不可操作
    #[error("操作失败 ({step}): {locator}")]
    ActionFailed { step: String, locator: String },
    /// 连接浏览器失败
    #[error("无法连接到浏览器 ({endpoint}): {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    Navigation {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    Script {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 添加 Cookie 失败
    #[error("添加 Cookie 失败 ({name}): {reason}")]
    Cookie { name: String, reason: String },
}

impl BrowserError {
    /// 是否属于"暂时找不到"类错误
    ///
    /// 虚拟列表中"尚未渲染"和"已经到底"无法区分，这类错误由采集会话的重试预算吸收
    pub fn is_transient(&self) -> bool {
        matches!(self, BrowserError::NotFound { .. })
    }

    pub fn not_found(locator: impl ToString) -> Self {
        BrowserError::NotFound {
            locator: locator.to_string(),
        }
    }

    pub fn script(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        BrowserError::Script {
            source: Box::new(source),
        }
    }
}

/// 分类模型文件错误
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// 模型文件不存在
    #[error("模型文件不存在: {path}")]
    NotFound { path: String },
    /// 读取失败
    #[error("读取模型文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 解码失败
    #[error("模型文件解码失败 ({path}): {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 缺少必需字段
    #[error("模型文件缺少字段 `{field}`: {path}")]
    MissingField { path: String, field: &'static str },
    /// 不支持的模型类型
    #[error("不支持的模型类型: {kind}")]
    UnsupportedModel { kind: String },
    /// 模型参数不合法
    #[error("模型参数不合法: {0}")]
    InvalidModel(String),
    /// 预测失败
    #[error("预测失败: {0}")]
    Prediction(String),
}

/// 输出文件错误
#[derive(Debug, Error)]
pub enum OutputError {
    /// 创建目录失败
    #[error("创建目录失败 ({path}): {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入失败
    #[error("写入文件失败 ({path}): {source}")]
    Write {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 没有任何目标 URL
    #[error("没有找到目标 URL")]
    NoTargets,
    /// 审核模式缺少登录 Cookie
    #[error("用户未登录: Cookie 文件不存在 ({path})")]
    NotLoggedIn { path: String },
    /// 审核模式缺少模型路径
    #[error("审核模式需要配置模型路径")]
    ModelRequired,
}

/// 文本规范化内部错误
///
/// 只在规范化流水线内部流转，每个阶段捕获后降级，不向外传播
#[derive(Debug, Error)]
#[error("规范化阶段 `{stage}` 失败: {reason}")]
pub struct NormalizationFailure {
    pub stage: &'static str,
    pub reason: String,
}

impl NormalizationFailure {
    pub fn new(stage: &'static str, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::script(err)
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.into())
    }
}

impl From<serde_json::Error> for BrowserError {
    fn from(err: serde_json::Error) -> Self {
        BrowserError::script(err)
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
