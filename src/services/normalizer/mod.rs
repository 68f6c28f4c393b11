//! 文本规范化服务 - 业务能力层
//!
//! 把原始评论文本转换为分类器可用的文本。流水线按固定顺序执行：
//!
//! 1. 剔除装饰符号
//! 2. 转写 + 小写
//! 3. 词内标点替换为空格
//! 4. 去除全部标点、合并空白
//! 5. 合并单字符碎片
//! 6. 词形还原（可选，带 LRU 缓存）
//! 7. 去除停用词
//!
//! 每个阶段单独隔离故障：内部失败只记录日志，降级为原样输出或空串，不向调用方抛出

pub mod lemmatizer;
pub mod stages;
pub mod stopwords;

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use lru::LruCache;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::NormalizationFailure;

pub use lemmatizer::{IdentityLemmatizer, IndonesianLemmatizer, Lemmatizer};
pub use stopwords::StopwordSet;

/// 默认词形缓存容量
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    SymbolStrip,
    Transliterate,
    InnerPunct,
    PunctStrip,
    FragmentMerge,
    Lemmatize,
    Stopwords,
}

/// 阶段失败时的降级方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    PassThrough,
    Empty,
}

impl Stage {
    const ALL: [Stage; 7] = [
        Stage::SymbolStrip,
        Stage::Transliterate,
        Stage::InnerPunct,
        Stage::PunctStrip,
        Stage::FragmentMerge,
        Stage::Lemmatize,
        Stage::Stopwords,
    ];

    fn fallback(self) -> Fallback {
        match self {
            // 标点没去干净的文本不能交给下游
            Stage::PunctStrip => Fallback::Empty,
            _ => Fallback::PassThrough,
        }
    }
}

/// 文本规范化器
///
/// 词形缓存归实例所有，随实例销毁
pub struct TextNormalizer {
    stopwords: StopwordSet,
    lemmatizer: Box<dyn Lemmatizer>,
    cache: Mutex<LruCache<String, String>>,
    lemmatize_by_default: bool,
}

impl TextNormalizer {
    /// 使用内置资源创建
    pub fn new() -> Self {
        Self::with_parts(
            StopwordSet::builtin(),
            Box::new(IndonesianLemmatizer::new()),
            DEFAULT_CACHE_CAPACITY,
        )
    }

    pub fn with_parts(
        stopwords: StopwordSet,
        lemmatizer: Box<dyn Lemmatizer>,
        cache_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            stopwords,
            lemmatizer,
            cache: Mutex::new(LruCache::new(capacity)),
            lemmatize_by_default: true,
        }
    }

    /// 根据配置加载停用词和词典
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut stopwords = StopwordSet::builtin();
        if let Some(path) = &config.stopwords_file {
            let added = stopwords.extend_from_file(Path::new(path))?;
            debug!("追加了 {} 个停用词", added);
        }

        let mut lemmatizer = IndonesianLemmatizer::new();
        if let Some(path) = &config.lemma_dictionary_file {
            let loaded = lemmatizer.load_dictionary(Path::new(path))?;
            debug!("加载了 {} 条词典项", loaded);
        }

        let mut normalizer =
            Self::with_parts(stopwords, Box::new(lemmatizer), config.lemma_cache_capacity);
        normalizer.lemmatize_by_default = config.lemmatize;
        Ok(normalizer)
    }

    /// 按实例默认设置规范化
    pub fn normalize(&self, text: &str) -> String {
        self.normalize_with(text, self.lemmatize_by_default)
    }

    /// 规范化单条文本，任何阶段产出空串时立即返回空串
    pub fn normalize_with(&self, text: &str, lemmatize: bool) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let mut current = text.to_string();
        for stage in Stage::ALL {
            if stage == Stage::Lemmatize && !lemmatize {
                continue;
            }
            current = self.run_stage(stage, &current);
            if current.is_empty() {
                return String::new();
            }
        }
        current.trim().to_string()
    }

    /// 批量规范化，输出顺序与输入一致
    pub fn normalize_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts.iter().map(|t| self.normalize(t.as_ref())).collect()
    }

    /// 当前缓存的词数
    pub fn cached_lemmas(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn run_stage(&self, stage: Stage, input: &str) -> String {
        let result = match stage {
            Stage::SymbolStrip => Ok(stages::strip_symbols(input)),
            Stage::Transliterate => Ok(stages::transliterate(input)),
            Stage::InnerPunct => Ok(stages::smooth_inner_punct(input)),
            Stage::PunctStrip => stages::strip_punct(input),
            Stage::FragmentMerge => Ok(stages::merge_fragments(input)),
            Stage::Lemmatize => self.lemmatize_tokens(input),
            Stage::Stopwords => Ok(stages::remove_stopwords(input, &self.stopwords)),
        };

        match result {
            Ok(output) => output,
            Err(e) => {
                warn!("{}", e);
                match stage.fallback() {
                    Fallback::PassThrough => input.to_string(),
                    Fallback::Empty => String::new(),
                }
            }
        }
    }

    /// 阶段 6：逐词还原，按词缓存结果
    fn lemmatize_tokens(&self, text: &str) -> Result<String, NormalizationFailure> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| NormalizationFailure::new("lemmatize", "词形缓存锁已损坏"))?;

        let mut lemmas = Vec::new();
        for token in text.split_whitespace() {
            if let Some(lemma) = cache.get(token) {
                lemmas.push(lemma.clone());
                continue;
            }
            let lemma = self.lemmatizer.lemmatize(token)?;
            cache.put(token.to_string(), lemma.clone());
            lemmas.push(lemma);
        }
        Ok(lemmas.join(" "))
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
