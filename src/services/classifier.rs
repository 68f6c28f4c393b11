//! 分类服务 - 业务能力层
//!
//! 加载预训练的分类模型文件，并保证分类时的文本一定经过规范化

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::ArtifactError;
use crate::models::Label;
use crate::services::normalizer::TextNormalizer;

/// 批量预测能力
///
/// 输出长度和顺序必须与输入一致，标签取值 0 或 1
pub trait Classifier: Send + Sync {
    fn predict(&self, texts: &[String]) -> Result<Vec<u8>, ArtifactError>;
}

/// 多项式朴素贝叶斯，按空白切词，未登录词忽略
#[derive(Debug, Clone, Deserialize)]
pub struct NaiveBayesModel {
    class_log_prior: [f64; 2],
    feature_log_prob: HashMap<String, [f64; 2]>,
}

impl Classifier for NaiveBayesModel {
    fn predict(&self, texts: &[String]) -> Result<Vec<u8>, ArtifactError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut scores = self.class_log_prior;
                for token in text.split_whitespace() {
                    if let Some(log_prob) = self.feature_log_prob.get(token) {
                        scores[0] += log_prob[0];
                        scores[1] += log_prob[1];
                    }
                }
                // 平分时判为正常评论
                u8::from(scores[1] > scores[0])
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct KeywordParams {
    patterns: Vec<String>,
    #[serde(default = "default_threshold")]
    threshold: usize,
}

fn default_threshold() -> usize {
    1
}

/// 关键词规则模型：命中至少 `threshold` 个模式即判为垃圾评论
#[derive(Debug, Clone)]
pub struct KeywordModel {
    patterns: Vec<Regex>,
    threshold: usize,
}

impl KeywordModel {
    fn from_params(params: KeywordParams) -> Result<Self, ArtifactError> {
        let patterns = params
            .patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| ArtifactError::InvalidModel(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        if patterns.is_empty() {
            return Err(ArtifactError::InvalidModel("keywords 模型没有任何模式".into()));
        }
        Ok(Self {
            patterns,
            threshold: params.threshold.max(1),
        })
    }
}

impl Classifier for KeywordModel {
    fn predict(&self, texts: &[String]) -> Result<Vec<u8>, ArtifactError> {
        Ok(texts
            .iter()
            .map(|text| {
                let hits = self.patterns.iter().filter(|re| re.is_match(text)).count();
                u8::from(hits >= self.threshold)
            })
            .collect())
    }
}

/// 已加载的模型文件，加载后不可变
pub struct ClassifierArtifact {
    pub version: String,
    model: Box<dyn Classifier>,
}

impl std::fmt::Debug for ClassifierArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierArtifact")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl ClassifierArtifact {
    pub fn new(version: impl Into<String>, model: Box<dyn Classifier>) -> Self {
        Self {
            version: version.into(),
            model,
        }
    }

    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ArtifactError::NotFound { path: display });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&content, &display)
    }

    /// 从 JSON 文本解码，`origin` 只用于错误信息
    pub fn from_json(content: &str, origin: &str) -> Result<Self, ArtifactError> {
        let document: JsonValue =
            serde_json::from_str(content).map_err(|source| ArtifactError::Decode {
                path: origin.to_string(),
                source,
            })?;

        let missing = |field| ArtifactError::MissingField {
            path: origin.to_string(),
            field,
        };

        let version = document
            .get("version")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| missing("version"))?
            .to_string();
        let model = document.get("model").ok_or_else(|| missing("model"))?;
        let kind = model
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| missing("model.type"))?;

        let decode = |source| ArtifactError::Decode {
            path: origin.to_string(),
            source,
        };
        let model: Box<dyn Classifier> = match kind {
            "naive_bayes" => Box::new(
                serde_json::from_value::<NaiveBayesModel>(model.clone()).map_err(decode)?,
            ),
            "keywords" => Box::new(KeywordModel::from_params(
                serde_json::from_value::<KeywordParams>(model.clone()).map_err(decode)?,
            )?),
            other => {
                return Err(ArtifactError::UnsupportedModel {
                    kind: other.to_string(),
                })
            }
        };

        debug!("模型类型: {}", kind);
        Ok(Self { version, model })
    }
}

/// 垃圾评论分类器
///
/// 职责：
/// - 分类前统一规范化文本（调用方无需关心）
/// - 保证输出与输入一一对应、顺序一致
pub struct SpamClassifier {
    artifact: ClassifierArtifact,
    normalizer: Arc<TextNormalizer>,
}

impl std::fmt::Debug for SpamClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpamClassifier")
            .field("artifact", &self.artifact)
            .finish_non_exhaustive()
    }
}

impl SpamClassifier {
    pub fn new(artifact: ClassifierArtifact, normalizer: Arc<TextNormalizer>) -> Self {
        Self {
            artifact,
            normalizer,
        }
    }

    /// 加载模型文件并创建分类器
    pub fn load(path: &Path, normalizer: Arc<TextNormalizer>) -> Result<Self, ArtifactError> {
        let artifact = ClassifierArtifact::load(path)?;
        info!("✓ 模型已加载: {} (版本 {})", path.display(), artifact.version);
        Ok(Self::new(artifact, normalizer))
    }

    pub fn version(&self) -> &str {
        &self.artifact.version
    }

    /// 预测数值标签（0 正常 / 1 垃圾）
    pub fn predict_ints<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<u8>, ArtifactError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let normalized = self.normalizer.normalize_batch(texts);
        let predictions = self.artifact.model.predict(&normalized)?;
        if predictions.len() != texts.len() {
            return Err(ArtifactError::Prediction(format!(
                "模型返回 {} 个结果，期望 {} 个",
                predictions.len(),
                texts.len()
            )));
        }
        Ok(predictions)
    }

    /// 预测标签
    pub fn predict_labels<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Label>, ArtifactError> {
        Ok(self
            .predict_ints(texts)?
            .into_iter()
            .map(Label::from_code)
            .collect())
    }
}
