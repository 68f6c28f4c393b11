//! 词形还原
//!
//! 默认实现是基于规则的印尼语词缀剥离：候选词必须命中词根表才会被采用，
//! 否则保持原样

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use phf::phf_set;

use crate::error::NormalizationFailure;
use crate::services::normalizer::stages::strip_punct;

/// 词形还原能力
pub trait Lemmatizer: Send + Sync {
    /// 还原单个词，失败时由流水线降级为原词
    fn lemmatize(&self, token: &str) -> Result<String, NormalizationFailure>;
}

/// 不做任何处理
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemmatize(&self, token: &str) -> Result<String, NormalizationFailure> {
        Ok(token.to_string())
    }
}

static ROOT_WORDS: phf::Set<&'static str> = phf_set! {
    "ajak", "ajar", "akses", "aman", "ambil", "angka", "bagus", "bahaya", "baca", "bangun",
    "bantu", "bayar", "beli", "benar", "berani", "berita", "besar", "bonus", "buka", "buat",
    "cair", "cari", "cepat", "cinta", "coba", "daftar", "datang", "dengar", "depo", "diri",
    "dukung", "ganti", "gabung", "gacor", "habis", "hadiah", "hasil", "hidup", "hilang",
    "hitung", "hoki", "ikut", "ingat", "jackpot", "jalan", "jamin", "jawab", "jual", "kabar",
    "kali", "kasih", "kaya", "kecil", "kenal", "keren", "kerja", "kirim", "klaim", "klik",
    "kuat", "kurang", "lagu", "lapor", "lari", "lihat", "link", "lupa", "main", "makan",
    "malu", "maxwin", "menang", "minum", "modal", "mudah", "mulai", "musik", "naik", "nonton",
    "pakai", "pasang", "percaya", "pesan", "pikir", "pilih", "pukul", "pulang", "putar",
    "rasa", "rugi", "sapa", "sayang", "selesai", "senang", "situs", "slot", "suka", "tahu",
    "tambah", "tanya", "tarik", "tebak", "temu", "terima", "tidur", "timbang", "tinggal",
    "tolong", "tonton", "tulis", "tunggu", "turun", "ubah", "uang", "ukur", "untung", "video",
    "wede",
};

const PARTICLES: [&str; 4] = ["lah", "kah", "tah", "pun"];
const POSSESSIVES: [&str; 3] = ["nya", "ku", "mu"];
const DERIVATIONAL: [&str; 3] = ["kan", "an", "i"];
const MIN_STEM_LEN: usize = 3;

/// 印尼语词形还原器
#[derive(Debug, Clone, Default)]
pub struct IndonesianLemmatizer {
    extra_roots: HashSet<String>,
    overrides: HashMap<String, String>,
}

impl IndonesianLemmatizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加载词典文件
    ///
    /// 每行 `词<TAB>词根` 视为显式映射，只有一列时视为补充词根。
    /// 词根会去掉标点，保证还原结果不会重新引入标点
    pub fn load_dictionary(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取词典文件: {}", path.display()))?;

        let mut loaded = 0;
        for line in content.lines() {
            let mut columns = line.split('\t').map(str::trim).filter(|c| !c.is_empty());
            match (columns.next(), columns.next()) {
                (Some(word), Some(lemma)) => {
                    let lemma = strip_punct(&lemma.to_lowercase())?;
                    if lemma.is_empty() {
                        continue;
                    }
                    self.overrides.insert(word.to_lowercase(), lemma);
                    loaded += 1;
                }
                (Some(root), None) => {
                    self.extra_roots.insert(root.to_lowercase());
                    loaded += 1;
                }
                _ => {}
            }
        }
        Ok(loaded)
    }

    fn is_root(&self, word: &str) -> bool {
        ROOT_WORDS.contains(word) || self.extra_roots.contains(word)
    }

    fn stem(&self, word: &str) -> Option<String> {
        if self.is_root(word) {
            return Some(word.to_string());
        }

        for w1 in strip_suffixes(word, &PARTICLES) {
            for w2 in strip_suffixes(&w1, &POSSESSIVES) {
                for w3 in strip_suffixes(&w2, &DERIVATIONAL) {
                    if self.is_root(&w3) {
                        return Some(w3);
                    }
                    for p1 in strip_prefix(&w3) {
                        if self.is_root(&p1) {
                            return Some(p1);
                        }
                        if let Some(p2) = strip_prefix(&p1).into_iter().find(|p| self.is_root(p)) {
                            return Some(p2);
                        }
                    }
                }
            }
        }
        None
    }
}

impl Lemmatizer for IndonesianLemmatizer {
    fn lemmatize(&self, token: &str) -> Result<String, NormalizationFailure> {
        let lower = token.to_lowercase();
        if let Some(lemma) = self.overrides.get(&lower) {
            return Ok(lemma.clone());
        }
        Ok(self.stem(&lower).unwrap_or_else(|| token.to_string()))
    }
}

/// 原词本身加上去掉任一后缀后的候选
fn strip_suffixes(word: &str, suffixes: &[&str]) -> Vec<String> {
    let mut candidates = vec![word.to_string()];
    candidates.extend(
        suffixes
            .iter()
            .filter_map(|s| word.strip_suffix(s))
            .filter(|rest| rest.chars().count() >= MIN_STEM_LEN)
            .map(str::to_string),
    );
    candidates
}

/// 去掉一层前缀（含 meN-/peN- 的首字母还原）
fn strip_prefix(word: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut push = |head: &str, rest: &str| {
        let candidate = format!("{}{}", head, rest);
        if candidate.chars().count() >= MIN_STEM_LEN {
            candidates.push(candidate);
        }
    };

    for prefix in ["meng", "peng"] {
        if let Some(rest) = word.strip_prefix(prefix) {
            push("", rest);
            push("k", rest);
        }
    }
    for prefix in ["meny", "peny"] {
        if let Some(rest) = word.strip_prefix(prefix) {
            push("s", rest);
        }
    }
    for prefix in ["mem", "pem"] {
        if let Some(rest) = word.strip_prefix(prefix) {
            push("", rest);
            push("p", rest);
        }
    }
    for prefix in ["men", "pen"] {
        if let Some(rest) = word.strip_prefix(prefix) {
            push("", rest);
            push("t", rest);
        }
    }
    for prefix in ["ber", "ter", "per", "me", "pe", "be", "te", "di", "ke", "se"] {
        if let Some(rest) = word.strip_prefix(prefix) {
            push("", rest);
        }
    }
    candidates
}
