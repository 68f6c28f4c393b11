use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use phf::phf_set;

/// 内置印尼语停用词
static BUILTIN_STOPWORDS: phf::Set<&'static str> = phf_set! {
    "ada", "adalah", "adanya", "agak", "agar", "akan", "aku", "akulah", "amat", "anda",
    "antara", "apa", "apakah", "apalagi", "atau", "ataupun", "bagai", "bagaimana", "bagi",
    "bahkan", "bahwa", "baik", "bakal", "banget", "begitu", "belum", "beberapa", "biar",
    "bila", "bisa", "boleh", "bukan", "bukankah", "cuma", "dahulu", "dalam", "dan", "dapat",
    "dari", "daripada", "dekat", "demi", "dengan", "di", "dia", "dialah", "dong", "dulu",
    "engkau", "gak", "ga", "hal", "hampir", "hanya", "harus", "hingga", "ia", "ialah",
    "ingin", "ini", "inilah", "itu", "itulah", "jadi", "jangan", "jika", "juga", "justru",
    "kalau", "kalian", "kami", "kamu", "kan", "karena", "ke", "kemudian", "kenapa", "kepada",
    "ketika", "kini", "kita", "kok", "lagi", "lah", "lalu", "lebih", "maka", "mana", "masih",
    "mau", "melainkan", "memang", "mereka", "meski", "mungkin", "nah", "namun", "nanti",
    "nya", "oleh", "pada", "padahal", "para", "pasti", "per", "perlu", "pernah", "pula",
    "pun", "saat", "saja", "salah", "sambil", "sampai", "sangat", "saya", "se", "sebab",
    "sebelum", "sedang", "sehingga", "sejak", "semua", "sendiri", "seperti", "sering",
    "serta", "sesudah", "setelah", "setiap", "sih", "siapa", "sini", "situ", "suatu",
    "sudah", "supaya", "tak", "tanpa", "tapi", "telah", "tentang", "tentu", "terhadap",
    "tersebut", "tetapi", "tidak", "toh", "untuk", "wah", "walau", "ya", "yaitu", "yakni",
    "yang",
};

/// 停用词集合，匹配时不区分大小写
#[derive(Debug, Clone, Default)]
pub struct StopwordSet {
    extra: HashSet<String>,
}

impl StopwordSet {
    /// 只包含内置停用词
    pub fn builtin() -> Self {
        Self::default()
    }

    /// 追加停用词
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
    }

    /// 从文件追加停用词（每行一个）
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取停用词文件: {}", path.display()))?;
        let before = self.extra.len();
        self.extend(content.lines());
        Ok(self.extra.len() - before)
    }

    pub fn contains(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        BUILTIN_STOPWORDS.contains(lower.as_str()) || self.extra.contains(&lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_case_insensitive() {
        let set = StopwordSet::builtin();
        assert!(set.contains("yang"));
        assert!(set.contains("YANG"));
        assert!(!set.contains("slot"));
    }

    #[test]
    fn test_extend_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Wkwk\n\n  gan  ").unwrap();

        let mut set = StopwordSet::builtin();
        assert_eq!(set.extend_from_file(file.path()).unwrap(), 2);
        assert!(set.contains("wkwk"));
        assert!(set.contains("GAN"));
    }
}
