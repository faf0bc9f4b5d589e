// Configuration of a dictionary build.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::errors::{DictError, Result};


/// Spreadsheet column roles (0-based). Only some of them feed the dictionaries,
/// the others are listed to validate the configured column count.
pub const COLUMN_MAPPING: &[(&str, usize)] = &[
    ("thai_romanized", 0),
    ("easythai", 1),
    ("thaiphon", 2),
    ("thai", 3),
    ("thai_pron_added", 4),
    ("english", 5),
    ("french", 6),
    ("type", 7),
    ("usage", 8),
    ("scient", 9),
    ("dom", 10),
    ("classif", 11),
    ("syn", 12),
    ("level", 13),
    ("note", 14),
    ("spanish", 15),
    ("italian", 16),
    ("portuguese", 17),
    ("german", 18),
    ("dutch", 19),
    ("norwegian", 20),
    ("turkish", 21),
    ("malay", 22),
    ("indonesian", 23),
    ("filipino", 24),
    ("vietnamese", 25),
    ("russian1", 26),
    ("russian2", 27),
    ("lao1", 28),
    ("lao2", 29),
    ("korean1", 30),
    ("korean2", 31),
];

/// Returns the role of a column, "unused" when none is assigned.
pub fn column_role(index: usize) -> &'static str {
    COLUMN_MAPPING
        .iter()
        .find(|(_, i)| *i == index)
        .map_or("unused", |&(name, _)| name)
}


/// Dictionary names written into the converter metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Titles {
    pub th_en: String,
    pub th_pron_en: String,
    pub th_pron_merge_en: String,
    pub en_th: String,
}

impl Default for Titles {
    fn default() -> Self {
        Titles {
            th_en: String::from("volubilis v074 (th-en)"),
            th_pron_en: String::from("volubilis v074 (.th-en)"),
            th_pron_merge_en: String::from("volubilis v074 (.th-merge-en)"),
            en_th: String::from("volubilis v074 (en-th)"),
        }
    }
}

const DESCRIPTION: &str = "Volubilis English-Thai dictionary by Belisan (Fr. Bastien)<br>\
พจนานุกรม วอลุบิลิส ภาษาอังกฤษ-ไทย<br>\
(http://belisan-volubilis.blogspot.com)<br><br>\
ā = long vowel \"a\"<br>\
start pronounciation search: type . (dot) plus searchterm (eg. .maa -> dog, horse,come,..)";


/// Every option of a build. Passed explicitly to each stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_file: PathBuf,
    pub output_dir: PathBuf,
    pub stardict_dir: PathBuf,
    pub columns: usize,
    pub paiboon: bool,
    pub source_encoding: String,

    pub row_limit_debug: bool,
    pub row_limit: usize,

    pub use_cache: bool,
    pub force_refresh_cache: bool,
    pub cache_file: PathBuf,

    pub th_pron: bool,
    pub th_pron_prefix: String,
    pub th_pron_max_headword_length: usize,
    pub th_pron_incl_translation_in_headword: bool,

    pub th_pron_merge: bool,
    pub th_pron_merge_prefix: String,
    pub th_pron_merge_max_headword_length: usize,
    pub th_pron_merge_incl_translation_in_headword: bool,

    pub enable_mobi_build: bool,
    /// Rewrites " -" in displayed pronunciations for Dictbox.
    pub dictbox_spaces_workaround: bool,

    pub titles: Titles,
    pub description: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_file: PathBuf::from("vol_mundo.xlsx"),
            output_dir: PathBuf::from("stardict/txt"),
            stardict_dir: PathBuf::from("stardict"),
            columns: 32,
            paiboon: true,
            source_encoding: String::from("utf-8"),
            row_limit_debug: false,
            row_limit: 1000,
            use_cache: true,
            force_refresh_cache: false,
            cache_file: PathBuf::from("cache.bin"),
            th_pron: true,
            th_pron_prefix: String::from("."),
            th_pron_max_headword_length: 100,
            th_pron_incl_translation_in_headword: false,
            th_pron_merge: true,
            th_pron_merge_prefix: String::from("."),
            th_pron_merge_max_headword_length: 150,
            th_pron_merge_incl_translation_in_headword: true,
            enable_mobi_build: false,
            dictbox_spaces_workaround: false,
            titles: Titles::default(),
            description: String::from(DESCRIPTION),
        }
    }
}

impl Config {
    /// Loads a TOML file, missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Config> {
        let s = std::fs::read_to_string(path)?;
        Config::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Config> {
        Ok(toml::from_str(s)?)
    }

    /// The cache lives in the output directory unless an absolute path is given.
    pub fn cache_path(&self) -> PathBuf {
        if self.cache_file.is_absolute() {
            self.cache_file.clone()
        } else {
            self.output_dir.join(&self.cache_file)
        }
    }

    /// Checks the options before anything is processed.
    pub fn validate(&self) -> Result<()> {
        if !self.source_file.exists() {
            return Err(DictError::Config(format!(
                "source file not found: {}", self.source_file.display())));
        }

        if self.columns < 1 {
            return Err(DictError::Config(String::from("columns must be positive")));
        }

        let max_col = COLUMN_MAPPING.iter().map(|(_, i)| *i).max().unwrap_or(0);
        if max_col >= self.columns {
            return Err(DictError::Config(format!(
                "column mapping references column {} but only {} columns configured",
                max_col, self.columns)));
        }

        if encoding_rs::Encoding::for_label(self.source_encoding.as_bytes()).is_none() {
            return Err(DictError::Config(format!(
                "unknown source encoding: {}", self.source_encoding)));
        }

        Ok(())
    }
}
