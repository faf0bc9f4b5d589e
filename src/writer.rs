// Writes the accumulated indices as tab-separated dictionary texts.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::*;

use super::config::Config;
use super::errors::Result;
use super::processor::*;


pub const TH_EN_FILE: &str = "volubilis_th-en.txt";
pub const TH_PRON_EN_FILE: &str = "volubilis_th-pr-en.txt";
pub const TH_PRON_MERGE_EN_FILE: &str = "volubilis_th-pr-merge-en.txt";
pub const EN_TH_FILE: &str = "volubilis_en-th.txt";

// The translation is already the headword of the reverse dictionary.
static RE_DEF_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<br><span class="def">.*?</span><br>"#).unwrap());


/// Writes `key<TAB>definition` once per definition, definitions of a key sorted
/// by their sort prefix.
pub fn write_index<W: Write>(writer: &mut W, index: &BTreeMap<String, Vec<String>>, key_prefix: &str)
    -> Result<usize> {
    let mut count = 0;
    for (key, definitions) in index {
        let mut definitions: Vec<&String> = definitions.iter().collect();
        definitions.sort();
        for definition in definitions {
            writeln!(writer, "{}{}\t{}", key_prefix, key, strip_sort_prefix(definition))?;
            count += 1;
        }
    }
    Ok(count)
}

/// Writes one line per phonetic bucket, all headwords of the bucket in the key.
pub fn write_merged_index<W: Write>(writer: &mut W, buckets: &BTreeMap<String, Vec<MergeMember>>,
                                    key_prefix: &str, max_length: usize, incl_translation: bool)
    -> Result<usize> {
    let mut count = 0;
    for (pron_search, members) in buckets {
        let mut members = members.clone();
        sort_by_tone_and_level(&mut members);

        let headwords: Vec<String> = members.iter()
            .map(|m| {
                if incl_translation && !m.english.is_empty() {
                    format!("{} ({})", m.thai, m.english)
                } else {
                    m.thai.clone()
                }
            })
            .collect();
        let key = format!("{}{} - {}", key_prefix, pron_search, headwords.join(", "));
        let key = truncate_chars(&key, max_length);

        let value = members.iter()
            .map(|m| m.definition.as_str())
            .filter(|d| !d.is_empty())
            .collect::<Vec<&str>>()
            .join("<br><br>");

        writeln!(writer, "{}\t{}", key, value)?;
        count += 1;
    }
    Ok(count)
}

/// Writes one line per translation term, definitions grouped by part of speech.
pub fn write_reverse_index<W: Write>(writer: &mut W, index: &BTreeMap<String, BTreeMap<String, Vec<String>>>)
    -> Result<usize> {
    let mut count = 0;
    for (term, groups) in index {
        let mut parts = Vec::with_capacity(groups.len());
        for (word_type, definitions) in groups {
            let mut definitions: Vec<&String> = definitions.iter().collect();
            definitions.sort();
            let joined = definitions.iter()
                .map(|d| RE_DEF_SPAN.replace_all(strip_sort_prefix(d), "").into_owned())
                .collect::<Vec<String>>()
                .join("<br>");

            if word_type.trim().is_empty() {
                parts.push(joined);
            } else {
                parts.push(format!(r#"<span class="type">{}</span><br>{}"#, word_type, joined));
            }
        }

        writeln!(writer, "{}\t<span class=\"english\"><strong>{}</strong></span> <br>{}",
                 term, term, parts.join("<br>"))?;
        count += 1;
    }
    Ok(count)
}


/// Writes the dictionary text files into the output directory.
#[derive(Debug)]
pub struct IndexWriter<'a> {
    config: &'a Config,
}

impl<'a> IndexWriter<'a> {
    pub fn new(config: &'a Config) -> IndexWriter<'a> {
        IndexWriter { config }
    }

    /// Returns the written files.
    pub fn write_all(&self, indices: &Indices) -> Result<Vec<PathBuf>> {
        let c = self.config;
        let dir = &c.output_dir;
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();

        let path = dir.join(TH_EN_FILE);
        let n = write_file(&path, |w| write_index(w, &indices.th_en, ""))?;
        log::info!("{}: {} entries", path.display(), n);
        written.push(path);

        if c.th_pron {
            let path = dir.join(TH_PRON_EN_FILE);
            let n = write_file(&path, |w| write_index(w, &indices.th_pron_en, &c.th_pron_prefix))?;
            log::info!("{}: {} entries", path.display(), n);
            written.push(path);
        }

        if c.th_pron_merge {
            let path = dir.join(TH_PRON_MERGE_EN_FILE);
            let n = write_file(&path, |w| write_merged_index(
                w,
                &indices.th_pron_merge_en,
                &c.th_pron_merge_prefix,
                c.th_pron_merge_max_headword_length,
                c.th_pron_merge_incl_translation_in_headword,
            ))?;
            log::info!("{}: {} entries", path.display(), n);
            written.push(path);
        }

        let path = dir.join(EN_TH_FILE);
        let n = write_file(&path, |w| write_reverse_index(w, &indices.en_th))?;
        log::info!("{}: {} entries", path.display(), n);
        written.push(path);

        Ok(written)
    }
}

fn write_file<F>(path: &Path, f: F) -> Result<usize>
    where F: FnOnce(&mut BufWriter<File>) -> Result<usize> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let n = f(&mut writer)?;
    writer.flush()?;
    Ok(n)
}
