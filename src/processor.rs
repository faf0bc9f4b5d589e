// Turns spreadsheet rows into dictionary entries.

use std::collections::BTreeMap;

use regex::*;
use serde::{Deserialize, Serialize};

use super::config::Config;
use super::errors::Result;
use super::formatter::{clean_text, tone_priority, TextFormatter};


/// One spreadsheet line, `None` for empty cells.
pub type Row = Vec<Option<String>>;

const COL_THAIPHON: usize = 2;
const COL_THAI: usize = 3;
const COL_ENGLISH: usize = 5;
const COL_TYPE: usize = 7;
const COL_USAGE: usize = 8;
const COL_SCIENT: usize = 9;
const COL_DOM: usize = 10;
const COL_CLASSIF: usize = 11;
const COL_SYN: usize = 12;
const COL_LEVEL: usize = 13;
const COL_NOTE: usize = 14;

const SUMMARY_LENGTH: usize = 50;


/// A headword collected for the merged phonetic dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMember {
    pub thai: String,
    pub english: String,
    pub level: String,
    pub definition: String,
}

/// The four accumulated dictionaries. Definitions in `th_en`, `th_pron_en` and
/// `en_th` carry their 2-character sort prefix until they are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indices {
    pub th_en: BTreeMap<String, Vec<String>>,
    pub th_pron_en: BTreeMap<String, Vec<String>>,
    pub th_pron_merge_en: BTreeMap<String, Vec<MergeMember>>,
    /// translation term -> part of speech -> definitions
    pub en_th: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl Indices {
    pub fn new() -> Indices {
        Indices::default()
    }

    /// Adds what one row produced.
    pub fn insert(&mut self, entries: RowEntries) {
        let RowEntries { thai_word, pron_headword, pron_search, definition, merge, reverse } = entries;

        if let Some(pron_headword) = pron_headword {
            self.th_pron_en.entry(pron_headword).or_insert_with(Vec::new).push(definition.clone());
        }
        self.th_en.entry(thai_word).or_insert_with(Vec::new).push(definition);

        if !merge.is_empty() {
            self.th_pron_merge_en.entry(pron_search).or_insert_with(Vec::new).extend(merge);
        }

        for (term, word_type, definition) in reverse {
            self.en_th
                .entry(term)
                .or_insert_with(BTreeMap::new)
                .entry(word_type)
                .or_insert_with(Vec::new)
                .push(definition);
        }
    }
}

/// Entries produced from one row, ready to be inserted into `Indices`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowEntries {
    pub thai_word: String,
    pub pron_headword: Option<String>,
    pub pron_search: String,
    /// Prefixed definition.
    pub definition: String,
    pub merge: Vec<MergeMember>,
    /// (term, part of speech, prefixed definition)
    pub reverse: Vec<(String, String, String)>,
}


/// 2 characters taken from the level, used to sort definitions sharing a key.
pub fn sort_prefix(level: &str) -> String {
    let mut chars = level.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) => [a, b].iter().collect(),
        (Some(a), None) => format!("{} ", a),
        _ => String::from("  "),
    }
}

/// Removes the sort prefix added by `sort_prefix`.
pub fn strip_sort_prefix(s: &str) -> &str {
    match s.char_indices().nth(2) {
        Some((index, _)) => &s[index..],
        None => "",
    }
}

/// Sorts merged headwords by tone (mid, low, falling, high, rising) then level.
pub fn sort_by_tone_and_level(members: &mut [MergeMember]) {
    members.sort_by_cached_key(|m| (tone_priority(&m.thai), sort_prefix(&m.level)));
}

/// Cuts to at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn is_thai(c: char) -> bool {
    ('\u{0E00}'..='\u{0E7F}').contains(&c)
}

fn split_synonyms(s: &str) -> Vec<String> {
    s.split(|c: char| c == ';' || c == '=')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn cell(row: &[Option<String>], index: usize) -> String {
    clean_text(row.get(index).and_then(|c| c.as_deref()))
}


/// Builds the entries of one row.
#[derive(Debug)]
pub struct RowProcessor<'a> {
    config: &'a Config,
    formatter: &'a TextFormatter,
    re_bracketed: Regex,
    re_science: Regex,
    re_description: Regex,
}

impl<'a> RowProcessor<'a> {
    pub fn new(config: &'a Config, formatter: &'a TextFormatter) -> Result<RowProcessor<'a>> {
        Ok(RowProcessor {
            config,
            formatter,
            re_bracketed: Regex::new(r"\((.*?)\)")?,
            re_science: Regex::new(r#"<span class="science">scient: .*?</span>(<br>)?"#)?,
            re_description: Regex::new(r#"<span class="description">.*?</span>"#)?,
        })
    }

    /// Processes a row into `indices`. Returns false when the row is skipped.
    pub fn process_row(&self, row: &[Option<String>], indices: &mut Indices) -> bool {
        match self.entries(row) {
            Some(entries) => {
                indices.insert(entries);
                true
            },
            None => false,
        }
    }

    /// Entries of a row, `None` when the Thai word or the translation is missing.
    /// Does not touch any shared state, rows can be handled in parallel.
    pub fn entries(&self, row: &[Option<String>]) -> Option<RowEntries> {
        let paiboon = self.config.paiboon;
        let f = self.formatter;

        let thai = cell(row, COL_THAI);
        let english = f.format_definition_text(&cell(row, COL_ENGLISH));
        if thai.is_empty() || english.is_empty() {
            return None;
        }

        let thaiphon = cell(row, COL_THAIPHON);
        let type_word = f.format_definition_text(&cell(row, COL_TYPE));
        let usage = f.format_definition_text(&cell(row, COL_USAGE));
        let scient = f.format_definition_text(&cell(row, COL_SCIENT));
        let dom = f.format_definition_text(&cell(row, COL_DOM));
        let classif = cell(row, COL_CLASSIF);
        let syn = cell(row, COL_SYN);
        let level = f.format_definition_text(&cell(row, COL_LEVEL));
        let note = f.format_definition_text(&cell(row, COL_NOTE));

        let mut thai_synonyms = split_synonyms(&thai);
        let english_synonyms = split_synonyms(&english);

        // Thai words in brackets of the classifier cell are further headwords,
        // "tua (ตัว)"
        for caps in self.re_bracketed.captures_iter(&classif) {
            let word = caps.get(1).map_or("", |m| m.as_str().trim());
            if !word.is_empty() && word.chars().all(is_thai) && !thai_synonyms.iter().any(|s| s == word) {
                thai_synonyms.push(String::from(word));
            }
        }

        let thai_word = if thai_synonyms.is_empty() { thai.clone() } else { thai_synonyms.join("|") };
        let english_word = if english_synonyms.is_empty() { english.clone() } else { english_synonyms.join("|") };
        let thai_display = thai_synonyms.first().cloned().unwrap_or_else(|| thai.clone());

        let pron_formatted = f.format_tones(&thaiphon.to_lowercase(), paiboon);
        let pron_search = f.format_pronunciation_search(&pron_formatted, paiboon);

        let pron_headword = if pron_search.is_empty() {
            None
        } else {
            let headword = if self.config.th_pron_incl_translation_in_headword {
                let summary = truncate_chars(&english_word.replace('|', ", "), SUMMARY_LENGTH);
                format!("{} - {} ({})", pron_search, thai_word, summary)
            } else {
                format!("{} - {}", pron_search, thai_word)
            };
            Some(truncate_chars(&headword, self.config.th_pron_max_headword_length))
        };

        let definition = self.format_definition(&DefinitionFields {
            thai: &thai_display,
            pron: &pron_formatted,
            type_word: &type_word,
            usage: &usage,
            classif: &classif,
            syn: &syn,
            scient: &scient,
            note: &note,
            level: &level,
            english: &english_word,
            dom: &dom,
        });

        let mut merge = Vec::new();
        if self.config.th_pron_merge && !pron_search.is_empty() {
            for (i, thai_syn) in thai_synonyms.iter().enumerate() {
                merge.push(MergeMember {
                    thai: thai_syn.clone(),
                    english: english_synonyms.get(i).cloned().unwrap_or_default(),
                    level: level.clone(),
                    definition: definition.clone(),
                });
            }
        }

        let prefix = sort_prefix(&level);
        let reverse = self.reverse_entries(&english_word, &definition, &type_word, &prefix);

        Some(RowEntries {
            thai_word,
            pron_headword,
            pron_search,
            definition: format!("{}{}", prefix, definition),
            merge,
            reverse,
        })
    }

    /// English to Thai entries, one per translation term.
    fn reverse_entries(&self, english_word: &str, definition: &str, type_word: &str, prefix: &str)
        -> Vec<(String, String, String)> {
        let definition = self.re_science.replace_all(definition, NoExpand(""));
        let description = format!(r#"<span class="description">{}</span>"#, english_word.replace('|', ", "));
        let definition = self.re_description.replace_all(&definition, NoExpand(&description));
        let definition = format!("{}{}", prefix, definition);

        english_word.split('|')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| (String::from(term), String::from(type_word), definition.clone()))
            .collect()
    }

    fn format_definition(&self, d: &DefinitionFields) -> String {
        let paiboon = self.config.paiboon;
        let f = self.formatter;

        let mut definition = format!(r#"<span class="thai"><strong>{}</strong></span> "#, d.thai);

        if !d.pron.is_empty() {
            let mut pron = f.format_final_pronunciation(d.pron, paiboon);
            if self.config.dictbox_spaces_workaround {
                pron = f.spaces_workaround_dictbox(&pron);
            }
            definition.push_str(&format!(r#"<span class="pron">[{}]</span> "#, pron));
        }

        let type_usage = format!("{} {}", d.type_word.to_lowercase(), d.usage);
        let type_usage = type_usage.trim();
        if !type_usage.is_empty() {
            definition.push_str(&format!(r#"<span class="type">{}</span> "#, type_usage));
        }

        if !d.classif.is_empty() {
            let classifiers = f.split_and_format_list(d.classif, paiboon);
            if !classifiers.trim().is_empty() {
                definition.push_str(&format!(r#"<span class="clf">classifier: {}</span> "#, classifiers));
            }
        }

        let english = d.english.replace('|', ", ").replace(';', ", ");
        definition.push_str(&format!(r#"<br><span class="def">{}</span><br>"#, english));

        if !d.syn.is_empty() {
            let synonyms = f.split_and_format_list(d.syn, paiboon);
            if !synonyms.trim().is_empty() {
                definition.push_str(&format!(r#"<span class="syn">syn: {}</span><br>"#, synonyms));
            }
        }

        if !d.scient.is_empty() {
            definition.push_str(&format!(r#"<span class="science">scient: {}</span><br>"#, d.scient.replace('|', ", ")));
        }

        if !d.note.is_empty() {
            definition.push_str(&format!(r#"<span class="note">note: {}</span><br>"#, d.note));
        }

        definition.push_str(&format_level_info(d.level, d.dom));
        definition
    }
}

struct DefinitionFields<'s> {
    thai: &'s str,
    pron: &'s str,
    type_word: &'s str,
    usage: &'s str,
    classif: &'s str,
    syn: &'s str,
    scient: &'s str,
    note: &'s str,
    level: &'s str,
    english: &'s str,
    dom: &'s str,
}

/// "Level: A1 - Category: animal" in a level span, empty when both are missing.
pub fn format_level_info(level: &str, dom: &str) -> String {
    let mut parts = String::new();
    if !level.is_empty() {
        parts.push_str(&format!("Level: {}", level));
    }
    if !level.is_empty() && !dom.is_empty() {
        parts.push_str(" - ");
    }
    if !dom.is_empty() {
        parts.push_str(&format!("Category: {}", dom.to_lowercase()));
    }

    if parts.is_empty() {
        parts
    } else {
        format!(r#"<span class="level">{}</span>"#, parts)
    }
}
