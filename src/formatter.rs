// Text normalization built on the rule table.

use super::errors::Result;
use super::rules::RuleTable;


/// Thai tone marks, in the order used for sorting merged entries.
const MAI_EK: char = '\u{0E48}';
const MAI_THO: char = '\u{0E49}';
const MAI_TRI: char = '\u{0E4A}';
const MAI_CHATTAWA: char = '\u{0E4B}';


/// Applies the named rule sets in the fixed orders needed by the dictionary.
#[derive(Debug, Clone)]
pub struct TextFormatter {
    rules: RuleTable,
}

impl TextFormatter {
    pub fn new() -> Result<TextFormatter> {
        Ok(TextFormatter { rules: RuleTable::new()? })
    }

    /// Pronunciation as displayed in definitions.
    pub fn format_tones(&self, text: &str, paiboon: bool) -> String {
        let r = &self.rules;
        let mut s = r.default.apply(text);
        s = r.remove_starting_brackets.apply(&s);
        s = r.pron.apply(&s);
        s = r.pron2.apply(&s);
        if paiboon {
            s = r.type_friendly_1.apply(&s);
            s = r.to_paiboon.apply(&s);
        }
        s
    }

    /// Loosely matching key for the phonetic indices, no tone marks and no hyphens.
    pub fn format_pronunciation_search(&self, text: &str, paiboon: bool) -> String {
        let r = &self.rules;
        let mut s = r.remove_brackets.apply(text);
        if !paiboon {
            s = r.type_friendly_1.apply(&s);
        }
        r.type_friendly_2.apply(&s)
    }

    /// Like `format_tones`, but keeps only the Thai word when the cell reads "pron (thai)".
    pub fn format_classifier(&self, text: &str, paiboon: bool) -> String {
        let s = self.rules.classifier.apply(text);
        self.format_tones(&s, paiboon)
    }

    /// Paiboon diacritics are safe to display as they are, the other transcription
    /// needs its backslashes escaped.
    pub fn format_final_pronunciation(&self, text: &str, paiboon: bool) -> String {
        if paiboon {
            String::from(text)
        } else {
            self.rules.final_pron.apply(text)
        }
    }

    pub fn format_definition_text(&self, text: &str) -> String {
        self.rules.default.apply(text)
    }

    pub fn spaces_workaround_dictbox(&self, text: &str) -> String {
        self.rules.spaces_workaround_dictbox.apply(text)
    }

    /// Splits a ";" separated cell and formats each part as a classifier.
    pub fn split_and_format_list(&self, text: &str, paiboon: bool) -> String {
        text.split(';')
            .map(|part| clean_text(Some(part)))
            .filter(|part| !part.is_empty())
            .map(|part| self.format_classifier(&part, paiboon))
            .collect::<Vec<String>>()
            .join(", ")
    }
}

/// Empty cells and the "None" sentinel become empty strings, anything else is trimmed.
pub fn clean_text(cell: Option<&str>) -> String {
    match cell {
        None | Some("None") => String::new(),
        Some(s) => String::from(s.trim()),
    }
}

/// 0 mid, 1 low, 2 falling, 3 high, 4 rising.
pub fn tone_priority(thai: &str) -> u8 {
    if thai.contains(MAI_EK) {
        1
    } else if thai.contains(MAI_THO) {
        2
    } else if thai.contains(MAI_TRI) {
        3
    } else if thai.contains(MAI_CHATTAWA) {
        4
    } else {
        0
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn formatter() -> TextFormatter {
        TextFormatter::new().unwrap()
    }

    #[test]
    fn clean_text_handles_sentinels() {
        assert_eq!(clean_text(Some("  test  ")), "test");
        assert_eq!(clean_text(Some("None")), "");
        assert_eq!(clean_text(Some("")), "");
        assert_eq!(clean_text(None), "");
        assert_eq!(clean_text(Some("valid text")), "valid text");
    }

    #[test]
    fn tones_become_diacritics_in_paiboon_mode() {
        let f = formatter();
        let tones = f.format_tones("¯maa _kin", true);
        assert_eq!(tones, "ma\u{301}a -ki\u{300}n");

        let search = f.format_pronunciation_search(&tones, true);
        assert_eq!(search, "maa kin");
    }

    #[test]
    fn tones_keep_markers_without_paiboon() {
        let f = formatter();
        let tones = f.format_tones("\\maa", false);
        assert_eq!(tones, "\\maa");
        assert_eq!(f.format_final_pronunciation(&tones, false), "&#x5c;maa");
        assert_eq!(f.format_final_pronunciation(&tones, true), "\\maa");
        assert_eq!(f.format_pronunciation_search(&tones, false), "maa");
    }

    #[rstest]
    #[case("¯maa _kin")]
    #[case("[\\khaaw] /suay")]
    #[case("_sa\\wat ¯dii")]
    #[case("(thøø)")]
    fn search_key_has_no_tone_punctuation(#[case] raw: &str) {
        let f = formatter();
        for &paiboon in &[true, false] {
            let tones = f.format_tones(raw, paiboon);
            let search = f.format_pronunciation_search(&tones, paiboon);
            assert!(!search.contains(|c: char| "-_\\/¯()[]".contains(c)), "{}", search);
            assert!(!search.contains(|c: char| ('\u{300}'..='\u{30C}').contains(&c)), "{}", search);
        }
    }

    #[test]
    fn long_vowels_are_doubled_for_search() {
        let f = formatter();
        let tones = f.format_tones("thø", false);
        assert_eq!(tones, "thɔ\u{305}");
        assert_eq!(f.format_pronunciation_search(&tones, false), "too");
    }

    #[test]
    fn classifier_formatting() {
        let f = formatter();
        assert_eq!(f.format_classifier("tua (ตัว)", true), "ตัว");
        assert_eq!(f.split_and_format_list("คน; สัตว์", true), "คน, สัตว์");
        assert_eq!(f.split_and_format_list("big; ; large", true), "big, large");
        assert_eq!(f.split_and_format_list("", true), "");
    }

    #[test]
    fn dictbox_workaround() {
        let f = formatter();
        assert_eq!(f.spaces_workaround_dictbox("ma\u{301}a -ki\u{300}n"), "ma\u{301}a<sp> </sp>ki\u{300}n");
    }

    #[rstest]
    #[case("มา", 0)]
    #[case("ม\u{0E48}า", 1)]
    #[case("ม\u{0E49}า", 2)]
    #[case("ม\u{0E4A}า", 3)]
    #[case("ม\u{0E4B}า", 4)]
    fn tone_priorities(#[case] thai: &str, #[case] expected: u8) {
        assert_eq!(tone_priority(thai), expected);
    }
}
