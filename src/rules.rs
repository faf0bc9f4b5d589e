// Rewrite rules for the Volubilis transcription.

use std::borrow::Cow;

use regex::*;

use super::errors::Result;


// à  _   ̀
// á  ¯   ́
// â  \   ̂
// ǎ  /   ̌

const REMOVE_BRACKETS: &[(&str, &str)] = &[
    (r"[…\.\[\]\(\)]", ""),
    (r"[\x{0300}\x{0301}\x{0302}\x{030C}]", ""),
];

const REMOVE_STARTING_BRACKETS: &[(&str, &str)] = &[
    (r"\[", "("),
    (r"\]", ")"),
    (r"^\((.*)\)$", "${1}"),
    // "_ maa" -> "_maa"
    (r"([-_\\/¯]) ([a-zɔ])", "${1}${2}"),
];

const TYPE_FRIENDLY_1: &[(&str, &str)] = &[
    ("ø\u{305}", "øø"),
    ("ɔ\u{305}", "ɔɔ"),
    ("ē", "ee"),
    ("ā", "aa"),
    ("ī", "ii"),
    ("ū", "uu"),
    ("ō", "oo"),
];

const TO_PAIBOON: &[(&str, &str)] = &[
    (r"¯([bcdfghjklmnpqrstvwxyz]*)([aeiouɔ])([a-z]*)", "-${1}${2}\u{301}${3}"),
    (r"\\([bcdfghjklmnpqrstvwxyz]*)([aeiouɔ])([a-z]*)", "-${1}${2}\u{302}${3}"),
    (r"/([bcdfghjklmnpqrstvwxyz]*)([aeiouɔ])([a-z]*)", "-${1}${2}\u{30C}${3}"),
    (r"_([bcdfghjklmnpqrstvwxyz]*)([aeiouɔ])([a-z]*)", "-${1}${2}\u{300}${3}"),
    (r"^-", ""),
    // (-maa -> (maa
    (r"([\(\[])-", "${1}"),
];

// Dictbox ignores spaces when the text inside a tag is not latin.
const SPACES_WORKAROUND_DICTBOX: &[(&str, &str)] = &[
    (r"[ ]-", "<sp> </sp>"),
];

const TYPE_FRIENDLY_2: &[(&str, &str)] = &[
    (r"[-_\\/¯]", " "),
    (r"^\s+", ""),
    (r"\s\s+", " "),
    // aspirated and unaspirated letters are searched the same
    (r"([tkp])h", "${1}"),
    // not on the default keyboard
    ("ñ", "n"),
    ("ɔ", "o"),
];

const PRON: &[(&str, &str)] = &[
    ("ø", "ø\u{305}"),
    ("\u{1FF}", "ø"),
    ("ø\u{305}", "ɔ\u{305}"),
];

// Has to stay apart from PRON, the "ø" produced above must not be rewritten again there.
const PRON2: &[(&str, &str)] = &[
    ("ø", "ɔ"),
];

const DEFAULT: &[(&str, &str)] = &[
    (r"\t", "    "),
    (r"^\s+", ""),
    (r"\s+$", ""),
];

const FINAL_PRON: &[(&str, &str)] = &[
    (r"\\", "&#x5c;"),
];

const CLASSIFIER: &[(&str, &str)] = &[
    (r"\s*(.*?)\s*\(([ก-๛]+).*\s*", "${2}"),
];


/// One compiled pattern and its replacement template.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

/// Ordered rules, each one rewriting the output of the previous.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: &'static str,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compiles a rule set. Empty patterns are skipped.
    pub fn compile(name: &'static str, specs: &[(&str, &'static str)]) -> Result<RuleSet> {
        let mut rules = Vec::with_capacity(specs.len());
        for &(pattern, replacement) in specs {
            if pattern.is_empty() {
                continue;
            }
            rules.push(Rule {
                pattern: Regex::new(pattern)?,
                replacement,
            });
        }
        Ok(RuleSet { name, rules })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Applies every rule in order.
    pub fn apply(&self, text: &str) -> String {
        let mut result = String::from(text);
        for rule in &self.rules {
            match rule.pattern.replace_all(&result, rule.replacement) {
                Cow::Owned(r) => {
                    log::trace!("{}: {} -> {}", self.name, rule.pattern.as_str(), r);
                    result = r;
                },
                Cow::Borrowed(_) => {},
            }
        }
        result
    }
}

/// All named rule sets, compiled once and never mutated.
#[derive(Debug, Clone)]
pub struct RuleTable {
    pub remove_brackets: RuleSet,
    pub remove_starting_brackets: RuleSet,
    pub type_friendly_1: RuleSet,
    pub to_paiboon: RuleSet,
    pub spaces_workaround_dictbox: RuleSet,
    pub type_friendly_2: RuleSet,
    pub pron: RuleSet,
    pub pron2: RuleSet,
    pub default: RuleSet,
    pub final_pron: RuleSet,
    pub classifier: RuleSet,
}

impl RuleTable {
    pub fn new() -> Result<RuleTable> {
        Ok(RuleTable {
            remove_brackets: RuleSet::compile("remove_brackets", REMOVE_BRACKETS)?,
            remove_starting_brackets: RuleSet::compile("remove_starting_brackets", REMOVE_STARTING_BRACKETS)?,
            type_friendly_1: RuleSet::compile("type_friendly_1", TYPE_FRIENDLY_1)?,
            to_paiboon: RuleSet::compile("to_paiboon", TO_PAIBOON)?,
            spaces_workaround_dictbox: RuleSet::compile("spaces_workaround_dictbox", SPACES_WORKAROUND_DICTBOX)?,
            type_friendly_2: RuleSet::compile("type_friendly_2", TYPE_FRIENDLY_2)?,
            pron: RuleSet::compile("pron", PRON)?,
            pron2: RuleSet::compile("pron2", PRON2)?,
            default: RuleSet::compile("default", DEFAULT)?,
            final_pron: RuleSet::compile("final_pron", FINAL_PRON)?,
            classifier: RuleSet::compile("classifier", CLASSIFIER)?,
        })
    }

    /// Looks a rule set up by its name.
    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.all().into_iter().find(|set| set.name() == name)
    }

    fn all(&self) -> Vec<&RuleSet> {
        vec![
            &self.remove_brackets,
            &self.remove_starting_brackets,
            &self.type_friendly_1,
            &self.to_paiboon,
            &self.spaces_workaround_dictbox,
            &self.type_friendly_2,
            &self.pron,
            &self.pron2,
            &self.default,
            &self.final_pron,
            &self.classifier,
        ]
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn table() -> RuleTable {
        RuleTable::new().unwrap()
    }

    #[test]
    fn empty_patterns_are_skipped() {
        let set = RuleSet::compile("test", &[("a", "b"), ("", "x"), ("c", "d")]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.apply("abcd"), "bbdd");
    }

    #[test]
    fn rules_apply_in_order() {
        let set = RuleSet::compile("test", &[("a", "b"), ("b", "c")]).unwrap();
        assert_eq!(set.apply("ab"), "cc");
    }

    #[test]
    fn lookup_by_name() {
        let t = table();
        assert_eq!(t.get("pron2").map(|s| s.len()), Some(1));
        assert!(t.get("unknown").is_none());
    }

    #[rstest]
    #[case("[maa] kin", "(maa) kin")]
    #[case("(maa)", "maa")]
    #[case("_ maa", "_maa")]
    #[case("\\ kháw", "\\kháw")]
    fn remove_starting_brackets(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(table().remove_starting_brackets.apply(input), expected);
    }

    #[rstest]
    #[case("¯maa", "ma\u{301}a")]
    #[case("_sa\\wat", "sa\u{300}-wa\u{302}t")]
    #[case("/khaw", "kha\u{30C}w")]
    #[case("(¯maa)", "(ma\u{301}a)")]
    fn to_paiboon(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(table().to_paiboon.apply(input), expected);
    }

    #[rstest]
    #[case("_khap-\\khun", "kap kun")]
    #[case("  ¯ñɔɔ", "noo")]
    #[case("maa  maa", "maa maa")]
    fn type_friendly_2(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(table().type_friendly_2.apply(input), expected);
    }

    #[test]
    fn pron_tables_fold_special_vowel() {
        let t = table();
        let s = t.pron2.apply(&t.pron.apply("b\u{f8}\u{f8} \u{1ff}n"));
        assert_eq!(s, "bɔ\u{305}ɔ\u{305} ɔn");
    }

    #[test]
    fn default_trims_and_expands_tabs() {
        assert_eq!(table().default.apply(" \ta\tb  "), "a    b");
    }

    #[test]
    fn final_pron_escapes_backslash() {
        assert_eq!(table().final_pron.apply("\\maa"), "&#x5c;maa");
    }

    #[test]
    fn classifier_extracts_thai_in_brackets() {
        assert_eq!(table().classifier.apply("tua (ตัว)"), "ตัว");
        assert_eq!(table().classifier.apply("ตัว"), "ตัว");
    }

    #[test]
    fn spaces_workaround() {
        assert_eq!(table().spaces_workaround_dictbox.apply("maa -kin"), "maa<sp> </sp>kin");
    }

    #[test]
    fn remove_brackets_strips_marks() {
        assert_eq!(table().remove_brackets.apply("(ma\u{301}a)…"), "maa");
    }

    mod idempotence {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn default_is_idempotent(s in "[a-z \t]{0,20}") {
                let t = table();
                let once = t.default.apply(&s);
                prop_assert_eq!(t.default.apply(&once), once);
            }

            #[test]
            fn remove_brackets_is_idempotent(s in "[a-z()\\[\\].…]{0,20}") {
                let t = table();
                let once = t.remove_brackets.apply(&s);
                prop_assert_eq!(t.remove_brackets.apply(&once), once);
            }

            #[test]
            fn type_friendly_2_is_idempotent_on_search_keys(s in "[abcdegimnosuwy -]{0,20}") {
                let t = table();
                let once = t.type_friendly_2.apply(&s);
                prop_assert_eq!(t.type_friendly_2.apply(&once), once);
            }
        }
    }
}
