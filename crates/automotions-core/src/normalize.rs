//! Rule tables that canonicalize motion text, info-slide text and round names.
//!
//! Every table is an ordered list of case-insensitive substitutions. Order is
//! significant: `this house` must become `TH` before the `TH would` family can
//! fire, and the compound `grand final` / `double octofinals` forms must run
//! before the generic `finals` rule swallows them.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use regex::{Regex, RegexBuilder};

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn compile(table: &[(&str, &'static str)]) -> Vec<Rule> {
    table
        .iter()
        .map(|(pattern, replacement)| Rule {
            pattern: RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("regex"),
            replacement,
        })
        .collect()
}

static MOTION_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        (r"\s+", " "),
        (r"\bthis house\b", "TH"),
        (r"\bth believes that\b", "THBT"),
        (r"\bth would\b", "THW"),
        (r"\bth supports\b", "THS"),
        (r"\bth opposes\b", "THO"),
        (r"\bth prefers\b", "THP"),
        (r"\bth regrets\b", "THR"),
        (r"\.$", ""),
        ("\u{201c}", "\""),
        ("\u{201d}", "\""),
        ("\u{2018}", "'"),
        ("\u{2019}", "'"),
        (r"(\S)\(", "${1} ("),
        (r" \)", ")"),
        (r"&amp;", "&"),
        (r"&nbsp;", " "),
    ])
});

static INFO_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        (r"(\r*\n)+", "\n"),
        (r" {2,}", " "),
        (r"(\S)\(", "${1} ("),
        (r" \)", ")"),
        ("\u{201c}", "\""),
        ("\u{201d}", "\""),
        (r"&amp;", "&"),
        (r"&quot;", "\""),
        (r"<.*?>", ""),
        (r"&nbsp;", " "),
    ])
});

static ROUND_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        ("オープン", "Open "),
        ("部門", ""),
        ("準々々々々決勝", "TF"),
        ("準々々々決勝", "OF"),
        ("準々決勝", "QF"),
        ("準決勝", "SF"),
        ("決勝", "GF"),
        ("ラウンド", "R"),
        (r"round ?", "R"),
        (r"novice", "Novice"),
        (r"high school", "HS"),
        (r"open", ""),
        (r"grand[ |-]?finals?", "GF"),
        (r"semi[ |-]?finals?", "SF"),
        (r"semis", "SF"),
        (r"double[ |-]quarter[ |-]?finals?", "OF"),
        (r"quarter[ |-]?finals?", "QF"),
        (r"quarters?", "QF"),
        (r"double[ |-]octo[ |-]?finals?", "DO"),
        (r"octo[ |-]?finals?", "OF"),
        (r"octos", "OF"),
        (r"finals?", "GF"),
        (r"partial[ |-]", "P"),
        (r"pre[ |-]", "Pre "),
    ])
});

static ROUND_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^R(\d+)").expect("regex"));

static ROUND_CACHE: LazyLock<Mutex<HashMap<String, String>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));
static ROUND_TABLE_CACHE: LazyLock<Mutex<HashMap<String, String>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn apply_rules(rules: &[Rule], text: &str) -> String {
    let mut out = text.to_string();
    for rule in rules {
        out = rule
            .pattern
            .replace_all(&out, rule.replacement)
            .into_owned();
    }
    out.trim().to_string()
}

fn memoized(
    cache: &Mutex<HashMap<String, String>>,
    key: &str,
    compute: impl FnOnce(&str) -> String,
) -> String {
    if let Some(hit) = cache
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(key)
    {
        return hit.clone();
    }
    let value = compute(key);
    cache
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(key.to_string(), value.clone());
    value
}

/// Canonical form of a motion line. Applied until stable, so the result is a
/// fixed point of the rule table.
pub fn normalize_motion(text: &str) -> String {
    let mut current = apply_rules(&MOTION_RULES, text);
    loop {
        let next = apply_rules(&MOTION_RULES, &current);
        if next == current {
            return current;
        }
        current = next;
    }
}

pub fn normalize_info(text: &str) -> String {
    apply_rules(&INFO_RULES, text)
}

/// Compact round code, e.g. `Round 3` -> `R3`, `準決勝` -> `SF`.
pub fn normalize_round_name(text: &str) -> String {
    memoized(&ROUND_CACHE, text, |raw| apply_rules(&ROUND_RULES, raw))
}

/// Terse label for table export: the part before any `:` label, reduced to a
/// bare number for numbered rounds.
pub fn round_name_for_table(text: &str) -> String {
    memoized(&ROUND_TABLE_CACHE, text, |raw| {
        let head = raw.split(':').next().unwrap_or_default().trim();
        let parsed = normalize_round_name(head);
        match ROUND_NUMBER.captures(&parsed).and_then(|cap| cap.get(1)) {
            Some(number) => number.as_str().to_string(),
            None => parsed,
        }
    })
}
