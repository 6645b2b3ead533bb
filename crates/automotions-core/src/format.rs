use std::fmt;
use std::str::FromStr;

use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markup::element_children;

/// Layout of a round's statistics block on the results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TournamentFormat {
    /// Two-sided win counts only.
    #[serde(rename = "NA")]
    NorthAmerican,
    /// Win counts plus veto counts.
    #[serde(rename = "Asian")]
    Asian,
    /// Four-way rank distribution per bench.
    #[serde(rename = "BP")]
    BritishParliamentary,
}

impl TournamentFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentFormat::NorthAmerican => "NA",
            TournamentFormat::Asian => "Asian",
            TournamentFormat::BritishParliamentary => "BP",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "na" | "north-american" => Some(Self::NorthAmerican),
            "asian" => Some(Self::Asian),
            "bp" | "british-parliamentary" => Some(Self::BritishParliamentary),
            _ => None,
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| format!("unknown tournament format: {value}"))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("statistics block matches no known layout ({children} children, {grandchildren:?} under the first)")]
pub struct FormatInferenceError {
    pub children: usize,
    pub grandchildren: Option<usize>,
}

/// Decide the layout from the shape of one statistics block.
pub fn infer_format(fragment: ElementRef<'_>) -> Result<TournamentFormat, FormatInferenceError> {
    let children = element_children(fragment);
    match children.as_slice() {
        [only] => {
            let grandchildren = element_children(*only).len();
            match grandchildren {
                2 => Ok(TournamentFormat::NorthAmerican),
                3 => Ok(TournamentFormat::BritishParliamentary),
                _ => Err(FormatInferenceError {
                    children: 1,
                    grandchildren: Some(grandchildren),
                }),
            }
        }
        [_, _] => Ok(TournamentFormat::Asian),
        _ => Err(FormatInferenceError {
            children: children.len(),
            grandchildren: children
                .first()
                .map(|first| element_children(*first).len()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn infer(html: &str) -> Result<TournamentFormat, FormatInferenceError> {
        let fragment = Html::parse_fragment(html);
        let selector = Selector::parse("div.row").expect("selector");
        let row = fragment.select(&selector).next().expect("row");
        infer_format(row)
    }

    #[test]
    fn one_child_with_two_counters_is_north_american() {
        let html = r#"<div class="row"><div class="col"><span>3 aff</span><span>2 neg</span></div></div>"#;
        assert_eq!(infer(html), Ok(TournamentFormat::NorthAmerican));
    }

    #[test]
    fn one_child_with_three_parts_is_british_parliamentary() {
        let html = r#"<div class="row"><div class="col"><div></div><div></div><div></div></div></div>"#;
        assert_eq!(infer(html), Ok(TournamentFormat::BritishParliamentary));
    }

    #[test]
    fn two_children_is_asian() {
        let html = r#"<div class="row"><div class="col-6"></div><div class="col-6"></div></div>"#;
        assert_eq!(infer(html), Ok(TournamentFormat::Asian));
    }

    #[test]
    fn other_shapes_are_rejected() {
        assert_eq!(
            infer(r#"<div class="row"> </div>"#),
            Err(FormatInferenceError {
                children: 0,
                grandchildren: None
            })
        );
        assert_eq!(
            infer(r#"<div class="row"><div><span></span></div></div>"#),
            Err(FormatInferenceError {
                children: 1,
                grandchildren: Some(1)
            })
        );
        assert!(infer(r#"<div class="row"><div></div><div></div><div></div></div>"#).is_err());
    }

    #[test]
    fn wire_names_round_trip_through_parse() {
        for format in [
            TournamentFormat::NorthAmerican,
            TournamentFormat::Asian,
            TournamentFormat::BritishParliamentary,
        ] {
            assert_eq!(TournamentFormat::parse(format.as_str()), Some(format));
        }
        assert_eq!(TournamentFormat::parse("worlds"), None);
    }
}
