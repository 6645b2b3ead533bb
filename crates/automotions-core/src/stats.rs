use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use thiserror::Error;

use crate::format::TournamentFormat;
use crate::markup::{
    element_children, element_text, first_element_child, is_tag_with_class, last_element_child,
    leading_count,
};
use crate::model::{MotionStats, BALANCE_LABEL, VETO_LABEL};

pub const BENCH_POSITIONS: [&str; 4] = ["OG", "OO", "CG", "CO"];

static NA_AFF: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.text-aff.pr-1.d-md-inline.d-block").expect("selector")
});
static NA_NEG: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.text-neg.pr-1.d-md-inline.d-block").expect("selector")
});
static AFF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.text-aff").expect("selector"));
static NEG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.text-neg").expect("selector"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsExtractionError {
    #[error("{format} statistics: missing {element}")]
    MissingElement {
        format: TournamentFormat,
        element: &'static str,
    },
    #[error("{format} statistics: expected 4 bench bars, found {found}")]
    BenchCount {
        format: TournamentFormat,
        found: usize,
    },
    #[error("{format} statistics: no leading count in {text:?}")]
    BadCount {
        format: TournamentFormat,
        text: String,
    },
}

/// Read the stat entries of one statistics block laid out as `format`.
pub fn extract_stats(
    format: TournamentFormat,
    fragment: ElementRef<'_>,
) -> Result<Vec<MotionStats>, StatsExtractionError> {
    match format {
        TournamentFormat::NorthAmerican => extract_north_american(fragment),
        TournamentFormat::Asian => extract_asian(fragment),
        TournamentFormat::BritishParliamentary => extract_british_parliamentary(fragment),
    }
}

fn count_of(format: TournamentFormat, element: ElementRef<'_>) -> Result<u32, StatsExtractionError> {
    let text = element_text(element);
    leading_count(&text).ok_or(StatsExtractionError::BadCount { format, text })
}

fn required<'a>(
    format: TournamentFormat,
    scope: ElementRef<'a>,
    selector: &Selector,
    element: &'static str,
) -> Result<ElementRef<'a>, StatsExtractionError> {
    scope
        .select(selector)
        .next()
        .ok_or(StatsExtractionError::MissingElement { format, element })
}

fn extract_north_american(fragment: ElementRef<'_>) -> Result<Vec<MotionStats>, StatsExtractionError> {
    let format = TournamentFormat::NorthAmerican;
    let aff = required(format, fragment, &NA_AFF, "affirmative counter")?;
    let neg = required(format, fragment, &NA_NEG, "negative counter")?;
    Ok(vec![MotionStats::new(
        BALANCE_LABEL,
        vec![count_of(format, aff)?, count_of(format, neg)?],
    )])
}

fn extract_asian(fragment: ElementRef<'_>) -> Result<Vec<MotionStats>, StatsExtractionError> {
    let format = TournamentFormat::Asian;
    let wins = first_element_child(fragment).ok_or(StatsExtractionError::MissingElement {
        format,
        element: "wins block",
    })?;
    let vetoes = last_element_child(fragment).ok_or(StatsExtractionError::MissingElement {
        format,
        element: "vetoes block",
    })?;
    let aff_wins = required(format, wins, &AFF, "affirmative wins")?;
    let neg_wins = required(format, wins, &NEG, "negative wins")?;
    let optional = |selector: &Selector| -> Result<u32, StatsExtractionError> {
        match vetoes.select(selector).next() {
            Some(element) => count_of(format, element),
            None => Ok(0),
        }
    };
    Ok(vec![
        MotionStats::new(
            BALANCE_LABEL,
            vec![count_of(format, aff_wins)?, count_of(format, neg_wins)?],
        ),
        MotionStats::new(VETO_LABEL, vec![optional(&AFF)?, optional(&NEG)?]),
    ])
}

fn extract_british_parliamentary(
    fragment: ElementRef<'_>,
) -> Result<Vec<MotionStats>, StatsExtractionError> {
    let format = TournamentFormat::BritishParliamentary;
    let bars_block = first_element_child(fragment)
        .and_then(last_element_child)
        .ok_or(StatsExtractionError::MissingElement {
            format,
            element: "bench bar container",
        })?;
    let bars: Vec<ElementRef<'_>> = element_children(bars_block)
        .into_iter()
        .flat_map(element_children)
        .filter(|element| is_tag_with_class(*element, "div", "progress"))
        .collect();
    if bars.len() != BENCH_POSITIONS.len() {
        return Err(StatsExtractionError::BenchCount {
            format,
            found: bars.len(),
        });
    }

    let mut stats = Vec::with_capacity(BENCH_POSITIONS.len());
    for (position, bar) in BENCH_POSITIONS.iter().zip(bars) {
        let mut ranks = Vec::new();
        for segment in element_children(bar) {
            let title = segment
                .value()
                .attr("title")
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .ok_or(StatsExtractionError::MissingElement {
                    format,
                    element: "rank title",
                })?;
            let count = leading_count(title).ok_or_else(|| StatsExtractionError::BadCount {
                format,
                text: title.to_string(),
            })?;
            ranks.push(count);
        }
        stats.push(MotionStats::new(*position, ranks));
    }
    Ok(stats)
}
