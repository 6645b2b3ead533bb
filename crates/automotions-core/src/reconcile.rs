//! Joins API rounds and motions with the statistics scraped from a results
//! page.
//!
//! The API is the source of truth for which rounds and motions exist; the page
//! only contributes numbers. Every scraped block must land on exactly one known
//! motion, so any disagreement aborts the run instead of guessing.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiMotion, ApiRound};
use crate::format::{infer_format, FormatInferenceError, TournamentFormat};
use crate::markup::{
    collapse_ws, direct_text, element_children, element_text, info_slide_to_plain,
    is_tag_with_class, last_element_child,
};
use crate::model::{Motion, MotionStats, Round, RoundMotion, TournamentYear, BALANCE_LABEL};
use crate::normalize::normalize_round_name;
use crate::similarity::ratio;
use crate::stats::{extract_stats, StatsExtractionError};

/// A scraped heading must be strictly more similar than this to its motion.
pub const MATCH_THRESHOLD: f64 = 0.9;
const NEAR_TIE_MARGIN: f64 = 0.05;

static ROUND_TILES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.container-fluid > div:last-child > div.col > div.list-group.mt-3")
        .expect("selector")
});
static ROUND_BADGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.badge.badge-secondary").expect("selector"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h4").expect("selector"));
static REFERENCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("small.text-muted").expect("selector"));

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),
    #[error(transparent)]
    FormatInference(#[from] FormatInferenceError),
    #[error(transparent)]
    StatsExtraction(#[from] StatsExtractionError),
}

fn mismatch(message: impl Into<String>) -> ReconcileError {
    ReconcileError::StructuralMismatch(message.into())
}

/// One motion block of the statistics page.
#[derive(Debug)]
struct ScrapedMotion<'a> {
    heading: String,
    reference: String,
    stats: ElementRef<'a>,
}

fn parse_motion_tile(tile: ElementRef<'_>) -> Result<ScrapedMotion<'_>, ReconcileError> {
    let heading = tile
        .select(&HEADING)
        .next()
        .ok_or_else(|| mismatch("motion block without a heading"))?;
    let reference_text = heading
        .select(&REFERENCE)
        .next()
        .map(element_text)
        .ok_or_else(|| mismatch(format!("motion {:?} has no reference", direct_text(heading))))?;
    let reference = reference_text
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(&reference_text)
        .trim()
        .to_string();
    let stats = last_element_child(tile)
        .filter(|row| is_tag_with_class(*row, "div", "row"))
        .ok_or_else(|| mismatch(format!("motion {reference:?} has no statistics row")))?;
    Ok(ScrapedMotion {
        heading: direct_text(heading),
        reference,
        stats,
    })
}

/// Index of the motion in `round` that the scraped heading refers to.
///
/// The best-scoring motion wins (first one on ties). It is accepted only when
/// its reference matches and its score clears [`MATCH_THRESHOLD`].
pub fn select_motion(round: &Round, heading: &str, reference: &str) -> Result<usize, ReconcileError> {
    let heading = collapse_ws(heading);
    let mut best: Option<(usize, f64)> = None;
    let mut runner_up: Option<f64> = None;
    for (idx, candidate) in round.motions.iter().enumerate() {
        let score = ratio(&heading, &collapse_ws(&candidate.motion.text));
        match best {
            Some((_, best_score)) if score <= best_score => {
                runner_up = Some(runner_up.map_or(score, |prev| prev.max(score)));
            }
            _ => {
                if let Some((_, displaced)) = best {
                    runner_up = Some(runner_up.map_or(displaced, |prev| prev.max(displaced)));
                }
                best = Some((idx, score));
            }
        }
    }

    let (idx, score) = best.ok_or_else(|| {
        mismatch(format!(
            "round {:?} has no API motions to match {heading:?}",
            round.name
        ))
    })?;
    let chosen = &round.motions[idx].motion;
    if chosen.reference != reference {
        return Err(mismatch(format!(
            "reference mismatch in round {:?}: page says {reference:?}, closest motion is {:?}",
            round.name, chosen.reference
        )));
    }
    if score <= MATCH_THRESHOLD {
        return Err(mismatch(format!(
            "motion text mismatch in round {:?} for {reference:?}: similarity {score:.3}",
            round.name
        )));
    }
    if let Some(second) = runner_up {
        if score - second < NEAR_TIE_MARGIN {
            warn!(
                round = %round.name,
                reference,
                score,
                runner_up = second,
                "motion match is close to the runner-up"
            );
        }
    }
    Ok(idx)
}

/// Asian rounds only show motions that were debated. Give undebated motions an
/// empty balance, then append the round's room total to every balance and
/// twice that to every veto.
pub fn fill_asian_gaps(round: &mut Round) {
    let mut total_rooms = 0;
    for round_motion in &mut round.motions {
        if round_motion.balance().is_none() {
            round_motion
                .stats
                .insert(0, MotionStats::new(BALANCE_LABEL, vec![0, 0]));
        }
        if let Some(balance) = round_motion.balance() {
            total_rooms += balance.value.iter().take(2).sum::<u32>();
        }
    }
    for round_motion in &mut round.motions {
        for stat in &mut round_motion.stats {
            if stat.is_balance() {
                stat.value.push(total_rooms);
            } else if stat.is_veto() {
                stat.value.push(total_rooms * 2);
            }
        }
    }
}

/// Reconciliation state for one tournament.
#[derive(Debug, Clone)]
pub struct MotionReconciler {
    format: Option<TournamentFormat>,
    rounds: Vec<Round>,
}

impl MotionReconciler {
    /// Build the round/motion skeleton from API records. `format` pins the
    /// statistics layout; `None` infers it from the first block on the page.
    pub fn from_api(
        rounds: &[ApiRound],
        motions: &[ApiMotion],
        format: Option<TournamentFormat>,
    ) -> Self {
        let mut built: Vec<Round> = rounds
            .iter()
            .map(|round| Round {
                url: round.url.clone(),
                seq: round.seq,
                name: round.name.clone(),
                pretty_name: normalize_round_name(&round.name),
                motions: Vec::new(),
            })
            .collect();

        for api_motion in motions {
            let motion = Motion {
                url: api_motion.url.clone(),
                text: api_motion.text.clone(),
                reference: api_motion.reference.clone(),
                info_slide: api_motion.info_slide.clone(),
                info_slide_plain: info_slide_to_plain(&api_motion.info_slide),
            };
            for link in &api_motion.rounds {
                match built.iter_mut().find(|round| round.url == link.round) {
                    Some(round) => round.motions.push(RoundMotion {
                        motion: motion.clone(),
                        seq: link.seq,
                        stats: Vec::new(),
                    }),
                    None => debug!(
                        motion = %api_motion.url,
                        round = %link.round,
                        "motion refers to an unknown round"
                    ),
                }
            }
        }

        built.sort_by_key(|round| round.seq);
        for round in &mut built {
            round.motions.sort_by_key(|round_motion| round_motion.seq);
        }
        debug!(
            rounds = built.len(),
            motions = motions.len(),
            "built round skeleton"
        );
        Self {
            format,
            rounds: built,
        }
    }

    pub fn format(&self) -> Option<TournamentFormat> {
        self.format
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Walk every round block of the statistics page and attach its numbers.
    pub fn apply_statistics_page(&mut self, html: &str) -> Result<(), ReconcileError> {
        let document = Html::parse_document(html);
        for tile in document.select(&ROUND_TILES) {
            self.apply_round_tile(tile)?;
        }
        Ok(())
    }

    fn apply_round_tile(&mut self, tile: ElementRef<'_>) -> Result<(), ReconcileError> {
        let name = tile
            .select(&ROUND_BADGE)
            .next()
            .map(element_text)
            .ok_or_else(|| mismatch("round block without a name badge"))?;
        let round_idx = self
            .rounds
            .iter()
            .position(|round| round.name == name)
            .ok_or_else(|| mismatch(format!("page round {name:?} is not in the API rounds")))?;

        for motion_tile in element_children(tile).into_iter().skip(1) {
            let scraped = parse_motion_tile(motion_tile)?;
            let format = self.resolve_format(scraped.stats)?;
            let round = &mut self.rounds[round_idx];
            let idx = select_motion(round, &scraped.heading, &scraped.reference)?;
            round.motions[idx].stats = extract_stats(format, scraped.stats)?;
        }

        let round = &mut self.rounds[round_idx];
        if self.format == Some(TournamentFormat::Asian) {
            fill_asian_gaps(round);
        }
        debug!(round = %round.name, motions = round.motions.len(), "reconciled round");
        Ok(())
    }

    fn resolve_format(&mut self, fragment: ElementRef<'_>) -> Result<TournamentFormat, ReconcileError> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        let format = infer_format(fragment)?;
        info!(%format, "inferred tournament format");
        self.format = Some(format);
        Ok(format)
    }

    pub fn into_year(self, name: impl Into<String>) -> TournamentYear {
        TournamentYear {
            name: name.into(),
            rounds: self.rounds,
        }
    }
}

/// Build the skeleton, apply the statistics page and return the year.
pub fn reconcile(
    name: &str,
    rounds: &[ApiRound],
    motions: &[ApiMotion],
    statistics_html: &str,
    format: Option<TournamentFormat>,
) -> Result<TournamentYear, ReconcileError> {
    let mut reconciler = MotionReconciler::from_api(rounds, motions, format);
    reconciler.apply_statistics_page(statistics_html)?;
    Ok(reconciler.into_year(name))
}
