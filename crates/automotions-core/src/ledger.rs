//! The motion ledger: a plain-text outline of tournament groups, years,
//! rounds, motions and their stat/info lines, one entity per line, nested by
//! indentation.
//!
//! ```text
//! Japan
//! \tJapan BP 2024
//! \t\tR1
//! \t\t\tTHW ban plastic straws
//! \t\t\t\tOG $stats 4, 3, 2, 1
//! \t\t\t\tInfo slide text
//! ```
//!
//! Encoding always indents with tabs. Decoding also accepts groups of four
//! spaces, but not both kinds of indentation on one line. The format does not
//! carry `seq`, `url`, `reference` or raw info-slide markup.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::markup::collapse_ws;
use crate::model::{Motion, MotionStats, Round, RoundMotion, TournamentGroup, TournamentYear};
use crate::normalize::{normalize_info, normalize_motion, normalize_round_name};

pub const STATS_MARKER: &str = "$stats";
pub const MAX_DEPTH: usize = 4;

const GROUP_DEPTH: usize = 0;
const YEAR_DEPTH: usize = 1;
const ROUND_DEPTH: usize = 2;
const MOTION_DEPTH: usize = 3;
const DETAIL_DEPTH: usize = 4;

static STAT_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerParseErrorKind {
    #[error("tabs and spaces mixed in indentation")]
    MixedIndent,
    #[error("depth {0} is out of range (0-4)")]
    DepthOutOfRange(usize),
    #[error("no enclosing {0} for this entry")]
    MissingAncestor(&'static str),
    #[error("malformed stats line")]
    MalformedStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}: {content:?}")]
pub struct LedgerParseError {
    /// 1-based line number.
    pub line: usize,
    pub content: String,
    pub kind: LedgerParseErrorKind,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] LedgerParseError),
    #[error("No tournament group at index {index} (ledger has {available})")]
    GroupOutOfRange { index: usize, available: usize },
    #[error("Position {position} is past the end of group {group:?} ({available} tournaments)")]
    PositionOutOfRange {
        group: String,
        position: usize,
        available: usize,
    },
}

/// Every encoded entry is one physical line with no leading whitespace, so
/// the indentation alone decides its depth on the way back in.
fn indented(depth: usize, content: &str) -> String {
    format!("{}{}", "\t".repeat(depth), collapse_ws(content))
}

/// `Balance $stats 4, 3, 7`
pub fn format_stat_line(stat: &MotionStats) -> String {
    let values: Vec<String> = stat.value.iter().map(|value| value.to_string()).collect();
    format!("{} {} {}", stat.label, STATS_MARKER, values.join(", "))
}

/// Inverse of [`format_stat_line`]; `None` unless the line has exactly one
/// marker, a label and at least one number.
pub fn parse_stat_line(content: &str) -> Option<MotionStats> {
    let (label, values) = content.split_once(STATS_MARKER)?;
    if values.contains(STATS_MARKER) {
        return None;
    }
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    let value = STAT_VALUE
        .find_iter(values)
        .map(|found| found.as_str().parse::<u32>().ok())
        .collect::<Option<Vec<u32>>>()?;
    if value.is_empty() {
        return None;
    }
    Some(MotionStats::new(label, value))
}

pub fn year_to_lines(year: &TournamentYear) -> Vec<String> {
    if year.rounds.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![indented(YEAR_DEPTH, &year.name)];
    for round in year.rounds.iter().filter(|round| !round.motions.is_empty()) {
        lines.push(indented(
            ROUND_DEPTH,
            &normalize_round_name(&round.pretty_name),
        ));
        for round_motion in &round.motions {
            lines.push(indented(
                MOTION_DEPTH,
                &normalize_motion(&round_motion.motion.text),
            ));
            for stat in &round_motion.stats {
                lines.push(indented(DETAIL_DEPTH, &format_stat_line(stat)));
            }
            if !round_motion.motion.info_slide_plain.is_empty() {
                let info = normalize_info(&round_motion.motion.info_slide_plain);
                for line in info.lines().filter(|line| !line.trim().is_empty()) {
                    lines.push(indented(DETAIL_DEPTH, line));
                }
            }
        }
    }
    lines
}

pub fn groups_to_lines(groups: &[TournamentGroup]) -> Vec<String> {
    let mut lines = Vec::new();
    for group in groups {
        lines.push(indented(GROUP_DEPTH, &group.name));
        for year in &group.tournaments {
            lines.extend(year_to_lines(year));
        }
    }
    lines
}

/// Depth and trimmed content of one ledger line. Indentation is a run of tabs
/// or a run of four-space groups; one to three stray spaces after it count as
/// padding.
pub fn measure_indent(line: &str) -> Result<(usize, &str), LedgerParseErrorKind> {
    let bytes = line.as_bytes();
    let mut pos = 0;
    let mut depth = 0;
    match bytes.first() {
        Some(b'\t') => {
            while bytes.get(pos) == Some(&b'\t') {
                depth += 1;
                pos += 1;
            }
            if line[pos..].starts_with("    ") {
                return Err(LedgerParseErrorKind::MixedIndent);
            }
        }
        Some(b' ') => {
            while line[pos..].starts_with("    ") {
                depth += 1;
                pos += 4;
            }
            let padding = line[pos..].len() - line[pos..].trim_start_matches(' ').len();
            if line[pos + padding..].starts_with('\t') {
                return Err(LedgerParseErrorKind::MixedIndent);
            }
        }
        _ => {}
    }
    Ok((depth, line[pos..].trim()))
}

fn last_year(groups: &mut [TournamentGroup]) -> Option<&mut TournamentYear> {
    groups.last_mut()?.tournaments.last_mut()
}

fn last_round(groups: &mut [TournamentGroup]) -> Option<&mut Round> {
    last_year(groups)?.rounds.last_mut()
}

fn last_motion(groups: &mut [TournamentGroup]) -> Option<&mut RoundMotion> {
    last_round(groups)?.motions.last_mut()
}

fn ancestor_name(depth: usize) -> &'static str {
    match depth {
        YEAR_DEPTH => "tournament group",
        ROUND_DEPTH => "tournament year",
        MOTION_DEPTH => "round",
        _ => "motion",
    }
}

/// Rebuild the group tree from ledger text. Each line attaches to the most
/// recent entity one level up; starting an entity closes everything deeper.
pub fn parse_ledger(text: &str) -> Result<Vec<TournamentGroup>, LedgerParseError> {
    let mut groups: Vec<TournamentGroup> = Vec::new();
    // Number of levels that currently have an open entity.
    let mut open_levels = 0;

    for (idx, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let fail = |kind| LedgerParseError {
            line: idx + 1,
            content: raw.to_string(),
            kind,
        };
        let (depth, content) = measure_indent(raw).map_err(fail)?;
        if depth > MAX_DEPTH {
            return Err(fail(LedgerParseErrorKind::DepthOutOfRange(depth)));
        }
        let missing = || fail(LedgerParseErrorKind::MissingAncestor(ancestor_name(depth)));
        if depth > open_levels {
            return Err(missing());
        }

        match depth {
            GROUP_DEPTH => groups.push(TournamentGroup {
                name: content.to_string(),
                tournaments: Vec::new(),
            }),
            YEAR_DEPTH => {
                let group = groups.last_mut().ok_or_else(missing)?;
                group.tournaments.push(TournamentYear {
                    name: content.to_string(),
                    rounds: Vec::new(),
                });
            }
            ROUND_DEPTH => {
                let year = last_year(&mut groups).ok_or_else(missing)?;
                let seq = year.rounds.len() as u32 + 1;
                year.rounds.push(Round {
                    url: String::new(),
                    seq,
                    name: content.to_string(),
                    pretty_name: content.to_string(),
                    motions: Vec::new(),
                });
            }
            MOTION_DEPTH => {
                let round = last_round(&mut groups).ok_or_else(missing)?;
                let seq = round.motions.len() as u32 + 1;
                round.motions.push(RoundMotion {
                    motion: Motion {
                        text: content.to_string(),
                        ..Motion::default()
                    },
                    seq,
                    stats: Vec::new(),
                });
            }
            _ => {
                let round_motion = last_motion(&mut groups).ok_or_else(missing)?;
                if content.contains(STATS_MARKER) {
                    let stat = parse_stat_line(content)
                        .ok_or_else(|| fail(LedgerParseErrorKind::MalformedStats))?;
                    round_motion.stats.push(stat);
                } else {
                    let info = &mut round_motion.motion.info_slide_plain;
                    if !info.is_empty() {
                        info.push('\n');
                    }
                    info.push_str(content);
                }
            }
        }
        if depth < DETAIL_DEPTH {
            open_levels = depth + 1;
        }
    }
    Ok(groups)
}

pub fn read_ledger_file(path: &Path) -> Result<Vec<TournamentGroup>, LedgerError> {
    let text = fs::read_to_string(path)?;
    Ok(parse_ledger(&text)?)
}

/// Lines are joined with `\n` and the file has no trailing newline.
pub fn write_ledger_file(path: &Path, groups: &[TournamentGroup]) -> Result<(), LedgerError> {
    fs::write(path, groups_to_lines(groups).join("\n"))?;
    Ok(())
}

/// Insert `year` into group `group_index` at `position` (0 = first).
pub fn insert_year(
    groups: &mut [TournamentGroup],
    group_index: usize,
    position: usize,
    year: TournamentYear,
) -> Result<(), LedgerError> {
    let available = groups.len();
    let group = groups
        .get_mut(group_index)
        .ok_or(LedgerError::GroupOutOfRange {
            index: group_index,
            available,
        })?;
    if position > group.tournaments.len() {
        return Err(LedgerError::PositionOutOfRange {
            group: group.name.clone(),
            position,
            available: group.tournaments.len(),
        });
    }
    group.tournaments.insert(position, year);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_and_space_indentation_measure_the_same() {
        assert_eq!(
            measure_indent("\t\t\tTHW ban plastic straws."),
            Ok((3, "THW ban plastic straws."))
        );
        assert_eq!(measure_indent("        Quarterfinals"), Ok((2, "Quarterfinals")));
        assert_eq!(measure_indent("Japan"), Ok((0, "Japan")));
        assert_eq!(measure_indent("\t\t\t\t - bullet"), Ok((4, "- bullet")));
        assert_eq!(measure_indent("      six spaces"), Ok((1, "six spaces")));
    }

    #[test]
    fn mixed_indentation_is_rejected() {
        assert_eq!(
            measure_indent("\t    x"),
            Err(LedgerParseErrorKind::MixedIndent)
        );
        assert_eq!(
            measure_indent("    \tx"),
            Err(LedgerParseErrorKind::MixedIndent)
        );
        assert_eq!(
            measure_indent("     \tx"),
            Err(LedgerParseErrorKind::MixedIndent)
        );
    }

    #[test]
    fn stat_lines_have_a_fixed_shape() {
        let stat = MotionStats::new("Balance", vec![4, 3, 7]);
        assert_eq!(format_stat_line(&stat), "Balance $stats 4, 3, 7");
        assert_eq!(parse_stat_line("Balance $stats 4, 3, 7"), Some(stat));
        assert_eq!(parse_stat_line("$stats 1, 2"), None);
        assert_eq!(parse_stat_line("Veto $stats"), None);
        assert_eq!(parse_stat_line("Veto $stats 1 $stats 2"), None);
    }

    #[test]
    fn deep_lines_need_a_live_ancestor() {
        let err = parse_ledger("Japan\n\t\tR1").expect_err("no year");
        assert_eq!(err.line, 2);
        assert_eq!(
            err.kind,
            LedgerParseErrorKind::MissingAncestor("tournament year")
        );

        // A new group closes the previous group's year.
        let err = parse_ledger("A\n\tA 2024\n\t\tR1\nB\n\t\tR2").expect_err("closed year");
        assert_eq!(err.line, 5);
    }

    #[test]
    fn depth_beyond_detail_level_is_rejected() {
        let err = parse_ledger("A\n\tY\n\t\tR1\n\t\t\tTHW x\n\t\t\t\t\tdeep").expect_err("depth 5");
        assert_eq!(err.kind, LedgerParseErrorKind::DepthOutOfRange(5));
    }

    #[test]
    fn malformed_stats_lines_are_rejected() {
        let err = parse_ledger("A\n\tY\n\t\tR1\n\t\t\tTHW x\n\t\t\t\tBalance $stats none")
            .expect_err("no numbers");
        assert_eq!(err.kind, LedgerParseErrorKind::MalformedStats);
    }

    #[test]
    fn blank_lines_are_ignored_and_seq_is_positional() {
        let groups = parse_ledger("A\n\n\tY\n\t\tR1\n\t\t\tTHW x\n   \n\t\t\tTHW y\n").expect("parse");
        let round = &groups[0].tournaments[0].rounds[0];
        assert_eq!(round.seq, 1);
        assert_eq!(round.motions[1].seq, 2);
        assert_eq!(round.motions[1].motion.text, "THW y");
    }

    #[test]
    fn empty_years_and_rounds_are_not_emitted() {
        let year = TournamentYear {
            name: "Empty 2024".to_string(),
            rounds: Vec::new(),
        };
        assert!(year_to_lines(&year).is_empty());

        let year = TournamentYear {
            name: "Sparse 2024".to_string(),
            rounds: vec![Round {
                url: String::new(),
                seq: 1,
                name: "Round 1".to_string(),
                pretty_name: "R1".to_string(),
                motions: Vec::new(),
            }],
        };
        assert_eq!(year_to_lines(&year), vec!["\tSparse 2024".to_string()]);
    }

    #[test]
    fn insert_year_checks_bounds() {
        let mut groups = vec![TournamentGroup {
            name: "Japan".to_string(),
            tournaments: Vec::new(),
        }];
        let year = TournamentYear {
            name: "JBP 2025".to_string(),
            rounds: Vec::new(),
        };
        assert!(matches!(
            insert_year(&mut groups, 1, 0, year.clone()),
            Err(LedgerError::GroupOutOfRange { index: 1, available: 1 })
        ));
        assert!(matches!(
            insert_year(&mut groups, 0, 1, year.clone()),
            Err(LedgerError::PositionOutOfRange { position: 1, .. })
        ));
        insert_year(&mut groups, 0, 0, year).expect("insert");
        assert_eq!(groups[0].tournaments[0].name, "JBP 2025");
    }
}
