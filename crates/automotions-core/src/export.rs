use std::io::Write;

use crate::model::TournamentYear;
use crate::normalize::{normalize_info, normalize_motion, round_name_for_table};

pub const TABLE_COLUMNS: usize = 9;

/// One spreadsheet row per motion. The blank columns are filled in by hand
/// downstream (dates, tags, notes).
pub fn table_rows(year: &TournamentYear) -> Vec<[String; TABLE_COLUMNS]> {
    let mut rows = Vec::with_capacity(year.motion_count());
    for round in &year.rounds {
        let round_label = round_name_for_table(&round.pretty_name);
        for round_motion in &round.motions {
            rows.push([
                String::new(),
                String::new(),
                String::new(),
                year.name.clone(),
                round_label.clone(),
                String::new(),
                String::new(),
                normalize_motion(&round_motion.motion.text),
                normalize_info(&round_motion.motion.info_slide_plain),
            ]);
        }
    }
    rows
}

/// Tab-separated rows without a header line.
pub fn write_table<W: Write>(writer: W, year: &TournamentYear) -> Result<(), csv::Error> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);
    for row in table_rows(year) {
        out.write_record(&row)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Motion, Round, RoundMotion};

    fn year() -> TournamentYear {
        TournamentYear {
            name: "Kanto 2025".to_string(),
            rounds: vec![Round {
                url: String::new(),
                seq: 1,
                name: "Round 2: Economy".to_string(),
                pretty_name: "R2: Economy".to_string(),
                motions: vec![RoundMotion {
                    motion: Motion {
                        text: "This House would tax sugar.".to_string(),
                        info_slide_plain: "Sugar  taxes exist".to_string(),
                        ..Motion::default()
                    },
                    seq: 1,
                    stats: Vec::new(),
                }],
            }],
        }
    }

    #[test]
    fn rows_use_terse_round_labels_and_normalized_text() {
        let rows = table_rows(&year());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][3], "Kanto 2025");
        assert_eq!(rows[0][4], "2");
        assert_eq!(rows[0][7], "THW tax sugar");
        assert_eq!(rows[0][8], "Sugar taxes exist");
    }

    #[test]
    fn table_is_tab_separated_without_header() {
        let mut buffer = Vec::new();
        write_table(&mut buffer, &year()).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(
            text,
            "\t\t\tKanto 2025\t2\t\t\tTHW tax sugar\tSugar taxes exist\n"
        );
    }
}
