use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use automotions_core::ledger::{
    groups_to_lines, insert_year, parse_ledger, read_ledger_file, write_ledger_file,
};
use automotions_core::markup::info_slide_to_plain;
use automotions_core::model::{
    Motion, MotionStats, Round, RoundMotion, TournamentGroup, TournamentYear,
};

fn round_motion(seq: u32, text: &str, stats: Vec<MotionStats>, info: &str) -> RoundMotion {
    RoundMotion {
        motion: Motion {
            url: format!("https://tab.example/motions/{seq}"),
            text: text.to_string(),
            reference: format!("M{seq}"),
            info_slide: format!("<p>{info}</p>"),
            info_slide_plain: info.to_string(),
        },
        seq,
        stats,
    }
}

fn round(seq: u32, name: &str, motions: Vec<RoundMotion>) -> Round {
    Round {
        url: format!("https://tab.example/rounds/{seq}"),
        seq,
        name: name.to_string(),
        pretty_name: name.to_string(),
        motions,
    }
}

fn sample_groups() -> Vec<TournamentGroup> {
    vec![
        TournamentGroup {
            name: "Japan".to_string(),
            tournaments: vec![TournamentYear {
                name: "JPDU Autumn 2024".to_string(),
                rounds: vec![
                    round(
                        1,
                        "R1",
                        vec![
                            round_motion(
                                1,
                                "THW ban plastic straws",
                                vec![
                                    MotionStats::new("Balance", vec![4, 3, 7]),
                                    MotionStats::new("Veto", vec![1, 2, 14]),
                                ],
                                "Straws are used widely.\nSome cities have bans",
                            ),
                            round_motion(
                                2,
                                "THR the rise of influencers",
                                vec![MotionStats::new("Balance", vec![0, 0, 7])],
                                "",
                            ),
                        ],
                    ),
                    round(
                        2,
                        "GF",
                        vec![round_motion(
                            1,
                            "THBT history is written by the victors",
                            vec![
                                MotionStats::new("OG", vec![1, 0, 0, 0]),
                                MotionStats::new("OO", vec![0, 1, 0, 0]),
                                MotionStats::new("CG", vec![0, 0, 1, 0]),
                                MotionStats::new("CO", vec![0, 0, 0, 1]),
                            ],
                            "",
                        )],
                    ),
                ],
            }],
        },
        TournamentGroup {
            name: "World".to_string(),
            tournaments: Vec::new(),
        },
    ]
}

/// Drop the fields the ledger does not carry.
fn comparable(groups: &[TournamentGroup]) -> Vec<TournamentGroup> {
    let mut groups = groups.to_vec();
    for group in &mut groups {
        for year in &mut group.tournaments {
            for (r_idx, round) in year.rounds.iter_mut().enumerate() {
                round.url.clear();
                round.seq = r_idx as u32 + 1;
                for (m_idx, round_motion) in round.motions.iter_mut().enumerate() {
                    round_motion.seq = m_idx as u32 + 1;
                    round_motion.motion.url.clear();
                    round_motion.motion.reference.clear();
                    round_motion.motion.info_slide.clear();
                }
            }
        }
    }
    groups
}

#[test]
fn encoding_uses_tab_depths_and_stat_lines() {
    let lines = groups_to_lines(&sample_groups());
    assert_eq!(
        lines[..7].to_vec(),
        [
            "Japan",
            "\tJPDU Autumn 2024",
            "\t\tR1",
            "\t\t\tTHW ban plastic straws",
            "\t\t\t\tBalance $stats 4, 3, 7",
            "\t\t\t\tVeto $stats 1, 2, 14",
            "\t\t\t\tStraws are used widely.",
        ]
    );
    assert_eq!(lines.last().map(String::as_str), Some("World"));
}

#[test]
fn decode_of_encode_preserves_persisted_fields() {
    let groups = sample_groups();
    let text = groups_to_lines(&groups).join("\n");
    let decoded = parse_ledger(&text).expect("parse");
    assert_eq!(decoded, comparable(&groups));
}

#[test]
fn multi_line_and_tab_led_text_stays_on_its_own_depth() {
    let mut groups = sample_groups();
    {
        let round_motion = &mut groups[0].tournaments[0].rounds[0].motions[1];
        round_motion.motion.text = "THW ban zoos\nin cities".to_string();
        round_motion.motion.info_slide_plain =
            info_slide_to_plain("<p>Context:\n\tNGOs run most shelters.</p>");
    }
    groups[0].tournaments[0].name = "JPDU\nAutumn 2024".to_string();

    let lines = groups_to_lines(&groups);
    assert!(lines.iter().all(|line| !line.contains('\n')));
    assert!(lines
        .iter()
        .all(|line| !line.trim_start_matches('\t').starts_with(char::is_whitespace)));

    let decoded = parse_ledger(&lines.join("\n")).expect("self-written ledger parses");
    let names: Vec<&str> = decoded.iter().map(|group| group.name.as_str()).collect();
    assert_eq!(names, ["Japan", "World"]);
    let year = &decoded[0].tournaments[0];
    assert_eq!(year.name, "JPDU Autumn 2024");
    let round_motion = &year.rounds[0].motions[1];
    assert_eq!(round_motion.motion.text, "THW ban zoos in cities");
    assert_eq!(
        round_motion.motion.info_slide_plain,
        "Context:\nNGOs run most shelters."
    );
    assert_eq!(round_motion.stats, vec![MotionStats::new("Balance", vec![0, 0, 7])]);

    assert_eq!(groups_to_lines(&decoded), lines);
}

#[test]
fn space_indented_ledgers_decode_like_tab_indented_ones() {
    let tabs = "Japan\n\tOpen 2023\n\t\tQF\n\t\t\tTHW ban plastic straws.\n\t\t\t\tBalance $stats 4, 3, 7";
    let spaces = tabs.replace('\t', "    ");
    assert_eq!(
        parse_ledger(&spaces).expect("spaces"),
        parse_ledger(tabs).expect("tabs")
    );
    let groups = parse_ledger(tabs).expect("tabs");
    let motion = &groups[0].tournaments[0].rounds[0].motions[0];
    assert_eq!(motion.motion.text, "THW ban plastic straws.");
    assert_eq!(motion.stats, vec![MotionStats::new("Balance", vec![4, 3, 7])]);
}

#[test]
fn ledger_files_round_trip_and_accept_inserted_years() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("japan.txt");
    write_ledger_file(&path, &sample_groups()).expect("write");
    let written = fs::read_to_string(&path).expect("read");
    assert!(written.starts_with("Japan\n\tJPDU Autumn 2024\n"));
    assert!(!written.ends_with('\n'));

    let mut groups = read_ledger_file(&path).expect("read ledger");
    let new_year = TournamentYear {
        name: "JPDU Spring 2025".to_string(),
        rounds: vec![round(
            1,
            "Round 1",
            vec![round_motion(1, "This House would abolish homework.", Vec::new(), "")],
        )],
    };
    insert_year(&mut groups, 0, 0, new_year).expect("insert");
    write_ledger_file(&path, &groups).expect("rewrite");

    let reread = read_ledger_file(&path).expect("reread");
    let years: Vec<&str> = reread[0]
        .tournaments
        .iter()
        .map(|year| year.name.as_str())
        .collect();
    assert_eq!(years, ["JPDU Spring 2025", "JPDU Autumn 2024"]);
    let inserted = &reread[0].tournaments[0].rounds[0];
    assert_eq!(inserted.name, "R1");
    assert_eq!(inserted.motions[0].motion.text, "THW abolish homework");
}

#[test]
fn parse_errors_name_the_offending_line() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("broken.txt");
    fs::write(&path, "Japan\n\t\t\tTHW orphaned motion").expect("write");
    let err = read_ledger_file(&path).expect_err("orphan");
    let message = err.to_string();
    assert!(message.contains("line 2"), "{message}");
    assert!(message.contains("THW orphaned motion"), "{message}");
}
