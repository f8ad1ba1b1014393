//! CSV exports of a finished session.
//!
//! The pupils sheet doubles as next session's history input.

use crate::workflows::allocation::{AllocationSession, ClubKey};
use std::io::Write;

/// One row per pupil: display name, class, then one column per term band.
pub fn write_pupils_csv<W: Write>(
    session: &AllocationSession,
    writer: W,
) -> Result<(), csv::Error> {
    let bands = session.clubs().max_term_band();
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["Name".to_string(), "Class".to_string()];
    header.extend((1..=bands).map(|band| format!("Term {band}")));
    csv_writer.write_record(&header)?;

    for pupil in session.pupils().iter() {
        let mut record = vec![pupil.display_name(), pupil.class_label().to_string()];
        record.extend((1..=bands).map(|band| band_allocations(pupil.allocated(), band)));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// One column per club, members listed down the column in allocation order.
pub fn write_clubs_csv<W: Write>(
    session: &AllocationSession,
    writer: W,
) -> Result<(), csv::Error> {
    let clubs: Vec<_> = session.clubs().iter().collect();
    let mut csv_writer = csv::Writer::from_writer(writer);

    if clubs.is_empty() {
        csv_writer.flush()?;
        return Ok(());
    }

    csv_writer.write_record(clubs.iter().map(|club| club.key().to_string()))?;

    let depth = clubs
        .iter()
        .map(|club| club.allocated().len())
        .max()
        .unwrap_or(0);
    for index in 0..depth {
        csv_writer.write_record(
            clubs
                .iter()
                .map(|club| club.allocated().get(index).map(String::as_str).unwrap_or("")),
        )?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn band_allocations(allocated: &[ClubKey], band: u32) -> String {
    allocated
        .iter()
        .filter(|key| key.term_band == band)
        .map(|key| format!("{} ({})", key.name, key.weekday))
        .collect::<Vec<_>>()
        .join(" and ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::allocation::{AllocationEngine, HistoricalAllocations, SubmissionRow};

    fn session() -> AllocationSession {
        let rows = vec![
            SubmissionRow {
                time: "2019/05/01 9:00:00 am".to_string(),
                name: "amy SMITH".to_string(),
                class: "P5A".to_string(),
                preferences: vec![
                    "Chess (Friday) - Mr Brown".to_string(),
                    "Art (Monday) - Ms Lee".to_string(),
                    String::new(),
                    "Drama (Tuesday) - Mr Kay".to_string(),
                    String::new(),
                    String::new(),
                ],
                count: "3".to_string(),
            },
            SubmissionRow {
                time: "2019/05/01 9:30:00 am".to_string(),
                name: "Ben".to_string(),
                class: "P4B".to_string(),
                preferences: vec![
                    "Chess (Friday) - Mr Brown".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                ],
                count: "1".to_string(),
            },
        ];
        let mut session =
            AllocationSession::from_rows(&rows, 5, &HistoricalAllocations::new()).expect("valid");
        session.allocate(&AllocationEngine::new());
        session
    }

    #[test]
    fn pupils_csv_groups_allocations_by_term_band() {
        let mut buffer = Vec::new();
        write_pupils_csv(&session(), &mut buffer).expect("writes");
        let text = String::from_utf8(buffer).expect("utf8");

        assert_eq!(
            text,
            "Name,Class,Term 1,Term 2\n\
Amy Smith,P5A,Chess (Friday) and Art (Monday),Drama (Tuesday)\n\
Ben,P4B,Chess (Friday),\n"
        );
    }

    #[test]
    fn clubs_csv_lists_members_per_column() {
        let mut buffer = Vec::new();
        write_clubs_csv(&session(), &mut buffer).expect("writes");
        let text = String::from_utf8(buffer).expect("utf8");

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Art (Monday) term 1,Chess (Friday) term 1,Drama (Tuesday) term 2")
        );
        assert_eq!(lines.next(), Some("amy SMITH,amy SMITH,amy SMITH"));
        assert_eq!(lines.next(), Some(",Ben,"));
        assert_eq!(lines.next(), None);
    }
}
