use crate::workflows::allocation::SubmissionRow;
use std::io::Read;

/// Leading columns before the preference cells: time, name, class.
const LEADING_COLUMNS: usize = 3;

#[derive(Debug)]
pub(crate) struct SubmissionRecord {
    pub(crate) line: u64,
    pub(crate) row: SubmissionRow,
}

/// Reads positional submission records. The header line is skipped and its names ignored.
pub(crate) fn parse_submissions<R: Read>(reader: R) -> Result<Vec<SubmissionRecord>, csv::Error> {
    let mut csv_reader = csv_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|position| position.line()).unwrap_or(0);
        records.push(SubmissionRecord {
            line,
            row: submission_row(&record),
        });
    }

    Ok(records)
}

/// Historical allocation rows as `(name, allocations joined by a space)`.
pub(crate) fn parse_history<R: Read>(reader: R) -> Result<Vec<(String, String)>, csv::Error> {
    let mut csv_reader = csv_reader(reader);
    let mut entries = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let name = record.get(0).unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let clubs: Vec<&str> = record.iter().skip(2).collect();
        entries.push((name.to_string(), clubs.join(" ")));
    }

    Ok(entries)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Splits a record into `Time, Name, Class, preferences.., Count`.
///
/// Short records keep whatever cells exist so validation can report the problem.
fn submission_row(record: &csv::StringRecord) -> SubmissionRow {
    let cell = |index: usize| record.get(index).unwrap_or_default().to_string();
    let width = record.len();

    let (preferences, count) = if width > LEADING_COLUMNS {
        let last = width - 1;
        let preferences = (LEADING_COLUMNS..last).map(cell).collect();
        (preferences, cell(last))
    } else {
        (Vec::new(), String::new())
    };

    SubmissionRow {
        time: cell(0),
        name: cell(1),
        class: cell(2),
        preferences,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn positional_columns_map_onto_row() {
        let csv = "Timestamp,Pupil,Form,A,B,C,How many\n\
2019/05/01 9:00:00 am , Amy Smith ,P5A,Chess (Friday) - Mr Brown,,Art (Monday) - Ms Lee,2\n";
        let records = parse_submissions(Cursor::new(csv)).expect("parses");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, 2);
        let row = &records[0].row;
        assert_eq!(row.time, "2019/05/01 9:00:00 am");
        assert_eq!(row.name, "Amy Smith");
        assert_eq!(row.class, "P5A");
        assert_eq!(
            row.preferences,
            vec![
                "Chess (Friday) - Mr Brown".to_string(),
                String::new(),
                "Art (Monday) - Ms Lee".to_string(),
            ]
        );
        assert_eq!(row.count, "2");
    }

    #[test]
    fn short_record_has_no_preferences() {
        let records = parse_submissions(Cursor::new("h1,h2,h3\nx,y,z\n")).expect("parses");
        assert!(records[0].row.preferences.is_empty());
        assert!(records[0].row.count.is_empty());
    }

    #[test]
    fn history_joins_allocation_columns() {
        let csv = "Name,Class,Term 1,Term 2\nAmy Smith,P5A,Chess (Friday),Art (Monday) and Drama (Tuesday)\n,P4B,x,y\n";
        let entries = parse_history(Cursor::new(csv)).expect("parses");
        assert_eq!(
            entries,
            vec![(
                "Amy Smith".to_string(),
                "Chess (Friday) Art (Monday) and Drama (Tuesday)".to_string()
            )]
        );
    }
}
