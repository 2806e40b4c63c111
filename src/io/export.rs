//! CSV export for measure results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::audit::MeasureResult;

/// Column header for the measure result export.
const HEADER: &str = "index,pass,measure,components,option,required,tier,\
                       pre_mmbtu,post_mmbtu,deduction_mmbtu,savings_mmbtu,\
                       quantity,unit,material,labor,adders,cost,lifetime_years,\
                       annual_dollars,present_worth,sir,committed,\
                       cumulative_cost,cumulative_savings_mmbtu";

/// Exports measure results to a CSV file at the given path.
///
/// One row per result in evaluation order. Produces deterministic output
/// for identical inputs.
///
/// # Arguments
///
/// * `results` - Results in evaluation order
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[MeasureResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes measure results as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[MeasureResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for (i, r) in results.iter().enumerate() {
        wtr.write_record(&[
            i.to_string(),
            r.pass.to_string(),
            r.kind.to_string(),
            r.components.to_string(),
            r.option.clone(),
            r.required.to_string(),
            r.tier.to_string(),
            format!("{:.4}", r.pre.total_mmbtu()),
            format!("{:.4}", r.post.total_mmbtu()),
            format!("{:.4}", r.interaction_deduction.total_mmbtu()),
            format!("{:.4}", r.savings_mmbtu()),
            format!("{:.2}", r.cost.quantity),
            r.cost.unit.to_string(),
            format!("{:.2}", r.cost.material),
            format!("{:.2}", r.cost.labor),
            format!("{:.2}", r.cost.adders),
            format!("{:.2}", r.initial_cost()),
            r.lifetime_years.to_string(),
            format!("{:.2}", r.annual_dollar_savings),
            format!("{:.2}", r.present_worth_savings),
            format!("{:.3}", r.sir),
            r.committed.to_string(),
            format!("{:.2}", r.cumulative_cost),
            format!("{:.4}", r.cumulative_savings_mmbtu),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::PassOrchestrator;
    use crate::config::AuditConfig;
    use crate::dwelling::{DwellingInput, DwellingState};

    fn results() -> Vec<MeasureResult> {
        PassOrchestrator::from_config(AuditConfig::default())
            .unwrap()
            .run(DwellingState::from(DwellingInput::sample()))
            .unwrap()
            .results()
            .to_vec()
    }

    #[test]
    fn header_lists_every_column() {
        let mut buf = Vec::new();
        write_csv(&[], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let first_line = output.lines().next().unwrap_or("");
        assert!(first_line.starts_with("index,pass,measure,components,option"));
        assert_eq!(first_line.split(',').count(), 24);
    }

    #[test]
    fn one_row_per_result() {
        let results = results();
        let mut buf = Vec::new();
        write_csv(&results, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output.lines().count(), results.len() + 1);
    }

    #[test]
    fn deterministic_output() {
        let results = results();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&results, &mut buf1).unwrap();
        write_csv(&results, &mut buf2).unwrap();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn rows_parse_back_with_committed_flags() {
        let results = results();
        let mut buf = Vec::new();
        write_csv(&results, &mut buf).unwrap();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let committed = rdr
            .records()
            .map(|rec| rec.unwrap())
            .filter(|rec| &rec[21] == "true")
            .count();
        assert_eq!(committed, results.iter().filter(|r| r.committed).count());
    }
}
