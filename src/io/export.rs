//! CSV export of dispatch schedules.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::dispatch::DispatchReport;

/// Column header of the schedule export.
const HEADER: &str = "hour,price,charge_mw,discharge_mw,net_action_mw,\
                      soc_mwh,profit,cumulative_profit";

/// Exports the hourly schedule of `report` to a CSV file at the given path.
///
/// Writes a header row followed by one row per hour. `soc_mwh` is the state
/// of charge at the end of the hour. Produces identical bytes for identical
/// reports.
///
/// # Arguments
///
/// * `report` - Report of an optimal run
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(report: &DispatchReport, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(report, buf)
}

/// Writes the hourly schedule as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(report: &DispatchReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in report.rows() {
        wtr.write_record(&[
            r.hour.to_string(),
            format!("{:.4}", r.price),
            format!("{:.6}", r.charge_mw),
            format!("{:.6}", r.discharge_mw),
            format!("{:.6}", r.net_action_mw),
            format!("{:.6}", r.soc_mwh),
            format!("{:.4}", r.profit),
            format!("{:.4}", r.cumulative_profit),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Engine, GoodLpSolver, SimulationConfig};
    use crate::market::PriceSeries;

    fn toy_report() -> DispatchReport {
        let cfg = SimulationConfig {
            capacity_mwh: 10.0,
            max_power_mw: 5.0,
            efficiency: 1.0,
            degradation_cost: 0.0,
            horizon_hours: 3,
            ..SimulationConfig::default()
        };
        let prices = PriceSeries::from_values(vec![10.0, 100.0, 10.0]).unwrap();
        Engine::new(GoodLpSolver::default())
            .run_with_prices(&cfg, &prices)
            .unwrap()
            .into_report()
            .unwrap()
    }

    fn render(report: &DispatchReport) -> String {
        let mut buf = Vec::new();
        write_csv(report, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_lists_schedule_columns() {
        let output = render(&toy_report());
        assert_eq!(
            output.lines().next(),
            Some("hour,price,charge_mw,discharge_mw,net_action_mw,soc_mwh,profit,cumulative_profit")
        );
    }

    #[test]
    fn one_row_per_hour() {
        let output = render(&toy_report());
        // 1 header + 3 data rows
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn deterministic_output() {
        let report = toy_report();
        assert_eq!(render(&report), render(&report));
    }

    #[test]
    fn rows_parse_back_as_numbers() {
        let output = render(&toy_report());
        let mut rdr = csv::ReaderBuilder::new().from_reader(output.as_bytes());
        assert_eq!(rdr.headers().map(csv::StringRecord::len).ok(), Some(8));

        let mut last_cumulative = 0.0;
        for record in rdr.records() {
            let rec = record.unwrap();
            for i in 1..8 {
                assert!(rec[i].parse::<f64>().is_ok(), "column {i} should parse as f64");
            }
            last_cumulative = rec[7].parse::<f64>().unwrap();
        }
        assert!((last_cumulative - 450.0).abs() < 1e-3);
    }
}
