//! `ecobench compare`: join two captures and print the comparison views.

use std::path::{Path, PathBuf};

use ecobench_core::{
    CompareConfig, ExportFormat, JoinKind, VALIDATION_BANNER, export_table, run_comparison,
};

use super::CommandResult;

pub struct CompareCommandConfig<'a> {
    pub left: &'a str,
    pub right: &'a str,
    pub timestamp_column: &'a str,
    pub total_column: &'a str,
    pub process_column: &'a str,
    pub suffixes: (String, String),
    pub sum_column: &'a str,
    pub outer: bool,
    pub output_path: Option<&'a str>,
    pub format: Option<&'a str>,
    pub summary_path: Option<&'a str>,
}

impl CompareCommandConfig<'_> {
    fn to_core(&self) -> CompareConfig {
        CompareConfig {
            left_path: PathBuf::from(self.left),
            right_path: PathBuf::from(self.right),
            timestamp_column: self.timestamp_column.to_string(),
            total_column: self.total_column.to_string(),
            process_column: self.process_column.to_string(),
            suffixes: self.suffixes.clone(),
            sum_column: self.sum_column.to_string(),
            how: if self.outer {
                JoinKind::Outer
            } else {
                JoinKind::Inner
            },
            ..CompareConfig::default()
        }
    }
}

/// Run the compare command.
pub fn run(cfg: CompareCommandConfig<'_>) -> CommandResult {
    let comparison = run_comparison(&cfg.to_core())?;

    println!("{}", comparison.power_view()?);
    println!("\n{VALIDATION_BANNER}");
    println!("{}", comparison.validation_view()?);

    if cfg.outer {
        let stats = comparison.stats();
        println!();
        println!(
            "Unmatched rows: {} of {} in {}, {} of {} in {}",
            stats.left_unmatched,
            stats.left_rows,
            cfg.left,
            stats.right_unmatched,
            stats.right_rows,
            cfg.right
        );
    }

    if let Some(path) = cfg.output_path {
        let format = cfg
            .format
            .and_then(ExportFormat::from_name)
            .unwrap_or_else(|| ExportFormat::from_path(Path::new(path)));
        export_table(&comparison.merged().view(), Path::new(path), format)?;
        println!("\nMerged table written to {path}");
    }

    if let Some(path) = cfg.summary_path {
        super::write_json(&comparison.summary(), path, "Summary")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const FIRST: &str = "\
timestamp,gpu_power_watts,process_gpu_power_watts
2025-03-10 12:00:00.003,150.0,70.0
2025-03-10 12:00:02.002,149.0,69.0
";

    const SECOND: &str = "\
timestamp,gpu_power_watts,process_gpu_power_watts
2025-03-10 12:00:00.007,151.0,68.0
";

    fn config<'a>(left: &'a str, right: &'a str) -> CompareCommandConfig<'a> {
        CompareCommandConfig {
            left,
            right,
            timestamp_column: "timestamp",
            total_column: "gpu_power_watts",
            process_column: "process_gpu_power_watts",
            suffixes: ("_p1".into(), "_p2".into()),
            sum_column: "sum_process_gpu",
            outer: false,
            output_path: None,
            format: None,
            summary_path: None,
        }
    }

    #[test]
    fn outer_flag_selects_outer_join() {
        let mut cfg = config("a.csv", "b.csv");
        assert_eq!(cfg.to_core().how, JoinKind::Inner);
        cfg.outer = true;
        assert_eq!(cfg.to_core().how, JoinKind::Outer);
        assert_eq!(cfg.to_core().key_column, "timestamp_sec");
    }

    #[test]
    fn run_writes_export_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("a.csv");
        let right = dir.path().join("b.csv");
        fs::write(&left, FIRST).unwrap();
        fs::write(&right, SECOND).unwrap();
        let out = dir.path().join("merged.out");
        let summary = dir.path().join("summary.json");

        let (left, right) = (left.to_str().unwrap(), right.to_str().unwrap());
        let mut cfg = config(left, right);
        cfg.output_path = out.to_str();
        cfg.format = Some("json");
        cfg.summary_path = summary.to_str();
        run(cfg).unwrap();

        let rows: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["sum_process_gpu"], 138.0);

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
        assert_eq!(summary["join"], "inner");
        assert_eq!(summary["stats"]["left_unmatched"], 1);
    }

    #[test]
    fn run_fails_on_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        let missing = missing.to_str().unwrap();
        let err = run(config(missing, missing)).unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }
}
