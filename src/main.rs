mod data;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use report::Report;

/// Print the columns, year-column statistics and first rows of a spreadsheet.
#[derive(Debug, Parser)]
#[command(name = "sheet-probe", version, about)]
struct Args {
    /// Spreadsheet to inspect (.xlsx, .xls, .xlsb, .ods, .csv, .parquet, .json).
    #[arg(value_name = "FILE", default_value = "data.xlsx")]
    path: PathBuf,

    /// Sheet to read instead of the first one (workbooks only).
    #[arg(long, value_name = "NAME")]
    sheet: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dataset = data::loader::load_file(&args.path, args.sheet.as_deref())
        .with_context(|| format!("loading {}", args.path.display()))?;
    let report = Report::build(&dataset).context("rendering preview")?;

    print!("{report}");
    Ok(())
}
