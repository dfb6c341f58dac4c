//! CSV and JSON export of bars, annotated bars, trades and reports.
//!
//! Writers take any `io::Write` so the CLI can stream to stdout and tests can
//! write into a `Vec<u8>`.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use vwaplab_core::components::IndicatorBar;
use vwaplab_core::domain::{Bar, TradeRecord};

use crate::runner::{RunReport, SCHEMA_VERSION};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Write bars in the ingest format (`caldt,open,high,low,close,volume`).
pub fn write_bars_csv<W: Write>(bars: &[Bar], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["caldt", "open", "high", "low", "close", "volume"])?;
    for b in bars {
        wtr.write_record([
            b.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", b.open),
            format!("{:.4}", b.high),
            format!("{:.4}", b.low),
            format!("{:.4}", b.close),
            format!("{}", b.volume),
        ])?;
    }
    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

/// Write aggregated bars with their VWAP and ATR. Undefined values are empty.
pub fn write_annotated_csv<W: Write>(bars: &[IndicatorBar], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "timestamp", "session", "open", "high", "low", "close", "volume", "vwap", "atr",
    ])?;
    for ib in bars {
        let b = ib.bar;
        wtr.write_record([
            b.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            b.session().to_string(),
            format!("{:.4}", b.open),
            format!("{:.4}", b.high),
            format!("{:.4}", b.low),
            format!("{:.4}", b.close),
            format!("{}", b.volume),
            opt(ib.indicators.vwap),
            opt(ib.indicators.atr),
        ])?;
    }
    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

/// Write the trade tape.
pub fn write_trades_csv<W: Write>(trades: &[TradeRecord], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "side",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "exit_reason",
        "quantity",
        "pnl",
        "return_pct",
        "bars_held",
    ])?;
    for t in trades {
        wtr.write_record([
            format!("{:?}", t.side),
            t.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", t.entry_price),
            t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", t.exit_price),
            t.exit_reason.to_string(),
            format!("{:.6}", t.quantity),
            format!("{:.2}", t.pnl),
            format!("{:.4}", t.return_pct() * 100.0),
            t.bars_held().to_string(),
        ])?;
    }
    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

/// Write the per-bar equity curve.
pub fn write_equity_csv<W: Write>(equity_curve: &[f64], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["bar", "equity"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        wtr.write_record([i.to_string(), format!("{eq:.2}")])?;
    }
    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

// ─── Artifacts ──────────────────────────────────────────────────────

/// Write `report.json`, `trades.csv` and `equity.csv` into a per-run
/// directory under `output_dir` and return that directory.
///
/// The directory name is derived from the symbol, strategy and run id, so
/// rerunning the same config on the same data overwrites its artifacts.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = report.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}_{short_id}", report.symbol, report.strategy));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    write_trades_csv(&report.trades, create(&run_dir.join("trades.csv"))?)?;
    write_equity_csv(&report.equity_curve, create(&run_dir.join("equity.csv"))?)?;
    Ok(run_dir)
}

/// Load a `RunReport` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<RunReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}
