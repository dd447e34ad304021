// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chemviz::cli::{CliArgs, Command};
use chemviz::config::{self, AppConfig};
use chemviz::console_format::{self, TableWriter};
use chemviz::report;
use chemviz::service::Service;
use chemviz::stats::{format_decimal, StatisticsBundle};
use chemviz::store::RecordStore;
use chemviz::types::{format_timestamp, DatasetId, DatasetSummary};
use chemviz::ui;
use log::debug;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

fn main() {
    env_logger::init();

    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        ui::print_error(&e);
        std::process::exit(1);
    }

    // Set console width override if specified (for testing)
    if let Some(width) = args.console_width {
        console_format::set_console_width(width);
    }

    let config = match config::build_app_config(&args) {
        Ok(c) => c,
        Err(e) => {
            ui::print_error(&format!("Configuration error: {}", e));
            std::process::exit(1);
        }
    };
    ui::set_colors_enabled(config.use_colors);

    if let Err(e) = run(&args.command, &config) {
        ui::print_error(&e.to_string());
        std::process::exit(if e.is_not_found() { 2 } else { 1 });
    }
}

fn run(command: &Command, config: &AppConfig) -> chemviz::Result<()> {
    let store = RecordStore::open(&config.database, config.retention)?;
    let service = Service::new(store);
    debug!("Running {:?} as {}", command, config.owner);

    match command {
        Command::Upload { file } => upload(&service, config, file),
        Command::List { json } => list(&service, config, *json),
        Command::Show { id, json } => show(&service, config, *id, *json),
        Command::Delete { id } => {
            service.delete(&config.owner, *id)?;
            ui::status(&format!("Deleted dataset {}", id));
            Ok(())
        }
        Command::Report { id, output } => write_report(&service, config, *id, output.as_deref()),
    }
}

fn stdout_colors(config: &AppConfig) -> bool {
    config.use_colors && io::stdout().is_terminal()
}

fn upload(service: &Service, config: &AppConfig, file: &Path) -> chemviz::Result<()> {
    let bytes = fs::read(file)?;
    let source_name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    let outcome = service.upload(&config.owner, &source_name, &bytes)?;
    ui::status(&format!(
        "Stored dataset {} from {} ({} records)",
        outcome.dataset_id, outcome.source_name, outcome.summary.total_count
    ));

    let stdout = io::stdout();
    print_summary(TableWriter::new(stdout.lock(), stdout_colors(config)), &outcome.summary)?;
    Ok(())
}

fn print_summary<W: Write>(mut out: TableWriter<W>, summary: &StatisticsBundle) -> io::Result<()> {
    let widths: [usize; 2] = [24, 14];
    out.write_top_border(&widths)?;
    out.write_row(&["Metric", "Value"], &widths, None)?;
    out.write_separator_line(&widths)?;
    let total = summary.total_count.to_string();
    let flow = format_decimal(summary.avg_flowrate);
    let pressure = format_decimal(summary.avg_pressure);
    let temperature = format_decimal(summary.avg_temperature);
    out.write_row(&["Total Equipment Count", total.as_str()], &widths, None)?;
    out.write_row(&["Average Flowrate", flow.as_str()], &widths, None)?;
    out.write_row(&["Average Pressure", pressure.as_str()], &widths, None)?;
    out.write_row(&["Average Temperature", temperature.as_str()], &widths, None)?;
    out.write_bottom_border(&widths)?;

    out.write_blank()?;
    out.write_top_border(&widths)?;
    out.write_row(&["Equipment Type", "Count"], &widths, None)?;
    out.write_separator_line(&widths)?;
    for (category, count) in &summary.type_distribution {
        let count = count.to_string();
        out.write_row(&[category.as_str(), count.as_str()], &widths, None)?;
    }
    out.write_bottom_border(&widths)
}

fn list(service: &Service, config: &AppConfig, json: bool) -> chemviz::Result<()> {
    let summaries = service.list(&config.owner)?;
    if json {
        return report::write_json(io::stdout().lock(), &report::summaries_json(&summaries));
    }
    if summaries.is_empty() {
        ui::status(&format!("No datasets stored for {}", config.owner));
        return Ok(());
    }
    let stdout = io::stdout();
    print_listing(TableWriter::new(stdout.lock(), stdout_colors(config)), &summaries)?;
    Ok(())
}

fn print_listing<W: Write>(mut out: TableWriter<W>, summaries: &[DatasetSummary]) -> io::Result<()> {
    let widths: [usize; 5] = [8, 28, 21, 9, 12];
    out.write_top_border(&widths)?;
    out.write_row(&["ID", "File", "Uploaded", "Records", "Avg Flow"], &widths, None)?;
    out.write_separator_line(&widths)?;
    for s in summaries {
        let avg_flow = s.summary.as_ref().map(|b| format_decimal(b.avg_flowrate)).unwrap_or_else(|| "-".to_string());
        let id = s.id.to_string();
        let uploaded = format_timestamp(&s.created_at_utc());
        let records = s.record_count.to_string();
        out.write_row(
            &[id.as_str(), s.source_name.as_str(), uploaded.as_str(), records.as_str(), avg_flow.as_str()],
            &widths,
            None,
        )?;
    }
    out.write_bottom_border(&widths)
}

fn show(service: &Service, config: &AppConfig, id: DatasetId, json: bool) -> chemviz::Result<()> {
    let detail = service.get(&config.owner, id)?;
    if json {
        return report::write_json(io::stdout().lock(), &report::dataset_json(&detail));
    }
    let doc = report::build_report(&detail.dataset, &detail.records, chrono::Utc::now())?;
    report::write_text(io::stdout().lock(), &doc, stdout_colors(config), console_format::console_width())?;
    Ok(())
}

fn write_report(service: &Service, config: &AppConfig, id: DatasetId, output: Option<&Path>) -> chemviz::Result<()> {
    let report = service.report_file(&config.owner, id)?;
    let path: PathBuf = match output {
        Some(path) => path.to_path_buf(),
        None => {
            fs::create_dir_all(&config.report_dir)?;
            config.report_dir.join(&report.file_name)
        }
    };
    if path.exists() {
        ui::print_warning(&format!("Overwriting {}", path.display()));
    }
    fs::write(&path, &report.pdf)?;
    ui::status(&format!("Wrote report to {}", path.display()));
    Ok(())
}
