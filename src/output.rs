use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunReport};

pub const START_BANNER: &str = "------------------ SCRIPT STARTED ------------------";
pub const END_BANNER: &str = "------------------ SCRIPT TERMINATED ------------------";

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Plain progress lines on stdout, one per page.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_start() {
        println!("{START_BANNER}");
    }

    pub fn print_report(report: &RunReport) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(render_summary(report).as_bytes())?;
        stdout.flush()
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        println!("{}", event.message);
    }
}

pub fn render_summary(report: &RunReport) -> String {
    let mut out = format!("{} observations inserted or updated.\n", report.inserted);
    if !report.errors.is_empty() {
        out.push_str("Errors:\n");
        for message in report.errors.messages() {
            out.push_str(&format!("   {message}\n"));
        }
    }
    out.push_str(&format!("Execution time: {} seconds.\n", report.elapsed_secs));
    out.push_str(END_BANNER);
    out.push('\n');
    out
}
