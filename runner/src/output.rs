//! Rendering of a finished run: the timeline log and the metrics table.

use std::io::{self, Write};

use simulator::SimulationReport;

pub fn write_report<W: Write>(out: &mut W, report: &SimulationReport) -> io::Result<()> {
    writeln!(out, "--- Timeline Log ---")?;
    for record in report.trace.iter() {
        writeln!(out, "{record}")?;
    }

    writeln!(out)?;
    writeln!(out, "--- Metrics ---")?;
    writeln!(
        out,
        "{:<10}{:<12}{:<10}{:<10}{:<10}{}",
        "PID", "Turnaround", "Waiting", "Response", "CPU Time", "IO Time"
    )?;
    for m in &report.metrics.per_process {
        writeln!(
            out,
            "{:<10}{:<12}{:<10}{:<10}{:<10}{}",
            m.pid, m.turnaround, m.waiting, m.response, m.cpu_time, m.io_time
        )?;
    }

    if let Some(summary) = &report.metrics.summary {
        writeln!(out)?;
        writeln!(out, "Averages:")?;
        writeln!(out, "Turnaround: {:.2}", summary.avg_turnaround)?;
        writeln!(out, "Waiting:    {:.2}", summary.avg_waiting)?;
        writeln!(out, "Response:   {:.2}", summary.avg_response)?;
        writeln!(out, "CPU Util:   {:.2}%", summary.cpu_utilization)?;
        writeln!(out, "Throughput: {:.2} proc/unit time", summary.throughput)?;
    }

    Ok(())
}
