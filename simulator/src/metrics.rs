use crate::process::ProcessTable;
use crate::types::Tick;

/// End-of-run numbers for one terminated process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessMetrics {
    pub pid: String,
    pub turnaround: u64,
    pub waiting: u64,
    pub response: u64,
    pub cpu_time: u64,
    pub io_time: u64,
}

/// Averages over all terminated processes.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsSummary {
    pub avg_turnaround: f64,
    pub avg_waiting: f64,
    pub avg_response: f64,
    /// Percentage of ticks the CPU spent executing instructions
    pub cpu_utilization: f64,
    /// Terminated processes per tick
    pub throughput: f64,
}

/// The metrics block of a [`SimulationReport`](crate::SimulationReport).
#[derive(Clone, Debug, Default)]
pub struct MetricsReport {
    /// One entry per terminated process, in load order
    pub per_process: Vec<ProcessMetrics>,
    /// `None` for an empty run
    pub summary: Option<MetricsSummary>,
}

impl MetricsReport {
    /// Walks the table and collects the report
    ///
    /// * `table` - the process arena after the run
    /// * `elapsed` - total ticks the run took
    pub fn collect(table: &ProcessTable, elapsed: Tick) -> MetricsReport {
        let mut per_process = Vec::new();
        let mut total_cpu = 0u64;

        for proc in table.iter() {
            let Some(finish) = proc.finish_time else {
                continue;
            };
            let turnaround = finish - proc.arrival_time;
            let waiting = turnaround.saturating_sub(proc.total_cpu_time + proc.total_io_time);
            // A victim aborted before its first dispatch never responded
            let response = proc.start_time.unwrap_or(proc.arrival_time) - proc.arrival_time;
            total_cpu += proc.total_cpu_time;
            per_process.push(ProcessMetrics {
                pid: proc.pid.clone(),
                turnaround,
                waiting,
                response,
                cpu_time: proc.total_cpu_time,
                io_time: proc.total_io_time,
            });
        }

        let summary = if per_process.is_empty() || elapsed == 0 {
            None
        } else {
            let count = per_process.len() as f64;
            Some(MetricsSummary {
                avg_turnaround: per_process.iter().map(|m| m.turnaround as f64).sum::<f64>()
                    / count,
                avg_waiting: per_process.iter().map(|m| m.waiting as f64).sum::<f64>() / count,
                avg_response: per_process.iter().map(|m| m.response as f64).sum::<f64>() / count,
                cpu_utilization: total_cpu as f64 / elapsed as f64 * 100.0,
                throughput: count / elapsed as f64,
            })
        };

        MetricsReport {
            per_process,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Process;

    #[test]
    fn collects_the_standard_formulas() {
        let mut table = ProcessTable::new();
        let id = table.push(Process::new("A", 2, 0, Vec::new()));
        let proc = &mut table[id];
        proc.start_time = Some(4);
        proc.finish_time = Some(12);
        proc.total_cpu_time = 5;
        proc.total_io_time = 2;

        let report = MetricsReport::collect(&table, 12);
        assert_eq!(report.per_process.len(), 1);
        let m = &report.per_process[0];
        assert_eq!(m.turnaround, 10);
        assert_eq!(m.waiting, 3);
        assert_eq!(m.response, 2);

        let summary = report.summary.unwrap();
        assert!((summary.cpu_utilization - 5.0 / 12.0 * 100.0).abs() < 1e-9);
        assert!((summary.throughput - 1.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn unfinished_processes_are_left_out() {
        let mut table = ProcessTable::new();
        table.push(Process::new("A", 0, 0, Vec::new()));
        let report = MetricsReport::collect(&table, 5);
        assert!(report.per_process.is_empty());
        assert!(report.summary.is_none());
    }

    #[test]
    fn aborted_before_dispatch_reports_zero_response() {
        let mut table = ProcessTable::new();
        let id = table.push(Process::new("A", 3, 0, Vec::new()));
        table[id].finish_time = Some(9);
        let report = MetricsReport::collect(&table, 10);
        assert_eq!(report.per_process[0].response, 0);
        assert_eq!(report.per_process[0].waiting, 6);
    }
}
