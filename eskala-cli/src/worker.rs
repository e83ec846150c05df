use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Instant,
};

use anyhow::Result;
use chrono::Local;
use eskala_jira::{Issue, IssueSearcher};
use eskala_report::{
    generate_report, write_issue_report, CacheStore, IssueFilter, ReportProgress, ReportSummary,
};

use crate::telemetry;

pub enum JobSource {
    Tracker {
        searcher: Box<dyn IssueSearcher + Send>,
        cache: CacheStore,
        filter: IssueFilter,
    },
    Sample(Vec<Issue>),
}

pub struct ReportJob {
    pub source: JobSource,
    pub browse_base: String,
    pub output: PathBuf,
}

#[derive(Debug)]
pub enum WorkerEvent {
    Status(String),
    Finished(std::result::Result<ReportSummary, String>),
}

/// Runs one report job off the interactive thread. The returned receiver
/// yields status lines while the job runs and a single Finished event at
/// the end; dropping the receiver just lets the worker finish silently.
pub fn start_report_worker(job: ReportJob) -> Receiver<WorkerEvent> {
    let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>();

    thread::spawn(move || {
        let outcome = run_report_job(job, &event_tx).map_err(|error| format!("{error:#}"));
        let _ = event_tx.send(WorkerEvent::Finished(outcome));
    });

    event_rx
}

fn run_report_job(job: ReportJob, events: &Sender<WorkerEvent>) -> Result<ReportSummary> {
    let ReportJob {
        source,
        browse_base,
        output,
    } = job;
    let started = Instant::now();

    let result = match source {
        JobSource::Tracker {
            searcher,
            cache,
            filter,
        } => generate_report(
            searcher.as_ref(),
            &cache,
            &filter,
            &browse_base,
            &output,
            Local::now().date_naive(),
            |progress| {
                let ReportProgress::Collected { issues } = progress;
                telemetry::emit_success("fetch_issues", started.elapsed());
                let _ = events.send(WorkerEvent::Status(collected_status(issues)));
            },
        ),
        JobSource::Sample(issues) => {
            let _ = events.send(WorkerEvent::Status(collected_status(issues.len())));
            write_issue_report(&issues, &browse_base, &output)
        }
    };

    match &result {
        Ok(_) => telemetry::emit_success("generate_report", started.elapsed()),
        Err(error) => {
            telemetry::emit_failure("generate_report", started.elapsed(), &error.to_string())
        }
    }

    result
}

fn collected_status(issues: usize) -> String {
    format!("Collected {issues} issues. Generating report...")
}
