use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use eskala_report::CacheStore;

mod adapter;
mod cli_args;
mod mock;
mod telemetry;
mod worker;

use cli_args::{parse_cli_action, print_help, CliAction, RunOptions};
use worker::{start_report_worker, JobSource, ReportJob, WorkerEvent};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("eskala: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let options = match parse_cli_action()? {
        CliAction::Help => {
            print_help();
            return Ok(ExitCode::SUCCESS);
        }
        CliAction::Run(options) => options,
    };

    let job = match prepare_job(&options)? {
        Some(job) => job,
        // login already reported its status line
        None => return Ok(ExitCode::FAILURE),
    };

    println!("Creating report. Please wait...");
    for event in start_report_worker(job) {
        match event {
            WorkerEvent::Status(line) => println!("{line}"),
            WorkerEvent::Finished(Ok(summary)) => {
                println!(
                    "Successfully generated report! Path: {}",
                    summary.output.display()
                );
                return Ok(ExitCode::SUCCESS);
            }
            WorkerEvent::Finished(Err(message)) => {
                // tracker and write errors surface as status text, like the
                // original status bar; no report and no cache change remain
                println!("{message}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    // the worker hung up without reporting a result
    Ok(ExitCode::FAILURE)
}

fn prepare_job(options: &RunOptions) -> Result<Option<ReportJob>> {
    let output = adapter::resolve_output_path(&options.output);

    if options.mock_only {
        return Ok(Some(ReportJob {
            source: JobSource::Sample(mock::sample_issues()),
            browse_base: mock::SAMPLE_BROWSE_BASE.to_string(),
            output,
        }));
    }

    let config = adapter::load_config(options)?;
    let browse_base = config.browse_base()?;

    println!("Login pending. Please wait...");
    let started = Instant::now();
    let client = match adapter::login(&config) {
        Ok(client) => client,
        Err(error) => {
            telemetry::emit_failure("login", started.elapsed(), &error.to_string());
            println!("Login failed! Please check username and/or password.");
            eprintln!("eskala: {error:#}");
            return Ok(None);
        }
    };
    let user = match client.current_user() {
        Ok(user) => user,
        Err(error) => {
            telemetry::emit_failure("login", started.elapsed(), &error.to_string());
            println!("Could not connect to JIRA instance. Please try again!");
            eprintln!("eskala: {error:#}");
            return Ok(None);
        }
    };
    telemetry::emit_success("login", started.elapsed());
    println!("Login successful! You are logged in as {user}!");

    Ok(Some(ReportJob {
        source: JobSource::Tracker {
            searcher: Box::new(client),
            cache: CacheStore::new(adapter::resolve_cache_dir(options, &config)),
            filter: adapter::issue_filter(&config),
        },
        browse_base,
        output,
    }))
}
