#![allow(non_snake_case)]
use RustedVectorCalc::Utils::logger::init_logger;
use RustedVectorCalc::vector_calculus::request::TaskFile;
use RustedVectorCalc::vector_calculus::session::CalculationSession;
use log::{error, info};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: RustedVectorCalc <task-file>");
        return ExitCode::from(2);
    };
    let task = match TaskFile::from_path(path) {
        Ok(task) => task,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };
    match init_logger(&task.logging) {
        Ok(Some(log_file)) => info!("logging to {}", log_file.display()),
        Ok(None) => {}
        Err(e) => eprintln!("cannot create log file: {}", e),
    }

    let mut session = CalculationSession::new();
    let mut failed = 0;
    for entry in &task.entries {
        println!("\n{}", entry.title);
        let outcome = match &entry.request {
            Ok(request) => session.submit(request).map(|report| report.clone()),
            Err(e) => Err(e.clone()),
        };
        match outcome {
            Ok(report) => {
                println!("{}", report.trace.to_table());
                println!("result: {}", report.result);
            }
            Err(e) => {
                error!("{}: {}", entry.title, e);
                println!("error: {}", e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        error!("{} of {} calculations failed", failed, task.entries.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
