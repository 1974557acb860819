//! The `parsat` command-line front end: parses a DIMACS file, runs the
//! parallel solver and reports in the DIMACS convention (exit code 10 for
//! SAT, 20 for UNSAT, 0 for unknown).

use clap::Parser;
use log::LevelFilter;
use parsat::sat::config::SolverConf;
use parsat::sat::coordinator::ParallelSolver;
use parsat::sat::dimacs::parse_file;
use parsat::sat::literal::Lit;
use parsat::sat::polarity::PolarityMode;
use parsat::sat::searcher::SolveStatus;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::process::ExitCode;

/// A parallel CDCL SAT solver.
#[derive(Parser, Debug)]
#[command(name = "parsat", version, about = "A parallel CDCL SAT solver")]
struct Cli {
    /// Path to the DIMACS .cnf file to solve.
    path: PathBuf,

    /// Number of parallel search workers.
    #[arg(short = 't', long, default_value_t = default_workers())]
    threads: usize,

    /// Base random seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Probability of a random branch variable pick.
    #[arg(long, default_value_t = 0.001)]
    random_var_freq: f64,

    /// Branch sign selection mode.
    #[arg(long, value_enum, default_value_t = PolarityMode::Auto)]
    polarity_mode: PolarityMode,

    /// Conflict budget per worker; 0 means unbounded.
    #[arg(long, default_value_t = 0)]
    max_conflicts: u64,

    /// Assumption literals in DIMACS convention; may be repeated.
    #[arg(long = "assume", allow_hyphen_values = true)]
    assumptions: Vec<i32>,

    /// Print the satisfying assignment on SAT.
    #[arg(short = 'm', long, default_value_t = true)]
    print_model: bool,

    /// Print per-worker statistics after solving.
    #[arg(short, long, default_value_t = false)]
    stats: bool,

    /// Verbosity: 0 = quiet, 1 = info, 2 = debug, 3 = trace.
    #[arg(short, long, default_value_t = 0)]
    verbosity: u8,
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn print_model(model: &[bool]) {
    let mut line = String::from("v");
    for (i, &value) in model.iter().enumerate() {
        let lit = if value { i as i64 + 1 } else { -(i as i64 + 1) };
        line.push_str(&format!(" {lit}"));
        if line.len() > 72 {
            println!("{line}");
            line = String::from("v");
        }
    }
    println!("{line} 0");
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _ = TermLogger::init(
        level_filter(cli.verbosity),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let cnf = match parse_file(&cli.path) {
        Ok(cnf) => cnf,
        Err(err) => {
            eprintln!("c error: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "c parsed {} clauses over {} variables",
        cnf.len(),
        cnf.num_vars
    );

    let conf = SolverConf {
        orig_seed: cli.seed,
        num_workers: cli.threads.max(1),
        random_var_freq: cli.random_var_freq.clamp(0.0, 1.0),
        polarity_mode: cli.polarity_mode,
        verbosity: cli.verbosity,
        max_conflicts: if cli.max_conflicts == 0 {
            u64::MAX
        } else {
            cli.max_conflicts
        },
        ..SolverConf::default()
    };

    let assumptions: Vec<Lit> = cli.assumptions.iter().map(|&d| Lit::from_dimacs(d)).collect();

    let mut solver = ParallelSolver::new(cnf, conf);
    let report = solver.solve_with_assumptions(&assumptions);

    if cli.stats {
        for (worker, stats) in report.stats.iter().enumerate() {
            println!("c ---- worker {worker} ----");
            print!("{stats}");
        }
    }

    match report.status {
        SolveStatus::Sat => {
            println!("s SATISFIABLE");
            if cli.print_model {
                if let Some(model) = &report.model {
                    print_model(model);
                }
            }
            ExitCode::from(10)
        }
        SolveStatus::Unsat => {
            println!("s UNSATISFIABLE");
            if !report.conflict.is_empty() {
                let conflict = report
                    .conflict
                    .iter()
                    .map(|l| l.to_dimacs().to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("c conflict: {conflict}");
            }
            ExitCode::from(20)
        }
        SolveStatus::Undef => {
            println!("s UNKNOWN");
            ExitCode::from(0)
        }
    }
}
