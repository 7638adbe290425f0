//! `memsim`: drives a configured dispatcher variant over a transaction
//! trace for a fixed number of cycles, emitting epoch and final JSON stats
//! (§6 "External interfaces", C8 "Clock driver").

mod config_file;
mod error;
mod stats;
mod system;

use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use memsim_core::Callbacks;
use memsim_trace::TraceReader;

use error::CliError;
use stats::{Counters, EpochWriter, FinalStats};

#[derive(Parser, Debug)]
#[command(name = "memsim", about = "Cycle-driven DRAM/CiM/HMC memory-system simulator")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Path to the transaction trace file.
    #[arg(long)]
    trace: PathBuf,

    /// Number of dispatcher clock cycles to run.
    #[arg(long)]
    cycles: u64,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_file::load(&cli.config)?;
    let mut dispatcher = system::build(&config)?;

    let counters = Rc::new(RefCell::new(Counters::default()));
    let epoch_counters = counters.clone();
    let r = counters.clone();
    let w = counters.clone();
    dispatcher.register_callbacks(Callbacks::new(
        move |_addr| r.borrow_mut().reads_completed += 1,
        move |_addr| w.borrow_mut().writes_completed += 1,
    ));

    let trace_file = File::open(&cli.trace).map_err(|source| CliError::TraceOpen {
        path: cli.trace.display().to_string(),
        source,
    })?;
    let mut trace = TraceReader::new(BufReader::new(trace_file));
    let mut pending = None;

    let mut epoch_writer = EpochWriter::create(std::path::Path::new(&config.output.json_epoch_name))?;

    for cycle in 0..cli.cycles {
        loop {
            let t = match pending.take() {
                Some(t) => t,
                None => match trace.next() {
                    Some(Ok(t)) => t,
                    Some(Err(e)) => {
                        log::warn!("trace error: {e}");
                        continue;
                    }
                    None => break,
                },
            };
            if dispatcher.will_accept(&t) {
                dispatcher.add(t);
            } else {
                pending = Some(t);
                break;
            }
        }

        dispatcher.tick();

        if config.output.epoch_period > 0 && cycle > 0 && cycle % config.output.epoch_period == 0 {
            epoch_writer.record(cycle, *epoch_counters.borrow())?;
        }
    }

    dispatcher.print_stats();
    epoch_writer.finish()?;

    let final_stats = FinalStats {
        dispatcher: config.dispatcher.name(),
        total_cycles: cli.cycles,
        counters: *counters.borrow(),
    };
    stats::write_final_stats(std::path::Path::new(&config.output.json_stats_name), &final_stats)?;

    Ok(())
}
