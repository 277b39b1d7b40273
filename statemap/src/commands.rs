use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("statemap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("statemap")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("discover")
                .about("Explore a recorded application and build its FSM graph")
                .arg(
                    arg!(-s --"script" <FILE> "Replay script describing the application")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-o --"output" <FILE> "Output file for the FSM graph")
                        .required(false)
                        .default_value("ui_state_machine.json"),
                )
                .arg(
                    arg!(--"seed" <FILE> "Previously saved graph used to seed state identity")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"max-states" <N> "Maximum number of states to discover")
                        .required(false)
                        .default_value("100")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"use-bfs" "Breadth-first exploration instead of depth-first")
                        .required(false),
                )
                .arg(
                    arg!(--"timeout" <SECONDS> "Wall-clock budget for the whole run")
                        .required(false)
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            command!("inspect")
                .about("Print statistics for a saved FSM graph")
                .arg(
                    arg!([FILE] "Graph file to inspect")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}
