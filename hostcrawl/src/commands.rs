use clap::{ArgAction, arg, value_parser};
use hostcrawl_core::output::DEFAULT_OUTPUT_DIR;
use hostcrawl_scanner::DomainSuffix;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_SUFFIX: &str = ".mit.edu";

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("hostcrawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("hostcrawl")
        .about("Discover every hostname under a domain suffix by crawling links depth-first")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-d --"depth" <DEPTH>)
                .required(true)
                .help("How deep the search goes; larger values take much longer")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(-s --"suffix" <SUFFIX>)
                .required(false)
                .help("Only hosts ending in this domain suffix are followed")
                .value_parser(value_parser!(DomainSuffix))
                .default_value(DEFAULT_SUFFIX),
        )
        .arg(
            arg!(-u --"url" <URL>)
                .required(false)
                .help("A seed URL to start from (repeatable)")
                .value_parser(value_parser!(Url))
                .action(ArgAction::Append)
                .conflicts_with("seeds-file"),
        )
        .arg(
            arg!(-S --"seeds-file" <PATH>)
                .required(false)
                .help("Newline-delimited file of seed URLs, hostnames or labels")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("url"),
        )
        .arg(
            arg!(--"debug")
                .required(false)
                .help("Print each newly discovered host as it is found, plus debug logs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"save")
                .required(false)
                .help("Save discovered labels to the output directory (default)")
                .action(ArgAction::SetTrue)
                .overrides_with("no-save"),
        )
        .arg(
            arg!(--"no-save")
                .required(false)
                .help("Don't save output to a file")
                .action(ArgAction::SetTrue)
                .overrides_with("save"),
        )
        .arg(
            arg!(-o --"output-dir" <DIR>)
                .required(false)
                .help("Directory the result file is written to")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_OUTPUT_DIR),
        )
        .arg(
            arg!(--"name-seeds")
                .required(false)
                .help("Include the seed labels in the result file name")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"shared-visited")
                .required(false)
                .help("Thread one visited set through all seeds instead of one per seed")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-w --"workers" <NUM_WORKERS>)
                .required(false)
                .help("How many seeds are scanned at once (ignored with --shared-visited)")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            arg!(-t --"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("10"),
        )
        .arg(
            arg!(--"json")
                .required(false)
                .help("Print the full report as JSON instead of one label per line")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-q --"quiet")
                .required(false)
                .help("Suppress the header, progress and summary")
                .action(ArgAction::SetTrue),
        )
}
