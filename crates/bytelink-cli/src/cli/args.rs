//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` that can be composed into commands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Input containers to link (positional, one or more).
pub fn inputs_arg() -> Arg {
    Arg::new("inputs")
        .value_name("INPUT")
        .value_parser(value_parser!(PathBuf))
        .num_args(1..)
        .required(true)
        .help("Input containers")
}

/// Containers to validate (positional, one or more).
pub fn files_arg() -> Arg {
    Arg::new("files")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .num_args(1..)
        .required(true)
        .help("Containers to validate")
}

/// Single container (positional).
pub fn file_arg() -> Arg {
    Arg::new("file")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Container to show")
}

/// Output path (-o/--output).
pub fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("OUT")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Linked output file")
}

/// Drop debug info (--strip-debug).
pub fn strip_debug_arg() -> Arg {
    Arg::new("strip_debug")
        .long("strip-debug")
        .action(ArgAction::SetTrue)
        .help("Drop debug info and line number programs")
}

/// Partial class, repeatable (--partial).
pub fn partial_arg() -> Arg {
    Arg::new("partial")
        .long("partial")
        .value_name("CLASS")
        .action(ArgAction::Append)
        .help("Class descriptor that several inputs may define (e.g. 'Lapp/Util;')")
}

/// Skip deduplication (--no-dedup).
pub fn no_dedup_arg() -> Arg {
    Arg::new("no_dedup")
        .long("no-dedup")
        .action(ArgAction::SetTrue)
        .help("Keep byte-identical code, debug info and annotations")
}

/// Profile JSON (--profile).
pub fn profile_arg() -> Arg {
    Arg::new("profile")
        .long("profile")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Hot classes, strings and methods as JSON")
}

/// Entries per region table (--index-capacity).
pub fn index_capacity_arg() -> Arg {
    Arg::new("index_capacity")
        .long("index-capacity")
        .value_name("N")
        .value_parser(value_parser!(u16).range(1..))
        .help("Entries per region index table (1-65535)")
}

/// Print link counters as JSON (--stats).
pub fn stats_arg() -> Arg {
    Arg::new("stats")
        .long("stats")
        .action(ArgAction::SetTrue)
        .help("Print link statistics as JSON")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Debug logging (-v/--verbose).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Log pipeline stages to stderr")
}
