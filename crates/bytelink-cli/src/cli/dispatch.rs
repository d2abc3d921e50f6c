//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::link::LinkArgs;

pub struct LinkParams {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub strip_debug: bool,
    pub partial: Vec<String>,
    pub no_dedup: bool,
    pub profile: Option<PathBuf>,
    pub index_capacity: Option<u16>,
    pub stats: bool,
}

impl LinkParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            inputs: paths(m, "inputs"),
            output: m.get_one::<PathBuf>("output").cloned().unwrap_or_default(),
            strip_debug: m.get_flag("strip_debug"),
            partial: m
                .get_many::<String>("partial")
                .map(|v| v.cloned().collect())
                .unwrap_or_default(),
            no_dedup: m.get_flag("no_dedup"),
            profile: m.get_one::<PathBuf>("profile").cloned(),
            index_capacity: m.get_one::<u16>("index_capacity").copied(),
            stats: m.get_flag("stats"),
        }
    }
}

impl From<LinkParams> for LinkArgs {
    fn from(p: LinkParams) -> Self {
        Self {
            inputs: p.inputs,
            output: p.output,
            strip_debug: p.strip_debug,
            partial: p.partial,
            dedup: !p.no_dedup,
            profile: p.profile,
            index_capacity: p.index_capacity.map(usize::from),
            stats: p.stats,
        }
    }
}

pub struct CheckParams {
    pub files: Vec<PathBuf>,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            files: paths(m, "files"),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self { files: p.files }
    }
}

pub struct DumpParams {
    pub file: PathBuf,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            file: m.get_one::<PathBuf>("file").cloned().unwrap_or_default(),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            file: p.file,
            color: p.color.should_colorize(),
        }
    }
}

fn paths(m: &ArgMatches, id: &str) -> Vec<PathBuf> {
    m.get_many::<PathBuf>(id)
        .map(|v| v.cloned().collect())
        .unwrap_or_default()
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
