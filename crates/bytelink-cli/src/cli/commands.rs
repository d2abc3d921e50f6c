//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("bytelink")
        .about("Link, validate and inspect bytecode containers")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(verbose_arg())
        .subcommand(link_command())
        .subcommand(check_command())
        .subcommand(dump_command())
}

/// Link containers into one file.
pub fn link_command() -> Command {
    Command::new("link")
        .about("Link containers into one file")
        .after_help(
            r#"EXAMPLES:
  bytelink link a.blk b.blk -o app.blk
  bytelink link *.blk -o app.blk --strip-debug --stats
  bytelink link a.blk b.blk -o app.blk --partial 'Lapp/R;'
  bytelink link a.blk -o app.blk --profile hot.json"#,
        )
        .arg(inputs_arg())
        .arg(output_arg())
        .arg(strip_debug_arg())
        .arg(partial_arg())
        .arg(no_dedup_arg())
        .arg(profile_arg())
        .arg(index_capacity_arg())
        .arg(stats_arg())
}

/// Validate containers.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Validate containers (header, checksum, classes, code)")
        .after_help(
            r#"EXAMPLES:
  bytelink check app.blk
  bytelink check lib/*.blk"#,
        )
        .arg(files_arg())
}

/// Show a container in readable form.
pub fn dump_command() -> Command {
    Command::new("dump")
        .about("Show a container's header, regions, classes and code")
        .after_help(
            r#"EXAMPLES:
  bytelink dump app.blk
  bytelink dump app.blk --color never"#,
        )
        .arg(file_arg())
        .arg(color_arg())
}
