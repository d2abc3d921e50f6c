//! Tests for CLI dispatch logic: argument parsing and params extraction.

use std::path::PathBuf;

use super::*;
use crate::cli::commands::{check_command, dump_command, link_command};
use crate::commands::link::LinkArgs;

#[test]
fn link_collects_inputs_and_flags() {
    let m = link_command()
        .try_get_matches_from([
            "link",
            "a.blk",
            "b.blk",
            "-o",
            "out.blk",
            "--partial",
            "Lapp/R;",
            "--partial",
            "Lapp/S;",
            "--no-dedup",
            "--strip-debug",
            "--index-capacity",
            "128",
        ])
        .unwrap();
    let args: LinkArgs = LinkParams::from_matches(&m).into();

    assert_eq!(
        args.inputs,
        vec![PathBuf::from("a.blk"), PathBuf::from("b.blk")]
    );
    assert_eq!(args.output, PathBuf::from("out.blk"));
    assert_eq!(args.partial, vec!["Lapp/R;", "Lapp/S;"]);
    assert!(!args.dedup);
    assert!(args.strip_debug);
    assert_eq!(args.index_capacity, Some(128));
    assert!(!args.stats);
    assert_eq!(args.profile, None);
}

#[test]
fn link_defaults() {
    let m = link_command()
        .try_get_matches_from(["link", "a.blk", "-o", "out.blk"])
        .unwrap();
    let args: LinkArgs = LinkParams::from_matches(&m).into();

    assert!(args.dedup);
    assert!(!args.strip_debug);
    assert!(args.partial.is_empty());
    assert_eq!(args.index_capacity, None);
}

#[test]
fn link_requires_output() {
    let result = link_command().try_get_matches_from(["link", "a.blk"]);
    assert!(result.is_err());
}

#[test]
fn link_rejects_zero_index_capacity() {
    let result = link_command().try_get_matches_from([
        "link",
        "a.blk",
        "-o",
        "out.blk",
        "--index-capacity",
        "0",
    ]);
    assert!(result.is_err());
}

#[test]
fn check_requires_files() {
    assert!(check_command().try_get_matches_from(["check"]).is_err());

    let m = check_command()
        .try_get_matches_from(["check", "a.blk", "b.blk"])
        .unwrap();
    let params = CheckParams::from_matches(&m);
    assert_eq!(params.files.len(), 2);
}

#[test]
fn dump_color_choice() {
    let m = dump_command()
        .try_get_matches_from(["dump", "app.blk", "--color", "always"])
        .unwrap();
    let params = DumpParams::from_matches(&m);
    assert_eq!(params.file, PathBuf::from("app.blk"));
    assert_eq!(params.color, ColorChoice::Always);

    let m = dump_command()
        .try_get_matches_from(["dump", "app.blk"])
        .unwrap();
    assert_eq!(DumpParams::from_matches(&m).color, ColorChoice::Auto);
}

#[test]
fn dump_rejects_unknown_color() {
    let result = dump_command().try_get_matches_from(["dump", "app.blk", "--color", "sometimes"]);
    assert!(result.is_err());
}

#[test]
fn verbose_is_global() {
    let m = build_cli()
        .try_get_matches_from(["bytelink", "check", "a.blk", "-v"])
        .unwrap();
    assert!(m.get_flag("verbose"));
}
