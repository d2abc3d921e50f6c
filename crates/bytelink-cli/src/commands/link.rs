use std::path::PathBuf;

use bytelink_builder::Profile;
use bytelink_linker::{LinkerConfig, link};
use tracing::debug;

pub struct LinkArgs {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub strip_debug: bool,
    pub partial: Vec<String>,
    pub dedup: bool,
    pub profile: Option<PathBuf>,
    pub index_capacity: Option<usize>,
    pub stats: bool,
}

pub fn run(args: LinkArgs) {
    let config = match config(&args) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("error: {}", msg);
            std::process::exit(1);
        }
    };

    debug!(
        inputs = args.inputs.len(),
        partial = config.partial.len(),
        dedup = config.deduplicate,
        "starting link"
    );
    let result = link(config, &args.inputs, &args.output);
    for error in &result.errors {
        eprintln!("error: {}", error);
    }

    if args.stats {
        match serde_json::to_string_pretty(&result.stats) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("error: cannot render stats: {}", e),
        }
    }

    if !result.is_ok() {
        std::process::exit(1);
    }
}

fn config(args: &LinkArgs) -> Result<LinkerConfig, String> {
    let mut config = LinkerConfig {
        strip_debug_info: args.strip_debug,
        partial: args.partial.iter().cloned().collect(),
        deduplicate: args.dedup,
        ..LinkerConfig::default()
    };
    if let Some(capacity) = args.index_capacity {
        config.container = config.container.with_index_capacity(capacity);
    }
    if let Some(path) = &args.profile {
        config.profile = Some(Profile::load(path).map_err(|e| e.to_string())?);
    }
    Ok(config)
}
