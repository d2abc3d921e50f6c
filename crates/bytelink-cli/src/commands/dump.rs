use std::path::PathBuf;

use bytelink_core::Colors;
use bytelink_format::{File, dump};

pub struct DumpArgs {
    pub file: PathBuf,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    let file = match File::open(&args.file) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("error: {}: {}", args.file.display(), e);
            std::process::exit(1);
        }
    };

    match dump(&file, Colors::new(args.color)) {
        Ok(text) => print!("{}", text),
        Err(e) => {
            eprintln!("error: {}: {}", file.name(), e);
            std::process::exit(1);
        }
    }
}
