//! `instaview` binary: opens a window showing instanced copies of an OBJ
//! model.
//!
//! ```text
//! instaview [model.obj] [--options file.toml]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use instaview::{options::Options, Viewer};

struct Args {
    model: Option<PathBuf>,
    options: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        model: None,
        options: None,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--options" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--options needs a file".to_owned())?;
                parsed.options = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown flag {flag}"));
            }
            _ if parsed.model.is_none() => parsed.model = Some(arg.into()),
            _ => return Err(format!("unexpected argument {arg}")),
        }
    }
    Ok(parsed)
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            log::error!("{e}");
            log::error!("Usage: instaview [model.obj] [--options file.toml]");
            return ExitCode::FAILURE;
        }
    };

    let options = match &args.options {
        Some(path) => match Options::load(path) {
            Ok(options) => options,
            Err(e) => {
                log::error!("{}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Options::default(),
    };

    let mut builder = Viewer::builder().with_options(options);
    if let Some(model) = args.model {
        builder = builder.with_path(model);
    }

    match builder.build().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
