#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*
 * CONVBIN-FIX is part of the nav-solutions framework.
 * Authors: Guillaume W. Bres <guillaume.bressaix@gmail.com> et al,
 * (cf. https://github.com/nav-solutions/convbin-fix/graphs/contributors)
 * This framework is shipped under Mozilla Public V2 license.
 *
 * Documentation: https://github.com/nav-solutions/convbin-fix
 */

use env_logger::{Builder, Env, Target};

use log::{error, info};

use std::process::ExitCode;

mod cli;
mod error;
mod fd;
mod fixer;
mod runtime;
mod settings;
mod utils;

use crate::{cli::Cli, error::Error, runtime::Runtime, settings::Settings};

fn fix(settings: &Settings) -> Result<(), Error> {
    let runtime = Runtime::deploy()?;

    let report = fixer::run(settings)?;

    info!("{}", report);
    info!("processing time: {}", runtime.elapsed()?);
    Ok(())
}

pub fn main() -> ExitCode {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    builder
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let cli = Cli::new();
    let settings = cli.settings();

    match fix(&settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e @ (Error::MalformedField { .. } | Error::MalformedEpoch { .. })) => {
            error!("\"{}\" {}", settings.input.display(), e);
            ExitCode::FAILURE
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        },
    }
}
