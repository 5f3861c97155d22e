use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command, value_parser};

use std::path::PathBuf;

use crate::{fixer::Kind, settings::Settings};

pub struct Cli {
    /// Arguments passed by user
    matches: ArgMatches,
}

/// Both fixers share the same Input/Output options
fn fixer(name: &'static str, about: &'static str, extension: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg_required_else_help(true)
        .next_help_heading("Input/Output")
        .arg(
            Arg::new("filepath")
                .value_name("FILE")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Input RINEX file. Gzip compressed files (.gz) are supported."),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf))
                .help(format!(
                    "Custom output file. Missing directories are created.
By default, we generate <input>_fix.{} next to the input file.
Output is gzip compressed if this name terminates with .gz",
                    extension
                )),
        )
        .arg(
            Arg::new("gzip")
                .long("gzip")
                .action(ArgAction::SetTrue)
                .help("Gzip compress the output."),
        )
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        Self {
            matches: Self::command().get_matches(),
        }
    }

    fn command() -> Command {
        Command::new("convbin-fix")
            .author("Guillaume W. Bres, <guillaume.bressaix@gmail.com>")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Fixes RINEX files produced by convbin")
            .color(ColorChoice::Always)
            .arg_required_else_help(true)
            .subcommand_required(true)
            .subcommand(fixer(
                "nav",
                "Reformats ephemeris values of a Navigation RINEX",
                Kind::Navigation.extension(),
            ))
            .subcommand(fixer(
                "obs",
                "Removes duplicated epochs and observations of an Observation RINEX",
                Kind::Observation.extension(),
            ))
    }

    /// [Settings] of this run
    pub fn settings(&self) -> Settings {
        let (kind, matches) = match self.matches.subcommand() {
            Some(("nav", matches)) => (Kind::Navigation, matches),
            Some(("obs", matches)) => (Kind::Observation, matches),
            _ => unreachable!("subcommand is required"),
        };

        let input = matches
            .get_one::<PathBuf>("filepath")
            .cloned()
            .unwrap_or_default();

        Settings {
            kind,
            input,
            output: matches.get_one::<PathBuf>("output").cloned(),
            gzip: matches.get_flag("gzip"),
        }
    }
}
