//! CLI argument definitions for `mixgen-cli`.

use clap::{Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("mixgen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate blind source separation test mixtures")
        .arg_required_else_help(true)
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Suppress all log output"),
        )
        .subcommand(with_inputs(
            Command::new("generate")
                .about("Render every mixture and write it to the output folder"),
        ))
        .subcommand(with_inputs(
            Command::new("plan").about("Print the resolved iterations as JSON without rendering"),
        ))
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("options-json")
                        .about("Print a default options JSON payload")
                        .arg(
                            Arg::new("interferer-count")
                                .long("interferer-count")
                                .short('n')
                                .value_name("COUNT")
                                .default_value("1")
                                .help("Number of interferers per mixture"),
                        ),
                ),
        )
}

/// Arguments shared by commands that read a parameter set.
fn with_inputs(command: Command) -> Command {
    command
        .arg(
            Arg::new("target")
                .long("target")
                .short('t')
                .value_name("PATH")
                .action(ArgAction::Append)
                .required(true)
                .help("Target signal; repeat for one target per row"),
        )
        .arg(
            Arg::new("interferers")
                .long("interferers")
                .short('i')
                .value_name("PATH,PATH,...")
                .action(ArgAction::Append)
                .help("One row of interferers, one path per slot; repeat for more rows"),
        )
        .arg(
            Arg::new("options")
                .long("options")
                .short('o')
                .value_name("JSON")
                .help("Path to a JSON file with generation options"),
        )
        .arg(
            Arg::new("folder")
                .long("folder")
                .short('f')
                .value_name("DIR")
                .help("Output folder for cached mixtures"),
        )
        .arg(
            Arg::new("combine")
                .long("combine")
                .short('c')
                .value_name("MODE")
                .help("Combination mode: rows or all (detected when omitted)"),
        )
        .arg(
            Arg::new("fs")
                .long("fs")
                .value_name("HZ")
                .help("Sampling rate in Hz"),
        )
        .arg(
            Arg::new("PAIRS")
                .help("Option overrides as NAME VALUE pairs, e.g. tirs '[0, 5]'")
                .num_args(1..)
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .trailing_var_arg(true),
        )
}
