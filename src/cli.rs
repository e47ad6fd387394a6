// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, crate_version, value_parser};

fn data_arg() -> Arg {
    arg!(--data <PATH> "Fund time series CSV (one row per fund and date)").required(true)
}

fn range_arg() -> Arg {
    arg!(--range <RANGE> "Trailing window: 1w|1m|3m|6m|1y or a count of trading dates")
        .required(false)
        .default_value("1w")
}

fn group_arg() -> Arg {
    arg!(--group <PYS> "Only funds of this classification group (PYŞ)").required(false)
}

fn output_args() -> [Arg; 3] {
    [
        arg!(--json "Print as pretty JSON"),
        arg!(--jsonl "Print as JSON lines"),
        arg!(--out <PATH> "Write the table to a CSV file").required(false),
    ]
}

pub fn build_cli() -> Command {
    Command::new("fundflow")
        .version(crate_version!())
        .about("Asset-class fund flows and composition shifts")
        .arg(
            arg!(--config <PATH> "Settings JSON (defaults to the platform config dir)")
                .required(false)
                .global(true),
        )
        .subcommand(
            Command::new("flows")
                .about("Flow windows, cumulative series and leaderboards")
                .subcommand(Command::new("horizons").about("List configured trailing windows"))
                .subcommand(
                    Command::new("groups")
                        .about("List classification groups present in the data")
                        .arg(data_arg()),
                )
                .subcommand(
                    Command::new("summary")
                        .about("Net flow per group over a trailing window")
                        .arg(data_arg())
                        .arg(range_arg())
                        .arg(group_arg())
                        .arg(
                            arg!(--by <KEY> "asset-class|fund|classification")
                                .required(false)
                                .default_value("asset-class"),
                        )
                        .args(output_args()),
                )
                .subcommand(
                    Command::new("cumulative")
                        .about("Running total of daily net flow")
                        .arg(data_arg())
                        .arg(group_arg())
                        .arg(
                            arg!(--by <KEY> "Split the series by asset-class|fund|classification")
                                .required(false),
                        )
                        .args(output_args()),
                )
                .subcommand(
                    Command::new("top")
                        .about("Top entities by net flow over a trailing window")
                        .arg(data_arg())
                        .arg(range_arg())
                        .arg(group_arg())
                        .arg(
                            arg!(--by <KEY> "asset-class|fund|classification")
                                .required(false)
                                .default_value("fund"),
                        )
                        .arg(
                            arg!(-n --limit <N> "How many rows to keep")
                                .required(false)
                                .value_parser(value_parser!(usize))
                                .default_value("10"),
                        )
                        .arg(arg!(--ascending "Rank smallest (largest outflow) first"))
                        .arg(
                            arg!(--include <TEXT> "Keep only names containing TEXT")
                                .required(false),
                        )
                        .arg(
                            arg!(--exclude <TEXT> "Drop names containing TEXT")
                                .required(false)
                                .conflicts_with("include"),
                        )
                        .arg(arg!(--regex "Treat --include/--exclude as regular expressions"))
                        .args(output_args()),
                ),
        )
        .subcommand(
            Command::new("compare")
                .about("Composition shift in basis points between dated snapshots")
                .arg(
                    arg!(--snapshot <LABEL_PATH>)
                        .help("Snapshot as LABEL=PATH, or PATH taking t, t-7, t-28 in order")
                        .required(true)
                        .action(ArgAction::Append),
                )
                .arg(
                    arg!(--date <DATE> "Reference date (labels t-N are dated from it)")
                        .required(false),
                )
                .arg(
                    arg!(--sort <KEY> "size|share|category|delta:<label>")
                        .required(false)
                        .default_value("size"),
                )
                .args(output_args()),
        )
        .subcommand(Command::new("settings").about("Show effective settings"))
}
