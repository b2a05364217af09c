// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn kind_arg(required: bool) -> Arg {
    let arg = Arg::new("type")
        .long("type")
        .short('t')
        .value_parser(["expense", "income"])
        .help("expense | income");
    if required {
        arg.required(true)
    } else {
        arg
    }
}

fn entry_args(cmd: Command, creating: bool) -> Command {
    cmd.arg(
        Arg::new("amount")
            .long("amount")
            .short('a')
            .required(creating)
            .allow_hyphen_values(true),
    )
    .arg(kind_arg(false))
    .arg(Arg::new("category").long("category").short('c').required(creating))
    .arg(Arg::new("sub").long("sub").help("Sub-category"))
    .arg(Arg::new("date").long("date").help("YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS (default: now)"))
    .arg(Arg::new("note").long("note").short('n'))
    .arg(Arg::new("ledger").long("ledger").help("Ledger id (default: active ledger)"))
}

fn filter_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("range")
            .long("range")
            .default_value("current_month")
            .help("current_month | prev_month | current_year | all"),
    )
    .arg(
        Arg::new("from")
            .long("from")
            .requires("to")
            .help("Custom range start, YYYY-MM-DD (overrides --range)"),
    )
    .arg(Arg::new("to").long("to").requires("from").help("Custom range end, YYYY-MM-DD"))
    .arg(Arg::new("ledger").long("ledger").help("Custom range: ledger id"))
    .arg(
        Arg::new("category")
            .long("category")
            .short('c')
            .action(ArgAction::Append)
            .help("Custom range: category name (repeatable)"),
    )
}

pub fn build_cli() -> Command {
    Command::new("miaoledger")
        .about("Local-first expense tracker with ledgers, category trees, AI entry and cloud sync")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Create the local database"))
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(entry_args(Command::new("add").about("Record a transaction"), true))
                .subcommand(entry_args(
                    Command::new("edit")
                        .about("Edit a transaction; omitted fields keep their value")
                        .arg(Arg::new("id").required(true)),
                    false,
                ))
                .subcommand(Command::new("rm").arg(Arg::new("id").required(true)))
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("ledger").long("ledger").help("Ledger id or 'all' (default: active)"))
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(
                            Arg::new("by-day")
                                .long("by-day")
                                .action(ArgAction::SetTrue)
                                .help("Group by day with daily totals"),
                        ),
                )),
        )
        .subcommand(
            Command::new("category")
                .about("Category trees")
                .subcommand(
                    Command::new("add")
                        .arg(kind_arg(true))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("icon").long("icon").default_value("🏷️"))
                        .arg(Arg::new("parent").long("parent").help("Add as a child of this root")),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(kind_arg(true))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("parent").long("parent").help("Remove a child of this root")),
                )
                .subcommand(json_flags(Command::new("list").arg(kind_arg(false)))),
        )
        .subcommand(
            Command::new("ledger")
                .about("Ledgers")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("icon").long("icon").default_value("📒")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("icon").long("icon")),
                )
                .subcommand(Command::new("rm").arg(Arg::new("id").required(true)))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("use")
                        .about("Set the active ledger ('all' for every ledger)")
                        .arg(Arg::new("id").required(true)),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly budget")
                .subcommand(Command::new("set").arg(Arg::new("amount").required(true).allow_hyphen_values(true)))
                .subcommand(json_flags(Command::new("show"))),
        )
        .subcommand(
            Command::new("report")
                .about("Summaries")
                .subcommand(json_flags(filter_args(
                    Command::new("summary").arg(
                        kind_arg(false)
                            .default_value("expense")
                            .help("Type used for the category breakdown"),
                    ),
                )))
                .subcommand(json_flags(filter_args(Command::new("trend"))))
                .subcommand(json_flags(filter_args(Command::new("days")))),
        )
        .subcommand(
            Command::new("smart")
                .about("Record from free text or voice via the assistant")
                .subcommand(
                    Command::new("text").arg(
                        Arg::new("input")
                            .required(true)
                            .num_args(1..)
                            .trailing_var_arg(true),
                    ),
                )
                .subcommand(
                    Command::new("voice")
                        .arg(Arg::new("file").long("file").required(true))
                        .arg(Arg::new("mime").long("mime").help("Audio MIME type (guessed from extension)")),
                ),
        )
        .subcommand(
            Command::new("ask")
                .about("Ask the assistant about your spending")
                .arg(Arg::new("question").num_args(0..).trailing_var_arg(true)),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("transactions")
                        .arg(Arg::new("format").long("format").default_value("json"))
                        .arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(Command::new("snapshot").arg(Arg::new("out").long("out").required(true))),
        )
        .subcommand(
            Command::new("import")
                .about("Import data (replaces existing)")
                .subcommand(Command::new("transactions").arg(Arg::new("path").long("path").required(true)))
                .subcommand(Command::new("snapshot").arg(Arg::new("path").long("path").required(true))),
        )
        .subcommand(
            Command::new("cloud")
                .about("Cloud sync")
                .subcommand(
                    Command::new("configure")
                        .arg(Arg::new("url").long("url").required(true))
                        .arg(Arg::new("key").long("key").required(true)),
                )
                .subcommand(Command::new("clear"))
                .subcommand(
                    Command::new("register")
                        .arg(Arg::new("email").long("email").required(true))
                        .arg(Arg::new("password").long("password").required(true)),
                )
                .subcommand(
                    Command::new("login")
                        .arg(Arg::new("email").long("email").required(true))
                        .arg(Arg::new("password").long("password").required(true)),
                )
                .subcommand(Command::new("logout"))
                .subcommand(Command::new("status"))
                .subcommand(Command::new("sync").about("Download cloud data and apply it locally"))
                .subcommand(Command::new("push").about("Upload local data now")),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(Command::new("shell").about("Interactive session (one sync timer across commands)"))
}
