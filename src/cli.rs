// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn room_arg() -> Arg {
    Arg::new("room").long("room").required(true)
}

fn as_arg() -> Arg {
    Arg::new("as")
        .long("as")
        .help("Act as this member instead of the stored identity")
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn pair_args(cmd: Command) -> Command {
    cmd.arg(room_arg())
        .arg(Arg::new("from").long("from").required(true))
        .arg(Arg::new("to").long("to").required(true))
        .arg(as_arg())
}

pub fn build_cli() -> Command {
    Command::new("tripsplit")
        .version(crate_version!())
        .about("Shared trip expense ledger, pairwise settlement, and transfer request tracking")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("me")
                .about("Show or set the acting identity")
                .subcommand(
                    Command::new("set")
                        .about("Set who you are")
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(Command::new("show").about("Show who you are")),
        )
        .subcommand(
            Command::new("room")
                .about("Manage trip rooms and their members")
                .subcommand(
                    Command::new("add")
                        .about("Create a room")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("start").long("start").help("Trip start (YYYY-MM-DD)"))
                        .arg(Arg::new("end").long("end").help("Trip end (YYYY-MM-DD)"))
                        .arg(
                            Arg::new("members")
                                .long("members")
                                .help("Comma-separated member names"),
                        ),
                )
                .subcommand(Command::new("list").about("List rooms"))
                .subcommand(
                    Command::new("members")
                        .about("List a room's members")
                        .arg(room_arg()),
                )
                .subcommand(
                    Command::new("invite")
                        .about("Add a member to a room")
                        .arg(room_arg())
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a room and everything in it")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("expense")
                .about("Record and list shared expenses")
                .subcommand(
                    Command::new("add-equal")
                        .about("Record an expense split equally across participants")
                        .arg(room_arg())
                        .arg(Arg::new("title").long("title").required(true))
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("payer").long("payer").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("participants")
                                .long("participants")
                                .required(true)
                                .help("Comma-separated names sharing the cost (may include the payer)"),
                        ),
                )
                .subcommand(
                    Command::new("add-items")
                        .about("Record an itemized expense (per-person and shared lines)")
                        .arg(room_arg())
                        .arg(Arg::new("title").long("title").required(true))
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("payer").long("payer").required(true))
                        .arg(
                            Arg::new("item")
                                .long("item")
                                .required(true)
                                .action(ArgAction::Append)
                                .help("TITLE;per-person|shared;PRICE;USER,USER,... (repeatable)"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List a room's expenses")
                        .arg(room_arg())
                        .arg(Arg::new("date").long("date").help("Only this day (YYYY-MM-DD)")),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Remove an expense")
                        .arg(room_arg())
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        ),
                ),
        )
        .subcommand(
            Command::new("settle")
                .about("Compute who owes whom and track transfer requests")
                .subcommand(json_flags(
                    Command::new("view")
                        .about("Show transfers involving you (or everyone with --all)")
                        .arg(room_arg())
                        .arg(as_arg())
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .help("Show the full ledger, not just your transfers"),
                        ),
                ))
                .subcommand(pair_args(
                    Command::new("request").about("Ask the debtor to pay (READY -> REQUESTED)"),
                ))
                .subcommand(pair_args(
                    Command::new("resend").about("Nudge the debtor again (stays REQUESTED)"),
                ))
                .subcommand(pair_args(
                    Command::new("done").about("Record the payout as received (REQUESTED -> DONE)"),
                ))
                .subcommand(
                    Command::new("request-all")
                        .about("Request every transfer currently owed to you")
                        .arg(room_arg())
                        .arg(as_arg()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export room data")
                .subcommand(
                    Command::new("settlement")
                        .about("Export the settlement table")
                        .arg(room_arg())
                        .arg(Arg::new("format").long("format").required(true))
                        .arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(
                    Command::new("expenses")
                        .about("Export the expense ledger")
                        .arg(room_arg())
                        .arg(Arg::new("format").long("format").required(true))
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check stored data for inconsistencies"))
}
