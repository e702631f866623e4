use clap::{App, Arg, SubCommand};

mod command_demo;
mod command_receipt;

fn main() {
    env_logger::init();

    let matches = App::new("VoteLedger CLI")
        .version("0.1")
        .about("Casts and verifies votes against an in-process vote ledger")
        .subcommand(
            SubCommand::with_name("demo")
                .about("Run a full cast-and-verify round trip")
                .arg(
                    Arg::with_name("voters")
                        .long("voters")
                        .takes_value(true)
                        .help("Number of voters to simulate (default 5)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("decode")
                .about("Decode an encoded receipt blob")
                .arg(
                    Arg::with_name("INPUT")
                        .index(1)
                        .required(true)
                        .help("The encoded receipt"),
                )
                .arg(
                    Arg::with_name("format")
                        .long("format")
                        .takes_value(true)
                        .help("Receipt format: base64 or url (default base64)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("barcode")
                .about("Derive the 13-digit barcode for a receipt hash")
                .arg(
                    Arg::with_name("HASH")
                        .index(1)
                        .required(true)
                        .help("The receipt hash, prefix included"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("demo") {
        command_demo::command_demo(matches);
    } else if let Some(matches) = matches.subcommand_matches("decode") {
        command_receipt::command_decode(matches);
    } else if let Some(matches) = matches.subcommand_matches("barcode") {
        command_receipt::command_barcode(matches);
    }
}
