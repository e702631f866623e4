use std::str::FromStr;
use voteledger::*;

pub fn command_decode(matches: &clap::ArgMatches) {
    let blob = match matches.value_of("INPUT") {
        Some(blob) => blob,
        None => {
            eprintln!("voteledger decode: encoded receipt required");
            std::process::exit(1);
        }
    };

    let format = match ReceiptFormat::from_str(matches.value_of("format").unwrap_or("base64")) {
        Ok(format) => format,
        Err(e) => {
            eprintln!("voteledger decode: {}", e);
            std::process::exit(1);
        }
    };

    match format {
        ReceiptFormat::Base64 => {
            let record = match decode_receipt_from_base64(blob) {
                Ok(record) => record,
                Err(e) => {
                    eprintln!("voteledger decode: {}", e);
                    std::process::exit(1);
                }
            };
            println!("hash:        {}", record.hash);
            println!("timestamp:   {}", record.timestamp.to_rfc3339());
            println!("election id: {}", record.election_id);
        }
        ReceiptFormat::Url => {
            let value = match decode_from_url(blob) {
                Ok(value) => value,
                Err(e) => {
                    eprintln!("voteledger decode: {}", e);
                    std::process::exit(1);
                }
            };
            match serde_json::to_string_pretty(&value) {
                Ok(pretty) => println!("{}", pretty),
                Err(e) => {
                    eprintln!("voteledger decode: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

pub fn command_barcode(matches: &clap::ArgMatches) {
    let input = match matches.value_of("HASH") {
        Some(input) => input,
        None => {
            eprintln!("voteledger barcode: receipt hash required");
            std::process::exit(1);
        }
    };

    let hash = match ReceiptHash::from_str(input) {
        Ok(hash) => hash,
        Err(e) => {
            eprintln!("voteledger barcode: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", encode_to_barcode(&hash));
}
