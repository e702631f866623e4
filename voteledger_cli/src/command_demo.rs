use chrono::{Duration, Utc};
use std::sync::Arc;
use voteledger::*;

pub fn command_demo(matches: &clap::ArgMatches) {
    let voters: u64 = match matches.value_of("voters").unwrap_or("5").parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("voteledger demo: --voters must be a number");
            std::process::exit(1);
        }
    };

    let store = Arc::new(MemStore::default());
    let secret = ReceiptSecret::generate();
    let audit = Arc::new(MemAuditLog::default());

    // Stand up a live demonstration election
    let now = Utc::now();
    let mut election = Election::new(
        "General Election",
        "Demonstration ballot",
        "North Ward",
        now - Duration::minutes(5),
        now + Duration::hours(1),
    );
    for (name, party, symbol) in &[
        ("Ada Lovelace", "Analytical Party", "gear"),
        ("Grace Hopper", "Compiler Party", "anchor"),
    ] {
        if let Err(e) = election.add_candidate(Candidate::new(name, party, symbol, 40)) {
            eprintln!("voteledger demo: bad candidate: {}", e);
            std::process::exit(1);
        }
    }
    let candidate_ids: Vec<_> = election.candidates.keys().cloned().collect();
    store.set_election(election.clone());

    let caster = VoteCaster::with_audit(store.clone(), secret.clone(), audit.clone());
    let verifier = ReceiptVerifier::with_audit(store.clone(), secret, audit.clone());

    for i in 0..voters {
        let voter_id = format!("voter-{}", i + 1);
        let candidate_id = candidate_ids[(i as usize) % candidate_ids.len()];

        let bundle = match caster.cast_vote(&voter_id, election.id, candidate_id) {
            Ok(bundle) => bundle,
            Err(e) => {
                eprintln!("voteledger demo: cast failed for {}: {}", voter_id, e);
                std::process::exit(1);
            }
        };
        println!("> {} got receipt {}", voter_id, bundle.hash);
        println!("  barcode: {}", bundle.barcode);

        match verifier.verify_encoded_receipt(&bundle.base64, ReceiptFormat::Base64) {
            Ok(verified) => println!(
                "  verified against {} ({})",
                verified.election_title, verified.constituency
            ),
            Err(e) => {
                eprintln!("voteledger demo: receipt did not verify: {}", e);
                std::process::exit(1);
            }
        }
    }

    // The double-vote guard in action
    match caster.cast_vote("voter-1", election.id, candidate_ids[0]) {
        Err(Error::DoubleVoteAttempt) => println!("> repeat cast rejected: one vote per voter"),
        Ok(_) => {
            eprintln!("voteledger demo: double vote was accepted");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("voteledger demo: unexpected error: {}", e);
            std::process::exit(1);
        }
    }

    println!("Tally:");
    let election = match store.election(election.id) {
        Some(election) => election,
        None => {
            eprintln!("voteledger demo: election disappeared from the store");
            std::process::exit(1);
        }
    };
    for candidate in election.candidates.values() {
        println!(
            "  {} ({}) got {} votes",
            candidate.name, candidate.party, candidate.vote_count
        );
    }

    let stats = store.chain_stats();
    println!(
        "Chain: {} block(s), {} transactions, difficulty {}",
        stats.chain_length, stats.total_transactions, stats.difficulty
    );
    println!("Audit entries: {}", audit.len());
}
