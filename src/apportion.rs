use log::{debug, info, warn};

use apportionment::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::apportion::config_reader::*;
use crate::args::Args;

pub mod config_reader;
mod io_abacus;
mod io_common;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApportionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the output to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Unknown input provider {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Political group {pg_number} is not part of the election"))]
    UnknownPoliticalGroup { pg_number: u32 },
    #[snafu(display("Negative number of votes for political group {pg_number}"))]
    NegativeVotes { pg_number: u32 },
    #[snafu(display(
        "Political group {pg_number} has {total} votes, but its candidates have {candidate_total} votes"
    ))]
    CandidateVotesMismatch {
        pg_number: u32,
        total: i64,
        candidate_total: i64,
    },
    #[snafu(display(
        "The election summary counts {expected} votes on candidates, but the political groups have {actual} votes"
    ))]
    VotesCountMismatch { expected: i64, actual: i64 },
    #[snafu(display("Apportionment error: {source}"))]
    Apportionment { source: ApportionmentError },
    #[snafu(display(
        "No input: use --config, --election with --summary, or --seats with --votes"
    ))]
    MissingInput {},
    #[snafu(display("The seat assignment differs from the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ApportionResult<T> = Result<T, ApportionError>;

// Everything needed to run one apportionment, whatever the input was.
struct Election {
    name: String,
    input: ApportionmentInput,
    rules: ApportionmentRules,
    tiebreak: String,
    output_file: Option<String>,
}

fn election_from_config(config_path: &str) -> ApportionResult<Election> {
    let config_p = Path::new(config_path);
    let config = read_config(config_path)?;
    info!("config: {:?}", config);

    // Validate the rules:
    let rules = validate_rules(&config.rules)?;

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let abacus = match config.sources.provider.as_str() {
        "abacus" => io_abacus::read_abacus_input(
            &io_common::resolve_path(root_p, &config.sources.election_file),
            &io_common::resolve_path(root_p, &config.sources.summary_file),
        )?,
        x => {
            return UnknownProviderSnafu {
                provider: x.to_string(),
            }
            .fail()
        }
    };

    Ok(Election {
        name: config.output_settings.election_name.clone(),
        input: abacus.input,
        rules,
        tiebreak: config.rules.tiebreak_name(),
        output_file: config
            .output_settings
            .output_file
            .as_ref()
            .map(|f| io_common::resolve_path(root_p, f)),
    })
}

fn election_from_abacus(election_path: &str, summary_path: &str) -> ApportionResult<Election> {
    let abacus = io_abacus::read_abacus_input(election_path, summary_path)?;
    Ok(Election {
        name: abacus
            .name
            .unwrap_or_else(|| io_common::simplify_file_name(election_path)),
        input: abacus.input,
        rules: ApportionmentRules::DUTCH_MUNICIPAL,
        tiebreak: DRAWING_OF_LOTS.to_string(),
        output_file: None,
    })
}

fn election_from_votes(seats: u32, votes: &[i64]) -> ApportionResult<Election> {
    let mut political_groups: Vec<PoliticalGroupVotes> = Vec::new();
    for (idx, v) in votes.iter().enumerate() {
        let number = idx as u32 + 1;
        ensure!(*v >= 0, NegativeVotesSnafu { pg_number: number });
        let votes = match u32::try_from(*v) {
            Ok(x) => x,
            Err(_) => whatever!("Too many votes for political group {}: {}", number, v),
        };
        political_groups.push(PoliticalGroupVotes {
            number,
            votes,
            candidate_count: None,
        });
    }
    Ok(Election {
        name: "apportionment".to_string(),
        input: ApportionmentInput {
            seats,
            political_groups,
        },
        rules: ApportionmentRules::DUTCH_MUNICIPAL,
        tiebreak: DRAWING_OF_LOTS.to_string(),
        output_file: None,
    })
}

fn read_election(args: &Args) -> ApportionResult<Election> {
    let num_inputs = [
        args.config.is_some(),
        args.election.is_some() || args.summary.is_some(),
        args.seats.is_some() || args.votes.is_some(),
    ]
    .iter()
    .filter(|x| **x)
    .count();
    if num_inputs > 1 {
        whatever!(
            "Only one input can be used: {}",
            "--config, --election with --summary, or --seats with --votes"
        )
    }

    match (args, &args.config) {
        (_, Some(config_path)) => election_from_config(config_path),
        (
            Args {
                election: Some(election_path),
                summary: Some(summary_path),
                ..
            },
            None,
        ) => election_from_abacus(election_path, summary_path),
        (
            Args {
                seats: Some(seats),
                votes: Some(votes),
                ..
            },
            None,
        ) => election_from_votes(*seats, votes),
        _ => MissingInputSnafu {}.fail(),
    }
}

fn build_summary_js(election: &Election, result: &SeatAssignmentResult) -> JSValue {
    let seats = election.input.seats;
    let c = OutputConfig {
        election_name: election.name.clone(),
        seats,
        method: method_name(&election.rules.residual_seat_method, seats).to_string(),
        tiebreak: election.tiebreak.clone(),
    };
    json!({
        "config": c,
        "seat_assignment": result })
}

fn write_output(out: &str, contents: &str) -> ApportionResult<()> {
    if out == "stdout" {
        println!("{}", contents);
        return Ok(());
    }
    info!("Writing the seat assignment to {}", out);
    fs::write(out, contents).context(WritingOutputSnafu { path: out })
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> ApportionResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("reference: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    Ok(())
}

pub fn run_apportionment(args: &Args) -> ApportionResult<()> {
    let mut election = read_election(args)?;

    if let Some(mode) = &args.tiebreak {
        election.rules.tiebreak_mode = parse_tiebreak_mode(mode, args.random_seed)?;
        election.tiebreak = mode.clone();
    }
    info!(
        "Election {}: {} seats, {} political groups, rules: {:?}",
        election.name,
        election.input.seats,
        election.input.political_groups.len(),
        election.rules
    );

    let result = seat_assignment(&election.input, &election.rules).context(ApportionmentSnafu {})?;
    info!("Seats: {:?}", result.total_seats());

    // Assemble the final json
    let result_js = build_summary_js(&election, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out = args.out.clone().or_else(|| election.output_file.clone());
    match (out, &args.reference) {
        (Some(out), _) => write_output(&out, &pretty_js_stats)?,
        // Only the check is requested.
        (None, Some(_)) => {}
        (None, None) => write_output("stdout", &pretty_js_stats)?,
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(())
}

#[cfg(test)]
fn test_wrapper(test_name: &str) -> ApportionResult<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let test_dir = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name);
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}_config.json", test_dir, test_name)),
        reference: Some(format!("{}/{}_expected_summary.json", test_dir, test_name)),
        ..Args::default()
    };
    run_apportionment(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(test_name: &str) {
        let res = test_wrapper(test_name);
        assert!(res.is_ok(), "{}: {:?}", test_name, res);
    }

    #[test]
    fn municipal_23_seats() {
        check("municipal_23_seats");
    }

    #[test]
    fn absolute_majority() {
        check("absolute_majority");
    }

    #[test]
    fn candidate_limit() {
        check("candidate_limit");
    }

    #[test]
    fn random_tiebreak() {
        check("random_tiebreak");
    }

    #[test]
    fn drawing_of_lots() {
        let res = test_wrapper("drawing_of_lots");
        assert!(
            matches!(
                res,
                Err(ApportionError::Apportionment {
                    source: ApportionmentError::DrawingOfLotsRequired {
                        residual_seat_number: Some(2),
                        ..
                    }
                })
            ),
            "{:?}",
            res
        );
    }

    #[test]
    fn votes_from_the_command_line() {
        let election = election_from_votes(23, &[600, 302, 98, 99, 101]).unwrap();
        let result = seat_assignment(&election.input, &election.rules).unwrap();
        assert_eq!(result.total_seats(), vec![12, 6, 1, 2, 2]);
        let js = build_summary_js(&election, &result);
        assert_eq!(js["config"]["method"], "largestAverages");
        assert_eq!(js["config"]["tiebreak"], "drawingOfLots");
        assert_eq!(js["seat_assignment"]["quota"]["numerator"], 4);
    }

    #[test]
    fn negative_votes() {
        let res = election_from_votes(10, &[5, -1]);
        assert!(matches!(
            res,
            Err(ApportionError::NegativeVotes { pg_number: 2 })
        ));
    }

    #[test]
    fn missing_and_conflicting_inputs() {
        let res = run_apportionment(&Args::default());
        assert!(matches!(res, Err(ApportionError::MissingInput {})));

        let args = Args {
            config: Some("config.json".to_string()),
            seats: Some(3),
            votes: Some(vec![1, 2]),
            ..Args::default()
        };
        assert!(matches!(
            run_apportionment(&args),
            Err(ApportionError::Whatever { .. })
        ));
    }

    #[test]
    fn reference_mismatch() {
        let test_dir = format!("{}/tests/data/municipal_23_seats", env!("CARGO_MANIFEST_DIR"));
        let args = Args {
            seats: Some(23),
            votes: Some(vec![600, 302, 98, 99, 100]),
            tiebreak: Some("politicalGroupOrder".to_string()),
            reference: Some(format!("{}/municipal_23_seats_expected_summary.json", test_dir)),
            ..Args::default()
        };
        assert!(matches!(
            run_apportionment(&args),
            Err(ApportionError::ReferenceMismatch { .. })
        ));
    }
}
