use crate::apportion::*;

use serde::{Deserialize, Serialize};

pub const DRAWING_OF_LOTS: &str = "drawingOfLots";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "electionName")]
    pub election_name: String,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
}

/// The summary of the configuration that is written with the results.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(rename = "electionName")]
    pub election_name: String,
    pub seats: u32,
    pub method: String,
    pub tiebreak: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "electionFile")]
    pub election_file: String,
    #[serde(rename = "summaryFile")]
    pub summary_file: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApportionRules {
    #[serde(rename = "residualSeatMethod")]
    pub residual_seat_method: Option<String>,
    #[serde(rename = "minimumSeatsForAverages")]
    pub minimum_seats_for_averages: Option<u32>,
    #[serde(rename = "remainderThreshold")]
    pub remainder_threshold: Option<String>,
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<JSValue>,
    #[serde(rename = "absoluteMajorityCorrection")]
    pub absolute_majority_correction: Option<bool>,
    #[serde(rename = "limitSeatsToCandidates")]
    pub limit_seats_to_candidates: Option<bool>,
}

impl ApportionRules {
    pub fn tiebreak_name(&self) -> String {
        self.tiebreak_mode
            .clone()
            .unwrap_or_else(|| DRAWING_OF_LOTS.to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApportionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub sources: FileSource,
    #[serde(default)]
    pub rules: ApportionRules,
}

pub fn read_config(path: &str) -> ApportionResult<ApportionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: &str) -> ApportionResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

// The seed is accepted both as a number and as a string.
fn read_js_int(x: &Option<JSValue>) -> Option<u32> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().and_then(|x| u32::try_from(x).ok()),
        Some(JSValue::String(s)) => s.parse::<u32>().ok(),
        _ => None,
    }
}

pub fn parse_tiebreak_mode(mode: &str, random_seed: Option<u32>) -> ApportionResult<TieBreakMode> {
    let res = match mode {
        DRAWING_OF_LOTS => TieBreakMode::Reject,
        "politicalGroupOrder" => TieBreakMode::PoliticalGroupOrder,
        "mostVotes" => TieBreakMode::MostVotes,
        "random" => match random_seed {
            Some(seed) => TieBreakMode::Lots(seed),
            None => whatever!("The random tiebreak mode requires a random seed"),
        },
        x => whatever!("Cannot use tiebreak mode {:?} (currently not implemented)", x),
    };
    Ok(res)
}

pub fn method_name(method: &ResidualSeatMethod, seats: u32) -> &'static str {
    if method.uses_averages(seats) {
        "largestAverages"
    } else {
        "largestRemainders"
    }
}

pub fn validate_rules(rules: &ApportionRules) -> ApportionResult<ApportionmentRules> {
    let defaults = ApportionmentRules::DUTCH_MUNICIPAL;
    let res = ApportionmentRules {
        residual_seat_method: match rules.residual_seat_method.as_deref() {
            None | Some("bySeatCount") => ResidualSeatMethod::BySeatCount {
                minimum_seats_for_averages: rules.minimum_seats_for_averages.unwrap_or(19),
            },
            Some("largestAverages") => ResidualSeatMethod::LargestAverages,
            Some("largestRemainders") => ResidualSeatMethod::LargestRemainders,
            Some(x) => {
                whatever!("Cannot use residual seat method {:?}: currently not implemented", x)
            }
        },
        remainder_threshold: match rules.remainder_threshold.as_deref() {
            None => defaults.remainder_threshold,
            Some(s) => match s.parse::<Fraction>() {
                Ok(f) if f <= Fraction::from(1u64) => f,
                x => whatever!("Failed to understand remainderThreshold option: {:?}", x),
            },
        },
        tiebreak_mode: parse_tiebreak_mode(
            &rules.tiebreak_name(),
            read_js_int(&rules.random_seed),
        )?,
        absolute_majority_correction: rules
            .absolute_majority_correction
            .unwrap_or(defaults.absolute_majority_correction),
        limit_seats_to_candidates: rules
            .limit_seats_to_candidates
            .unwrap_or(defaults.limit_seats_to_candidates),
    };
    Ok(res)
}
