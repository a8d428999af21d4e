use clap::Parser;

/// This is a seat apportionment program for list elections.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The configuration of the election in JSON format.
    /// For more information about the file format, read the documentation of the `apportionment::manual` module.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) The election definition in the Abacus format (seats and candidate lists).
    /// Must be used with --summary.
    #[clap(short, long, value_parser)]
    pub election: Option<String>,

    /// (file path, optional) The election summary in the Abacus format (votes per political group).
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (number, optional) The number of seats. Must be used with --votes.
    #[clap(long, value_parser)]
    pub seats: Option<u32>,

    /// (list of numbers, optional) The votes of every political group, in the order of the lists.
    #[clap(long, value_parser, multiple_values = true, allow_hyphen_values = true)]
    pub votes: Option<Vec<i64>>,

    /// (drawingOfLots, politicalGroupOrder, mostVotes or random) Overrides the tie-break mode of the rules.
    #[clap(long, value_parser)]
    pub tiebreak: Option<String>,

    /// (number) The seed of the random tie-break.
    #[clap(long, value_parser)]
    pub random_seed: Option<u32>,

    /// (file path, 'stdout' or empty) If specified, the seat assignment will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the seat assignment in JSON format. If provided, apportion will
    /// check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
