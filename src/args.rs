use clap::Parser;

/// This is a tabulation program for STAR-PR (Allocated Score) elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the election: input files, candidates
    /// and rules. See the manual of the allocated_score crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, startab will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Otherwise it is printed on the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the file with the ballots. Setting this option overrides the
    /// files listed in the --config file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (list of comma-separated values or not specified) The names of the candidates, in the order of the
    /// columns of the input. By default, the first row of the input.
    #[clap(long, value_parser, use_value_delimiter = true, value_delimiter = ',')]
    pub candidates: Option<Vec<String>>,

    /// (default 3) The number of seats to fill.
    #[clap(short, long, value_parser)]
    pub winners: Option<u32>,

    /// If specified, ties are broken at random with this seed instead of using the order of the candidates.
    #[clap(long, value_parser)]
    pub random_seed: Option<u64>,

    /// If passed as an argument, ties are not broken by the number of ballots giving the maximum score.
    #[clap(long, takes_value = false)]
    pub no_five_star: bool,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
