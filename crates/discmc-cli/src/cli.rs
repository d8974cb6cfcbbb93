use clap::Parser;
use std::path::PathBuf;

const ABOUT: &str = "NVT - Run a Metropolis Monte Carlo trajectory of a very coarse grained \
two-dimensional configuration in the canonical (constant-N, constant-V, constant-T) ensemble.";
const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    name = "nvt",
    version,
    about = ABOUT,
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// The number of simulation steps to make.
    pub n_steps: usize,

    /// The number of steps between progress reports on standard output.
    pub print_frequency: usize,

    /// The temperature parameter 1/(kB T) that scales the force field
    /// energies.
    #[arg(allow_negative_numbers = true)]
    pub beta: f64,

    /// The pressure; accepted for compatibility with other ensembles (NPT,
    /// Gibbs) and not used by this one.
    #[arg(allow_negative_numbers = true)]
    pub pressure: f64,

    /// An existing file containing a valid configuration, read as the
    /// starting point.
    pub initial_config: PathBuf,

    /// The file to which the final configuration is written; an existing
    /// file with this name is overwritten.
    pub final_config: PathBuf,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Seed for the random number generator; drawn from entropy when absent
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Force-field parameter file (TOML); the built-in disc parameters are
    /// used when absent
    #[arg(long, value_name = "PATH")]
    pub forcefield: Option<PathBuf>,

    /// Topology file (TOML); the built-in single-disc topology is used when
    /// absent
    #[arg(long, value_name = "PATH")]
    pub topology: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_parsing() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_the_six_positional_arguments() {
        let cli = Cli::parse_from([
            "nvt", "10000", "1000", "2.5", "1.0", "start.cfg", "end.cfg",
        ]);
        assert_eq!(cli.n_steps, 10000);
        assert_eq!(cli.print_frequency, 1000);
        assert_eq!(cli.beta, 2.5);
        assert_eq!(cli.pressure, 1.0);
        assert_eq!(cli.initial_config, PathBuf::from("start.cfg"));
        assert_eq!(cli.final_config, PathBuf::from("end.cfg"));
        assert_eq!(cli.seed, None);
    }

    #[test]
    fn parses_options_alongside_the_positionals() {
        let cli = Cli::parse_from([
            "nvt",
            "--seed",
            "42",
            "-vv",
            "500",
            "100",
            "1.0",
            "-0.5",
            "a.cfg",
            "b.cfg",
        ]);
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.pressure, -0.5);
    }

    #[test]
    fn rejects_a_missing_positional_argument() {
        let result = Cli::try_parse_from(["nvt", "10000", "1000", "2.5", "1.0", "start.cfg"]);
        assert!(result.is_err(), "six positional arguments are required");
    }

    #[test]
    fn rejects_conflicting_verbosity_flags() {
        let result = Cli::try_parse_from([
            "nvt", "-v", "-q", "10", "1", "1.0", "1.0", "a.cfg", "b.cfg",
        ]);
        assert!(result.is_err(), "clap should reject conflicting flags");
    }
}
