//! Transmutation Simulator - Main Entry Point
//!
//! Command-line front end: loads the nuclear data, runs a command and
//! prints the JSON result on stdout.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use transmutation_simulator_lib::commands::{self, *};
use transmutation_simulator_lib::{NuclearDatabase, Result, SearchType};

#[derive(Parser)]
#[command(name = "transmutation-simulator")]
#[command(about = "Isotope decay-chain and neutron-capture transmutation simulator")]
#[command(version)]
struct Cli {
    /// Nuclear data file (JSON); searched in default locations when omitted
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate decay and neutron capture of a seed isotope
    Simulate {
        /// JSON request file; overrides the flags below
        #[arg(long, conflicts_with_all = ["element", "mass_number"])]
        request: Option<PathBuf>,

        /// Element symbol of the seed isotope
        #[arg(short, long, required_unless_present = "request")]
        element: Option<String>,

        /// Mass number of the seed isotope
        #[arg(short = 'a', long, required_unless_present = "request")]
        mass_number: Option<u32>,

        /// Neutron flux [n/cm²/s]
        #[arg(long, default_value_t = DEFAULT_NEUTRON_FLUX)]
        neutron_flux: f64,

        /// Initial number of atoms
        #[arg(long, default_value_t = DEFAULT_INITIAL_ATOMS)]
        initial_atoms: f64,

        /// Simulated time [s]
        #[arg(long, default_value_t = DEFAULT_TIME)]
        time: f64,

        /// Time step [s]
        #[arg(long, default_value_t = DEFAULT_TIME_STEP)]
        time_step: f64,

        /// Neutron energy [eV]
        #[arg(long, default_value_t = DEFAULT_ENERGY)]
        energy: f64,
    },

    /// List the neutron cross sections of an isotope
    CrossSections { element: String, mass_number: u32 },

    /// List the gamma lines of an isotope
    GammaSpectrum { element: String, mass_number: u32 },

    /// Follow the primary decay chain of an isotope
    Chain { element: String, mass_number: u32 },

    /// Search elements by symbol, name or atomic number
    Search {
        query: String,

        /// Field to match the query against
        #[arg(long, value_enum, default_value_t = SearchType::All)]
        search_type: SearchType,
    },
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn read_request(path: &Path) -> Result<SimulationRequest> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn run(cli: Cli) -> Result<()> {
    let database = NuclearDatabase::discover(cli.data.as_deref())?;

    match cli.command {
        Commands::Simulate {
            request,
            element,
            mass_number,
            neutron_flux,
            initial_atoms,
            time,
            time_step,
            energy,
        } => {
            let request = match request {
                Some(path) => read_request(&path)?,
                None => SimulationRequest {
                    element_symbol: element.unwrap_or_default(),
                    mass_number: mass_number.unwrap_or_default(),
                    neutron_flux,
                    initial_atoms,
                    time,
                    time_step,
                    energy,
                },
            };
            let response = simulate_decay_chain(&database, &request)?;
            print_json(&response, cli.pretty)
        }
        Commands::CrossSections { element, mass_number } => {
            let listing = get_isotope_cross_sections(&database, &element, mass_number)?;
            print_json(&listing, cli.pretty)
        }
        Commands::GammaSpectrum { element, mass_number } => {
            let listing = get_isotope_gamma_spectrum(&database, &element, mass_number)?;
            print_json(&listing, cli.pretty)
        }
        Commands::Chain { element, mass_number } => {
            let chain = commands::decay_chain(&database, &element, mass_number)?;
            print_json(&chain, cli.pretty)
        }
        Commands::Search { query, search_type } => {
            print_json(&search_elements(&database, &query, search_type), cli.pretty)
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
