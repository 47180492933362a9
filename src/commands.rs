//! Request/response commands for the transmutation simulator
//!
//! These commands sit between a caller (the CLI, or any service that
//! embeds the library) and the simulator: they validate parameters,
//! resolve the seed isotope and shape the results.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulatorError};
use crate::nuclear_data::{
    CrossSectionRecord, DecayPathRecord, ElementRecord, GammaLineRecord, Isotope, IsotopeKey,
    NuclearDataSource, NuclearDatabase, SearchType,
};
use crate::reactor::{ReactorSimulator, SimulationParameters, TimeEvolution};

/// Maximum number of elements returned by a search
pub const SEARCH_LIMIT: usize = 50;

pub const DEFAULT_NEUTRON_FLUX: f64 = 1.0e14;
pub const DEFAULT_INITIAL_ATOMS: f64 = 1.0e20;
pub const DEFAULT_TIME: f64 = 3600.0;
pub const DEFAULT_TIME_STEP: f64 = 1.0;
pub const DEFAULT_ENERGY: f64 = 0.025;

/// Smallest accepted time step [s]
pub const MIN_TIME_STEP: f64 = 0.001;

fn default_neutron_flux() -> f64 {
    DEFAULT_NEUTRON_FLUX
}

fn default_initial_atoms() -> f64 {
    DEFAULT_INITIAL_ATOMS
}

fn default_time() -> f64 {
    DEFAULT_TIME
}

fn default_time_step() -> f64 {
    DEFAULT_TIME_STEP
}

fn default_energy() -> f64 {
    DEFAULT_ENERGY
}

/// Decay-chain simulation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub element_symbol: String,
    pub mass_number: u32,
    #[serde(default = "default_neutron_flux")]
    pub neutron_flux: f64, // [n/cm²/s]
    #[serde(default = "default_initial_atoms")]
    pub initial_atoms: f64,
    #[serde(default = "default_time")]
    pub time: f64, // [s]
    #[serde(default = "default_time_step")]
    pub time_step: f64, // [s]
    #[serde(default = "default_energy")]
    pub energy: f64, // [eV]
}

impl SimulationRequest {
    /// Request with default irradiation parameters
    pub fn new(element_symbol: impl Into<String>, mass_number: u32) -> Self {
        Self {
            element_symbol: element_symbol.into(),
            mass_number,
            neutron_flux: DEFAULT_NEUTRON_FLUX,
            initial_atoms: DEFAULT_INITIAL_ATOMS,
            time: DEFAULT_TIME,
            time_step: DEFAULT_TIME_STEP,
            energy: DEFAULT_ENERGY,
        }
    }

    /// Reject requests the simulator must not run
    pub fn validate(&self) -> Result<()> {
        let symbol = self.element_symbol.trim();
        if symbol.is_empty() {
            return Err(SimulatorError::invalid("element_symbol must not be empty"));
        }
        if symbol.chars().count() > 4 {
            return Err(SimulatorError::invalid(format!(
                "element_symbol '{}' is longer than 4 characters",
                symbol
            )));
        }
        if self.mass_number < 1 {
            return Err(SimulatorError::invalid("mass_number must be >= 1"));
        }

        let non_negative = [
            ("neutron_flux", self.neutron_flux),
            ("initial_atoms", self.initial_atoms),
            ("time", self.time),
            ("energy", self.energy),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulatorError::invalid(format!(
                    "{} must be a finite number >= 0 (got {})",
                    name, value
                )));
            }
        }

        if !self.time_step.is_finite() || self.time_step < MIN_TIME_STEP {
            return Err(SimulatorError::invalid(format!(
                "time_step must be a finite number >= {} (got {})",
                MIN_TIME_STEP, self.time_step
            )));
        }

        Ok(())
    }

    pub fn parameters(&self) -> SimulationParameters {
        SimulationParameters {
            neutron_flux: self.neutron_flux,
            time_step: self.time_step,
            max_time: self.time,
            energy: self.energy,
        }
    }
}

/// Final state of one isotope of the network
#[derive(Debug, Clone, Serialize)]
pub struct IsotopeSummary {
    pub isotope: Isotope,
    pub amount: f64,
    pub decay_constant: f64,
    pub cross_section: Option<f64>,
    pub half_life_seconds: Option<f64>,
    pub activity: f64, // [Bq]
    pub decay_products: Vec<String>,
    pub capture_product: Option<String>,
}

/// Response of a decay-chain simulation
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResponse {
    pub simulation_parameters: SimulationRequest,
    pub isotope_network: Vec<IsotopeSummary>,
    pub time_evolution: TimeEvolution,
    pub total_simulation_time: f64,
    pub time_points: Vec<f64>,
    pub alerts: Vec<String>,
}

impl SimulationResponse {
    pub fn isotope(&self, key: &str) -> Option<&IsotopeSummary> {
        self.isotope_network
            .iter()
            .find(|summary| summary.isotope.key().to_string() == key)
    }
}

/// Resolve a seed isotope, distinguishing unknown elements from unknown isotopes
pub fn resolve_isotope<D: NuclearDataSource + ?Sized>(
    data: &D,
    element_symbol: &str,
    mass_number: u32,
) -> Result<Isotope> {
    let element = data
        .lookup_element(element_symbol)
        .ok_or_else(|| SimulatorError::ElementNotFound(element_symbol.trim().to_string()))?;
    data.lookup_isotope(&element.symbol, mass_number).ok_or_else(|| {
        SimulatorError::IsotopeNotFound(IsotopeKey::new(element.symbol, mass_number).to_string())
    })
}

/// Simulate the transmutation network of one seed isotope
pub fn simulate_decay_chain<D: NuclearDataSource + ?Sized>(
    data: &D,
    request: &SimulationRequest,
) -> Result<SimulationResponse> {
    request.validate()?;
    let seed = resolve_isotope(data, &request.element_symbol, request.mass_number)?;

    let mut simulator =
        ReactorSimulator::new(data, &seed, request.initial_atoms, request.parameters());
    log::info!(
        "Built isotope network for {}: {} isotopes",
        seed.key(),
        simulator.graph().len()
    );

    let alerts = simulator.stability_alerts();
    let time_evolution = simulator.simulate()?;

    let graph = simulator.graph();
    let isotope_network = graph
        .iter()
        .map(|(_, state)| IsotopeSummary {
            isotope: state.isotope.clone(),
            amount: state.amount,
            decay_constant: state.decay_constant,
            cross_section: state.cross_section,
            half_life_seconds: state.half_life_seconds(),
            activity: state.activity(),
            decay_products: graph
                .decay_product_keys(state)
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            capture_product: graph.capture_product_key(state).map(ToString::to_string),
        })
        .collect();

    let mut time_points = time_evolution.times().to_vec();
    time_points.sort_by(f64::total_cmp);

    // Echo the request as accepted, with the symbol trimmed
    let simulation_parameters = SimulationRequest {
        element_symbol: request.element_symbol.trim().to_string(),
        ..request.clone()
    };

    Ok(SimulationResponse {
        simulation_parameters,
        isotope_network,
        time_evolution,
        total_simulation_time: request.time,
        time_points,
        alerts,
    })
}

// ============================================================================
// Read-only nuclear data queries
// ============================================================================

/// Cross-section table of one isotope
#[derive(Debug, Clone, Serialize)]
pub struct CrossSectionListing {
    pub isotope: Isotope,
    pub cross_sections: Vec<CrossSectionRecord>,
}

/// Gamma lines of one isotope
#[derive(Debug, Clone, Serialize)]
pub struct GammaSpectrumListing {
    pub isotope: Isotope,
    pub gamma_spectrum: Vec<GammaLineRecord>,
}

/// All neutron cross sections of an isotope, ordered by energy
pub fn get_isotope_cross_sections(
    database: &NuclearDatabase,
    element_symbol: &str,
    mass_number: u32,
) -> Result<CrossSectionListing> {
    let isotope = resolve_isotope(database, element_symbol, mass_number)?;
    let cross_sections = database
        .cross_sections_of(&isotope.key())
        .into_iter()
        .cloned()
        .collect();
    Ok(CrossSectionListing {
        isotope,
        cross_sections,
    })
}

/// Gamma spectrum of an isotope, ordered by energy
pub fn get_isotope_gamma_spectrum(
    database: &NuclearDatabase,
    element_symbol: &str,
    mass_number: u32,
) -> Result<GammaSpectrumListing> {
    let isotope = resolve_isotope(database, element_symbol, mass_number)?;
    let gamma_spectrum = database
        .gamma_lines_of(&isotope.key())
        .into_iter()
        .cloned()
        .collect();
    Ok(GammaSpectrumListing {
        isotope,
        gamma_spectrum,
    })
}

/// Search elements by symbol, name or atomic number
pub fn search_elements(
    database: &NuclearDatabase,
    query: &str,
    search_type: SearchType,
) -> Vec<ElementRecord> {
    database
        .search_elements(query, search_type, SEARCH_LIMIT)
        .into_iter()
        .cloned()
        .collect()
}

/// Primary decay chain: the first decay path of every isotope, starting at
/// the seed, until an isotope without decay paths or a repeated isotope.
pub fn decay_chain(
    database: &NuclearDatabase,
    element_symbol: &str,
    mass_number: u32,
) -> Result<Vec<DecayPathRecord>> {
    let seed = resolve_isotope(database, element_symbol, mass_number)?;
    let mut visited = vec![seed.key()];
    let mut chain = Vec::new();
    let mut current = seed.key();

    while let Some(path) = database.decay_paths_of(&current).into_iter().next() {
        chain.push(path.clone());
        current = path.daughter();
        if visited.contains(&current) {
            break;
        }
        visited.push(current.clone());
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_json() {
        let request: SimulationRequest =
            serde_json::from_str(r#"{"element_symbol": "U", "mass_number": 235}"#).unwrap();
        assert_eq!(request, SimulationRequest::new("U", 235));
        assert_eq!(request.neutron_flux, 1.0e14);
        assert_eq!(request.initial_atoms, 1.0e20);
        assert_eq!(request.time, 3600.0);
        assert_eq!(request.time_step, 1.0);
        assert_eq!(request.energy, 0.025);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(SimulationRequest::new("U", 235).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        type Mutation = Box<dyn Fn(&mut SimulationRequest)>;
        fn set(mutate: impl Fn(&mut SimulationRequest) + 'static) -> Mutation {
            Box::new(mutate)
        }

        let cases: Vec<(&str, Mutation)> = vec![
            ("element_symbol", set(|r| r.element_symbol = "  ".to_string())),
            ("element_symbol", set(|r| r.element_symbol = "Uranium".to_string())),
            ("mass_number", set(|r| r.mass_number = 0)),
            ("neutron_flux", set(|r| r.neutron_flux = -1.0)),
            ("initial_atoms", set(|r| r.initial_atoms = f64::NAN)),
            ("time", set(|r| r.time = -5.0)),
            ("energy", set(|r| r.energy = f64::INFINITY)),
            ("time_step", set(|r| r.time_step = 0.0)),
            ("time_step", set(|r| r.time_step = -1.0)),
        ];

        for (field, mutate) in cases {
            let mut request = SimulationRequest::new("U", 235);
            mutate(&mut request);
            match request.validate() {
                Err(SimulatorError::InvalidParameters(msg)) => {
                    assert!(msg.contains(field), "{} not in '{}'", field, msg)
                }
                other => panic!("expected InvalidParameters for {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_minimum_time_step_is_accepted() {
        let mut request = SimulationRequest::new("U", 235);
        request.time_step = MIN_TIME_STEP;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_invalid_request_fails_before_lookup() {
        let database = NuclearDatabase::default();
        let mut request = SimulationRequest::new("U", 235);
        request.time_step = 0.0;
        let err = simulate_decay_chain(&database, &request).unwrap_err();
        assert!(matches!(err, SimulatorError::InvalidParameters(_)));
    }

    #[test]
    fn test_unknown_element_is_not_found() {
        let database = NuclearDatabase::default();
        let err = simulate_decay_chain(&database, &SimulationRequest::new("Xx", 1)).unwrap_err();
        assert!(matches!(err, SimulatorError::ElementNotFound(ref s) if s == "Xx"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_response_echoes_trimmed_symbol() {
        let database = NuclearDatabase::from_json_str(
            r#"{
                "elements": [{"atomic_number": 26, "symbol": "Fe", "name": "Iron"}],
                "isotopes": [{"element_symbol": "Fe", "mass_number": 56, "half_life": "stable"}]
            }"#,
        )
        .unwrap();
        let mut request = SimulationRequest::new(" fe ", 56);
        request.time = 2.0;
        let response = simulate_decay_chain(&database, &request).unwrap();

        assert_eq!(response.simulation_parameters.element_symbol, "fe");
        assert_eq!(response.simulation_parameters.time, 2.0);
        assert_eq!(response.isotope_network[0].isotope.element_symbol, "Fe");
    }
}
