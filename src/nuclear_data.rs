//! Nuclear data access
//!
//! The simulator never talks to storage directly. It consumes the
//! read-only queries of [`NuclearDataSource`]: isotope lookup, decay
//! paths, the (n,γ) product and the capture cross-section table.
//!
//! [`NuclearDatabase`] implements the contract over a single JSON
//! document shaped like the nuclear data export (elements, isotopes,
//! decay paths, neutron reactions, cross sections, gamma spectra).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SimulatorError};

/// Reaction label of neutron capture cross sections
pub const CAPTURE_REACTION: &str = "N,G";

/// Environment variable pointing at the nuclear data file
pub const DATA_PATH_ENV: &str = "TRANSMUTATION_DATA_PATH";

/// Default data file name
pub const DATA_FILE_NAME: &str = "nuclear_data.json";

/// Unique isotope identity: element symbol and mass number ("U-235")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsotopeKey {
    pub symbol: String,
    pub mass_number: u32,
}

impl IsotopeKey {
    pub fn new(symbol: impl Into<String>, mass_number: u32) -> Self {
        Self {
            symbol: symbol.into(),
            mass_number,
        }
    }
}

impl fmt::Display for IsotopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.symbol, self.mass_number)
    }
}

impl Serialize for IsotopeKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayType {
    Alpha,
    BetaMinus,
    BetaPlus,
    ElectronCapture,
    SpontaneousFission,
    ProtonEmission,
    NeutronEmission,
    Gamma,
    InternalTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    NGamma,
    NP,
    NAlpha,
    #[serde(rename = "n_2n")]
    N2n,
    NF,
    ND,
    NT,
    #[serde(rename = "n_3n")]
    N3n,
}

/// Field an element search matches against
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    #[default]
    All,
    Symbol,
    Name,
    #[value(name = "atomic_number")]
    AtomicNumber,
}

// ============================================================================
// Records of the data file
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub atomic_number: u32,
    pub symbol: String,
    pub name: String,
    pub atomic_mass: Option<f64>,
    pub density: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotopeRecord {
    pub element_symbol: String,
    pub mass_number: u32,
    pub half_life: Option<String>,
    #[serde(default)]
    pub decay_mode: String,
    #[serde(default)]
    pub is_stable: bool,
    pub abundance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayPathRecord {
    pub parent_element_symbol: String,
    pub parent_mass_number: u32,
    pub daughter_element_symbol: String,
    pub daughter_mass_number: u32,
    pub decay_type: DecayType,
    #[serde(default = "default_branching_ratio")]
    pub branching_ratio: f64,
    pub q_value: Option<f64>,
}

fn default_branching_ratio() -> f64 {
    1.0
}

impl DecayPathRecord {
    pub fn parent(&self) -> IsotopeKey {
        IsotopeKey::new(self.parent_element_symbol.clone(), self.parent_mass_number)
    }

    pub fn daughter(&self) -> IsotopeKey {
        IsotopeKey::new(self.daughter_element_symbol.clone(), self.daughter_mass_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutronReactionRecord {
    pub target_element_symbol: String,
    pub target_mass_number: u32,
    pub product_element_symbol: Option<String>,
    pub product_mass_number: Option<u32>,
    pub reaction_type: ReactionType,
    #[serde(default)]
    pub threshold_energy: f64,
    pub q_value: Option<f64>,
}

impl NeutronReactionRecord {
    pub fn target(&self) -> IsotopeKey {
        IsotopeKey::new(self.target_element_symbol.clone(), self.target_mass_number)
    }

    /// `None` when the reaction yields fragments rather than one isotope
    pub fn product(&self) -> Option<IsotopeKey> {
        match (&self.product_element_symbol, self.product_mass_number) {
            (Some(symbol), Some(mass_number)) => Some(IsotopeKey::new(symbol.clone(), mass_number)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionRecord {
    pub element_symbol: String,
    pub mass_number: u32,
    pub reaction: String,
    pub energy: f64,        // [eV]
    pub cross_section: f64, // [barn]
    pub uncertainty: Option<f64>,
    #[serde(default)]
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GammaLineRecord {
    pub element_symbol: String,
    pub mass_number: u32,
    pub energy: f64,    // [keV]
    pub intensity: f64, // [%]
    #[serde(default)]
    pub multipolarity: String,
}

/// Raw layout of the nuclear data file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NuclearDataFile {
    pub elements: Vec<ElementRecord>,
    pub isotopes: Vec<IsotopeRecord>,
    pub decay_paths: Vec<DecayPathRecord>,
    pub neutron_reactions: Vec<NeutronReactionRecord>,
    pub neutron_cross_sections: Vec<CrossSectionRecord>,
    pub gamma_spectra: Vec<GammaLineRecord>,
}

// ============================================================================
// Data-access contract
// ============================================================================

/// Static identity of an isotope as seen by the simulator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Isotope {
    pub element_symbol: String,
    pub element_name: String,
    pub atomic_number: u32,
    pub mass_number: u32,
    pub half_life: Option<String>,
    pub decay_mode: String,
    pub is_stable: bool,
    pub abundance: Option<f64>,
}

impl Isotope {
    pub fn key(&self) -> IsotopeKey {
        IsotopeKey::new(self.element_symbol.clone(), self.mass_number)
    }

    pub fn neutron_number(&self) -> u32 {
        self.mass_number.saturating_sub(self.atomic_number)
    }
}

/// One natural decay branch of an isotope
#[derive(Debug, Clone, PartialEq)]
pub struct DecayBranch {
    pub daughter: IsotopeKey,
    pub decay_type: DecayType,
    pub branching_ratio: f64,
}

/// Tabulated capture cross section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSectionPoint {
    pub energy: f64,        // [eV]
    pub cross_section: f64, // [barn]
}

/// Read-only queries the simulator runs against the nuclear data store.
///
/// Edges are reported as keys; resolving them through
/// [`NuclearDataSource::lookup_isotope`] may fail, which callers treat as
/// a missing edge.
pub trait NuclearDataSource {
    /// Element by symbol, case-insensitive
    fn lookup_element(&self, symbol: &str) -> Option<ElementRecord>;

    fn lookup_isotope(&self, symbol: &str, mass_number: u32) -> Option<Isotope>;

    fn decay_products(&self, isotope: &Isotope) -> Vec<DecayBranch>;

    /// Product of the (n,γ) reaction, if any
    fn capture_product(&self, isotope: &Isotope) -> Option<IsotopeKey>;

    /// Cross sections of the "N,G" reaction
    fn capture_cross_sections(&self, isotope: &Isotope) -> Vec<CrossSectionPoint>;
}

// ============================================================================
// JSON-backed store
// ============================================================================

/// In-memory nuclear data store with per-isotope indices
#[derive(Debug, Clone, Default)]
pub struct NuclearDatabase {
    data: NuclearDataFile,
    isotopes: HashMap<IsotopeKey, usize>,
    decay_paths: HashMap<IsotopeKey, Vec<usize>>,
    neutron_reactions: HashMap<IsotopeKey, Vec<usize>>,
    cross_sections: HashMap<IsotopeKey, Vec<usize>>,
    gamma_spectra: HashMap<IsotopeKey, Vec<usize>>,
}

fn group_by<T>(records: &[T], key: impl Fn(&T) -> IsotopeKey) -> HashMap<IsotopeKey, Vec<usize>> {
    let mut index: HashMap<IsotopeKey, Vec<usize>> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        index.entry(key(record)).or_default().push(i);
    }
    index
}

impl From<NuclearDataFile> for NuclearDatabase {
    fn from(data: NuclearDataFile) -> Self {
        let mut isotopes = HashMap::new();
        for (i, record) in data.isotopes.iter().enumerate() {
            // First record wins, like a unique (element, mass_number) constraint
            isotopes
                .entry(IsotopeKey::new(record.element_symbol.clone(), record.mass_number))
                .or_insert(i);
        }

        let decay_paths = group_by(&data.decay_paths, DecayPathRecord::parent);
        let neutron_reactions = group_by(&data.neutron_reactions, NeutronReactionRecord::target);
        let cross_sections = group_by(&data.neutron_cross_sections, |r| {
            IsotopeKey::new(r.element_symbol.clone(), r.mass_number)
        });
        let gamma_spectra = group_by(&data.gamma_spectra, |r| {
            IsotopeKey::new(r.element_symbol.clone(), r.mass_number)
        });

        Self {
            data,
            isotopes,
            decay_paths,
            neutron_reactions,
            cross_sections,
            gamma_spectra,
        }
    }
}

impl NuclearDatabase {
    /// Parse a nuclear data document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let data: NuclearDataFile = serde_json::from_str(json)?;
        Ok(Self::from(data))
    }

    /// Load a nuclear data file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let database = Self::from_json_str(&content)?;
        log::info!(
            "Loaded nuclear data from {}: {} elements, {} isotopes, {} decay paths, \
             {} neutron reactions, {} cross sections",
            path.display(),
            database.data.elements.len(),
            database.data.isotopes.len(),
            database.data.decay_paths.len(),
            database.data.neutron_reactions.len(),
            database.data.neutron_cross_sections.len(),
        );
        Ok(database)
    }

    /// Candidate data file locations, most specific first
    pub fn candidate_paths() -> Vec<PathBuf> {
        let candidates = [
            // Explicit override
            std::env::var(DATA_PATH_ENV).ok().map(PathBuf::from),
            Some(PathBuf::from("config").join(DATA_FILE_NAME)),
            Some(PathBuf::from("..").join("config").join(DATA_FILE_NAME)),
            // Next to the executable
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|dir| dir.join(DATA_FILE_NAME))),
        ];
        candidates.into_iter().flatten().collect()
    }

    /// Load from an explicit path, or from the first usable candidate.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidates = Self::candidate_paths();
        for path in &candidates {
            if !path.is_file() {
                continue;
            }
            match Self::load(path) {
                Ok(database) => return Ok(database),
                Err(e) => log::warn!("Skipping nuclear data candidate {}: {}", path.display(), e),
            }
        }

        let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
        Err(SimulatorError::DataUnavailable(format!(
            "no nuclear data file found (tried: {})",
            tried.join(", ")
        )))
    }

    pub fn elements(&self) -> &[ElementRecord] {
        &self.data.elements
    }

    pub fn isotope_count(&self) -> usize {
        self.isotopes.len()
    }

    fn element_by_symbol(&self, symbol: &str) -> Option<&ElementRecord> {
        let symbol = symbol.trim();
        self.data
            .elements
            .iter()
            .find(|element| element.symbol.eq_ignore_ascii_case(symbol))
    }

    fn records<'a, T>(
        index: &HashMap<IsotopeKey, Vec<usize>>,
        records: &'a [T],
        key: &IsotopeKey,
    ) -> Vec<&'a T> {
        index
            .get(key)
            .map(|ids| ids.iter().map(|&i| &records[i]).collect())
            .unwrap_or_default()
    }

    /// Decay paths leaving an isotope, in file order
    pub fn decay_paths_of(&self, key: &IsotopeKey) -> Vec<&DecayPathRecord> {
        Self::records(&self.decay_paths, &self.data.decay_paths, key)
    }

    /// Neutron reactions targeting an isotope, in file order
    pub fn neutron_reactions_of(&self, key: &IsotopeKey) -> Vec<&NeutronReactionRecord> {
        Self::records(&self.neutron_reactions, &self.data.neutron_reactions, key)
    }

    /// All cross-section records of an isotope, ordered by energy
    pub fn cross_sections_of(&self, key: &IsotopeKey) -> Vec<&CrossSectionRecord> {
        let mut records =
            Self::records(&self.cross_sections, &self.data.neutron_cross_sections, key);
        records.sort_by(|a, b| a.energy.total_cmp(&b.energy));
        records
    }

    /// Gamma lines of an isotope, ordered by energy
    pub fn gamma_lines_of(&self, key: &IsotopeKey) -> Vec<&GammaLineRecord> {
        let mut records = Self::records(&self.gamma_spectra, &self.data.gamma_spectra, key);
        records.sort_by(|a, b| a.energy.total_cmp(&b.energy));
        records
    }

    /// Elements matching a query, ordered by atomic number.
    ///
    /// An empty query matches every element. In [`SearchType::All`] an
    /// integer query matches the atomic number and anything else matches
    /// symbol or name as a case-insensitive substring.
    pub fn search_elements(
        &self,
        query: &str,
        search_type: SearchType,
        limit: usize,
    ) -> Vec<&ElementRecord> {
        let query = query.trim();
        let needle = query.to_lowercase();
        let atomic_number: Option<u32> = query.parse().ok();
        let symbol_matches = |e: &ElementRecord| e.symbol.to_lowercase().contains(&needle);
        let name_matches = |e: &ElementRecord| e.name.to_lowercase().contains(&needle);

        let mut matches: Vec<&ElementRecord> = self
            .data
            .elements
            .iter()
            .filter(|element| {
                if query.is_empty() {
                    return true;
                }
                match (search_type, atomic_number) {
                    (SearchType::Symbol, _) => symbol_matches(*element),
                    (SearchType::Name, _) => name_matches(*element),
                    (SearchType::AtomicNumber | SearchType::All, Some(z)) => {
                        element.atomic_number == z
                    }
                    (SearchType::AtomicNumber, None) => false,
                    (SearchType::All, None) => {
                        symbol_matches(*element) || name_matches(*element)
                    }
                }
            })
            .collect();
        matches.sort_by_key(|element| element.atomic_number);
        matches.truncate(limit);
        matches
    }
}

impl NuclearDataSource for NuclearDatabase {
    fn lookup_element(&self, symbol: &str) -> Option<ElementRecord> {
        self.element_by_symbol(symbol).cloned()
    }

    fn lookup_isotope(&self, symbol: &str, mass_number: u32) -> Option<Isotope> {
        let element = self.element_by_symbol(symbol)?;
        let key = IsotopeKey::new(element.symbol.clone(), mass_number);
        let record = &self.data.isotopes[*self.isotopes.get(&key)?];

        Some(Isotope {
            element_symbol: element.symbol.clone(),
            element_name: element.name.clone(),
            atomic_number: element.atomic_number,
            mass_number,
            half_life: record.half_life.clone(),
            decay_mode: record.decay_mode.clone(),
            is_stable: record.is_stable,
            abundance: record.abundance,
        })
    }

    fn decay_products(&self, isotope: &Isotope) -> Vec<DecayBranch> {
        self.decay_paths_of(&isotope.key())
            .into_iter()
            .map(|path| DecayBranch {
                daughter: path.daughter(),
                decay_type: path.decay_type,
                branching_ratio: path.branching_ratio,
            })
            .collect()
    }

    fn capture_product(&self, isotope: &Isotope) -> Option<IsotopeKey> {
        // First (n,γ) record decides, even when it carries no product
        self.neutron_reactions_of(&isotope.key())
            .into_iter()
            .find(|reaction| reaction.reaction_type == ReactionType::NGamma)?
            .product()
    }

    fn capture_cross_sections(&self, isotope: &Isotope) -> Vec<CrossSectionPoint> {
        Self::records(&self.cross_sections, &self.data.neutron_cross_sections, &isotope.key())
            .into_iter()
            .filter(|record| record.reaction == CAPTURE_REACTION)
            .map(|record| CrossSectionPoint {
                energy: record.energy,
                cross_section: record.cross_section,
            })
            .collect()
    }
}
