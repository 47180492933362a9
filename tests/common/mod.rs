use std::path::PathBuf;

use transmutation_simulator_lib::nuclear_data::{
    CrossSectionRecord, DecayPathRecord, DecayType, ElementRecord, IsotopeRecord,
    NeutronReactionRecord, NuclearDataFile, ReactionType,
};
use transmutation_simulator_lib::NuclearDatabase;

/// Sample dataset shipped with the crate
#[allow(dead_code)]
pub fn sample_data_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config").join("nuclear_data.json")
}

#[allow(dead_code)]
pub fn sample_database() -> NuclearDatabase {
    NuclearDatabase::load(sample_data_path()).expect("sample dataset loads")
}

/// In-memory nuclear data store. Every symbol gets an element record.
#[allow(dead_code)]
#[derive(Default)]
pub struct DataBuilder {
    file: NuclearDataFile,
}

#[allow(dead_code)]
impl DataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_element(&mut self, symbol: &str) {
        if self.file.elements.iter().any(|e| e.symbol == symbol) {
            return;
        }
        let atomic_number = self.file.elements.len() as u32 + 1;
        self.file.elements.push(ElementRecord {
            atomic_number,
            symbol: symbol.to_string(),
            name: format!("Element {}", symbol),
            atomic_mass: None,
            density: None,
        });
    }

    pub fn isotope(mut self, symbol: &str, mass_number: u32, half_life: &str) -> Self {
        self.ensure_element(symbol);
        self.file.isotopes.push(IsotopeRecord {
            element_symbol: symbol.to_string(),
            mass_number,
            half_life: Some(half_life.to_string()),
            decay_mode: String::new(),
            is_stable: half_life == "stable",
            abundance: None,
        });
        self
    }

    pub fn decay(
        mut self,
        parent: (&str, u32),
        daughter: (&str, u32),
        branching_ratio: f64,
    ) -> Self {
        self.file.decay_paths.push(DecayPathRecord {
            parent_element_symbol: parent.0.to_string(),
            parent_mass_number: parent.1,
            daughter_element_symbol: daughter.0.to_string(),
            daughter_mass_number: daughter.1,
            decay_type: DecayType::BetaMinus,
            branching_ratio,
            q_value: None,
        });
        self
    }

    /// (n,γ) reaction with a thermal capture cross section [barn]
    pub fn capture(mut self, target: (&str, u32), product: (&str, u32), sigma: f64) -> Self {
        self.file.neutron_reactions.push(NeutronReactionRecord {
            target_element_symbol: target.0.to_string(),
            target_mass_number: target.1,
            product_element_symbol: Some(product.0.to_string()),
            product_mass_number: Some(product.1),
            reaction_type: ReactionType::NGamma,
            threshold_energy: 0.0,
            q_value: None,
        });
        self.file.neutron_cross_sections.push(CrossSectionRecord {
            element_symbol: target.0.to_string(),
            mass_number: target.1,
            reaction: "N,G".to_string(),
            energy: 0.0253,
            cross_section: sigma,
            uncertainty: None,
            origin: String::new(),
        });
        self
    }

    pub fn build(self) -> NuclearDatabase {
        NuclearDatabase::from(self.file)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.file).expect("data file serializes")
    }
}
