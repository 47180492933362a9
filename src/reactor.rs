//! Isotope transmutation simulation
//!
//! This module contains the isotope graph and the reactor simulation.
//! The graph is the closure of a seed isotope over decay branches and
//! (n,γ) capture edges, with decay constants and cross sections resolved
//! once at build time. The simulator then integrates populations with
//! explicit (forward Euler) fixed time steps and records every step.
//!
//! Populations are not clamped: with a time step that is large compared
//! to 1/λ or 1/(Φσ) an amount can go negative. The caller picks Δt.

use indexmap::IndexMap;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::half_life;
use crate::nuclear_data::{Isotope, IsotopeKey, NuclearDataSource};

/// Physical constants
pub mod constants {
    /// 1 barn in cm²
    pub const BARN_CM2: f64 = 1.0e-24;
    /// Thermal neutron energy [eV]
    pub const THERMAL_ENERGY_EV: f64 = 0.025;
    /// Euler steps with rate × Δt above this are flagged
    pub const EULER_STABILITY_LIMIT: f64 = 1.0;
}

/// Simulation record of one isotope
#[derive(Debug, Clone)]
pub struct IsotopeState {
    pub isotope: Isotope,
    pub amount: f64,              // [atoms]
    pub decay_constant: f64,      // λ [1/s]
    pub cross_section: Option<f64>, // σ [barn] at the simulation energy
    /// (product index, branching ratio)
    pub decay_branches: Vec<(usize, f64)>,
    pub capture_product: Option<usize>,
}

impl IsotopeState {
    /// Activity [Bq]
    pub fn activity(&self) -> f64 {
        self.decay_constant * self.amount
    }

    pub fn half_life_seconds(&self) -> Option<f64> {
        half_life::half_life_from_decay_constant(self.decay_constant)
    }
}

/// Isotope states keyed by isotope, in insertion order.
///
/// Edges point at insertion indices of the same graph, so every edge
/// target is a member.
#[derive(Debug, Clone, Default)]
pub struct IsotopeGraph {
    states: IndexMap<IsotopeKey, IsotopeState>,
}

impl IsotopeGraph {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn contains(&self, key: &IsotopeKey) -> bool {
        self.states.contains_key(key)
    }

    pub fn index_of(&self, key: &IsotopeKey) -> Option<usize> {
        self.states.get_index_of(key)
    }

    pub fn get(&self, key: &IsotopeKey) -> Option<&IsotopeState> {
        self.states.get(key)
    }

    pub fn state(&self, index: usize) -> &IsotopeState {
        &self.states[index]
    }

    pub fn key(&self, index: usize) -> Option<&IsotopeKey> {
        self.states.get_index(index).map(|(key, _)| key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &IsotopeKey> {
        self.states.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IsotopeKey, &IsotopeState)> {
        self.states.iter()
    }

    /// Keys of the decay products of a state, in branch order
    pub fn decay_product_keys(&self, state: &IsotopeState) -> Vec<&IsotopeKey> {
        state
            .decay_branches
            .iter()
            .filter_map(|&(product, _)| self.key(product))
            .collect()
    }

    pub fn capture_product_key(&self, state: &IsotopeState) -> Option<&IsotopeKey> {
        state.capture_product.and_then(|product| self.key(product))
    }

    /// Current populations in insertion order
    pub fn amounts(&self) -> Array1<f64> {
        self.states.values().map(|state| state.amount).collect()
    }

    fn insert(&mut self, state: IsotopeState) -> usize {
        self.states.insert_full(state.isotope.key(), state).0
    }

    fn apply_changes(&mut self, changes: &Array1<f64>) {
        for (state, change) in self.states.values_mut().zip(changes.iter()) {
            state.amount += change;
        }
    }
}

// ============================================================================
// Graph builder
// ============================================================================

#[derive(Clone, Copy)]
enum EdgeKind {
    Decay(f64),
    Capture,
}

#[derive(Clone)]
struct PendingEdge {
    target: Isotope,
    kind: EdgeKind,
}

/// Traversal frame: a freshly inserted state and the edges still to link
struct Frame {
    index: usize,
    edges: Vec<PendingEdge>,
    next: usize,
}

/// Builds the isotope graph reachable from a seed.
///
/// Traversal is iterative and depth-first. A state is inserted before its
/// edges are followed, so revisiting a key (converging paths, cycles)
/// links to the existing state instead of rebuilding it.
pub struct GraphBuilder<'a, D: NuclearDataSource + ?Sized> {
    data: &'a D,
    energy: f64,
    graph: IsotopeGraph,
}

impl<'a, D: NuclearDataSource + ?Sized> GraphBuilder<'a, D> {
    pub fn new(data: &'a D, energy: f64) -> Self {
        Self {
            data,
            energy,
            graph: IsotopeGraph::default(),
        }
    }

    /// Add an isotope and everything reachable from it; returns its index.
    pub fn build(&mut self, seed: &Isotope, initial_amount: f64) -> usize {
        if let Some(index) = self.graph.index_of(&seed.key()) {
            return index;
        }

        let root = self.insert(seed.clone(), initial_amount);
        let mut stack = vec![Frame {
            index: root,
            edges: self.edges_of(seed),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(edge) = frame.edges.get(frame.next).cloned() else {
                stack.pop();
                continue;
            };
            frame.next += 1;
            let parent = frame.index;

            let (target, is_new) = match self.graph.index_of(&edge.target.key()) {
                Some(index) => (index, false),
                None => (self.insert(edge.target.clone(), 0.0), true),
            };

            let parent_state = &mut self.graph.states[parent];
            match edge.kind {
                EdgeKind::Decay(ratio) => parent_state.decay_branches.push((target, ratio)),
                EdgeKind::Capture => parent_state.capture_product = Some(target),
            }

            if is_new {
                stack.push(Frame {
                    index: target,
                    edges: self.edges_of(&edge.target),
                    next: 0,
                });
            }
        }

        root
    }

    pub fn graph(&self) -> &IsotopeGraph {
        &self.graph
    }

    pub fn finish(self) -> IsotopeGraph {
        self.graph
    }

    fn insert(&mut self, isotope: Isotope, amount: f64) -> usize {
        let decay_constant = half_life::decay_constant(isotope.half_life.as_deref());
        let cross_section = self.cross_section(&isotope);
        self.graph.insert(IsotopeState {
            isotope,
            amount,
            decay_constant,
            cross_section,
            decay_branches: Vec::new(),
            capture_product: None,
        })
    }

    /// Capture cross section tabulated closest to the simulation energy
    fn cross_section(&self, isotope: &Isotope) -> Option<f64> {
        let closest = self
            .data
            .capture_cross_sections(isotope)
            .into_iter()
            .min_by(|a, b| {
                (a.energy - self.energy)
                    .abs()
                    .total_cmp(&(b.energy - self.energy).abs())
            });
        if closest.is_none() {
            log::debug!("No capture cross section for {}", isotope.key());
        }
        closest.map(|point| point.cross_section)
    }

    /// Decay branches then the capture edge, resolved to isotopes.
    /// Unresolvable targets are dropped.
    fn edges_of(&self, isotope: &Isotope) -> Vec<PendingEdge> {
        let mut edges = Vec::new();

        for branch in self.data.decay_products(isotope) {
            match self.resolve(&branch.daughter) {
                Some(target) => edges.push(PendingEdge {
                    target,
                    kind: EdgeKind::Decay(branch.branching_ratio),
                }),
                None => log::debug!(
                    "Skipping decay {} -> {}: daughter not in data store",
                    isotope.key(),
                    branch.daughter
                ),
            }
        }

        if let Some(product) = self.data.capture_product(isotope) {
            match self.resolve(&product) {
                Some(target) => edges.push(PendingEdge {
                    target,
                    kind: EdgeKind::Capture,
                }),
                None => log::debug!(
                    "Skipping capture {} -> {}: product not in data store",
                    isotope.key(),
                    product
                ),
            }
        }

        edges
    }

    fn resolve(&self, key: &IsotopeKey) -> Option<Isotope> {
        self.data.lookup_isotope(&key.symbol, key.mass_number)
    }
}

// ============================================================================
// Time evolution table
// ============================================================================

/// Populations recorded at every time step.
///
/// Rows are time points, columns are isotopes in graph insertion order.
#[derive(Debug, Clone)]
pub struct TimeEvolution {
    isotopes: Vec<IsotopeKey>,
    times: Vec<f64>,
    populations: Array2<f64>,
}

impl TimeEvolution {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Recorded time points [s], increasing
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn isotopes(&self) -> &[IsotopeKey] {
        &self.isotopes
    }

    pub fn populations(&self) -> ArrayView2<'_, f64> {
        self.populations.view()
    }

    /// Population history of one isotope
    pub fn series(&self, key: &IsotopeKey) -> Option<ArrayView1<'_, f64>> {
        let column = self.isotopes.iter().position(|k| k == key)?;
        Some(self.populations.column(column))
    }

    /// Population of one isotope at the given row
    pub fn population(&self, row: usize, key: &IsotopeKey) -> Option<f64> {
        let series = self.series(key)?;
        series.get(row).copied()
    }

    /// All populations at the given row
    pub fn snapshot(&self, row: usize) -> Option<ArrayView1<'_, f64>> {
        (row < self.times.len()).then(|| self.populations.row(row))
    }
}

/// `{"<time>": {"<isotope>": amount}}`, ordered by time
impl Serialize for TimeEvolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Row<'a> {
            isotopes: &'a [IsotopeKey],
            amounts: ArrayView1<'a, f64>,
        }

        impl Serialize for Row<'_> {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.isotopes.len()))?;
                for (key, amount) in self.isotopes.iter().zip(self.amounts.iter()) {
                    map.serialize_entry(key, amount)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(self.times.len()))?;
        for (time, amounts) in self.times.iter().zip(self.populations.rows()) {
            let row = Row {
                isotopes: &self.isotopes,
                amounts,
            };
            map.serialize_entry(&format!("{:?}", time), &row)?;
        }
        map.end()
    }
}

// ============================================================================
// Simulator
// ============================================================================

/// Irradiation and integration settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub neutron_flux: f64, // Φ [n/cm²/s]
    pub time_step: f64,    // Δt [s]
    pub max_time: f64,     // [s]
    pub energy: f64,       // neutron energy [eV]
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            neutron_flux: 1.0e14,
            time_step: 1.0,
            max_time: 3600.0,
            energy: constants::THERMAL_ENERGY_EV,
        }
    }
}

/// Reactor simulation engine for one seed isotope
pub struct ReactorSimulator {
    params: SimulationParameters,
    graph: IsotopeGraph,
    time: f64,
    // Per-isotope rate coefficients, fixed with the graph topology
    decay_constants: Array1<f64>,
    capture_coefficients: Array1<f64>,
}

impl ReactorSimulator {
    /// Build the isotope graph from the seed and prepare the integrator
    pub fn new<D: NuclearDataSource + ?Sized>(
        data: &D,
        seed: &Isotope,
        initial_atoms: f64,
        params: SimulationParameters,
    ) -> Self {
        let mut builder = GraphBuilder::new(data, params.energy);
        builder.build(seed, initial_atoms);
        Self::from_graph(builder.finish(), params)
    }

    /// Simulator over an already built graph
    pub fn from_graph(graph: IsotopeGraph, params: SimulationParameters) -> Self {
        let decay_constants: Array1<f64> =
            graph.iter().map(|(_, state)| state.decay_constant).collect();
        let capture_coefficients: Array1<f64> = graph
            .iter()
            .map(|(_, state)| match state.cross_section {
                Some(sigma) => params.neutron_flux * (sigma * constants::BARN_CM2),
                None => 0.0,
            })
            .collect();

        Self {
            params,
            graph,
            time: 0.0,
            decay_constants,
            capture_coefficients,
        }
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn graph(&self) -> &IsotopeGraph {
        &self.graph
    }

    /// Current simulation time [s]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// (decay rate, capture rate) of one isotope [atoms/s]
    pub fn calculate_rates(&self, index: usize) -> (f64, f64) {
        let amount = self.graph.state(index).amount;
        (
            self.decay_constants[index] * amount,
            self.capture_coefficients[index] * amount,
        )
    }

    /// Isotopes whose combined decay and capture loss makes a single
    /// Euler step remove more than the whole population.
    pub fn stability_alerts(&self) -> Vec<String> {
        let dt = self.params.time_step;
        let mut alerts = Vec::new();

        for (i, key) in self.graph.keys().enumerate() {
            let decay = self.decay_constants[i] * dt;
            let capture = self.capture_coefficients[i] * dt;
            let loss = decay + capture;
            if loss > constants::EULER_STABILITY_LIMIT {
                alerts.push(format!(
                    "WARNING: {} loss per step (λ + Φσ)·Δt = {:.3} \
                     (decay {:.3}, capture {:.3}) exceeds {} (Euler step unstable)",
                    key,
                    loss,
                    decay,
                    capture,
                    constants::EULER_STABILITY_LIMIT
                ));
            }
        }

        for alert in &alerts {
            log::warn!("{}", alert);
        }
        alerts
    }

    /// Perform one Euler step.
    ///
    /// Every rate comes from the populations at the start of the step;
    /// all changes are applied together at the end.
    pub fn step(&mut self) {
        let dt = self.params.time_step;
        let amounts = self.graph.amounts();
        let decay_rates = &self.decay_constants * &amounts;
        let capture_rates = &self.capture_coefficients * &amounts;

        let mut changes = Array1::<f64>::zeros(self.graph.len());
        for (i, (_, state)) in self.graph.iter().enumerate() {
            // Atoms leaving by decay or capture
            changes[i] -= (decay_rates[i] + capture_rates[i]) * dt;

            for &(product, ratio) in &state.decay_branches {
                changes[product] += decay_rates[i] * ratio * dt;
            }
            if let Some(product) = state.capture_product {
                changes[product] += capture_rates[i] * dt;
            }
        }

        self.graph.apply_changes(&changes);
        self.time += self.params.time_step;
    }

    /// Run from the current time to `max_time`.
    ///
    /// Records, steps, then advances the clock while `time <= max_time`,
    /// so the last recorded point is the last multiple of Δt not above
    /// `max_time`.
    pub fn simulate(&mut self) -> Result<TimeEvolution> {
        let isotopes: Vec<IsotopeKey> = self.graph.keys().cloned().collect();
        let mut times = Vec::new();
        let mut rows = Vec::new();

        log::info!(
            "Simulating {} isotopes: Φ = {:e} n/cm²/s, Δt = {} s, t_max = {} s, E = {} eV",
            isotopes.len(),
            self.params.neutron_flux,
            self.params.time_step,
            self.params.max_time,
            self.params.energy
        );

        while self.time <= self.params.max_time {
            times.push(self.time);
            rows.extend(self.graph.iter().map(|(_, state)| state.amount));
            self.step();
        }

        let populations = Array2::from_shape_vec((times.len(), isotopes.len()), rows)?;
        log::info!("Simulation finished: {} time points recorded", times.len());

        Ok(TimeEvolution {
            isotopes,
            times,
            populations,
        })
    }
}
