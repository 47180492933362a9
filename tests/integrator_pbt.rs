mod common;

use common::DataBuilder;
use proptest::prelude::*;
use std::collections::HashSet;
use transmutation_simulator_lib::{NuclearDataSource, ReactorSimulator, SimulationParameters};

prop_compose! {
    fn arb_parameters()(
        time_step in 0.01f64..2.0,
        max_time in 0.0f64..50.0
    ) -> SimulationParameters {
        SimulationParameters {
            neutron_flux: 1.0e14,
            time_step,
            max_time,
            energy: 0.025,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_closed_network_conserves_atoms(
        params in arb_parameters(),
        half_life in 5.0f64..1000.0,
        ratio in 0.0f64..1.0,
        sigma in 0.0f64..1.0e6,
        initial in 1.0f64..1.0e12
    ) {
        // A decays to B or C, B captures into C; every product is a member
        let database = DataBuilder::new()
            .isotope("A", 1, &format!("{} s", half_life))
            .isotope("B", 1, "stable")
            .isotope("C", 1, "stable")
            .decay(("A", 1), ("B", 1), ratio)
            .decay(("A", 1), ("C", 1), 1.0 - ratio)
            .capture(("B", 1), ("C", 1), sigma)
            .build();
        let seed = database.lookup_isotope("A", 1).unwrap();
        let mut simulator = ReactorSimulator::new(&database, &seed, initial, params);
        let evolution = simulator.simulate().unwrap();

        prop_assert!(!evolution.is_empty());
        for row in evolution.populations().rows() {
            let total: f64 = row.iter().sum();
            prop_assert!((total - initial).abs() <= initial * 1e-9,
                "total {} drifted from {}", total, initial);
        }
    }

    #[test]
    fn test_time_points_are_steps_up_to_max_time(params in arb_parameters()) {
        let database = DataBuilder::new().isotope("A", 1, "stable").build();
        let seed = database.lookup_isotope("A", 1).unwrap();
        let mut simulator = ReactorSimulator::new(&database, &seed, 1.0, params);
        let evolution = simulator.simulate().unwrap();

        let times = evolution.times();
        prop_assert_eq!(times[0], 0.0);
        prop_assert!(times.windows(2).all(|w| w[1] > w[0]));
        prop_assert!(times.iter().all(|&t| t <= params.max_time));
        prop_assert!(simulator.time() > params.max_time);
    }

    #[test]
    fn test_graph_members_are_unique(links in prop::collection::vec((0u32..6, 0u32..6), 0..20)) {
        let mut builder = DataBuilder::new();
        for mass in 0..6 {
            builder = builder.isotope("N", mass, "10 s");
        }
        for &(from, to) in &links {
            builder = builder.decay(("N", from), ("N", to), 1.0);
        }
        let database = builder.build();
        let seed = database.lookup_isotope("N", 0).unwrap();
        let simulator =
            ReactorSimulator::new(&database, &seed, 1.0, SimulationParameters::default());

        let graph = simulator.graph();
        let keys: HashSet<_> = graph.keys().collect();
        prop_assert_eq!(keys.len(), graph.len());
        for (_, state) in graph.iter() {
            prop_assert!(state.decay_branches.iter().all(|&(product, _)| product < graph.len()));
        }
    }
}
