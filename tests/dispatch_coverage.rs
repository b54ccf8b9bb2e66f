//! Length dispatch coverage across every generated unit

use bitonic_gen::{
    generate_for_type, Direction, GeneratorConfig, RoutineKind, Selection, VectorIsa,
};

#[test]
fn test_every_length_maps_to_exactly_one_entry() {
    let config = GeneratorConfig::default();
    for isa in VectorIsa::ALL {
        for &ty in isa.provider().supported_types() {
            let plan = generate_for_type(ty, isa.provider(), &config).unwrap();
            let table = plan.dispatch_table().unwrap();
            let policy = plan.policy().unwrap();
            assert_eq!(table.fallback_above, policy.max_vectors * policy.lanes);

            let mut previous = 0;
            for len in 0..=table.fallback_above {
                let entry = match table.select(len) {
                    Selection::Entry(entry) => entry,
                    Selection::Fallback => panic!("{} length {} fell back", plan.unit_name(), len),
                };
                assert!(entry.covers(len));
                assert_eq!(
                    table.entries.iter().filter(|e| e.covers(len)).count(),
                    1,
                    "{} length {}",
                    plan.unit_name(),
                    len
                );
                // Monotonic in the length
                assert!(entry.width >= previous);
                previous = entry.width;

                // The selected entry points exist in the plan
                for d in Direction::BOTH {
                    let routine = plan.find_named(entry.routine(d)).unwrap();
                    assert!(matches!(routine.kind, RoutineKind::EntryPoint { .. }));
                    assert_eq!(routine.direction, Some(d));
                }
            }
            for len in table.fallback_above + 1..table.fallback_above + 64 {
                assert_eq!(table.select(len), Selection::Fallback);
            }
        }
    }
}

#[test]
fn test_entries_tile_the_covered_range() {
    let config = GeneratorConfig::default().with_max_bitonic_sort_vectors(7);
    let plan = generate_for_type(
        bitonic_gen::ElementType::U32,
        VectorIsa::Avx512.provider(),
        &config,
    )
    .unwrap();
    let table = plan.dispatch_table().unwrap();

    assert_eq!(table.entries.len(), 7);
    assert_eq!(table.entries[0].min_len, 0);
    for pair in table.entries.windows(2) {
        assert_eq!(pair[0].max_len + 1, pair[1].min_len);
        assert_eq!(pair[1].width, pair[0].width + 1);
    }
    assert_eq!(table.entries.last().unwrap().max_len, table.fallback_above);
    assert_eq!(table.fallback_above, 7 * 16);
}

#[test]
fn test_length_zero_and_one() {
    let config = GeneratorConfig::default();
    let plan = generate_for_type(
        bitonic_gen::ElementType::F64,
        VectorIsa::Neon.provider(),
        &config,
    )
    .unwrap();
    let table = plan.dispatch_table().unwrap();
    for len in [0, 1] {
        match table.select(len) {
            Selection::Entry(entry) => assert_eq!(entry.width, 1),
            Selection::Fallback => panic!("length {} fell back", len),
        }
    }
}
