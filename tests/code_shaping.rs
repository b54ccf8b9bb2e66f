//! Inlining, unrolling and merger ceilings in generated plans

use bitonic_gen::network::NetworkKind;
use bitonic_gen::{
    generate_for_type, Direction, ElementType, GeneratorConfig, NetworkBuilder, RoutineKey,
    RoutineKind, Step, VectorIsa,
};

#[test]
fn test_inline_periodicity() {
    for period in 0..=5 {
        let config = GeneratorConfig::default().with_break_inline(period);
        let plan = generate_for_type(ElementType::I32, VectorIsa::Avx2.provider(), &config).unwrap();
        for routine in &plan.routines {
            match routine.kind {
                RoutineKind::MasterDispatch | RoutineKind::IsaDispatch => assert!(!routine.inline),
                _ => {
                    let expected = period == 0 || routine.width % period != 0;
                    assert_eq!(routine.inline, expected, "{} with period {}", routine.name, period);
                }
            }
        }
    }
}

#[test]
fn test_emission_order() {
    let config = GeneratorConfig::default().with_max_bitonic_sort_vectors(4);
    let plan = generate_for_type(ElementType::F64, VectorIsa::Avx512.provider(), &config).unwrap();
    let names: Vec<&str> = plan.routines.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "sort_01v_ascending",
            "sort_01v_merge_ascending",
            "sort_01v_descending",
            "sort_01v_merge_descending",
            "sort_02v_ascending",
            "sort_02v_descending",
            "merge_02v_ascending",
            "merge_02v_descending",
            "sort_03v_ascending",
            "sort_03v_descending",
            "sort_04v_ascending",
            "sort_04v_descending",
            "sort_01v_alt_ascending",
            "sort_01v_alt_descending",
            "sort_02v_alt_ascending",
            "sort_02v_alt_descending",
            "sort_03v_alt_ascending",
            "sort_03v_alt_descending",
            "sort_04v_alt_ascending",
            "sort_04v_alt_descending",
            "sort_double",
        ]
    );
}

#[test]
fn test_calls_only_reach_emitted_routines() {
    for unroll in 0..=5 {
        for ceiling in [1, 2, 4, 8] {
            let config = GeneratorConfig::default()
                .with_unroll_bitonic_sorters(unroll)
                .with_largest_merge_variant(VectorIsa::Neon, ceiling);
            let plan = generate_for_type(ElementType::I32, VectorIsa::Neon.provider(), &config).unwrap();
            for routine in &plan.routines {
                for callee in routine.callees() {
                    let target = plan.find(&callee);
                    assert!(
                        target.is_some(),
                        "{} calls missing {} (unroll {}, ceiling {})",
                        routine.name,
                        callee,
                        unroll,
                        ceiling
                    );
                }
            }
            // No merger above the ceiling, no routine below the unroll width
            for routine in plan.networks() {
                let key = routine.key.unwrap();
                if key.network == NetworkKind::Merge && key.width > 1 {
                    assert!(key.width <= ceiling);
                }
                if key.width == 1 {
                    assert_eq!(unroll, 0);
                } else {
                    assert!(key.width >= unroll);
                }
            }
        }
    }
}

#[test]
fn test_directions_are_mirror_images() {
    let config = GeneratorConfig::default();
    let builder = NetworkBuilder::new(VectorIsa::Avx2.provider(), ElementType::U32, &config).unwrap();
    for width in 1..=16 {
        let asc = builder.compounded_sorter(width, Direction::Ascending).unwrap();
        let desc = builder.compounded_sorter(width, Direction::Descending).unwrap();
        assert_eq!(asc.body.len(), desc.body.len());
        for (a, d) in asc.body.iter().zip(&desc.body) {
            match (a, d) {
                (Step::Call { callee: ca, first: fa }, Step::Call { callee: cd, first: fd }) => {
                    assert_eq!(fa, fd);
                    assert_eq!(ca.width, cd.width);
                    assert_eq!(ca.direction, cd.direction.reverse());
                }
                (Step::Stage(_), Step::Stage(_)) => {}
                other => panic!("steps differ in shape: {:?}", other),
            }
        }
    }
}

#[test]
fn test_configuration_errors_fail_fast() {
    let avx2 = VectorIsa::Avx2.provider();

    let config = GeneratorConfig::default().with_max_bitonic_sort_vectors(32);
    assert!(generate_for_type(ElementType::I32, avx2, &config)
        .unwrap_err()
        .is_configuration());

    let config = GeneratorConfig::default().with_largest_merge_variant(VectorIsa::Avx2, 16);
    assert!(generate_for_type(ElementType::I32, avx2, &config)
        .unwrap_err()
        .is_configuration());

    let builder = NetworkBuilder::new(avx2, ElementType::I32, &GeneratorConfig::default()).unwrap();
    assert!(builder.compounded_merger(16, Direction::Ascending).is_err());
    assert!(builder.routine(RoutineKey::sort(0, Direction::Ascending)).is_err());
}
