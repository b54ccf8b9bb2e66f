//! Stage-level checks on what the ISA providers hand to the builder

use bitonic_gen::isa::ShuffleClass;
use bitonic_gen::network::NetworkStage;
use bitonic_gen::{generate_for_type, Direction, GeneratorConfig, Step, VectorIsa};

#[test]
fn test_every_stage_pattern_is_an_involution() {
    let config = GeneratorConfig::default();
    for isa in VectorIsa::ALL {
        let provider = isa.provider();
        for &ty in provider.supported_types() {
            let plan = generate_for_type(ty, provider, &config).unwrap();
            let lanes = provider.native_width(ty).unwrap();
            let registers = plan.policy().unwrap().max_vectors;
            for routine in &plan.routines {
                for step in &routine.body {
                    if let Step::Stage(stage) = step {
                        assert!(stage.max_register() < registers, "{}", routine.name);
                        if let NetworkStage::Lanes { exchange, .. } = stage {
                            assert_eq!(exchange.pattern.len(), lanes);
                            assert!(exchange.pattern.is_involution(), "{}", routine.name);
                            // Low lanes are exactly the lower half of every pair
                            for lane in 0..lanes {
                                let partner = exchange.pattern.partner(lane);
                                assert_eq!(exchange.low_lanes.contains(lane), lane < partner);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_shuffle_classes_follow_lane_groups() {
    let config = GeneratorConfig::default();
    for isa in VectorIsa::ALL {
        let provider = isa.provider();
        for &ty in provider.supported_types() {
            let stages = provider.single_vector_sort(ty, Direction::Ascending).unwrap();
            let group = provider.lane_group_bytes() / ty.size_bytes();
            for stage in &stages {
                let crosses = stage.pattern.crosses_groups(group);
                assert_eq!(stage.shuffle == ShuffleClass::CrossLane, crosses);
            }
            let plan = generate_for_type(ty, provider, &config).unwrap();
            let any_cross = plan.routines.iter().flat_map(|r| &r.body).any(|s| {
                matches!(s, Step::Stage(NetworkStage::Lanes { exchange, .. }) if exchange.shuffle == ShuffleClass::CrossLane)
            });
            // Only registers wider than one 128-bit group ever cross
            assert_eq!(any_cross, provider.vector_bytes() > 16, "{}.{}", isa, ty);
        }
    }
}

#[test]
fn test_single_vector_stage_counts() {
    for isa in VectorIsa::ALL {
        let provider = isa.provider();
        for &ty in provider.supported_types() {
            let n = provider.native_width(ty).unwrap();
            let log = n.trailing_zeros() as usize;
            for d in Direction::BOTH {
                let sort = provider.single_vector_sort(ty, d).unwrap();
                assert_eq!(sort.len(), log * (log + 1) / 2);
                assert!(sort.iter().all(|s| s.direction == d));
                let merge = provider.single_vector_merge(ty, d).unwrap();
                assert_eq!(merge.len(), log);
            }
        }
    }
}
