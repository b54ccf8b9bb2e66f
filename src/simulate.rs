//! Plan simulator
//!
//! Executes the steps of a [`GenerationPlan`] on concrete lane values, the
//! way the generated code would run them on hardware registers. This is how
//! plans are verified without a target-language backend.

use std::cmp::Ordering;
use std::fmt;

use aligned_vec::AVec;
use num_traits::{Bounded, NumCast};

use crate::constants::{VERIFY_NOISE_SEED, VERIFY_VALUE_RANGE};
use crate::dispatch::Selection;
use crate::error::{GenError, GenResult};
use crate::isa::{ElementType, LaneExchange};
use crate::network::{
    Direction, GenerationPlan, NetworkKind, NetworkStage, Routine, RoutineKey, Sentinel, Step,
};

/// Register file alignment, one cache line covers the widest register
const REGISTER_ALIGN: usize = 64;

/// Guards against call cycles in malformed plans
const MAX_CALL_DEPTH: usize = 64;

/// Element types the simulator can run
pub trait LaneValue: Copy + PartialOrd + Bounded + NumCast + fmt::Debug + Send + Sync + 'static {
    const ELEMENT: ElementType;
}

macro_rules! lane_value {
    ($($t:ty => $e:ident),* $(,)?) => {
        $(impl LaneValue for $t {
            const ELEMENT: ElementType = ElementType::$e;
        })*
    };
}

lane_value!(i32 => I32, u32 => U32, f32 => F32, i64 => I64, u64 => U64, f64 => F64);

/// Whether `a` comes no later than `b` in `direction`
fn in_order<T: LaneValue>(a: T, b: T, direction: Direction) -> bool {
    match direction {
        Direction::Ascending => !(b < a),
        Direction::Descending => !(a < b),
    }
}

fn compare<T: LaneValue>(a: &T, b: &T, direction: Direction) -> Ordering {
    let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
    match direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
    }
}

fn sentinel<T: LaneValue>(pad: Sentinel) -> T {
    match pad {
        Sentinel::Max => T::max_value(),
        Sentinel::Min => T::min_value(),
    }
}

fn malformed(reason: impl Into<String>) -> GenError {
    GenError::MalformedPlan {
        reason: reason.into(),
    }
}

/// Which path [`Simulator::sort`] took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortPath {
    /// The named entry point sorted the data
    Network { entry: String, width: usize },
    /// The length was beyond coverage
    Fallback,
}

/// Runs the routines of one per-type plan
#[derive(Debug, Clone, Copy)]
pub struct Simulator<'p> {
    plan: &'p GenerationPlan,
    element: ElementType,
    lanes: usize,
}

impl<'p> Simulator<'p> {
    /// Create a simulator for a per-type plan
    pub fn new(plan: &'p GenerationPlan) -> GenResult<Self> {
        let policy = plan
            .policy()
            .ok_or_else(|| malformed(format!("{} has no element type to simulate", plan.unit_name())))?;
        Ok(Self {
            plan,
            element: policy.element,
            lanes: policy.lanes,
        })
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    fn check_type<T: LaneValue>(&self) -> GenResult<()> {
        if T::ELEMENT == self.element {
            Ok(())
        } else {
            Err(GenError::TypeMismatch {
                expected: self.element,
                found: T::ELEMENT,
            })
        }
    }

    /// Run the emitted network `key` over `values` in place
    ///
    /// `values` must hold exactly `key.width` registers worth of lanes.
    pub fn run_network<T: LaneValue>(&self, key: RoutineKey, values: &mut [T]) -> GenResult<()> {
        let routine = self.plan.find(&key).ok_or_else(|| GenError::UnknownRoutine { name: key.name() })?;
        self.run_routine(routine, values)
    }

    /// Run any sorter or merger routine over `values` in place
    ///
    /// The routine does not need to belong to the plan, but everything it
    /// calls does.
    pub fn run_routine<T: LaneValue>(&self, routine: &Routine, values: &mut [T]) -> GenResult<()> {
        self.check_type::<T>()?;
        let expected = routine.width * self.lanes;
        if values.len() != expected {
            return Err(malformed(format!(
                "{} works on {} lanes, got {}",
                routine.name,
                expected,
                values.len()
            )));
        }
        let mut regs = AVec::<T>::new(REGISTER_ALIGN);
        for &v in values.iter() {
            regs.push(v);
        }
        self.execute(&routine.body, &mut regs, 0, 0)?;
        values.copy_from_slice(&regs);
        Ok(())
    }

    /// Sort `data` the way the master dispatch would
    ///
    /// Lengths within coverage go through the selected entry point; longer
    /// ones are handed to the fallback sort.
    pub fn sort<T: LaneValue>(&self, direction: Direction, data: &mut [T]) -> GenResult<SortPath> {
        self.check_type::<T>()?;
        let table = self
            .plan
            .dispatch_table()
            .ok_or_else(|| malformed(format!("{} has no master dispatch", self.plan.unit_name())))?;

        let entry = match table.select(data.len()) {
            Selection::Fallback => {
                data.sort_by(|a, b| compare(a, b, direction));
                return Ok(SortPath::Fallback);
            }
            Selection::Entry(entry) => entry,
        };
        let name = entry.routine(direction);
        let routine = self
            .plan
            .find_named(name)
            .ok_or_else(|| GenError::UnknownRoutine { name: name.to_string() })?;

        let mut regs: Option<AVec<T>> = None;
        for step in &routine.body {
            match step {
                Step::Load { vectors, pad, .. } => {
                    let total = vectors * self.lanes;
                    if data.len() > total {
                        return Err(malformed(format!(
                            "{} loads {} lanes, input has {}",
                            name,
                            total,
                            data.len()
                        )));
                    }
                    let mut loaded = AVec::<T>::new(REGISTER_ALIGN);
                    for &v in data.iter() {
                        loaded.push(v);
                    }
                    for _ in data.len()..total {
                        loaded.push(sentinel(*pad));
                    }
                    regs = Some(loaded);
                }
                Step::Store { .. } => {
                    let file = regs.as_ref().ok_or_else(|| malformed(format!("{} stores before loading", name)))?;
                    let n = data.len();
                    data.copy_from_slice(&file[..n]);
                }
                other => {
                    let file = regs.as_mut().ok_or_else(|| malformed(format!("{} runs before loading", name)))?;
                    self.execute(std::slice::from_ref(other), file, 0, 0)?;
                }
            }
        }
        Ok(SortPath::Network {
            entry: name.to_string(),
            width: entry.width,
        })
    }

    fn execute<T: LaneValue>(&self, steps: &[Step], regs: &mut [T], base: usize, depth: usize) -> GenResult<()> {
        if depth > MAX_CALL_DEPTH {
            return Err(malformed("call depth exceeded"));
        }
        let n = self.lanes;
        let registers = regs.len() / n;
        for step in steps {
            match step {
                Step::Stage(stage) => {
                    if base + stage.max_register() >= registers {
                        return Err(malformed(format!(
                            "stage touches register {} of {}",
                            base + stage.max_register(),
                            registers
                        )));
                    }
                    match stage {
                        NetworkStage::Lanes { register, exchange } => {
                            let start = (base + register) * n;
                            exchange_lanes(&mut regs[start..start + n], exchange)?;
                        }
                        NetworkStage::Vectors {
                            low,
                            high,
                            direction,
                        } => {
                            for lane in 0..n {
                                let i = (base + low) * n + lane;
                                let j = (base + high) * n + lane;
                                if !in_order(regs[i], regs[j], *direction) {
                                    regs.swap(i, j);
                                }
                            }
                        }
                    }
                }
                Step::Call { callee, first } => {
                    let routine = self
                        .plan
                        .find(callee)
                        .ok_or_else(|| GenError::UnknownRoutine { name: callee.name() })?;
                    self.execute(&routine.body, regs, base + first, depth + 1)?;
                }
                other => {
                    return Err(malformed(format!("{:?} is not a network step", other)));
                }
            }
        }
        Ok(())
    }
}

/// Apply one intra-register compare-exchange
fn exchange_lanes<T: LaneValue>(reg: &mut [T], exchange: &LaneExchange) -> GenResult<()> {
    if exchange.pattern.len() != reg.len() {
        return Err(malformed(format!(
            "pattern {} does not fit a {}-lane register",
            exchange.pattern,
            reg.len()
        )));
    }
    let partner = exchange.pattern.apply(reg);
    for (lane, value) in reg.iter_mut().enumerate() {
        let (a, b) = (*value, partner[lane]);
        let first = if in_order(a, b, exchange.direction) { a } else { b };
        let second = if in_order(a, b, exchange.direction) { b } else { a };
        *value = if exchange.low_lanes.contains(lane) || exchange.pattern.partner(lane) == lane {
            first
        } else {
            second
        };
    }
    Ok(())
}

/// Result of [`verify_plan`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Sorters and mergers executed
    pub networks: usize,
    /// Lengths pushed through the master dispatch
    pub lengths: usize,
    /// Total inputs checked
    pub cases: usize,
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} networks and {} lengths verified over {} inputs",
            self.networks, self.lengths, self.cases
        )
    }
}

/// Deterministic verification inputs of `len` values
///
/// Reversed, organ-pipe, sawtooth, constant and pseudo-random noise. All
/// values are below [`VERIFY_VALUE_RANGE`].
pub fn verification_patterns(len: usize) -> Vec<Vec<u64>> {
    let reversed = (0..len as u64).rev().collect();
    let organ_pipe = (0..len as u64)
        .map(|i| {
            let mirrored = (len as u64).saturating_sub(1) - i;
            i.min(mirrored)
        })
        .collect();
    let sawtooth = (0..len as u64).map(|i| i % 7).collect();
    let constant = vec![42; len];

    let mut state = VERIFY_NOISE_SEED ^ len as u64;
    let noise = (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 33) % VERIFY_VALUE_RANGE
        })
        .collect();

    vec![reversed, organ_pipe, sawtooth, constant, noise]
}

fn to_lanes<T: LaneValue>(values: &[u64]) -> Vec<T> {
    values
        .iter()
        .map(|&v| <T as NumCast>::from(v).unwrap_or_else(T::max_value))
        .collect()
}

fn sorted_copy<T: LaneValue>(values: &[T], direction: Direction) -> Vec<T> {
    let mut expected = values.to_vec();
    expected.sort_by(|a, b| compare(a, b, direction));
    expected
}

/// Input accepted by a merger: a run sorted against `direction` followed by
/// a run sorted along it
fn merge_input<T: LaneValue>(values: &[T], direction: Direction) -> Vec<T> {
    let mid = values.len() / 2;
    let mut input = sorted_copy(&values[..mid], direction.reverse());
    input.extend(sorted_copy(&values[mid..], direction));
    input
}

fn verify_typed<T: LaneValue>(plan: &GenerationPlan) -> GenResult<VerifyReport> {
    let sim = Simulator::new(plan)?;
    let mut report = VerifyReport::default();

    for routine in plan.networks() {
        let key = match routine.key {
            Some(key) => key,
            None => continue,
        };
        let len = key.width * sim.lanes();
        for pattern in verification_patterns(len) {
            let values = to_lanes::<T>(&pattern);
            let mut lanes = match key.network {
                NetworkKind::Sort => values.clone(),
                NetworkKind::Merge => merge_input(&values, key.direction),
            };
            sim.run_routine(routine, &mut lanes)?;
            if lanes != sorted_copy(&values, key.direction) {
                return Err(malformed(format!(
                    "{} in {} produced {:?}",
                    routine.name,
                    plan.unit_name(),
                    lanes
                )));
            }
            report.cases += 1;
        }
        report.networks += 1;
    }

    if let Some(table) = plan.dispatch_table() {
        for len in 0..=table.fallback_above + 1 {
            for direction in Direction::BOTH {
                for pattern in verification_patterns(len) {
                    let mut data = to_lanes::<T>(&pattern);
                    let expected = sorted_copy(&data, direction);
                    sim.sort(direction, &mut data)?;
                    if data != expected {
                        return Err(malformed(format!(
                            "{} {} of length {} produced {:?}",
                            plan.unit_name(),
                            direction,
                            len,
                            data
                        )));
                    }
                    report.cases += 1;
                }
            }
            report.lengths += 1;
        }
    }
    Ok(report)
}

/// Execute every emitted network and every dispatch length of `plan`
///
/// Fails with [`GenError::MalformedPlan`] on the first wrong result.
pub fn verify_plan(plan: &GenerationPlan) -> GenResult<VerifyReport> {
    let element = plan
        .element()
        .ok_or_else(|| malformed(format!("{} has no element type to verify", plan.unit_name())))?;
    match element {
        ElementType::I32 => verify_typed::<i32>(plan),
        ElementType::U32 => verify_typed::<u32>(plan),
        ElementType::F32 => verify_typed::<f32>(plan),
        ElementType::I64 => verify_typed::<i64>(plan),
        ElementType::U64 => verify_typed::<u64>(plan),
        ElementType::F64 => verify_typed::<f64>(plan),
    }
}
