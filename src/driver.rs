//! # Generation driver
//!
//! Sequences plan generation over every selected (ISA, element type) unit
//! and hands the plans to a sink. Units are independent, so planning can
//! run on a rayon pool; results are always collected in the same order a
//! single thread would produce them.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::GeneratorConfig;
use crate::constants::LISTING_EXTENSION;
use crate::dispatch::EntryPointDispatcher;
use crate::emit::{output_file_name, ListingSink, PlanSink};
use crate::error::{GenError, GenResult};
use crate::isa::{BitonicIsa, ElementType, VectorIsa};
use crate::network::{
    GenerationPlan, NetworkBuilder, PlanHeader, Routine, RoutineKind, Step, TypeTarget,
};
use crate::simulate::{verify_plan, VerifyReport};

/// Generates the plan for one (ISA, element type) unit
///
/// # Arguments
///
/// * `ty` - Element type to generate for
/// * `isa` - Capability provider of the target ISA
/// * `config` - Code-shaping knobs for the run
///
/// # Returns
///
/// Sorters and mergers, then entry points, then the master dispatch
pub fn generate_for_type(
    ty: ElementType,
    isa: &dyn BitonicIsa,
    config: &GeneratorConfig,
) -> GenResult<GenerationPlan> {
    let builder = NetworkBuilder::new(isa, ty, config)?;
    let dispatcher = EntryPointDispatcher::new(&builder);

    let mut routines = builder.network_routines()?;
    routines.extend(dispatcher.entry_points()?);
    routines.push(dispatcher.master_dispatch());

    let policy = *builder.policy();
    info!(
        "{}.{}: {} routines, {} vectors x {} lanes",
        policy.isa,
        policy.element,
        routines.len(),
        policy.max_vectors,
        policy.lanes
    );

    Ok(GenerationPlan {
        header: PlanHeader::Unit {
            policy,
            partial: isa.partial_vector(ty)?,
            native_min_max: isa.native_min_max(ty)?,
            fallback_above: policy.coverage(),
        },
        routines,
    })
}

/// Generates the ISA-level plan selecting a master dispatch by element type
pub fn generate_entry_dispatch(
    isa: &dyn BitonicIsa,
    config: &GeneratorConfig,
) -> GenResult<GenerationPlan> {
    let mut targets = Vec::with_capacity(isa.supported_types().len());
    let mut width = 0;
    for &ty in isa.supported_types() {
        let builder = NetworkBuilder::new(isa, ty, config)?;
        width = width.max(builder.policy().max_vectors);
        targets.push(TypeTarget {
            element: ty,
            routine: EntryPointDispatcher::new(&builder).master_name(),
        });
    }
    if targets.is_empty() {
        return Err(GenError::configuration(format!(
            "{} advertises no element types",
            isa.isa()
        )));
    }

    let routine = Routine {
        name: format!("sort_{}", isa.isa().name().to_ascii_lowercase()),
        kind: RoutineKind::IsaDispatch,
        key: None,
        width,
        direction: None,
        inline: false,
        body: vec![Step::SelectType(targets)],
    };
    Ok(GenerationPlan {
        header: PlanHeader::Isa {
            isa: isa.isa(),
            elements: isa.supported_types().to_vec(),
        },
        routines: vec![routine],
    })
}

/// One generation unit: a per-type plan or the ISA-level dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitId {
    pub isa: VectorIsa,
    pub element: Option<ElementType>,
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.element {
            Some(ty) => write!(f, "{}.{}", self.isa, ty),
            None => write!(f, "{}", self.isa),
        }
    }
}

/// Outcome of [`Driver::write_all`]
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files written successfully, in unit order
    pub written: Vec<PathBuf>,
    /// Units whose emission failed
    pub failures: Vec<(String, GenError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs generation for every selected unit
#[derive(Debug, Clone)]
pub struct Driver {
    config: GeneratorConfig,
}

impl Driver {
    /// Create a driver after validating the run-wide settings
    pub fn new(config: GeneratorConfig) -> GenResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Every unit of the run, in output order
    ///
    /// For each ISA: its supported types in provider order, then the
    /// ISA-level dispatch.
    pub fn units(&self) -> Vec<UnitId> {
        let mut units = Vec::new();
        for isa in self.config.selected_isas() {
            for &ty in isa.provider().supported_types() {
                units.push(UnitId {
                    isa,
                    element: Some(ty),
                });
            }
            units.push(UnitId { isa, element: None });
        }
        units
    }

    /// Generate the plan for one unit
    pub fn plan_unit(&self, unit: UnitId) -> GenResult<GenerationPlan> {
        debug!("Planning {}", unit);
        let isa = unit.isa.provider();
        match unit.element {
            Some(ty) => generate_for_type(ty, isa, &self.config),
            None => generate_entry_dispatch(isa, &self.config),
        }
    }

    /// Generate every plan, in unit order
    ///
    /// Runs on a dedicated rayon pool when `jobs > 1`. The first error
    /// aborts the whole run.
    pub fn plan_all(&self) -> GenResult<Vec<GenerationPlan>> {
        let units = self.units();
        if self.config.jobs <= 1 {
            return units.into_iter().map(|u| self.plan_unit(u)).collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
            .map_err(|e| GenError::configuration(format!("cannot start worker pool: {}", e)))?;
        pool.install(|| units.par_iter().map(|&u| self.plan_unit(u)).collect())
    }

    /// Run the simulator over every per-type plan
    pub fn verify_all(&self, plans: &[GenerationPlan]) -> GenResult<Vec<VerifyReport>> {
        plans
            .iter()
            .filter(|plan| plan.element().is_some())
            .map(|plan| {
                let report = verify_plan(plan)?;
                info!("{}: {}", plan.unit_name(), report);
                Ok(report)
            })
            .collect()
    }

    /// Plan every unit and write each one as a listing file under `dir`
    pub fn write_all(&self, dir: &Path) -> GenResult<RunSummary> {
        self.write_all_with(dir, LISTING_EXTENSION, ListingSink::new)
    }

    /// Plan every unit and write each one to its own file under `dir`
    ///
    /// All plans are built before the first file is created, so a
    /// configuration error leaves `dir` untouched.
    pub fn write_all_with<S, F>(
        &self,
        dir: &Path,
        extension: &str,
        make_sink: F,
    ) -> GenResult<RunSummary>
    where
        S: PlanSink,
        F: Fn(BufWriter<File>) -> S,
    {
        let plans = self.plan_all()?;
        self.write_plans_with(&plans, dir, extension, make_sink)
    }

    /// Write already-built plans, one file per unit, under `dir`
    ///
    /// Each unit is written to a temporary file that is renamed into place
    /// only once its sink succeeds, so a failing unit leaves no file behind.
    /// The failure is recorded in the summary and the remaining units are
    /// still written.
    ///
    /// # Arguments
    ///
    /// * `plans` - Plans in unit order, typically from [`Driver::plan_all`]
    /// * `dir` - Output directory, created if missing
    /// * `extension` - File extension of the sink's format
    /// * `make_sink` - Wraps the buffered output file of one unit
    pub fn write_plans_with<S, F>(
        &self,
        plans: &[GenerationPlan],
        dir: &Path,
        extension: &str,
        make_sink: F,
    ) -> GenResult<RunSummary>
    where
        S: PlanSink,
        F: Fn(BufWriter<File>) -> S,
    {
        fs::create_dir_all(dir).map_err(|source| GenError::Emission {
            unit: dir.display().to_string(),
            source,
        })?;

        let mut summary = RunSummary::default();
        for plan in plans {
            let name = output_file_name(plan, extension);
            let path = dir.join(&name);
            let staging = dir.join(format!("{}.tmp", name));
            match write_unit(plan, &staging, &path, &make_sink) {
                Ok(()) => {
                    info!("Wrote {}", path.display());
                    summary.written.push(path);
                }
                Err(e) => {
                    // The staging file may not exist if creating it failed
                    let _ = fs::remove_file(&staging);
                    warn!("Skipping {}: {}", plan.unit_name(), e);
                    summary.failures.push((plan.unit_name(), e));
                }
            }
        }
        Ok(summary)
    }
}

/// Emit one plan into `staging`, then move it to `path`
fn write_unit<S, F>(plan: &GenerationPlan, staging: &Path, path: &Path, make_sink: &F) -> GenResult<()>
where
    S: PlanSink,
    F: Fn(BufWriter<File>) -> S,
{
    let emission = |source| GenError::Emission {
        unit: plan.unit_name(),
        source,
    };
    let file = File::create(staging).map_err(emission)?;
    {
        let mut sink = make_sink(BufWriter::new(file));
        sink.write_plan(plan)?;
    }
    fs::rename(staging, path).map_err(emission)
}
