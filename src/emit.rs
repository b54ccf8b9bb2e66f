//! Plan sinks and the reference listing format
//!
//! Production backends turn a [`GenerationPlan`] into target-language source.
//! The crate ships [`ListingSink`], a stable text rendering used by the CLI
//! and by tests that compare output across runs.

use std::io::{self, Write};

use crate::constants::{OUTPUT_FILE_MARKER, OUTPUT_FILE_PREFIX};
use crate::error::{GenError, GenResult};
use crate::network::{GenerationPlan, NetworkStage, PlanHeader, Routine, Step};

/// Consumer of generation plans
pub trait PlanSink {
    fn write_plan(&mut self, plan: &GenerationPlan) -> GenResult<()>;
}

/// Collects plans in memory
impl PlanSink for Vec<GenerationPlan> {
    fn write_plan(&mut self, plan: &GenerationPlan) -> GenResult<()> {
        self.push(plan.clone());
        Ok(())
    }
}

/// File name for `plan`, e.g. `BitonicSort.AVX2.int32.generated.lst`
pub fn output_file_name(plan: &GenerationPlan, extension: &str) -> String {
    format!(
        "{}.{}.{}.{}",
        OUTPUT_FILE_PREFIX,
        plan.unit_name(),
        OUTPUT_FILE_MARKER,
        extension
    )
}

/// Renders plans as a line-oriented listing
#[derive(Debug)]
pub struct ListingSink<W: Write> {
    out: W,
}

impl<W: Write> ListingSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, plan: &GenerationPlan) -> io::Result<()> {
        writeln!(
            self.out,
            "// Generated by bitonic-gen {}. Do not edit.",
            crate::VERSION
        )?;
        writeln!(self.out, "unit {}", plan.unit_name())?;
        match &plan.header {
            PlanHeader::Unit {
                policy,
                partial,
                native_min_max,
                fallback_above,
            } => {
                writeln!(self.out, "  lanes {}", policy.lanes)?;
                writeln!(self.out, "  max-vectors {}", policy.max_vectors)?;
                writeln!(self.out, "  merge-ceiling {}", policy.merge_ceiling)?;
                writeln!(self.out, "  fallback-above {}", fallback_above)?;
                writeln!(self.out, "  partial-vector {}", partial.name())?;
                let min_max = if *native_min_max { "native" } else { "emulated" };
                writeln!(self.out, "  min-max {}", min_max)?;
            }
            PlanHeader::Isa { elements, .. } => {
                let names: Vec<&str> = elements.iter().map(|e| e.name()).collect();
                writeln!(self.out, "  elements {}", names.join(","))?;
            }
        }
        for routine in &plan.routines {
            self.render_routine(routine)?;
        }
        writeln!(self.out, "end unit {}", plan.unit_name())?;
        self.out.flush()
    }

    fn render_routine(&mut self, routine: &Routine) -> io::Result<()> {
        write!(
            self.out,
            "routine {} {} width={}",
            routine.name,
            routine.kind.name(),
            routine.width
        )?;
        if let Some(d) = routine.direction {
            write!(self.out, " {}", d)?;
        }
        writeln!(self.out, " {}", if routine.inline { "inline" } else { "noinline" })?;

        for step in &routine.body {
            match step {
                Step::Stage(NetworkStage::Lanes { register, exchange }) => writeln!(
                    self.out,
                    "  exchange {} {} low={} {} {}",
                    reg(*register),
                    exchange.pattern,
                    exchange.low_lanes,
                    exchange.direction,
                    exchange.shuffle.name()
                )?,
                Step::Stage(NetworkStage::Vectors {
                    low,
                    high,
                    direction,
                }) => writeln!(self.out, "  minmax {} {} {}", reg(*low), reg(*high), direction)?,
                Step::Call { callee, first } => writeln!(
                    self.out,
                    "  call {} {}..{}",
                    callee,
                    reg(*first),
                    reg(first + callee.width - 1)
                )?,
                Step::Load {
                    vectors,
                    partial,
                    pad,
                } => writeln!(
                    self.out,
                    "  load {} {} pad={}",
                    vectors,
                    partial.name(),
                    pad.name()
                )?,
                Step::Store { vectors, partial } => {
                    writeln!(self.out, "  store {} {}", vectors, partial.name())?
                }
                Step::Dispatch(table) => {
                    writeln!(
                        self.out,
                        "  dispatch lanes={} fallback-above={}",
                        table.lanes, table.fallback_above
                    )?;
                    for entry in &table.entries {
                        writeln!(
                            self.out,
                            "    {}..={} {} {}",
                            entry.min_len, entry.max_len, entry.ascending, entry.descending
                        )?;
                    }
                }
                Step::SelectType(targets) => {
                    for target in targets {
                        writeln!(self.out, "  select {} {}", target.element, target.routine)?;
                    }
                }
            }
        }
        writeln!(self.out, "end")
    }
}

/// Registers are numbered from 1 in listings, as in hand-written kernels
fn reg(index: usize) -> String {
    format!("d{:02}", index + 1)
}

impl<W: Write> PlanSink for ListingSink<W> {
    fn write_plan(&mut self, plan: &GenerationPlan) -> GenResult<()> {
        self.render(plan).map_err(|source| GenError::Emission {
            unit: plan.unit_name(),
            source,
        })
    }
}

/// Render `plan` to a string
pub fn render_listing(plan: &GenerationPlan) -> GenResult<String> {
    let mut sink = ListingSink::new(Vec::new());
    sink.write_plan(plan)?;
    String::from_utf8(sink.into_inner()).map_err(|e| GenError::Emission {
        unit: plan.unit_name(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })
}
