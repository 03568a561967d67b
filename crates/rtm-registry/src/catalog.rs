//! PhaseField regression catalog
//!
//! Builds the full [`SuiteRegistry`] for the PhaseField component: the
//! benchmark table, the heat and pure-metal families and the composite
//! suites consumed by local, nightly and buildbot runs.

use std::path::Path;

use rtm_document::PatchList;

use crate::case::{register_case, Flags, Platform, TestCase};
use crate::error::CatalogError;
use crate::family::{
    Axis, Family, FciSet, Frequency, Refinement, Scheme, Var, EXACT_COMPARISON,
};
use crate::registry::SuiteRegistry;
use crate::templates::TemplateSource;

/// Component directory under the inputs root
pub const COMPONENT: &str = "PhaseField";

/// Suite holding the benchmark table
pub const BENCHMARK_SUITE: &str = "BENCHTEST";

struct Benchmark {
    name: &'static str,
    template: &'static str,
    processes: u32,
    max_time: Option<&'static str>,
    checkpoint: u32,
    output: u32,
    max_timesteps: u32,
}

const BENCHMARKS: &[Benchmark] = &[
    Benchmark {
        name: "benchmark01_cc",
        template: "benchmark01/benchmark01_cc_eps020_n063_k3e-02.ups",
        processes: 4,
        max_time: Some("100"),
        checkpoint: 500,
        output: 100,
        max_timesteps: 2001,
    },
    Benchmark {
        name: "benchmark01_nc",
        template: "benchmark01/benchmark01_nc_eps020_n064_k3e-02.ups",
        processes: 4,
        max_time: Some("100"),
        checkpoint: 500,
        output: 100,
        max_timesteps: 2001,
    },
    Benchmark {
        name: "benchmark02_cc",
        template: "benchmark02/benchmark02_cc_eps010_n062_k1e-04.ups",
        processes: 4,
        max_time: None,
        checkpoint: 1000,
        output: 20,
        max_timesteps: 4001,
    },
    Benchmark {
        name: "benchmark02_nc",
        template: "benchmark02/benchmark02_nc_eps010_n064_k1e-04.ups",
        processes: 4,
        max_time: None,
        checkpoint: 1000,
        output: 20,
        max_timesteps: 4001,
    },
    Benchmark {
        name: "benchmark03_cc",
        template: "benchmark03/benchmark03_cc_n063_k3e-04.ups",
        processes: 2,
        max_time: None,
        checkpoint: 3750,
        output: 750,
        max_timesteps: 15001,
    },
    Benchmark {
        name: "benchmark03_nc",
        template: "benchmark03/benchmark03_nc_n064_k3e-04.ups",
        processes: 2,
        max_time: None,
        checkpoint: 3750,
        output: 750,
        max_timesteps: 15001,
    },
    Benchmark {
        name: "benchmark04",
        template: "benchmark04/benchmark04_cc_n096.ups",
        processes: 4,
        max_time: None,
        checkpoint: 750,
        output: 15,
        max_timesteps: 3001,
    },
];

impl Benchmark {
    /// Patch list in directive form
    fn patches(&self) -> Result<PatchList, rtm_document::PatchError> {
        let mut directives = vec![(
            "delete",
            "/Uintah_specification/DataArchiver/outputInterval".to_string(),
        )];
        if let Some(max_time) = self.max_time {
            directives.push((
                "update",
                format!("/Uintah_specification/Time/maxTime: {max_time}"),
            ));
        }
        directives.extend([
            (
                "update",
                format!(
                    "/Uintah_specification/DataArchiver/checkpoint/@timestepInterval: {}",
                    self.checkpoint
                ),
            ),
            (
                "append",
                format!(
                    "/Uintah_specification/DataArchiver/filebase:elem:outputTimestepInterval: {}",
                    self.output
                ),
            ),
            (
                "append",
                format!(
                    "/Uintah_specification/Time/initTime:elem:max_Timesteps: {}",
                    self.max_timesteps
                ),
            ),
        ]);
        PatchList::from_directives(directives.iter().map(|(kind, text)| (*kind, text.as_str())))
    }

    fn case(&self, templates: &dyn TemplateSource) -> Result<TestCase, CatalogError> {
        let base = templates.load(Path::new(self.template))?;
        let document = self
            .patches()
            .and_then(|patches| patches.apply(&base))
            .map_err(|e| CatalogError::patch(self.name, e))?;
        Ok(register_case(
            self.name,
            document,
            self.processes,
            Platform::All,
            Flags::new().with(EXACT_COMPARISON),
        )?)
    }
}

/// Every PhaseField family, in suite definition order
#[must_use]
pub fn families() -> Vec<Family> {
    use Axis::{Dim, Fci, Scheme as Sch, Var as V};

    let heat = Frequency::new(50, 8);
    let hypre = Frequency::new(5, 2);
    let hypre_bc = Frequency::new(5, 5);
    let metal = Frequency::new(25, 1);

    vec![
        Family::new("HEAT", "heat", "heat_periodic", heat)
            .with_schemes(&[Scheme::Fe])
            .with_order(&[Dim, V]),
        Family::new("HEATBC", "heat", "heat_test", heat)
            .with_schemes(&[Scheme::Fe])
            .with_order(&[Dim, V]),
        Family::new("HEATAMR", "heat", "heat_periodic", heat)
            .with_schemes(&[Scheme::Fe])
            .with_refinement(Refinement::Amr(FciSet::Legacy))
            .with_order(&[Dim, Fci, V]),
        Family::new("HEATAMRBC", "heat", "heat_test", heat)
            .with_schemes(&[Scheme::Fe])
            .with_refinement(Refinement::Amr(FciSet::Legacy))
            .with_order(&[Dim, V, Fci]),
        Family::new("HEATHYPRE", "heat", "heat_periodic", hypre)
            .with_vars(&[Var::Cc])
            .with_schemes(&[Scheme::Be, Scheme::Cn])
            .with_order(&[Dim, V, Sch]),
        Family::new("HEATHYPREAMR", "heat", "heat_periodic", hypre)
            .with_vars(&[Var::Cc])
            .with_schemes(&[Scheme::Be, Scheme::Cn])
            .with_refinement(Refinement::AmrHypre(FciSet::New))
            .with_order(&[Dim, V, Sch, Fci]),
        Family::new("HEATHYPREAMRBC", "heat", "heat_test", hypre_bc)
            .with_vars(&[Var::Cc])
            .with_schemes(&[Scheme::Be, Scheme::Cn])
            .with_refinement(Refinement::AmrHypre(FciSet::New))
            .with_order(&[Dim, V, Sch, Fci]),
        Family::new("HEATHYPREFAC", "heat", "heat_periodic", hypre_bc)
            .with_vars(&[Var::Cc])
            .with_schemes(&[Scheme::Be, Scheme::Cn])
            .with_refinement(Refinement::AmrHypreSStructFac(FciSet::Legacy))
            .with_order(&[Dim, V, Sch, Fci]),
        Family::new("HEATHYPREFACBC", "heat", "heat_test", hypre_bc)
            .with_vars(&[Var::Cc])
            .with_schemes(&[Scheme::Be, Scheme::Cn])
            .with_refinement(Refinement::AmrHypreSStructFac(FciSet::Legacy))
            .with_order(&[Dim, V, Sch, Fci]),
        Family::new("PUREMETAL", "pure_metal", "pure_metal", metal).with_order(&[Dim, V]),
        Family::new("PUREMETALAMR", "pure_metal", "pure_metal", metal)
            .with_refinement(Refinement::Amr(FciSet::Legacy))
            .with_order(&[Dim, V, Fci]),
    ]
}

/// Composite suites and their parts, in definition order
#[must_use]
pub fn composites() -> Vec<(&'static str, Vec<&'static str>)> {
    const RELEASE: &[&str] = &[
        "BENCHTEST",
        "HEATMPITEST",
        "HEATBCMPITEST",
        "HEATAMRMPITEST",
        "HEATAMRBCMPITEST",
        "HEATHYPREMPITEST",
        "HEATHYPREAMRMPITEST",
        "HEATHYPREAMRBCMPITEST",
        "HEATHYPREFACMPITEST",
        "HEATHYPREFACBCMPITEST",
        "PUREMETALMPITEST",
        "PUREMETALAMRMPITEST",
    ];

    vec![
        (
            "AMRTESTS",
            vec![
                "HEATAMRTEST",
                "HEATAMRMPITEST",
                "HEATAMRBCTEST",
                "HEATAMRBCMPITEST",
                "HEATHYPREAMRTEST",
                "HEATHYPREAMRMPITEST",
                "HEATHYPREAMRBCTEST",
                "HEATHYPREAMRBCMPITEST",
                "PUREMETALAMRTEST",
                "PUREMETALAMRMPITEST",
            ],
        ),
        ("DEBUGTESTS", vec!["PUREMETALAMRMPITEST"]),
        ("LOCALTESTS", RELEASE.to_vec()),
        ("NIGHTLYTESTS", RELEASE.to_vec()),
        ("BUILDBOTTESTS", RELEASE.to_vec()),
    ]
}

/// Build the PhaseField registry from `templates`
///
/// Templates are resolved relative to the component directory
/// (`<inputs_root>/PhaseField`). The returned registry is validated.
///
/// # Errors
///
/// Fails on the first template that cannot be loaded or patched.
pub fn phasefield(templates: &dyn TemplateSource) -> Result<SuiteRegistry, CatalogError> {
    let mut registry = SuiteRegistry::new();

    let bench = BENCHMARKS
        .iter()
        .map(|b| b.case(templates))
        .collect::<Result<Vec<_>, _>>()?;
    registry.define_suite(BENCHMARK_SUITE, bench)?;

    for family in families() {
        let cases = family.cases(templates)?;
        registry.define_suite(family.serial_suite(), cases.serial)?;
        registry.define_suite(family.parallel_suite(), cases.parallel)?;
    }

    for (name, parts) in composites() {
        registry.define_composite(name, parts)?;
    }
    registry.validate()?;

    tracing::info!(
        suites = registry.len(),
        cases = registry.cases().count(),
        "PhaseField catalog built"
    );
    Ok(registry)
}
