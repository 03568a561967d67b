//! Parametrized test families
//!
//! A [`Family`] is a Cartesian product over a small set of axes (dimension,
//! variable layout, time scheme, fine/coarse interface). Every combination
//! names a template, and derives one serial and one `_mpi` test case from it
//! with the same output-frequency patches.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use rtm_document::{DocPath, PatchList};

use crate::case::{register_case, Flags, Platform, TestCase};
use crate::error::CatalogError;
use crate::templates::TemplateSource;

/// Flag attached to every generated case
pub const EXACT_COMPARISON: &str = "exactComparison";

/// Process count of the `_mpi` variant
pub const MPI_PROCESSES: u32 = 4;

const OUTPUT_INTERVAL: &str = "/Uintah_specification/DataArchiver/outputTimestepInterval";
const CHECKPOINT_INTERVAL: &str = "/Uintah_specification/DataArchiver/checkpoint/@timestepInterval";
const MAX_TIMESTEPS: &str = "/Uintah_specification/Time/initTime:elem:max_Timesteps";

macro_rules! axis_value {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every value in canonical order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Name fragment used in case and template names
            #[inline]
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

axis_value!(
    /// Problem dimension
    Dim { D2 => "2d", D3 => "3d" }
);

axis_value!(
    /// Variable layout: cell- or node-centered
    Var { Cc => "cc", Nc => "nc" }
);

axis_value!(
    /// Time integration scheme
    Scheme { Fe => "fe", Be => "be", Cn => "cn" }
);

axis_value!(
    /// Fine/coarse interface treatment
    Fci {
        Fc0 => "fc0",
        Fc1 => "fc1",
        FcSimple => "fcsimple",
        FcLinear => "fclinear",
        FcBilinear => "fcbilinear",
        Fc0New => "fc0new",
        Fc1New => "fc1new",
    }
);

/// Which interface treatments a refined family enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FciSet {
    /// Five treatments in 2D, two in 3D
    Legacy,
    /// `fc0new`, `fc1new` in both dimensions
    New,
}

impl FciSet {
    /// Treatments available in `dim`
    #[must_use]
    pub const fn for_dim(self, dim: Dim) -> &'static [Fci] {
        match (self, dim) {
            (Self::Legacy, Dim::D2) => &[Fci::Fc0, Fci::Fc1, Fci::FcSimple, Fci::FcLinear, Fci::FcBilinear],
            (Self::Legacy, Dim::D3) => &[Fci::Fc0, Fci::Fc1],
            (Self::New, _) => &[Fci::Fc0New, Fci::Fc1New],
        }
    }

    /// Treatments available in any dimension
    #[must_use]
    pub const fn all(self) -> &'static [Fci] {
        self.for_dim(Dim::D2)
    }
}

/// Mesh refinement flavour, selecting the name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Refinement {
    /// Single level, no suffix
    #[default]
    None,
    /// `_amr_{fci}`
    Amr(FciSet),
    /// `_amr_hypre_{fci}`
    AmrHypre(FciSet),
    /// `_amr_hypre_sstruct_fac_{fci}`
    AmrHypreSStructFac(FciSet),
}

impl Refinement {
    #[inline]
    #[must_use]
    pub const fn fci_set(self) -> Option<FciSet> {
        match self {
            Self::None => None,
            Self::Amr(set) | Self::AmrHypre(set) | Self::AmrHypreSStructFac(set) => Some(set),
        }
    }

    fn suffix(self, fci: Option<Fci>) -> String {
        let stem = match self {
            Self::None => return String::new(),
            Self::Amr(_) => "_amr",
            Self::AmrHypre(_) => "_amr_hypre",
            Self::AmrHypreSStructFac(_) => "_amr_hypre_sstruct_fac",
        };
        match fci {
            Some(fci) => format!("{stem}_{fci}"),
            None => stem.to_string(),
        }
    }
}

/// Output frequency per dimension
///
/// Checkpoints are written every `5f` timesteps and runs stop after `20f + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frequency {
    pub two_d: u32,
    pub three_d: u32,
}

impl Frequency {
    #[inline]
    #[must_use]
    pub const fn new(two_d: u32, three_d: u32) -> Self {
        Self { two_d, three_d }
    }

    /// Output interval `f`
    #[inline]
    #[must_use]
    pub const fn output(self, dim: Dim) -> u32 {
        match dim {
            Dim::D2 => self.two_d,
            Dim::D3 => self.three_d,
        }
    }

    /// Checkpoint interval `5f`
    #[inline]
    #[must_use]
    pub const fn checkpoint(self, dim: Dim) -> u32 {
        5 * self.output(dim)
    }

    /// Timestep cap `20f + 1`
    #[inline]
    #[must_use]
    pub const fn max_timesteps(self, dim: Dim) -> u32 {
        20 * self.output(dim) + 1
    }

    /// The three frequency patches for `dim`
    ///
    /// # Errors
    ///
    /// Never in practice; the paths are constants.
    pub fn patches(self, dim: Dim) -> Result<PatchList, rtm_document::PathError> {
        Ok(PatchList::new()
            .update(OUTPUT_INTERVAL.parse::<DocPath>()?, self.output(dim).to_string())
            .update(CHECKPOINT_INTERVAL.parse::<DocPath>()?, self.checkpoint(dim).to_string())
            .append(MAX_TIMESTEPS.parse::<DocPath>()?, self.max_timesteps(dim).to_string()))
    }
}

/// Enumeration axes, listed outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Dim,
    Var,
    Scheme,
    Fci,
}

impl Axis {
    /// Canonical nesting order
    pub const CANONICAL: [Self; 4] = [Self::Dim, Self::Var, Self::Scheme, Self::Fci];
}

/// One point of a family's parameter space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Combination {
    pub dim: Dim,
    pub var: Var,
    pub scheme: Option<Scheme>,
    pub fci: Option<Fci>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Partial {
    dim: Option<Dim>,
    var: Option<Var>,
    scheme: Option<Scheme>,
    fci: Option<Fci>,
}

/// Serial and `_mpi` cases of one family, in enumeration order
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyCases {
    pub serial: Vec<TestCase>,
    pub parallel: Vec<TestCase>,
}

/// A Cartesian-product group of test cases sharing a naming scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    label: String,
    directory: String,
    problem: String,
    dims: Vec<Dim>,
    vars: Vec<Var>,
    schemes: Vec<Scheme>,
    refinement: Refinement,
    frequency: Frequency,
    order: Vec<Axis>,
}

impl Family {
    /// Create a family over both dimensions and variable layouts
    ///
    /// `directory` is the template subdirectory, `problem` the name stem.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        directory: impl Into<String>,
        problem: impl Into<String>,
        frequency: Frequency,
    ) -> Self {
        Self {
            label: label.into(),
            directory: directory.into(),
            problem: problem.into(),
            dims: Dim::ALL.to_vec(),
            vars: Var::ALL.to_vec(),
            schemes: Vec::new(),
            refinement: Refinement::None,
            frequency,
            order: Axis::CANONICAL.to_vec(),
        }
    }

    #[must_use]
    pub fn with_vars(mut self, vars: &[Var]) -> Self {
        self.vars = vars.to_vec();
        self
    }

    /// Schemes to enumerate; an empty list leaves the scheme out of names
    #[must_use]
    pub fn with_schemes(mut self, schemes: &[Scheme]) -> Self {
        self.schemes = schemes.to_vec();
        self
    }

    #[must_use]
    pub fn with_refinement(mut self, refinement: Refinement) -> Self {
        self.refinement = refinement;
        self
    }

    /// Axis nesting order, outermost first
    ///
    /// Axes left out are nested innermost in canonical order.
    #[must_use]
    pub fn with_order(mut self, order: &[Axis]) -> Self {
        let mut full = Vec::with_capacity(Axis::CANONICAL.len());
        for axis in order.iter().chain(Axis::CANONICAL.iter()) {
            if !full.contains(axis) {
                full.push(*axis);
            }
        }
        self.order = full;
        self
    }

    /// Suite label, e.g. `HEATAMR`
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Name of the serial suite
    #[must_use]
    pub fn serial_suite(&self) -> String {
        format!("{}TEST", self.label)
    }

    /// Name of the `_mpi` suite
    #[must_use]
    pub fn parallel_suite(&self) -> String {
        format!("{}MPITEST", self.label)
    }

    #[inline]
    #[must_use]
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    #[inline]
    #[must_use]
    pub fn order(&self) -> &[Axis] {
        &self.order
    }

    /// Every combination, in axis nesting order
    #[must_use]
    pub fn enumerate(&self) -> Vec<Combination> {
        let mut partials = vec![Partial::default()];
        for axis in &self.order {
            partials = partials
                .into_iter()
                .flat_map(|p| self.expand(*axis, p))
                .collect();
        }
        partials
            .into_iter()
            .filter_map(|p| {
                Some(Combination {
                    dim: p.dim?,
                    var: p.var?,
                    scheme: p.scheme,
                    fci: p.fci,
                })
            })
            .collect()
    }

    fn expand(&self, axis: Axis, partial: Partial) -> Vec<Partial> {
        match axis {
            Axis::Dim => self
                .dims
                .iter()
                .filter(|dim| match (partial.fci, self.refinement.fci_set()) {
                    (Some(fci), Some(set)) => set.for_dim(**dim).contains(&fci),
                    _ => true,
                })
                .map(|dim| Partial {
                    dim: Some(*dim),
                    ..partial
                })
                .collect(),
            Axis::Var => self
                .vars
                .iter()
                .map(|var| Partial {
                    var: Some(*var),
                    ..partial
                })
                .collect(),
            Axis::Scheme if self.schemes.is_empty() => vec![partial],
            Axis::Scheme => self
                .schemes
                .iter()
                .map(|scheme| Partial {
                    scheme: Some(*scheme),
                    ..partial
                })
                .collect(),
            Axis::Fci => match self.refinement.fci_set() {
                None => vec![partial],
                Some(set) => {
                    let choices = partial.dim.map_or(set.all(), |dim| set.for_dim(dim));
                    choices
                        .iter()
                        .map(|fci| Partial {
                            fci: Some(*fci),
                            ..partial
                        })
                        .collect()
                }
            },
        }
    }

    /// Case name for a combination (serial variant)
    #[must_use]
    pub fn case_name(&self, combo: &Combination) -> String {
        let mut name = format!("{}_{}_{}", self.problem, combo.var, combo.dim);
        if let Some(scheme) = combo.scheme {
            name.push('_');
            name.push_str(scheme.as_str());
        }
        name.push_str(&self.refinement.suffix(combo.fci));
        name
    }

    /// Template path relative to the component inputs directory
    #[must_use]
    pub fn template_path(&self, combo: &Combination) -> PathBuf {
        PathBuf::from(&self.directory).join(format!("{}.ups", self.case_name(combo)))
    }

    /// Derive the serial and `_mpi` cases of every combination
    ///
    /// # Errors
    ///
    /// Fails on the first template that cannot be loaded or patched.
    pub fn cases(&self, templates: &dyn TemplateSource) -> Result<FamilyCases, CatalogError> {
        let combos = self.enumerate();
        let mut serial = Vec::with_capacity(combos.len());
        let mut parallel = Vec::with_capacity(combos.len());

        for combo in &combos {
            let name = self.case_name(combo);
            let base = templates.load(&self.template_path(combo))?;
            let patches = self
                .frequency
                .patches(combo.dim)
                .map_err(|e| CatalogError::patch(&name, e.into()))?;
            let document = patches
                .apply(&base)
                .map_err(|e| CatalogError::patch(&name, e))?;

            let flags = Flags::new().with(EXACT_COMPARISON);
            parallel.push(register_case(
                format!("{name}_mpi"),
                document.clone(),
                MPI_PROCESSES,
                Platform::All,
                flags.clone(),
            )?);
            serial.push(register_case(name, document, 1, Platform::All, flags)?);
        }

        tracing::debug!(family = %self.label, cases = combos.len(), "derived family");
        Ok(FamilyCases { serial, parallel })
    }
}
