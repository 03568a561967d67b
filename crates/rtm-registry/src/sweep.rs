//! Convergence-study sweeps
//!
//! A [`Sweep`] renders one standalone input per point of a solver ×
//! refinement-level × patch-halving × timestep-halving grid by patching a
//! base template. Two sweeps are known, see [`SweepKind`].

use std::fmt::{self, Display, Formatter};
use std::ops::RangeInclusive;
use std::str::FromStr;

use rtm_document::{DocPath, Document, DocumentError, PatchError, PatchList};

const BE_STRUCT_2D_TEMPLATE: &str = include_str!("../templates/be_struct_conv_2d.ups");
const CN_SSTRUCT_3D_TEMPLATE: &str = include_str!("../templates/cn_sstruct_conv_3d.ups");

/// Halvings applied to patch size and timestep
const HALVINGS: u32 = 5;

/// Domain width in cells of the 2D study
const DOMAIN_2D: f64 = 64.0;

/// `min_patch_size` per coarse patch size (2D)
const MIN_PATCH_SIZE: [(u32, &str); 5] = [
    (1, "[[1,1,1],[2,2,1],[4,4,1],[8,8,1],[16,16,1]]"),
    (2, "[[2,2,1],[4,4,1],[8,8,1],[16,16,1]]"),
    (4, "[[4,4,1],[8,8,1],[16,16,1]]"),
    (8, "[[8,8,1],[16,16,1]]"),
    (16, "[[16,16,1]]"),
];

/// The known convergence studies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepKind {
    /// Backward Euler, hypre struct solvers, 2D
    BackwardEulerStruct2d,
    /// Crank-Nicolson, hypre sstruct solvers, 3D
    CrankNicolsonSStruct3d,
}

impl SweepKind {
    pub const ALL: [Self; 2] = [Self::BackwardEulerStruct2d, Self::CrankNicolsonSStruct3d];

    /// Command-line identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BackwardEulerStruct2d => "be-struct-2d",
            Self::CrankNicolsonSStruct3d => "cn-sstruct-3d",
        }
    }

    #[must_use]
    pub const fn solvers(self) -> &'static [&'static str] {
        match self {
            Self::BackwardEulerStruct2d => &["pfmg", "smg", "cycred", "gmres", "flexgmres", "lgmres", "bicgstab"],
            Self::CrankNicolsonSStruct3d => &["fac", "split", "gmres", "flexgmres", "lgmres", "bicgstab"],
        }
    }

    /// Refinement levels enumerated
    #[must_use]
    pub const fn levels(self) -> RangeInclusive<u32> {
        match self {
            Self::BackwardEulerStruct2d => 1..=7,
            Self::CrankNicolsonSStruct3d => 1..=8,
        }
    }

    /// Base template shipped with the crate
    #[must_use]
    pub const fn default_template(self) -> &'static str {
        match self {
            Self::BackwardEulerStruct2d => BE_STRUCT_2D_TEMPLATE,
            Self::CrankNicolsonSStruct3d => CN_SSTRUCT_3D_TEMPLATE,
        }
    }

    fn name_prefix(self) -> &'static str {
        match self {
            Self::BackwardEulerStruct2d => "be_struct_conv",
            Self::CrankNicolsonSStruct3d => "cn_sstruct_conv",
        }
    }

    fn dim_tag(self) -> &'static str {
        match self {
            Self::BackwardEulerStruct2d => "2d",
            Self::CrankNicolsonSStruct3d => "3d",
        }
    }
}

impl Display for SweepKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown sweep '{s}' (expected be-struct-2d or cn-sstruct-3d)"))
    }
}

/// One input of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SweepPoint {
    pub kind: SweepKind,
    pub solver: &'static str,
    pub levels: u32,
    /// Patch-size halvings
    pub ph: u32,
    /// Timestep halvings
    pub pk: u32,
}

impl SweepPoint {
    /// Input name, also used for the title and output archive
    #[must_use]
    pub fn name(&self) -> String {
        format!(
            "{}_{}_{}_nlvl{}_{}_{}",
            self.kind.name_prefix(),
            self.solver,
            self.kind.dim_tag(),
            self.levels,
            self.ph,
            self.pk
        )
    }

    /// Timestep `2^-pk`
    #[must_use]
    pub fn delt(&self) -> f64 {
        2f64.powi(-exponent(self.pk))
    }

    /// End time `100 + delt`
    #[must_use]
    pub fn max_time(&self) -> f64 {
        100.0 + self.delt()
    }

    /// Coarse grid spacing
    #[must_use]
    pub fn spacing(&self) -> f64 {
        match self.kind {
            SweepKind::BackwardEulerStruct2d => {
                2f64.powi(exponent(self.levels) - exponent(self.ph) - 1)
            }
            SweepKind::CrankNicolsonSStruct3d => 2f64.powi(-exponent(self.ph)),
        }
    }

    /// Patches per direction on the coarse level
    #[must_use]
    pub fn patches(&self) -> u32 {
        match self.kind {
            SweepKind::BackwardEulerStruct2d => (self.coarse_cells() / 16).max(1),
            SweepKind::CrankNicolsonSStruct3d => 1 << self.ph,
        }
    }

    /// Regridder `min_patch_size` derived from the coarse patch size (2D only)
    ///
    /// Rendering keeps the template's value unless the sweep opts in with
    /// [`Sweep::with_computed_min_patch_size`].
    #[must_use]
    pub fn min_patch_size(&self) -> Option<&'static str> {
        match self.kind {
            SweepKind::BackwardEulerStruct2d => {
                let size = (self.coarse_cells() / self.patches()).min(16);
                MIN_PATCH_SIZE
                    .iter()
                    .find(|(key, _)| *key == size)
                    .map(|(_, value)| *value)
            }
            SweepKind::CrankNicolsonSStruct3d => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn coarse_cells(&self) -> u32 {
        (DOMAIN_2D / self.spacing()).floor() as u32
    }

    fn patches_text(&self) -> String {
        let p = self.patches();
        match self.kind {
            SweepKind::BackwardEulerStruct2d => format!("[{p},{p},1]"),
            SweepKind::CrankNicolsonSStruct3d => format!("[{p},{p},{p}]"),
        }
    }

    fn spacing_text(&self) -> String {
        let s = self.spacing();
        match self.kind {
            SweepKind::BackwardEulerStruct2d => format!("[{s:.6},{s:.6},1]"),
            SweepKind::CrankNicolsonSStruct3d => format!("[{s:.6},{s:.6},{s:.6}]"),
        }
    }

    /// Edits turning the base template into this point's input
    ///
    /// `min_patch_size` is left as the template has it.
    ///
    /// # Errors
    ///
    /// Never in practice; the paths are constants.
    pub fn patches_list(&self) -> Result<PatchList, PatchError> {
        let name = self.name();
        Ok(PatchList::new()
            .update(path("Meta/title")?, name.clone())
            .update(path("PhaseField/delt")?, format!("{:.6}", self.delt()))
            .update(path("Time/maxTime")?, format!("{:.6}", self.max_time()))
            .update(path("Grid/Level/Box/patches")?, self.patches_text())
            .update(path("Grid/Level/spacing")?, self.spacing_text())
            .update(path("AMR/Regridder/max_levels")?, self.levels.to_string())
            .update(path("Solver/Parameters/solver")?, self.solver)
            .update(path("DataArchiver/filebase")?, format!("{name}.uda")))
    }
}

#[allow(clippy::cast_possible_wrap)]
fn exponent(n: u32) -> i32 {
    n as i32
}

fn path(relative: &str) -> Result<DocPath, PatchError> {
    Ok(format!("/Uintah_specification/{relative}").parse::<DocPath>()?)
}

/// A base template and the grid of points rendered from it
#[derive(Debug, Clone)]
pub struct Sweep {
    kind: SweepKind,
    base: Document,
    computed_min_patch_size: bool,
}

impl Sweep {
    #[must_use]
    pub fn new(kind: SweepKind, base: Document) -> Self {
        Self {
            kind,
            base,
            computed_min_patch_size: false,
        }
    }

    /// Also patch `AMR/Regridder/min_patch_size` from
    /// [`SweepPoint::min_patch_size`] instead of keeping the template's value
    #[inline]
    #[must_use]
    pub fn with_computed_min_patch_size(mut self, enabled: bool) -> Self {
        self.computed_min_patch_size = enabled;
        self
    }

    /// Sweep over the shipped base template
    ///
    /// # Errors
    ///
    /// Only if the shipped template fails to parse.
    pub fn with_default_template(kind: SweepKind) -> Result<Self, DocumentError> {
        Ok(Self::new(kind, Document::parse_xml(kind.default_template())?))
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> SweepKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn base(&self) -> &Document {
        &self.base
    }

    #[inline]
    #[must_use]
    pub fn computed_min_patch_size(&self) -> bool {
        self.computed_min_patch_size
    }

    /// Every point, solver outermost and timestep halvings innermost
    #[must_use]
    pub fn points(&self) -> Vec<SweepPoint> {
        let kind = self.kind;
        let mut points = Vec::new();
        for &solver in kind.solvers() {
            for levels in kind.levels() {
                for ph in 0..HALVINGS {
                    for pk in 0..HALVINGS {
                        points.push(SweepPoint {
                            kind,
                            solver,
                            levels,
                            ph,
                            pk,
                        });
                    }
                }
            }
        }
        points
    }

    /// Render one point
    ///
    /// # Errors
    ///
    /// [`PatchError::PathNotFound`] if the base template lacks a patched field.
    pub fn render(&self, point: &SweepPoint) -> Result<Document, PatchError> {
        let mut list = point.patches_list()?;
        if self.computed_min_patch_size {
            if let Some(size) = point.min_patch_size() {
                list = list.update(path("AMR/Regridder/min_patch_size")?, size);
            }
        }
        list.apply(&self.base)
    }

    /// Render every point as `(name, document)`
    ///
    /// # Errors
    ///
    /// Stops at the first point that fails to render.
    pub fn render_all(&self) -> Result<Vec<(String, Document)>, PatchError> {
        let points = self.points();
        tracing::debug!(
            sweep = %self.kind,
            points = points.len(),
            computed_min_patch_size = self.computed_min_patch_size,
            "rendering sweep"
        );
        points
            .iter()
            .map(|point| Ok((point.name(), self.render(point)?)))
            .collect()
    }
}
