//! Equation rendering
//!
//! Every `$...$` / `$$...$$` run goes through three strategies in a fixed
//! order, stopping at the first success:
//!
//! 1. native conversion to editable Word equations (`omml`)
//! 2. rasterization through an external TeX toolchain (`raster`)
//! 3. a visible placeholder naming the failure
//!
//! Each stage reports failure through [`MathFailure`] instead of panicking,
//! and every failed attempt is kept in [`MathRendering::attempts`] so the
//! order in which stages ran is observable.

pub mod omml;
pub mod raster;

use std::fmt;

use crate::config::CompileOptions;

pub use omml::{latex_to_omml, MathNode, OmmlConverter};
pub use raster::{find_unsupported_construct, normalize_for_raster, DvipngRasterizer, RasterImage};

/// Why a rendering strategy did not produce output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathFailure {
    /// The expression uses a construct this strategy cannot render correctly
    UnsupportedConstruct(String),
    /// The strategy is disabled or its tools are missing on this system
    RendererUnavailable(String),
    /// The strategy ran and failed
    RenderFailed(String),
}

impl MathFailure {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        MathFailure::UnsupportedConstruct(construct.into())
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        MathFailure::RendererUnavailable(reason.into())
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        MathFailure::RenderFailed(reason.into())
    }

    /// Short localized label used in the visible placeholder
    pub fn label(&self) -> &'static str {
        match self {
            MathFailure::UnsupportedConstruct(_) => "cấu trúc không hỗ trợ",
            MathFailure::RendererUnavailable(_) => "không có bộ dựng công thức",
            MathFailure::RenderFailed(_) => "lỗi dựng công thức",
        }
    }
}

impl fmt::Display for MathFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathFailure::UnsupportedConstruct(c) => write!(f, "unsupported construct {}", c),
            MathFailure::RendererUnavailable(r) => write!(f, "renderer unavailable: {}", r),
            MathFailure::RenderFailed(r) => write!(f, "render failed: {}", r),
        }
    }
}

/// Rendering strategy, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MathStage {
    Native,
    Raster,
    Placeholder,
}

/// Converts LaTeX math to OMML markup
pub trait NativeMathConverter: Send + Sync {
    fn convert(&self, expr: &str, display: bool) -> Result<String, MathFailure>;
}

/// Renders LaTeX math to a transparent PNG with baseline metrics
pub trait MathRasterizer: Send + Sync {
    fn rasterize(&self, expr: &str, display: bool) -> Result<RasterImage, MathFailure>;
}

/// Final form of one equation
#[derive(Debug, Clone, PartialEq)]
pub enum MathOutcome {
    /// `<m:oMath>` or `<m:oMathPara>` markup
    Native(String),
    Raster(RasterImage),
    /// Text to show in italic gray
    Placeholder(String),
}

/// Result of running the strategy chain on one equation
#[derive(Debug, Clone, PartialEq)]
pub struct MathRendering {
    pub outcome: MathOutcome,
    /// Failed attempts, in the order they were made
    pub attempts: Vec<(MathStage, MathFailure)>,
}

impl MathRendering {
    /// Stage that produced the outcome
    pub fn stage(&self) -> MathStage {
        match self.outcome {
            MathOutcome::Native(_) => MathStage::Native,
            MathOutcome::Raster(_) => MathStage::Raster,
            MathOutcome::Placeholder(_) => MathStage::Placeholder,
        }
    }

    /// The failure that sent the equation to the placeholder, if any
    pub fn final_failure(&self) -> Option<&MathFailure> {
        match self.outcome {
            MathOutcome::Placeholder(_) => self.attempts.last().map(|(_, f)| f),
            _ => None,
        }
    }
}

/// Visible placeholder for an equation no strategy could render
pub fn placeholder_text(expr: &str, failure: &MathFailure) -> String {
    format!("[Lỗi công thức ({}): {}]", failure.label(), expr)
}

/// The strategy chain
pub struct MathRenderer {
    native: Option<Box<dyn NativeMathConverter>>,
    raster: Option<Box<dyn MathRasterizer>>,
}

impl MathRenderer {
    pub fn new(
        native: Option<Box<dyn NativeMathConverter>>,
        raster: Option<Box<dyn MathRasterizer>>,
    ) -> Self {
        Self { native, raster }
    }

    /// Default back-ends, enabled according to the options
    pub fn from_options(options: &CompileOptions) -> Self {
        let native: Option<Box<dyn NativeMathConverter>> = if options.native_math {
            Some(Box::new(OmmlConverter))
        } else {
            None
        };
        let raster: Option<Box<dyn MathRasterizer>> = if options.raster_math {
            Some(Box::new(DvipngRasterizer::new(options.raster_dpi)))
        } else {
            None
        };
        Self::new(native, raster)
    }

    /// Render one equation; never fails
    pub fn render(&self, expr: &str, display: bool) -> MathRendering {
        let mut attempts = Vec::new();

        match self.try_native(expr, display) {
            Ok(xml) => {
                return MathRendering {
                    outcome: MathOutcome::Native(xml),
                    attempts,
                }
            }
            Err(failure) => attempts.push((MathStage::Native, failure)),
        }

        match self.try_raster(expr, display) {
            Ok(image) => {
                return MathRendering {
                    outcome: MathOutcome::Raster(image),
                    attempts,
                }
            }
            Err(failure) => attempts.push((MathStage::Raster, failure)),
        }

        let text = attempts
            .last()
            .map(|(_, failure)| placeholder_text(expr, failure))
            .unwrap_or_else(|| expr.to_string());
        MathRendering {
            outcome: MathOutcome::Placeholder(text),
            attempts,
        }
    }

    fn try_native(&self, expr: &str, display: bool) -> Result<String, MathFailure> {
        let converter = self
            .native
            .as_ref()
            .ok_or_else(|| MathFailure::unavailable("native equations disabled"))?;
        converter.convert(expr, display)
    }

    fn try_raster(&self, expr: &str, display: bool) -> Result<RasterImage, MathFailure> {
        // Checked first: these degrade silently instead of failing
        if let Some(construct) = find_unsupported_construct(expr) {
            return Err(MathFailure::unsupported(construct));
        }
        let rasterizer = self
            .raster
            .as_ref()
            .ok_or_else(|| MathFailure::unavailable("equation images disabled"))?;
        rasterizer.rasterize(&normalize_for_raster(expr), display)
    }
}
