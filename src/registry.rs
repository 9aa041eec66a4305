//! Discovery: which scoring formulas and data sources this build knows
//! about, and what parameters each formula accepts.
//!
//! Mirrors `model.py`'s `ScoringFormula`/`DataSource` ABCs plus the
//! `argparse`-via-dataclass-introspection the original CLI used to expose
//! formula parameters (`__init__.py`'s `build_options_parser`). Here a
//! formula's parameters are a small `serde`/`schemars` struct instead of a
//! dataclass; [`schemars::schema_for!`] produces the same "name, type,
//! default, enum choices" description a caller would otherwise have had to
//! reconstruct via reflection.

use once_cell::sync::OnceCell;
use schemars::{schema::RootSchema, JsonSchema};
use serde::Deserialize;

use crate::codec;
use crate::error::{InputDecodeError, ParameterError};
use crate::formulas::{
    AtkLabV1, AtkLabV2, AttackerMode, Ecsc2024, Ecsc2025, JeopardyFormula, SaarCtf2024,
    ScoringFormula,
};
use crate::model::{Ctf, TeamName};

fn default_nop_team() -> Option<String> {
    Some("NOP".to_string())
}

/// Parameters accepted by [`AtkLabV1`].
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct AtkLabV1Params {
    pub scaling_factor: f64,
    pub nop_team: Option<String>,
}

impl Default for AtkLabV1Params {
    fn default() -> Self {
        let defaults = AtkLabV1::default();
        AtkLabV1Params {
            scaling_factor: defaults.scaling_factor,
            nop_team: defaults.nop_team.map(|t| t.to_string()),
        }
    }
}

impl From<AtkLabV1Params> for AtkLabV1 {
    fn from(p: AtkLabV1Params) -> Self {
        AtkLabV1 {
            scaling_factor: p.scaling_factor,
            nop_team: p.nop_team.map(TeamName::from),
        }
    }
}

/// Parameters accepted by [`AtkLabV2`].
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct AtkLabV2Params {
    pub jeopardy: JeopardyFormula,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub base: f64,
    pub min: f64,
    pub attackers: AttackerMode,
    pub defense_compensation: bool,
    pub nop_team: Option<String>,
}

impl Default for AtkLabV2Params {
    fn default() -> Self {
        let defaults = AtkLabV2::new(JeopardyFormula::Cscg);
        AtkLabV2Params {
            jeopardy: JeopardyFormula::Cscg,
            alpha: defaults.alpha,
            beta: defaults.beta,
            base: defaults.base,
            min: defaults.min,
            attackers: defaults.attackers,
            defense_compensation: defaults.defense_compensation,
            nop_team: defaults.nop_team.map(|t| t.to_string()),
        }
    }
}

impl From<AtkLabV2Params> for AtkLabV2 {
    fn from(p: AtkLabV2Params) -> Self {
        AtkLabV2 {
            jeopardy: p.jeopardy,
            alpha: p.alpha,
            beta: p.beta,
            base: p.base,
            min: p.min,
            attackers: p.attackers,
            defense_compensation: p.defense_compensation,
            nop_team: p.nop_team.map(TeamName::from),
        }
    }
}

/// Parameters accepted by [`SaarCtf2024`].
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct SaarCtf2024Params {
    pub off_factor: f64,
    pub def_factor: f64,
    pub sla_factor: f64,
    pub nop_team: Option<String>,
    pub defense_bug: bool,
}

impl Default for SaarCtf2024Params {
    fn default() -> Self {
        let defaults = SaarCtf2024::default();
        SaarCtf2024Params {
            off_factor: defaults.off_factor,
            def_factor: defaults.def_factor,
            sla_factor: defaults.sla_factor,
            nop_team: defaults.nop_team.map(|t| t.to_string()),
            defense_bug: defaults.defense_bug,
        }
    }
}

impl From<SaarCtf2024Params> for SaarCtf2024 {
    fn from(p: SaarCtf2024Params) -> Self {
        SaarCtf2024 {
            off_factor: p.off_factor,
            def_factor: p.def_factor,
            sla_factor: p.sla_factor,
            nop_team: p.nop_team.map(TeamName::from),
            defense_bug: p.defense_bug,
        }
    }
}

/// Parameters accepted by [`Ecsc2025`].
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Ecsc2025Params {
    pub base: f64,
    pub nop_team: Option<String>,
}

impl Default for Ecsc2025Params {
    fn default() -> Self {
        let defaults = Ecsc2025::default();
        Ecsc2025Params {
            base: defaults.base,
            nop_team: defaults.nop_team.map(|t| t.to_string()),
        }
    }
}

impl From<Ecsc2025Params> for Ecsc2025 {
    fn from(p: Ecsc2025Params) -> Self {
        Ecsc2025 {
            base: p.base,
            nop_team: p.nop_team.map(TeamName::from),
        }
    }
}

/// Parameters accepted by [`Ecsc2024`]. `flag_validity` is an `i64` here
/// rather than a `u32` to match [`crate::model::Config::flag_validity`]'s
/// type, which this formula's `can_getflag` lookback borrows directly.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Ecsc2024Params {
    pub base: f64,
    pub scale: f64,
    pub norm: f64,
    pub flag_validity: i64,
}

impl Default for Ecsc2024Params {
    fn default() -> Self {
        let defaults = Ecsc2024::default();
        Ecsc2024Params {
            base: defaults.base,
            scale: defaults.scale,
            norm: defaults.norm,
            flag_validity: defaults.flag_validity,
        }
    }
}

impl From<Ecsc2024Params> for Ecsc2024 {
    fn from(p: Ecsc2024Params) -> Self {
        Ecsc2024 {
            base: p.base,
            scale: p.scale,
            norm: p.norm,
            flag_validity: p.flag_validity,
        }
    }
}

/// A single entry in the formula registry: a name, its parameter schema,
/// and a constructor from a JSON parameter blob to a boxed formula.
pub struct FormulaDescriptor {
    pub name: &'static str,
    pub schema: RootSchema,
    pub build: fn(&serde_json::Value) -> Result<Box<dyn ScoringFormula>, ParameterError>,
}

fn build<P, F>(params: &serde_json::Value) -> Result<Box<dyn ScoringFormula>, ParameterError>
where
    P: for<'de> Deserialize<'de> + Default,
    F: ScoringFormula + From<P> + 'static,
{
    let parsed: P = if params.is_null() {
        P::default()
    } else {
        serde_json::from_value(params.clone())
            .map_err(|e| ParameterError::Malformed(e.to_string()))?
    };
    Ok(Box::new(F::from(parsed)))
}

fn descriptors() -> Vec<FormulaDescriptor> {
    vec![
        FormulaDescriptor {
            name: "ATKLABv1",
            schema: schemars::schema_for!(AtkLabV1Params),
            build: build::<AtkLabV1Params, AtkLabV1>,
        },
        FormulaDescriptor {
            name: "ATKLABv2",
            schema: schemars::schema_for!(AtkLabV2Params),
            build: build::<AtkLabV2Params, AtkLabV2>,
        },
        FormulaDescriptor {
            name: "SaarCTF2024",
            schema: schemars::schema_for!(SaarCtf2024Params),
            build: build::<SaarCtf2024Params, SaarCtf2024>,
        },
        FormulaDescriptor {
            name: "ECSC2025",
            schema: schemars::schema_for!(Ecsc2025Params),
            build: build::<Ecsc2025Params, Ecsc2025>,
        },
        FormulaDescriptor {
            name: "ECSC2024",
            schema: schemars::schema_for!(Ecsc2024Params),
            build: build::<Ecsc2024Params, Ecsc2024>,
        },
    ]
}

/// All registered scoring formulas, in a stable order. Computed once and
/// memoized for the life of the process.
pub fn formulas() -> &'static [FormulaDescriptor] {
    static CELL: OnceCell<Vec<FormulaDescriptor>> = OnceCell::new();
    CELL.get_or_init(descriptors)
}

/// Looks up a registered formula by name and builds it from its (possibly
/// partial) JSON parameter object.
pub fn build_formula(
    name: &str,
    params: &serde_json::Value,
) -> Result<Box<dyn ScoringFormula>, ParameterError> {
    let descriptor = formulas()
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| ParameterError::Malformed(format!("unknown formula {name:?}")))?;
    (descriptor.build)(params)
}

/// A source of `Ctf` game data. The only shipped implementation is
/// [`CanonicalJsonSource`]; the trait exists (mirroring `model.py`'s
/// `DataSource` ABC) so that per-competition upstream converters could
/// register themselves without this crate needing to know about them.
pub trait DataSource {
    fn name(&self) -> &'static str;
    fn load(&self, input: &str) -> Result<Ctf, InputDecodeError>;
}

/// Decodes the canonical JSON wire format (spec §6).
#[derive(Debug, Default)]
pub struct CanonicalJsonSource;

impl DataSource for CanonicalJsonSource {
    fn name(&self) -> &'static str {
        "canonical-json"
    }

    fn load(&self, input: &str) -> Result<Ctf, InputDecodeError> {
        codec::from_canonical_json(input)
    }
}

/// All registered data sources, in a stable order.
pub fn data_sources() -> &'static [&'static dyn DataSource] {
    static SOURCE: CanonicalJsonSource = CanonicalJsonSource;
    static CELL: OnceCell<Vec<&'static dyn DataSource>> = OnceCell::new();
    CELL.get_or_init(|| vec![&SOURCE])
}
