use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::annotation::Document;
use crate::echo::EchoReport;
use crate::entropy::EntropyReport;
use crate::fractal::FractalReport;
use crate::observer::ObserverReport;
use crate::symbolic::SymbolicReport;

/// Identifies one analysis module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Drift,
    Entropy,
    Symbolic,
    Echo,
    Observer,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 5] = [
        ModuleKind::Drift,
        ModuleKind::Entropy,
        ModuleKind::Symbolic,
        ModuleKind::Echo,
        ModuleKind::Observer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKind::Drift => "drift",
            ModuleKind::Entropy => "entropy",
            ModuleKind::Symbolic => "symbolic",
            ModuleKind::Echo => "echo",
            ModuleKind::Observer => "observer",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown analysis module: {s}"))
    }
}

/// Output of one analyzer run.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleReport {
    Drift(FractalReport),
    Entropy(EntropyReport),
    Symbolic(SymbolicReport),
    Echo(EchoReport),
    Observer(ObserverReport),
}

impl ModuleReport {
    pub fn kind(&self) -> ModuleKind {
        match self {
            ModuleReport::Drift(_) => ModuleKind::Drift,
            ModuleReport::Entropy(_) => ModuleKind::Entropy,
            ModuleReport::Symbolic(_) => ModuleKind::Symbolic,
            ModuleReport::Echo(_) => ModuleKind::Echo,
            ModuleReport::Observer(_) => ModuleKind::Observer,
        }
    }
}

/// Common capability of every analysis module: annotated segments in, report out.
///
/// `analyze` takes `&mut self` because the observer advances its random generator.
pub trait Analyzer: Send {
    fn kind(&self) -> ModuleKind;
    fn analyze(&mut self, docs: &[Document]) -> ModuleReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ModuleKind::ALL {
            assert_eq!(kind.as_str().parse::<ModuleKind>(), Ok(kind));
        }
        assert!("nonsense".parse::<ModuleKind>().is_err());
    }
}
