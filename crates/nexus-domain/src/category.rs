//! Test categories, conditioned on the test kind

use crate::kind::TestKind;
use crate::text::fold_key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a test case
///
/// The first four belong to functional tests, the rest to non-functional ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Happy path
    #[serde(rename = "Flujo Principal")]
    MainFlow,
    /// Alternative paths
    #[serde(rename = "Flujos Alternativos")]
    AlternativeFlows,
    /// Boundary conditions
    #[serde(rename = "Casos Límite")]
    EdgeCases,
    /// Error handling
    #[serde(rename = "Casos de Error")]
    ErrorCases,
    /// Load, stress, response time
    #[serde(rename = "Rendimiento")]
    Performance,
    /// Authentication, authorization, data protection
    #[serde(rename = "Seguridad")]
    Security,
    /// User experience and accessibility
    #[serde(rename = "Usabilidad")]
    Usability,
    /// Platforms, browsers, devices
    #[serde(rename = "Compatibilidad")]
    Compatibility,
    /// Availability and recovery
    #[serde(rename = "Confiabilidad")]
    Reliability,
}

/// Folded keywords recognised for each category
const KEYWORDS: &[(Category, &[&str])] = &[
    (Category::MainFlow, &["flujo principal", "principal", "main flow", "happy path"]),
    (Category::AlternativeFlows, &["alternativ", "alternate"]),
    (Category::EdgeCases, &["limite", "borde", "edge", "boundary"]),
    (Category::ErrorCases, &["error", "negativ", "exception", "excepcion"]),
    (Category::Performance, &["rendimiento", "performance", "carga", "load"]),
    (Category::Security, &["seguridad", "security"]),
    (Category::Usability, &["usabilidad", "usability", "accesibilidad", "accessibility"]),
    (Category::Compatibility, &["compatibilidad", "compatibility"]),
    (Category::Reliability, &["confiabilidad", "fiabilidad", "reliability", "disponibilidad"]),
];

impl Category {
    /// Label used in prompts and exports
    pub fn label(&self) -> &'static str {
        match self {
            Category::MainFlow => "Flujo Principal",
            Category::AlternativeFlows => "Flujos Alternativos",
            Category::EdgeCases => "Casos Límite",
            Category::ErrorCases => "Casos de Error",
            Category::Performance => "Rendimiento",
            Category::Security => "Seguridad",
            Category::Usability => "Usabilidad",
            Category::Compatibility => "Compatibilidad",
            Category::Reliability => "Confiabilidad",
        }
    }

    /// Kind this category belongs to
    pub fn kind(&self) -> TestKind {
        match self {
            Category::MainFlow
            | Category::AlternativeFlows
            | Category::EdgeCases
            | Category::ErrorCases => TestKind::Functional,
            _ => TestKind::NonFunctional,
        }
    }

    /// All categories allowed for a kind, in prompt order
    pub fn for_kind(kind: TestKind) -> &'static [Category] {
        match kind {
            TestKind::Functional => &[
                Category::MainFlow,
                Category::AlternativeFlows,
                Category::EdgeCases,
                Category::ErrorCases,
            ],
            TestKind::NonFunctional => &[
                Category::Performance,
                Category::Security,
                Category::Usability,
                Category::Compatibility,
                Category::Reliability,
            ],
        }
    }

    /// Recognise a category from free text, without looking at the kind
    pub fn recognize(s: &str) -> Option<Self> {
        let key = fold_key(s);
        if key.is_empty() {
            return None;
        }
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| key.contains(w)))
            .map(|(category, _)| *category)
    }

    /// Resolve a category for a record of the given kind.
    ///
    /// Unrecognised text, or a category of the other kind, yields the
    /// kind's default category.
    pub fn resolve(s: &str, kind: TestKind) -> Self {
        match Self::recognize(s) {
            Some(category) if category.kind() == kind => category,
            _ => kind.default_category(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
