//! Test kinds and the set of kinds a caller asks for

use crate::category::Category;
use crate::text::fold_key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestKind {
    /// Behavioural tests: flows, validations, business rules
    #[serde(rename = "Funcional")]
    Functional,

    /// Quality attributes: performance, security, usability...
    #[serde(rename = "No Funcional")]
    NonFunctional,
}

impl TestKind {
    /// Machine name used on the command line and in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::Functional => "functional",
            TestKind::NonFunctional => "non-functional",
        }
    }

    /// Label used in prompts and exported matrices
    pub fn label(&self) -> &'static str {
        match self {
            TestKind::Functional => "Funcional",
            TestKind::NonFunctional => "No Funcional",
        }
    }

    /// Category used when the model gives none (or one that belongs to the other kind)
    pub fn default_category(&self) -> Category {
        match self {
            TestKind::Functional => Category::MainFlow,
            TestKind::NonFunctional => Category::Performance,
        }
    }

    /// Parse a kind leniently: "Funcional", "no_funcional", "Non-Functional", ...
    pub fn parse(s: &str) -> Option<Self> {
        let key = fold_key(s);
        let compact: String = key.chars().filter(|c| !c.is_whitespace()).collect();

        let mentions_kind = compact.contains("funcional") || compact.contains("functional");
        if !mentions_kind {
            return None;
        }

        if compact.starts_with("nofuncional")
            || compact.starts_with("nonfuncional")
            || compact.starts_with("nonfunctional")
            || compact.starts_with("nofunctional")
        {
            Some(TestKind::NonFunctional)
        } else {
            Some(TestKind::Functional)
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid test kind: {}", s))
    }
}

/// Which directive block the prompt needs for a requested set of kinds
///
/// Closed on purpose: an empty set has no selection, and the caller
/// skips generation entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSelection {
    /// Only functional tests were requested
    FunctionalOnly,
    /// Only non-functional tests were requested
    NonFunctionalOnly,
    /// Both kinds were requested
    Both,
}

/// Subset of {functional, non-functional}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSet {
    /// Functional tests requested
    #[serde(default)]
    pub functional: bool,

    /// Non-functional tests requested
    #[serde(default)]
    pub non_functional: bool,
}

impl KindSet {
    /// The empty set
    pub fn none() -> Self {
        Self::default()
    }

    /// Both kinds
    pub fn both() -> Self {
        Self {
            functional: true,
            non_functional: true,
        }
    }

    /// A set with a single kind
    pub fn only(kind: TestKind) -> Self {
        let mut set = Self::none();
        set.insert(kind);
        set
    }

    /// Add a kind to the set
    pub fn insert(&mut self, kind: TestKind) {
        match kind {
            TestKind::Functional => self.functional = true,
            TestKind::NonFunctional => self.non_functional = true,
        }
    }

    /// Whether the set contains the kind
    pub fn contains(&self, kind: TestKind) -> bool {
        match kind {
            TestKind::Functional => self.functional,
            TestKind::NonFunctional => self.non_functional,
        }
    }

    /// Whether nothing was requested
    pub fn is_empty(&self) -> bool {
        !self.functional && !self.non_functional
    }

    /// Map the set onto the prompt directive enumeration
    pub fn selection(&self) -> Option<KindSelection> {
        match (self.functional, self.non_functional) {
            (true, true) => Some(KindSelection::Both),
            (true, false) => Some(KindSelection::FunctionalOnly),
            (false, true) => Some(KindSelection::NonFunctionalOnly),
            (false, false) => None,
        }
    }

    /// Kinds in the set, functional first
    pub fn kinds(&self) -> Vec<TestKind> {
        [TestKind::Functional, TestKind::NonFunctional]
            .into_iter()
            .filter(|k| self.contains(*k))
            .collect()
    }

    /// Parse a comma separated list ("functional,non-functional").
    ///
    /// Unknown entries are an error; an empty string is the empty set.
    pub fn parse_list(s: &str) -> Result<Self, String> {
        let mut set = Self::none();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            set.insert(part.parse()?);
        }
        Ok(set)
    }
}

impl FromIterator<TestKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = TestKind>>(iter: I) -> Self {
        let mut set = Self::none();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}
