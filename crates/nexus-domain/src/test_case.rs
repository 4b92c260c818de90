//! Test case record - one row of a test matrix

use crate::category::Category;
use crate::kind::TestKind;
use crate::priority::Priority;
use serde::{Deserialize, Serialize};

/// Exported column names, in export order
///
/// These are the names downstream test-management imports expect, so the
/// serialized form of [`TestCase`] uses them verbatim.
pub const FIELD_NAMES: [&str; 15] = [
    "id_caso_prueba",
    "titulo_caso_prueba",
    "Descripcion",
    "Precondiciones",
    "Tipo_de_prueba",
    "Nivel_de_prueba",
    "Tipo_de_ejecucion",
    "Pasos",
    "Resultado_esperado",
    "Categoria",
    "Ambiente",
    "Ciclo",
    "issuetype",
    "Prioridad",
    "Historia",
];

/// A normalized test case
///
/// After normalization every text field is non-empty and both ordered
/// sequences hold at least one entry. Ids are assigned by the normalizer
/// ("TC001", "TC002", ...), never taken from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Canonical sequential id
    #[serde(rename = "id_caso_prueba")]
    pub id: String,

    /// Short title
    #[serde(rename = "titulo_caso_prueba")]
    pub title: String,

    /// Detailed description
    #[serde(rename = "Descripcion")]
    pub description: String,

    /// What must hold before running the test
    #[serde(rename = "Precondiciones")]
    pub preconditions: String,

    /// Functional or non-functional
    #[serde(rename = "Tipo_de_prueba")]
    pub kind: TestKind,

    /// Test level (e.g. "UAT")
    #[serde(rename = "Nivel_de_prueba")]
    pub level: String,

    /// Execution kind (e.g. "Manual")
    #[serde(rename = "Tipo_de_ejecucion")]
    pub execution: String,

    /// Ordered steps
    #[serde(rename = "Pasos")]
    pub steps: Vec<String>,

    /// Ordered expected results
    #[serde(rename = "Resultado_esperado")]
    pub expected_results: Vec<String>,

    /// Category, consistent with `kind`
    #[serde(rename = "Categoria")]
    pub category: Category,

    /// Target environment (e.g. "QA")
    #[serde(rename = "Ambiente")]
    pub environment: String,

    /// Test cycle (e.g. "Ciclo 1")
    #[serde(rename = "Ciclo")]
    pub cycle: String,

    /// Issue type for the tracker (e.g. "Test Case")
    #[serde(rename = "issuetype")]
    pub issue_type: String,

    /// Priority
    #[serde(rename = "Prioridad")]
    pub priority: Priority,

    /// Label of the story the case was generated from
    #[serde(rename = "Historia")]
    pub source_story: String,
}

impl TestCase {
    /// Canonical id for a 0-based position in the final collection
    pub fn id_for_position(position: usize) -> String {
        format!("TC{:03}", position + 1)
    }

    /// Flatten to export cells, in [`FIELD_NAMES`] order.
    ///
    /// List-valued fields are joined with `separator`.
    pub fn to_row(&self, separator: &str) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.description.clone(),
            self.preconditions.clone(),
            self.kind.label().to_string(),
            self.level.clone(),
            self.execution.clone(),
            self.steps.join(separator),
            self.expected_results.join(separator),
            self.category.label().to_string(),
            self.environment.clone(),
            self.cycle.clone(),
            self.issue_type.clone(),
            self.priority.label().to_string(),
            self.source_story.clone(),
        ]
    }

    /// Check the post-normalization invariant
    pub fn validate(&self) -> Result<(), String> {
        let text_fields = [
            ("id", &self.id),
            ("title", &self.title),
            ("description", &self.description),
            ("preconditions", &self.preconditions),
            ("level", &self.level),
            ("execution", &self.execution),
            ("environment", &self.environment),
            ("cycle", &self.cycle),
            ("issue_type", &self.issue_type),
            ("source_story", &self.source_story),
        ];
        for (name, value) in text_fields {
            if value.trim().is_empty() {
                return Err(format!("{} is empty", name));
            }
        }
        if self.steps.is_empty() || self.steps.iter().any(|s| s.trim().is_empty()) {
            return Err("steps must be a non-empty list of non-empty strings".to_string());
        }
        if self.expected_results.is_empty()
            || self.expected_results.iter().any(|s| s.trim().is_empty())
        {
            return Err("expected_results must be a non-empty list of non-empty strings".to_string());
        }
        if self.category.kind() != self.kind {
            return Err(format!(
                "category {} does not belong to kind {}",
                self.category, self.kind
            ));
        }
        Ok(())
    }
}
