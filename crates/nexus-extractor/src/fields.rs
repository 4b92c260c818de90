//! Field-name aliases accepted in model output

use nexus_domain::text::fold_key;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A raw record as parsed from a response
pub type RawRecord = Map<String, Value>;

/// Test-case fields the normalizer knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Title,
    Description,
    Preconditions,
    Kind,
    Level,
    Execution,
    Steps,
    ExpectedResults,
    Category,
    Environment,
    Cycle,
    IssueType,
    Priority,
    Story,
}

/// Folded key aliases per field. The exported column name comes first.
const ALIASES: &[(Field, &[&str])] = &[
    (Field::Id, &["id caso prueba", "id", "test case id", "id caso", "case id"]),
    (
        Field::Title,
        &["titulo caso prueba", "titulo", "title", "test case title", "nombre", "name"],
    ),
    (Field::Description, &["descripcion", "description"]),
    (
        Field::Preconditions,
        &["precondiciones", "precondicion", "preconditions", "precondition"],
    ),
    (
        Field::Kind,
        &["tipo de prueba", "tipo prueba", "test type", "type", "kind", "tipo"],
    ),
    (Field::Level, &["nivel de prueba", "nivel prueba", "test level", "level", "nivel"]),
    (
        Field::Execution,
        &["tipo de ejecucion", "tipo ejecucion", "execution type", "execution", "ejecucion"],
    ),
    (Field::Steps, &["pasos", "steps", "test steps", "paso"]),
    (
        Field::ExpectedResults,
        &[
            "resultado esperado",
            "resultados esperados",
            "expected results",
            "expected result",
            "expected",
        ],
    ),
    (Field::Category, &["categoria", "category"]),
    (Field::Environment, &["ambiente", "environment", "entorno"]),
    (Field::Cycle, &["ciclo", "cycle"]),
    (Field::IssueType, &["issuetype", "issue type"]),
    (Field::Priority, &["prioridad", "priority"]),
    (
        Field::Story,
        &["historia", "story", "historia de usuario", "user story", "source story"],
    ),
];

/// Map a key from model output to a field
pub fn field_of(key: &str) -> Option<Field> {
    let folded = fold_key(key);
    ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&folded.as_str()))
        .map(|(field, _)| *field)
}

/// Index a record by field. The first non-null value for a field wins.
pub fn index(record: &RawRecord) -> HashMap<Field, &Value> {
    let mut fields = HashMap::new();
    for (key, value) in record {
        if value.is_null() {
            continue;
        }
        if let Some(field) = field_of(key) {
            fields.entry(field).or_insert(value);
        }
    }
    fields
}

/// Whether an object looks like a test case rather than a wrapper
pub fn looks_like_record(record: &RawRecord) -> bool {
    record
        .keys()
        .filter_map(|k| field_of(k))
        .any(|f| matches!(f, Field::Title | Field::Steps))
}
