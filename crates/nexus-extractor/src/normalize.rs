//! Aggregate raw records into the final test-case collection
//!
//! Every step is total: malformed fields are coerced or defaulted, never
//! rejected. Order of operations is coercion, kind filtering,
//! deduplication, then re-identification.

use crate::chunking::split_sentences;
use crate::config::PipelineConfig;
use crate::fields::{self, Field, RawRecord};
use crate::similarity;
use nexus_domain::text::fold_key;
use nexus_domain::{Category, KindSet, Priority, TestCase, TestKind};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static LEADING_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-•*·]\s+").expect("valid bullet pattern"));

static ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\d{1,2}[.)]\s+").expect("valid enumeration pattern"));

static LEADING_ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,2}[.)]\s+").expect("valid enumeration pattern"));

/// Words ignored when fingerprinting titles
const STOPWORDS: &[&str] = &[
    // Spanish
    "el", "la", "los", "las", "un", "una", "unos", "unas", "de", "del", "al", "a", "en", "con",
    "por", "para", "y", "o", "que", "se", "su", "sus", "lo",
    // English
    "the", "an", "of", "to", "in", "on", "with", "for", "and", "or", "is",
    // Verbs every title starts with
    "verificar", "validar", "comprobar", "probar", "verify", "validate", "check", "test",
];

/// A raw record and the label of the fragment it came from
#[derive(Debug, Clone)]
pub struct TaggedRecord {
    /// Record as parsed from the response
    pub record: RawRecord,

    /// Story label of the source fragment
    pub story_label: String,
}

impl TaggedRecord {
    /// Tag a record with its fragment's story label
    pub fn new(record: RawRecord, story_label: impl Into<String>) -> Self {
        Self {
            record,
            story_label: story_label.into(),
        }
    }
}

/// Turns raw records from all fragments into normalized test cases
pub struct Normalizer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer using the configured defaults and threshold
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Coerce, filter by kind, deduplicate and assign sequential ids
    pub fn normalize(&self, raw: Vec<TaggedRecord>, kinds: KindSet) -> Vec<TestCase> {
        let total = raw.len();
        let filtered: Vec<TestCase> = raw
            .iter()
            .map(|tagged| self.coerce(tagged))
            .filter(|case| kinds.contains(case.kind))
            .collect();
        let kept_by_kind = filtered.len();

        let mut cases = dedupe(
            filtered,
            self.config.similarity_threshold,
            &self.config.defaults.title,
        );
        for (position, case) in cases.iter_mut().enumerate() {
            case.id = TestCase::id_for_position(position);
        }

        debug!(
            raw = total,
            dropped_by_kind = total - kept_by_kind,
            duplicates = kept_by_kind - cases.len(),
            final_count = cases.len(),
            "normalized test cases"
        );
        cases
    }

    /// Build a complete test case from one raw record.
    ///
    /// The id is the model's, if any; `normalize` replaces it.
    pub fn coerce(&self, tagged: &TaggedRecord) -> TestCase {
        let defaults = &self.config.defaults;
        let fields = fields::index(&tagged.record);
        let text = |field: Field| fields.get(&field).and_then(|v| text_of(v));
        let or_default = |field: Field, default: &str| text(field).unwrap_or_else(|| default.to_string());

        let category_text = text(Field::Category).unwrap_or_default();
        let kind = text(Field::Kind)
            .and_then(|k| TestKind::parse(&k))
            .or_else(|| Category::recognize(&category_text).map(|c| c.kind()))
            .unwrap_or(TestKind::Functional);

        let priority = text(Field::Priority)
            .and_then(|p| Priority::parse(&p))
            .unwrap_or_default();

        let source_story = text(Field::Story)
            .or_else(|| {
                let label = tagged.story_label.trim();
                (!label.is_empty()).then(|| label.to_string())
            })
            .unwrap_or_else(|| self.config.default_story_label.clone());

        TestCase {
            id: text(Field::Id).unwrap_or_default(),
            title: or_default(Field::Title, &defaults.title),
            description: or_default(Field::Description, &defaults.description),
            preconditions: or_default(Field::Preconditions, &defaults.preconditions),
            kind,
            level: or_default(Field::Level, &defaults.level),
            execution: or_default(Field::Execution, &defaults.execution),
            steps: list_or(&fields, Field::Steps, &defaults.step_placeholder),
            expected_results: list_or(&fields, Field::ExpectedResults, &defaults.result_placeholder),
            category: Category::resolve(&category_text, kind),
            environment: or_default(Field::Environment, &defaults.environment),
            cycle: or_default(Field::Cycle, &defaults.cycle),
            issue_type: or_default(Field::IssueType, &defaults.issue_type),
            priority,
            source_story,
        }
    }
}

/// Scalar text of a value; arrays are joined with "; "
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(text_of)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn list_or(fields: &HashMap<Field, &Value>, field: Field, placeholder: &str) -> Vec<String> {
    let items = match fields.get(&field) {
        Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
        Some(Value::String(s)) => split_list(s),
        Some(other) => text_of(other).into_iter().collect(),
        None => Vec::new(),
    };
    if items.is_empty() {
        vec![placeholder.to_string()]
    } else {
        items
    }
}

/// Split a delimited string into list items: bullets, numbering, lines or
/// " | ", falling back to sentences.
///
/// Numbers are only treated as item markers when the text itself opens with
/// one, so "opción 2. Confirmar" keeps its "2".
fn split_list(text: &str) -> Vec<String> {
    let unbulleted = LEADING_BULLET.replace_all(text, "\n");
    let unnumbered = if LEADING_ENUMERATION.is_match(text) {
        ENUMERATION.replace_all(&unbulleted, "\n").into_owned()
    } else {
        unbulleted.into_owned()
    };

    let items: Vec<String> = unnumbered
        .split('\n')
        .flat_map(|line| line.split(" | "))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect();

    if let [single] = items.as_slice() {
        let sentences = split_sentences(single);
        if sentences.len() > 1 {
            return sentences.into_iter().map(String::from).collect();
        }
    }
    items
}

/// Normalized title, kind and category joined with '|'.
///
/// A case still carrying the `untitled` default is keyed by its description
/// and steps instead, so untitled cases are not all merged together.
pub fn fingerprint(case: &TestCase, untitled: &str) -> String {
    let subject = if case.title == untitled {
        format!("{} {}", case.description, case.steps.join(" "))
    } else {
        case.title.clone()
    };
    format!(
        "{}|{}|{}",
        normalized_title(&subject),
        case.kind.as_str(),
        fold_key(case.category.label())
    )
}

fn normalized_title(title: &str) -> String {
    fold_key(title)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty() && !STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop every case whose fingerprint is at least `threshold` similar to an
/// earlier kept one. Quadratic in the number of kept cases.
pub fn dedupe(cases: Vec<TestCase>, threshold: f64, untitled: &str) -> Vec<TestCase> {
    let mut kept = Vec::with_capacity(cases.len());
    let mut prints: Vec<String> = Vec::with_capacity(cases.len());

    for case in cases {
        let print = fingerprint(&case, untitled);
        let duplicate_of = prints
            .iter()
            .position(|kept_print| *kept_print == print || similarity::ratio(kept_print, &print) >= threshold);
        if let Some(position) = duplicate_of {
            debug!(title = %case.title, duplicate_of = position, "dropping duplicate test case");
            continue;
        }
        prints.push(print);
        kept.push(case);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn tagged(value: Value) -> TaggedRecord {
        TaggedRecord::new(value.as_object().unwrap().clone(), "STORY #1: Login")
    }

    fn normalize(raw: Vec<TaggedRecord>, kinds: KindSet) -> Vec<TestCase> {
        let config = PipelineConfig::default();
        Normalizer::new(&config).normalize(raw, kinds)
    }

    #[test]
    fn test_sparse_record_is_completed() {
        let cases = normalize(vec![tagged(json!({}))], KindSet::both());
        assert_eq!(cases.len(), 1);

        let case = &cases[0];
        assert!(case.validate().is_ok());
        assert_eq!(case.id, "TC001");
        assert_eq!(case.kind, TestKind::Functional);
        assert_eq!(case.priority, Priority::Medium);
        assert_eq!(case.level, "UAT");
        assert_eq!(case.cycle, "Ciclo 1");
        assert_eq!(case.steps, vec!["Paso por definir"]);
        assert_eq!(case.expected_results, vec!["Resultado por definir"]);
        assert_eq!(case.source_story, "STORY #1: Login");
    }

    #[test]
    fn test_numbered_steps_string_is_split() {
        let raw = tagged(json!({
            "titulo": "Login",
            "Pasos": "1. Abrir la app 2. Ingresar usuario 3) Pulsar entrar",
            "Resultado_esperado": "- Se muestra el panel\n- Se registra el acceso",
        }));
        let case = &normalize(vec![raw], KindSet::both())[0];
        assert_eq!(case.steps, vec!["Abrir la app", "Ingresar usuario", "Pulsar entrar"]);
        assert_eq!(
            case.expected_results,
            vec!["Se muestra el panel", "Se registra el acceso"]
        );
    }

    #[test]
    fn test_sentence_steps_and_empty_results() {
        let raw = tagged(json!({
            "steps": "Abrir la app. Ingresar datos.",
            "expected_results": ["", "  "],
        }));
        let case = &normalize(vec![raw], KindSet::both())[0];
        assert_eq!(case.steps, vec!["Abrir la app.", "Ingresar datos."]);
        assert_eq!(case.expected_results, vec!["Resultado por definir"]);
    }

    #[test]
    fn test_inline_number_is_not_numbering() {
        let raw = tagged(json!({
            "titulo": "Pago",
            "Pasos": "Seleccionar la opción 2. Confirmar el pago",
            "Resultado_esperado": "Se cobran 3 unidades",
        }));
        let case = &normalize(vec![raw], KindSet::both())[0];
        assert_eq!(case.steps, vec!["Seleccionar la opción 2.", "Confirmar el pago"]);
        assert_eq!(case.expected_results, vec!["Se cobran 3 unidades"]);
    }

    #[test]
    fn test_pipe_joined_steps() {
        let raw = tagged(json!({"Pasos": "Abrir | Escribir | Guardar"}));
        let case = &normalize(vec![raw], KindSet::both())[0];
        assert_eq!(case.steps.len(), 3);
    }

    #[test]
    fn test_model_ids_are_replaced() {
        let raw = vec![
            tagged(json!({"id_caso_prueba": "X9", "titulo": "Registro de usuario nuevo"})),
            tagged(json!({"id_caso_prueba": "X9", "titulo": "Exportar reporte mensual en PDF"})),
        ];
        let ids: Vec<_> = normalize(raw, KindSet::both()).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["TC001", "TC002"]);
    }

    #[test]
    fn test_kind_filtering() {
        let raw = vec![
            tagged(json!({"titulo": "Login exitoso", "Tipo_de_prueba": "Funcional"})),
            tagged(json!({"titulo": "Tiempo de respuesta", "Tipo_de_prueba": "No Funcional"})),
        ];
        let cases = normalize(raw, KindSet::only(TestKind::Functional));
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].kind, TestKind::Functional);

        let raw = vec![tagged(json!({"titulo": "x"}))];
        assert!(normalize(raw, KindSet::none()).is_empty());
    }

    #[test]
    fn test_category_consistent_with_kind() {
        let raw = vec![
            tagged(json!({"titulo": "Carga", "Tipo_de_prueba": "No Funcional", "Categoria": "Flujo Principal"})),
            tagged(json!({"titulo": "Cifrado de contraseñas", "Categoria": "Seguridad"})),
        ];
        let cases = normalize(raw, KindSet::both());
        assert_eq!(cases[0].category, Category::Performance);
        assert_eq!(cases[1].kind, TestKind::NonFunctional);
        assert_eq!(cases[1].category, Category::Security);
    }

    #[test]
    fn test_priority_and_story_from_record() {
        let raw = tagged(json!({"priority": "High", "Historia": "STORY #4: Pagos", "level": 3}));
        let case = &normalize(vec![raw], KindSet::both())[0];
        assert_eq!(case.priority, Priority::High);
        assert_eq!(case.source_story, "STORY #4: Pagos");
        assert_eq!(case.level, "3");
    }

    #[test]
    fn test_near_identical_titles_are_merged() {
        let raw = vec![
            tagged(json!({"titulo": "Verificar login con credenciales válidas", "Tipo_de_prueba": "Funcional", "Categoria": "Flujo Principal"})),
            tagged(json!({"titulo": "Validar el login con credenciales válidas", "Tipo_de_prueba": "Funcional", "Categoria": "Flujo Principal"})),
        ];
        let cases = normalize(raw, KindSet::both());
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].title, "Verificar login con credenciales válidas");
    }

    #[test]
    fn test_distinct_titles_are_kept() {
        let raw = vec![
            tagged(json!({"titulo": "Login con credenciales válidas"})),
            tagged(json!({"titulo": "Bloqueo tras tres intentos fallidos"})),
        ];
        assert_eq!(normalize(raw, KindSet::both()).len(), 2);
    }

    #[test]
    fn test_fingerprint() {
        let config = PipelineConfig::default();
        let case = Normalizer::new(&config).coerce(&tagged(json!({
            "titulo": "Verificar el Login, con éxito",
            "Categoria": "Casos de Error",
        })));
        assert_eq!(
            fingerprint(&case, &config.defaults.title),
            "login exito|functional|casos de error"
        );
    }

    #[test]
    fn test_similar_fingerprints_are_merged() {
        let config = PipelineConfig::default();
        let normalizer = Normalizer::new(&config);
        let first = normalizer.coerce(&tagged(json!({"titulo": "Inicio de sesión con contraseña correcta"})));
        let second = normalizer.coerce(&tagged(json!({
            "titulo": "Inicio de sesión con la contraseña correcta del usuario"
        })));

        let untitled = &config.defaults.title;
        let (a, b) = (fingerprint(&first, untitled), fingerprint(&second, untitled));
        assert_ne!(a, b);
        let score = similarity::ratio(&a, &b);
        assert!((0.85..1.0).contains(&score), "ratio {}", score);

        let kept = dedupe(vec![first.clone(), second], config.similarity_threshold, untitled);
        assert_eq!(kept, vec![first]);
    }

    #[test]
    fn test_untitled_cases_keyed_by_content() {
        let raw = vec![
            tagged(json!({"Descripcion": "El usuario recupera la contraseña", "Pasos": ["Pulsar Olvidé mi contraseña"]})),
            tagged(json!({"Descripcion": "El administrador exporta el reporte mensual", "Pasos": ["Abrir reportes"]})),
            tagged(json!({"Descripcion": "El usuario recupera la contraseña", "Pasos": ["Pulsar Olvidé mi contraseña"]})),
        ];
        let cases = normalize(raw, KindSet::both());
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].description, "El administrador exporta el reporte mensual");
    }

    fn raw_record() -> impl Strategy<Value = TaggedRecord> {
        (
            prop::option::of(prop::sample::select(vec![
                "Verificar login con credenciales válidas",
                "Validar el login con credenciales válidas",
                "Bloqueo tras intentos fallidos",
                "Tiempo de respuesta del login",
                "",
            ])),
            "[a-zA-Z ]{0,12}",
            prop::sample::select(vec!["Funcional", "No Funcional", "non-functional", "", "otro"]),
            prop::sample::select(vec!["Flujo Principal", "Seguridad", "Casos Límite", "", "???"]),
            prop_oneof![
                "[a-z .|0-9]{0,40}".prop_map(Value::from),
                prop::collection::vec("[a-z ]{0,10}", 0..4).prop_map(|v| json!(v)),
            ],
            prop::option::of("[A-Z]{2}[0-9]{2}"),
        )
            .prop_map(|(title, suffix, kind, category, steps, id)| {
                let mut record = RawRecord::new();
                if let Some(title) = title {
                    record.insert("titulo".into(), json!(format!("{} {}", title, suffix)));
                }
                record.insert("Tipo_de_prueba".into(), json!(kind));
                record.insert("Categoria".into(), json!(category));
                record.insert("Pasos".into(), steps);
                if let Some(id) = id {
                    record.insert("id".into(), json!(id));
                }
                TaggedRecord::new(record, "STORY #2: Registro")
            })
    }

    fn kind_set() -> impl Strategy<Value = KindSet> {
        (any::<bool>(), any::<bool>()).prop_map(|(functional, non_functional)| KindSet {
            functional,
            non_functional,
        })
    }

    proptest! {
        #[test]
        fn prop_records_complete_with_sequential_ids(
            raw in prop::collection::vec(raw_record(), 0..25),
            kinds in kind_set(),
        ) {
            let cases = normalize(raw, kinds);
            for (position, case) in cases.iter().enumerate() {
                prop_assert!(case.validate().is_ok(), "{:?}", case.validate());
                prop_assert_eq!(&case.id, &format!("TC{:03}", position + 1));
                prop_assert!(kinds.contains(case.kind));
            }
        }

        #[test]
        fn prop_normalize_is_idempotent(raw in prop::collection::vec(raw_record(), 0..25)) {
            let first = normalize(raw, KindSet::both());
            let again: Vec<TaggedRecord> = first
                .iter()
                .map(|case| {
                    let value = serde_json::to_value(case).unwrap();
                    TaggedRecord::new(value.as_object().unwrap().clone(), "")
                })
                .collect();
            let second = normalize(again, KindSet::both());
            prop_assert_eq!(first, second);
        }
    }
}
