//! Prompt construction for test matrices and user stories
//!
//! The generation service has no structured-output mode, so the instruction
//! text is the only thing holding the model to the schema. Prompts are pure
//! strings: no I/O, no state.

use crate::types::Fragment;
use nexus_domain::{Category, KindSelection, KindSet, StoryType, TestKind, FIELD_NAMES};

/// Characters of the source document quoted in a story batch prompt
pub const REFERENCE_EXCERPT_CHARS: usize = 2_000;

/// Builds the test-matrix prompt for one fragment
pub struct PromptBuilder {
    fragment: String,
    index: usize,
    label: String,
    kinds: KindSet,
    role: String,
    context: Option<String>,
    flow: Option<String>,
    total: Option<usize>,
}

impl PromptBuilder {
    /// Create a prompt builder for a fragment and the requested kinds
    pub fn new(fragment: &Fragment, kinds: KindSet) -> Self {
        Self {
            fragment: fragment.text.clone(),
            index: fragment.index,
            label: fragment.label.clone(),
            kinds,
            role: String::new(),
            context: None,
            flow: None,
            total: None,
        }
    }

    /// Set the role the tests are written for
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Set the system context
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Set the flow under test
    pub fn with_flow(mut self, flow: Option<String>) -> Self {
        self.flow = flow;
        self
    }

    /// Set the number of fragments in the document
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Build the prompt.
    ///
    /// Returns `None` when no kind was requested: there is nothing to generate.
    pub fn build(&self) -> Option<String> {
        let selection = self.kinds.selection()?;
        let mut prompt = String::new();

        // 1. Schema and output rules
        prompt.push_str(MATRIX_PREAMBLE);
        prompt.push_str("\n\n");
        prompt.push_str(&schema_description());
        prompt.push('\n');
        prompt.push_str(MATRIX_RULES);
        prompt.push_str("\n\n");

        // 2. Kind-specific directives
        prompt.push_str(match selection {
            KindSelection::Both => BOTH_DIRECTIVES,
            KindSelection::FunctionalOnly => FUNCTIONAL_DIRECTIVES,
            KindSelection::NonFunctionalOnly => NON_FUNCTIONAL_DIRECTIVES,
        });
        prompt.push_str("\n\n");

        // 3. Caller parameters, verbatim
        prompt.push_str(&format!(
            "Contexto del sistema:\n{}\n\n",
            or_unspecified(self.context.as_deref())
        ));
        prompt.push_str(&format!(
            "Flujo de prueba a considerar:\n{}\n\n",
            or_unspecified(self.flow.as_deref())
        ));
        if !self.role.trim().is_empty() {
            prompt.push_str(&format!("Rol objetivo: {}\n", self.role));
        }
        prompt.push_str(&format!(
            "Historia de origen: {} (usa este valor en \"Historia\")\n",
            self.label
        ));
        if let Some(total) = self.total {
            prompt.push_str(&format!("Fragmento {} de {}\n", self.index + 1, total));
        }
        prompt.push('\n');

        // 4. The fragment
        prompt.push_str("Texto del documento para generar los casos de prueba:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.fragment);
        prompt.push_str("\n---\n\n");

        prompt.push_str(MATRIX_REMINDER);
        Some(prompt)
    }
}

fn or_unspecified(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => "No especificado",
    }
}

fn labels(kind: TestKind) -> String {
    Category::for_kind(kind)
        .iter()
        .map(|c| format!("\"{}\"", c.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Field-by-field schema, with the exported names and allowed values
fn schema_description() -> String {
    let [id, title, description, preconditions, kind, level, execution, steps, results, category, environment, cycle, issue_type, priority, story] =
        FIELD_NAMES;

    format!(
        "Cada objeto del array debe tener exactamente estas claves:\n\
         - \"{id}\": identificador único (ej. \"TC001\")\n\
         - \"{title}\": título conciso\n\
         - \"{description}\": descripción detallada\n\
         - \"{preconditions}\": requisitos previos para ejecutar la prueba\n\
         - \"{kind}\": \"{functional}\" o \"{non_functional}\"\n\
         - \"{level}\": \"UAT\"\n\
         - \"{execution}\": \"Manual\"\n\
         - \"{steps}\": array de strings, un paso por elemento\n\
         - \"{results}\": array de strings, un resultado verificable por elemento\n\
         - \"{category}\": para funcionales {functional_categories}; para no funcionales {non_functional_categories}\n\
         - \"{environment}\": \"QA\"\n\
         - \"{cycle}\": \"Ciclo 1\"\n\
         - \"{issue_type}\": \"Test Case\"\n\
         - \"{priority}\": \"Alta\", \"Media\" o \"Baja\"\n\
         - \"{story}\": la historia de origen indicada abajo\n",
        functional = TestKind::Functional.label(),
        non_functional = TestKind::NonFunctional.label(),
        functional_categories = labels(TestKind::Functional),
        non_functional_categories = labels(TestKind::NonFunctional),
    )
}

const MATRIX_PREAMBLE: &str = "Eres un experto en Testing y Quality Assurance con experiencia en análisis de requerimientos y diseño de casos de prueba.

TAREA: analiza el requerimiento y genera casos de prueba con la máxima cobertura posible.

FORMATO DE RESPUESTA: devuelve ÚNICAMENTE un array JSON válido de objetos.";

const MATRIX_RULES: &str = "REGLAS:
- Cada caso debe ser único: no repitas casos con distinto título o redacción
- La categoría debe corresponder al tipo de prueba
- Los pasos deben ser claros y ejecutables por cualquier tester
- Los resultados esperados deben ser verificables y específicos
- No incluyas texto ni explicaciones fuera del array JSON";

const BOTH_DIRECTIVES: &str = "TIPOS DE PRUEBAS A GENERAR: FUNCIONALES Y NO FUNCIONALES

Aspectos funcionales a cubrir si están presentes:
- Flujos de trabajo y casos de uso, principales y alternativos
- Validaciones de entrada y transformaciones de datos
- Reglas de negocio, casos límite y condiciones borde
- Manejo de errores y excepciones

Aspectos no funcionales a cubrir si están presentes:
- Rendimiento: tiempo de respuesta, carga, escalabilidad
- Seguridad: autenticación, autorización, protección de datos
- Usabilidad y accesibilidad
- Compatibilidad entre plataformas, navegadores y dispositivos
- Confiabilidad: disponibilidad, recuperación, integridad

La proporción de cada tipo la decide el contenido del requerimiento, no un límite fijo.";

const FUNCTIONAL_DIRECTIVES: &str = "TIPOS DE PRUEBAS A GENERAR: SOLO FUNCIONALES

- Flujo principal y todos los casos exitosos
- Flujos alternativos y rutas de excepción
- Validación de campos y datos
- Casos límite y condiciones borde
- Manejo de errores, estados del sistema y transiciones

Todos los casos deben tener \"Tipo_de_prueba\": \"Funcional\".";

const NON_FUNCTIONAL_DIRECTIVES: &str = "TIPOS DE PRUEBAS A GENERAR: SOLO NO FUNCIONALES

- RENDIMIENTO: carga normal, picos, estrés, tiempo de respuesta
- SEGURIDAD: autenticación, autorización, ataques, cifrado
- USABILIDAD: navegación, accesibilidad, experiencia
- COMPATIBILIDAD: entornos, navegadores, dispositivos, versiones
- CONFIABILIDAD: disponibilidad, recuperación, tolerancia a fallos

Especifica métricas precisas y medibles. Todos los casos deben tener \"Tipo_de_prueba\": \"No Funcional\".";

const MATRIX_REMINDER: &str = "INSTRUCCIONES FINALES:
- Responde SOLO con el array JSON, sin texto adicional ni bloques de código
- Si el texto no contiene nada que probar, responde []";

/// Builds user-story prompts
pub struct StoryPromptBuilder {
    role: String,
    story_type: StoryType,
    business_context: Option<String>,
}

impl StoryPromptBuilder {
    /// Create a builder for the given role and story type
    pub fn new(role: impl Into<String>, story_type: StoryType) -> Self {
        Self {
            role: role.into(),
            story_type,
            business_context: None,
        }
    }

    /// Set the business context
    pub fn with_business_context(mut self, context: Option<String>) -> Self {
        self.business_context = context.filter(|c| !c.trim().is_empty());
        self
    }

    /// One-shot prompt: every story of the fragment in one response
    pub fn direct(&self, fragment: &str) -> String {
        let mut prompt = String::new();
        match self.story_type {
            StoryType::UserStory => prompt.push_str(
                "Eres un analista de negocios Senior especializado en QA y análisis exhaustivo de requerimientos.\n\n\
                 Identifica TODAS las funcionalidades del documento que correspondan al rol indicado \
                 y genera una historia de usuario por cada una.\n\n",
            ),
            StoryType::Feature => prompt.push_str(
                "Eres un analista de negocios Senior especializado en requisitos no funcionales.\n\n\
                 Identifica TODOS los requisitos no funcionales del documento (rendimiento, seguridad, \
                 usabilidad, compatibilidad, confiabilidad) y genera una historia por cada uno.\n\n",
            ),
        }
        self.push_context(&mut prompt);
        prompt.push_str("DOCUMENTO A ANALIZAR:\n---\n");
        prompt.push_str(fragment);
        prompt.push_str("\n---\n\n");
        prompt.push_str(&self.template(1));
        prompt.push_str(&self.role_rule());
        prompt
    }

    /// First phase for oversized fragments: list the functionalities
    pub fn analysis(&self, fragment: &str) -> String {
        let mut prompt = String::from(
            "Eres un analista de negocios Senior. Tu tarea es IDENTIFICAR Y LISTAR las funcionalidades del documento.\n\n",
        );
        self.push_context(&mut prompt);
        prompt.push_str("DOCUMENTO A ANALIZAR:\n---\n");
        prompt.push_str(fragment);
        prompt.push_str("\n---\n\n");
        prompt.push_str(&format!(
            "INSTRUCCIONES:\n\
             1. Lee el documento completo\n\
             2. Crea una LISTA NUMERADA de funcionalidades EXCLUSIVAMENTE para el rol: {role}\n\
             3. Ignora las funcionalidades de otros roles\n\n\
             FORMATO DE RESPUESTA, una funcionalidad por línea:\n\
             1. [Nombre] - [Descripción breve]\n\
             2. [Nombre] - [Descripción breve]\n\n\
             NO generes historias todavía, solo la lista.\n",
            role = self.role
        ));
        prompt
    }

    /// Second phase: stories for one batch of functionalities.
    ///
    /// `start` is the 0-based position of the batch's first functionality.
    pub fn batch(&self, functionalities: &[String], start: usize, document: &str) -> String {
        let end = start + functionalities.len();
        let listed = functionalities
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{}. {}", start + i + 1, strip_numbering(f)))
            .collect::<Vec<_>>()
            .join("\n");
        let excerpt: String = document.chars().take(REFERENCE_EXCERPT_CHARS).collect();

        let mut prompt = String::from(
            "Eres un analista de negocios Senior. Genera historias DETALLADAS para las siguientes funcionalidades.\n\n",
        );
        self.push_context(&mut prompt);
        prompt.push_str(&format!(
            "FUNCIONALIDADES A DESARROLLAR (lote {} a {}):\n{}\n\n",
            start + 1,
            end,
            listed
        ));
        prompt.push_str("DOCUMENTO DE REFERENCIA (extracto):\n---\n");
        prompt.push_str(&excerpt);
        prompt.push_str("\n---\n\n");
        prompt.push_str(&self.template(start + 1));
        prompt.push_str(&self.role_rule());
        prompt.push_str(&format!("Numera consecutivamente desde {}.\n", start + 1));
        prompt
    }

    fn push_context(&self, prompt: &mut String) {
        if let Some(context) = &self.business_context {
            prompt.push_str(&format!("CONTEXTO DE NEGOCIO:\n{}\n\n", context));
        }
    }

    fn role_rule(&self) -> String {
        format!(
            "\nIMPORTANTE: escribe TODAS las historias desde la perspectiva del rol **{role}**. \
             No incluyas otros roles. Responde solo con las historias, sin introducción.\n",
            role = self.role
        )
    }

    fn template(&self, first_number: usize) -> String {
        let body = match self.story_type {
            StoryType::UserStory => USER_STORY_TEMPLATE,
            StoryType::Feature => FEATURE_TEMPLATE,
        };
        format!(
            "FORMATO OBLIGATORIO para cada historia (la primera es la #{first_number}):\n\n{}",
            body.replace("{role}", &self.role)
        )
    }
}

/// "3. Login - ..." -> "Login - ..."
fn strip_numbering(line: &str) -> &str {
    let trimmed = line.trim();
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return trimmed;
    }
    let rest = &trimmed[digits..];
    rest.strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .map(str::trim_start)
        .unwrap_or(trimmed)
}

const USER_STORY_TEMPLATE: &str = "════════════════════════════════════════════════════════════
HISTORIA #[número]: [Título]
════════════════════════════════════════════════════════════

COMO: {role}
QUIERO: [funcionalidad específica]
PARA: [beneficio de negocio]

CRITERIOS DE ACEPTACIÓN:

Escenario Principal:
   DADO que [contexto]
   CUANDO [acción]
   ENTONCES [resultado]

Escenario Alternativo:
   DADO que [contexto alternativo]
   CUANDO [acción diferente]
   ENTONCES [resultado alternativo]

Validaciones:
   DADO que [condición de error]
   CUANDO [acción que genera el error]
   ENTONCES [manejo del error]

REGLAS DE NEGOCIO:
• [Regla 1]
• [Regla 2]

PRIORIDAD: [Alta/Media/Baja]
COMPLEJIDAD: [Simple/Moderada/Compleja]
";

const FEATURE_TEMPLATE: &str = "════════════════════════════════════════════════════════════
HISTORIA NO FUNCIONAL #[número]: [Título]
════════════════════════════════════════════════════════════

COMO: {role}
NECESITO: [requisito no funcional]
PARA: [garantizar calidad]

CRITERIOS DE ACEPTACIÓN:
• [Criterio medible 1]
• [Criterio medible 2]

MÉTRICAS:
• [Métrica objetivo]

CATEGORÍA: [Rendimiento/Seguridad/Usabilidad/Compatibilidad/Confiabilidad]
PRIORIDAD: [Alta/Media/Baja]
";
