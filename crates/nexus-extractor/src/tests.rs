//! Integration tests for the generation pipelines

#[cfg(test)]
mod tests {
    use crate::{
        ExtractorError, MatrixRequest, MatrixResponse, PipelineConfig, QaGenerator, StoryRequest,
        StoryResponse,
    };
    use nexus_domain::{Category, KindSet, StoryType, TestKind};
    use nexus_llm::{LlmError, MockProvider};
    use std::time::Duration;

    const LOGIN_TEXT: &str = "Sistema de Login. El sistema debe permitir que los usuarios registrados \
        inicien sesión con su correo electrónico y contraseña. La contraseña debe tener al menos \
        ocho caracteres, una mayúscula y un número. Tras tres intentos fallidos consecutivos la \
        cuenta queda bloqueada durante quince minutos y se envía un correo de aviso al titular. \
        El usuario puede solicitar la recuperación de la contraseña mediante un enlace temporal \
        que caduca en veinticuatro horas. La sesión expira tras treinta minutos de inactividad y \
        el usuario debe autenticarse de nuevo. El inicio de sesión debe responder en menos de dos \
        segundos con mil usuarios concurrentes. Las contraseñas se almacenan cifradas y nunca se \
        muestran en los registros del sistema. La pantalla de acceso debe ser accesible con lector \
        de pantalla y funcionar en los navegadores Chrome, Firefox y Safari en sus dos últimas \
        versiones. Todos los accesos, exitosos o fallidos, quedan registrados con fecha, hora y \
        dirección IP para auditoría.";

    const LOGIN_RESPONSE: &str = r#"Claro, aquí está la matriz de pruebas:
```json
[
  {
    "id_caso_prueba": "X1",
    "titulo_caso_prueba": "Verificar login con credenciales válidas",
    "Descripcion": "El usuario accede con correo y contraseña correctos",
    "Precondiciones": "Usuario registrado y activo",
    "Tipo_de_prueba": "Funcional",
    "Pasos": ["Abrir la pantalla de acceso", "Ingresar correo y contraseña", "Pulsar Entrar"],
    "Resultado_esperado": ["Se muestra el panel principal"],
    "Categoria": "Flujo Principal",
    "Prioridad": "Alta"
  },
  {
    "id_caso_prueba": "X2",
    "titulo_caso_prueba": "Validar el login con credenciales válidas",
    "Tipo_de_prueba": "Funcional",
    "Pasos": ["Ingresar credenciales"],
    "Resultado_esperado": ["Acceso concedido"],
    "Categoria": "Flujo Principal"
  },
  {
    "id_caso_prueba": "X3",
    "titulo_caso_prueba": "Bloqueo de cuenta tras tres intentos fallidos",
    "Tipo_de_prueba": "Funcional",
    "Pasos": "1. Ingresar contraseña errónea 2. Repetir dos veces más",
    "Resultado_esperado": "La cuenta queda bloqueada. Se envía un correo de aviso.",
    "Categoria": "Casos de Error",
  },
  {
    "titulo_caso_prueba": "Tiempo de respuesta del login menor a 2 segundos",
    "Tipo_de_prueba": "No Funcional",
    "Pasos": ["Simular 1000 usuarios concurrentes", "Medir el tiempo de respuesta"],
    "Resultado_esperado": ["El percentil 95 es menor a 2 segundos"],
    "Categoria": "Rendimiento",
    "Prioridad": "Media"
  }
]
```
Espero que te sirva."#;

    const MARKED_TEXT: &str = "STORY #1: Login\nEl usuario inicia sesión con correo y contraseña.\n\
        STORY #2: Registro\nEl visitante crea una cuenta nueva con su correo.";

    const SINGLE_CASE: &str =
        r#"[{"titulo_caso_prueba": "Caso generado", "Tipo_de_prueba": "Funcional"}]"#;

    fn generator(provider: MockProvider) -> QaGenerator<MockProvider> {
        QaGenerator::new(provider, PipelineConfig::default()).unwrap()
    }

    fn matrix_request(text: &str, kinds: KindSet) -> MatrixRequest {
        MatrixRequest {
            text: text.to_string(),
            kinds,
            context: Some("Portal web de clientes".to_string()),
            flow: Some("Inicio de sesión".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_login_document_produces_both_kinds() {
        let provider = MockProvider::new(LOGIN_RESPONSE);
        let generator = generator(provider.clone());

        let response = generator
            .generate_test_matrix(matrix_request(LOGIN_TEXT, KindSet::both()))
            .await;

        let MatrixResponse::Success { records, counts } = response else {
            panic!("expected success");
        };

        assert_eq!(provider.call_count(), 1);
        assert_eq!(counts.fragments, 1);
        assert_eq!(counts.failed_fragments, 0);

        // The near-identical second case is merged into the first
        assert_eq!(records.len(), 3);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.functional, 2);
        assert_eq!(counts.non_functional, 1);

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["TC001", "TC002", "TC003"]);

        assert!(records.iter().any(|r| r.kind == TestKind::Functional));
        assert!(records.iter().any(|r| r.kind == TestKind::NonFunctional));
        for record in &records {
            assert!(record.validate().is_ok());
            assert_eq!(record.source_story, "general story");
        }

        assert_eq!(records[1].steps.len(), 2);
        assert_eq!(records[1].category, Category::ErrorCases);
        assert_eq!(records[2].category, Category::Performance);

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("Portal web de clientes"));
        assert!(prompt.contains("Rol objetivo: Usuario"));
    }

    #[tokio::test]
    async fn test_all_fragments_blocked_is_safety_error() {
        let provider = MockProvider::failing(LlmError::SafetyBlocked(
            "The prompt was blocked due to SAFETY".to_string(),
        ));
        let generator = generator(provider.clone());

        let response = generator
            .generate_test_matrix(matrix_request(MARKED_TEXT, KindSet::both()))
            .await;

        assert_eq!(provider.call_count(), 2);
        match response {
            MatrixResponse::Error { message } => {
                assert!(message.contains("safety"), "unexpected message: {}", message)
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_text_makes_no_calls() {
        let provider = MockProvider::new(SINGLE_CASE);
        let generator = generator(provider.clone());

        for text in ["", "   \n\t", "muy corto"] {
            let response = generator
                .generate_test_matrix(matrix_request(text, KindSet::both()))
                .await;
            assert!(matches!(response, MatrixResponse::Error { .. }));

            let result = generator
                .try_generate_test_matrix(matrix_request(text, KindSet::both()))
                .await;
            assert!(matches!(result, Err(ExtractorError::EmptyOrTooShortInput { .. })));
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_text_too_long_is_rejected() {
        let provider = MockProvider::new(SINGLE_CASE);
        let config = PipelineConfig {
            max_text_length: 100,
            matrix_fragment_size: 100,
            ..PipelineConfig::default()
        };
        let generator = QaGenerator::new(provider.clone(), config).unwrap();

        let result = generator
            .try_generate_test_matrix(matrix_request(LOGIN_TEXT, KindSet::both()))
            .await;
        assert!(matches!(result, Err(ExtractorError::TextTooLong(_, 100))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_kinds_makes_no_calls() {
        let provider = MockProvider::new(SINGLE_CASE);
        let generator = generator(provider.clone());

        for text in [LOGIN_TEXT, ""] {
            let response = generator
                .generate_test_matrix(matrix_request(text, KindSet::none()))
                .await;
            match response {
                MatrixResponse::Success { records, counts } => {
                    assert!(records.is_empty());
                    assert_eq!(counts.total, 0);
                }
                other => panic!("expected empty success, got {:?}", other),
            }
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_fragment_is_isolated() {
        let mut provider = MockProvider::new(SINGLE_CASE);
        provider.add_error("STORY #2", LlmError::Unavailable("HTTP 503".to_string()));
        let generator = generator(provider.clone());

        let result = generator
            .try_generate_test_matrix(matrix_request(MARKED_TEXT, KindSet::both()))
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].source_story, "STORY #1: Login");
        assert_eq!(result.counts.fragments, 2);
        assert_eq!(result.counts.failed_fragments, 1);

        let failure = &result.failures[0];
        assert_eq!(failure.index, 1);
        assert_eq!(failure.total, 2);
        assert_eq!(failure.label, "STORY #2: Registro");
        assert!(failure.error.is_per_fragment());
        assert_eq!(result.model_name, "mock");
    }

    #[tokio::test]
    async fn test_records_deduplicated_across_fragments() {
        let provider = MockProvider::new(SINGLE_CASE);
        let generator = generator(provider.clone());

        let result = generator
            .try_generate_test_matrix(matrix_request(MARKED_TEXT, KindSet::both()))
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].id, "TC001");
    }

    #[tokio::test]
    async fn test_kind_filter_drops_unrequested_records() {
        let provider = MockProvider::new(LOGIN_RESPONSE);
        let generator = generator(provider.clone());

        let response = generator
            .generate_test_matrix(matrix_request(
                LOGIN_TEXT,
                KindSet::only(TestKind::NonFunctional),
            ))
            .await;

        let MatrixResponse::Success { records, .. } = response else {
            panic!("expected success");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TestKind::NonFunctional);
        assert_eq!(records[0].id, "TC001");
        assert!(provider.prompts()[0].contains("SOLO NO FUNCIONALES"));
    }

    #[tokio::test]
    async fn test_only_unrequested_kinds_is_terminal() {
        let provider = MockProvider::new(
            r#"[{"titulo_caso_prueba": "Tiempo de respuesta", "Tipo_de_prueba": "No Funcional", "Categoria": "Rendimiento"}]"#,
        );
        let generator = generator(provider.clone());

        let result = generator
            .try_generate_test_matrix(matrix_request(LOGIN_TEXT, KindSet::only(TestKind::Functional)))
            .await;

        match result {
            Err(ExtractorError::NoUsableRecords { fragments, detail }) => {
                assert_eq!(fragments, 1);
                assert!(detail.contains("requested kinds"), "{}", detail);
            }
            other => panic!("expected NoUsableRecords, got {:?}", other),
        }
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_responses_end_in_error() {
        let provider = MockProvider::new("Lo siento, no puedo ayudar con eso.");
        let generator = generator(provider.clone());

        let result = generator
            .try_generate_test_matrix(matrix_request(MARKED_TEXT, KindSet::both()))
            .await;

        match result {
            Err(ExtractorError::NoUsableRecords { fragments, detail }) => {
                assert_eq!(fragments, 2);
                assert!(detail.contains("No structured content"));
            }
            other => panic!("expected NoUsableRecords, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_arrays_end_in_error() {
        let provider = MockProvider::new("[]");
        let generator = generator(provider.clone());

        let response = generator
            .generate_test_matrix(matrix_request(LOGIN_TEXT, KindSet::both()))
            .await;
        match response {
            MatrixResponse::Error { message } => assert!(message.contains("no results")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_generation_times_out() {
        let provider = MockProvider::new(SINGLE_CASE).with_delay(Duration::from_millis(1500));
        let config = PipelineConfig {
            generation_timeout_secs: 1,
            ..PipelineConfig::default()
        };
        let generator = QaGenerator::new(provider, config).unwrap();

        let result = generator
            .try_generate_test_matrix(matrix_request(LOGIN_TEXT, KindSet::both()))
            .await;

        match result {
            Err(ExtractorError::NoUsableRecords { detail, .. }) => {
                assert!(detail.contains("timed out"), "unexpected detail: {}", detail);
            }
            other => panic!("expected timeout failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_story_hint_labels_leading_text() {
        let provider = MockProvider::new(SINGLE_CASE);
        let generator = generator(provider.clone());
        let mut request = matrix_request(LOGIN_TEXT, KindSet::both());
        request.story_hint = Some("HU-12 Acceso".to_string());

        let result = generator.try_generate_test_matrix(request).await.unwrap();
        assert_eq!(result.records[0].source_story, "HU-12 Acceso");
        assert!(provider.prompts()[0].contains("Historia de origen: HU-12 Acceso"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PipelineConfig {
            similarity_threshold: 2.0,
            ..PipelineConfig::default()
        };
        let result = QaGenerator::new(MockProvider::default(), config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    const STORY_RESPONSE: &str = "Estas son las historias:\n\
        ════════════\n\
        HISTORIA #1: Iniciar sesión\n\
        ════════════\n\
        COMO: Cliente\n\
        QUIERO: iniciar sesión\n\
        PARA: ver mis pedidos\n\
        ════════════\n\
        HISTORIA #2: Cerrar sesión\n\
        ════════════\n\
        COMO: Cliente\n\
        QUIERO: cerrar sesión\n\
        PARA: proteger mi cuenta\n\
        ════════════";

    fn story_request(text: &str) -> StoryRequest {
        StoryRequest {
            text: text.to_string(),
            role: Some("Cliente".to_string()),
            story_type: StoryType::UserStory,
            business_context: None,
        }
    }

    #[tokio::test]
    async fn test_direct_story_generation() {
        let provider = MockProvider::new(STORY_RESPONSE);
        let generator = generator(provider.clone());

        let response = generator.generate_user_stories(story_request(LOGIN_TEXT)).await;
        let StoryResponse::Success { stories } = response else {
            panic!("expected success");
        };

        assert_eq!(provider.call_count(), 1);
        assert_eq!(stories.len(), 2);
        assert!(stories[0].starts_with("HISTORIA #1: Iniciar sesión"));
        assert!(stories[0].ends_with("PARA: ver mis pedidos"));
        assert!(stories[1].starts_with("HISTORIA #2: Cerrar sesión"));
        assert!(provider.prompts()[0].contains("COMO: Cliente"));
    }

    #[tokio::test]
    async fn test_stories_renumbered_across_fragments() {
        let provider = MockProvider::new(STORY_RESPONSE);
        let config = PipelineConfig {
            story_fragment_size: 400,
            ..PipelineConfig::default()
        };
        let generator = QaGenerator::new(provider.clone(), config).unwrap();

        let result = generator
            .try_generate_user_stories(story_request(LOGIN_TEXT))
            .await
            .unwrap();

        let calls = provider.call_count();
        assert!(calls > 1);
        assert_eq!(result.stories.len(), calls * 2);
        for (i, story) in result.stories.iter().enumerate() {
            assert!(story.starts_with(&format!("HISTORIA #{}:", i + 1)), "{}", story);
        }
    }

    #[tokio::test]
    async fn test_oversized_fragment_uses_two_phases() {
        let mut provider = MockProvider::default();
        provider.add_response("LISTA NUMERADA", "Funcionalidades:\n1. Alta\n2. Baja\n3. Edición\nTOTAL: 3");
        provider.add_response("FUNCIONALIDADES A DESARROLLAR", STORY_RESPONSE);
        let config = PipelineConfig {
            story_fragment_size: 50,
            story_direct_limit: 60,
            story_batch_size: 2,
            ..PipelineConfig::default()
        };
        let generator = QaGenerator::new(provider.clone(), config).unwrap();

        let text = "El administrador gestiona inventario, pedidos, clientes, proveedores y reportes mensuales";
        let result = generator.try_generate_user_stories(story_request(text)).await.unwrap();

        // One analysis call, then two batches of at most two functionalities
        assert_eq!(provider.call_count(), 3);
        let prompts = provider.prompts();
        assert!(prompts[1].contains("1. Alta\n2. Baja"));
        assert!(prompts[2].contains("3. Edición"));

        assert_eq!(result.stories.len(), 4);
        assert!(result.stories[3].starts_with("HISTORIA #4:"));
    }

    #[tokio::test]
    async fn test_empty_analysis_falls_back_to_direct_prompt() {
        let mut provider = MockProvider::new(STORY_RESPONSE);
        provider.add_response("LISTA NUMERADA", "No encontré funcionalidades.");
        let config = PipelineConfig {
            story_fragment_size: 50,
            story_direct_limit: 60,
            ..PipelineConfig::default()
        };
        let generator = QaGenerator::new(provider.clone(), config).unwrap();

        let text = "El administrador gestiona inventario, pedidos, clientes, proveedores y reportes mensuales";
        let result = generator.try_generate_user_stories(story_request(text)).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(result.stories.len(), 2);
    }

    #[tokio::test]
    async fn test_story_failures() {
        let provider = MockProvider::failing(LlmError::SafetyBlocked("blocked".to_string()));
        let blocked_generator = generator(provider.clone());
        let response = blocked_generator.generate_user_stories(story_request(LOGIN_TEXT)).await;
        match response {
            StoryResponse::Error { message } => assert!(message.contains("safety")),
            other => panic!("expected error, got {:?}", other),
        }

        let provider = MockProvider::new(STORY_RESPONSE);
        let empty_generator = generator(provider.clone());
        let response = empty_generator.generate_user_stories(story_request("")).await;
        assert!(matches!(response, StoryResponse::Error { .. }));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_feature_story_prompt() {
        let provider = MockProvider::new("HISTORIA NO FUNCIONAL #3: Rendimiento\nNECESITO: respuesta rápida");
        let generator = generator(provider.clone());
        let mut request = story_request(LOGIN_TEXT);
        request.story_type = StoryType::Feature;
        request.business_context = Some("Comercio electrónico".to_string());

        let result = generator.try_generate_user_stories(request).await.unwrap();
        assert_eq!(result.stories, vec!["HISTORIA NO FUNCIONAL #1: Rendimiento\nNECESITO: respuesta rápida"]);

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("requisitos no funcionales"));
        assert!(prompt.contains("Comercio electrónico"));
    }
}
