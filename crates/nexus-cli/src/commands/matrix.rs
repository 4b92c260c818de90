//! Matrix command implementation.

use crate::cli::MatrixArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use nexus_domain::traits::LlmProvider;
use nexus_domain::KindSet;
use nexus_extractor::{MatrixRequest, MatrixResult, QaGenerator};
use nexus_formats::{bundle, read_document, render_all, Artifact, OutputFormat};
use nexus_llm::LlmError;
use std::path::PathBuf;
use tracing::info;

/// Execute the matrix command.
pub async fn execute_matrix<L>(
    args: MatrixArgs,
    generator: &QaGenerator<L>,
    config: &Config,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Into<LlmError>,
{
    let (result, files) = run_matrix(args, generator, config).await?;
    println!("{}", formatter.format_matrix(&result, &files)?);
    Ok(())
}

/// Read the document, generate the matrix and write the requested files.
pub async fn run_matrix<L>(
    args: MatrixArgs,
    generator: &QaGenerator<L>,
    config: &Config,
) -> Result<(MatrixResult, Vec<PathBuf>)>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Into<LlmError>,
{
    let kinds = match args.kinds.as_deref() {
        Some(kinds) => KindSet::parse_list(kinds).map_err(CliError::InvalidInput)?,
        None => config.pipeline.default_kinds,
    };
    let formats = OutputFormat::parse_list(
        args.formats
            .as_deref()
            .unwrap_or(config.settings.matrix_formats.as_str()),
    )?;
    if formats.is_empty() {
        return Err(CliError::InvalidInput("no output format selected".to_string()));
    }

    let text = read_document(&args.file)?;
    info!("Read {} characters from {}", text.chars().count(), args.file.display());

    let request = MatrixRequest {
        text,
        kinds,
        context: args.context,
        flow: args.flow,
        story_hint: args.story,
        role: args.role,
    };
    let result = generator.try_generate_test_matrix(request).await?;

    let base_name = args
        .name
        .unwrap_or_else(|| format!("{}_test_matrix", super::file_stem(&args.file)));
    let artifacts = render_all(&base_name, &formats, &result.records)?;
    let artifacts = if args.zip {
        vec![bundle(&base_name, &artifacts)?]
    } else {
        artifacts
    };

    let files = write_artifacts(&args.out, &artifacts)?;
    Ok((result, files))
}

/// Write artifacts into `dir`, creating it when needed
pub(crate) fn write_artifacts(dir: &std::path::Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    artifacts
        .iter()
        .map(|artifact| {
            let path = dir.join(&artifact.name);
            std::fs::write(&path, &artifact.bytes)?;
            info!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_extractor::PipelineConfig;
    use nexus_formats::stories_to_docx;
    use nexus_llm::MockProvider;
    use std::path::Path;

    const RESPONSE: &str = r#"[
        {"titulo_caso_prueba": "Login válido", "Tipo_de_prueba": "Funcional", "Pasos": ["Ingresar"], "Resultado_esperado": ["Acceso"]},
        {"titulo_caso_prueba": "Tiempo de respuesta", "Tipo_de_prueba": "No Funcional", "Categoria": "Rendimiento"}
    ]"#;

    fn write_docx(dir: &Path) -> PathBuf {
        let path = dir.join("login.docx");
        let paragraphs = vec![
            "El usuario inicia sesión con correo y contraseña.".to_string(),
            "El sistema responde en menos de dos segundos.".to_string(),
        ];
        std::fs::write(&path, stories_to_docx("Sistema de Login", &paragraphs).unwrap()).unwrap();
        path
    }

    fn args(file: PathBuf, out: PathBuf) -> MatrixArgs {
        MatrixArgs {
            file,
            kinds: None,
            context: Some("Portal".to_string()),
            flow: None,
            story: None,
            role: None,
            out,
            formats: Some("json,csv,xlsx".to_string()),
            zip: false,
            name: None,
        }
    }

    fn generator(provider: MockProvider) -> QaGenerator<MockProvider> {
        QaGenerator::new(provider, PipelineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_writes_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_docx(dir.path());
        let out = dir.path().join("out");

        let (result, files) = run_matrix(args(file, out.clone()), &generator(MockProvider::new(RESPONSE)), &Config::default())
            .await
            .unwrap();

        assert_eq!(result.counts.total, 2);
        assert_eq!(
            files,
            vec![
                out.join("login_test_matrix.json"),
                out.join("login_test_matrix.csv"),
                out.join("login_test_matrix.xlsx"),
            ]
        );
        let csv = std::fs::read_to_string(&files[1]).unwrap();
        assert!(csv.contains("TC002,Tiempo de respuesta"));
    }

    #[tokio::test]
    async fn test_zip_bundle_and_kind_filter() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_docx(dir.path());
        let mut args = args(file, dir.path().to_path_buf());
        args.zip = true;
        args.kinds = Some("functional".to_string());
        args.name = Some("matriz".to_string());

        let (result, files) = run_matrix(args, &generator(MockProvider::new(RESPONSE)), &Config::default())
            .await
            .unwrap();

        assert_eq!(result.counts.total, 1);
        assert_eq!(result.counts.non_functional, 0);
        assert_eq!(files, vec![dir.path().join("matriz.zip")]);
    }

    #[tokio::test]
    async fn test_unsupported_document_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "texto").unwrap();
        let provider = MockProvider::new(RESPONSE);

        let result = run_matrix(args(file, dir.path().to_path_buf()), &generator(provider.clone()), &Config::default()).await;

        assert!(matches!(result, Err(CliError::Reader(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_kinds_and_formats() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_docx(dir.path());

        let mut bad_kinds = args(file.clone(), dir.path().to_path_buf());
        bad_kinds.kinds = Some("exploratory".to_string());
        let result = run_matrix(bad_kinds, &generator(MockProvider::new(RESPONSE)), &Config::default()).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));

        let mut bad_formats = args(file, dir.path().to_path_buf());
        bad_formats.formats = Some("pdf".to_string());
        let result = run_matrix(bad_formats, &generator(MockProvider::new(RESPONSE)), &Config::default()).await;
        assert!(matches!(result, Err(CliError::Writer(_))));
    }
}
