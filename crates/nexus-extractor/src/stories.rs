//! Post-processing of story responses

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// "HISTORIA #3" or "HISTORIA NO FUNCIONAL #3", after optional decoration
static STORY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^([^\w\n]*)(HISTORIA(?:\s+NO\s+FUNCIONAL)?)\s*#\s*\d+")
        .expect("valid story header pattern")
});

/// "3. Name - description" or "3) Name", optionally in bold
static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s*]*\d+[.)]\**\s+(\S.*)$").expect("valid numbered line pattern")
});

/// Split a response into story blocks.
///
/// Text before the first header is dropped. A response without any header
/// is a single story.
pub fn split_stories(response: &str) -> Vec<String> {
    let text = strip_fences(response);
    let starts: Vec<usize> = STORY_HEADER.find_iter(&text).map(|m| m.start()).collect();

    if starts.is_empty() {
        return clean_block(&text).into_iter().collect();
    }

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            clean_block(&text[start..end])
        })
        .collect()
}

/// Rewrite each block's header number so numbering runs from `first`
pub fn renumber(blocks: Vec<String>, first: usize) -> Vec<String> {
    blocks
        .into_iter()
        .enumerate()
        .map(|(i, block)| {
            STORY_HEADER
                .replacen(&block, 1, |caps: &Captures<'_>| {
                    format!("{}{} #{}", &caps[1], &caps[2], first + i)
                })
                .into_owned()
        })
        .collect()
}

/// Numbered lines of an analysis response, without their numbers
pub fn parse_functionalities(response: &str) -> Vec<String> {
    response
        .lines()
        .filter_map(|line| NUMBERED_LINE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

fn strip_fences(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.starts_with("```") || trimmed.starts_with("~~~"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_decoration(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_whitespace() || matches!(c, '═' | '╔' | '╗' | '╚' | '╝' | '─' | '=' | '-' | '_' | '*'))
}

/// Trim blank and box-drawing lines from both edges of a block
fn clean_block(block: &str) -> Option<String> {
    let lines: Vec<&str> = block.lines().collect();
    let first = lines.iter().position(|l| !is_decoration(l))?;
    let last = lines.iter().rposition(|l| !is_decoration(l))?;
    Some(lines[first..=last].join("\n").trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "Aquí tienes las historias:\n\
```\n\
╔══════════\n\
HISTORIA #1: Login\n\
══════════\n\
COMO: Usuario\n\
QUIERO: entrar\n\
\n\
══════════\n\
```\n\
```\n\
╔══════════\n\
HISTORIA #1: Logout\n\
══════════\n\
COMO: Usuario\n\
QUIERO: salir\n\
══════════\n\
```";

    #[test]
    fn test_split_drops_preamble_and_decoration() {
        let stories = split_stories(RESPONSE);
        assert_eq!(stories.len(), 2);
        assert!(stories[0].starts_with("HISTORIA #1: Login"));
        assert!(stories[0].ends_with("QUIERO: entrar"));
        assert!(stories[1].starts_with("HISTORIA #1: Logout"));
        assert!(!stories.iter().any(|s| s.contains("```")));
    }

    #[test]
    fn test_renumber() {
        let stories = renumber(split_stories(RESPONSE), 4);
        assert!(stories[0].starts_with("HISTORIA #4: Login"));
        assert!(stories[1].starts_with("HISTORIA #5: Logout"));
    }

    #[test]
    fn test_non_functional_and_decorated_headers() {
        let response = "**HISTORIA NO FUNCIONAL # 7: Rendimiento**\nNECESITO: respuesta < 2s\n\n### historia #2: Seguridad\nNECESITO: cifrado";
        let stories = renumber(split_stories(response), 1);
        assert_eq!(stories.len(), 2);
        assert!(stories[0].starts_with("**HISTORIA NO FUNCIONAL #1: Rendimiento**"));
        assert!(stories[1].starts_with("### historia #2: Seguridad"));
    }

    #[test]
    fn test_text_without_header_is_one_story() {
        let stories = split_stories("Como usuario quiero exportar reportes.");
        assert_eq!(stories, vec!["Como usuario quiero exportar reportes."]);
        assert!(split_stories("  \n═══\n").is_empty());
    }

    #[test]
    fn test_parse_functionalities() {
        let response = "Lista de Funcionalidades Identificadas:\n\
                        1. Registro - alta de cuenta\n\
                        2) Login\n\
                        **3.** Recuperar contraseña\n\
                        Nota: 4 items\n\
                        TOTAL FUNCIONALIDADES IDENTIFICADAS: 3";
        assert_eq!(
            parse_functionalities(response),
            vec!["Registro - alta de cuenta", "Login", "Recuperar contraseña"]
        );
    }
}
