//! Key folding shared by the lenient parsers in this crate and the normalizer.

/// Lowercase, strip the common Spanish diacritics and collapse separators
/// so that "Casos Límite", "casos_limite" and "CASOS-LIMITE" compare equal.
pub fn fold_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.trim().chars().flat_map(char::to_lowercase) {
        let mapped = match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            '_' | '-' | '/' => ' ',
            other => other,
        };
        if mapped == ' ' && out.ends_with(' ') {
            continue;
        }
        out.push(mapped);
    }
    out
}
