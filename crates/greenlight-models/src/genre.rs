//! Genre canonicalization.
//!
//! Genre strings arrive from the LLM with cosmetic spelling variants
//! ("Sci-Fi", "science fiction", "SciFi"). The same canonicalization runs at
//! normalization time and at filter-match time, so filter equality is
//! insensitive to those variants.

/// Canonicalize a genre or theme label.
///
/// Lower-cases, collapses separators, and folds known spelling variants to
/// one canonical form. Unknown genres pass through in collapsed form rather
/// than being dropped.
pub fn canonical_genre(raw: &str) -> String {
    let collapsed = collapse(raw);

    match collapsed.as_str() {
        "scifi" | "sci fi" | "science fiction" | "sf" => "sci-fi".to_string(),
        "romcom" | "rom com" | "romantic comedy" => "romantic-comedy".to_string(),
        "dramedy" | "comedy drama" | "comedy-drama" => "dramedy".to_string(),
        "neo noir" | "neonoir" => "neo-noir".to_string(),
        "coming of age" => "coming-of-age".to_string(),
        "psych thriller" | "psychological thriller" => "psychological-thriller".to_string(),
        "biopic" | "biographical" | "biography" => "biopic".to_string(),
        "doc" | "documentary" => "documentary".to_string(),
        other => other.replace(' ', "-"),
    }
}

/// True when two genre labels are the same after canonicalization.
pub fn genres_match(a: &str, b: &str) -> bool {
    canonical_genre(a) == canonical_genre(b)
}

/// Lower-case and collapse `-`/`_`/whitespace runs into single spaces.
fn collapse(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        } else {
            pending_space = true;
        }
    }

    out
}
