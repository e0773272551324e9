use crate::models::{Catalog, CatalogProduct};

/// Minimum token length considered by the token-overlap step
const MIN_TOKEN_LEN: usize = 3;

/// Canonical term and its synonyms, for short generic queries
const ALIASES: &[(&str, &[&str])] = &[
    ("cola", &["cola", "kola", "pepsi", "coca"]),
    ("ayran", &["ayran", "yoğurt içeceği"]),
    ("su", &["su", "water", "maden suyu", "soda"]),
    ("çay", &["çay", "tea", "chai"]),
    ("kahve", &["kahve", "coffee", "espresso", "latte"]),
    ("tatlı", &["tatlı", "dessert", "baklava", "künefe", "sütlaç"]),
    ("salata", &["salata", "salad", "çoban"]),
    ("patates", &["patates", "fries", "cips"]),
    ("ekmek", &["ekmek", "bread", "lavaş"]),
];

/// Maps a free-text product name onto a concrete catalog entry
///
/// The cascade stops at the first step that finds anything; within a step the
/// earliest product in catalog order wins.
pub fn resolve<'a>(name: &str, catalog: &'a Catalog) -> Option<&'a CatalogProduct> {
    let query = normalize(name);
    if query.is_empty() {
        return None;
    }

    exact_match(&query, catalog)
        .or_else(|| substring_match(&query, catalog))
        .or_else(|| token_match(&query, catalog))
        .or_else(|| alias_match(&query, catalog))
}

fn exact_match<'a>(query: &str, catalog: &'a Catalog) -> Option<&'a CatalogProduct> {
    catalog
        .products()
        .iter()
        .find(|p| normalize(&p.name) == query)
}

fn substring_match<'a>(query: &str, catalog: &'a Catalog) -> Option<&'a CatalogProduct> {
    catalog.products().iter().find(|p| {
        let name = normalize(&p.name);
        !name.is_empty() && (name.contains(query) || query.contains(name.as_str()))
    })
}

fn token_match<'a>(query: &str, catalog: &'a Catalog) -> Option<&'a CatalogProduct> {
    let query_tokens = tokens(query);
    if query_tokens.is_empty() {
        return None;
    }

    catalog.products().iter().find(|p| {
        let name = normalize(&p.name);
        let name_tokens = tokens(&name);
        query_tokens.iter().any(|q| {
            name_tokens
                .iter()
                .any(|n| n.contains(q.as_str()) || q.contains(n.as_str()))
        })
    })
}

fn alias_match<'a>(query: &str, catalog: &'a Catalog) -> Option<&'a CatalogProduct> {
    if query.split_whitespace().count() != 1 {
        return None;
    }

    let (canonical, synonyms) = ALIASES
        .iter()
        .find(|(canonical, synonyms)| *canonical == query || synonyms.contains(&query))?;

    catalog.products().iter().find(|p| {
        let name = normalize(&p.name);
        let name_tokens: Vec<&str> = name.split_whitespace().collect();

        std::iter::once(canonical).chain(synonyms.iter()).any(|term| {
            // "su" would otherwise match inside unrelated words
            if term.chars().count() < MIN_TOKEN_LEN {
                name_tokens.contains(term)
            } else {
                name.contains(*term)
            }
        })
    })
}

/// Trimmed lowercase form used on both sides of every comparison
///
/// Lowercasing "İ" yields "i" plus a combining dot (U+0307); the dot is
/// dropped so "İskender" and "iskender" compare equal.
fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace('\u{307}', "")
}

/// Whitespace tokens of at least `MIN_TOKEN_LEN` characters
fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}
