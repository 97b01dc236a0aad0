//! Turns whatever the user pasted (a product URL, a short link, a bare ASIN)
//! into a [`ProductRef`].

use std::sync::LazyLock;

use regex::Regex;

use revscan_common::{ProductRef, RevscanError, PRIMARY_DOMAIN};

static RE_DOMAIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"amazon\.([a-z.]+)/").unwrap());
static RE_ASIN_EXACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]{10}$").unwrap());
static RE_ASIN_ANYWHERE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z0-9]{10}").unwrap());

/// Parse a raw identifier into a domain + product id pair.
///
/// Fails with [`RevscanError::InvalidIdentifier`] when no 10-character
/// uppercase alphanumeric run exists anywhere in the input.
pub fn normalize(raw: &str) -> Result<ProductRef, RevscanError> {
    Ok(ProductRef {
        domain: extract_domain(raw),
        id: extract_id(raw)?,
    })
}

/// `amazon.<suffix>` when the input contains `amazon.<suffix>/`, otherwise
/// the primary domain.
pub fn extract_domain(raw: &str) -> String {
    RE_DOMAIN
        .captures(raw.trim())
        .and_then(|caps| caps.get(1))
        .map(|suffix| format!("amazon.{}", suffix.as_str()))
        .unwrap_or_else(|| PRIMARY_DOMAIN.to_string())
}

/// The bare id if the whole input is one, else the first 10-character run.
pub fn extract_id(raw: &str) -> Result<String, RevscanError> {
    let trimmed = raw.trim();
    if RE_ASIN_EXACT.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    RE_ASIN_ANYWHERE
        .find(trimmed)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| RevscanError::InvalidIdentifier(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_id_uses_primary_domain() {
        for id in ["B08N5WRWNW", "0123456789", "ABCDEFGHIJ"] {
            assert_eq!(normalize(id).unwrap(), ProductRef::new(PRIMARY_DOMAIN, id));
        }
    }

    #[test]
    fn bare_id_is_trimmed() {
        assert_eq!(normalize("  B08N5WRWNW\n").unwrap().id, "B08N5WRWNW");
    }

    #[test]
    fn full_url_yields_domain_and_id() {
        let product = normalize("https://www.amazon.co.uk/Echo-Dot/dp/B08N5WRWNW/ref=sr_1_1").unwrap();
        assert_eq!(product, ProductRef::new("amazon.co.uk", "B08N5WRWNW"));
    }

    #[test]
    fn regional_urls() {
        let cases = [
            ("https://www.amazon.in/dp/B0CHX1W1XY", "amazon.in"),
            ("https://amazon.com.au/gp/product/B0CHX1W1XY?th=1", "amazon.com.au"),
            ("https://www.amazon.ca/dp/B0CHX1W1XY/", "amazon.ca"),
        ];
        for (url, domain) in cases {
            let product = normalize(url).unwrap();
            assert_eq!(product.domain, domain, "{url}");
            assert_eq!(product.id, "B0CHX1W1XY", "{url}");
        }
    }

    #[test]
    fn domain_without_trailing_slash_falls_back_to_primary() {
        assert_eq!(extract_domain("amazon.de B08N5WRWNW"), PRIMARY_DOMAIN);
    }

    #[test]
    fn short_link_without_domain_uses_primary() {
        let product = normalize("https://a.co/d/B08N5WRWNW").unwrap();
        assert_eq!(product, ProductRef::new(PRIMARY_DOMAIN, "B08N5WRWNW"));
    }

    #[test]
    fn first_run_wins_even_if_not_the_product() {
        let product = normalize("SALE2024NOW then B08N5WRWNW").unwrap();
        assert_eq!(product.id, "SALE2024NO");
    }

    #[test]
    fn lowercase_ids_are_not_recognised() {
        assert!(matches!(
            normalize("b08n5wrwnw"),
            Err(RevscanError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn input_without_id_is_rejected() {
        let err = normalize("not a real amazon link").unwrap_err();
        assert!(matches!(err, RevscanError::InvalidIdentifier(ref s) if s == "not a real amazon link"));
        assert!(err.is_client_error());
    }

    #[test]
    fn nine_characters_is_not_enough() {
        assert!(normalize("https://www.amazon.com/dp/B08N5WRWN").is_err());
    }
}
