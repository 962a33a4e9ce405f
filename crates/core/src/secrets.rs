//! Signing secret generation.

use rand::Rng;

/// Length of a generated signing secret (alphanumeric characters).
pub const GENERATED_SECRET_LENGTH: usize = 48;

/// Generate a random alphanumeric signing secret.
pub fn generate_secret() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(GENERATED_SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// Use the caller's secret when it has content, otherwise generate one.
pub fn secret_or_generate(secret: Option<&str>) -> String {
    match secret.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => generate_secret(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_is_long_enough() {
        let secret = generate_secret();
        assert!(secret.len() >= 32);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(generate_secret(), generate_secret());
    }

    #[test]
    fn supplied_secret_is_kept() {
        assert_eq!(secret_or_generate(Some("whsec_abc")), "whsec_abc");
    }

    #[test]
    fn blank_secret_is_replaced() {
        assert_eq!(secret_or_generate(Some("   ")).len(), GENERATED_SECRET_LENGTH);
        assert_eq!(secret_or_generate(None).len(), GENERATED_SECRET_LENGTH);
    }
}
