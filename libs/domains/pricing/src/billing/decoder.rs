use tracing::warn;

use super::codes::{is_region_code, split_region_prefix};

/// Keys for request tiers billed without a region prefix
const UNPREFIXED_REQUEST_KEYS: &[&str] = &["Requests-Tier1", "Requests-Tier2"];

/// Decode a cost-report usage key into `(region, component)`.
///
/// Keys look like `<BillingRegionCode>-<Component>[-<Tier>]`. Either part
/// comes back empty when it cannot be attributed; callers drop those lines.
///
/// ```
/// use domain_pricing::billing::decode_usage_key;
///
/// assert_eq!(
///     decode_usage_key("USE2-Requests-Tier1"),
///     ("us-east-2".to_string(), "Requests-Tier1".to_string())
/// );
/// ```
pub fn decode_usage_key(key: &str) -> (String, String) {
    if UNPREFIXED_REQUEST_KEYS.contains(&key) {
        return (String::new(), String::new());
    }

    let (region, rest) = match split_region_prefix(key) {
        Some((region, rest)) => (region, rest),
        None => {
            warn!(key, "Unknown billing region code in usage key");
            match key.split_once('-') {
                Some((_, rest)) => ("", rest),
                None => ("", ""),
            }
        }
    };

    (region.to_string(), component(rest))
}

fn component(rest: &str) -> String {
    let mut tokens = rest.split('-');
    let Some(first) = tokens.next().filter(|token| !token.is_empty()) else {
        return String::new();
    };

    // Inter-region lines (`USE1-EUC1-AWS-Out-Bytes`) have no single component
    if is_region_code(first) {
        return String::new();
    }

    if first == "Requests" {
        if let Some(tier) = tokens.next().filter(|tier| tier.starts_with("Tier")) {
            return format!("{first}-{tier}");
        }
    }

    first.to_string()
}
