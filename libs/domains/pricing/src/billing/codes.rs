//! Billing region codes.
//!
//! Cost-report usage types are prefixed with a short billing code (`USE2`,
//! `EUC1`, ...) instead of the canonical region name. GovCloud lines may use
//! the long partition name, which itself contains a `-`.

/// Billing code -> canonical region
pub const BILLING_REGION_CODES: &[(&str, &str)] = &[
    ("USE1", "us-east-1"),
    ("USE2", "us-east-2"),
    ("USW1", "us-west-1"),
    ("USW2", "us-west-2"),
    ("CAN1", "ca-central-1"),
    ("CAW1", "ca-west-1"),
    ("SAE1", "sa-east-1"),
    ("MXC1", "mx-central-1"),
    ("EU", "eu-west-1"),
    ("EUW1", "eu-west-1"),
    ("EUW2", "eu-west-2"),
    ("EUW3", "eu-west-3"),
    ("EUC1", "eu-central-1"),
    ("EUC2", "eu-central-2"),
    ("EUN1", "eu-north-1"),
    ("EUS1", "eu-south-1"),
    ("EUS2", "eu-south-2"),
    ("AFS1", "af-south-1"),
    ("MES1", "me-south-1"),
    ("MEC1", "me-central-1"),
    ("ILC1", "il-central-1"),
    ("APE1", "ap-east-1"),
    ("APN1", "ap-northeast-1"),
    ("APN2", "ap-northeast-2"),
    ("APN3", "ap-northeast-3"),
    ("APS1", "ap-southeast-1"),
    ("APS2", "ap-southeast-2"),
    ("APS3", "ap-south-1"),
    ("APS4", "ap-southeast-3"),
    ("APS5", "ap-south-2"),
    ("APS6", "ap-southeast-4"),
    ("APS7", "ap-southeast-5"),
    ("UGW1", "us-gov-west-1"),
    ("UGE1", "us-gov-east-1"),
    ("AWS GovCloud (US-West)", "us-gov-west-1"),
    ("AWS GovCloud (US-East)", "us-gov-east-1"),
    ("CNN1", "cn-north-1"),
    ("CNW1", "cn-northwest-1"),
];

/// Canonical region for an exact billing code
pub fn region_for_code(code: &str) -> Option<&'static str> {
    BILLING_REGION_CODES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, region)| *region)
}

pub fn is_region_code(token: &str) -> bool {
    region_for_code(token).is_some()
}

/// Split `<code>-<rest>` into `(region, rest)` when `key` starts with a known code.
///
/// The longest matching code wins so the GovCloud names are not cut at their
/// inner `-`.
pub fn split_region_prefix(key: &str) -> Option<(&'static str, &str)> {
    BILLING_REGION_CODES
        .iter()
        .filter_map(|(code, region)| {
            key.strip_prefix(code)
                .and_then(|rest| rest.strip_prefix('-'))
                .map(|rest| (code.len(), *region, rest))
        })
        .max_by_key(|(len, _, _)| *len)
        .map(|(_, region, rest)| (region, rest))
}

/// Usage type without its billing-code prefix: `USE1-NatGateway-Hours` -> `NatGateway-Hours`.
///
/// us-east-1 usage types carry no prefix and are returned unchanged.
pub fn usage_component(usage_type: &str) -> &str {
    split_region_prefix(usage_type)
        .map(|(_, rest)| rest)
        .unwrap_or(usage_type)
}
