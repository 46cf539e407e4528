//! Weighted CPU/RAM cost allocation.
//!
//! AWS publishes one hourly price per instance type. We split it into a
//! per-core CPU price and a per-GiB RAM price using a fixed ratio per
//! instance family.

use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::{PricingError, PricingResult};
use crate::models::InstanceAttributes;

/// Instance family as reported by the `instanceFamily` product attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
pub enum InstanceFamily {
    #[default]
    #[strum(serialize = "General purpose")]
    GeneralPurpose,
    #[strum(serialize = "Compute optimized")]
    ComputeOptimized,
    #[strum(serialize = "Memory optimized")]
    MemoryOptimized,
    #[strum(serialize = "Storage optimized")]
    StorageOptimized,
}

impl InstanceFamily {
    /// Unknown or absent families fall back to general purpose
    pub fn from_attribute(family: Option<&str>) -> Self {
        family
            .and_then(|family| family.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Share of the instance price attributed to CPU
    pub fn cpu_ratio(self) -> f64 {
        match self {
            InstanceFamily::GeneralPurpose => 0.65,
            InstanceFamily::ComputeOptimized => 0.88,
            InstanceFamily::MemoryOptimized => 0.48,
            InstanceFamily::StorageOptimized => 0.48,
        }
    }

    /// Share of the instance price attributed to RAM
    pub fn ram_ratio(self) -> f64 {
        match self {
            InstanceFamily::GeneralPurpose => 0.35,
            InstanceFamily::ComputeOptimized => 0.12,
            InstanceFamily::MemoryOptimized => 0.52,
            InstanceFamily::StorageOptimized => 0.52,
        }
    }
}

/// Result of splitting an instance price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Allocation {
    pub cpu_usd_per_core_hour: f64,
    pub ram_usd_per_gib_hour: f64,
    pub vcpus: f64,
    pub memory_gib: f64,
}

impl Allocation {
    pub fn cpu_usd_per_hour(&self) -> f64 {
        self.cpu_usd_per_core_hour * self.vcpus
    }

    pub fn ram_usd_per_hour(&self) -> f64 {
        self.ram_usd_per_gib_hour * self.memory_gib
    }
}

/// Split `price` (USD/hour for the whole instance) into CPU and RAM components
pub fn allocate(price: f64, attributes: &InstanceAttributes) -> PricingResult<Allocation> {
    let vcpus = parse_vcpu(attributes.vcpu.as_deref())?;
    let memory_gib = parse_memory_gib(attributes.memory.as_deref())?;
    let family = InstanceFamily::from_attribute(attributes.family.as_deref());

    Ok(Allocation {
        cpu_usd_per_core_hour: price * family.cpu_ratio() / vcpus,
        ram_usd_per_gib_hour: price * family.ram_ratio() / memory_gib,
        vcpus,
        memory_gib,
    })
}

fn parse_vcpu(value: Option<&str>) -> PricingResult<f64> {
    let raw = value.ok_or_else(|| PricingError::CannotParseAttributes("vcpu is missing".into()))?;
    positive(raw.trim(), "vcpu")
}

/// `"16 GiB"` -> 16.0; thousands separators are tolerated (`"1,024 GiB"`)
fn parse_memory_gib(value: Option<&str>) -> PricingResult<f64> {
    let raw =
        value.ok_or_else(|| PricingError::CannotParseAttributes("memory is missing".into()))?;
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix("GiB").unwrap_or(trimmed).trim().replace(',', "");
    positive(&number, "memory")
}

fn positive(raw: &str, field: &str) -> PricingResult<f64> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(PricingError::CannotParseAttributes(format!(
            "{field} is not a positive number: {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(vcpu: &str, memory: &str, family: Option<&str>) -> InstanceAttributes {
        InstanceAttributes {
            instance_type: "test.large".into(),
            vcpu: Some(vcpu.into()),
            memory: Some(memory.into()),
            family: family.map(str::to_string),
            ..Default::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_published_ratios() {
        let families = [
            (InstanceFamily::GeneralPurpose, 0.65, 0.35),
            (InstanceFamily::ComputeOptimized, 0.88, 0.12),
            (InstanceFamily::MemoryOptimized, 0.48, 0.52),
            (InstanceFamily::StorageOptimized, 0.48, 0.52),
        ];
        for (family, cpu, ram) in families {
            assert_eq!(family.cpu_ratio(), cpu);
            assert_eq!(family.ram_ratio(), ram);
        }
    }

    #[test]
    fn test_compute_optimized_split() {
        let attrs = attributes("8", "16 GiB", Some("Compute optimized"));
        let allocation = allocate(0.468, &attrs).unwrap();

        assert!(close(allocation.cpu_usd_per_core_hour, 0.05148));
        assert!(close(allocation.ram_usd_per_gib_hour, 0.00351));
        assert!(close(
            allocation.cpu_usd_per_hour() + allocation.ram_usd_per_hour(),
            0.468
        ));
    }

    #[test]
    fn test_unknown_family_defaults_to_general_purpose() {
        let unknown = allocate(0.192, &attributes("4", "16 GiB", Some("GPU instance"))).unwrap();
        let absent = allocate(0.192, &attributes("4", "16 GiB", None)).unwrap();
        let general = allocate(0.192, &attributes("4", "16 GiB", Some("General purpose"))).unwrap();

        assert_eq!(unknown, general);
        assert_eq!(absent, general);
        assert!(close(general.cpu_usd_per_hour(), 0.192 * 0.65));
    }

    #[test]
    fn test_conservation_across_shapes() {
        let shapes = [
            ("1", "0.5 GiB", Some("General purpose"), 0.0052),
            ("2", "16 GiB", Some("Memory optimized"), 0.126),
            ("96", "768 GiB", Some("Storage optimized"), 31.2),
            ("448", "12,288 GiB", Some("Memory optimized"), 109.2),
            ("4", "8 GiB", Some("Compute optimized"), 0.17),
        ];
        for (vcpu, memory, family, price) in shapes {
            let allocation = allocate(price, &attributes(vcpu, memory, family)).unwrap();
            let total = allocation.cpu_usd_per_hour() + allocation.ram_usd_per_hour();
            assert!(close(total, price), "{vcpu} vcpu / {memory}: {total} != {price}");
        }
    }

    #[test]
    fn test_missing_or_invalid_attributes_fail() {
        let mut attrs = attributes("2", "8 GiB", None);
        attrs.vcpu = None;
        assert!(matches!(
            allocate(0.1, &attrs),
            Err(PricingError::CannotParseAttributes(_))
        ));

        let attrs = attributes("2", "NA", None);
        assert!(matches!(
            allocate(0.1, &attrs),
            Err(PricingError::CannotParseAttributes(_))
        ));

        let attrs = attributes("0", "8 GiB", None);
        assert!(allocate(0.1, &attrs).is_err());
    }
}
