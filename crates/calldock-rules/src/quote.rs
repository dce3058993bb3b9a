// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Price band estimation in EUR cents.
//!
//! Surcharges apply in a fixed order: base band, then the zone's fixed
//! surcharge, then percentage surcharges (after-hours, urgency), then
//! rounding to the nearest euro, then clamping to the service floor.
//! Reordering would change results (a percentage over a fixed surcharge
//! is not the same as a fixed surcharge over a percentage).

use calldock_core::PriorityTier;
use serde::{Deserialize, Serialize};

/// Geographic intervention zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Zone {
    /// Paris intra-muros, no travel surcharge.
    Paris,
    /// Inner ring (92, 93, 94).
    PetiteCouronne,
    /// Outer ring (77, 78, 91, 95).
    GrandeCouronne,
}

impl Zone {
    /// Fixed travel surcharge in cents, added before any percentage.
    fn surcharge_cents(self) -> u64 {
        match self {
            Zone::Paris => 0,
            Zone::PetiteCouronne => 2_500,
            Zone::GrandeCouronne => 5_000,
        }
    }
}

/// A price band estimate, never a firm quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteEstimate {
    /// Lower bound in cents, clamped to the service floor.
    pub min_cents: u64,
    /// Upper bound in cents.
    pub max_cents: u64,
    /// Always EUR.
    pub currency: &'static str,
    /// Human-readable factors that shaped the band, in application order.
    pub factors: Vec<String>,
}

/// Base price band and floor per service family, in cents.
struct PriceBand {
    min: u64,
    max: u64,
    floor: u64,
}

/// Lookup the base band for a service request (substring match, lowercase).
fn base_band(service: &str) -> (&'static str, PriceBand) {
    let lower = service.to_lowercase();
    if lower.contains("debouchage") || lower.contains("débouchage") {
        (
            "debouchage",
            PriceBand {
                min: 12_000,
                max: 25_000,
                floor: 9_000,
            },
        )
    } else if lower.contains("chauffe-eau") || lower.contains("chauffe eau") {
        (
            "chauffe-eau",
            PriceBand {
                min: 35_000,
                max: 90_000,
                floor: 25_000,
            },
        )
    } else if lower.contains("fuite") {
        (
            "fuite",
            PriceBand {
                min: 15_000,
                max: 35_000,
                floor: 12_000,
            },
        )
    } else if lower.contains("wc") || lower.contains("toilette") || lower.contains("sanibroyeur") {
        (
            "wc",
            PriceBand {
                min: 13_000,
                max: 28_000,
                floor: 10_000,
            },
        )
    } else {
        (
            "intervention standard",
            PriceBand {
                min: 10_000,
                max: 22_000,
                floor: 8_000,
            },
        )
    }
}

/// Percentage surcharge for the urgency tier, in percent.
fn urgency_percent(tier: PriorityTier) -> u64 {
    match tier {
        PriorityTier::P1 => 50,
        PriorityTier::P2 => 20,
        PriorityTier::P3 | PriorityTier::P4 => 0,
    }
}

/// Round cents to the nearest whole euro.
fn round_to_euro(cents: u64) -> u64 {
    ((cents + 50) / 100) * 100
}

/// Estimate a price band for a service request.
///
/// Deterministic and side-effect-free. `after_hours` marks evening,
/// weekend, or holiday calls and adds a 30% surcharge.
pub fn calculate_quote(
    service: &str,
    zone: Zone,
    tier: PriorityTier,
    after_hours: bool,
) -> QuoteEstimate {
    let (family, band) = base_band(service);
    let mut factors = vec![format!("base band: {family}")];

    // Fixed zone surcharge first.
    let zone_cents = zone.surcharge_cents();
    let mut min = band.min + zone_cents;
    let mut max = band.max + zone_cents;
    if zone_cents > 0 {
        factors.push(format!("zone surcharge: +{zone_cents} cents"));
    }

    // Percentage surcharges over the zone-adjusted band.
    if after_hours {
        min = min * 130 / 100;
        max = max * 130 / 100;
        factors.push("after-hours: +30%".to_string());
    }

    let urgency = urgency_percent(tier);
    if urgency > 0 {
        min = min * (100 + urgency) / 100;
        max = max * (100 + urgency) / 100;
        factors.push(format!("urgency {tier}: +{urgency}%"));
    }

    // Round, then clamp so the floor always holds.
    min = round_to_euro(min).max(band.floor);
    max = round_to_euro(max).max(min);

    QuoteEstimate {
        min_cents: min,
        max_cents: max,
        currency: "EUR",
        factors,
    }
}
