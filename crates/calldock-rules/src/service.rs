// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service validation against the offered-service catalogue.
//!
//! Table lookup over keyword sets. Refusals distinguish work we never do
//! from work that first needs an on-site assessment.

use serde::Serialize;

/// Why a requested service was not plainly accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefusalReason {
    /// The business does not offer this kind of work at all.
    NotOffered,
    /// Quotable only after a technician has seen the site.
    AssessmentRequired,
}

/// Outcome of validating a requested service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "kebab-case")]
pub enum ServiceDecision {
    /// Service is offered and can be quoted directly.
    Accepted {
        /// Canonical service name matched in the catalogue.
        service: String,
    },
    /// Service is refused outright.
    Refused { reason: RefusalReason },
    /// Service is offered but gated behind an on-site assessment.
    Restricted { reason: RefusalReason },
}

/// Services quoted directly over the phone (substring match, lowercase).
const ACCEPTED_SERVICES: &[&str] = &[
    "debouchage",
    "débouchage",
    "fuite",
    "chauffe-eau",
    "chauffe eau",
    "robinet",
    "wc",
    "toilette",
    "sanibroyeur",
    "ballon d'eau chaude",
    "inspection camera",
    "inspection caméra",
];

/// Services requiring an on-site assessment before any quote.
const ASSESSMENT_SERVICES: &[&str] = &[
    "renovation",
    "rénovation",
    "salle de bain",
    "remplacement canalisation",
    "canalisation enterree",
    "canalisation enterrée",
    "colonne d'immeuble",
    "gaz",
];

/// Work the business never takes on.
const REFUSED_SERVICES: &[&str] = &[
    "climatisation",
    "electricite",
    "électricité",
    "toiture",
    "piscine",
    "chauffage au fioul",
];

/// Validate a requested service against the catalogue.
///
/// Total function: any input yields a decision. Lookup order is
/// refused, then assessment-gated, then accepted; an unrecognized
/// request is refused as not offered.
pub fn validate_service(requested: &str) -> ServiceDecision {
    let lower = requested.trim().to_lowercase();

    if lower.is_empty() {
        return ServiceDecision::Refused {
            reason: RefusalReason::NotOffered,
        };
    }

    if REFUSED_SERVICES.iter().any(|s| lower.contains(s)) {
        return ServiceDecision::Refused {
            reason: RefusalReason::NotOffered,
        };
    }

    if ASSESSMENT_SERVICES.iter().any(|s| lower.contains(s)) {
        return ServiceDecision::Restricted {
            reason: RefusalReason::AssessmentRequired,
        };
    }

    if let Some(matched) = ACCEPTED_SERVICES.iter().find(|s| lower.contains(*s)) {
        return ServiceDecision::Accepted {
            service: (*matched).to_string(),
        };
    }

    ServiceDecision::Refused {
        reason: RefusalReason::NotOffered,
    }
}

/// Whether a service needs an on-site assessment before scheduling work.
pub fn needs_assessment(requested: &str) -> bool {
    matches!(
        validate_service(requested),
        ServiceDecision::Restricted { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offered_service_is_accepted() {
        let decision = validate_service("débouchage de canalisation cuisine");
        assert!(matches!(decision, ServiceDecision::Accepted { .. }));
    }

    #[test]
    fn unknown_service_is_refused_as_not_offered() {
        let decision = validate_service("ramonage de cheminée");
        assert_eq!(
            decision,
            ServiceDecision::Refused {
                reason: RefusalReason::NotOffered
            }
        );
    }

    #[test]
    fn out_of_trade_service_is_refused() {
        let decision = validate_service("installation climatisation");
        assert_eq!(
            decision,
            ServiceDecision::Refused {
                reason: RefusalReason::NotOffered
            }
        );
    }

    #[test]
    fn renovation_requires_assessment() {
        let decision = validate_service("rénovation salle de bain complète");
        assert_eq!(
            decision,
            ServiceDecision::Restricted {
                reason: RefusalReason::AssessmentRequired
            }
        );
    }

    #[test]
    fn gas_work_requires_assessment() {
        assert!(needs_assessment("fuite de gaz suspectée"));
    }

    #[test]
    fn empty_request_is_refused() {
        let decision = validate_service("   ");
        assert!(matches!(decision, ServiceDecision::Refused { .. }));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let decision = validate_service("FUITE sous évier");
        assert!(matches!(decision, ServiceDecision::Accepted { .. }));
    }

    #[test]
    fn refused_takes_precedence_over_accepted_keywords() {
        // Mentions both an accepted keyword and an out-of-trade one.
        let decision = validate_service("fuite sur circuit de climatisation");
        assert!(matches!(decision, ServiceDecision::Refused { .. }));
    }

    #[test]
    fn decision_serializes_with_tag() {
        let decision = validate_service("débouchage wc");
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], "accepted");
    }
}
