//! Service naming
//!
//! Names follow `{context}_{domain}_{type}`, or
//! `{context}_{domain}_{qualifier}_{type}` when a qualifier is needed to keep
//! the name unique inside a project. The shorter form always wins when both
//! are free.

mod grammar;

pub use grammar::{diagnose_segment, is_valid_segment, Segment, SegmentViolation, ViolationReason};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Default soft limit for the joined name length.
pub const DEFAULT_SOFT_LENGTH_LIMIT: usize = 40;

/// Highest generated qualifier tried (`v2` ..= `v99`).
const MAX_GENERATED_QUALIFIER: u32 = 99;

/// Segments nobody should use for a context, domain or qualifier.
pub const DEFAULT_RESERVED: &[&str] = &[
    "service", "svc", "template", "shared", "common", "test", "tmp", "misc", "new", "old",
];

/// Kind of service a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Api,
    Bot,
    Worker,
    DataApi,
}

impl ServiceType {
    pub fn all() -> &'static [ServiceType] {
        &[
            ServiceType::Api,
            ServiceType::Bot,
            ServiceType::Worker,
            ServiceType::DataApi,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Api => "api",
            ServiceType::Bot => "bot",
            ServiceType::Worker => "worker",
            ServiceType::DataApi => "data_api",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

/// A validated service identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ServiceName {
    pub context: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    pub service_type: ServiceType,
}

impl ServiceName {
    pub fn segment_count(&self) -> usize {
        if self.qualifier.is_some() {
            4
        } else {
            3
        }
    }

    fn joined(context: &str, domain: &str, qualifier: Option<&str>, ty: ServiceType) -> String {
        match qualifier {
            Some(q) => format!("{}_{}_{}_{}", context, domain, q, ty),
            None => format!("{}_{}_{}", context, domain, ty),
        }
    }
}

impl std::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&Self::joined(
            &self.context,
            &self.domain,
            self.qualifier.as_deref(),
            self.service_type,
        ))
    }
}

/// Style notes that do not block a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NamingWarning {
    LongName { length: usize, limit: usize },
    /// A qualifier was supplied but the three-part name was free.
    QualifierUnused { qualifier: String },
    /// The three-part name was taken and no qualifier was supplied.
    GeneratedQualifier { qualifier: String },
}

impl std::fmt::Display for NamingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamingWarning::LongName { length, limit } => {
                write!(f, "name is {} characters (soft limit {})", length, limit)
            }
            NamingWarning::QualifierUnused { qualifier } => write!(
                f,
                "qualifier '{}' dropped: the three-part name is unambiguous",
                qualifier
            ),
            NamingWarning::GeneratedQualifier { qualifier } => write!(
                f,
                "three-part name taken; generated qualifier '{}'",
                qualifier
            ),
        }
    }
}

/// A name that passed validation and the collision check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub name: ServiceName,
    pub full_name: String,
    pub warnings: Vec<NamingWarning>,
}

/// Why a name could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NamingError {
    #[error("invalid name segments: {}", format_violations(.violations))]
    InvalidSegments { violations: Vec<SegmentViolation> },

    #[error("'{name}' collides with an existing service name")]
    Collision {
        name: String,
        qualifier: Option<String>,
    },

    #[error("no free qualifier found for '{base}' (tried v2..v{max})", max = MAX_GENERATED_QUALIFIER)]
    QualifiersExhausted { base: String },
}

fn format_violations(violations: &[SegmentViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Names already taken in the project namespace, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    taken: HashSet<String>,
}

impl Namespace {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            taken: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(&name.to_lowercase())
    }

    /// Record a resolved name so later requests see it.
    pub fn insert(&mut self, name: &str) {
        self.taken.insert(name.to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

/// One naming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRequest {
    pub context: String,
    pub domain: String,
    pub service_type: String,
    pub qualifier: Option<String>,
}

impl NameRequest {
    pub fn new(context: &str, domain: &str, service_type: &str, qualifier: Option<&str>) -> Self {
        Self {
            context: context.to_string(),
            domain: domain.to_string(),
            service_type: service_type.to_string(),
            qualifier: qualifier.map(str::to_string),
        }
    }
}

impl FromStr for NameRequest {
    type Err = String;

    /// `context:domain:type[:qualifier]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [c, d, t] => Ok(Self::new(c, d, t, None)),
            [c, d, t, q] => Ok(Self::new(c, d, t, Some(q))),
            _ => Err(format!(
                "'{}' is not context:domain:type[:qualifier]",
                s
            )),
        }
    }
}

/// Tunable naming rules.
#[derive(Debug, Clone)]
pub struct NamingRules {
    pub soft_length_limit: usize,
    pub reserved: HashSet<String>,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            soft_length_limit: DEFAULT_SOFT_LENGTH_LIMIT,
            reserved: DEFAULT_RESERVED.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NamingRules {
    /// Default rules plus extra reserved words.
    pub fn with_reserved<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn with_soft_length_limit(mut self, limit: usize) -> Self {
        self.soft_length_limit = limit;
        self
    }

    /// Validate a request and find a free name for it.
    pub fn resolve(
        &self,
        request: &NameRequest,
        existing: &Namespace,
    ) -> Result<Resolution, NamingError> {
        let mut violations = Vec::new();
        let mut check = |segment: grammar::Segment, value: &str| {
            if let Some(v) = grammar::diagnose_segment(segment, value, &self.reserved) {
                violations.push(v);
            }
        };
        check(grammar::Segment::Context, &request.context);
        check(grammar::Segment::Domain, &request.domain);
        if let Some(q) = &request.qualifier {
            check(grammar::Segment::Qualifier, q);
        }

        let service_type = ServiceType::from_str(&request.service_type);
        if service_type.is_err() {
            violations.push(SegmentViolation {
                segment: grammar::Segment::Type,
                value: request.service_type.clone(),
                reason: ViolationReason::UnknownType,
            });
        }

        let service_type = match service_type {
            Ok(t) if violations.is_empty() => t,
            _ => return Err(NamingError::InvalidSegments { violations }),
        };

        let context = request.context.as_str();
        let domain = request.domain.as_str();
        let mut warnings = Vec::new();

        let short = ServiceName::joined(context, domain, None, service_type);
        let qualifier = if !existing.contains(&short) {
            if let Some(q) = &request.qualifier {
                warnings.push(NamingWarning::QualifierUnused {
                    qualifier: q.clone(),
                });
            }
            None
        } else if let Some(q) = &request.qualifier {
            let long = ServiceName::joined(context, domain, Some(q.as_str()), service_type);
            if existing.contains(&long) {
                return Err(NamingError::Collision {
                    name: long,
                    qualifier: Some(q.clone()),
                });
            }
            Some(q.clone())
        } else {
            let generated = (2..=MAX_GENERATED_QUALIFIER)
                .map(|n| format!("v{}", n))
                .find(|q| {
                    !existing.contains(&ServiceName::joined(
                        context,
                        domain,
                        Some(q.as_str()),
                        service_type,
                    ))
                })
                .ok_or(NamingError::QualifiersExhausted {
                    base: short.clone(),
                })?;
            debug!("'{}' is taken, generated qualifier '{}'", short, generated);
            warnings.push(NamingWarning::GeneratedQualifier {
                qualifier: generated.clone(),
            });
            Some(generated)
        };

        let name = ServiceName {
            context: context.to_string(),
            domain: domain.to_string(),
            qualifier,
            service_type,
        };
        let full_name = name.to_string();
        if full_name.len() > self.soft_length_limit {
            warnings.push(NamingWarning::LongName {
                length: full_name.len(),
                limit: self.soft_length_limit,
            });
        }

        Ok(Resolution {
            name,
            full_name,
            warnings,
        })
    }

    /// Resolve several requests in order, each one reserving its name for
    /// the ones that follow.
    pub fn resolve_all(
        &self,
        requests: &[NameRequest],
        existing: &Namespace,
    ) -> Vec<Result<Resolution, NamingError>> {
        let mut namespace = existing.clone();
        requests
            .iter()
            .map(|req| {
                let result = self.resolve(req, &namespace);
                if let Ok(res) = &result {
                    namespace.insert(&res.full_name);
                }
                result
            })
            .collect()
    }
}

/// Resolve with default rules.
pub fn resolve(
    context: &str,
    domain: &str,
    service_type: &str,
    qualifier: Option<&str>,
    existing_names: &HashSet<String>,
) -> Result<Resolution, NamingError> {
    NamingRules::default().resolve(
        &NameRequest::new(context, domain, service_type, qualifier),
        &Namespace::new(existing_names),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_three_part_name() {
        let res = resolve("healthcare", "patient", "api", None, &HashSet::new()).unwrap();
        assert_eq!(res.full_name, "healthcare_patient_api");
        assert_eq!(res.name.segment_count(), 3);
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_data_api_type() {
        let res = resolve("analytics", "events", "data_api", None, &HashSet::new()).unwrap();
        assert_eq!(res.full_name, "analytics_events_data_api");
        assert_eq!(res.name.service_type, ServiceType::DataApi);
    }

    #[test]
    fn test_grammar_rejections() {
        for bad in ["Finance", "fiNance", "1finance", "fin__ance", "_fin", "fin_", "fin-ance", ""] {
            let err = resolve(bad, "user", "api", None, &HashSet::new()).unwrap_err();
            assert!(
                matches!(err, NamingError::InvalidSegments { .. }),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_all_invalid_segments_reported() {
        let err = resolve("Finance", "2fa", "service", Some("x__y"), &HashSet::new()).unwrap_err();
        let NamingError::InvalidSegments { violations } = err else {
            panic!("expected segment errors");
        };
        let reasons: Vec<_> = violations.iter().map(|v| v.reason).collect();
        assert_eq!(
            reasons,
            vec![
                ViolationReason::Uppercase,
                ViolationReason::LeadingDigit,
                ViolationReason::ConsecutiveUnderscores,
                ViolationReason::UnknownType,
            ]
        );
    }

    #[test]
    fn test_reserved_words() {
        let err = resolve("template", "user", "api", None, &HashSet::new()).unwrap_err();
        let NamingError::InvalidSegments { violations } = err else {
            panic!("expected segment errors");
        };
        assert_eq!(violations[0].reason, ViolationReason::Reserved);

        let rules = NamingRules::default().with_reserved(["legacy"]);
        assert!(rules
            .resolve(
                &NameRequest::new("legacy", "user", "api", None),
                &Namespace::default()
            )
            .is_err());
    }

    #[test]
    fn test_collision_generates_qualifier() {
        let existing = taken(&["finance_user_api"]);
        let res = resolve("finance", "user", "api", None, &existing).unwrap();
        assert_eq!(res.full_name, "finance_user_v2_api");
        assert_eq!(res.name.segment_count(), 4);
        assert!(matches!(
            res.warnings[0],
            NamingWarning::GeneratedQualifier { .. }
        ));

        let existing = taken(&["finance_user_api", "finance_user_v2_api"]);
        let res = resolve("finance", "user", "api", None, &existing).unwrap();
        assert_eq!(res.full_name, "finance_user_v3_api");
    }

    #[test]
    fn test_collision_with_supplied_qualifier() {
        let existing = taken(&["finance_user_api"]);
        let res = resolve("finance", "user", "api", Some("billing"), &existing).unwrap();
        assert_eq!(res.full_name, "finance_user_billing_api");

        let existing = taken(&["finance_user_api", "finance_user_billing_api"]);
        let err = resolve("finance", "user", "api", Some("billing"), &existing).unwrap_err();
        assert!(matches!(err, NamingError::Collision { .. }));
    }

    #[test]
    fn test_collision_is_case_insensitive() {
        let existing = taken(&["Finance_User_API"]);
        let res = resolve("finance", "user", "api", None, &existing).unwrap();
        assert_eq!(res.name.segment_count(), 4);
    }

    #[test]
    fn test_prefers_three_part_when_free() {
        let res = resolve("finance", "user", "api", Some("billing"), &HashSet::new()).unwrap();
        assert_eq!(res.full_name, "finance_user_api");
        assert_eq!(
            res.warnings,
            vec![NamingWarning::QualifierUnused {
                qualifier: "billing".to_string()
            }]
        );
    }

    #[test]
    fn test_long_name_is_warning_only() {
        let res = resolve(
            "international_settlements",
            "counterparty_exposure",
            "worker",
            None,
            &HashSet::new(),
        )
        .unwrap();
        assert!(res
            .warnings
            .iter()
            .any(|w| matches!(w, NamingWarning::LongName { .. })));

        let relaxed = NamingRules::default().with_soft_length_limit(80);
        let res = relaxed
            .resolve(
                &NameRequest::new(
                    "international_settlements",
                    "counterparty_exposure",
                    "worker",
                    None,
                ),
                &Namespace::default(),
            )
            .unwrap();
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_resolve_all_sees_earlier_names() {
        let requests = vec![
            NameRequest::new("shop", "orders", "api", None),
            NameRequest::new("shop", "orders", "api", None),
            NameRequest::new("shop", "orders", "worker", None),
        ];
        let results = NamingRules::default().resolve_all(&requests, &Namespace::default());
        let names: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().full_name.as_str())
            .collect();
        assert_eq!(names, vec!["shop_orders_api", "shop_orders_v2_api", "shop_orders_worker"]);
    }

    #[test]
    fn test_request_parsing() {
        let req: NameRequest = "finance:user:api:billing".parse().unwrap();
        assert_eq!(req.qualifier.as_deref(), Some("billing"));
        assert!("finance:user".parse::<NameRequest>().is_err());
    }
}
