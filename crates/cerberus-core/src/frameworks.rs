/// A framework the compliance server is known to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framework {
    pub id: &'static str,
    pub name: &'static str,
}

pub const FRAMEWORKS: &[Framework] = &[
    Framework { id: "essential8", name: "ASD Essential Eight" },
    Framework { id: "ism", name: "Australian Information Security Manual" },
    Framework { id: "soc2", name: "SOC 2" },
    Framework { id: "iso27001", name: "ISO/IEC 27001" },
    Framework { id: "iso42001", name: "ISO/IEC 42001 (AI management)" },
    Framework { id: "nist-csf", name: "NIST Cybersecurity Framework" },
    Framework { id: "nist-ai-rmf", name: "NIST AI Risk Management Framework" },
    Framework { id: "gdpr", name: "EU General Data Protection Regulation" },
    Framework { id: "hipaa", name: "HIPAA Security Rule" },
    Framework { id: "pci-dss", name: "PCI DSS" },
    Framework { id: "eu-ai-act", name: "EU AI Act" },
    Framework { id: "apra-cps234", name: "APRA CPS 234" },
    Framework { id: "privacy-act", name: "Australian Privacy Act" },
];

pub fn lookup(id: &str) -> Option<&'static Framework> {
    FRAMEWORKS.iter().find(|f| f.id == id)
}

/// A framework id that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFramework {
    pub id: String,
    pub suggestion: Option<&'static str>,
}

impl std::fmt::Display for UnknownFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.suggestion {
            Some(s) => write!(f, "unknown framework '{}', did you mean '{}'?", self.id, s),
            None => write!(f, "unknown framework '{}'", self.id),
        }
    }
}

/// Find ids outside the catalog, with the closest known id (edit distance
/// at most 2) as a suggestion. Unknown ids are still sent to the server.
pub fn check_frameworks(ids: &[String]) -> Vec<UnknownFramework> {
    ids.iter()
        .filter(|id| lookup(id).is_none())
        .map(|id| UnknownFramework {
            id: id.clone(),
            suggestion: closest(id),
        })
        .collect()
}

fn closest(id: &str) -> Option<&'static str> {
    let mut best_match = None;
    let mut best_distance = usize::MAX;

    for known in FRAMEWORKS {
        let dist = strsim::damerau_levenshtein(id, known.id);
        if dist < best_distance && dist <= 2 {
            best_distance = dist;
            best_match = Some(known.id);
        }
    }

    best_match
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_known_frameworks_pass() {
        assert!(check_frameworks(&ids(&["essential8", "soc2", "iso27001"])).is_empty());
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let unknown = check_frameworks(&ids(&["esential8", "soc-2"]));
        assert_eq!(unknown.len(), 2);
        assert_eq!(unknown[0].suggestion, Some("essential8"));
        assert_eq!(unknown[1].suggestion, Some("soc2"));
        assert!(unknown[0].to_string().contains("did you mean 'essential8'"));
    }

    #[test]
    fn test_distant_id_has_no_suggestion() {
        let unknown = check_frameworks(&ids(&["fedramp-high"]));
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].suggestion, None);
        assert_eq!(unknown[0].to_string(), "unknown framework 'fedramp-high'");
    }

    #[test]
    fn test_catalog_ids_are_normalized() {
        for f in FRAMEWORKS {
            assert_eq!(f.id, f.id.trim().to_lowercase());
        }
    }
}
