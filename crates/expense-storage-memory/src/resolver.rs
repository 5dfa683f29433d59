use expense_core::OrgResolver;
use expense_domain::OrgRef;

/// Fixed table of known organizations.
#[derive(Debug, Clone, Default)]
pub struct StaticOrgResolver {
    orgs: Vec<OrgRef>,
}

impl StaticOrgResolver {
    pub fn new(orgs: Vec<OrgRef>) -> Self {
        Self { orgs }
    }

    pub fn push(&mut self, org: OrgRef) {
        self.orgs.push(org);
    }
}

impl OrgResolver for StaticOrgResolver {
    /// Case-insensitive name match; a blank unit code matches any unit.
    fn resolve(&self, name: &str, unit_code: &str) -> Option<OrgRef> {
        let name = name.trim();
        let unit_code = unit_code.trim();
        if name.is_empty() {
            return None;
        }
        self.orgs
            .iter()
            .find(|org| {
                org.name.eq_ignore_ascii_case(name)
                    && (unit_code.is_empty() || org.unit_code == unit_code)
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_name_and_optional_unit() {
        let resolver = StaticOrgResolver::new(vec![
            OrgRef::new("CPA/M-1", "160100"),
            OrgRef::new("CPA/M-2", "160200"),
        ]);
        assert_eq!(
            resolver.resolve("cpa/m-2", ""),
            Some(OrgRef::new("CPA/M-2", "160200"))
        );
        assert!(resolver.resolve("CPA/M-1", "999").is_none());
        assert!(resolver.resolve("  ", "160100").is_none());
    }
}
