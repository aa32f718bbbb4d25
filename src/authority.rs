// Settlement authorization policies.
//
// The ledger records whatever winning outcome it is handed. Who may hand it
// one is decided here, outside the accounting core.

use std::collections::HashSet;

pub trait SettlementAuthority: Send + Sync {
    fn may_settle(&self, caller: &str) -> bool;
}

/// Anyone may settle. Only for local development and explicit opt-in.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unrestricted;

impl SettlementAuthority for Unrestricted {
    fn may_settle(&self, _caller: &str) -> bool {
        true
    }
}

/// A fixed set of resolver identities.
#[derive(Debug, Clone, Default)]
pub struct ResolverSet {
    resolvers: HashSet<String>,
}

impl ResolverSet {
    pub fn new<I, S>(resolvers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resolvers: resolvers.into_iter().map(Into::into).collect(),
        }
    }
}

impl SettlementAuthority for ResolverSet {
    fn may_settle(&self, caller: &str) -> bool {
        self.resolvers.contains(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_set_membership() {
        let resolvers = ResolverSet::new(["ORACLE", "ADMIN"]);
        assert!(resolvers.may_settle("ORACLE"));
        assert!(!resolvers.may_settle("ALICE"));
        assert!(resolvers.may_settle("ADMIN"));
    }

    #[test]
    fn test_empty_resolver_set_allows_nobody() {
        let resolvers = ResolverSet::default();
        assert!(!resolvers.may_settle(""));
    }

    #[test]
    fn test_unrestricted_allows_anyone() {
        assert!(Unrestricted.may_settle("anyone"));
    }
}
