//! Server selection and health bookkeeping (component C7): failover,
//! round-robin and random rotation over a chain of resolver addresses.
use rand::Rng;

use crate::error::{DNSError, DNSResult};
use crate::ip::parse_ipv4;
use crate::name::validate as validate_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStrategy {
    Failover,
    RoundRobin,
    Random,
}

impl Default for RotationStrategy {
    fn default() -> Self {
        RotationStrategy::Failover
    }
}

/// A configured resolver address plus its health bits (spec section 3
/// "Server entry"). `failed` is transient within a query cycle; `healthy` is
/// a persistent disable. A server is eligible iff `!failed && healthy`.
#[derive(Debug, Clone)]
struct ServerEntry {
    address: String,
    healthy: bool,
    failed: bool,
}

#[derive(Debug)]
pub struct ServerChain {
    servers: Vec<ServerEntry>,
    strategy: RotationStrategy,
    round_robin_counter: usize,
}

impl ServerChain {
    pub fn new(addresses: Vec<String>, strategy: RotationStrategy) -> DNSResult<Self> {
        if addresses.is_empty() {
            return Err(DNSError::config("server chain must have at least one server"));
        }
        let mut chain = ServerChain {
            servers: Vec::new(),
            strategy,
            round_robin_counter: 0,
        };
        for address in addresses {
            chain.add(&address)?;
        }
        Ok(chain)
    }

    /// Validate and append a server address, de-duplicating against the
    /// existing chain. Accepts an IPv4 dotted-quad, a syntactically valid
    /// domain name, or an IPv6 literal (passed through opaquely).
    pub fn add(&mut self, address: &str) -> DNSResult<()> {
        validate_address(address)?;
        if self.servers.iter().any(|s| s.address == address) {
            return Ok(());
        }
        self.servers.push(ServerEntry {
            address: address.to_string(),
            healthy: true,
            failed: false,
        });
        Ok(())
    }

    pub fn remove(&mut self, address: &str) {
        self.servers.retain(|s| s.address != address);
    }

    pub fn list(&self) -> Vec<String> {
        self.servers.iter().map(|s| s.address.clone()).collect()
    }

    fn eligible_indices(&self) -> Vec<usize> {
        self.servers
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.failed && s.healthy)
            .map(|(i, _)| i)
            .collect()
    }

    /// Pick the next server per the configured rotation strategy. Never
    /// fails when the chain is non-empty (spec section 8 invariant 6): if
    /// every server is currently marked failed, the per-cycle `failed` bit
    /// is cleared for all of them and the first configured server is
    /// returned, guaranteeing forward progress.
    pub fn next_server(&mut self) -> String {
        let eligible = self.eligible_indices();

        if eligible.is_empty() {
            for server in &mut self.servers {
                server.failed = false;
            }
            return self.servers[0].address.clone();
        }

        let chosen = match self.strategy {
            RotationStrategy::Failover => eligible[0],
            RotationStrategy::RoundRobin => {
                let idx = eligible[self.round_robin_counter % eligible.len()];
                self.round_robin_counter = self.round_robin_counter.wrapping_add(1);
                idx
            }
            RotationStrategy::Random => {
                let idx = rand::thread_rng().gen_range(0..eligible.len());
                eligible[idx]
            }
        };

        self.servers[chosen].address.clone()
    }

    /// Mark a server as transiently failed within this query cycle, and
    /// persistently unhealthy.
    pub fn mark_failed(&mut self, address: &str) {
        for server in &mut self.servers {
            if server.address == address {
                server.failed = true;
                server.healthy = false;
            }
        }
    }

    /// Clear the transient failure bit for every server and restore
    /// persistent health for every server.
    pub fn reset_failed(&mut self) {
        for server in &mut self.servers {
            server.failed = false;
            server.healthy = true;
        }
    }
}

fn validate_address(address: &str) -> DNSResult<()> {
    if address.is_empty() {
        return Err(DNSError::config("server address is empty"));
    }
    if address.contains(':') {
        // an IPv6 literal; passed through opaquely per spec section 4.5
        return Ok(());
    }
    if parse_ipv4(address).is_ok() {
        return Ok(());
    }
    validate_name(address)
        .map(|_| ())
        .map_err(|_| DNSError::config(format!("\"{}\" is not a valid server address", address)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failover_always_picks_first_eligible() {
        let mut chain = ServerChain::new(
            vec!["8.8.8.8".into(), "1.1.1.1".into()],
            RotationStrategy::Failover,
        )
        .unwrap();
        assert_eq!(chain.next_server(), "8.8.8.8");
        assert_eq!(chain.next_server(), "8.8.8.8");
    }

    #[test]
    fn round_robin_cycles() {
        let mut chain = ServerChain::new(
            vec!["8.8.8.8".into(), "1.1.1.1".into()],
            RotationStrategy::RoundRobin,
        )
        .unwrap();
        assert_eq!(chain.next_server(), "8.8.8.8");
        assert_eq!(chain.next_server(), "1.1.1.1");
        assert_eq!(chain.next_server(), "8.8.8.8");
    }

    #[test]
    fn all_failed_resets_and_makes_progress() {
        let mut chain = ServerChain::new(
            vec!["8.8.8.8".into(), "1.1.1.1".into()],
            RotationStrategy::Failover,
        )
        .unwrap();
        chain.mark_failed("8.8.8.8");
        chain.mark_failed("1.1.1.1");

        // both marked failed: next_server must still return something
        let server = chain.next_server();
        assert_eq!(server, "8.8.8.8");

        // and failed bits were cleared in the process
        assert_eq!(chain.next_server(), "8.8.8.8");
    }

    #[test]
    fn mark_failed_is_also_persistent() {
        let mut chain = ServerChain::new(
            vec!["8.8.8.8".into(), "1.1.1.1".into()],
            RotationStrategy::Failover,
        )
        .unwrap();
        chain.mark_failed("8.8.8.8");
        assert_eq!(chain.next_server(), "1.1.1.1");

        chain.reset_failed();
        assert_eq!(chain.next_server(), "8.8.8.8");
    }

    #[test]
    fn add_dedups_and_validates() {
        let mut chain = ServerChain::new(vec!["8.8.8.8".into()], RotationStrategy::Failover).unwrap();
        chain.add("8.8.8.8").unwrap();
        assert_eq!(chain.list().len(), 1);
        assert!(chain.add("not a domain!!").is_err());
        chain.add("resolver.example.com").unwrap();
        assert_eq!(chain.list().len(), 2);
    }

    #[test]
    fn empty_chain_is_rejected_at_construction() {
        assert!(ServerChain::new(vec![], RotationStrategy::Failover).is_err());
    }
}
