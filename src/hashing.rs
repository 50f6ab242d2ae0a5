//! Hashed (renaming-invariant) parameter names.
use crate::arch::Architecture;
use crate::graph::{build_graph, ModuleDescriptors, ParameterGraph};
use crate::name::remove_suffix;
use crate::{ErrorKind, Result};
use sha3::{Digest, Sha3_512};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

const DIGEST_HEX_LEN: usize = 128;

/// A parameter name derived from its module descriptor and its predecessors' hashed names.
///
/// The format is `<SHA3-512 hex digest><descriptor>_<occurrence>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashedName(String);
impl HashedName {
    /// Returns the string representation of this name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the hex digest part of this name.
    pub fn digest(&self) -> &str {
        self.0.get(..DIGEST_HEX_LEN).unwrap_or(&self.0)
    }

    /// Returns the occurrence counter of this name.
    pub fn occurrence(&self) -> usize {
        self.0
            .rsplit('_')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }
}
impl fmt::Display for HashedName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<String> for HashedName {
    fn from(f: String) -> Self {
        Self(f)
    }
}

/// Hashed names of the parameters of an architecture.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HashedNames {
    params: Vec<(String, HashedName)>,
    index: HashMap<String, usize>,
    groups: HashMap<String, HashedName>,
}
impl HashedNames {
    /// Returns the hashed name of the raw parameter `name`.
    pub fn get(&self, name: &str) -> Option<&HashedName> {
        self.index.get(name).map(|&i| &self.params[i].1)
    }

    /// Returns the hashed name of the parameter group `node`.
    ///
    /// This is the hashed name of the first parameter of the group.
    pub fn group(&self, node: &str) -> Option<&HashedName> {
        self.groups.get(node)
    }

    /// Returns `(raw name, hashed name)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HashedName)> {
        self.params.iter().map(|(n, h)| (n.as_str(), h))
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn insert(&mut self, name: &str, group: &str, hashed: HashedName) {
        if !self.groups.contains_key(group) {
            self.groups.insert(group.to_owned(), hashed.clone());
        }
        self.index.insert(name.to_owned(), self.params.len());
        self.params.push((name.to_owned(), hashed));
    }
}

/// Builds the parameter graph of `arch` and assigns hashed names to its parameters.
pub fn hashed_names<A: Architecture + ?Sized>(arch: &A) -> Result<(ParameterGraph, HashedNames)> {
    let (graph, descriptors) = build_graph(arch);
    let hashed = track!(assign_hashed_names(
        &graph,
        &descriptors,
        &arch.parameter_names()
    ))?;
    Ok((graph, hashed))
}

/// Assigns hashed names to `params` (given in declaration order).
///
/// Parameters whose group has no descriptor use the group name as the descriptor.
///
/// # Errors
///
/// Returns `ErrorKind::MissingPredecessorHash` if a predecessor of a parameter group
/// has not been named yet, i.e., `graph` is not a sequential chain.
pub fn assign_hashed_names(
    graph: &ParameterGraph,
    descriptors: &ModuleDescriptors,
    params: &[String],
) -> Result<HashedNames> {
    let mut hashed = HashedNames::default();
    let mut counts = HashMap::<String, usize>::new();
    for name in params {
        let group = remove_suffix(name);
        let descriptor = match descriptors.get(group) {
            Some(d) => d,
            None => {
                debug!("No descriptor for {:?}: using the group name instead", group);
                group
            }
        };

        let mut hasher = Sha3_512::new();
        hasher.update(descriptor.as_bytes());
        for pred in graph.predecessors(group).unwrap_or(&[]) {
            if pred == group {
                continue;
            }
            let pred_hash = track_assert_some!(
                hashed.group(pred),
                ErrorKind::MissingPredecessorHash,
                "parameter={:?}, predecessor={:?}",
                name,
                pred
            );
            hasher.update(pred_hash.as_str().as_bytes());
        }

        let base = format!("{:x}{}", hasher.finalize(), descriptor);
        let count = counts.entry(base.clone()).or_insert(0);
        let hashed_name = HashedName(format!("{}_{}", base, count));
        *count += 1;

        trace!("{} => {}", name, hashed_name);
        hashed.insert(name, group, hashed_name);
    }
    Ok(hashed)
}
