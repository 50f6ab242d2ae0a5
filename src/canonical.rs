//! Canonical (renaming-invariant) parameter graphs.
use crate::graph::ParameterGraph;
use crate::hashing::{HashedName, HashedNames};
use crate::{ErrorKind, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

/// A parameter graph whose nodes are hashed names.
///
/// Each node maps to the set of its predecessors.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalGraph {
    predecessors: BTreeMap<HashedName, BTreeSet<HashedName>>,
}
impl CanonicalGraph {
    /// Returns the predecessors of `node`.
    pub fn predecessors(&self, node: &HashedName) -> Option<&BTreeSet<HashedName>> {
        self.predecessors.get(node)
    }

    /// Returns `true` if the edge `from -> to` exists.
    pub fn contains_edge(&self, from: &HashedName, to: &HashedName) -> bool {
        self.predecessors
            .get(to)
            .map_or(false, |preds| preds.contains(from))
    }

    /// Returns an iterator over `(node, predecessors)` pairs ordered by node.
    pub fn iter(&self) -> impl Iterator<Item = (&HashedName, &BTreeSet<HashedName>)> {
        self.predecessors.iter()
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.predecessors.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.predecessors.is_empty()
    }

    /// Returns the MD5 fingerprint of this graph.
    ///
    /// Structurally identical architectures have the same fingerprint.
    pub fn fingerprint(&self) -> u128 {
        let mut bytes = Vec::new();
        for (node, preds) in &self.predecessors {
            put_str(&mut bytes, node.as_str());
            bytes.extend_from_slice(&(preds.len() as u32).to_be_bytes());
            for p in preds {
                put_str(&mut bytes, p.as_str());
            }
        }
        u128::from_be_bytes(md5::compute(&bytes).0)
    }

    /// Serializes this graph to the given writer.
    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        track_io!(writer.write_u32::<BigEndian>(self.predecessors.len() as u32))?;
        for (node, preds) in &self.predecessors {
            track!(write_str(&mut writer, node.as_str()))?;
            track_io!(writer.write_u32::<BigEndian>(preds.len() as u32))?;
            for p in preds {
                track!(write_str(&mut writer, p.as_str()))?;
            }
        }
        Ok(())
    }

    /// Deserializes a `CanonicalGraph` instance from the given reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut predecessors = BTreeMap::new();
        let nodes = track_io!(reader.read_u32::<BigEndian>())?;
        for _ in 0..nodes {
            let node = track!(read_str(&mut reader))?;
            let n = track_io!(reader.read_u32::<BigEndian>())?;
            let mut preds = BTreeSet::new();
            for _ in 0..n {
                preds.insert(HashedName::from(track!(read_str(&mut reader))?));
            }
            predecessors.insert(HashedName::from(node), preds);
        }
        Ok(Self { predecessors })
    }
}

/// Re-expresses `graph` with hashed names.
///
/// Raw nodes that share a hashed name are merged and their predecessors are unioned.
pub fn project(graph: &ParameterGraph, hashed: &HashedNames) -> Result<CanonicalGraph> {
    let mut predecessors = BTreeMap::<_, BTreeSet<_>>::new();
    for node in graph.nodes() {
        let hashed_node = track_assert_some!(
            hashed.group(node),
            ErrorKind::MissingPredecessorHash,
            "node={:?}",
            node
        );
        let mut preds = BTreeSet::new();
        for pred in graph.predecessors(node).unwrap_or(&[]) {
            let hashed_pred = track_assert_some!(
                hashed.group(pred),
                ErrorKind::MissingPredecessorHash,
                "node={:?}, predecessor={:?}",
                node,
                pred
            );
            preds.insert(hashed_pred.clone());
        }
        predecessors
            .entry(hashed_node.clone())
            .or_default()
            .extend(preds);
    }
    Ok(CanonicalGraph { predecessors })
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn write_str<W: Write>(mut writer: W, s: &str) -> Result<()> {
    track_io!(writer.write_u32::<BigEndian>(s.len() as u32))?;
    track_io!(writer.write_all(s.as_bytes()))?;
    Ok(())
}

fn read_str<R: Read>(mut reader: R) -> Result<String> {
    let len = track_io!(reader.read_u32::<BigEndian>())?;
    let mut buf = vec![0; len as usize];
    track_io!(reader.read_exact(&mut buf))?;
    let s = track_invalid!(String::from_utf8(buf))?;
    Ok(s)
}
