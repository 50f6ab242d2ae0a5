//! Persistent store of architectures keyed by structure.
use crate::canonical::CanonicalGraph;
use crate::record::{Record, RecordStream};
use crate::{ErrorKind, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde_json::{self, Map as JsonMap, Value as JsonValue};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// A named architecture and its metadata (e.g., checkpoint location, sampled configuration).
#[derive(Debug, Clone, PartialEq)]
pub struct ArchMeta {
    /// Architecture name.
    pub name: String,

    /// Free-form metadata.
    pub metadata: JsonMap<String, JsonValue>,
}
impl ArchMeta {
    /// Makes a new `ArchMeta` instance without metadata.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            metadata: JsonMap::new(),
        }
    }
}

/// Architectures sharing one canonical graph.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEntry {
    /// The shared canonical graph.
    pub graph: CanonicalGraph,

    /// Architectures having `graph`, in insertion order.
    pub archs: Vec<ArchMeta>,
}

/// Store of architectures keyed by the fingerprint of their canonical graph.
///
/// This is used to find an already trained, structurally identical source
/// architecture for weight transfer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArchStore {
    entries: HashMap<u128, StoreEntry>,
}
impl ArchStore {
    /// Makes a new empty `ArchStore` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an `ArchStore` instance from the given file.
    ///
    /// Note that this function assumes the file contains bytes produced by `ArchStore::to_writer` method.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = track_io!(File::open(&path); path.as_ref())?;
        let store = track!(Self::from_reader(BufReader::new(file)))?;
        debug!(
            "Loaded {} structures from {:?}",
            store.len(),
            path.as_ref()
        );
        Ok(store)
    }

    /// Saves the state of this store to the given file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = track_io!(File::create(&path); path.as_ref())?;
        let mut writer = BufWriter::new(file);
        track!(self.to_writer(&mut writer))?;
        track_io!(writer.flush())?;
        debug!("Saved {} structures to {:?}", self.len(), path.as_ref());
        Ok(())
    }

    /// Adds `meta` under `graph` and returns the fingerprint of `graph`.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::InvalidInput` if another graph has the same fingerprint.
    pub fn insert(&mut self, graph: CanonicalGraph, meta: ArchMeta) -> Result<u128> {
        let fingerprint = graph.fingerprint();
        match self.entries.entry(fingerprint) {
            Entry::Occupied(mut e) => {
                track_assert!(
                    e.get().graph == graph,
                    ErrorKind::InvalidInput,
                    "Fingerprint collision: {:032x}",
                    fingerprint
                );
                e.get_mut().archs.push(meta);
            }
            Entry::Vacant(e) => {
                e.insert(StoreEntry {
                    graph,
                    archs: vec![meta],
                });
            }
        }
        Ok(fingerprint)
    }

    /// Returns the entry whose canonical graph equals `graph`.
    pub fn get(&self, graph: &CanonicalGraph) -> Option<&StoreEntry> {
        self.entries
            .get(&graph.fingerprint())
            .filter(|e| e.graph == *graph)
    }

    /// Returns the entry having the given fingerprint.
    pub fn get_by_fingerprint(&self, fingerprint: u128) -> Option<&StoreEntry> {
        self.entries.get(&fingerprint)
    }

    /// Returns the entries of this store.
    pub fn entries(&self) -> &HashMap<u128, StoreEntry> {
        &self.entries
    }

    /// Returns the number of distinct structures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the state of this store to the given writer.
    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        for entry in self.entries.values() {
            for meta in &entry.archs {
                let mut data = Vec::new();
                track_io!(data.write_u32::<BigEndian>(meta.name.len() as u32))?;
                data.extend_from_slice(meta.name.as_bytes());
                track!(entry.graph.to_writer(&mut data))?;
                track_invalid!(serde_json::to_writer(&mut data, &meta.metadata))?;
                track!(Record::new(data).write_to(&mut writer))?;
            }
        }
        Ok(())
    }

    /// Deserializes an `ArchStore` instance from the given reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut store = Self::new();
        for record in RecordStream::new(reader) {
            let record = track!(record)?;
            let mut data = &record.data[..];

            let len = track_io!(data.read_u32::<BigEndian>())?;
            let mut name = vec![0; len as usize];
            track_io!(data.read_exact(&mut name))?;
            let name = track_invalid!(String::from_utf8(name))?;

            let graph = track!(CanonicalGraph::from_reader(&mut data))?;
            let metadata = track_invalid!(serde_json::from_slice(data); name)?;
            track!(store.insert(graph, ArchMeta { name, metadata }))?;
        }
        Ok(store)
    }
}
