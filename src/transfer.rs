//! Parameter alignment for weight transfer between architectures.
use crate::hashing::{HashedName, HashedNames};
use std::collections::HashMap;

/// Result of aligning the parameters of a target architecture with a source architecture.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// `(target parameter, source parameter)` pairs in the target's declaration order.
    pub matched: Vec<(String, String)>,

    /// Target parameters that have no structural counterpart in the source.
    pub unmatched: Vec<String>,
}
impl Alignment {
    /// Returns `true` if every target parameter has a counterpart.
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }

    /// Returns the source parameter aligned with the `target` parameter.
    pub fn source_of(&self, target: &str) -> Option<&str> {
        self.matched
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, s)| s.as_str())
    }
}

/// Aligns the parameters of `target` with those of `source` by their hashed names.
///
/// Weights of a matched source parameter can be copied into the target parameter as is.
pub fn align(source: &HashedNames, target: &HashedNames) -> Alignment {
    let by_hash = source
        .iter()
        .map(|(name, hashed)| (hashed, name))
        .collect::<HashMap<&HashedName, &str>>();

    let mut alignment = Alignment::default();
    for (name, hashed) in target.iter() {
        match by_hash.get(hashed) {
            Some(source_name) => alignment
                .matched
                .push((name.to_owned(), (*source_name).to_owned())),
            None => alignment.unmatched.push(name.to_owned()),
        }
    }
    alignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::ArchSnapshot;
    use crate::hashing::hashed_names;
    use trackable::result::TopLevelResult;

    fn transformer(prefix: &str, d_inners: &[usize]) -> ArchSnapshot {
        let mut arch = ArchSnapshot::new()
            .module("word_emb", "Embedding(1000,64)")
            .parameter("word_emb.weight");
        for (i, d_inner) in d_inners.iter().enumerate() {
            let attn = format!("{}.{}.attn", prefix, i);
            let ff = format!("{}.{}.ff", prefix, i);
            arch = arch
                .module(&attn, "MultiHeadAttention(64,4)")
                .module(&ff, &format!("PositionwiseFF(64,{})", d_inner))
                .parameter(&format!("{}.qkv", attn))
                .parameter(&format!("{}.o", attn))
                .parameter(&format!("{}.weight", ff))
                .parameter(&format!("{}.bias", ff));
        }
        arch
    }

    #[test]
    fn identical_structures_are_fully_aligned() -> TopLevelResult {
        let (_, source) = track!(hashed_names(&transformer("layers", &[256, 256])))?;
        let (_, target) = track!(hashed_names(&transformer("blocks", &[256, 256])))?;

        let alignment = align(&source, &target);
        assert!(alignment.is_complete());
        assert_eq!(alignment.matched.len(), 9);
        assert_eq!(alignment.source_of("blocks.1.ff.bias"), Some("layers.1.ff.bias"));
        assert_eq!(alignment.source_of("word_emb.weight"), Some("word_emb.weight"));
        Ok(())
    }

    #[test]
    fn differing_layers_break_the_chain() -> TopLevelResult {
        let (_, source) = track!(hashed_names(&transformer("layers", &[256, 256])))?;
        let (_, target) = track!(hashed_names(&transformer("layers", &[256, 512])))?;

        // Everything up to the changed feed-forward layer is shared.
        let alignment = align(&source, &target);
        assert!(!alignment.is_complete());
        assert_eq!(alignment.matched.len(), 7);
        assert_eq!(
            alignment.unmatched,
            ["layers.1.ff.weight", "layers.1.ff.bias"]
        );
        Ok(())
    }

    #[test]
    fn deeper_target_is_partially_aligned() -> TopLevelResult {
        let (_, source) = track!(hashed_names(&transformer("layers", &[128])))?;
        let (_, target) = track!(hashed_names(&transformer("layers", &[128, 128])))?;

        let alignment = align(&source, &target);
        assert_eq!(alignment.matched.len(), 5);
        assert_eq!(alignment.unmatched.len(), 4);
        assert!(alignment.unmatched.iter().all(|n| n.starts_with("layers.1.")));
        Ok(())
    }
}
