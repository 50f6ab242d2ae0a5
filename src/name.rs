//! Parameter name normalization.

/// Removes the last dot-delimited segment (e.g., `weight` or `bias`) of the given name.
///
/// Names that contain no dot are returned unchanged.
///
/// # Examples
///
/// ```
/// use archhash::name::remove_suffix;
///
/// assert_eq!(remove_suffix("a.b.c"), "a.b");
/// assert_eq!(remove_suffix("embedding"), "embedding");
/// ```
pub fn remove_suffix(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) => &name[..i],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_suffix_works() {
        assert_eq!(remove_suffix("a.b.c"), "a.b");
        assert_eq!(remove_suffix("layer1.weight"), "layer1");
        assert_eq!(remove_suffix("pos_emb"), "pos_emb");
        assert_eq!(remove_suffix("a."), "a");
        assert_eq!(remove_suffix(".weight"), "");
    }

    #[test]
    fn names_without_dot_are_fixed_points() {
        let name = remove_suffix("encoder.0.attn.qkv.weight");
        assert_eq!(name, "encoder.0.attn.qkv");
        assert_eq!(remove_suffix(remove_suffix("word_emb")), "word_emb");
    }
}
