//! Shader quality fallback chain.

use std::collections::BTreeMap;

use crate::defines::{DefineValue, MaterialDefines};

/// Ordered chain of reduced-quality shader variants.
///
/// Each rank holds the defines switched off together when the variant at the
/// previous rank failed to compile. Ranks are consumed lowest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectFallbacks {
    ranks: BTreeMap<u32, Vec<String>>,
}

impl EffectFallbacks {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `define` to be switched off at `rank`.
    pub fn add_fallback(&mut self, rank: u32, define: impl Into<String>) {
        let define = define.into();
        let defines = self.ranks.entry(rank).or_default();
        if !defines.contains(&define) {
            defines.push(define);
        }
    }

    /// Whether any fallback remains.
    pub fn has_fallbacks(&self) -> bool {
        !self.ranks.is_empty()
    }

    /// Lowest remaining rank.
    pub fn current_rank(&self) -> Option<u32> {
        self.ranks.keys().next().copied()
    }

    /// Defines registered at `rank`.
    pub fn defines_at(&self, rank: u32) -> &[String] {
        self.ranks.get(&rank).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterate `(rank, defines)` in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[String])> {
        self.ranks.iter().map(|(r, d)| (*r, d.as_slice()))
    }

    /// Switch off every define of the lowest remaining rank.
    ///
    /// Each define is reset to the disabled value of its current kind; defines
    /// without a value are set to `false`. Returns the consumed rank, or
    /// `None` when the chain is exhausted.
    pub fn reduce(&mut self, defines: &mut MaterialDefines) -> Option<u32> {
        let rank = self.current_rank()?;
        let removed = self.ranks.remove(&rank).unwrap_or_default();
        for define in &removed {
            let disabled = defines
                .get(define)
                .map_or(DefineValue::Boolean(false), DefineValue::disabled);
            defines.set(define, disabled);
        }
        log::debug!("Shader fallback rank {rank}: disabled {removed:?}");
        Some(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_consumes_lowest_rank_first() {
        let mut fallbacks = EffectFallbacks::new();
        fallbacks.add_fallback(2, "RIMLIGHT");
        fallbacks.add_fallback(0, "DETAIL");
        fallbacks.add_fallback(0, "DETAIL");

        let mut defines = MaterialDefines::new();
        defines.set("DETAIL", true);
        defines.set("RIMLIGHT", true);

        assert_eq!(fallbacks.defines_at(0), &["DETAIL".to_string()]);
        assert_eq!(fallbacks.reduce(&mut defines), Some(0));
        assert!(!defines.is_enabled("DETAIL"));
        assert!(defines.is_enabled("RIMLIGHT"));

        assert_eq!(fallbacks.reduce(&mut defines), Some(2));
        assert!(!defines.is_enabled("RIMLIGHT"));
        assert_eq!(fallbacks.reduce(&mut defines), None);
        assert!(!fallbacks.has_fallbacks());
    }

    #[test]
    fn test_reduce_keeps_define_kind() {
        let mut fallbacks = EffectFallbacks::new();
        fallbacks.add_fallback(0, "NUM_SAMPLES");
        fallbacks.add_fallback(0, "QUALITY");
        fallbacks.add_fallback(0, "UNSET");

        let mut defines = MaterialDefines::new();
        defines.set("NUM_SAMPLES", 4);
        defines.set("QUALITY", "HIGH");

        fallbacks.reduce(&mut defines);
        assert_eq!(defines.get("NUM_SAMPLES"), Some(&DefineValue::Number(0.0)));
        assert_eq!(defines.get("QUALITY"), Some(&DefineValue::String(String::new())));
        assert_eq!(defines.get("UNSET"), Some(&DefineValue::Boolean(false)));
    }
}
