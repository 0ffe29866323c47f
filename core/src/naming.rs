//! # Derived Plan Naming
//!
//! Builds the identifier of an EQD2 plan from the identifier of the plan it
//! was derived from, e.g. `PlanA` becomes `EQD2 PlanA`.
//!
//! When that name is taken in the course, an increasing numeric suffix is
//! appended (`EQD2 PlanA2`, `EQD2 PlanA3`, ...). If the suffixed name would
//! exceed the length limit, the source identifier is shortened so that tag,
//! shortened source and suffix fit exactly.
//!
//! Truncation of the *unsuffixed* name cuts the whole string and trims it,
//! while truncation of a *suffixed* name cuts (and trims) only the source
//! part. The two branches therefore do not shorten identically; this is kept
//! as-is because downstream systems may already reference identifiers
//! produced this way.
//!
//! Once the suffix alone no longer fits next to the tag, generation fails
//! rather than return an identifier over the limit.

use std::collections::HashSet;

use eqd2_common::error::{Eqd2Error, Result};
use eqd2_common::plan::{MAX_PLAN_ID_LENGTH, PlanIdentifier};
use tracing::debug;

pub const EQD2_TAG: &str = "EQD2 ";

pub struct PlanIdentifierGenerator {
    tag: String,
    max_length: usize,
}

impl Default for PlanIdentifierGenerator {
    fn default() -> Self {
        Self {
            tag: EQD2_TAG.to_string(),
            max_length: MAX_PLAN_ID_LENGTH,
        }
    }
}

impl PlanIdentifierGenerator {
    /// The tag plus a one-digit suffix must fit into `max_length`.
    pub fn new(tag: impl Into<String>, max_length: usize) -> Result<Self> {
        let tag = tag.into();
        if char_len(&tag) + 1 > max_length {
            return Err(Eqd2Error::InvalidInput(format!(
                "identifier length limit {max_length} leaves no room after tag '{tag}'"
            )));
        }
        Ok(Self { tag, max_length })
    }

    pub fn with_max_length(max_length: usize) -> Result<Self> {
        Self::new(EQD2_TAG, max_length)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Generates an identifier that no member of `sibling_ids` equals,
    /// ignoring case.
    ///
    /// Uniqueness holds against the snapshot passed in; plans registered
    /// concurrently by someone else are not seen.
    ///
    /// Fails with [`Eqd2Error::InvalidInput`] when every suffix that still
    /// fits into the length limit is taken.
    pub fn generate<S: AsRef<str>>(
        &self,
        source_id: &str,
        sibling_ids: &[S],
    ) -> Result<PlanIdentifier> {
        let taken: HashSet<String> = sibling_ids
            .iter()
            .map(|id| id.as_ref().to_lowercase())
            .collect();

        let mut candidate = format!("{}{}", self.tag, source_id);
        if char_len(&candidate) > self.max_length {
            candidate = take_chars(&candidate, self.max_length).trim().to_string();
        }

        let mut suffix: u64 = 2;
        while taken.contains(&candidate.to_lowercase()) {
            let suffixed = format!("{}{}{}", self.tag, source_id, suffix);
            candidate = if char_len(&suffixed) > self.max_length {
                let digits = suffix.to_string().len();
                let Some(budget) = self.max_length.checked_sub(char_len(&self.tag) + digits)
                else {
                    return Err(Eqd2Error::InvalidInput(format!(
                        "no free identifier of at most {} characters for '{source_id}'",
                        self.max_length
                    )));
                };
                format!(
                    "{}{}{}",
                    self.tag,
                    take_chars(source_id, budget).trim(),
                    suffix
                )
            } else {
                suffixed
            };
            suffix += 1;
        }

        debug!(source_id, id = %candidate, "generated plan identifier");
        Ok(PlanIdentifier::new(candidate))
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
