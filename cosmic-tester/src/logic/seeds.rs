use anyhow::{Context, Result, bail};
use rand::RngCore;
use std::collections::HashSet;

pub const DEFAULT_SEED: &str = "cosmic-1337";
const SIMULATED_PREFIX: &str = "sim";

/// Where a seed came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOrigin {
    Literal,
    /// Index `n` of a `sim:N` expansion.
    Simulated(usize),
    /// Produced by the engine's seed generator.
    Fresh,
}

impl std::fmt::Display for SeedOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal => f.write_str("literal"),
            Self::Simulated(index) => write!(f, "simulated #{index}"),
            Self::Fresh => f.write_str("fresh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: String,
    pub origin: SeedOrigin,
}

impl SeedInfo {
    #[must_use]
    pub fn literal(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            origin: SeedOrigin::Literal,
        }
    }
}

/// Resolve CLI seed tokens into concrete seeds.
///
/// Supports literal strings, `sim:N` (expands to `sim-0` .. `sim-(N-1)`),
/// and `fresh`, which asks the engine for a new seed. Duplicates keep their
/// first position.
pub fn resolve_seed_inputs<R: RngCore + ?Sized>(
    tokens: &[String],
    now_ms: i64,
    entropy: &mut R,
) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("fresh") {
            pending.push(SeedInfo {
                seed: cosmic_game::make_seed(now_ms, entropy),
                origin: SeedOrigin::Fresh,
            });
            continue;
        }

        if let Some(count) = token.strip_prefix(&format!("{SIMULATED_PREFIX}:")) {
            let count: usize = count
                .parse()
                .with_context(|| format!("invalid simulation count in seed token: {token}"))?;
            if count == 0 {
                bail!("seed token {token} expands to no seeds");
            }
            pending.extend((0..count).map(|i| SeedInfo {
                seed: format!("{SIMULATED_PREFIX}-{i}"),
                origin: SeedOrigin::Simulated(i),
            }));
            continue;
        }

        pending.push(SeedInfo::literal(token.clone()));
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert(info.seed.clone()));

    if pending.is_empty() {
        pending.push(SeedInfo::literal(DEFAULT_SEED));
    }
    for info in &pending {
        log::info!("seed {} ({})", info.seed, info.origin);
    }

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn resolves_literals_and_simulated_ranges() {
        let mut entropy = ChaCha8Rng::seed_from_u64(1);
        let seeds =
            resolve_seed_inputs(&tokens(&["alpha", "sim:3", "alpha"]), 0, &mut entropy).unwrap();
        let names: Vec<&str> = seeds.iter().map(|s| s.seed.as_str()).collect();
        assert_eq!(names, vec!["alpha", "sim-0", "sim-1", "sim-2"]);
        assert_eq!(seeds[2].origin, SeedOrigin::Simulated(1));
        assert_eq!(seeds[2].origin.to_string(), "simulated #1");
    }

    #[test]
    fn fresh_seeds_come_from_the_generator() {
        let mut entropy = ChaCha8Rng::seed_from_u64(9);
        let seeds = resolve_seed_inputs(&tokens(&["fresh", "fresh"]), 36, &mut entropy).unwrap();
        assert_eq!(seeds.len(), 2);
        assert!(seeds.iter().all(|s| s.origin == SeedOrigin::Fresh && s.seed.starts_with("10")));
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        let mut entropy = ChaCha8Rng::seed_from_u64(2);
        let seeds = resolve_seed_inputs(&[], 0, &mut entropy).unwrap();
        assert_eq!(seeds, vec![SeedInfo::literal(DEFAULT_SEED)]);
    }

    #[test]
    fn rejects_bad_simulation_counts() {
        let mut entropy = ChaCha8Rng::seed_from_u64(3);
        assert!(resolve_seed_inputs(&tokens(&["sim:x"]), 0, &mut entropy).is_err());
        assert!(resolve_seed_inputs(&tokens(&["sim:0"]), 0, &mut entropy).is_err());
    }
}
