use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, trace, warn};
use rayon::prelude::*;

use super::center::ReactionCenterMapper;
use super::growth::GrowthMapper;
use super::manual_pairs;
use super::root_pairs::RootAtomPairSource;
use super::rules::{ChemicalRule, RuleCatalog};
use super::scorer::MappingScorer;
use super::state::MapState;
use super::MappingContext;
use crate::atom::{Atom, MapOrigin};
use crate::bond::Bond;
use crate::config::MapperConfig;
use crate::error::MapperError;
use crate::mol::Mol;
use crate::reaction::{from_reaction_smiles, Reaction};
use crate::substruct::{get_template_matches, has_template_match, AtomMapping};

/// Outcome of mapping one reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingResult {
    /// Negated bond-change penalty of the winning mapping, rule penalty
    /// included. 0 means no bond changes at all.
    pub score: f64,
    /// Name of the rule behind the winning mapping, if any.
    pub rule: Option<String>,
    /// Final map numbers of all reactant atoms in merged order.
    pub reactant_map: Vec<u16>,
    pub product_map: Vec<u16>,
    /// Atom pairs mapped by graph growth before reaction-center completion.
    pub graph_mapped: usize,
    /// Mapping passes run for the winning reactant graph.
    pub attempts: usize,
}

impl MappingResult {
    pub fn mapped_count(&self) -> usize {
        self.reactant_map.iter().filter(|&&m| m != 0).count()
    }
}

/// Best mapping found over all passes for one reactant graph.
#[derive(Debug, Clone)]
struct Trial {
    score: f64,
    reactant_map: Vec<u16>,
    product_map: Vec<u16>,
    graph_mapped: u16,
    attempts: usize,
}

/// Maps reactions: a plain pass over the reaction as given plus one trial
/// per distinct match of every applicable rule, keeping the best score.
#[derive(Debug, Clone)]
pub struct ReactionMapper {
    catalog: Arc<RuleCatalog>,
    config: MapperConfig,
}

impl ReactionMapper {
    pub fn new(catalog: Arc<RuleCatalog>, config: MapperConfig) -> Result<Self, MapperError> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    pub fn with_standard_rules() -> Result<Self, MapperError> {
        Self::new(Arc::new(RuleCatalog::standard()?), MapperConfig::default())
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<RuleCatalog> {
        &self.catalog
    }

    /// Parses a reaction SMILES and maps it.
    pub fn map_smiles(&self, smiles: &str) -> Result<(Reaction, MappingResult), MapperError> {
        let mut reaction = from_reaction_smiles(smiles)?;
        let result = self.map(&mut reaction);
        Ok((reaction, result))
    }

    /// Maps every reaction independently on the rayon pool.
    pub fn map_all(&self, reactions: &mut [Reaction]) -> Vec<MappingResult> {
        reactions.par_iter_mut().map(|r| self.map(r)).collect()
    }

    /// Computes a mapping and writes it onto the reaction's atoms. Atoms left
    /// unmapped get map number 0.
    pub fn map(&self, reaction: &mut Reaction) -> MappingResult {
        let reactant = reaction.merged_reactants().mol;
        let product = reaction.merged_products().mol;
        debug!(
            "mapping {} reactant atoms onto {} product atoms",
            reactant.atom_count(),
            product.atom_count()
        );

        let baseline = self.map_pair(&reactant, &product);
        debug!("baseline score {:.2}", baseline.score);

        let mut winner = baseline;
        let mut winning_rule: Option<&ChemicalRule> = None;
        if self.config.use_rules {
            if let Some((rule, trial)) = self.best_rule_trial(&reactant, &product) {
                // ties go to the plain mapping
                if trial.score > winner.score {
                    debug!("rule '{}' wins with {:.2}", rule.name(), trial.score);
                    winner = trial;
                    winning_rule = Some(rule);
                }
            }
        }

        let (reactant_numbers, product_numbers) = final_numbers(&reactant, &product, &winner);
        reaction.write_map_numbers(&reactant_numbers, &product_numbers);

        MappingResult {
            score: winner.score,
            rule: winning_rule.map(|r| r.name().to_string()),
            reactant_map: reactant_numbers.iter().map(|&(m, _)| m).collect(),
            product_map: product_numbers.iter().map(|&(m, _)| m).collect(),
            graph_mapped: usize::from(winner.graph_mapped),
            attempts: winner.attempts,
        }
    }

    /// Runs mapping passes, varying tied seed choices between passes, and
    /// keeps the first best-scoring one.
    fn map_pair(&self, reactant: &Mol<Atom, Bond>, product: &Mol<Atom, Bond>) -> Trial {
        let ctx = MappingContext::new(reactant, product, &self.config);
        let mut source = RootAtomPairSource::new(&ctx);
        let mut growth = GrowthMapper::new(&ctx);
        let center = ReactionCenterMapper::new(&ctx);
        let scorer = MappingScorer::new(reactant, product);

        let mut best = run_pass(&mut source, &mut growth, &center, &scorer);
        let mut attempts = 1;
        trace!("pass 1: score {:.2}", best.score);
        while attempts < self.config.max_attempts && source.advance() {
            let trial = run_pass(&mut source, &mut growth, &center, &scorer);
            attempts += 1;
            trace!("pass {attempts}: score {:.2}", trial.score);
            if trial.score > best.score {
                best = trial;
            }
        }
        best.attempts = attempts;
        best
    }

    /// Best trial over all rules whose templates fit the reaction, the
    /// first one found on ties.
    fn best_rule_trial(
        &self,
        reactant: &Mol<Atom, Bond>,
        product: &Mol<Atom, Bond>,
    ) -> Option<(&ChemicalRule, Trial)> {
        let rules = self.catalog.rules();
        let mut jobs: Vec<(usize, AtomMapping)> = Vec::new();
        for (i, rule) in rules.iter().enumerate() {
            if !has_template_match(product, rule.product_template()) {
                continue;
            }
            let limit = self.config.max_rule_matches;
            let matches = get_template_matches(reactant, rule.reactant_template(), limit + 1);
            if matches.is_empty() {
                continue;
            }
            if matches.len() > limit {
                debug!("rule '{}': more than {limit} matches, skipped", rule.name());
                continue;
            }
            let mut seen = HashSet::new();
            let before = jobs.len();
            for m in matches {
                if seen.insert(rule.target_edits(&m)) {
                    jobs.push((i, m));
                }
            }
            debug!(
                "rule '{}': {} distinct matches",
                rule.name(),
                jobs.len() - before
            );
        }

        let run = |(i, m): &(usize, AtomMapping)| {
            let rule = &rules[*i];
            let mut modified = reactant.clone();
            rule.apply(&mut modified, m);
            let mut trial = self.map_pair(&modified, product);
            trial.score -= rule.penalty();
            (*i, trial)
        };
        let trials: Vec<(usize, Trial)> = if self.config.parallel_rule_trials {
            jobs.par_iter().map(run).collect()
        } else {
            jobs.iter().map(run).collect()
        };

        let mut best: Option<(usize, Trial)> = None;
        for (i, trial) in trials {
            if best.as_ref().map_or(true, |(_, b)| trial.score > b.score) {
                best = Some((i, trial));
            }
        }
        best.map(|(i, trial)| (&rules[i], trial))
    }
}

/// One mapping pass: seed and grow until no seed is left, then complete the
/// reaction center.
fn run_pass(
    source: &mut RootAtomPairSource,
    growth: &mut GrowthMapper,
    center: &ReactionCenterMapper,
    scorer: &MappingScorer,
) -> Trial {
    let ctx = center.context();
    source.start_pass();
    let mut state = MapState::new(ctx.reactant.atom_count(), ctx.product.atom_count());
    while let Some(pair) = source.next_pair(&mut state) {
        growth.grow_from(&pair, &mut state);
        if state.is_exhausted() {
            warn!("all {} map numbers used, pass stopped", u16::MAX);
            break;
        }
    }
    state.clear_rejections();
    let graph_mapped = state.mapped_count();
    center.complete(&mut state);
    let reactant_map = state.reactant_map_numbers();
    let product_map = state.product_map_numbers();
    Trial {
        score: scorer.score(&reactant_map, &product_map),
        reactant_map,
        product_map,
        graph_mapped,
        attempts: 0,
    }
}

/// Translates internal pass numbers into the numbers written back: valid
/// manual numbers are kept, the rest follow the largest manual number.
fn final_numbers(
    reactant: &Mol<Atom, Bond>,
    product: &Mol<Atom, Bond>,
    trial: &Trial,
) -> (Vec<(u16, MapOrigin)>, Vec<(u16, MapOrigin)>) {
    let internal_max = trial.reactant_map.iter().copied().max().unwrap_or(0) as usize;
    let mut translated: Vec<Option<(u16, MapOrigin)>> = vec![None; internal_max + 1];

    let pairs = manual_pairs(reactant, product);
    let mut next = pairs
        .iter()
        .map(|&(r, _)| reactant.atom(r).map_no)
        .max()
        .unwrap_or(0);
    for &(r, p) in &pairs {
        let k = trial.reactant_map[r.index()];
        if k != 0 && trial.product_map[p.index()] == k {
            translated[k as usize] = Some((reactant.atom(r).map_no, MapOrigin::Manual));
        }
    }
    for (k, slot) in translated.iter_mut().enumerate().skip(1) {
        if slot.is_none() {
            // atoms past the last free number stay unmapped
            let Some(n) = next.checked_add(1) else {
                break;
            };
            next = n;
            let origin = if k <= usize::from(trial.graph_mapped) {
                MapOrigin::Graph
            } else {
                MapOrigin::ReactionCenter
            };
            *slot = Some((next, origin));
        }
    }

    let translate = |k: u16| match k {
        0 => (0, MapOrigin::default()),
        k => translated[k as usize].unwrap_or_default(),
    };
    (
        trial.reactant_map.iter().map(|&k| translate(k)).collect(),
        trial.product_map.iter().map(|&k| translate(k)).collect(),
    )
}
