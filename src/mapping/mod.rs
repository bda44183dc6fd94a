//! Atom-to-atom mapping between the reactant and product side of a reaction.
//!
//! A mapping pass seeds pairs from [`RootAtomPairSource`], grows each seed
//! with [`GrowthMapper`], completes leftovers with [`ReactionCenterMapper`]
//! and rates the result with [`MappingScorer`]. [`ReactionMapper`] runs
//! passes for the plain reaction and for every applicable [`ChemicalRule`].

mod center;
mod environment;
mod growth;
mod mapper;
mod root_pairs;
mod rules;
mod scorer;
mod state;

pub use center::ReactionCenterMapper;
pub use environment::{
    matching_depth, AtomEnvironments, Descriptor, EnvGroup, EnvironmentIndex, ExitEnvironments,
};
pub use growth::GrowthMapper;
pub use mapper::{MappingResult, ReactionMapper};
pub use root_pairs::{DecisionTree, RootAtomPair, RootAtomPairSource};
pub use rules::{ChemicalRule, ChemicalRuleBond, RuleBondEdit, RuleCatalog};
pub use scorer::MappingScorer;
pub use state::{AtomState, MapState};

use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::canonical::{symmetry_ranks, RankScratch};
use crate::config::MapperConfig;
use crate::graph_ops::fragment_numbers;
use crate::mol::Mol;
use crate::rings::RingInfo;

/// Everything one mapping pass reads about a reactant/product graph pair.
/// Built once per pair and shared by all passes over it.
#[derive(Debug)]
pub struct MappingContext<'a> {
    pub reactant: &'a Mol<Atom, Bond>,
    pub product: &'a Mol<Atom, Bond>,
    pub reactant_rings: RingInfo,
    pub product_rings: RingInfo,
    pub reactant_envs: AtomEnvironments,
    pub product_envs: AtomEnvironments,
    pub index: EnvironmentIndex,
    pub reactant_fragments: Vec<usize>,
    pub product_fragments: Vec<usize>,
    pub reactant_ranks: Vec<usize>,
    pub product_ranks: Vec<usize>,
    /// Atoms sharing a manual map number found exactly once per side.
    pub manual_pairs: Vec<(NodeIndex, NodeIndex)>,
    /// Equal atom counts and a 1:1 correspondence of radius-0 classes.
    pub stoichiometric: bool,
    pub config: &'a MapperConfig,
}

impl<'a> MappingContext<'a> {
    pub fn new(
        reactant: &'a Mol<Atom, Bond>,
        product: &'a Mol<Atom, Bond>,
        config: &'a MapperConfig,
    ) -> Self {
        let reactant_envs = AtomEnvironments::classify(reactant, config.max_radius);
        let product_envs = AtomEnvironments::classify(product, config.max_radius);
        let index = EnvironmentIndex::build(&reactant_envs, &product_envs);
        let stoichiometric = is_stoichiometric(reactant, product, &index);

        let mut scratch = RankScratch::with_capacity(reactant.atom_count().max(product.atom_count()));
        let reactant_ranks = symmetry_ranks(reactant, &mut scratch);
        let product_ranks = symmetry_ranks(product, &mut scratch);

        Self {
            reactant,
            product,
            reactant_rings: RingInfo::perceive(reactant),
            product_rings: RingInfo::perceive(product),
            reactant_envs,
            product_envs,
            index,
            reactant_fragments: fragment_numbers(reactant),
            product_fragments: fragment_numbers(product),
            reactant_ranks,
            product_ranks,
            manual_pairs: manual_pairs(reactant, product),
            stoichiometric,
            config,
        }
    }
}

fn is_stoichiometric(
    reactant: &Mol<Atom, Bond>,
    product: &Mol<Atom, Bond>,
    index: &EnvironmentIndex,
) -> bool {
    if reactant.atom_count() != product.atom_count() {
        return false;
    }
    let mut covered = 0;
    for group in index.groups(0) {
        if group.reactant_atoms.len() != group.product_atoms.len() {
            return false;
        }
        covered += group.reactant_atoms.len();
    }
    covered == reactant.atom_count()
}

/// Manual map numbers usable as seeds. Numbers missing on one side or
/// repeated on either side are ignored.
pub(crate) fn manual_pairs(
    reactant: &Mol<Atom, Bond>,
    product: &Mol<Atom, Bond>,
) -> Vec<(NodeIndex, NodeIndex)> {
    fn unique_numbers(mol: &Mol<Atom, Bond>) -> HashMap<u16, Option<NodeIndex>> {
        let mut seen: HashMap<u16, Option<NodeIndex>> = HashMap::new();
        for idx in mol.atoms() {
            let map_no = mol.atom(idx).map_no;
            if map_no == 0 {
                continue;
            }
            seen.entry(map_no)
                .and_modify(|slot| *slot = None)
                .or_insert(Some(idx));
        }
        seen
    }

    let products = unique_numbers(product);
    let reactants = unique_numbers(reactant);
    let mut pairs: Vec<(NodeIndex, NodeIndex)> = reactant
        .atoms()
        .filter_map(|r| {
            let map_no = reactant.atom(r).map_no;
            let r_unique = reactants.get(&map_no).copied().flatten()?;
            let p = products.get(&map_no).copied().flatten()?;
            (r_unique == r && reactant.atom(r).atomic_num == product.atom(p).atomic_num)
                .then_some((r, p))
        })
        .collect();
    pairs.sort();
    pairs
}
