use std::sync::Arc;

use rxnmap::{from_reaction_smiles, MapperConfig, MappingResult, ReactionMapper, RuleCatalog};

const REACTIONS: &[&str] = &[
    "CC(=O)O.OCC>>CC(=O)OCC.O",
    "CCO>>CC=O",
    "CBr.O>>CO.Br",
    "C=CC=C.C=C>>C1=CCCCC1",
    "c1ccccc1Br.N>>c1ccccc1N.Br",
    "CC(=O)Cl.NC>>CC(=O)NC.Cl",
    "C1CCCCC1.C1CCCCC1>>C1CCCCC1.C1CCCCC1",
    "CO>>COCCC(C)OC",
    "C=CCOC=C>>O=CCCC=C",
    "C1OC1.O>>OCCO",
    "[CH3:4]C(=O)O.[OH:9]C>>[CH3:4]C(=O)[O:9]C.O",
    "CCCCCC.OOOOOO>>C1CCCCC1.O1OOOOO1",
    "[Na+].[Cl-]>>[Na+].[Cl-]",
];

fn mapper() -> ReactionMapper {
    ReactionMapper::with_standard_rules().unwrap()
}

fn check_valid(smiles: &str, result: &MappingResult) -> Result<(), String> {
    let mut r: Vec<u16> = result.reactant_map.iter().copied().filter(|&m| m != 0).collect();
    let mut p: Vec<u16> = result.product_map.iter().copied().filter(|&m| m != 0).collect();
    r.sort_unstable();
    p.sort_unstable();
    if r.windows(2).any(|w| w[0] == w[1]) {
        return Err(format!("{smiles}: duplicate reactant numbers {r:?}"));
    }
    if p.windows(2).any(|w| w[0] == w[1]) {
        return Err(format!("{smiles}: duplicate product numbers {p:?}"));
    }
    if r != p {
        return Err(format!("{smiles}: unpaired numbers {r:?} vs {p:?}"));
    }
    if result.score > 0.0 {
        return Err(format!("{smiles}: positive score {}", result.score));
    }
    Ok(())
}

#[test]
fn every_mapping_pairs_numbers_one_to_one() {
    let mapper = mapper();
    let mut failures = Vec::new();
    for smiles in REACTIONS {
        let (reaction, result) = mapper.map_smiles(smiles).unwrap();
        if let Err(e) = check_valid(smiles, &result) {
            failures.push(e);
        }
        if reaction.reactant_map_numbers() != result.reactant_map {
            failures.push(format!("{smiles}: reactant numbers not written back"));
        }
        if reaction.product_map_numbers() != result.product_map {
            failures.push(format!("{smiles}: product numbers not written back"));
        }
    }
    if !failures.is_empty() {
        panic!("{} invalid mappings:\n{}", failures.len(), failures.join("\n"));
    }
}

#[test]
fn unchanged_molecules_score_zero() {
    let mapper = mapper();
    for smiles in [
        "CCO",
        "CC(C)C",
        "c1ccccc1",
        "Cc1ccccc1",
        "OC1CCCCC1",
        "CC(=O)O",
        "C[C@H](O)CC",
    ] {
        let (reaction, result) = mapper.map_smiles(&format!("{smiles}>>{smiles}")).unwrap();
        assert_eq!(result.score, 0.0, "{smiles}");
        assert_eq!(result.rule, None, "{smiles}");
        assert_eq!(
            reaction.reactant_map_numbers(),
            reaction.product_map_numbers(),
            "{smiles}"
        );
    }
}

#[test]
fn mapping_is_deterministic() {
    let mapper = mapper();
    for smiles in REACTIONS {
        let (_, first) = mapper.map_smiles(smiles).unwrap();
        let (_, second) = mapper.map_smiles(smiles).unwrap();
        assert_eq!(first, second, "{smiles}");
    }
}

#[test]
fn batch_mapping_matches_single_calls() {
    let mapper = mapper();
    let mut reactions: Vec<_> = REACTIONS
        .iter()
        .map(|s| from_reaction_smiles(s).unwrap())
        .collect();
    let batch = mapper.map_all(&mut reactions);
    assert_eq!(batch.len(), REACTIONS.len());
    for (smiles, result) in REACTIONS.iter().zip(&batch) {
        let (_, single) = mapper.map_smiles(smiles).unwrap();
        assert_eq!(&single, result, "{smiles}");
    }
}

#[test]
fn permutation_ceiling_keeps_mapping_valid() {
    let smiles = "CCCC.OOOO>>C1CCC1.O1OOO1";
    let catalog = Arc::new(RuleCatalog::standard().unwrap());

    let tight = MapperConfig {
        max_center_permutations: 1,
        ..MapperConfig::default()
    };
    let (_, result) = ReactionMapper::new(catalog.clone(), tight)
        .unwrap()
        .map_smiles(smiles)
        .unwrap();
    check_valid(smiles, &result).unwrap();

    let (_, result) = ReactionMapper::new(catalog, MapperConfig::default())
        .unwrap()
        .map_smiles(smiles)
        .unwrap();
    assert_eq!(result.mapped_count(), 8);
    check_valid(smiles, &result).unwrap();
}

#[test]
fn attempts_stay_within_budget() {
    let config = MapperConfig {
        max_attempts: 1,
        ..MapperConfig::default()
    };
    let mapper = ReactionMapper::new(Arc::new(RuleCatalog::default()), config).unwrap();
    for smiles in REACTIONS {
        let (_, result) = mapper.map_smiles(smiles).unwrap();
        assert_eq!(result.attempts, 1, "{smiles}");
        check_valid(smiles, &result).unwrap();
    }
}

#[test]
fn config_survives_json() {
    let config = MapperConfig {
        max_radius: 4,
        parallel_rule_trials: false,
        ..MapperConfig::default()
    };
    let json = config.to_json().unwrap();
    assert_eq!(MapperConfig::from_json(&json).unwrap(), config);
    assert!(MapperConfig::from_json(r#"{ "max_radius": 0 }"#).is_err());
    assert!(MapperConfig::from_json(r#"{ "unknown": 1 }"#).is_err());
}
