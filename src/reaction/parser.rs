use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
use crate::smiles::from_smiles;

use super::error::ReactionSmilesError;
use super::Reaction;

/// Parses `reactants>>products` or `reactants>agents>products`. Agents are
/// validated but not kept: they take no part in mapping.
pub fn parse_reaction_smiles(s: &str) -> Result<Reaction, ReactionSmilesError> {
    let (reactant_text, agent_text, product_text) = split_reaction(s.trim())?;

    let reactants = parse_section(reactant_text, "reactant")?;
    if reactants.is_empty() {
        return Err(ReactionSmilesError::EmptyReactants);
    }

    let products = parse_section(product_text, "product")?;
    if products.is_empty() {
        return Err(ReactionSmilesError::EmptyProducts);
    }

    parse_section(agent_text, "agent")?;

    Ok(Reaction {
        reactants,
        products,
    })
}

fn split_reaction(s: &str) -> Result<(&str, &str, &str), ReactionSmilesError> {
    let gt_positions = find_gt_positions(s);

    match gt_positions.as_slice() {
        [] | [_] => Err(ReactionSmilesError::MissingSeparator),
        &[first, second] => Ok((&s[..first], &s[first + 1..second], &s[second + 1..])),
        _ => Err(ReactionSmilesError::TooManySeparators),
    }
}

fn find_gt_positions(s: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut bracket_depth = 0u32;

    for (i, ch) in s.char_indices() {
        match ch {
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '>' if bracket_depth == 0 => positions.push(i),
            _ => {}
        }
    }

    positions
}

fn split_on_dot(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut bracket_depth = 0u32;
    let mut paren_depth = 0u32;

    for (i, ch) in s.char_indices() {
        match ch {
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '.' if bracket_depth == 0 && paren_depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_section(
    text: &str,
    section: &'static str,
) -> Result<Vec<Mol<Atom, Bond>>, ReactionSmilesError> {
    split_on_dot(text)
        .into_iter()
        .map(|part| {
            from_smiles(part)
                .map_err(|detail| ReactionSmilesError::InvalidComponent { section, detail })
        })
        .collect()
}
