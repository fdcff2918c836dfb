use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;

use crate::error::GeneratorError;
use crate::linker::SchemaUnit;
use crate::model::{DefId, Model};

/// Reorder every sibling list of `unit` so each declaration follows those it uses, then
/// number the whole file in post order.
pub(crate) fn sort_unit<'sc>(
    model: &mut Model<'sc>,
    unit: &mut SchemaUnit<'sc>,
) -> Result<(), GeneratorError> {
    unit.definitions = sort_siblings(model, &unit.definitions, &unit.name)?;

    let mut pending: Vec<DefId> = unit.definitions.clone();
    while let Some(id) = pending.pop() {
        let nested = match model.message(id) {
            Some(msg) if !msg.nested.is_empty() => msg.nested.clone(),
            _ => continue,
        };
        let sorted = sort_siblings(model, &nested, &unit.name)?;
        pending.extend(sorted.iter().copied());
        if let Some(msg) = model.message_mut(id) {
            msg.nested = sorted;
        }
    }

    let mut counter = 0;
    for id in unit.definitions.clone() {
        number_post_order(model, id, &mut counter);
    }

    log::debug!(
        "{}: emission order {}",
        unit.name,
        unit.walk(model)
            .into_iter()
            .map(|(id, _)| model.definition(id).full_name)
            .join(", ")
    );
    Ok(())
}

fn number_post_order(model: &mut Model<'_>, id: DefId, counter: &mut usize) {
    let nested = model.message(id).map(|msg| msg.nested.clone()).unwrap_or_default();
    for child in nested {
        number_post_order(model, child, counter);
    }
    model.definition_mut(id).emission_index = *counter;
    *counter += 1;
}

/// Sort one sibling list. A sibling depends on another when anything in its subtree refers
/// to anything in the other's subtree; references leaving the list are someone else's
/// concern.
fn sort_siblings(
    model: &Model<'_>,
    siblings: &[DefId],
    file: &str,
) -> Result<Vec<DefId>, GeneratorError> {
    let mut owner: HashMap<DefId, usize> = HashMap::new();
    for (position, sibling) in siblings.iter().enumerate() {
        for id in model.subtree(*sibling) {
            owner.insert(id, position);
        }
    }

    let dependencies: Vec<BTreeSet<usize>> = siblings
        .iter()
        .enumerate()
        .map(|(position, sibling)| {
            model
                .subtree(*sibling)
                .into_iter()
                .filter_map(|id| model.message(id))
                .flat_map(|msg| msg.fields.iter())
                .filter(|field| !field.is_recursive())
                .filter_map(|field| field.type_ref().and_then(|type_ref| type_ref.target))
                .filter_map(|target| owner.get(&target).copied())
                .filter(|used| *used != position)
                .collect()
        })
        .collect();

    topological_order(&dependencies)
        .map(|order| order.into_iter().map(|position| siblings[position]).collect())
        .map_err(|cycle| GeneratorError::CircularDependency {
            file: file.to_owned(),
            cycle: cycle
                .into_iter()
                .map(|position| model.definition(siblings[position]).full_name.to_owned())
                .collect(),
        })
}

/// Kahn's algorithm over `dependencies[node]`, always taking the lowest ready node next so
/// independent nodes keep their original order. On failure returns one cycle, first node
/// repeated at the end.
pub(crate) fn topological_order(
    dependencies: &[BTreeSet<usize>],
) -> Result<Vec<usize>, Vec<usize>> {
    let count = dependencies.len();
    let mut remaining: Vec<usize> = dependencies.iter().map(BTreeSet::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (node, deps) in dependencies.iter().enumerate() {
        for dep in deps {
            dependents[*dep].push(node);
        }
    }

    let mut ready: BTreeSet<usize> = (0..count).filter(|node| remaining[*node] == 0).collect();
    let mut order = Vec::with_capacity(count);
    while let Some(node) = ready.iter().next().copied() {
        ready.remove(&node);
        order.push(node);
        for dependent in &dependents[node] {
            remaining[*dependent] -= 1;
            if remaining[*dependent] == 0 {
                ready.insert(*dependent);
            }
        }
    }

    if order.len() == count {
        return Ok(order);
    }

    // Every unplaced node still waits on at least one unplaced node, so walking those edges
    // from any of them must come back around.
    let placed: BTreeSet<usize> = order.into_iter().collect();
    let unplaced = |node: &usize| !placed.contains(node);
    let mut walk: Vec<usize> = Vec::new();
    let mut current = (0..count).find(|node| unplaced(node));
    while let Some(node) = current {
        if let Some((start, _)) = walk.iter().find_position(|seen| **seen == node) {
            let mut cycle = walk[start..].to_vec();
            cycle.push(node);
            return Err(cycle);
        }
        walk.push(node);
        current = dependencies[node].iter().copied().find(|dep| unplaced(dep));
    }
    Err(walk)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn deps(edges: Vec<Vec<usize>>) -> Vec<BTreeSet<usize>> {
        edges
            .into_iter()
            .map(|targets| targets.into_iter().collect())
            .collect()
    }

    #[rstest]
    #[case(vec![vec![], vec![]], vec![0, 1])]
    #[case(vec![vec![1], vec![]], vec![1, 0])]
    #[case(vec![vec![2], vec![], vec![]], vec![1, 2, 0])]
    #[case(vec![vec![], vec![2], vec![0]], vec![0, 2, 1])]
    fn ties_keep_declaration_order(#[case] edges: Vec<Vec<usize>>, #[case] expected: Vec<usize>) {
        assert_eq!(topological_order(&deps(edges)), Ok(expected));
    }

    #[test]
    fn two_node_cycle_is_reported_closed() {
        assert_eq!(topological_order(&deps(vec![vec![1], vec![0]])), Err(vec![0, 1, 0]));
    }

    #[test]
    fn cycle_behind_an_acyclic_prefix() {
        // 0 waits on the 1 <-> 2 loop but is not part of it.
        let result = topological_order(&deps(vec![vec![1], vec![2], vec![1], vec![]]));
        assert_eq!(result, Err(vec![1, 2, 1]));
    }
}
