use itertools::Itertools;

use crate::context::Name;
use crate::model::{CapacityParameter, DefId, FieldKey, Model, ScopeId};

/// One namespace level: a package segment or a type definition. A scope accumulates the
/// fields declared directly in it that contribute capacity parameters.
#[derive(Debug)]
pub struct Scope<'sc> {
    pub name: Name<'sc>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Fields whose parameters belong to this scope, in registration order.
    pub contributors: Vec<FieldKey>,
    /// The type definition this scope belongs to; `None` for package scopes.
    pub definition: Option<DefId>,
}

/// Arena of every scope created during a run. Each input file contributes its own tree.
#[derive(Debug, Default)]
pub struct ScopeForest<'sc> {
    scopes: Vec<Scope<'sc>>,
}

/// A reference would have to pass through a scope which is itself parameterized.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct QualificationError {
    pub scope: ScopeId,
}

impl<'sc> ScopeForest<'sc> {
    pub(crate) fn add(&mut self, name: Name<'sc>, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name,
            parent,
            children: Vec::new(),
            contributors: Vec::new(),
            definition: None,
        });
        if let Some(parent) = parent {
            self.scopes[parent.0].children.push(id);
        }
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope<'sc> {
        &self.scopes[id.0]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.scopes
            .iter()
            .enumerate()
            .filter(|(_, scope)| scope.parent.is_none())
            .map(|(index, _)| ScopeId(index))
    }

    pub(crate) fn attach_definition(&mut self, id: ScopeId, definition: DefId) {
        self.scopes[id.0].definition = Some(definition);
    }

    /// Append `field` to the scope's contributors. Parameter names are already unique per
    /// field, so there is nothing to deduplicate.
    pub(crate) fn register(&mut self, id: ScopeId, field: FieldKey) {
        self.scopes[id.0].contributors.push(field);
    }

    /// The chain of scopes from the root down to and including `id`.
    pub fn path(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut path = vec![id];
        let mut curr = self.get(id).parent;
        while let Some(parent) = curr {
            path.push(parent);
            curr = self.get(parent).parent;
        }
        path.reverse();
        path
    }

    pub fn path_names(&self, id: ScopeId) -> Vec<Name<'sc>> {
        self.path(id)
            .into_iter()
            .map(|scope| self.get(scope).name)
            .collect()
    }

    /// Dotted name of the scope, eg `geo.Polygon.Ring`.
    pub fn qualified_name(&self, id: ScopeId) -> String {
        self.path_names(id).iter().join(".")
    }
}

impl<'sc> Model<'sc> {
    /// Parameters contributed by fields declared directly in `scope`, in registration order.
    pub fn own_parameters(&self, scope: ScopeId) -> Vec<CapacityParameter<'sc>> {
        self.scopes
            .get(scope)
            .contributors
            .iter()
            .filter_map(|key| self.field(*key))
            .flat_map(|field| field.parameters().iter().copied())
            .collect()
    }

    /// Every ancestor's own parameters, root first, followed by this scope's own. An inner
    /// parameter may default to an outer one, so outer parameters must come first.
    pub fn flattened_parameters(&self, scope: ScopeId) -> Vec<CapacityParameter<'sc>> {
        self.scopes
            .path(scope)
            .into_iter()
            .flat_map(|ancestor| self.own_parameters(ancestor))
            .collect()
    }

    /// The shortest path naming `target` from inside `referencing`: the part of the target's
    /// path after the longest prefix it shares with the referencing scope. Scopes are compared
    /// by name since each input file builds its own tree.
    ///
    /// Fails if a scope on that path, other than the target itself, carries parameters of its
    /// own; such a reference can't be written without knowing those parameters.
    pub fn reduced_relative_path(
        &self,
        target: ScopeId,
        referencing: ScopeId,
    ) -> Result<Vec<ScopeId>, QualificationError> {
        let target_path = self.scopes.path(target);
        let referencing_path = self.scopes.path(referencing);

        let common = target_path[..target_path.len() - 1]
            .iter()
            .zip(referencing_path.iter())
            .take_while(|(t, r)| self.scopes.get(**t).name == self.scopes.get(**r).name)
            .count();
        let reduced = target_path[common..].to_vec();

        if let Some((_, intermediate)) = reduced.split_last() {
            if let Some(scope) = intermediate
                .iter()
                .find(|scope| !self.own_parameters(**scope).is_empty())
            {
                return Err(QualificationError { scope: *scope });
            }
        }

        Ok(reduced)
    }
}
