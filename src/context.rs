use std::cell::RefCell;
use std::collections::HashSet;

use bumpalo::Bump;

/// An interned name: type names, scope names, field names and capacity parameter names all
/// live in the run's arena and compare cheaply.
pub type Name<'sc> = &'sc str;

/// Backing storage for everything interned during one generation run. Drop it and every
/// `Name` handed out goes with it.
#[derive(Default)]
pub struct Arenas {
    names: Bump,
}

/// Per-run context. Create one for each request; nothing in here is shared between runs.
pub struct SchemaContext<'sc> {
    pub arenas: &'sc Arenas,
    names: InternedBySet<'sc>,
}

impl<'sc> SchemaContext<'sc> {
    pub fn new(arenas: &'sc Arenas) -> SchemaContext<'sc> {
        SchemaContext {
            arenas,
            names: InternedBySet::new(&arenas.names),
        }
    }

    pub fn intern(&self, name: &str) -> Name<'sc> {
        self.names.intern(name)
    }

    /// Intern the concatenation of `parts`, eg a parameter name assembled from message,
    /// field and role.
    pub fn intern_concat(&self, parts: &[&str]) -> Name<'sc> {
        self.intern(&parts.concat())
    }

    pub fn interned_count(&self) -> usize {
        self.names.len()
    }
}

/// Intern strings, deduplicating subsequent interns by content.
struct InternedBySet<'a> {
    arena: &'a Bump,
    set: RefCell<HashSet<&'a str>>,
}

impl<'a> InternedBySet<'a> {
    fn new(arena: &'a Bump) -> InternedBySet<'a> {
        InternedBySet {
            arena,
            set: RefCell::new(HashSet::default()),
        }
    }

    fn intern(&self, target: &str) -> &'a str {
        let mut set = self.set.borrow_mut();
        match set.get(target) {
            Some(existing) => *existing,
            None => {
                let it: &'a str = self.arena.alloc_str(target);
                set.insert(it);
                it
            }
        }
    }

    fn len(&self) -> usize {
        self.set.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates_by_content() {
        with_context!(cx, {
            let a = cx.intern("geo.Point");
            let b = cx.intern(&String::from("geo.Point"));
            assert!(std::ptr::eq(a, b));
            assert_eq!(cx.interned_count(), 1);
        });
    }

    #[test]
    fn concat_builds_one_name() {
        with_context!(cx, {
            let name = cx.intern_concat(&["Label", "_", "text", "_", "LENGTH"]);
            assert_eq!(name, "Label_text_LENGTH");
            assert!(std::ptr::eq(name, cx.intern("Label_text_LENGTH")));
        });
    }
}
