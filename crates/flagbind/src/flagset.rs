//! Flag table built from the field bindings: alias lookup, canonical names,
//! and occurrence counting.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::registry::{Acceptor, Binding};
use crate::value::{Kind, ValueError};

struct Entry<'a> {
    canonical: String,
    field: String,
    acceptor: Box<dyn Acceptor + 'a>,
}

/// Counts successful sets before handing the value to the wrapped acceptor.
struct Counting<'a> {
    inner: Box<dyn Acceptor + 'a>,
    hits: Rc<Cell<usize>>,
}

impl Acceptor for Counting<'_> {
    fn kind(&self) -> Kind {
        self.inner.kind()
    }

    fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        self.inner.set(raw)?;
        self.hits.set(self.hits.get() + 1);
        Ok(())
    }

    fn set_from_env(&mut self, raw: &str) -> Result<(), ValueError> {
        self.inner.set_from_env(raw)
    }

    fn render(&self) -> String {
        self.inner.render()
    }
}

/// Per-canonical-name occurrence counters.
#[derive(Default)]
pub(crate) struct OccurrenceTracker {
    counters: Vec<(String, Rc<Cell<usize>>)>,
}

impl OccurrenceTracker {
    fn wrap<'a>(&mut self, canonical: &str, inner: Box<dyn Acceptor + 'a>) -> Box<dyn Acceptor + 'a> {
        let hits = Rc::new(Cell::new(0));
        self.counters.push((canonical.to_owned(), Rc::clone(&hits)));
        Box::new(Counting { inner, hits })
    }

    /// Counts of the flags set at least once, or `None` if none was.
    pub(crate) fn report(&self) -> Option<BTreeMap<String, usize>> {
        let counts: BTreeMap<String, usize> = self
            .counters
            .iter()
            .filter(|(_, hits)| hits.get() > 0)
            .map(|(name, hits)| (name.clone(), hits.get()))
            .collect();
        (!counts.is_empty()).then_some(counts)
    }
}

/// What one scan produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Report {
    pub(crate) args: Vec<String>,
    pub(crate) flags: BTreeSet<String>,
    pub(crate) counts: Option<BTreeMap<String, usize>>,
}

/// The flags of one target, keyed by every declared alias.
pub(crate) struct FlagSet<'a> {
    entries: Vec<Entry<'a>>,
    aliases: IndexMap<String, usize>,
    tracker: Option<OccurrenceTracker>,
    actual: BTreeSet<String>,
}

impl<'a> FlagSet<'a> {
    /// Build the flag table. Fields without aliases are skipped.
    ///
    /// # Panics
    ///
    /// Panics if an alias is declared twice, on different fields or on the
    /// same one: the binding table is wrong and no argument can be trusted.
    pub(crate) fn bind(bindings: Vec<Binding<'a>>, count: bool) -> Self {
        let mut set = FlagSet {
            entries: Vec::with_capacity(bindings.len()),
            aliases: IndexMap::new(),
            tracker: count.then(OccurrenceTracker::default),
            actual: BTreeSet::new(),
        };

        for binding in bindings {
            let Some(canonical) = binding.meta.canonical() else {
                continue;
            };
            let canonical = canonical.to_owned();
            let index = set.entries.len();
            for alias in binding.meta.aliases() {
                if let Some(&previous) = set.aliases.get(alias.as_str()) {
                    panic!(
                        "flag redefined: {alias} (field {} already declares it, redeclared on field {})",
                        set.entries
                            .get(previous)
                            .map_or(binding.meta.name(), |entry| entry.field.as_str()),
                        binding.meta.name(),
                    );
                }
                set.aliases.insert(alias.clone(), index);
            }

            tracing::trace!(
                field = binding.meta.name(),
                flag = %canonical,
                kind = %binding.acceptor.kind(),
                repeated = binding.repeated,
                default = %binding.acceptor.render(),
                "bound flag"
            );

            let acceptor = match set.tracker.as_mut() {
                Some(tracker) => tracker.wrap(&canonical, binding.acceptor),
                None => binding.acceptor,
            };
            set.entries.push(Entry {
                canonical,
                field: binding.meta.name().to_owned(),
                acceptor,
            });
        }

        tracing::debug!(
            fields = set.entries.len(),
            aliases = set.aliases.len(),
            counting = set.tracker.is_some(),
            "flag table built"
        );
        set
    }

    pub(crate) fn lookup(&self, alias: &str) -> Option<usize> {
        self.aliases.get(alias).copied()
    }

    pub(crate) fn is_bool(&self, index: usize) -> bool {
        self.entries[index].acceptor.kind() == Kind::Bool
    }

    pub(crate) fn canonical(&self, index: usize) -> &str {
        &self.entries[index].canonical
    }

    /// Apply a command-line value and record the flag as explicitly set.
    pub(crate) fn set(&mut self, index: usize, raw: &str) -> Result<(), ValueError> {
        let entry = &mut self.entries[index];
        entry.acceptor.set(raw)?;
        tracing::trace!(flag = %entry.canonical, value = raw, "flag set");
        self.actual.insert(entry.canonical.clone());
        Ok(())
    }

    pub(crate) fn finish(self, args: Vec<String>) -> Report {
        Report {
            args,
            counts: self.tracker.as_ref().and_then(OccurrenceTracker::report),
            flags: self.actual,
        }
    }
}
