//! # Reference Expansion
//!
//! Links every `$ref` in a document to the node it names. Expansion follows
//! links into other documents, expanding each document at most once, so a
//! cyclic reference graph (a recursive tree definition, two documents that
//! point at each other) terminates.
//!
//! Links are identities, not owned nodes, so expansion never copies a
//! target into the referencing tree.
//!
//! A chain of nodes that consist only of `$ref` hops and returns to where it
//! started can never consume payload during validation; such chains are
//! rejected here as [`UnresolvableReferenceError::Cycle`].

use std::collections::{HashMap, HashSet};

use jsonm_core::{SchemaId, UnresolvableReferenceError};

use crate::store::DocumentStore;

/// What an expansion pass touched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpansionReport {
    /// Locators expanded, in the order they were processed.
    pub documents: Vec<String>,
    /// Number of `$ref` occurrences linked.
    pub references: usize,
}

/// Expand the document at `locator` and every document it reaches.
///
/// # Errors
///
/// Returns [`UnresolvableReferenceError`] on the first reference that cannot
/// be resolved or that closes a `$ref`-only cycle. The store may be partially
/// expanded when this happens; callers treat it as fatal.
pub fn expand(
    locator: &str,
    store: &mut DocumentStore,
) -> Result<ExpansionReport, UnresolvableReferenceError> {
    let mut expander = Expander::default();
    expander.run(locator, store)?;
    Ok(expander.report)
}

/// Expand every document in the store.
///
/// # Errors
///
/// Same as [`expand`].
pub fn expand_all(store: &mut DocumentStore) -> Result<ExpansionReport, UnresolvableReferenceError> {
    let locators: Vec<String> = store.locators().into_iter().map(str::to_string).collect();
    let mut expander = Expander::default();
    for locator in &locators {
        expander.run(locator, store)?;
    }
    Ok(expander.report)
}

#[derive(Default)]
struct Expander {
    expanded: HashSet<String>,
    report: ExpansionReport,
}

impl Expander {
    fn run(&mut self, locator: &str, store: &mut DocumentStore) -> Result<(), UnresolvableReferenceError> {
        let mut pending = vec![locator.to_string()];

        while let Some(current) = pending.pop() {
            if self.expanded.contains(&current) {
                continue;
            }
            let root = store.document(&current).ok_or_else(|| {
                UnresolvableReferenceError::DocumentNotFound {
                    reference: current.clone(),
                    from: SchemaId::document(current.clone()),
                    document: current.clone(),
                }
            })?;

            let mut occurrences: Vec<(SchemaId, String)> = Vec::new();
            root.walk(&mut |node| {
                if let Some(reference) = node.reference() {
                    occurrences.push((node.id().clone(), reference.raw().to_string()));
                }
            });

            let mut links: HashMap<SchemaId, SchemaId> = HashMap::with_capacity(occurrences.len());
            for (from, raw) in occurrences {
                let target = store.resolve_id(&raw, &from)?;
                reject_ref_cycle(store, &from, &target)?;
                if !self.expanded.contains(target.locator()) && target.locator() != current {
                    pending.push(target.locator().to_string());
                }
                links.insert(from, target);
            }

            let linked = links.len();
            if let Some(root) = store.document_mut(&current) {
                root.walk_mut(&mut |node| {
                    let id = node.id.clone();
                    if let (Some(reference), Some(target)) = (node.reference.as_mut(), links.get(&id)) {
                        reference.link(target.clone());
                    }
                });
            }

            tracing::debug!(locator = %current, references = linked, "expanded schema references");
            self.expanded.insert(current.clone());
            self.report.documents.push(current);
            self.report.references += linked;
        }
        Ok(())
    }
}

/// Follow `$ref` hops starting at `target`; fail if they lead back to any
/// node already on the chain.
fn reject_ref_cycle(
    store: &DocumentStore,
    from: &SchemaId,
    target: &SchemaId,
) -> Result<(), UnresolvableReferenceError> {
    let mut chain = vec![from.clone()];
    let mut current = target.clone();
    loop {
        if chain.contains(&current) {
            chain.push(current);
            return Err(UnresolvableReferenceError::Cycle { chain });
        }
        let Some(reference) = store.get(&current).and_then(|n| n.reference()) else {
            return Ok(());
        };
        let next = store.resolve_id(reference.raw(), &current)?;
        chain.push(current);
        current = next;
    }
}
