use crate::models::{Author, Paper};
use crate::registry::IdentityRegistry;
use crate::relation::RelationLog;
use crate::store::KeyedStore;

/// All state the workers share during a run: one registry and one store per
/// entity kind, and the paper-author relation log.
#[derive(Default)]
pub struct Catalog {
    pub paper_ids: IdentityRegistry,
    pub author_ids: IdentityRegistry,
    pub papers: KeyedStore<Paper>,
    pub authors: KeyedStore<Author>,
    pub authorships: RelationLog,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }
}
