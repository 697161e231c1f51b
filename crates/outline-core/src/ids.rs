use std::collections::HashSet;

/// Source of fresh node ids, handed to every operation that creates nodes.
pub trait IdGenerator {
    fn block_id(&mut self) -> String;

    fn list_id(&mut self) -> String {
        format!("{}-list", self.block_id())
    }
}

/// Deterministic ids: `block-1`, `block-2`, ... and `list-1`, `list-2`, ...
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    prefix: Option<String>,
    next_block: u64,
    next_list: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes every id, e.g. `draft/block-1`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Continues numbering after the given counts, for trees that already
    /// hold ids from this generator.
    pub fn starting_after(blocks: u64, lists: u64) -> Self {
        Self {
            prefix: None,
            next_block: blocks,
            next_list: lists,
        }
    }

    fn format(&self, kind: &str, n: u64) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{kind}-{n}"),
            None => format!("{kind}-{n}"),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn block_id(&mut self) -> String {
        self.next_block += 1;
        self.format("block", self.next_block)
    }

    fn list_id(&mut self) -> String {
        self.next_list += 1;
        self.format("list", self.next_list)
    }
}

/// Random v4 uuids, for ids that must not collide across replicas.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn block_id(&mut self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    fn list_id(&mut self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Wraps another generator and skips any id already taken, e.g. by blocks
/// loaded from a document the wrapped generator did not produce.
pub struct UniqueIds<'a> {
    inner: &'a mut dyn IdGenerator,
    taken: HashSet<String>,
}

impl<'a> UniqueIds<'a> {
    const MAX_ATTEMPTS: usize = 64;

    pub fn new(inner: &'a mut dyn IdGenerator, taken: HashSet<String>) -> Self {
        Self { inner, taken }
    }

    fn fresh(&mut self, mut next: impl FnMut(&mut dyn IdGenerator) -> String) -> String {
        for _ in 0..Self::MAX_ATTEMPTS {
            let id = next(&mut *self.inner);
            if self.taken.insert(id.clone()) {
                return id;
            }
            tracing::debug!(%id, "skipping taken id");
        }
        // The wrapped generator keeps repeating itself.
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.taken.insert(id.clone());
        id
    }
}

impl IdGenerator for UniqueIds<'_> {
    fn block_id(&mut self) -> String {
        self.fresh(|ids| ids.block_id())
    }

    fn list_id(&mut self) -> String {
        self.fresh(|ids| ids.list_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_count_blocks_and_lists_separately() {
        let mut ids = SequentialIds::new();
        assert_eq!(ids.block_id(), "block-1");
        assert_eq!(ids.list_id(), "list-1");
        assert_eq!(ids.block_id(), "block-2");

        let mut ids = SequentialIds::with_prefix("draft");
        assert_eq!(ids.block_id(), "draft/block-1");
    }

    #[test]
    fn unique_ids_skip_taken_ids() {
        let mut inner = SequentialIds::new();
        let taken = ["block-1", "block-2", "list-1"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut ids = UniqueIds::new(&mut inner, taken);
        assert_eq!(ids.block_id(), "block-3");
        assert_eq!(ids.block_id(), "block-4");
        assert_eq!(ids.list_id(), "list-2");
    }

    #[test]
    fn random_ids_do_not_repeat() {
        let mut ids = RandomIds;
        assert_ne!(ids.block_id(), ids.block_id());
    }
}
