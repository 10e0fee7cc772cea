use super::{Change, StateSnapshot};

/// Pairs of `next` whose digest is absent from or different in `previous`.
///
/// Tags only present in `previous` are ignored. The result is ordered by
/// repository, then tag.
pub fn diff(previous: &StateSnapshot, next: &StateSnapshot) -> Vec<Change> {
    next.iter()
        .flat_map(|(repository, tags)| {
            let known = previous.get(repository);
            tags.iter()
                .filter(move |(tag, digest)| {
                    known.and_then(|k| k.get(tag.as_str())) != Some(*digest)
                })
                .map(move |(tag, _)| Change::new(repository.as_str(), tag.as_str()))
        })
        .collect()
}
