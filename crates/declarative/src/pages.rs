//! Folding paginated listings into an actual-state mapping

use std::collections::BTreeMap;

/// Fold a forward-only sequence of pages into a single mapping keyed by name
///
/// The first failing page aborts the fold. If a name repeats across pages the
/// later entry wins.
pub fn fold_pages<T, E, I, F>(pages: I, key: F) -> Result<BTreeMap<String, T>, E>
where
    I: IntoIterator<Item = Result<Vec<T>, E>>,
    F: Fn(&T) -> String,
{
    let mut actual = BTreeMap::new();
    for (index, page) in pages.into_iter().enumerate() {
        let page = page?;
        log::trace!("folding page {} ({} entries)", index + 1, page.len());
        for item in page {
            actual.insert(key(&item), item);
        }
    }
    Ok(actual)
}
