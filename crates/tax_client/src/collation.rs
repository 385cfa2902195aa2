use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use tracing::warn;

fn swedish_collator() -> Option<Collator> {
    match Collator::try_new(&locale!("sv").into(), CollatorOptions::new()) {
        Ok(collator) => Some(collator),
        Err(err) => {
            warn!(error = ?err, "swedish collation unavailable, sorting by code point");
            None
        }
    }
}

/// Stable sort by display name in Swedish alphabetical order (Å, Ä and Ö
/// after Z).
pub(crate) fn sort_by_name<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    let collator = swedish_collator();
    items.sort_by(|a, b| compare(collator.as_ref(), name(a), name(b)));
}

fn compare(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    match collator {
        Some(collator) => collator.compare(a, b),
        None => a.cmp(b),
    }
}
