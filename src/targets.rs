//! Target resolution
//!
//! Websites are given either as a bare URL or as `label::URL`. The label is
//! what ends up as the `website` tag in storage; without one, the URL itself
//! is used as label.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::actors::messages::Target;

/// Separator between label and address
pub const LABEL_SEPARATOR: &str = "::";

/// Split a `label::address` entry into `(label, address)`
///
/// Entries without a separator yield `(input, input)`. Entries with more than
/// one separator are rejected: a warning is logged and both parts degrade to
/// the original string.
pub fn decompose(input: &str) -> (String, String) {
    let parts: Vec<&str> = input.split(LABEL_SEPARATOR).collect();

    match parts.as_slice() {
        [label, address] => (label.to_string(), address.to_string()),
        [_] => (input.to_string(), input.to_string()),
        _ => {
            warn!("bad url {input}: more than one '{LABEL_SEPARATOR}' separator");
            (input.to_string(), input.to_string())
        }
    }
}

/// Merge URL entries from the command line and the configuration file into
/// the list of targets handed to the dispatcher
///
/// Command-line entries come first. Targets are de-duplicated by address,
/// keeping the first occurrence (and therefore its label).
pub fn resolve_targets<I, S>(entries: I) -> Vec<Arc<Target>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut targets = vec![];

    for entry in entries {
        let (label, address) = decompose(entry.as_ref());

        if !seen.insert(address.clone()) {
            trace!("skipping duplicate target {address}");
            continue;
        }

        targets.push(Arc::new(Target::new(label, address)));
    }

    targets
}
