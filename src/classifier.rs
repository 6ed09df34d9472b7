//! Selection of credentials for a view.
//!
//! Encryption credentials (and everything under [`Filter::Unfiltered`]) are
//! always kept so historical data stays decryptable. Device, Signature and
//! Authentication credentials are each reduced to the ones sharing the latest
//! `not_before`.

use crate::credential::{Category, Credential};
use crate::filter::Filter;

/// Credentials sharing the greatest `not_before` seen so far.
#[derive(Debug, Default)]
struct LatestBucket<'a> {
    not_before: i64,
    items: Vec<&'a Credential>,
}

impl<'a> LatestBucket<'a> {
    fn accumulate(&mut self, credential: &'a Credential) {
        if self.items.is_empty() || credential.not_before > self.not_before {
            self.items.clear();
            self.items.push(credential);
            self.not_before = credential.not_before;
        } else if credential.not_before == self.not_before {
            self.items.push(credential);
        }
    }
}

/// Returns the credentials `filter` selects from a store snapshot.
///
/// Order: unconditionally retained credentials in store order, then the
/// Device, Signature and Authentication survivors.
pub fn select(credentials: &[Credential], filter: Filter) -> Vec<&Credential> {
    let mut retained = Vec::new();
    let mut device = LatestBucket::default();
    let mut signature = LatestBucket::default();
    let mut authentication = LatestBucket::default();

    for credential in credentials {
        if !filter.matches(credential.category) {
            continue;
        }

        if credential.category == Category::Encryption || filter.retains_all() {
            retained.push(credential);
            continue;
        }

        match credential.category {
            Category::Device => device.accumulate(credential),
            Category::Signature => signature.accumulate(credential),
            Category::Authentication => authentication.accumulate(credential),
            Category::Encryption | Category::Unknown => {}
        }
    }

    log::debug!(
        "Selected for {}: {} retained, {} device, {} signature, {} authentication",
        filter,
        retained.len(),
        device.items.len(),
        signature.items.len(),
        authentication.items.len()
    );

    retained.extend(device.items);
    retained.extend(signature.items);
    retained.extend(authentication.items);
    retained
}
