//! Manifest / remote listing diff.
//!
//! Decides, for every remote object and manifest entry, whether the key is
//! uploaded, skipped, or deleted. Modification time is the sole staleness
//! signal: a manifest entry must be strictly newer than the remote object to
//! be re-uploaded.

use crate::bundle::Manifest;
use crate::store::RemoteObject;

/// Compute the reconciliation diff.
///
/// Remote keys absent from the manifest are returned as the delete set.
/// Manifest entries that are not strictly newer than their remote
/// counterpart are pruned, so the entries remaining afterwards form the
/// upload set; entries never seen remotely are uploaded unconditionally.
pub fn compute_diff(manifest: &mut Manifest, remote: &[RemoteObject]) -> Vec<String> {
    let mut to_delete = Vec::new();

    for object in remote {
        match manifest.files.get(&object.key) {
            Some(modified) if *modified > object.last_modified => {
                // Bundle copy is strictly newer, keep it for upload
            }
            Some(_) => {
                // Not newer than the remote copy (ties included), skip the upload
                manifest.files.remove(&object.key);
            }
            None => to_delete.push(object.key.clone()),
        }
    }

    to_delete
}
