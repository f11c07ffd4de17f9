//! Binary Merkle root over a batch of record hashes.

use sha2::{Digest, Sha256};

/// Compute the binary Merkle root of an ordered batch of hex hashes.
///
/// Adjacent entries pair left-to-right at each level; an odd tail pairs with
/// itself (duplication, not zero-padding).  The pair hash is
/// `SHA-256(left ‖ right)` over the decoded bytes.  An empty batch — or any
/// entry that is not valid hex — yields the empty string.
pub fn merkle_root(hashes: &[String]) -> String {
    if hashes.is_empty() {
        return String::new();
    }
    let mut level: Vec<Vec<u8>> = Vec::with_capacity(hashes.len());
    for h in hashes {
        match hex::decode(h) {
            Ok(bytes) => level.push(bytes),
            Err(_) => return String::new(),
        }
    }
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            next.push(hash_pair(left, right));
        }
        level = next;
    }
    hex::encode(&level[0])
}

fn hash_pair(left: &[u8], right: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().to_vec()
}
