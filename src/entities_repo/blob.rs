// BLOB version prefix helpers. [version: u8][payload].

pub(super) const BLOB_VERSION: u8 = 1;

pub(super) fn with_version_prefix(version: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(version);
    out.extend_from_slice(&payload);
    out
}

/// Payload after the version byte; `None` for an empty blob or an unknown version.
pub(super) fn blob_payload(bytes: &[u8], expected_version: u8) -> Option<&[u8]> {
    match bytes.split_first() {
        Some((v, rest)) if *v == expected_version => Some(rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_and_strip() {
        let b = with_version_prefix(BLOB_VERSION, vec![7, 8]);
        assert_eq!(b, vec![BLOB_VERSION, 7, 8]);
        assert_eq!(blob_payload(&b, BLOB_VERSION), Some(&[7u8, 8][..]));
    }

    #[test]
    fn unknown_version_or_empty_is_rejected() {
        assert_eq!(blob_payload(&[9, 1, 2], BLOB_VERSION), None);
        assert_eq!(blob_payload(&[], BLOB_VERSION), None);
    }
}
