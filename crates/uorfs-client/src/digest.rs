//! Digest parsing and content verification.

use sha2::{Digest as _, Sha256, Sha512};

use crate::error::{ClientError, ClientResult};

/// Splits `<algorithm>:<hex>` and checks the encoded part.
pub fn parse(digest: &str) -> ClientResult<(&str, &str)> {
    let (algorithm, encoded) = digest
        .split_once(':')
        .ok_or_else(|| ClientError::InvalidDigest(digest.to_string()))?;
    let expected_len = match algorithm {
        "sha256" => 64,
        "sha512" => 128,
        other => return Err(ClientError::Unsupported(format!("digest algorithm {other}"))),
    };
    let valid = encoded.len() == expected_len
        && encoded
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !valid {
        return Err(ClientError::InvalidDigest(digest.to_string()));
    }
    Ok((algorithm, encoded))
}

/// `sha256:<hex>` of `content`.
pub fn sha256(content: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(content)))
}

/// Checks that `content` hashes to `digest`.
pub fn verify(digest: &str, content: &[u8]) -> ClientResult<()> {
    let (algorithm, encoded) = parse(digest)?;
    let actual = match algorithm {
        "sha512" => hex::encode(Sha512::digest(content)),
        _ => hex::encode(Sha256::digest(content)),
    };
    if actual != encoded {
        return Err(ClientError::DigestMismatch {
            expected: digest.to_string(),
            actual: format!("{algorithm}:{actual}"),
        });
    }
    Ok(())
}
