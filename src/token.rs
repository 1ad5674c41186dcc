//! Process-unique marker tokens
//!
//! A scratch directory is "owned" by whichever process instance wrote a
//! marker file named after its token into it. The token is generated from
//! the operating system's CSPRNG the first time it is requested and then
//! reused for the rest of the process, so reopening a directory this process
//! already claimed is recognised.

use std::sync::OnceLock;

use rand::rngs::OsRng;
use rand::RngCore;

/// Length of a token in hexadecimal characters.
pub const TOKEN_LEN: usize = 16;

const MARKER_PREFIX: &str = ".stagehand-";

static PROCESS_TOKEN: OnceLock<String> = OnceLock::new();

/// The token for this process. Stable for the process lifetime.
pub fn process_token() -> &'static str {
    PROCESS_TOKEN.get_or_init(generate_token)
}

/// A fresh random token of [`TOKEN_LEN`] lowercase hex characters.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN / 2];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// File name of the marker for `token`.
pub fn marker_file_name(token: &str) -> String {
    format!("{}{}", MARKER_PREFIX, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_is_lowercase_hex() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_process_token_is_stable() {
        assert_eq!(process_token(), process_token());
        assert_eq!(process_token().len(), TOKEN_LEN);
    }

    #[test]
    fn test_marker_file_name() {
        assert_eq!(marker_file_name("0123abcd"), ".stagehand-0123abcd");
    }
}
