//! Client folder-name codec.
//!
//! A client folder is named `"{name} {identifier}"`. Identifiers in this
//! domain are whitespace-free tokens, so the last whitespace-delimited
//! token of a folder name is always the identifier and everything before
//! it is the name.
//!
//! # Example
//!
//! ```rust
//! use kyc_intake_core::folder_name::{decode, encode};
//!
//! let folder = encode("Jane Doe", "123");
//! assert_eq!(folder, "Jane Doe 123");
//!
//! let identity = decode(&folder).unwrap();
//! assert_eq!(identity.name, "Jane Doe");
//! assert_eq!(identity.identifier, "123");
//! ```

use serde::Serialize;
use thiserror::Error;

/// Characters that are not allowed in folder names on common filesystems.
pub const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FolderNameError {
    #[error("folder name '{0}' is not in the expected '[Name] [Identifier]' format")]
    Malformed(String),
}

/// The search patterns recovered from a client folder name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientIdentity {
    pub name: String,
    pub identifier: String,
}

/// Replace every forbidden character with `_`.
pub fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Encode a client's name and identifier as a folder name.
pub fn encode(name: &str, identifier: &str) -> String {
    format!("{} {}", sanitize(name), sanitize(identifier))
}

/// Split a folder name back into name and identifier.
///
/// Whitespace runs inside the name collapse to single spaces.
pub fn decode(folder_name: &str) -> Result<ClientIdentity, FolderNameError> {
    let tokens: Vec<&str> = folder_name.split_whitespace().collect();
    match tokens.split_last() {
        Some((identifier, name_parts)) if !name_parts.is_empty() => Ok(ClientIdentity {
            name: name_parts.join(" "),
            identifier: identifier.to_string(),
        }),
        _ => Err(FolderNameError::Malformed(folder_name.to_string())),
    }
}
