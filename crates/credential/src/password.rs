//! Password generation for new users
//!
//! Used when a [`NewUserRequest`](crate::NewUserRequest) asks for
//! [`PasswordSource::Generate`](crate::PasswordSource::Generate).

use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

use crate::core::{CredentialError, CredentialResult};
use crate::utils::SecretString;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"-";

/// Produces passwords for newly created users
pub trait PasswordGenerator: Send + Sync + fmt::Debug {
    /// Generate one password
    fn generate(&self) -> CredentialResult<SecretString>;
}

/// Random password with one character from each class at least
///
/// The default is 20 characters from `[A-Za-z0-9-]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    length: usize,
}

impl PasswordPolicy {
    /// Length of generated passwords by default
    pub const DEFAULT_LENGTH: usize = 20;

    /// Policy for passwords of `length` characters
    pub fn with_length(length: usize) -> Self {
        Self { length }
    }

    /// Configured length
    pub fn length(&self) -> usize {
        self.length
    }

    fn classes() -> [&'static [u8]; 4] {
        [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS]
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::with_length(Self::DEFAULT_LENGTH)
    }
}

impl PasswordGenerator for PasswordPolicy {
    fn generate(&self) -> CredentialResult<SecretString> {
        let classes = Self::classes();
        if self.length < classes.len() {
            return Err(CredentialError::PasswordGeneration {
                reason: format!(
                    "length {} cannot fit one character of each of {} classes",
                    self.length,
                    classes.len()
                ),
            });
        }

        let alphabet: Vec<u8> = classes.concat();
        let mut rng = rand::thread_rng();
        let mut bytes = Vec::with_capacity(self.length);

        for class in classes {
            bytes.push(class[rng.gen_range(0..class.len())]);
        }
        while bytes.len() < self.length {
            bytes.push(alphabet[rng.gen_range(0..alphabet.len())]);
        }
        bytes.shuffle(&mut rng);

        let password = String::from_utf8(bytes).map_err(|e| CredentialError::PasswordGeneration {
            reason: e.to_string(),
        })?;
        Ok(SecretString::new(password))
    }
}
