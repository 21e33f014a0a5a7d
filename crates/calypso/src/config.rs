//! Configuration options for secure sessions

use crate::constants::kif;

/// Length of the terminal and card session signatures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureLength {
    /// 4 byte signatures
    #[default]
    Short,
    /// 8 byte signatures
    Long,
}

impl SignatureLength {
    /// Length in bytes
    pub const fn length(self) -> u8 {
        match self {
            Self::Short => 4,
            Self::Long => 8,
        }
    }
}

/// How the PO is reached by the reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommunicationMode {
    /// Contact interface, the session is ratified on closing
    #[default]
    Contact,
    /// Contactless interface, ratification may be deferred
    Contactless,
}

/// How exchanges are fed to the SAM digest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DigestUpdateMode {
    /// One DIGEST UPDATE for the command, one for the response
    #[default]
    PerSide,
    /// One DIGEST UPDATE MULTIPLE per exchange when it fits a single frame
    Multiple,
}

/// Access level of a secure session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    /// Personalization key
    Personalization,
    /// Load key
    Load,
    /// Debit key
    Debit,
}

impl AccessLevel {
    /// Key index sent in OPEN SECURE SESSION
    pub const fn key_index(self) -> u8 {
        match self {
            Self::Personalization => 1,
            Self::Load => 2,
            Self::Debit => 3,
        }
    }

    const fn slot(self) -> usize {
        self.key_index() as usize - 1
    }
}

/// Configuration options for a [`PoTransaction`](crate::PoTransaction)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Length of the session signatures
    pub signature_length: SignatureLength,

    /// Interface the PO is reached through
    pub communication_mode: CommunicationMode,

    /// Digest feeding strategy
    pub digest_update_mode: DigestUpdateMode,

    /// Default KIF per access level, used when the PO does not return one
    pub default_kif: [u8; 3],

    /// Work key record number in the SAM per access level
    pub work_key_record: [Option<u8>; 3],

    /// Whether the SAM expects encrypted DIGEST UPDATE frames
    pub encrypted_digest: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            signature_length: SignatureLength::Short,
            communication_mode: CommunicationMode::Contact,
            digest_update_mode: DigestUpdateMode::PerSide,
            default_kif: [kif::PERSONALIZATION, kif::LOAD, kif::DEBIT],
            work_key_record: [None; 3],
            encrypted_digest: false,
        }
    }
}

impl SessionConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signature length
    pub const fn with_signature_length(mut self, length: SignatureLength) -> Self {
        self.signature_length = length;
        self
    }

    /// Set the communication mode
    pub const fn with_communication_mode(mut self, mode: CommunicationMode) -> Self {
        self.communication_mode = mode;
        self
    }

    /// Set the digest update mode
    pub const fn with_digest_update_mode(mut self, mode: DigestUpdateMode) -> Self {
        self.digest_update_mode = mode;
        self
    }

    /// Set the default KIF of an access level
    pub const fn with_default_kif(mut self, level: AccessLevel, kif: u8) -> Self {
        self.default_kif[level.slot()] = kif;
        self
    }

    /// Use the work key stored at this SAM record for an access level
    pub const fn with_work_key_record(mut self, level: AccessLevel, record: u8) -> Self {
        self.work_key_record[level.slot()] = Some(record);
        self
    }

    /// Set whether DIGEST UPDATE frames are flagged as encrypted
    pub const fn with_encrypted_digest(mut self, encrypted: bool) -> Self {
        self.encrypted_digest = encrypted;
        self
    }

    /// Default KIF of an access level
    pub const fn default_kif(&self, level: AccessLevel) -> u8 {
        self.default_kif[level.slot()]
    }

    /// Work key record of an access level, if configured
    pub const fn work_key_record(&self, level: AccessLevel) -> Option<u8> {
        self.work_key_record[level.slot()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.signature_length.length(), 4);
        assert_eq!(config.default_kif(AccessLevel::Personalization), 0x21);
        assert_eq!(config.default_kif(AccessLevel::Load), 0x27);
        assert_eq!(config.default_kif(AccessLevel::Debit), 0x30);
        assert_eq!(config.work_key_record(AccessLevel::Debit), None);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new()
            .with_signature_length(SignatureLength::Long)
            .with_communication_mode(CommunicationMode::Contactless)
            .with_default_kif(AccessLevel::Load, 0x28)
            .with_work_key_record(AccessLevel::Debit, 0x0C);
        assert_eq!(config.signature_length.length(), 8);
        assert_eq!(config.default_kif(AccessLevel::Load), 0x28);
        assert_eq!(config.work_key_record(AccessLevel::Debit), Some(0x0C));
        assert_eq!(AccessLevel::Debit.key_index(), 3);
    }
}
