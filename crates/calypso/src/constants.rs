//! Constants used in Calypso operations
//!
//! Class bytes, instruction codes, FCI tags and the default key identifiers
//! of the three session access levels.

/// Command classes
pub mod cla {
    /// ISO 7816 class, Calypso revision 3 POs and AID selection
    pub const ISO7816: u8 = 0x00;
    /// Calypso revision 2.4 POs and S1D SAMs
    pub const CALYPSO_LEGACY: u8 = 0x94;
    /// C1 and S1E SAMs
    pub const SAM: u8 = 0x80;
}

/// Instruction codes
pub mod ins {
    /// SELECT (by AID)
    pub const SELECT: u8 = 0xA4;
    /// GET DATA
    pub const GET_DATA: u8 = 0xCA;
    /// OPEN SECURE SESSION
    pub const OPEN_SESSION: u8 = 0x8A;
    /// CLOSE SECURE SESSION
    pub const CLOSE_SESSION: u8 = 0x8E;
    /// READ RECORD(S), also used for the ratification frame
    pub const READ_RECORDS: u8 = 0xB2;
    /// UPDATE RECORD
    pub const UPDATE_RECORD: u8 = 0xDC;
    /// WRITE RECORD
    pub const WRITE_RECORD: u8 = 0xD2;
    /// APPEND RECORD
    pub const APPEND_RECORD: u8 = 0xE2;
    /// INCREASE
    pub const INCREASE: u8 = 0x32;
    /// DECREASE
    pub const DECREASE: u8 = 0x30;

    /// SELECT DIVERSIFIER
    pub const SELECT_DIVERSIFIER: u8 = 0x14;
    /// GET CHALLENGE
    pub const GET_CHALLENGE: u8 = 0x84;
    /// DIGEST INIT
    pub const DIGEST_INIT: u8 = 0x8A;
    /// DIGEST UPDATE and DIGEST UPDATE MULTIPLE
    pub const DIGEST_UPDATE: u8 = 0x8C;
    /// DIGEST CLOSE
    pub const DIGEST_CLOSE: u8 = 0x8E;
    /// DIGEST AUTHENTICATE
    pub const DIGEST_AUTHENTICATE: u8 = 0x82;
    /// GIVE RANDOM
    pub const GIVE_RANDOM: u8 = 0x86;
}

/// SELECT parameters
pub mod select {
    /// P1: select by DF name
    pub const BY_NAME: u8 = 0x04;
    /// P2: first or only occurrence
    pub const FIRST_OCCURRENCE: u8 = 0x00;
    /// P2: next occurrence
    pub const NEXT_OCCURRENCE: u8 = 0x02;
}

/// BER-TLV tags found in a Calypso FCI
pub mod tags {
    /// FCI template
    pub const FCI_TEMPLATE: &[u8] = &[0x6F];
    /// DF name
    pub const DF_NAME: &[u8] = &[0x84];
    /// FCI proprietary template
    pub const FCI_PROPRIETARY: &[u8] = &[0xA5];
    /// FCI issuer discretionary data
    pub const FCI_DISCRETIONARY: &[u8] = &[0xBF, 0x0C];
    /// Application serial number
    pub const APPLICATION_SERIAL_NUMBER: &[u8] = &[0xC7];
    /// Discretionary data (startup information)
    pub const DISCRETIONARY_DATA: &[u8] = &[0x53];
}

/// GET DATA tag of the FCI (P1 P2)
pub const FCI_DATA_TAG: u16 = 0x006F;

/// Default key identifiers per access level
pub mod kif {
    /// Personalization key
    pub const PERSONALIZATION: u8 = 0x21;
    /// Load key
    pub const LOAD: u8 = 0x27;
    /// Debit key
    pub const DEBIT: u8 = 0x30;
    /// KIF value meaning "not provided by the card"
    pub const UNDEFINED: u8 = 0xFF;
}

/// Length of a PO application serial number
pub const SERIAL_NUMBER_LENGTH: usize = 8;

/// Length of the FCI startup information
pub const STARTUP_INFO_LENGTH: usize = 7;

/// Largest SFI value
pub const MAX_SFI: u8 = 30;

/// Largest record number encodable in the Open Secure Session P1 byte
pub const MAX_OPEN_SESSION_RECORD: u8 = 31;

/// Largest counter value
pub const MAX_COUNTER_VALUE: u32 = 0x00FF_FFFF;
