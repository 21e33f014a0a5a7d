//! Calypso PO identification from its FCI
//!
//! The FCI returned on selection (or by GET DATA) has this layout:
//!
//! ```text
//! 6F  FCI template
//!   84  DF name
//!   A5  proprietary template
//!     BF0C  issuer discretionary data
//!       C7  application serial number (8)
//!       53  startup information (7)
//! ```

use std::fmt;

use bytes::Bytes;
use derive_more::Deref;
use iso7816_tlv::ber::{Tlv, Value};

use crate::{
    Error, Result,
    constants::{SERIAL_NUMBER_LENGTH, STARTUP_INFO_LENGTH, tags},
    revision::PoRevision,
};

/// Application serial number, also the SAM diversifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deref)]
pub struct SerialNumber([u8; SERIAL_NUMBER_LENGTH]);

impl SerialNumber {
    /// Wrap raw serial number bytes
    pub const fn new(bytes: [u8; SERIAL_NUMBER_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

/// Startup information of the discretionary data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupInfo {
    /// Session modifications buffer size indicator
    pub buffer_size_indicator: u8,
    /// Chip platform
    pub platform: u8,
    /// Application type, decides the revision
    pub application_type: u8,
    /// Application subtype
    pub application_subtype: u8,
    /// Software issuer
    pub software_issuer: u8,
    /// Software version
    pub software_version: u8,
    /// Software revision
    pub software_revision: u8,
}

impl StartupInfo {
    /// Decode the 7 startup bytes
    pub const fn from_bytes(bytes: [u8; STARTUP_INFO_LENGTH]) -> Self {
        let [
            buffer_size_indicator,
            platform,
            application_type,
            application_subtype,
            software_issuer,
            software_version,
            software_revision,
        ] = bytes;
        Self {
            buffer_size_indicator,
            platform,
            application_type,
            application_subtype,
            software_issuer,
            software_version,
            software_revision,
        }
    }
}

/// A selected Calypso PO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalypsoPo {
    df_name: Bytes,
    serial_number: SerialNumber,
    startup_info: StartupInfo,
    revision: PoRevision,
}

impl CalypsoPo {
    /// Build from already decoded parts, resolving the revision
    pub fn new(df_name: impl Into<Bytes>, serial_number: SerialNumber, startup_info: StartupInfo) -> Result<Self> {
        let revision = PoRevision::classify(startup_info.application_type)?;
        Ok(Self {
            df_name: df_name.into(),
            serial_number,
            startup_info,
            revision,
        })
    }

    /// Decode a FCI
    pub fn from_fci(fci: &[u8]) -> Result<Self> {
        let (template, _) = Tlv::parse(fci);
        let template = template?;
        if template.tag().to_bytes() != tags::FCI_TEMPLATE {
            return Err(Error::InvalidFci("missing FCI template".into()));
        }

        let fci_items = constructed(&template)?;
        let df_name = primitive(required(fci_items, tags::DF_NAME)?)?;
        let proprietary = constructed(required(fci_items, tags::FCI_PROPRIETARY)?)?;
        let discretionary = constructed(required(proprietary, tags::FCI_DISCRETIONARY)?)?;

        let serial_number = primitive(required(discretionary, tags::APPLICATION_SERIAL_NUMBER)?)?;
        let serial_number: [u8; SERIAL_NUMBER_LENGTH] = serial_number.try_into().map_err(|_| {
            Error::InvalidFci(format!(
                "serial number of {} bytes",
                serial_number.len()
            ))
        })?;

        let startup = primitive(required(discretionary, tags::DISCRETIONARY_DATA)?)?;
        let startup: [u8; STARTUP_INFO_LENGTH] = startup
            .get(..STARTUP_INFO_LENGTH)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                Error::InvalidFci(format!("startup information of {} bytes", startup.len()))
            })?;

        Self::new(
            Bytes::copy_from_slice(df_name),
            SerialNumber::new(serial_number),
            StartupInfo::from_bytes(startup),
        )
    }

    /// DF name of the selected application
    pub fn df_name(&self) -> &[u8] {
        &self.df_name
    }

    /// Application serial number
    pub const fn serial_number(&self) -> &SerialNumber {
        &self.serial_number
    }

    /// Startup information
    pub const fn startup_info(&self) -> &StartupInfo {
        &self.startup_info
    }

    /// Resolved PO revision
    pub const fn revision(&self) -> PoRevision {
        self.revision
    }
}

fn constructed(tlv: &Tlv) -> Result<&[Tlv]> {
    match tlv.value() {
        Value::Constructed(items) => Ok(items.as_slice()),
        Value::Primitive(_) => Err(Error::InvalidFci(format!(
            "tag {} is not constructed",
            hex::encode_upper(tlv.tag().to_bytes())
        ))),
    }
}

fn primitive(tlv: &Tlv) -> Result<&[u8]> {
    match tlv.value() {
        Value::Primitive(bytes) => Ok(bytes.as_slice()),
        Value::Constructed(_) => Err(Error::InvalidFci(format!(
            "tag {} is not primitive",
            hex::encode_upper(tlv.tag().to_bytes())
        ))),
    }
}

fn required<'a>(items: &'a [Tlv], tag: &[u8]) -> Result<&'a Tlv> {
    items
        .iter()
        .find(|item| item.tag().to_bytes() == tag)
        .ok_or_else(|| Error::InvalidFci(format!("missing tag {}", hex::encode_upper(tag))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const FCI_REV3_2: [u8; 36] = hex!(
        "6F22"
        "8408315449432E494341"
        "A516"
        "BF0C13"
        "C7080000000011223344"
        "53070A3C28113214"
        "01"
    );

    #[test]
    fn test_from_fci() {
        let po = CalypsoPo::from_fci(&FCI_REV3_2).unwrap();
        assert_eq!(po.df_name(), hex!("315449432E494341"));
        assert_eq!(po.serial_number().as_ref(), hex!("0000000011223344"));
        assert_eq!(po.serial_number().to_string(), "0000000011223344");
        assert_eq!(po.startup_info().application_type, 0x28);
        assert_eq!(po.startup_info().software_revision, 0x01);
        assert_eq!(po.revision(), PoRevision::Rev3_2);
    }

    #[test]
    fn test_missing_serial_number() {
        let fci = hex!("6F18 8408315449432E494341 A50C BF0C09 53070A3C28113214 01");
        assert!(matches!(CalypsoPo::from_fci(&fci), Err(Error::InvalidFci(_))));
    }

    #[test]
    fn test_not_a_fci() {
        assert!(matches!(
            CalypsoPo::from_fci(&hex!("8408315449432E494341")),
            Err(Error::InvalidFci(_))
        ));
        assert!(CalypsoPo::from_fci(&[]).is_err());
    }

    #[test]
    fn test_unknown_application_type() {
        let startup = StartupInfo::from_bytes(hex!("0A3C80113214 01"));
        assert!(matches!(
            CalypsoPo::new(
                Bytes::from_static(&hex!("315449432E494341")),
                SerialNumber::new([0; 8]),
                startup
            ),
            Err(Error::UnknownRevision(0x80))
        ));
    }
}
