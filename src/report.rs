/* HID++ 1.0 report framing. */
/*  */
/* HID++ 1.0 uses two report formats: */
/* - Short (Report ID 0x10): 7 bytes total, 3 parameter bytes */
/* - Long  (Report ID 0x11): 20 bytes total, 16 parameter bytes */
/*  */
/* All register traffic is built from these two frames; the sub-ID byte */
/* selects the register-access verb. */

use crate::error::{Error, Result};

/* HID++ report IDs */
pub const REPORT_ID_SHORT: u8 = 0x10;
pub const REPORT_ID_LONG: u8 = 0x11;

pub const SHORT_REPORT_LEN: usize = 7;
pub const LONG_REPORT_LEN: usize = 20;

/* Register-access sub-IDs */
pub const SUB_ID_SET_REGISTER: u8 = 0x80;
pub const SUB_ID_GET_REGISTER: u8 = 0x81;
pub const SUB_ID_SET_LONG_REGISTER: u8 = 0x82;
pub const SUB_ID_GET_LONG_REGISTER: u8 = 0x83;

/* HOT payload sub-IDs: 0x90 opens a transfer, 0x91..0x93 continue it */
pub const SUB_ID_HOT_FIRST: u8 = 0x90;
pub const SUB_ID_HOT_LAST: u8 = 0x93;

/* Error report sub-ID */
pub const SUB_ID_ERROR: u8 = 0x8F;

/* Well-known device indices */
pub const DEVICE_IDX_WIRED: u8 = 0x00;
pub const DEVICE_IDX_RECEIVER: u8 = 0xFF;

/* A parsed HID++ 1.0 report. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /* Short report (7 bytes, report ID 0x10). */
    Short {
        device_index: u8,
        sub_id: u8,
        address: u8,
        params: [u8; 3],
    },
    /* Long report (20 bytes, report ID 0x11). */
    Long {
        device_index: u8,
        sub_id: u8,
        address: u8,
        params: [u8; 16],
    },
}

impl Report {
    /* Build a short register request. `address` is the register number. */
    pub fn short(device_index: u8, sub_id: u8, address: u8, params: [u8; 3]) -> Self {
        Self::Short {
            device_index,
            sub_id,
            address,
            params,
        }
    }

    /* Build a long register request. */
    pub fn long(device_index: u8, sub_id: u8, address: u8, params: [u8; 16]) -> Self {
        Self::Long {
            device_index,
            sub_id,
            address,
            params,
        }
    }

    /* Try to parse a raw byte buffer into a structured report. */
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < SHORT_REPORT_LEN {
            return Err(Error::MalformedData(format!(
                "report truncated to {} bytes",
                buf.len()
            )));
        }

        match buf[0] {
            REPORT_ID_SHORT => Ok(Self::Short {
                device_index: buf[1],
                sub_id: buf[2],
                address: buf[3],
                params: [buf[4], buf[5], buf[6]],
            }),
            REPORT_ID_LONG if buf.len() >= LONG_REPORT_LEN => {
                let mut params = [0u8; 16];
                params.copy_from_slice(&buf[4..20]);
                Ok(Self::Long {
                    device_index: buf[1],
                    sub_id: buf[2],
                    address: buf[3],
                    params,
                })
            }
            REPORT_ID_LONG => Err(Error::MalformedData(format!(
                "long report truncated to {} bytes",
                buf.len()
            ))),
            other => Err(Error::MalformedData(format!(
                "unknown report ID {other:#04x}"
            ))),
        }
    }

    /* Serialize into the raw bytes handed to the transport. */
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Short {
                device_index,
                sub_id,
                address,
                params,
            } => vec![
                REPORT_ID_SHORT,
                *device_index,
                *sub_id,
                *address,
                params[0],
                params[1],
                params[2],
            ],
            Self::Long {
                device_index,
                sub_id,
                address,
                params,
            } => {
                let mut buf = Vec::with_capacity(LONG_REPORT_LEN);
                buf.extend_from_slice(&[REPORT_ID_LONG, *device_index, *sub_id, *address]);
                buf.extend_from_slice(params);
                buf
            }
        }
    }

    pub fn device_index(&self) -> u8 {
        match self {
            Self::Short { device_index, .. } | Self::Long { device_index, .. } => *device_index,
        }
    }

    pub fn sub_id(&self) -> u8 {
        match self {
            Self::Short { sub_id, .. } | Self::Long { sub_id, .. } => *sub_id,
        }
    }

    pub fn address(&self) -> u8 {
        match self {
            Self::Short { address, .. } | Self::Long { address, .. } => *address,
        }
    }

    /* Parameter bytes, 3 for a short report, 16 for a long one. */
    pub fn params(&self) -> &[u8] {
        match self {
            Self::Short { params, .. } => params,
            Self::Long { params, .. } => params,
        }
    }

    /* An 0x8F error report carries [failing sub-ID, register, code] in */
    /* its address + parameter bytes. */
    pub fn is_error(&self) -> bool {
        self.sub_id() == SUB_ID_ERROR
    }

    /* Decode an error report into the typed error, if this is one. */
    pub fn as_device_error(&self) -> Option<Error> {
        if !self.is_error() {
            return None;
        }
        let params = self.params();
        Some(Error::Device {
            sub_id: self.address(),
            register: params[0],
            code: params[1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_short_report() {
        let buf = [0x10, 0x00, 0x81, 0x07, 0xAA, 0xBB, 0xCC];
        let report = Report::parse(&buf).expect("valid short report");
        assert_eq!(
            report,
            Report::Short {
                device_index: 0x00,
                sub_id: 0x81,
                address: 0x07,
                params: [0xAA, 0xBB, 0xCC],
            }
        );
    }

    #[test]
    fn parse_long_report() {
        let mut buf = [0u8; 20];
        buf[0] = REPORT_ID_LONG;
        buf[1] = 0x02;
        buf[2] = SUB_ID_GET_LONG_REGISTER;
        buf[3] = 0xA2;
        buf[4] = 0x03;
        let report = Report::parse(&buf).expect("valid long report");
        match report {
            Report::Long {
                device_index,
                sub_id,
                address,
                params,
            } => {
                assert_eq!(device_index, 0x02);
                assert_eq!(sub_id, SUB_ID_GET_LONG_REGISTER);
                assert_eq!(address, 0xA2);
                assert_eq!(params[0], 0x03);
            }
            _ => panic!("Expected Long report"),
        }
    }

    #[test]
    fn parse_rejects_unknown_report_id() {
        let buf = [0x99, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            Report::parse(&buf),
            Err(crate::error::Error::MalformedData(_))
        ));
    }

    #[test]
    fn parse_rejects_truncated_buffers() {
        assert!(Report::parse(&[0x10, 0x00]).is_err());
        assert!(Report::parse(&[]).is_err());
        /* a long report ID with only 7 bytes behind it */
        assert!(Report::parse(&[0x11, 0, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn byte_roundtrip() {
        let short = Report::short(0x01, SUB_ID_GET_REGISTER, 0x0F, [0, 0, 0]);
        assert_eq!(Report::parse(&short.to_bytes()).unwrap(), short);

        let long = Report::long(0xFF, SUB_ID_SET_LONG_REGISTER, 0xA0, [0x5A; 16]);
        assert_eq!(Report::parse(&long.to_bytes()).unwrap(), long);
    }

    #[test]
    fn error_report_decodes_to_device_error() {
        /* error for GET_REGISTER on 0x63, code 0x03 (INVALID_VALUE) */
        let report = Report::short(0x00, SUB_ID_ERROR, SUB_ID_GET_REGISTER, [0x63, 0x03, 0x00]);
        assert!(report.is_error());
        match report.as_device_error() {
            Some(crate::error::Error::Device {
                sub_id,
                register,
                code,
            }) => {
                assert_eq!(sub_id, SUB_ID_GET_REGISTER);
                assert_eq!(register, 0x63);
                assert_eq!(code, 0x03);
            }
            other => panic!("expected device error, got {other:?}"),
        }
    }

    #[test]
    fn regular_report_is_not_an_error() {
        let report = Report::short(0x00, SUB_ID_GET_REGISTER, 0x00, [0, 0, 0]);
        assert!(!report.is_error());
        assert!(report.as_device_error().is_none());
    }
}
