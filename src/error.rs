/* Error types shared across the HID++ 1.0 codec. */

use thiserror::Error;

/* Human-readable names for the HID++ 1.0 error codes carried in an
 * 0x8F error report. Codes outside this list belong to newer firmware. */
fn error_code_name(code: u8) -> &'static str {
    match code {
        0x00 => "SUCCESS",
        0x01 => "INVALID_SUBID",
        0x02 => "INVALID_ADDRESS",
        0x03 => "INVALID_VALUE",
        0x04 => "CONNECT_FAIL",
        0x05 => "TOO_MANY_DEVICES",
        0x06 => "ALREADY_EXISTS",
        0x07 => "BUSY",
        0x08 => "UNKNOWN_DEVICE",
        0x09 => "RESOURCE_ERROR",
        0x0A => "REQUEST_UNAVAILABLE",
        0x0B => "INVALID_PARAM_VALUE",
        0x0C => "WRONG_PIN_CODE",
        _ => "RESERVED",
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /* Caller handed us something out of range; detected before any
     * transport traffic. */
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /* Bytes read back from the device do not match the documented
     * format (unknown opcode, bad tag, cyclic macro, ...). */
    #[error("malformed device data: {0}")]
    MalformedData(String),

    /* Opaque failure bubbled up from the transport collaborator.
     * Retry policy lives there, not here. */
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /* The device answered with an 0x8F error report. */
    #[error(
        "device error {code:#04x} ({name}) for register {register:#04x} (sub-ID {sub_id:#04x})",
        name = error_code_name(*code)
    )]
    Device { sub_id: u8, register: u8, code: u8 },

    /* An erase/stage/commit flash sequence died partway through. The
     * on-device state is undefined; re-issue the whole profile write. */
    #[error("flash write incomplete: {0}")]
    WriteIncomplete(String),
}

impl Error {
    /* Convenience constructor for transport implementations. */
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_display_names_the_code() {
        let err = Error::Device {
            sub_id: 0x81,
            register: 0xA2,
            code: 0x02,
        };
        let text = err.to_string();
        assert!(text.contains("INVALID_ADDRESS"), "{text}");
        assert!(text.contains("0xa2"), "{text}");
    }

    #[test]
    fn reserved_codes_do_not_panic() {
        let err = Error::Device {
            sub_id: 0x80,
            register: 0x00,
            code: 0x7F,
        };
        assert!(err.to_string().contains("RESERVED"));
    }
}
