/* On-device profile and profile-directory formats. */
/*  */
/* Profiles live in flash pages and are indexed by a directory page of */
/* (page, offset, led-mask) triples. This module is the pure byte codec; */
/* reading and writing the pages themselves happens on the device */
/* handle. */

use crate::dpi::{self, DpiTable};
use crate::error::{Error, Result};
use crate::macros::MacroData;
use crate::MAX_PAGE_NUMBER;

/* ------------------------------------------------------------------ */
/* Layout constants                                                     */
/* ------------------------------------------------------------------ */

pub const NUM_DPI_MODES: usize = 5;
pub const NUM_BUTTONS: usize = 13;
pub const NUM_BUTTONS_G9: usize = 10;
pub const NUM_MACRO_NAMES: usize = 11;

/* 23 visible characters plus the terminating 0 */
pub const NAME_SIZE: usize = 24;
/* 17 visible characters plus the terminating 0 */
pub const MACRO_NAME_SIZE: usize = 18;

/* Button type tags. Anything <= MAX_PAGE_NUMBER is a macro page. */
const BUTTON_TYPE_BUTTON: u8 = 0x81;
const BUTTON_TYPE_KEYS: u8 = 0x82;
const BUTTON_TYPE_SPECIAL: u8 = 0x83;
const BUTTON_TYPE_CONSUMER_CONTROL: u8 = 0x84;
const BUTTON_TYPE_DISABLED: u8 = 0x8F;

/* Special-action codes carried in a 0x83 button record */
const SPECIAL_PAN_LEFT: u16 = 0x1;
const SPECIAL_PAN_RIGHT: u16 = 0x2;
const SPECIAL_DPI_NEXT: u16 = 0x4;
const SPECIAL_DPI_PREV: u16 = 0x8;

/* Fixed profile record layout (sizes in bytes):
 *   0  rgb(3)  3 angle(1)  4 default dpi mode(1)  5 refresh divider(1)
 *   6  dpi modes, 5 x 4 (x raw, y raw, led nibbles x2)
 *   26 buttons, 13 x 3
 *   65 name(24)
 *   89 macro names, 11 x 18
 */
const OFFSET_RGB: usize = 0;
const OFFSET_ANGLE: usize = 3;
const OFFSET_DEFAULT_DPI_MODE: usize = 4;
const OFFSET_REFRESH: usize = 5;
const OFFSET_DPI_MODES: usize = 6;
const OFFSET_BUTTONS: usize = OFFSET_DPI_MODES + NUM_DPI_MODES * DPI_MODE_SIZE;
const OFFSET_NAME: usize = OFFSET_BUTTONS + NUM_BUTTONS * BUTTON_SIZE;
const OFFSET_MACRO_NAMES: usize = OFFSET_NAME + NAME_SIZE;

const DPI_MODE_SIZE: usize = 4;
const BUTTON_SIZE: usize = 3;

pub const PROFILE_RECORD_SIZE: usize = OFFSET_MACRO_NAMES + NUM_MACRO_NAMES * MACRO_NAME_SIZE;

/* The flash page holding the profile directory. */
pub const PROFILE_DIRECTORY_PAGE: u8 = 0x01;

pub const DIRECTORY_ENTRY_SIZE: usize = 3;

/* ------------------------------------------------------------------ */
/* Hardware variants                                                    */
/* ------------------------------------------------------------------ */

/* Known on-device profile flavors. The layouts only differ in how many
 * button slots the hardware populates. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileType {
    G500,
    G700,
    G9,
    #[default]
    Unknown,
}

impl ProfileType {
    pub fn num_buttons(&self) -> usize {
        match self {
            Self::G9 => NUM_BUTTONS_G9,
            _ => NUM_BUTTONS,
        }
    }
}

/* ------------------------------------------------------------------ */
/* Buttons                                                              */
/* ------------------------------------------------------------------ */

/* Named "special" button actions. Codes from newer firmware survive a
 * round trip through `Unknown` instead of failing the decode. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialAction {
    PanLeft,
    PanRight,
    DpiNext,
    DpiPrev,
    Unknown(u16),
}

impl SpecialAction {
    pub fn from_code(code: u16) -> Self {
        match code {
            SPECIAL_PAN_LEFT => Self::PanLeft,
            SPECIAL_PAN_RIGHT => Self::PanRight,
            SPECIAL_DPI_NEXT => Self::DpiNext,
            SPECIAL_DPI_PREV => Self::DpiPrev,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::PanLeft => SPECIAL_PAN_LEFT,
            Self::PanRight => SPECIAL_PAN_RIGHT,
            Self::DpiNext => SPECIAL_DPI_NEXT,
            Self::DpiPrev => SPECIAL_DPI_PREV,
            Self::Unknown(code) => *code,
        }
    }
}

/* One button slot; exactly one variant is active. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    /* Plain HID button mask. */
    Button { button: u16 },
    /* Keyboard key plus modifier flags. */
    Keys { modifier_flags: u8, key: u8 },
    Special(SpecialAction),
    ConsumerControl { consumer_control: u16 },
    #[default]
    Disabled,
    /* Reference to a macro stored in flash. */
    Macro { page: u8, offset: u8, address: u8 },
}

impl Button {
    pub fn from_bytes(bytes: [u8; BUTTON_SIZE]) -> Result<Self> {
        let button = match bytes[0] {
            page if page <= MAX_PAGE_NUMBER => Self::Macro {
                page,
                offset: bytes[1],
                address: bytes[2],
            },
            BUTTON_TYPE_BUTTON => Self::Button {
                button: u16::from_be_bytes([bytes[1], bytes[2]]),
            },
            BUTTON_TYPE_KEYS => Self::Keys {
                modifier_flags: bytes[1],
                key: bytes[2],
            },
            BUTTON_TYPE_SPECIAL => {
                Self::Special(SpecialAction::from_code(u16::from_be_bytes([
                    bytes[1], bytes[2],
                ])))
            }
            BUTTON_TYPE_CONSUMER_CONTROL => Self::ConsumerControl {
                consumer_control: u16::from_be_bytes([bytes[1], bytes[2]]),
            },
            BUTTON_TYPE_DISABLED => Self::Disabled,
            tag => {
                return Err(Error::MalformedData(format!(
                    "unknown button type tag {tag:#04x}"
                )));
            }
        };
        Ok(button)
    }

    pub fn to_bytes(&self) -> Result<[u8; BUTTON_SIZE]> {
        let bytes = match *self {
            Self::Button { button } => {
                let [hi, lo] = button.to_be_bytes();
                [BUTTON_TYPE_BUTTON, hi, lo]
            }
            Self::Keys { modifier_flags, key } => [BUTTON_TYPE_KEYS, modifier_flags, key],
            Self::Special(action) => {
                let [hi, lo] = action.code().to_be_bytes();
                [BUTTON_TYPE_SPECIAL, hi, lo]
            }
            Self::ConsumerControl { consumer_control } => {
                let [hi, lo] = consumer_control.to_be_bytes();
                [BUTTON_TYPE_CONSUMER_CONTROL, hi, lo]
            }
            Self::Disabled => [BUTTON_TYPE_DISABLED, 0x00, 0x00],
            Self::Macro { page, offset, address } => {
                if page > MAX_PAGE_NUMBER {
                    return Err(Error::InvalidArgument(format!(
                        "macro page {page} is beyond page {MAX_PAGE_NUMBER}"
                    )));
                }
                [page, offset, address]
            }
        };
        Ok(bytes)
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Self::Macro { .. })
    }
}

/* ------------------------------------------------------------------ */
/* Profiles                                                             */
/* ------------------------------------------------------------------ */

/* One DPI mode slot: per-axis resolution plus four LED flags. */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DpiMode {
    /* DPI values when a DPI table is available, raw sensor codes
     * otherwise. */
    pub xres: u16,
    pub yres: u16,
    pub leds: [bool; 4],
}

/* The structured, decoded form of one flash-resident profile. */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub dpi_modes: Vec<DpiMode>,
    pub name: String,
    pub macro_names: Vec<String>,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub angle_correction: bool,
    pub default_dpi_mode: u8,
    /* In Hz; stored on the wire as the divider 1000/rate. */
    pub refresh_rate: u16,
    pub buttons: Vec<Button>,
    /* Parallel to `buttons`; populated only for macro references. */
    pub macros: Vec<Option<Vec<MacroData>>>,
    /* False for a freshly zeroed profile, true once populated from
     * flash. */
    pub initialized: bool,
}

impl Profile {
    /* A zeroed, uninitialized profile sized for `profile_type`. */
    pub fn new(profile_type: ProfileType) -> Self {
        let num_buttons = profile_type.num_buttons();
        Self {
            buttons: vec![Button::Disabled; num_buttons],
            macros: vec![None; num_buttons],
            ..Self::default()
        }
    }

    /* Decode the fixed-layout record. Macro references are left for the
     * caller to resolve; `macros` comes back all-None. */
    pub fn decode(data: &[u8], profile_type: ProfileType, dpi_table: &DpiTable) -> Result<Self> {
        if data.len() < PROFILE_RECORD_SIZE {
            return Err(Error::MalformedData(format!(
                "profile record needs {PROFILE_RECORD_SIZE} bytes, got {}",
                data.len()
            )));
        }

        let mut profile = Self::new(profile_type);
        profile.red = data[OFFSET_RGB];
        profile.green = data[OFFSET_RGB + 1];
        profile.blue = data[OFFSET_RGB + 2];
        profile.angle_correction = data[OFFSET_ANGLE] != 0;
        profile.default_dpi_mode = data[OFFSET_DEFAULT_DPI_MODE];

        let divider = data[OFFSET_REFRESH];
        profile.refresh_rate = if divider == 0 { 0 } else { 1000 / u16::from(divider) };

        for i in 0..NUM_DPI_MODES {
            let base = OFFSET_DPI_MODES + i * DPI_MODE_SIZE;
            let slot = &data[base..base + DPI_MODE_SIZE];
            if slot.iter().all(|&b| b == 0) {
                /* unpopulated slot, nothing follows it */
                break;
            }
            profile.dpi_modes.push(DpiMode {
                xres: dpi::resolve_res(dpi_table, slot[0]),
                yres: dpi::resolve_res(dpi_table, slot[1]),
                leds: decode_led_nibbles([slot[2], slot[3]]),
            });
        }

        for i in 0..profile_type.num_buttons() {
            let base = OFFSET_BUTTONS + i * BUTTON_SIZE;
            profile.buttons[i] = Button::from_bytes([data[base], data[base + 1], data[base + 2]])?;
        }

        profile.name = decode_fixed_string(&data[OFFSET_NAME..OFFSET_NAME + NAME_SIZE], "name")?;
        for i in 0..NUM_MACRO_NAMES {
            let base = OFFSET_MACRO_NAMES + i * MACRO_NAME_SIZE;
            profile.macro_names.push(decode_fixed_string(
                &data[base..base + MACRO_NAME_SIZE],
                "macro name",
            )?);
        }

        profile.initialized = true;
        Ok(profile)
    }

    /* Encode to the fixed-layout record. Overlong names are an error,
     * never a silent truncation. */
    pub fn encode(&self, profile_type: ProfileType, dpi_table: &DpiTable) -> Result<Vec<u8>> {
        if self.dpi_modes.len() > NUM_DPI_MODES {
            return Err(Error::InvalidArgument(format!(
                "{} DPI modes, the device stores at most {NUM_DPI_MODES}",
                self.dpi_modes.len()
            )));
        }
        let num_buttons = profile_type.num_buttons();
        if self.buttons.len() > num_buttons {
            return Err(Error::InvalidArgument(format!(
                "{} buttons, this hardware has {num_buttons} slots",
                self.buttons.len()
            )));
        }
        if self.macro_names.len() > NUM_MACRO_NAMES {
            return Err(Error::InvalidArgument(format!(
                "{} macro names, the device stores at most {NUM_MACRO_NAMES}",
                self.macro_names.len()
            )));
        }

        let mut data = vec![0u8; PROFILE_RECORD_SIZE];
        data[OFFSET_RGB] = self.red;
        data[OFFSET_RGB + 1] = self.green;
        data[OFFSET_RGB + 2] = self.blue;
        data[OFFSET_ANGLE] = u8::from(self.angle_correction);
        data[OFFSET_DEFAULT_DPI_MODE] = self.default_dpi_mode;
        data[OFFSET_REFRESH] = encode_refresh_rate(self.refresh_rate)?;

        for (i, mode) in self.dpi_modes.iter().enumerate() {
            let base = OFFSET_DPI_MODES + i * DPI_MODE_SIZE;
            data[base] = dpi::res_to_raw(dpi_table, mode.xres)?;
            data[base + 1] = dpi::res_to_raw(dpi_table, mode.yres)?;
            let nibbles = encode_led_nibbles(mode.leds);
            data[base + 2] = nibbles[0];
            data[base + 3] = nibbles[1];
        }

        for (i, button) in self.buttons.iter().enumerate() {
            let base = OFFSET_BUTTONS + i * BUTTON_SIZE;
            data[base..base + BUTTON_SIZE].copy_from_slice(&button.to_bytes()?);
        }
        /* Zeroed slots would read back as macro references to page 0;
         * unpopulated slots must decode as Disabled. */
        for i in self.buttons.len()..NUM_BUTTONS {
            let base = OFFSET_BUTTONS + i * BUTTON_SIZE;
            data[base..base + BUTTON_SIZE].copy_from_slice(&Button::Disabled.to_bytes()?);
        }

        encode_fixed_string(
            &mut data[OFFSET_NAME..OFFSET_NAME + NAME_SIZE],
            &self.name,
            "name",
        )?;
        for (i, name) in self.macro_names.iter().enumerate() {
            let base = OFFSET_MACRO_NAMES + i * MACRO_NAME_SIZE;
            encode_fixed_string(
                &mut data[base..base + MACRO_NAME_SIZE],
                name,
                "macro name",
            )?;
        }

        Ok(data)
    }
}

/* LED flags pack two per byte: 0x2 on, 0x1 off. */
fn encode_led_nibbles(leds: [bool; 4]) -> [u8; 2] {
    let nibble = |on: bool| if on { 0x2u8 } else { 0x1u8 };
    [
        nibble(leds[0]) << 4 | nibble(leds[1]),
        nibble(leds[2]) << 4 | nibble(leds[3]),
    ]
}

fn decode_led_nibbles(bytes: [u8; 2]) -> [bool; 4] {
    [
        bytes[0] >> 4 == 0x2,
        bytes[0] & 0x0F == 0x2,
        bytes[1] >> 4 == 0x2,
        bytes[1] & 0x0F == 0x2,
    ]
}

pub(crate) fn encode_refresh_rate(rate: u16) -> Result<u8> {
    if rate == 0 {
        return Ok(0);
    }
    if rate > 1000 {
        return Err(Error::InvalidArgument(format!(
            "refresh rate {rate} Hz is above the 1000 Hz wire maximum"
        )));
    }
    u8::try_from(1000 / rate).map_err(|_| {
        Error::InvalidArgument(format!("refresh rate {rate} Hz has no one-byte divider"))
    })
}

fn decode_fixed_string(field: &[u8], what: &str) -> Result<String> {
    let end = field.iter().position(|&b| b == 0).ok_or_else(|| {
        Error::MalformedData(format!("profile {what} field is not terminated"))
    })?;
    String::from_utf8(field[..end].to_vec())
        .map_err(|_| Error::MalformedData(format!("profile {what} is not valid UTF-8")))
}

fn encode_fixed_string(field: &mut [u8], value: &str, what: &str) -> Result<()> {
    let bytes = value.as_bytes();
    /* leave room for the terminating 0 */
    if bytes.len() >= field.len() {
        return Err(Error::InvalidArgument(format!(
            "profile {what} {value:?} exceeds {} characters",
            field.len() - 1
        )));
    }
    if bytes.contains(&0) {
        return Err(Error::InvalidArgument(format!(
            "profile {what} contains an embedded NUL"
        )));
    }
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

/* ------------------------------------------------------------------ */
/* Profile directory                                                    */
/* ------------------------------------------------------------------ */

/* Where one profile's bytes live in flash, and which LEDs it declares
 * meaningful. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub page: u8,
    pub offset: u8,
    pub led_mask: u8,
}

impl DirectoryEntry {
    pub fn to_bytes(&self) -> Result<[u8; DIRECTORY_ENTRY_SIZE]> {
        if self.page > MAX_PAGE_NUMBER {
            return Err(Error::InvalidArgument(format!(
                "directory page {} is beyond page {MAX_PAGE_NUMBER}",
                self.page
            )));
        }
        Ok([self.page, self.offset, self.led_mask])
    }
}

/* Decode up to `nelems` directory entries from a directory page. */
/*  */
/* The on-device array terminates at a 0xFF page byte (erased flash) or */
/* an all-zero entry; fewer populated entries than requested is normal. */
pub fn decode_directory(data: &[u8], nelems: usize) -> Result<Vec<DirectoryEntry>> {
    if nelems > usize::from(MAX_PAGE_NUMBER) {
        return Err(Error::InvalidArgument(format!(
            "{nelems} directory entries requested, the device stores at most {MAX_PAGE_NUMBER}"
        )));
    }

    let mut entries = Vec::new();
    for i in 0..nelems {
        let base = i * DIRECTORY_ENTRY_SIZE;
        if base + DIRECTORY_ENTRY_SIZE > data.len() {
            break;
        }
        let (page, offset, led_mask) = (data[base], data[base + 1], data[base + 2]);
        if page == 0xFF || (page == 0 && offset == 0 && led_mask == 0) {
            break;
        }
        if page > MAX_PAGE_NUMBER {
            return Err(Error::MalformedData(format!(
                "directory entry {i} points at page {page}"
            )));
        }
        entries.push(DirectoryEntry {
            page,
            offset,
            led_mask,
        });
    }
    Ok(entries)
}

/* Encode a directory page image: entries plus the 0xFF terminator. */
pub fn encode_directory(entries: &[DirectoryEntry]) -> Result<Vec<u8>> {
    if entries.len() > usize::from(MAX_PAGE_NUMBER) {
        return Err(Error::InvalidArgument(format!(
            "{} directory entries, the device stores at most {MAX_PAGE_NUMBER}",
            entries.len()
        )));
    }
    let mut data = Vec::with_capacity((entries.len() + 1) * DIRECTORY_ENTRY_SIZE);
    for entry in entries {
        data.extend_from_slice(&entry.to_bytes()?);
    }
    data.extend_from_slice(&[0xFF; DIRECTORY_ENTRY_SIZE]);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dpi::DpiTable;

    fn sample_profile() -> Profile {
        let mut profile = Profile::new(ProfileType::G500);
        profile.name = "fps".to_string();
        profile.macro_names = vec!["burst".to_string(), "melee".to_string()];
        profile.red = 0x20;
        profile.green = 0x40;
        profile.blue = 0x80;
        profile.angle_correction = true;
        profile.default_dpi_mode = 1;
        profile.refresh_rate = 500;
        profile.dpi_modes = vec![
            DpiMode {
                xres: 400,
                yres: 400,
                leds: [true, false, false, false],
            },
            DpiMode {
                xres: 800,
                yres: 1600,
                leds: [false, true, false, true],
            },
        ];
        profile.buttons[0] = Button::Button { button: 0x0001 };
        profile.buttons[1] = Button::Keys {
            modifier_flags: 0x02,
            key: 0x04,
        };
        profile.buttons[2] = Button::Special(SpecialAction::DpiNext);
        profile.buttons[3] = Button::ConsumerControl {
            consumer_control: 0x00E9,
        };
        profile.buttons[4] = Button::Macro {
            page: 2,
            offset: 10,
            address: 0,
        };
        profile
    }

    fn table() -> DpiTable {
        DpiTable::from_list("400;800;1600").unwrap()
    }

    #[test]
    fn profile_roundtrip() {
        let profile = sample_profile();
        let data = profile.encode(ProfileType::G500, &table()).unwrap();
        assert_eq!(data.len(), PROFILE_RECORD_SIZE);

        let mut decoded = Profile::decode(&data, ProfileType::G500, &table()).unwrap();
        assert!(decoded.initialized);
        decoded.initialized = false;

        let mut expected = profile.clone();
        /* empty trailing macro-name slots decode as empty strings */
        while expected.macro_names.len() < NUM_MACRO_NAMES {
            expected.macro_names.push(String::new());
        }
        decoded.macro_names.truncate(expected.macro_names.len());
        assert_eq!(decoded, expected);
    }

    #[test]
    fn overlong_name_fails_instead_of_truncating() {
        let mut profile = sample_profile();
        profile.name = "a".repeat(NAME_SIZE); /* 24 chars, one too many */
        assert!(matches!(
            profile.encode(ProfileType::G500, &table()),
            Err(Error::InvalidArgument(_))
        ));

        profile.name = "a".repeat(NAME_SIZE - 1); /* exactly 23 fits */
        assert!(profile.encode(ProfileType::G500, &table()).is_ok());
    }

    #[test]
    fn overlong_macro_name_fails() {
        let mut profile = sample_profile();
        profile.macro_names = vec!["a".repeat(MACRO_NAME_SIZE)];
        assert!(profile.encode(ProfileType::G500, &table()).is_err());
    }

    #[test]
    fn unknown_button_tag_is_malformed_data() {
        assert!(matches!(
            Button::from_bytes([0x85, 0, 0]),
            Err(Error::MalformedData(_))
        ));
        assert!(Button::from_bytes([0x90, 0, 0]).is_err());
    }

    #[test]
    fn macro_button_tag_is_the_page_number() {
        let button = Button::from_bytes([0x02, 0x0A, 0x00]).unwrap();
        assert_eq!(
            button,
            Button::Macro {
                page: 2,
                offset: 10,
                address: 0
            }
        );
        assert_eq!(button.to_bytes().unwrap(), [0x02, 0x0A, 0x00]);
    }

    #[test]
    fn special_codes_roundtrip_including_unknown() {
        for action in [
            SpecialAction::PanLeft,
            SpecialAction::PanRight,
            SpecialAction::DpiNext,
            SpecialAction::DpiPrev,
            SpecialAction::Unknown(0x4000),
        ] {
            assert_eq!(SpecialAction::from_code(action.code()), action);
        }

        let button = Button::from_bytes([0x83, 0x40, 0x00]).unwrap();
        assert_eq!(button, Button::Special(SpecialAction::Unknown(0x4000)));
    }

    #[test]
    fn refresh_rate_divider_encoding() {
        for (rate, divider) in [(1000u16, 1u8), (500, 2), (250, 4), (125, 8)] {
            assert_eq!(encode_refresh_rate(rate).unwrap(), divider);
        }
        assert_eq!(encode_refresh_rate(0).unwrap(), 0);
        assert!(encode_refresh_rate(2000).is_err());
        assert!(encode_refresh_rate(2).is_err()); /* divider 500 overflows */
    }

    #[test]
    fn resolutions_stay_raw_without_a_table() {
        let empty = DpiTable::default();
        let mut profile = sample_profile();
        profile.dpi_modes = vec![DpiMode {
            xres: 0x85,
            yres: 0x87,
            leds: [false; 4],
        }];
        let data = profile.encode(ProfileType::G500, &empty).unwrap();
        let decoded = Profile::decode(&data, ProfileType::G500, &empty).unwrap();
        assert_eq!(decoded.dpi_modes[0].xres, 0x85);
        assert_eq!(decoded.dpi_modes[0].yres, 0x87);
    }

    #[test]
    fn encode_rejects_dpi_missing_from_table() {
        let mut profile = sample_profile();
        profile.dpi_modes = vec![DpiMode {
            xres: 450,
            yres: 450,
            leds: [false; 4],
        }];
        assert!(matches!(
            profile.encode(ProfileType::G500, &table()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn short_button_vec_decodes_back_as_disabled_slots() {
        let mut profile = sample_profile();
        profile.buttons.truncate(3);
        profile.macros.truncate(3);

        let data = profile.encode(ProfileType::G500, &table()).unwrap();
        let decoded = Profile::decode(&data, ProfileType::G500, &table()).unwrap();
        assert_eq!(decoded.buttons[..3], profile.buttons[..]);
        for (i, button) in decoded.buttons[3..].iter().enumerate() {
            assert_eq!(*button, Button::Disabled, "slot {}", i + 3);
        }
    }

    #[test]
    fn g9_profiles_have_ten_buttons() {
        let profile = Profile::new(ProfileType::G9);
        assert_eq!(profile.buttons.len(), NUM_BUTTONS_G9);
        let data = profile.encode(ProfileType::G9, &DpiTable::default()).unwrap();
        let decoded = Profile::decode(&data, ProfileType::G9, &DpiTable::default()).unwrap();
        assert_eq!(decoded.buttons.len(), NUM_BUTTONS_G9);
    }

    #[test]
    fn directory_roundtrip_and_termination() {
        let entries = vec![
            DirectoryEntry {
                page: 3,
                offset: 0,
                led_mask: 0x0F,
            },
            DirectoryEntry {
                page: 4,
                offset: 0,
                led_mask: 0x03,
            },
        ];
        let data = encode_directory(&entries).unwrap();
        assert_eq!(data.len(), 9);

        /* asking for more entries than exist returns the populated
         * prefix, not an error */
        assert_eq!(decode_directory(&data, 10).unwrap(), entries);
        /* asking for fewer caps the result */
        assert_eq!(decode_directory(&data, 1).unwrap(), &entries[..1]);
    }

    #[test]
    fn directory_request_above_page_limit_is_invalid() {
        assert!(matches!(
            decode_directory(&[0xFF; 96], 32),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn directory_entry_with_wild_page_is_malformed() {
        let data = [40u8, 0, 0, 0xFF, 0xFF, 0xFF];
        assert!(matches!(
            decode_directory(&data, 5),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn erased_flash_decodes_as_empty_directory() {
        assert!(decode_directory(&[0xFF; 96], 31).unwrap().is_empty());
        assert!(decode_directory(&[0x00; 96], 31).unwrap().is_empty());
    }
}
