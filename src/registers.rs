/* Feature request codec. */
/*  */
/* One builder/parser pair per addressed register: notifications mask, */
/* individual features, battery, LEDs, sensor, resolution, refresh */
/* rate, pairing and firmware. Each call is stateless beyond the */
/* handle's device index. Bit-packed values decode into named types; */
/* codes outside the documented ranges decode to an explicit */
/* unknown/reserved variant instead of failing, so profiles and */
/* devices from newer firmware stay readable. */

use tracing::debug;

use crate::device::Hidpp10Device;
use crate::dpi;
use crate::error::{Error, Result};
use crate::profile;

/* Register addresses */
const REG_HIDPP_NOTIFICATIONS: u8 = 0x00;
const REG_INDIVIDUAL_FEATURES: u8 = 0x01;
const REG_BATTERY_STATUS: u8 = 0x07;
const REG_BATTERY_MILEAGE: u8 = 0x0D;
const REG_LED_STATUS: u8 = 0x51;
const REG_LED_INTENSITY: u8 = 0x54;
const REG_LED_COLOR: u8 = 0x57;
const REG_OPTICAL_SENSOR: u8 = 0x61;
const REG_CURRENT_RESOLUTION: u8 = 0x63;
const REG_USB_REFRESH_RATE: u8 = 0x64;
const REG_PAIRING_LOCK: u8 = 0xB2;
const REG_PAIRING_INFORMATION: u8 = 0xB5;
const REG_FIRMWARE_INFORMATION: u8 = 0xF1;

/* 0xB2 sub-operations */
const LOCK_OP_OPEN: u8 = 0x01;
const LOCK_OP_CLOSE: u8 = 0x02;
const LOCK_OP_DISCONNECT: u8 = 0x03;

/* 0xB5 selector families, plus (index - 1) */
const PAIRING_SELECTOR_INFORMATION: u8 = 0x20;
const PAIRING_SELECTOR_EXTENDED: u8 = 0x30;
const PAIRING_SELECTOR_NAME: u8 = 0x40;

/* 0xF1 selectors */
const FIRMWARE_SELECTOR_VERSION: u8 = 0x01;
const FIRMWARE_SELECTOR_BUILD: u8 = 0x02;

pub const NUM_LEDS: usize = 6;
const MAX_NAME_LENGTH: usize = 14;

/* ==================================================================== */
/* 0x00: HID++ reporting flags                                          */
/* ==================================================================== */

/* Bits 13..=15 and 19..=23 of the 24-bit mask. */
const NOTIFICATIONS_RESERVED_MASK: u32 = 0xF8E000;

/* The 24-bit notification mask of register 0x00, one field per defined
 * bit. All notifications are disabled on powerup. `reserved` carries
 * whatever the device reported in the reserved bits; it must be zero
 * before the mask can be written back. */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationFlags {
    /* bit 0: multimedia/vendor keys arrive as notification 0x03 */
    pub consumer_vendor_specific_control: bool,
    /* bit 1: power keys arrive as notification 0x04 */
    pub power_keys: bool,
    /* bit 2: vertical scroll arrives as notification 0x05 */
    pub roller_v: bool,
    /* bit 3: extra mouse buttons arrive as notification 0x06 */
    pub mouse_extra_buttons: bool,
    /* bit 4: battery status arrives as notification 0x07 or 0x0D */
    pub battery_status: bool,
    /* bit 5: horizontal scroll arrives as notification 0x05 */
    pub roller_h: bool,
    /* bit 6: F-Lock status arrives as notification 0x09 */
    pub f_lock_status: bool,
    /* bit 7: numpad keys arrive as buttons in notification 0x03 */
    pub numpad_numeric_keys: bool,
    /* bit 8: device arrival/removal notifications 0x40/0x41/0x46/0x78 */
    pub wireless_notifications: bool,
    /* bit 9: UI events arrive as notification 0x08 */
    pub ui_notifications: bool,
    /* bit 10: link quality info arrives as notification 0x49 */
    pub quad_link_quality_info: bool,
    /* bit 11 */
    pub software_present: bool,
    /* bit 12 */
    pub touchpad_multitouch: bool,
    /* bit 16: 3D gestures arrive as notification 0x65 */
    pub gesture_3d: bool,
    /* bit 17 */
    pub voip_telephony: bool,
    /* bit 18 */
    pub configuration_complete: bool,
    /* bits 13..=15, 19..=23, as reported by the device */
    pub reserved: u32,
}

impl NotificationFlags {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            consumer_vendor_specific_control: bits & (1 << 0) != 0,
            power_keys: bits & (1 << 1) != 0,
            roller_v: bits & (1 << 2) != 0,
            mouse_extra_buttons: bits & (1 << 3) != 0,
            battery_status: bits & (1 << 4) != 0,
            roller_h: bits & (1 << 5) != 0,
            f_lock_status: bits & (1 << 6) != 0,
            numpad_numeric_keys: bits & (1 << 7) != 0,
            wireless_notifications: bits & (1 << 8) != 0,
            ui_notifications: bits & (1 << 9) != 0,
            quad_link_quality_info: bits & (1 << 10) != 0,
            software_present: bits & (1 << 11) != 0,
            touchpad_multitouch: bits & (1 << 12) != 0,
            gesture_3d: bits & (1 << 16) != 0,
            voip_telephony: bits & (1 << 17) != 0,
            configuration_complete: bits & (1 << 18) != 0,
            reserved: bits & NOTIFICATIONS_RESERVED_MASK,
        }
    }

    pub fn bits(&self) -> u32 {
        let mut bits = self.reserved;
        let mut set = |on: bool, bit: u32| {
            if on {
                bits |= 1 << bit;
            }
        };
        set(self.consumer_vendor_specific_control, 0);
        set(self.power_keys, 1);
        set(self.roller_v, 2);
        set(self.mouse_extra_buttons, 3);
        set(self.battery_status, 4);
        set(self.roller_h, 5);
        set(self.f_lock_status, 6);
        set(self.numpad_numeric_keys, 7);
        set(self.wireless_notifications, 8);
        set(self.ui_notifications, 9);
        set(self.quad_link_quality_info, 10);
        set(self.software_present, 11);
        set(self.touchpad_multitouch, 12);
        set(self.gesture_3d, 16);
        set(self.voip_telephony, 17);
        set(self.configuration_complete, 18);
        bits
    }
}

/* ==================================================================== */
/* 0x01: individual features                                            */
/* ==================================================================== */

/* Bits 8, 12..=15 and 22..=23. */
const FEATURES_RESERVED_MASK: u32 = 0xC0F100;

/* The feature-enable mask of register 0x01. `reserved` follows the
 * same rules as NotificationFlags. */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndividualFeatures {
    /* bit 0 */
    pub mouse_sensor_resolution: bool,
    /* bit 1: superseded by register 0x63 */
    pub special_button_function: bool,
    /* bit 2 */
    pub enhanced_key_usage: bool,
    /* bit 3 */
    pub fast_forward_rewind: bool,
    /* bit 4 */
    pub send_calculator_result: bool,
    /* bit 5 */
    pub motion_wakeup: bool,
    /* bit 6 */
    pub fast_scrolling: bool,
    /* bit 7: plus/minus buttons switch resolution instead of acting
     * as buttons */
    pub buttons_control_resolution: bool,
    /* bit 9 */
    pub receiver_multiple_rf_lock: bool,
    /* bit 10 */
    pub receiver_disable_rfscan_in_suspend: bool,
    /* bit 11: receiver skips compatibility checks while pairing */
    pub receiver_accept_all_devices_in_pairing: bool,
    /* bit 16 */
    pub inhibit_lock_key_sound: bool,
    /* bit 17 */
    pub inhibit_touchpad: bool,
    /* bit 18 */
    pub engine_3d: bool,
    /* bit 19 */
    pub sw_controls_leds: bool,
    /* bit 20 */
    pub no_numlock_toggle: bool,
    /* bit 21 */
    pub inhibit_presence_detection: bool,
    /* bits 8, 12..=15, 22..=23, as reported by the device */
    pub reserved: u32,
}

impl IndividualFeatures {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            mouse_sensor_resolution: bits & (1 << 0) != 0,
            special_button_function: bits & (1 << 1) != 0,
            enhanced_key_usage: bits & (1 << 2) != 0,
            fast_forward_rewind: bits & (1 << 3) != 0,
            send_calculator_result: bits & (1 << 4) != 0,
            motion_wakeup: bits & (1 << 5) != 0,
            fast_scrolling: bits & (1 << 6) != 0,
            buttons_control_resolution: bits & (1 << 7) != 0,
            receiver_multiple_rf_lock: bits & (1 << 9) != 0,
            receiver_disable_rfscan_in_suspend: bits & (1 << 10) != 0,
            receiver_accept_all_devices_in_pairing: bits & (1 << 11) != 0,
            inhibit_lock_key_sound: bits & (1 << 16) != 0,
            inhibit_touchpad: bits & (1 << 17) != 0,
            engine_3d: bits & (1 << 18) != 0,
            sw_controls_leds: bits & (1 << 19) != 0,
            no_numlock_toggle: bits & (1 << 20) != 0,
            inhibit_presence_detection: bits & (1 << 21) != 0,
            reserved: bits & FEATURES_RESERVED_MASK,
        }
    }

    pub fn bits(&self) -> u32 {
        let mut bits = self.reserved;
        let mut set = |on: bool, bit: u32| {
            if on {
                bits |= 1 << bit;
            }
        };
        set(self.mouse_sensor_resolution, 0);
        set(self.special_button_function, 1);
        set(self.enhanced_key_usage, 2);
        set(self.fast_forward_rewind, 3);
        set(self.send_calculator_result, 4);
        set(self.motion_wakeup, 5);
        set(self.fast_scrolling, 6);
        set(self.buttons_control_resolution, 7);
        set(self.receiver_multiple_rf_lock, 9);
        set(self.receiver_disable_rfscan_in_suspend, 10);
        set(self.receiver_accept_all_devices_in_pairing, 11);
        set(self.inhibit_lock_key_sound, 16);
        set(self.inhibit_touchpad, 17);
        set(self.engine_3d, 18);
        set(self.sw_controls_leds, 19);
        set(self.no_numlock_toggle, 20);
        set(self.inhibit_presence_detection, 21);
        bits
    }
}

/* The 24-bit masks travel little-end first: params[0] holds bits
 * 0..=7, params[2] bits 16..=23. */
fn mask_from_params(params: [u8; 3]) -> u32 {
    u32::from(params[0]) | u32::from(params[1]) << 8 | u32::from(params[2]) << 16
}

fn mask_to_params(bits: u32) -> [u8; 3] {
    [bits as u8, (bits >> 8) as u8, (bits >> 16) as u8]
}

fn check_reserved(reserved: u32, register: u8) -> Result<()> {
    if reserved != 0 {
        return Err(Error::InvalidArgument(format!(
            "reserved bits {reserved:#08x} must be zero when writing register {register:#04x}"
        )));
    }
    Ok(())
}

/* ==================================================================== */
/* 0x07 / 0x0D: battery                                                 */
/* ==================================================================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryLevel {
    Unknown,
    Critical,
    CriticalLegacy,
    Low,
    LowLegacy,
    Good,
    GoodLegacy,
    FullLegacy,
    Reserved(u8),
}

impl BatteryLevel {
    fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Unknown,
            0x01 => Self::Critical,
            0x02 => Self::CriticalLegacy,
            0x03 => Self::Low,
            0x04 => Self::LowLegacy,
            0x05 => Self::Good,
            0x06 => Self::GoodLegacy,
            0x07 => Self::FullLegacy,
            other => Self::Reserved(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    NotCharging,
    Unknown,
    Charging,
    ChargingComplete,
    ChargingError,
    ChargingFast,
    ChargingSlow,
    ToppingCharge,
    Reserved(u8),
}

impl ChargeState {
    fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::NotCharging,
            0x20 => Self::Unknown,
            0x21 => Self::Charging,
            0x22 => Self::ChargingComplete,
            0x23 => Self::ChargingError,
            0x24 => Self::ChargingFast,
            0x25 => Self::ChargingSlow,
            0x26 => Self::ToppingCharge,
            other => Self::Reserved(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub level: BatteryLevel,
    pub charge_state: ChargeState,
    pub low_threshold_percent: u8,
}

/* Register 0x0D, on devices that report mileage instead of coarse
 * levels. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryMileage {
    pub level_percent: u8,
    pub max_seconds: u32,
    pub state: ChargeState,
}

/* ==================================================================== */
/* 0x51: LED status                                                     */
/* ==================================================================== */

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LedStatus {
    /* LED does not exist, or is left as it is */
    #[default]
    NoChange,
    Off,
    On,
    Blink,
    Heartbeat,
    SlowOn,
    SlowOff,
    Unknown(u8),
}

impl LedStatus {
    fn from_code(code: u8) -> Self {
        match code {
            0x0 => Self::NoChange,
            0x1 => Self::Off,
            0x2 => Self::On,
            0x3 => Self::Blink,
            0x4 => Self::Heartbeat,
            0x5 => Self::SlowOn,
            0x6 => Self::SlowOff,
            other => Self::Unknown(other),
        }
    }

    fn code(self) -> Result<u8> {
        let code = match self {
            Self::NoChange => 0x0,
            Self::Off => 0x1,
            Self::On => 0x2,
            Self::Blink => 0x3,
            Self::Heartbeat => 0x4,
            Self::SlowOn => 0x5,
            Self::SlowOff => 0x6,
            Self::Unknown(code) => code,
        };
        if code > 0xF {
            return Err(Error::InvalidArgument(format!(
                "LED status {code:#04x} does not fit a nibble"
            )));
        }
        Ok(code)
    }
}

/* ==================================================================== */
/* 0xB5 / 0xF1: pairing and firmware records                            */
/* ==================================================================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingInformation {
    pub report_interval: u8,
    pub wpid: u16,
    pub device_type: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareInformation {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
}

fn pairing_selector(family: u8, index: u8) -> Result<u8> {
    if index < 1 {
        return Err(Error::InvalidArgument(format!(
            "pairing slots are numbered from 1, got {index}"
        )));
    }
    Ok(family + index - 1)
}

impl Hidpp10Device<'_> {
    /* ---------------------------------------------------------------- */
    /* 0x00: HID++ reporting flags                                       */
    /* ---------------------------------------------------------------- */

    pub fn get_hidpp_notifications(&self) -> Result<NotificationFlags> {
        let value = self.get_register(REG_HIDPP_NOTIFICATIONS, [0x00; 3])?;
        Ok(NotificationFlags::from_bits(mask_from_params(value)))
    }

    pub fn set_hidpp_notifications(&self, flags: &NotificationFlags) -> Result<()> {
        check_reserved(flags.reserved, REG_HIDPP_NOTIFICATIONS)?;
        self.set_register(REG_HIDPP_NOTIFICATIONS, mask_to_params(flags.bits()))
    }

    /* ---------------------------------------------------------------- */
    /* 0x01: individual features                                         */
    /* ---------------------------------------------------------------- */

    pub fn get_individual_features(&self) -> Result<IndividualFeatures> {
        let value = self.get_register(REG_INDIVIDUAL_FEATURES, [0x00; 3])?;
        Ok(IndividualFeatures::from_bits(mask_from_params(value)))
    }

    pub fn set_individual_features(&self, features: &IndividualFeatures) -> Result<()> {
        check_reserved(features.reserved, REG_INDIVIDUAL_FEATURES)?;
        self.set_register(REG_INDIVIDUAL_FEATURES, mask_to_params(features.bits()))
    }

    /* ---------------------------------------------------------------- */
    /* 0x07: battery status                                              */
    /* ---------------------------------------------------------------- */

    pub fn get_battery_status(&self) -> Result<BatteryStatus> {
        let value = self.get_register(REG_BATTERY_STATUS, [0x00; 3])?;
        Ok(BatteryStatus {
            level: BatteryLevel::from_code(value[0]),
            charge_state: ChargeState::from_code(value[1]),
            low_threshold_percent: value[2],
        })
    }

    /* ---------------------------------------------------------------- */
    /* 0x0D: battery mileage                                             */
    /* ---------------------------------------------------------------- */

    pub fn get_battery_mileage(&self) -> Result<BatteryMileage> {
        let value = self.get_long_register(REG_BATTERY_MILEAGE, [0x00; 3])?;
        Ok(BatteryMileage {
            level_percent: value[0],
            max_seconds: u32::from_be_bytes([value[1], value[2], value[3], value[4]]),
            state: ChargeState::from_code(value[5]),
        })
    }

    /* ---------------------------------------------------------------- */
    /* 0x51: LED status, six LEDs nibble-packed into three bytes         */
    /* ---------------------------------------------------------------- */

    pub fn get_led_status(&self) -> Result<[LedStatus; NUM_LEDS]> {
        let value = self.get_register(REG_LED_STATUS, [0x00; 3])?;
        let mut leds = [LedStatus::NoChange; NUM_LEDS];
        for (i, led) in leds.iter_mut().enumerate() {
            let byte = value[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            *led = LedStatus::from_code(nibble);
        }
        Ok(leds)
    }

    pub fn set_led_status(&self, leds: &[LedStatus; NUM_LEDS]) -> Result<()> {
        let mut params = [0u8; 3];
        for (i, led) in leds.iter().enumerate() {
            let code = led.code()?;
            if i % 2 == 0 {
                params[i / 2] |= code << 4;
            } else {
                params[i / 2] |= code;
            }
        }
        self.set_register(REG_LED_STATUS, params)
    }

    /* ---------------------------------------------------------------- */
    /* 0x54: LED intensity, nibbles of 10% steps                         */
    /* ---------------------------------------------------------------- */

    pub fn get_led_intensity(&self) -> Result<[u8; NUM_LEDS]> {
        let value = self.get_register(REG_LED_INTENSITY, [0x00; 3])?;
        let mut percent = [0u8; NUM_LEDS];
        for (i, led) in percent.iter_mut().enumerate() {
            let byte = value[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            *led = nibble * 10;
        }
        Ok(percent)
    }

    /* A value of 0 leaves that LED's intensity unchanged. */
    pub fn set_led_intensity(&self, percent: &[u8; NUM_LEDS]) -> Result<()> {
        let mut params = [0u8; 3];
        for (i, &value) in percent.iter().enumerate() {
            if value > 100 || value % 10 != 0 {
                return Err(Error::InvalidArgument(format!(
                    "LED intensity {value}% is not a 10% step within 0..=100"
                )));
            }
            let nibble = value / 10;
            if i % 2 == 0 {
                params[i / 2] |= nibble << 4;
            } else {
                params[i / 2] |= nibble;
            }
        }
        self.set_register(REG_LED_INTENSITY, params)
    }

    /* ---------------------------------------------------------------- */
    /* 0x57: LED color                                                   */
    /* ---------------------------------------------------------------- */

    /* Color only; 0x51 turns the LED on and off. */
    pub fn get_led_color(&self) -> Result<(u8, u8, u8)> {
        let value = self.get_register(REG_LED_COLOR, [0x00; 3])?;
        Ok((value[0], value[1], value[2]))
    }

    pub fn set_led_color(&self, red: u8, green: u8, blue: u8) -> Result<()> {
        self.set_register(REG_LED_COLOR, [red, green, blue])
    }

    /* ---------------------------------------------------------------- */
    /* 0x61: optical sensor settings                                     */
    /* ---------------------------------------------------------------- */

    pub fn get_optical_sensor_settings(&self) -> Result<u8> {
        let value = self.get_register(REG_OPTICAL_SENSOR, [0x00; 3])?;
        Ok(value[0])
    }

    /* ---------------------------------------------------------------- */
    /* 0x63: current resolution                                          */
    /* ---------------------------------------------------------------- */

    /* Raw sensor codes are translated through the handle's DPI table;
     * with no table loaded the raw codes come back unchanged. */
    pub fn get_current_resolution(&self) -> Result<(u16, u16)> {
        let value = self.get_long_register(REG_CURRENT_RESOLUTION, [0x00; 3])?;
        Ok((
            dpi::resolve_res(&self.dpi_table, value[0]),
            dpi::resolve_res(&self.dpi_table, value[1]),
        ))
    }

    pub fn set_current_resolution(&self, xres: u16, yres: u16) -> Result<()> {
        let mut params = [0u8; 16];
        params[0] = dpi::res_to_raw(&self.dpi_table, xres)?;
        params[1] = dpi::res_to_raw(&self.dpi_table, yres)?;
        debug!("resolution {xres}x{yres} -> raw {:#04x}/{:#04x}", params[0], params[1]);
        self.set_long_register(REG_CURRENT_RESOLUTION, params)
    }

    /* ---------------------------------------------------------------- */
    /* 0x64: USB refresh rate                                            */
    /* ---------------------------------------------------------------- */

    pub fn get_usb_refresh_rate(&self) -> Result<u16> {
        let value = self.get_register(REG_USB_REFRESH_RATE, [0x00; 3])?;
        if value[0] == 0 {
            return Err(Error::MalformedData(
                "device reported a zero refresh-rate divider".to_string(),
            ));
        }
        Ok(1000 / u16::from(value[0]))
    }

    pub fn set_usb_refresh_rate(&self, rate: u16) -> Result<()> {
        let divider = profile::encode_refresh_rate(rate)?;
        self.set_register(REG_USB_REFRESH_RATE, [divider, 0x00, 0x00])
    }

    /* ---------------------------------------------------------------- */
    /* 0xB2: pairing lock                                                */
    /* ---------------------------------------------------------------- */

    /* Open the receiver's lock so new devices can pair. The timeout is
     * in seconds; 0 selects the receiver's default of 30s. */
    pub fn open_lock(&self, timeout: u8) -> Result<()> {
        debug!("opening pairing lock, timeout {timeout}s");
        self.set_register(REG_PAIRING_LOCK, [LOCK_OP_OPEN, 0x00, timeout])
    }

    pub fn close_lock(&self) -> Result<()> {
        self.set_register(REG_PAIRING_LOCK, [LOCK_OP_CLOSE, 0x00, 0x00])
    }

    pub fn disconnect(&self, index: u8) -> Result<()> {
        debug!("disconnecting paired device {index}");
        self.set_register(REG_PAIRING_LOCK, [LOCK_OP_DISCONNECT, index, 0x00])
    }

    /* ---------------------------------------------------------------- */
    /* 0xB5: pairing information                                         */
    /* ---------------------------------------------------------------- */

    /* Paired-device slots are numbered from 1. */
    pub fn get_pairing_information(&self, index: u8) -> Result<PairingInformation> {
        let selector = pairing_selector(PAIRING_SELECTOR_INFORMATION, index)?;
        let value = self.get_long_register(REG_PAIRING_INFORMATION, [selector, 0x00, 0x00])?;
        Ok(PairingInformation {
            report_interval: value[1],
            wpid: u16::from_be_bytes([value[2], value[3]]),
            device_type: value[7],
        })
    }

    pub fn get_pairing_information_device_name(&self, index: u8) -> Result<String> {
        let selector = pairing_selector(PAIRING_SELECTOR_NAME, index)?;
        let value = self.get_long_register(REG_PAIRING_INFORMATION, [selector, 0x00, 0x00])?;
        let len = usize::from(value[1]);
        if len > MAX_NAME_LENGTH {
            return Err(Error::MalformedData(format!(
                "device name length {len} exceeds the {MAX_NAME_LENGTH}-byte record"
            )));
        }
        String::from_utf8(value[2..2 + len].to_vec())
            .map_err(|e| Error::MalformedData(format!("device name is not valid UTF-8: {e}")))
    }

    pub fn get_extended_pairing_information(&self, index: u8) -> Result<u32> {
        let selector = pairing_selector(PAIRING_SELECTOR_EXTENDED, index)?;
        let value = self.get_long_register(REG_PAIRING_INFORMATION, [selector, 0x00, 0x00])?;
        Ok(u32::from_be_bytes([value[1], value[2], value[3], value[4]]))
    }

    /* ---------------------------------------------------------------- */
    /* 0xF1: firmware information                                        */
    /* ---------------------------------------------------------------- */

    pub fn get_firmware_information(&self) -> Result<FirmwareInformation> {
        let version =
            self.get_register(REG_FIRMWARE_INFORMATION, [FIRMWARE_SELECTOR_VERSION, 0, 0])?;
        let build = self.get_register(REG_FIRMWARE_INFORMATION, [FIRMWARE_SELECTOR_BUILD, 0, 0])?;
        Ok(FirmwareInformation {
            major: version[1],
            minor: version[2],
            build: build[1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileType;
    use crate::transport::mock::MockDevice;

    fn handle(mock: &MockDevice) -> Hidpp10Device<'_> {
        Hidpp10Device::new(mock, 0x00, ProfileType::G500)
    }

    #[test]
    fn notification_mask_round_trips_through_the_wire_bytes() {
        let mock = MockDevice::new();
        /* bits 0, 4, 8 and 18 set */
        mock.set_register(0x00, [0x11, 0x01, 0x04]);

        let dev = handle(&mock);
        let flags = dev.get_hidpp_notifications().unwrap();
        assert!(flags.consumer_vendor_specific_control);
        assert!(flags.battery_status);
        assert!(flags.wireless_notifications);
        assert!(flags.configuration_complete);
        assert!(!flags.power_keys);
        assert_eq!(flags.reserved, 0);

        dev.set_hidpp_notifications(&flags).unwrap();
        assert_eq!(mock.register(0x00), [0x11, 0x01, 0x04]);
    }

    #[test]
    fn reserved_notification_bits_survive_reads_but_block_writes() {
        let mock = MockDevice::new();
        /* bit 13 is reserved */
        mock.set_register(0x00, [0x00, 0x20, 0x00]);

        let dev = handle(&mock);
        let flags = dev.get_hidpp_notifications().unwrap();
        assert_eq!(flags.reserved, 1 << 13);

        let count = mock.request_count();
        assert!(matches!(
            dev.set_hidpp_notifications(&flags),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(mock.request_count(), count, "rejected before any I/O");
    }

    #[test]
    fn individual_features_reject_reserved_bits_on_write() {
        let mock = MockDevice::new();
        mock.set_register(0x01, [0x80, 0x02, 0x20]);

        let dev = handle(&mock);
        let features = dev.get_individual_features().unwrap();
        assert!(features.buttons_control_resolution);
        assert!(features.receiver_multiple_rf_lock);
        assert!(features.inhibit_presence_detection);
        assert_eq!(features.reserved, 0);
        dev.set_individual_features(&features).unwrap();
        assert_eq!(mock.register(0x01), [0x80, 0x02, 0x20]);

        let mut bad = features;
        bad.reserved = 1 << 8;
        assert!(matches!(
            dev.set_individual_features(&bad),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn battery_codes_decode_with_reserved_catch_all() {
        let mock = MockDevice::new();
        mock.set_register(0x07, [0x05, 0x21, 25]);

        let dev = handle(&mock);
        let status = dev.get_battery_status().unwrap();
        assert_eq!(status.level, BatteryLevel::Good);
        assert_eq!(status.charge_state, ChargeState::Charging);
        assert_eq!(status.low_threshold_percent, 25);

        mock.set_register(0x07, [0x42, 0x1F, 0]);
        let status = dev.get_battery_status().unwrap();
        assert_eq!(status.level, BatteryLevel::Reserved(0x42));
        assert_eq!(status.charge_state, ChargeState::Reserved(0x1F));
    }

    #[test]
    fn battery_mileage_is_a_long_read() {
        let mock = MockDevice::new();
        let mut value = [0u8; 16];
        value[0] = 87;
        value[1..5].copy_from_slice(&100_000u32.to_be_bytes());
        value[5] = 0x22;
        mock.set_long_register(0x0D, 0x00, value);

        let dev = handle(&mock);
        let mileage = dev.get_battery_mileage().unwrap();
        assert_eq!(mileage.level_percent, 87);
        assert_eq!(mileage.max_seconds, 100_000);
        assert_eq!(mileage.state, ChargeState::ChargingComplete);
    }

    #[test]
    fn led_status_nibbles_pack_and_unpack() {
        let mock = MockDevice::new();
        let dev = handle(&mock);

        let leds = [
            LedStatus::On,
            LedStatus::Off,
            LedStatus::Blink,
            LedStatus::NoChange,
            LedStatus::Heartbeat,
            LedStatus::SlowOff,
        ];
        dev.set_led_status(&leds).unwrap();
        assert_eq!(mock.register(0x51), [0x21, 0x30, 0x46]);
        assert_eq!(dev.get_led_status().unwrap(), leds);
    }

    #[test]
    fn led_status_unknown_codes_decode_without_failing() {
        let mock = MockDevice::new();
        mock.set_register(0x51, [0xA0, 0x00, 0x00]);

        let dev = handle(&mock);
        let leds = dev.get_led_status().unwrap();
        assert_eq!(leds[0], LedStatus::Unknown(0xA));
        assert_eq!(leds[1], LedStatus::NoChange);
    }

    #[test]
    fn led_intensity_is_in_ten_percent_steps() {
        let mock = MockDevice::new();
        let dev = handle(&mock);

        dev.set_led_intensity(&[100, 50, 0, 10, 90, 30]).unwrap();
        assert_eq!(mock.register(0x54), [0xA5, 0x01, 0x93]);
        assert_eq!(dev.get_led_intensity().unwrap(), [100, 50, 0, 10, 90, 30]);

        assert!(matches!(
            dev.set_led_intensity(&[55, 0, 0, 0, 0, 0]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(dev.set_led_intensity(&[110, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn led_color_round_trips() {
        let mock = MockDevice::new();
        let dev = handle(&mock);

        dev.set_led_color(0xFF, 0x80, 0x00).unwrap();
        assert_eq!(dev.get_led_color().unwrap(), (0xFF, 0x80, 0x00));
    }

    #[test]
    fn current_resolution_goes_through_the_dpi_table() {
        let mock = MockDevice::new();
        let mut value = [0u8; 16];
        value[0] = 0x81;
        value[1] = 0x82;
        mock.set_long_register(0x63, 0x00, value);

        let mut dev = handle(&mock);
        dev.build_dpi_table_from_list("400;800;1600").unwrap();
        assert_eq!(dev.get_current_resolution().unwrap(), (800, 1600));

        dev.set_current_resolution(400, 800).unwrap();
        let log = mock.log.borrow();
        let last = log.last().unwrap();
        assert_eq!(last.address(), 0x63);
        assert_eq!(&last.params()[..2], &[0x80, 0x81]);
        drop(log);

        assert!(matches!(
            dev.set_current_resolution(500, 500),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn refresh_rate_uses_the_divider_encoding() {
        let mock = MockDevice::new();
        let dev = handle(&mock);

        dev.set_usb_refresh_rate(500).unwrap();
        assert_eq!(mock.register(0x64), [2, 0, 0]);
        assert_eq!(dev.get_usb_refresh_rate().unwrap(), 500);

        mock.set_register(0x64, [0, 0, 0]);
        assert!(matches!(
            dev.get_usb_refresh_rate(),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn pairing_lock_operations_use_the_documented_payloads() {
        let mock = MockDevice::new();
        let dev = handle(&mock);

        dev.open_lock(10).unwrap();
        assert_eq!(mock.register(0xB2), [0x01, 0x00, 10]);
        dev.close_lock().unwrap();
        assert_eq!(mock.register(0xB2), [0x02, 0x00, 0x00]);
        dev.disconnect(2).unwrap();
        assert_eq!(mock.register(0xB2), [0x03, 0x02, 0x00]);
    }

    #[test]
    fn pairing_information_selectors_are_offset_by_the_slot() {
        let mock = MockDevice::new();
        let mut info = [0u8; 16];
        info[1] = 0x08;
        info[2] = 0x40;
        info[3] = 0x5B;
        info[7] = 0x02;
        mock.set_long_register(0xB5, 0x21, info);

        let mut serial = [0u8; 16];
        serial[1..5].copy_from_slice(&0xDEADBEEFu32.to_be_bytes());
        mock.set_long_register(0xB5, 0x31, serial);

        let mut name = [0u8; 16];
        name[1] = 5;
        name[2..7].copy_from_slice(b"M705 ");
        mock.set_long_register(0xB5, 0x41, name);

        let dev = handle(&mock);
        let info = dev.get_pairing_information(2).unwrap();
        assert_eq!(info.report_interval, 0x08);
        assert_eq!(info.wpid, 0x405B);
        assert_eq!(info.device_type, 0x02);
        assert_eq!(dev.get_extended_pairing_information(2).unwrap(), 0xDEADBEEF);
        assert_eq!(dev.get_pairing_information_device_name(2).unwrap(), "M705 ");

        assert!(matches!(
            dev.get_pairing_information(0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn oversized_device_name_length_is_malformed() {
        let mock = MockDevice::new();
        let mut name = [0u8; 16];
        name[1] = 15;
        mock.set_long_register(0xB5, 0x40, name);

        let dev = handle(&mock);
        assert!(matches!(
            dev.get_pairing_information_device_name(1),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn firmware_version_needs_two_selector_reads() {
        let mock = MockDevice::new();
        mock.set_selector_register(0xF1, 0x01, [0x01, 2, 8]);
        mock.set_selector_register(0xF1, 0x02, [0x02, 34, 0]);

        let dev = handle(&mock);
        let fw = dev.get_firmware_information().unwrap();
        assert_eq!(fw.major, 2);
        assert_eq!(fw.minor, 8);
        assert_eq!(fw.build, 34);
    }
}
