/* DPI table construction. */
/*  */
/* HID++ 1.0 sensors speak one-byte raw resolution codes; the mapping to */
/* human DPI values is per-device and comes from the device database as */
/* one of two textual formats. Both builders are pure string parsers, no */
/* device I/O. */

use crate::error::{Error, Result};

/* One raw sensor code and the DPI value it selects. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpiMapping {
    pub raw_value: u8,
    pub dpi: u32,
}

/* An immutable, explicit-length table of raw-code/DPI pairs. */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DpiTable {
    entries: Vec<DpiMapping>,
}

impl DpiTable {
    /* Build a table from a semicolon-separated list of DPI values. */
    /*  */
    /* The n-th element (1-indexed) maps to raw code `0x80 + n - 1`. */
    /* An empty string yields an empty table. */
    pub fn from_list(str_list: &str) -> Result<Self> {
        if str_list.is_empty() {
            return Ok(Self::default());
        }

        let values: Vec<&str> = str_list.split(';').collect();
        if values.len() > 0x80 {
            return Err(Error::InvalidArgument(format!(
                "DPI list has {} entries, raw codes only span 0x80..=0xFF",
                values.len()
            )));
        }

        let mut entries = Vec::with_capacity(values.len());
        for (n, value) in values.iter().enumerate() {
            let dpi: u32 = value.parse().map_err(|_| {
                Error::InvalidArgument(format!("bad DPI list element {value:?} in {str_list:?}"))
            })?;
            if dpi == 0 {
                return Err(Error::InvalidArgument(format!(
                    "DPI values must be positive in {str_list:?}"
                )));
            }
            entries.push(DpiMapping {
                raw_value: 0x80 + n as u8,
                dpi,
            });
        }
        Ok(Self { entries })
    }

    /* Build a table from a `MIN:MAX@STEP` range descriptor. */
    /*  */
    /* Raw code 0 maps to MIN, raw code k to `MIN + k * STEP`; the */
    /* largest valid raw code is `floor((MAX - MIN) / STEP)`. */
    pub fn from_dpi_info(str_dpi: &str) -> Result<Self> {
        let bad = || Error::InvalidArgument(format!("bad DPI range descriptor {str_dpi:?}"));

        let (range, step) = str_dpi.split_once('@').ok_or_else(bad)?;
        let (min, max) = range.split_once(':').ok_or_else(bad)?;

        let min: f64 = min.parse().map_err(|_| bad())?;
        let max: f64 = max.parse().map_err(|_| bad())?;
        let step: f64 = step.parse().map_err(|_| bad())?;

        if step <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "DPI step must be positive in {str_dpi:?}"
            )));
        }
        if max < min {
            return Err(Error::InvalidArgument(format!(
                "DPI range is inverted in {str_dpi:?}"
            )));
        }
        if min < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "DPI range minimum must not be negative in {str_dpi:?}"
            )));
        }

        let max_raw = ((max - min) / step).floor() as u64;
        if max_raw > 0xFF {
            return Err(Error::InvalidArgument(format!(
                "DPI range {str_dpi:?} needs {} codes, raw codes are one byte",
                max_raw + 1
            )));
        }

        let entries = (0..=max_raw)
            .map(|k| DpiMapping {
                raw_value: k as u8,
                dpi: (min + k as f64 * step).round() as u32,
            })
            .collect();
        Ok(Self { entries })
    }

    /* Resolve a raw sensor code to its DPI value. */
    pub fn dpi(&self, raw_value: u8) -> Option<u32> {
        self.entries
            .iter()
            .find(|m| m.raw_value == raw_value)
            .map(|m| m.dpi)
    }

    /* Resolve a DPI value to its raw sensor code (exact match). */
    pub fn raw(&self, dpi: u32) -> Option<u8> {
        self.entries
            .iter()
            .find(|m| m.dpi == dpi)
            .map(|m| m.raw_value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DpiMapping> {
        self.entries.iter()
    }
}

/* Translate a raw sensor code for presentation: the DPI value when the
 * table knows the code, the raw code itself otherwise. Table entries
 * beyond the u16 range saturate rather than wrap. */
pub(crate) fn resolve_res(table: &DpiTable, raw: u8) -> u16 {
    match table.dpi(raw) {
        Some(dpi) => u16::try_from(dpi).unwrap_or(u16::MAX),
        None => u16::from(raw),
    }
}

/* Translate a resolution back to its raw code. Without a table the
 * value must already be a raw code. */
pub(crate) fn res_to_raw(table: &DpiTable, res: u16) -> Result<u8> {
    if table.is_empty() {
        return u8::try_from(res).map_err(|_| {
            Error::InvalidArgument(format!(
                "resolution {res} is not a raw code and no DPI table is loaded"
            ))
        });
    }
    table.raw(u32::from(res)).ok_or_else(|| {
        Error::InvalidArgument(format!("resolution {res} is not in the device's DPI table"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_maps_to_0x80_based_codes() {
        let table = DpiTable::from_list("400;800;1600").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.dpi(0x80), Some(400));
        assert_eq!(table.dpi(0x81), Some(800));
        assert_eq!(table.dpi(0x82), Some(1600));
        assert_eq!(table.dpi(0x83), None);
        assert_eq!(table.raw(800), Some(0x81));
    }

    #[test]
    fn empty_list_is_an_empty_table() {
        let table = DpiTable::from_list("").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn list_rejects_junk() {
        assert!(DpiTable::from_list("400;eight hundred").is_err());
        assert!(DpiTable::from_list("400;;800").is_err());
        assert!(DpiTable::from_list("400;0;800").is_err());
        assert!(DpiTable::from_list("-400").is_err());
    }

    #[test]
    fn range_covers_min_to_max() {
        let table = DpiTable::from_dpi_info("200:400@50").unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.dpi(0), Some(200));
        assert_eq!(table.dpi(4), Some(400));
        assert_eq!(table.dpi(5), None);
        assert_eq!(table.raw(250), Some(1));
    }

    #[test]
    fn range_with_uneven_step_stops_below_max() {
        /* floor((1000 - 100) / 150) = 6, so the top entry is 1000 */
        let table = DpiTable::from_dpi_info("100:1000@150").unwrap();
        assert_eq!(table.len(), 7);
        assert_eq!(table.dpi(6), Some(1000));

        /* max not reachable: top entry is the largest value <= max */
        let table = DpiTable::from_dpi_info("100:999@150").unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.dpi(5), Some(850));
    }

    #[test]
    fn range_rejects_bad_descriptors() {
        assert!(DpiTable::from_dpi_info("200:400").is_err());
        assert!(DpiTable::from_dpi_info("200@400:50").is_err());
        assert!(DpiTable::from_dpi_info("200:400@0").is_err());
        assert!(DpiTable::from_dpi_info("200:400@-50").is_err());
        assert!(DpiTable::from_dpi_info("400:200@50").is_err());
        assert!(DpiTable::from_dpi_info("0:1000000@1").is_err());
    }

    #[test]
    fn negative_minimum_names_the_minimum_not_the_order() {
        let err = DpiTable::from_dpi_info("-200:400@50").unwrap_err();
        assert!(err.to_string().contains("negative"), "{err}");
        let err = DpiTable::from_dpi_info("400:200@50").unwrap_err();
        assert!(err.to_string().contains("inverted"), "{err}");
    }

    #[test]
    fn oversized_table_entries_saturate_on_resolve() {
        let table = DpiTable::from_list("400;90000").unwrap();
        assert_eq!(resolve_res(&table, 0x80), 400);
        assert_eq!(resolve_res(&table, 0x81), u16::MAX);
    }

    #[test]
    fn fractional_steps_round_to_integers() {
        let table = DpiTable::from_dpi_info("100:200@33.3").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.dpi(1), Some(133));
        assert_eq!(table.dpi(3), Some(200));
    }
}
