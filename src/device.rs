/* HID++ 1.0 device handle. */
/*  */
/* Aggregates the transport reference, the device index, the resolved */
/* DPI table, the profile directory and the decoded profile set, and */
/* owns the multi-step operations (profile reads chasing macro jumps, */
/* erase/stage/commit profile writes) that the pure codec modules stay */
/* out of. */

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::dpi::DpiTable;
use crate::error::{Error, Result};
use crate::macros::{self, JumpTarget, MacroData};
use crate::profile::{
    self, Button, DirectoryEntry, Profile, ProfileType, PROFILE_DIRECTORY_PAGE,
    PROFILE_RECORD_SIZE,
};
use crate::report::{
    Report, SUB_ID_GET_LONG_REGISTER, SUB_ID_GET_REGISTER, SUB_ID_SET_LONG_REGISTER,
    SUB_ID_SET_REGISTER,
};
use crate::transport::Transport;
use crate::{MAX_PAGE_NUMBER, NUM_PROFILES, PAGE_SIZE};

/* Register addresses handled directly by the handle */
const REG_CURRENT_PROFILE: u8 = 0x0F;

/* A macro may chain across runs/pages; a stored macro longer than this
 * many runs is treated as corrupt. */
const MACRO_RUN_LIMIT: usize = 64;

pub struct Hidpp10Device<'t> {
    transport: &'t dyn Transport,
    index: u8,
    pub profile_type: ProfileType,
    /* Empty until built from a device-database string. */
    pub dpi_table: DpiTable,
    /* Empty until read from flash. */
    pub profile_directory: Vec<DirectoryEntry>,
    pub profiles: Vec<Profile>,
}

impl<'t> Hidpp10Device<'t> {
    /* A fresh handle. The transport is borrowed: it outlives the handle
     * and may be shared with other devices behind the same receiver. */
    pub fn new(transport: &'t dyn Transport, index: u8, profile_type: ProfileType) -> Self {
        Self {
            transport,
            index,
            profile_type,
            dpi_table: DpiTable::default(),
            profile_directory: Vec::new(),
            profiles: Vec::new(),
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /* Replace the DPI table from a semicolon-separated value list. */
    pub fn build_dpi_table_from_list(&mut self, str_list: &str) -> Result<()> {
        self.dpi_table = DpiTable::from_list(str_list)?;
        Ok(())
    }

    /* Replace the DPI table from a MIN:MAX@STEP descriptor. */
    pub fn build_dpi_table_from_dpi_info(&mut self, str_dpi: &str) -> Result<()> {
        self.dpi_table = DpiTable::from_dpi_info(str_dpi)?;
        Ok(())
    }

    /* ---------------------------------------------------------------- */
    /* Register plumbing                                                 */
    /* ---------------------------------------------------------------- */

    fn command(&self, request: &Report) -> Result<Report> {
        let response = self.transport.request(request)?;
        if let Some(err) = response.as_device_error() {
            warn!("device {}: {err}", self.index);
            return Err(err);
        }
        if response.sub_id() != request.sub_id() || response.address() != request.address() {
            return Err(Error::MalformedData(format!(
                "response (sub-ID {:#04x}, address {:#04x}) does not match request \
                 (sub-ID {:#04x}, address {:#04x})",
                response.sub_id(),
                response.address(),
                request.sub_id(),
                request.address()
            )));
        }
        Ok(response)
    }

    pub(crate) fn get_register(&self, register: u8, params: [u8; 3]) -> Result<[u8; 3]> {
        let request = Report::short(self.index, SUB_ID_GET_REGISTER, register, params);
        let response = self.command(&request)?;
        let mut value = [0u8; 3];
        value.copy_from_slice(&response.params()[..3]);
        debug!("GET_REGISTER {register:#04x} -> {value:02x?}");
        Ok(value)
    }

    pub(crate) fn set_register(&self, register: u8, params: [u8; 3]) -> Result<()> {
        debug!("SET_REGISTER {register:#04x} <- {params:02x?}");
        let request = Report::short(self.index, SUB_ID_SET_REGISTER, register, params);
        self.command(&request)?;
        Ok(())
    }

    pub(crate) fn get_long_register(&self, register: u8, params: [u8; 3]) -> Result<[u8; 16]> {
        let request = Report::short(self.index, SUB_ID_GET_LONG_REGISTER, register, params);
        let response = self.command(&request)?;
        let raw = response.params();
        if raw.len() < 16 {
            return Err(Error::MalformedData(format!(
                "long register {register:#04x} answered with a short report"
            )));
        }
        let mut value = [0u8; 16];
        value.copy_from_slice(&raw[..16]);
        debug!("GET_LONG_REGISTER {register:#04x} -> {value:02x?}");
        Ok(value)
    }

    pub(crate) fn set_long_register(&self, register: u8, params: [u8; 16]) -> Result<()> {
        debug!("SET_LONG_REGISTER {register:#04x} <- {params:02x?}");
        let request = Report::long(self.index, SUB_ID_SET_LONG_REGISTER, register, params);
        self.command(&request)?;
        Ok(())
    }

    /* Raw frame request for the HOT payload path, which does not follow
     * register sub-ID conventions. */
    pub(crate) fn send_raw(&self, request: &Report) -> Result<Report> {
        self.command(request)
    }

    /* ---------------------------------------------------------------- */
    /* 0x0F: current profile                                             */
    /* ---------------------------------------------------------------- */

    pub fn get_current_profile(&self) -> Result<u8> {
        let value = self.get_register(REG_CURRENT_PROFILE, [0x00; 3])?;
        Ok(value[0])
    }

    /* Fails before any write if `index` does not resolve through the
     * directory. */
    pub fn set_current_profile(&mut self, index: u8) -> Result<()> {
        self.ensure_directory()?;
        if usize::from(index) >= self.profile_directory.len() {
            return Err(Error::InvalidArgument(format!(
                "profile {index} does not exist, the directory holds {}",
                self.profile_directory.len()
            )));
        }
        self.set_register(REG_CURRENT_PROFILE, [index, 0x00, 0x00])
    }

    /* ---------------------------------------------------------------- */
    /* Profile directory                                                 */
    /* ---------------------------------------------------------------- */

    /* Read and decode up to `nelems` directory entries. Fewer populated
     * entries than requested is normal and not an error. */
    pub fn get_profile_directory(&self, nelems: usize) -> Result<Vec<DirectoryEntry>> {
        /* bounds-checked here as well so a bad request does not cost a
         * 32-row page read first */
        if nelems > usize::from(MAX_PAGE_NUMBER) {
            return Err(Error::InvalidArgument(format!(
                "{nelems} directory entries requested, the device stores at most {MAX_PAGE_NUMBER}"
            )));
        }
        let page = self.read_page(PROFILE_DIRECTORY_PAGE)?;
        let entries = profile::decode_directory(&page, nelems)?;
        debug!(
            "directory: {} of up to {nelems} entries populated",
            entries.len()
        );
        Ok(entries)
    }

    fn ensure_directory(&mut self) -> Result<()> {
        if self.profile_directory.is_empty() {
            self.profile_directory = self.get_profile_directory(NUM_PROFILES)?;
        }
        Ok(())
    }

    fn directory_entry(&self, number: u8) -> Result<DirectoryEntry> {
        self.profile_directory
            .get(usize::from(number))
            .copied()
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "profile {number} does not exist, the directory holds {}",
                    self.profile_directory.len()
                ))
            })
    }

    /* ---------------------------------------------------------------- */
    /* Profile read                                                      */
    /* ---------------------------------------------------------------- */

    /* Read one profile from flash, including every macro its buttons
     * reference. The profile does not count as decoded until all macro
     * fetches succeed. */
    pub fn get_profile(&mut self, number: u8) -> Result<Profile> {
        self.ensure_directory()?;
        let entry = self.directory_entry(number)?;

        let page = self.read_page(entry.page)?;
        let offset = usize::from(entry.offset);
        if offset + PROFILE_RECORD_SIZE > PAGE_SIZE {
            return Err(Error::MalformedData(format!(
                "profile {number} at page {}, offset {offset} overruns the page",
                entry.page
            )));
        }

        let mut profile = Profile::decode(&page[offset..], self.profile_type, &self.dpi_table)?;

        let mut cache: HashMap<u8, [u8; PAGE_SIZE]> = HashMap::from([(entry.page, page)]);
        for (i, button) in profile.buttons.clone().iter().enumerate() {
            if let Button::Macro { page, offset, .. } = *button {
                profile.macros[i] = Some(self.fetch_macro(page, u16::from(offset), &mut cache)?);
            }
        }
        Ok(profile)
    }

    /* Load the directory and every profile it indexes onto the handle. */
    pub fn read_profiles(&mut self) -> Result<()> {
        self.ensure_directory()?;
        let count = self.profile_directory.len();
        let mut profiles = Vec::with_capacity(count);
        for number in 0..count {
            profiles.push(self.get_profile(number as u8)?);
        }
        self.profiles = profiles;
        debug!("loaded {count} profiles from flash");
        Ok(())
    }

    /* Follow a stored macro's run chain, fetching pages as needed. */
    /*  */
    /* Revisiting a (page, offset) run start means the jump graph loops; */
    /* that is corrupt data, not something to follow forever. */
    fn fetch_macro(
        &self,
        page: u8,
        offset: u16,
        cache: &mut HashMap<u8, [u8; PAGE_SIZE]>,
    ) -> Result<Vec<MacroData>> {
        let mut instructions = Vec::new();
        let mut visited: HashSet<JumpTarget> = HashSet::new();
        let mut cursor = JumpTarget { page, offset };

        loop {
            if cursor.page > MAX_PAGE_NUMBER {
                return Err(Error::MalformedData(format!(
                    "macro jump target page {} is beyond page {MAX_PAGE_NUMBER}",
                    cursor.page
                )));
            }
            if !visited.insert(cursor) {
                return Err(Error::MalformedData(format!(
                    "cyclic macro jump graph revisits page {}, offset {}",
                    cursor.page, cursor.offset
                )));
            }
            if visited.len() > MACRO_RUN_LIMIT {
                return Err(Error::MalformedData(format!(
                    "macro jump chain exceeds {MACRO_RUN_LIMIT} runs"
                )));
            }

            if !cache.contains_key(&cursor.page) {
                let fetched = self.read_page(cursor.page)?;
                cache.insert(cursor.page, fetched);
            }
            let data = &cache[&cursor.page];

            let run = macros::decode_run(data, cursor.offset)?;
            instructions.extend(run.instructions);
            match run.next {
                Some(target) => cursor = target,
                None => break,
            }
        }
        Ok(instructions)
    }

    /* ---------------------------------------------------------------- */
    /* Profile write                                                     */
    /* ---------------------------------------------------------------- */

    /* Write one profile and its macros back to flash. */
    /*  */
    /* All touched pages go through read-modify-write: read the current
     * image, patch it, erase, stage the new image as a HOT payload,
     * commit. Once the first erase has happened a failure leaves the
     * device inconsistent, which is surfaced as WriteIncomplete so the
     * caller re-issues the whole profile. */
    pub fn set_profile(&mut self, number: u8, new_profile: &Profile) -> Result<()> {
        self.ensure_directory()?;
        let entry = self.directory_entry(number)?;

        let record = new_profile.encode(self.profile_type, &self.dpi_table)?;

        /* Assemble the target page images host-side first so that every
         * validation error fires before the device is touched. */
        let mut images: HashMap<u8, [u8; PAGE_SIZE]> = HashMap::new();

        let mut image = self.read_page(entry.page)?;
        patch_image(&mut image, usize::from(entry.offset), &record, entry.page)?;
        images.insert(entry.page, image);

        for (i, button) in new_profile.buttons.iter().enumerate() {
            let Button::Macro { page, offset, .. } = *button else {
                continue;
            };
            let Some(Some(instructions)) = new_profile.macros.get(i) else {
                return Err(Error::InvalidArgument(format!(
                    "button {i} references a macro but no instructions are attached"
                )));
            };
            let bytes = macros::encode_macro(instructions)?;

            let mut image = match images.remove(&page) {
                Some(image) => image,
                None => self.read_page(page)?,
            };
            patch_image(&mut image, usize::from(offset), &bytes, page)?;
            images.insert(page, image);
        }

        /* Burn the pages, the profile-record page last so that a partial
         * failure cannot leave the directory pointing at a half-written
         * record with all its macros missing. */
        let mut pages: Vec<u8> = images.keys().copied().collect();
        pages.sort_unstable();
        pages.retain(|&p| p != entry.page);
        pages.push(entry.page);

        let mut dirty = false;
        for page in pages {
            let image = images[&page];
            self.erase_page(page).map_err(|e| wrap_dirty(e, dirty))?;
            dirty = true;
            self.send_hot_payload(page, 0, &image)
                .map_err(|e| wrap_dirty(e, true))?;
        }

        if let Some(cached) = self.profiles.get_mut(usize::from(number)) {
            *cached = new_profile.clone();
        }
        debug!("profile {number} written to page {}", entry.page);
        Ok(())
    }
}

fn patch_image(image: &mut [u8; PAGE_SIZE], offset: usize, bytes: &[u8], page: u8) -> Result<()> {
    if offset + bytes.len() > PAGE_SIZE {
        return Err(Error::InvalidArgument(format!(
            "{} bytes at offset {offset} overrun page {page}",
            bytes.len()
        )));
    }
    image[offset..offset + bytes.len()].copy_from_slice(bytes);
    Ok(())
}

fn wrap_dirty(err: Error, dirty: bool) -> Error {
    if dirty {
        Error::WriteIncomplete(err.to_string())
    } else {
        err
    }
}
