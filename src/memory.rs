/* Flash paging model. */
/*  */
/* The device exposes its flash as 32 pages of 512 bytes (16 rows by */
/* 2 banks by 16 bytes), addressed by (page, byte offset). Reads come */
/* through register 0xA2 one row at a time; bulk writes are staged as a */
/* HOT payload (sub-IDs 0x90..0x93) and burned by a write to control */
/* register 0xA1; register 0xA0 erases pages and runs device-side */
/* copies. Page-range and boundary checks fire before any transport */
/* call so a failed precondition never does partial I/O. Retry policy */
/* is the transport's business, not ours. */

use tracing::debug;

use crate::device::Hidpp10Device;
use crate::error::{Error, Result};
use crate::report::{Report, SUB_ID_HOT_FIRST};
use crate::{MAX_PAGE_NUMBER, PAGE_SIZE};

/* Register addresses */
const REG_MEMORY_MANAGEMENT: u8 = 0xA0;
const REG_HOT_CONTROL: u8 = 0xA1;
const REG_READ_SECTOR: u8 = 0xA2;

/* 0xA0 sub-operations */
const MEMORY_OP_ERASE_PAGE: u8 = 0x02;
const MEMORY_OP_COPY: u8 = 0x03;

pub const ROW_SIZE: usize = 16;

/* Payload bytes carried by the first HOT frame, after the
 * page/offset/size header. */
const HOT_FIRST_FRAME_DATA: usize = 11;
const HOT_FRAME_DATA: usize = 16;

fn check_page(page: u8) -> Result<()> {
    if page > MAX_PAGE_NUMBER {
        return Err(Error::InvalidArgument(format!(
            "page {page} is beyond page {MAX_PAGE_NUMBER}"
        )));
    }
    Ok(())
}

fn check_span(page: u8, offset: u16, len: usize) -> Result<()> {
    check_page(page)?;
    if usize::from(offset) + len > PAGE_SIZE {
        return Err(Error::InvalidArgument(format!(
            "{len} bytes at offset {offset} cross the boundary of page {page}"
        )));
    }
    Ok(())
}

/* 16-bit additive checksum sent with the HOT commit. */
pub(crate) fn payload_checksum(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(u16::from(byte)))
}

impl Hidpp10Device<'_> {
    /* ---------------------------------------------------------------- */
    /* 0xA0: generic memory management                                   */
    /* ---------------------------------------------------------------- */

    /* Erase one whole flash page. Erased flash reads back as 0xFF. */
    pub fn erase_page(&self, page: u8) -> Result<()> {
        check_page(page)?;
        debug!("erasing page {page}");
        let mut params = [0u8; 16];
        params[0] = MEMORY_OP_ERASE_PAGE;
        params[1] = page;
        self.set_long_register(REG_MEMORY_MANAGEMENT, params)
    }

    /* Device-side flash copy; no data crosses the wire. */
    pub fn write_flash(
        &self,
        src_page: u8,
        src_offset: u16,
        dst_page: u8,
        dst_offset: u16,
        size: u16,
    ) -> Result<()> {
        check_span(src_page, src_offset, usize::from(size))?;
        check_span(dst_page, dst_offset, usize::from(size))?;
        debug!(
            "flash copy: {size} bytes, page {src_page} offset {src_offset} -> \
             page {dst_page} offset {dst_offset}"
        );
        let mut params = [0u8; 16];
        params[0] = MEMORY_OP_COPY;
        params[1] = src_page;
        params[2..4].copy_from_slice(&src_offset.to_be_bytes());
        params[4] = dst_page;
        params[5..7].copy_from_slice(&dst_offset.to_be_bytes());
        params[7..9].copy_from_slice(&size.to_be_bytes());
        self.set_long_register(REG_MEMORY_MANAGEMENT, params)
    }

    /* ---------------------------------------------------------------- */
    /* 0x9x + 0xA1: HOT payload                                          */
    /* ---------------------------------------------------------------- */

    /* Stage `data` for (dst_page, dst_offset) and commit it. */
    /*  */
    /* The first frame (sub-ID 0x90) carries the destination and total
     * size plus the first data bytes; continuation frames rotate
     * through sub-IDs 0x91..0x93. The commit write to 0xA1 carries an
     * additive checksum the device verifies before burning. */
    pub fn send_hot_payload(&self, dst_page: u8, dst_offset: u16, data: &[u8]) -> Result<()> {
        check_span(dst_page, dst_offset, data.len())?;
        if data.is_empty() {
            return Err(Error::InvalidArgument(
                "empty HOT payload".to_string(),
            ));
        }
        let size = data.len() as u16;
        debug!("HOT payload: {size} bytes -> page {dst_page} offset {dst_offset}");

        let mut params = [0u8; 16];
        params[0] = dst_page;
        params[1..3].copy_from_slice(&dst_offset.to_be_bytes());
        params[3..5].copy_from_slice(&size.to_be_bytes());
        let first = data.len().min(HOT_FIRST_FRAME_DATA);
        params[5..5 + first].copy_from_slice(&data[..first]);
        self.send_raw(&Report::long(self.index(), SUB_ID_HOT_FIRST, 0x00, params))?;

        for (i, chunk) in data[first..].chunks(HOT_FRAME_DATA).enumerate() {
            let mut params = [0u8; 16];
            params[..chunk.len()].copy_from_slice(chunk);
            let sub_id = SUB_ID_HOT_FIRST + 1 + (i % 3) as u8;
            self.send_raw(&Report::long(self.index(), sub_id, 0x00, params))?;
        }

        let checksum = payload_checksum(data);
        let [hi, lo] = checksum.to_be_bytes();
        self.set_register(REG_HOT_CONTROL, [0x01, hi, lo])
    }

    /* ---------------------------------------------------------------- */
    /* 0xA2: read sector                                                 */
    /* ---------------------------------------------------------------- */

    /* Read one 16-byte row. `offset` is in bytes and must not cross the
     * page boundary. */
    pub fn read_memory(&self, page: u8, offset: u16) -> Result<[u8; ROW_SIZE]> {
        check_span(page, offset, ROW_SIZE)?;
        let [hi, lo] = offset.to_be_bytes();
        self.get_long_register(REG_READ_SECTOR, [page, hi, lo])
    }

    /* Read one whole 512-byte page, row by row. */
    pub fn read_page(&self, page: u8) -> Result<[u8; PAGE_SIZE]> {
        check_page(page)?;
        let mut bytes = [0u8; PAGE_SIZE];
        for row in 0..(PAGE_SIZE / ROW_SIZE) {
            let offset = row * ROW_SIZE;
            let data = self.read_memory(page, offset as u16)?;
            bytes[offset..offset + ROW_SIZE].copy_from_slice(&data);
        }
        Ok(bytes)
    }
}
