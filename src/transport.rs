/* Transport abstraction for HID++ 1.0 register traffic. */
/*  */
/* All hardware I/O goes through this trait so that the codec never */
/* touches device nodes directly. Implementations own report framing, */
/* retries and timeouts; the codec only needs one blocking */
/* request/response primitive. Callers sharing a transport across */
/* concurrent users must serialize requests themselves — the device */
/* accepts one command at a time. */

use crate::error::Result;
use crate::report::Report;

pub trait Transport: Send {
    /* Send a request report and return the device's response report. */
    /*  */
    /* The response may be an 0x8F error report; decoding it into a */
    /* typed error is the codec's job, not the transport's. */
    fn request(&self, report: &Report) -> Result<Report>;
}

/* A synthetic HID++ 1.0 device used by the unit tests: a register file */
/* plus a 32-page simulated flash that honors the memory-access */
/* registers (0xA0/0xA1/0xA2) and HOT payload transfers. */
