/* Macro bytecode codec. */
/*  */
/* Device macros are sequences of fixed-width 5-byte records, dispatched */
/* on the opcode in byte 0. Unused trailing bytes of a short variant are */
/* zero on encode and ignored on decode. Control flow may leave the */
/* current flash page, so decoding is split in two: this module walks */
/* the bytes it is given and hands unresolved jump targets back to the */
/* caller; the device handle owns the page fetching and the cycle guard. */

use crate::error::{Error, Result};
use crate::MAX_PAGE_NUMBER;

pub const MACRO_DATA_SIZE: usize = 5;

/* Opcodes */
const OP_NOOP: u8 = 0x00;
const OP_WAIT_FOR_BUTTON_RELEASE: u8 = 0x01;
const OP_REPEAT_UNTIL_BUTTON_RELEASE: u8 = 0x02;
const OP_REPEAT: u8 = 0x03;
const OP_KEY_PRESS: u8 = 0x20;
const OP_KEY_RELEASE: u8 = 0x21;
const OP_MOD_PRESS: u8 = 0x22;
const OP_MOD_RELEASE: u8 = 0x23;
const OP_MOUSE_WHEEL: u8 = 0x24;
const OP_MOUSE_BUTTON_PRESS: u8 = 0x40;
const OP_MOUSE_BUTTON_RELEASE: u8 = 0x41;
const OP_KEY_CONSUMER_CONTROL: u8 = 0x42;
const OP_DELAY: u8 = 0x43;
const OP_JUMP: u8 = 0x44;
const OP_JUMP_IF_PRESSED: u8 = 0x45;
const OP_MOUSE_POINTER_MOVE: u8 = 0x60;
const OP_JUMP_IF_RELEASED_TIMEOUT: u8 = 0x61;
const OP_END: u8 = 0xFF;

/* A flash location a jump transfers control to. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JumpTarget {
    pub page: u8,
    pub offset: u16,
}

/* One decoded macro instruction. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroData {
    NoOp,
    WaitForButtonRelease,
    RepeatUntilButtonRelease,
    Repeat,
    KeyPress { key: u8 },
    KeyRelease { key: u8 },
    ModPress { modifier: u8 },
    ModRelease { modifier: u8 },
    MouseWheel { value: i8 },
    MouseButtonPress { flags: u16 },
    MouseButtonRelease { flags: u16 },
    ConsumerControl { key: u16 },
    Delay { time_ms: u16 },
    Jump(JumpTarget),
    JumpIfPressed(JumpTarget),
    PointerMove { x: i16, y: i16 },
    JumpIfReleasedTimeout { timeout_ms: u16, target: JumpTarget },
    End,
}

impl MacroData {
    /* Decode one 5-byte record. Unknown opcodes are an error: they mean */
    /* a corrupt page or a device variant this layer does not know. */
    pub fn from_bytes(bytes: [u8; MACRO_DATA_SIZE]) -> Result<Self> {
        let data = match bytes[0] {
            OP_NOOP => Self::NoOp,
            OP_WAIT_FOR_BUTTON_RELEASE => Self::WaitForButtonRelease,
            OP_REPEAT_UNTIL_BUTTON_RELEASE => Self::RepeatUntilButtonRelease,
            OP_REPEAT => Self::Repeat,
            OP_KEY_PRESS => Self::KeyPress { key: bytes[1] },
            OP_KEY_RELEASE => Self::KeyRelease { key: bytes[1] },
            OP_MOD_PRESS => Self::ModPress { modifier: bytes[1] },
            OP_MOD_RELEASE => Self::ModRelease { modifier: bytes[1] },
            OP_MOUSE_WHEEL => Self::MouseWheel {
                value: bytes[1] as i8,
            },
            OP_MOUSE_BUTTON_PRESS => Self::MouseButtonPress {
                flags: u16::from_be_bytes([bytes[1], bytes[2]]),
            },
            OP_MOUSE_BUTTON_RELEASE => Self::MouseButtonRelease {
                flags: u16::from_be_bytes([bytes[1], bytes[2]]),
            },
            OP_KEY_CONSUMER_CONTROL => Self::ConsumerControl {
                key: u16::from_be_bytes([bytes[1], bytes[2]]),
            },
            OP_DELAY => Self::Delay {
                time_ms: u16::from_be_bytes([bytes[1], bytes[2]]),
            },
            OP_JUMP => Self::Jump(JumpTarget {
                page: bytes[1],
                offset: u16::from(bytes[2]),
            }),
            OP_JUMP_IF_PRESSED => Self::JumpIfPressed(JumpTarget {
                page: bytes[1],
                offset: u16::from(bytes[2]),
            }),
            OP_MOUSE_POINTER_MOVE => Self::PointerMove {
                x: i16::from_be_bytes([bytes[1], bytes[2]]),
                y: i16::from_be_bytes([bytes[3], bytes[4]]),
            },
            OP_JUMP_IF_RELEASED_TIMEOUT => Self::JumpIfReleasedTimeout {
                timeout_ms: u16::from_be_bytes([bytes[1], bytes[2]]),
                target: JumpTarget {
                    page: bytes[3],
                    offset: u16::from(bytes[4]),
                },
            },
            OP_END => Self::End,
            opcode => {
                return Err(Error::MalformedData(format!(
                    "unknown macro opcode {opcode:#04x}"
                )));
            }
        };
        Ok(data)
    }

    /* Encode to the 5-byte wire record. */
    pub fn to_bytes(&self) -> Result<[u8; MACRO_DATA_SIZE]> {
        let mut bytes = [0u8; MACRO_DATA_SIZE];
        match *self {
            Self::NoOp => bytes[0] = OP_NOOP,
            Self::WaitForButtonRelease => bytes[0] = OP_WAIT_FOR_BUTTON_RELEASE,
            Self::RepeatUntilButtonRelease => bytes[0] = OP_REPEAT_UNTIL_BUTTON_RELEASE,
            Self::Repeat => bytes[0] = OP_REPEAT,
            Self::KeyPress { key } => {
                bytes[0] = OP_KEY_PRESS;
                bytes[1] = key;
            }
            Self::KeyRelease { key } => {
                bytes[0] = OP_KEY_RELEASE;
                bytes[1] = key;
            }
            Self::ModPress { modifier } => {
                bytes[0] = OP_MOD_PRESS;
                bytes[1] = modifier;
            }
            Self::ModRelease { modifier } => {
                bytes[0] = OP_MOD_RELEASE;
                bytes[1] = modifier;
            }
            Self::MouseWheel { value } => {
                bytes[0] = OP_MOUSE_WHEEL;
                bytes[1] = value as u8;
            }
            Self::MouseButtonPress { flags } => {
                bytes[0] = OP_MOUSE_BUTTON_PRESS;
                bytes[1..3].copy_from_slice(&flags.to_be_bytes());
            }
            Self::MouseButtonRelease { flags } => {
                bytes[0] = OP_MOUSE_BUTTON_RELEASE;
                bytes[1..3].copy_from_slice(&flags.to_be_bytes());
            }
            Self::ConsumerControl { key } => {
                bytes[0] = OP_KEY_CONSUMER_CONTROL;
                bytes[1..3].copy_from_slice(&key.to_be_bytes());
            }
            Self::Delay { time_ms } => {
                bytes[0] = OP_DELAY;
                bytes[1..3].copy_from_slice(&time_ms.to_be_bytes());
            }
            Self::Jump(target) => {
                bytes[0] = OP_JUMP;
                Self::encode_target(&mut bytes[1..3], target)?;
            }
            Self::JumpIfPressed(target) => {
                bytes[0] = OP_JUMP_IF_PRESSED;
                Self::encode_target(&mut bytes[1..3], target)?;
            }
            Self::PointerMove { x, y } => {
                bytes[0] = OP_MOUSE_POINTER_MOVE;
                bytes[1..3].copy_from_slice(&x.to_be_bytes());
                bytes[3..5].copy_from_slice(&y.to_be_bytes());
            }
            Self::JumpIfReleasedTimeout { timeout_ms, target } => {
                bytes[0] = OP_JUMP_IF_RELEASED_TIMEOUT;
                bytes[1..3].copy_from_slice(&timeout_ms.to_be_bytes());
                Self::encode_target(&mut bytes[3..5], target)?;
            }
            Self::End => bytes[0] = OP_END,
        }
        Ok(bytes)
    }

    fn encode_target(out: &mut [u8], target: JumpTarget) -> Result<()> {
        if target.page > MAX_PAGE_NUMBER {
            return Err(Error::InvalidArgument(format!(
                "jump target page {} is beyond page {MAX_PAGE_NUMBER}",
                target.page
            )));
        }
        if target.offset > 0xFF {
            return Err(Error::InvalidArgument(format!(
                "jump target offset {:#x} does not fit the wire field",
                target.offset
            )));
        }
        out[0] = target.page;
        out[1] = target.offset as u8;
        Ok(())
    }
}

/* One linear run of instructions, ending either at END or at an */
/* unconditional jump whose target must be fetched by the caller. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroRun {
    pub instructions: Vec<MacroData>,
    /* Set when the run ended on an unconditional jump. */
    pub next: Option<JumpTarget>,
}

/* Walk `data` 5 bytes at a time starting at `offset`. */
/*  */
/* Conditional jumps are ordinary instructions from the host's point of */
/* view (the device resolves them at runtime) so the walk continues past */
/* them. An unconditional jump or END terminates the run; neither */
/* terminator is kept in the instruction list. Running off the end of */
/* the buffer means the page is corrupt. */
pub fn decode_run(data: &[u8], offset: u16) -> Result<MacroRun> {
    let mut pos = usize::from(offset);
    let mut instructions = Vec::new();

    loop {
        if pos + MACRO_DATA_SIZE > data.len() {
            return Err(Error::MalformedData(format!(
                "macro ran past the end of the page at offset {pos:#x}"
            )));
        }
        let mut record = [0u8; MACRO_DATA_SIZE];
        record.copy_from_slice(&data[pos..pos + MACRO_DATA_SIZE]);
        pos += MACRO_DATA_SIZE;

        match MacroData::from_bytes(record)? {
            MacroData::End => {
                return Ok(MacroRun {
                    instructions,
                    next: None,
                });
            }
            MacroData::Jump(target) => {
                return Ok(MacroRun {
                    instructions,
                    next: Some(target),
                });
            }
            instruction => instructions.push(instruction),
        }
    }
}

/* Serialize a host-composed macro and append the END record. */
/*  */
/* Hosts write linear macros; jump chains only exist on the wire when a */
/* stored macro spans pages, and this layer never produces those. */
pub fn encode_macro(instructions: &[MacroData]) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity((instructions.len() + 1) * MACRO_DATA_SIZE);
    for instruction in instructions {
        match instruction {
            MacroData::End | MacroData::Jump(_) => {
                return Err(Error::InvalidArgument(format!(
                    "{instruction:?} is a wire terminator, not a composable instruction"
                )));
            }
            _ => bytes.extend_from_slice(&instruction.to_bytes()?),
        }
    }
    bytes.extend_from_slice(&MacroData::End.to_bytes()?);
    Ok(bytes)
}
