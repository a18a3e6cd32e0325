/*!
    encoding/decoding of the gateway encapsulation frames.

    The gateway carries one CANopen object access per frame, wrapped in a Modbus-TCP-shaped
    envelope: a 7 byte transport header, a 5 byte gateway sub-header (function code 0x2B,
    MEI type 0x0D), a 6 byte object locator, a 1 byte size field, and for writes the object
    payload. All envelope fields are big-endian while object payloads are little-endian,
    this asymmetry is what the drive actually speaks and must not be "fixed".
*/

use core::fmt;


/// offset of the object payload in a response buffer
pub const DATA_OFFSET: usize = 19;
/// biggest frame this protocol can produce: the 19 byte envelope plus a 4 byte payload
pub const FRAME_MAX: usize = DATA_OFFSET + 4;
/// smallest response that can acknowledge a write (the transport header alone)
pub const ACK_MIN: usize = 7;

/// one encoded request, ready to be sent in a single transport write
pub type Frame = heapless::Vec<u8, FRAME_MAX>;

const FUNCTION_CODE: u8 = 0x2b;
const MEI_TYPE: u8 = 0x0d;
const DIRECTION_READ: u8 = 0;
const DIRECTION_WRITE: u8 = 1;

/**
    error detected while encoding a request or classifying a response

    [ProtocolError::ShortResponse] and [ProtocolError::Exception] are distinct on purpose: a
    truncated reply means the peer is not speaking the gateway encapsulation at all (plain
    modbus fallback for instance), whereas an exception reply means it understood the request
    and refused it. Conflating the two hides real configuration problems from the caller.
*/
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProtocolError {
    /// the peer replied with fewer bytes than the frame requires
    ShortResponse(usize),
    /// the peer returned an exception function code, the payload is the exception code
    Exception(u8),
    /// the requested object size is not one of 1, 2 or 4 bytes
    InvalidSize(u8),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortResponse(len) => write!(f, "response too short ({len} bytes)"),
            Self::Exception(code) => write!(f, "gateway exception {code:#04x}"),
            Self::InvalidSize(size) => write!(f, "unsupported object size {size}"),
        }
    }
}

fn check_size(size: u8) -> Result<(), ProtocolError> {
    match size {
        1 | 2 | 4 => Ok(()),
        _ => Err(ProtocolError::InvalidSize(size)),
    }
}

fn envelope(frame: &mut Frame, transaction: u16, direction: u8, index: u16, sub: u8, size: u8) {
    let remaining: u16 = 13 + match direction {
        DIRECTION_WRITE => size as u16,
        _ => 0,
    };
    // transport header
    frame.extend_from_slice(&transaction.to_be_bytes()).unwrap();
    frame.extend_from_slice(&0u16.to_be_bytes()).unwrap();        // protocol id
    frame.extend_from_slice(&remaining.to_be_bytes()).unwrap();
    frame.push(0).unwrap();                                       // unit id
    // gateway sub-header
    frame.push(FUNCTION_CODE).unwrap();
    frame.push(MEI_TYPE).unwrap();
    frame.push(direction).unwrap();
    frame.push(0).unwrap();                                       // reserved
    frame.push(0).unwrap();                                       // node id
    // object locator
    frame.extend_from_slice(&index.to_be_bytes()).unwrap();
    frame.push(sub).unwrap();
    frame.extend_from_slice(&0u16.to_be_bytes()).unwrap();        // starting address
    frame.push(0).unwrap();                                       // reserved
    frame.push(size).unwrap();
}

/// encode a request reading `size` bytes from the object at `index:sub`
pub fn encode_read(transaction: u16, index: u16, sub: u8, size: u8) -> Result<Frame, ProtocolError> {
    check_size(size)?;
    let mut frame = Frame::new();
    envelope(&mut frame, transaction, DIRECTION_READ, index, sub, size);
    Ok(frame)
}

/// encode a request writing `value`, truncated to `size` bytes little-endian, to the object at `index:sub`
pub fn encode_write(transaction: u16, index: u16, sub: u8, value: u64, size: u8) -> Result<Frame, ProtocolError> {
    check_size(size)?;
    let mut frame = Frame::new();
    envelope(&mut frame, transaction, DIRECTION_WRITE, index, sub, size);
    frame.extend_from_slice(&value.to_le_bytes()[.. size as usize]).unwrap();
    Ok(frame)
}

/**
    classify a response buffer

    - `Ok(Some(value))` when `expect` is a read size and the payload could be extracted
      little-endian from [DATA_OFFSET]
    - `Ok(None)` for a valid write acknowledgement (`expect` is `None`)
    - `Err(ProtocolError::Exception)` when the echoed function code has its high bit set
    - `Err(ProtocolError::ShortResponse)` when the buffer is shorter than the frame requires

    A short buffer is never interpreted as a value or an acknowledgement.
*/
pub fn decode_response(buffer: &[u8], expect: Option<u8>) -> Result<Option<u64>, ProtocolError> {
    if buffer.len() < ACK_MIN {
        return Err(ProtocolError::ShortResponse(buffer.len()));
    }
    if buffer.len() > ACK_MIN && buffer[7] & 0x80 != 0 {
        let code = if buffer.len() > 8 {buffer[8]} else {0};
        return Err(ProtocolError::Exception(code));
    }
    match expect {
        None => Ok(None),
        Some(size) => {
            check_size(size)?;
            let end = DATA_OFFSET + size as usize;
            if buffer.len() < end {
                return Err(ProtocolError::ShortResponse(buffer.len()));
            }
            let mut raw = [0; 8];
            raw[.. size as usize].copy_from_slice(&buffer[DATA_OFFSET .. end]);
            Ok(Some(u64::from_le_bytes(raw)))
        }
    }
}
