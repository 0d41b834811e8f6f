//! WR3223 wire frames
//!
//! Builds request frames and validates response frames. Frames are short ASCII
//! sequences, so they are assembled in a `BytesMut` and handed to the transport
//! as a single write.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::command::ProtocolCommand;
use crate::constants::*;
use crate::error::{Wr3223Error, Wr3223Result};

/// Encode a controller bus address: two digits, each sent twice.
///
/// ```rust
/// use wr3223::frame::encode_address;
///
/// assert_eq!(&encode_address(1).unwrap(), b"0011");
/// assert_eq!(&encode_address(12).unwrap(), b"1122");
/// assert!(encode_address(0).is_err());
/// ```
pub fn encode_address(addr: u8) -> Wr3223Result<[u8; ADDRESS_LEN]> {
    if addr == 0 || addr > MAX_CONTROLLER_ADDRESS {
        return Err(Wr3223Error::configuration(format!(
            "Controller address {} out of range (1-{})",
            addr, MAX_CONTROLLER_ADDRESS
        )));
    }
    let tens = b'0' + addr / 10;
    let ones = b'0' + addr % 10;
    Ok([tens, tens, ones, ones])
}

/// Block check character: XOR over the given bytes.
#[inline]
pub fn bcc(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Build a read request: `EOT addr cmd ENQ`.
pub fn build_read_request(addr: u8, command: ProtocolCommand) -> Wr3223Result<Bytes> {
    let mut frame = BytesMut::with_capacity(1 + ADDRESS_LEN + 2 + 1);
    frame.put_u8(EOT);
    frame.put_slice(&encode_address(addr)?);
    frame.put_slice(&command.bytes());
    frame.put_u8(ENQ);
    debug!("Read request {} -> {:02X?}", command, &frame[..]);
    Ok(frame.freeze())
}

/// Build a write request: `EOT addr STX cmd data ETX BCC`.
pub fn build_write_request(addr: u8, command: ProtocolCommand, data: &str) -> Wr3223Result<Bytes> {
    if !data.is_ascii() || data.bytes().any(|b| b.is_ascii_control()) {
        return Err(Wr3223Error::protocol(format!(
            "Write data for {} must be printable ASCII: {:?}",
            command, data
        )));
    }

    let mut frame = BytesMut::with_capacity(1 + ADDRESS_LEN + 1 + 2 + data.len() + 2);
    frame.put_u8(EOT);
    frame.put_slice(&encode_address(addr)?);
    frame.put_u8(STX);
    let body_start = frame.len();
    frame.put_slice(&command.bytes());
    frame.put_slice(data.as_bytes());
    frame.put_u8(ETX);
    let check = bcc(&frame[body_start..]);
    frame.put_u8(check);
    debug!("Write request {}={} -> {:02X?}", command, data, &frame[..]);
    Ok(frame.freeze())
}

/// Length of the complete read response at the start of `buf`, if one has arrived.
///
/// A response ends one byte (the BCC) after the first ETX.
pub fn response_len(buf: &[u8]) -> Option<usize> {
    buf.iter()
        .position(|&b| b == ETX)
        .filter(|&pos| buf.len() > pos + 1)
        .map(|pos| pos + 2)
}

/// Validate a read response and return its data field.
///
/// The frame must be `STX cmd data ETX BCC` with a matching command echo and a
/// correct checksum.
pub fn parse_read_response(command: ProtocolCommand, frame: &[u8]) -> Wr3223Result<String> {
    debug!("Read response {} <- {:02X?}", command, frame);

    let min_len = 1 + 2 + 2;
    if frame.len() < min_len {
        return Err(Wr3223Error::protocol(format!(
            "Response to {} too short: {} bytes",
            command,
            frame.len()
        )));
    }
    if frame[0] != STX {
        return Err(Wr3223Error::protocol(format!(
            "Response to {} starts with {:#04X}, expected STX",
            command, frame[0]
        )));
    }

    let etx_pos = frame.len() - 2;
    if frame[etx_pos] != ETX {
        return Err(Wr3223Error::protocol(format!(
            "Response to {} is missing ETX",
            command
        )));
    }

    let expected = bcc(&frame[1..=etx_pos]);
    let actual = frame[etx_pos + 1];
    if expected != actual {
        return Err(Wr3223Error::protocol(format!(
            "BCC mismatch for {}: expected {:#04X}, got {:#04X}",
            command, expected, actual
        )));
    }

    let echo = &frame[1..3];
    if echo != command.bytes() {
        return Err(Wr3223Error::protocol(format!(
            "Response echoes {:?}, expected {}",
            String::from_utf8_lossy(echo),
            command
        )));
    }

    let data = &frame[3..etx_pos];
    String::from_utf8(data.to_vec())
        .map_err(|_| Wr3223Error::protocol(format!("Response to {} is not ASCII", command)))
}

/// Interpret the single-byte answer to a write request.
///
/// `Ok(true)` for ACK, `Ok(false)` for NAK. Anything else is a protocol error.
pub fn parse_write_ack(command: ProtocolCommand, byte: u8) -> Wr3223Result<bool> {
    match byte {
        ACK => Ok(true),
        NAK => Ok(false),
        other => Err(Wr3223Error::protocol(format!(
            "Unexpected answer {:#04X} to write {}",
            other, command
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(command: &[u8], data: &[u8]) -> Vec<u8> {
        let mut frame = vec![STX];
        frame.extend_from_slice(command);
        frame.extend_from_slice(data);
        frame.push(ETX);
        let check = bcc(&frame[1..]);
        frame.push(check);
        frame
    }

    #[test]
    fn test_encode_address() {
        assert_eq!(&encode_address(1).unwrap(), b"0011");
        assert_eq!(&encode_address(99).unwrap(), b"9999");
        assert_eq!(&encode_address(40).unwrap(), b"4400");
        assert!(matches!(
            encode_address(100),
            Err(Wr3223Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_read_request_layout() {
        let frame = build_read_request(1, ProtocolCommand::T1).unwrap();
        assert_eq!(&frame[..], &[EOT, b'0', b'0', b'1', b'1', b'T', b'1', ENQ]);
    }

    #[test]
    fn test_write_request_layout() {
        let frame = build_write_request(1, ProtocolCommand::Sw, "43").unwrap();
        let body = [b'S', b'W', b'4', b'3', ETX];
        let mut expected = vec![EOT, b'0', b'0', b'1', b'1', STX];
        expected.extend_from_slice(&body);
        expected.push(bcc(&body));
        assert_eq!(&frame[..], &expected[..]);
    }

    #[test]
    fn test_write_request_rejects_control_bytes() {
        assert!(build_write_request(1, ProtocolCommand::Md, "1\u{3}").is_err());
    }

    #[test]
    fn test_parse_read_response() {
        let frame = response(b"T1", b"21.5");
        assert_eq!(
            parse_read_response(ProtocolCommand::T1, &frame).unwrap(),
            "21.5"
        );

        let frame = response(b"Az", b"???");
        assert_eq!(
            parse_read_response(ProtocolCommand::Az, &frame).unwrap(),
            "???"
        );

        let frame = response(b"RL", b"");
        assert_eq!(parse_read_response(ProtocolCommand::Rl, &frame).unwrap(), "");
    }

    #[test]
    fn test_parse_read_response_bad_bcc() {
        let mut frame = response(b"T1", b"21.5");
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        let err = parse_read_response(ProtocolCommand::T1, &frame).unwrap_err();
        assert!(err.is_communication_error());
    }

    #[test]
    fn test_parse_read_response_wrong_echo() {
        let frame = response(b"T2", b"21.5");
        let err = parse_read_response(ProtocolCommand::T1, &frame).unwrap_err();
        assert!(matches!(err, Wr3223Error::Protocol { .. }));
    }

    #[test]
    fn test_parse_read_response_framing() {
        assert!(parse_read_response(ProtocolCommand::T1, &[STX, ETX]).is_err());
        assert!(parse_read_response(ProtocolCommand::T1, &[NAK, b'T', b'1', ETX, 0]).is_err());
    }

    #[test]
    fn test_response_len() {
        let frame = response(b"T1", b"5");
        assert_eq!(response_len(&frame[..frame.len() - 1]), None);
        assert_eq!(response_len(&frame), Some(frame.len()));
        let mut longer = frame.clone();
        longer.push(0xAA);
        assert_eq!(response_len(&longer), Some(frame.len()));
    }

    #[test]
    fn test_parse_write_ack() {
        assert!(parse_write_ack(ProtocolCommand::Sw, ACK).unwrap());
        assert!(!parse_write_ack(ProtocolCommand::Sw, NAK).unwrap());
        assert!(parse_write_ack(ProtocolCommand::Sw, b'x').is_err());
    }
}
