//! Big-endian pcapng block builders.

use super::LinkType;
use super::error::EncodeError;
use super::layout;

/// Frame `body` as a block: type, total length, body, total length.
///
/// `body` must already be padded to a multiple of four bytes.
pub fn pcapng_block(block_type: u32, body: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let total_len = layout::BLOCK_FRAME_LEN + body.len();
    let encoded_len =
        u32::try_from(total_len).map_err(|_| EncodeError::BlockTooLong { len: total_len })?;
    let mut block = Vec::with_capacity(total_len);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&encoded_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&encoded_len.to_be_bytes());
    Ok(block)
}

/// Append one option (code, length, value, padding).
pub fn push_option(body: &mut Vec<u8>, code: u16, value: &[u8]) -> Result<(), EncodeError> {
    let len = u16::try_from(value.len()).map_err(|_| EncodeError::OptionTooLong {
        code,
        len: value.len(),
    })?;
    body.extend_from_slice(&code.to_be_bytes());
    body.extend_from_slice(&len.to_be_bytes());
    body.extend_from_slice(value);
    pad_to_alignment(body);
    Ok(())
}

pub fn push_end_of_options(body: &mut Vec<u8>) {
    body.extend_from_slice(&layout::OPT_END_OF_OPTIONS.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
}

fn pad_to_alignment(body: &mut Vec<u8>) {
    let pad_len = (layout::BLOCK_ALIGNMENT - body.len() % layout::BLOCK_ALIGNMENT)
        % layout::BLOCK_ALIGNMENT;
    body.extend(std::iter::repeat_n(0u8, pad_len));
}

/// Section Header Block with an unspecified section length and a
/// `shb_userappl` option.
pub fn section_header_block(application: &str) -> Result<Vec<u8>, EncodeError> {
    let mut body = Vec::new();
    body.extend_from_slice(&layout::BYTE_ORDER_MAGIC.to_be_bytes());
    body.extend_from_slice(&layout::VERSION_MAJOR.to_be_bytes());
    body.extend_from_slice(&layout::VERSION_MINOR.to_be_bytes());
    body.extend_from_slice(&layout::SECTION_LENGTH_UNSPECIFIED.to_be_bytes());
    push_option(&mut body, layout::OPT_SHB_USERAPPL, application.as_bytes())?;
    push_end_of_options(&mut body);
    pcapng_block(layout::SECTION_HEADER_BLOCK, &body)
}

/// Interface Description Block carrying `if_name` and microsecond `if_tsresol`.
pub fn interface_description_block(
    name: &str,
    link_type: LinkType,
) -> Result<Vec<u8>, EncodeError> {
    let mut body = Vec::new();
    body.extend_from_slice(&link_type.code().to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&layout::SNAP_LENGTH_UNLIMITED.to_be_bytes());
    push_option(&mut body, layout::OPT_IF_NAME, name.as_bytes())?;
    push_option(
        &mut body,
        layout::OPT_IF_TSRESOL,
        &[layout::TSRESOL_MICROSECONDS],
    )?;
    push_end_of_options(&mut body);
    pcapng_block(layout::INTERFACE_DESCRIPTION_BLOCK, &body)
}

/// Enhanced Packet Block with equal captured and original lengths and an
/// `opt_comment` option.
pub fn enhanced_packet_block(
    interface_id: u32,
    timestamp_micros: u64,
    data: &[u8],
    comment: &str,
) -> Result<Vec<u8>, EncodeError> {
    let cap_len =
        u32::try_from(data.len()).map_err(|_| EncodeError::PacketTooLong { len: data.len() })?;
    let ts_high = (timestamp_micros >> 32) as u32;
    let ts_low = (timestamp_micros & 0xFFFF_FFFF) as u32;

    let mut body = Vec::with_capacity(20 + data.len() + comment.len() + 12);
    body.extend_from_slice(&interface_id.to_be_bytes());
    body.extend_from_slice(&ts_high.to_be_bytes());
    body.extend_from_slice(&ts_low.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    pad_to_alignment(&mut body);
    push_option(&mut body, layout::OPT_COMMENT, comment.as_bytes())?;
    push_end_of_options(&mut body);
    pcapng_block(layout::ENHANCED_PACKET_BLOCK, &body)
}
