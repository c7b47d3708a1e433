//! Shared winnow helpers for decoding rtnetlink message payloads.

use winnow::binary::le_u16;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use super::attr::NLA_TYPE_MASK;

/// Parser result type used by the record decoders.
pub type PResult<T> = Result<T, ErrMode<ContextError>>;

/// Hard parse failure.
pub(crate) fn cut() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

/// Decode a null-terminated attribute payload as a string.
pub fn parse_string_from_bytes(data: &[u8]) -> String {
    let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..len]).into_owned()
}

/// Step over one attribute, returning its masked type and payload.
///
/// Returns `Ok(None)` once the remaining input cannot hold another
/// attribute header, or when a length field is inconsistent (kernels
/// do not emit those; a damaged tail is simply ignored).
pub(crate) fn next_attr<'a>(input: &mut &'a [u8]) -> PResult<Option<(u16, &'a [u8])>> {
    if input.len() < 4 {
        return Ok(None);
    }

    let len = le_u16.parse_next(input)? as usize;
    let attr_type = le_u16.parse_next(input)?;

    if len < 4 {
        *input = &[];
        return Ok(None);
    }

    let payload_len = len - 4;
    if input.len() < payload_len {
        *input = &[];
        return Ok(None);
    }

    let data: &'a [u8] = take(payload_len).parse_next(input)?;

    // Align to 4 bytes
    let padding = ((len + 3) & !3) - len;
    if input.len() >= padding {
        let _: &[u8] = take(padding).parse_next(input)?;
    } else {
        *input = &[];
    }

    Ok(Some((attr_type & NLA_TYPE_MASK, data)))
}
