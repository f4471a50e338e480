//! Text dialect: `RECORD=<type>|KEY=VALUE|...` lines.
//!
//! The file is loaded into blocks that always end on a line boundary, then
//! each block is split into records and fields in place.

use std::io::{self, BufRead, BufReader, Read};

use log::debug;

use super::keywords::{FieldKey, RecordKind};
use super::tree::{Field, Name, Span, Tree, Value};
use crate::error::ImportError;

pub const DEFAULT_BLOCK_SIZE: usize = 65536;

const RECORD_PREFIX: &[u8] = b"RECORD=";

/// Check whether the first line looks like a text-dialect PcbDoc.
pub fn sniff<R: Read>(reader: R) -> bool {
    let mut line = Vec::new();
    let mut reader = BufReader::new(reader.take(256));
    if reader.read_until(b'\n', &mut line).is_err() {
        return false;
    }
    let line = line.strip_prefix(b"|").unwrap_or(&line[..]);
    line.starts_with(RECORD_PREFIX) && line.contains(&b'|')
}

fn is_terminator(b: u8) -> bool {
    b == b'\r' || b == b'\n'
}

fn is_separator(b: u8) -> bool {
    b == b'|' || is_terminator(b)
}

/// Line breaks in `data`; `\r\n` counts once.
fn count_lines(data: &[u8]) -> usize {
    data.iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'\n' || (b == b'\r' && data.get(i + 1) != Some(&b'\n')))
        .count()
}

/// Read the whole stream into blocks of roughly `block_size` bytes.
///
/// A block is cut only after a full run of line terminators, so no record
/// ever spans two blocks. Returns the index of the first new block.
pub fn load_blocks<R: Read>(
    reader: R,
    block_size: usize,
    tree: &mut Tree,
) -> Result<usize, ImportError> {
    let first = tree.block_count();
    let block_size = block_size.max(1);
    let mut reader = BufReader::new(reader);
    loop {
        let mut buf = Vec::with_capacity(block_size);
        (&mut reader).take(block_size as u64).read_to_end(&mut buf)?;
        if buf.is_empty() {
            break;
        }
        let full = buf.len() == block_size;
        if full {
            extend_to_line_boundary(&mut reader, &mut buf)?;
        }
        let eof = !full || reader.fill_buf()?.is_empty();
        if eof && !buf.last().is_some_and(|&b| is_terminator(b)) {
            buf.push(b'\n');
        }
        tree.push_block(buf);
        if eof {
            break;
        }
    }
    debug!("PcbDoc: loaded {} text blocks", tree.block_count() - first);
    Ok(first)
}

fn extend_to_line_boundary<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<()> {
    if !buf.last().is_some_and(|&b| is_terminator(b)) {
        loop {
            let avail = reader.fill_buf()?;
            if avail.is_empty() {
                return Ok(());
            }
            match avail.iter().position(|&b| is_terminator(b)) {
                Some(i) => {
                    buf.extend_from_slice(&avail[..=i]);
                    reader.consume(i + 1);
                    break;
                }
                None => {
                    let n = avail.len();
                    buf.extend_from_slice(avail);
                    reader.consume(n);
                }
            }
        }
    }
    loop {
        let avail = reader.fill_buf()?;
        let n = avail.iter().take_while(|&&b| is_terminator(b)).count();
        let rest = avail.len() - n;
        buf.extend_from_slice(&avail[..n]);
        reader.consume(n);
        if rest > 0 || n == 0 {
            return Ok(());
        }
    }
}

type Parsed = (RecordKind, Name, Vec<Field>);

/// Split every block from `first_block` on into records.
pub fn parse_blocks(tree: &mut Tree, first_block: usize) -> Result<(), ImportError> {
    let mut line = 1;
    for block in first_block..tree.block_count() {
        let records = parse_block(tree.block(block), block, &mut line)?;
        for (kind, name, fields) in records {
            tree.add_record(kind, name, fields);
        }
    }
    Ok(())
}

fn parse_block(data: &[u8], block: usize, line: &mut usize) -> Result<Vec<Parsed>, ImportError> {
    let mut records = Vec::new();
    let mut pos = 0;
    loop {
        let skipped = pos;
        while pos < data.len() && is_separator(data[pos]) {
            pos += 1;
        }
        *line += count_lines(&data[skipped..pos]);
        if pos >= data.len() {
            break;
        }
        if !data[pos..].starts_with(RECORD_PREFIX) {
            return Err(ImportError::Parse {
                line: *line,
                message: "first field must be RECORD".to_string(),
            });
        }
        pos += RECORD_PREFIX.len();
        let end = find_separator(data, pos).ok_or_else(|| ImportError::Parse {
            line: *line,
            message: "unterminated record".to_string(),
        })?;
        let kind = RecordKind::lookup(&data[pos..end]);
        let name = Name::Span(Span {
            block,
            start: pos,
            end,
        });
        // the record's terminator is left for the separator skip to count
        let fields = if is_terminator(data[end]) {
            pos = end;
            Vec::new()
        } else {
            let (fields, next) = parse_fields(data, block, end + 1).map_err(|message| {
                ImportError::Parse {
                    line: *line,
                    message,
                }
            })?;
            pos = match next.checked_sub(1) {
                Some(last) if is_terminator(data[last]) => last,
                _ => next,
            };
            fields
        };
        records.push((kind, name, fields));
    }
    Ok(records)
}

fn find_separator(data: &[u8], from: usize) -> Option<usize> {
    data[from..]
        .iter()
        .position(|&b| is_separator(b))
        .map(|i| from + i)
}

/// Tokenize `KEY=VALUE` fields from `pos` up to the end of the line.
///
/// Returns the fields and the position after the line terminator.
pub fn parse_fields(data: &[u8], block: usize, mut pos: usize) -> Result<(Vec<Field>, usize), String> {
    let mut fields = Vec::new();
    loop {
        while pos < data.len() && data[pos] == b'|' {
            pos += 1;
        }
        if pos >= data.len() {
            break;
        }
        if is_terminator(data[pos]) {
            pos += 1;
            break;
        }
        let end = find_separator(data, pos).ok_or_else(|| "unterminated field".to_string())?;
        let (key, mut value) = match data[pos..end].iter().position(|&b| b == b'=') {
            Some(eq) => (pos..pos + eq, pos + eq + 1..end),
            None => (pos..end, end..end),
        };
        if value.len() >= 2 && data[value.start] == b'{' && data[value.end - 1] == b'}' {
            value = value.start + 1..value.end - 1;
        }
        fields.push(Field {
            key: FieldKey::lookup(&data[key.clone()]),
            name: Name::Span(Span {
                block,
                start: key.start,
                end: key.end,
            }),
            value: Value::Str(Span {
                block,
                start: value.start,
                end: value.end,
            }),
        });
        let at_eol = is_terminator(data[end]);
        pos = end + 1;
        if at_eol {
            break;
        }
    }
    Ok((fields, pos))
}

/// Tokenize a text blob embedded in a binary stream into one record.
pub fn parse_blob(
    tree: &mut Tree,
    kind: RecordKind,
    name: &'static str,
    raw: &[u8],
) -> Result<(), String> {
    let text = raw.split(|&b| b == 0).next().unwrap_or_default();
    let mut data = Vec::with_capacity(text.len() + 1);
    data.extend_from_slice(text);
    data.push(b'\n');
    let block = tree.push_block(data);
    let (fields, _) = parse_fields(tree.block(block), block, 0)?;
    tree.add_record(kind, Name::Static(name), fields);
    Ok(())
}

/// Load and tokenize a whole text-dialect file.
pub fn parse<R: Read>(reader: R, block_size: usize, tree: &mut Tree) -> Result<(), ImportError> {
    let first = load_blocks(reader, block_size, tree)?;
    parse_blocks(tree, first)
}
