//! Transaction trace file reader (§6 "Transaction trace input format").
//!
//! Each line is `<hexAddr> <OP> [<hexAddr2>] [<hexAddr3>] <decAddedCycle>`.
//! `OP` classifies the transaction; an OP outside the known vocabulary is
//! not an error — the line simply carries no classification and is
//! dropped, matching the "all flags false" behavior of the format this was
//! distilled from.

use std::io::BufRead;

use memsim_core::{Cycle, Transaction, TransactionKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line}: expected at least 3 whitespace-separated fields, found {found}")]
    TooFewFields { line: usize, found: usize },
    #[error("line {line}: invalid hex address {text:?}")]
    BadAddress { line: usize, text: String },
    #[error("line {line}: invalid added_cycle {text:?}")]
    BadCycle { line: usize, text: String },
    #[error("I/O error reading trace: {0}")]
    Io(#[from] std::io::Error),
}

fn is_write_op(op: &str) -> bool {
    matches!(op, "WRITE" | "write" | "P_MEM_WR" | "BOFF")
}

fn classify(op: &str) -> Option<TransactionKind> {
    match op {
        _ if is_write_op(op) => Some(TransactionKind::Write),
        "READ" => Some(TransactionKind::Read),
        "CIM_FETCH" => Some(TransactionKind::CimFetch),
        "CIM_STORE" => Some(TransactionKind::CimStore),
        "CIM_ADD" => Some(TransactionKind::CimAdd),
        "CIM_XOR" => Some(TransactionKind::CimXor),
        "CIM_SWAP" => Some(TransactionKind::CimSwap),
        _ => None,
    }
}

fn parse_hex(text: &str, line: usize, field: fn(usize, String) -> TraceError) -> Result<u64, TraceError> {
    u64::from_str_radix(text.trim_start_matches("0x"), 16).map_err(|_| field(line, text.to_string()))
}

/// Parse one trace line.
///
/// Returns `Ok(None)` for a syntactically well-formed line whose `OP` is
/// outside the known vocabulary (per spec: "non-write, non-read, non-CiM,"
/// i.e. unclassifiable and silently dropped), `Err` for a malformed line
/// (too few fields, unparseable address or cycle).
pub fn parse_line(text: &str, line: usize) -> Result<Option<Transaction>, TraceError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(TraceError::TooFewFields { line, found: fields.len() });
    }

    let addr = parse_hex(fields[0], line, |l, t| TraceError::BadAddress { line: l, text: t })?;
    let op = fields[1];

    let Some(kind) = classify(op) else {
        log::warn!("trace line {line}: unrecognized op {op:?}, dropping");
        return Ok(None);
    };

    let mut idx = 2;
    let addr2 = if kind.has_addr2() {
        let v = parse_hex(
            fields.get(idx).ok_or(TraceError::TooFewFields { line, found: fields.len() })?,
            line,
            |l, t| TraceError::BadAddress { line: l, text: t },
        )?;
        idx += 1;
        Some(v)
    } else {
        None
    };
    let addr3 = if kind.has_addr3() {
        let v = parse_hex(
            fields.get(idx).ok_or(TraceError::TooFewFields { line, found: fields.len() })?,
            line,
            |l, t| TraceError::BadAddress { line: l, text: t },
        )?;
        idx += 1;
        Some(v)
    } else {
        None
    };

    let cycle_text = fields.get(idx).ok_or(TraceError::TooFewFields { line, found: fields.len() })?;
    let added_cycle: u64 = cycle_text
        .parse()
        .map_err(|_| TraceError::BadCycle { line, text: (*cycle_text).to_string() })?;

    Ok(Some(Transaction::cim(kind, addr, addr2, addr3, Cycle::new(added_cycle))))
}

/// Streams [`Transaction`]s out of a trace file, skipping unrecognized-op
/// lines transparently (they're logged, not surfaced as items).
pub struct TraceReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> TraceReader<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), line_no: 0 }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<Transaction, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => return Some(Err(TraceError::Io(e))),
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line, self.line_no) {
                Ok(Some(t)) => return Some(Ok(t)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_plain_read() {
        let t = parse_line("0x40 READ 100", 1).unwrap().unwrap();
        assert_eq!(t.kind, TransactionKind::Read);
        assert_eq!(t.addr, 0x40);
        assert_eq!(t.added_cycle, Cycle::new(100));
    }

    #[test]
    fn write_synonyms_all_classify_as_write() {
        for op in ["WRITE", "write", "P_MEM_WR", "BOFF"] {
            let line = format!("0x10 {op} 5");
            let t = parse_line(&line, 1).unwrap().unwrap();
            assert_eq!(t.kind, TransactionKind::Write, "op {op}");
        }
    }

    #[test]
    fn cim_add_parses_three_addresses() {
        let t = parse_line("0x100 CIM_ADD 0x200 0x300 42", 1).unwrap().unwrap();
        assert_eq!(t.kind, TransactionKind::CimAdd);
        assert_eq!(t.addr2, Some(0x200));
        assert_eq!(t.addr3, Some(0x300));
    }

    #[test]
    fn cim_swap_parses_two_addresses_no_third() {
        let t = parse_line("0x100 CIM_SWAP 0x200 42", 1).unwrap().unwrap();
        assert_eq!(t.kind, TransactionKind::CimSwap);
        assert_eq!(t.addr2, Some(0x200));
        assert_eq!(t.addr3, None);
    }

    #[test]
    fn unknown_op_is_dropped_not_an_error() {
        assert!(parse_line("0x10 FROB 5", 1).unwrap().is_none());
    }

    #[test]
    fn too_few_fields_is_an_error() {
        assert!(matches!(parse_line("0x10 READ", 1), Err(TraceError::TooFewFields { .. })));
    }

    #[test]
    fn reader_skips_blank_and_unknown_lines() {
        let data = "0x40 READ 1\n\n0x10 FROB 2\n0x80 WRITE 3\n";
        let reader = TraceReader::new(Cursor::new(data));
        let txns: Vec<_> = reader.map(Result::unwrap).collect();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].addr, 0x40);
        assert_eq!(txns[1].addr, 0x80);
    }
}
