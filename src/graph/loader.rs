use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::graph::fragment::{owner_of, Fragment};
use crate::graph::types::{EdgeUpdate, Gid, RawEdge, UpdateOp};

/// Reads a whitespace-delimited edge list: `src dst [weight]` per line.
/// Blank lines and `#` comments are skipped; a missing weight defaults to 1.
pub fn parse_edge_file(path: impl AsRef<Path>) -> Result<Vec<RawEdge>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut edges = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        edges.push(parse_edge_tokens(trimmed, lineno + 1, false)?);
    }
    Ok(edges)
}

/// Reads an edge-delta file: `<op> <src> <dst> [weight]` per line with
/// op one of `a`/`add`/`d`/`del`/`delete`. The weight column is ignored for
/// deletions and may hold a placeholder token for additions.
pub fn parse_update_file(path: impl AsRef<Path>) -> Result<Vec<EdgeUpdate>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut updates = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let lineno = lineno + 1;
        let (op_token, rest) = trimmed
            .split_once(char::is_whitespace)
            .ok_or_else(|| EngineError::Parse(format!("line {lineno}: missing edge after op")))?;
        let op = match op_token {
            "a" | "add" => UpdateOp::Add,
            "d" | "del" | "delete" => UpdateOp::Delete,
            other => {
                return Err(EngineError::Parse(format!(
                    "line {lineno}: unknown op `{other}`"
                )))
            }
        };
        let edge = parse_edge_tokens(rest.trim(), lineno, true)?;
        updates.push(EdgeUpdate { op, edge });
    }
    Ok(updates)
}

fn parse_edge_tokens(s: &str, lineno: usize, lenient_weight: bool) -> Result<RawEdge> {
    let mut tokens = s.split_whitespace();
    let src = parse_gid(tokens.next(), lineno)?;
    let dst = parse_gid(tokens.next(), lineno)?;
    let weight = match tokens.next() {
        None => 1,
        Some(tok) => match tok.parse::<u64>() {
            Ok(w) => w,
            Err(_) if lenient_weight => 1,
            Err(_) => {
                return Err(EngineError::Parse(format!(
                    "line {lineno}: bad weight `{tok}`"
                )))
            }
        },
    };
    Ok(RawEdge { src, dst, weight })
}

fn parse_gid(token: Option<&str>, lineno: usize) -> Result<Gid> {
    let token =
        token.ok_or_else(|| EngineError::Parse(format!("line {lineno}: missing vertex id")))?;
    token
        .parse::<u64>()
        .map(Gid)
        .map_err(|_| EngineError::Parse(format!("line {lineno}: bad vertex id `{token}`")))
}

/// Hash-partitions the edge list into one fragment per worker. The vertex
/// universe is the set of gids appearing as either endpoint; every worker
/// receives the full universe size and its owned gids as inner vertices.
pub fn build_fragments(
    edges: &[RawEdge],
    workers: usize,
    directed: bool,
) -> Result<Vec<Fragment>> {
    if workers == 0 {
        return Err(EngineError::InvalidArgument("workers must be > 0".into()));
    }
    let universe: BTreeSet<Gid> = edges.iter().flat_map(|e| [e.src, e.dst]).collect();
    let total = universe.len();

    (0..workers)
        .map(|w| {
            let inner: Vec<Gid> = universe
                .iter()
                .copied()
                .filter(|&g| owner_of(g, workers) == w)
                .collect();
            Fragment::assemble(w, workers, inner, edges.to_vec(), directed, total)
        })
        .collect()
}
