//! Batch resolution over a list of coordinates
//!
//! Input has one `groupId:artifactId:version` per line; blank lines and
//! lines starting with `#` are ignored. Each output line is
//! `coordinate,dep1;dep2;...`. A coordinate that fails to parse or resolve
//! is logged and written with an empty set, so the output keeps one line per
//! input coordinate.

use crate::resolve::Resolver;
use std::io::{self, BufRead, Write};
use weave_core::{Coordinate, MAVEN_FORGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    Dependencies,
    Dependents,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub resolved: usize,
    pub failed: usize,
}

pub fn resolve_batch<R: BufRead, W: Write>(
    resolver: &Resolver<'_>,
    input: R,
    mut output: W,
    mode: BatchMode,
    at: Option<i64>,
    transitive: bool,
) -> io::Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for line in input.lines() {
        let line = line?;
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }

        let result = Coordinate::parse(MAVEN_FORGE, entry)
            .map_err(|e| e.to_string())
            .and_then(|coordinate| {
                match mode {
                    BatchMode::Dependencies => resolver.resolve_dependencies(&coordinate, at, transitive),
                    BatchMode::Dependents => resolver.resolve_dependents(&coordinate, at, transitive),
                }
                .map_err(|e| e.to_string())
            });

        let related = match result {
            Ok(resolution) => {
                summary.resolved += 1;
                resolution
                    .revisions
                    .iter()
                    .map(|r| r.coordinate.to_string())
                    .collect::<Vec<_>>()
                    .join(";")
            }
            Err(e) => {
                tracing::error!("Failed to resolve {}: {}", entry, e);
                summary.failed += 1;
                String::new()
            }
        };
        writeln!(output, "{},{}", entry, related)?;
    }

    output.flush()?;
    tracing::info!(
        "Batch resolution finished: {} resolved, {} failed",
        summary.resolved,
        summary.failed
    );
    Ok(summary)
}
