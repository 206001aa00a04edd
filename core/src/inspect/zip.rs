//! ZIP Inspector (§4.F): the container bytes extracted here are handed
//! back to the Package Parser by the orchestrator (`crate::parser`),
//! which recurses in single-file mode — keeping that recursion in
//! `parser.rs` avoids a cycle between this module and the orchestrator
//! it's a stage of.

use super::InspectOutcome;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Extract the bytes of each distinct relative path in `requested`
/// from the ZIP at `buf`. Entries that are missing are simply absent
/// from the result; a truly malformed archive is a `ParseFailure`.
pub fn extract(buf: &[u8], requested: &[String]) -> InspectOutcome<Vec<(String, Vec<u8>)>> {
    let mut archive = match ZipArchive::new(Cursor::new(buf)) {
        Ok(a) => a,
        Err(_) => return InspectOutcome::NotThisFormat,
    };

    let mut out = Vec::new();
    for relative_path in dedup(requested) {
        let normalized = relative_path.replace('\\', "/");
        let entry = archive
            .by_name(&normalized)
            .or_else(|_| archive.by_name(&relative_path));
        let mut file = match entry {
            Ok(f) => f,
            Err(_) => continue,
        };
        let mut bytes = Vec::new();
        if let Err(e) = file.read_to_end(&mut bytes) {
            return InspectOutcome::ParseFailure(e.to_string());
        }
        out.push((relative_path.clone(), bytes));
    }
    InspectOutcome::Matched(out)
}

fn dedup(paths: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for p in paths {
        if seen.insert(p.clone()) {
            out.push(p.clone());
        }
    }
    out
}
