//! Rolldown bundle <-> [`Compilation`] conversion.

use std::path::Path;
use std::sync::Arc;

use fob_chunks::{MemoryCompilation, OutputOptions, RawSource};
use indexmap::{IndexMap, IndexSet};
use rolldown_common::{Output, OutputAsset, OutputChunk, StrOrBytes};

/// Build a compilation view of a generated Rolldown bundle.
///
/// Every entry chunk becomes an entrypoint named after the chunk. Its files
/// are, in order: CSS assets named after the entry, statically imported
/// chunks (dependencies first), the entry chunk itself, and source maps.
pub fn compilation_from_bundle(bundle: &[Output], output: OutputOptions) -> MemoryCompilation {
    let chunks: IndexMap<&str, &OutputChunk> = bundle
        .iter()
        .filter_map(|o| match o {
            Output::Chunk(chunk) => Some((chunk.filename.as_str(), chunk.as_ref())),
            Output::Asset(_) => None,
        })
        .collect();

    let mut compilation = MemoryCompilation::new(output);

    for o in bundle {
        match o {
            Output::Chunk(chunk) => {
                compilation = compilation.with_asset(chunk.filename.as_str(), chunk.code.as_str());
            }
            Output::Asset(asset) => {
                compilation = compilation.with_asset(asset.filename.as_str(), asset_text(asset));
            }
        }
    }

    for chunk in chunks.values().filter(|c| c.is_entry) {
        let files = entry_files(bundle, &chunks, chunk);
        tracing::trace!(entry = %chunk.name, files = files.len(), "entry chunk");
        compilation = compilation.with_entrypoint(chunk.name.as_str(), files);
    }

    compilation
}

/// Convert emitted files to bundle outputs, keeping the last source per filename.
pub fn emitted_outputs(emitted: Vec<(String, RawSource)>) -> Vec<Output> {
    let mut latest: IndexMap<String, RawSource> = IndexMap::new();
    for (filename, source) in emitted {
        latest.insert(filename, source);
    }

    latest
        .into_iter()
        .map(|(filename, source)| {
            Output::Asset(Arc::new(OutputAsset {
                names: vec![],
                original_file_names: vec![],
                filename: filename.into(),
                source: source.as_str().to_string().into(),
            }))
        })
        .collect()
}

fn output_filename(output: &Output) -> &str {
    match output {
        Output::Chunk(chunk) => chunk.filename.as_str(),
        Output::Asset(asset) => asset.filename.as_str(),
    }
}

/// Drop bundle outputs that are about to be replaced by `emitted`.
pub fn replace_outputs(bundle: &mut Vec<Output>, emitted: Vec<Output>) {
    let replaced: IndexSet<String> = emitted
        .iter()
        .map(|o| output_filename(o).to_string())
        .collect();
    bundle.retain(|o| !replaced.contains(output_filename(o)));
    bundle.extend(emitted);
}

fn asset_text(asset: &OutputAsset) -> String {
    match &asset.source {
        StrOrBytes::Str(s) => s.clone(),
        StrOrBytes::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

fn entry_files(
    bundle: &[Output],
    chunks: &IndexMap<&str, &OutputChunk>,
    entry: &OutputChunk,
) -> Vec<String> {
    let mut files: IndexSet<String> = IndexSet::new();

    for o in bundle {
        let Output::Asset(asset) = o else {
            continue;
        };
        if is_css(&asset.filename) && asset.names.iter().any(|n| names_entry(n, &entry.name)) {
            files.insert(asset.filename.to_string());
        }
    }

    let mut visited = IndexSet::new();
    let mut ordered = Vec::new();
    visit_imports(chunks, entry, &mut visited, &mut ordered);

    for chunk in ordered {
        files.insert(chunk.filename.to_string());
        if let Some(map) = &chunk.sourcemap_filename {
            files.insert(map.clone());
        }
    }

    files.into_iter().collect()
}

/// Depth-first over static imports, pushing each chunk after its dependencies.
fn visit_imports<'a>(
    chunks: &IndexMap<&str, &'a OutputChunk>,
    chunk: &'a OutputChunk,
    visited: &mut IndexSet<String>,
    ordered: &mut Vec<&'a OutputChunk>,
) {
    if !visited.insert(chunk.filename.to_string()) {
        return;
    }
    for import in &chunk.imports {
        if let Some(dep) = chunks.get(import.as_str()) {
            visit_imports(chunks, dep, visited, ordered);
        }
    }
    ordered.push(chunk);
}

fn is_css(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("css"))
}

// Asset names carry an extension (`home.css`) or are the bare entry name.
fn names_entry(name: &str, entry: &str) -> bool {
    name == entry || name.strip_suffix(".css") == Some(entry)
}
