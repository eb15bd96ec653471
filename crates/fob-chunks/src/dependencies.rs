//! Per-entrypoint dependency collection.

use crate::compilation::{Asset, Compilation};
use crate::extension::{AssetKind, classify};

/// Style and script assets of one entrypoint, in the host's file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesDependencies {
    pub styles: Vec<Asset>,
    pub scripts: Vec<Asset>,
}

impl FilesDependencies {
    pub fn get(&self, kind: AssetKind) -> &[Asset] {
        match kind {
            AssetKind::Style => &self.styles,
            AssetKind::Script => &self.scripts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty() && self.scripts.is_empty()
    }
}

/// Collect the style and script assets of `entry_name`.
///
/// Entrypoints that are missing, or hosts without an entrypoint registry,
/// yield empty lists. Files the compilation has no asset for are skipped.
pub fn collect(compilation: &dyn Compilation, entry_name: &str) -> FilesDependencies {
    let mut deps = FilesDependencies::default();

    if !compilation.has_entrypoints() {
        return deps;
    }
    let Some(files) = compilation.entrypoint_files(entry_name) else {
        return deps;
    };

    for file in files {
        let Some(kind) = classify(&file) else {
            continue;
        };
        let Some(asset) = compilation.get_asset(&file) else {
            tracing::debug!(entry = entry_name, file = %file, "entry file has no asset, skipping");
            continue;
        };
        match kind {
            AssetKind::Style => deps.styles.push(asset),
            AssetKind::Script => deps.scripts.push(asset),
        }
    }

    deps
}
