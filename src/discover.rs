//! Source discovery: walk the input tree and emit job descriptors.

use std::collections::HashMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::HarnessError;
use crate::job::JobDescriptor;
use crate::toolchain::ToolchainRegistry;

/// Recursively collect one descriptor per recognized source file.
///
/// Files whose extension has no registry entry are silently ignored;
/// an empty tree yields an empty batch, not an error. Hidden
/// directories are skipped. Emission order is unspecified and nothing
/// downstream may depend on it.
///
/// Every per-job output path (compiled binary, result record, capture
/// files) derives from the source base name, so two sources with the
/// same base name in different subdirectories would clobber each
/// other's outputs. That is rejected up front as an infrastructure
/// error rather than corrupting results mid-run.
pub fn discover_jobs(
    root: &Path,
    registry: &ToolchainRegistry,
) -> Result<Vec<JobDescriptor>, HarnessError> {
    let metadata = std::fs::metadata(root)
        .map_err(|_| HarnessError::MissingRoot(root.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(HarnessError::RootNotDirectory(root.to_path_buf()));
    }

    let mut jobs = Vec::new();
    let mut seen: HashMap<String, std::path::PathBuf> = HashMap::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !(e.file_type().is_dir() && name.starts_with('.'))
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(desc) = JobDescriptor::from_path(entry.path().to_path_buf()) else {
            continue;
        };
        if !registry.supports(&desc.tag) {
            continue;
        }

        if let Some(first) = seen.get(&desc.file_name) {
            return Err(HarnessError::BasenameCollision {
                name: desc.file_name.clone(),
                first: first.clone(),
                second: desc.path.clone(),
            });
        }
        seen.insert(desc.file_name.clone(), desc.path.clone());
        jobs.push(desc);
    }

    Ok(jobs)
}
