//! FileTree analyzer (spec §4.3 item 1): counts, extension breakdown, line
//! counts for text files, top-20 largest files, a three-deep directory tree.

use std::collections::HashMap;
use std::time::Instant;

use crate::analyzers::context::{AnalysisContext, AnalyzerResult, FILE_READ_BATCH_SIZE};
use crate::analyzers::types::{DirNode, FileTreeResult, FileTreeTotals, LargestFile};
use crate::core::file_utils::FileReader;

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerResult<FileTreeResult> {
    let started = Instant::now();

    let mut totals = FileTreeTotals::default();
    let mut files_by_extension: HashMap<String, usize> = HashMap::new();
    let mut dirs = std::collections::HashSet::new();

    for entry in ctx.files.iter() {
        totals.files += 1;
        totals.bytes += entry.size;
        *files_by_extension.entry(entry.extension.clone()).or_insert(0) += 1;

        if let Some(parent) = std::path::Path::new(&entry.relative_path).parent() {
            let mut cursor = parent;
            loop {
                if cursor.as_os_str().is_empty() {
                    break;
                }
                dirs.insert(cursor.to_path_buf());
                match cursor.parent() {
                    Some(p) if !p.as_os_str().is_empty() => cursor = p,
                    _ => break,
                }
            }
        }
    }
    totals.dirs = dirs.len();

    for chunk in ctx.files.chunks(FILE_READ_BATCH_SIZE) {
        for entry in chunk {
            let path = ctx.absolute(&entry.relative_path);
            totals.lines += FileReader::count_lines_of_code(&path).unwrap_or(0);
        }
    }

    let mut largest_files: Vec<LargestFile> = ctx
        .files
        .iter()
        .map(|f| LargestFile { path: f.relative_path.clone(), size: f.size })
        .collect();
    largest_files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    largest_files.truncate(20);

    let tree = build_tree(&ctx.files, &largest_files);

    AnalyzerResult::ok(
        FileTreeResult {
            totals,
            files_by_extension,
            largest_files,
            tree,
        },
        started,
    )
}

fn build_tree(files: &[crate::analyzers::types::FileEntry], largest: &[LargestFile]) -> DirNode {
    const MAX_DEPTH: usize = 3;
    let largest_paths: std::collections::HashSet<&str> = largest.iter().map(|f| f.path.as_str()).collect();

    let mut root = DirNode { name: ".".to_string(), children: Vec::new(), files: Vec::new() };

    for entry in files {
        let path = std::path::Path::new(&entry.relative_path);
        let components: Vec<&str> = path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();

        if components.is_empty() {
            continue;
        }

        insert_path(&mut root, &components, 0, MAX_DEPTH, &largest_paths, &entry.relative_path);
    }

    root
}

fn insert_path(
    node: &mut DirNode,
    components: &[&str],
    depth: usize,
    max_depth: usize,
    largest: &std::collections::HashSet<&str>,
    full_path: &str,
) {
    if components.len() == 1 {
        if depth < max_depth || largest.contains(full_path) {
            node.files.push(components[0].to_string());
        }
        return;
    }

    if depth >= max_depth {
        return;
    }

    let dir_name = components[0];
    let child = match node.children.iter_mut().find(|c| c.name == dir_name) {
        Some(c) => c,
        None => {
            node.children.push(DirNode { name: dir_name.to_string(), children: Vec::new(), files: Vec::new() });
            node.children.last_mut().unwrap()
        }
    };

    insert_path(child, &components[1..], depth + 1, max_depth, largest, full_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::FileEntry;
    use crate::cache::analysis_cache::AnalysisCache;
    use crate::core::config::HandoverConfig;
    use tempfile::TempDir;

    #[test]
    fn counts_files_and_extensions() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a(){}\n").unwrap();

        let files = vec![FileEntry {
            relative_path: "a.rs".into(),
            absolute_path: dir.path().join("a.rs").to_string_lossy().into_owned(),
            size: 9,
            extension: ".rs".into(),
        }];

        let ctx = AnalysisContext::new(
            dir.path().to_path_buf(),
            files,
            HandoverConfig::default(),
            AnalysisCache::load(dir.path()),
        );

        let result = analyze(&ctx);
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data.totals.files, 1);
        assert_eq!(data.files_by_extension.get(".rs"), Some(&1));
    }
}
