//! GitHistory analyzer (spec §4.3 item 3). Grounded on the git2 usage
//! pattern from the teacher's file-discovery repository lookup, generalized
//! here to commit/branch/contributor inspection instead of tracked-file
//! enumeration.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use git2::{BranchType, Repository};
use tracing::warn;

use crate::analyzers::context::AnalysisContext;
use crate::analyzers::types::{
    BranchPattern, BranchStrategy, Commit, Contributor, FileChangeCount, GitHistoryResult,
};
use crate::core::config::GitDepth;
use crate::core::errors::Result;

const MAX_COMMITS: usize = 100;
const MAX_CHANGED_FILES: usize = 30;
const ACTIVE_BRANCH_DAYS: i64 = 30;
const STALE_BRANCH_DAYS: i64 = 90;

pub fn analyze(ctx: &AnalysisContext) -> crate::analyzers::context::AnalyzerResult<GitHistoryResult> {
    let started = Instant::now();

    match run(ctx) {
        Ok(result) => crate::analyzers::context::AnalyzerResult::ok(result, started),
        Err(err) => crate::analyzers::context::AnalyzerResult::failed(err.to_string(), started),
    }
}

fn run(ctx: &AnalysisContext) -> Result<GitHistoryResult> {
    let repo = match Repository::discover(&ctx.root) {
        Ok(repo) => repo,
        Err(_) => {
            return Ok(GitHistoryResult {
                is_git_repo: false,
                warnings: vec!["not a git repository".to_string()],
                ..Default::default()
            });
        }
    };

    let branch_pattern = classify_branches(&repo)?;
    let recent_commits = collect_commits(&repo, ctx.git_depth)?;
    let (most_changed_files, activity_by_month) = collect_churn(&repo, ctx.git_depth)?;
    let contributors = collect_contributors(&recent_commits);
    let file_ownership = collect_ownership(&repo, &most_changed_files);

    Ok(GitHistoryResult {
        is_git_repo: true,
        branch_pattern,
        recent_commits,
        most_changed_files,
        activity_by_month,
        contributors,
        file_ownership,
        warnings: Vec::new(),
    })
}

fn classify_branches(repo: &Repository) -> Result<BranchPattern> {
    let mut names = Vec::new();
    let mut active = Vec::new();
    let mut stale = Vec::new();
    let now = Utc::now();

    let branches = repo
        .branches(Some(BranchType::Local))
        .map_err(|e| crate::core::errors::HandoverError::internal(format!("failed to list branches: {e}")))?;

    for branch in branches.flatten() {
        let (branch, _) = branch;
        if let Some(name) = branch.name().ok().flatten() {
            names.push(name.to_string());

            if let Ok(commit) = branch.get().peel_to_commit() {
                let time = commit.time().seconds();
                if let Some(dt) = DateTime::from_timestamp(time, 0) {
                    let age_days = (now - dt).num_days();
                    if age_days <= ACTIVE_BRANCH_DAYS {
                        active.push(name.to_string());
                    } else if age_days >= STALE_BRANCH_DAYS {
                        stale.push(name.to_string());
                    }
                }
            }
        }
    }

    let has_develop = names.iter().any(|n| n == "develop");
    let has_release = names.iter().any(|n| n.starts_with("release/"));
    let has_feature = names.iter().any(|n| n.starts_with("feature/"));

    let strategy = if has_develop && has_release {
        BranchStrategy::GitFlow
    } else if has_feature && !has_develop {
        BranchStrategy::FeatureBranch
    } else if names.len() <= 3 {
        BranchStrategy::TrunkBased
    } else {
        BranchStrategy::Unknown
    };

    let mut evidence = Vec::new();
    if has_develop {
        evidence.push("develop branch present".to_string());
    }
    if has_release {
        evidence.push("release/* branches present".to_string());
    }
    if has_feature {
        evidence.push("feature/* branches present".to_string());
    }

    let default_branch = repo
        .head()
        .ok()
        .and_then(|h| h.shorthand().map(|s| s.to_string()));

    Ok(BranchPattern {
        strategy,
        evidence,
        active_branches: active,
        stale_branches: stale,
        default_branch,
        count: names.len(),
    })
}

fn collect_commits(repo: &Repository, depth: GitDepth) -> Result<Vec<Commit>> {
    let mut revwalk = repo
        .revwalk()
        .map_err(|e| crate::core::errors::HandoverError::internal(format!("revwalk failed: {e}")))?;
    revwalk
        .push_head()
        .map_err(|e| crate::core::errors::HandoverError::internal(format!("revwalk push_head failed: {e}")))?;

    let cutoff = match depth {
        GitDepth::Default => Some(Utc::now() - chrono::Duration::days(180)),
        GitDepth::Full => None,
    };

    let mut commits = Vec::new();
    for oid in revwalk {
        let Ok(oid) = oid else { continue };
        let Ok(commit) = repo.find_commit(oid) else { continue };

        let time = commit.time().seconds();
        let dt = DateTime::from_timestamp(time, 0).unwrap_or_else(Utc::now);

        if let Some(cutoff) = cutoff {
            if dt < cutoff {
                break;
            }
        }

        commits.push(Commit {
            hash: commit.id().to_string(),
            author: commit.author().name().unwrap_or("unknown").to_string(),
            date: dt.to_rfc3339(),
            message: commit.summary().unwrap_or_default().to_string(),
        });

        if commits.len() >= MAX_COMMITS {
            break;
        }
    }

    Ok(commits)
}

fn collect_churn(repo: &Repository, depth: GitDepth) -> Result<(Vec<FileChangeCount>, HashMap<String, usize>)> {
    let mut revwalk = repo
        .revwalk()
        .map_err(|e| crate::core::errors::HandoverError::internal(format!("revwalk failed: {e}")))?;
    revwalk
        .push_head()
        .map_err(|e| crate::core::errors::HandoverError::internal(format!("revwalk push_head failed: {e}")))?;

    let cutoff = match depth {
        GitDepth::Default => Some(Utc::now() - chrono::Duration::days(180)),
        GitDepth::Full => None,
    };

    let mut change_counts: HashMap<String, usize> = HashMap::new();
    let mut activity_by_month: HashMap<String, usize> = HashMap::new();

    for oid in revwalk {
        let Ok(oid) = oid else { continue };
        let Ok(commit) = repo.find_commit(oid) else { continue };

        let time = commit.time().seconds();
        let dt = DateTime::from_timestamp(time, 0).unwrap_or_else(Utc::now);
        if let Some(cutoff) = cutoff {
            if dt < cutoff {
                break;
            }
        }

        *activity_by_month.entry(dt.format("%Y-%m").to_string()).or_insert(0) += 1;

        let tree = commit.tree().ok();
        let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());

        if let Ok(diff) = repo.diff_tree_to_tree(parent_tree.as_ref(), tree.as_ref(), None) {
            let _ = diff.foreach(
                &mut |delta, _| {
                    if let Some(path) = delta.new_file().path().and_then(|p| p.to_str()) {
                        *change_counts.entry(path.to_string()).or_insert(0) += 1;
                    }
                    true
                },
                None,
                None,
                None,
            );
        }
    }

    let mut most_changed: Vec<FileChangeCount> = change_counts
        .into_iter()
        .map(|(path, change_count)| FileChangeCount { path, change_count })
        .collect();
    most_changed.sort_by(|a, b| b.change_count.cmp(&a.change_count).then_with(|| a.path.cmp(&b.path)));
    most_changed.truncate(MAX_CHANGED_FILES);

    Ok((most_changed, activity_by_month))
}

fn collect_contributors(commits: &[Commit]) -> Vec<Contributor> {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for commit in commits {
        *by_name.entry(commit.author.clone()).or_insert(0) += 1;
    }

    let mut contributors: Vec<Contributor> = by_name
        .into_iter()
        .map(|(name, commit_count)| Contributor { name, email: String::new(), commit_count })
        .collect();
    contributors.sort_by(|a, b| b.commit_count.cmp(&a.commit_count));
    contributors
}

fn collect_ownership(repo: &Repository, most_changed: &[FileChangeCount]) -> HashMap<String, String> {
    let mut ownership = HashMap::new();

    for file in most_changed {
        if let Some(owner) = top_contributor_for_path(repo, &file.path) {
            ownership.insert(file.path.clone(), owner);
        }
    }

    ownership
}

fn top_contributor_for_path(repo: &Repository, path: &str) -> Option<String> {
    let mut revwalk = repo.revwalk().ok()?;
    revwalk.push_head().ok()?;

    let mut counts: HashMap<String, usize> = HashMap::new();

    for oid in revwalk {
        let Ok(oid) = oid else { continue };
        let Ok(commit) = repo.find_commit(oid) else { continue };

        let tree = commit.tree().ok();
        let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());

        if let Ok(diff) = repo.diff_tree_to_tree(parent_tree.as_ref(), tree.as_ref(), None) {
            let mut touched = false;
            let _ = diff.foreach(
                &mut |delta, _| {
                    if delta.new_file().path().and_then(|p| p.to_str()) == Some(path) {
                        touched = true;
                    }
                    true
                },
                None,
                None,
                None,
            );
            if touched {
                let author = commit.author().name().unwrap_or("unknown").to_string();
                *counts.entry(author).or_insert(0) += 1;
            }
        }
    }

    counts.into_iter().max_by_key(|(_, count)| *count).map(|(name, _)| name)
}

#[allow(dead_code)]
fn log_discovery_failure(path: &std::path::Path) {
    warn!(path = %path.display(), "not inside a git repository");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::FileEntry;
    use crate::cache::analysis_cache::AnalysisCache;
    use crate::core::config::HandoverConfig;
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, path: &std::path::Path, rel: &str, content: &str, msg: &str) {
        std::fs::write(path, content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(std::path::Path::new(rel)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Ada Lovelace", "ada@example.com").unwrap();

        let parents: Vec<git2::Commit> = match repo.head().ok().and_then(|h| h.peel_to_commit().ok()) {
            Some(c) => vec![c],
            None => vec![],
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parent_refs).unwrap();
    }

    fn ctx_for(dir: &TempDir) -> AnalysisContext {
        AnalysisContext::new(
            dir.path().to_path_buf(),
            vec![FileEntry { relative_path: "a.txt".into(), absolute_path: String::new(), size: 0, extension: String::new() }],
            HandoverConfig::default(),
            AnalysisCache::load(dir.path()),
        )
    }

    #[test]
    fn non_repository_returns_success_sentinel() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_for(&dir);
        let result = analyze(&ctx);
        assert!(result.success);
        let data = result.data.unwrap();
        assert!(!data.is_git_repo);
        assert!(!data.warnings.is_empty());
    }

    #[test]
    fn single_branch_repo_classifies_trunk_based_and_counts_commits() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_file(&repo, &dir.path().join("a.txt"), "a.txt", "one", "first commit");
        commit_file(&repo, &dir.path().join("a.txt"), "a.txt", "two", "second commit");

        let ctx = ctx_for(&dir);
        let data = analyze(&ctx).data.unwrap();

        assert!(data.is_git_repo);
        assert_eq!(data.branch_pattern.strategy, BranchStrategy::TrunkBased);
        assert_eq!(data.recent_commits.len(), 2);
        assert_eq!(data.recent_commits[0].message, "second commit");
        assert!(data.most_changed_files.iter().any(|f| f.path == "a.txt" && f.change_count == 2));
        assert_eq!(data.contributors[0].name, "Ada Lovelace");
        assert_eq!(data.contributors[0].commit_count, 2);
    }

    #[test]
    fn git_flow_strategy_detected_from_branch_names() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_file(&repo, &dir.path().join("a.txt"), "a.txt", "one", "first");
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("develop", &head, false).unwrap();
        repo.branch("release/1.0", &head, false).unwrap();

        let ctx = ctx_for(&dir);
        let data = analyze(&ctx).data.unwrap();
        assert_eq!(data.branch_pattern.strategy, BranchStrategy::GitFlow);
    }
}
