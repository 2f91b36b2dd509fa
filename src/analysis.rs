//! Classification of every discovered repository
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    category::{CategoryPartition, RepositoryObservation},
    git::VersionControl,
    platform::HostedRepositoryIndex,
    resolver::RemoteResolver,
};

/// Log a progress line every this many repositories
const PROGRESS_INTERVAL: usize = 25;

/// Style of the analysis progress bar
fn get_style() -> Option<ProgressStyle> {
    match ProgressStyle::with_template("{prefix:.bold.dim} {spinner} [{pos}/{len}] {wide_msg}") {
        Ok(s) => Some(s.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")),
        Err(_) => None,
    }
}

/// Name a repository after its directory
fn repository_name(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_string)
}

/// Runs the resolver over every repository and partitions the results
pub struct AnalysisEngine<'a> {
    /// Resolver used for every repository
    resolver: RemoteResolver<'a>,

    /// Whether to draw a progress bar
    show_progress: bool,
}

impl<'a> AnalysisEngine<'a> {
    /// Create an engine
    pub fn new(vcs: &'a dyn VersionControl, host: &'a str) -> Self {
        Self {
            resolver: RemoteResolver::new(vcs, host),
            show_progress: true,
        }
    }

    /// Don't draw a progress bar
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Classify every repository. A repository that can't be resolved lands in
    /// `Problems`; the run always covers every input.
    pub fn analyze(
        &self,
        local_repos: &[PathBuf],
        index: &HostedRepositoryIndex,
    ) -> CategoryPartition {
        let total = local_repos.len();
        let pb = if self.show_progress {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Some(style) = get_style() {
            pb.set_style(style);
        }
        pb.set_prefix("Analyzing");

        let mut partition = CategoryPartition::default();
        for (idx, path) in local_repos.iter().enumerate() {
            let observation = self.observe(path, index);
            pb.set_message(format!("{}: {}", observation.name, observation.category()));
            pb.inc(1);
            if (idx + 1) % PROGRESS_INTERVAL == 0 {
                log::debug!("Analyzed {}/{total} repositories", idx + 1);
            }
            partition.push(observation);
        }
        pb.finish_and_clear();
        log::info!("Analyzed {total} repositories");
        partition
    }

    /// Observe one repository, degrading failures to `Problems`
    fn observe(&self, path: &Path, index: &HostedRepositoryIndex) -> RepositoryObservation {
        let Some(name) = repository_name(path) else {
            let name = path.display().to_string();
            let note = "directory name is not valid UTF-8";
            return RepositoryObservation::problem(name, path.to_path_buf(), note);
        };
        match self.resolver.resolve(path, &name, index) {
            Ok(observation) => observation,
            Err(e) => {
                log::warn!("{name}: {e}");
                RepositoryObservation::problem(name, path.to_path_buf(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::category::Category;
    use crate::testing::{FakeRepo, FakeVcs};
    use std::collections::HashSet;

    const HOST: &str = "github.com";

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    fn sample_vcs() -> FakeVcs {
        FakeVcs::new()
            .with_repo(
                "/r/foo",
                FakeRepo::with_commits().remote("origin", "git@github.com:me/foo.git", true),
            )
            .with_repo(
                "/r/bar",
                FakeRepo::with_commits().remote("origin", "git@github.com:me/bar.git", false),
            )
            .with_repo("/r/baz", FakeRepo::with_commits())
            .with_repo("/r/qux", FakeRepo::empty())
            .with_repo("/r/broken", FakeRepo::empty())
    }

    #[test]
    fn every_repository_lands_in_exactly_one_slot() {
        let vcs = sample_vcs();
        let repos = paths(&["/r/foo", "/r/bar", "/r/baz", "/r/qux", "/r/broken", "/r/vanished"]);
        let index = HostedRepositoryIndex::from_names(["foo", "bar", "broken"]);
        let partition = AnalysisEngine::new(&vcs, HOST).quiet().analyze(&repos, &index);

        assert_eq!(partition.total(), repos.len());
        let mut seen = HashSet::new();
        for category in Category::ALL {
            for obs in partition.get(category) {
                assert_eq!(obs.category(), category);
                assert!(seen.insert(obs.path.clone()), "{} listed twice", obs.name);
            }
        }
        assert_eq!(seen, repos.into_iter().collect::<HashSet<_>>());

        assert_eq!(partition.already_synced[0].name, "foo");
        assert_eq!(partition.needs_reconnection[0].name, "bar");
        assert_eq!(partition.ready_to_push[0].name, "baz");
        assert_eq!(partition.needs_commits[0].name, "qux");
        let problems: Vec<_> = partition.problems.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(problems, vec!["broken", "vanished"]);
        assert!(partition.problems[1].note.is_some());
    }

    #[test]
    fn empty_hosted_index_only_yields_push_or_commit_work() {
        let vcs = sample_vcs();
        let repos = paths(&["/r/foo", "/r/bar", "/r/baz", "/r/qux", "/r/broken"]);
        let partition = AnalysisEngine::new(&vcs, HOST)
            .quiet()
            .analyze(&repos, &HostedRepositoryIndex::default());

        assert!(partition.already_synced.is_empty());
        assert!(partition.needs_reconnection.is_empty());
        assert!(partition.problems.is_empty());
        let push: Vec<_> = partition.ready_to_push.iter().map(|o| o.name.as_str()).collect();
        let commits: Vec<_> = partition.needs_commits.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(push, vec!["foo", "bar", "baz"]);
        assert_eq!(commits, vec!["qux", "broken"]);
        assert!(vcs.probed().is_empty());
    }

    #[test]
    fn discovery_order_is_kept() {
        let vcs = FakeVcs::new()
            .with_repo("/r/b", FakeRepo::with_commits())
            .with_repo("/r/a", FakeRepo::with_commits());
        let partition = AnalysisEngine::new(&vcs, HOST)
            .quiet()
            .analyze(&paths(&["/r/b", "/r/a"]), &HostedRepositoryIndex::default());
        let names: Vec<_> = partition.ready_to_push.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
