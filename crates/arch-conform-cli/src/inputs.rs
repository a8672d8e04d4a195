//! Locates the two files a `check` run reads: the rule configuration and
//! the exported dependency graph.
//!
//! Both follow the same lookup. An explicit flag wins, then a file in the
//! project directory, then one in the project's `.arch-conform/` directory:
//!
//! | input  | flag       | project              | `.arch-conform/`  |
//! |--------|------------|----------------------|-------------------|
//! | config | `--config` | `arch-conform.toml`  | `config.toml`     |
//! | graph  | `--graph`  | `arch-graph.json`    | `arch-graph.json` |
//!
//! Configuration then falls back to a `config.toml` shared by all of a
//! user's projects (`$ARCH_CONFORM_CONFIG_DIR` or `~/.arch-conform/`), and
//! finally to an empty rule set. The graph has no shared fallback: when
//! nothing is found the project-level path is still returned and loading
//! it reports the missing file.

use std::path::{Path, PathBuf};

/// Configuration file name in the project directory.
const CONFIG_FILE: &str = "arch-conform.toml";

/// Graph file name, both in the project and in [`STATE_DIR`].
const GRAPH_FILE: &str = "arch-graph.json";

/// Directory holding arch-conform files, per project and per user.
const STATE_DIR: &str = ".arch-conform";

/// Configuration file name inside [`STATE_DIR`] and the shared directory.
const STATE_CONFIG_FILE: &str = "config.toml";

/// Overrides the shared configuration directory.
const SHARED_DIR_ENV: &str = "ARCH_CONFORM_CONFIG_DIR";

/// Where the rule configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`; not checked for existence.
    Explicit(PathBuf),
    /// Found in the project.
    Project(PathBuf),
    /// Found in the shared per-user directory.
    Shared(PathBuf),
    /// Nothing found; no rules run.
    Default,
}

impl ConfigSource {
    /// Returns the configuration file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Shared(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Did the configuration come from outside the project?
    #[must_use]
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

/// Where the dependency graph is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphSource {
    /// Given with `--graph`; not checked for existence.
    Explicit(PathBuf),
    /// Found in the project.
    Project(PathBuf),
    /// Nothing found; the default project path.
    Expected(PathBuf),
}

impl GraphSource {
    /// Consumes the source, returning the graph file path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Expected(p) => p,
        }
    }
}

/// The located inputs of one `check` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    /// Rule configuration.
    pub config: ConfigSource,
    /// Dependency graph.
    pub graph: GraphSource,
}

/// Looks up inputs relative to one project directory.
#[derive(Debug, Clone)]
pub struct Locator {
    project: PathBuf,
    shared_dir: Option<PathBuf>,
}

impl Locator {
    /// Creates a locator using the shared directory from the environment.
    #[must_use]
    pub fn new(project: impl Into<PathBuf>) -> Self {
        Self::with_shared_dir(project, shared_dir())
    }

    /// Creates a locator with an explicit shared directory.
    #[must_use]
    pub fn with_shared_dir(project: impl Into<PathBuf>, shared_dir: Option<PathBuf>) -> Self {
        Self {
            project: project.into(),
            shared_dir,
        }
    }

    /// Locates configuration and graph, honouring the explicit flags.
    #[must_use]
    pub fn locate(&self, config: Option<&Path>, graph: Option<&Path>) -> Inputs {
        Inputs {
            config: self.config(config),
            graph: self.graph(graph),
        }
    }

    fn config(&self, explicit: Option<&Path>) -> ConfigSource {
        if let Some(p) = explicit {
            return ConfigSource::Explicit(p.to_path_buf());
        }
        if let Some(found) = first_existing(self.project_candidates(CONFIG_FILE, STATE_CONFIG_FILE)) {
            tracing::debug!("Found project config: {}", found.display());
            return ConfigSource::Project(found);
        }
        let shared = self
            .shared_dir
            .as_ref()
            .map(|dir| dir.join(STATE_CONFIG_FILE))
            .filter(|p| p.is_file());
        match shared {
            Some(found) => {
                tracing::debug!("Found shared config: {}", found.display());
                ConfigSource::Shared(found)
            }
            None => ConfigSource::Default,
        }
    }

    fn graph(&self, explicit: Option<&Path>) -> GraphSource {
        if let Some(p) = explicit {
            return GraphSource::Explicit(p.to_path_buf());
        }
        match first_existing(self.project_candidates(GRAPH_FILE, GRAPH_FILE)) {
            Some(found) => {
                tracing::debug!("Found graph: {}", found.display());
                GraphSource::Project(found)
            }
            None => GraphSource::Expected(self.project.join(GRAPH_FILE)),
        }
    }

    /// Project-level candidates in lookup order.
    fn project_candidates(&self, file: &str, state_file: &str) -> [PathBuf; 2] {
        [
            self.project.join(file),
            self.project.join(STATE_DIR).join(state_file),
        ]
    }
}

fn first_existing(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| p.is_file())
}

/// Returns the shared configuration directory.
///
/// `$ARCH_CONFORM_CONFIG_DIR` if set, else `~/.arch-conform/`.
#[must_use]
pub fn shared_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(SHARED_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(STATE_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn flags_win_without_existence_checks() {
        let project = TempDir::new().unwrap();
        touch(&project.path().join(CONFIG_FILE));
        touch(&project.path().join(GRAPH_FILE));

        let inputs = Locator::with_shared_dir(project.path(), None).locate(
            Some(Path::new("/nonexistent/rules.toml")),
            Some(Path::new("/nonexistent/deps.json")),
        );
        assert_eq!(
            inputs.config,
            ConfigSource::Explicit(PathBuf::from("/nonexistent/rules.toml"))
        );
        assert_eq!(
            inputs.graph,
            GraphSource::Explicit(PathBuf::from("/nonexistent/deps.json"))
        );
    }

    #[test]
    fn project_files_are_found_next_to_each_other() {
        let project = TempDir::new().unwrap();
        touch(&project.path().join(CONFIG_FILE));
        touch(&project.path().join(GRAPH_FILE));

        let inputs = Locator::with_shared_dir(project.path(), None).locate(None, None);
        assert_eq!(
            inputs.config,
            ConfigSource::Project(project.path().join(CONFIG_FILE))
        );
        assert_eq!(
            inputs.graph,
            GraphSource::Project(project.path().join(GRAPH_FILE))
        );
    }

    #[test]
    fn state_dir_is_searched_after_project_root() {
        let project = TempDir::new().unwrap();
        let state = project.path().join(".arch-conform");
        touch(&state.join("config.toml"));
        touch(&state.join("arch-graph.json"));

        let locator = Locator::with_shared_dir(project.path(), None);
        let inputs = locator.locate(None, None);
        assert_eq!(inputs.config, ConfigSource::Project(state.join("config.toml")));
        assert_eq!(inputs.graph, GraphSource::Project(state.join("arch-graph.json")));

        touch(&project.path().join(GRAPH_FILE));
        assert_eq!(
            locator.locate(None, None).graph,
            GraphSource::Project(project.path().join(GRAPH_FILE))
        );
    }

    #[test]
    fn missing_graph_points_at_the_project_default() {
        let project = TempDir::new().unwrap();
        let graph = Locator::with_shared_dir(project.path(), None)
            .locate(None, None)
            .graph;
        assert_eq!(graph, GraphSource::Expected(project.path().join(GRAPH_FILE)));
        assert_eq!(graph.into_path(), project.path().join("arch-graph.json"));
    }

    #[test]
    fn shared_dir_supplies_config_but_never_the_graph() {
        let project = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        touch(&shared.path().join("config.toml"));
        touch(&shared.path().join("arch-graph.json"));

        let inputs = Locator::with_shared_dir(project.path(), Some(shared.path().to_path_buf()))
            .locate(None, None);
        assert_eq!(
            inputs.config,
            ConfigSource::Shared(shared.path().join("config.toml"))
        );
        assert!(inputs.config.is_shared());
        assert!(matches!(inputs.graph, GraphSource::Expected(_)));
    }

    #[test]
    fn project_config_shadows_shared_config() {
        let project = TempDir::new().unwrap();
        touch(&project.path().join(".arch-conform/config.toml"));
        let shared = TempDir::new().unwrap();
        touch(&shared.path().join("config.toml"));

        let config = Locator::with_shared_dir(project.path(), Some(shared.path().to_path_buf()))
            .locate(None, None)
            .config;
        assert!(!config.is_shared());
    }

    #[test]
    fn nothing_found_runs_without_rules() {
        let project = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();

        let config = Locator::with_shared_dir(project.path(), Some(shared.path().to_path_buf()))
            .locate(None, None)
            .config;
        assert_eq!(config, ConfigSource::Default);
        assert!(config.path().is_none());
    }

    #[test]
    fn directory_named_like_a_config_is_skipped() {
        let project = TempDir::new().unwrap();
        fs::create_dir(project.path().join(CONFIG_FILE)).unwrap();

        let config = Locator::with_shared_dir(project.path(), None)
            .locate(None, None)
            .config;
        assert_eq!(config, ConfigSource::Default);
    }
}
