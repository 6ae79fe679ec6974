//! Manifest resolution: following includes and merging their contents.
//!
//! Resolution starts at a root manifest, merges its own entries, and then
//! visits each include in declaration order, cloning the included repository
//! into the install root first when it is not there yet.  The result is a
//! single [`ResolvedContext`] whose entries are in visitation order:
//!
//! ```text
//! root.snix            items: a, b          merged items: a, b, c, d, e
//!  └─ team/web/web.snix  items: c, d, e
//! ```
//!
//! Entries are never deduplicated; a manifest reachable through two includes
//! contributes its entries twice.  Re-entering a manifest that is still being
//! visited is a cycle and fails with [`ManifestError::CyclicInclude`].
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::BIN_DIRNAME;
use crate::error::ManifestError;
use crate::exec::Executor;
use crate::installer::InstallerStrategy;
use crate::logging::Log;
use crate::manifest::{Include, ItemSpec, ManifestDocument, ManifestLoader};
use crate::resources::item::Item;
use crate::resources::repo::{Repo, dir_name};
use crate::resources::script::Script;
use crate::resources::{Applicable, Resource};

/// Flattened result of resolving one root manifest and everything it
/// includes.
///
/// Built once per invocation by [`Resolver::resolve`] and read-only after
/// that.  Entities are materialized lazily from the merged data, so the
/// orchestrator never builds an item it will not run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedContext {
    home: PathBuf,
    config: BTreeMap<String, String>,
    items: Vec<ItemSpec>,
    repos: Vec<String>,
    custom_scripts: Vec<String>,
    manifests: Vec<PathBuf>,
}

impl ResolvedContext {
    pub(crate) fn new(home: PathBuf) -> Self {
        Self {
            home,
            ..Self::default()
        }
    }

    /// Append one manifest's entries; `config` keys overwrite earlier ones.
    pub(crate) fn merge(&mut self, path: PathBuf, doc: ManifestDocument) {
        self.config.extend(doc.config);
        self.items.extend(doc.items);
        self.repos.extend(doc.repos);
        self.custom_scripts.extend(doc.custom_scripts);
        self.manifests.push(path);
    }

    /// Install root everything resolves against.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Merged `config` of every visited manifest.
    #[must_use]
    pub const fn config(&self) -> &BTreeMap<String, String> {
        &self.config
    }

    /// Canonical paths of the visited manifests, in visitation order.
    #[must_use]
    pub fn manifests(&self) -> &[PathBuf] {
        &self.manifests
    }

    /// Number of items, counting each name separately.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.iter().map(|spec| spec.names.len()).sum()
    }

    /// Number of repositories to clone.
    #[must_use]
    pub fn repo_count(&self) -> usize {
        self.repos.len()
    }

    /// Number of custom scripts.
    #[must_use]
    pub fn script_count(&self) -> usize {
        self.custom_scripts.len()
    }

    /// Items in declaration order, one per name.
    ///
    /// An item's `dir` is taken relative to the install root.
    pub fn items<'a>(&'a self, executor: &'a dyn Executor) -> impl Iterator<Item = Item<'a>> {
        let config = &self.config;
        let home = self.home.as_path();
        self.items.iter().flat_map(move |spec| {
            spec.names.iter().map(move |name| {
                let item = Item::new(name, &spec.via, config, executor);
                match &spec.dir {
                    Some(dir) => item.in_directory(home.join(dir)),
                    None => item,
                }
            })
        })
    }

    /// Repositories in declaration order.
    pub fn repos<'a>(&'a self, executor: &'a dyn Executor) -> impl Iterator<Item = Repo<'a>> {
        let home = self.home.as_path();
        self.repos
            .iter()
            .map(move |location| Repo::new(location, home, executor))
    }

    /// Custom scripts in declaration order.
    pub fn scripts<'a>(&'a self, executor: &'a dyn Executor) -> impl Iterator<Item = Script<'a>> {
        let home = self.home.as_path();
        self.custom_scripts
            .iter()
            .map(move |location| Script::new(location, home, executor))
    }

    /// Directories the user's shell `PATH` must contain for installed tools
    /// to be found.
    #[must_use]
    pub fn required_path_entries(&self) -> Vec<PathBuf> {
        vec![self.home.join(BIN_DIRNAME)]
    }
}

/// Write `lines` indented, or `(none)` when there are none.
fn write_section(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    lines: impl Iterator<Item = String>,
) -> fmt::Result {
    writeln!(f, "{title}:")?;
    let mut empty = true;
    for line in lines {
        empty = false;
        writeln!(f, "  {line}")?;
    }
    if empty {
        writeln!(f, "  (none)")?;
    }
    Ok(())
}

impl fmt::Display for ResolvedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(
            f,
            "Items to install",
            self.items.iter().flat_map(|spec| {
                let strategy = InstallerStrategy::classify(&spec.via);
                let dir = spec
                    .dir
                    .as_ref()
                    .map_or_else(String::new, |d| format!(" in {d}"));
                spec.names
                    .iter()
                    .map(move |name| format!("{name} via {strategy}{dir}"))
            }),
        )?;
        write_section(f, "Repositories to clone", self.repos.iter().cloned())?;
        write_section(
            f,
            "Custom scripts to execute",
            self.custom_scripts.iter().cloned(),
        )?;
        write_section(
            f,
            "Configuration",
            self.config.iter().map(|(k, v)| format!("{k} = {v}")),
        )?;
        write_section(
            f,
            "Manifests",
            self.manifests.iter().map(|p| {
                p.strip_prefix(&self.home)
                    .unwrap_or(p)
                    .display()
                    .to_string()
            }),
        )
    }
}

/// Resolves a root manifest into a [`ResolvedContext`].
pub struct Resolver<'a> {
    home: &'a Path,
    loader: &'a ManifestLoader,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("home", &self.home)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl<'a> Resolver<'a> {
    /// Create a resolver for the install root `home`.
    ///
    /// `executor` is used to clone repositories holding included manifests.
    #[must_use]
    pub const fn new(
        home: &'a Path,
        loader: &'a ManifestLoader,
        executor: &'a dyn Executor,
        log: &'a dyn Log,
    ) -> Self {
        Self {
            home,
            loader,
            executor,
            log,
        }
    }

    /// Resolve `root` and every manifest it includes, transitively.
    ///
    /// Either every manifest loads, validates, and merges, or an error is
    /// returned and nothing is.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] for missing, malformed, or invalid
    /// manifests, missing include targets, and cycles, and a
    /// [`ResourceError`](crate::error::ResourceError) if cloning an include
    /// fails.
    pub fn resolve(&self, root: &Path) -> Result<ResolvedContext> {
        let home = dunce::canonicalize(self.home).unwrap_or_else(|_| self.home.to_path_buf());
        let mut ctx = ResolvedContext::new(home);
        let mut visiting = Vec::new();
        self.visit(root, &mut visiting, &mut ctx)?;
        self.log.debug(&format!(
            "resolved {} manifest(s): {} item(s), {} repo(s), {} script(s)",
            ctx.manifests.len(),
            ctx.item_count(),
            ctx.repo_count(),
            ctx.script_count()
        ));
        Ok(ctx)
    }

    fn visit(
        &self,
        path: &Path,
        visiting: &mut Vec<PathBuf>,
        ctx: &mut ResolvedContext,
    ) -> Result<()> {
        let key =
            dunce::canonicalize(path).map_err(|_| ManifestError::NotFound(path.to_path_buf()))?;
        if visiting.contains(&key) {
            let chain = visiting
                .iter()
                .chain(std::iter::once(&key))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ManifestError::CyclicInclude { chain }.into());
        }

        self.log.debug(&format!("reading manifest {}", key.display()));
        let mut doc = self.loader.load(&key)?;
        let includes = std::mem::take(&mut doc.includes);

        visiting.push(key.clone());
        ctx.merge(key, doc);
        for include in &includes {
            let included = self.include_path(include)?;
            self.visit(&included, visiting, ctx)?;
        }
        visiting.pop();
        Ok(())
    }

    /// Locate an included manifest, cloning its repository when needed.
    fn include_path(&self, include: &Include) -> Result<PathBuf> {
        let dir = dir_name(&include.upstream_repo)?;
        let repo = Repo::new(&include.upstream_repo, self.home, self.executor);
        if repo.needs_change()? {
            self.log.debug(&format!(
                "include repository {} is not present",
                include.upstream_repo
            ));
            repo.apply()?;
        }

        let path = include.manifest_path(self.home, &dir);
        if !path.is_file() {
            return Err(ManifestError::IncludeNotFound {
                path,
                upstream: include.upstream_repo.clone(),
            }
            .into());
        }
        Ok(path)
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::exec::CWD_MUTEX;
    use crate::logging::Logger;
    use crate::manifest::BUNDLED_SCHEMA;
    use crate::resources::test_helpers::{MockExecutor, exit};

    fn loader() -> ManifestLoader {
        let schema: serde_json::Value = serde_json::from_str(BUNDLED_SCHEMA).unwrap();
        ManifestLoader::from_schema(&schema, Path::new("schema.json")).unwrap()
    }

    fn write(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn include(repo: &str, group: &str) -> String {
        format!(r#"{{"upstreamRepo":"https://github.com/acme/{repo}.git","pathRelativeToGroupManifestDir":"{group}"}}"#)
    }

    fn resolve(home: &Path, root: &Path, executor: &MockExecutor) -> Result<ResolvedContext> {
        let loader = loader();
        let log = Logger::new("test");
        Resolver::new(home, &loader, executor, &log).resolve(root)
    }

    fn names(ctx: &ResolvedContext, executor: &MockExecutor) -> Vec<String> {
        ctx.items(executor).map(|i| i.name().to_string()).collect()
    }

    #[test]
    fn own_entries_come_before_includes() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(
            &root,
            &format!(
                r#"{{"items":[{{"names":["a","b"],"via":"brew"}}],"includes":[{}]}}"#,
                include("team", "web")
            ),
        );
        write(
            &home.path().join("team/web/web.snix"),
            r#"{"items":[{"names":["c","d"],"via":"brew"},{"names":["e"],"via":"echo e"}]}"#,
        );

        let executor = MockExecutor::new();
        let ctx = resolve(home.path(), &root, &executor).unwrap();

        assert_eq!(ctx.item_count(), 5);
        assert_eq!(names(&ctx, &executor), ["a", "b", "c", "d", "e"]);
        assert_eq!(ctx.manifests().len(), 2);
    }

    #[test]
    fn includes_are_visited_in_declaration_order_depth_first() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(
            &root,
            &format!(
                r#"{{"repos":["r0"],"includes":[{},{}]}}"#,
                include("one", "g1"),
                include("two", "g2")
            ),
        );
        write(
            &home.path().join("one/g1/g1.snix"),
            &format!(r#"{{"repos":["r1"],"includes":[{}]}}"#, include("three", "g3")),
        );
        write(&home.path().join("two/g2/g2.snix"), r#"{"repos":["r2"]}"#);
        write(&home.path().join("three/g3/g3.snix"), r#"{"repos":["r3"]}"#);

        let executor = MockExecutor::new();
        let ctx = resolve(home.path(), &root, &executor).unwrap();
        let repos: Vec<_> = ctx.repos(&executor).map(|r| r.location().to_string()).collect();
        assert_eq!(repos, ["r0", "r1", "r3", "r2"]);
    }

    #[test]
    fn diamond_includes_are_merged_twice() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(
            &root,
            &format!(
                r#"{{"includes":[{},{}]}}"#,
                include("left", "l"),
                include("right", "r")
            ),
        );
        write(
            &home.path().join("left/l/l.snix"),
            &format!(r#"{{"includes":[{}]}}"#, include("base", "b")),
        );
        write(
            &home.path().join("right/r/r.snix"),
            &format!(r#"{{"includes":[{}]}}"#, include("base", "b")),
        );
        write(
            &home.path().join("base/b/b.snix"),
            r#"{"items":[{"names":["git"],"via":"brew"}]}"#,
        );

        let executor = MockExecutor::new();
        let ctx = resolve(home.path(), &root, &executor).unwrap();
        assert_eq!(names(&ctx, &executor), ["git", "git"]);
    }

    #[test]
    fn cycles_are_detected() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(&root, &format!(r#"{{"includes":[{}]}}"#, include("a", "x")));
        write(
            &home.path().join("a/x/x.snix"),
            &format!(r#"{{"includes":[{}]}}"#, include("b", "y")),
        );
        write(
            &home.path().join("b/y/y.snix"),
            &format!(r#"{{"includes":[{}]}}"#, include("a", "x")),
        );

        let executor = MockExecutor::new();
        let err = resolve(home.path(), &root, &executor).unwrap_err();
        match err.downcast_ref::<ManifestError>() {
            Some(ManifestError::CyclicInclude { chain }) => {
                assert_eq!(chain.matches(" -> ").count(), 3, "chain: {chain}");
                assert!(chain.ends_with("x.snix"), "chain: {chain}");
            }
            other => panic!("expected CyclicInclude, got {other:?}"),
        }
    }

    #[test]
    fn self_include_is_a_cycle() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("self/me/me.snix");
        write(&root, &format!(r#"{{"includes":[{}]}}"#, include("self", "me")));

        let executor = MockExecutor::new();
        let err = resolve(home.path(), &root, &executor).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::CyclicInclude { .. })
        ));
    }

    #[test]
    fn invalid_include_fails_whole_resolution() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(
            &root,
            &format!(
                r#"{{"items":[{{"names":["a"],"via":"brew"}}],"includes":[{}]}}"#,
                include("team", "web")
            ),
        );
        write(
            &home.path().join("team/web/web.snix"),
            r#"{"items":[{"names":["b"]}]}"#,
        );

        let executor = MockExecutor::new();
        let err = resolve(home.path(), &root, &executor).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::SchemaValidation { .. })
        ));
    }

    #[test]
    fn missing_root_is_not_found() {
        let home = tempfile::tempdir().unwrap();
        let executor = MockExecutor::new();
        let err = resolve(home.path(), &home.path().join("nope.snix"), &executor).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::NotFound(_))
        ));
    }

    #[test]
    fn existing_repo_without_group_manifest_is_include_not_found() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(&root, &format!(r#"{{"includes":[{}]}}"#, include("team", "web")));
        std::fs::create_dir(home.path().join("team")).unwrap();

        let mut executor = MockExecutor::new();
        executor.expect_execute().never();
        let err = resolve(home.path(), &root, &executor).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::IncludeNotFound { .. })
        ));
    }

    #[test]
    fn missing_include_repo_is_cloned_into_home() {
        let _lock = CWD_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(&root, &format!(r#"{{"includes":[{}]}}"#, include("team", "web")));

        let mut executor = MockExecutor::new();
        executor.expect_network_reachable().return_const(true);
        executor.expect_which().return_const(true);
        executor
            .expect_execute()
            .withf(|argv, _| argv == ["git", "clone", "https://github.com/acme/team.git"])
            .times(1)
            .returning(|_, _| {
                // Stand in for git: create the clone in the working directory.
                let dir = std::env::current_dir()?.join("team/web");
                std::fs::create_dir_all(&dir)?;
                std::fs::write(
                    dir.join("web.snix"),
                    r#"{"items":[{"names":["node"],"via":"brew"}]}"#,
                )?;
                Ok(exit(0))
            });

        let ctx = resolve(home.path(), &root, &executor).unwrap();
        assert_eq!(names(&ctx, &executor), ["node"]);
    }

    #[test]
    fn config_merges_with_last_visited_winning() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(
            &root,
            &format!(
                r#"{{"config":{{"workingdir":"/root","keep":"yes"}},"includes":[{}]}}"#,
                include("team", "web")
            ),
        );
        write(
            &home.path().join("team/web/web.snix"),
            r#"{"config":{"workingdir":"/team"}}"#,
        );

        let executor = MockExecutor::new();
        let ctx = resolve(home.path(), &root, &executor).unwrap();
        assert_eq!(ctx.config()["workingdir"], "/team");
        assert_eq!(ctx.config()["keep"], "yes");
    }

    #[test]
    fn required_path_entries_point_at_bin() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(&root, "{}");
        let executor = MockExecutor::new();
        let ctx = resolve(home.path(), &root, &executor).unwrap();
        assert_eq!(
            ctx.required_path_entries(),
            vec![ctx.home().join("bin")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn display_lists_everything() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("root.snix");
        write(
            &root,
            &format!(
                r#"{{
                    "config": {{"workingdir": "/tmp/dl"}},
                    "items": [{{"names": ["wget", "jq"], "via": "brew"}}],
                    "repos": ["https://github.com/acme/dots.git"],
                    "customScripts": ["dots/setup.sh"],
                    "includes": [{}]
                }}"#,
                include("team", "web")
            ),
        );
        write(
            &home.path().join("team/web/web.snix"),
            r#"{
                "config": {"applications_dir": "/Applications"},
                "items": [
                    {"names": ["iterm2"], "via": "brew-cask"},
                    {"names": ["Tool"], "via": "https://example.com/Tool.zip"},
                    {"names": ["rustup"], "via": "curl https://sh.rustup.rs | sh"}
                ]
            }"#,
        );

        let executor = MockExecutor::new();
        let ctx = resolve(home.path(), &root, &executor).unwrap();
        insta::assert_snapshot!(ctx.to_string(), @r"
        Items to install:
          wget via brew
          jq via brew
          iterm2 via brew-cask
          Tool via https://example.com/Tool.zip
          rustup via `curl https://sh.rustup.rs | sh`
        Repositories to clone:
          https://github.com/acme/dots.git
        Custom scripts to execute:
          dots/setup.sh
        Configuration:
          applications_dir = /Applications
          workingdir = /tmp/dl
        Manifests:
          root.snix
          team/web/web.snix
        ");
    }

    #[test]
    fn empty_context_display() {
        let ctx = ResolvedContext::new(PathBuf::from("/opt/snix"));
        insta::assert_snapshot!(ctx.to_string(), @r"
        Items to install:
          (none)
        Repositories to clone:
          (none)
        Custom scripts to execute:
          (none)
        Configuration:
          (none)
        Manifests:
          (none)
        ");
    }
}
