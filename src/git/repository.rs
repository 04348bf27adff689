use crate::config::Settings;
use crate::config::settings::DEFAULT_LOG_TAIL;
use crate::error::{GitError, GitResult};
use crate::git::branch::Branch;
use crate::git::branch_collection::BranchCollection;
use crate::git::commit::Commit;
use crate::git::diff::Diff;
use crate::git::tag::Tag;
use crate::git::version::GitVersion;
use crate::shell::{CommandLine, DefaultShell, ExecOptions, Shell};
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

static COMMIT_SHA1_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^commit ([0-9a-fA-F]{40})$").unwrap_or_else(|_| unreachable!()));

static SUBMODULE_STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+\- ])([0-9a-fA-F]{40}) (.*) (.*)$").unwrap_or_else(|_| unreachable!())
});

/// git honours these over the working directory, so they are always removed
/// from the child's environment.
const CLEAR_GIT_ENV_VARS: [&str; 3] = ["GIT_DIR", "GIT_INDEX_FILE", "GIT_WORK_TREE"];

/// How to build a [`Repository`]
#[derive(Clone, Default)]
pub struct RepositoryOptions {
    /// Shell used to run git, [`DefaultShell`] when `None`
    pub shell: Option<Arc<dyn Shell>>,
    pub settings: Settings,
}

impl RepositoryOptions {
    /// Options using `shell` and default settings
    pub fn with_shell(shell: Arc<dyn Shell>) -> Self {
        Self {
            shell: Some(shell),
            settings: Settings::default(),
        }
    }

    /// Replace the settings
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Prune remote-tracking branches that no longer exist
    pub prune: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BranchOptions {
    /// Include remote branches; local only when false
    pub all: bool,
}

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Most recent commits to skip
    pub skip: Option<usize>,
    /// Maximum number of commits
    pub tail: usize,
    /// Only merge commits
    pub merges: bool,
    /// Exclude merge commits
    pub no_merges: bool,
    /// Full 40-character hashes instead of abbreviations
    pub full_hashes: bool,
    /// Also request the subject line, populating [`Commit::comment`]
    pub subjects: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            skip: None,
            tail: DEFAULT_LOG_TAIL,
            merges: false,
            no_merges: false,
            full_hashes: false,
            subjects: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// Remove untracked directories (but not untracked submodules)
    pub directories: bool,
    /// Remove gitignored files as well
    pub gitignored: bool,
    /// Remove untracked submodules
    pub submodules: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutOptions {
    pub force: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubmoduleOptions {
    pub recursive: bool,
}

/// A git working directory driven through the git binary
///
/// Bound to one directory for its lifetime and holds no cached state. Each
/// call builds a `git` argument vector, runs it through the configured
/// [`Shell`] and parses the output into [`Branch`], [`Tag`], [`Commit`] or
/// [`Diff`] values. Those values borrow the repository so operations such as
/// delete can issue further commands.
pub struct Repository {
    repo_dir: PathBuf,
    shell: Arc<dyn Shell>,
    settings: Settings,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("repo_dir", &self.repo_dir)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open a repository directory with the default shell and settings
    pub fn new<P: AsRef<Path>>(repo_dir: P) -> GitResult<Self> {
        Self::open(repo_dir, RepositoryOptions::default())
    }

    /// Open a repository directory
    ///
    /// The directory must exist; it is made absolute but symlinks are kept.
    pub fn open<P: AsRef<Path>>(repo_dir: P, options: RepositoryOptions) -> GitResult<Self> {
        let repo_dir = repo_dir.as_ref();
        if !repo_dir.is_dir() {
            return Err(GitError::InvalidRepoDir(repo_dir.to_path_buf()));
        }
        options.settings.validate()?;

        Ok(Self {
            repo_dir: std::path::absolute(repo_dir)?,
            shell: options.shell.unwrap_or_else(|| Arc::new(DefaultShell::new())),
            settings: options.settings,
        })
    }

    /// Detect git repository from current working directory
    pub fn discover() -> GitResult<Self> {
        let current_dir = env::current_dir()?;
        Self::discover_from(current_dir)
    }

    /// Detect git repository starting from a specific directory
    pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<Self> {
        let mut current = std::path::absolute(start_path.as_ref())?;

        loop {
            if current.join(".git").exists() {
                return Self::new(current);
            }

            // Move up to parent directory
            if !current.pop() {
                return Err(GitError::NotARepository);
            }
        }
    }

    /// Clone `repo_url` into `destination` and open the result
    ///
    /// Fails if `destination` already holds a repository, or if no `.git`
    /// directory appears after git reports success.
    pub fn clone_to<P: AsRef<Path>>(
        repo_url: &str,
        destination: P,
        options: RepositoryOptions,
    ) -> GitResult<Self> {
        let destination = std::path::absolute(destination.as_ref())?;
        let expected_git_dir = destination.join(".git");
        if expected_git_dir.is_dir() {
            return Err(GitError::AlreadyARepository(destination));
        }

        let repo = Self::open(env::current_dir()?, options)?;
        repo.vet_output([
            "clone".to_string(),
            "--".to_string(),
            repo_url.to_string(),
            destination.to_string_lossy().into_owned(),
        ])?;

        if !expected_git_dir.is_dir() {
            return Err(GitError::CloneFailed {
                url: repo_url.to_string(),
                destination,
            });
        }

        Ok(Self {
            repo_dir: destination,
            ..repo
        })
    }

    /// Get the repository path
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Shell used to run git
    pub fn shell(&self) -> &dyn Shell {
        self.shell.as_ref()
    }

    /// Settings the repository was opened with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Version of the git binary this repository runs
    pub fn git_version(&self) -> GitResult<GitVersion> {
        GitVersion::detect_with(self.shell.as_ref(), &self.exec_options(true))
    }

    /// Fetch with the given arguments
    pub fn fetch(&self, args: &[&str]) -> GitResult<()> {
        self.vet_output(std::iter::once("fetch").chain(args.iter().copied()))
    }

    /// Fetch all remotes, then fetch tags separately
    ///
    /// `--all` alone does not guarantee every tag arrives.
    pub fn fetch_all(&self, options: FetchOptions) -> GitResult<()> {
        let mut args = vec!["--all"];
        if options.prune {
            args.push("--prune");
        }
        self.fetch(&args)?;
        self.fetch(&["--tags"])
    }

    /// A branch value for `branch_name`, which need not exist yet
    pub fn branch_for(&self, branch_name: &str) -> GitResult<Branch<'_>> {
        Ok(Branch::parse(self, branch_name)?)
    }

    /// Known branches, local only unless `options.all`
    pub fn branches(&self, options: BranchOptions) -> GitResult<BranchCollection<'_>> {
        let branches = BranchCollection::load(self)?;
        if options.all {
            Ok(branches)
        } else {
            Ok(branches.local())
        }
    }

    /// A tag value for `tag_name`
    pub fn tag_for(&self, tag_name: &str) -> GitResult<Tag<'_>> {
        Ok(Tag::new(self, tag_name)?)
    }

    /// Known (fetched) tags
    pub fn tags(&self) -> GitResult<Vec<Tag<'_>>> {
        let output = self.git_output(["tag"])?;
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| Tag::new(self, line).map_err(GitError::from))
            .collect()
    }

    /// Log settings from [`Settings`] as a starting point for [`Repository::log`]
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            tail: self.settings.log.tail,
            full_hashes: self.settings.log.full_hashes,
            ..Default::default()
        }
    }

    /// Commits reachable from `revision` (HEAD when `None`), newest first
    pub fn log(&self, revision: Option<&str>, options: &LogOptions) -> GitResult<Vec<Commit<'_>>> {
        let format = Commit::log_format(options.full_hashes, options.subjects);
        let mut args = vec![
            "log".to_string(),
            format!("-n{}", options.tail),
            format!("--format={}", format),
        ];
        if let Some(skip) = options.skip {
            args.push(format!("--skip={}", skip));
        }
        if options.merges {
            args.push("--merges".to_string());
        }
        if options.no_merges {
            args.push("--no-merges".to_string());
        }
        if let Some(revision) = revision {
            args.push(revision.to_string());
        }

        let output = self.git_output(args)?;
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                let commit = if options.subjects {
                    Commit::parse_with_subject(self, line)
                } else {
                    Commit::parse(self, line)
                };
                commit.map_err(GitError::from)
            })
            .collect()
    }

    /// A lazily evaluated diff for `refs` (one revision or a range)
    pub fn diff(&self, refs: &str) -> Diff<'_> {
        Diff::new(self, refs)
    }

    /// Remove untracked files, passing `args` to `git clean`
    pub fn clean(&self, args: &[&str]) -> GitResult<()> {
        self.spit_output(std::iter::once("clean").chain(args.iter().copied()))
    }

    /// Force-clean untracked files, optionally directories, ignored files
    /// and untracked submodules
    pub fn clean_all(&self, options: CleanOptions) -> GitResult<()> {
        // Without -f git clean only lists; a second -f removes submodules.
        let mut args = vec!["-f"];
        if options.submodules {
            args.push("-f");
        }
        if options.directories {
            args.push("-d");
        }
        if options.gitignored {
            args.push("-x");
        }
        self.clean(&args)
    }

    /// Check out `revision`, discarding local changes when `options.force`
    pub fn checkout_to(&self, revision: &str, options: CheckoutOptions) -> GitResult<()> {
        let mut args = vec!["checkout", revision];
        if options.force {
            args.push("--force");
        }
        self.vet_output(args)
    }

    /// Hard reset to `revision`, or to HEAD when `None`
    pub fn hard_reset_to(&self, revision: Option<&str>) -> GitResult<()> {
        let mut args = vec!["reset", "--hard"];
        args.extend(revision);
        self.vet_output(args)
    }

    /// Paths of the submodules in the workspace
    pub fn submodule_paths(&self, options: SubmoduleOptions) -> GitResult<Vec<String>> {
        let mut args = vec!["submodule", "status"];
        if options.recursive {
            args.push("--recursive");
        }

        let output = self.git_output(args)?;
        output
            .lines()
            .map(|line| {
                SUBMODULE_STATUS_LINE
                    .captures(line)
                    .map(|caps| caps[3].to_string())
                    .ok_or_else(|| GitError::UnexpectedOutput {
                        command: "submodule status".to_string(),
                        output: line.to_string(),
                    })
            })
            .collect()
    }

    /// Initialise and update submodules, streaming git output
    pub fn update_submodules(&self, options: SubmoduleOptions) -> GitResult<()> {
        let mut args = vec!["submodule", "update", "--init"];
        if options.recursive {
            args.push("--recursive");
        }
        self.spit_output(args)
    }

    /// Full SHA of `revision`, or of HEAD when `None`
    pub fn sha_for(&self, revision: Option<&str>) -> GitResult<String> {
        // 'git show-ref' is easier to parse but matches both a local and a
        // remote branch for a bare name; 'git show' matches at most one.
        let mut args = vec!["show"];
        args.extend(revision);

        let output = self.git_output(args)?;
        output
            .lines()
            .find_map(|line| {
                COMMIT_SHA1_LINE
                    .captures(line.trim())
                    .map(|caps| caps[1].to_string())
            })
            .ok_or_else(|| GitError::Parse("Unable to locate commit in show output".to_string()))
    }

    /// Run git and return its combined output; fails on non-zero exit
    pub fn git_output<I, S>(&self, args: I) -> GitResult<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cmd = CommandLine::git(args);
        Ok(self.shell.output_for(&cmd, &self.exec_options(true))?)
    }

    /// Run git and return its combined output whatever the exit status
    pub(crate) fn git_output_unchecked<I, S>(&self, args: I) -> GitResult<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cmd = CommandLine::git(args);
        Ok(self.shell.output_for(&cmd, &self.exec_options(false))?)
    }

    /// Run git with its output streamed to stdout; fails on non-zero exit
    pub fn spit_output<I, S>(&self, args: I) -> GitResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cmd = CommandLine::git(args);
        self.shell.execute(&cmd, &self.exec_options(true))?;
        Ok(())
    }

    /// Run git and check its output for error markers
    ///
    /// Some platforms (msysgit) exit zero when checkout, reset or fetch fail,
    /// so the output is scanned as well. See [`Repository::vet`].
    pub fn vet_output<I, S>(&self, args: I) -> GitResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let output = self.git_output(args)?;
        let output = output.trim();
        if !output.is_empty() {
            info!("{}", output);
        }
        Self::vet(output)
    }

    /// Fail when any line of the output begins with `error:` or `fatal:`,
    /// ignoring case and leading whitespace
    ///
    /// git often prints progress or `From ...` lines before the error, so
    /// every line is checked, not just the first.
    pub fn vet(output: &str) -> GitResult<()> {
        let marked = output.lines().map(str::trim_start).find(|line| {
            let lowered = line.to_lowercase();
            lowered.starts_with("error:") || lowered.starts_with("fatal:")
        });

        if let Some(line) = marked {
            return Err(GitError::CommandFailed(format!(
                "Git exited zero but an error was detected in output: {}",
                line.trim_end()
            )));
        }
        Ok(())
    }

    fn exec_options(&self, raise_on_failure: bool) -> ExecOptions {
        let clear_env_vars = CLEAR_GIT_ENV_VARS
            .iter()
            .map(|name| name.to_string())
            .chain(self.settings.shell.clear_env_vars.iter().cloned())
            .collect();

        ExecOptions {
            directory: Some(self.repo_dir.clone()),
            set_env_vars: Vec::new(),
            clear_env_vars,
            raise_on_failure,
            timeout: self.settings.shell.timeout(),
        }
    }
}
