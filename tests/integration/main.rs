//! Integration tests for repoweave

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REPOS: &str = r#"
[[repositories]]
name = "alpha"
traits = ["node"]

[repositories.hooks]
preClone = "prepare.sh"

[[repositories]]
name = "beta"
traits = ["node"]
"#;

/// A project root with two repositories and one trait
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("repos.toml"), REPOS).unwrap();
        fs::create_dir_all(root.join("traits/node")).unwrap();
        fs::write(root.join("traits/node/preClone.sh"), "echo pre").unwrap();
        fs::write(root.join("traits/node/postClone.sh"), "npm ci").unwrap();
        fs::create_dir_all(root.join("custom/alpha")).unwrap();
        fs::write(root.join("custom/alpha/prepare.sh"), "echo prepare").unwrap();

        for name in ["alpha", "beta"] {
            let repo = root.join("repos").join(name);
            fs::create_dir_all(&repo).unwrap();
            fs::write(repo.join("README.md"), format!("# {}", name)).unwrap();
            fs::write(repo.join("package.json"), r#"{"version":"1.0.0"}"#).unwrap();
        }
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn lock_path(&self) -> PathBuf {
        self.root().join("repoweave.lock")
    }

    fn repo_dir(&self, name: &str) -> PathBuf {
        self.root().join("repos").join(name)
    }
}

mod cli_tests {
    use super::*;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn repoweave(project: &Project) -> Command {
        let mut cmd = cargo_bin_cmd!("repoweave");
        cmd.current_dir(project.root())
            .env("XDG_CONFIG_HOME", project.root().join(".xdg"))
            .env("HOME", project.root())
            .env_remove("REPOWEAVE_CONFIG")
            .env_remove("REPOWEAVE_ROOT");
        cmd
    }

    fn plan_plain(project: &Project, repos: &[&str]) -> String {
        let output = repoweave(project)
            .args(["plan", "--format", "plain"])
            .args(repos)
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    }

    #[test]
    fn help_displays() {
        let project = Project::new();
        repoweave(&project)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cached setup phases"));
    }

    #[test]
    fn version_displays() {
        let project = Project::new();
        repoweave(&project)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("repoweave"));
    }

    #[test]
    fn config_path() {
        let project = Project::new();
        repoweave(&project)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("repoweave.toml"));
    }

    #[test]
    fn config_show() {
        let project = Project::new();
        repoweave(&project)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn config_init_scaffolds_project() {
        let dir = TempDir::new().unwrap();
        let project = Project { dir };

        repoweave(&project).args(["config", "init"]).assert().success();

        assert!(project.root().join("repoweave.toml").exists());
        assert!(project.root().join("repos.toml").exists());
        repoweave(&project)
            .args(["plan", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn missing_repository_list_fails_with_hint() {
        let project = Project::new();
        fs::remove_file(project.root().join("repos.toml")).unwrap();

        repoweave(&project)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"))
            .stderr(predicate::str::contains("repoweave config init"));
    }

    #[test]
    fn fresh_project_runs_everything() {
        let project = Project::new();
        let plan = plan_plain(&project, &[]);

        assert!(plan.contains("alpha\tpreClone\trun\tno previous record"));
        assert!(plan.contains("beta\tpostClone\trun\tno previous record"));
        assert!(!project.lock_path().exists());
    }

    #[test]
    fn recorded_phase_is_skipped() {
        let project = Project::new();
        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Recorded alpha preClone as succeeded"));

        let plan = plan_plain(&project, &["alpha"]);
        assert!(plan.contains("alpha\tpreClone\tskip"));
        assert!(plan.contains("alpha\tpostClone\trun\tnever succeeded"));
        assert!(!plan.contains("beta"));
    }

    #[test]
    fn failed_phase_runs_again() {
        let project = Project::new();
        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success();
        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone", "--failed"])
            .assert()
            .success();

        let plan = plan_plain(&project, &["alpha"]);
        assert!(plan.contains("alpha\tpreClone\trun\tprevious run failed"));
    }

    #[test]
    fn changed_manifest_reported() {
        let project = Project::new();
        repoweave(&project)
            .args(["record", "beta", "--phase", "post-clone"])
            .assert()
            .success();
        assert!(plan_plain(&project, &["beta"]).contains("beta\tpostClone\tskip"));

        fs::write(
            project.repo_dir("beta").join("package.json"),
            r#"{"version":"2.0.0"}"#,
        )
        .unwrap();

        let plan = plan_plain(&project, &["beta"]);
        assert!(plan.contains("beta\tpostClone\trun\tdependency files changed"));
    }

    #[test]
    fn force_flags_override_cache() {
        let project = Project::new();
        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success();

        let output = repoweave(&project)
            .args(["--force-pre-clone", "plan", "alpha", "--format", "plain"])
            .output()
            .unwrap();
        let plan = String::from_utf8(output.stdout).unwrap();
        assert!(plan.contains("alpha\tpreClone\trun\tpreClone forced"));

        let output = repoweave(&project)
            .args(["--no-cache", "--force", "plan", "alpha", "--format", "plain"])
            .output()
            .unwrap();
        let plan = String::from_utf8(output.stdout).unwrap();
        assert!(plan.contains("alpha\tpreClone\trun\tcache disabled"));
    }

    #[test]
    fn plan_json_output() {
        let project = Project::new();
        let output = repoweave(&project)
            .args(["plan", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let repos = value["repositories"].as_array().unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0]["name"], "alpha");
        assert_eq!(repos[0]["preClone"]["action"], "run");
        assert_eq!(repos[0]["preClone"]["reason"], "noRecord");
    }

    #[test]
    fn plan_unknown_repository_fails() {
        let project = Project::new();
        repoweave(&project)
            .args(["plan", "gamma"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Repository not found"));
    }

    #[test]
    fn record_unknown_repository_fails() {
        let project = Project::new();
        repoweave(&project)
            .args(["record", "gamma", "--phase", "post-clone"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("gamma"));
    }

    #[test]
    fn dry_run_record_writes_nothing() {
        let project = Project::new();
        repoweave(&project)
            .args(["--dry-run", "record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Dry run"));

        assert!(!project.lock_path().exists());
    }

    #[test]
    fn lock_file_flag_redirects_state() {
        let project = Project::new();
        repoweave(&project)
            .args(["--lock-file", "state/alt.lock", "record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success();

        assert!(project.root().join("state/alt.lock").exists());
        assert!(!project.lock_path().exists());
    }

    #[test]
    fn verify_fresh_and_recorded() {
        let project = Project::new();
        repoweave(&project)
            .arg("verify")
            .assert()
            .success()
            .stdout(predicate::str::contains("No lock file yet"));

        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success();
        repoweave(&project)
            .arg("verify")
            .assert()
            .success()
            .stdout(predicate::str::contains("Lock file is valid"));
    }

    #[test]
    fn verify_corrupt_lock_fails() {
        let project = Project::new();
        fs::write(project.lock_path(), "{ not json").unwrap();

        repoweave(&project)
            .arg("verify")
            .assert()
            .failure()
            .stdout(predicate::str::contains("Lock file is unusable"))
            .stderr(predicate::str::contains("Lock file is invalid"));
    }

    #[test]
    fn corrupt_lock_still_plans() {
        let project = Project::new();
        fs::write(project.lock_path(), "[]").unwrap();

        let plan = plan_plain(&project, &["alpha"]);
        assert!(plan.contains("alpha\tpreClone\trun\tno previous record"));
    }

    #[test]
    fn status_shows_decisions() {
        let project = Project::new();
        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success();

        repoweave(&project)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache decisions"))
            .stdout(predicate::str::contains("alpha"))
            .stdout(predicate::str::contains("Format version: 1.0"));
    }

    #[test]
    fn clear_single_repository() {
        let project = Project::new();
        for repo in ["alpha", "beta"] {
            repoweave(&project)
                .args(["record", repo, "--phase", "pre-clone"])
                .assert()
                .success();
        }

        repoweave(&project)
            .args(["clear", "alpha"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared cached state for alpha"));

        let plan = plan_plain(&project, &[]);
        assert!(plan.contains("alpha\tpreClone\trun\tno previous record"));
        assert!(plan.contains("beta\tpreClone\tskip"));
    }

    #[test]
    fn clear_orphaned_records() {
        let project = Project::new();
        repoweave(&project)
            .args(["record", "beta", "--phase", "pre-clone"])
            .assert()
            .success();
        fs::write(
            project.root().join("repos.toml"),
            "[[repositories]]\nname = \"alpha\"\n",
        )
        .unwrap();

        repoweave(&project)
            .arg("verify")
            .assert()
            .success()
            .stdout(predicate::str::contains("orphaned record 'beta'"));

        repoweave(&project)
            .args(["clear", "--orphaned"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 1 orphaned record(s)"));

        let lock = fs::read_to_string(project.lock_path()).unwrap();
        assert!(!lock.contains("\"beta\""));
    }

    #[test]
    fn clear_lock_declined_without_terminal() {
        let project = Project::new();
        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success();

        repoweave(&project)
            .arg("clear")
            .write_stdin("n\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Aborted."));
        assert!(project.lock_path().exists());

        repoweave(&project)
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Lock file removed"));
        assert!(!project.lock_path().exists());
    }

    #[test]
    fn config_edit_reruns_repositories_recorded_later() {
        let project = Project::new();
        for repo in ["alpha", "beta"] {
            repoweave(&project)
                .args(["record", repo, "--phase", "pre-clone"])
                .assert()
                .success();
        }

        let edited = format!("{}\n# reviewed\n", REPOS);
        fs::write(project.root().join("repos.toml"), edited).unwrap();
        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success();

        let plan = plan_plain(&project, &[]);
        assert!(plan.contains("alpha\tpreClone\tskip"));
        assert!(plan.contains("beta\tpreClone\trun\tconfiguration changed"));
    }

    #[test]
    fn custom_script_edit_survives_pre_clone_record() {
        let project = Project::new();
        let repos = REPOS.replace(
            "preClone = \"prepare.sh\"",
            "preClone = \"prepare.sh\"\npostClone = \"finish.sh\"",
        );
        fs::write(project.root().join("repos.toml"), repos).unwrap();
        fs::write(project.root().join("custom/alpha/finish.sh"), "echo finish").unwrap();
        for phase in ["pre-clone", "post-clone"] {
            repoweave(&project)
                .args(["record", "alpha", "--phase", phase])
                .assert()
                .success();
        }

        fs::write(project.root().join("custom/alpha/finish.sh"), "echo again").unwrap();
        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success();

        let plan = plan_plain(&project, &["alpha"]);
        assert!(plan.contains("alpha\tpreClone\tskip"));
        assert!(plan.contains("alpha\tpostClone\trun\tcustom script changed"));
    }

    #[test]
    fn clear_lock_flag_resets_before_planning() {
        let project = Project::new();
        repoweave(&project)
            .args(["record", "alpha", "--phase", "pre-clone"])
            .assert()
            .success();

        let output = repoweave(&project)
            .args(["--clear-lock", "plan", "alpha", "--format", "plain"])
            .output()
            .unwrap();
        let plan = String::from_utf8(output.stdout).unwrap();
        assert!(plan.contains("alpha\tpreClone\trun\tno previous record"));
        assert!(!project.lock_path().exists());
    }
}

mod engine_tests {
    use super::*;
    use repoweave::cache::{CacheManager, CacheOptions, Decision, RunReason};
    use repoweave::checksum::ExclusionSet;
    use repoweave::config::{Config, RepositoryDef, RepositoryList};
    use repoweave::lock::{LoadOutcome, LockStore, PhaseStatus, TraitLayout};
    use repoweave::phase::Phase;

    fn open(project: &Project, options: CacheOptions) -> (CacheManager, LoadOutcome) {
        let paths = Config::default().project_paths(project.root());
        let (store, outcome) = LockStore::open(
            &paths.lock_file,
            &paths.repos_file,
            TraitLayout::new(&paths.traits_dir, "sh", "config.toml"),
        );
        let manager = CacheManager::new(store, options, ExclusionSet::defaults(), &paths);
        (manager, outcome)
    }

    fn repositories(project: &Project) -> Vec<RepositoryDef> {
        let content = fs::read_to_string(project.root().join("repos.toml")).unwrap();
        RepositoryList::parse(&content, Path::new("repos.toml"))
            .unwrap()
            .repositories
    }

    fn find<'a>(repos: &'a [RepositoryDef], name: &str) -> &'a RepositoryDef {
        repos.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn alpha_pre_clone_lifecycle() {
        let project = Project::new();
        let repos = repositories(&project);
        let alpha = find(&repos, "alpha");

        let (mut manager, outcome) = open(&project, CacheOptions::default());
        assert_eq!(outcome, LoadOutcome::Initialized);
        assert!(!manager.can_skip_pre_clone(alpha));

        manager.update_after_success(alpha, Phase::PreClone, true);
        manager.save().unwrap();

        let (manager, outcome) = open(&project, CacheOptions::default());
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert!(manager.can_skip_pre_clone(alpha));

        let record = manager.store().repository("alpha").unwrap();
        assert_eq!(record.status(Phase::PreClone), Some(PhaseStatus::Success));
        assert!(record.custom_scripts.contains_key(&Phase::PreClone));
        assert!(manager
            .store()
            .global_checksums()
            .trait_script_hashes
            .contains_key("node/preClone.sh"));
    }

    #[test]
    fn beta_dependency_change() {
        let project = Project::new();
        let repos = repositories(&project);
        let beta = find(&repos, "beta");

        let (mut manager, _) = open(&project, CacheOptions::default());
        manager.update_after_success(beta, Phase::PostClone, true);
        manager.save().unwrap();

        fs::write(
            project.repo_dir("beta").join("package.json"),
            r#"{"version":"1.1.0"}"#,
        )
        .unwrap();

        let (manager, _) = open(&project, CacheOptions::default());
        assert!(!manager.can_skip_post_clone(beta));
        assert_eq!(
            manager.evaluate(beta, Phase::PostClone).reason().unwrap().to_string(),
            "dependency files changed"
        );
    }

    #[test]
    fn force_precedence() {
        let project = Project::new();
        let repos = repositories(&project);
        let alpha = find(&repos, "alpha");

        let options = CacheOptions {
            no_cache: true,
            force_all: true,
            force_pre_clone: true,
            ..Default::default()
        };
        let (manager, _) = open(&project, options);
        assert_eq!(
            manager.evaluate(alpha, Phase::PreClone),
            Decision::Run(RunReason::CacheDisabled)
        );

        let options = CacheOptions {
            force_all: true,
            force_pre_clone: true,
            ..Default::default()
        };
        let (manager, _) = open(&project, options);
        assert_eq!(
            manager.evaluate(alpha, Phase::PreClone),
            Decision::Run(RunReason::ForceAll)
        );
    }

    #[test]
    fn failure_forces_rerun_after_restart() {
        let project = Project::new();
        let repos = repositories(&project);
        let alpha = find(&repos, "alpha");

        let (mut manager, _) = open(&project, CacheOptions::default());
        manager.update_after_success(alpha, Phase::PostClone, true);
        manager.update_after_failure(alpha, Phase::PostClone);
        manager.save().unwrap();

        let (manager, _) = open(&project, CacheOptions::default());
        assert_eq!(
            manager.evaluate(alpha, Phase::PostClone),
            Decision::Run(RunReason::PreviousFailed)
        );
    }

    #[test]
    fn unchanged_project_converges_to_skip() {
        let project = Project::new();
        let repos = repositories(&project);

        let (mut manager, _) = open(&project, CacheOptions::default());
        for repo in &repos {
            for phase in Phase::all() {
                manager.update_after_success(repo, *phase, true);
            }
        }
        manager.save().unwrap();

        let (manager, _) = open(&project, CacheOptions::default());
        for repo in &repos {
            assert!(manager.can_skip_pre_clone(repo), "{} preClone", repo.name);
            assert!(manager.can_skip_post_clone(repo), "{} postClone", repo.name);
        }
    }

    #[test]
    fn config_change_reaches_every_repository() {
        let project = Project::new();
        let repos = repositories(&project);

        let (mut manager, _) = open(&project, CacheOptions::default());
        for repo in &repos {
            manager.update_after_success(repo, Phase::PreClone, true);
        }
        manager.save().unwrap();

        let edited = format!("{}\n# reviewed\n", REPOS);
        fs::write(project.root().join("repos.toml"), edited).unwrap();

        let (mut manager, _) = open(&project, CacheOptions::default());
        let alpha = find(&repos, "alpha");
        let beta = find(&repos, "beta");
        assert!(!manager.can_skip_pre_clone(alpha));
        manager.update_after_success(alpha, Phase::PreClone, true);

        assert!(manager.can_skip_pre_clone(alpha));
        assert_eq!(
            manager.evaluate(beta, Phase::PreClone),
            Decision::Run(RunReason::ConfigChanged)
        );
    }

    #[test]
    fn clear_then_load_is_empty() {
        let project = Project::new();
        let repos = repositories(&project);

        let (mut manager, _) = open(&project, CacheOptions::default());
        manager.update_after_success(find(&repos, "alpha"), Phase::PreClone, true);
        manager.save().unwrap();

        let mut store = manager.into_store();
        assert!(store.clear_lock_file().unwrap());
        assert_eq!(store.load(), LoadOutcome::Initialized);
        assert!(store.document().repositories.is_empty());
        assert!(store.validate_integrity().valid);
    }
}
