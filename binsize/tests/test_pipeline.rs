#![cfg(unix)]

use binsize::domain::AnalysisError;
use binsize::pipeline::{self, PipelineConfig};
use binsize::resolution::PoolConfig;
use binsize::symbols::SymbolSource;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Temp source tree laid out like `src/out/Release/lib/libtest.so`
struct Workspace {
    tmp: tempfile::TempDir,
    root: PathBuf,
    library: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap().join("src");
        fs::create_dir_all(root.join("out/Release/lib")).unwrap();
        fs::create_dir_all(root.join("base")).unwrap();
        fs::write(root.join("base/alpha.cc"), b"").unwrap();
        fs::write(root.join("base/beta.cc"), b"").unwrap();
        let library = root.join("out/Release/lib/libtest.so");
        fs::write(&library, b"").unwrap();
        Self { tmp, root, library }
    }

    fn file(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Resolves 00001000 to an absolute path, 00002000 to a bare file name,
    /// everything else to the unresolved sentinels
    fn stub_resolver(&self) -> PathBuf {
        let script = format!(
            "#!/bin/sh\n\
             while read addr; do\n\
               case \"$addr\" in\n\
                 00001000) echo alpha; echo \"{root}/out/Release/../../base/alpha.cc:10\";;\n\
                 00002000) echo beta; echo \"beta.cc:20\";;\n\
                 *) echo '??'; echo '??:0';;\n\
               esac\n\
             done\n",
            root = self.root.display()
        );
        let path = self.write("fake-addr2line", &script);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config(&self, nm_dump: &str) -> PipelineConfig {
        let mut pool = PoolConfig::new(self.stub_resolver(), &self.library);
        pool.poll_interval = Duration::from_millis(20);
        PipelineConfig {
            source: SymbolSource::File(self.write("nm.txt", nm_dump)),
            outfile: self.file("out.txt"),
            failfile: Some(self.file("fail.txt")),
            skipfile: Some(self.file("skip.txt")),
            pool,
            progress_interval: None,
            termination_timeout: Duration::from_secs(60),
        }
    }
}

fn sorted_lines(path: &Path) -> Vec<String> {
    let mut lines: Vec<String> =
        fs::read_to_string(path).unwrap().lines().map(String::from).collect();
    lines.sort();
    lines
}

const THREE_SYMBOLS: &str = "\
00001000 00000010 t alpha
00002000 00000020 T beta
00003000 00000030 d gamma
";

#[test]
fn test_end_to_end_two_of_three_resolved() {
    let ws = Workspace::new();
    let mut config = ws.config(THREE_SYMBOLS);
    config.pool.disambiguate = true;

    let summary = pipeline::run(&config).unwrap();

    assert_eq!(
        sorted_lines(&config.outfile),
        vec![
            "00001000 00000010 t alpha\tbase/alpha.cc:10",
            "00002000 00000020 T beta\tbase/beta.cc:20",
            "00003000 00000030 d gamma",
        ]
    );
    assert_eq!(sorted_lines(&ws.file("fail.txt")), vec!["00003000 00000030 d gamma"]);
    assert!(sorted_lines(&ws.file("skip.txt")).is_empty());

    assert_eq!(summary.lines, 3);
    assert_eq!(summary.queued, 3);
    assert_eq!(format!("{:.1}", summary.success_rate()), "66.7");
    assert_eq!(summary.resolution.disambiguated, 1);
    assert_eq!(summary.resolution.disambiguation_missed, 0);
}

#[test]
fn test_bare_names_kept_without_disambiguation() {
    let ws = Workspace::new();
    let config = ws.config(THREE_SYMBOLS);

    pipeline::run(&config).unwrap();

    let expected = "00002000 00000020 T beta\tbeta.cc:20".to_string();
    assert!(sorted_lines(&config.outfile).contains(&expected));
}

#[test]
fn test_skipped_lines_and_duplicates() {
    let ws = Workspace::new();
    let dump = "\
libtest.so:

00001000 00000010 t alpha
00001000 00000010 t alpha_alias
00002000 00000020 T beta
";
    let mut config = ws.config(dump);
    config.pool.workers = 3;

    let summary = pipeline::run(&config).unwrap();

    assert_eq!(sorted_lines(&config.outfile).len(), 2);
    assert_eq!(fs::read_to_string(ws.file("skip.txt")).unwrap(), "libtest.so:\n\n");
    assert!(sorted_lines(&ws.file("fail.txt")).is_empty());
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.queued, 3);
    assert_eq!(summary.resolution.deduped, 1);
    assert_eq!(summary.resolution.resolved, 2);
}

#[test]
fn test_duplicates_resolved_without_dedupe() {
    let ws = Workspace::new();
    let dump = "00001000 00000010 t alpha\n00001000 00000010 t alpha_alias\n";
    let mut config = ws.config(dump);
    config.pool.dedupe = false;

    let summary = pipeline::run(&config).unwrap();

    assert_eq!(sorted_lines(&config.outfile).len(), 2);
    assert_eq!(summary.resolution.deduped, 0);
    assert_eq!(summary.resolution.resolved, 2);
}

#[test]
fn test_stalled_resolver_is_fatal() {
    let ws = Workspace::new();
    let mut config = ws.config("00001000 00000010 t alpha\n");
    let hang = ws.write("hanging-addr2line", "#!/bin/sh\nwhile read addr; do sleep 5; done\n");
    fs::set_permissions(&hang, fs::Permissions::from_mode(0o755)).unwrap();
    config.pool.addr2line = hang;
    config.termination_timeout = Duration::from_millis(200);

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(err.downcast_ref::<AnalysisError>(), Some(AnalysisError::PoolStalled(_))));
}

#[test]
fn test_unlocatable_project_root_fails_before_nm() {
    // /tmp/<dir>/lib.so has no project root two levels above /tmp
    let tmp = tempfile::Builder::new().tempdir_in("/tmp").unwrap();
    let library = tmp.path().join("lib.so");
    fs::write(&library, b"").unwrap();
    let marker = tmp.path().join("nm-ran");
    let nm = tmp.path().join("fake-nm");
    fs::write(&nm, format!("#!/bin/sh\ntouch \"{}\"\n", marker.display())).unwrap();
    fs::set_permissions(&nm, fs::Permissions::from_mode(0o755)).unwrap();

    let config = PipelineConfig {
        source: SymbolSource::Nm { nm, library: library.clone() },
        outfile: tmp.path().join("out.txt"),
        failfile: None,
        skipfile: None,
        pool: PoolConfig::new("addr2line", &library),
        progress_interval: None,
        termination_timeout: Duration::from_secs(60),
    };

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnalysisError>(),
        Some(AnalysisError::ProjectRootNotFound(_))
    ));
    assert!(!marker.exists(), "nm must not run when the project root is missing");
    assert!(!config.outfile.exists());
}
