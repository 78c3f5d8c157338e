//! Shared test utilities: fake provider CLIs backed by shell scripts

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use futures::StreamExt;
use tempfile::TempDir;

use chorus::StreamChunk;
use chorus::config::Config;
use chorus::provider::ChunkStream;

/// A fake CLI living in its own temp directory
pub struct FakeCli {
    pub dir: TempDir,
    pub binary: PathBuf,
}

impl FakeCli {
    /// Arguments the last run received, one per line
    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("args.txt"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// What the last run read from stdin
    pub fn recorded_stdin(&self) -> String {
        fs::read_to_string(self.dir.path().join("stdin.txt")).unwrap_or_default()
    }

    /// Config pointing `provider_key` at this fake binary
    pub fn config(&self, provider_key: &str) -> Config {
        self.config_with(provider_key, "")
    }

    /// Like [`config`](Self::config) with extra TOML appended to `[settings]`
    pub fn config_with(&self, provider_key: &str, settings: &str) -> Config {
        let toml = format!(
            "[settings]\n{}\n[provider.{}]\nbinary = \"{}\"\n",
            settings,
            provider_key,
            self.binary.display()
        );
        let config: Config = toml::from_str(&toml).expect("valid test config");
        config.with_workspace_root(self.dir.path())
    }
}

/// Create an executable `#!/bin/sh` script running `body`.
///
/// The script records its arguments to `args.txt` and its stdin to
/// `stdin.txt` in the temp directory before running `body`; `$DIR` points at
/// that directory.
pub fn fake_cli(name: &str, body: &str) -> FakeCli {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let binary = dir.path().join(name);
    let script = format!(
        "#!/bin/sh\nDIR='{}'\nprintf '%s\\n' \"$@\" > \"$DIR/args.txt\"\ncat > \"$DIR/stdin.txt\"\n{}\n",
        dir.path().display(),
        body
    );
    fs::write(&binary, script).expect("Failed to write fake CLI");
    fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake CLI executable");
    FakeCli { dir, binary }
}

/// A fake CLI that prints `lines` to stdout and exits with `code`
pub fn fake_cli_emitting(name: &str, lines: &[&str], code: i32) -> FakeCli {
    let cli = fake_cli(name, &format!("cat \"$DIR/out.jsonl\"\nexit {}", code));
    let mut out = lines.join("\n");
    out.push('\n');
    fs::write(cli.dir.path().join("out.jsonl"), out).expect("Failed to write canned output");
    cli
}

/// Drain a chunk stream
pub async fn collect(stream: ChunkStream) -> Vec<StreamChunk> {
    stream.collect().await
}

/// Concatenated text chunks
pub fn text_of(chunks: &[StreamChunk]) -> String {
    chunks
        .iter()
        .filter_map(|c| match c {
            StreamChunk::Text { content } => Some(content.as_str()),
            _ => None,
        })
        .collect()
}

/// Whether a process with this pid still exists
pub fn process_alive(pid: u32) -> bool {
    // an unreaped zombie has already stopped running
    if let Ok(stat) = fs::read_to_string(format!("/proc/{}/stat", pid)) {
        let state = stat.rsplit(')').next().and_then(|rest| rest.split_whitespace().next());
        return state != Some("Z");
    }
    // signal 0 only checks for existence
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

/// Shell body printing `count` plain lines, then sleeping
pub fn chatty_then_idle(count: usize) -> String {
    format!(
        "i=0\nwhile [ $i -lt {} ]; do echo \"line $i\"; i=$((i+1)); done\nexec sleep 30",
        count
    )
}
