use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::OnceLock;

use valscope_testkit::{fixture_path as shared_fixture_path, target_dir as workspace_target_dir};

static VALSCOPE_BIN: OnceLock<PathBuf> = OnceLock::new();

pub(crate) fn fixture() -> String {
	shared_fixture_path("containers.json").to_string_lossy().into_owned()
}

pub(crate) fn run_valscope(args: &[&str]) -> Output {
	Command::new(valscope_bin())
		.args(args)
		.env_remove("VALSCOPE_LOG")
		.output()
		.expect("valscope command executes")
}

pub(crate) fn run_valscope_json(args: &[&str]) -> serde_json::Value {
	let output = run_valscope(args);
	assert!(
		output.status.success(),
		"valscope command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

pub(crate) fn run_valscope_err(args: &[&str]) -> String {
	let output = run_valscope(args);
	assert!(!output.status.success(), "valscope command unexpectedly succeeded");
	String::from_utf8_lossy(&output.stderr).into_owned()
}

fn valscope_bin() -> &'static PathBuf {
	VALSCOPE_BIN.get_or_init(resolve_valscope_bin)
}

fn resolve_valscope_bin() -> PathBuf {
	if let Ok(path) = std::env::var("CARGO_BIN_EXE_valscope") {
		return PathBuf::from(path);
	}

	let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
	let target_dir = workspace_target_dir();

	let mut bin = target_dir.join("debug");
	bin.push(if cfg!(windows) { "valscope.exe" } else { "valscope" });

	let status = Command::new("cargo")
		.current_dir(&manifest_dir)
		.args(["build", "--quiet", "--bin", "valscope"])
		.status()
		.expect("cargo build executes");
	assert!(status.success(), "failed to build valscope binary at {}", bin.display());

	bin
}
