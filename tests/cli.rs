use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::{tempdir, TempDir};

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A project at `<tmp>/proj`, so paths in the document start with `proj/`.
fn create_project() -> TempDir {
    let dir = tempdir().unwrap();
    let proj = dir.path().join("proj");

    write_file(
        &proj.join("main.go"),
        "package main\n\n// Run starts the app.\nfunc Run(port int) error {\n\treturn nil\n}\n",
    );
    write_file(&proj.join("README.md"), "# proj\n");
    write_file(&proj.join("vendor/lib.go"), "package lib\n");
    write_file(&proj.join(".env"), "SECRET=1\n");

    dir
}

fn sourcepack(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sourcepack"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn cli_text_to_stdout() {
    let dir = create_project();

    let output = sourcepack(&["proj", "--stdout", "--no-color"], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("## Generated with sourcepack at: "));
    assert!(stdout.contains(
        "## File Tree\n\nproj/\n├── vendor/\n│   └── lib.go\n├── main.go\n└── README.md\n"
    ));
    assert!(stdout.contains("--- File: proj/README.md\n# proj\n\n"));
    assert!(!stdout.contains(".env"));
    assert!(!stdout.contains("SECRET"));
}

#[test]
fn cli_tree_with_sizes() {
    let dir = create_project();

    let output = sourcepack(&["proj", "--stdout", "--no-dump", "--sizes"], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("│   └── lib.go [12B]\n"));
    assert!(stdout.contains("└── README.md [7B]\n"));
}

#[test]
fn cli_json_with_outline() {
    let dir = create_project();

    let output = sourcepack(
        &["proj", "--stdout", "--format", "json", "--outline", "-f", "**/*.go"],
        dir.path(),
    );
    assert!(output.status.success());

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files: Vec<&str> = v["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();
    assert_eq!(files, vec!["proj/main.go", "proj/vendor/lib.go"]);

    let outlines = v["outlines"].as_array().unwrap();
    let main = outlines
        .iter()
        .find(|o| o["path"] == "proj/main.go")
        .unwrap();
    assert_eq!(main["symbols"][0]["type"], "function");
    assert_eq!(main["symbols"][0]["name"], "Run");
    assert_eq!(main["symbols"][0]["signature"], "func Run(port int) error");
    assert_eq!(main["symbols"][0]["documentation"], "Run starts the app.");
}

#[test]
fn cli_ignore_file_excludes() {
    let dir = create_project();
    write_file(&dir.path().join("pack.ignore"), "vendor/\n*.md\n");

    let output = sourcepack(
        &["proj", "--stdout", "--ignore-file", "pack.ignore"],
        dir.path(),
    );
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("--- File: proj/main.go\n"));
    assert!(!stdout.contains("lib.go"));
    assert!(!stdout.contains("README.md"));
}

#[test]
fn cli_gitignore_flag() {
    let dir = create_project();
    write_file(&dir.path().join("proj/.gitignore"), "vendor/\n");

    let output = sourcepack(&["proj", "--stdout", "--gitignore"], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("lib.go"));
    assert!(stdout.contains("main.go"));
}

#[test]
fn cli_writes_default_output_file() {
    let dir = create_project();

    let output = sourcepack(&["proj", "--no-color"], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.trim(),
        "Successfully generated output to: sourcepack.txt"
    );
    let written = fs::read_to_string(dir.path().join("sourcepack.txt")).unwrap();
    assert!(written.contains("--- File: proj/main.go\n"));
}

#[test]
fn cli_writes_named_output_file() {
    let dir = create_project();

    let output = sourcepack(
        &["proj", "--format", "json", "-o", "out/pack.json"],
        dir.path(),
    );
    assert!(output.status.success());

    let written = fs::read_to_string(dir.path().join("out/pack.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert!(v["tree"].as_str().unwrap().starts_with("proj/\n"));
}

#[test]
fn cli_empty_output_is_rejected() {
    let dir = create_project();

    let output = sourcepack(
        &["proj", "--stdout", "--no-tree", "--no-dump", "--no-color"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains(
        "error: An empty output is not allowed (no dump, no tree, and no outline)."
    ));
}

#[test]
fn cli_missing_directory() {
    let dir = tempdir().unwrap();

    let output = sourcepack(&["does-not-exist", "--stdout"], dir.path());
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn cli_missing_ignore_file() {
    let dir = create_project();

    let output = sourcepack(
        &["proj", "--stdout", "--ignore-file", "missing.ignore"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(4));
}
