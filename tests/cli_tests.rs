use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn typegraph_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("typegraph"))
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// =============================================================================
// Basic CLI
// =============================================================================

#[test]
fn test_help() {
    typegraph_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("type graphs"));
}

#[test]
fn test_version() {
    typegraph_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("typegraph"));
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();

    typegraph_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    let content = std::fs::read_to_string(temp_dir.path().join(".typegraph.yml")).unwrap();
    assert!(content.contains("schema_ttl_secs: 3600"));
    assert!(content.contains("reserved_prefix"));
}

#[test]
fn test_init_twice_fails_without_force() {
    let temp_dir = TempDir::new().unwrap();

    typegraph_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success();

    typegraph_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));

    typegraph_cmd()
        .args(["init", "--force"])
        .current_dir(temp_dir.path())
        .assert()
        .success();
}

// =============================================================================
// Schema
// =============================================================================

#[test]
fn test_schema_prints_sdl() {
    let temp_dir = TempDir::new().unwrap();

    typegraph_cmd()
        .arg("schema")
        .arg(fixture("models.yml"))
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("type User implements Node"))
        .stdout(predicate::str::contains("enum UserStatusEnum"))
        .stdout(predicate::str::contains("type UserAddress"))
        .stdout(predicate::str::contains("type UserPostsConnection"))
        .stdout(predicate::str::contains("input PostCommentsInput"))
        .stdout(predicate::str::contains("author: User!"))
        .stdout(predicate::str::contains("password").not())
        .stdout(predicate::str::contains("__v").not());
}

#[test]
fn test_schema_with_explicit_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("custom.yml");
    std::fs::write(&config, "cache:\n  enabled: false\n").unwrap();

    typegraph_cmd()
        .arg("schema")
        .arg(fixture("models.yml"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("postMany"));
}

#[test]
fn test_schema_dangling_reference_fails() {
    let temp_dir = TempDir::new().unwrap();
    let models = temp_dir.path().join("models.yml");
    std::fs::write(
        &models,
        "models:\n  - key: posts\n    name: Post\n    fields:\n      - name: author\n        kind: reference\n        target: Ghost\n",
    )
    .unwrap();

    typegraph_cmd()
        .arg("schema")
        .arg(&models)
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown reference target `Ghost` at Post.author"));
}

#[test]
fn test_schema_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    typegraph_cmd()
        .args(["schema", "nope.yml"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load models"));
}

// =============================================================================
// Compile
// =============================================================================

#[test]
fn test_compile_filter_and_sort() {
    typegraph_cmd()
        .args([
            "compile",
            r#"{ userMany { friends(eq: "x", gt: "a", op: OR) a(sort: DESC, sortOrder: 2) b(sort: ASC, sortOrder: 1) } }"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""$or""#))
        .stdout(predicate::str::contains(r#""$eq": "x""#))
        .stdout(predicate::str::is_match(r#""b": 1,\s*"a": -1"#).unwrap());
}

#[test]
fn test_compile_with_variables_and_operation() {
    typegraph_cmd()
        .args([
            "compile",
            "query A { userMany { age(gte: $min) } } query B { postMany { likes(lt: $max) } }",
            "--operation",
            "B",
            "--variables",
            r#"{"max": 10}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("postMany"))
        .stdout(predicate::str::contains(r#""$lt": 10"#))
        .stdout(predicate::str::contains("userMany").not());
}

#[test]
fn test_compile_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let query = temp_dir.path().join("query.graphql");
    std::fs::write(&query, "{ userMany { age(gt: 5) } }").unwrap();

    typegraph_cmd()
        .arg("compile")
        .arg(&query)
        .arg("--file")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""$gt": 5"#));
}

#[test]
fn test_compile_unknown_fragment_fails() {
    typegraph_cmd()
        .args(["compile", "{ userMany { ...Missing } }"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported selection"));
}

#[test]
fn test_compile_invalid_variables_fails() {
    typegraph_cmd()
        .args(["compile", "{ userMany { a } }", "--variables", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Variables must be a JSON object"));
}
