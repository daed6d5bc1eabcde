use predicates::prelude::*;

mod common;

#[test]
fn test_list_empty() {
    let mut ctx = common::gwfleet();

    ctx.cmd
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No instances"));
}

#[test]
fn test_list_shows_instances() {
    let mut ctx = common::gwfleet();
    ctx.create("zeta");
    ctx.create("alpha");

    ctx.cmd
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("NAME"))
        .stdout(predicate::str::contains("GATEWAY"))
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("18789"))
        // Runtime is unreachable in tests
        .stdout(predicate::str::contains("unknown"));
}

#[test]
fn test_list_quiet_sorted() {
    let mut ctx = common::gwfleet();
    ctx.create("zeta");
    ctx.create("alpha");

    ctx.cmd
        .args(["ls", "-q"])
        .assert()
        .success()
        .stdout(predicate::eq("alpha\nzeta\n"));
}

#[test]
fn test_list_corrupt_registry_fails() {
    let mut ctx = common::gwfleet();
    std::fs::create_dir_all(&ctx.home).unwrap();
    std::fs::write(ctx.home.join("registry.json"), "{ broken").unwrap();

    ctx.cmd
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));
}

#[test]
fn test_debug_flag_logs_to_stderr() {
    let mut ctx = common::gwfleet();

    ctx.cmd
        .args(["--debug", "list", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Running command"));
}
