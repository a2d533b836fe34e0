use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gsd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gsd").unwrap();
    cmd.current_dir(dir.path()).env("GSD_CWD", dir.path());
    cmd
}

fn write(dir: &TempDir, rel: &str, content: &str) {
    let path = dir.path().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn read(dir: &TempDir, rel: &str) -> String {
    std::fs::read_to_string(dir.path().join(rel)).unwrap()
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ---------------------------------------------------------------------------
// gsd frontmatter get
// ---------------------------------------------------------------------------

#[test]
fn frontmatter_get_reads_all_fields() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\nplan: 01\ntype: setup\nwave: 1\n---\n# Plan",
    );

    let output = json_stdout(gsd(&dir).args([
        "frontmatter",
        "get",
        ".planning/phases/01-setup/01-01-PLAN.md",
    ]));
    assert_eq!(output["phase"], "01");
    assert_eq!(output["plan"], "01");
    assert_eq!(output["type"], "setup");
}

#[test]
fn frontmatter_get_specific_field() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\nplan: 01\nwave: 2\n---\n# Plan",
    );

    let output = json_stdout(gsd(&dir).args([
        "frontmatter",
        "get",
        ".planning/phases/01-setup/01-01-PLAN.md",
        "--field",
        "wave",
    ]));
    assert_eq!(output["wave"], "2");
}

#[test]
fn frontmatter_get_missing_field_reports_soft_error() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\n---\n# Plan",
    );

    let output = json_stdout(gsd(&dir).args([
        "frontmatter",
        "get",
        ".planning/phases/01-setup/01-01-PLAN.md",
        "--field",
        "nonexistent",
    ]));
    assert!(output["error"].is_string());
}

#[test]
fn frontmatter_get_missing_file_reports_soft_error() {
    let dir = TempDir::new().unwrap();
    let output = json_stdout(gsd(&dir).args(["frontmatter", "get", ".planning/nonexistent.md"]));
    assert!(output["error"].is_string());
}

// ---------------------------------------------------------------------------
// gsd frontmatter set / merge
// ---------------------------------------------------------------------------

#[test]
fn frontmatter_set_new_field() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\n---\n# Plan",
    );

    let output = json_stdout(gsd(&dir).args([
        "frontmatter",
        "set",
        ".planning/phases/01-setup/01-01-PLAN.md",
        "--field",
        "wave",
        "--value",
        "3",
    ]));
    assert_eq!(output["updated"], true);

    let content = read(&dir, ".planning/phases/01-setup/01-01-PLAN.md");
    assert!(content.contains("wave: 3"));
    assert!(content.contains("# Plan"));
}

#[test]
fn frontmatter_set_updates_existing_field() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\nwave: 1\n---\n# Plan",
    );

    json_stdout(gsd(&dir).args([
        "frontmatter",
        "set",
        ".planning/phases/01-setup/01-01-PLAN.md",
        "--field",
        "wave",
        "--value",
        "2",
    ]));
    let content = read(&dir, ".planning/phases/01-setup/01-01-PLAN.md");
    assert!(content.contains("wave: 2"));
    assert!(!content.contains("wave: 1"));
}

#[test]
fn frontmatter_set_json_array_value() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\n---\n# Plan",
    );

    json_stdout(gsd(&dir).args([
        "frontmatter",
        "set",
        ".planning/phases/01-setup/01-01-PLAN.md",
        "--field",
        "tags",
        "--value",
        r#"["a","b","c"]"#,
    ]));
    let content = read(&dir, ".planning/phases/01-setup/01-01-PLAN.md");
    assert!(content.contains("tags: [a, b, c]"));
}

#[test]
fn frontmatter_merge_adds_fields() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\n---\n# Plan",
    );

    let output = json_stdout(gsd(&dir).args([
        "frontmatter",
        "merge",
        ".planning/phases/01-setup/01-01-PLAN.md",
        "--data",
        r#"{"wave":"2","type":"setup"}"#,
    ]));
    assert_eq!(output["merged"], true);

    let content = read(&dir, ".planning/phases/01-setup/01-01-PLAN.md");
    assert!(content.contains("phase: 01"));
    assert!(content.contains("wave: 2"));
    assert!(content.contains("type: setup"));
}

#[test]
fn frontmatter_merge_rejects_invalid_json() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\n---\n# Plan",
    );

    gsd(&dir)
        .args([
            "frontmatter",
            "merge",
            ".planning/phases/01-setup/01-01-PLAN.md",
            "--data",
            "not-json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

// ---------------------------------------------------------------------------
// gsd frontmatter validate
// ---------------------------------------------------------------------------

#[test]
fn frontmatter_validate_plan_all_present() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\nplan: 01\ntype: implementation\nwave: 1\ndepends_on: []\nfiles_modified: 5\nautonomous: true\nmust_haves:\n  truths:\n    - \"tests pass\"\n---\n# Plan",
    );

    let output = json_stdout(gsd(&dir).args([
        "frontmatter",
        "validate",
        ".planning/phases/01-setup/01-01-PLAN.md",
        "--schema",
        "plan",
    ]));
    assert_eq!(output["valid"], true);
    assert_eq!(output["missing"], serde_json::json!([]));
}

#[test]
fn frontmatter_validate_reports_missing() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\nplan: 01\n---\n# Plan",
    );

    let output = json_stdout(gsd(&dir).args([
        "frontmatter",
        "validate",
        ".planning/phases/01-setup/01-01-PLAN.md",
        "--schema",
        "plan",
    ]));
    assert_eq!(output["valid"], false);
    let missing: Vec<String> =
        serde_json::from_value(output["missing"].clone()).unwrap();
    assert!(missing.contains(&"type".to_string()));
    assert!(missing.contains(&"wave".to_string()));
}

#[test]
fn frontmatter_validate_unknown_schema_fails() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/phases/01-setup/01-01-PLAN.md",
        "---\nphase: 01\n---\n# Plan",
    );

    gsd(&dir)
        .args([
            "frontmatter",
            "validate",
            ".planning/phases/01-setup/01-01-PLAN.md",
            "--schema",
            "bogus",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown schema"));
}

// ---------------------------------------------------------------------------
// gsd state snapshot / get
// ---------------------------------------------------------------------------

#[test]
fn state_snapshot_missing_file_reports_soft_error() {
    let dir = TempDir::new().unwrap();
    let output = json_stdout(gsd(&dir).args(["state", "snapshot"]));
    assert_eq!(output["error"], "STATE.md not found");
}

#[test]
fn state_snapshot_extracts_fields() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# Project State\n\n**Current Phase:** 03\n**Current Phase Name:** API Layer\n**Total Phases:** 6\n**Status:** In progress\n**Progress:** 45%\n\n## Blockers\n\n- Waiting for API credentials\n",
    );

    let output = json_stdout(gsd(&dir).args(["state", "snapshot"]));
    assert_eq!(output["current_phase"], "03");
    assert_eq!(output["current_phase_name"], "API Layer");
    assert_eq!(output["total_phases"], 6);
    assert_eq!(output["progress_percent"], 45);
    assert_eq!(
        output["blockers"],
        serde_json::json!(["Waiting for API credentials"])
    );
}

#[test]
fn state_get_full_content() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/STATE.md", "# State\n\n**Status:** Working\n");

    let output = json_stdout(gsd(&dir).args(["state", "get"]));
    assert!(output["content"]
        .as_str()
        .unwrap()
        .contains("**Status:** Working"));
}

#[test]
fn state_get_named_field() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n**Current Phase:** 05\n**Status:** In progress\n",
    );

    let output = json_stdout(gsd(&dir).args(["state", "get", "Status"]));
    assert_eq!(output["Status"], "In progress");
}

#[test]
fn state_get_section() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n## Blockers\n\n- Waiting for API key\n- Need design review\n\n## Other\n",
    );

    let output = json_stdout(gsd(&dir).args(["state", "get", "Blockers"]));
    assert!(output["Blockers"]
        .as_str()
        .unwrap()
        .contains("Waiting for API key"));
}

#[test]
fn state_get_unknown_name_reports_soft_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/STATE.md", "# State\n\n**Status:** Done\n");

    let output = json_stdout(gsd(&dir).args(["state", "get", "NonExistent"]));
    assert!(output["error"].as_str().unwrap().contains("not found"));
}

#[test]
fn state_get_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    gsd(&dir).args(["state", "get"]).assert().failure();
}

// ---------------------------------------------------------------------------
// gsd state update / patch
// ---------------------------------------------------------------------------

#[test]
fn state_update_single_field() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/STATE.md", "# State\n\n**Status:** Idle\n");

    let output = json_stdout(gsd(&dir).args(["state", "update", "Status", "Active"]));
    assert_eq!(output["updated"], true);
    assert!(read(&dir, ".planning/STATE.md").contains("**Status:** Active"));
}

#[test]
fn state_update_missing_field_soft() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/STATE.md", "# State\n\n**Status:** Done\n");

    let output = json_stdout(gsd(&dir).args(["state", "update", "MissingField", "value"]));
    assert_eq!(output["updated"], false);
}

#[test]
fn state_update_missing_file_soft() {
    let dir = TempDir::new().unwrap();
    let output = json_stdout(gsd(&dir).args(["state", "update", "Status", "value"]));
    assert_eq!(output["updated"], false);
    assert!(output["reason"].as_str().unwrap().contains("not found"));
}

#[test]
fn state_patch_multiple_fields() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n**Status:** Idle\n**Current Phase:** 01\n**Last Activity:** 2025-01-01\n",
    );

    let output = json_stdout(gsd(&dir).args([
        "state",
        "patch",
        "--Status",
        "In progress",
        "--Current Phase",
        "03",
    ]));
    let updated: Vec<String> = serde_json::from_value(output["updated"].clone()).unwrap();
    assert!(updated.contains(&"Status".to_string()));
    assert!(read(&dir, ".planning/STATE.md").contains("**Status:** In progress"));
}

#[test]
fn state_patch_reports_failed_fields() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/STATE.md", "# State\n\n**Status:** Done\n");

    let output = json_stdout(gsd(&dir).args(["state", "patch", "--FakeField", "value"]));
    let failed: Vec<String> = serde_json::from_value(output["failed"].clone()).unwrap();
    assert!(failed.contains(&"FakeField".to_string()));
}

// ---------------------------------------------------------------------------
// gsd state advance-plan
// ---------------------------------------------------------------------------

#[test]
fn state_advance_plan_increments() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n**Current Plan:** 1\n**Total Plans in Phase:** 3\n**Status:** Executing\n**Last Activity:** 2025-01-01\n",
    );

    let output = json_stdout(gsd(&dir).args(["state", "advance-plan"]));
    assert_eq!(output["advanced"], true);
    assert_eq!(output["previous_plan"], 1);
    assert_eq!(output["current_plan"], 2);

    let state = read(&dir, ".planning/STATE.md");
    assert!(state.contains("**Current Plan:** 2"));
    assert!(state.contains("**Status:** Ready to execute"));
}

#[test]
fn state_advance_plan_last_plan() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n**Current Plan:** 3\n**Total Plans in Phase:** 3\n**Status:** Executing\n**Last Activity:** 2025-01-01\n",
    );

    let output = json_stdout(gsd(&dir).args(["state", "advance-plan"]));
    assert_eq!(output["advanced"], false);
    assert_eq!(output["reason"], "last_plan");
    assert_eq!(output["status"], "ready_for_verification");
    assert!(read(&dir, ".planning/STATE.md").contains("Phase complete"));
}

#[test]
fn state_advance_plan_unparsable_soft_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/STATE.md", "# State\n\n**Status:** Idle\n");

    let output = json_stdout(gsd(&dir).args(["state", "advance-plan"]));
    assert!(output["error"].as_str().unwrap().contains("Cannot parse"));
}

// ---------------------------------------------------------------------------
// gsd state decisions / blockers
// ---------------------------------------------------------------------------

#[test]
fn state_add_decision_preserves_dollar_amounts() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# Project State\n\n## Decisions\nNo decisions yet.\n\n## Blockers\nNone\n",
    );

    json_stdout(gsd(&dir).args([
        "state",
        "add-decision",
        "--phase",
        "11-01",
        "--summary",
        "Benchmark prices moved from $0.50 to $2.00 to $5.00",
        "--rationale",
        "track cost growth",
    ]));

    let state = read(&dir, ".planning/STATE.md");
    assert!(state.contains(
        "- [Phase 11-01]: Benchmark prices moved from $0.50 to $2.00 to $5.00 — track cost growth"
    ));
    assert_eq!(state.matches("## Decisions").count(), 1);
    assert!(!state.contains("No decisions yet."));
}

#[test]
fn state_add_decision_from_files() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# Project State\n\n## Decisions\nNo decisions yet.\n\n## Blockers\nNone\n",
    );
    write(&dir, "decision-summary.txt", "Price tiers: $0.50, $2.00, else $5.00\n");
    write(&dir, "decision-rationale.txt", "Keep exact currency literals for budgeting\n");

    json_stdout(gsd(&dir).args([
        "state",
        "add-decision",
        "--phase",
        "11-02",
        "--summary-file",
        dir.path().join("decision-summary.txt").to_str().unwrap(),
        "--rationale-file",
        dir.path().join("decision-rationale.txt").to_str().unwrap(),
    ]));

    let state = read(&dir, ".planning/STATE.md");
    assert!(state.contains(
        "- [Phase 11-02]: Price tiers: $0.50, $2.00, else $5.00 — Keep exact currency literals for budgeting"
    ));
}

#[test]
fn state_add_blocker_from_file() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# Project State\n\n## Decisions\nNone\n\n## Blockers\nNone\n",
    );
    write(&dir, "blocker.txt", "Vendor quote updated from $1.00 to $2.00 pending approval\n");

    json_stdout(gsd(&dir).args([
        "state",
        "add-blocker",
        "--text-file",
        dir.path().join("blocker.txt").to_str().unwrap(),
    ]));

    let state = read(&dir, ".planning/STATE.md");
    assert!(state.contains("- Vendor quote updated from $1.00 to $2.00 pending approval"));
    assert_eq!(state.matches("## Blockers").count(), 1);
}

#[test]
fn state_resolve_blocker() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n## Blockers\n\n- Waiting for API key\n- Need design review\n\n## Other\n",
    );

    let output = json_stdout(gsd(&dir).args(["state", "resolve-blocker", "--text", "API key"]));
    assert_eq!(output["resolved"], true);

    let state = read(&dir, ".planning/STATE.md");
    assert!(!state.contains("Waiting for API key"));
    assert!(state.contains("Need design review"));
}

// ---------------------------------------------------------------------------
// gsd state load / record-session / record-metric / update-progress
// ---------------------------------------------------------------------------

#[test]
fn state_load_defaults_when_config_missing() {
    let dir = TempDir::new().unwrap();
    let output = json_stdout(gsd(&dir).args(["state", "load"]));
    assert_eq!(output["config"]["model_profile"], "balanced");
    assert_eq!(output["config"]["commit_docs"], true);
    assert_eq!(output["config_exists"], false);
    assert_eq!(output["state_exists"], false);
    assert_eq!(output["roadmap_exists"], false);
}

#[test]
fn state_load_custom_config() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/config.json",
        r#"{"model_profile": "quality", "commit_docs": false, "research": false}"#,
    );

    let output = json_stdout(gsd(&dir).args(["state", "load"]));
    assert_eq!(output["config"]["model_profile"], "quality");
    assert_eq!(output["config"]["commit_docs"], false);
    assert_eq!(output["config_exists"], true);
}

#[test]
fn state_load_raw_outputs_key_value() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/config.json", r#"{"model_profile": "budget"}"#);

    gsd(&dir)
        .args(["state", "load", "--raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("model_profile=budget"))
        .stdout(predicate::str::contains("config_exists=true"));
}

#[test]
fn state_record_session_updates_fields() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n**Last session:** never\n**Last Date:** never\n**Stopped At:** none\n**Resume File:** None\n",
    );

    let output = json_stdout(gsd(&dir).args([
        "state",
        "record-session",
        "--stopped-at",
        "Phase 2, Plan 1, Task 3",
        "--resume-file",
        ".planning/phases/02-api/02-01-PLAN.md",
    ]));
    assert_eq!(output["recorded"], true);

    let state = read(&dir, ".planning/STATE.md");
    assert!(state.contains("Phase 2, Plan 1, Task 3"));
    assert!(state.contains(".planning/phases/02-api/02-01-PLAN.md"));
}

#[test]
fn state_record_metric_appends_row() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n## Performance Metrics\n\n| Plan | Duration | Tasks | Files |\n|------|----------|-------|-------|\nNone yet\n\n## Other\n",
    );

    let output = json_stdout(gsd(&dir).args([
        "state",
        "record-metric",
        "--phase",
        "1",
        "--plan",
        "1",
        "--duration",
        "15min",
        "--tasks",
        "5",
        "--files",
        "3",
    ]));
    assert_eq!(output["recorded"], true);

    let state = read(&dir, ".planning/STATE.md");
    assert!(state.contains("Phase 1 P1"));
    assert!(state.contains("15min"));
    assert!(!state.contains("None yet"));
}

#[test]
fn state_record_metric_requires_fields() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n## Performance Metrics\n\n| Plan | Duration | Tasks | Files |\n|------|----------|-------|-------|\n",
    );

    let output = json_stdout(gsd(&dir).args(["state", "record-metric", "--phase", "1"]));
    assert!(output["error"].as_str().unwrap().contains("required"));
}

#[test]
fn state_update_progress_computes_percent() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/STATE.md", "# State\n\n**Progress:** 0%\n");
    write(&dir, ".planning/phases/01-setup/01-01-PLAN.md", "# Plan 1");
    write(&dir, ".planning/phases/01-setup/01-02-PLAN.md", "# Plan 2");
    write(&dir, ".planning/phases/01-setup/01-01-SUMMARY.md", "# Summary 1");

    let output = json_stdout(gsd(&dir).args(["state", "update-progress"]));
    assert_eq!(output["updated"], true);
    assert_eq!(output["percent"], 50);
    assert_eq!(output["completed"], 1);
    assert_eq!(output["total"], 2);
}

// ---------------------------------------------------------------------------
// gsd resolve-model
// ---------------------------------------------------------------------------

#[test]
fn resolve_model_balanced_executor() {
    let dir = TempDir::new().unwrap();
    let output = json_stdout(gsd(&dir).args(["resolve-model", "gsd-executor"]));
    assert_eq!(output["model"], "sonnet");
}

#[test]
fn resolve_model_quality_planner_inherits() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/config.json", r#"{"model_profile": "quality"}"#);

    let output = json_stdout(gsd(&dir).args(["resolve-model", "gsd-planner"]));
    assert_eq!(output["model"], "inherit");
}

#[test]
fn resolve_model_unknown_agent() {
    let dir = TempDir::new().unwrap();
    let output = json_stdout(gsd(&dir).args(["resolve-model", "unknown-agent"]));
    assert_eq!(output["model"], "sonnet");
}

// ---------------------------------------------------------------------------
// gsd find-phase
// ---------------------------------------------------------------------------

#[test]
fn find_phase_zero_pads_number() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/phases/03-api-layer/03-01-PLAN.md", "# Plan");

    let output = json_stdout(gsd(&dir).args(["find-phase", "3"]));
    assert_eq!(output["found"], true);
    assert_eq!(output["phase_number"], "03");
    assert_eq!(output["phase_name"], "api-layer");
    assert_eq!(output["plans"].as_array().unwrap().len(), 1);
}

#[test]
fn find_phase_not_found() {
    let dir = TempDir::new().unwrap();
    let output = json_stdout(gsd(&dir).args(["find-phase", "99"]));
    assert_eq!(output["found"], false);
}

#[test]
fn find_phase_lists_plans_and_summaries() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/phases/01-setup/01-01-PLAN.md", "# Plan 1");
    write(&dir, ".planning/phases/01-setup/01-02-PLAN.md", "# Plan 2");
    write(&dir, ".planning/phases/01-setup/01-01-SUMMARY.md", "# Summary 1");

    let output = json_stdout(gsd(&dir).args(["find-phase", "1"]));
    let plans: Vec<String> = serde_json::from_value(output["plans"].clone()).unwrap();
    let summaries: Vec<String> = serde_json::from_value(output["summaries"].clone()).unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(summaries.len(), 1);

    // Plans without a matching summary are the incomplete ones.
    let summary_prefixes: Vec<String> = summaries
        .iter()
        .map(|s| s.replace("-SUMMARY.md", ""))
        .collect();
    let incomplete: Vec<&String> = plans
        .iter()
        .filter(|p| !summary_prefixes.contains(&p.replace("-PLAN.md", "")))
        .collect();
    assert_eq!(incomplete.len(), 1);
    assert!(incomplete[0].contains("01-02"));
}

// ---------------------------------------------------------------------------
// gsd milestone complete
// ---------------------------------------------------------------------------

#[test]
fn milestone_complete_archives_and_records() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/ROADMAP.md", "# Roadmap v1.0 MVP\n");
    write(&dir, ".planning/REQUIREMENTS.md", "# Requirements\n\n- [ ] User auth\n");
    write(
        &dir,
        ".planning/STATE.md",
        "# State\n\n**Status:** In progress\n**Last Activity:** 2025-01-01\n**Last Activity Description:** Working\n",
    );
    write(
        &dir,
        ".planning/phases/01-foundation/01-01-SUMMARY.md",
        "---\none-liner: Set up project infrastructure\n---\n# Summary\n",
    );

    let output = json_stdout(gsd(&dir).args([
        "milestone",
        "complete",
        "v1.0",
        "--name",
        "MVP",
        "Foundation",
    ]));
    assert_eq!(output["version"], "v1.0");
    assert_eq!(output["phases"], 1);
    assert_eq!(output["archived"]["roadmap"], true);
    assert_eq!(output["archived"]["requirements"], true);

    assert!(dir.path().join(".planning/milestones/v1.0-ROADMAP.md").exists());
    let milestones = read(&dir, ".planning/MILESTONES.md");
    assert!(milestones.contains("v1.0 MVP Foundation"));
    assert!(milestones.contains("Set up project infrastructure"));
}

#[test]
fn milestone_complete_archive_phases_flag() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".planning/ROADMAP.md", "# Roadmap v1.0\n");
    write(&dir, ".planning/phases/01-setup/01-01-PLAN.md", "# Plan");

    let output = json_stdout(gsd(&dir).args([
        "milestone",
        "complete",
        "v1.0",
        "--name",
        "Alpha",
        "--archive-phases",
    ]));
    assert_eq!(output["archived"]["phases"], true);
    assert!(dir
        .path()
        .join(".planning/milestones/v1.0-phases/01-setup")
        .exists());
    assert!(!dir.path().join(".planning/phases/01-setup").exists());
}

// ---------------------------------------------------------------------------
// gsd requirements mark-complete
// ---------------------------------------------------------------------------

#[test]
fn requirements_mark_complete_checkboxes() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/REQUIREMENTS.md",
        "# Requirements\n\n- [ ] **REQ-01** User authentication\n- [ ] **REQ-02** Dashboard view\n- [ ] **REQ-03** Data export\n",
    );

    let output = json_stdout(gsd(&dir).args(["requirements", "mark-complete", "REQ-01,REQ-03"]));
    assert_eq!(output["updated"], true);
    assert_eq!(output["marked_complete"], serde_json::json!(["REQ-01", "REQ-03"]));
    assert_eq!(output["not_found"], serde_json::json!([]));

    let content = read(&dir, ".planning/REQUIREMENTS.md");
    assert!(content.contains("- [x] **REQ-01**"));
    assert!(content.contains("- [ ] **REQ-02**"));
    assert!(content.contains("- [x] **REQ-03**"));
}

#[test]
fn requirements_mark_complete_bracket_input() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".planning/REQUIREMENTS.md",
        "# Requirements\n\n- [ ] **REQ-01** Auth\n- [ ] **REQ-02** UI\n",
    );

    let output = json_stdout(gsd(&dir).args(["requirements", "mark-complete", "[REQ-01,", "REQ-02]"]));
    assert_eq!(output["marked_complete"].as_array().unwrap().len(), 2);
}

#[test]
fn requirements_mark_complete_missing_file_soft() {
    let dir = TempDir::new().unwrap();
    let output = json_stdout(gsd(&dir).args(["requirements", "mark-complete", "REQ-01"]));
    assert_eq!(output["updated"], false);
    assert_eq!(output["reason"], "REQUIREMENTS.md not found");
}

// ---------------------------------------------------------------------------
// --cwd handling
// ---------------------------------------------------------------------------

#[test]
fn cwd_flag_overrides_working_directory() {
    let project = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    write(
        &project,
        ".planning/STATE.md",
        "# Session State\n\n**Current Phase:** 03\n**Status:** Ready to plan\n",
    );

    let mut cmd = Command::cargo_bin("gsd").unwrap();
    cmd.current_dir(elsewhere.path()).args([
        "--cwd",
        project.path().to_str().unwrap(),
        "state",
        "snapshot",
    ]);
    let output = json_stdout(&mut cmd);
    assert_eq!(output["current_phase"], "03");
    assert_eq!(output["status"], "Ready to plan");
}

#[test]
fn invalid_cwd_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("gsd").unwrap();
    cmd.current_dir(dir.path()).args([
        "--cwd",
        dir.path().join("does-not-exist").to_str().unwrap(),
        "state",
        "snapshot",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --cwd"));
}
