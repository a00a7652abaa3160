use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn rect_svg(w: f64, h: f64) -> String {
    format!(r#"<svg><rect x="0" y="0" width="{w}" height="{h}"/></svg>"#)
}

#[test]
fn cli_nests_two_squares_into_a_bin() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let bin = tmp.child("bin.svg");
    bin.write_str(&rect_svg(20.0, 20.0))?;
    let part = tmp.child("part.svg");
    part.write_str(&rect_svg(5.0, 5.0))?;

    Command::cargo_bin("nest")?
        .current_dir(&tmp)
        .args([
            "--inputs",
            bin.path().to_str().unwrap(),
            "--inputs",
            part.path().to_str().unwrap(),
            "--population-size",
            "4",
            "--mutation-rate",
            "0",
            "--rotations",
            "1",
            "--spacing",
            "0",
            "--generations",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nested result written"));

    assert!(tmp.path().join("nested.svg").exists());
    tmp.close()?;
    Ok(())
}

#[test]
fn cli_reports_failure_when_no_polygons_found() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let empty = tmp.child("empty.svg");
    empty.write_str("<svg></svg>")?;

    Command::cargo_bin("nest")?
        .current_dir(&tmp)
        .args(["--inputs", empty.path().to_str().unwrap()])
        .assert()
        .failure();

    tmp.close()?;
    Ok(())
}

#[test]
fn cli_accepts_merge_lines_and_explore_concave_flags() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let bin = tmp.child("bin.svg");
    bin.write_str(&rect_svg(20.0, 20.0))?;
    let part = tmp.child("part.svg");
    part.write_str(&rect_svg(4.0, 6.0))?;

    Command::cargo_bin("nest")?
        .current_dir(&tmp)
        .args([
            "--inputs",
            bin.path().to_str().unwrap(),
            "--inputs",
            part.path().to_str().unwrap(),
            "--population-size",
            "4",
            "--mutation-rate",
            "10",
            "--rotations",
            "2",
            "--spacing",
            "0.5",
            "--generations",
            "2",
            "--merge-lines",
            "--explore-concave",
        ])
        .assert()
        .success();

    tmp.close()?;
    Ok(())
}
