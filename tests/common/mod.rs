use assert_cmd::Command;

pub fn tagflow_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tagflow").unwrap();
    cmd.env_remove("TAGFLOW_STRICT");
    cmd
}
