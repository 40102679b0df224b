//! Integration tests for CLI argument handling
//!
//! Tests the coordinate override, unit, and theme flags from the command
//! line.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_skycast"))
        .args(args)
        .output()
        .expect("Failed to execute skycast")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("skycast"), "Help should mention skycast");
    assert!(stdout.contains("--lat"), "Help should mention --lat flag");
    assert!(
        stdout.contains("--fahrenheit"),
        "Help should mention --fahrenheit flag"
    );
}

#[test]
fn test_lat_without_lon_fails() {
    let output = run_cli(&["--lat", "49.28"]);
    assert!(!output.status.success(), "Expected --lat alone to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--lon") || stderr.contains("required"),
        "Should mention the missing --lon flag: {}",
        stderr
    );
}

#[test]
fn test_out_of_range_latitude_fails() {
    let output = run_cli(&["--lat", "91.0", "--lon", "10.0"]);
    assert!(
        !output.status.success(),
        "Expected out-of-range latitude to fail"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid coordinates"),
        "Should print coordinate validation error: {}",
        stderr
    );
}

#[test]
fn test_conflicting_theme_flags_fail() {
    let output = run_cli(&["--dark", "--light"]);
    assert!(!output.status.success(), "Expected --dark --light to fail");
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use skycast::cli::{Cli, StartupConfig};
    use skycast::data::TemperatureUnit;

    #[test]
    fn test_cli_no_args_has_no_overrides() {
        let cli = Cli::parse_from(["skycast"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(config.fix.is_none());
        assert!(config.unit.is_none());
        assert!(config.dark_mode.is_none());
    }

    #[test]
    fn test_cli_coordinate_pair_becomes_fix() {
        let cli = Cli::parse_from(["skycast", "--lat", "-36.85", "--lon", "174.76"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        let fix = config.fix.expect("fix should be set");
        assert!((fix.latitude - (-36.85)).abs() < 0.001);
        assert!((fix.longitude - 174.76).abs() < 0.001);
    }

    #[test]
    fn test_cli_fahrenheit_flag_selects_unit() {
        let cli = Cli::parse_from(["skycast", "--fahrenheit"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.unit, Some(TemperatureUnit::Fahrenheit));
    }

    #[test]
    fn test_cli_theme_flags_select_mode() {
        let cli = Cli::parse_from(["skycast", "--dark"]);
        assert_eq!(StartupConfig::from_cli(&cli).unwrap().dark_mode, Some(true));

        let cli = Cli::parse_from(["skycast", "--light"]);
        assert_eq!(StartupConfig::from_cli(&cli).unwrap().dark_mode, Some(false));
    }

    #[test]
    fn test_cli_rejects_out_of_range_longitude() {
        let cli = Cli::parse_from(["skycast", "--lat", "45.0", "--lon", "181.0"]);
        assert!(StartupConfig::from_cli(&cli).is_err());
    }
}
