use boardctl::config::{Config, ConfigError, Overrides, PinBackend};
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.pattern.codes, vec![0]);
    assert_eq!(config.pattern.tempo, 120);
    assert_eq!(config.peripheral.mode, 2);
    assert_eq!(config.pins.backend, PinBackend::Sysfs);
    assert_eq!(config.pins.sysfs_root, PathBuf::from("/sys/class/gpio"));
    assert_eq!(config.pins.led_blue, 29);
    assert_eq!(config.pins.led_white, 28);
    assert_eq!(config.pins.lcm_reset, 27);
    assert_eq!(config.pins.lcm_boot, 26);
    assert!(!config.control.echo_endpoint);
    assert!(config.control.socket_path.ends_with("boardctl.sock"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_path_ends_with_expected() {
    assert!(Config::config_path().ends_with("boardctl/config.toml"));
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let (_dir, path) = write_config(
        r#"
[pattern]
codes = [1, 0, 2, 0]
tempo = 60

[pins]
backend = "memory"
lcm_boot = 40

[control]
socket_path = "/tmp/custom.sock"
echo_endpoint = true
"#,
    );

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.pattern.codes, vec![1, 0, 2, 0]);
    assert_eq!(config.pattern.tempo, 60);
    assert_eq!(config.peripheral.mode, 2);
    assert_eq!(config.pins.backend, PinBackend::Memory);
    assert_eq!(config.pins.lcm_boot, 40);
    assert_eq!(config.pins.led_blue, 29);
    assert_eq!(config.control.socket_path, PathBuf::from("/tmp/custom.sock"));
    assert!(config.control.echo_endpoint);
}

#[test]
fn test_malformed_file_is_parse_error() {
    let (_dir, path) = write_config("[pattern\ncodes = ");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn test_unknown_backend_is_parse_error() {
    let (_dir, path) = write_config("[pins]\nbackend = \"gpiod\"\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn test_validation_rejects_out_of_range_values() {
    let cases: Vec<(&str, Box<dyn Fn(&mut Config)>)> = vec![
        ("tempo", Box::new(|c: &mut Config| c.pattern.tempo = 0)),
        ("tempo", Box::new(|c: &mut Config| c.pattern.tempo = 255)),
        ("mode", Box::new(|c: &mut Config| c.peripheral.mode = 3)),
        ("Pattern", Box::new(|c: &mut Config| c.pattern.codes.clear())),
        ("Pattern", Box::new(|c: &mut Config| c.pattern.codes = vec![1; 129])),
        ("distinct", Box::new(|c: &mut Config| c.pins.led_white = c.pins.led_blue)),
    ];

    for (needle, mutate) in cases {
        let mut config = Config::default();
        mutate(&mut config);
        match config.validate() {
            Err(ConfigError::ValidationError { message }) => {
                assert!(message.contains(needle), "{message:?} should mention {needle}");
            }
            other => panic!("expected validation error for {needle}, got {other:?}"),
        }
    }
}

#[test]
fn test_overrides_take_precedence() {
    let mut config = Config::default();
    config.apply(Overrides {
        codes: Some(vec![3, 1]),
        tempo: Some(200),
        mode: Some(0),
        backend: Some(PinBackend::Memory),
        socket_path: Some(PathBuf::from("/tmp/override.sock")),
    });

    assert_eq!(config.pattern.codes, vec![3, 1]);
    assert_eq!(config.pattern.tempo, 200);
    assert_eq!(config.peripheral.mode, 0);
    assert_eq!(config.pins.backend, PinBackend::Memory);
    assert_eq!(config.control.socket_path, PathBuf::from("/tmp/override.sock"));
}

#[test]
fn test_empty_overrides_change_nothing() {
    let mut config = Config::default();
    config.apply(Overrides::default());
    assert_eq!(config, Config::default());
}
