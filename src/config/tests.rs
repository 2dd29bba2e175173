use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_cadenza_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", "/tmp/cadenza-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/cadenza-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("cadenza")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("cadenza")
            .join("config.toml")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[server]
base_url = "https://music.example.com"
email = "ada@example.com"
password = "Secret123"
request_timeout_ms = 5000

[audio]
initial_volume = 0.5
prefetch_timeout_ms = 2500
tick_ms = 100
quit_fade_out_ms = 0

[controls]
seek_step_percent = 10.0
volume_step = 0.1

[ui]
header_text = "hello"
now_playing_fields = ["artist", "title", "album"]
now_playing_separator = " • "
progress_width = 40

[library]
page_size = 20
popular_limit = 5
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("CADENZA__AUDIO__TICK_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.server.base_url, "https://music.example.com");
    assert_eq!(s.server.email.as_deref(), Some("ada@example.com"));
    assert!(s.server.token.is_none());
    assert_eq!(s.request_timeout().as_millis(), 5000);
    assert_eq!(s.audio.initial_volume, 0.5);
    assert_eq!(s.audio.prefetch_timeout_ms, 2500);
    assert_eq!(s.audio.tick_ms, 100);
    assert!(s.quit_fade_out().is_zero());
    assert_eq!(s.controls.seek_step_percent, 10.0);
    assert_eq!(s.controls.volume_step, 0.1);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(
        s.ui.now_playing_fields,
        vec![TrackField::Artist, TrackField::Title, TrackField::Album]
    );
    assert_eq!(s.ui.now_playing_separator, " • ");
    assert_eq!(s.ui.progress_width, 40);
    assert_eq!(s.library.page_size, 20);
    assert_eq!(s.library.popular_limit, 5);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
tick_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("CADENZA__AUDIO__TICK_MS", "50");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.tick_ms, 50);
    assert_eq!(s.server.base_url, "http://localhost:5000");
}

#[test]
fn defaults_are_valid() {
    let s = Settings::default();
    assert!(s.validate().is_ok());
    assert_eq!(s.audio.prefetch_timeout_ms, 10_000);
    assert_eq!(s.audio.initial_volume, 0.8);
}

#[test]
fn validate_rejects_bad_values() {
    let mut s = Settings::default();
    s.server.base_url = "localhost:5000".into();
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.server.base_url = "   ".into();
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.audio.initial_volume = 1.5;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.audio.tick_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.controls.volume_step = 0.0;
    assert!(s.validate().is_err());
}
