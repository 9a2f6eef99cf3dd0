use std::io::Write;

use super::*;

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert!(settings.cache.use_cache);
    assert!(settings.cache.save_cache);
    assert_eq!(settings.cache.ttl, Duration::from_secs(1800));
    assert_eq!(settings.cache.namespace, "category-posts");
    assert_eq!(settings.cache.max_entries.get(), 200);
    assert_eq!(settings.site.scope, ScopeId::new("default"));
    assert!(settings.site.supports_thumbnails);
    assert!(settings.site.fixture.is_none());
}

#[test]
fn save_cache_follows_use_cache_when_unset() {
    let mut raw = RawSettings::default();
    raw.cache.use_cache = Some(false);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(!settings.cache.use_cache);
    assert!(!settings.cache.save_cache);
}

#[test]
fn save_cache_can_be_toggled_independently() {
    let mut raw = RawSettings::default();
    raw.cache.use_cache = Some(true);
    raw.cache.save_cache = Some(false);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.cache.use_cache);
    assert!(!settings.cache.save_cache);
}

#[test]
fn zero_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds = Some(0);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.ttl_seconds",
            ..
        }
    ));
}

#[test]
fn zero_max_entries_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.max_entries = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn opaque_base_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.site.base_url = Some("mailto:editor@example.com".to_string());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "site.base_url",
            ..
        }
    ));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.ttl_seconds = Some(60);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache: CacheOverrides {
            ttl_seconds: Some(90),
            save_cache: Some(false),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.ttl, Duration::from_secs(90));
    assert!(settings.cache.use_cache);
    assert!(!settings.cache.save_cache);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["catposts"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_cache_flags() {
    let args = CliArgs::parse_from([
        "catposts",
        "serve",
        "--cache-use",
        "false",
        "--cache-ttl-seconds",
        "120",
        "--server-host",
        "0.0.0.0",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.cache.use_cache, Some(false));
            assert_eq!(serve.overrides.cache.save_cache, None);
            assert_eq!(serve.overrides.cache.ttl_seconds, Some(120));
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from([
        "catposts",
        "render",
        "category-posts-2",
        "--bare",
        "--site-fixture",
        "/tmp/site.toml",
    ]);

    match args.command.expect("render command") {
        Command::Render(render) => {
            assert_eq!(render.instance, "category-posts-2");
            assert!(render.bare);
            assert_eq!(
                render.site.fixture.as_deref(),
                Some(std::path::Path::new("/tmp/site.toml"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn config_file_layer_is_applied() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(
        file,
        "[cache]\nuse_cache = true\nsave_cache = false\nttl_seconds = 45\nnamespace = \"widgets\"\n\n[site]\nscope = \"shop\"\nbase_url = \"https://shop.example.com/\"\nsupports_thumbnails = false"
    )
    .expect("write config");

    let args = CliArgs {
        config_file: Some(file.path().to_path_buf()),
        command: None,
    };
    let settings = load(&args).expect("settings load");

    assert!(!settings.cache.save_cache);
    assert_eq!(settings.cache.ttl, Duration::from_secs(45));
    assert_eq!(settings.cache.namespace, "widgets");
    assert_eq!(settings.site.scope, ScopeId::new("shop"));
    assert_eq!(settings.site.base_url.as_str(), "https://shop.example.com/");
    assert!(!settings.site.supports_thumbnails);
}
