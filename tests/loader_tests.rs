// ABOUTME: Module loader and import cache tests covering sandboxing, remote fetch, and caching

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use serial_test::serial;

use hql::cache::ImportCache;
use hql::config::{FsConfig, NetConfig};
use hql::loader::ModuleLoader;

/// A scratch directory for loader tests, recreated on each use
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hql-loader-tests-{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("cannot create scratch dir");
    dir
}

fn local_loader(root: PathBuf, max_module_size: usize) -> ModuleLoader {
    let fs_config = FsConfig {
        allowed_paths: vec![root],
        max_module_size,
    };
    ModuleLoader::new(
        fs_config,
        NetConfig::default(),
        ImportCache::in_memory().unwrap(),
    )
    .expect("loader setup failed")
}

#[test]
#[serial]
fn local_module_resolves_with_and_without_extension() {
    let dir = scratch_dir("local");
    std::fs::write(dir.join("util.hql"), "(fn id (x) x)").unwrap();

    let loader = local_loader(dir, 1024 * 1024);
    assert_eq!(loader.load("util").unwrap(), "(fn id (x) x)");
    assert_eq!(loader.load("./util.hql").unwrap(), "(fn id (x) x)");
}

#[test]
#[serial]
fn missing_local_module_is_an_import_error() {
    let dir = scratch_dir("missing");
    let loader = local_loader(dir, 1024 * 1024);
    let err = loader.load("nope").unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
#[serial]
fn oversized_module_is_rejected() {
    let dir = scratch_dir("oversized");
    std::fs::write(dir.join("big.hql"), "x".repeat(64)).unwrap();

    let loader = local_loader(dir, 16);
    let err = loader.load("big").unwrap_err();
    assert!(err.to_string().contains("maximum size"));
}

#[test]
#[serial]
fn remote_fetch_happens_once_then_serves_from_cache() {
    let dir = scratch_dir("remote");
    let calls = Rc::new(Cell::new(0usize));
    let counter = calls.clone();

    let loader = ModuleLoader::new(
        FsConfig {
            allowed_paths: vec![dir],
            ..FsConfig::default()
        },
        NetConfig {
            enabled: true,
            allowed_hosts: vec![],
        },
        ImportCache::in_memory().unwrap(),
    )
    .unwrap()
    .with_fetcher(Box::new(move |_url| {
        counter.set(counter.get() + 1);
        Ok("export const pad = 1;".to_string())
    }));

    assert_eq!(loader.load("npm:left-pad").unwrap(), "export const pad = 1;");
    assert_eq!(loader.load("npm:left-pad").unwrap(), "export const pad = 1;");
    assert_eq!(calls.get(), 1);
}

#[test]
#[serial]
fn remote_import_requires_network_permission() {
    let dir = scratch_dir("no-net");
    let loader = local_loader(dir, 1024);
    let err = loader.load("npm:left-pad").unwrap_err();
    assert!(err.to_string().contains("--allow-net"));
}

#[test]
#[serial]
fn disallowed_host_is_rejected() {
    let dir = scratch_dir("hosts");
    let loader = ModuleLoader::new(
        FsConfig {
            allowed_paths: vec![dir],
            ..FsConfig::default()
        },
        NetConfig {
            enabled: true,
            allowed_hosts: vec!["registry.example".to_string()],
        },
        ImportCache::in_memory().unwrap(),
    )
    .unwrap()
    .with_fetcher(Box::new(|_url| panic!("fetch must not run for blocked hosts")));

    let err = loader.load("npm:left-pad").unwrap_err();
    assert!(err.to_string().contains("allowed list"));
}

#[test]
#[serial]
fn on_disk_cache_survives_reopen() {
    let dir = scratch_dir("cache");
    let cache_path = dir.join("imports.db");

    {
        let cache = ImportCache::open(&cache_path).unwrap();
        cache.store("npm:left-pad", "cached source").unwrap();
    }

    let cache = ImportCache::open(&cache_path).unwrap();
    assert_eq!(
        cache.lookup("npm:left-pad").unwrap().as_deref(),
        Some("cached source")
    );
}
