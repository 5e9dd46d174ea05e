// ABOUTME: Module loader resolving import specifiers to source text
// Local paths resolve under capability-sandboxed roots via cap-std; remote
// specifiers (npm:/jsr:/https:) are fetched once and served from the cache.

use cap_std::fs::Dir;

use crate::cache::ImportCache;
use crate::config::{FsConfig, NetConfig};
use crate::error::CompileError;

type Fetcher = Box<dyn Fn(&str) -> Result<String, CompileError>>;

pub struct ModuleLoader {
    roots: Vec<Dir>,
    fs_config: FsConfig,
    net_config: NetConfig,
    cache: ImportCache,
    fetch: Fetcher,
}

impl ModuleLoader {
    /// Open all configured roots as capability directories
    pub fn new(
        fs_config: FsConfig,
        net_config: NetConfig,
        cache: ImportCache,
    ) -> Result<Self, CompileError> {
        let mut roots = Vec::new();
        for path in &fs_config.allowed_paths {
            let dir = Dir::open_ambient_dir(path, cap_std::ambient_authority()).map_err(|e| {
                CompileError::Io(format!("cannot open module root {}: {}", path.display(), e))
            })?;
            roots.push(dir);
        }

        Ok(ModuleLoader {
            roots,
            fs_config,
            net_config,
            cache,
            fetch: Box::new(http_fetch),
        })
    }

    /// Replace the network fetch hook (tests)
    pub fn with_fetcher(mut self, fetch: Fetcher) -> Self {
        self.fetch = fetch;
        self
    }

    /// Resolve a specifier to module source text
    pub fn load(&self, specifier: &str) -> Result<String, CompileError> {
        if is_remote(specifier) {
            return self.load_remote(specifier);
        }
        self.load_local(specifier)
    }

    // ========================================================================
    // Local Resolution
    // ========================================================================

    fn load_local(&self, specifier: &str) -> Result<String, CompileError> {
        // cap-std rejects absolute paths and .. escapes by construction;
        // reject them here too for a clearer message
        if specifier.starts_with('/') || specifier.starts_with('\\') || specifier.contains("..") {
            return Err(CompileError::import(format!(
                "module path '{}' must stay inside an allowed root",
                specifier
            )));
        }

        let relative = specifier.trim_start_matches("./");

        for root in &self.roots {
            for candidate in [relative.to_string(), format!("{}.hql", relative)] {
                let Ok(metadata) = root.metadata(&candidate) else {
                    continue;
                };
                if metadata.len() as usize > self.fs_config.max_module_size {
                    return Err(CompileError::import(format!(
                        "module '{}' exceeds the maximum size of {} bytes",
                        specifier, self.fs_config.max_module_size
                    )));
                }
                return root.read_to_string(&candidate).map_err(|e| {
                    CompileError::Io(format!("cannot read module '{}': {}", specifier, e))
                });
            }
        }

        Err(CompileError::import(format!(
            "module '{}' not found under any allowed root",
            specifier
        )))
    }

    // ========================================================================
    // Remote Resolution
    // ========================================================================

    fn load_remote(&self, specifier: &str) -> Result<String, CompileError> {
        if let Some(cached) = self.cache.lookup(specifier)? {
            return Ok(cached);
        }

        if !self.net_config.enabled {
            return Err(CompileError::import(format!(
                "remote import '{}' requires network access (--allow-net)",
                specifier
            )));
        }

        let url = remote_url(specifier).ok_or_else(|| {
            CompileError::import(format!("unsupported remote specifier '{}'", specifier))
        })?;

        if !self.host_allowed(&url) {
            return Err(CompileError::import(format!(
                "host of '{}' is not in the allowed list",
                specifier
            )));
        }

        let source = (self.fetch)(&url)?;
        self.cache.store(specifier, &source)?;
        Ok(source)
    }

    fn host_allowed(&self, url: &str) -> bool {
        if self.net_config.allowed_hosts.is_empty() {
            return true;
        }
        let Some(host) = url_host(url) else {
            return false;
        };
        self.net_config
            .allowed_hosts
            .iter()
            .any(|allowed| allowed == host)
    }
}

fn is_remote(specifier: &str) -> bool {
    specifier.starts_with("npm:")
        || specifier.starts_with("jsr:")
        || specifier.starts_with("http:")
        || specifier.starts_with("https:")
}

/// Map a remote specifier to a fetchable URL
fn remote_url(specifier: &str) -> Option<String> {
    if specifier.starts_with("http:") || specifier.starts_with("https:") {
        return Some(specifier.to_string());
    }
    if let Some(package) = specifier.strip_prefix("npm:") {
        return Some(format!("https://esm.sh/{}", package));
    }
    if let Some(package) = specifier.strip_prefix("jsr:") {
        return Some(format!("https://esm.sh/jsr/{}", package));
    }
    None
}

fn url_host(url: &str) -> Option<&str> {
    let rest = url.split_once("://")?.1;
    let host = rest.split(['/', '?', '#']).next()?;
    Some(host.split(':').next().unwrap_or(host))
}

fn http_fetch(url: &str) -> Result<String, CompileError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| CompileError::Io(format!("fetch of {} failed: {}", url, e)))?;
    response
        .into_string()
        .map_err(|e| CompileError::Io(format!("reading body of {} failed: {}", url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("npm:lodash-es"));
        assert!(is_remote("jsr:@std/path"));
        assert!(is_remote("https://example.dev/mod.js"));
        assert!(!is_remote("./utils.hql"));
        assert!(!is_remote("utils"));
    }

    #[test]
    fn test_remote_url_mapping() {
        assert_eq!(
            remote_url("npm:lodash-es").as_deref(),
            Some("https://esm.sh/lodash-es")
        );
        assert_eq!(
            remote_url("jsr:@std/path").as_deref(),
            Some("https://esm.sh/jsr/@std/path")
        );
        assert_eq!(
            remote_url("https://x.dev/m.js").as_deref(),
            Some("https://x.dev/m.js")
        );
    }

    #[test]
    fn test_url_host_extraction() {
        assert_eq!(url_host("https://esm.sh/lodash-es"), Some("esm.sh"));
        assert_eq!(url_host("http://localhost:8080/x"), Some("localhost"));
        assert_eq!(url_host("not a url"), None);
    }
}
