use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Default)]
struct ConfigSection {
    alignment: Option<usize>,
    page_size: Option<usize>,
    span_pages: Option<usize>,
    max_small: Option<usize>,
    thread_cache_threshold: Option<u32>,
}

#[derive(Deserialize, Default)]
struct Config {
    #[serde(default)]
    config: ConfigSection,
}

struct ResolvedConfig {
    alignment: usize,
    page_size: usize,
    span_pages: usize,
    max_small: usize,
    num_classes: usize,
    thread_cache_threshold: u32,
}

fn resolve_config(cfg: &ConfigSection) -> ResolvedConfig {
    let alignment = cfg.alignment.unwrap_or(8);
    assert!(
        alignment > 0 && alignment.is_power_of_two(),
        "alignment ({}) must be a power of 2",
        alignment
    );

    let page_size = cfg.page_size.unwrap_or(4096);
    assert!(
        page_size >= 4096 && page_size.is_power_of_two(),
        "page_size ({}) must be a power of 2 >= 4096",
        page_size
    );

    let span_pages = cfg.span_pages.unwrap_or(8);
    assert!(span_pages > 0, "span_pages must be > 0");

    let max_small = cfg.max_small.unwrap_or(262_144);
    assert!(
        max_small % alignment == 0,
        "max_small ({}) must be a multiple of alignment ({})",
        max_small,
        alignment
    );

    let num_classes = max_small / alignment;
    assert!(num_classes > 0, "num_classes must be > 0");

    let thread_cache_threshold = cfg.thread_cache_threshold.unwrap_or(64);
    assert!(
        thread_cache_threshold > 0,
        "thread_cache_threshold must be > 0"
    );

    ResolvedConfig {
        alignment,
        page_size,
        span_pages,
        max_small,
        num_classes,
        thread_cache_threshold,
    }
}

fn generate_config(cfg: &ResolvedConfig, out_path: &Path) {
    let code = format!(
        "// Auto-generated by build.rs. Do not edit.\n\n\
         pub const ALIGNMENT: usize = {};\n\
         pub const PAGE_SIZE: usize = {};\n\
         pub const SPAN_PAGES: usize = {};\n\
         pub const MAX_SMALL: usize = {};\n\
         pub const NUM_CLASSES: usize = {};\n\
         pub const DEFAULT_THREAD_CACHE_THRESHOLD: u32 = {};\n",
        cfg.alignment, cfg.page_size, cfg.span_pages, cfg.max_small, cfg.num_classes,
        cfg.thread_cache_threshold,
    );
    fs::write(out_path, code).expect("failed to write config_gen.rs");
}

fn main() {
    println!("cargo:rerun-if-env-changed=TIERED_ALLOC_CONFIG");

    let out_dir = env::var("OUT_DIR").unwrap();
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let default_path = format!("{manifest_dir}/tiered-alloc.toml");
    let config_path = env::var("TIERED_ALLOC_CONFIG").unwrap_or(default_path);

    println!("cargo:rerun-if-changed={}", config_path);
    let content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", config_path, e));

    let config: Config = toml::from_str(&content).expect("failed to parse TOML config");
    let resolved = resolve_config(&config.config);

    generate_config(&resolved, &Path::new(&out_dir).join("config_gen.rs"));
}
