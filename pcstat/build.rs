fn main() {
    // pcstat relies on mincore(2), setns(2) and /proc, which only linux provides
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if !matches!(target_os.as_str(), "linux" | "android") {
        panic!(
            "Building pcstat for an unsupported platform ({}). Currently only linux and android are supported",
            target_os
        );
    }
}
