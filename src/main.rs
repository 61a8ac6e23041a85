fn main() {
    #[cfg(feature = "cli")]
    cmf::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("cmf: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
