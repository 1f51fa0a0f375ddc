// Exclude entire file from coverage - binary entry point cannot be unit tested
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

fn main() {
    let guards = macroboard_lib::init_logging();
    let code = macroboard_lib::run();
    // Flush buffered log lines; process::exit skips destructors
    drop(guards);
    std::process::exit(code);
}
