fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the device build needs the ESP-IDF environment forwarded;
    // host test builds skip it.
    #[cfg(feature = "espidf")]
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
