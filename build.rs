fn main() {
    // ESP-IDF link arguments are only needed for flash builds; host
    // builds (tests, fuzzing) compile without the embuild toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
