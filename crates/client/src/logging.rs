/// Initializes the fmt tracing subscriber for binaries and manual testing.
///
/// Safe to call once per process; later calls are ignored so tests can call
/// it unconditionally.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
