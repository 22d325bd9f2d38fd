/// Default gateway port the extension is pointed at.
pub fn default_gateway_port() -> u16 {
    8417
}

/// Default upload guardrail (25 MB), the largest payload the extension
/// will relay as a data URL.
pub fn default_max_input_bytes() -> usize {
    25 * 1024 * 1024
}
