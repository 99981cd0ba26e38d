pub mod diff;
pub mod headers;

/// Context marking a failure that the user's input did not cause (exit code 3).
#[derive(Debug)]
pub struct InternalError(pub &'static str);

impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}
